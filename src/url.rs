//! Node URI parsing.

/// Split a configuration URI `scheme://[token@]host:port` into its address
/// (with any userinfo token stripped) and the token itself, if present.
///
/// A bare `host:port`, or a URL without userinfo, yields `token = None`.
pub fn parse_node_uri(raw: &str) -> (String, Option<String>) {
    let raw = raw.trim();

    let Some(scheme_end) = raw.find("://") else {
        return (raw.to_string(), None);
    };

    let (scheme, rest) = raw.split_at(scheme_end);
    let rest = &rest[3..]; // skip "://"

    match rest.find('@') {
        Some(at) => {
            let token = rest[..at].to_string();
            let host = &rest[at + 1..];
            (format!("{scheme}://{host}"), Some(token))
        }
        None => (raw.to_string(), None),
    }
}

/// Split a comma-separated list of node URIs, trimming surrounding
/// whitespace from each entry and dropping empty entries.
pub fn split_node_uris(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
