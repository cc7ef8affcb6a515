//! Single-endpoint HTTP client with liveness and load counters.

use crate::url::parse_node_uri;
use bytes::Bytes;
use std::sync::atomic::{AtomicI64, AtomicU32, AtomicU8, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const STORE_URI: &str = "/api/v1/store";
const PING_URI: &str = "/api/v1/ping";

const LIVE: u8 = 0;
const DEAD: u8 = 1;

/// Liveness classification of a node or a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Live,
    Dead,
}

/// One remote collector endpoint.
///
/// Liveness, in-flight count and last-use timestamp are plain atomics:
/// cheap cross-thread visibility for best-effort selection, not a
/// correctness mechanism (concurrent callers may race and pick the same
/// node; see [`crate::pool::ClientsPool`]).
pub struct NodeClient {
    addr: String,
    token: Option<String>,
    status: AtomicU8,
    active_requests: AtomicU32,
    last_use_nanos: AtomicI64,
    http: reqwest::Client,
}

impl NodeClient {
    /// Build a node client from a configuration URI, extracting any
    /// userinfo-embedded bearer token into a separate `Authorization`
    /// header sent on every request.
    pub fn new(uri: &str, insecure: bool) -> reqwest::Result<Self> {
        let (addr, token) = parse_node_uri(uri);

        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(insecure)
            .build()?;

        Ok(Self {
            addr,
            token,
            status: AtomicU8::new(LIVE),
            active_requests: AtomicU32::new(0),
            last_use_nanos: AtomicI64::new(0),
            http,
        })
    }

    /// POST `body` to `<addr>/api/v1/store`.
    pub async fn send_record(
        &self,
        body: Bytes,
        timeout: Duration,
    ) -> reqwest::Result<u16> {
        self.do_post(STORE_URI, body, timeout).await
    }

    /// POST an empty body to `<addr>/api/v1/ping`, used to probe recovery.
    pub async fn ping(&self, timeout: Duration) -> reqwest::Result<u16> {
        self.do_post(PING_URI, Bytes::new(), timeout).await
    }

    async fn do_post(
        &self,
        path: &str,
        body: Bytes,
        timeout: Duration,
    ) -> reqwest::Result<u16> {
        self.active_requests.fetch_add(1, Ordering::AcqRel);
        self.touch_last_use();

        let mut req = self.http.post(format!("{}{}", self.addr, path)).timeout(timeout);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let result = req.body(body).send().await;

        self.active_requests.fetch_sub(1, Ordering::AcqRel);

        match result {
            Ok(resp) => {
                let status = resp.status().as_u16();
                // Drain and drop the body so the connection returns to the pool.
                let _ = resp.bytes().await;
                Ok(status)
            }
            Err(err) => Err(err),
        }
    }

    fn touch_last_use(&self) {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as i64)
            .unwrap_or(0);
        self.last_use_nanos.store(nanos, Ordering::Release);
    }

    /// Current in-flight request count.
    pub fn active_requests(&self) -> u32 {
        self.active_requests.load(Ordering::Acquire)
    }

    /// Nanoseconds since the epoch at which the last request was started.
    pub fn last_use_time(&self) -> i64 {
        self.last_use_nanos.load(Ordering::Acquire)
    }

    /// Current liveness classification.
    pub fn liveness(&self) -> Liveness {
        match self.status.load(Ordering::Acquire) {
            LIVE => Liveness::Live,
            _ => Liveness::Dead,
        }
    }

    pub(crate) fn mark_live(&self) {
        self.status.store(LIVE, Ordering::Release);
    }

    pub(crate) fn mark_dead(&self) {
        self.status.store(DEAD, Ordering::Release);
    }

    /// The node's address, with any userinfo token stripped.
    pub fn addr(&self) -> &str {
        &self.addr
    }
}
