//! Selection policy over one or more [`NodeClient`]s.

use crate::error::NoAvailableServers;
use crate::node::{Liveness, NodeClient};

/// Owns a fixed-size set of node clients and selects among them. The set is
/// immutable after construction; only liveness/load counters mutate.
pub enum ClientsPool {
    /// A single configured endpoint.
    Single(NodeClient),
    /// Two or more endpoints, selected by least-loaded-then-oldest.
    Cluster(Vec<NodeClient>),
}

impl ClientsPool {
    /// Build a pool from one or more node URIs. Errors if `uris` is empty.
    pub fn new(uris: &[String], insecure: bool) -> Result<Self, PoolBuildError> {
        if uris.is_empty() {
            return Err(PoolBuildError::NoServers(NoAvailableServers));
        }

        if uris.len() == 1 {
            let client = NodeClient::new(&uris[0], insecure)?;
            return Ok(ClientsPool::Single(client));
        }

        let clients = uris
            .iter()
            .map(|uri| NodeClient::new(uri, insecure))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ClientsPool::Cluster(clients))
    }

    /// Select a live client, or `None` if every node is dead.
    pub fn next_live(&self) -> Option<&NodeClient> {
        self.next(Liveness::Live)
    }

    /// Select a dead client, or `None` if every node is live.
    pub fn next_dead(&self) -> Option<&NodeClient> {
        self.next(Liveness::Dead)
    }

    fn next(&self, status: Liveness) -> Option<&NodeClient> {
        match self {
            ClientsPool::Single(client) => (client.liveness() == status).then_some(client),
            ClientsPool::Cluster(clients) => Self::least_loaded(clients, status),
        }
    }

    /// Among clients matching `status`, pick the one minimizing
    /// `(active_requests, last_use_time)` lexicographically: fewest
    /// in-flight requests first, ties broken by oldest last-use. Lock-free
    /// scan; best-effort under concurrent selection.
    fn least_loaded(clients: &[NodeClient], status: Liveness) -> Option<&NodeClient> {
        clients
            .iter()
            .filter(|c| c.liveness() == status)
            .min_by_key(|c| (c.active_requests(), c.last_use_time()))
    }

    /// Mark a client dead after a failed send/ping.
    pub fn on_failure(&self, client: &NodeClient) {
        let _ = client;
        client.mark_dead();
    }

    /// Mark a client live after a successful send/ping.
    pub fn on_success(&self, client: &NodeClient) {
        client.mark_live();
    }
}

/// Error constructing a [`ClientsPool`].
#[derive(Debug, thiserror::Error)]
pub enum PoolBuildError {
    #[error(transparent)]
    NoServers(#[from] NoAvailableServers),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uris(n: usize) -> Vec<String> {
        (0..n)
            .map(|i| format!("http://127.0.0.1:{}", 9200 + i))
            .collect()
    }

    #[test]
    fn empty_uris_is_an_error() {
        let err = ClientsPool::new(&[], false);
        assert!(matches!(err, Err(PoolBuildError::NoServers(_))));
    }

    #[test]
    fn single_uri_builds_a_single_pool() {
        let pool = ClientsPool::new(&uris(1), false).unwrap();
        assert!(matches!(pool, ClientsPool::Single(_)));
        assert!(pool.next_live().is_some());
        assert!(pool.next_dead().is_none());
    }

    #[test]
    fn single_pool_goes_dead_on_failure_and_recovers_on_success() {
        let pool = ClientsPool::new(&uris(1), false).unwrap();
        let client = pool.next_live().unwrap();
        pool.on_failure(client);

        assert!(pool.next_live().is_none());
        let dead = pool.next_dead().unwrap();

        pool.on_success(dead);
        assert!(pool.next_live().is_some());
        assert!(pool.next_dead().is_none());
    }

    #[test]
    fn cluster_picks_fewest_active_requests() {
        let pool = ClientsPool::new(&uris(3), false).unwrap();
        let ClientsPool::Cluster(clients) = &pool else {
            panic!("expected cluster pool");
        };

        // Simulate load by driving one node dead and back live, which bumps
        // its last-use timestamp without changing in-flight count, so the
        // untouched clients win ties on (active_requests=0, last_use=0).
        pool.on_failure(&clients[1]);
        pool.on_success(&clients[1]);

        let picked = pool.next_live().unwrap();
        assert!(std::ptr::eq(picked, &clients[0]) || std::ptr::eq(picked, &clients[2]));
    }

    #[test]
    fn cluster_liveness_monotonic_after_single_fault() {
        let pool = ClientsPool::new(&uris(2), false).unwrap();
        let ClientsPool::Cluster(clients) = &pool else {
            panic!("expected cluster pool");
        };

        pool.on_failure(&clients[0]);

        for _ in 0..5 {
            let picked = pool.next_live().unwrap();
            assert!(std::ptr::eq(picked, &clients[1]));
        }

        pool.on_success(&clients[0]);
        // Now both are live again; selection may legitimately pick either.
        assert!(pool.next_live().is_some());
    }

    #[test]
    fn cluster_next_dead_returns_none_if_all_live() {
        let pool = ClientsPool::new(&uris(2), false).unwrap();
        assert!(pool.next_dead().is_none());
    }
}
