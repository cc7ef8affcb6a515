//! Send/reconnect state machine over a [`ClientsPool`].

use crate::error::TransportError;
use crate::logger::SharedLogger;
use crate::pool::{ClientsPool, PoolBuildError};
use crate::signal::Signal;
use bytes::Bytes;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

const LIVE: u8 = 0;
const DEAD: u8 = 1;

/// Configuration for constructing a [`Transport`].
#[derive(Clone, Debug)]
pub struct TransportConfig {
    pub node_uris: Vec<String>,
    pub insecure: bool,
    pub request_timeout: Duration,
    pub ping_interval: Duration,
    pub success_codes: Vec<u16>,
}

/// Owns a node pool and the connection-status state machine: live iff the
/// most recent send-side decision observed at least one live node.
///
/// A background task probes dead nodes and flips the connection back to
/// live the moment one responds successfully to a ping.
pub struct Transport {
    pool: ClientsPool,
    request_timeout: Duration,
    ping_interval: Duration,
    success_codes: HashSet<u16>,
    conn_status: AtomicU8,
    dead_signal: Signal,
    live_signal: Signal,
}

impl Transport {
    /// Build the transport and spawn its prober task.
    pub fn new(config: TransportConfig, logger: Option<SharedLogger>) -> Result<Arc<Self>, PoolBuildError> {
        let pool = ClientsPool::new(&config.node_uris, config.insecure)?;

        let transport = Arc::new(Self {
            pool,
            request_timeout: config.request_timeout,
            ping_interval: config.ping_interval,
            success_codes: config.success_codes.into_iter().collect(),
            conn_status: AtomicU8::new(LIVE),
            dead_signal: Signal::new(),
            live_signal: Signal::new(),
        });

        tokio::spawn(Self::ping_dead_nodes(transport.clone(), logger));

        Ok(transport)
    }

    /// Whether the transport currently considers itself connected.
    pub fn is_connected(&self) -> bool {
        self.conn_status.load(Ordering::Acquire) == LIVE
    }

    /// A clone of the live-transition signal; await it to learn the
    /// transport has just gone Dead→Live.
    pub fn is_reconnected(&self) -> Signal {
        self.live_signal.clone()
    }

    /// Send `body` to a live node, failing over to the next live node on
    /// error, until either a send succeeds or every node is dead.
    pub async fn send(&self, body: Bytes) -> Result<(), TransportError> {
        loop {
            let Some(client) = self.pool.next_live() else {
                self.conn_status.store(DEAD, Ordering::Release);
                self.dead_signal.send();
                return Err(TransportError::NoAvailableClients);
            };

            match client.send_record(body.clone(), self.request_timeout).await {
                Ok(status) if self.success_codes.contains(&status) => return Ok(()),
                _ => {
                    self.pool.on_failure(client);
                    self.dead_signal.send();
                }
            }
        }
    }

    async fn ping_dead_nodes(transport: Arc<Transport>, logger: Option<SharedLogger>) {
        loop {
            let Some(client) = transport.pool.next_dead() else {
                transport.dead_signal.recv().await;
                continue;
            };

            match client.ping(transport.request_timeout).await {
                Ok(status) if transport.success_codes.contains(&status) => {
                    transport.pool.on_success(client);
                    transport.conn_status.store(LIVE, Ordering::Release);
                    transport.live_signal.send();
                }
                Ok(status) => {
                    crate::logger::log_warn!(logger, "probe of {} returned {}", client.addr(), status);
                }
                Err(err) => {
                    crate::logger::log_warn!(logger, "probe of {} failed: {}", client.addr(), err);
                }
            }

            tokio::time::sleep(transport.ping_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(uris: Vec<String>) -> TransportConfig {
        TransportConfig {
            node_uris: uris,
            insecure: false,
            request_timeout: Duration::from_secs(1),
            ping_interval: Duration::from_millis(20),
            success_codes: vec![200],
        }
    }

    #[tokio::test]
    async fn happy_path_single_node_stays_connected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/store"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let transport = Transport::new(config(vec![server.uri()]), None).unwrap();
        transport.send(Bytes::from_static(b"hello")).await.unwrap();

        assert!(transport.is_connected());
    }

    #[tokio::test]
    async fn all_dead_send_reports_no_available_clients() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/store"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let transport = Transport::new(config(vec![server.uri()]), None).unwrap();
        let err = transport.send(Bytes::from_static(b"x")).await.unwrap_err();

        assert!(matches!(err, TransportError::NoAvailableClients));
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn failover_tries_the_next_live_node() {
        let bad = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/store"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&bad)
            .await;

        let good = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/store"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&good)
            .await;

        let transport = Transport::new(config(vec![bad.uri(), good.uri()]), None).unwrap();
        transport.send(Bytes::from_static(b"x")).await.unwrap();

        assert!(transport.is_connected());
    }

    #[tokio::test]
    async fn prober_fires_live_signal_on_recovery() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/store"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/ping"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let transport = Transport::new(config(vec![server.uri()]), None).unwrap();
        assert!(transport.send(Bytes::from_static(b"x")).await.is_err());

        let reconnected = transport.is_reconnected();
        tokio::time::timeout(Duration::from_secs(2), reconnected.recv())
            .await
            .expect("live signal should fire once the node starts pinging 200");

        assert!(transport.is_connected());
    }
}
