//! Coalescing one-slot notification primitive.

use tokio::sync::mpsc;

/// An edge-triggered, coalescing notification channel.
///
/// `send` delivers a token if the slot is empty; if one is already pending,
/// the call is a no-op, since the pending notification already covers the
/// event. `recv` waits for a token to become available. A burst of sends
/// between two receives is observed as exactly one wakeup.
#[derive(Clone)]
pub struct Signal {
    tx: mpsc::Sender<()>,
    rx: std::sync::Arc<tokio::sync::Mutex<mpsc::Receiver<()>>>,
}

impl Signal {
    /// Create a new signal with an empty slot.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(1);
        Self {
            tx,
            rx: std::sync::Arc::new(tokio::sync::Mutex::new(rx)),
        }
    }

    /// Deliver a token, or do nothing if the slot is already full.
    pub fn send(&self) {
        let _ = self.tx.try_send(());
    }

    /// Wait for a token. Returns once the pending notification (if any) or a
    /// future one is consumed.
    pub async fn recv(&self) {
        let mut rx = self.rx.lock().await;
        let _ = rx.recv().await;
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn coalesces_bursts_into_one_wakeup() {
        let signal = Signal::new();

        for _ in 0..5 {
            signal.send();
        }

        tokio::time::timeout(Duration::from_millis(50), signal.recv())
            .await
            .expect("first recv should observe the coalesced burst");

        let timed_out = tokio::time::timeout(Duration::from_millis(50), signal.recv())
            .await
            .is_err();
        assert!(timed_out, "second recv should have nothing pending");
    }

    #[tokio::test]
    async fn send_after_recv_wakes_again() {
        let signal = Signal::new();
        signal.send();
        signal.recv().await;

        signal.send();
        tokio::time::timeout(Duration::from_millis(50), signal.recv())
            .await
            .expect("recv should observe the new token");
    }

    #[tokio::test]
    async fn clone_shares_the_same_slot() {
        let signal = Signal::new();
        let other = signal.clone();

        other.send();
        signal.recv().await;
    }
}
