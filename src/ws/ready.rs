//! One-shot connection readiness signal.

use crate::base::error::ChannelError;
use tokio::sync::watch;

/// Resolution state of a readiness signal.
#[derive(Debug, Clone)]
enum ReadyState {
    Pending,
    Connected,
    Failed(ChannelError),
}

/// Awaitable handle resolving once the connection attempt settles.
///
/// Cloneable; any number of independent callers may [`wait`](Self::wait) and
/// every one of them observes the same terminal outcome.
#[derive(Debug, Clone)]
pub struct ReadySignal {
    rx: watch::Receiver<ReadyState>,
}

/// Write half of a [`ReadySignal`], held by the connect orchestration.
///
/// Resolved exactly once; resolving twice panics, since it signals a defect
/// in the orchestration rather than a runtime condition.
#[derive(Debug)]
pub(crate) struct ReadyResolver {
    tx: watch::Sender<ReadyState>,
}

/// Create a pending signal and its resolver.
pub(crate) fn ready_signal() -> (ReadyResolver, ReadySignal) {
    let (tx, rx) = watch::channel(ReadyState::Pending);
    (ReadyResolver { tx }, ReadySignal { rx })
}

impl ReadySignal {
    /// A signal that is already resolved successfully, for channels built
    /// around a socket that is live from the start.
    pub(crate) fn connected() -> Self {
        let (tx, rx) = watch::channel(ReadyState::Connected);
        // Keep the channel open after the sender handle goes away.
        drop(tx);
        Self { rx }
    }

    /// Wait until the connection attempt settles.
    ///
    /// Returns `Ok(())` once connected, or the unified connection error if
    /// the attempt failed.
    pub async fn wait(&self) -> Result<(), ChannelError> {
        let mut rx = self.rx.clone();
        let settled = rx
            .wait_for(|state| !matches!(state, ReadyState::Pending))
            .await;
        match settled {
            Ok(state) => match &*state {
                ReadyState::Connected => Ok(()),
                ReadyState::Failed(err) => Err(err.clone()),
                ReadyState::Pending => unreachable!("wait_for yielded a pending state"),
            },
            // The resolver was dropped without resolving; only reachable if
            // the connect task itself died.
            Err(_) => Err(ChannelError::new("connection attempt was abandoned")),
        }
    }

    /// Peek at the current state without waiting.
    pub fn is_resolved(&self) -> bool {
        !matches!(&*self.rx.borrow(), ReadyState::Pending)
    }
}

impl ReadyResolver {
    /// Resolve the signal successfully.
    ///
    /// # Panics
    /// Panics if the signal was already resolved.
    pub(crate) fn resolve(self) {
        self.transition(ReadyState::Connected);
    }

    /// Resolve the signal with the unified connection error.
    ///
    /// # Panics
    /// Panics if the signal was already resolved.
    pub(crate) fn fail(self, err: ChannelError) {
        self.transition(ReadyState::Failed(err));
    }

    fn transition(self, next: ReadyState) {
        self.tx.send_modify(|state| {
            if !matches!(state, ReadyState::Pending) {
                panic!("ready signal resolved twice");
            }
            *state = next;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_success() {
        let (resolver, signal) = ready_signal();
        assert!(!signal.is_resolved());
        resolver.resolve();
        assert!(signal.is_resolved());
        assert!(signal.wait().await.is_ok());
    }

    #[tokio::test]
    async fn test_resolve_failure() {
        let (resolver, signal) = ready_signal();
        resolver.fail(ChannelError::new("no route to host"));
        let err = signal.wait().await.unwrap_err();
        assert_eq!(err.to_string(), "no route to host");
    }

    #[tokio::test]
    async fn test_fan_out() {
        let (resolver, signal) = ready_signal();
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let signal = signal.clone();
                tokio::spawn(async move { signal.wait().await })
            })
            .collect();
        resolver.fail(ChannelError::new("refused"));
        for waiter in waiters {
            let err = waiter.await.unwrap().unwrap_err();
            assert_eq!(err.to_string(), "refused");
        }
    }

    #[tokio::test]
    async fn test_wait_after_resolution() {
        let (resolver, signal) = ready_signal();
        resolver.resolve();
        // Late waiters still observe the terminal outcome.
        assert!(signal.wait().await.is_ok());
        assert!(signal.wait().await.is_ok());
    }

    #[tokio::test]
    async fn test_pre_connected() {
        let signal = ReadySignal::connected();
        assert!(signal.is_resolved());
        assert!(signal.wait().await.is_ok());
    }

    #[tokio::test]
    #[should_panic(expected = "resolved twice")]
    async fn test_double_resolution_panics() {
        let (tx, rx) = watch::channel(ReadyState::Pending);
        let _keep = rx;
        let first = ReadyResolver { tx: tx.clone() };
        let second = ReadyResolver { tx };
        first.resolve();
        second.fail(ChannelError::new("late failure"));
    }
}
