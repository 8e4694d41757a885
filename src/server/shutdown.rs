use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tokio::signal;
use tokio::sync::Notify;

/// Shutdown flag plus a count of requests still being served.
pub struct ShutdownManager {
    shutdown: AtomicBool,
    in_flight: AtomicUsize,
    notify: Notify,
}

impl ShutdownManager {
    pub fn new() -> Self {
        Self {
            shutdown: AtomicBool::new(false),
            in_flight: AtomicUsize::new(0),
            notify: Notify::new(),
        }
    }

    /// Resolves on Ctrl-C, SIGTERM or [`ShutdownManager::signal_shutdown`].
    pub async fn wait_for_shutdown(&self) -> std::io::Result<()> {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if self.is_shutting_down() {
            return Ok(());
        }

        #[cfg(unix)]
        {
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
            tokio::select! {
                _ = signal::ctrl_c() => {},
                _ = sigterm.recv() => {},
                _ = notified => {},
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                _ = signal::ctrl_c() => {},
                _ = notified => {},
            }
        }

        // Wakes other waiters when an OS signal got here first.
        self.signal_shutdown();
        tracing::info!("Shutting down gracefully...");
        Ok(())
    }

    /// Resolves once shutdown has been signalled, without listening for OS
    /// signals itself.
    pub async fn signalled(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if self.is_shutting_down() {
            return;
        }
        notified.await;
    }

    pub fn signal_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Count a request as in flight until the returned guard is dropped.
    pub fn track(self: &Arc<Self>) -> InFlightGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        InFlightGuard {
            manager: Arc::clone(self),
        }
    }
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}

pub struct InFlightGuard {
    manager: Arc<ShutdownManager>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.manager.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Middleware keeping [`ShutdownManager::in_flight`] up to date.
pub async fn track_in_flight(
    State(shutdown): State<Arc<ShutdownManager>>,
    request: Request,
    next: Next,
) -> Response {
    let _guard = shutdown.track();
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn guards_balance_the_counter() {
        let manager = Arc::new(ShutdownManager::new());
        let first = manager.track();
        let second = manager.track();
        assert_eq!(manager.in_flight(), 2);
        drop(first);
        assert_eq!(manager.in_flight(), 1);
        drop(second);
        assert_eq!(manager.in_flight(), 0);
    }

    #[tokio::test]
    async fn signal_before_wait_is_not_lost() {
        let manager = ShutdownManager::new();
        manager.signal_shutdown();
        assert!(manager.is_shutting_down());
        tokio::time::timeout(Duration::from_secs(1), manager.wait_for_shutdown())
            .await
            .expect("wait_for_shutdown should return immediately")
            .unwrap();
    }

    #[tokio::test]
    async fn signal_wakes_a_waiter() {
        let manager = Arc::new(ShutdownManager::new());
        let waiter = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.wait_for_shutdown().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        manager.signal_shutdown();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn signalled_resolves_after_signal() {
        let manager = Arc::new(ShutdownManager::new());
        let waiter = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.signalled().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        manager.signal_shutdown();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("signalled should resolve")
            .unwrap();

        // Already shut down: returns at once.
        tokio::time::timeout(Duration::from_secs(1), manager.signalled())
            .await
            .expect("signalled should not block after shutdown");
    }
}
