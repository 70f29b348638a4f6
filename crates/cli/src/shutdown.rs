use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Turns SIGINT/SIGTERM into cancellation of the running batch. Calls in
/// flight finish; records not yet started are skipped.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    cancel_token: CancellationToken,
    interrupted: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    pub fn new(cancel_token: CancellationToken) -> Self {
        Self {
            cancel_token,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn register_handlers(&self) {
        let this = self.clone();
        tokio::spawn(async move {
            let name = wait_for_signal().await;
            info!("Received {name}, finishing calls in flight");
            this.interrupted.store(true, Ordering::SeqCst);
            this.cancel_token.cancel();
        });
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }
}

/// Resolves with the name of the first signal received. A handler that
/// cannot be installed never resolves.
async fn wait_for_signal() -> &'static str {
    let interrupt = async {
        match signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(err) => {
                warn!("Cannot listen for SIGINT: {err}");
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                "SIGTERM"
            }
            Err(err) => {
                warn!("Cannot listen for SIGTERM: {err}");
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    tokio::select! {
        name = interrupt => name,
        name = terminate => name,
    }
}

/// Process exit status of `crowdctl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    RecordsFailed = 2,
    ShutdownRequested = 130,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::RecordsFailed.as_i32(), 2);
        assert_eq!(ExitCode::ShutdownRequested.as_i32(), 130);
    }

    #[tokio::test]
    async fn test_cancel_token_is_shared() {
        let shutdown = ShutdownCoordinator::new(CancellationToken::new());
        let token = shutdown.cancel_token();
        assert!(!shutdown.is_shutdown_requested());
        shutdown.cancel_token().cancel();
        assert!(token.is_cancelled());
    }
}
