//! Ctrl+C handling.
//!
//! While a cancellable wait is in progress the first signal cancels its
//! token so the wait can unwind cleanly. Outside such a wait, or on a second
//! signal, the process exits with status 130.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub(crate) struct Interrupts {
    token: CancellationToken,
    waiting: Arc<AtomicBool>,
}

/// Marks a cancellable wait; dropping it restores exit-on-interrupt.
pub(crate) struct WaitGuard {
    waiting: Arc<AtomicBool>,
}

impl Drop for WaitGuard {
    fn drop(&mut self) {
        self.waiting.store(false, Ordering::SeqCst);
    }
}

impl Interrupts {
    pub(crate) fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub(crate) fn cancellable_wait(&self) -> WaitGuard {
        self.waiting.store(true, Ordering::SeqCst);
        WaitGuard {
            waiting: self.waiting.clone(),
        }
    }
}

pub(crate) fn install_signal_handler() -> Interrupts {
    let interrupts = Interrupts {
        token: CancellationToken::new(),
        waiting: Arc::new(AtomicBool::new(false)),
    };

    let handler = interrupts.clone();
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for Ctrl+C: {e}");
                return;
            }

            if handler.waiting.load(Ordering::SeqCst) && !handler.token.is_cancelled() {
                tracing::info!("Interrupted, press Ctrl+C again to force exit");
                handler.token.cancel();
            } else {
                std::process::exit(130);
            }
        }
    });

    interrupts
}
