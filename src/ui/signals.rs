use crate::error::{DebugSymError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Ctrl+C state shared between the signal handler and the batch loop.
///
/// The first interrupt lets the package in flight finish (the external
/// tools get the same SIGINT, so in practice its extraction fails and its
/// workspace is dropped) and stops the batch before the next package. A
/// second interrupt exits immediately.
#[derive(Clone)]
pub struct GracefulShutdown {
    interrupts: Arc<AtomicUsize>,
}

impl GracefulShutdown {
    pub fn new() -> Result<Self> {
        let interrupts = Arc::new(AtomicUsize::new(0));
        let handler_interrupts = interrupts.clone();

        ctrlc::set_handler(move || {
            if handler_interrupts.fetch_add(1, Ordering::SeqCst) == 0 {
                eprintln!("\nStopping after the current package (Ctrl+C again to abort now)");
            } else {
                eprintln!("\nAborted");
                std::process::exit(130);
            }
        })
        .map_err(|e| DebugSymError::Config {
            message: format!("Failed to set signal handler: {}", e),
        })?;

        Ok(Self { interrupts })
    }

    /// Create a GracefulShutdown instance for testing (no signal handler registration)
    pub fn new_for_test() -> Self {
        Self {
            interrupts: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.interrupts.load(Ordering::SeqCst) == 0
    }

    pub fn check_shutdown(&self) -> Result<()> {
        if self.is_running() {
            Ok(())
        } else {
            Err(DebugSymError::Cancelled)
        }
    }

    pub fn request_shutdown(&self) {
        self.interrupts.fetch_max(1, Ordering::SeqCst);
    }
}
