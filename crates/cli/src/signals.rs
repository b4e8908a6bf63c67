//! Interrupt handling for sync passes.
//!
//! On SIGTERM or SIGINT (Ctrl+C) the shared flag is set; the pass driver
//! checks it between candidates, so journal entries recorded before the
//! interrupt stay valid and the partial rollback script is still written.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

use dotsync_core::session::CancelFlag;

/// Create a cancel flag and register OS signal handlers for it.
pub fn setup_signal_handlers() -> CancelFlag {
    let flag: CancelFlag = Arc::new(AtomicBool::new(false));
    let flag_clone = flag.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");

            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), finishing current candidate then stopping");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, finishing current candidate then stopping");
                }
            }
        }

        #[cfg(not(unix))]
        {
            ctrl_c.await.expect("failed to listen for Ctrl+C");
            info!("received Ctrl+C, finishing current candidate then stopping");
        }

        flag_clone.store(true, Ordering::SeqCst);
    });

    flag
}
