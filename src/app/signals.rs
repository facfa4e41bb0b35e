//! OS signal handling.
//!
//! # Responsibilities
//! - Register handlers for the configured termination signal set
//! - Translate the first received signal into a shutdown trigger
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Handler registration failure is surfaced; a runtime that cannot see
//!   termination signals should not pretend it can shut down cleanly

use std::io;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;

use crate::app::options::ShutdownSignal;

impl ShutdownSignal {
    fn kind(self) -> SignalKind {
        match self {
            ShutdownSignal::Terminate => SignalKind::terminate(),
            ShutdownSignal::Interrupt => SignalKind::interrupt(),
            ShutdownSignal::Quit => SignalKind::quit(),
        }
    }
}

/// Wait for the first signal from the configured set.
///
/// One listener task per signal; the losers stay parked on their streams and
/// end with the runtime.
pub(crate) async fn wait_for(signals: &[ShutdownSignal]) -> io::Result<ShutdownSignal> {
    let (tx, mut rx) = mpsc::channel(1);
    for sig in signals {
        let mut stream = signal(sig.kind())?;
        let tx = tx.clone();
        let sig = *sig;
        tokio::spawn(async move {
            if stream.recv().await.is_some() {
                let _ = tx.try_send(sig);
            }
        });
    }
    drop(tx);
    rx.recv()
        .await
        .ok_or_else(|| io::Error::other("signal streams closed"))
}
