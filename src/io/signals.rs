//! Shutdown signal handling.
//!
//! A background thread waits on SIGINT, SIGTERM and SIGHUP and clears the
//! shared `running` flag on the first one it sees. The controller polls that
//! flag between sleep slices, so the camera is released before the process
//! exits.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM},
    iterator::Signals,
};
use std::{
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    thread,
};

use crate::log_info;
use crate::logger::Log;

/// Signal handling state shared between threads
pub struct SignalState {
    /// Atomic flag indicating if the application should keep running
    pub running: Arc<AtomicBool>,
}

fn signal_name(signal: i32) -> &'static str {
    match signal {
        SIGINT => "SIGINT",
        SIGTERM => "SIGTERM",
        SIGHUP => "SIGHUP",
        _ => "signal",
    }
}

/// Register the handlers and spawn the listener thread.
pub fn setup_signal_handler(log: Arc<dyn Log>) -> Result<SignalState> {
    let running = Arc::new(AtomicBool::new(true));

    let mut signals =
        Signals::new([SIGINT, SIGTERM, SIGHUP]).context("failed to register signal handlers")?;

    let running_clone = Arc::clone(&running);
    thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            if let Some(sig) = signals.forever().next() {
                log_info!(log, "Received {}, shutting down.", signal_name(sig));
                running_clone.store(false, Ordering::SeqCst);
            }
        })
        .context("failed to spawn signal thread")?;

    Ok(SignalState { running })
}
