//! One-shot CLI commands that run instead of the monitoring loop.

pub mod status;
