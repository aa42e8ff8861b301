// Shared constants and small helpers used across modules

pub mod constants;
pub mod utils;
