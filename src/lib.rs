//! # birdorsquirrel
//!
//! Library behind the `birdorsquirrel` binary: a motion-triggered camera that
//! posts daylight pictures of whatever visits the feeder.
//!
//! This library exists to enable testing of the controller and its
//! collaborators, and to keep CLI dispatch (main.rs) apart from application
//! logic.
//!
//! ## Architecture
//!
//! - **Entry Point**: `BirdOrSquirrel` acquires resources and runs the loop
//! - **Controller**: `core` holds the motion-to-publish state machine
//! - **Collaborators**: `sensor`, `camera`, `publish` and `geo` sit behind
//!   traits or plain types the controller composes
//! - **Configuration**: `config` for the TOML settings file and environment
//! - **Infrastructure**: signal handling, the instance lock, logging and the
//!   clock abstraction

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

// Public API modules
pub mod args;
pub mod camera;
pub mod commands;
pub mod common;
pub mod config;
pub mod core;
pub mod error;
pub mod geo;
pub mod io;
pub mod publish;
pub mod sensor;
pub mod time_source;

// Internal modules
mod birdorsquirrel;

// Re-export for binary
pub use birdorsquirrel::BirdOrSquirrel;
