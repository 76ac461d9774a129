//! Reverie command-line application
//!
//! Configuration loading and the headless audio backend behind the
//! `reverie` binary.

pub mod backend;
pub mod config;
pub mod error;

pub use backend::HeadlessBackend;
pub use config::ReverieConfig;
pub use error::{CliError, Result};
