#![doc = include_str!("../README.md")]

pub mod agent;
pub mod cache;
pub mod config;
pub mod dispatch;
pub mod envelope;
pub mod errors;
pub mod handler;
pub mod logging;
pub mod processor;
pub mod retry;
pub mod supervisor;
pub mod worker;

/// the current app version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
