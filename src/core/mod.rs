//! Shared plumbing for lineflux: errors and configuration.

#![warn(missing_docs)]

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::{Config, ConfigBuilder, EncoderConfig, ExhaustionPolicy, PoolConfig};
pub use error::{LineError, Result};
