//! lineflux - pooled InfluxDB line protocol encoder.
//!
//! lineflux turns metric observations into line protocol records while
//! reusing the same builders and buffers across records, so a warmed-up
//! encoder does not allocate.
//!
//! # Architecture
//!
//! - `protocol`: escaping, segment buffers, tag ordering and the [`Point`] builder
//! - `pool`: the [`PointPool`] that hands out and recycles points
//! - `core`: errors and configuration
//! - `cli`: JSON-lines to line protocol command
//!
//! # Example
//!
//! ```
//! use lineflux_lib::{PointPool, TimeUnit};
//!
//! # fn main() -> lineflux_lib::Result<()> {
//! let pool = PointPool::builder().size(4).build()?;
//!
//! let mut point = pool.create_point("cpu")?;
//! point
//!     .tag("host", "server01")
//!     .tag("region", "us-west")
//!     .field("load", 42)
//!     .field("healthy", true)
//!     .timestamp(1509428908609, TimeUnit::Milliseconds);
//!
//! let mut out = Vec::new();
//! point.write_to(&mut out)?;
//! point.release();
//!
//! assert_eq!(
//!     out,
//!     b"cpu,host=server01,region=us-west load=42i,healthy=t 1509428908609000000"
//! );
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod cli;
pub mod core;
pub mod pool;
pub mod protocol;

// Re-export core types for convenience
pub use crate::core::{Config, LineError, Result};
pub use crate::pool::{PointPool, PooledPoint};
pub use crate::protocol::{FieldValue, Point, TimeUnit};
