//! Point pooling.
//!
//! [`PointPool`] hands out reusable [`Point`](crate::protocol::Point)
//! builders. A process-wide pool is available through [`global_pool`] and
//! [`create_point`] for callers that do not manage their own.

pub mod point_pool;

pub use point_pool::{PointPool, PointPoolBuilder, PoolStats, PooledPoint};

use crate::core::config::{EncoderConfig, PoolConfig};
use crate::core::Result;

/// Environment variable overriding the global pool's pre-allocated size
pub const POOL_SIZE_ENV: &str = "LINEFLUX_POOL_SIZE";

static GLOBAL_POINT_POOL: once_cell::sync::OnceCell<PointPool> = once_cell::sync::OnceCell::new();

/// The process-wide point pool, created on first use.
///
/// Sized from `LINEFLUX_POOL_SIZE` when set, otherwise from the defaults.
pub fn global_pool() -> Result<&'static PointPool> {
    GLOBAL_POINT_POOL.get_or_try_init(|| {
        let mut config = PoolConfig::default();
        if let Some(size) = std::env::var(POOL_SIZE_ENV)
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
        {
            config.size = size;
            config.max_size = config.max_size.max(size);
        }

        PointPool::new(&config, &EncoderConfig::default())
    })
}

/// Acquire a point from the global pool and set its measurement.
pub fn create_point(measurement: &str) -> Result<PooledPoint> {
    global_pool()?.create_point(measurement)
}
