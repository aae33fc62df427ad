//! Common test utilities and fixtures.

#![allow(dead_code)]

use lineflux_lib::core::{LineError, Result};
use lineflux_lib::{Point, PointPool};
use std::time::Duration;

/// Pool with a single point, so every acquire reuses the same instance.
pub fn single_point_pool() -> PointPool {
    PointPool::builder()
        .size(1)
        .max_size(1)
        .acquire_timeout(Duration::from_millis(50))
        .build()
        .expect("valid pool")
}

/// Small pool for ordinary encoding tests.
pub fn test_pool() -> PointPool {
    PointPool::builder().size(4).max_size(16).build().expect("valid pool")
}

/// Serialize a point into a `String`.
pub fn encode(point: &mut Point) -> Result<String> {
    let mut out = Vec::new();
    point.write_to(&mut out)?;
    String::from_utf8(out).map_err(|e| LineError::parse(e.to_string()))
}
