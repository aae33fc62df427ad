//! Recycling pool of [`Point`] builders.
//!
//! Points live in a lock-free `ArrayQueue` free-list sized to the pool's
//! growth ceiling. `acquire` pops a free point, grows the pool if it is
//! still below `max_size`, and otherwise waits on a condvar until a point is
//! released or the acquire timeout passes. Releasing resets the point and
//! pushes it back, then wakes one waiter.
//!
//! Handles are RAII guards: dropping a [`PooledPoint`] releases it, so a
//! point goes back to the pool on every exit path, including `?` and panics.

use crate::core::config::{EncoderConfig, ExhaustionPolicy, PoolConfig};
use crate::core::{LineError, Result};
use crate::protocol::Point;
use crossbeam::queue::ArrayQueue;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Statistics for pool monitoring
#[derive(Debug, Clone)]
pub struct PoolStats {
    /// Acquires served from the free-list
    pub hits: u64,
    /// Acquires served by allocating a new point
    pub grown: u64,
    /// Acquires that gave up waiting
    pub timeouts: u64,
    /// Points returned to the free-list
    pub returns: u64,
    /// Points currently free
    pub available: usize,
    /// Points allocated so far
    pub allocated: usize,
    /// Growth ceiling
    pub max_size: usize,
    /// Share of successful acquires that needed no allocation
    pub hit_rate: f64,
}

struct PoolInner {
    free: ArrayQueue<Box<Point>>,
    allocated: AtomicUsize,
    max_size: usize,
    initial_buffer_size: usize,
    acquire_timeout: Duration,
    exhaustion: ExhaustionPolicy,
    shutdown: AtomicBool,
    /// Guards waiting only; the free-list itself is lock-free
    wait_lock: Mutex<()>,
    released: Condvar,
    hits: AtomicU64,
    grown: AtomicU64,
    timeouts: AtomicU64,
    returns: AtomicU64,
}

/// Thread-safe pool of reusable points. Cloning shares the same pool.
#[derive(Clone)]
pub struct PointPool {
    inner: Arc<PoolInner>,
}

impl PointPool {
    /// Create a pool and pre-allocate `pool.size` points.
    pub fn new(pool: &PoolConfig, encoder: &EncoderConfig) -> Result<Self> {
        pool.validate()?;
        if encoder.initial_buffer_size == 0 {
            return Err(LineError::config("initial_buffer_size must be greater than 0"));
        }

        let inner = Arc::new(PoolInner {
            free: ArrayQueue::new(pool.max_size),
            allocated: AtomicUsize::new(0),
            max_size: pool.max_size,
            initial_buffer_size: encoder.initial_buffer_size,
            acquire_timeout: pool.acquire_timeout,
            exhaustion: pool.exhaustion,
            shutdown: AtomicBool::new(false),
            wait_lock: Mutex::new(()),
            released: Condvar::new(),
            hits: AtomicU64::new(0),
            grown: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            returns: AtomicU64::new(0),
        });

        for _ in 0..pool.size {
            if let Some(point) = inner.try_grow() {
                let _ = inner.free.push(point);
            }
        }

        tracing::info!(
            "Initialized point pool with {} points (max {})",
            pool.size,
            pool.max_size
        );

        Ok(Self { inner })
    }

    /// Start building a pool with default settings.
    pub fn builder() -> PointPoolBuilder {
        PointPoolBuilder::default()
    }

    /// Acquire a point, waiting up to the configured timeout.
    pub fn acquire(&self) -> Result<PooledPoint> {
        self.acquire_timeout(self.inner.acquire_timeout)
    }

    /// Acquire a point, waiting up to `timeout` once the pool cannot grow.
    pub fn acquire_timeout(&self, timeout: Duration) -> Result<PooledPoint> {
        let point = self.inner.acquire(timeout)?;
        Ok(PooledPoint {
            point: Some(point),
            pool: Arc::clone(&self.inner),
        })
    }

    /// Acquire a point and set its measurement.
    pub fn create_point(&self, measurement: &str) -> Result<PooledPoint> {
        let mut point = self.acquire()?;
        point.measurement(measurement);
        Ok(point)
    }

    /// Drain the pool. Later acquires fail and outstanding points are
    /// dropped when released.
    pub fn shutdown(&self) {
        if self.inner.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }

        // Drained under the wait lock so a concurrent release cannot push
        // after the drain.
        let mut drained = 0usize;
        {
            let _guard = self.inner.wait_lock.lock();
            while self.inner.free.pop().is_some() {
                drained += 1;
            }
            self.inner.released.notify_all();
        }

        tracing::info!("Point pool shut down, dropped {} idle points", drained);
    }

    /// True once `shutdown` has been called
    pub fn is_shutdown(&self) -> bool {
        self.inner.shutdown.load(Ordering::Acquire)
    }

    /// Get pool statistics
    pub fn stats(&self) -> PoolStats {
        let hits = self.inner.hits.load(Ordering::Relaxed);
        let grown = self.inner.grown.load(Ordering::Relaxed);
        let total = hits + grown;

        PoolStats {
            hits,
            grown,
            timeouts: self.inner.timeouts.load(Ordering::Relaxed),
            returns: self.inner.returns.load(Ordering::Relaxed),
            available: self.inner.free.len(),
            allocated: self.inner.allocated.load(Ordering::Relaxed),
            max_size: self.inner.max_size,
            hit_rate: if total > 0 {
                hits as f64 / total as f64
            } else {
                1.0
            },
        }
    }
}

impl PoolInner {
    fn acquire(&self, timeout: Duration) -> Result<Box<Point>> {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(LineError::PoolShutdown);
        }

        if let Some(point) = self.free.pop() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(point);
        }

        if let Some(point) = self.try_grow() {
            self.grown.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Point pool grew to {}", self.allocated.load(Ordering::Relaxed));
            return Ok(point);
        }

        if self.exhaustion == ExhaustionPolicy::Fail {
            return Err(self.exhausted(Duration::ZERO));
        }

        // None when the timeout is too large to represent: wait without a deadline
        let deadline = Instant::now().checked_add(timeout);
        let mut guard = self.wait_lock.lock();
        loop {
            if self.shutdown.load(Ordering::Acquire) {
                return Err(LineError::PoolShutdown);
            }

            // Checked under the lock so a release between the pop and the
            // wait cannot be missed.
            if let Some(point) = self.free.pop() {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(point);
            }

            match deadline {
                Some(deadline) => {
                    if self.released.wait_until(&mut guard, deadline).timed_out() {
                        if let Some(point) = self.free.pop() {
                            self.hits.fetch_add(1, Ordering::Relaxed);
                            return Ok(point);
                        }
                        return Err(self.exhausted(timeout));
                    }
                },
                None => self.released.wait(&mut guard),
            }
        }
    }

    /// Allocate a new point if the pool is below its ceiling.
    fn try_grow(&self) -> Option<Box<Point>> {
        let slot = self
            .allocated
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.max_size).then_some(n + 1)
            })
            .ok()?;

        Some(Box::new(Point::with_slot(slot, self.initial_buffer_size)))
    }

    fn exhausted(&self, waited: Duration) -> LineError {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
        let timeout_ms = u64::try_from(waited.as_millis()).unwrap_or(u64::MAX);
        tracing::warn!(
            "Point pool exhausted: {} points in use, waited {}ms",
            self.allocated.load(Ordering::Relaxed),
            timeout_ms
        );
        LineError::PoolExhausted { timeout_ms }
    }

    fn release(&self, mut point: Box<Point>) {
        point.reset();

        let _guard = self.wait_lock.lock();
        if self.shutdown.load(Ordering::Acquire) {
            return;
        }

        // The queue holds max_size slots and at most max_size points exist
        if self.free.push(point).is_err() {
            tracing::warn!("Point pool free-list full on release, dropping point");
            return;
        }
        self.returns.fetch_add(1, Ordering::Relaxed);
        self.released.notify_one();
    }
}

/// A point borrowed from the pool that returns itself when dropped.
pub struct PooledPoint {
    point: Option<Box<Point>>,
    pool: Arc<PoolInner>,
}

impl PooledPoint {
    /// Reset the point and hand it back to the pool.
    ///
    /// Equivalent to dropping the handle.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for PooledPoint {
    fn drop(&mut self) {
        if let Some(point) = self.point.take() {
            self.pool.release(point);
        }
    }
}

impl std::ops::Deref for PooledPoint {
    type Target = Point;

    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        // Only `Drop` takes the point out
        self.point.as_deref().expect("PooledPoint used after release")
    }
}

impl std::ops::DerefMut for PooledPoint {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.point
            .as_deref_mut()
            .expect("PooledPoint used after release")
    }
}

impl std::fmt::Debug for PooledPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledPoint")
            .field("point", &self.point)
            .finish()
    }
}

/// Builder for [`PointPool`]
#[derive(Debug, Clone, Default)]
pub struct PointPoolBuilder {
    pool: PoolConfig,
    encoder: EncoderConfig,
}

impl PointPoolBuilder {
    /// Points allocated up front; also raises `max_size` if it is smaller.
    pub fn size(mut self, size: usize) -> Self {
        self.pool.size = size;
        if self.pool.max_size < size {
            self.pool.max_size = size;
        }
        self
    }

    /// Growth ceiling
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.pool.max_size = max_size;
        self
    }

    /// Default wait for `acquire`
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.pool.acquire_timeout = timeout;
        self
    }

    /// Behaviour once the pool is exhausted
    pub fn exhaustion(mut self, policy: ExhaustionPolicy) -> Self {
        self.pool.exhaustion = policy;
        self
    }

    /// Initial size of each point's segment buffers
    pub fn initial_buffer_size(mut self, size: usize) -> Self {
        self.encoder.initial_buffer_size = size;
        self
    }

    /// Build the pool
    pub fn build(self) -> Result<PointPool> {
        PointPool::new(&self.pool, &self.encoder)
    }
}
