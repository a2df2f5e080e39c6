//! SensorSource / SensorDevice traits - sensor abstraction
//!
//! `SensorSource` is what the sample assembler talks to: one acquisition per
//! tick, resolving to a reading or a fault. `SensorDevice` is the lower-level
//! callback-style hardware (or mock) driver that push-style sources and the
//! ambient light source are built on.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::{Reading, SensorFault, SensorKind};

/// Boxed acquisition future, keeps `SensorSource` object safe
pub type AcquireFuture<'a> = Pin<Box<dyn Future<Output = Result<Reading, SensorFault>> + Send + 'a>>;

/// Device data callback type
///
/// Uses `Arc` to allow callback sharing across multiple contexts.
pub type ReadingCallback = Arc<dyn Fn(Reading) + Send + Sync>;

/// Sensor data source trait
///
/// # Design Principles
///
/// 1. **Local failure**: `acquire` never panics past this boundary, it returns
///    a `SensorFault` and the rest of the sample is unaffected
/// 2. **Bounded**: the caller enforces `timeout()`; implementations must
///    release any device when their future is dropped
/// 3. **Push-style sources** (orientation) register listeners in `listen` and
///    release them in `detach`; pull sources keep the default no-ops
///
/// # Example
///
/// ```ignore
/// let source: Arc<dyn SensorSource> = factory.geolocation();
/// match tokio::time::timeout(source.timeout(), source.acquire()).await {
///     Ok(Ok(reading)) => println!("{:?}", reading),
///     Ok(Err(fault)) => println!("fault: {fault}"),
///     Err(_) => println!("timed out"),
/// }
/// ```
pub trait SensorSource: Send + Sync {
    /// Which sample field this source fills
    fn kind(&self) -> SensorKind;

    /// Acquisition budget
    fn timeout(&self) -> Duration {
        self.kind().default_timeout()
    }

    /// Acquire one reading
    fn acquire(&self) -> AcquireFuture<'_>;

    /// Register push-style listeners (idempotent)
    fn listen(&self) {}

    /// Deregister push-style listeners (idempotent)
    fn detach(&self) {}

    /// Check if push-style listeners are registered
    fn is_listening(&self) -> bool {
        false
    }
}

/// Callback-style sensor device
///
/// Abstracts real platform devices and mock devices behind the same API.
pub trait SensorDevice: Send + Sync {
    /// Device identifier (used for logging)
    fn device_id(&self) -> &str;

    /// Kind of readings the device emits
    fn kind(&self) -> SensorKind;

    /// Start emitting readings to `callback`
    ///
    /// If already listening, repeated calls are idempotent (the first
    /// callback stays registered).
    fn listen(&self, callback: ReadingCallback);

    /// Stop emitting readings
    fn stop(&self);

    /// Check if currently listening
    fn is_listening(&self) -> bool;
}
