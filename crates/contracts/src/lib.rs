//! # Contracts
//!
//! Frozen interface contracts shared by the collector, the delivery client and
//! the ingest server. Business crates depend on this crate only, never on each
//! other's internals.
//!
//! ## Time Model
//! - `Sample::captured_at` is wall-clock milliseconds since the Unix epoch,
//!   taken when acquisition starts
//! - Server receipt time is stamped independently and never assumed to be
//!   monotonic with respect to capture time

mod config;
mod error;
mod sample;
mod sensor_source;
mod sink;
mod transport;

pub use config::*;
pub use error::*;
pub use sample::*;
pub use sensor_source::{AcquireFuture, ReadingCallback, SensorDevice, SensorSource};
pub use sink::*;
pub use transport::*;
