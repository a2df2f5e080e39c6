//! # Sensors
//!
//! Sensor sources and device backends.
//!
//! Responsibilities:
//! - Implement `SensorSource` for geolocation, ambient light, orientation and battery
//! - Query a local gpsd daemon for live fixes
//! - Provide callback-style `SensorDevice` backends (mock, Linux IIO)
//! - Build a `SensorSuite` from `SensorsConfig`
//!
//! Every source degrades to a `SensorFault` instead of failing the caller;
//! the collector turns faults into synthetic sample fields.

pub mod ambient_light;
pub mod battery;
mod emitter;
pub mod error;
pub mod factory;
pub mod geolocation;
mod gpsd;
pub mod iio_light;
pub mod mock_device;
pub mod orientation;
pub mod suite;

pub use ambient_light::AmbientLightSource;
pub use battery::BatterySource;
pub use contracts::{SensorDevice, SensorKind, SensorSource};
pub use error::{Result, SensorsError};
pub use factory::SourceFactory;
pub use geolocation::GeolocationSource;
pub use iio_light::IioLightDevice;
pub use mock_device::{MockDevice, MockDeviceConfig};
pub use orientation::OrientationSource;
pub use suite::SensorSuite;
