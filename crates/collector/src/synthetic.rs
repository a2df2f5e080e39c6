//! Synthetic fallback values
//!
//! Random but structurally valid stand-ins for readings that could not be
//! acquired. Ranges:
//! - latitude [-90, 90], longitude [-180, 180], accuracy [0, 100]
//! - illuminance [0, 1000] lux, 2 decimals
//! - alpha [0, 360), beta [-180, 180), gamma [-90, 90)
//! - battery level [0, 1], charging random

use contracts::{BatteryStatus, GeoFix, LightLevel, OrientationAngles};
use rand::Rng;

pub fn geolocation<R: Rng + ?Sized>(rng: &mut R) -> GeoFix {
    GeoFix {
        latitude: rng.random_range(-90.0..=90.0),
        longitude: rng.random_range(-180.0..=180.0),
        accuracy: rng.random_range(0.0..=100.0),
    }
}

pub fn ambient_light<R: Rng + ?Sized>(rng: &mut R) -> LightLevel {
    LightLevel::rounded(rng.random_range(0.0..=1000.0))
}

pub fn orientation<R: Rng + ?Sized>(rng: &mut R) -> OrientationAngles {
    OrientationAngles {
        alpha: rng.random_range(0.0..360.0),
        beta: rng.random_range(-180.0..180.0),
        gamma: rng.random_range(-90.0..90.0),
    }
}

pub fn battery<R: Rng + ?Sized>(rng: &mut R) -> BatteryStatus {
    BatteryStatus {
        charging: rng.random_bool(0.5),
        level: rng.random_range(0.0..=1.0),
    }
}
