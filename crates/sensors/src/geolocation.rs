//! Geolocation source
//!
//! One fresh fix per acquisition; nothing is cached between ticks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use contracts::{AcquireFuture, GeoFix, Reading, SensorFault, SensorKind, SensorSource};
use tracing::trace;

use crate::gpsd;

const DRIFT_PER_FIX: f64 = 0.0001;

#[derive(Debug, Clone)]
enum Backend {
    Fixed(GeoFix),
    Mock(GeoFix),
    Gpsd { addr: String, accuracy: f64 },
    Unsupported,
}

/// Geolocation source
#[derive(Debug)]
pub struct GeolocationSource {
    backend: Backend,
    timeout: Duration,
    fixes: AtomicU64,
}

impl GeolocationSource {
    /// Always report the given fix
    pub fn fixed(fix: GeoFix, timeout: Duration) -> Self {
        Self::with_backend(Backend::Fixed(fix), timeout)
    }

    /// Report a fix drifting slowly away from `origin`
    pub fn mock(origin: GeoFix, timeout: Duration) -> Self {
        Self::with_backend(Backend::Mock(origin), timeout)
    }

    /// Ask the gpsd daemon at `addr` for a fix on every acquisition
    ///
    /// `accuracy` is reported when gpsd gives no error estimate.
    pub fn gpsd(addr: impl Into<String>, accuracy: f64, timeout: Duration) -> Self {
        Self::with_backend(
            Backend::Gpsd {
                addr: addr.into(),
                accuracy,
            },
            timeout,
        )
    }

    /// No positioning capability on this host
    pub fn unsupported() -> Self {
        Self::with_backend(
            Backend::Unsupported,
            SensorKind::Geolocation.default_timeout(),
        )
    }

    fn with_backend(backend: Backend, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            fixes: AtomicU64::new(0),
        }
    }

    async fn current_fix(&self) -> Result<GeoFix, SensorFault> {
        match &self.backend {
            Backend::Fixed(fix) => Ok(*fix),
            Backend::Mock(origin) => {
                let n = self.fixes.fetch_add(1, Ordering::Relaxed) as f64;
                Ok(GeoFix {
                    latitude: (origin.latitude + n * DRIFT_PER_FIX).clamp(-90.0, 90.0),
                    longitude: wrap_longitude(origin.longitude + n * DRIFT_PER_FIX),
                    accuracy: origin.accuracy,
                })
            }
            Backend::Gpsd { addr, accuracy } => gpsd::query_fix(addr, *accuracy).await,
            Backend::Unsupported => Err(SensorFault::unavailable(
                SensorKind::Geolocation,
                "geolocation is not supported on this host",
            )),
        }
    }
}

fn wrap_longitude(longitude: f64) -> f64 {
    if longitude > 180.0 {
        longitude - 360.0
    } else {
        longitude
    }
}

impl SensorSource for GeolocationSource {
    fn kind(&self) -> SensorKind {
        SensorKind::Geolocation
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn acquire(&self) -> AcquireFuture<'_> {
        Box::pin(async move {
            let fix = self.current_fix().await?;
            trace!(latitude = fix.latitude, longitude = fix.longitude, "geolocation fix");
            Ok(Reading::Geolocation(fix))
        })
    }
}
