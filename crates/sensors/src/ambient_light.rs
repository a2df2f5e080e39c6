//! Ambient light source
//!
//! Each acquisition starts the device, waits for its first reading and stops
//! it again. The stop lives in a drop guard, so it also runs when the caller's
//! timeout drops the future.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use contracts::{
    AcquireFuture, LightLevel, Reading, SensorDevice, SensorFault, SensorKind, SensorSource,
};
use tokio::sync::oneshot;
use tracing::{debug, trace};

/// Ambient light source
pub struct AmbientLightSource {
    device: Option<Arc<dyn SensorDevice>>,
    timeout: Duration,
}

impl AmbientLightSource {
    /// Source backed by a callback device
    pub fn new(device: Arc<dyn SensorDevice>, timeout: Duration) -> Self {
        Self {
            device: Some(device),
            timeout,
        }
    }

    /// No light sensor on this host
    pub fn unsupported() -> Self {
        Self {
            device: None,
            timeout: SensorKind::AmbientLight.default_timeout(),
        }
    }
}

/// Stops the device when the acquisition ends, however it ends
struct StopOnDrop<'a>(&'a dyn SensorDevice);

impl Drop for StopOnDrop<'_> {
    fn drop(&mut self) {
        self.0.stop();
        debug!(device_id = %self.0.device_id(), "light device stopped");
    }
}

impl SensorSource for AmbientLightSource {
    fn kind(&self) -> SensorKind {
        SensorKind::AmbientLight
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn acquire(&self) -> AcquireFuture<'_> {
        Box::pin(async move {
            let Some(device) = self.device.as_deref() else {
                return Err(SensorFault::unavailable(
                    SensorKind::AmbientLight,
                    "no ambient light sensor on this host",
                ));
            };

            let (tx, rx) = oneshot::channel();
            let pending = Arc::new(Mutex::new(Some(tx)));

            let _guard = StopOnDrop(device);
            device.listen(Arc::new(move |reading| {
                // 只取第一个读数
                let sender = pending
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take();
                if let Some(sender) = sender {
                    let _ = sender.send(reading);
                }
            }));

            let reading = rx.await.map_err(|_| {
                SensorFault::read_failed(
                    SensorKind::AmbientLight,
                    "device stopped before reporting",
                )
            })?;

            match reading {
                Reading::AmbientLight(level) => {
                    let level = LightLevel::rounded(level.illuminance_lux);
                    trace!(lux = level.illuminance_lux, "ambient light reading");
                    Ok(Reading::AmbientLight(level))
                }
                other => Err(SensorFault::read_failed(
                    SensorKind::AmbientLight,
                    format!("device reported {} reading", other.kind()),
                )),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_device::{MockDevice, MockDeviceConfig};
    use contracts::ReadingCallback;

    /// Device that reports a fixed lux value once, synchronously
    struct OneShotDevice {
        lux: f64,
        stops: Mutex<u32>,
    }

    impl SensorDevice for OneShotDevice {
        fn device_id(&self) -> &str {
            "one-shot"
        }

        fn kind(&self) -> SensorKind {
            SensorKind::AmbientLight
        }

        fn listen(&self, callback: ReadingCallback) {
            callback(Reading::AmbientLight(LightLevel {
                illuminance_lux: self.lux,
            }));
            callback(Reading::AmbientLight(LightLevel {
                illuminance_lux: -1.0,
            }));
        }

        fn stop(&self) {
            *self.stops.lock().unwrap() += 1;
        }

        fn is_listening(&self) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn test_first_reading_rounded_and_device_stopped() {
        let device = Arc::new(OneShotDevice {
            lux: 123.456,
            stops: Mutex::new(0),
        });
        let source = AmbientLightSource::new(device.clone(), Duration::from_secs(1));

        let reading = source.acquire().await.unwrap();
        assert_eq!(
            reading,
            Reading::AmbientLight(LightLevel {
                illuminance_lux: 123.46
            })
        );
        assert_eq!(*device.stops.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_mock_device_stopped_after_success() {
        let device = Arc::new(MockDevice::new(
            "light",
            SensorKind::AmbientLight,
            MockDeviceConfig {
                frequency_hz: 50.0,
                ..Default::default()
            },
        ));
        let source = AmbientLightSource::new(device.clone(), Duration::from_secs(1));

        let reading = tokio::time::timeout(source.timeout(), source.acquire())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reading.kind(), SensorKind::AmbientLight);
        assert!(!device.is_listening());
    }

    #[tokio::test]
    async fn test_device_stopped_after_timeout() {
        let device = Arc::new(MockDevice::silent("dark", SensorKind::AmbientLight));
        let source = AmbientLightSource::new(device.clone(), Duration::from_millis(50));

        let result = tokio::time::timeout(source.timeout(), source.acquire()).await;
        assert!(result.is_err());
        assert!(!device.is_listening());
    }

    #[tokio::test]
    async fn test_wrong_kind_is_read_failure() {
        let device = Arc::new(MockDevice::with_defaults("tilt", SensorKind::Orientation));
        let source = AmbientLightSource::new(device.clone(), Duration::from_secs(1));

        let fault = source.acquire().await.unwrap_err();
        assert!(matches!(fault, SensorFault::ReadFailed { .. }));
        assert!(!device.is_listening());
    }

    #[tokio::test]
    async fn test_unsupported() {
        let fault = AmbientLightSource::unsupported()
            .acquire()
            .await
            .unwrap_err();
        assert_eq!(fault.kind(), SensorKind::AmbientLight);
        assert!(matches!(fault, SensorFault::SourceUnavailable { .. }));
    }
}
