//! Orientation source
//!
//! Push-style: a registered device callback keeps the last known angles in a
//! cell, `acquire` only reads the cell.

use std::sync::{Arc, Mutex, PoisonError};

use contracts::{
    AcquireFuture, OrientationAngles, Reading, SensorDevice, SensorFault, SensorKind,
    SensorSource,
};
use tracing::{debug, warn};

type AngleCell = Arc<Mutex<Option<OrientationAngles>>>;

/// Orientation source
pub struct OrientationSource {
    device: Option<Arc<dyn SensorDevice>>,
    last: AngleCell,
}

impl OrientationSource {
    /// Source fed by a callback device
    pub fn new(device: Arc<dyn SensorDevice>) -> Self {
        Self {
            device: Some(device),
            last: Arc::default(),
        }
    }

    /// No orientation events on this host
    pub fn unsupported() -> Self {
        Self {
            device: None,
            last: Arc::default(),
        }
    }

    /// Last known angles, if any event arrived yet
    pub fn last_known(&self) -> Option<OrientationAngles> {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SensorSource for OrientationSource {
    fn kind(&self) -> SensorKind {
        SensorKind::Orientation
    }

    fn acquire(&self) -> AcquireFuture<'_> {
        Box::pin(async move {
            if self.device.is_none() {
                return Err(SensorFault::unavailable(
                    SensorKind::Orientation,
                    "orientation events are not supported on this host",
                ));
            }

            self.last_known()
                .map(Reading::Orientation)
                .ok_or_else(|| {
                    SensorFault::unavailable(SensorKind::Orientation, "no orientation event yet")
                })
        })
    }

    fn listen(&self) {
        let Some(device) = &self.device else {
            return;
        };
        if device.is_listening() {
            return;
        }

        let cell = self.last.clone();
        device.listen(Arc::new(move |reading| match reading {
            Reading::Orientation(angles) => {
                *cell.lock().unwrap_or_else(PoisonError::into_inner) = Some(angles);
            }
            other => warn!(kind = %other.kind(), "unexpected reading on orientation device"),
        }));
        debug!(device_id = %device.device_id(), "orientation listener registered");
    }

    fn detach(&self) {
        if let Some(device) = &self.device {
            if device.is_listening() {
                device.stop();
                debug!(device_id = %device.device_id(), "orientation listener detached");
            }
        }
    }

    fn is_listening(&self) -> bool {
        self.device.as_ref().is_some_and(|d| d.is_listening())
    }
}
