//! Battery source
//!
//! One-shot query per acquisition. The sysfs backend reads `capacity`
//! (percent) and `status` from a `/sys/class/power_supply/BAT*` directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use contracts::{AcquireFuture, BatteryStatus, Reading, SensorFault, SensorKind, SensorSource};
use tracing::trace;

/// Default power supply root
pub const POWER_SUPPLY_ROOT: &str = "/sys/class/power_supply";

#[derive(Debug, Clone)]
enum Backend {
    Sysfs(PathBuf),
    Mock(BatteryStatus),
    Unsupported,
}

/// Battery source
#[derive(Debug)]
pub struct BatterySource {
    backend: Backend,
    timeout: Duration,
}

impl BatterySource {
    /// Read a sysfs power supply directory
    pub fn sysfs(path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            backend: Backend::Sysfs(path.into()),
            timeout,
        }
    }

    /// Always report `status`
    pub fn mock(status: BatteryStatus, timeout: Duration) -> Self {
        Self {
            backend: Backend::Mock(status),
            timeout,
        }
    }

    /// No battery API on this host
    pub fn unsupported() -> Self {
        Self {
            backend: Backend::Unsupported,
            timeout: SensorKind::Battery.default_timeout(),
        }
    }

    /// Find the first `BAT*` supply under `root`
    pub fn discover(root: &Path) -> Option<PathBuf> {
        let mut batteries: Vec<PathBuf> = std::fs::read_dir(root)
            .ok()?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("BAT"))
            .map(|entry| entry.path())
            .collect();
        batteries.sort();
        batteries.into_iter().next()
    }
}

async fn read_sysfs(path: &Path) -> Result<BatteryStatus, SensorFault> {
    let read = |name: &'static str| {
        let file = path.join(name);
        async move {
            tokio::fs::read_to_string(&file).await.map_err(|e| {
                SensorFault::read_failed(SensorKind::Battery, format!("{}: {e}", file.display()))
            })
        }
    };

    let capacity = read("capacity").await?;
    let percent: f64 = capacity.trim().parse().map_err(|_| {
        SensorFault::read_failed(
            SensorKind::Battery,
            format!("invalid capacity '{}'", capacity.trim()),
        )
    })?;

    let status = read("status").await?;
    let charging = matches!(status.trim(), "Charging" | "Full");

    Ok(BatteryStatus {
        charging,
        level: (percent / 100.0).clamp(0.0, 1.0),
    })
}

impl SensorSource for BatterySource {
    fn kind(&self) -> SensorKind {
        SensorKind::Battery
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn acquire(&self) -> AcquireFuture<'_> {
        Box::pin(async move {
            let status = match &self.backend {
                Backend::Sysfs(path) => read_sysfs(path).await?,
                Backend::Mock(status) => *status,
                Backend::Unsupported => {
                    return Err(SensorFault::unavailable(
                        SensorKind::Battery,
                        "battery status is not supported on this host",
                    ))
                }
            };
            trace!(charging = status.charging, level = status.level, "battery status");
            Ok(Reading::Battery(status))
        })
    }
}
