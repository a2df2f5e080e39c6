//! SourceFactory 核心实现
//!
//! 从 SensorsConfig 构建 SensorSuite。

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use contracts::{
    AmbientLightBackend, AmbientLightConfig, BatteryBackend, BatteryConfig, BatteryStatus, GeoFix,
    GeolocationBackend, GeolocationConfig, OrientationBackend, OrientationConfig, SensorDevice,
    SensorKind, SensorSource, SensorsConfig,
};
use tracing::{info, instrument, warn};

use crate::battery::POWER_SUPPLY_ROOT;
use crate::error::{Result, SensorsError};
use crate::iio_light::IIO_DEVICES_ROOT;
use crate::mock_device::MockDeviceConfig;
use crate::{
    AmbientLightSource, BatterySource, GeolocationSource, IioLightDevice, MockDevice,
    OrientationSource, SensorSuite,
};

/// Mock geolocation start point when none is configured
const MOCK_ORIGIN: (f64, f64) = (40.7128, -74.0060);

/// Mock battery reading
const MOCK_BATTERY: BatteryStatus = BatteryStatus {
    charging: true,
    level: 0.76,
};

/// Source Factory
///
/// 负责根据配置选择各传感器后端。未显式配置路径的硬件后端
/// 在找不到设备时降级为 unsupported；显式配置的路径不存在则报错。
#[derive(Debug, Clone)]
pub struct SourceFactory {
    iio_root: PathBuf,
    power_supply_root: PathBuf,
}

impl Default for SourceFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceFactory {
    /// 使用系统默认 sysfs 路径
    pub fn new() -> Self {
        Self::with_roots(IIO_DEVICES_ROOT, POWER_SUPPLY_ROOT)
    }

    /// 使用自定义设备发现根目录
    pub fn with_roots(iio_root: impl Into<PathBuf>, power_supply_root: impl Into<PathBuf>) -> Self {
        Self {
            iio_root: iio_root.into(),
            power_supply_root: power_supply_root.into(),
        }
    }

    /// 构建全部四个 source
    #[instrument(name = "source_factory_build", skip(self, config))]
    pub fn build(&self, config: &SensorsConfig) -> Result<SensorSuite> {
        let suite = SensorSuite::new()
            .with(self.geolocation(&config.geolocation))
            .with(self.ambient_light(&config.ambient_light)?)
            .with(self.orientation(&config.orientation))
            .with(self.battery(&config.battery)?);

        info!(
            geolocation = ?config.geolocation.backend,
            ambient_light = ?config.ambient_light.backend,
            orientation = ?config.orientation.backend,
            battery = ?config.battery.backend,
            "sensor suite built"
        );

        Ok(suite)
    }

    pub fn geolocation(&self, config: &GeolocationConfig) -> Arc<dyn SensorSource> {
        let timeout = Duration::from_millis(config.timeout_ms);
        match config.backend {
            GeolocationBackend::Fixed => match (config.latitude, config.longitude) {
                (Some(latitude), Some(longitude)) => Arc::new(GeolocationSource::fixed(
                    GeoFix {
                        latitude,
                        longitude,
                        accuracy: config.accuracy,
                    },
                    timeout,
                )),
                _ => {
                    // 校验器已拦截，这里只做兜底
                    warn!("fixed geolocation without coordinates, treating as unsupported");
                    Arc::new(GeolocationSource::unsupported())
                }
            },
            GeolocationBackend::Mock => Arc::new(GeolocationSource::mock(
                GeoFix {
                    latitude: config.latitude.unwrap_or(MOCK_ORIGIN.0),
                    longitude: config.longitude.unwrap_or(MOCK_ORIGIN.1),
                    accuracy: config.accuracy,
                },
                timeout,
            )),
            GeolocationBackend::Gpsd => {
                info!(addr = %config.gpsd_addr, "using gpsd geolocation");
                Arc::new(GeolocationSource::gpsd(
                    config.gpsd_addr.clone(),
                    config.accuracy,
                    timeout,
                ))
            }
            GeolocationBackend::Unsupported => Arc::new(GeolocationSource::unsupported()),
        }
    }

    pub fn ambient_light(&self, config: &AmbientLightConfig) -> Result<Arc<dyn SensorSource>> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let device: Arc<dyn SensorDevice> = match config.backend {
            AmbientLightBackend::Iio => {
                let Some(path) = self.resolve_device(
                    SensorKind::AmbientLight,
                    config.device_path.as_deref(),
                    IioLightDevice::has_illuminance_channel,
                    || IioLightDevice::discover(&self.iio_root),
                )?
                else {
                    return Ok(Arc::new(AmbientLightSource::unsupported()));
                };
                info!(path = %path.display(), "using IIO light sensor");
                Arc::new(IioLightDevice::new(path, config.frequency_hz))
            }
            AmbientLightBackend::Mock => Arc::new(MockDevice::new(
                "mock-light",
                SensorKind::AmbientLight,
                MockDeviceConfig {
                    frequency_hz: config.frequency_hz,
                    ..Default::default()
                },
            )),
            AmbientLightBackend::Unsupported => {
                return Ok(Arc::new(AmbientLightSource::unsupported()))
            }
        };

        Ok(Arc::new(AmbientLightSource::new(device, timeout)))
    }

    pub fn orientation(&self, config: &OrientationConfig) -> Arc<dyn SensorSource> {
        match config.backend {
            OrientationBackend::Mock => {
                let device = MockDevice::new(
                    "mock-orientation",
                    SensorKind::Orientation,
                    MockDeviceConfig {
                        frequency_hz: config.frequency_hz,
                        ..Default::default()
                    },
                );
                Arc::new(OrientationSource::new(Arc::new(device)))
            }
            OrientationBackend::Unsupported => Arc::new(OrientationSource::unsupported()),
        }
    }

    pub fn battery(&self, config: &BatteryConfig) -> Result<Arc<dyn SensorSource>> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let source = match config.backend {
            BatteryBackend::Sysfs => {
                match self.resolve_device(
                    SensorKind::Battery,
                    config.supply_path.as_deref(),
                    Path::is_dir,
                    || BatterySource::discover(&self.power_supply_root),
                )? {
                    Some(path) => {
                        info!(path = %path.display(), "using sysfs battery");
                        BatterySource::sysfs(path, timeout)
                    }
                    None => BatterySource::unsupported(),
                }
            }
            BatteryBackend::Mock => BatterySource::mock(MOCK_BATTERY, timeout),
            BatteryBackend::Unsupported => BatterySource::unsupported(),
        };

        Ok(Arc::new(source))
    }

    /// 显式路径必须存在；未配置时自动发现，找不到返回 None
    fn resolve_device(
        &self,
        kind: SensorKind,
        configured: Option<&Path>,
        exists: impl Fn(&Path) -> bool,
        discover: impl FnOnce() -> Option<PathBuf>,
    ) -> Result<Option<PathBuf>> {
        if let Some(path) = configured {
            if !exists(path) {
                return Err(SensorsError::device_not_found(kind, path));
            }
            return Ok(Some(path.to_path_buf()));
        }

        let found = discover();
        if found.is_none() {
            warn!(kind = %kind, "no device discovered, source will report unavailable");
        }
        Ok(found)
    }
}
