//! 配置校验模块
//!
//! 校验规则：
//! - interval_ms > 0, 超时 > 0
//! - endpoint 为空或为 http(s) URL
//! - fixed 地理位置必须给出合法经纬度
//! - 0.001 <= frequency_hz <= 1000
//! - 表名/数据集名非空

use contracts::{ContractError, GeolocationBackend, RelayConfig};

/// 校验 RelayConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &RelayConfig) -> Result<(), ContractError> {
    validate_collector(config)?;
    validate_geolocation(config)?;
    validate_device_settings(config)?;
    validate_server(config)?;
    Ok(())
}

/// 校验采集循环配置
fn validate_collector(config: &RelayConfig) -> Result<(), ContractError> {
    let collector = &config.collector;

    if collector.interval_ms == 0 {
        return Err(ContractError::config_validation(
            "collector.interval_ms",
            "interval_ms must be > 0",
        ));
    }

    let endpoint = collector.endpoint.trim();
    if !endpoint.is_empty()
        && !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
    {
        return Err(ContractError::config_validation(
            "collector.endpoint",
            format!("endpoint must be an http(s) URL, got '{endpoint}'"),
        ));
    }

    if collector.storage_path.as_os_str().is_empty() {
        return Err(ContractError::config_validation(
            "collector.storage_path",
            "storage_path cannot be empty",
        ));
    }

    Ok(())
}

/// 校验地理位置配置
fn validate_geolocation(config: &RelayConfig) -> Result<(), ContractError> {
    let geo = &config.sensors.geolocation;

    if geo.timeout_ms == 0 {
        return Err(ContractError::config_validation(
            "sensors.geolocation.timeout_ms",
            "timeout_ms must be > 0",
        ));
    }

    if geo.accuracy < 0.0 {
        return Err(ContractError::config_validation(
            "sensors.geolocation.accuracy",
            format!("accuracy must be >= 0, got {}", geo.accuracy),
        ));
    }

    if geo.backend == GeolocationBackend::Fixed
        && (geo.latitude.is_none() || geo.longitude.is_none())
    {
        return Err(ContractError::config_validation(
            "sensors.geolocation",
            "fixed backend requires latitude and longitude",
        ));
    }

    if geo.backend == GeolocationBackend::Gpsd && geo.gpsd_addr.trim().is_empty() {
        return Err(ContractError::config_validation(
            "sensors.geolocation.gpsd_addr",
            "gpsd backend requires gpsd_addr",
        ));
    }

    if let Some(latitude) = geo.latitude {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ContractError::config_validation(
                "sensors.geolocation.latitude",
                format!("latitude must be within [-90, 90], got {latitude}"),
            ));
        }
    }

    if let Some(longitude) = geo.longitude {
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ContractError::config_validation(
                "sensors.geolocation.longitude",
                format!("longitude must be within [-180, 180], got {longitude}"),
            ));
        }
    }

    Ok(())
}

/// 设备采样率允许范围 (Hz)
const FREQUENCY_RANGE_HZ: std::ops::RangeInclusive<f64> = 0.001..=1000.0;

/// 校验设备采样率与超时
fn validate_device_settings(config: &RelayConfig) -> Result<(), ContractError> {
    let sensors = &config.sensors;

    let frequencies = [
        (
            "sensors.ambient_light.frequency_hz",
            sensors.ambient_light.frequency_hz,
        ),
        (
            "sensors.orientation.frequency_hz",
            sensors.orientation.frequency_hz,
        ),
    ];
    for (field, frequency_hz) in frequencies {
        if !FREQUENCY_RANGE_HZ.contains(&frequency_hz) {
            return Err(ContractError::config_validation(
                field,
                format!(
                    "frequency_hz must be within {}..={} Hz, got {frequency_hz}",
                    FREQUENCY_RANGE_HZ.start(),
                    FREQUENCY_RANGE_HZ.end()
                ),
            ));
        }
    }

    let timeouts = [
        (
            "sensors.ambient_light.timeout_ms",
            sensors.ambient_light.timeout_ms,
        ),
        ("sensors.battery.timeout_ms", sensors.battery.timeout_ms),
    ];
    for (field, timeout_ms) in timeouts {
        if timeout_ms == 0 {
            return Err(ContractError::config_validation(
                field,
                "timeout_ms must be > 0",
            ));
        }
    }

    Ok(())
}

/// 校验服务端配置
fn validate_server(config: &RelayConfig) -> Result<(), ContractError> {
    let server = &config.server;

    let names = [
        ("server.dataset", &server.dataset),
        ("server.table", &server.table),
        ("server.table_schema2", &server.table_schema2),
    ];
    for (field, name) in names {
        if name.trim().is_empty() {
            return Err(ContractError::config_validation(
                field,
                "name cannot be empty",
            ));
        }
    }

    if server.host.trim().is_empty() {
        return Err(ContractError::config_validation(
            "server.host",
            "host cannot be empty",
        ));
    }

    Ok(())
}
