//! 配置解析模块
//!
//! TOML / JSON 文档先按 `RelayConfig` 强类型解析（保留原始报错的行列信息），
//! 再与原始文档树比对，拒绝拼写错误等未知设置项。

use contracts::{ContractError, RelayConfig};
use serde_json::Value;

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
        }
    }
}

/// A parsed configuration document
#[derive(Debug)]
pub struct Document {
    pub config: RelayConfig,
    /// The document as written, used to tell explicit settings from defaults
    pub raw: Value,
}

impl Document {
    /// Whether `pointer` (e.g. `/collector/storage_path`) was set in the file
    pub fn is_set(&self, pointer: &str) -> bool {
        self.raw.pointer(pointer).is_some_and(|value| !value.is_null())
    }
}

/// 解析配置文档并拒绝未知设置项
pub fn parse(content: &str, format: ConfigFormat) -> Result<Document, ContractError> {
    let parse_error = |e: Box<dyn std::error::Error + Send + Sync>| ContractError::ConfigParse {
        message: format!("{} parse error: {e}", format.label()),
        source: Some(e),
    };

    let (config, raw): (RelayConfig, Value) = match format {
        ConfigFormat::Toml => (
            toml::from_str(content).map_err(|e| parse_error(Box::new(e)))?,
            toml::from_str(content).map_err(|e| parse_error(Box::new(e)))?,
        ),
        ConfigFormat::Json => (
            serde_json::from_str(content).map_err(|e| parse_error(Box::new(e)))?,
            serde_json::from_str(content).map_err(|e| parse_error(Box::new(e)))?,
        ),
    };

    let known = serde_json::to_value(&config)
        .map_err(|e| ContractError::config_parse(format!("config re-encode error: {e}")))?;
    if let Some(key) = find_unknown_key(&raw, &known, "") {
        return Err(ContractError::config_validation(
            key.clone(),
            format!("unknown relay setting `{key}`"),
        ));
    }

    Ok(Document { config, raw })
}

/// First key of `raw` with no counterpart in the fully-populated `known` tree
fn find_unknown_key(raw: &Value, known: &Value, prefix: &str) -> Option<String> {
    let (Value::Object(raw), Value::Object(known)) = (raw, known) else {
        return None;
    };

    raw.iter().find_map(|(key, value)| {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match known.get(key) {
            None => Some(path),
            Some(known) => find_unknown_key(value, known, &path),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{AmbientLightBackend, SinkKind, WireFormat};

    #[test]
    fn test_parse_toml() {
        let content = r#"
[collector]
endpoint = "http://localhost:3000/api/sensor-data"
interval_ms = 2000

[sensors.ambient_light]
backend = "iio"
device_path = "/sys/bus/iio/devices/iio:device0"

[server]
port = 8080
sink = "file"
"#;
        let doc = parse(content, ConfigFormat::Toml).unwrap();
        assert_eq!(doc.config.collector.interval_ms, 2000);
        assert_eq!(
            doc.config.sensors.ambient_light.backend,
            AmbientLightBackend::Iio
        );
        assert_eq!(doc.config.server.sink, SinkKind::File);
        assert!(doc.is_set("/server/port"));
        assert!(!doc.is_set("/server/sink_path"));
    }

    #[test]
    fn test_parse_json() {
        let content = r#"{
            "collector": {
                "endpoint": "http://localhost:3000/insert",
                "wire_format": "schema1"
            },
            "server": { "table": "Readings" }
        }"#;
        let doc = parse(content, ConfigFormat::Json).unwrap();
        assert_eq!(doc.config.collector.wire_format, WireFormat::Schema1);
        assert_eq!(doc.config.server.table, "Readings");
    }

    #[test]
    fn test_syntax_error() {
        let err = parse("invalid toml [[[", ConfigFormat::Toml).unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_unknown_backend() {
        let content = "[sensors.battery]\nbackend = \"acpi\"\n";
        assert!(parse(content, ConfigFormat::Toml).is_err());
    }

    #[test]
    fn test_misspelled_setting_rejected() {
        let content = "[collector]\nintervall_ms = 500\n";
        let err = parse(content, ConfigFormat::Toml).unwrap_err().to_string();
        assert!(err.contains("unknown relay setting `collector.intervall_ms`"), "got: {err}");

        let content = r#"{"sensors": {"orientation": {"frequency": 5}}}"#;
        let err = parse(content, ConfigFormat::Json).unwrap_err().to_string();
        assert!(err.contains("sensors.orientation.frequency"), "got: {err}");

        let err = parse("[metrics]\nport = 1\n", ConfigFormat::Toml)
            .unwrap_err()
            .to_string();
        assert!(err.contains("`metrics`"), "got: {err}");
    }

    #[test]
    fn test_optional_settings_are_known() {
        let content = r#"
[sensors.geolocation]
backend = "fixed"
latitude = 1.0
longitude = 2.0

[sensors.battery]
supply_path = "/sys/class/power_supply/BAT1"
"#;
        assert!(parse(content, ConfigFormat::Toml).is_ok());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
