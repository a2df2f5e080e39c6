//! 环境变量覆盖与相对路径解析
//!
//! 优先级：默认值 < 配置文件 < `TELEMETRY_RELAY_*` 环境变量 < 命令行参数。

use std::path::{Path, PathBuf};

use contracts::{ContractError, RelayConfig};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::parser::Document;

/// Prefix of every relay environment variable
pub const ENV_PREFIX: &str = "TELEMETRY_RELAY_";

/// Environment variables read by the loader, with the setting each one overrides
pub const ENV_SETTINGS: [(&str, &str); 9] = [
    ("ENDPOINT", "collector.endpoint"),
    ("INTERVAL_MS", "collector.interval_ms"),
    ("WIRE_FORMAT", "collector.wire_format"),
    ("STORAGE", "collector.storage_path"),
    ("SINK", "server.sink"),
    ("SINK_PATH", "server.sink_path"),
    ("DATASET", "server.dataset"),
    ("TABLE", "server.table"),
    ("TABLE_SCHEMA2", "server.table_schema2"),
];

/// Process environment, skipping variables that are not valid UTF-8
pub fn process_env() -> impl Iterator<Item = (String, String)> {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
}

/// Apply `TELEMETRY_RELAY_*` overrides, returning the settings that changed.
///
/// Relay variables the loader does not own (e.g. `TELEMETRY_RELAY_VERBOSE`)
/// are left to the CLI.
pub fn apply_env<I>(config: &mut RelayConfig, vars: I) -> Result<Vec<&'static str>, ContractError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut applied = Vec::new();

    for (key, value) in vars {
        let Some(name) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let Some(&(_, setting)) = ENV_SETTINGS.iter().find(|(env, _)| *env == name) else {
            continue;
        };

        let collector = &mut config.collector;
        let server = &mut config.server;
        match name {
            "ENDPOINT" => collector.endpoint = value,
            "INTERVAL_MS" => collector.interval_ms = parse_setting(&key, &value)?,
            "WIRE_FORMAT" => collector.wire_format = parse_setting(&key, &value)?,
            "STORAGE" => collector.storage_path = PathBuf::from(value),
            "SINK" => server.sink = parse_setting(&key, &value)?,
            "SINK_PATH" => server.sink_path = PathBuf::from(value),
            "DATASET" => server.dataset = value,
            "TABLE" => server.table = value,
            _ => server.table_schema2 = value,
        }
        applied.push(setting);
    }

    Ok(applied)
}

/// Parse an environment value the way the config file would spell it
fn parse_setting<T: DeserializeOwned>(key: &str, value: &str) -> Result<T, ContractError> {
    let trimmed = value.trim();
    let json = match trimmed.parse::<u64>() {
        Ok(number) => Value::from(number),
        Err(_) => Value::String(trimmed.to_lowercase()),
    };
    serde_json::from_value(json)
        .map_err(|e| ContractError::config_validation(key, format!("invalid value '{value}': {e}")))
}

/// Resolve relative paths written in the file against the file's directory.
///
/// Defaults and absolute paths are left untouched.
pub fn resolve_paths(doc: &mut Document, base_dir: &Path) {
    if doc.is_set("/collector/storage_path") {
        rebase(&mut doc.config.collector.storage_path, base_dir);
    }
    if doc.is_set("/server/sink_path") {
        rebase(&mut doc.config.server.sink_path, base_dir);
    }
}

fn rebase(path: &mut PathBuf, base_dir: &Path) {
    if path.is_relative() {
        *path = base_dir.join(&*path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, ConfigFormat};
    use contracts::{SinkKind, WireFormat};

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_env_overrides() {
        let mut config = RelayConfig::default();
        let applied = apply_env(
            &mut config,
            vars(&[
                ("TELEMETRY_RELAY_ENDPOINT", "http://relay:3000/insert"),
                ("TELEMETRY_RELAY_INTERVAL_MS", "2500"),
                ("TELEMETRY_RELAY_WIRE_FORMAT", "Schema1"),
                ("TELEMETRY_RELAY_SINK", "file"),
                ("TELEMETRY_RELAY_VERBOSE", "2"),
                ("PATH", "/usr/bin"),
            ]),
        )
        .unwrap();

        assert_eq!(config.collector.endpoint, "http://relay:3000/insert");
        assert_eq!(config.collector.interval_ms, 2500);
        assert_eq!(config.collector.wire_format, WireFormat::Schema1);
        assert_eq!(config.server.sink, SinkKind::File);
        assert_eq!(
            applied,
            vec![
                "collector.endpoint",
                "collector.interval_ms",
                "collector.wire_format",
                "server.sink"
            ]
        );
    }

    #[test]
    fn test_invalid_env_value() {
        let mut config = RelayConfig::default();
        let err = apply_env(&mut config, vars(&[("TELEMETRY_RELAY_INTERVAL_MS", "soon")]))
            .unwrap_err()
            .to_string();
        assert!(err.contains("TELEMETRY_RELAY_INTERVAL_MS"), "got: {err}");

        let err = apply_env(&mut config, vars(&[("TELEMETRY_RELAY_SINK", "bigquery")]))
            .unwrap_err()
            .to_string();
        assert!(err.contains("invalid value 'bigquery'"), "got: {err}");
    }

    #[test]
    fn test_relative_paths_follow_config_file() {
        let content = r#"
[collector]
storage_path = "state/storage.json"

[server]
sink_path = "/var/lib/relay"
"#;
        let mut doc = parse(content, ConfigFormat::Toml).unwrap();
        resolve_paths(&mut doc, Path::new("/etc/relay"));

        assert_eq!(
            doc.config.collector.storage_path,
            PathBuf::from("/etc/relay/state/storage.json")
        );
        assert_eq!(doc.config.server.sink_path, PathBuf::from("/var/lib/relay"));
    }

    #[test]
    fn test_defaults_stay_relative_to_cwd() {
        let mut doc = parse("", ConfigFormat::Toml).unwrap();
        resolve_paths(&mut doc, Path::new("/etc/relay"));
        assert_eq!(
            doc.config.collector.storage_path,
            RelayConfig::default().collector.storage_path
        );
    }
}
