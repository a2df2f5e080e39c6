//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 采集端 -> 真实 socket -> 入库服务的 e2e 测试
//! - 入库端点的状态码约定

#[cfg(test)]
mod support {
    use std::time::Duration;

    use contracts::WarehouseSink;
    use ingest_server::{AppState, LazySink, MemoryWarehouse, TableNames};
    use tokio::net::TcpListener;

    /// Start an ingest server on an ephemeral port, return its base URL
    pub async fn spawn_server<S>(state: AppState<S>) -> String
    where
        S: WarehouseSink + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(ingest_server::serve_on(
            listener,
            state,
            std::future::pending::<()>(),
        ));
        format!("http://{addr}")
    }

    /// Ingest server backed by an in-memory warehouse
    pub async fn spawn_memory_server() -> (String, MemoryWarehouse) {
        let memory = MemoryWarehouse::new("memory");
        let shared = memory.clone();
        let state = AppState::new(LazySink::new(move || Ok(shared.clone())), TableNames::default());
        (spawn_server(state).await, memory)
    }

    /// Poll `condition` for up to 5 s
    pub async fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        for _ in 0..100 {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        condition()
    }
}

#[cfg(test)]
mod contract_tests {
    use contracts::{Field, GeoFix, SensorKind};

    #[test]
    fn test_contracts_compile() {
        // 验证 contracts crate 可编译
        let _ = contracts::ConfigVersion::V1;
        assert_eq!(SensorKind::ALL.len(), 4);
    }

    #[test]
    fn test_field_serializes_marker() {
        let field = Field::synthetic(
            GeoFix {
                latitude: 0.0,
                longitude: 0.0,
                accuracy: 0.0,
            },
            "geolocation unavailable",
        );
        let value = serde_json::to_value(&field).unwrap();
        assert_eq!(value["reason"], "geolocation unavailable");
    }
}

#[cfg(test)]
mod ingest_e2e {
    use contracts::{ContractError, RelayConfig, Row, SinkKind, WarehouseSink};
    use ingest_server::{AppState, LazySink, TableNames};
    use serde_json::{json, Value};

    use crate::support::{spawn_memory_server, spawn_server};

    struct FailingWarehouse;

    impl WarehouseSink for FailingWarehouse {
        fn name(&self) -> &str {
            "failing"
        }

        async fn insert(&self, _: &str, _: &str, _: Vec<Row>) -> Result<(), ContractError> {
            Err(ContractError::sink_write(
                "failing",
                "permission denied on dataset Sensor_Data",
            ))
        }
    }

    /// `/insert` stores `sensor_record` as a JSON string
    #[tokio::test]
    async fn test_insert_stringifies_sensor_record() {
        let (base, memory) = spawn_memory_server().await;

        let response = reqwest::Client::new()
            .post(format!("{base}/insert"))
            .json(&json!({
                "unique_id": "abc",
                "frontend_timestamp": "2024-01-01T00:00:00Z",
                "sensor_record": {"lat": 1, "lon": 2},
                "log_entry": "ok",
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);

        let rows = memory.rows("Sensor_Data_Table");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["unique_id"], "abc");
        assert_eq!(
            rows[0]["sensor_record"],
            Value::String("{\"lat\":1,\"lon\":2}".to_string())
        );
        assert!(rows[0]["backend_timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_batch_policy() {
        let (base, memory) = spawn_memory_server().await;
        let client = reqwest::Client::new();

        // 空数组 -> 400
        let response = client
            .post(format!("{base}/insert-batch"))
            .json(&json!([]))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);

        // 缺少 sensor_record -> 400，且整批不入库
        let response = client
            .post(format!("{base}/insert-batch"))
            .json(&json!([
                {"unique_id": "a", "frontend_time_stamp": "t1", "sensor_record": {"x": 1}},
                {"unique_id": "b", "frontend_time_stamp": "t2"},
            ]))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["details"], "record 1 is missing sensor_record");
        assert_eq!(memory.total_rows(), 0);

        let response = client
            .post(format!("{base}/insert-batch"))
            .json(&json!([
                {"unique_id": "a", "frontend_time_stamp": "t1", "sensor_record": {"x": 1}},
            ]))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(memory.rows("Sensor_Data_Table").len(), 1);
    }

    #[tokio::test]
    async fn test_sink_failure_never_leaks() {
        let state = AppState::new(LazySink::new(|| Ok(FailingWarehouse)), TableNames::default());
        let base = spawn_server(state).await;
        let client = reqwest::Client::new();

        for (route, body) in [
            ("/insert", json!({"unique_id": "a"})),
            ("/insert-table2", json!({"unique_id": "a"})),
            (
                "/insert-batch",
                json!([{"unique_id": "a", "frontend_time_stamp": "t", "sensor_record": "x"}]),
            ),
        ] {
            let response = client
                .post(format!("{base}{route}"))
                .json(&body)
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), 500, "route {route}");
            let text = response.text().await.unwrap();
            assert!(!text.contains("permission denied"), "route {route}: {text}");
            assert!(!text.contains("Sensor_Data"), "route {route}: {text}");
        }
    }

    #[tokio::test]
    async fn test_file_sink_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = RelayConfig::default();
        config.server.sink = SinkKind::File;
        config.server.sink_path = dir.path().join("warehouse");

        let state = AppState::from_config(&config.server);
        let base = spawn_server(state.clone()).await;
        // 首次请求前不初始化 sink
        assert!(!state.sink().is_initialized());
        assert!(!config.server.sink_path.exists());

        let response = reqwest::Client::new()
            .post(format!("{base}/insert-table2"))
            .json(&json!({"unique_id": "abc", "temperature": 21.5}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert!(state.sink().is_initialized());

        let path = config
            .server
            .sink_path
            .join("Sensor_Data")
            .join("Sensor_Data_Table_schema_2.ndjson");
        let content = std::fs::read_to_string(path).unwrap();
        let row: Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(row["unique_id"], "abc");
        assert_eq!(row["temperature"], 21.5);
    }
}

#[cfg(test)]
mod collector_e2e {
    use std::sync::Arc;
    use std::time::Duration;

    use collector::{
        CollectionLoop, InstanceIdStore, MemoryDisplay, NoticeLevel, SampleAssembler,
        SessionStatus,
    };
    use contracts::{
        AmbientLightBackend, OrientationBackend, RelayConfig, SensorsConfig, WireFormat,
    };
    use delivery::{decode_sensor_record, HttpDeliveryClient};
    use sensors::SourceFactory;

    use crate::support::{spawn_memory_server, wait_for};

    fn sensors_config() -> SensorsConfig {
        let mut config = RelayConfig::default().sensors;
        config.ambient_light.frequency_hz = 20.0;
        config.orientation.frequency_hz = 20.0;
        config
    }

    fn collection(
        instance_id: &str,
        format: WireFormat,
        display: Arc<MemoryDisplay>,
    ) -> CollectionLoop<HttpDeliveryClient> {
        let suite = SourceFactory::new().build(&sensors_config()).unwrap();
        CollectionLoop::new(
            SampleAssembler::new(suite, instance_id),
            HttpDeliveryClient::new(format),
            display,
        )
    }

    /// 采集端以 schema1 投递到 /insert，服务端入库
    #[tokio::test]
    async fn test_collect_to_insert() {
        let (base, memory) = spawn_memory_server().await;
        let dir = tempfile::tempdir().unwrap();
        let instance_id = InstanceIdStore::new(dir.path().join("storage.json"))
            .load_or_create()
            .unwrap();

        let display = Arc::new(MemoryDisplay::new());
        let mut collection = collection(&instance_id, WireFormat::Schema1, display.clone());
        collection
            .start(Duration::from_millis(200), format!("{base}/insert"))
            .await
            .unwrap();
        assert_eq!(collection.status(), SessionStatus::Running);

        assert!(wait_for(|| memory.rows("Sensor_Data_Table").len() >= 2).await);
        collection.stop().await;

        let rows = memory.rows("Sensor_Data_Table");
        for row in &rows {
            assert_eq!(row["unique_id"], instance_id.as_str());
            assert!(row["frontend_timestamp"].as_str().unwrap().ends_with('Z'));
            assert!(row["backend_timestamp"].is_string());

            let record = decode_sensor_record(row["sensor_record"].as_str().unwrap()).unwrap();
            assert!((-90.0..=90.0).contains(&record.geolocation.latitude));
            assert!((0.0..=1.0).contains(&record.battery.level));
        }

        assert!(wait_for(|| !display.notices().is_empty()).await);
        let notices = display.notices();
        assert!(notices.iter().all(|n| n.level == NoticeLevel::Success));
        assert_eq!(notices[0].message, "Data sent successfully");
    }

    #[tokio::test]
    async fn test_collect_to_sensor_data() {
        let (base, memory) = spawn_memory_server().await;
        let display = Arc::new(MemoryDisplay::new());

        let mut collection = collection("instance-1", WireFormat::SensorData, display.clone());
        collection
            .start(Duration::from_millis(200), format!("{base}/api/sensor-data"))
            .await
            .unwrap();

        assert!(wait_for(|| display.notices().len() >= 2).await);
        collection.stop().await;

        assert!(display
            .notices()
            .iter()
            .all(|n| n.level == NoticeLevel::Success));
        // /api/sensor-data 只记录，不写仓库
        assert_eq!(memory.total_rows(), 0);
        assert!(display.samples().len() >= 2);
    }

    /// 拒绝结果以失败通知呈现，循环继续
    #[tokio::test]
    async fn test_rejection_surfaces_as_notice() {
        let (base, _memory) = spawn_memory_server().await;
        let display = Arc::new(MemoryDisplay::new());

        // /insert-batch 只接受数组，单个 schema1 对象被 400 拒绝
        let mut collection = collection("instance-2", WireFormat::Schema1, display.clone());
        collection
            .start(Duration::from_millis(150), format!("{base}/insert-batch"))
            .await
            .unwrap();

        assert!(wait_for(|| display.notices().len() >= 2).await);
        assert_eq!(collection.status(), SessionStatus::Running);
        collection.stop().await;

        let notices = display.notices();
        assert!(notices.iter().all(|n| n.level == NoticeLevel::Failure));
        assert!(notices[0].message.starts_with("Failed to send data: 400"));
    }

    #[tokio::test]
    async fn test_synthetic_fallback_reaches_server() {
        let (base, memory) = spawn_memory_server().await;
        let mut config = sensors_config();
        config.ambient_light.backend = AmbientLightBackend::Unsupported;
        config.orientation.backend = OrientationBackend::Unsupported;

        let suite = SourceFactory::new().build(&config).unwrap();
        let mut collection = CollectionLoop::new(
            SampleAssembler::new(suite, "instance-3"),
            HttpDeliveryClient::new(WireFormat::Schema1),
            Arc::new(MemoryDisplay::new()),
        );
        collection
            .start(Duration::from_millis(500), format!("{base}/insert"))
            .await
            .unwrap();

        assert!(wait_for(|| memory.total_rows() >= 1).await);
        collection.stop().await;

        let row = &memory.rows("Sensor_Data_Table")[0];
        assert_eq!(
            row["log_entry"],
            "synthetic fallback: ambient_light, orientation"
        );
        let record = decode_sensor_record(row["sensor_record"].as_str().unwrap()).unwrap();
        assert!(record.ambient_light.error.is_some());
        assert!(record.orientation.error.is_some());
        assert!(record.geolocation.error.is_none());
        assert!((0.0..=1000.0).contains(&record.ambient_light.illuminance));
    }
}

#[cfg(test)]
mod config_e2e {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{SinkKind, WireFormat};

    #[test]
    fn test_full_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.toml");
        std::fs::write(
            &path,
            r#"
[collector]
endpoint = "http://localhost:3000/insert"
interval_ms = 2000
wire_format = "schema1"

[sensors.geolocation]
backend = "fixed"
latitude = 51.5
longitude = -0.12

[server]
port = 8080
sink = "memory"
"#,
        )
        .unwrap();

        let config = ConfigLoader::load_from_path(&path).unwrap();
        assert_eq!(config.collector.wire_format, WireFormat::Schema1);
        assert_eq!(config.server.sink, SinkKind::Memory);

        let toml = ConfigLoader::to_toml(&config).unwrap();
        let reloaded = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        assert_eq!(reloaded.collector.interval_ms, 2000);
        assert_eq!(reloaded.sensors.geolocation.latitude, Some(51.5));
        assert_eq!(reloaded.server.port, 8080);
    }
}
