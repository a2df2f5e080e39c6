//! Collection session orchestrator - wires sensors, assembler, delivery
//! client and display into one `CollectionLoop`.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use collector::{CollectionLoop, ConsoleDisplay, InstanceIdStore, NoticeTtl, SampleAssembler};
use contracts::RelayConfig;
use delivery::HttpDeliveryClient;
use sensors::SourceFactory;
use tracing::{info, warn};

use super::CollectStats;
use crate::error::CliError;

/// Collection run configuration
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Validated relay configuration
    pub config: RelayConfig,

    /// Stop after this long (None = until shutdown)
    pub duration: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main collection orchestrator
pub struct CollectPipeline {
    options: CollectOptions,
}

impl CollectPipeline {
    pub fn new(options: CollectOptions) -> Self {
        Self { options }
    }

    /// Run one session until `shutdown` resolves or the duration elapses
    pub async fn run<F>(self, shutdown: F) -> Result<CollectStats>
    where
        F: Future<Output = ()>,
    {
        let config = &self.options.config;
        let collector_config = &config.collector;

        if let Some(port) = self.options.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let store = InstanceIdStore::new(collector_config.storage_path.clone());
        let instance_id = store.load_or_create().with_context(|| {
            format!(
                "Failed to load instance id from {}",
                collector_config.storage_path.display()
            )
        })?;
        info!(instance_id = %instance_id, "Collector instance");

        let suite = SourceFactory::new()
            .build(&config.sensors)
            .context("Failed to build sensor sources")?;
        info!(sources = suite.len(), "Sensor sources ready");

        let client = HttpDeliveryClient::new(collector_config.wire_format);
        let delivery_metrics = Arc::clone(client.metrics());
        let display = Arc::new(ConsoleDisplay::new(NoticeTtl {
            success: Duration::from_millis(collector_config.success_notice_ms),
            failure: Duration::from_millis(collector_config.failure_notice_ms),
        }));

        let mut collection =
            CollectionLoop::new(SampleAssembler::new(suite, instance_id.clone()), client, display);

        let started = Instant::now();
        collection
            .start(
                Duration::from_millis(collector_config.interval_ms),
                collector_config.endpoint.clone(),
            )
            .await
            .map_err(|e| CliError::collection(e.to_string()))?;

        match self.options.duration {
            Some(duration) => {
                tokio::select! {
                    _ = tokio::time::sleep(duration) => {
                        info!(duration_secs = duration.as_secs_f64(), "Collection duration elapsed");
                    }
                    _ = shutdown => {
                        warn!("Received shutdown signal, stopping collection...");
                    }
                }
            }
            None => {
                shutdown.await;
                warn!("Received shutdown signal, stopping collection...");
            }
        }

        collection.stop().await;

        Ok(CollectStats {
            instance_id,
            ticks: collection.ticks(),
            duration: started.elapsed(),
            summary: collection.stats().summary(),
            delivery: delivery_metrics.snapshot(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        AmbientLightBackend, BatteryBackend, GeolocationBackend, OrientationBackend,
    };
    use tempfile::tempdir;

    fn options(storage: &std::path::Path, endpoint: String) -> CollectOptions {
        let mut config = RelayConfig::default();
        config.collector.endpoint = endpoint;
        config.collector.interval_ms = 50;
        config.collector.storage_path = storage.join("storage.json");
        config.sensors.geolocation.backend = GeolocationBackend::Unsupported;
        config.sensors.ambient_light.backend = AmbientLightBackend::Unsupported;
        config.sensors.orientation.backend = OrientationBackend::Unsupported;
        config.sensors.battery.backend = BatteryBackend::Unsupported;

        CollectOptions {
            config,
            duration: None,
            metrics_port: None,
        }
    }

    #[tokio::test]
    async fn test_run_until_shutdown() {
        let dir = tempdir().unwrap();
        // 无人监听的端口：投递全部归为 NetworkFailure
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let pipeline =
            CollectPipeline::new(options(dir.path(), format!("http://{addr}/api/sensor-data")));
        let stats = pipeline
            .run(tokio::time::sleep(Duration::from_millis(120)))
            .await
            .unwrap();

        assert!(stats.ticks >= 2);
        assert!(stats.summary.total_samples >= 2);
        // 所有传感器均不可用，每个样本都含合成字段
        assert_eq!(
            stats.summary.samples_with_synthetic,
            stats.summary.total_samples
        );
        assert_eq!(stats.delivery.delivered, 0);

        // 同一存储文件，实例 id 不变
        let again = InstanceIdStore::new(dir.path().join("storage.json"))
            .load_or_create()
            .unwrap();
        assert_eq!(again, stats.instance_id);
    }

    #[tokio::test]
    async fn test_duration_stops_session() {
        let dir = tempdir().unwrap();
        let mut options = options(dir.path(), "http://127.0.0.1:9/api/sensor-data".into());
        options.duration = Some(Duration::from_millis(60));

        let stats = CollectPipeline::new(options)
            .run(std::future::pending::<()>())
            .await
            .unwrap();
        assert!(stats.ticks >= 1);
    }
}
