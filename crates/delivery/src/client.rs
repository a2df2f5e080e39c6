//! HttpDeliveryClient - one POST per sample, no retry

use std::sync::Arc;

use contracts::{DeliveryOutcome, Sample, SampleTransport, WireFormat};
use tracing::{debug, instrument, warn};

use crate::metrics::DeliveryMetrics;
use crate::wire;

/// HTTP delivery client
///
/// Classification:
/// - 2xx -> `Delivered`, `ack` is the response body
/// - other status -> `Rejected`, `reason` is the response body, or the
///   canonical reason phrase when the body is empty
/// - no response -> `NetworkFailure`
#[derive(Debug, Clone)]
pub struct HttpDeliveryClient {
    client: reqwest::Client,
    format: WireFormat,
    metrics: Arc<DeliveryMetrics>,
}

impl HttpDeliveryClient {
    pub fn new(format: WireFormat) -> Self {
        Self::with_client(reqwest::Client::new(), format)
    }

    /// Use a preconfigured reqwest client (proxies, timeouts, TLS)
    pub fn with_client(client: reqwest::Client, format: WireFormat) -> Self {
        Self {
            client,
            format,
            metrics: Arc::new(DeliveryMetrics::new()),
        }
    }

    pub fn format(&self) -> WireFormat {
        self.format
    }

    pub fn metrics(&self) -> &Arc<DeliveryMetrics> {
        &self.metrics
    }

    async fn post(&self, sample: &Sample, endpoint: &str) -> DeliveryOutcome {
        let body = match wire::encode(sample, self.format) {
            Ok(body) => body,
            Err(e) => {
                return DeliveryOutcome::NetworkFailure {
                    reason: format!("body encoding failed: {e}"),
                }
            }
        };

        let response = match self.client.post(endpoint).json(&body).send().await {
            Ok(response) => response,
            Err(e) => {
                return DeliveryOutcome::NetworkFailure {
                    reason: e.to_string(),
                }
            }
        };

        let status = response.status();
        // 响应体读取失败不影响分类
        let text = response.text().await.unwrap_or_default();

        if status.is_success() {
            self.metrics.set_last_status(status.as_u16());
            DeliveryOutcome::Delivered { ack: text }
        } else {
            let reason = if text.trim().is_empty() {
                status.canonical_reason().unwrap_or("unknown status").to_string()
            } else {
                text
            };
            DeliveryOutcome::Rejected {
                status: status.as_u16(),
                reason,
            }
        }
    }
}

impl SampleTransport for HttpDeliveryClient {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(
        name = "http_delivery",
        skip(self, sample),
        fields(format = ?self.format, captured_at = sample.captured_at)
    )]
    async fn deliver(&self, sample: &Sample, endpoint: &str) -> DeliveryOutcome {
        let outcome = self.post(sample, endpoint).await;
        self.metrics.record(&outcome);

        match &outcome {
            DeliveryOutcome::Delivered { ack } => debug!(ack = %ack, "sample delivered"),
            DeliveryOutcome::Rejected { status, reason } => {
                warn!(status, reason = %reason, "sample rejected")
            }
            DeliveryOutcome::NetworkFailure { reason } => {
                warn!(reason = %reason, "sample delivery failed")
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use contracts::{BatteryStatus, Field, GeoFix, LightLevel, OrientationAngles};
    use serde_json::Value;
    use std::sync::Mutex;
    use tokio::net::TcpListener;

    fn sample() -> Sample {
        Sample {
            captured_at: 1_700_000_000_000,
            instance_id: "instance".into(),
            geolocation: Field::live(GeoFix {
                latitude: 1.0,
                longitude: 2.0,
                accuracy: 3.0,
            }),
            ambient_light: Field::live(LightLevel::rounded(4.0)),
            orientation: Field::live(OrientationAngles {
                alpha: 5.0,
                beta: 6.0,
                gamma: 7.0,
            }),
            battery: Field::live(BatteryStatus {
                charging: true,
                level: 0.8,
            }),
        }
    }

    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_delivered_with_body() {
        let received = Arc::new(Mutex::new(None));
        let received_clone = received.clone();
        let router = Router::new().route(
            "/api/sensor-data",
            post(move |Json(body): Json<Value>| {
                let received = received_clone.clone();
                async move {
                    *received.lock().unwrap() = Some(body);
                    "Data received successfully"
                }
            }),
        );
        let base = serve(router).await;

        let client = HttpDeliveryClient::new(WireFormat::SensorData);
        let outcome = client
            .deliver(&sample(), &format!("{base}/api/sensor-data"))
            .await;

        assert_eq!(
            outcome,
            DeliveryOutcome::Delivered {
                ack: "Data received successfully".into()
            }
        );
        let body = received.lock().unwrap().clone().unwrap();
        assert_eq!(body["browserInstanceId"], "instance");
        assert_eq!(client.metrics().snapshot().last_status, Some(200));
    }

    #[tokio::test]
    async fn test_rejected_uses_reason_phrase() {
        let router = Router::new().route(
            "/api/sensor-data",
            post(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        );
        let base = serve(router).await;

        let client = HttpDeliveryClient::new(WireFormat::SensorData);
        let outcome = client
            .deliver(&sample(), &format!("{base}/api/sensor-data"))
            .await;

        assert_eq!(
            outcome,
            DeliveryOutcome::Rejected {
                status: 503,
                reason: "Service Unavailable".into()
            }
        );
        assert_eq!(client.metrics().rejected(), 1);
    }

    #[tokio::test]
    async fn test_rejected_uses_body_text() {
        let router = Router::new().route(
            "/insert",
            post(|| async { (StatusCode::BAD_REQUEST, "Request body must be a JSON object.") }),
        );
        let base = serve(router).await;

        let outcome = HttpDeliveryClient::new(WireFormat::Schema1)
            .deliver(&sample(), &format!("{base}/insert"))
            .await;

        assert_eq!(
            outcome,
            DeliveryOutcome::Rejected {
                status: 400,
                reason: "Request body must be a JSON object.".into()
            }
        );
    }

    #[tokio::test]
    async fn test_network_failure() {
        // 绑定后立即释放端口，保证无人监听
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpDeliveryClient::new(WireFormat::SensorData);
        let outcome = client
            .deliver(&sample(), &format!("http://{addr}/api/sensor-data"))
            .await;

        assert!(matches!(outcome, DeliveryOutcome::NetworkFailure { .. }));
        assert_eq!(client.metrics().network_failures(), 1);
    }

    #[tokio::test]
    async fn test_invalid_url_is_network_failure() {
        let outcome = HttpDeliveryClient::new(WireFormat::SensorData)
            .deliver(&sample(), "not a url")
            .await;
        assert!(matches!(outcome, DeliveryOutcome::NetworkFailure { .. }));
    }
}
