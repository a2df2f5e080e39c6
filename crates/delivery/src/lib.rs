//! # Delivery
//!
//! 样本投递模块。
//!
//! 负责：
//! - 把 `Sample` 编码为服务端期望的请求体
//! - 每个样本一次 POST，不重试
//! - 把结果归类为 `DeliveryOutcome`

pub mod client;
pub mod metrics;
pub mod wire;

pub use client::HttpDeliveryClient;
pub use contracts::{DeliveryOutcome, SampleTransport, WireFormat};
pub use metrics::{DeliveryMetrics, MetricsSnapshot};
pub use wire::{decode_sensor_record, encode, SensorRecord};
