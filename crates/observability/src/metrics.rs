//! Relay 指标收集模块
//!
//! 采集端（tick / 传感器降级 / 投递结果）与服务端（入库状态 / 传输延迟）的
//! 运行指标，外加进程内的统计聚合。

use std::collections::BTreeMap;

use contracts::{DeliveryOutcome, Sample, SensorKind};
use metrics::{counter, gauge, histogram};

/// 从 Sample 记录采集指标
///
/// 每个 tick 组装出 Sample 后调用。
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_sample_metrics;
///
/// let sample = assembler.assemble().await;
/// record_sample_metrics(&sample, acquisition_ms);
/// ```
pub fn record_sample_metrics(sample: &Sample, acquisition_ms: f64) {
    counter!("telemetry_relay_samples_total").increment(1);

    histogram!("telemetry_relay_acquisition_ms").record(acquisition_ms);

    // 合成字段
    let synthetic = sample.synthetic_kinds();
    gauge!("telemetry_relay_synthetic_fields_current").set(synthetic.len() as f64);
    if !synthetic.is_empty() {
        counter!("telemetry_relay_samples_with_synthetic_total").increment(1);
        for kind in synthetic {
            counter!("telemetry_relay_synthetic_field_total", "sensor" => kind.as_str())
                .increment(1);
        }
    }
}

/// 记录单个传感器降级原因
pub fn record_sensor_fault(kind: SensorKind, fault: &str) {
    counter!(
        "telemetry_relay_sensor_faults_total",
        "sensor" => kind.as_str(),
        "fault" => fault.to_string()
    )
    .increment(1);
}

/// 记录一次投递结果
pub fn record_delivery(transport: &str, outcome: &DeliveryOutcome, latency_ms: f64) {
    counter!(
        "telemetry_relay_deliveries_total",
        "transport" => transport.to_string(),
        "outcome" => outcome.label()
    )
    .increment(1);

    histogram!(
        "telemetry_relay_delivery_latency_ms",
        "transport" => transport.to_string()
    )
    .record(latency_ms);
}

/// 记录服务端请求处理结果
pub fn record_ingest(route: &str, status: u16) {
    counter!(
        "telemetry_relay_ingest_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// 记录入库行数
pub fn record_rows_inserted(table: &str, rows: usize) {
    counter!(
        "telemetry_relay_rows_inserted_total",
        "table" => table.to_string()
    )
    .increment(rows as u64);
}

/// 记录传输延迟 (客户端采集时间 -> 服务端接收时间)
///
/// 两端时钟不保证单调一致，负值照常记录。
pub fn record_transit_latency_ms(latency_ms: f64) {
    histogram!("telemetry_relay_transit_latency_ms").record(latency_ms);
}

/// 记录采集会话状态 (1 = Running)
pub fn record_session_running(running: bool) {
    gauge!("telemetry_relay_session_running").set(if running { 1.0 } else { 0.0 });
}

/// 采集指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct CollectionStatsAggregator {
    /// 总样本数
    pub total_samples: u64,

    /// 含合成字段的样本数
    pub samples_with_synthetic: u64,

    /// 各传感器合成次数
    pub synthetic_counts: BTreeMap<SensorKind, u64>,

    /// 各投递结果次数
    pub outcome_counts: BTreeMap<&'static str, u64>,

    /// 采集耗时统计
    pub acquisition_stats: RunningStats,

    /// 投递耗时统计
    pub delivery_stats: RunningStats,
}

impl CollectionStatsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一个样本
    pub fn record_sample(&mut self, sample: &Sample, acquisition_ms: f64) {
        self.total_samples += 1;
        self.acquisition_stats.push(acquisition_ms);

        let synthetic = sample.synthetic_kinds();
        if !synthetic.is_empty() {
            self.samples_with_synthetic += 1;
            for kind in synthetic {
                *self.synthetic_counts.entry(kind).or_insert(0) += 1;
            }
        }
    }

    /// 记录一次投递
    pub fn record_delivery(&mut self, outcome: &DeliveryOutcome, latency_ms: f64) {
        *self.outcome_counts.entry(outcome.label()).or_insert(0) += 1;
        self.delivery_stats.push(latency_ms);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> CollectionSummary {
        let deliveries: u64 = self.outcome_counts.values().sum();
        let delivered = self.outcome_counts.get("delivered").copied().unwrap_or(0);

        CollectionSummary {
            total_samples: self.total_samples,
            samples_with_synthetic: self.samples_with_synthetic,
            synthetic_rate: percent(self.samples_with_synthetic, self.total_samples),
            deliveries,
            delivered,
            delivery_success_rate: percent(delivered, deliveries),
            acquisition_ms: StatsSummary::from(&self.acquisition_stats),
            delivery_ms: StatsSummary::from(&self.delivery_stats),
            synthetic_counts: self.synthetic_counts.clone(),
        }
    }
}

fn percent(part: u64, total: u64) -> f64 {
    if total > 0 {
        part as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct CollectionSummary {
    pub total_samples: u64,
    pub samples_with_synthetic: u64,
    pub synthetic_rate: f64,
    pub deliveries: u64,
    pub delivered: u64,
    pub delivery_success_rate: f64,
    pub acquisition_ms: StatsSummary,
    pub delivery_ms: StatsSummary,
    pub synthetic_counts: BTreeMap<SensorKind, u64>,
}

impl std::fmt::Display for CollectionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Collection Summary ===")?;
        writeln!(f, "Total samples: {}", self.total_samples)?;
        writeln!(
            f,
            "Samples with synthetic fields: {} ({:.2}%)",
            self.samples_with_synthetic, self.synthetic_rate
        )?;
        writeln!(
            f,
            "Delivered: {}/{} ({:.2}%)",
            self.delivered, self.deliveries, self.delivery_success_rate
        )?;
        writeln!(f, "Acquisition (ms): {}", self.acquisition_ms)?;
        writeln!(f, "Delivery (ms): {}", self.delivery_ms)?;

        if !self.synthetic_counts.is_empty() {
            writeln!(f, "Synthetic counts:")?;
            for (kind, count) in &self.synthetic_counts {
                writeln!(f, "  {}: {}", kind, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
