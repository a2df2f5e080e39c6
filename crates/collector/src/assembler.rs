//! SampleAssembler - one structurally complete Sample per tick
//!
//! Every registered source runs as its own task under its own budget. A
//! fault only degrades the matching field, which then carries a synthetic
//! value and the fault text.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use contracts::{Field, Reading, Sample, SensorFault, SensorKind};
use sensors::SensorSuite;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{error, instrument, warn};

use crate::synthetic;

type Outcomes = BTreeMap<SensorKind, Result<Reading, SensorFault>>;

/// Sample assembler
#[derive(Debug, Clone)]
pub struct SampleAssembler {
    suite: SensorSuite,
    instance_id: String,
}

impl SampleAssembler {
    pub fn new(suite: SensorSuite, instance_id: impl Into<String>) -> Self {
        Self {
            suite,
            instance_id: instance_id.into(),
        }
    }

    pub fn suite(&self) -> &SensorSuite {
        &self.suite
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Acquire every source concurrently and reconcile into a Sample
    ///
    /// Never fails: missing, faulted, timed out or panicked sources all
    /// become synthetic fields.
    #[instrument(name = "sample_assemble", skip(self), fields(sources = self.suite.len()))]
    pub async fn assemble(&self) -> Sample {
        let captured_at = Utc::now().timestamp_millis();
        let outcomes = self.acquire_all().await;
        self.reconcile(captured_at, outcomes)
    }

    async fn acquire_all(&self) -> Outcomes {
        let mut tasks = JoinSet::new();

        for (kind, source) in self.suite.iter() {
            let source = Arc::clone(source);
            tasks.spawn(async move {
                let budget = source.timeout();
                let result = match timeout(budget, source.acquire()).await {
                    Ok(result) => result,
                    Err(_) => Err(SensorFault::AcquisitionTimeout {
                        kind,
                        waited_ms: budget.as_millis() as u64,
                    }),
                };
                (kind, result)
            });
        }

        let mut outcomes = Outcomes::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((kind, result)) => {
                    outcomes.insert(kind, result);
                }
                // 任务 panic：对应 kind 缺失，下面按失败处理
                Err(e) => error!(error = %e, "sensor acquisition task failed"),
            }
        }

        // Registered but no result (task panicked)
        for (kind, _) in self.suite.iter() {
            outcomes.entry(kind).or_insert_with(|| {
                Err(SensorFault::read_failed(kind, "acquisition task failed"))
            });
        }

        outcomes
    }

    fn reconcile(&self, captured_at: i64, mut outcomes: Outcomes) -> Sample {
        let mut rng = rand::rng();
        let mut take = |kind: SensorKind| {
            outcomes.remove(&kind).unwrap_or_else(|| {
                Err(SensorFault::unavailable(kind, "no source registered"))
            })
        };

        let geolocation = resolve(
            take(SensorKind::Geolocation),
            SensorKind::Geolocation,
            |reading| match reading {
                Reading::Geolocation(fix) => Some(fix),
                _ => None,
            },
            || synthetic::geolocation(&mut rng),
        );
        let ambient_light = resolve(
            take(SensorKind::AmbientLight),
            SensorKind::AmbientLight,
            |reading| match reading {
                Reading::AmbientLight(level) => Some(level),
                _ => None,
            },
            || synthetic::ambient_light(&mut rng),
        );
        let orientation = resolve(
            take(SensorKind::Orientation),
            SensorKind::Orientation,
            |reading| match reading {
                Reading::Orientation(angles) => Some(angles),
                _ => None,
            },
            || synthetic::orientation(&mut rng),
        );
        let battery = resolve(
            take(SensorKind::Battery),
            SensorKind::Battery,
            |reading| match reading {
                Reading::Battery(status) => Some(status),
                _ => None,
            },
            || synthetic::battery(&mut rng),
        );

        Sample {
            captured_at,
            instance_id: self.instance_id.clone(),
            geolocation,
            ambient_light,
            orientation,
            battery,
        }
    }
}

/// Turn one acquisition result into a field, falling back to `fallback`
fn resolve<T>(
    result: Result<Reading, SensorFault>,
    kind: SensorKind,
    extract: impl FnOnce(Reading) -> Option<T>,
    fallback: impl FnOnce() -> T,
) -> Field<T> {
    let fault = match result {
        Ok(reading) => {
            let reported = reading.kind();
            match extract(reading) {
                Some(value) => return Field::live(value),
                None => SensorFault::read_failed(kind, format!("source reported {reported} reading")),
            }
        }
        Err(fault) => fault,
    };

    warn!(sensor = %kind, fault = %fault, "using synthetic fallback");
    observability::record_sensor_fault(kind, fault.label());
    Field::synthetic(fallback(), fault.to_string())
}
