//! CollectionLoop - periodic acquire / display / deliver
//!
//! Session state machine: `Idle -> Running` on `start`, `Running -> Idle` on
//! `stop`. While Running exactly one timer task exists and it is owned by
//! this loop instance.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use contracts::{Sample, SampleTransport};
use observability::CollectionStatsAggregator;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument};

use crate::assembler::SampleAssembler;
use crate::display::SampleDisplay;
use crate::error::{CollectorError, Result};
use crate::notice::Notice;

/// Session status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Running,
}

/// Result of a `start` / `stop` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Started,
    Stopped,
    /// Already in the requested state, nothing happened
    Unchanged,
}

/// Everything one tick needs, shared with the timer task
struct TickContext<T> {
    assembler: Arc<SampleAssembler>,
    transport: Arc<T>,
    display: Arc<dyn SampleDisplay>,
    endpoint: String,
    ticks: Arc<AtomicU64>,
    stats: Arc<Mutex<CollectionStatsAggregator>>,
}

impl<T> TickContext<T>
where
    T: SampleTransport + Send + Sync + 'static,
{
    /// Acquire, display, then hand the sample to a detached delivery task
    async fn tick(&self) {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;
        let started = Instant::now();

        let sample = self.assembler.assemble().await;

        let acquisition_ms = started.elapsed().as_secs_f64() * 1000.0;
        observability::record_sample_metrics(&sample, acquisition_ms);
        lock(&self.stats).record_sample(&sample, acquisition_ms);
        debug!(tick, acquisition_ms, "sample assembled");

        self.display.show(&sample);
        self.spawn_delivery(sample);
    }

    fn spawn_delivery(&self, sample: Sample) {
        let transport = Arc::clone(&self.transport);
        let display = Arc::clone(&self.display);
        let stats = Arc::clone(&self.stats);
        let endpoint = self.endpoint.clone();

        tokio::spawn(async move {
            let started = Instant::now();
            let outcome = transport.deliver(&sample, &endpoint).await;
            let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

            observability::record_delivery(transport.name(), &outcome, latency_ms);
            lock(&stats).record_delivery(&outcome, latency_ms);
            display.notify(Notice::from_outcome(&outcome));
        });
    }
}

fn lock<V>(mutex: &Mutex<V>) -> std::sync::MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Collection loop
///
/// # Example
///
/// ```ignore
/// let mut collection = CollectionLoop::new(assembler, client, display);
/// collection.start(Duration::from_secs(1), "http://localhost:3000/api/sensor-data").await?;
/// // ...
/// collection.stop().await;
/// ```
pub struct CollectionLoop<T> {
    assembler: Arc<SampleAssembler>,
    transport: Arc<T>,
    display: Arc<dyn SampleDisplay>,
    status: SessionStatus,
    interval: Duration,
    endpoint: String,
    timer: Option<JoinHandle<()>>,
    ticks: Arc<AtomicU64>,
    stats: Arc<Mutex<CollectionStatsAggregator>>,
}

impl<T> CollectionLoop<T>
where
    T: SampleTransport + Send + Sync + 'static,
{
    pub fn new(assembler: SampleAssembler, transport: T, display: Arc<dyn SampleDisplay>) -> Self {
        Self {
            assembler: Arc::new(assembler),
            transport: Arc::new(transport),
            display,
            status: SessionStatus::Idle,
            interval: Duration::from_millis(1000),
            endpoint: String::new(),
            timer: None,
            ticks: Arc::new(AtomicU64::new(0)),
            stats: Arc::default(),
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Ticks started since the loop was created
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    /// Snapshot of the in-process collection statistics
    pub fn stats(&self) -> CollectionStatsAggregator {
        lock(&self.stats).clone()
    }

    /// Change the interval (Idle only)
    pub fn set_interval(&mut self, interval: Duration) -> Result<()> {
        self.ensure_idle("interval")?;
        self.interval = interval;
        Ok(())
    }

    /// Change the endpoint (Idle only)
    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) -> Result<()> {
        self.ensure_idle("endpoint")?;
        self.endpoint = endpoint.into();
        Ok(())
    }

    fn ensure_idle(&self, field: &'static str) -> Result<()> {
        match self.status {
            SessionStatus::Idle => Ok(()),
            SessionStatus::Running => Err(CollectorError::SessionRunning { field }),
        }
    }

    /// Start collecting
    ///
    /// Runs one tick immediately, then one every `interval`. Calling
    /// `start` while Running changes nothing.
    #[instrument(name = "collection_start", skip(self, endpoint))]
    pub async fn start(
        &mut self,
        interval: Duration,
        endpoint: impl Into<String>,
    ) -> Result<Transition> {
        if self.status == SessionStatus::Running {
            debug!("start ignored, already running");
            return Ok(Transition::Unchanged);
        }

        let endpoint = endpoint.into().trim().to_string();
        if endpoint.is_empty() {
            return Err(CollectorError::invalid_config("endpoint must not be empty"));
        }
        if interval.is_zero() {
            return Err(CollectorError::invalid_config("interval must be > 0"));
        }

        self.interval = interval;
        self.endpoint = endpoint;

        let ctx = Arc::new(TickContext {
            assembler: Arc::clone(&self.assembler),
            transport: Arc::clone(&self.transport),
            display: Arc::clone(&self.display),
            endpoint: self.endpoint.clone(),
            ticks: Arc::clone(&self.ticks),
            stats: Arc::clone(&self.stats),
        });

        self.assembler.suite().listen_all();

        let origin = Instant::now();
        ctx.tick().await;

        self.timer = Some(tokio::spawn(async move {
            let mut ticker = interval_at(origin + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                ctx.tick().await;
            }
        }));
        self.status = SessionStatus::Running;
        observability::record_session_running(true);

        info!(
            interval_ms = interval.as_millis() as u64,
            endpoint = %self.endpoint,
            "Data collection started"
        );
        Ok(Transition::Started)
    }

    /// Stop collecting
    ///
    /// When this returns no further tick can start. Deliveries already in
    /// flight are left to finish.
    #[instrument(name = "collection_stop", skip(self))]
    pub async fn stop(&mut self) -> Transition {
        if self.status == SessionStatus::Idle {
            debug!("stop ignored, not running");
            return Transition::Unchanged;
        }

        if let Some(timer) = self.timer.take() {
            timer.abort();
            match timer.await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {}
                Err(e) => error!(error = %e, "collection timer task failed"),
            }
        }

        self.assembler.suite().detach_all();
        self.status = SessionStatus::Idle;
        observability::record_session_running(false);
        self.display.session_stopped();

        info!(ticks = self.ticks(), "Data collection stopped");
        Transition::Stopped
    }
}

impl<T> Drop for CollectionLoop<T> {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            self.assembler.suite().detach_all();
            observability::record_session_running(false);
            debug!("collection loop dropped while running, session torn down");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{DisplayEvent, MemoryDisplay};
    use contracts::{
        AcquireFuture, DeliveryOutcome, OrientationAngles, Reading, SensorDevice, SensorKind,
        SensorSource,
    };
    use metrics::{
        Counter, Gauge, GaugeFn, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit,
    };
    use sensors::{MockDevice, OrientationSource, SensorSuite};
    use std::sync::atomic::AtomicBool;

    /// Transport that records deliveries, optionally taking `latency` to answer
    #[derive(Default)]
    struct RecordingTransport {
        delivered: Mutex<Vec<(i64, String)>>,
        completed: AtomicU64,
        latency: Duration,
        fail: AtomicBool,
    }

    impl RecordingTransport {
        fn slow(latency: Duration) -> Self {
            Self {
                latency,
                ..Default::default()
            }
        }
    }

    impl SampleTransport for RecordingTransport {
        fn name(&self) -> &str {
            "recording"
        }

        async fn deliver(&self, sample: &Sample, endpoint: &str) -> DeliveryOutcome {
            lock(&self.delivered).push((sample.captured_at, endpoint.to_string()));
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            self.completed.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                DeliveryOutcome::NetworkFailure {
                    reason: "connection refused".into(),
                }
            } else {
                DeliveryOutcome::Delivered {
                    ack: "Data received successfully".into(),
                }
            }
        }
    }

    /// Instant orientation source
    struct Level;

    impl SensorSource for Level {
        fn kind(&self) -> SensorKind {
            SensorKind::Orientation
        }

        fn acquire(&self) -> AcquireFuture<'_> {
            Box::pin(async {
                Ok(Reading::Orientation(OrientationAngles {
                    alpha: 0.0,
                    beta: 0.0,
                    gamma: 0.0,
                }))
            })
        }
    }

    fn new_loop(
        transport: RecordingTransport,
    ) -> (CollectionLoop<RecordingTransport>, Arc<MemoryDisplay>) {
        let display = Arc::new(MemoryDisplay::new());
        let assembler = SampleAssembler::new(SensorSuite::new().with(Arc::new(Level)), "id");
        let collection = CollectionLoop::new(assembler, transport, display.clone());
        (collection, display)
    }

    /// Let detached delivery tasks run without moving the clock
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_at_each_interval() {
        let (mut collection, display) = new_loop(RecordingTransport::default());

        let started = collection
            .start(Duration::from_millis(1000), "http://localhost:3000/api/sensor-data")
            .await
            .unwrap();
        assert_eq!(started, Transition::Started);
        assert_eq!(collection.status(), SessionStatus::Running);
        assert_eq!(collection.ticks(), 1);

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert_eq!(collection.ticks(), 1);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(collection.ticks(), 2);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(collection.ticks(), 3);

        settle().await;
        assert_eq!(collection.transport.delivered.lock().unwrap().len(), 3);
        assert_eq!(display.samples().len(), 3);
        assert_eq!(
            display.notices(),
            vec![Notice::success("Data sent successfully"); 3]
        );

        assert_eq!(collection.stop().await, Transition::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_delivery_does_not_delay_ticks() {
        let (mut collection, display) =
            new_loop(RecordingTransport::slow(Duration::from_secs(5)));

        collection
            .start(Duration::from_millis(1000), "http://a")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(2500)).await;

        // 每次投递耗时 5s，节拍照常每秒一次
        assert_eq!(collection.ticks(), 3);
        assert_eq!(collection.transport.delivered.lock().unwrap().len(), 3);
        assert_eq!(collection.transport.completed.load(Ordering::SeqCst), 0);
        assert_eq!(display.samples().len(), 3);
        assert!(display.notices().is_empty());

        collection.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_deliveries_finish_after_stop() {
        let (mut collection, display) =
            new_loop(RecordingTransport::slow(Duration::from_secs(5)));

        collection
            .start(Duration::from_millis(1000), "http://a")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(collection.stop().await, Transition::Stopped);
        assert_eq!(collection.transport.completed.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(10)).await;
        settle().await;

        // 停止后在途投递全部完成，且不再产生新节拍
        assert_eq!(collection.ticks(), 3);
        assert_eq!(collection.transport.completed.load(Ordering::SeqCst), 3);
        assert_eq!(
            display.notices(),
            vec![Notice::success("Data sent successfully"); 3]
        );
        assert_eq!(display.samples().len(), 3);
    }

    /// Stores the value of the session gauge, ignores every other metric
    #[derive(Default)]
    struct SessionGaugeRecorder {
        running: Arc<GaugeCell>,
    }

    #[derive(Default)]
    struct GaugeCell(AtomicU64);

    impl GaugeCell {
        fn value(&self) -> f64 {
            f64::from_bits(self.0.load(Ordering::SeqCst))
        }
    }

    impl GaugeFn for GaugeCell {
        fn increment(&self, value: f64) {
            self.set(self.value() + value);
        }

        fn decrement(&self, value: f64) {
            self.set(self.value() - value);
        }

        fn set(&self, value: f64) {
            self.0.store(value.to_bits(), Ordering::SeqCst);
        }
    }

    impl Recorder for SessionGaugeRecorder {
        fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn register_counter(&self, _: &Key, _: &Metadata<'_>) -> Counter {
            Counter::noop()
        }

        fn register_gauge(&self, key: &Key, _: &Metadata<'_>) -> Gauge {
            if key.name() == "telemetry_relay_session_running" {
                Gauge::from_arc(Arc::clone(&self.running))
            } else {
                Gauge::noop()
            }
        }

        fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
            Histogram::noop()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_clears_running_gauge() {
        let recorder = SessionGaugeRecorder::default();
        let _guard = metrics::set_default_local_recorder(&recorder);

        let (mut collection, _display) = new_loop(RecordingTransport::default());
        collection
            .start(Duration::from_millis(1000), "http://a")
            .await
            .unwrap();
        assert_eq!(recorder.running.value(), 1.0);

        drop(collection);
        assert_eq!(recorder.running.value(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_start_keeps_single_timer() {
        let (mut collection, _display) = new_loop(RecordingTransport::default());

        collection
            .start(Duration::from_millis(1000), "http://a")
            .await
            .unwrap();
        let second = collection
            .start(Duration::from_millis(10), "http://b")
            .await
            .unwrap();
        assert_eq!(second, Transition::Unchanged);
        assert_eq!(collection.interval(), Duration::from_millis(1000));
        assert_eq!(collection.endpoint(), "http://a");

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(collection.ticks(), 3);

        collection.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_tick_after_stop() {
        let (mut collection, display) = new_loop(RecordingTransport::default());

        collection
            .start(Duration::from_millis(1000), "http://a")
            .await
            .unwrap();
        assert_eq!(collection.stop().await, Transition::Stopped);
        assert_eq!(collection.status(), SessionStatus::Idle);

        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(collection.ticks(), 1);
        assert!(display.events().contains(&DisplayEvent::Stopped));
    }

    #[tokio::test]
    async fn test_stop_while_idle_is_noop() {
        let (mut collection, display) = new_loop(RecordingTransport::default());
        assert_eq!(collection.stop().await, Transition::Unchanged);
        assert!(display.events().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_start_rejected() {
        let (mut collection, _display) = new_loop(RecordingTransport::default());

        let err = collection
            .start(Duration::from_millis(1000), "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, CollectorError::InvalidConfig { .. }));

        let err = collection
            .start(Duration::ZERO, "http://a")
            .await
            .unwrap_err();
        assert!(matches!(err, CollectorError::InvalidConfig { .. }));

        assert_eq!(collection.status(), SessionStatus::Idle);
        assert_eq!(collection.ticks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parameters_locked_while_running() {
        let (mut collection, _display) = new_loop(RecordingTransport::default());
        collection.set_interval(Duration::from_millis(500)).unwrap();

        collection
            .start(Duration::from_millis(1000), "http://a")
            .await
            .unwrap();
        assert!(matches!(
            collection.set_interval(Duration::from_millis(10)),
            Err(CollectorError::SessionRunning { field: "interval" })
        ));
        assert!(collection.set_endpoint("http://b").is_err());

        collection.stop().await;
        assert!(collection.set_endpoint("http://b").is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivery_failure_does_not_stop_loop() {
        let transport = RecordingTransport::default();
        transport.fail.store(true, Ordering::SeqCst);
        let (mut collection, display) = new_loop(transport);

        collection
            .start(Duration::from_millis(1000), "http://a")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        settle().await;

        assert_eq!(collection.ticks(), 2);
        assert_eq!(
            display.notices(),
            vec![Notice::failure("Error sending data: connection refused"); 2]
        );
        assert_eq!(collection.stats().summary().delivered, 0);

        collection.stop().await;
    }

    #[tokio::test]
    async fn test_listeners_follow_session() {
        let device = Arc::new(MockDevice::with_defaults("tilt", SensorKind::Orientation));
        let suite = SensorSuite::new().with(Arc::new(OrientationSource::new(device.clone())));
        let display = Arc::new(MemoryDisplay::new());
        let mut collection = CollectionLoop::new(
            SampleAssembler::new(suite, "id"),
            RecordingTransport::default(),
            display,
        );

        collection
            .start(Duration::from_secs(60), "http://a")
            .await
            .unwrap();
        assert!(device.is_listening());

        collection.stop().await;
        assert!(!device.is_listening());

        collection
            .start(Duration::from_secs(60), "http://a")
            .await
            .unwrap();
        assert!(device.is_listening());

        drop(collection);
        assert!(!device.is_listening());
    }
}
