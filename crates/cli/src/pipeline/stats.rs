//! Collection session statistics.

use std::time::Duration;

use delivery::MetricsSnapshot;
use observability::CollectionSummary;

/// Statistics from one collection session
#[derive(Debug, Clone)]
pub struct CollectStats {
    /// Instance id the samples were tagged with
    pub instance_id: String,

    /// Ticks run (including the immediate first one)
    pub ticks: u64,

    /// Wall time between start and stop
    pub duration: Duration,

    /// Acquisition / synthetic / delivery aggregates
    pub summary: CollectionSummary,

    /// Delivery client counters
    pub delivery: MetricsSnapshot,
}

impl CollectStats {
    /// Ticks per minute over the session
    pub fn tick_rate(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.ticks as f64 * 60.0 / secs
        } else {
            0.0
        }
    }

    /// Deliveries started but not yet classified when the session ended
    pub fn in_flight(&self) -> u64 {
        self.ticks.saturating_sub(self.delivery.attempts)
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                   Collection Statistics                      ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Instance: {}", self.instance_id);
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Ticks: {}", self.ticks);
        println!("   └─ Ticks/min: {:.2}", self.tick_rate());

        let summary = &self.summary;
        println!("\n🛰  Samples");
        println!("   ├─ Assembled: {}", summary.total_samples);
        println!(
            "   ├─ With synthetic fields: {} ({:.2}%)",
            summary.samples_with_synthetic, summary.synthetic_rate
        );
        println!("   └─ Acquisition (ms): {}", summary.acquisition_ms);

        println!("\n📤 Delivery");
        println!("   ├─ Delivered: {}", self.delivery.delivered);
        println!("   ├─ Rejected: {}", self.delivery.rejected);
        println!("   ├─ Network failures: {}", self.delivery.network_failures);
        println!("   ├─ Still in flight: {}", self.in_flight());
        match self.delivery.last_status {
            Some(status) => println!("   ├─ Last status: {}", status),
            None => println!("   ├─ Last status: -"),
        }
        println!("   └─ Latency (ms): {}", summary.delivery_ms);

        if !summary.synthetic_counts.is_empty() {
            println!("\n⚠️  Synthetic Fallbacks");
            for (kind, count) in &summary.synthetic_counts {
                println!("   ├─ {}: {}", kind, count);
            }
        }

        println!();
    }
}
