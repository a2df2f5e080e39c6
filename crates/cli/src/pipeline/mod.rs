//! Collection session orchestration module.

mod orchestrator;
mod stats;

pub use orchestrator::{CollectOptions, CollectPipeline};
pub use stats::CollectStats;
