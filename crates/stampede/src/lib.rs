pub mod engine;
pub mod error;
pub mod metrics;

pub use engine::population::{Population, PopulationHandle, StopReport};
pub use engine::stats::{spawn_collector, AggregateStats, OutcomeRecord, StatsHandle};
