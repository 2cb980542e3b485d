pub mod config;
pub mod error;
pub mod oracle;
pub mod output;
pub mod probe;
pub mod stats;

pub use error::ProbeError;
pub use probe::StatisticsProbe;
pub use stats::StepStats;
