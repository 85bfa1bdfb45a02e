pub mod dispatch;
pub mod stats;

pub use dispatch::{Dispatcher, DropReason, Ingress, Verdict};
pub use stats::{PipelineStats, StatsSnapshot};
