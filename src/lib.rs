pub mod api;
pub mod cli;
pub mod config;
pub mod distribute;
pub mod error;
pub mod evcc;
pub mod format;
pub mod scheduler;
pub mod snapshot;

// Re-export commonly used items
pub use config::Config;
pub use error::{AppError, BuildError, CycleError, DeliveryError, FetchError, Result};
pub use evcc::{EvccClient, RawState, StateSource};
pub use scheduler::{Clock, CycleState, RunSummary, Scheduler, SystemClock};
pub use snapshot::{build_snapshot, BuildOptions, Snapshot};
