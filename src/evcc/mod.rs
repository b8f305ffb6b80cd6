pub mod client;
pub mod state;

pub use client::{EvccClient, StateSource, DEFAULT_TIMEOUT};
pub use state::{RawLoadpoint, RawState};
