pub mod builder;
pub mod model;

pub use builder::{build_snapshot, BuildOptions};
pub use model::{
    BatterySnapshot, EnergySnapshot, LoadpointSnapshot, PeriodStatistics, Snapshot,
    StatisticsSnapshot,
};
