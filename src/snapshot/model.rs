use crate::format::{BatteryFlow, GridFlow, LoadpointStatus};
use serde::Serialize;

/// One fully formatted document per collection cycle. This is the body served
/// on `/data/evcc` and the `merge_variables` of the webhook payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub site_title: String,
    /// UTC, `2024-05-01T12:00:00Z`.
    pub last_updated: String,
    /// Configured zone, `2024-05-01 14:00`.
    pub last_updated_local: String,
    /// Zone abbreviation such as `CEST`.
    pub timezone: String,
    pub currency: String,
    pub energy: EnergySnapshot,
    pub battery: BatterySnapshot,
    pub loadpoints: Vec<LoadpointSnapshot>,
    /// Loadpoints reported by evcc, before the display limit was applied.
    pub loadpoint_count: usize,
    pub statistics: StatisticsSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergySnapshot {
    pub pv_power: f64,
    pub pv_power_formatted: String,
    /// Magnitude only; see `grid_direction`.
    pub grid_power: f64,
    pub grid_power_formatted: String,
    pub grid_direction: GridFlow,
    pub grid_import: bool,
    pub home_power: f64,
    pub home_power_formatted: String,
    pub green_share_home: Option<u8>,
    pub tariff_grid: Option<f64>,
    pub tariff_feedin: Option<f64>,
    pub tariff_price_home: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatterySnapshot {
    pub configured: bool,
    pub soc: Option<u8>,
    pub power: f64,
    pub power_formatted: String,
    pub direction: BatteryFlow,
    pub charging: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadpointSnapshot {
    /// Position in evcc's loadpoint list.
    pub id: usize,
    pub title: String,
    pub mode: String,
    pub mode_label: String,
    pub charging: bool,
    pub connected: bool,
    pub enabled: bool,
    pub status: LoadpointStatus,
    pub charge_power: f64,
    pub charge_power_formatted: String,
    pub charged_energy_kwh: f64,
    pub duration_formatted: String,
    pub remaining_formatted: String,
    pub session_solar_pct: Option<u8>,
    pub session_price: Option<f64>,
    pub vehicle_title: Option<String>,
    pub vehicle_soc: Option<u8>,
    pub vehicle_range: Option<f64>,
    pub limit_soc: Option<u8>,
    pub plan_active: bool,
    pub plan_time: Option<String>,
    pub phases_active: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsSnapshot {
    #[serde(rename = "30d")]
    pub last_30_days: Option<PeriodStatistics>,
    pub total: Option<PeriodStatistics>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodStatistics {
    pub charged_kwh: Option<f64>,
    pub solar_pct: Option<u8>,
    pub avg_price: Option<f64>,
}
