use crate::error::BuildError;
use crate::evcc::state::{RawLoadpoint, RawPeriodStatistics, RawState};
use crate::format::{
    battery_flow, format_duration, format_power, fraction_percentage, grid_flow,
    loadpoint_status, mode_label, percentage, round1, round2, truncate, BatteryFlow, GridFlow,
    PowerUnit, TITLE_MAX_CHARS,
};
use crate::snapshot::model::{
    BatterySnapshot, EnergySnapshot, LoadpointSnapshot, PeriodStatistics, Snapshot,
    StatisticsSnapshot,
};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

const DEFAULT_SITE_TITLE: &str = "EVCC";
const DEFAULT_CURRENCY: &str = "EUR";
/// evcc's placeholder for "no plan time".
const ZERO_TIME_PREFIX: &str = "0001-01-01";

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub max_loadpoints: usize,
    pub power_unit: PowerUnit,
    /// `None` renders local time as UTC.
    pub timezone: Option<Tz>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            max_loadpoints: 4,
            power_unit: PowerUnit::Auto,
            timezone: None,
        }
    }
}

/// Turn one evcc state document into a display snapshot.
///
/// Pure: `now` is the only time input, so identical arguments produce an
/// identical document. Fails only when `homePower` or `loadpoints` is absent.
pub fn build_snapshot(
    raw: &RawState,
    options: &BuildOptions,
    now: DateTime<Utc>,
) -> Result<Snapshot, BuildError> {
    let home_power = raw.home_power.ok_or(BuildError::MissingField("homePower"))?;
    let loadpoints = raw
        .loadpoints
        .as_ref()
        .ok_or(BuildError::MissingField("loadpoints"))?;

    let unit = options.power_unit;
    let (last_updated_local, timezone) = local_time(now, options.timezone.as_ref());

    Ok(Snapshot {
        site_title: truncate(
            raw.site_title
                .as_deref()
                .filter(|t| !t.is_empty())
                .unwrap_or(DEFAULT_SITE_TITLE),
            TITLE_MAX_CHARS,
        ),
        last_updated: now.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        last_updated_local,
        timezone,
        currency: raw
            .currency
            .clone()
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        energy: build_energy(raw, home_power, unit),
        battery: build_battery(raw, unit),
        loadpoints: loadpoints
            .iter()
            .take(options.max_loadpoints)
            .enumerate()
            .map(|(id, lp)| build_loadpoint(id, lp, unit))
            .collect(),
        loadpoint_count: loadpoints.len(),
        statistics: build_statistics(raw),
    })
}

fn local_time(now: DateTime<Utc>, tz: Option<&Tz>) -> (String, String) {
    match tz {
        Some(tz) => {
            let local = now.with_timezone(tz);
            let abbrev = local.format("%Z").to_string();
            let abbrev = if abbrev.is_empty() {
                tz.name().to_string()
            } else {
                abbrev
            };
            (local.format("%Y-%m-%d %H:%M").to_string(), abbrev)
        }
        None => (now.format("%Y-%m-%d %H:%M").to_string(), "UTC".to_string()),
    }
}

fn build_energy(raw: &RawState, home_power: f64, unit: PowerUnit) -> EnergySnapshot {
    let pv_power = raw.pv_power.unwrap_or(0.0);
    let grid_raw = raw.grid_power();
    let grid_direction = grid_flow(grid_raw);
    let grid_power = grid_raw.unwrap_or(0.0);

    EnergySnapshot {
        pv_power,
        pv_power_formatted: format_power(pv_power, unit),
        grid_power: grid_power.abs(),
        grid_power_formatted: format_power(grid_power, unit),
        grid_direction,
        grid_import: grid_direction == GridFlow::Import,
        home_power,
        home_power_formatted: format_power(home_power, unit),
        green_share_home: fraction_percentage(raw.green_share_home),
        tariff_grid: raw.tariff_grid,
        tariff_feedin: raw.tariff_feed_in,
        tariff_price_home: raw.tariff_price_home,
    }
}

fn build_battery(raw: &RawState, unit: PowerUnit) -> BatterySnapshot {
    let (power, soc) = match raw.battery.as_deref() {
        Some(batteries) if !batteries.is_empty() => {
            let power: f64 = batteries.iter().filter_map(|b| b.power).sum();
            let socs: Vec<f64> = batteries.iter().filter_map(|b| b.soc).collect();
            let soc = if socs.is_empty() {
                None
            } else {
                Some(socs.iter().sum::<f64>() / socs.len() as f64)
            };
            (Some(power), soc)
        }
        _ if raw.battery_power.is_some() || raw.battery_soc.is_some() => {
            (raw.battery_power, raw.battery_soc)
        }
        _ => {
            return BatterySnapshot {
                configured: false,
                soc: None,
                power: 0.0,
                power_formatted: format_power(0.0, unit),
                direction: BatteryFlow::Idle,
                charging: false,
            }
        }
    };

    let direction = battery_flow(power);
    let power = power.unwrap_or(0.0);
    BatterySnapshot {
        configured: true,
        soc: percentage(soc),
        power,
        power_formatted: format_power(power, unit),
        direction,
        charging: direction == BatteryFlow::Charge,
    }
}

fn build_loadpoint(id: usize, lp: &RawLoadpoint, unit: PowerUnit) -> LoadpointSnapshot {
    let mode = lp.mode.clone().unwrap_or_else(|| "off".to_string());
    let charging = lp.charging.unwrap_or(false);
    let connected = lp.connected.unwrap_or(false);
    let enabled = lp.enabled.unwrap_or(false);
    let charge_power = lp.charge_power.unwrap_or(0.0);

    let title = match lp.title.as_deref().filter(|t| !t.is_empty()) {
        Some(t) => truncate(t, TITLE_MAX_CHARS),
        None => format!("Loadpoint {}", id + 1),
    };

    LoadpointSnapshot {
        id,
        title,
        mode_label: mode_label(&mode),
        status: loadpoint_status(charging, connected, enabled, &mode),
        mode,
        charging,
        connected,
        enabled,
        charge_power,
        charge_power_formatted: format_power(charge_power, unit),
        charged_energy_kwh: round1(lp.charged_energy.unwrap_or(0.0) / 1000.0),
        duration_formatted: format_duration(lp.charge_duration),
        remaining_formatted: format_duration(lp.charge_remaining_duration),
        session_solar_pct: percentage(lp.session_solar_percentage),
        session_price: lp.session_price.map(round2),
        vehicle_title: lp
            .vehicle_title
            .as_deref()
            .filter(|t| !t.is_empty())
            .or(lp.vehicle_name.as_deref().filter(|t| !t.is_empty()))
            .map(|t| truncate(t, TITLE_MAX_CHARS)),
        vehicle_soc: percentage(lp.vehicle_soc),
        vehicle_range: lp.vehicle_range.map(f64::round),
        limit_soc: percentage(lp.effective_limit_soc),
        plan_active: lp.plan_active.unwrap_or(false),
        plan_time: lp
            .plan_time
            .clone()
            .filter(|t| !t.is_empty() && !t.starts_with(ZERO_TIME_PREFIX)),
        phases_active: lp.phases_active,
    }
}

fn build_statistics(raw: &RawState) -> StatisticsSnapshot {
    let stats = raw.statistics.as_ref();
    StatisticsSnapshot {
        last_30_days: stats
            .and_then(|s| s.last_30_days.as_ref())
            .map(build_period),
        total: stats.and_then(|s| s.total.as_ref()).map(build_period),
    }
}

fn build_period(period: &RawPeriodStatistics) -> PeriodStatistics {
    PeriodStatistics {
        charged_kwh: period.charged_kwh.map(round1),
        solar_pct: percentage(period.solar_percentage),
        avg_price: period.avg_price.map(round2),
    }
}
