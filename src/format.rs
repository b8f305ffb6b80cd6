//! Display formatting for raw evcc values.
//!
//! Every function here is pure. Missing inputs are part of each contract:
//! percentages become `None` (serialised as `null`), durations become
//! [`UNKNOWN_DURATION`], powers are treated as zero.

use serde::{Deserialize, Serialize};

/// Display budget for titles and vehicle names on the rendering surface.
pub const TITLE_MAX_CHARS: usize = 20;

/// Rendered for a missing or negative duration.
pub const UNKNOWN_DURATION: &str = "";

const ELLIPSIS: char = '…';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum PowerUnit {
    #[default]
    #[serde(rename = "auto")]
    #[value(name = "auto")]
    Auto,
    #[serde(rename = "W", alias = "w")]
    #[value(name = "W")]
    Watt,
    #[serde(rename = "kW", alias = "kw")]
    #[value(name = "kW")]
    Kilowatt,
}

/// Format a power reading. The sign is dropped; direction is reported
/// separately by [`grid_flow`] and [`battery_flow`].
pub fn format_power(watts: f64, unit: PowerUnit) -> String {
    let magnitude = if watts.is_finite() { watts.abs() } else { 0.0 };
    // Decide on the rounded value so 999.6 W does not print as "1000 W".
    let rounded = magnitude.round();

    match unit {
        PowerUnit::Kilowatt => format!("{:.1} kW", magnitude / 1000.0),
        PowerUnit::Watt => format!("{} W", rounded as u64),
        PowerUnit::Auto if rounded >= 1000.0 => format!("{:.1} kW", magnitude / 1000.0),
        PowerUnit::Auto => format!("{} W", rounded as u64),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GridFlow {
    Import,
    Export,
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatteryFlow {
    Charge,
    Discharge,
    Idle,
}

/// Positive grid power is drawn from the grid, negative is fed in.
pub fn grid_flow(watts: Option<f64>) -> GridFlow {
    match signum_watts(watts) {
        1 => GridFlow::Import,
        -1 => GridFlow::Export,
        _ => GridFlow::Idle,
    }
}

/// evcc reports battery power positive while discharging into the home and
/// negative while charging.
pub fn battery_flow(watts: Option<f64>) -> BatteryFlow {
    match signum_watts(watts) {
        1 => BatteryFlow::Discharge,
        -1 => BatteryFlow::Charge,
        _ => BatteryFlow::Idle,
    }
}

fn signum_watts(watts: Option<f64>) -> i8 {
    match watts.filter(|w| w.is_finite()).map(f64::round) {
        Some(w) if w > 0.0 => 1,
        Some(w) if w < 0.0 => -1,
        _ => 0,
    }
}

/// Clamp a 0..100 value and round it. `None` means unknown.
pub fn percentage(value: Option<f64>) -> Option<u8> {
    let v = value.filter(|v| !v.is_nan())?;
    Some(v.clamp(0.0, 100.0).round() as u8)
}

/// Same as [`percentage`] for a 0..1 fraction.
pub fn fraction_percentage(value: Option<f64>) -> Option<u8> {
    percentage(value.map(|v| v * 100.0))
}

pub fn format_duration(seconds: Option<f64>) -> String {
    let secs = match seconds {
        Some(s) if s.is_finite() && s >= 0.0 => s as u64,
        _ => return UNKNOWN_DURATION.to_string(),
    };

    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3_600 {
        format!("{}m", secs / 60)
    } else if secs < 86_400 {
        format!("{}h {}m", secs / 3_600, (secs % 3_600) / 60)
    } else {
        format!("{}d {}h", secs / 86_400, (secs % 86_400) / 3_600)
    }
}

pub fn mode_label(mode: &str) -> String {
    match mode {
        "" | "off" => "Off".to_string(),
        "pv" => "Solar".to_string(),
        "minpv" => "Min+Solar".to_string(),
        "now" => "Fast".to_string(),
        other => other.to_string(),
    }
}

/// Cut `text` to at most `max_chars` characters, marking the cut with `…`.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max_chars - 1).collect();
    out.push(ELLIPSIS);
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadpointStatus {
    Charging,
    #[serde(rename = "Waiting for solar")]
    WaitingForSolar,
    Finished,
    Connected,
    Disconnected,
}

pub fn loadpoint_status(charging: bool, connected: bool, enabled: bool, mode: &str) -> LoadpointStatus {
    if charging {
        return LoadpointStatus::Charging;
    }
    match (connected, enabled) {
        (true, true) if matches!(mode, "pv" | "minpv") => LoadpointStatus::WaitingForSolar,
        (true, true) => LoadpointStatus::Finished,
        (true, false) => LoadpointStatus::Connected,
        _ => LoadpointStatus::Disconnected,
    }
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_switches_to_kw_at_1000() {
        assert_eq!(format_power(999.0, PowerUnit::Auto), "999 W");
        assert_eq!(format_power(1000.0, PowerUnit::Auto), "1.0 kW");
        assert_eq!(format_power(2500.0, PowerUnit::Auto), "2.5 kW");
        assert_eq!(format_power(0.0, PowerUnit::Auto), "0 W");
    }

    #[test]
    fn test_auto_decides_on_rounded_watts() {
        assert_eq!(format_power(999.4, PowerUnit::Auto), "999 W");
        assert_eq!(format_power(999.6, PowerUnit::Auto), "1.0 kW");
    }

    #[test]
    fn test_auto_is_monotonic() {
        let mut previous = 0.0;
        for w in (0..20_000).step_by(7) {
            let s = format_power(w as f64, PowerUnit::Auto);
            let parsed = if let Some(kw) = s.strip_suffix(" kW") {
                kw.parse::<f64>().unwrap() * 1000.0
            } else {
                s.strip_suffix(" W").unwrap().parse::<f64>().unwrap()
            };
            assert!(parsed >= previous, "{} went below {}", s, previous);
            previous = parsed;
        }
    }

    #[test]
    fn test_forced_units() {
        assert_eq!(format_power(400.0, PowerUnit::Kilowatt), "0.4 kW");
        assert_eq!(format_power(3600.0, PowerUnit::Watt), "3600 W");
        assert_eq!(format_power(1234.5, PowerUnit::Watt), "1235 W");
    }

    #[test]
    fn test_power_drops_sign_and_garbage() {
        assert_eq!(format_power(-800.0, PowerUnit::Auto), "800 W");
        assert_eq!(format_power(f64::NAN, PowerUnit::Auto), "0 W");
    }

    #[test]
    fn test_grid_flow_sign_convention() {
        assert_eq!(grid_flow(Some(1200.0)), GridFlow::Import);
        assert_eq!(grid_flow(Some(-800.0)), GridFlow::Export);
        assert_eq!(grid_flow(Some(0.2)), GridFlow::Idle);
        assert_eq!(grid_flow(None), GridFlow::Idle);
    }

    #[test]
    fn test_battery_flow_sign_convention() {
        assert_eq!(battery_flow(Some(500.0)), BatteryFlow::Discharge);
        assert_eq!(battery_flow(Some(-1500.0)), BatteryFlow::Charge);
        assert_eq!(battery_flow(Some(0.0)), BatteryFlow::Idle);
    }

    #[test]
    fn test_percentage_clamps_and_keeps_unknown() {
        assert_eq!(percentage(Some(-5.0)), Some(0));
        assert_eq!(percentage(Some(140.0)), Some(100));
        assert_eq!(percentage(Some(55.4)), Some(55));
        assert_eq!(percentage(None), None);
        assert_eq!(percentage(Some(f64::NAN)), None);
        assert_eq!(percentage(Some(f64::INFINITY)), Some(100));
    }

    #[test]
    fn test_fraction_percentage() {
        assert_eq!(fraction_percentage(Some(0.734)), Some(73));
        assert_eq!(fraction_percentage(Some(1.2)), Some(100));
        assert_eq!(fraction_percentage(None), None);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Some(45.0)), "45s");
        assert_eq!(format_duration(Some(1230.0)), "20m");
        assert_eq!(format_duration(Some(4980.0)), "1h 23m");
        assert_eq!(format_duration(Some(97_200.0)), "1d 3h");
    }

    #[test]
    fn test_format_duration_unknown() {
        assert_eq!(format_duration(None), UNKNOWN_DURATION);
        assert_eq!(format_duration(Some(-30.0)), UNKNOWN_DURATION);
        assert_eq!(format_duration(Some(f64::NAN)), UNKNOWN_DURATION);
    }

    #[test]
    fn test_mode_labels() {
        assert_eq!(mode_label("pv"), "Solar");
        assert_eq!(mode_label("minpv"), "Min+Solar");
        assert_eq!(mode_label("now"), "Fast");
        assert_eq!(mode_label("off"), "Off");
        assert_eq!(mode_label(""), "Off");
        assert_eq!(mode_label("smart"), "smart");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Garage", 20), "Garage");
        assert_eq!(truncate("Carport links vorne am Tor", 10), "Carport l…");
        assert_eq!(truncate("Wallbox Ü", 9), "Wallbox Ü");
        assert_eq!(truncate("Größere Wallbox", 5).chars().count(), 5);
    }

    #[test]
    fn test_loadpoint_status() {
        assert_eq!(loadpoint_status(true, true, true, "now"), LoadpointStatus::Charging);
        assert_eq!(
            loadpoint_status(false, true, true, "pv"),
            LoadpointStatus::WaitingForSolar
        );
        assert_eq!(loadpoint_status(false, true, true, "now"), LoadpointStatus::Finished);
        assert_eq!(loadpoint_status(false, true, false, "pv"), LoadpointStatus::Connected);
        assert_eq!(loadpoint_status(false, false, false, "off"), LoadpointStatus::Disconnected);
    }

    #[test]
    fn test_power_unit_deserialization() {
        let unit: PowerUnit = serde_yaml::from_str("kW").unwrap();
        assert_eq!(unit, PowerUnit::Kilowatt);
        let unit: PowerUnit = serde_yaml::from_str("w").unwrap();
        assert_eq!(unit, PowerUnit::Watt);
    }
}
