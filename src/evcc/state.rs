use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// evcc's `/api/state` document, reduced to what the collector reads.
///
/// Every field is optional: evcc omits values for unconfigured meters and
/// older releases use different names. Missing values are handled by the
/// snapshot builder, not here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawState {
    #[serde(default)]
    pub site_title: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub pv_power: Option<f64>,
    #[serde(default)]
    pub home_power: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub grid: Option<RawGrid>,
    /// Pre-0.207 location of the grid meter reading.
    #[serde(default)]
    pub grid_power: Option<f64>,
    #[serde(default)]
    pub green_share_home: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub battery: Option<Vec<RawBattery>>,
    #[serde(default)]
    pub battery_power: Option<f64>,
    #[serde(default)]
    pub battery_soc: Option<f64>,
    #[serde(default)]
    pub tariff_grid: Option<f64>,
    #[serde(default)]
    pub tariff_feed_in: Option<f64>,
    #[serde(default)]
    pub tariff_price_home: Option<f64>,
    #[serde(default)]
    pub loadpoints: Option<Vec<RawLoadpoint>>,
    #[serde(default, deserialize_with = "lenient")]
    pub statistics: Option<RawStatistics>,
}

/// Sub-documents whose shape changed between evcc releases are dropped
/// instead of failing the whole document when they do not match.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

impl RawState {
    /// Grid power from the nested meter object, falling back to the legacy
    /// top-level field.
    pub fn grid_power(&self) -> Option<f64> {
        self.grid
            .as_ref()
            .and_then(|g| g.power)
            .or(self.grid_power)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGrid {
    #[serde(default)]
    pub power: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBattery {
    #[serde(default)]
    pub power: Option<f64>,
    #[serde(default)]
    pub soc: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLoadpoint {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub charging: Option<bool>,
    #[serde(default)]
    pub connected: Option<bool>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub charge_power: Option<f64>,
    /// Wh charged in the current session.
    #[serde(default)]
    pub charged_energy: Option<f64>,
    /// Seconds.
    #[serde(default)]
    pub charge_duration: Option<f64>,
    /// Seconds.
    #[serde(default)]
    pub charge_remaining_duration: Option<f64>,
    #[serde(default)]
    pub session_solar_percentage: Option<f64>,
    #[serde(default)]
    pub session_price: Option<f64>,
    #[serde(default)]
    pub vehicle_title: Option<String>,
    #[serde(default)]
    pub vehicle_name: Option<String>,
    #[serde(default)]
    pub vehicle_soc: Option<f64>,
    #[serde(default)]
    pub vehicle_range: Option<f64>,
    #[serde(default)]
    pub effective_limit_soc: Option<f64>,
    #[serde(default)]
    pub plan_active: Option<bool>,
    #[serde(default)]
    pub plan_time: Option<String>,
    #[serde(default)]
    pub phases_active: Option<u8>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStatistics {
    #[serde(default, rename = "30d")]
    pub last_30_days: Option<RawPeriodStatistics>,
    #[serde(default)]
    pub total: Option<RawPeriodStatistics>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPeriodStatistics {
    #[serde(default, rename = "chargedKWh")]
    pub charged_kwh: Option<f64>,
    #[serde(default, rename = "solarPercentage")]
    pub solar_percentage: Option<f64>,
    #[serde(default, rename = "avgPrice")]
    pub avg_price: Option<f64>,
}

impl RawState {
    /// Decode a state document. evcc before 0.207 wrapped it in
    /// `{"result": ...}`; the wrapper is removed before the single decode so
    /// type errors surface instead of falling back to an empty state.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        let value = match serde_json::from_slice::<Value>(body)? {
            Value::Object(mut map) if map.get("result").is_some_and(Value::is_object) => {
                map.remove("result").unwrap_or(Value::Null)
            }
            other => other,
        };
        serde_json::from_value(value)
    }
}
