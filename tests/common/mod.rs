#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use evcc_collector::{Clock, FetchError, RawState, StateSource};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// evcc state with PV export and one charging loadpoint.
pub fn sample_state() -> serde_json::Value {
    json!({
        "siteTitle": "Home",
        "currency": "EUR",
        "pvPower": 2500,
        "homePower": 1100,
        "grid": {"power": -800},
        "greenShareHome": 0.92,
        "battery": [{"power": -400, "soc": 63}],
        "tariffGrid": 0.31,
        "tariffFeedIn": 0.08,
        "loadpoints": [
            {
                "title": "Garage",
                "mode": "pv",
                "charging": true,
                "connected": true,
                "enabled": true,
                "chargePower": 3600,
                "chargedEnergy": 4200,
                "chargeDuration": 1230,
                "vehicleTitle": "ID.3",
                "vehicleSoc": 54,
                "sessionSolarPercentage": 88.4
            },
            {
                "title": "Carport",
                "mode": "off",
                "connected": false
            },
            {
                "title": "Guest",
                "mode": "now"
            }
        ],
        "statistics": {
            "30d": {"chargedKWh": 210.3, "solarPercentage": 74.1, "avgPrice": 0.182},
            "total": {"chargedKWh": 5120.9, "solarPercentage": 66.0, "avgPrice": 0.201}
        }
    })
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap()
}

/// Source that replays a fixed sequence of outcomes, then fails.
pub struct ScriptedSource {
    script: Mutex<VecDeque<Option<serde_json::Value>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedSource {
    /// `Some(doc)` succeeds with that document, `None` fails like an
    /// unreachable controller.
    pub fn new(script: Vec<Option<serde_json::Value>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl StateSource for ScriptedSource {
    async fn fetch_state(&self) -> Result<RawState, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front().flatten();
        match next {
            Some(doc) => Ok(RawState::from_slice(doc.to_string().as_bytes()).unwrap()),
            None => Err(FetchError::Connect {
                url: "http://scripted".to_string(),
                reason: "connection refused (is evcc running?)".to_string(),
            }),
        }
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

/// Virtual clock: sleeping advances `now` instantly and records the
/// requested duration. After `stop_after` sleeps it fires `stopped()` and
/// never wakes again.
#[derive(Clone)]
pub struct ManualClock {
    inner: Arc<ManualClockInner>,
}

struct ManualClockInner {
    now: Mutex<DateTime<Utc>>,
    sleeps: Mutex<Vec<Duration>>,
    stop_after: usize,
    stop: Notify,
}

impl ManualClock {
    pub fn new(stop_after: usize) -> Self {
        Self {
            inner: Arc::new(ManualClockInner {
                now: Mutex::new(fixed_now()),
                sleeps: Mutex::new(Vec::new()),
                stop_after,
                stop: Notify::new(),
            }),
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.inner.sleeps.lock().unwrap().clone()
    }

    pub async fn stopped(&self) {
        self.inner.stop.notified().await;
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.inner.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        let count = {
            let mut sleeps = self.inner.sleeps.lock().unwrap();
            sleeps.push(duration);
            let mut now = self.inner.now.lock().unwrap();
            *now += chrono::Duration::from_std(duration).unwrap();
            sleeps.len()
        };

        if count >= self.inner.stop_after {
            self.inner.stop.notify_one();
            std::future::pending::<()>().await;
        }
    }
}
