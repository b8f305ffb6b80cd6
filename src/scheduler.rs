//! Collection loop.
//!
//! Drives `Idle -> Fetching -> Building -> Distributing -> Idle` once per
//! interval, or exactly once (ending in `Done`) when the interval is zero.
//! A failed cycle is logged and counted; the previously distributed snapshot
//! stays in place and the loop carries on.

use crate::distribute::{DeliveryReport, Distributor};
use crate::error::CycleError;
use crate::evcc::StateSource;
use crate::snapshot::{build_snapshot, BuildOptions};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Time source for the scheduler, replaceable in tests.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Fetching,
    Building,
    Distributing,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub loadpoints: usize,
    pub delivery: DeliveryReport,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    /// Cycles that failed to fetch or build, or whose webhook push failed.
    pub failures: u64,
    pub last_succeeded: bool,
}

impl RunSummary {
    fn record(&mut self, succeeded: bool) {
        self.cycles += 1;
        if !succeeded {
            self.failures += 1;
        }
        self.last_succeeded = succeeded;
    }
}

pub struct Scheduler<S, C> {
    source: S,
    distributor: Distributor,
    options: BuildOptions,
    clock: C,
    interval: Duration,
    state: CycleState,
}

impl<S, C> Scheduler<S, C>
where
    S: StateSource,
    C: Clock,
{
    pub fn new(
        source: S,
        distributor: Distributor,
        options: BuildOptions,
        clock: C,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            distributor,
            options,
            clock,
            interval,
            state: CycleState::Idle,
        }
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Run a single fetch/build/distribute cycle. Fetch and build errors end
    /// the cycle before anything is distributed.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, CycleError> {
        let result = self.cycle().await;
        self.state = CycleState::Idle;
        result
    }

    async fn cycle(&mut self) -> Result<CycleReport, CycleError> {
        self.state = CycleState::Fetching;
        debug!(source = %self.source.describe(), "fetching state");
        let raw = self.source.fetch_state().await?;

        self.state = CycleState::Building;
        let snapshot = build_snapshot(&raw, &self.options, self.clock.now())?;
        let loadpoints = snapshot.loadpoints.len();

        self.state = CycleState::Distributing;
        let delivery = self.distributor.distribute(Arc::new(snapshot)).await;

        Ok(CycleReport {
            loadpoints,
            delivery,
        })
    }

    /// Run cycles until `shutdown` resolves, or once when the interval is
    /// zero. A cycle already in flight is allowed to finish.
    pub async fn run<F>(&mut self, shutdown: F) -> RunSummary
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut summary = RunSummary::default();

        loop {
            info!(cycle = summary.cycles + 1, "starting collection cycle");
            let succeeded = match self.run_cycle().await {
                Ok(report) if report.delivery.is_success() => {
                    info!(loadpoints = report.loadpoints, "collection complete");
                    true
                }
                Ok(_) => {
                    warn!("collection complete, webhook send failed");
                    false
                }
                Err(e) => {
                    error!(error = %e, "collection failed; keeping previous snapshot");
                    false
                }
            };
            summary.record(succeeded);

            if self.interval.is_zero() {
                self.state = CycleState::Done;
                info!("single run finished");
                return summary;
            }

            debug!(secs = self.interval.as_secs(), "sleeping until next cycle");
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
                _ = self.clock.sleep(self.interval) => {}
            }
        }

        self.state = CycleState::Done;
        summary
    }
}
