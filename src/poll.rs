extern crate chrono;

use std::sync::atomic::{AtomicBool, Ordering};

use crate::arrivals;
use crate::light;
use crate::resolve;
use crate::result;
use crate::result::BusLightError;
use crate::scheduler;
use crate::state;

const RETRY_DELAY_SECS: i64 = 60;

// Upper bound on each idle sleep, so a shutdown request is noticed quickly.
const IDLE_TICK: std::time::Duration = std::time::Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    Fetching,
    Resolving,
    Mapping,
    Applying,
    Scheduled,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Applied {
        state: state::DisplayState,
        next_check: chrono::DateTime<chrono::Utc>,
    },
    // Arrival already passed; nothing applied.
    Stale {
        remaining_millis: i64,
        next_check: chrono::DateTime<chrono::Utc>,
    },
    LightFailed {
        state: state::DisplayState,
        error: String,
        next_check: chrono::DateTime<chrono::Utc>,
    },
}

impl CycleOutcome {
    pub fn next_check(&self) -> chrono::DateTime<chrono::Utc> {
        match *self {
            CycleOutcome::Applied { next_check, .. } => next_check,
            CycleOutcome::Stale { next_check, .. } => next_check,
            CycleOutcome::LightFailed { next_check, .. } => next_check,
        }
    }
}

/// Polls arrivals and keeps the light in step with the next bus.
pub struct BusLight<L: light::Light> {
    client: arrivals::ArrivalClient,
    light: L,
    scheduler: scheduler::Scheduler,
    phase: CyclePhase,
}

impl<L: light::Light> BusLight<L> {
    pub fn new(client: arrivals::ArrivalClient, light: L) -> BusLight<L> {
        return BusLight {
            client: client,
            light: light,
            scheduler: scheduler::Scheduler::new(),
            phase: CyclePhase::Idle,
        };
    }

    #[cfg(test)]
    fn phase(&self) -> CyclePhase {
        return self.phase;
    }

    #[cfg(test)]
    fn scheduler(&self) -> &scheduler::Scheduler {
        return &self.scheduler;
    }

    #[cfg(test)]
    fn light(&self) -> &L {
        return &self.light;
    }

    /// Queues the first poll. The first check fires as soon as `run_until`
    /// starts.
    pub fn start(&mut self, now: &chrono::DateTime<chrono::Utc>) {
        self.scheduler.schedule_at(*now);
    }

    fn enter(&mut self, phase: CyclePhase) {
        debug!("Poll cycle {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    fn schedule_retry(&mut self, now: &chrono::DateTime<chrono::Utc>) -> chrono::DateTime<chrono::Utc> {
        return self.schedule(now, chrono::Duration::seconds(RETRY_DELAY_SECS));
    }

    fn schedule(&mut self, now: &chrono::DateTime<chrono::Utc>, delay: chrono::Duration) -> chrono::DateTime<chrono::Utc> {
        self.enter(CyclePhase::Scheduled);
        return self.scheduler.schedule_in(now, delay)
            .map(|check| check.at)
            .unwrap_or(*now + delay);
    }

    /// Runs one fetch, resolve, map, apply pass and schedules the next one.
    ///
    /// Stale arrivals and light failures are absorbed here and retried in a
    /// minute. Any other error is returned with nothing scheduled; the caller
    /// decides whether that ends the process.
    pub fn run_cycle(&mut self, now: &chrono::DateTime<chrono::Utc>) -> result::BusLightResult<CycleOutcome> {
        let outcome = self.cycle(now);
        self.enter(CyclePhase::Idle);
        return outcome;
    }

    fn cycle(&mut self, now: &chrono::DateTime<chrono::Utc>) -> result::BusLightResult<CycleOutcome> {
        self.enter(CyclePhase::Fetching);
        let arrival = self.client.fetch_next_arrival(now)?;

        self.enter(CyclePhase::Resolving);
        let soonest = resolve::resolve_soonest(&arrival)?;
        info!("Currently {}. Next bus at {}", now.timestamp_millis(), soonest);

        let remaining = match resolve::remaining_until(soonest, now) {
            Ok(remaining) => remaining,
            Err(BusLightError::StaleArrival { remaining_millis }) => {
                warn!("Negative interval ({}ms), next check in {}s", remaining_millis, RETRY_DELAY_SECS);
                let next_check = self.schedule_retry(now);
                return Ok(CycleOutcome::Stale {
                    remaining_millis: remaining_millis,
                    next_check: next_check,
                });
            },
            Err(err) => return Err(err),
        };

        self.enter(CyclePhase::Mapping);
        let (display_state, delay) = state::map_remaining_to_state(remaining);
        info!("{}", display_state);

        self.enter(CyclePhase::Applying);
        match self.light.apply(display_state) {
            Ok(()) => {
                let next_check = self.schedule(now, delay);
                return Ok(CycleOutcome::Applied {
                    state: display_state,
                    next_check: next_check,
                });
            },
            Err(err) => {
                warn!("Had problem updating light: {}. Next check in {}s", err, RETRY_DELAY_SECS);
                let next_check = self.schedule_retry(now);
                return Ok(CycleOutcome::LightFailed {
                    state: display_state,
                    error: err.to_string(),
                    next_check: next_check,
                });
            },
        }
    }

    /// Fires due checks until `shutdown` is set or a cycle fails.
    pub fn run_until(&mut self, shutdown: &AtomicBool) -> result::BusLightResult<()> {
        while !shutdown.load(Ordering::Relaxed) {
            let now = chrono::Utc::now();
            if self.scheduler.take_due(&now).is_some() {
                if let Err(err) = self.run_cycle(&now) {
                    self.scheduler.shutdown();
                    return Err(err);
                }
                continue;
            }

            let wait = self.scheduler.until_due(&now)
                .and_then(|d| d.to_std().ok())
                .map(|d| std::cmp::min(d, IDLE_TICK))
                .unwrap_or(IDLE_TICK);
            std::thread::sleep(wait);
        }

        info!("Shutdown requested");
        self.scheduler.shutdown();
        return Ok(());
    }
}
