// Axon sidechain client implementing checker & collator roles
// Written in 2021 by
//     Axon Client developers
//
// To the extent possible under law, the author(s) have dedicated all
// copyright and related and neighboring rights to this software to
// the public domain worldwide. This software is distributed without
// any warranty.
//
// You should have received a copy of the MIT License
// along with this software.
// If not, see <https://opensource.org/licenses/MIT>.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use axon::role::{CycleError, CycleOutcome};

/// Single tick of a role
#[async_trait]
pub trait Cycle: Send + Sync + 'static {
    fn name(&self) -> String;

    async fn run_cycle(&self) -> Result<CycleOutcome, CycleError>;
}

/// Releases in-flight flag when the cycle task finishes, fails or panics
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Periodic single-flight runner of a role cycle: a tick arriving while the
/// previous cycle is still running is dropped
pub struct Scheduler<C: Cycle> {
    cycle: Arc<C>,
    period: Duration,
    in_flight: Arc<AtomicBool>,
}

impl<C: Cycle> Scheduler<C> {
    pub fn new(cycle: C, period: Duration) -> Self {
        Scheduler {
            cycle: Arc::new(cycle),
            period,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Starts a cycle unless the previous one is still running
    pub fn tick(&self) -> Option<JoinHandle<Result<CycleOutcome, CycleError>>> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!("{} cycle is still running, tick dropped", self.cycle.name());
            return None;
        }
        let guard = InFlight(self.in_flight.clone());
        let cycle = self.cycle.clone();
        Some(tokio::spawn(async move {
            let _guard = guard;
            let result = cycle.run_cycle().await;
            match &result {
                Ok(outcome) => info!("{} cycle finished: {}", cycle.name(), outcome),
                Err(err) => error!("{} cycle failed: {}", cycle.name(), err),
            }
            result
        }))
    }

    /// Run loop which never returns: ticks the cycle every period
    pub async fn run_loop(self) {
        info!(
            "Starting {} cycles every {} ms",
            self.cycle.name(),
            self.period.as_millis()
        );
        let mut interval = time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            // Outcome is logged by the cycle task itself
            let _ = self.tick();
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    struct SlowCycle {
        runs: Arc<AtomicUsize>,
        delay: Duration,
        fail: bool,
        panic: bool,
    }

    impl SlowCycle {
        fn new(delay_ms: u64) -> Self {
            SlowCycle {
                runs: Default::default(),
                delay: Duration::from_millis(delay_ms),
                fail: false,
                panic: false,
            }
        }
    }

    #[async_trait]
    impl Cycle for SlowCycle {
        fn name(&self) -> String {
            s!("test")
        }

        async fn run_cycle(&self) -> Result<CycleOutcome, CycleError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            time::sleep(self.delay).await;
            if self.panic {
                panic!("cycle panic");
            }
            if self.fail {
                return Err(CycleError::UnexpectedStatus(s!("broken")));
            }
            Ok(CycleOutcome::Idle)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_flight() {
        let scheduler = Scheduler::new(SlowCycle::new(100), Duration::from_millis(10));
        let handle = scheduler.tick().unwrap();
        assert!(scheduler.is_in_flight());
        assert!(scheduler.tick().is_none());
        assert_eq!(handle.await.unwrap().unwrap(), CycleOutcome::Idle);
        assert!(!scheduler.is_in_flight());
        let handle = scheduler.tick().unwrap();
        assert!(scheduler.is_in_flight());
        assert_eq!(handle.await.unwrap().unwrap(), CycleOutcome::Idle);
        assert_eq!(scheduler.cycle.runs.load(Ordering::SeqCst), 2);
        assert!(!scheduler.is_in_flight());
    }

    #[tokio::test(start_paused = true)]
    async fn test_released_on_error() {
        let mut cycle = SlowCycle::new(5);
        cycle.fail = true;
        let scheduler = Scheduler::new(cycle, Duration::from_millis(10));
        let result = scheduler.tick().unwrap().await.unwrap();
        assert!(matches!(result, Err(CycleError::UnexpectedStatus(_))));
        assert!(!scheduler.is_in_flight());
    }

    #[tokio::test(start_paused = true)]
    async fn test_released_on_panic() {
        let mut cycle = SlowCycle::new(5);
        cycle.panic = true;
        let scheduler = Scheduler::new(cycle, Duration::from_millis(10));
        assert!(scheduler.tick().unwrap().await.unwrap_err().is_panic());
        assert!(!scheduler.is_in_flight());
        assert!(scheduler.tick().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_loop_drops_ticks() {
        let cycle = SlowCycle::new(25);
        let runs = cycle.runs.clone();
        let scheduler = Scheduler::new(cycle, Duration::from_millis(10));
        let handle = tokio::spawn(scheduler.run_loop());
        time::sleep(Duration::from_millis(95)).await;
        handle.abort();
        // ticks at 0, 30, 60, 90 find the previous cycle finished
        let runs = runs.load(Ordering::SeqCst);
        assert!(runs >= 3 && runs <= 4, "{} cycles", runs);
    }
}
