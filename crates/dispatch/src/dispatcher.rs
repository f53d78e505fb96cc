//! The dispatch loop: build the table, sleep, collect due jobs, launch.

use {
    chrono::{DateTime, Utc},
    tokio::sync::watch,
    tracing::{error, info, warn},
};

use crate::{
    error::{Error, Result},
    liveness::LivenessTracker,
    registry::JobRegistry,
    table::ScheduleTable,
    unit::ExecutionUnit,
};

enum Wake {
    Due,
    Shutdown,
}

/// Owns the schedule table and the liveness tracker and drives the
/// launch cycle over an immutable registry.
///
/// All scheduling state lives here: constructed once, consumed by
/// [`Dispatcher::run`], gone when the loop returns.
#[derive(Debug)]
pub struct Dispatcher {
    registry: JobRegistry,
    liveness: LivenessTracker,
}

impl Dispatcher {
    /// Fails with [`Error::NoJobs`] on an empty registry: a dispatcher
    /// with nothing to run must not enter the loop.
    pub fn new(registry: JobRegistry) -> Result<Self> {
        if registry.is_empty() {
            return Err(Error::NoJobs);
        }
        let liveness = LivenessTracker::for_registry(&registry);
        Ok(Self { registry, liveness })
    }

    /// Drive the cycle until shutdown flips the channel (clean exit) or
    /// no job yields a schedulable instant (fatal).
    ///
    /// Each cycle rebuilds the whole table from the registry, sleeps
    /// until its earliest instant, then makes one independent
    /// launch-or-skip decision per due job. In-flight executions are
    /// abandoned at shutdown; the loop only reports how many.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(jobs = self.registry.len(), "dispatcher started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let now = Utc::now();
            let table = ScheduleTable::build(&self.registry, now);
            let Some(wake_at) = table.earliest() else {
                error!("no job produced a schedulable instant");
                return Err(Error::NoJobs);
            };

            let sleep_secs = (wake_at - now).num_seconds().max(0);
            info!(scheduled = table.len(), sleep_secs, wake_at = %wake_at, "cycle planned");

            if matches!(wait_until(wake_at, &mut shutdown).await, Wake::Shutdown) {
                break;
            }

            let woke = Utc::now();
            for name in table.into_due(woke) {
                if let Err(e) = self.dispatch_one(&name, woke) {
                    error!(job = %name, error = %e, "launch failed");
                }
            }
        }

        let abandoned = self.liveness.running_count();
        if abandoned > 0 {
            warn!(abandoned, "dispatcher stopped with executions still in flight");
        } else {
            info!("dispatcher stopped");
        }
        Ok(())
    }

    // ── Internal ────────────────────────────────────────────────────────

    /// Launch-or-skip for one due job, independent of every other due
    /// job in the cycle.
    fn dispatch_one(&mut self, name: &str, now: DateTime<Utc>) -> Result<()> {
        // A finished execution frees the job for immediate relaunch.
        if !self.liveness.is_idle(name) && self.liveness.is_finished(name) {
            self.liveness.mark_idle(name);
        }

        if !self.liveness.is_idle(name) {
            let running_secs = self
                .liveness
                .started_at(name)
                .map(|at| (now - at).num_seconds())
                .unwrap_or(0);
            info!(job = %name, running_secs, "job already running, skipping launch");
            return Ok(());
        }

        let job = self
            .registry
            .get(name)
            .ok_or_else(|| Error::job_not_found(name))?;
        let unit = ExecutionUnit::launch(job);
        info!(job = %name, schedule = %job.schedule, "job launched");
        self.liveness.mark_running(name, unit);
        Ok(())
    }
}

/// Sleep until `deadline`. Only shutdown interrupts; any other early
/// wake re-checks the remaining time and keeps sleeping.
async fn wait_until(deadline: DateTime<Utc>, shutdown: &mut watch::Receiver<bool>) -> Wake {
    loop {
        let Ok(remaining) = (deadline - Utc::now()).to_std() else {
            return Wake::Due; // deadline already passed
        };
        if remaining.is_zero() {
            return Wake::Due;
        }
        tokio::select! {
            () = tokio::time::sleep(remaining) => {},
            changed = shutdown.changed() => {
                // A dropped sender counts as shutdown.
                if changed.is_err() || *shutdown.borrow() {
                    return Wake::Shutdown;
                }
            },
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use super::*;
    use crate::{registry::Job, task::Task};

    struct CountingTask {
        runs: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl Task for CountingTask {
        async fn run(&self) -> anyhow::Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct StartThenHangTask {
        starts: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl Task for StartThenHangTask {
        async fn run(&self) -> anyhow::Result<()> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    fn counting_registry(name: &str, schedule: &str) -> (JobRegistry, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        let task = CountingTask {
            runs: Arc::clone(&runs),
        };
        let mut registry = JobRegistry::new();
        registry.register(Job::new(name, schedule, Arc::new(task))).unwrap();
        (registry, runs)
    }

    async fn wait_for_count(counter: &Arc<AtomicUsize>, at_least: usize) {
        tokio::time::timeout(Duration::from_secs(3), async {
            while counter.load(Ordering::SeqCst) < at_least {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .unwrap();
    }

    #[test]
    fn test_empty_registry_rejected() {
        let err = match Dispatcher::new(JobRegistry::new()) {
            Ok(_) => panic!("empty registry must be rejected"),
            Err(e) => e,
        };
        assert!(matches!(err, Error::NoJobs));
    }

    #[tokio::test]
    async fn test_dispatch_launches_idle_job() {
        let (registry, runs) = counting_registry("tick", "@hourly");
        let mut dispatcher = Dispatcher::new(registry).unwrap();

        dispatcher.dispatch_one("tick", Utc::now()).unwrap();
        assert!(!dispatcher.liveness.is_idle("tick"));
        wait_for_count(&runs, 1).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_running_job_not_relaunched() {
        let starts = Arc::new(AtomicUsize::new(0));
        let task = StartThenHangTask {
            starts: Arc::clone(&starts),
        };
        let mut registry = JobRegistry::new();
        registry
            .register(Job::new("hang", "@hourly", Arc::new(task)))
            .unwrap();
        let mut dispatcher = Dispatcher::new(registry).unwrap();

        let now = Utc::now();
        dispatcher.dispatch_one("hang", now).unwrap();
        wait_for_count(&starts, 1).await;

        dispatcher.dispatch_one("hang", now).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.liveness.running_count(), 1);
    }

    #[tokio::test]
    async fn test_finished_job_relaunched() {
        let (registry, runs) = counting_registry("tick", "@hourly");
        let mut dispatcher = Dispatcher::new(registry).unwrap();

        dispatcher.dispatch_one("tick", Utc::now()).unwrap();
        wait_for_count(&runs, 1).await;
        tokio::time::timeout(Duration::from_secs(2), async {
            while !dispatcher.liveness.is_finished("tick") {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        dispatcher.dispatch_one("tick", Utc::now()).unwrap();
        wait_for_count(&runs, 2).await;
    }

    #[tokio::test]
    async fn test_unknown_name_reports_not_found() {
        let (registry, _runs) = counting_registry("tick", "@hourly");
        let mut dispatcher = Dispatcher::new(registry).unwrap();

        let err = dispatcher.dispatch_one("ghost", Utc::now()).unwrap_err();
        assert!(matches!(err, Error::JobNotFound { .. }));
    }

    #[tokio::test]
    async fn test_run_executes_due_jobs_then_shuts_down() {
        // Second-granularity schedule so the loop fires within the test.
        let (registry, runs) = counting_registry("fast", "* * * * * * *");
        let dispatcher = Dispatcher::new(registry).unwrap();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(dispatcher.run(shutdown_rx));

        wait_for_count(&runs, 1).await;
        shutdown_tx.send(true).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_coincident_jobs_both_launch() {
        let runs_a = Arc::new(AtomicUsize::new(0));
        let runs_b = Arc::new(AtomicUsize::new(0));
        let mut registry = JobRegistry::new();
        registry
            .register(Job::new(
                "a",
                "* * * * * * *",
                Arc::new(CountingTask {
                    runs: Arc::clone(&runs_a),
                }),
            ))
            .unwrap();
        registry
            .register(Job::new(
                "b",
                "* * * * * * *",
                Arc::new(CountingTask {
                    runs: Arc::clone(&runs_b),
                }),
            ))
            .unwrap();
        let dispatcher = Dispatcher::new(registry).unwrap();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(dispatcher.run(shutdown_rx));

        wait_for_count(&runs_a, 1).await;
        wait_for_count(&runs_b, 1).await;
        shutdown_tx.send(true).unwrap();
        let _ = tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_long_sleep() {
        // Next hourly fire can be up to an hour away; shutdown must not wait.
        let (registry, _runs) = counting_registry("slow", "@hourly");
        let dispatcher = Dispatcher::new(registry).unwrap();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(dispatcher.run(shutdown_rx));

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_all_schedules_invalid_is_fatal() {
        let (registry, _runs) = counting_registry("broken", "not a cron");
        let dispatcher = Dispatcher::new(registry).unwrap();

        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let result = tokio::time::timeout(Duration::from_secs(1), dispatcher.run(shutdown_rx))
            .await
            .unwrap();
        assert!(matches!(result, Err(Error::NoJobs)));
    }
}
