//! Periodic job driver.
//!
//! Named jobs each carry an interval; a 10-second heartbeat invokes every
//! job that has come due. Failures are logged and isolated, and a failed
//! job's `last_run` is not advanced, so it retries on the next heartbeat.

use anyhow::Result;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::{error, info};

type JobFn = Arc<dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync>;

struct Job {
    name: String,
    interval: Duration,
    func: JobFn,
    last_run: Option<Instant>,
}

pub struct Scheduler {
    jobs: Vec<Job>,
    heartbeat: Duration,
}

impl Scheduler {
    pub fn new(heartbeat: Duration) -> Self {
        Self {
            jobs: Vec::new(),
            heartbeat,
        }
    }

    pub fn add_job<F>(&mut self, name: &str, interval: Duration, func: F)
    where
        F: Fn() -> BoxFuture<'static, Result<()>> + Send + Sync + 'static,
    {
        info!("Scheduled job '{}' every {:?}", name, interval);
        self.jobs.push(Job {
            name: name.to_string(),
            interval,
            func: Arc::new(func),
            last_run: None,
        });
    }

    fn due_jobs(&self, now: Instant) -> Vec<usize> {
        self.jobs
            .iter()
            .enumerate()
            .filter(|(_, job)| match job.last_run {
                None => true,
                Some(last) => now.duration_since(last) >= job.interval,
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Run every due job once. Split out from [`run`] so tests can drive the
    /// clock directly.
    pub async fn tick(&mut self, now: Instant) {
        for idx in self.due_jobs(now) {
            let name = self.jobs[idx].name.clone();
            let func = self.jobs[idx].func.clone();

            info!("Running job '{}'", name);
            match func().await {
                Ok(()) => {
                    self.jobs[idx].last_run = Some(now);
                }
                Err(e) => {
                    error!("Job '{}' failed: {}", name, e);
                }
            }
        }
    }

    pub async fn run(mut self) {
        info!("Scheduler started ({} jobs)", self.jobs.len());
        let mut heartbeat = time::interval(self.heartbeat);

        loop {
            heartbeat.tick().await;
            self.tick(Instant::now()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter_job(count: Arc<AtomicUsize>, fail: bool) -> impl Fn() -> BoxFuture<'static, Result<()>> {
        move || {
            let count = count.clone();
            Box::pin(async move {
                count.fetch_add(1, Ordering::SeqCst);
                if fail {
                    anyhow::bail!("job exploded")
                }
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn test_jobs_fire_on_interval() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut scheduler = Scheduler::new(Duration::from_secs(10));
        scheduler.add_job("counter", Duration::from_secs(30), counter_job(count.clone(), false));

        let start = Instant::now();
        scheduler.tick(start).await; // first run is immediate
        scheduler.tick(start + Duration::from_secs(10)).await; // not due
        scheduler.tick(start + Duration::from_secs(31)).await; // due again

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_job_retries_and_is_isolated() {
        let failing = Arc::new(AtomicUsize::new(0));
        let healthy = Arc::new(AtomicUsize::new(0));
        let mut scheduler = Scheduler::new(Duration::from_secs(10));
        scheduler.add_job("failing", Duration::from_secs(300), counter_job(failing.clone(), true));
        scheduler.add_job("healthy", Duration::from_secs(300), counter_job(healthy.clone(), false));

        let start = Instant::now();
        scheduler.tick(start).await;
        // Failure did not advance last_run: retried on the next heartbeat.
        scheduler.tick(start + Duration::from_secs(10)).await;

        assert_eq!(failing.load(Ordering::SeqCst), 2);
        assert_eq!(healthy.load(Ordering::SeqCst), 1);
    }
}
