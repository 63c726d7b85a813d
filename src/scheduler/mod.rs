pub mod daily;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use futures::future::BoxFuture;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::info;
use uuid::Uuid;

/// Action invoked on every trigger firing
pub type Task = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// When a job fires
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// Every day at a wall-clock time in a fixed timezone
    Daily {
        hour: u32,
        minute: u32,
        timezone: Tz,
    },
    /// Once, after a delay measured from registration
    Once { delay: Duration },
}

impl Trigger {
    /// Six-field cron expression (with seconds) for recurring triggers
    pub fn cron_expr(&self) -> Option<String> {
        match self {
            Trigger::Daily { hour, minute, .. } => Some(format!("0 {} {} * * *", minute, hour)),
            Trigger::Once { .. } => None,
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Daily {
                hour,
                minute,
                timezone,
            } => write!(f, "daily {:02}:{:02} {}", hour, minute, timezone),
            Trigger::Once { delay } => write!(f, "once in {}s", delay.as_secs()),
        }
    }
}

/// Wrapper around tokio-cron-scheduler.
///
/// Construct exactly one per process: every instance owns its own timer, so a
/// second one would fire the same jobs again.
pub struct Scheduler {
    inner: JobScheduler,
    job_ids: Vec<Uuid>,
}

impl Scheduler {
    /// Create a new scheduler
    pub async fn new() -> Result<Self> {
        let inner = JobScheduler::new()
            .await
            .context("Failed to create job scheduler")?;
        Ok(Self {
            inner,
            job_ids: Vec::new(),
        })
    }

    /// Register `task` to run whenever `trigger` fires
    pub async fn add_job(&mut self, name: &str, trigger: &Trigger, task: Task) -> Result<Uuid> {
        let job = match trigger {
            Trigger::Daily { timezone, .. } => {
                let expr = trigger.cron_expr().unwrap_or_default();
                let job_name = name.to_string();
                Job::new_async_tz(expr.as_str(), *timezone, move |_uuid, _lock| {
                    let name = job_name.clone();
                    let fut = task();
                    let run: Pin<Box<dyn Future<Output = ()> + Send>> = Box::pin(async move {
                        info!("Running scheduled task: {}", name);
                        fut.await;
                    });
                    run
                })
            }
            Trigger::Once { delay } => {
                let job_name = name.to_string();
                Job::new_one_shot_async(*delay, move |_uuid, _lock| {
                    let name = job_name.clone();
                    let fut = task();
                    let run: Pin<Box<dyn Future<Output = ()> + Send>> = Box::pin(async move {
                        info!("Running one-off task: {}", name);
                        fut.await;
                    });
                    run
                })
            }
        }
        .with_context(|| format!("Failed to create job: {}", name))?;

        let id = self
            .inner
            .add(job)
            .await
            .with_context(|| format!("Failed to add job: {}", name))?;
        self.job_ids.push(id);

        info!("Scheduled task '{}' ({})", name, trigger);
        Ok(id)
    }

    /// Number of jobs registered so far
    pub fn job_count(&self) -> usize {
        self.job_ids.len()
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<()> {
        self.inner
            .start()
            .await
            .context("Failed to start scheduler")?;
        info!("Scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<()> {
        self.inner
            .shutdown()
            .await
            .context("Failed to shutdown scheduler")?;
        info!("Scheduler stopped");
        Ok(())
    }
}
