//! Job Registry: live recurring timers keyed by task id.
//!
//! Wraps `tokio_cron_scheduler::JobScheduler`. The entry map is injected so a
//! fresh registry can be built per test. All mutations of the map and the
//! scheduler happen while holding the scheduler lock, which keeps at most one
//! timer per task.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::jobs::error::{SchedulerError, SchedulerResult};
use crate::jobs::schedule;
use crate::models::Task;

/// Invoked with the task id on every timer firing.
#[async_trait]
pub trait JobCallback: Send + Sync {
    async fn on_fire(&self, task_id: Uuid);
}

/// One live timer.
#[derive(Debug, Clone)]
pub struct JobEntry {
    pub job_id: Uuid,
    /// Normalized cron expression
    pub schedule: String,
    cancel: CancellationToken,
}

pub type JobEntries = DashMap<Uuid, JobEntry>;

/// Returned by [`JobRegistry::register`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub task_id: Uuid,
    pub job_id: Uuid,
    pub schedule: String,
}

pub struct JobRegistry {
    scheduler: Mutex<JobScheduler>,
    entries: Arc<JobEntries>,
    callback: Arc<dyn JobCallback>,
}

impl JobRegistry {
    pub async fn new(
        callback: Arc<dyn JobCallback>,
        entries: Arc<JobEntries>,
    ) -> SchedulerResult<Self> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            scheduler: Mutex::new(scheduler),
            entries,
            callback,
        })
    }

    /// Empty entry map for [`JobRegistry::new`]
    pub fn new_entries() -> Arc<JobEntries> {
        Arc::new(DashMap::new())
    }

    /// Starts ticking. Jobs registered before this call begin firing now.
    pub async fn start(&self) -> SchedulerResult<()> {
        self.scheduler.lock().await.start().await?;
        tracing::info!(jobs = self.entries.len(), "Job scheduler started");
        Ok(())
    }

    /// Cancels every entry and stops the underlying scheduler.
    pub async fn shutdown(&self) -> SchedulerResult<()> {
        let mut scheduler = self.scheduler.lock().await;

        for entry in self.entries.iter() {
            entry.cancel.cancel();
        }
        self.entries.clear();

        scheduler.shutdown().await?;
        tracing::info!("Job scheduler stopped");
        Ok(())
    }

    /// Creates the recurring timer for `task`, replacing any existing one.
    ///
    /// The new job is built and added before the old entry is touched, so a
    /// failure at either step leaves a previously registered timer running.
    pub async fn register(&self, task: &Task) -> SchedulerResult<JobHandle> {
        let task_id = task.task_id;
        let normalized = schedule::normalize(&task.schedule)?;
        let cancel = CancellationToken::new();

        let callback = Arc::clone(&self.callback);
        let token = cancel.clone();
        let job = Job::new_async(normalized.as_str(), move |_job_id, _lock| {
            let callback = Arc::clone(&callback);
            let token = token.clone();
            Box::pin(async move {
                if token.is_cancelled() {
                    return;
                }
                callback.on_fire(task_id).await;
            })
        })
        .map_err(|e| SchedulerError::invalid_schedule(&task.schedule, e.to_string()))?;

        let scheduler = self.scheduler.lock().await;

        let job_id = scheduler.add(job).await?;

        if let Some((_, previous)) = self.entries.remove(&task_id) {
            Self::remove_entry(&scheduler, task_id, previous).await;
        }

        self.entries.insert(
            task_id,
            JobEntry {
                job_id,
                schedule: normalized.clone(),
                cancel,
            },
        );

        tracing::debug!(task_id = %task_id, job_id = %job_id, schedule = %normalized, "Timer registered");

        Ok(JobHandle {
            task_id,
            job_id,
            schedule: normalized,
        })
    }

    /// Stops and discards the timer for `task_id`. Returns whether one existed.
    ///
    /// No firing starts after this returns; one already running may finish.
    pub async fn cancel(&self, task_id: Uuid) -> bool {
        let scheduler = self.scheduler.lock().await;

        match self.entries.remove(&task_id) {
            Some((_, entry)) => {
                Self::remove_entry(&scheduler, task_id, entry).await;
                tracing::debug!(task_id = %task_id, "Timer cancelled");
                true
            }
            None => false,
        }
    }

    async fn remove_entry(scheduler: &JobScheduler, task_id: Uuid, entry: JobEntry) {
        entry.cancel.cancel();
        // The token already silences the job, so a failed removal only leaks
        // an inert timer.
        if let Err(e) = scheduler.remove(&entry.job_id).await {
            tracing::warn!(
                task_id = %task_id,
                job_id = %entry.job_id,
                error = %e,
                "Failed to remove job from scheduler"
            );
        }
    }

    pub fn is_registered(&self, task_id: Uuid) -> bool {
        self.entries.contains_key(&task_id)
    }

    /// Normalized schedule of the live timer, if any
    pub fn registered_schedule(&self, task_id: Uuid) -> Option<String> {
        self.entries.get(&task_id).map(|entry| entry.schedule.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::NewTask;
    use std::time::Duration;

    /// Counts firings per task
    #[derive(Default)]
    pub(crate) struct CountingCallback {
        pub fired: DashMap<Uuid, usize>,
    }

    impl CountingCallback {
        pub fn count(&self, task_id: Uuid) -> usize {
            self.fired.get(&task_id).map(|c| *c).unwrap_or(0)
        }
    }

    #[async_trait]
    impl JobCallback for CountingCallback {
        async fn on_fire(&self, task_id: Uuid) {
            *self.fired.entry(task_id).or_insert(0) += 1;
        }
    }

    fn task_with_schedule(schedule: &str) -> Task {
        NewTask {
            name: "reminder".to_string(),
            schedule: schedule.to_string(),
            email: "a@b.com".to_string(),
            message: "hi".to_string(),
            expiration: None,
        }
        .into_task()
    }

    async fn registry() -> (JobRegistry, Arc<CountingCallback>) {
        let callback = Arc::new(CountingCallback::default());
        let registry = JobRegistry::new(callback.clone(), JobRegistry::new_entries())
            .await
            .unwrap();
        (registry, callback)
    }

    #[tokio::test]
    async fn test_register_normalizes_schedule() {
        let (registry, _) = registry().await;
        let task = task_with_schedule("*/5 * * * *");

        let handle = registry.register(&task).await.unwrap();

        assert_eq!(handle.task_id, task.task_id);
        assert_eq!(handle.schedule, "0 */5 * * * *");
        assert!(registry.is_registered(task.task_id));
        assert_eq!(
            registry.registered_schedule(task.task_id).as_deref(),
            Some("0 */5 * * * *")
        );
    }

    #[tokio::test]
    async fn test_register_invalid_schedule() {
        let (registry, _) = registry().await;
        let task = task_with_schedule("every tuesday");

        let result = registry.register(&task).await;

        assert!(matches!(result, Err(SchedulerError::InvalidSchedule { .. })));
        assert!(!registry.is_registered(task.task_id));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_register_twice_keeps_one_entry() {
        let (registry, _) = registry().await;
        let mut task = task_with_schedule("*/5 * * * *");

        let first = registry.register(&task).await.unwrap();
        task.schedule = "0 9 * * *".to_string();
        let second = registry.register(&task).await.unwrap();

        assert_ne!(first.job_id, second.job_id);
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.registered_schedule(task.task_id).as_deref(),
            Some("0 0 9 * * *")
        );
    }

    #[tokio::test]
    async fn test_invalid_reregistration_keeps_previous_timer() {
        let (registry, _) = registry().await;
        let mut task = task_with_schedule("*/5 * * * *");
        let original = registry.register(&task).await.unwrap();

        task.schedule = "bogus".to_string();
        assert!(registry.register(&task).await.is_err());

        assert_eq!(
            registry.registered_schedule(task.task_id),
            Some(original.schedule)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_reregistration_replaces_the_previous_job() {
        let (registry, callback) = registry().await;
        let mut task = task_with_schedule("* * * * * *");
        let first = registry.register(&task).await.unwrap();

        task.schedule = "0 0 0 1 1 *".to_string();
        let second = registry.register(&task).await.unwrap();
        registry.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert_eq!(callback.count(task.task_id), 0);
        assert_ne!(first.job_id, second.job_id);
        assert_eq!(
            registry.registered_schedule(task.task_id).as_deref(),
            Some("0 0 0 1 1 *")
        );

        registry.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_cancel_missing_is_noop() {
        let (registry, _) = registry().await;
        assert!(!registry.cancel(Uuid::new_v4()).await);
    }

    #[tokio::test]
    async fn test_registries_do_not_share_state() {
        let (first, _) = registry().await;
        let (second, _) = registry().await;
        let task = task_with_schedule("* * * * *");

        first.register(&task).await.unwrap();

        assert!(first.is_registered(task.task_id));
        assert!(!second.is_registered(task.task_id));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_registered_job_fires_until_cancelled() {
        let (registry, callback) = registry().await;
        let task = task_with_schedule("* * * * * *");

        registry.register(&task).await.unwrap();
        registry.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert!(callback.count(task.task_id) >= 1);

        assert!(registry.cancel(task.task_id).await);
        // let a firing that was already running finish
        tokio::time::sleep(Duration::from_millis(100)).await;
        let after_cancel = callback.count(task.task_id);
        tokio::time::sleep(Duration::from_millis(2000)).await;

        assert_eq!(callback.count(task.task_id), after_cancel);
        assert!(!registry.is_registered(task.task_id));

        registry.shutdown().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_shutdown_clears_entries() {
        let (registry, _) = registry().await;
        registry.register(&task_with_schedule("* * * * *")).await.unwrap();
        registry.register(&task_with_schedule("0 9 * * *")).await.unwrap();
        registry.start().await.unwrap();

        registry.shutdown().await.unwrap();

        assert!(registry.is_empty());
    }
}
