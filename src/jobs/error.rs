use thiserror::Error;
use tokio_cron_scheduler::JobSchedulerError;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Invalid schedule '{schedule}': {reason}")]
    InvalidSchedule { schedule: String, reason: String },

    #[error("Scheduler error: {0}")]
    Scheduler(String),
}

impl SchedulerError {
    pub fn invalid_schedule(schedule: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSchedule {
            schedule: schedule.into(),
            reason: reason.into(),
        }
    }
}

impl From<JobSchedulerError> for SchedulerError {
    fn from(error: JobSchedulerError) -> Self {
        Self::Scheduler(error.to_string())
    }
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
