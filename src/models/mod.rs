mod task;
mod task_log;

pub use task::{NewTask, Task, TaskChanges, TaskRecord, TaskStatus};
pub use task_log::{NewTaskLog, NewTaskLogRecord, TaskLog, TaskLogRecord, TaskLogStatus};
