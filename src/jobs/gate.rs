//! Per-task execution locks.
//!
//! A firing holds its task's lock for the whole execution, log write
//! included. The lifecycle service takes the same lock before removing rows,
//! so a delete waits for a running firing and no log lands after it.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

pub type ExecutionGuard = OwnedMutexGuard<()>;

#[derive(Debug, Default)]
pub struct ExecutionGate {
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl ExecutionGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, task_id: Uuid) -> Arc<Mutex<()>> {
        Arc::clone(self.locks.entry(task_id).or_default().value())
    }

    /// Enters without waiting. `None` while another execution holds the task.
    pub fn try_enter(&self, task_id: Uuid) -> Option<ExecutionGuard> {
        self.slot(task_id).try_lock_owned().ok()
    }

    /// Waits for a running execution to finish and keeps new ones out until
    /// the guard drops.
    pub async fn enter(&self, task_id: Uuid) -> ExecutionGuard {
        self.slot(task_id).lock_owned().await
    }

    /// Drops the lock slot of a deleted task.
    pub fn forget(&self, task_id: Uuid) {
        self.locks.remove(&task_id);
    }

    pub fn is_running(&self, task_id: Uuid) -> bool {
        self.locks
            .get(&task_id)
            .is_some_and(|slot| slot.try_lock().is_err())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_try_enter_is_exclusive_per_task() {
        let gate = ExecutionGate::new();
        let task_id = Uuid::new_v4();

        let guard = gate.try_enter(task_id).unwrap();
        assert!(gate.try_enter(task_id).is_none());
        assert!(gate.try_enter(Uuid::new_v4()).is_some());
        assert!(gate.is_running(task_id));

        drop(guard);
        assert!(!gate.is_running(task_id));
        assert!(gate.try_enter(task_id).is_some());
    }

    #[tokio::test]
    async fn test_enter_waits_for_running_execution() {
        let gate = Arc::new(ExecutionGate::new());
        let task_id = Uuid::new_v4();
        let running = gate.try_enter(task_id).unwrap();

        let waiter = tokio::spawn({
            let gate = gate.clone();
            async move {
                let _guard = gate.enter(task_id).await;
            }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(running);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[test]
    fn test_forget_drops_slot() {
        let gate = ExecutionGate::new();
        let task_id = Uuid::new_v4();
        drop(gate.try_enter(task_id));

        gate.forget(task_id);

        assert!(gate.locks.is_empty());
    }
}
