//! Guarded execution: the enqueue → admit → work → release sequence in one call.

use std::future::Future;

use crate::core::{AppResult, Outcome, Scheduler, SchedulerError, Task, TaskRequest};
use crate::util::serde::TaskId;

/// Where a guarded run currently stands; decides the cleanup on drop.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Stage {
    Waiting,
    Admitted,
    Finished,
}

/// Cleans up after a run whose future was dropped early (client went away,
/// surrounding timeout fired, or the work panicked).
struct RunGuard<'a> {
    scheduler: &'a Scheduler,
    id: TaskId,
    stage: Stage,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        match self.stage {
            Stage::Waiting => {
                self.scheduler.withdraw(self.id);
            }
            Stage::Admitted => {
                tracing::warn!("task {} abandoned while running", self.id);
                self.scheduler
                    .release(self.id, Outcome::Failed, Some("abandoned".into()));
            }
            Stage::Finished => {}
        }
    }
}

/// Enqueue `request`, wait for admission, run `work`, and release the slot.
///
/// The slot is released as `completed` when `work` returns `Ok`, and as
/// `failed` with the error text when it returns `Err`. If the returned future
/// is dropped early the task is withdrawn (still waiting) or released as
/// failed (already admitted), so no slot or queue entry leaks. The wait for
/// admission is bounded by [`Scheduler::default_admit_timeout`] when one is set.
///
/// # Errors
///
/// Returns scheduling errors (shutdown, admission timeout) or the error produced by `work`.
pub async fn run_admitted<F, Fut, T>(
    scheduler: &Scheduler,
    request: TaskRequest,
    work: F,
) -> AppResult<T>
where
    F: FnOnce(Task) -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let task = scheduler.enqueue(request)?;
    let mut guard = RunGuard {
        scheduler,
        id: task.id,
        stage: Stage::Waiting,
    };

    let admitted = match scheduler.default_admit_timeout() {
        Some(limit) => tokio::time::timeout(limit, scheduler.admit_async(task.id))
            .await
            .map_err(|_| {
                tracing::warn!("task {} timed out waiting for admission", task.id);
                SchedulerError::AdmissionTimeout(task.id)
            })??,
        None => scheduler.admit_async(task.id).await?,
    };
    guard.stage = Stage::Admitted;

    let result = work(admitted).await;
    guard.stage = Stage::Finished;
    match &result {
        Ok(_) => {
            scheduler.release(task.id, Outcome::Completed, None);
        }
        Err(e) => {
            scheduler.release(task.id, Outcome::Failed, Some(format!("{e:#}")));
        }
    }
    result
}
