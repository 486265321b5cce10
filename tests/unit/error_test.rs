//! Tests for error types

use admission_gate::core::SchedulerError;
use admission_gate::util::serde::TaskId;

#[test]
fn test_task_not_found_error() {
    let id = TaskId::new();
    let err = SchedulerError::TaskNotFound(id);
    assert_eq!(format!("{}", err), format!("task not found: {id}"));
}

#[test]
fn test_admission_timeout_error() {
    let id = TaskId::new();
    let err = SchedulerError::AdmissionTimeout(id);
    assert_eq!(format!("{}", err), format!("admission timed out: {id}"));
}

#[test]
fn test_shutting_down_error() {
    let err = SchedulerError::ShuttingDown;
    assert_eq!(format!("{}", err), "scheduler is shutting down");
}

#[test]
fn test_history_write_failed_error() {
    let err = SchedulerError::HistoryWriteFailed("disk full".to_string());
    assert_eq!(format!("{}", err), "history write failed: disk full");
}

#[test]
fn test_backend_error() {
    let err = SchedulerError::Backend("connection failed".to_string());
    assert_eq!(format!("{}", err), "backend error: connection failed");
}
