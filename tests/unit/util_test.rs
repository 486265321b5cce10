//! Tests for utility functions

use admission_gate::util::{elapsed_secs, now_ms, Privilege, TaskId};

#[test]
fn test_privilege_from_authenticated() {
    assert_eq!(Privilege::from_authenticated(true), Privilege::Privileged);
    assert_eq!(Privilege::from_authenticated(false), Privilege::Ordinary);
    assert!(Privilege::Privileged.is_privileged());
    assert_eq!(Privilege::default(), Privilege::Ordinary);
}

#[test]
fn test_task_id_roundtrip_through_string() {
    let id = TaskId::new();
    let parsed: TaskId = id.to_string().parse().unwrap();
    assert_eq!(parsed, id);
    assert_eq!(id.short().len(), 8);
    assert!("not-a-uuid".parse::<TaskId>().is_err());
}

#[test]
fn test_task_id_serializes_as_string() {
    let id = TaskId::new();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{id}\""));
}

#[test]
fn test_clock() {
    let start = now_ms();
    assert!(elapsed_secs(start, start + 1500) > 1.4);
    assert!(elapsed_secs(start + 10, start).abs() < f64::EPSILON);
}

#[test]
fn test_init_tracing_is_idempotent() {
    admission_gate::util::init_tracing_with_default("admission_gate=debug");
    admission_gate::util::init_tracing();
    assert!(tracing::dispatcher::has_been_set());
}
