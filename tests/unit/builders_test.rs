//! Tests for builder modules

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use admission_gate::builders::{build_scheduler, GateBuilder};
use admission_gate::config::{GateConfig, HistoryBackendConfig};
use admission_gate::core::{
    HistoryEntry, HistorySink, InMemoryHistorySink, Outcome, SchedulerError, TaskRequest,
};
use admission_gate::runtime::{run_admitted, TokioSpawner};

/// Sink that takes a while per record, like a remote store.
struct SlowSink {
    delay: Duration,
    inner: InMemoryHistorySink,
}

impl HistorySink for SlowSink {
    fn record(&self, entry: &HistoryEntry) -> Result<(), SchedulerError> {
        thread::sleep(self.delay);
        self.inner.record(entry)
    }
}

#[test]
fn test_build_scheduler_defaults() {
    let gate = build_scheduler(&GateConfig::default()).unwrap();
    assert_eq!(gate.max_concurrent(), 1);
    assert_eq!(gate.status().active_count, 0);
}

#[test]
fn test_builder_overrides() {
    let builder = GateBuilder::new(GateConfig::default()).max_concurrent(4);
    assert_eq!(builder.config().max_concurrent, 4);
    let gate = builder.build().unwrap();
    assert_eq!(gate.max_concurrent(), 4);
}

#[test]
fn test_builder_rejects_invalid_config() {
    let result = GateBuilder::new(GateConfig {
        max_concurrent: 0,
        ..GateConfig::default()
    })
    .build();
    assert!(matches!(result, Err(SchedulerError::InvalidConfig(_))));
}

#[test]
fn test_builder_history_override() {
    let sink = Arc::new(InMemoryHistorySink::new(4));
    let gate = GateBuilder::new(GateConfig {
        history: HistoryBackendConfig::Disabled,
        ..GateConfig::default()
    })
    .history(sink.clone())
    .build()
    .unwrap();

    let task = gate.enqueue(TaskRequest::new("PDF merge", "anon")).unwrap();
    gate.admit(task.id).unwrap();
    gate.release(task.id, Outcome::Completed, None);
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_json_lines_backend() {
    let dir = std::env::temp_dir().join(format!(
        "admission-gate-builder-{}",
        admission_gate::util::serde::TaskId::new()
    ));
    let path = dir.join("history.jsonl");
    let gate = build_scheduler(&GateConfig {
        history: HistoryBackendConfig::JsonLines { path: path.clone() },
        ..GateConfig::default()
    })
    .unwrap();

    let task = gate.enqueue(TaskRequest::new("Word to PDF", "anon")).unwrap();
    gate.admit(task.id).unwrap();
    gate.release(task.id, Outcome::Failed, Some("timeout".into()));

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents.lines().count(), 1);
    assert!(contents.contains("\"timeout\""));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_default_admit_timeout_bounds_blocking_wait() {
    let gate = Arc::new(
        build_scheduler(&GateConfig {
            default_admit_timeout_secs: Some(1),
            ..GateConfig::default()
        })
        .unwrap(),
    );
    assert_eq!(gate.default_admit_timeout(), Some(Duration::from_secs(1)));
    let a = gate.enqueue(TaskRequest::new("A", "anon")).unwrap();
    gate.admit_bounded(a.id).unwrap();
    let b = gate.enqueue(TaskRequest::new("B", "anon")).unwrap();

    let id = b.id;
    let waiter = {
        let gate = Arc::clone(&gate);
        thread::spawn(move || gate.admit_bounded(id))
    };
    let result = waiter.join().unwrap();
    assert!(matches!(result, Err(SchedulerError::AdmissionTimeout(t)) if t == b.id));
    assert_eq!(gate.status().waiting_count, 0);
    assert_eq!(gate.status().active_count, 1);
}

#[tokio::test]
async fn test_default_admit_timeout_bounds_guarded_run() {
    let gate = build_scheduler(&GateConfig {
        default_admit_timeout_secs: Some(1),
        ..GateConfig::default()
    })
    .unwrap();
    let a = gate.enqueue(TaskRequest::new("A", "anon")).unwrap();
    gate.admit(a.id).unwrap();

    let started = Instant::now();
    let err = run_admitted(&gate, TaskRequest::new("B", "anon"), |_task| async move { Ok(()) })
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SchedulerError>(),
        Some(SchedulerError::AdmissionTimeout(_))
    ));
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(gate.status().waiting_count, 0);
    assert_eq!(gate.status().active_count, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_deferred_history_keeps_release_fast() {
    let slow = Arc::new(SlowSink {
        delay: Duration::from_millis(400),
        inner: InMemoryHistorySink::new(4),
    });
    let gate = GateBuilder::new(GateConfig {
        defer_history: true,
        ..GateConfig::default()
    })
    .history(slow.clone())
    .build()
    .unwrap();

    let task = gate.enqueue(TaskRequest::new("Word to PDF", "anon")).unwrap();
    gate.admit_async(task.id).await.unwrap();
    let started = Instant::now();
    gate.release(task.id, Outcome::Completed, None);
    assert!(started.elapsed() < Duration::from_millis(200));

    for _ in 0..100 {
        if !slow.inner.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(slow.inner.len(), 1);
}

#[test]
fn test_builder_spawner_defers_history() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let sink = Arc::new(InMemoryHistorySink::new(4));
    let gate = GateBuilder::new(GateConfig::default())
        .history(sink.clone())
        .spawner(TokioSpawner::new(rt.handle().clone()))
        .build()
        .unwrap();

    let task = gate.enqueue(TaskRequest::new("PDF merge", "anon")).unwrap();
    gate.admit(task.id).unwrap();
    gate.release(task.id, Outcome::Completed, None);
    for _ in 0..100 {
        if sink.len() == 1 {
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_defer_history_needs_runtime() {
    let result = GateBuilder::new(GateConfig {
        defer_history: true,
        ..GateConfig::default()
    })
    .build();
    assert!(matches!(result, Err(SchedulerError::InvalidConfig(_))));
}
