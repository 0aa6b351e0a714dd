//! Scheduler tests with a scripted fetcher and paused time.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::chunker::{BatchPolicy, BatchSpan};
use crate::delay::{DelayWindow, TimeoutPolicy};
use crate::fetch::{FetchError, Fetcher};
use crate::progress::{CollectingSink, ProgressEvent, TaskOutcome};
use crate::retry::TaskError;
use crate::scheduler::{BatchScheduler, SchedulerError};
use crate::store::{DirStore, Store};
use crate::task::Task;

/// Serves `url` as the body, except for URLs listed as failing or fatal.
#[derive(Default)]
struct ScriptedFetcher {
    calls: Mutex<Vec<String>>,
    batches: Mutex<Vec<usize>>,
    always_fail: HashSet<String>,
    fatal: HashSet<String>,
}

impl ScriptedFetcher {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        if self.fatal.contains(url) {
            return Err(FetchError::Unavailable("renderer crashed".into()));
        }
        if self.always_fail.contains(url) {
            return Err(FetchError::Http(500));
        }
        Ok(url.as_bytes().to_vec())
    }

    fn begin_batch(&self, batch_index: usize) {
        self.batches.lock().unwrap().push(batch_index);
    }
}

#[derive(Default)]
struct RecordingStore {
    stored: Mutex<Vec<(PathBuf, String)>>,
}

impl Store for RecordingStore {
    fn store(&self, local_path: &Path, key_prefix: &str) {
        self.stored
            .lock()
            .unwrap()
            .push((local_path.to_path_buf(), key_prefix.to_string()));
    }
}

fn tasks(dir: &Path, n: usize) -> Vec<Task> {
    (0..n)
        .map(|i| {
            let mut t = Task::new(format!("https://example.com/{}", i), dir, format!("{}.html", i));
            t.destination_key_prefix = "pages".into();
            t
        })
        .collect()
}

fn url(i: usize) -> String {
    format!("https://example.com/{}", i)
}

struct Harness {
    fetcher: Arc<ScriptedFetcher>,
    store: Arc<RecordingStore>,
    sink: Arc<CollectingSink>,
}

impl Harness {
    fn new(fetcher: ScriptedFetcher) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            store: Arc::new(RecordingStore::default()),
            sink: Arc::new(CollectingSink::new()),
        }
    }

    fn scheduler(&self, policy: BatchPolicy, timeouts: TimeoutPolicy) -> BatchScheduler {
        BatchScheduler::new(
            self.fetcher.clone(),
            self.store.clone(),
            self.sink.clone(),
            policy,
            timeouts,
        )
        .unwrap()
    }

    fn batch_sizes(&self) -> Vec<usize> {
        self.sink
            .events()
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::BatchStarted { size, .. } => Some(*size),
                _ => None,
            })
            .collect()
    }

    fn count(&self, kind: &str) -> usize {
        self.sink.events().iter().filter(|e| e.kind() == kind).count()
    }
}

fn batch_delay(secs: u64) -> TimeoutPolicy {
    TimeoutPolicy {
        per_task: DelayWindow::ZERO,
        between_batches: Some(DelayWindow::fixed(Duration::from_secs(secs))),
    }
}

#[tokio::test(start_paused = true)]
async fn uniform_137_by_50_delays_twice() {
    let dir = tempfile::tempdir().unwrap();
    let h = Harness::new(ScriptedFetcher::default());
    let s = h.scheduler(BatchPolicy::Uniform { size: 50 }, batch_delay(3));
    let summary = s.run(&tasks(dir.path(), 137)).await.unwrap();

    assert_eq!(h.batch_sizes(), vec![50, 50, 37]);
    assert_eq!(h.count("delay_started"), 2);
    assert_eq!(h.count("delay_finished"), 2);
    assert_eq!(h.count("delay_tick"), 6);
    assert_eq!(summary.delays, 2);
    assert_eq!(summary.stored, 137);
    assert_eq!(summary.total_batches, 3);
    assert_eq!(h.fetcher.calls(), (0..137).map(url).collect::<Vec<_>>());
    assert_eq!(*h.fetcher.batches.lock().unwrap(), vec![0, 1, 2]);
    assert_eq!(h.store.stored.lock().unwrap().len(), 137);
}

#[tokio::test(start_paused = true)]
async fn randomized_137_processes_all_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let h = Harness::new(ScriptedFetcher::default());
    let s = h.scheduler(BatchPolicy::Randomized { min: 50, max: 80 }, TimeoutPolicy::none());
    let summary = s.run(&tasks(dir.path(), 137)).await.unwrap();

    let sizes = h.batch_sizes();
    assert_eq!(sizes.iter().sum::<usize>(), 137);
    let (last, rest) = sizes.split_last().unwrap();
    for n in rest {
        assert!((50..=80).contains(n));
    }
    assert!(*last >= 1 && *last <= 80);
    assert_eq!(h.fetcher.calls(), (0..137).map(url).collect::<Vec<_>>());
    assert_eq!(summary.processed(), 137);
    assert_eq!(h.count("delay_started"), 0);
}

#[tokio::test(start_paused = true)]
async fn event_order_for_two_batches() {
    let dir = tempfile::tempdir().unwrap();
    let h = Harness::new(ScriptedFetcher::default());
    let s = h.scheduler(BatchPolicy::Uniform { size: 2 }, batch_delay(1));
    s.run(&tasks(dir.path(), 3)).await.unwrap();

    let kinds: Vec<&str> = h.sink.events().iter().map(ProgressEvent::kind).collect();
    assert_eq!(
        kinds,
        vec![
            "job_started",
            "batch_started",
            "task_started",
            "task_completed",
            "task_started",
            "task_completed",
            "batch_completed",
            "delay_started",
            "delay_tick",
            "delay_finished",
            "batch_started",
            "task_started",
            "task_completed",
            "batch_completed",
            "job_finished",
        ]
    );

    let events = h.sink.events();
    match &events[10] {
        ProgressEvent::BatchStarted {
            batch,
            first_task,
            last_task,
            size,
        } => {
            assert_eq!((batch.number, batch.total), (2, 2));
            assert_eq!((*first_task, *last_task, *size), (3, 3, 1));
        }
        other => panic!("unexpected {:?}", other),
    }
    match &events[6] {
        ProgressEvent::BatchCompleted {
            tasks_done,
            next_batch_size,
            ..
        } => {
            assert_eq!(*tasks_done, 2);
            assert_eq!(*next_batch_size, Some(1));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn exhausted_task_is_reported_and_job_continues() {
    let dir = tempfile::tempdir().unwrap();
    let mut f = ScriptedFetcher::default();
    f.always_fail.insert(url(1));
    let h = Harness::new(f);
    let s = h.scheduler(BatchPolicy::Uniform { size: 10 }, TimeoutPolicy::none());
    let summary = s.run(&tasks(dir.path(), 3)).await.unwrap();

    assert_eq!(summary.stored, 2);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].url, url(1));
    assert_eq!(summary.failed[0].attempts, 10);
    assert_eq!(h.count("attempt_failed"), 10);
    assert_eq!(h.fetcher.calls().len(), 12);
    assert!(!dir.path().join("1.html").exists());
    assert_eq!(h.store.stored.lock().unwrap().len(), 2);
    assert!(h.sink.events().iter().any(|e| matches!(
        e,
        ProgressEvent::TaskCompleted {
            outcome: TaskOutcome::Failed { attempts: 10, .. },
            ..
        }
    )));
}

#[tokio::test(start_paused = true)]
async fn skip_existing_output() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("0.html"), b"already here").unwrap();
    // Empty files are fetched again.
    std::fs::write(dir.path().join("1.html"), b"").unwrap();

    let h = Harness::new(ScriptedFetcher::default());
    let s = h
        .scheduler(BatchPolicy::whole_list(), TimeoutPolicy::none())
        .skip_existing(true);
    let summary = s.run(&tasks(dir.path(), 3)).await.unwrap();

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.stored, 2);
    assert_eq!(h.fetcher.calls(), vec![url(1), url(2)]);
    assert_eq!(std::fs::read(dir.path().join("0.html")).unwrap(), b"already here");
    assert_eq!(h.store.stored.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn empty_list_finishes_immediately() {
    let h = Harness::new(ScriptedFetcher::default());
    let s = h.scheduler(BatchPolicy::Uniform { size: 5 }, batch_delay(60));
    let summary = s.run(&[]).await.unwrap();
    assert_eq!(summary.total_batches, 0);
    let kinds: Vec<&str> = h.sink.events().iter().map(ProgressEvent::kind).collect();
    assert_eq!(kinds, vec!["job_started", "job_finished"]);
    assert!(h.fetcher.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn fatal_fetch_error_stops_job() {
    let dir = tempfile::tempdir().unwrap();
    let mut f = ScriptedFetcher::default();
    f.fatal.insert(url(2));
    let h = Harness::new(f);
    let s = h.scheduler(BatchPolicy::Uniform { size: 2 }, batch_delay(1));
    let err = s.run(&tasks(dir.path(), 5)).await.unwrap_err();

    assert!(matches!(
        err,
        SchedulerError::Task(TaskError::FetcherUnavailable { .. })
    ));
    assert_eq!(h.fetcher.calls(), vec![url(0), url(1), url(2)]);
    assert!(dir.path().join("0.html").exists());
    assert!(dir.path().join("1.html").exists());
    assert_eq!(h.count("job_finished"), 0);
}

#[test]
fn invalid_policy_rejected_at_construction() {
    let h = Harness::new(ScriptedFetcher::default());
    let r = BatchScheduler::new(
        h.fetcher.clone(),
        h.store.clone(),
        h.sink.clone(),
        BatchPolicy::Randomized { min: 5, max: 2 },
        TimeoutPolicy::none(),
    );
    assert!(r.is_err());
}

#[tokio::test]
async fn archive_copies_done_when_run_returns() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("archive");
    let sink = Arc::new(CollectingSink::new());
    let s = BatchScheduler::new(
        Arc::new(ScriptedFetcher::default()),
        Arc::new(DirStore::new(&archive)),
        sink.clone(),
        BatchPolicy::Uniform { size: 2 },
        TimeoutPolicy::none(),
    )
    .unwrap();
    let summary = s.run(&tasks(&dir.path().join("out"), 5)).await.unwrap();

    assert_eq!(summary.stored, 5);
    for i in 0..5 {
        let archived = archive.join("pages").join(format!("{}.html", i));
        assert_eq!(std::fs::read(&archived).unwrap(), url(i).as_bytes());
    }
    assert_eq!(sink.events().last().map(ProgressEvent::kind), Some("job_finished"));
}

#[tokio::test]
async fn spans_that_do_not_tile_the_list_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let list = tasks(dir.path(), 4);
    let h = Harness::new(ScriptedFetcher::default());
    let s = h.scheduler(BatchPolicy::whole_list(), TimeoutPolicy::none());

    let span = |start, end| BatchSpan { start, end };
    let bad: [(Vec<BatchSpan>, usize); 4] = [
        (vec![span(0, 2), span(3, 4)], 1),
        (vec![span(0, 2), span(1, 4)], 1),
        (vec![span(0, 2), span(2, 6)], 1),
        (vec![span(0, 3)], 1),
    ];
    for (spans, at) in bad {
        match s.run_batches(&list, &spans).await {
            Err(SchedulerError::BatchPlan { batch, total: 4 }) => assert_eq!(batch, at),
            other => panic!("{:?} accepted: {:?}", spans, other.map(|s| s.processed())),
        }
    }
    assert!(h.fetcher.calls().is_empty());
    assert!(h.sink.events().is_empty());

    let summary = s
        .run_batches(&list, &[span(0, 1), span(1, 4)])
        .await
        .unwrap();
    assert_eq!(summary.stored, 4);
}
