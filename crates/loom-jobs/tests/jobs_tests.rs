//! Integration tests for loom-jobs.

use std::sync::mpsc;
use std::sync::{Arc, Barrier};

use loom_jobs::{InlineScheduler, Job, JobScheduler, Scheduler, SchedulerConfig};
use loom_types::LoomError;

struct Square {
    input: u64,
    output: Option<u64>,
    thread: Option<String>,
}

impl Square {
    fn new(input: u64) -> Self {
        Self {
            input,
            output: None,
            thread: None,
        }
    }
}

impl Job for Square {
    fn run(&mut self) {
        self.output = Some(self.input * self.input);
        self.thread = std::thread::current().name().map(str::to_owned);
    }
}

fn pool<J: Job>(threads: usize) -> JobScheduler<J> {
    JobScheduler::new(SchedulerConfig::with_threads(threads)).unwrap()
}

// ─── Config Tests ─────────────────────────────────────────────

#[test]
fn config_defaults_and_toml() {
    assert_eq!(SchedulerConfig::default().worker_threads, 4);
    let config: SchedulerConfig = toml::from_str("worker_threads = 2").unwrap();
    assert_eq!(config.worker_threads, 2);
    let config: SchedulerConfig = toml::from_str("").unwrap();
    assert_eq!(config, SchedulerConfig::default());
}

#[test]
fn zero_threads_rejected() {
    let err = JobScheduler::<Square>::new(SchedulerConfig::with_threads(0)).err().unwrap();
    assert!(matches!(err, LoomError::InvalidConfig(_)));
}

// ─── Pool Tests ───────────────────────────────────────────────

#[test]
fn results_in_submission_order() {
    let mut scheduler = pool(3);
    assert_eq!(scheduler.worker_threads(), 3);
    scheduler.start((0..32).map(Square::new).collect()).unwrap();
    let done = scheduler.wait();
    assert_eq!(done.len(), 32);
    for (i, job) in done.iter().enumerate() {
        assert_eq!(job.input, i as u64);
        assert_eq!(job.output, Some((i * i) as u64));
    }
}

#[test]
fn jobs_run_on_named_workers() {
    let mut scheduler = pool(2);
    scheduler.start((0..4).map(Square::new).collect()).unwrap();
    for job in scheduler.wait() {
        let name = job.thread.unwrap();
        assert!(name.starts_with("loom-worker-"), "unexpected thread {name}");
    }
}

#[test]
fn wait_without_start_is_noop() {
    let mut scheduler = pool::<Square>(2);
    assert!(!scheduler.is_running());
    assert!(scheduler.wait().is_empty());
    assert!(scheduler.wait().is_empty());
}

#[test]
fn empty_batch() {
    let mut scheduler = pool::<Square>(2);
    scheduler.start(Vec::new()).unwrap();
    assert!(scheduler.is_running());
    assert!(scheduler.wait().is_empty());
    assert!(!scheduler.is_running());
}

#[test]
fn overlapping_start_rejected() {
    let mut scheduler = pool(2);
    scheduler.start(vec![Square::new(1)]).unwrap();
    let rejected = scheduler.start(vec![Square::new(2)]).unwrap_err();
    assert!(matches!(rejected.error, LoomError::BatchInFlight { outstanding: 0 | 1 }));
    assert_eq!(rejected.jobs.len(), 1);
    assert_eq!(rejected.jobs[0].input, 2);
    assert_eq!(rejected.jobs[0].output, None);

    // The first batch is unaffected.
    let done = scheduler.wait();
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].output, Some(1));
    scheduler.start(vec![Square::new(3)]).unwrap();
    assert_eq!(scheduler.wait()[0].output, Some(9));
}

#[test]
fn start_does_not_block() {
    let mut scheduler = pool(1);
    let (tx, rx) = mpsc::channel::<u64>();
    let mut received = None;
    let job: Box<dyn FnMut() + Send> = Box::new(move || {
        received = rx.recv().ok();
        assert_eq!(received, Some(42));
    });

    // The job blocks until we send; start must already have returned.
    scheduler.start(vec![job]).unwrap();
    assert!(scheduler.is_running());
    tx.send(42).unwrap();
    assert_eq!(scheduler.wait().len(), 1);
}

#[test]
fn jobs_run_in_parallel() {
    let threads = 4;
    let mut scheduler = pool(threads);
    let barrier = Arc::new(Barrier::new(threads));
    let jobs: Vec<Box<dyn FnMut() + Send>> = (0..threads)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            Box::new(move || {
                barrier.wait();
            }) as Box<dyn FnMut() + Send>
        })
        .collect();

    // Completes only if all four jobs are running at the same time.
    scheduler.start(jobs).unwrap();
    assert_eq!(scheduler.wait().len(), threads);
}

#[test]
fn many_batches() {
    let mut scheduler = pool(4);
    for round in 0..50u64 {
        scheduler.start((0..8).map(|i| Square::new(round + i)).collect()).unwrap();
        let done = scheduler.wait();
        assert_eq!(done[7].output, Some((round + 7) * (round + 7)));
    }
    assert_eq!(scheduler.batches(), 50);
}

#[test]
fn drop_waits_for_batch() {
    let (tx, rx) = mpsc::channel::<()>();
    {
        let mut scheduler = pool(1);
        let job: Box<dyn FnMut() + Send> = Box::new(move || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            tx.send(()).unwrap();
        });
        scheduler.start(vec![job]).unwrap();
    }
    assert!(rx.try_recv().is_ok());
}

#[test]
fn rejected_batch_converts_to_error() {
    let mut scheduler = pool(1);
    scheduler.start(vec![Square::new(1)]).unwrap();
    let rejected = scheduler.start((2..5).map(Square::new).collect()).unwrap_err();
    assert!(rejected.to_string().contains("3 jobs returned"));
    let inputs: Vec<u64> = rejected.jobs.iter().map(|j| j.input).collect();
    assert_eq!(inputs, vec![2, 3, 4]);
    let err: LoomError = rejected.into();
    assert!(matches!(err, LoomError::BatchInFlight { .. }));
    scheduler.wait();
}

// ─── Inline Tests ─────────────────────────────────────────────

#[test]
fn inline_scheduler_contract() {
    let mut scheduler = InlineScheduler::new();
    assert!(scheduler.wait().is_empty());
    scheduler.start((0..3).map(Square::new).collect()).unwrap();
    assert!(scheduler.is_running());
    let rejected = scheduler.start(vec![Square::new(9)]).unwrap_err();
    assert_eq!(rejected.jobs[0].output, None);
    let done = scheduler.wait();
    assert_eq!(done.iter().map(|j| j.output.unwrap()).collect::<Vec<_>>(), vec![0, 1, 4]);
    assert!(!scheduler.is_running());
}
