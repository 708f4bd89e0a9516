//! End-to-end batch runs through `run_batch` against temp directories.

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use assert_matches::assert_matches;
use tempfile::TempDir;

use poolflow::core::config::{BatchConfig, ExecutorConfig, SourceConfig};
use poolflow::core::error::BatchError;
use poolflow::core::executor::{CopyExecutor, Executor};
use poolflow::core::run_batch;
use poolflow::core::summary::BatchStatus;

fn setup(files: usize) -> (TempDir, BatchConfig) {
    let root = TempDir::new().expect("temp dir");
    let input_dir = root.path().join("input_files");
    fs::create_dir_all(&input_dir).unwrap();
    for i in 1..=files {
        fs::write(input_dir.join(format!("input_file_{i}.txt")), i.to_string()).unwrap();
    }

    let config = BatchConfig {
        source: SourceConfig {
            input_dir,
            output_dir: root.path().join("output_files"),
            ..SourceConfig::default()
        },
        executor: ExecutorConfig {
            delay: Duration::from_millis(10),
            ..ExecutorConfig::default()
        },
        workers: 4,
        poll_interval: Duration::from_millis(50),
    };
    (root, config)
}

fn executor(config: &BatchConfig) -> Arc<dyn Executor> {
    Arc::new(CopyExecutor::new(config.executor.clone()))
}

fn never() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

fn output_lines(out: Vec<u8>) -> Vec<String> {
    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Five inputs, two of which the executor rejects by name.
#[test]
fn partial_failure_still_finishes() {
    let (_root, config) = setup(5);
    let mut out = Vec::new();

    let report = run_batch(&config, executor(&config), &never(), &mut out).unwrap();

    assert_eq!(report.status, BatchStatus::Finished);
    assert_eq!(report.outcomes.len(), 5);
    assert_eq!(report.succeeded(), 3);
    assert_eq!(report.failed(), 2);
    for failure in report.failures() {
        assert!(!failure.error_message.as_deref().unwrap_or_default().is_empty());
    }

    let lines = output_lines(out);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines.last().map(String::as_str), Some("Finished processing!"));
    for line in &lines[..2] {
        assert!(line.ends_with("failed to be processed with error: I don't like the look of this file..."));
    }

    let produced = fs::read_dir(&config.source.output_dir).unwrap().count();
    assert_eq!(produced, 3);
    assert_eq!(
        fs::read_to_string(config.source.output_dir.join("output_file_4.txt")).unwrap(),
        "4"
    );
}

#[test]
fn second_run_dispatches_nothing() {
    let (_root, config) = setup(12);
    let mut out = Vec::new();
    let first = run_batch(&config, executor(&config), &never(), &mut out).unwrap();
    assert_eq!(first.outcomes.len(), 12);

    let snapshot: Vec<_> = {
        let mut names: Vec<_> = fs::read_dir(&config.source.output_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        names.sort();
        names
    };

    let second = run_batch(&config, executor(&config), &never(), &mut Vec::new()).unwrap();
    // Rejected inputs never produce output, so they are retried each run.
    assert_eq!(second.outcomes.len(), 2);
    assert_eq!(second.succeeded(), 0);

    let mut after: Vec<_> = fs::read_dir(&config.source.output_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    after.sort();
    assert_eq!(snapshot, after);
}

#[test]
fn fully_processed_directory_dispatches_zero_jobs() {
    let (_root, mut config) = setup(6);
    config.executor.rejected.clear();

    let first = run_batch(&config, executor(&config), &never(), &mut Vec::new()).unwrap();
    assert_eq!(first.succeeded(), 6);

    let second = run_batch(&config, executor(&config), &never(), &mut Vec::new()).unwrap();
    assert!(second.outcomes.is_empty());
    assert!(second.abandoned.is_empty());
}

#[test]
fn missing_input_dir_fails_before_dispatch() {
    let (root, mut config) = setup(0);
    config.source.input_dir = root.path().join("nope");

    let err = run_batch(&config, executor(&config), &never(), &mut Vec::new()).unwrap_err();

    assert_matches!(err, BatchError::Filesystem { .. });
    assert!(!config.source.output_dir.exists());
}

#[test]
fn parallel_workers_beat_sequential_time() {
    let (_root, mut config) = setup(16);
    config.executor.rejected.clear();
    config.executor.delay = Duration::from_millis(100);
    config.workers = 8;

    let started = Instant::now();
    let report = run_batch(&config, executor(&config), &never(), &mut Vec::new()).unwrap();

    assert_eq!(report.succeeded(), 16);
    // Two rounds of 100ms versus 1.6s sequentially.
    assert!(started.elapsed() < Duration::from_millis(1000));
}

/// An interrupt while jobs are in flight aborts within one poll interval
/// plus worker teardown, and leaves no partial output files behind.
#[test]
fn interrupt_aborts_batch_without_partial_outputs() {
    let (_root, mut config) = setup(1000);
    config.executor.delay = Duration::from_millis(100);
    config.workers = 8;
    config.poll_interval = Duration::from_millis(200);

    let interrupt = never();
    let trigger = Arc::clone(&interrupt);
    let signaller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(500));
        trigger.store(true, Ordering::SeqCst);
        Instant::now()
    });

    let mut out = Vec::new();
    let err = run_batch(&config, executor(&config), &interrupt, &mut out).unwrap_err();
    let finished = Instant::now();
    let signalled = signaller.join().unwrap();

    assert_matches!(err, BatchError::Aborted { completed, .. } if completed < 1000);
    assert_eq!(err.exit_code(), 130);
    assert!(finished.duration_since(signalled) < Duration::from_millis(1500));

    let lines = output_lines(out);
    assert_eq!(lines.first().map(String::as_str), Some("Terminating pool!"));
    assert!(!lines.iter().any(|l| l == "Finished processing!"));

    for entry in fs::read_dir(&config.source.output_dir).unwrap() {
        let path = entry.unwrap().path();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("output_file_"), "stray file {name}");
        let number = name
            .trim_start_matches("output_file_")
            .trim_end_matches(".txt");
        assert_eq!(fs::read_to_string(&path).unwrap(), number);
    }
}
