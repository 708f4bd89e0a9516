//! Delivers a real SIGINT to the process while a batch is running. Lives in
//! its own test binary so the process-wide handler cannot affect other tests.

use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use assert_matches::assert_matches;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tempfile::TempDir;

use poolflow::core::config::{BatchConfig, ExecutorConfig, SourceConfig};
use poolflow::core::error::BatchError;
use poolflow::core::executor::CopyExecutor;
use poolflow::core::run_batch;
use poolflow::core::signal::SigintGuard;

#[test]
fn sigint_cancels_running_batch() {
    let root = TempDir::new().unwrap();
    let input_dir = root.path().join("input_files");
    fs::create_dir_all(&input_dir).unwrap();
    for i in 1..=400 {
        fs::write(input_dir.join(format!("input_file_{i}.txt")), "7").unwrap();
    }
    let config = BatchConfig {
        source: SourceConfig {
            input_dir,
            output_dir: root.path().join("output_files"),
            ..SourceConfig::default()
        },
        executor: ExecutorConfig {
            delay: Duration::from_millis(100),
            rejected: Vec::new(),
        },
        workers: 4,
        poll_interval: Duration::from_millis(100),
    };

    let guard = SigintGuard::install().unwrap();
    let signaller = thread::spawn(|| {
        thread::sleep(Duration::from_millis(300));
        kill(Pid::this(), Signal::SIGINT).unwrap();
    });

    let executor = Arc::new(CopyExecutor::new(config.executor.clone()));
    let result = run_batch(&config, executor, &guard, &mut Vec::new());
    signaller.join().unwrap();
    drop(guard);

    assert_matches!(result, Err(BatchError::Aborted { completed, .. }) if completed < 400);
}
