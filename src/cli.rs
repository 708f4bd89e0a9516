use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::core::config::{
    default_workers, BatchConfig, ExecutorConfig, NamingRule, SourceConfig, DEFAULT_INPUT_DIR,
    DEFAULT_OUTPUT_DIR, DEFAULT_REJECTED,
};
use crate::core::error::BatchError;
use crate::core::executor::CopyExecutor;
use crate::core::generate::{generate_inputs, DEFAULT_GENERATE_COUNT};
use crate::core::run_batch;
use crate::core::signal::SigintGuard;

#[derive(Debug, Parser)]
#[command(name = "poolflow", version, about = "Parallel file batch processor")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Process every pending input file; Ctrl-C aborts the batch
    Run(RunArgs),
    /// Create sample input files
    Generate(GenerateArgs),
}

#[derive(Debug, Parser)]
pub struct RunArgs {
    #[arg(short = 'i', long = "input-dir", default_value = DEFAULT_INPUT_DIR)]
    pub input_dir: PathBuf,
    #[arg(short = 'o', long = "output-dir", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,
    /// Defaults to the number of available CPUs
    #[arg(short = 'w', long = "workers")]
    pub workers: Option<usize>,
    /// Upper bound on how long an interrupt can go unnoticed
    #[arg(long = "poll-interval-ms", default_value_t = 5000)]
    pub poll_interval_ms: u64,
    /// Simulated processing time per job
    #[arg(long = "delay-ms", default_value_t = 100)]
    pub delay_ms: u64,
    #[arg(long = "extension", default_value = "txt")]
    pub extension: String,
    /// Input file names the executor refuses to process
    #[arg(long = "reject", default_values_t = DEFAULT_REJECTED.map(String::from))]
    pub rejected: Vec<String>,
}

#[derive(Debug, Parser)]
pub struct GenerateArgs {
    #[arg(short = 'i', long = "input-dir", default_value = DEFAULT_INPUT_DIR)]
    pub input_dir: PathBuf,
    #[arg(short = 'n', long = "count", default_value_t = DEFAULT_GENERATE_COUNT)]
    pub count: usize,
}

pub fn run_args_to_config(args: RunArgs) -> Result<BatchConfig, BatchError> {
    let config = BatchConfig {
        source: SourceConfig {
            input_dir: args.input_dir,
            output_dir: args.output_dir,
            naming: NamingRule::for_extension(&args.extension)?,
        },
        executor: ExecutorConfig {
            delay: Duration::from_millis(args.delay_ms),
            rejected: args.rejected,
        },
        workers: args.workers.unwrap_or_else(default_workers),
        poll_interval: Duration::from_millis(args.poll_interval_ms),
    };
    config.validate()?;
    Ok(config)
}

pub fn execute(command: Commands) -> Result<(), BatchError> {
    match command {
        Commands::Run(args) => {
            let config = run_args_to_config(args)?;
            let guard = SigintGuard::install()?;
            let executor = Arc::new(CopyExecutor::new(config.executor.clone()));
            let mut stdout = io::stdout();
            run_batch(&config, executor, &guard, &mut stdout)?;
            Ok(())
        }
        Commands::Generate(args) => {
            let created = generate_inputs(&args.input_dir, args.count)?;
            println!("Generated {created} files in {}", args.input_dir.display());
            Ok(())
        }
    }
}
