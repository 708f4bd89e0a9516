pub mod cancel;
pub mod config;
pub mod controller;
pub mod error;
pub mod executor;
pub mod formatter;
pub mod generate;
pub mod job;
pub mod pool;
pub mod signal;
pub mod source;
pub mod summary;
mod worker;

pub use controller::run_batch;
