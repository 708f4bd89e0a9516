//! Parallel file batch processing with prompt, clean cancellation.
//!
//! [`crate::core::source`] lists pending input/output pairs, a fixed-size
//! [`crate::core::pool::Pool`] runs them through an
//! [`crate::core::executor::Executor`], and [`crate::core::run_batch`]
//! drives the pool from a poll loop that reacts to SIGINT between bounded
//! waits.

pub mod cli;
pub mod core;
