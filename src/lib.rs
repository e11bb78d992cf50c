//! # syncdiff
//!
//! A concurrent terminal progress reporter for batch table comparisons.
//! Many threads report per-table progress while a single worker owns all
//! display state and repaints the terminal on a fixed clock.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod progress;
pub mod registry;
pub mod render;

pub use error::{Result, SyncDiffError};
pub use progress::{PrinterOptions, ProgressHandle, TableProgressPrinter};
pub use registry::{FailedTable, FailureKind, TableState};
