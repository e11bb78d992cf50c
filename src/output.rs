//! Output formatting utilities

use crate::error::Result;
use crate::registry::{FailedTable, FailureKind};
use indicatif::{HumanCount, HumanDuration};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the JSON report written next to the other run artifacts
pub const SUMMARY_FILE: &str = "summary.json";

/// Directory under the output dir that receives fix patches
pub const PATCH_DIR: &str = "patch";

/// Clears the progress bar line before a closing message
const CLEAR_BAR: &str = "\x1b[1A\x1b[J";

/// Data behind the closing summary block
#[derive(Debug, Clone)]
pub struct Summary<'a> {
    pub expected_tables: u64,
    pub failed: &'a [FailedTable],
    pub processed_units: u64,
    pub elapsed: Duration,
}

impl Summary<'_> {
    /// Render the summary block shown after the printer is closed
    pub fn render(&self, output_dir: &Path) -> String {
        let location = output_dir.display();
        let mut text = format!("{}\nSummary:\n\n", CLEAR_BAR);

        if self.failed.is_empty() {
            text.push_str(&format!(
                "A total of {} tables have been compared and all are equal.\n\
                 You can view the comparison summary and details through '{}'\n",
                self.expected_tables, location
            ));
        } else {
            text.push_str(&failure_table(self.failed));
            text.push('\n');
            if (self.failed.len() as u64) < self.expected_tables {
                text.push_str("The rest of the tables are all equal.\n");
            }
            text.push_str(&format!(
                "The patch file has been generated to '{}'\n\
                 You can view the comparison summary and details through '{}'\n",
                output_dir.join(PATCH_DIR).display(),
                location
            ));
        }

        text.push_str(&format!(
            "\nTime Cost: {}\nAverage speed: {} ({} chunks in total)\n",
            HumanDuration(self.elapsed),
            format_speed(self.processed_units, self.elapsed),
            HumanCount(self.processed_units)
        ));
        text
    }
}

/// Message printed after the worker acknowledged an abort
pub fn error_message(err: &dyn Display, log_path: Option<&Path>) -> String {
    let mut text = format!("{}\nError in comparison process:\n{}\n", CLEAR_BAR, err);
    if let Some(path) = log_path {
        text.push_str(&format!(
            "\nYou can view the comparison details through '{}'\n",
            path.display()
        ));
    }
    text
}

/// Append a timestamped error record to the run log, creating it if needed
pub fn write_error_log(path: &Path, err: &dyn Display) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(
        file,
        "[{}] [ERROR] Error in comparison process: {}",
        chrono::Utc::now().to_rfc3339(),
        err
    )?;
    Ok(())
}

/// ASCII table of failed tables
fn failure_table(failed: &[FailedTable]) -> String {
    const HEADERS: [&str; 3] = ["Table", "Structure equality", "Data equality"];

    let rows: Vec<[&str; 3]> = failed
        .iter()
        .map(|table| match table.kind {
            FailureKind::Structure => [table.name.as_str(), "false", "-"],
            FailureKind::Data => [table.name.as_str(), "true", "false"],
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let border = widths
        .iter()
        .map(|w| "-".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("+");
    let border = format!("+{}+\n", border);

    let mut table = border.clone();
    table.push_str(&table_row(&HEADERS, &widths));
    table.push_str(&border);
    for row in &rows {
        table.push_str(&table_row(row, &widths));
    }
    table.push_str(&border);
    table
}

fn table_row(cells: &[&str; 3], widths: &[usize; 3]) -> String {
    let cells = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!(" {:<width$} ", cell, width = *width))
        .collect::<Vec<_>>()
        .join("|");
    format!("|{}|\n", cells)
}

/// Format a processing rate in chunks per second
fn format_speed(units: u64, elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs <= f64::EPSILON {
        return format!("{} chunks/s", units);
    }
    format!("{:.1} chunks/s", units as f64 / secs)
}

/// Machine-readable record of a finished run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryReport {
    pub created: chrono::DateTime<chrono::Utc>,
    pub tables_compared: u64,
    pub all_equal: bool,
    pub failed: Vec<FailedEntry>,
    pub processed_chunks: u64,
    pub elapsed_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailedEntry {
    pub table: String,
    pub kind: FailureKind,
}

impl SummaryReport {
    pub fn from_summary(summary: &Summary<'_>) -> Self {
        Self {
            created: chrono::Utc::now(),
            tables_compared: summary.expected_tables,
            all_equal: summary.failed.is_empty(),
            failed: summary
                .failed
                .iter()
                .map(|table| FailedEntry {
                    table: table.name.clone(),
                    kind: table.kind,
                })
                .collect(),
            processed_chunks: summary.processed_units,
            elapsed_secs: summary.elapsed.as_secs_f64(),
        }
    }

    /// Write the report as pretty JSON into `dir`, creating it if needed
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(SUMMARY_FILE);
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        log::info!("Wrote comparison summary to {}", path.display());
        Ok(path)
    }
}
