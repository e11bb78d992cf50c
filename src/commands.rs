//! Command implementations for syncdiff CLI

use crate::cli::{Commands, GenerateCommands};
use crate::config::{TableConfig, TaskConfig, CONFIG_TEMPLATE};
use crate::error::{Result, SyncDiffError};
use crate::output::{self, SummaryReport, PATCH_DIR};
use crate::progress::{PrinterOptions, ProgressHandle, TableProgressPrinter};
use rayon::prelude::*;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

/// Execute a command
pub fn execute_command(command: Commands) -> Result<()> {
    match command {
        Commands::Run { config } => run_command(&config),
        Commands::GenerateConfig { command } => match command {
            GenerateCommands::Template { output } => template_command(&output),
        },
    }
}

fn run_command(config_path: &Path) -> Result<()> {
    let config = TaskConfig::load(config_path)?;
    run_task(&config, io::stdout())?;
    Ok(())
}

/// Run every table of `config` concurrently, reporting progress to `sink`.
///
/// The output directory and its `patch` directory are created up front. On
/// success the summary is printed and `summary.json` is written to the
/// output directory; on failure the error is appended to the run log.
pub fn run_task<W>(config: &TaskConfig, sink: W) -> Result<SummaryReport>
where
    W: Write + Send + 'static,
{
    std::fs::create_dir_all(config.task.output_dir.join(PATCH_DIR))?;

    let options = PrinterOptions::new(config.tables.len() as u64)
        .tick_interval(config.check_interval())
        .log_path(config.log_path());
    let mut printer = TableProgressPrinter::with_options(options, sink)?;

    log::info!(
        "Comparing {} tables with {} threads",
        config.tables.len(),
        config.task.threads
    );

    if let Err(e) = compare_tables(config, printer.handle()) {
        output::write_error_log(&config.log_path(), &e)?;
        printer.report_error(&e)?;
        return Err(e);
    }

    printer.close()?;
    printer.print_summary(&config.task.output_dir)?;

    let report = printer.report()?;
    report.write_to(&config.task.output_dir)?;
    Ok(report)
}

fn compare_tables(config: &TaskConfig, handle: ProgressHandle) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.task.threads)
        .thread_name(|i| format!("syncdiff-compare-{}", i))
        .build()
        .map_err(|e| SyncDiffError::Generic(e.into()))?;

    let delay = config.chunk_delay();
    pool.install(|| {
        config
            .tables
            .par_iter()
            .try_for_each(|table| compare_table(&handle, table, delay))
    })
}

/// Drive one table through the structure and data checks.
///
/// The chunk count is only known once half of the chunks have been split,
/// so the table starts with an estimate and its total is revised later.
fn compare_table(handle: &ProgressHandle, table: &TableConfig, delay: Duration) -> Result<()> {
    if table.structure_failure {
        log::debug!("Structure of {} differs", table.name);
        return handle.start(&table.name, table.chunks, true, true);
    }

    let split = table.chunks / 2;
    handle.start(&table.name, split, false, false)?;

    for chunk in 0..table.chunks {
        if chunk == split {
            handle.update_total(&table.name, table.chunks, true)?;
        }
        if table.fail_at_chunk == Some(chunk) {
            log::debug!("Data of {} differs at chunk {}", table.name, chunk);
            return handle.fail(&table.name);
        }
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        handle.increment(&table.name)?;
    }
    Ok(())
}

fn template_command(output: &Path) -> Result<()> {
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(output, CONFIG_TEMPLATE)?;
    println!(
        "output a config file template for syncdiff to: {}",
        output.display()
    );
    Ok(())
}
