//! Common test utilities and helpers

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use syncdiff::{PrinterOptions, Result, TableProgressPrinter};
use tempfile::TempDir;

/// In-memory sink shared between the printer and the test
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Printer whose render clock never fires while a test runs, so the only
/// repaint is the one forced by `close()`
pub fn quiet_printer(expected_tables: u64) -> (TableProgressPrinter, SharedBuffer) {
    let options = PrinterOptions::new(expected_tables).tick_interval(Duration::from_secs(3600));
    printer_with(options)
}

/// Printer repainting every few milliseconds
pub fn fast_printer(expected_tables: u64) -> (TableProgressPrinter, SharedBuffer) {
    let options = PrinterOptions::new(expected_tables).tick_interval(Duration::from_millis(5));
    printer_with(options)
}

pub fn printer_with(options: PrinterOptions) -> (TableProgressPrinter, SharedBuffer) {
    let buffer = SharedBuffer::new();
    let printer = TableProgressPrinter::with_options(options, buffer.clone())
        .expect("printer should start");
    (printer, buffer)
}

/// Temporary directory holding config files and run output
pub struct TestFixture {
    pub temp_dir: TempDir,
}

impl TestFixture {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
        })
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root().join("output_dir")
    }

    /// Write a task config whose output dir lives inside the fixture
    pub fn write_config(&self, tables: &str) -> Result<PathBuf> {
        let path = self.root().join("task.toml");
        let content = format!(
            "[task]\noutput-dir = {:?}\nthreads = 3\nchunk-delay-ms = 0\ncheck-interval-ms = 5\n\n{}",
            self.output_dir().display().to_string(),
            tables
        );
        std::fs::write(&path, content)?;
        Ok(path)
    }
}

/// Table snippets for task configs
pub mod sample_tables {
    pub fn all_equal() -> &'static str {
        r#"
[[table]]
name = "schema1.table1"
chunks = 20

[[table]]
name = "schema2.table2"
chunks = 7

[[table]]
name = "schema3.table3"
chunks = 1
"#
    }

    pub fn with_failures() -> &'static str {
        r#"
[[table]]
name = "schema1.table1"
chunks = 20

[[table]]
name = "schema2.table2"
chunks = 10
structure-failure = true

[[table]]
name = "schema3.table3"
chunks = 50
fail-at-chunk = 40
"#
    }
}
