//! Concurrent table progress printer
//!
//! Producers on any thread send events through a bounded channel to a single
//! worker thread. The worker owns the registry and the output sink, applies
//! events in arrival order and repaints only when its clock ticks. Closing
//! (or aborting) is a rendezvous: the worker hands the registry and the sink
//! back to the caller, so nothing can be written by the worker afterwards.

use crate::error::{Result, SyncDiffError};
use crate::output::{self, Summary, SummaryReport};
use crate::registry::Registry;
use crate::render::{self, Renderer};
use crossbeam_channel::{bounded, select, tick, Receiver, Sender};
use std::fmt::{self, Display};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Interval between two render passes
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(200);

/// Pending events before producers block
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Where the printer writes its output
pub type Sink = Box<dyn Write + Send>;

/// Settings for a [`TableProgressPrinter`]
#[derive(Debug, Clone)]
pub struct PrinterOptions {
    pub expected_tables: u64,
    pub tick_interval: Duration,
    pub channel_capacity: usize,
    /// Log file mentioned in the error message
    pub log_path: Option<PathBuf>,
}

impl PrinterOptions {
    pub fn new(expected_tables: u64) -> Self {
        Self {
            expected_tables,
            tick_interval: DEFAULT_TICK_INTERVAL,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            log_path: None,
        }
    }

    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }
}

/// Table event applied by the worker
#[derive(Debug)]
enum Operation {
    Start {
        name: String,
        total: u64,
        structure_failure: bool,
        stop_auto_close: bool,
    },
    Increment {
        name: String,
    },
    UpdateTotal {
        name: String,
        total: u64,
        stop_auto_close: bool,
    },
    Fail {
        name: String,
    },
}

#[derive(Debug)]
enum Message {
    Update(Operation),
    /// Final repaint, then stop
    Close,
    /// Stop without repainting
    Abort,
}

/// Worker state handed back through the shutdown handshake
struct Finished {
    registry: Registry,
    sink: Sink,
}

/// Cloneable producer side of the printer.
///
/// Events for names that are not active are silently dropped by the worker.
/// Once the printer is closed every call fails with
/// [`SyncDiffError::ReporterClosed`].
#[derive(Debug, Clone)]
pub struct ProgressHandle {
    events: Sender<Message>,
}

impl ProgressHandle {
    /// Register a table with `total` units of work
    pub fn start(
        &self,
        name: &str,
        total: u64,
        structure_failure: bool,
        stop_auto_close: bool,
    ) -> Result<()> {
        self.send(Operation::Start {
            name: name.to_string(),
            total,
            structure_failure,
            stop_auto_close,
        })
    }

    pub fn increment(&self, name: &str) -> Result<()> {
        self.send(Operation::Increment {
            name: name.to_string(),
        })
    }

    pub fn update_total(&self, name: &str, total: u64, stop_auto_close: bool) -> Result<()> {
        self.send(Operation::UpdateTotal {
            name: name.to_string(),
            total,
            stop_auto_close,
        })
    }

    pub fn fail(&self, name: &str) -> Result<()> {
        self.send(Operation::Fail {
            name: name.to_string(),
        })
    }

    fn send(&self, operation: Operation) -> Result<()> {
        self.deliver(Message::Update(operation))
    }

    fn deliver(&self, message: Message) -> Result<()> {
        self.events
            .send(message)
            .map_err(|_| SyncDiffError::ReporterClosed)
    }
}

/// Terminal progress printer for a batch of table comparisons
pub struct TableProgressPrinter {
    handle: ProgressHandle,
    done: Receiver<Finished>,
    worker: Option<JoinHandle<()>>,
    finished: Option<Finished>,
    options: PrinterOptions,
    started: Instant,
    elapsed: Duration,
}

impl fmt::Debug for TableProgressPrinter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableProgressPrinter")
            .field("options", &self.options)
            .field("running", &self.worker.is_some())
            .field("closed", &self.finished.is_some())
            .finish()
    }
}

impl TableProgressPrinter {
    /// Create a printer writing to stdout
    pub fn new(expected_tables: u64) -> Result<Self> {
        Self::with_options(PrinterOptions::new(expected_tables), io::stdout())
    }

    /// Create a printer writing to `sink`
    pub fn with_options<W>(options: PrinterOptions, sink: W) -> Result<Self>
    where
        W: Write + Send + 'static,
    {
        let mut sink: Sink = Box::new(sink);
        sink.write_all(render::header(options.expected_tables).as_bytes())?;
        sink.flush()?;

        let (events_tx, events_rx) = bounded(options.channel_capacity.max(1));
        let (done_tx, done_rx) = bounded(0);

        let worker = Worker {
            registry: Registry::new(options.expected_tables),
            renderer: Renderer::new(),
            sink,
        };
        let tick_interval = options.tick_interval;
        let worker = thread::Builder::new()
            .name("syncdiff-progress".to_string())
            .spawn(move || worker.run(events_rx, done_tx, tick_interval))?;

        log::debug!(
            "Started progress worker for {} tables",
            options.expected_tables
        );

        Ok(Self {
            handle: ProgressHandle { events: events_tx },
            done: done_rx,
            worker: Some(worker),
            finished: None,
            options,
            started: Instant::now(),
            elapsed: Duration::ZERO,
        })
    }

    /// Producer handle that can be moved to other threads
    pub fn handle(&self) -> ProgressHandle {
        self.handle.clone()
    }

    pub fn start(
        &self,
        name: &str,
        total: u64,
        structure_failure: bool,
        stop_auto_close: bool,
    ) -> Result<()> {
        self.handle.start(name, total, structure_failure, stop_auto_close)
    }

    pub fn increment(&self, name: &str) -> Result<()> {
        self.handle.increment(name)
    }

    pub fn update_total(&self, name: &str, total: u64, stop_auto_close: bool) -> Result<()> {
        self.handle.update_total(name, total, stop_auto_close)
    }

    pub fn fail(&self, name: &str) -> Result<()> {
        self.handle.fail(name)
    }

    /// Render one last time and stop the worker.
    ///
    /// Blocks until the worker has finished writing.
    pub fn close(&mut self) -> Result<()> {
        self.shutdown(Message::Close)
    }

    /// Stop the worker without a final repaint, then print `err`
    pub fn report_error(&mut self, err: &dyn Display) -> Result<()> {
        self.shutdown(Message::Abort)?;
        let text = output::error_message(err, self.options.log_path.as_deref());
        self.write_after_close(&text)
    }

    /// Print the closing summary. Only valid after [`close`](Self::close).
    pub fn print_summary(&mut self, output_dir: impl AsRef<Path>) -> Result<()> {
        let text = self.summary()?.render(output_dir.as_ref());
        self.write_after_close(&text)
    }

    /// Summary data of a closed printer
    pub fn summary(&self) -> Result<Summary<'_>> {
        let finished = self
            .finished
            .as_ref()
            .ok_or(SyncDiffError::ReporterNotClosed)?;
        Ok(Summary {
            expected_tables: self.options.expected_tables,
            failed: finished.registry.failed(),
            processed_units: finished.registry.processed_units(),
            elapsed: self.elapsed,
        })
    }

    pub fn report(&self) -> Result<SummaryReport> {
        Ok(SummaryReport::from_summary(&self.summary()?))
    }

    /// Final registry state, available once the worker has stopped
    pub fn registry(&self) -> Option<&Registry> {
        self.finished.as_ref().map(|finished| &finished.registry)
    }

    pub fn is_closed(&self) -> bool {
        self.finished.is_some()
    }

    fn shutdown(&mut self, message: Message) -> Result<()> {
        if self.finished.is_some() {
            return Err(SyncDiffError::ReporterClosed);
        }

        self.handle.deliver(message)?;
        let finished = self
            .done
            .recv()
            .map_err(|_| SyncDiffError::WorkerPanicked)?;
        if let Some(worker) = self.worker.take() {
            worker.join().map_err(|_| SyncDiffError::WorkerPanicked)?;
        }

        self.elapsed = self.started.elapsed();
        self.finished = Some(finished);
        log::debug!("Progress worker stopped after {:?}", self.elapsed);
        Ok(())
    }

    fn write_after_close(&mut self, text: &str) -> Result<()> {
        let finished = self
            .finished
            .as_mut()
            .ok_or(SyncDiffError::ReporterNotClosed)?;
        finished.sink.write_all(text.as_bytes())?;
        finished.sink.flush()?;
        Ok(())
    }
}

impl Drop for TableProgressPrinter {
    fn drop(&mut self) {
        // Stop the worker quietly if the caller never closed the printer
        if self.worker.is_some() && self.finished.is_none() {
            let _ = self.shutdown(Message::Abort);
        }
    }
}

/// Sole owner of the registry and the sink while the printer runs
struct Worker {
    registry: Registry,
    renderer: Renderer,
    sink: Sink,
}

impl Worker {
    fn run(mut self, events: Receiver<Message>, done: Sender<Finished>, tick_interval: Duration) {
        let ticker = tick(tick_interval);

        loop {
            select! {
                recv(ticker) -> _ => self.repaint(),
                recv(events) -> message => match message {
                    Ok(Message::Update(operation)) => self.apply(operation),
                    Ok(Message::Close) => {
                        self.repaint();
                        break;
                    }
                    Ok(Message::Abort) => break,
                    Err(_) => {
                        log::debug!("All progress producers are gone; stopping worker");
                        return;
                    }
                },
            }
        }

        // Late producers must fail instead of queueing behind a dead worker
        drop(events);
        let _ = done.send(Finished {
            registry: self.registry,
            sink: self.sink,
        });
    }

    fn apply(&mut self, operation: Operation) {
        match operation {
            Operation::Start {
                name,
                total,
                structure_failure,
                stop_auto_close,
            } => self
                .registry
                .start(&name, total, structure_failure, stop_auto_close),
            Operation::Increment { name } => self.registry.increment(&name),
            Operation::UpdateTotal {
                name,
                total,
                stop_auto_close,
            } => self.registry.update_total(&name, total, stop_auto_close),
            Operation::Fail { name } => self.registry.fail(&name),
        }
    }

    fn repaint(&mut self) {
        if let Err(e) = self.renderer.render(&mut self.registry, &mut self.sink) {
            log::warn!("Failed to write progress output: {}", e);
        }
    }
}
