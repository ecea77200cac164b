//! Run log plumbing.
//!
//! Progress messages go through the `log` facade. A [`RunLog`] is carried by
//! each simulation so a caller can route one run's messages somewhere other
//! than the process-wide logger, which is how tests observe them.

use std::fmt;
use std::sync::{Arc, Mutex};

use log::{Level, LevelFilter, Log, Metadata, Record};

const TARGET: &str = "dem";

/// Destination for a simulation's log records.
#[derive(Clone, Default)]
pub enum RunLog {
    /// Forward to whatever logger the process installed (`env_logger` in the CLI).
    #[default]
    Global,
    /// Send to a dedicated sink.
    Sink(Arc<dyn Log>),
    /// Drop everything.
    Silent,
}

impl RunLog {
    /// Routes records into a fresh [`MemoryLog`] and returns both.
    pub fn capture() -> (Self, Arc<MemoryLog>) {
        let memory = Arc::new(MemoryLog::default());
        (RunLog::Sink(memory.clone()), memory)
    }

    pub fn emit(&self, level: Level, args: fmt::Arguments<'_>) {
        let record = Record::builder()
            .args(args)
            .level(level)
            .target(TARGET)
            .module_path_static(Some(module_path!()))
            .build();

        match self {
            RunLog::Global => {
                if level <= log::max_level() {
                    let logger = log::logger();
                    if logger.enabled(record.metadata()) {
                        logger.log(&record);
                    }
                }
            }
            RunLog::Sink(sink) => {
                if sink.enabled(record.metadata()) {
                    sink.log(&record);
                }
            }
            RunLog::Silent => {}
        }
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Info, args);
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Debug, args);
    }

    pub fn trace(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Trace, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Warn, args);
    }
}

impl fmt::Debug for RunLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunLog::Global => f.write_str("RunLog::Global"),
            RunLog::Sink(_) => f.write_str("RunLog::Sink(..)"),
            RunLog::Silent => f.write_str("RunLog::Silent"),
        }
    }
}

/// In-memory log sink that keeps every record at or above its level.
#[derive(Debug)]
pub struct MemoryLog {
    level: LevelFilter,
    records: Mutex<Vec<(Level, String)>>,
}

impl MemoryLog {
    pub fn new(level: LevelFilter) -> Self {
        Self {
            level,
            records: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of the captured records.
    pub fn records(&self) -> Vec<(Level, String)> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// True if any captured message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.records()
            .iter()
            .any(|(_, message)| message.contains(needle))
    }
}

impl Default for MemoryLog {
    fn default() -> Self {
        Self::new(LevelFilter::Trace)
    }
}

impl Log for MemoryLog {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Ok(mut records) = self.records.lock() {
            records.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}
