//! Persistence for the remote party registry.
//!
//! Implements:
//! - Append-only JSON-lines log of registry mutations
//! - Replay on startup
//!
//! The registry only talks to the `PersistenceSink` trait; the medium is
//! chosen by whoever wires up the node.

use crate::party::RemoteParty;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// One registry mutation, serialized as one line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LogEntry {
    #[serde(rename = "ADD")]
    Add { party: RemoteParty },

    #[serde(rename = "UPDATE")]
    Update { party: RemoteParty },

    #[serde(rename = "REMOVE")]
    Remove { party: RemoteParty },
}

impl LogEntry {
    pub fn party(&self) -> &RemoteParty {
        match self {
            LogEntry::Add { party } | LogEntry::Update { party } | LogEntry::Remove { party } => {
                party
            }
        }
    }
}

/// Where registry mutations are recorded
pub trait PersistenceSink: Send + Sync {
    /// Record one mutation; called before the mutation becomes visible
    fn append(&self, entry: &LogEntry) -> io::Result<()>;

    /// All recorded mutations in order
    fn load(&self) -> io::Result<Vec<LogEntry>>;
}

/// File sink configuration
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Log file path
    pub path: PathBuf,
    /// Flush to disk after every write
    pub flush_on_write: bool,
}

impl Default for FileSinkConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./ocpi-data/remote-parties.log"),
            flush_on_write: true,
        }
    }
}

/// Append-only JSON-lines file
pub struct FileSink {
    config: FileSinkConfig,
    writer: Mutex<BufWriter<File>>,
}

impl FileSink {
    /// Open (or create) the log file for appending
    pub fn open(config: FileSinkConfig) -> io::Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)?;

        debug!(
            "Storage: Opened registry log at {:?} (size={})",
            config.path,
            file.metadata()?.len()
        );

        Ok(Self {
            config,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.config.path
    }
}

impl PersistenceSink for FileSink {
    fn append(&self, entry: &LogEntry) -> io::Result<()> {
        let data = serde_json::to_string(entry)?;
        let mut writer = self.writer.lock();
        writeln!(writer, "{}", data)?;

        if self.config.flush_on_write {
            writer.flush()?;
        }

        Ok(())
    }

    fn load(&self) -> io::Result<Vec<LogEntry>> {
        // Pending writes must be visible to the reader
        self.writer.lock().flush()?;

        let reader = BufReader::new(File::open(&self.config.path)?);
        let mut entries = Vec::new();
        let mut line_num = 0;

        for line in reader.lines() {
            line_num += 1;
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    warn!("Storage: Registry log read error at line {}: {}", line_num, e);
                    break;
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<LogEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!("Storage: Registry log parse error at line {}: {}", line_num, e);
                }
            }
        }

        info!(
            "Storage: Read {} lines, {} registry entries from {:?}",
            line_num,
            entries.len(),
            self.config.path
        );

        Ok(entries)
    }
}

/// In-memory sink for tests and ephemeral nodes
#[derive(Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<LogEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl PersistenceSink for MemorySink {
    fn append(&self, entry: &LogEntry) -> io::Result<()> {
        self.entries.lock().push(entry.clone());
        Ok(())
    }

    fn load(&self) -> io::Result<Vec<LogEntry>> {
        Ok(self.entries.lock().clone())
    }
}

/// Sink that drops everything
pub struct NullSink;

impl PersistenceSink for NullSink {
    fn append(&self, _entry: &LogEntry) -> io::Result<()> {
        Ok(())
    }

    fn load(&self) -> io::Result<Vec<LogEntry>> {
        Ok(Vec::new())
    }
}
