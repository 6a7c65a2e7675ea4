//! JSONL telemetry writer with size-based rotation and retention.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info};

use super::types::TelemetryRecord;
use crate::config::TelemetryConfig;
use crate::error::Result;
use crate::session::StoredReading;

/// File name prefix of telemetry logs
const FILE_PREFIX: &str = "telemetry_";

/// File name extension of telemetry logs
const FILE_EXTENSION: &str = ".jsonl";

/// Rotating JSONL telemetry logger
///
/// # Examples
///
/// ```no_run
/// use sh2_bridge::telemetry::TelemetryLogger;
///
/// let mut logger = TelemetryLogger::with_limits("./logs", 10_000, 10)?;
/// logger.flush()?;
/// # Ok::<(), sh2_bridge::error::BridgeError>(())
/// ```
#[derive(Debug)]
pub struct TelemetryLogger {
    dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    current_path: Option<PathBuf>,
    records_in_file: usize,
    files_created: usize,
}

impl TelemetryLogger {
    /// Create a logger from the `[telemetry]` section
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        Self::with_limits(
            &config.log_dir,
            config.max_records_per_file,
            config.max_files_to_keep,
        )
    }

    /// Create a logger writing into `dir`
    ///
    /// # Arguments
    ///
    /// * `dir` - Log directory, created if missing
    /// * `max_records_per_file` - Records written before rotating
    /// * `max_files_to_keep` - Newest files retained after each rotation
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created
    pub fn with_limits<P: AsRef<Path>>(
        dir: P,
        max_records_per_file: usize,
        max_files_to_keep: usize,
    ) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        Ok(Self {
            dir,
            max_records_per_file: max_records_per_file.max(1),
            max_files_to_keep: max_files_to_keep.max(1),
            writer: None,
            current_path: None,
            records_in_file: 0,
            files_created: 0,
        })
    }

    /// File currently being written, if any
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    /// Append one record, rotating first if the current file is full
    pub fn log(&mut self, record: &TelemetryRecord) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        if let Some(writer) = self.writer.as_mut() {
            serde_json::to_writer(&mut *writer, record)?;
            writer.write_all(b"\n")?;
            self.records_in_file += 1;
        }
        Ok(())
    }

    /// Log every reading of a store snapshot under one timestamp
    ///
    /// # Returns
    ///
    /// * `Result<usize>` - Number of records written
    pub fn log_snapshot(&mut self, snapshot: &[StoredReading]) -> Result<usize> {
        let timestamp = Utc::now();
        for stored in snapshot {
            self.log(&TelemetryRecord::at(timestamp, stored))?;
        }
        self.flush()?;
        Ok(snapshot.len())
    }

    pub fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    /// Close the current file and start a new one
    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        let name = format!(
            "{}{}_{:04}{}",
            FILE_PREFIX,
            Utc::now().format("%Y%m%d_%H%M%S"),
            self.files_created,
            FILE_EXTENSION
        );
        let path = self.dir.join(name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        info!("Telemetry file: {}", path.display());

        self.writer = Some(BufWriter::new(file));
        self.current_path = Some(path);
        self.records_in_file = 0;
        self.files_created += 1;

        self.prune()?;
        Ok(())
    }

    /// Delete the oldest telemetry files beyond the retention limit
    fn prune(&self) -> Result<usize> {
        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| is_telemetry_file(path))
            .collect();

        // Names embed creation time, so lexical order is age order
        files.sort();

        let excess = files.len().saturating_sub(self.max_files_to_keep);
        for path in &files[..excess] {
            fs::remove_file(path)?;
            debug!("Removed old telemetry file: {}", path.display());
        }
        Ok(excess)
    }
}

fn is_telemetry_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with(FILE_PREFIX) && name.ends_with(FILE_EXTENSION))
        .unwrap_or(false)
}
