//! Append-only JSONL log of generation reports.

use crate::error::{IoError, Result};
use kinesis_core::PopulationObserver;
use kinesis_data::GenerationReport;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const HISTORY_FILE: &str = "generations.jsonl";

/// Appends one JSON line per completed generation to
/// `<dir>/generations.jsonl`.
pub struct HistoryLogger {
    file: BufWriter<File>,
    path: PathBuf,
}

impl HistoryLogger {
    pub fn new_at<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .map_err(|e| IoError::from(e).with_context(format!("creating {dir:?}")))?;
        let path = dir.join(HISTORY_FILE);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            file: BufWriter::new(file),
            path,
        })
    }

    pub fn record(&mut self, report: &GenerationReport) -> Result<()> {
        let json = serde_json::to_string(report)?;
        writeln!(self.file, "{json}")?;
        self.file.flush()?;
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PopulationObserver for HistoryLogger {
    fn on_generation(&mut self, report: &GenerationReport) {
        if let Err(e) = self.record(report) {
            tracing::warn!(error = %e, path = %self.path.display(), "Failed to append history");
        }
    }
}

/// Reads every report logged under `dir`. A missing log yields an empty list;
/// lines that fail to parse are skipped.
pub fn read_reports<P: AsRef<Path>>(dir: P) -> Result<Vec<GenerationReport>> {
    let path = dir.as_ref().join(HISTORY_FILE);
    let file = match File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
        Err(e) => return Err(e.into()),
    };

    let mut reports = Vec::new();
    for line in BufReader::new(file).lines().map_while(std::io::Result::ok) {
        match serde_json::from_str::<GenerationReport>(&line) {
            Ok(report) => reports.push(report),
            Err(e) => tracing::debug!(error = %e, "Skipping malformed history line"),
        }
    }
    Ok(reports)
}
