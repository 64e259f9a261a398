use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// One destructive review decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CullHistoryRecord {
    pub timestamp: String,
    pub retained: Option<String>,
    pub culled: Vec<String>,
    pub action: String,
}

impl CullHistoryRecord {
    pub fn new(retained: Option<&Path>, culled: &[PathBuf], action: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            retained: retained.map(|p| p.to_string_lossy().into_owned()),
            culled: culled
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect(),
            action: action.to_string(),
        }
    }
}

/// Append-only JSONL log of review decisions.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &CullHistoryRecord) -> std::io::Result<()> {
        let mut out = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(out, "{}", serde_json::to_string(record)?)?;
        Ok(())
    }

    /// Read every record, skipping malformed lines.
    pub fn read_all(&self) -> std::io::Result<Vec<CullHistoryRecord>> {
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);

        let mut records = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            match serde_json::from_str::<CullHistoryRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => log::warn!("skipping malformed history entry {}: {}", i, e),
            }
        }
        Ok(records)
    }
}
