use crate::core::grouper::DuplicateGroup;
use crate::review::history::{CullHistoryRecord, HistoryLog};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("no group is currently presented")]
    NoActiveGroup,

    #[error("keep index {index} out of range for a group of {len}")]
    InvalidSelection { index: usize, len: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What the human decided for the presented group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewDecision {
    /// Keep the image at this index within the group, delete the rest.
    Keep(usize),
    /// Delete every image in the group.
    DeleteAll,
    /// Leave the group untouched.
    Skip,
}

/// Files touched by one resolved group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewOutcome {
    pub kept: Vec<PathBuf>,
    pub deleted: Vec<PathBuf>,
}

/// Cursor state machine over a group list.
///
/// The detector hands the groups over once and has no further involvement;
/// all deletions happen here, on explicit human decisions. Aborting leaves
/// every remaining group untouched, with nothing to reconcile.
pub struct ReviewSession {
    groups: Vec<DuplicateGroup>,
    cursor: usize,
    aborted: bool,
    history: Option<HistoryLog>,
}

impl ReviewSession {
    pub fn new(groups: Vec<DuplicateGroup>) -> Self {
        Self {
            groups,
            cursor: 0,
            aborted: false,
            history: None,
        }
    }

    /// Record destructive decisions to `log` as they are applied.
    pub fn with_history(mut self, log: HistoryLog) -> Self {
        self.history = Some(log);
        self
    }

    /// The group currently presented for review, if any.
    pub fn current(&self) -> Option<&DuplicateGroup> {
        if self.aborted {
            return None;
        }
        self.groups.get(self.cursor)
    }

    /// (presented index, total groups), 0-based.
    pub fn position(&self) -> (usize, usize) {
        (self.cursor, self.groups.len())
    }

    pub fn is_done(&self) -> bool {
        self.aborted || self.cursor >= self.groups.len()
    }

    /// End the session early; remaining groups are simply never processed.
    pub fn abort(&mut self) {
        self.aborted = true;
    }

    /// Apply `decision` to the presented group and advance to the next one.
    ///
    /// Files already gone by review time are treated as deleted. An
    /// out-of-range `Keep` index fails without deleting anything and without
    /// advancing.
    pub fn resolve(&mut self, decision: ReviewDecision) -> Result<ReviewOutcome, ReviewError> {
        let group = self.current().ok_or(ReviewError::NoActiveGroup)?;
        let images = group.images.clone();

        let mut outcome = ReviewOutcome::default();
        match decision {
            ReviewDecision::Keep(index) => {
                if index >= images.len() {
                    return Err(ReviewError::InvalidSelection {
                        index,
                        len: images.len(),
                    });
                }
                for (i, path) in images.iter().enumerate() {
                    if i == index {
                        outcome.kept.push(path.clone());
                    } else {
                        remove_quietly(path)?;
                        outcome.deleted.push(path.clone());
                    }
                }
            }
            ReviewDecision::DeleteAll => {
                for path in &images {
                    remove_quietly(path)?;
                    outcome.deleted.push(path.clone());
                }
            }
            ReviewDecision::Skip => {
                outcome.kept = images;
            }
        }

        if !outcome.deleted.is_empty() {
            if let Some(log) = &self.history {
                let record = CullHistoryRecord::new(
                    outcome.kept.first().map(PathBuf::as_path),
                    &outcome.deleted,
                    "deleted",
                );
                if let Err(e) = log.append(&record) {
                    log::warn!("failed to record cull history: {}", e);
                }
            }
        }

        self.cursor += 1;
        Ok(outcome)
    }
}

fn remove_quietly(path: &Path) -> Result<(), ReviewError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ReviewError::Io(e)),
    }
}
