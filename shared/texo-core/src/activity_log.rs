//! Agent activity log presentation
//!
//! The service only reports an overall job status, so per-entry state is
//! inferred: the newest entry is the one being worked on (or the one that
//! failed), everything older is done.

use crate::job::{JobStatus, StatusLog};
use chrono::Local;
use serde::Serialize;

/// Display annotation for a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogMarker {
    InProgress,
    Done,
    Error,
}

impl LogMarker {
    pub fn symbol(&self) -> &'static str {
        match self {
            LogMarker::InProgress => "…",
            LogMarker::Done => "✓",
            LogMarker::Error => "✗",
        }
    }
}

/// One rendered line of the activity log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntryView {
    pub marker: LogMarker,
    pub stage: String,
    pub message: String,
    /// Local wall-clock time, `HH:MM:SS`
    pub time_label: String,
    /// Only the entry currently in progress is highlighted
    pub emphasized: bool,
}

/// Annotate `history` (oldest first) for display, newest first
pub fn present_log(history: &[StatusLog], status: JobStatus) -> Vec<LogEntryView> {
    let processing = !status.is_terminal();

    history
        .iter()
        .rev()
        .enumerate()
        .map(|(index, log)| {
            let latest = index == 0;
            let marker = if latest && status == JobStatus::Failed {
                LogMarker::Error
            } else if latest && processing {
                LogMarker::InProgress
            } else {
                LogMarker::Done
            };

            LogEntryView {
                marker,
                stage: log.stage.clone(),
                message: log.message.clone(),
                time_label: log.timestamp.with_timezone(&Local).format("%H:%M:%S").to_string(),
                emphasized: marker == LogMarker::InProgress,
            }
        })
        .collect()
}
