//! Story job snapshot as delivered by the generation service

use crate::{CoreError, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prompt text the service records for stories created from a voice recording
pub const AUDIO_INPUT_MARKER: &str = "Audio Input";

/// Opaque job identifier, stable for the lifetime of a job
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Pipeline stages of a story job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted, waiting for a worker
    Queued,

    /// Extracting themes and narrative from the prompt
    #[serde(rename = "analyzing_narrative", alias = "analyzing")]
    Analyzing,

    /// Splitting the story into pages
    Storyboarding,

    /// Generating page artwork
    Illustrating,

    /// All pages are ready
    Completed,

    /// The service gave up on this job
    Failed,
}

impl JobStatus {
    /// Position in the forward-only stage order. Both terminal states share the last slot.
    pub fn rank(&self) -> u8 {
        match self {
            JobStatus::Queued => 0,
            JobStatus::Analyzing => 1,
            JobStatus::Storyboarding => 2,
            JobStatus::Illustrating => 3,
            JobStatus::Completed | JobStatus::Failed => 4,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// True when moving from `previous` to `self` would go backwards or leave a terminal state
    pub fn is_regression_from(&self, previous: JobStatus) -> bool {
        if previous.is_terminal() {
            return *self != previous;
        }
        self.rank() < previous.rank()
    }

    /// Wire name, as the service spells it
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Analyzing => "analyzing_narrative",
            JobStatus::Storyboarding => "storyboarding",
            JobStatus::Illustrating => "illustrating",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target audience, which drives story length and vocabulary on the service side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaturityLevel {
    #[default]
    Toddler,
    Child,
    Youth,
}

impl MaturityLevel {
    pub const ALL: [MaturityLevel; 3] = [MaturityLevel::Toddler, MaturityLevel::Child, MaturityLevel::Youth];

    pub fn as_str(&self) -> &'static str {
        match self {
            MaturityLevel::Toddler => "toddler",
            MaturityLevel::Child => "child",
            MaturityLevel::Youth => "youth",
        }
    }

    /// Human-readable option label
    pub fn label(&self) -> &'static str {
        match self {
            MaturityLevel::Toddler => "Toddler (Simple words)",
            MaturityLevel::Child => "Child (Full story)",
            MaturityLevel::Youth => "Youth (Complex themes)",
        }
    }
}

impl fmt::Display for MaturityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaturityLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "toddler" => Ok(MaturityLevel::Toddler),
            "child" => Ok(MaturityLevel::Child),
            "youth" => Ok(MaturityLevel::Youth),
            other => Err(CoreError::UnknownMaturity(other.to_string())),
        }
    }
}

/// How the story prompt was supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    Voice,
    Text,
}

impl InputMode {
    pub fn label(&self) -> &'static str {
        match self {
            InputMode::Voice => "Voice Story",
            InputMode::Text => "Text Prompt",
        }
    }
}

/// A single step in the job's processing history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusLog {
    /// Stage name, e.g. "analyzing_narrative"
    pub stage: String,

    /// Free-form description of what happened
    pub message: String,

    /// Job progress (0-100) when this step was recorded
    #[serde(default)]
    pub progress: u8,

    /// When this step happened
    #[serde(deserialize_with = "lenient_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl StatusLog {
    pub fn new(stage: impl Into<String>, message: impl Into<String>, progress: u8, timestamp: DateTime<Utc>) -> Self {
        Self {
            stage: stage.into(),
            message: message.into(),
            progress,
            timestamp,
        }
    }
}

/// One illustrated page of a finished story
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub page_number: u32,

    #[serde(rename = "text_content", default, deserialize_with = "null_as_default")]
    pub text: String,

    #[serde(default)]
    pub image_url: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub image_prompt: String,

    /// Server-suggested duration in seconds
    #[serde(default)]
    pub duration: Option<f64>,

    #[serde(default)]
    pub audio_url: Option<String>,
}

impl Page {
    pub fn new(page_number: u32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
            image_url: None,
            image_prompt: String::new(),
            duration: None,
            audio_url: None,
        }
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }
}

/// Parameters the job was created with
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CreationMetadata {
    #[serde(default)]
    pub theme: String,

    #[serde(default)]
    pub maturity: String,

    #[serde(default)]
    pub prompt_text: Option<String>,
}

impl CreationMetadata {
    pub fn maturity_level(&self) -> Option<MaturityLevel> {
        self.maturity.parse().ok()
    }

    pub fn input_mode(&self) -> InputMode {
        match self.prompt_text.as_deref() {
            Some(AUDIO_INPUT_MARKER) => InputMode::Voice,
            _ => InputMode::Text,
        }
    }
}

/// Point-in-time snapshot of a story job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,

    pub status: JobStatus,

    /// Overall progress, 0-100
    #[serde(default)]
    pub progress: u8,

    #[serde(default, deserialize_with = "null_as_default")]
    pub current_stage_message: String,

    #[serde(default)]
    pub title: Option<String>,

    /// Oldest first, exactly as delivered
    #[serde(default, deserialize_with = "null_as_default")]
    pub status_history: Vec<StatusLog>,

    /// Populated only once the job is completed
    #[serde(default, deserialize_with = "null_as_default")]
    pub pages: Vec<Page>,

    #[serde(default)]
    pub creation_metadata: Option<CreationMetadata>,
}

impl Job {
    pub fn new(id: impl Into<JobId>, status: JobStatus) -> Self {
        Self {
            id: id.into(),
            status,
            progress: 0,
            current_stage_message: String::new(),
            title: None,
            status_history: Vec::new(),
            pages: Vec::new(),
            creation_metadata: None,
        }
    }

    /// Parse a snapshot from the service's JSON body
    pub fn from_json(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled Story")
    }

    /// Timestamp of the earliest history entry
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.status_history.first().map(|log| log.timestamp)
    }

    pub fn summary(&self) -> JobSummary {
        JobSummary::from(self)
    }
}

/// Condensed job entry for the history listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSummary {
    pub id: JobId,
    pub status: JobStatus,
    pub title: Option<String>,
    pub thumbnail_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl JobSummary {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled Story")
    }
}

impl From<&Job> for JobSummary {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.clone(),
            status: job.status,
            title: job.title.clone(),
            thumbnail_url: job.pages.first().and_then(|p| p.image_url.clone()),
            created_at: job.created_at(),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts RFC 3339 timestamps and naive ISO 8601 ones, which are taken as UTC
fn lenient_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}
