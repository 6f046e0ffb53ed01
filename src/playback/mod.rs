//! Slideshow playback: page timer, controller and renderable view frames

pub mod controller;
pub mod timer;

pub use controller::{ControllerEvent, Direction, PlaybackState, SlideshowController};
pub use timer::{PlaybackTimer, TickOutcome, TimerState};

use serde::Serialize;
use texo_core::{InputMode, JobStatus, LogEntryView, TransitionStyle};

pub const CONNECTING_MESSAGE: &str = "Connecting to agent...";
pub const IMAGE_PLACEHOLDER: &str = "Generating Art...";
pub const TEXT_PLACEHOLDER: &str = "Writing story...";

/// What the view should show right now
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewFrame {
    /// Job not ready: stage message, overall progress and the activity log
    Loading(LoadingFrame),

    /// Job reached `failed`
    Failed(LoadingFrame),

    /// Job completed: one page of the slideshow
    Slide(SlideFrame),
}

impl ViewFrame {
    pub fn is_slide(&self) -> bool {
        matches!(self, ViewFrame::Slide(_))
    }

    pub fn as_slide(&self) -> Option<&SlideFrame> {
        match self {
            ViewFrame::Slide(slide) => Some(slide),
            _ => None,
        }
    }
}

impl Default for ViewFrame {
    fn default() -> Self {
        ViewFrame::Loading(LoadingFrame::connecting())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadingFrame {
    pub status: Option<JobStatus>,
    pub message: String,
    pub progress: u8,
    pub log: Vec<LogEntryView>,
}

impl LoadingFrame {
    pub fn connecting() -> Self {
        Self {
            status: None,
            message: CONNECTING_MESSAGE.to_string(),
            progress: 0,
            log: Vec::new(),
        }
    }
}

/// Page artwork, or a placeholder while it is missing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "url", rename_all = "snake_case")]
pub enum PageImage {
    Ready(String),
    Placeholder,
}

/// Story metadata shown above the book frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoryBadges {
    pub theme: String,
    pub maturity: String,
    pub input_mode: InputMode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideFrame {
    pub title: String,
    pub badges: Option<StoryBadges>,
    pub page_index: usize,
    pub page_count: usize,
    pub text: String,
    pub image: PageImage,
    pub transition: TransitionStyle,
    pub progress_pct: f64,
    pub is_playing: bool,
    pub can_go_back: bool,
    pub can_go_forward: bool,
    /// Agent thought process, newest first
    pub log: Vec<LogEntryView>,
}
