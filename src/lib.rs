/// Texo Viewer - Story generation client
///
/// Submits story prompts to the generation service, polls the resulting job
/// and plays the finished story back as an auto-advancing slideshow.

pub mod api;
pub mod config;
pub mod playback;
pub mod poller;
pub mod submission;
pub mod viewer;

// Re-export main types for easy access
pub use crate::api::{ApiError, AudioPayload, HttpStoryClient, StoryService, TextStoryRequest};
pub use crate::config::{Config, ConfigBuilder};
pub use crate::playback::{ControllerEvent, Direction, PlaybackState, SlideshowController, ViewFrame};
pub use crate::poller::{JobPoller, PollHandle, PollOutcome};
pub use crate::submission::{SubmissionError, SubmissionForm, DEFAULT_THEME, THEMES};
pub use crate::viewer::{StoryViewer, ViewerCommand, ViewerHandle};
pub use texo_core::{Job, JobId, JobStatus, MaturityLevel, TransitionStyle};
