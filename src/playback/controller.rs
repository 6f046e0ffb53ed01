//! Slideshow controller
//!
//! Owns the playback view state for one job and is the only thing that
//! mutates it. Job snapshots, timer ticks and user commands all come through
//! here; observers learn about each transition through a broadcast channel.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::timer::{PlaybackTimer, TickOutcome, TimerState};
use super::{LoadingFrame, PageImage, SlideFrame, StoryBadges, ViewFrame, TEXT_PLACEHOLDER};
use crate::config::PlaybackConfig;
use texo_core::{present_log, AnimationSelector, DurationEstimator, Job, JobId, JobStatus, TransitionStyle};

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

/// Notifications emitted on every state transition
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    SnapshotApplied { status: JobStatus, progress: u8 },
    AutoplayStarted { page_duration: Duration, style: TransitionStyle },
    PageChanged { index: usize, style: TransitionStyle, page_duration: Duration },
    PlaybackToggled { playing: bool },
    /// Playback ran off the last page
    PlaybackStopped { index: usize },
    Progress { pct: f64 },
}

/// Copy of the playback view state
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub current_page_index: usize,
    pub is_playing: bool,
    pub progress_pct: f64,
    pub page_duration: Duration,
    pub animation_style: TransitionStyle,
}

pub struct SlideshowController {
    job_id: JobId,
    job: Option<Arc<Job>>,
    current_page_index: usize,
    is_playing: bool,
    animation_style: TransitionStyle,
    timer: PlaybackTimer,
    estimator: DurationEstimator,
    selector: AnimationSelector,
    /// Text the current page duration was derived from
    timed_text: Option<String>,
    autoplay_fired: bool,
    user_started: bool,
    events: broadcast::Sender<ControllerEvent>,
}

impl SlideshowController {
    pub fn new(job_id: JobId, config: &PlaybackConfig) -> Self {
        Self::with_selector(job_id, config, AnimationSelector::new())
    }

    /// Controller with a caller-supplied animation selector (seeded or fixed in tests)
    pub fn with_selector(job_id: JobId, config: &PlaybackConfig, selector: AnimationSelector) -> Self {
        let estimator = config.estimator();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            job_id,
            job: None,
            current_page_index: 0,
            is_playing: false,
            animation_style: TransitionStyle::default(),
            timer: PlaybackTimer::new(config.tick_interval(), Duration::from_millis(estimator.min_ms())),
            estimator,
            selector,
            timed_text: None,
            autoplay_fired: false,
            user_started: false,
            events,
        }
    }

    /// Register an observer for state transitions
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn job(&self) -> Option<&Job> {
        self.job.as_deref()
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            current_page_index: self.current_page_index,
            is_playing: self.is_playing,
            progress_pct: self.timer.progress_pct(),
            page_duration: self.timer.page_duration(),
            animation_style: self.animation_style,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn current_page_index(&self) -> usize {
        self.current_page_index
    }

    pub fn tick_interval(&self) -> Duration {
        self.timer.tick_interval()
    }

    fn page_count(&self) -> usize {
        self.job.as_ref().map_or(0, |job| job.page_count())
    }

    fn is_completed(&self) -> bool {
        self.job.as_ref().is_some_and(|job| job.status == JobStatus::Completed)
    }

    pub fn timer_state(&self) -> TimerState {
        self.timer.state(self.is_playing)
    }

    /// Whether the playback tick should be armed
    pub fn is_running(&self) -> bool {
        self.is_completed() && self.page_count() > 0 && self.timer_state() == TimerState::Running
    }

    fn emit(&self, event: ControllerEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn current_text(&self) -> String {
        self.job
            .as_ref()
            .and_then(|job| job.page(self.current_page_index))
            .map(|page| page.text.clone())
            .unwrap_or_default()
    }

    /// Derive the duration for the current page and restart its progress
    fn enter_page(&mut self) {
        let text = self.current_text();
        self.timer.start_page(self.estimator.estimate(&text));
        self.timed_text = Some(text);
    }

    /// Apply a fresh job snapshot. Returns false when the snapshot was rejected.
    pub fn on_job_snapshot(&mut self, job: Arc<Job>) -> bool {
        if job.id != self.job_id {
            warn!("Ignoring snapshot for {} in viewer for {}", job.id, self.job_id);
            return false;
        }

        if let Some(current) = &self.job {
            if job.status.is_regression_from(current.status) {
                warn!("Ignoring snapshot for {}: status {} after {}", self.job_id, job.status, current.status);
                return false;
            }
        }

        let status = job.status;
        let progress = job.progress;
        self.job = Some(job);

        let count = self.page_count();
        if count > 0 && self.current_page_index >= count {
            self.current_page_index = count - 1;
        }
        if self.timed_text.as_deref() != Some(self.current_text().as_str()) {
            self.enter_page();
        }

        self.emit(ControllerEvent::SnapshotApplied { status, progress });

        if status == JobStatus::Completed && !self.autoplay_fired {
            self.autoplay_fired = true;
            if !self.user_started {
                self.start_autoplay();
            }
        }

        true
    }

    fn start_autoplay(&mut self) {
        self.current_page_index = 0;
        self.animation_style = self.selector.next_style();
        self.enter_page();
        self.is_playing = true;

        let page_duration = self.timer.page_duration();
        info!(
            "▶️ Story {} ready with {} pages, starting playback ({:?} on page 1)",
            self.job_id,
            self.page_count(),
            page_duration
        );
        self.emit(ControllerEvent::AutoplayStarted {
            page_duration,
            style: self.animation_style,
        });
    }

    /// Move one page in `direction`, re-rolling the transition style.
    ///
    /// `Next` on the last page stops playback and keeps the index; `Prev` on the
    /// first page leaves everything in place. Returns true when the page changed.
    pub fn go_to_page(&mut self, direction: Direction) -> bool {
        let count = self.page_count();
        if count == 0 {
            return false;
        }

        self.animation_style = self.selector.next_style();

        match direction {
            Direction::Next if self.current_page_index + 1 >= count => {
                if self.is_playing {
                    self.is_playing = false;
                    debug!("Reached the last page of {}, stopping playback", self.job_id);
                    self.emit(ControllerEvent::PlaybackStopped {
                        index: self.current_page_index,
                    });
                }
                return false;
            }
            Direction::Next => self.current_page_index += 1,
            Direction::Prev if self.current_page_index == 0 => return false,
            Direction::Prev => self.current_page_index -= 1,
        }

        self.enter_page();
        self.emit(ControllerEvent::PageChanged {
            index: self.current_page_index,
            style: self.animation_style,
            page_duration: self.timer.page_duration(),
        });
        true
    }

    /// Flip play/pause intent; the page index is untouched
    pub fn toggle_play(&mut self) {
        self.user_started = true;
        self.is_playing = !self.is_playing;
        self.emit(ControllerEvent::PlaybackToggled {
            playing: self.is_playing,
        });
    }

    /// Manual navigation: stop autoplay first so the timer never races the user
    pub fn manual_navigate(&mut self, direction: Direction) -> bool {
        if self.is_playing {
            self.is_playing = false;
            self.emit(ControllerEvent::PlaybackToggled { playing: false });
        }
        self.go_to_page(direction)
    }

    /// Apply one playback tick; does nothing unless the timer is running
    pub fn tick(&mut self) -> Option<TickOutcome> {
        if !self.is_running() {
            return None;
        }

        let outcome = self.timer.tick();
        match outcome {
            TickOutcome::Advanced(pct) => self.emit(ControllerEvent::Progress { pct }),
            TickOutcome::PageComplete => {
                self.go_to_page(Direction::Next);
            }
        }
        Some(outcome)
    }

    /// Render the current view
    pub fn frame(&self) -> ViewFrame {
        let Some(job) = self.job.as_ref() else {
            return ViewFrame::Loading(LoadingFrame::connecting());
        };

        let log = present_log(&job.status_history, job.status);

        match job.status {
            JobStatus::Completed => ViewFrame::Slide(self.slide_frame(job, log)),
            JobStatus::Failed => ViewFrame::Failed(LoadingFrame {
                status: Some(job.status),
                message: job.current_stage_message.clone(),
                progress: job.progress,
                log,
            }),
            status => ViewFrame::Loading(LoadingFrame {
                status: Some(status),
                message: if job.current_stage_message.is_empty() {
                    super::CONNECTING_MESSAGE.to_string()
                } else {
                    job.current_stage_message.clone()
                },
                progress: job.progress,
                log,
            }),
        }
    }

    fn slide_frame(&self, job: &Job, log: Vec<texo_core::LogEntryView>) -> SlideFrame {
        let page = job.page(self.current_page_index);
        let page_count = job.page_count();

        let text = page
            .map(|p| p.text.trim())
            .filter(|t| !t.is_empty())
            .unwrap_or(TEXT_PLACEHOLDER)
            .to_string();

        let image = page
            .and_then(|p| p.image_url.as_deref())
            .filter(|url| !url.is_empty())
            .map(|url| PageImage::Ready(url.to_string()))
            .unwrap_or(PageImage::Placeholder);

        let badges = job.creation_metadata.as_ref().map(|meta| StoryBadges {
            theme: meta.theme.clone(),
            maturity: meta.maturity.clone(),
            input_mode: meta.input_mode(),
        });

        SlideFrame {
            title: job.display_title().to_string(),
            badges,
            page_index: self.current_page_index,
            page_count,
            text,
            image,
            transition: self.animation_style,
            progress_pct: self.timer.progress_pct(),
            is_playing: self.is_playing,
            can_go_back: self.current_page_index > 0,
            can_go_forward: self.current_page_index + 1 < page_count,
            log,
        }
    }
}
