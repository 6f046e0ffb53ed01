//! Per-page progress accumulation

use std::time::Duration;

/// Observable timer state; `Running` is `playing && progress < 100`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Paused,
}

/// Result of a single tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Progress moved to the contained percentage
    Advanced(f64),
    /// The page ran out; progress was reset to 0 for the next page
    PageComplete,
}

/// Advances page progress by `tick / page_duration` each tick.
///
/// The timer keeps no notion of wall-clock time, so pausing is simply not
/// ticking it and the fractional progress survives untouched.
#[derive(Debug, Clone)]
pub struct PlaybackTimer {
    tick_interval: Duration,
    page_duration: Duration,
    progress_pct: f64,
}

impl PlaybackTimer {
    pub fn new(tick_interval: Duration, page_duration: Duration) -> Self {
        Self {
            tick_interval,
            page_duration,
            progress_pct: 0.0,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn page_duration(&self) -> Duration {
        self.page_duration
    }

    pub fn progress_pct(&self) -> f64 {
        self.progress_pct
    }

    /// Start a new page: new duration, progress back to 0
    pub fn start_page(&mut self, page_duration: Duration) {
        self.page_duration = page_duration;
        self.progress_pct = 0.0;
    }

    pub fn state(&self, is_playing: bool) -> TimerState {
        if is_playing && self.progress_pct < 100.0 {
            TimerState::Running
        } else if self.progress_pct > 0.0 {
            TimerState::Paused
        } else {
            TimerState::Idle
        }
    }

    /// Percentage gained per tick
    pub fn step_pct(&self) -> f64 {
        let page_ms = self.page_duration.as_secs_f64() * 1000.0;
        if page_ms <= 0.0 {
            return 100.0;
        }
        let tick_ms = self.tick_interval.as_secs_f64() * 1000.0;
        tick_ms * 100.0 / page_ms
    }

    /// Apply one tick. Reaching 100% resets progress and reports `PageComplete`
    /// instead of clamping.
    pub fn tick(&mut self) -> TickOutcome {
        let next = self.progress_pct + self.step_pct();
        if next >= 100.0 {
            self.progress_pct = 0.0;
            TickOutcome::PageComplete
        } else {
            self.progress_pct = next;
            TickOutcome::Advanced(next)
        }
    }
}
