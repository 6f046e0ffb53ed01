//! Story viewer session
//!
//! One task owns the slideshow controller and multiplexes poller snapshots,
//! user commands and the playback tick. Cancelling the session tears down
//! both periodic activities.

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::api::StoryService;
use crate::config::Config;
use crate::playback::{ControllerEvent, Direction, SlideshowController, ViewFrame};
use crate::poller::{JobPoller, PollOutcome};
use texo_core::{AnimationSelector, JobId};

const COMMAND_BUFFER: usize = 32;

/// User input accepted by a running viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerCommand {
    TogglePlay,
    Next,
    Prev,
    Close,
}

#[derive(thiserror::Error, Debug)]
pub enum ViewerError {
    #[error("Viewer already closed")]
    Closed,

    #[error("Viewer task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Final state of a viewer session
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerExit {
    pub last_frame: ViewFrame,
    pub poll_outcome: PollOutcome,
}

/// Opens viewer sessions against a story service
pub struct StoryViewer {
    config: Config,
    service: Arc<dyn StoryService>,
    selector: Option<AnimationSelector>,
}

/// Handle to a running viewer session
pub struct ViewerHandle {
    commands: mpsc::Sender<ViewerCommand>,
    frames: watch::Receiver<ViewFrame>,
    events: broadcast::Receiver<ControllerEvent>,
    cancel: CancellationToken,
    task: JoinHandle<ViewerExit>,
}

impl StoryViewer {
    pub fn new(config: Config, service: Arc<dyn StoryService>) -> Self {
        Self {
            config,
            service,
            selector: None,
        }
    }

    /// Use a specific animation selector instead of an entropy-seeded one
    pub fn with_selector(mut self, selector: AnimationSelector) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Start watching `job_id`
    pub fn open(self, job_id: JobId) -> ViewerHandle {
        let selector = self.selector.unwrap_or_default();
        let controller = SlideshowController::with_selector(job_id.clone(), &self.config.playback, selector);
        let events = controller.subscribe();

        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (frame_tx, frame_rx) = watch::channel(controller.frame());
        let cancel = CancellationToken::new();
        let poller = JobPoller::new(self.service, &self.config.polling);

        info!("📖 Opening story viewer for {}", job_id);
        let session = Session {
            controller,
            poller,
            commands: command_rx,
            frames: frame_tx,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(session.run());

        ViewerHandle {
            commands: command_tx,
            frames: frame_rx,
            events,
            cancel,
            task,
        }
    }
}

impl ViewerHandle {
    pub async fn send(&self, command: ViewerCommand) -> Result<(), ViewerError> {
        self.commands.send(command).await.map_err(|_| ViewerError::Closed)
    }

    pub fn command_sender(&self) -> mpsc::Sender<ViewerCommand> {
        self.commands.clone()
    }

    /// Receiver of rendered frames; the latest frame is always available
    pub fn frames(&self) -> watch::Receiver<ViewFrame> {
        self.frames.clone()
    }

    /// New subscription to controller events
    pub fn events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.resubscribe()
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel the session and wait for it to wind down
    pub async fn close(self) -> Result<ViewerExit, ViewerError> {
        self.cancel.cancel();
        Ok(self.task.await?)
    }

    /// Wait for the session to end without cancelling it
    pub async fn join(self) -> Result<ViewerExit, ViewerError> {
        Ok(self.task.await?)
    }
}

struct Session {
    controller: SlideshowController,
    poller: JobPoller,
    commands: mpsc::Receiver<ViewerCommand>,
    frames: watch::Sender<ViewFrame>,
    cancel: CancellationToken,
}

impl Session {
    async fn run(mut self) -> ViewerExit {
        let job_id = self.controller.job_id().clone();
        let (mut snapshots, poll) = self.poller.spawn(job_id.clone(), self.cancel.child_token());
        let mut snapshots_open = true;

        let tick_interval = self.controller.tick_interval();
        let mut ticker = interval(tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticking = false;

        loop {
            let running = self.controller.is_running();
            if running && !ticking {
                // Next tick lands one full interval after (re)starting; the
                // partial interval elapsed before a pause is dropped
                ticker.reset();
            }
            ticking = running;

            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break,

                changed = snapshots.changed(), if snapshots_open => {
                    match changed {
                        Ok(()) => {
                            let snapshot = snapshots.borrow_and_update().clone();
                            if let Some(job) = snapshot {
                                self.controller.on_job_snapshot(job);
                            }
                        }
                        Err(_) => {
                            debug!("Poller for {} finished", job_id);
                            snapshots_open = false;
                        }
                    }
                }

                command = self.commands.recv() => {
                    match command {
                        Some(ViewerCommand::TogglePlay) => self.controller.toggle_play(),
                        Some(ViewerCommand::Next) => {
                            self.controller.manual_navigate(Direction::Next);
                        }
                        Some(ViewerCommand::Prev) => {
                            self.controller.manual_navigate(Direction::Prev);
                        }
                        Some(ViewerCommand::Close) | None => break,
                    }
                }

                _ = ticker.tick(), if running => {
                    self.controller.tick();
                }
            }

            self.frames.send_replace(self.controller.frame());
        }

        self.cancel.cancel();
        let poll_outcome = poll.shutdown().await;
        info!("📕 Closed story viewer for {}", job_id);

        ViewerExit {
            last_frame: self.controller.frame(),
            poll_outcome,
        }
    }
}
