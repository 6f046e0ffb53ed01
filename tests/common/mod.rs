//! Scripted story service shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use texo_core::{Job, JobId, JobStatus, JobSummary, MaturityLevel, Page};
use texo_viewer::api::{ApiError, ApiResult, AudioPayload, StoryService, TextStoryRequest};

/// One scripted reply to `fetch_job`
#[derive(Clone)]
pub enum Step {
    Snapshot { job: Job, delay: Duration },
    Error,
}

impl Step {
    pub fn now(job: Job) -> Self {
        Step::Snapshot { job, delay: Duration::ZERO }
    }

    pub fn after(job: Job, delay: Duration) -> Self {
        Step::Snapshot { job, delay }
    }
}

/// Replies to fetches in order; the last step repeats forever
pub struct ScriptedService {
    steps: Mutex<VecDeque<Step>>,
    fetches: AtomicUsize,
}

impl ScriptedService {
    pub fn new(steps: Vec<Step>) -> Self {
        assert!(!steps.is_empty(), "script needs at least one step");
        Self {
            steps: Mutex::new(steps.into()),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> Step {
        let mut steps = self.steps.lock().unwrap();
        if steps.len() > 1 {
            steps.pop_front().unwrap()
        } else {
            steps.front().cloned().unwrap()
        }
    }
}

#[async_trait]
impl StoryService for ScriptedService {
    async fn create_from_text(&self, _request: &TextStoryRequest) -> ApiResult<JobId> {
        Ok(JobId::new("job"))
    }

    async fn create_from_audio(
        &self,
        _audio: &AudioPayload,
        _theme: &str,
        _maturity: MaturityLevel,
    ) -> ApiResult<JobId> {
        Ok(JobId::new("job"))
    }

    async fn fetch_job(&self, id: &JobId) -> ApiResult<Job> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match self.next_step() {
            Step::Snapshot { mut job, delay } => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                job.id = id.clone();
                Ok(job)
            }
            Step::Error => Err(ApiError::Status {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                body: "worker unavailable".to_string(),
            }),
        }
    }

    async fn fetch_history(&self) -> ApiResult<Vec<JobSummary>> {
        Ok(Vec::new())
    }
}

pub fn snapshot(status: JobStatus) -> Job {
    let mut job = Job::new("job", status);
    job.current_stage_message = format!("Now {}", status);
    job
}

/// Completed job whose pages each hold `words_per_page` words
pub fn completed(pages: usize, words_per_page: usize) -> Job {
    let mut job = snapshot(JobStatus::Completed);
    job.progress = 100;
    job.title = Some("Beep and the Big Dance".to_string());
    job.pages = (0..pages)
        .map(|i| {
            let text = vec!["dance"; words_per_page].join(" ");
            Page::new(i as u32 + 1, text).with_image_url(format!("https://cdn.example/p{}.png", i + 1))
        })
        .collect();
    job
}
