//! Story prompt submission

use tracing::{error, info};

use crate::api::{ApiError, AudioPayload, StoryService, TextStoryRequest};
use texo_core::{JobId, MaturityLevel};

/// Suggested themes offered alongside free-form input
pub const THEMES: &[&str] = &[
    "Adventure", "Animals", "Bedtime Story", "Bravery", "Circus",
    "Courage", "Dinosaurs", "Discovery", "Education", "Fairy Tale",
    "Family", "Fantasy", "Folklore", "Friendship", "Funny",
    "History", "Holidays", "Kindness", "Magic", "Monsters",
    "Morals", "Mystery", "Nature", "Ocean", "Pirates",
    "Princesses", "Robots", "School", "Sci-Fi", "Space",
    "Sports", "Superheroes", "Travel", "Underwater",
];

pub const DEFAULT_THEME: &str = "Fantasy";

#[derive(thiserror::Error, Debug)]
pub enum SubmissionError {
    #[error("Please record a story first!")]
    MissingAudio,

    #[error("Please write a story concept!")]
    EmptyPrompt,

    #[error("A submission is already in flight")]
    AlreadySubmitting,

    #[error("Failed to start story agent: {0}")]
    Api(#[from] ApiError),
}

/// Which prompt the form will send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptMode {
    #[default]
    Voice,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Submitted(JobId),
}

/// Prompt form state: the chosen input plus theme and audience
#[derive(Debug, Clone)]
pub struct SubmissionForm {
    mode: PromptMode,
    theme: String,
    maturity: MaturityLevel,
    text_prompt: String,
    audio: Option<AudioPayload>,
    state: SubmissionState,
}

impl Default for SubmissionForm {
    fn default() -> Self {
        Self {
            mode: PromptMode::default(),
            theme: DEFAULT_THEME.to_string(),
            maturity: MaturityLevel::default(),
            text_prompt: String::new(),
            audio: None,
            state: SubmissionState::Idle,
        }
    }
}

impl SubmissionForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text-mode form with `prompt` already filled in
    pub fn text(prompt: impl Into<String>) -> Self {
        Self::new().with_mode(PromptMode::Text).with_text_prompt(prompt)
    }

    /// Voice-mode form with a recording attached
    pub fn voice(audio: AudioPayload) -> Self {
        Self::new().with_mode(PromptMode::Voice).with_audio(audio)
    }

    pub fn with_mode(mut self, mode: PromptMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = theme.into();
        self
    }

    pub fn with_maturity(mut self, maturity: MaturityLevel) -> Self {
        self.maturity = maturity;
        self
    }

    pub fn with_text_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.text_prompt = prompt.into();
        self
    }

    pub fn with_audio(mut self, audio: AudioPayload) -> Self {
        self.audio = Some(audio);
        self
    }

    pub fn mode(&self) -> PromptMode {
        self.mode
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    pub fn maturity(&self) -> MaturityLevel {
        self.maturity
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn is_submitting(&self) -> bool {
        self.state == SubmissionState::Submitting
    }

    /// Check required input for the current mode; never touches the network
    pub fn validate(&self) -> Result<(), SubmissionError> {
        match self.mode {
            PromptMode::Voice => match &self.audio {
                Some(audio) if !audio.is_empty() => Ok(()),
                _ => Err(SubmissionError::MissingAudio),
            },
            PromptMode::Text if self.text_prompt.trim().is_empty() => Err(SubmissionError::EmptyPrompt),
            PromptMode::Text => Ok(()),
        }
    }

    /// Submit the prompt and return the new job id.
    ///
    /// Validation failures leave the form untouched. Transport failures reset it
    /// to `Idle` so the user can retry.
    pub async fn submit(&mut self, service: &dyn StoryService) -> Result<JobId, SubmissionError> {
        if self.is_submitting() {
            return Err(SubmissionError::AlreadySubmitting);
        }
        self.validate()?;

        self.state = SubmissionState::Submitting;
        let result = match self.mode {
            PromptMode::Text => {
                let request = TextStoryRequest {
                    prompt_text: self.text_prompt.clone(),
                    theme: self.theme.clone(),
                    maturity: self.maturity,
                };
                service.create_from_text(&request).await
            }
            PromptMode::Voice => match &self.audio {
                Some(audio) => service.create_from_audio(audio, &self.theme, self.maturity).await,
                None => Err(ApiError::InvalidAudio("no recording attached".to_string())),
            },
        };

        match result {
            Ok(id) => {
                info!("🚀 Story agent started: {}", id);
                self.state = SubmissionState::Submitted(id.clone());
                Ok(id)
            }
            Err(e) => {
                error!("Failed to start story agent: {}", e);
                self.state = SubmissionState::Idle;
                Err(SubmissionError::Api(e))
            }
        }
    }
}
