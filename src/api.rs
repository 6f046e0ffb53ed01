//! HTTP client for the story generation service

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ServiceConfig;
use texo_core::{Job, JobId, JobSummary, MaturityLevel};

/// Error types for story service calls
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid audio payload: {0}")]
    InvalidAudio(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Body of `POST /api/create/text`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStoryRequest {
    pub prompt_text: String,
    pub theme: String,
    pub maturity: MaturityLevel,
}

/// Recorded audio ready for upload
#[derive(Debug, Clone, PartialEq)]
pub struct AudioPayload {
    bytes: Vec<u8>,
    file_name: String,
    mime_type: String,
}

impl AudioPayload {
    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            file_name: file_name.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Browser-style recording (`story.webm`, `audio/webm`)
    pub fn webm(bytes: Vec<u8>) -> Self {
        Self::new(bytes, "story.webm", "audio/webm")
    }

    /// Read a recording from disk, guessing the MIME type from the extension
    pub async fn from_file(path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "story.webm".to_string());
        let mime_type = match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("wav") => "audio/wav",
            Some("mp3") => "audio/mpeg",
            Some("ogg") | Some("oga") => "audio/ogg",
            Some("m4a") | Some("mp4") => "audio/mp4",
            _ => "audio/webm",
        };
        Ok(Self::new(bytes, file_name, mime_type))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Creation endpoints answer with the new job; only its id matters here
#[derive(Debug, Deserialize)]
struct CreatedJob {
    id: JobId,
}

/// Client-side contract with the story generation service
#[async_trait]
pub trait StoryService: Send + Sync {
    /// Start a story from a text prompt
    async fn create_from_text(&self, request: &TextStoryRequest) -> ApiResult<JobId>;

    /// Start a story from a voice recording
    async fn create_from_audio(
        &self,
        audio: &AudioPayload,
        theme: &str,
        maturity: MaturityLevel,
    ) -> ApiResult<JobId>;

    /// Fetch the current snapshot of a job
    async fn fetch_job(&self, id: &JobId) -> ApiResult<Job>;

    /// List previously created stories
    async fn fetch_history(&self) -> ApiResult<Vec<JobSummary>>;
}

/// `reqwest`-backed story service client
#[derive(Debug, Clone)]
pub struct HttpStoryClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpStoryClient {
    pub fn new(config: &ServiceConfig) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()?;

        Ok(Self {
            base_url: config.api_url().to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn non-2xx responses into `ApiError::Status`, then decode the body
    async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl StoryService for HttpStoryClient {
    async fn create_from_text(&self, request: &TextStoryRequest) -> ApiResult<JobId> {
        info!("📝 Submitting text prompt (theme: {}, maturity: {})", request.theme, request.maturity);

        let response = self
            .client
            .post(self.url("/api/create/text"))
            .json(request)
            .send()
            .await?;

        let created: CreatedJob = Self::decode(response).await?;
        info!("✅ Story job created: {}", created.id);
        Ok(created.id)
    }

    async fn create_from_audio(
        &self,
        audio: &AudioPayload,
        theme: &str,
        maturity: MaturityLevel,
    ) -> ApiResult<JobId> {
        info!(
            "🎙️ Uploading voice prompt {} ({} bytes, theme: {}, maturity: {})",
            audio.file_name(),
            audio.bytes().len(),
            theme,
            maturity
        );

        let part = Part::bytes(audio.bytes().to_vec())
            .file_name(audio.file_name().to_string())
            .mime_str(audio.mime_type())
            .map_err(|e| ApiError::InvalidAudio(e.to_string()))?;

        let form = Form::new()
            .text("theme", theme.to_string())
            .text("maturity", maturity.as_str())
            .part("file", part);

        let response = self
            .client
            .post(self.url("/api/create/audio"))
            .multipart(form)
            .send()
            .await?;

        let created: CreatedJob = Self::decode(response).await?;
        info!("✅ Story job created: {}", created.id);
        Ok(created.id)
    }

    async fn fetch_job(&self, id: &JobId) -> ApiResult<Job> {
        debug!("Fetching story {}", id);
        let response = self
            .client
            .get(self.url(&format!("/api/story/{}", id)))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn fetch_history(&self) -> ApiResult<Vec<JobSummary>> {
        let response = self.client.get(self.url("/api/history")).send().await?;
        let jobs: Vec<Job> = Self::decode(response).await?;
        Ok(jobs.iter().map(JobSummary::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_audio_from_file_guesses_mime_type() {
        let mut file = tempfile::Builder::new().suffix(".WAV").tempfile().unwrap();
        file.write_all(b"RIFF0000WAVE").unwrap();

        let audio = tokio_test::block_on(AudioPayload::from_file(file.path())).unwrap();
        assert_eq!(audio.mime_type(), "audio/wav");
        assert_eq!(audio.bytes(), b"RIFF0000WAVE");
        assert!(audio.file_name().ends_with(".WAV"));
    }

    #[test]
    fn test_unknown_extension_defaults_to_webm() {
        let file = tempfile::Builder::new().suffix(".rec").tempfile().unwrap();
        let audio = tokio_test::block_on(AudioPayload::from_file(file.path())).unwrap();
        assert_eq!(audio.mime_type(), "audio/webm");
        assert!(audio.is_empty());
    }

    #[test]
    fn test_client_strips_trailing_slash() {
        let config = ServiceConfig {
            base_url: "http://stories.local:8000/".to_string(),
            ..ServiceConfig::default()
        };
        let client = HttpStoryClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://stories.local:8000");
        assert_eq!(client.url("/api/history"), "http://stories.local:8000/api/history");
    }
}
