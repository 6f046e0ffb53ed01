use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use texo_core::{AnimationSelector, JobId, JobStatus, MaturityLevel, TransitionStyle};
use texo_viewer::api::{ApiError, AudioPayload, HttpStoryClient, StoryService, TextStoryRequest};
use texo_viewer::playback::{ControllerEvent, ViewFrame};
use texo_viewer::{ConfigBuilder, PollOutcome, StoryViewer, SubmissionError, SubmissionForm};

fn client_for(server: &MockServer) -> HttpStoryClient {
    let config = ConfigBuilder::new().with_base_url(format!("{}/", server.uri())).build();
    HttpStoryClient::new(&config.service).unwrap()
}

fn story_body(id: &str, status: &str) -> serde_json::Value {
    let done = status == "completed";
    let progress = if done { 100 } else { 60 };
    let pages = if done {
        json!([
            {"page_number": 1, "text_content": "Beep wanted to dance more than anything.", "image_url": "https://cdn.example/p1.png", "image_prompt": "robot", "duration": 5},
            {"page_number": 2, "text_content": "So Beep practiced every night.", "image_url": null, "image_prompt": "robot at night", "duration": null}
        ])
    } else {
        json!([])
    };

    json!({
        "id": id,
        "status": status,
        "progress": progress,
        "current_stage_message": format!("Stage {}", status),
        "title": "Beep and the Big Dance",
        "creation_metadata": {"theme": "Fantasy", "maturity": "child", "prompt_text": "A robot learns to dance"},
        "status_history": [
            {"stage": "queued", "message": "Story request received", "progress": 0, "timestamp": "2025-05-01T09:00:00.000000"},
            {"stage": status, "message": format!("Now {}", status), "progress": progress, "timestamp": "2025-05-01T09:00:30Z"}
        ],
        "pages": pages
    })
}

#[tokio::test]
async fn test_create_from_text_posts_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/create/text"))
        .and(body_json(json!({
            "prompt_text": "A robot learns to dance",
            "theme": "Fantasy",
            "maturity": "child"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "abc", "status": "queued"})))
        .expect(1)
        .mount(&server)
        .await;

    let request = TextStoryRequest {
        prompt_text: "A robot learns to dance".to_string(),
        theme: "Fantasy".to_string(),
        maturity: MaturityLevel::Child,
    };
    let id = client_for(&server).create_from_text(&request).await.unwrap();
    assert_eq!(id, JobId::new("abc"));
}

#[tokio::test]
async fn test_create_from_audio_sends_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/create/audio"))
        .and(body_string_contains("name=\"theme\""))
        .and(body_string_contains("Dinosaurs"))
        .and(body_string_contains("name=\"maturity\""))
        .and(body_string_contains("youth"))
        .and(body_string_contains("filename=\"story.webm\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "voice-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let audio = AudioPayload::webm(b"fake webm recording".to_vec());
    let id = client_for(&server)
        .create_from_audio(&audio, "Dinosaurs", MaturityLevel::Youth)
        .await
        .unwrap();
    assert_eq!(id.as_str(), "voice-1");
}

#[tokio::test]
async fn test_server_error_surfaces_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/create/text"))
        .respond_with(ResponseTemplate::new(500).set_body_string("agent offline"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut form = SubmissionForm::text("A robot learns to dance");
    match form.submit(&client).await {
        Err(SubmissionError::Api(ApiError::Status { status, body })) => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body, "agent offline");
        }
        other => panic!("expected status error, got {:?}", other),
    }
    assert!(!form.is_submitting());
}

#[tokio::test]
async fn test_fetch_job_parses_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/story/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(story_body("abc", "completed")))
        .mount(&server)
        .await;

    let job = client_for(&server).fetch_job(&JobId::new("abc")).await.unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.page_count(), 2);
    assert_eq!(job.pages[1].image_url, None);
}

#[tokio::test]
async fn test_fetch_job_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/story/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Story not found"})))
        .mount(&server)
        .await;

    let err = client_for(&server).fetch_job(&JobId::new("missing")).await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status, .. } if status.as_u16() == 404));
}

#[tokio::test]
async fn test_history_reduces_to_summaries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            story_body("done", "completed"),
            story_body("busy", "illustrating")
        ])))
        .mount(&server)
        .await;

    let history = client_for(&server).fetch_history().await.unwrap();
    assert_eq!(history.len(), 2);

    assert_eq!(history[0].id.as_str(), "done");
    assert_eq!(history[0].thumbnail_url.as_deref(), Some("https://cdn.example/p1.png"));
    assert_eq!(
        history[0].created_at.map(|at| at.to_rfc3339()),
        Some("2025-05-01T09:00:00+00:00".to_string())
    );

    assert_eq!(history[1].status, JobStatus::Illustrating);
    assert!(history[1].thumbnail_url.is_none());
}

#[tokio::test]
async fn test_text_story_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/create/text"))
        .and(body_json(json!({
            "prompt_text": "A robot learns to dance",
            "theme": "Fantasy",
            "maturity": "child"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "robot-dance"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/story/robot-dance"))
        .respond_with(ResponseTemplate::new(200).set_body_json(story_body("robot-dance", "illustrating")))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/story/robot-dance"))
        .respond_with(ResponseTemplate::new(200).set_body_json(story_body("robot-dance", "completed")))
        .with_priority(2)
        .mount(&server)
        .await;

    let config = ConfigBuilder::new()
        .with_base_url(server.uri())
        .with_poll_interval(Duration::from_millis(50))
        .build();
    let service = Arc::new(HttpStoryClient::new(&config.service).unwrap());

    let mut form = SubmissionForm::text("A robot learns to dance")
        .with_theme("Fantasy")
        .with_maturity(MaturityLevel::Child);
    let job_id = form.submit(&*service).await.unwrap();
    assert_eq!(job_id.as_str(), "robot-dance");

    let handle = StoryViewer::new(config, service)
        .with_selector(AnimationSelector::fixed(TransitionStyle::Slide))
        .open(job_id);
    let mut frames = handle.frames();
    let mut events = handle.events();

    let frame = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            {
                let frame = frames.borrow_and_update();
                if frame.is_slide() {
                    return (*frame).clone();
                }
            }
            frames.changed().await.unwrap();
        }
    })
    .await
    .expect("story never became playable");

    let slide = frame.as_slide().unwrap();
    assert_eq!(slide.page_index, 0);
    assert!(slide.is_playing);
    assert_eq!(slide.transition, TransitionStyle::Slide);
    assert_eq!(slide.title, "Beep and the Big Dance");
    let badges = slide.badges.as_ref().unwrap();
    assert_eq!(badges.theme, "Fantasy");
    assert_eq!(badges.maturity, "child");

    let mut saw_loading = false;
    let mut autoplay = None;
    while let Ok(event) = events.try_recv() {
        match event {
            ControllerEvent::SnapshotApplied { status: JobStatus::Illustrating, .. } => saw_loading = true,
            ControllerEvent::AutoplayStarted { page_duration, .. } => autoplay = Some(page_duration),
            _ => {}
        }
    }
    assert!(saw_loading);
    // Seven words on the first page stay under the five second floor
    assert_eq!(autoplay, Some(Duration::from_millis(5_000)));

    let exit = handle.close().await.unwrap();
    assert_eq!(exit.poll_outcome, PollOutcome::Completed);
    assert!(matches!(exit.last_frame, ViewFrame::Slide(_)));
}
