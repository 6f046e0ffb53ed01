use chrono::{TimeZone, Utc};
use texo_core::{
    present_log, InputMode, Job, JobStatus, LogMarker, MaturityLevel, StatusLog,
};

const COMPLETED_STORY: &str = r#"{
    "id": "6651f0c2a1",
    "status": "completed",
    "progress": 100,
    "current_stage_message": "Story ready!",
    "title": "Beep and the Big Dance",
    "creation_metadata": {"theme": "Fantasy", "maturity": "child", "prompt_text": "A robot learns to dance"},
    "status_history": [
        {"stage": "queued", "message": "Story request received", "progress": 0, "timestamp": "2025-05-01T09:00:00.000000"},
        {"stage": "analyzing_narrative", "message": "Extracted themes: Friendship", "progress": 20, "timestamp": "2025-05-01T09:00:04.250000+00:00"},
        {"stage": "completed", "message": "Done", "progress": 100, "timestamp": "2025-05-01T09:01:10Z"}
    ],
    "pages": [
        {"page_number": 1, "text_content": "Beep wanted to dance.", "image_url": "https://cdn.example/p1.png", "image_prompt": "robot", "duration": 5, "audio_url": null},
        {"page_number": 2, "text_content": "So Beep practiced every night.", "image_url": null, "image_prompt": "robot at night", "duration": null, "audio_url": null}
    ]
}"#;

fn log(stage: &str, minute: u32) -> StatusLog {
    StatusLog::new(
        stage,
        format!("{} step", stage),
        0,
        Utc.with_ymd_and_hms(2025, 5, 1, 9, minute, 0).unwrap(),
    )
}

#[test]
fn test_parse_completed_story() {
    let job = Job::from_json(COMPLETED_STORY).unwrap();

    assert_eq!(job.id.as_str(), "6651f0c2a1");
    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.is_terminal());
    assert_eq!(job.page_count(), 2);
    assert_eq!(job.pages[0].text, "Beep wanted to dance.");
    assert!(job.pages[1].image_url.is_none());
    assert_eq!(job.status_history.len(), 3);
    assert_eq!(job.status_history[1].stage, "analyzing_narrative");

    let metadata = job.creation_metadata.as_ref().unwrap();
    assert_eq!(metadata.maturity_level(), Some(MaturityLevel::Child));
    assert_eq!(metadata.input_mode(), InputMode::Text);
}

#[test]
fn test_parse_in_progress_story_with_nulls() {
    let body = r#"{
        "id": "abc",
        "status": "analyzing_narrative",
        "progress": 15,
        "current_stage_message": "Reading your idea...",
        "status_history": null,
        "pages": []
    }"#;
    let job = Job::from_json(body).unwrap();

    assert_eq!(job.status, JobStatus::Analyzing);
    assert!(job.status_history.is_empty());
    assert!(job.creation_metadata.is_none());
    assert_eq!(job.display_title(), "Untitled Story");
}

#[test]
fn test_not_found_payload_is_failed_job() {
    let body = r#"{"id": "missing", "status": "failed", "progress": 0, "current_stage_message": "Not found", "pages": []}"#;
    let job = Job::from_json(body).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.current_stage_message, "Not found");
}

#[test]
fn test_unknown_status_is_rejected() {
    let body = r#"{"id": "x", "status": "dreaming"}"#;
    assert!(Job::from_json(body).is_err());
}

#[test]
fn test_summary_uses_first_page_and_earliest_log() {
    let job = Job::from_json(COMPLETED_STORY).unwrap();
    let summary = job.summary();

    assert_eq!(summary.display_title(), "Beep and the Big Dance");
    assert_eq!(summary.thumbnail_url.as_deref(), Some("https://cdn.example/p1.png"));
    assert_eq!(
        summary.created_at,
        Some(Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap())
    );
}

#[test]
fn test_log_marks_latest_in_progress() {
    let history = vec![log("queued", 0), log("illustrating", 2)];
    let entries = present_log(&history, JobStatus::Illustrating);

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].stage, "illustrating");
    assert_eq!(entries[0].marker, LogMarker::InProgress);
    assert!(entries[0].emphasized);
    assert_eq!(entries[1].stage, "queued");
    assert_eq!(entries[1].marker, LogMarker::Done);
    assert!(!entries[1].emphasized);
}

#[test]
fn test_log_marks_latest_error_when_failed() {
    let history = vec![log("queued", 0), log("illustrating", 2)];
    let entries = present_log(&history, JobStatus::Failed);

    assert_eq!(entries[0].marker, LogMarker::Error);
    assert!(!entries[0].emphasized);
    assert_eq!(entries[1].marker, LogMarker::Done);
}

#[test]
fn test_log_all_done_when_completed() {
    let history = vec![log("queued", 0), log("storyboarding", 1), log("completed", 3)];
    let entries = present_log(&history, JobStatus::Completed);

    assert!(entries.iter().all(|e| e.marker == LogMarker::Done));
    assert_eq!(entries[0].stage, "completed");
    assert_eq!(entries[2].stage, "queued");
}

#[test]
fn test_log_empty_history() {
    assert!(present_log(&[], JobStatus::Queued).is_empty());
}

#[test]
fn test_log_time_label_format() {
    let entries = present_log(&[log("queued", 0)], JobStatus::Queued);
    let label = &entries[0].time_label;
    assert_eq!(label.len(), 8);
    assert_eq!(label.matches(':').count(), 2);
}
