#![cfg(unix)]

use serde_json::json;
use tempfile::TempDir;

use quizreel::{
    config::{PipelineConfig, RendererConfig},
    core::store::{QuestionStore, ValidationPolicy},
    pipeline::{command::CommandRenderer, stages::Renderer},
    publish::PublishMetadata,
};

fn store() -> QuestionStore {
    let records = json!([{
        "id": 12,
        "difficulty": "easy",
        "question": "1 + 1?",
        "options": ["1", "2", "3", "4"],
        "answer": "B",
        "explanation": "One and one make two.",
        "captions": ["c"],
        "descriptions": ["d"],
        "hashtags": ["#1", "#2", "#3", "#4", "#5"],
    }]);
    QuestionStore::from_json_str("test", &records.to_string(), ValidationPolicy::Strict).expect("store")
}

fn pipeline_config(tmp: &TempDir) -> PipelineConfig {
    PipelineConfig {
        temp_dir: tmp.path().join("temp"),
        video_dir: tmp.path().join("video"),
        ..PipelineConfig::default()
    }
}

fn sh(script: &str) -> RendererConfig {
    RendererConfig {
        program: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string(), "sh".to_string(), "{input}".to_string(), "{output}".to_string()],
    }
}

#[tokio::test]
async fn renders_through_external_command() {
    let tmp = TempDir::new().expect("tmp");
    let renderer = CommandRenderer::new(&sh(r#"grep -q '"id": 12' "$1" && printf video > "$2""#), &pipeline_config(&tmp));
    let store = store();
    let q = store.get(12).expect("question");

    let media = renderer.render(q, &PublishMetadata::for_question(q)).await.expect("render");
    assert_eq!(media.question_id, 12);
    assert_eq!(media.path, tmp.path().join("video").join("video_12.mp4"));
    assert_eq!(std::fs::read_to_string(&media.path).expect("video"), "video");
    assert!(tmp.path().join("temp").join("question_12.json").exists());
}

#[tokio::test]
async fn failing_command_reports_stderr() {
    let tmp = TempDir::new().expect("tmp");
    let renderer = CommandRenderer::new(&sh("echo 'ffmpeg: codec missing' >&2; exit 3"), &pipeline_config(&tmp));
    let store = store();
    let q = store.get(12).expect("question");

    let err = renderer.render(q, &PublishMetadata::for_question(q)).await.unwrap_err();
    assert!(err.to_string().contains("codec missing"), "{err}");
}

#[tokio::test]
async fn empty_output_is_rejected() {
    let tmp = TempDir::new().expect("tmp");
    let renderer = CommandRenderer::new(&sh(r#": > "$2""#), &pipeline_config(&tmp));
    let store = store();
    let q = store.get(12).expect("question");

    let err = renderer.render(q, &PublishMetadata::for_question(q)).await.unwrap_err();
    assert!(err.to_string().contains("empty"), "{err}");
}
