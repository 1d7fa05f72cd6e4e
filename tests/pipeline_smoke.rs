use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use serde_json::{Value, json};
use tempfile::TempDir;

use quizreel::{
    ErrorKind,
    config::PipelineConfig,
    core::{
        ledger::UsageLedger,
        store::{QuestionStore, ValidationPolicy},
    },
    persist::{LogFileSink, MemorySink},
    pipeline::{
        MarkPolicy, Pipeline, RunOutcome, RunReport,
        stages::{DryRunPublisher, MediaArtifact, Notifier, PublishReceipt, Publisher, Renderer, StageError, StageFuture},
    },
    publish::{PublishMetadata, VariantChoice},
    question::Question,
};

fn store_of(ids: &[i64]) -> QuestionStore {
    let records: Vec<Value> = ids
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "difficulty": "medium",
                "question": format!("Question {id}"),
                "options": ["a", "b", "c", "d"],
                "answer": "B",
                "explanation": "b it is",
                "captions": [format!("first caption {id}"), format!("second caption {id}")],
                "descriptions": ["desc"],
                "hashtags": ["#1", "#2", "#3", "#4", "#5"],
            })
        })
        .collect();
    QuestionStore::from_json_str("test", &Value::Array(records).to_string(), ValidationPolicy::Strict)
        .expect("store")
}

fn config(tmp: &TempDir) -> PipelineConfig {
    PipelineConfig {
        temp_dir: tmp.path().join("temp"),
        video_dir: tmp.path().join("video"),
        stage_timeout_secs: 1,
        ..PipelineConfig::default()
    }
}

struct StubRenderer {
    fail: bool,
}

impl Renderer for StubRenderer {
    fn render<'a>(&'a self, question: &'a Question, _metadata: &'a PublishMetadata) -> StageFuture<'a, MediaArtifact> {
        Box::pin(async move {
            if self.fail {
                return Err(StageError::new("encoder crashed"));
            }
            Ok(MediaArtifact {
                question_id: question.id,
                path: PathBuf::from(format!("video_{}.mp4", question.id)),
            })
        })
    }
}

enum Behaviour {
    Succeed,
    Fail,
    Hang,
}

struct StubPublisher {
    name: &'static str,
    behaviour: Behaviour,
    captions: Arc<Mutex<Vec<String>>>,
}

impl StubPublisher {
    fn new(name: &'static str, behaviour: Behaviour) -> Self {
        Self {
            name,
            behaviour,
            captions: Arc::default(),
        }
    }
}

impl Publisher for StubPublisher {
    fn platform(&self) -> &str {
        self.name
    }

    fn publish<'a>(&'a self, _media: &'a MediaArtifact, metadata: &'a PublishMetadata) -> StageFuture<'a, PublishReceipt> {
        Box::pin(async move {
            self.captions.lock().expect("lock").push(metadata.caption.clone());
            match self.behaviour {
                Behaviour::Succeed => Ok(PublishReceipt {
                    platform: self.name.to_string(),
                    remote_id: Some("remote-1".to_string()),
                    url: None,
                }),
                Behaviour::Fail => Err(StageError::new("401 unauthorized")),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Err(StageError::new("unreachable"))
                }
            }
        })
    }
}

#[derive(Clone, Default)]
struct RecordingNotifier {
    reports: Arc<Mutex<Vec<RunReport>>>,
    alerts: Arc<Mutex<Vec<String>>>,
}

impl Notifier for RecordingNotifier {
    fn notify_run<'a>(&'a self, report: &'a RunReport) -> StageFuture<'a, ()> {
        Box::pin(async move {
            self.reports.lock().expect("lock").push(report.clone());
            Ok(())
        })
    }

    fn alert<'a>(&'a self, title: &'a str, _message: &'a str) -> StageFuture<'a, ()> {
        Box::pin(async move {
            self.alerts.lock().expect("lock").push(title.to_string());
            Ok(())
        })
    }
}

#[tokio::test]
async fn successful_run_marks_and_advances() {
    let tmp = TempDir::new().expect("tmp");
    let log = tmp.path().join("used.log");
    let notifier = RecordingNotifier::default();
    let ledger = UsageLedger::open(LogFileSink::new(&log)).expect("ledger");

    let mut pipeline = Pipeline::new(store_of(&[1, 2]), ledger, StubRenderer { fail: false }, notifier.clone(), config(&tmp))
        .with_publisher(StubPublisher::new("facebook", Behaviour::Succeed))
        .with_publisher(StubPublisher::new("youtube", Behaviour::Fail));

    let RunOutcome::Published(report) = pipeline.run_once().await.expect("run") else {
        panic!("expected a published run");
    };
    assert_eq!(report.question_id, 1);
    assert!(report.marked);
    assert_eq!(report.results.len(), 2);
    assert!(report.results[0].succeeded());
    assert_eq!(report.results[1].error.as_deref(), Some("401 unauthorized"));
    assert_eq!(std::fs::read_to_string(&log).expect("log"), "1\n");

    let RunOutcome::Published(report) = pipeline.run_once().await.expect("run") else {
        panic!("expected a published run");
    };
    assert_eq!(report.question_id, 2);

    assert_eq!(pipeline.run_once().await.expect("run"), RunOutcome::Exhausted { total: 2 });
    let reports = notifier.reports.lock().expect("lock").clone();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.marked), "notification must follow the ledger write");
    assert_eq!(*notifier.alerts.lock().expect("lock"), vec!["No unused questions available".to_string()]);
}

#[tokio::test]
async fn all_failed_uploads_leave_question_eligible() {
    let tmp = TempDir::new().expect("tmp");
    let sink = MemorySink::new();
    let ledger = UsageLedger::open(sink.clone()).expect("ledger");

    let mut pipeline = Pipeline::new(store_of(&[7, 8]), ledger, StubRenderer { fail: false }, RecordingNotifier::default(), config(&tmp))
        .with_publisher(StubPublisher::new("facebook", Behaviour::Fail))
        .with_publisher(StubPublisher::new("youtube", Behaviour::Hang));

    let RunOutcome::NotMarked(report) = pipeline.run_once().await.expect("run") else {
        panic!("expected an unmarked run");
    };
    assert_eq!(report.question_id, 7);
    assert!(!report.marked);
    assert!(report.results[1].error.as_deref().is_some_and(|e| e.contains("timed out")));
    assert!(sink.snapshot().is_empty());

    let RunOutcome::NotMarked(report) = pipeline.run_once().await.expect("run") else {
        panic!("expected an unmarked run");
    };
    assert_eq!(report.question_id, 7);
}

#[tokio::test]
async fn all_success_policy_requires_every_platform() {
    let tmp = TempDir::new().expect("tmp");
    let cfg = PipelineConfig {
        mark_policy: MarkPolicy::AllSuccess,
        ..config(&tmp)
    };
    let ledger = UsageLedger::open(MemorySink::new()).expect("ledger");
    let mut pipeline = Pipeline::new(store_of(&[1]), ledger, StubRenderer { fail: false }, RecordingNotifier::default(), cfg)
        .with_publisher(DryRunPublisher::new("facebook"))
        .with_publisher(StubPublisher::new("youtube", Behaviour::Fail));

    assert!(matches!(pipeline.run_once().await.expect("run"), RunOutcome::NotMarked(_)));
    assert!(!pipeline.ledger().contains(1));
}

#[tokio::test]
async fn never_policy_publishes_without_marking() {
    let tmp = TempDir::new().expect("tmp");
    let cfg = PipelineConfig {
        mark_policy: MarkPolicy::Never,
        ..config(&tmp)
    };
    let sink = MemorySink::new();
    let notifier = RecordingNotifier::default();
    let ledger = UsageLedger::open(sink.clone()).expect("ledger");
    let mut pipeline = Pipeline::new(store_of(&[5, 6]), ledger, StubRenderer { fail: false }, notifier.clone(), cfg)
        .with_publisher(DryRunPublisher::new("facebook"))
        .with_publisher(DryRunPublisher::new("youtube"));

    for _ in 0..2 {
        let RunOutcome::NotMarked(report) = pipeline.run_once().await.expect("run") else {
            panic!("expected an unmarked run");
        };
        assert_eq!(report.question_id, 5);
        assert!(report.results.iter().all(|r| r.succeeded()));
    }
    assert!(sink.snapshot().is_empty());
    assert!(notifier.reports.lock().expect("lock").iter().all(|r| !r.marked));
}

#[tokio::test]
async fn render_failure_alerts_and_propagates() {
    let tmp = TempDir::new().expect("tmp");
    let notifier = RecordingNotifier::default();
    let ledger = UsageLedger::open(MemorySink::new()).expect("ledger");
    let mut pipeline = Pipeline::new(store_of(&[1]), ledger, StubRenderer { fail: true }, notifier.clone(), config(&tmp))
        .with_publisher(DryRunPublisher::new("facebook"));

    let err = pipeline.run_once().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Stage);
    assert!(err.to_string().contains("encoder crashed"));
    assert_eq!(*notifier.alerts.lock().expect("lock"), vec!["Render failed".to_string()]);
    assert!(!pipeline.ledger().contains(1));
}

#[tokio::test]
async fn caption_strategy_is_applied() {
    let tmp = TempDir::new().expect("tmp");
    let cfg = PipelineConfig {
        caption_variant: VariantChoice::Index(1),
        ..config(&tmp)
    };
    let publisher = StubPublisher::new("facebook", Behaviour::Succeed);
    let captions = publisher.captions.clone();
    let ledger = UsageLedger::open(MemorySink::new()).expect("ledger");
    let mut pipeline = Pipeline::new(store_of(&[4]), ledger, StubRenderer { fail: false }, RecordingNotifier::default(), cfg)
        .with_publisher(publisher);

    pipeline.run_once().await.expect("run");
    assert_eq!(*captions.lock().expect("lock"), vec!["second caption 4".to_string()]);
}
