//! Boundaries to the rendering, upload, and notification collaborators.

use std::{future::Future, path::PathBuf, pin::Pin};

use serde::Serialize;
use tracing::{info, warn};

use crate::{publish::PublishMetadata, question::Question, types::QuestionId};

use super::RunReport;

/// Failure reported by an external stage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct StageError(pub String);

impl StageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<std::io::Error> for StageError {
    fn from(value: std::io::Error) -> Self {
        Self(value.to_string())
    }
}

/// Boxed future returned by stage methods so stages can live behind `dyn`.
pub type StageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StageError>> + Send + 'a>>;

/// Rendered media ready for upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaArtifact {
    pub question_id: QuestionId,
    pub path: PathBuf,
}

/// Platform acknowledgement of an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishReceipt {
    pub platform: String,
    pub remote_id: Option<String>,
    pub url: Option<String>,
}

pub trait Renderer: Send + Sync {
    fn render<'a>(&'a self, question: &'a Question, metadata: &'a PublishMetadata) -> StageFuture<'a, MediaArtifact>;
}

pub trait Publisher: Send + Sync {
    /// Name used in logs and run reports.
    fn platform(&self) -> &str;
    fn publish<'a>(&'a self, media: &'a MediaArtifact, metadata: &'a PublishMetadata) -> StageFuture<'a, PublishReceipt>;
}

pub trait Notifier: Send + Sync {
    fn notify_run<'a>(&'a self, report: &'a RunReport) -> StageFuture<'a, ()>;
    fn alert<'a>(&'a self, title: &'a str, message: &'a str) -> StageFuture<'a, ()>;
}

/// Logs what would be uploaded and acknowledges without a network call.
#[derive(Debug, Clone)]
pub struct DryRunPublisher {
    platform: String,
}

impl DryRunPublisher {
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
        }
    }
}

impl Publisher for DryRunPublisher {
    fn platform(&self) -> &str {
        &self.platform
    }

    fn publish<'a>(&'a self, media: &'a MediaArtifact, metadata: &'a PublishMetadata) -> StageFuture<'a, PublishReceipt> {
        Box::pin(async move {
            info!(
                platform = %self.platform,
                media = %media.path.display(),
                caption = %metadata.caption,
                hashtags = metadata.hashtags.len(),
                "dry run: upload skipped"
            );
            Ok(PublishReceipt {
                platform: self.platform.clone(),
                remote_id: None,
                url: None,
            })
        })
    }
}

/// Writes run reports and alerts to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_run<'a>(&'a self, report: &'a RunReport) -> StageFuture<'a, ()> {
        Box::pin(async move {
            for result in &report.results {
                match &result.error {
                    None => info!(question = report.question_id, platform = %result.platform, "upload succeeded"),
                    Some(err) => warn!(question = report.question_id, platform = %result.platform, %err, "upload failed"),
                }
            }
            info!(question = report.question_id, marked = report.marked, "run finished");
            Ok(())
        })
    }

    fn alert<'a>(&'a self, title: &'a str, message: &'a str) -> StageFuture<'a, ()> {
        Box::pin(async move {
            warn!(%title, %message, "alert");
            Ok(())
        })
    }
}
