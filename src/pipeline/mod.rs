//! Single-run orchestration: select, render, publish, notify, mark.

/// External-command renderer.
pub mod command;
/// Stage traits and the built-in dry-run/log stages.
pub mod stages;

use std::{future::Future, path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::{
    config::PipelineConfig,
    core::{ledger::UsageLedger, selector::QuestionSelector, store::QuestionStore},
    error::{Error, Result},
    logging::truncate,
    publish::PublishMetadata,
    types::QuestionId,
};

use self::stages::{Notifier, PublishReceipt, Publisher, Renderer, StageError};

/// When a run's question is recorded in the usage ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkPolicy {
    /// At least one platform accepted the upload.
    #[default]
    AnySuccess,
    /// Every configured platform accepted the upload.
    AllSuccess,
    /// Rehearsal runs; nothing is marked.
    Never,
}

impl MarkPolicy {
    pub fn is_satisfied(self, results: &[PlatformResult]) -> bool {
        match self {
            Self::AnySuccess => results.iter().any(PlatformResult::succeeded),
            Self::AllSuccess => !results.is_empty() && results.iter().all(PlatformResult::succeeded),
            Self::Never => false,
        }
    }
}

/// Outcome of one platform upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformResult {
    pub platform: String,
    pub receipt: Option<PublishReceipt>,
    pub error: Option<String>,
}

impl PlatformResult {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary handed to the notifier after the upload stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub question_id: QuestionId,
    pub difficulty: String,
    pub caption: String,
    pub results: Vec<PlatformResult>,
    /// Whether the question was recorded in the usage ledger.
    pub marked: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Mark policy satisfied; the question is now used.
    Published(RunReport),
    /// Uploads did not satisfy the mark policy; the question stays eligible.
    NotMarked(RunReport),
    /// Nothing left to publish.
    Exhausted { total: usize },
}

/// Owns one store/ledger pair and the external stages for a run.
pub struct Pipeline {
    store: QuestionStore,
    ledger: UsageLedger,
    renderer: Box<dyn Renderer>,
    publishers: Vec<Box<dyn Publisher>>,
    notifier: Box<dyn Notifier>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        store: QuestionStore,
        ledger: UsageLedger,
        renderer: impl Renderer + 'static,
        notifier: impl Notifier + 'static,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            ledger,
            renderer: Box::new(renderer),
            publishers: Vec::new(),
            notifier: Box::new(notifier),
            config,
        }
    }

    pub fn with_publisher(mut self, publisher: impl Publisher + 'static) -> Self {
        self.publishers.push(Box::new(publisher));
        self
    }

    pub fn store(&self) -> &QuestionStore {
        &self.store
    }

    pub fn ledger(&self) -> &UsageLedger {
        &self.ledger
    }

    pub fn into_parts(self) -> (QuestionStore, UsageLedger) {
        (self.store, self.ledger)
    }

    /// Runs the whole publish flow for the next eligible question.
    ///
    /// Exhaustion is reported through the notifier and returned as
    /// [`RunOutcome::Exhausted`], not as an error.
    pub async fn run_once(&mut self) -> Result<RunOutcome> {
        let timeout = self.config.stage_timeout();
        let selector = QuestionSelector::new(&self.store, &self.ledger);

        let stats = selector.get_stats();
        info!(
            used = stats.used,
            total = stats.total,
            percentage = stats.percentage_used,
            remaining_by_difficulty = ?stats.remaining_by_difficulty,
            "question bank stats"
        );

        let question = match selector.select_next() {
            Ok(q) => q.clone(),
            Err(Error::Exhausted { total }) => {
                let message = format!(
                    "All {total} questions have been published. Add new questions or reset the usage ledger."
                );
                self.alert("No unused questions available", &message).await;
                return Ok(RunOutcome::Exhausted { total });
            }
            Err(err) => return Err(err),
        };
        info!(
            id = question.id,
            difficulty = %question.difficulty,
            question = %truncate(&question.question, 50),
            "step 1: selected question"
        );

        let metadata = PublishMetadata::with_strategies(
            &question,
            &self.config.caption_variant,
            &self.config.description_variant,
        );
        info!(caption = %metadata.caption, hashtags = metadata.hashtags.len(), "step 2: built metadata");

        let media = match bounded(timeout, self.renderer.render(&question, &metadata)).await {
            Ok(media) => media,
            Err(err) => {
                error!(id = question.id, %err, "render failed");
                let message = format!("question {}: {err}", question.id);
                self.alert("Render failed", &message).await;
                return Err(Error::Stage {
                    stage: "render",
                    detail: err.to_string(),
                });
            }
        };
        info!(path = %media.path.display(), "step 3: rendered media");

        let mut results = Vec::with_capacity(self.publishers.len());
        for publisher in &self.publishers {
            let platform = publisher.platform().to_string();
            let result = match bounded(timeout, publisher.publish(&media, &metadata)).await {
                Ok(receipt) => {
                    info!(%platform, "upload succeeded");
                    PlatformResult {
                        platform,
                        receipt: Some(receipt),
                        error: None,
                    }
                }
                Err(err) => {
                    error!(%platform, %err, "upload failed");
                    PlatformResult {
                        platform,
                        receipt: None,
                        error: Some(err.to_string()),
                    }
                }
            };
            results.push(result);
        }

        let marked = if self.config.mark_policy.is_satisfied(&results) {
            if let Err(err) = self.ledger.mark_used(question.id) {
                let message = format!("question {} was published but not marked: {err}", question.id);
                self.alert("Usage ledger write failed", &message).await;
                return Err(err);
            }
            true
        } else {
            warn!(id = question.id, policy = ?self.config.mark_policy, "question not marked as used");
            false
        };

        let report = RunReport {
            question_id: question.id,
            difficulty: question.difficulty.clone(),
            caption: metadata.caption.clone(),
            results,
            marked,
        };
        if let Err(err) = bounded(timeout, self.notifier.notify_run(&report)).await {
            warn!(%err, "run notification failed");
        }

        clear_dir(&self.config.temp_dir).await;

        Ok(if marked {
            RunOutcome::Published(report)
        } else {
            RunOutcome::NotMarked(report)
        })
    }

    async fn alert(&self, title: &str, message: &str) {
        let timeout = self.config.stage_timeout();
        if let Err(err) = bounded(timeout, self.notifier.alert(title, message)).await {
            warn!(%title, %err, "alert delivery failed");
        }
    }
}

async fn bounded<T>(
    timeout: Duration,
    fut: impl Future<Output = std::result::Result<T, StageError>>,
) -> std::result::Result<T, StageError> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(StageError::new(format!("timed out after {}s", timeout.as_secs_f64()))),
    }
}

/// Removes the files directly inside `dir`, logging anything that cannot be deleted.
async fn clear_dir(dir: &Path) {
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path.is_file() {
            if let Err(err) = tokio::fs::remove_file(&path).await {
                warn!(path = %path.display(), %err, "could not delete temp file");
            }
        }
    }
}
