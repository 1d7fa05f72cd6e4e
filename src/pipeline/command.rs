//! Renderer that shells out to an external image/video tool.

use std::path::{Path, PathBuf};

use serde_json::json;
use tokio::{fs, process::Command};
use tracing::{debug, info};

use crate::{
    config::{PipelineConfig, RendererConfig},
    publish::{PublishMetadata, solution_text},
    question::Question,
};

use super::stages::{MediaArtifact, Renderer, StageError, StageFuture};

/// Writes the question as JSON to the temp dir, then runs `program` to produce
/// `video_<id>.mp4` in the video dir.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
    temp_dir: PathBuf,
    video_dir: PathBuf,
}

impl CommandRenderer {
    pub fn new(renderer: &RendererConfig, pipeline: &PipelineConfig) -> Self {
        Self {
            program: renderer.program.clone(),
            args: renderer.args.clone(),
            temp_dir: pipeline.temp_dir.clone(),
            video_dir: pipeline.video_dir.clone(),
        }
    }

    fn expand_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let input = input.display().to_string();
        let output = output.display().to_string();
        self.args
            .iter()
            .map(|a| a.replace("{input}", &input).replace("{output}", &output))
            .collect()
    }
}

impl Renderer for CommandRenderer {
    fn render<'a>(&'a self, question: &'a Question, metadata: &'a PublishMetadata) -> StageFuture<'a, MediaArtifact> {
        Box::pin(async move {
            fs::create_dir_all(&self.temp_dir).await?;
            fs::create_dir_all(&self.video_dir).await?;

            let input = self.temp_dir.join(format!("question_{}.json", question.id));
            let output = self.video_dir.join(format!("video_{}.mp4", question.id));

            let job = json!({
                "question": question,
                "metadata": metadata,
                "solution": solution_text(question),
            });
            let payload = serde_json::to_vec_pretty(&job).map_err(|e| StageError::new(e.to_string()))?;
            fs::write(&input, payload).await?;

            let args = self.expand_args(&input, &output);
            debug!(program = %self.program, ?args, "running renderer");
            let result = Command::new(&self.program)
                .args(&args)
                .kill_on_drop(true)
                .output()
                .await
                .map_err(|e| StageError::new(format!("cannot start `{}`: {e}", self.program)))?;

            if !result.status.success() {
                let stderr = String::from_utf8_lossy(&result.stderr);
                let lines: Vec<&str> = stderr.lines().collect();
                let tail = lines[lines.len().saturating_sub(5)..].join("\n");
                return Err(StageError::new(format!(
                    "`{}` exited with {}: {}",
                    self.program, result.status, tail
                )));
            }

            let size = fs::metadata(&output)
                .await
                .map(|m| m.len())
                .map_err(|_| StageError::new(format!("renderer produced no file at {}", output.display())))?;
            if size == 0 {
                return Err(StageError::new(format!("rendered file {} is empty", output.display())));
            }

            info!(question = question.id, path = %output.display(), bytes = size, "rendered media");
            Ok(MediaArtifact {
                question_id: question.id,
                path: output,
            })
        })
    }
}
