//! Runtime configuration loaded from `quizreel.toml`.

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    core::{ledger::UsageLedger, store::QuestionStore, store::ValidationPolicy},
    error::{Error, Result},
    persist::{LedgerSink, LogFileSink, SqliteSink},
    pipeline::MarkPolicy,
    publish::VariantChoice,
};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "quizreel.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub pipeline: PipelineConfig,
    /// External render command; without it `run` cannot produce media.
    pub renderer: Option<RendererConfig>,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Question file (JSON array).
    pub questions: PathBuf,
    /// Usage ledger location: a text log or a SQLite database depending on `ledger_backend`.
    pub used_log: PathBuf,
    pub ledger_backend: LedgerBackend,
    pub validation: ValidationPolicy,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            questions: PathBuf::from("data/questions.json"),
            used_log: PathBuf::from("data/used_questions.log"),
            ledger_backend: LedgerBackend::Log,
            validation: ValidationPolicy::Strict,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerBackend {
    #[default]
    Log,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Scratch space for render inputs; emptied after each run.
    pub temp_dir: PathBuf,
    pub video_dir: PathBuf,
    /// Upper bound for each render, upload, and notification call.
    pub stage_timeout_secs: u64,
    pub mark_policy: MarkPolicy,
    pub caption_variant: VariantChoice,
    pub description_variant: VariantChoice,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            temp_dir: PathBuf::from("temp"),
            video_dir: PathBuf::from("video"),
            stage_timeout_secs: 300,
            mark_policy: MarkPolicy::AnySuccess,
            caption_variant: VariantChoice::First,
            description_variant: VariantChoice::First,
        }
    }
}

impl PipelineConfig {
    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RendererConfig {
    pub program: String,
    /// Arguments; `{input}` and `{output}` are replaced with the question JSON and video paths.
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    pub json: bool,
    /// Plain-text run log kept alongside stderr output.
    pub file: Option<PathBuf>,
    /// Runs retained in `file`, counting the current one.
    pub keep_runs: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
            keep_runs: 5,
        }
    }
}

impl Config {
    /// Reads `path`, expanding `${VAR}` values, then applies `QUIZREEL_*` overrides.
    /// A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_env(path, |name| std::env::var(name).ok())
    }

    pub fn load_with_env(path: impl AsRef<Path>, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = match fs::read_to_string(path) {
            Ok(content) => Self::parse(path, &content, &env)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "config file not found, using defaults");
                Self::default()
            }
            Err(err) => {
                return Err(Error::Config {
                    path: path.to_path_buf(),
                    detail: err.to_string(),
                });
            }
        };
        config.apply_env_overrides(&env);
        Ok(config)
    }

    fn parse(path: &Path, content: &str, env: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config_err = |detail: String| Error::Config {
            path: path.to_path_buf(),
            detail,
        };
        let mut value: toml::Value = toml::from_str(content).map_err(|e| config_err(e.to_string()))?;
        expand_env_vars(&mut value, env);
        value.try_into().map_err(|e: toml::de::Error| config_err(e.to_string()))
    }

    fn apply_env_overrides(&mut self, env: &impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("QUIZREEL_QUESTIONS") {
            self.data.questions = PathBuf::from(v);
        }
        if let Some(v) = env("QUIZREEL_USED_LOG") {
            self.data.used_log = PathBuf::from(v);
        }
        if let Some(v) = env("QUIZREEL_LOG_LEVEL") {
            self.logging.level = v;
        }
    }

    pub fn load_store(&self) -> Result<QuestionStore> {
        QuestionStore::load(&self.data.questions, self.data.validation)
    }

    pub fn ledger_sink(&self) -> Result<Box<dyn LedgerSink>> {
        Ok(match self.data.ledger_backend {
            LedgerBackend::Log => Box::new(LogFileSink::new(&self.data.used_log)),
            LedgerBackend::Sqlite => Box::new(SqliteSink::open(&self.data.used_log)?),
        })
    }

    pub fn open_ledger(&self) -> Result<UsageLedger> {
        UsageLedger::open_boxed(self.ledger_sink()?)
    }
}

/// Replaces every string of the exact form `${NAME}` with the variable's value.
/// Unset variables leave the placeholder untouched.
pub fn expand_env_vars(value: &mut toml::Value, env: &impl Fn(&str) -> Option<String>) {
    match value {
        toml::Value::String(s) => {
            if let Some(name) = s.strip_prefix("${").and_then(|r| r.strip_suffix('}')) {
                if let Some(resolved) = env(name) {
                    *s = resolved;
                }
            }
        }
        toml::Value::Array(items) => items.iter_mut().for_each(|v| expand_env_vars(v, env)),
        toml::Value::Table(table) => table.iter_mut().for_each(|(_, v)| expand_env_vars(v, env)),
        _ => {}
    }
}
