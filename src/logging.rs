//! `tracing` subscriber setup for the binary.

use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::Path,
    sync::Mutex,
};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Line fragment written to the run log at the start of every process.
pub const RUN_MARKER: &str = "quizreel run started";

/// Installs a global subscriber. `RUST_LOG` takes precedence over `config.level`.
///
/// With `config.file` set, older runs are pruned from the file and a plain-text
/// copy of every event is appended to it.
///
/// Returns `Ok(false)` when a subscriber was already installed.
pub fn init(config: &LoggingConfig) -> io::Result<bool> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = match &config.file {
        Some(path) => {
            let file = open_run_log(path, config.keep_runs)?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    let installed = if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(fmt::layer().json())
            .try_init()
            .is_ok()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(fmt::layer().with_target(false))
            .try_init()
            .is_ok()
    };
    Ok(installed)
}

fn open_run_log(path: &Path, keep_runs: usize) -> io::Result<fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    prune_runs(path, keep_runs)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "===== {RUN_MARKER} (pid {}) =====", std::process::id())?;
    Ok(file)
}

/// Drops all but the last `keep_runs - 1` runs from the log at `path`, leaving
/// room for the run about to start. Returns the number of runs removed.
///
/// Runs are delimited by lines containing [`RUN_MARKER`]. A missing file is
/// left alone.
pub fn prune_runs(path: impl AsRef<Path>, keep_runs: usize) -> io::Result<usize> {
    let path = path.as_ref();
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(err) => return Err(err),
    };
    let content = String::from_utf8_lossy(&bytes);

    let mut starts = Vec::new();
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        if line.contains(RUN_MARKER) {
            starts.push(offset);
        }
        offset += line.len();
    }

    let keep = keep_runs.saturating_sub(1);
    if starts.len() <= keep {
        return Ok(0);
    }
    let cut = if keep == 0 { content.len() } else { starts[starts.len() - keep] };
    fs::write(path, &content[cut..])?;
    Ok(starts.len() - keep)
}

/// Shortens `text` to `max_chars` characters for log lines.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        text.chars().take(max_chars).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
