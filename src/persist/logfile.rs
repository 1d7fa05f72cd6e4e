//! Plain-text ledger: one decimal question id per line.

use std::{
    fs::{self, OpenOptions},
    io::{self, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use tracing::info;

use crate::types::QuestionId;

use super::{LedgerSink, PersistError, PersistResult};

/// Line-oriented ledger file, compatible with hand-edited `used_questions.log` files.
#[derive(Debug, Clone)]
pub struct LogFileSink {
    path: PathBuf,
}

impl LogFileSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LedgerSink for LogFileSink {
    fn load_ids(&mut self) -> PersistResult<Vec<QuestionId>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no usage ledger found, starting fresh");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };

        let mut ids = Vec::new();
        for (i, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let id = line.parse::<QuestionId>().map_err(|_| PersistError::Corrupt {
                line: i + 1,
                content: line.to_string(),
            })?;
            ids.push(id);
        }
        Ok(ids)
    }

    fn append(&mut self, id: QuestionId) -> PersistResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;
        // A hand-edited log may lack the final newline; never glue two ids together.
        if !ends_with_newline(&mut file)? {
            writeln!(file)?;
        }
        writeln!(file, "{id}")?;
        file.sync_all()?;
        Ok(())
    }

    fn clear(&mut self) -> PersistResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// True for an empty file or one whose last byte is `\n`.
fn ends_with_newline(file: &mut fs::File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
