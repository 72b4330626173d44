use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

use crate::model::config::FinderConfig;

#[derive(Debug, Error)]
pub enum FinderError {
    #[error("no note selected")]
    SelectionAborted,

    #[error("cannot launch {program}: {source}")]
    Launch { program: String, source: io::Error },
}

/// Bridge to an external interactive fuzzy selector such as `fzf`.
///
/// The selector runs in the notes directory, lists it on its own and talks
/// to the user through the controlling terminal. Only its stdout is
/// captured: the chosen entry, newline terminated.
#[derive(Debug, Clone)]
pub struct Finder {
    dir: PathBuf,
    program: String,
    args: Vec<String>,
}

impl Finder {
    pub fn new(dir: impl Into<PathBuf>, config: &FinderConfig) -> Self {
        Self {
            dir: dir.into(),
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Block until the user picks a note; return its path inside the notes
    /// directory.
    pub fn select_note(&self) -> Result<PathBuf, FinderError> {
        tracing::info!(program = %self.program, dir = %self.dir.display(), "launching finder");

        let output = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.dir)
            .stdin(Stdio::inherit())
            .stderr(Stdio::inherit())
            .stdout(Stdio::piped())
            .output()
            .map_err(|source| FinderError::Launch {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            tracing::info!(status = %output.status, "finder aborted");
            return Err(FinderError::SelectionAborted);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let selected = stdout.trim_end_matches(['\n', '\r']);
        if selected.is_empty() {
            tracing::info!("finder returned nothing");
            return Err(FinderError::SelectionAborted);
        }

        tracing::info!(selected, "finder selected note");
        Ok(self.dir.join(selected))
    }
}
