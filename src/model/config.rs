use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = ".yawn.toml";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    #[serde(alias = "General")]
    pub general: GeneralConfig,
    #[serde(alias = "Finder")]
    pub finder: FinderConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GeneralConfig {
    /// Directory holding one file per note.
    #[serde(alias = "NoteLocation", alias = "notelocation")]
    pub note_location: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            note_location: "~/yawn".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FinderConfig {
    /// Interactive selector launched by `yawn find`.
    #[serde(alias = "Program")]
    pub program: String,
    /// Presentation flags passed to the selector.
    #[serde(alias = "Args")]
    pub args: Vec<String>,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            program: "fzf".to_string(),
            args: ["--ansi", "--layout=reverse", "--border", "--height=90%", "--cycle"]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl AppConfig {
    /// Load configuration: built-in defaults, overlaid by `$HOME/.yawn.toml`
    /// when it exists, or by `path` when given (which must exist).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let source = match path {
            Some(path) => Some(path.to_path_buf()),
            None => dirs_home()
                .map(|home| home.join(DEFAULT_CONFIG_FILE))
                .filter(|candidate| candidate.exists()),
        };

        let mut config = match &source {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("cannot read config file {}", path.display()))?;
                let config = Self::parse(&raw)
                    .with_context(|| format!("cannot parse config file {}", path.display()))?;
                tracing::info!(path = %path.display(), "loaded config");
                config
            }
            None => {
                tracing::info!("no config file found, using defaults");
                Self::default()
            }
        };

        // Expand ~ in note_location
        if config.general.note_location.starts_with('~') {
            let home = dirs_home().ok_or_else(|| anyhow!("cannot determine home directory"))?;
            config.general.note_location =
                config
                    .general
                    .note_location
                    .replacen('~', &home.to_string_lossy(), 1);
        }

        Ok(config)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn note_location(&self) -> PathBuf {
        PathBuf::from(&self.general.note_location)
    }
}

fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}
