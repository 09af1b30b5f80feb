use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use devtools_core::{AppState, StatePersistence};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::paths::{app_data_dir, STATE_FILE};
use crate::storage::{backup_file, write_atomic};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no application data directory is available on this platform")]
    NoDataDir,
    #[error("failed to read state {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse state {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize state {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write state {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// 以 JSON 檔案保存整個狀態樹。 / Keeps the whole state tree in one JSON file.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 使用指定資料夾中的 `tools.json`。 / Uses `tools.json` inside the given directory.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(STATE_FILE))
    }

    /// 使用平台預設資料夾。 / Uses the platform application data directory.
    pub fn open_default() -> Result<Self, StoreError> {
        app_data_dir().map(Self::in_dir).ok_or(StoreError::NoDataDir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the raw snapshot. A missing file is `Ok(None)`.
    pub fn read_snapshot(&self) -> Result<Option<Value>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            })
    }

    pub fn write(&self, state: &AppState) -> Result<(), StoreError> {
        let payload =
            serde_json::to_string_pretty(state).map_err(|source| StoreError::Serialize {
                path: self.path.clone(),
                source,
            })?;
        write_atomic(&self.path, payload.as_bytes()).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl StatePersistence for StateStore {
    type Error = StoreError;

    fn load(&self) -> Option<Value> {
        match self.read_snapshot() {
            Ok(Some(snapshot)) => Some(snapshot),
            Ok(None) => {
                debug!(path = %self.path.display(), "state file not found");
                None
            }
            Err(err @ StoreError::Parse { .. }) => {
                match backup_file(&self.path) {
                    Ok(backup) => {
                        warn!(error = %err, backup = %backup.display(), "state file is not valid JSON, starting from defaults")
                    }
                    Err(backup_err) => {
                        warn!(error = %err, backup_error = %backup_err, "state file is not valid JSON and could not be backed up")
                    }
                }
                None
            }
            Err(err) => {
                warn!(error = %err, "failed to read state, starting from defaults");
                None
            }
        }
    }

    fn save(&self, state: &AppState) -> Result<(), Self::Error> {
        self.write(state)
    }
}
