use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::paths::WINDOW_FILE;
use crate::storage::write_atomic;

const DEFAULT_WIDTH: i32 = 1000;
const DEFAULT_HEIGHT: i32 = 700;
/// Position value meaning "let the window manager decide".
const UNSET_POSITION: i32 = -1;

#[derive(Debug, Error)]
pub enum WindowSettingsError {
    #[error("failed to serialize window settings {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write window settings {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// 主視窗位置與大小。 / Main window geometry restored on the next launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub width: i32,
    pub height: i32,
    pub x: i32,
    pub y: i32,
    pub maximised: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            x: UNSET_POSITION,
            y: UNSET_POSITION,
            maximised: false,
        }
    }
}

impl WindowSettings {
    pub fn sanitize(&mut self) {
        if self.width <= 0 {
            self.width = DEFAULT_WIDTH;
        }
        if self.height <= 0 {
            self.height = DEFAULT_HEIGHT;
        }
    }

    pub fn has_position(&self) -> bool {
        self.x != UNSET_POSITION || self.y != UNSET_POSITION
    }
}

#[derive(Debug)]
pub struct WindowSettingsStore {
    path: PathBuf,
    data: WindowSettings,
}

impl WindowSettingsStore {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::load(dir.as_ref().join(WINDOW_FILE))
    }

    /// 讀取視窗設定；任何錯誤都回到預設值。 / Loads geometry; any failure yields defaults.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut data = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "invalid window settings, using defaults");
                WindowSettings::default()
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => WindowSettings::default(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read window settings, using defaults");
                WindowSettings::default()
            }
        };
        data.sanitize();
        Self { path, data }
    }

    pub fn settings(&self) -> &WindowSettings {
        &self.data
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn update<F>(&mut self, op: F) -> Result<(), WindowSettingsError>
    where
        F: FnOnce(&mut WindowSettings),
    {
        op(&mut self.data);
        self.data.sanitize();
        self.save()
    }

    pub fn save(&self) -> Result<(), WindowSettingsError> {
        let payload = serde_json::to_string_pretty(&self.data).map_err(|source| {
            WindowSettingsError::Serialize {
                path: self.path.clone(),
                source,
            }
        })?;
        write_atomic(&self.path, payload.as_bytes()).map_err(|source| WindowSettingsError::Write {
            path: self.path.clone(),
            source,
        })
    }
}
