use std::fs;
use std::io;
use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::dialog::SaveDialog;
use crate::request::{FileFilter, SaveOptions, SaveRequest};

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save cancelled by user")]
    Cancelled,
    #[error("failed to decode base64 payload: {0}")]
    Decode(#[source] base64::DecodeError),
    #[error("failed to serialize content: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// 透過存檔對話框寫入檔案。 / Writes content to wherever the save dialog points.
#[derive(Debug, Clone)]
pub struct FileSaver<D> {
    dialog: D,
}

impl<D: SaveDialog> FileSaver<D> {
    pub fn new(dialog: D) -> Self {
        Self { dialog }
    }

    /// 處理一次存檔請求並回傳實際寫入的路徑。 / Handles one request and returns the path written.
    pub fn save(&self, request: &SaveRequest) -> Result<PathBuf, SaveError> {
        let path = self
            .dialog
            .choose_path(&request.options)
            .filter(|path| !path.as_os_str().is_empty())
            .ok_or(SaveError::Cancelled)?;

        let data = if request.is_binary {
            BASE64
                .decode(strip_data_url(&request.content).trim())
                .map_err(SaveError::Decode)?
        } else {
            request.content.clone().into_bytes()
        };

        fs::write(&path, &data).map_err(|source| SaveError::Write {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), bytes = data.len(), "saved file");
        Ok(path)
    }

    pub fn save_text(&self, content: &str, filename: &str) -> Result<PathBuf, SaveError> {
        self.save_text_with(
            content,
            SaveOptions::new("Save File", filename)
                .with_filters(vec![FileFilter::text(), FileFilter::all()]),
        )
    }

    /// 以兩格縮排輸出 JSON。 / Saves a value as JSON pretty-printed with two-space indent.
    pub fn save_json<T: Serialize + ?Sized>(
        &self,
        value: &T,
        filename: &str,
    ) -> Result<PathBuf, SaveError> {
        let content = serde_json::to_string_pretty(value).map_err(SaveError::Serialize)?;
        self.save_text_with(
            &content,
            SaveOptions::new("Save JSON File", filename).with_filters(vec![
                FileFilter::json(),
                FileFilter::text(),
                FileFilter::all(),
            ]),
        )
    }

    pub fn save_xml(&self, content: &str, filename: &str) -> Result<PathBuf, SaveError> {
        self.save_text_with(
            content,
            SaveOptions::new("Save XML File", filename).with_filters(vec![
                FileFilter::xml(),
                FileFilter::text(),
                FileFilter::all(),
            ]),
        )
    }

    /// Saves a base64 image, with or without a `data:` URL prefix.
    pub fn save_image(&self, base64: &str, filename: &str) -> Result<PathBuf, SaveError> {
        let options = SaveOptions::new("Save Image", filename).with_filters(vec![
            FileFilter::png(),
            FileFilter::jpeg(),
            FileFilter::images(),
            FileFilter::all(),
        ]);
        self.save(&SaveRequest::binary(base64, options))
    }

    fn save_text_with(&self, content: &str, options: SaveOptions) -> Result<PathBuf, SaveError> {
        debug!(title = %options.title, "saving text");
        self.save(&SaveRequest::text(content, options))
    }
}

fn strip_data_url(content: &str) -> &str {
    match content.split_once(";base64,") {
        Some((prefix, payload)) if prefix.starts_with("data:") => payload,
        _ => content,
    }
}
