//! State records of the single-document tools.
//!
//! Each record is a flat set of input/result fields owned by one tool. The
//! conversion algorithms themselves live outside this crate; only what a tool
//! shows between sessions is kept here.

use serde::{Deserialize, Serialize};

use crate::state::slot::ToolSlot;

/// A tool whose state is a single flat record in the application state tree.
pub trait ToolState: Clone + Default + PartialEq + ToolSlot {
    /// Key of the record in the persisted snapshot.
    const KEY: &'static str;
}

const QR_CODE_GREETING: &str = "I am the qrcode generator of devTools😁";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QrCodeState {
    pub text: String,
}

impl Default for QrCodeState {
    fn default() -> Self {
        Self {
            text: QR_CODE_GREETING.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextDiffState {
    pub old_text: String,
    pub new_text: String,
    pub ignore_whitespace: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UrlConverterState {
    pub raw_text: String,
    pub result: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlViewMode {
    #[default]
    Json,
    Table,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UrlParserState {
    pub url_text: String,
    pub view_mode: UrlViewMode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Base64TextState {
    pub raw_text: String,
    pub result: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Base64ImageState {
    pub image_url: String,
    pub base64_result: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NumberConverterState {
    pub input_value: String,
    pub input_base: String,
}

impl Default for NumberConverterState {
    fn default() -> Self {
        Self {
            input_value: String::new(),
            input_base: "10".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeConverterState {
    pub timestamp: String,
    pub datetime: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CurlConverterState {
    pub command: String,
    pub language: String,
}

impl Default for CurlConverterState {
    fn default() -> Self {
        Self {
            command: String::new(),
            language: "go".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JwtDecoderState {
    pub token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnicodeConverterState {
    pub raw_text: String,
    pub result: String,
}
