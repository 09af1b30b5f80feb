//! Per-tab documents of the structured-data editors.
//! 結構化資料編輯器的分頁文件。

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::processor::{self, CodeStyle, ProcessError};
use crate::state::slot::EditorSlot;

/// 支援多分頁的編輯器家族。 / Editor families that keep several documents open at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorFamily {
    Json,
    Xml,
}

impl EditorFamily {
    pub const ALL: [EditorFamily; 2] = [EditorFamily::Json, EditorFamily::Xml];

    /// 導覽路徑中的工具區段。 / Route segment naming the tool.
    pub fn route(self) -> &'static str {
        match self {
            EditorFamily::Json => "json-editor",
            EditorFamily::Xml => "xml-editor",
        }
    }

    pub fn from_route(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|family| family.route() == segment)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EditorFamily::Json => "json",
            EditorFamily::Xml => "xml",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            EditorFamily::Json => "JSON Editor",
            EditorFamily::Xml => "XML Editor",
        }
    }

    /// 匯出時建議的檔名。 / Filename suggested when exporting a tab.
    pub fn default_filename(self) -> &'static str {
        match self {
            EditorFamily::Json => "data.json",
            EditorFamily::Xml => "data.xml",
        }
    }
}

impl fmt::Display for EditorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document held by a single editor tab.
///
/// `code` is free text; a tab holding invalid JSON or XML is still a valid
/// tab. The settings shape is fixed per family.
pub trait TabDocument:
    Clone + Default + PartialEq + fmt::Debug + Serialize + DeserializeOwned + EditorSlot
{
    const FAMILY: EditorFamily;

    fn code(&self) -> &str;

    fn set_code(&mut self, code: String);

    /// 依分頁設定重排內容。 / Rewrites the code in `style` under this tab's settings.
    fn restyle(&self, style: CodeStyle) -> Result<String, ProcessError>;

    /// Whether edited code is pretty-printed before it is stored.
    fn formats_on_edit(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JsonTabSettings {
    pub auto_decode_unicode: bool,
    pub remove_escapes: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JsonTabDocument {
    pub code: String,
    pub settings: JsonTabSettings,
}

impl TabDocument for JsonTabDocument {
    const FAMILY: EditorFamily = EditorFamily::Json;

    fn code(&self) -> &str {
        &self.code
    }

    fn set_code(&mut self, code: String) {
        self.code = code;
    }

    fn restyle(&self, style: CodeStyle) -> Result<String, ProcessError> {
        match style {
            CodeStyle::Pretty => processor::format_json(&self.code, &self.settings),
            CodeStyle::Compact => processor::compress_json(&self.code, &self.settings),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct XmlTabSettings {
    pub auto_format: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct XmlTabDocument {
    pub code: String,
    pub settings: XmlTabSettings,
}

impl TabDocument for XmlTabDocument {
    const FAMILY: EditorFamily = EditorFamily::Xml;

    fn code(&self) -> &str {
        &self.code
    }

    fn set_code(&mut self, code: String) {
        self.code = code;
    }

    fn restyle(&self, style: CodeStyle) -> Result<String, ProcessError> {
        match style {
            CodeStyle::Pretty => processor::format_xml(&self.code),
            CodeStyle::Compact => processor::compress_xml(&self.code),
        }
    }

    fn formats_on_edit(&self) -> bool {
        self.settings.auto_format
    }
}
