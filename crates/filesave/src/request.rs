use serde::{Deserialize, Serialize};

/// 存檔對話框的檔案類型過濾。 / File-type filter offered by the save dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFilter {
    pub display_name: String,
    /// Semicolon-separated glob list, e.g. `*.png;*.jpg`.
    pub pattern: String,
}

impl FileFilter {
    pub fn new(display_name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            pattern: pattern.into(),
        }
    }

    pub fn png() -> Self {
        Self::new("PNG Image (*.png)", "*.png")
    }

    pub fn jpeg() -> Self {
        Self::new("JPEG Image (*.jpg)", "*.jpg")
    }

    pub fn images() -> Self {
        Self::new("Image Files (*.png;*.jpg;*.gif)", "*.png;*.jpg;*.gif")
    }

    pub fn text() -> Self {
        Self::new("Text Files (*.txt)", "*.txt")
    }

    pub fn json() -> Self {
        Self::new("JSON Files (*.json)", "*.json")
    }

    pub fn xml() -> Self {
        Self::new("XML Files (*.xml)", "*.xml")
    }

    pub fn all() -> Self {
        Self::new("All Files (*.*)", "*.*")
    }

    /// 檔名是否符合任一樣式。 / Whether a file name matches one of the patterns.
    pub fn matches(&self, file_name: &str) -> bool {
        let lower = file_name.to_ascii_lowercase();
        self.pattern.split(';').map(str::trim).any(|glob| match glob {
            "*" | "*.*" => true,
            _ => glob
                .strip_prefix('*')
                .map(|suffix| lower.ends_with(&suffix.to_ascii_lowercase()))
                .unwrap_or_else(|| lower == glob.to_ascii_lowercase()),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveOptions {
    pub title: String,
    pub default_filename: String,
    pub filters: Vec<FileFilter>,
}

impl SaveOptions {
    pub fn new(title: impl Into<String>, default_filename: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            default_filename: default_filename.into(),
            filters: Vec::new(),
        }
    }

    pub fn with_filters(mut self, filters: Vec<FileFilter>) -> Self {
        self.filters = filters;
        self
    }
}

/// 一次存檔請求。 / One save request crossing the boundary.
///
/// With `is_binary` set, `content` carries base64 text that is decoded before
/// writing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub content: String,
    #[serde(default)]
    pub is_binary: bool,
    #[serde(default)]
    pub options: SaveOptions,
}

impl SaveRequest {
    pub fn text(content: impl Into<String>, options: SaveOptions) -> Self {
        Self {
            content: content.into(),
            is_binary: false,
            options,
        }
    }

    pub fn binary(base64: impl Into<String>, options: SaveOptions) -> Self {
        Self {
            content: base64.into(),
            is_binary: true,
            options,
        }
    }
}
