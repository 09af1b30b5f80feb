use std::path::PathBuf;

use crate::request::SaveOptions;

/// Native save dialog. `None` means the user cancelled.
pub trait SaveDialog {
    fn choose_path(&self, options: &SaveOptions) -> Option<PathBuf>;
}

/// 不詢問使用者，直接回傳預先決定的路徑。 / Answers every request with a path decided up front.
#[derive(Debug, Clone, Default)]
pub struct FixedPathDialog {
    path: Option<PathBuf>,
}

impl FixedPathDialog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A dialog the user always dismisses.
    pub fn cancelled() -> Self {
        Self { path: None }
    }
}

impl SaveDialog for FixedPathDialog {
    fn choose_path(&self, _options: &SaveOptions) -> Option<PathBuf> {
        self.path.clone()
    }
}
