use serde::{Deserialize, Serialize};

const MIN_FONT_SIZE: u32 = 10;
const MAX_FONT_SIZE: u32 = 32;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    #[default]
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default)]
    pub theme: ThemeMode,
    #[serde(default = "default_font_size")]
    pub editor_font_size: u32,
    #[serde(default = "default_true")]
    pub check_updates_on_startup: bool,
}

fn default_font_size() -> u32 {
    14
}

fn default_true() -> bool {
    true
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme: ThemeMode::default(),
            editor_font_size: default_font_size(),
            check_updates_on_startup: true,
        }
    }
}

impl AppSettings {
    pub fn sanitize(&mut self) {
        if self.editor_font_size == 0 {
            self.editor_font_size = default_font_size();
        }
        self.editor_font_size = self.editor_font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
    }
}
