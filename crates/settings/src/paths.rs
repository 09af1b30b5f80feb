use std::path::PathBuf;

/// 應用程式資料夾名稱。 / Directory name under the platform configuration root.
pub const APP_DIR_NAME: &str = "dev-tools";
pub const STATE_FILE: &str = "tools.json";
pub const WINDOW_FILE: &str = "window.json";

/// 平台設定目錄下的應用程式資料夾。 / Per-user application data directory, when the platform defines one.
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|root| root.join(APP_DIR_NAME))
}
