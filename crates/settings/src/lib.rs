pub mod paths;
pub mod state_store;
mod storage;
pub mod window;

pub use paths::{app_data_dir, APP_DIR_NAME, STATE_FILE, WINDOW_FILE};
pub use state_store::{StateStore, StoreError};
pub use window::{WindowSettings, WindowSettingsError, WindowSettingsStore};
