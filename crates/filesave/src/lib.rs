//! File-save boundary: request types, the dialog port and the writer.
//! 檔案儲存邊界。

pub mod dialog;
pub mod request;
pub mod saver;

pub use dialog::{FixedPathDialog, SaveDialog};
pub use request::{FileFilter, SaveOptions, SaveRequest};
pub use saver::{FileSaver, SaveError};
