use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// 先寫入暫存檔再改名，避免留下半寫入的檔案。 / Writes through a sibling temp file and renames it into place.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, data)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// 將無法解析的檔案複製為 `.bak`。 / Copies an unreadable file aside as `.bak`.
pub(crate) fn backup_file(path: &Path) -> io::Result<PathBuf> {
    let backup = path.with_extension("bak");
    fs::copy(path, &backup)?;
    Ok(backup)
}
