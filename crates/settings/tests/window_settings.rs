use std::fs;

use devtools_settings::{WindowSettings, WindowSettingsStore};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

#[test]
fn missing_file_returns_defaults() {
    let temp = tempdir().expect("tempdir");
    let store = WindowSettingsStore::in_dir(temp.path());

    assert_eq!(*store.settings(), WindowSettings::default());
    assert_eq!(store.settings().width, 1000);
    assert_eq!(store.settings().height, 700);
    assert_eq!((store.settings().x, store.settings().y), (-1, -1));
}

#[test]
fn update_persists_geometry() {
    let temp = tempdir().expect("tempdir");
    let mut store = WindowSettingsStore::in_dir(temp.path());
    store
        .update(|window| {
            window.width = 1280;
            window.height = 800;
            window.x = 40;
            window.y = 60;
            window.maximised = true;
        })
        .expect("save");

    let reloaded = WindowSettingsStore::in_dir(temp.path());
    assert_eq!(
        *reloaded.settings(),
        WindowSettings {
            width: 1280,
            height: 800,
            x: 40,
            y: 60,
            maximised: true,
        }
    );
}

#[test]
fn unreadable_or_invalid_values_fall_back() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("window.json");

    fs::write(&path, "garbage").expect("write");
    assert_eq!(*WindowSettingsStore::load(&path).settings(), WindowSettings::default());

    fs::write(&path, r#"{ "width": 0, "height": -5, "x": 12 }"#).expect("write");
    let store = WindowSettingsStore::load(&path);
    assert_eq!(store.settings().width, 1000);
    assert_eq!(store.settings().height, 700);
    assert_eq!(store.settings().x, 12);
    assert_eq!(store.settings().y, -1);
}
