//! Tolerant decoding of persisted snapshots.
//!
//! Every top-level subtree is decoded on its own. A subtree that is missing
//! keeps its default. When a record fails to decode as a whole, its fields are
//! replayed one by one onto the default record: fields that decode are kept,
//! the offending ones keep their defaults and are reported as
//! [`SnapshotIssue`]s. One damaged value never discards its siblings.

use std::collections::HashSet;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{AppState, STATE_SCHEMA_VERSION};
use crate::document::TabDocument;
use crate::menu::{MenuConfig, MenuItem};
use crate::tab_id::{TabId, DEFAULT_TAB_ID};
use crate::tabs::TabRegistry;

/// Schema version assumed for snapshots without a `version` key.
const LEGACY_SCHEMA_VERSION: u32 = 1;

/// Keys of the single document stored by each editor before tabs existed.
const LEGACY_DOCUMENT_KEYS: [&str; 2] = ["code", "settings"];

/// 載入快照時遇到的相容性問題。 / A compatibility problem met while decoding a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotIssue {
    pub field: String,
    pub message: String,
}

impl SnapshotIssue {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SnapshotIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// 解碼後的狀態與沿途的問題紀錄。 / Decoded state together with the issues met on the way.
#[derive(Debug, Clone)]
pub struct DecodedSnapshot {
    pub state: AppState,
    pub issues: Vec<SnapshotIssue>,
    /// Schema version the snapshot was upgraded from, when older than current.
    pub migrated_from: Option<u32>,
}

impl AppState {
    /// Decodes a persisted snapshot, filling everything missing or unreadable
    /// with schema defaults. Never fails.
    pub fn from_snapshot(snapshot: Value) -> DecodedSnapshot {
        let mut state = AppState::default();
        let mut issues = Vec::new();

        let mut object = match snapshot {
            Value::Object(object) => object,
            Value::Null => {
                return DecodedSnapshot {
                    state,
                    issues,
                    migrated_from: None,
                }
            }
            other => {
                issues.push(SnapshotIssue::new(
                    "$",
                    format!("expected an object, found {}", kind_of(&other)),
                ));
                Map::new()
            }
        };

        let version = match object.remove("version") {
            None => LEGACY_SCHEMA_VERSION,
            Some(value) => match value.as_u64().and_then(|v| u32::try_from(v).ok()) {
                Some(version) => version,
                None => {
                    issues.push(SnapshotIssue::new("version", "not a schema version number"));
                    LEGACY_SCHEMA_VERSION
                }
            },
        };
        if version > STATE_SCHEMA_VERSION {
            issues.push(SnapshotIssue::new(
                "version",
                format!("written by a newer release (schema {version}); unknown fields are ignored"),
            ));
        }

        decode_field(&mut object, "qrCode", &mut state.qr_code, &mut issues);
        decode_field(&mut object, "textDiff", &mut state.text_diff, &mut issues);
        decode_field(&mut object, "urlConverter", &mut state.url_converter, &mut issues);
        decode_field(&mut object, "urlParser", &mut state.url_parser, &mut issues);
        decode_field(&mut object, "base64Text", &mut state.base64_text, &mut issues);
        decode_field(&mut object, "base64Image", &mut state.base64_image, &mut issues);
        decode_field(&mut object, "numberConverter", &mut state.number_converter, &mut issues);
        decode_field(&mut object, "timeConverter", &mut state.time_converter, &mut issues);
        decode_field(&mut object, "curlConverter", &mut state.curl_converter, &mut issues);
        decode_field(&mut object, "jwtDecoder", &mut state.jwt_decoder, &mut issues);
        decode_field(&mut object, "unicodeConverter", &mut state.unicode_converter, &mut issues);
        decode_field(&mut object, "settings", &mut state.settings, &mut issues);

        decode_registry(&mut object, "jsonEditor", &mut state.json_editor, &mut issues);
        decode_registry(&mut object, "xmlEditor", &mut state.xml_editor, &mut issues);
        decode_current_tab(
            &mut object,
            "currentJsonEditorTab",
            &mut state.current_json_editor_tab,
            &mut issues,
        );
        decode_current_tab(
            &mut object,
            "currentXmlEditorTab",
            &mut state.current_xml_editor_tab,
            &mut issues,
        );
        decode_menu(&mut object, &mut state.menu, &mut issues);

        state.sanitize();
        DecodedSnapshot {
            state,
            issues,
            migrated_from: (version < STATE_SCHEMA_VERSION).then_some(version),
        }
    }

    /// 從文字解碼快照；無法解析時回傳預設狀態。 / Decodes snapshot text, falling back to defaults when it is not JSON.
    pub fn from_snapshot_str(text: &str) -> DecodedSnapshot {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => Self::from_snapshot(value),
            Err(err) => {
                let mut decoded = Self::from_snapshot(Value::Null);
                decoded
                    .issues
                    .push(SnapshotIssue::new("$", format!("unreadable snapshot: {err}")));
                decoded
            }
        }
    }
}

fn decode_field<T: Serialize + DeserializeOwned>(
    object: &mut Map<String, Value>,
    key: &str,
    target: &mut T,
    issues: &mut Vec<SnapshotIssue>,
) {
    let Some(value) = object.remove(key) else {
        return;
    };
    if value.is_null() {
        return;
    }
    match decode_lenient(value, &*target, key, issues) {
        Ok(decoded) => *target = decoded,
        Err(err) => issues.push(SnapshotIssue::new(key, format!("reset to default: {err}"))),
    }
}

/// Decodes `value` as a `T`, salvaging what it can.
///
/// A value that decodes as a whole is returned as is. Otherwise an object is
/// replayed field by field, recursing into nested objects, onto `base`; each
/// field that would break decoding keeps the `base` value and is reported
/// under `label.field`. Non-object values fail with the decoding error.
fn decode_lenient<T: Serialize + DeserializeOwned>(
    value: Value,
    base: &T,
    label: &str,
    issues: &mut Vec<SnapshotIssue>,
) -> Result<T, serde_json::Error> {
    let err = match T::deserialize(&value) {
        Ok(decoded) => return Ok(decoded),
        Err(err) => err,
    };
    let Value::Object(fields) = value else {
        return Err(err);
    };
    let mut merged = serde_json::to_value(base)?;
    let accepts = |candidate: &Value| T::deserialize(candidate).map(drop);
    salvage_fields(&mut merged, "", label, fields, &accepts, issues);
    T::deserialize(&merged)
}

fn salvage_fields(
    root: &mut Value,
    pointer: &str,
    label: &str,
    fields: Map<String, Value>,
    accepts: &dyn Fn(&Value) -> Result<(), serde_json::Error>,
    issues: &mut Vec<SnapshotIssue>,
) {
    for (key, incoming) in fields {
        let field_pointer = format!("{pointer}/{}", key.replace('~', "~0").replace('/', "~1"));
        let field_label = format!("{label}.{key}");

        let mut candidate = root.clone();
        if let Some(Value::Object(parent)) = candidate.pointer_mut(pointer) {
            parent.insert(key.clone(), incoming.clone());
        }
        let err = match accepts(&candidate) {
            Ok(()) => {
                *root = candidate;
                continue;
            }
            Err(err) => err,
        };

        let nested = matches!(root.pointer(&field_pointer), Some(Value::Object(_)));
        match incoming {
            Value::Object(inner) if nested => {
                salvage_fields(root, &field_pointer, &field_label, inner, accepts, issues)
            }
            _ => issues.push(SnapshotIssue::new(field_label, format!("kept default: {err}"))),
        }
    }
}

/// Decodes one editor registry tab by tab.
///
/// Releases before tabs stored a single `{ code, settings }` document under
/// the editor key; that shape becomes the `"default"` tab.
fn decode_registry<D: TabDocument>(
    object: &mut Map<String, Value>,
    key: &str,
    target: &mut TabRegistry<D>,
    issues: &mut Vec<SnapshotIssue>,
) {
    let Some(value) = object.remove(key) else {
        return;
    };
    let tabs = match value {
        Value::Object(map) if is_single_document(&map) => {
            let mut wrapped = Map::new();
            wrapped.insert(DEFAULT_TAB_ID.to_string(), Value::Object(map));
            wrapped
        }
        Value::Object(map) => map,
        Value::Null => return,
        other => {
            issues.push(SnapshotIssue::new(
                key,
                format!("expected a tab map, found {}", kind_of(&other)),
            ));
            return;
        }
    };

    let mut entries = Vec::with_capacity(tabs.len());
    let fresh = D::default();
    for (id, document) in tabs {
        let label = format!("{key}.{id}");
        match decode_lenient(document, &fresh, &label, issues) {
            Ok(document) => entries.push((TabId::new(id), document)),
            Err(err) => issues.push(SnapshotIssue::new(
                format!("{key}.{id}"),
                format!("tab dropped: {err}"),
            )),
        }
    }
    *target = TabRegistry::from_entries(entries);
}

/// A single document carries a string `code`, or consists only of the
/// document keys (`{ "settings": {...} }`). Tab maps are keyed by tab ids.
fn is_single_document(map: &Map<String, Value>) -> bool {
    if matches!(map.get("code"), Some(Value::String(_))) {
        return true;
    }
    !map.is_empty()
        && map
            .keys()
            .all(|key| LEGACY_DOCUMENT_KEYS.contains(&key.as_str()))
}

fn decode_current_tab(
    object: &mut Map<String, Value>,
    key: &str,
    target: &mut Option<TabId>,
    issues: &mut Vec<SnapshotIssue>,
) {
    match object.remove(key) {
        None | Some(Value::Null) => {}
        Some(Value::String(id)) if TabId::is_routable(&id) => *target = Some(TabId::new(id)),
        Some(Value::String(id)) => issues.push(SnapshotIssue::new(
            key,
            format!("ignored tab reference {id:?}: not a single route segment"),
        )),
        Some(Value::Number(id)) => *target = Some(TabId::new(id.to_string())),
        Some(other) => issues.push(SnapshotIssue::new(
            key,
            format!("ignored {} tab reference", kind_of(&other)),
        )),
    }
}

fn decode_menu(
    object: &mut Map<String, Value>,
    target: &mut MenuConfig,
    issues: &mut Vec<SnapshotIssue>,
) {
    let items = match object.remove("menu") {
        None | Some(Value::Null) => return,
        Some(Value::Array(items)) => items,
        Some(other) => {
            issues.push(SnapshotIssue::new(
                "menu",
                format!("expected a list, found {}", kind_of(&other)),
            ));
            return;
        }
    };

    let mut seen = HashSet::new();
    let mut decoded = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match decode_menu_item(item, index, issues) {
            Ok(item) if seen.insert(item.id().to_string()) => decoded.push(item),
            Ok(item) => issues.push(SnapshotIssue::new(
                format!("menu[{index}]"),
                format!("duplicate item '{}' dropped", item.id()),
            )),
            Err(err) => issues.push(SnapshotIssue::new(
                format!("menu[{index}]"),
                format!("item dropped: {err}"),
            )),
        }
    }
    *target = MenuConfig::new(decoded);
}

/// Decodes one menu entry. An entry with a readable `id` and `path` survives
/// damage to its other fields.
fn decode_menu_item(
    item: Value,
    index: usize,
    issues: &mut Vec<SnapshotIssue>,
) -> Result<MenuItem, String> {
    #[derive(Deserialize)]
    struct Identity {
        id: String,
        path: String,
    }

    if let Ok(item) = MenuItem::deserialize(&item) {
        return Ok(item);
    }
    let Identity { id, path } = Identity::deserialize(&item).map_err(|err| err.to_string())?;
    let base = MenuItem::new(id, path, "");
    decode_lenient(item, &base, &format!("menu[{index}]"), issues).map_err(|err| err.to_string())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{JsonTabDocument, XmlTabDocument};
    use crate::tools::{NumberConverterState, QrCodeState, TextDiffState};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn round_trip_reproduces_an_equal_tree() {
        let mut state = AppState::default();
        state.tool_mut::<TextDiffState>().new_text = "right".into();
        state.set_current_tab::<JsonTabDocument>(TabId::new("17"));
        let value = serde_json::to_value(&state).unwrap();

        let decoded = AppState::from_snapshot(value);
        assert!(decoded.issues.is_empty(), "{:?}", decoded.issues);
        assert_eq!(decoded.migrated_from, None);
        assert_eq!(decoded.state, state);
    }

    #[test]
    fn missing_fields_take_schema_defaults() {
        let decoded = AppState::from_snapshot(json!({
            "version": 2,
            "textDiff": { "oldText": "kept" },
            "jsonEditor": { "default": { "code": "{}" } }
        }));

        assert!(decoded.issues.is_empty());
        let state = decoded.state;
        assert_eq!(state.tool::<TextDiffState>().old_text, "kept");
        assert!(!state.tool::<TextDiffState>().ignore_whitespace);
        assert_eq!(state.tool::<NumberConverterState>().input_base, "10");
        let doc = state.tabs::<JsonTabDocument>().get(DEFAULT_TAB_ID).unwrap();
        assert_eq!(doc.code, "{}");
        assert!(!doc.settings.remove_escapes);
        assert!(state.tabs::<XmlTabDocument>().contains(DEFAULT_TAB_ID));
    }

    #[test]
    fn legacy_single_document_editors_become_default_tabs() {
        let decoded = AppState::from_snapshot(json!({
            "jsonEditor": {
                "code": "{\"a\":1}",
                "settings": { "autoDecodeUnicode": true, "removeEscapes": false }
            },
            "xmlEditor": { "code": "<a/>" },
            "qrCode": { "text": "hello" }
        }));

        assert_eq!(decoded.migrated_from, Some(1));
        assert!(decoded.issues.is_empty());
        let state = decoded.state;
        assert_eq!(state.version(), STATE_SCHEMA_VERSION);
        let json = state.tabs::<JsonTabDocument>();
        assert_eq!(json.len(), 1);
        assert_eq!(json.get(DEFAULT_TAB_ID).unwrap().code, "{\"a\":1}");
        assert!(json.get(DEFAULT_TAB_ID).unwrap().settings.auto_decode_unicode);
        assert_eq!(
            state.tabs::<XmlTabDocument>().get(DEFAULT_TAB_ID).unwrap().code,
            "<a/>"
        );
        assert_eq!(state.tool::<QrCodeState>().text, "hello");
    }

    #[test]
    fn damaged_subtree_is_reset_without_losing_others() {
        let decoded = AppState::from_snapshot(json!({
            "version": 2,
            "textDiff": "corrupted",
            "qrCode": { "text": "survives" },
            "jsonEditor": {
                "default": { "code": "ok" },
                "1700000000000": "not a document"
            }
        }));

        let fields: Vec<_> = decoded.issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["textDiff", "jsonEditor.1700000000000"]);
        let state = decoded.state;
        assert_eq!(state.tool::<TextDiffState>(), &TextDiffState::default());
        assert_eq!(state.tool::<QrCodeState>().text, "survives");
        assert_eq!(state.tabs::<JsonTabDocument>().len(), 1);
    }

    #[test]
    fn one_bad_field_keeps_its_siblings() {
        let decoded = AppState::from_snapshot(json!({
            "version": 2,
            "textDiff": { "oldText": 5, "newText": "keep me", "ignoreWhitespace": true },
            "xmlEditor": {
                "default": {},
                "17": { "code": "<important/>", "settings": { "autoFormat": "yes" } }
            },
            "jsonEditor": {
                "default": { "code": 42, "settings": { "autoDecodeUnicode": true } }
            },
            "menu": [{ "id": "json", "path": "/json-editor", "visible": "no", "order": 7 }]
        }));

        let fields: Vec<_> = decoded.issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "textDiff.oldText",
                "jsonEditor.default.code",
                "xmlEditor.17.settings.autoFormat",
                "menu[0].visible",
            ]
        );
        let state = decoded.state;
        let diff = state.tool::<TextDiffState>();
        assert_eq!(diff.old_text, "");
        assert_eq!(diff.new_text, "keep me");
        assert!(diff.ignore_whitespace);

        let xml = state.tabs::<XmlTabDocument>().get("17").unwrap();
        assert_eq!(xml.code, "<important/>");
        assert!(!xml.settings.auto_format);

        let json = state.tabs::<JsonTabDocument>().get(DEFAULT_TAB_ID).unwrap();
        assert_eq!(json.code, "");
        assert!(json.settings.auto_decode_unicode);

        let item = state.menu().get("json").unwrap();
        assert_eq!(item.order, 7);
        assert!(item.visible);
        assert_eq!(item.path, "/json-editor");
    }

    #[test]
    fn settings_only_legacy_document_becomes_default_tab() {
        let decoded = AppState::from_snapshot(json!({
            "jsonEditor": { "settings": { "autoDecodeUnicode": true } }
        }));

        assert!(decoded.issues.is_empty(), "{:?}", decoded.issues);
        let json = decoded.state.tabs::<JsonTabDocument>();
        assert_eq!(json.len(), 1);
        assert!(!json.contains("settings"));
        assert!(json.get(DEFAULT_TAB_ID).unwrap().settings.auto_decode_unicode);
    }

    #[test]
    fn unroutable_current_tab_is_ignored() {
        for bad in ["/", " ", "a/b", " 17"] {
            let decoded = AppState::from_snapshot(json!({
                "version": 2,
                "currentJsonEditorTab": bad
            }));
            assert_eq!(decoded.issues.len(), 1, "{bad:?}");
            assert_eq!(decoded.issues[0].field, "currentJsonEditorTab");
            assert_eq!(
                decoded.state.current_tab(crate::document::EditorFamily::Json),
                None
            );
        }
    }

    #[test]
    fn unreadable_text_yields_defaults() {
        let decoded = AppState::from_snapshot_str("{ not json");
        assert_eq!(decoded.issues.len(), 1);
        assert_eq!(decoded.state, AppState::default());
    }

    #[test]
    fn non_object_root_yields_defaults() {
        let decoded = AppState::from_snapshot(json!([1, 2, 3]));
        assert_eq!(decoded.issues[0].field, "$");
        assert_eq!(decoded.state, AppState::default());
    }

    #[test]
    fn numeric_current_tab_is_accepted() {
        let decoded = AppState::from_snapshot(json!({
            "version": 2,
            "currentJsonEditorTab": 1700000000000u64,
            "currentXmlEditorTab": ""
        }));
        let state = decoded.state;
        assert_eq!(
            state.current_tab(crate::document::EditorFamily::Json),
            Some(&TabId::new("1700000000000"))
        );
        assert_eq!(state.current_tab(crate::document::EditorFamily::Xml), None);
    }

    #[test]
    fn duplicate_menu_items_keep_the_first() {
        let decoded = AppState::from_snapshot(json!({
            "version": 2,
            "menu": [
                { "id": "json", "path": "/json-editor", "order": 3, "visible": false },
                { "id": "json", "path": "/json-editor", "order": 0 },
                { "path": "/missing-id" }
            ]
        }));
        assert_eq!(decoded.issues.len(), 2);
        let menu = decoded.state.menu();
        assert_eq!(menu.items().len(), 1);
        assert_eq!(menu.get("json").unwrap().order, 3);
    }

    #[test]
    fn newer_schema_is_reported_but_loaded() {
        let decoded = AppState::from_snapshot(json!({
            "version": 9,
            "qrCode": { "text": "future" },
            "someFutureTool": { "x": 1 }
        }));
        assert_eq!(decoded.issues.len(), 1);
        assert_eq!(decoded.state.tool::<QrCodeState>().text, "future");
    }
}
