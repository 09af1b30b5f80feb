//! The application state tree.
//! 應用程式狀態樹。
//!
//! Every tool owns exactly one subtree. Fields are private to this module:
//! outside code reaches a subtree only through the typed accessors
//! ([`AppState::tool`], [`AppState::tabs`]), and only the state container
//! holds mutable access.

mod snapshot;

use serde::{Deserialize, Serialize};

use crate::document::{EditorFamily, JsonTabDocument, TabDocument, XmlTabDocument};
use crate::menu::MenuConfig;
use crate::settings::AppSettings;
use crate::tab_id::TabId;
use crate::tabs::TabRegistry;
use crate::tools::{
    Base64ImageState, Base64TextState, CurlConverterState, JwtDecoderState, NumberConverterState,
    QrCodeState, TextDiffState, TimeConverterState, ToolState, UnicodeConverterState,
    UrlConverterState, UrlParserState,
};

pub use snapshot::{DecodedSnapshot, SnapshotIssue};

/// Current snapshot schema version.
///
/// Version 1 stored one document per editor; version 2 stores a tab registry
/// per editor family plus the last active tab.
pub const STATE_SCHEMA_VERSION: u32 = 2;

pub(crate) mod slot {
    use super::AppState;
    use crate::tab_id::TabId;
    use crate::tabs::TabRegistry;

    pub trait ToolSlot {
        fn slot(state: &AppState) -> &Self;
        fn slot_mut(state: &mut AppState) -> &mut Self;
    }

    pub trait EditorSlot: Sized {
        fn registry(state: &AppState) -> &TabRegistry<Self>;
        fn registry_mut(state: &mut AppState) -> &mut TabRegistry<Self>;
        fn current_tab_mut(state: &mut AppState) -> &mut Option<TabId>;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    qr_code: QrCodeState,
    #[serde(default)]
    text_diff: TextDiffState,
    #[serde(default)]
    json_editor: TabRegistry<JsonTabDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    current_json_editor_tab: Option<TabId>,
    #[serde(default)]
    xml_editor: TabRegistry<XmlTabDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    current_xml_editor_tab: Option<TabId>,
    #[serde(default)]
    url_converter: UrlConverterState,
    #[serde(default)]
    url_parser: UrlParserState,
    #[serde(default)]
    base64_text: Base64TextState,
    #[serde(default)]
    base64_image: Base64ImageState,
    #[serde(default)]
    number_converter: NumberConverterState,
    #[serde(default)]
    time_converter: TimeConverterState,
    #[serde(default)]
    curl_converter: CurlConverterState,
    #[serde(default)]
    jwt_decoder: JwtDecoderState,
    #[serde(default)]
    unicode_converter: UnicodeConverterState,
    #[serde(default)]
    menu: MenuConfig,
    #[serde(default)]
    settings: AppSettings,
}

fn default_version() -> u32 {
    STATE_SCHEMA_VERSION
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            version: STATE_SCHEMA_VERSION,
            qr_code: QrCodeState::default(),
            text_diff: TextDiffState::default(),
            json_editor: TabRegistry::new(),
            current_json_editor_tab: None,
            xml_editor: TabRegistry::new(),
            current_xml_editor_tab: None,
            url_converter: UrlConverterState::default(),
            url_parser: UrlParserState::default(),
            base64_text: Base64TextState::default(),
            base64_image: Base64ImageState::default(),
            number_converter: NumberConverterState::default(),
            time_converter: TimeConverterState::default(),
            curl_converter: CurlConverterState::default(),
            jwt_decoder: JwtDecoderState::default(),
            unicode_converter: UnicodeConverterState::default(),
            menu: MenuConfig::default(),
            settings: AppSettings::default(),
        }
    }
}

impl AppState {
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn tool<T: ToolState>(&self) -> &T {
        T::slot(self)
    }

    pub fn tabs<D: TabDocument>(&self) -> &TabRegistry<D> {
        D::registry(self)
    }

    /// 該家族最後使用的分頁（若曾記錄）。 / Last active tab of the family, if one was ever recorded.
    pub fn current_tab(&self, family: EditorFamily) -> Option<&TabId> {
        match family {
            EditorFamily::Json => self.current_json_editor_tab.as_ref(),
            EditorFamily::Xml => self.current_xml_editor_tab.as_ref(),
        }
    }

    pub fn menu(&self) -> &MenuConfig {
        &self.menu
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Restores the tree invariants after loading or editing: current schema
    /// version, a `"default"` tab in both registries, sane settings.
    pub fn sanitize(&mut self) {
        self.version = STATE_SCHEMA_VERSION;
        self.json_editor.ensure_default();
        self.xml_editor.ensure_default();
        self.settings.sanitize();
    }

    pub(crate) fn tool_mut<T: ToolState>(&mut self) -> &mut T {
        T::slot_mut(self)
    }

    pub(crate) fn tabs_mut<D: TabDocument>(&mut self) -> &mut TabRegistry<D> {
        D::registry_mut(self)
    }

    pub(crate) fn set_current_tab<D: TabDocument>(&mut self, id: TabId) {
        *D::current_tab_mut(self) = Some(id);
    }

    pub(crate) fn menu_mut(&mut self) -> &mut MenuConfig {
        &mut self.menu
    }

    pub(crate) fn settings_mut(&mut self) -> &mut AppSettings {
        &mut self.settings
    }
}

macro_rules! tool_slots {
    ($($ty:ty => $field:ident, $key:literal;)*) => {
        $(
            impl slot::ToolSlot for $ty {
                fn slot(state: &AppState) -> &Self {
                    &state.$field
                }

                fn slot_mut(state: &mut AppState) -> &mut Self {
                    &mut state.$field
                }
            }

            impl ToolState for $ty {
                const KEY: &'static str = $key;
            }
        )*
    };
}

tool_slots! {
    QrCodeState => qr_code, "qrCode";
    TextDiffState => text_diff, "textDiff";
    UrlConverterState => url_converter, "urlConverter";
    UrlParserState => url_parser, "urlParser";
    Base64TextState => base64_text, "base64Text";
    Base64ImageState => base64_image, "base64Image";
    NumberConverterState => number_converter, "numberConverter";
    TimeConverterState => time_converter, "timeConverter";
    CurlConverterState => curl_converter, "curlConverter";
    JwtDecoderState => jwt_decoder, "jwtDecoder";
    UnicodeConverterState => unicode_converter, "unicodeConverter";
}

impl slot::EditorSlot for JsonTabDocument {
    fn registry(state: &AppState) -> &TabRegistry<Self> {
        &state.json_editor
    }

    fn registry_mut(state: &mut AppState) -> &mut TabRegistry<Self> {
        &mut state.json_editor
    }

    fn current_tab_mut(state: &mut AppState) -> &mut Option<TabId> {
        &mut state.current_json_editor_tab
    }
}

impl slot::EditorSlot for XmlTabDocument {
    fn registry(state: &AppState) -> &TabRegistry<Self> {
        &state.xml_editor
    }

    fn registry_mut(state: &mut AppState) -> &mut TabRegistry<Self> {
        &mut state.xml_editor
    }

    fn current_tab_mut(state: &mut AppState) -> &mut Option<TabId> {
        &mut state.current_xml_editor_tab
    }
}
