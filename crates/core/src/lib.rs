//! Core state model for the developer tools workbench.
//! 開發工具核心狀態模型。

pub mod container;
pub mod document;
pub mod menu;
pub mod navigation;
pub mod persistence;
pub mod processor;
pub mod settings;
pub mod state;
pub mod tab_id;
pub mod tabs;
pub mod tools;

pub use container::AppStateContainer;
pub use document::{
    EditorFamily, JsonTabDocument, JsonTabSettings, TabDocument, XmlTabDocument, XmlTabSettings,
};
pub use menu::{canonical_menu, MenuConfig, MenuError, MenuItem};
pub use navigation::{editor_path, resolve, resolve_route, Resolution, Route};
pub use persistence::{MemoryPersistence, MemoryPersistenceError, StatePersistence};
pub use processor::{compress_json, compress_xml, format_json, format_xml, CodeStyle, ProcessError};
pub use settings::{AppSettings, ThemeMode};
pub use state::{AppState, DecodedSnapshot, SnapshotIssue, STATE_SCHEMA_VERSION};
pub use tab_id::{Clock, FixedClock, SystemClock, TabId, TabIdGenerator, DEFAULT_TAB_ID};
pub use tabs::{TabRegistry, TabSummary};
pub use tools::{
    Base64ImageState, Base64TextState, CurlConverterState, JwtDecoderState, NumberConverterState,
    QrCodeState, TextDiffState, TimeConverterState, ToolState, UnicodeConverterState,
    UrlConverterState, UrlParserState, UrlViewMode,
};
