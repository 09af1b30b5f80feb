use tracing::{debug, info, warn};

use crate::document::{EditorFamily, JsonTabDocument, TabDocument, XmlTabDocument};
use crate::menu::{canonical_menu, MenuConfig, MenuError, MenuItem};
use crate::navigation::{resolve_route, Route};
use crate::persistence::StatePersistence;
use crate::processor::{CodeStyle, ProcessError};
use crate::settings::AppSettings;
use crate::state::{AppState, STATE_SCHEMA_VERSION};
use crate::tab_id::{Clock, SystemClock, TabId, TabIdGenerator};
use crate::tabs::TabRegistry;
use crate::tools::ToolState;

/// Owner of the application state tree and its only mutation authority.
///
/// Every mutating method writes the full tree through to the persistence
/// medium before returning. Persistence failures are logged and dropped; the
/// in-memory tree stays authoritative for the running session. Mutation goes
/// through `&mut self`, so there is exactly one writer at a time.
pub struct AppStateContainer<P: StatePersistence> {
    state: AppState,
    persistence: P,
    ids: TabIdGenerator,
    canonical_menu: Vec<MenuItem>,
}

impl<P: StatePersistence> AppStateContainer<P> {
    /// 讀取持久化狀態並合併內建選單。 / Loads persisted state and reconciles it with the built-in menu.
    pub fn load(persistence: P) -> Self {
        Self::load_with(persistence, canonical_menu(), SystemClock)
    }

    pub fn load_with(
        persistence: P,
        canonical_menu: Vec<MenuItem>,
        clock: impl Clock + 'static,
    ) -> Self {
        let mut state = match persistence.load() {
            Some(snapshot) => {
                let decoded = AppState::from_snapshot(snapshot);
                for issue in &decoded.issues {
                    warn!(%issue, "discarded part of the persisted state");
                }
                if let Some(from) = decoded.migrated_from {
                    info!(from, to = STATE_SCHEMA_VERSION, "upgraded persisted state");
                }
                decoded.state
            }
            None => {
                debug!("no persisted state, starting from defaults");
                AppState::default()
            }
        };

        let added = state.menu_mut().merge_canonical(&canonical_menu);
        if added > 0 {
            debug!(added, "menu reconciled with built-in tools");
        }

        Self {
            state,
            persistence,
            ids: TabIdGenerator::new(clock),
            canonical_menu,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn tool<T: ToolState>(&self) -> &T {
        self.state.tool::<T>()
    }

    pub fn update_tool<T: ToolState, R>(&mut self, op: impl FnOnce(&mut T) -> R) -> R {
        let result = op(self.state.tool_mut::<T>());
        self.persist();
        result
    }

    pub fn tabs<D: TabDocument>(&self) -> &TabRegistry<D> {
        self.state.tabs::<D>()
    }

    pub fn tab<D: TabDocument>(&self, id: &str) -> Option<&D> {
        self.state.tabs::<D>().get(id)
    }

    pub fn current_tab(&self, family: EditorFamily) -> Option<&TabId> {
        self.state.current_tab(family)
    }

    /// 新增分頁並回傳識別碼。 / Opens a new tab with family defaults and returns its id.
    pub fn create_tab<D: TabDocument>(&mut self) -> TabId {
        let id = self.state.tabs_mut::<D>().create(&mut self.ids);
        self.persist();
        id
    }

    /// Guarantees the family's `"default"` tab. Writes only when the tab had
    /// to be added.
    pub fn ensure_default_tab<D: TabDocument>(&mut self) -> bool {
        let created = self.state.tabs_mut::<D>().ensure_default();
        if created {
            self.persist();
        }
        created
    }

    /// Binds a view to a tab and records it as the family's active tab.
    ///
    /// An id missing from the registry (stale bookmark, never-created tab) or
    /// one that cannot be a route segment binds the `"default"` tab instead.
    /// Returns the id actually bound.
    pub fn open_tab<D: TabDocument>(&mut self, id: &str) -> TabId {
        let bound = if TabId::is_routable(id) && self.state.tabs::<D>().contains(id) {
            TabId::new(id)
        } else {
            let family = D::FAMILY;
            debug!(%family, tab = id, "unknown tab, using default");
            self.state.tabs_mut::<D>().ensure_default();
            TabId::default_tab()
        };
        self.state.set_current_tab::<D>(bound.clone());
        self.persist();
        bound
    }

    /// 修改分頁文件；分頁不存在時回傳 `None`。 / Edits a tab document; `None` when the tab does not exist.
    pub fn update_tab<D: TabDocument, R>(
        &mut self,
        id: &str,
        op: impl FnOnce(&mut D) -> R,
    ) -> Option<R> {
        let document = self.state.tabs_mut::<D>().get_mut(id)?;
        let result = op(document);
        self.persist();
        Some(result)
    }

    /// Replaces a tab's code, pretty-printing it first when the tab formats on
    /// edit and the code parses. Returns whether the stored code was
    /// formatted, or `None` when the tab does not exist.
    pub fn set_tab_code<D: TabDocument>(&mut self, id: &str, code: String) -> Option<bool> {
        let document = self.state.tabs_mut::<D>().get_mut(id)?;
        document.set_code(code);
        let formatted = document.formats_on_edit()
            && match document.restyle(CodeStyle::Pretty) {
                Ok(pretty) => {
                    document.set_code(pretty);
                    true
                }
                Err(err) => {
                    let family = D::FAMILY;
                    debug!(%family, tab = id, error = %err, "kept unformatted code");
                    false
                }
            };
        self.persist();
        Some(formatted)
    }

    /// 以指定樣式重排分頁內容。 / Rewrites a tab's code in `style`.
    ///
    /// `None` when the tab does not exist. Code that fails to parse is left
    /// as it was and nothing is written.
    pub fn restyle_tab<D: TabDocument>(
        &mut self,
        id: &str,
        style: CodeStyle,
    ) -> Option<Result<(), ProcessError>> {
        let code = match self.state.tabs::<D>().get(id)?.restyle(style) {
            Ok(code) => code,
            Err(err) => return Some(Err(err)),
        };
        self.update_tab::<D, _>(id, |document| document.set_code(code))
            .map(Ok)
    }

    /// Resolves a path and mounts the target, binding editor routes to a tab
    /// that exists. Returns the route that was mounted.
    pub fn navigate(&mut self, path: &str) -> Route {
        match resolve_route(path, &self.state) {
            Route::Editor { family, tab } => {
                let bound = match family {
                    EditorFamily::Json => self.open_tab::<JsonTabDocument>(tab.as_str()),
                    EditorFamily::Xml => self.open_tab::<XmlTabDocument>(tab.as_str()),
                };
                Route::Editor { family, tab: bound }
            }
            other => other,
        }
    }

    pub fn menu(&self) -> &MenuConfig {
        self.state.menu()
    }

    pub fn set_menu_visibility(&mut self, id: &str, visible: bool) -> Result<(), MenuError> {
        self.state.menu_mut().set_visibility(id, visible)?;
        self.persist();
        Ok(())
    }

    /// Applies a new menu order and re-sorts. Callers should pass every item;
    /// see [`MenuConfig::reorder`].
    pub fn reorder_menu<S: AsRef<str>>(&mut self, sequence: &[S]) -> usize {
        let menu = self.state.menu_mut();
        let updated = menu.reorder(sequence);
        menu.sort_by_order();
        self.persist();
        updated
    }

    pub fn reset_menu(&mut self) {
        self.state.menu_mut().reset(&self.canonical_menu);
        self.persist();
    }

    pub fn settings(&self) -> &AppSettings {
        self.state.settings()
    }

    pub fn update_settings(&mut self, op: impl FnOnce(&mut AppSettings)) {
        let settings = self.state.settings_mut();
        op(settings);
        settings.sanitize();
        self.persist();
    }

    /// 清除所有工具狀態並回到首次啟動的樣子。 / Discards all tool state and returns to first-launch defaults.
    pub fn reset(&mut self) {
        let mut state = AppState::default();
        state.menu_mut().merge_canonical(&self.canonical_menu);
        self.state = state;
        self.persist();
    }

    /// 立即寫入目前狀態。 / Writes the current tree immediately.
    pub fn flush(&self) {
        self.persist();
    }

    fn persist(&self) {
        if let Err(err) = self.persistence.save(&self.state) {
            warn!(error = %err, "failed to persist application state, keeping in-memory copy");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryPersistence;
    use crate::tab_id::{FixedClock, DEFAULT_TAB_ID};
    use crate::tools::{QrCodeState, TextDiffState};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn container(store: &MemoryPersistence) -> AppStateContainer<MemoryPersistence> {
        AppStateContainer::load_with(store.clone(), canonical_menu(), FixedClock::new(1_000))
    }

    #[test]
    fn every_mutation_writes_through() {
        let store = MemoryPersistence::new();
        let mut app = container(&store);
        assert_eq!(store.writes(), 0);

        app.update_tool::<TextDiffState, _>(|diff| diff.old_text = "a".into());
        let id = app.create_tab::<JsonTabDocument>();
        app.update_tab::<JsonTabDocument, _>(id.as_str(), |doc| doc.code = "[]".into());
        app.set_menu_visibility("json", false).unwrap();

        assert_eq!(store.writes(), 4);
        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot["textDiff"]["oldText"], "a");
        assert_eq!(snapshot["jsonEditor"][id.as_str()]["code"], "[]");
    }

    #[test]
    fn failed_writes_keep_the_in_memory_state() {
        let store = MemoryPersistence::new();
        let mut app = container(&store);
        store.set_fail_writes(true);

        app.update_tool::<QrCodeState, _>(|qr| qr.text = "unsaved".into());

        assert_eq!(app.tool::<QrCodeState>().text, "unsaved");
        assert_eq!(store.snapshot(), None);
    }

    #[test]
    fn rapid_tab_creation_yields_distinct_tabs() {
        let store = MemoryPersistence::new();
        let mut app = container(&store);

        let first = app.create_tab::<XmlTabDocument>();
        let second = app.create_tab::<XmlTabDocument>();

        assert_ne!(first, second);
        assert!(app.tab::<XmlTabDocument>(first.as_str()).is_some());
        assert!(app.tab::<XmlTabDocument>(second.as_str()).is_some());
    }

    #[test]
    fn ensure_default_only_writes_when_needed() {
        let store = MemoryPersistence::new();
        let mut app = container(&store);
        assert!(!app.ensure_default_tab::<JsonTabDocument>());
        assert!(!app.ensure_default_tab::<JsonTabDocument>());
        assert_eq!(store.writes(), 0);
        assert_eq!(app.tabs::<JsonTabDocument>().len(), 1);
    }

    #[test]
    fn navigate_binds_last_active_tab() {
        let store = MemoryPersistence::with_snapshot(json!({
            "version": 2,
            "jsonEditor": { "default": {}, "17": { "code": "{}" } },
            "currentJsonEditorTab": "17"
        }));
        let mut app = container(&store);

        let route = app.navigate("/json-editor");
        assert_eq!(route.path(), "json-editor/17");
        assert_eq!(app.current_tab(EditorFamily::Json), Some(&TabId::new("17")));
    }

    #[test]
    fn navigate_to_stale_tab_falls_back_to_default() {
        let store = MemoryPersistence::new();
        let mut app = container(&store);

        let route = app.navigate("xml-editor/404");
        assert_eq!(
            route,
            Route::Editor {
                family: EditorFamily::Xml,
                tab: TabId::default_tab(),
            }
        );
        assert_eq!(
            app.current_tab(EditorFamily::Xml).map(TabId::as_str),
            Some(DEFAULT_TAB_ID)
        );
        assert_eq!(app.navigate("xml-editor").path(), "xml-editor/default");
    }

    #[test]
    fn unroutable_saved_tab_reference_lands_on_default() {
        let store = MemoryPersistence::with_snapshot(json!({
            "version": 2,
            "jsonEditor": { "default": {}, "/": { "code": "odd" } },
            "currentJsonEditorTab": "/"
        }));
        let mut app = container(&store);

        assert_eq!(app.navigate("/json-editor").path(), "json-editor/default");
        assert_eq!(
            app.current_tab(EditorFamily::Json).map(TabId::as_str),
            Some(DEFAULT_TAB_ID)
        );
        assert_eq!(app.open_tab::<JsonTabDocument>("/"), TabId::default_tab());
    }

    #[test]
    fn auto_format_applies_to_parseable_xml_only() {
        let store = MemoryPersistence::new();
        let mut app = container(&store);
        app.update_tab::<XmlTabDocument, _>(DEFAULT_TAB_ID, |doc| doc.settings.auto_format = true);

        assert_eq!(
            app.set_tab_code::<XmlTabDocument>(DEFAULT_TAB_ID, "<a><b/></a>".into()),
            Some(true)
        );
        assert_eq!(app.tab::<XmlTabDocument>(DEFAULT_TAB_ID).unwrap().code, "<a>\n  <b/>\n</a>");

        assert_eq!(
            app.set_tab_code::<XmlTabDocument>(DEFAULT_TAB_ID, "<a></b>".into()),
            Some(false)
        );
        assert_eq!(app.tab::<XmlTabDocument>(DEFAULT_TAB_ID).unwrap().code, "<a></b>");

        assert_eq!(
            app.set_tab_code::<JsonTabDocument>(DEFAULT_TAB_ID, "{\"a\":1}".into()),
            Some(false)
        );
        assert_eq!(app.set_tab_code::<JsonTabDocument>("missing", String::new()), None);
    }

    #[test]
    fn restyle_tab_leaves_unparseable_code_alone() {
        let store = MemoryPersistence::new();
        let mut app = container(&store);
        app.set_tab_code::<JsonTabDocument>(DEFAULT_TAB_ID, "{\"a\": [1, 2]}".into());
        let writes = store.writes();

        app.restyle_tab::<JsonTabDocument>(DEFAULT_TAB_ID, CodeStyle::Compact)
            .unwrap()
            .unwrap();
        assert_eq!(app.tab::<JsonTabDocument>(DEFAULT_TAB_ID).unwrap().code, "{\"a\":[1,2]}");
        assert_eq!(store.writes(), writes + 1);

        app.set_tab_code::<JsonTabDocument>(DEFAULT_TAB_ID, "{oops".into());
        let result = app.restyle_tab::<JsonTabDocument>(DEFAULT_TAB_ID, CodeStyle::Pretty);
        assert!(matches!(result, Some(Err(ProcessError::Json(_)))));
        assert_eq!(app.tab::<JsonTabDocument>(DEFAULT_TAB_ID).unwrap().code, "{oops");
        assert!(app.restyle_tab::<JsonTabDocument>("404", CodeStyle::Pretty).is_none());
    }

    #[test]
    fn startup_merges_new_tools_into_customized_menu() {
        let store = MemoryPersistence::with_snapshot(json!({
            "version": 2,
            "menu": [{ "id": "json", "path": "/json-editor", "order": 50, "visible": false }]
        }));
        let app = container(&store);

        let menu = app.menu();
        assert_eq!(menu.items().len(), canonical_menu().len());
        let json = menu.get("json").unwrap();
        assert!(!json.visible);
        assert_eq!(json.order, 50);
        assert_eq!(menu.items().last().unwrap().id(), "json");
    }

    #[test]
    fn reorder_menu_sorts_after_renumbering() {
        let store = MemoryPersistence::new();
        let mut app = container(&store);
        app.reorder_menu(&["xml", "json"]);

        let ids: Vec<_> = app.menu().items().iter().take(2).map(MenuItem::id).collect();
        assert_eq!(ids, vec!["xml", "json"]);
        assert_eq!(app.menu().get("xml").unwrap().order, 0);
        assert_eq!(app.menu().get("json").unwrap().order, 1);
    }

    #[test]
    fn state_survives_a_restart() {
        let store = MemoryPersistence::new();
        let id = {
            let mut app = container(&store);
            let id = app.create_tab::<JsonTabDocument>();
            app.update_tab::<JsonTabDocument, _>(id.as_str(), |doc| {
                doc.code = "{\"k\":\"\\u00e9\"}".into();
                doc.settings.auto_decode_unicode = true;
            });
            app.open_tab::<JsonTabDocument>(id.as_str());
            app.update_settings(|settings| settings.editor_font_size = 18);
            id
        };

        let app = container(&store);
        let doc = app.tab::<JsonTabDocument>(id.as_str()).unwrap();
        assert!(doc.settings.auto_decode_unicode);
        assert_eq!(app.current_tab(EditorFamily::Json), Some(&id));
        assert_eq!(app.settings().editor_font_size, 18);
    }

    #[test]
    fn reset_restores_first_launch_state() {
        let store = MemoryPersistence::new();
        let mut app = container(&store);
        app.create_tab::<JsonTabDocument>();
        app.set_menu_visibility("xml", false).unwrap();

        app.reset();

        assert_eq!(app.tabs::<JsonTabDocument>().len(), 1);
        assert!(app.menu().get("xml").unwrap().visible);
        assert_eq!(app.current_tab(EditorFamily::Json), None);
    }
}
