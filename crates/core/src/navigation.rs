//! Route resolution for the shell.
//!
//! Resolution is a pure function of the requested path and the current state.
//! A bare editor path (`json-editor`) redirects to the family's last active tab,
//! or to `"default"` when none was ever recorded or the recorded id cannot be
//! a route segment. A path carrying a tab id (`json-editor/17`) is terminal and
//! mounts as-is; whether the tab exists is decided when the view binds to it,
//! not here.

use tracing::{debug, warn};

use crate::document::EditorFamily;
use crate::state::AppState;
use crate::tab_id::TabId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Editor { family: EditorFamily, tab: TabId },
    /// Any other page (single-document tools, settings), by normalized path.
    Page(String),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Home => String::new(),
            Route::Editor { family, tab } => editor_path(*family, tab),
            Route::Page(path) => path.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Redirect(String),
    Mount(Route),
}

/// 組出編輯器分頁的路徑。 / Builds the path of an editor tab.
pub fn editor_path(family: EditorFamily, tab: &TabId) -> String {
    format!("{}/{}", family.route(), tab)
}

pub fn resolve(requested: &str, state: &AppState) -> Resolution {
    let path = normalize(requested);
    let mut segments = path.split('/').filter(|segment| !segment.is_empty());

    let Some(first) = segments.next() else {
        return Resolution::Mount(Route::Home);
    };
    let second = segments.next();
    let extra = segments.next();

    match (EditorFamily::from_route(first), second, extra) {
        (Some(family), None, _) => {
            let tab = state
                .current_tab(family)
                .filter(|tab| TabId::is_routable(tab.as_str()))
                .cloned()
                .unwrap_or_else(TabId::default_tab);
            let target = editor_path(family, &tab);
            debug!(from = %path, to = %target, "redirecting bare editor route");
            Resolution::Redirect(target)
        }
        (Some(family), Some(tab), None) => Resolution::Mount(Route::Editor {
            family,
            tab: TabId::new(tab),
        }),
        _ => Resolution::Mount(Route::Page(path.to_string())),
    }
}

/// Redirects followed before `resolve_route` gives up.
const MAX_REDIRECTS: usize = 4;

/// 跟隨重新導向直到得到終端路由。 / Follows redirects until a terminal route is reached.
///
/// A chain longer than [`MAX_REDIRECTS`] mounts the home page.
pub fn resolve_route(requested: &str, state: &AppState) -> Route {
    let mut current = requested.to_string();
    for _ in 0..=MAX_REDIRECTS {
        match resolve(&current, state) {
            Resolution::Mount(route) => return route,
            Resolution::Redirect(target) => current = target,
        }
    }
    warn!(requested, last = %current, "redirect chain too long, mounting home");
    Route::Home
}

fn normalize(path: &str) -> &str {
    path.trim().trim_start_matches('#').trim_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::JsonTabDocument;

    #[test]
    fn bare_path_redirects_to_last_active_tab() {
        let mut state = AppState::default();
        state.set_current_tab::<JsonTabDocument>(TabId::new("17"));

        assert_eq!(
            resolve("json-editor", &state),
            Resolution::Redirect("json-editor/17".into())
        );
        assert_eq!(
            resolve("/json-editor/", &state),
            Resolution::Redirect("json-editor/17".into())
        );
    }

    #[test]
    fn bare_path_without_history_redirects_to_default() {
        let state = AppState::default();
        assert_eq!(
            resolve("json-editor", &state),
            Resolution::Redirect("json-editor/default".into())
        );
        assert_eq!(
            resolve("xml-editor", &state),
            Resolution::Redirect("xml-editor/default".into())
        );
    }

    #[test]
    fn explicit_tab_mounts_directly() {
        let state = AppState::default();
        assert_eq!(
            resolve("/xml-editor/1700000000000", &state),
            Resolution::Mount(Route::Editor {
                family: EditorFamily::Xml,
                tab: TabId::new("1700000000000"),
            })
        );
    }

    #[test]
    fn other_paths_mount_as_pages() {
        let state = AppState::default();
        assert_eq!(resolve("/", &state), Resolution::Mount(Route::Home));
        assert_eq!(resolve("#/", &state), Resolution::Mount(Route::Home));
        assert_eq!(
            resolve("/tools/base64-text", &state),
            Resolution::Mount(Route::Page("tools/base64-text".into()))
        );
        assert_eq!(
            resolve("json-editor/1/2", &state),
            Resolution::Mount(Route::Page("json-editor/1/2".into()))
        );
    }

    #[test]
    fn unroutable_last_tab_redirects_to_default() {
        for bad in ["/", " ", "a/b", " 17 "] {
            let mut state = AppState::default();
            state.set_current_tab::<JsonTabDocument>(TabId::new(bad));
            assert_eq!(
                resolve("json-editor", &state),
                Resolution::Redirect("json-editor/default".into()),
                "current tab {bad:?}"
            );
            assert_eq!(
                resolve_route("json-editor", &state),
                Route::Editor {
                    family: EditorFamily::Json,
                    tab: TabId::default_tab(),
                }
            );
        }
    }

    #[test]
    fn resolve_route_follows_the_redirect() {
        let mut state = AppState::default();
        state.set_current_tab::<JsonTabDocument>(TabId::new("17"));
        let route = resolve_route("json-editor", &state);
        assert_eq!(route.path(), "json-editor/17");
    }
}
