use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::TabDocument;
use crate::tab_id::{TabId, TabIdGenerator, DEFAULT_TAB_ID};

/// 分頁列顯示用的摘要。 / Summary of a tab for the shell's tab strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabSummary {
    pub id: TabId,
    pub title: String,
}

/// Insertion-ordered map from tab identifier to document for one editor
/// family.
///
/// A registry built through [`TabRegistry::new`] or sanitized through
/// [`TabRegistry::ensure_default`] always holds the `"default"` tab. Tabs are
/// never removed by the registry itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabRegistry<D> {
    tabs: IndexMap<TabId, D>,
}

impl<D: TabDocument> TabRegistry<D> {
    /// 建立只含 `"default"` 分頁的登錄表。 / Creates a registry seeded with the `"default"` tab.
    pub fn new() -> Self {
        let mut registry = Self {
            tabs: IndexMap::new(),
        };
        registry.ensure_default();
        registry
    }

    /// 依現有項目建立登錄表，不會自動補上預設分頁。 / Builds a registry from entries without seeding the default tab.
    pub fn from_entries(entries: impl IntoIterator<Item = (TabId, D)>) -> Self {
        Self {
            tabs: entries.into_iter().collect(),
        }
    }

    /// 取得分頁文件；不存在時回傳 `None`。 / Looks up a tab; `None` for stale or never-created ids.
    pub fn get(&self, id: &str) -> Option<&D> {
        self.tabs.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut D> {
        self.tabs.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tabs.contains_key(id)
    }

    /// 以家族預設值建立新分頁並回傳其識別碼。 / Creates a tab with family defaults and returns its fresh id.
    pub fn create(&mut self, ids: &mut TabIdGenerator) -> TabId {
        let id = ids.generate(|candidate| self.tabs.contains_key(candidate));
        debug!(family = %D::FAMILY, tab = %id, "created editor tab");
        self.tabs.insert(id.clone(), D::default());
        id
    }

    /// 確保 `"default"` 分頁存在；若本次新增則回傳 `true`。 / Guarantees the `"default"` tab, returning `true` when it had to be added.
    pub fn ensure_default(&mut self) -> bool {
        if self.tabs.contains_key(DEFAULT_TAB_ID) {
            return false;
        }
        self.tabs.insert(TabId::default_tab(), D::default());
        true
    }

    pub fn ids(&self) -> impl Iterator<Item = &TabId> {
        self.tabs.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TabId, &D)> {
        self.tabs.iter()
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// 依插入順序列出分頁標題。 / Lists tabs in insertion order with their display titles.
    pub fn summaries(&self) -> Vec<TabSummary> {
        let family_title = D::FAMILY.title();
        self.tabs
            .keys()
            .enumerate()
            .map(|(index, id)| {
                let title = if id.is_default() {
                    family_title.to_string()
                } else {
                    format!("{family_title} {}", index + 1)
                };
                TabSummary {
                    id: id.clone(),
                    title,
                }
            })
            .collect()
    }
}

impl<D: TabDocument> Default for TabRegistry<D> {
    fn default() -> Self {
        Self::new()
    }
}
