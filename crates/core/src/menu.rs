use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MenuError {
    #[error("menu item '{0}' does not exist")]
    UnknownItem(String),
}

/// 選單中的一個工具項目。 / One navigable tool entry in the sidebar menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    id: String,
    pub path: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub order: i32,
}

fn default_visible() -> bool {
    true
}

impl MenuItem {
    pub fn new(id: impl Into<String>, path: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            icon: String::new(),
            title: title.into(),
            description: String::new(),
            visible: true,
            order: 0,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// 項目識別碼，建立後不可變。 / Stable identifier; immutable once created.
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// The user's menu configuration: persisted copies of the canonical items with
/// their visibility and order customizations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuConfig {
    items: Vec<MenuItem>,
}

impl MenuConfig {
    pub fn new(items: Vec<MenuItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&MenuItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn visible_items(&self) -> impl Iterator<Item = &MenuItem> {
        self.items.iter().filter(|item| item.visible)
    }

    /// Appends canonical items that have no persisted counterpart, then
    /// stable-sorts by `order`.
    ///
    /// Existing items keep their `visible` and `order` values; re-running with
    /// the same canonical list changes nothing. Returns the number of items
    /// appended.
    pub fn merge_canonical(&mut self, canonical: &[MenuItem]) -> usize {
        let mut appended = 0;
        for item in canonical {
            if self.get(&item.id).is_none() {
                debug!(item = %item.id, "adding new tool to menu");
                self.items.push(item.clone());
                appended += 1;
            }
        }
        self.sort_by_order();
        appended
    }

    pub fn set_visibility(&mut self, id: &str, visible: bool) -> Result<(), MenuError> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| MenuError::UnknownItem(id.to_string()))?;
        item.visible = visible;
        Ok(())
    }

    /// Sets each listed item's `order` to its position in `sequence`.
    ///
    /// Items missing from `sequence` keep their current `order`, so callers
    /// wanting a stable relative order must pass the complete list. Unknown
    /// ids are skipped. The list itself is not re-sorted; see
    /// [`MenuConfig::sort_by_order`]. Returns the number of items updated.
    pub fn reorder<S: AsRef<str>>(&mut self, sequence: &[S]) -> usize {
        let mut updated = 0;
        for (position, id) in sequence.iter().enumerate() {
            let Some(item) = self.items.iter_mut().find(|item| item.id == id.as_ref()) else {
                continue;
            };
            item.order = i32::try_from(position).unwrap_or(i32::MAX);
            updated += 1;
        }
        updated
    }

    /// 依 `order` 穩定排序；同值維持插入順序。 / Stable sort by `order`; ties keep insertion order.
    pub fn sort_by_order(&mut self) {
        self.items.sort_by_key(|item| item.order);
    }

    /// 將可見性與順序還原為標準清單。 / Restores visibility and order from the canonical list.
    pub fn reset(&mut self, canonical: &[MenuItem]) {
        for item in &mut self.items {
            if let Some(original) = canonical.iter().find(|c| c.id == item.id) {
                item.visible = original.visible;
                item.order = original.order;
            }
        }
        self.merge_canonical(canonical);
    }
}

/// 內建的工具清單，依宣告順序排列。 / The built-in tool list in declaration order.
pub fn canonical_menu() -> Vec<MenuItem> {
    let entries = [
        ("json", "/json-editor", "document", "JSON Editor", "Format, validate and compress JSON"),
        ("xml", "/xml-editor", "code", "XML Editor", "Format and validate XML"),
        ("base64", "/tools/base64-text", "lock", "Base64", "Encode and decode Base64 text"),
        ("base64-image", "/tools/base64-image", "picture", "Base64 Image", "Convert images to and from Base64"),
        ("url", "/tools/url-converter", "link", "URL Encode", "Percent-encode and decode URLs"),
        ("url-parser", "/tools/url-parser", "search", "URL Parser", "Split a URL into its components"),
        ("number", "/tools/number-converter", "calculator", "Number Base", "Convert numbers between bases"),
        ("time", "/tools/time-converter", "clock", "Timestamp", "Convert between timestamps and dates"),
        ("diff", "/tools/text-diff", "files", "Text Diff", "Compare two texts side by side"),
        ("qrcode", "/tools/qrcode", "qr", "QR Code", "Generate QR codes from text"),
        ("curl", "/tools/curl-converter", "terminal", "cURL to Code", "Turn cURL commands into code"),
        ("jwt", "/tools/jwt-decoder", "key", "JWT Decoder", "Inspect JSON Web Tokens"),
        ("unicode", "/tools/unicode-converter", "translate", "Unicode", "Escape and unescape Unicode text"),
    ];

    entries
        .into_iter()
        .enumerate()
        .map(|(order, (id, path, icon, title, description))| {
            MenuItem::new(id, path, title)
                .with_icon(icon)
                .with_description(description)
                .with_order(order as i32)
        })
        .collect()
}
