use std::borrow::Borrow;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// 每個編輯器家族必定存在的分頁識別碼。 / Identifier of the tab every editor family always carries.
pub const DEFAULT_TAB_ID: &str = "default";

/// 分頁識別碼；對呼叫端而言是不透明字串。 / Opaque identifier naming a tab within its family.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(String);

impl TabId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// 回傳 `"default"` 分頁識別碼。 / Returns the `"default"` identifier.
    pub fn default_tab() -> Self {
        Self(DEFAULT_TAB_ID.to_string())
    }

    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_TAB_ID
    }

    /// 能否作為路徑中的單一區段。 / Whether `value` can stand as one route segment.
    ///
    /// Blank values, values with surrounding whitespace and values containing
    /// `/` cannot name a tab in a route.
    pub fn is_routable(value: &str) -> bool {
        !value.is_empty() && value.trim() == value && !value.contains('/')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for TabId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TabId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TabId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// 提供毫秒時間戳的時鐘介面。 / Millisecond wall clock used to derive tab identifiers.
pub trait Clock {
    fn now_millis(&self) -> u64;
}

/// 使用系統時間的時鐘。 / Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or_default()
    }
}

/// 固定於某個時間點的時鐘，用於可重現的識別碼。 / Clock frozen at one instant, for reproducible identifiers.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    millis: u64,
}

impl FixedClock {
    pub fn new(millis: u64) -> Self {
        Self { millis }
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        self.millis
    }
}

/// Produces tab identifiers from a millisecond timestamp.
///
/// Each token is the current time in milliseconds, bumped to one past the
/// previously issued token when the clock has not advanced (or went
/// backwards). Tokens handed out by one generator are therefore strictly
/// increasing, and two creations inside the same clock tick never share an
/// identifier. Once the numeric range is used up, ids continue as
/// `<last>-<n>`.
pub struct TabIdGenerator {
    clock: Box<dyn Clock>,
    last: Option<u64>,
    suffix: u64,
}

impl TabIdGenerator {
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self {
            clock: Box::new(clock),
            last: None,
            suffix: 0,
        }
    }

    pub fn system() -> Self {
        Self::new(SystemClock)
    }

    /// Next numeric token, or `None` once `u64::MAX` has been issued.
    fn next_token(&mut self) -> Option<u64> {
        let now = self.clock.now_millis();
        let token = match self.last {
            None => now,
            Some(last) => now.max(last.checked_add(1)?),
        };
        self.last = Some(token);
        Some(token)
    }

    fn next_candidate(&mut self) -> String {
        if let Some(token) = self.next_token() {
            return token.to_string();
        }
        self.suffix += 1;
        format!("{}-{}", self.last.unwrap_or(u64::MAX), self.suffix)
    }

    /// 產生一個未被 `is_taken` 佔用的新識別碼。 / Generates an identifier that `is_taken` does not report as used.
    pub fn generate(&mut self, mut is_taken: impl FnMut(&str) -> bool) -> TabId {
        loop {
            let candidate = self.next_candidate();
            if !is_taken(&candidate) {
                return TabId(candidate);
            }
        }
    }
}

impl Default for TabIdGenerator {
    fn default() -> Self {
        Self::system()
    }
}

impl fmt::Debug for TabIdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TabIdGenerator")
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}
