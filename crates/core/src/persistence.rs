use std::cell::{Cell, RefCell};
use std::error::Error as StdError;
use std::rc::Rc;

use serde_json::Value;
use thiserror::Error;

use crate::state::AppState;

/// Durable medium behind the state container.
///
/// `load` never fails: a missing, unreadable or malformed snapshot is reported
/// as `None` and the container starts from defaults. `save` is best-effort;
/// the container logs and drops its errors.
pub trait StatePersistence {
    type Error: StdError + 'static;

    /// 讀取最後一次寫入的快照。 / Reads the last written snapshot, if any.
    fn load(&self) -> Option<Value>;

    /// 寫入完整狀態樹。 / Writes the full state tree.
    fn save(&self, state: &AppState) -> Result<(), Self::Error>;
}

#[derive(Debug, Error)]
pub enum MemoryPersistenceError {
    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("in-memory store rejected the write")]
    Rejected,
}

/// In-memory medium for tests and throwaway sessions.
///
/// Clones share the same slot, so a test can keep a handle while the
/// container owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    slot: Rc<RefCell<Option<Value>>>,
    writes: Rc<Cell<usize>>,
    fail_writes: Rc<Cell<bool>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以既有快照建立。 / Starts with an already persisted snapshot.
    pub fn with_snapshot(snapshot: Value) -> Self {
        let store = Self::default();
        store.slot.replace(Some(snapshot));
        store
    }

    pub fn snapshot(&self) -> Option<Value> {
        self.slot.borrow().clone()
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    /// 模擬寫入失敗。 / Makes subsequent writes fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }
}

impl StatePersistence for MemoryPersistence {
    type Error = MemoryPersistenceError;

    fn load(&self) -> Option<Value> {
        self.snapshot()
    }

    fn save(&self, state: &AppState) -> Result<(), Self::Error> {
        if self.fail_writes.get() {
            return Err(MemoryPersistenceError::Rejected);
        }
        let value = serde_json::to_value(state)?;
        self.slot.replace(Some(value));
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}
