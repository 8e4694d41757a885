//! In-process item store.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{ItemStore, StoreResult};
use crate::item::{ItemError, ItemId, ItemState, ListItem};

/// Item store kept in memory. Contents are lost when the process exits.
#[derive(Clone, Default)]
pub struct MemoryItemStore {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    last_id: ItemId,
    items: BTreeMap<ItemId, ListItem>,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn list_all(&self) -> StoreResult<Vec<ListItem>> {
        Ok(self.inner.lock().items.values().cloned().collect())
    }

    async fn get(&self, id: ItemId) -> StoreResult<Option<ListItem>> {
        Ok(self.inner.lock().items.get(&id).cloned())
    }

    async fn create(&self, text: &str) -> StoreResult<ListItem> {
        let mut inner = self.inner.lock();
        inner.last_id += 1;
        let item = ListItem::new(inner.last_id, text);
        inner.items.insert(item.id, item.clone());
        tracing::debug!(id = item.id, "Created item");
        Ok(item)
    }

    async fn delete(&self, id: ItemId) -> StoreResult<()> {
        if self.inner.lock().items.remove(&id).is_some() {
            tracing::debug!(id, "Deleted item");
        }
        Ok(())
    }

    async fn set_state(&self, id: ItemId, state: ItemState) -> StoreResult<ListItem> {
        let mut inner = self.inner.lock();
        let item = inner
            .items
            .get_mut(&id)
            .ok_or(ItemError::NotFound { id })?;
        item.set_state(state);
        tracing::debug!(id, %state, "Set item state");
        Ok(item.clone())
    }

    async fn set_text(&self, id: ItemId, text: &str) -> StoreResult<ListItem> {
        let mut inner = self.inner.lock();
        let item = inner
            .items
            .get_mut(&id)
            .ok_or(ItemError::NotFound { id })?;
        item.submit_text(text)?;
        tracing::debug!(id, "Set item text");
        Ok(item.clone())
    }
}
