//! In-process item store.
//!
//! Keeps items in insertion order behind an async `RwLock`. Every mutating
//! operation runs under the write lock, so uniqueness checks and the borrow
//! flag compare-and-set are atomic with respect to each other.

use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use tokio::sync::RwLock;

use super::{ItemStore, StoreError};
use crate::models::item::{Item, ItemDetails, ItemDraft, ItemId};

#[derive(Default)]
pub struct MemoryItemStore {
    items: RwLock<IndexMap<ItemId, Item>>,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Check `details` against every other stored item of the same kind.
fn check_unique(
    items: &IndexMap<ItemId, Item>,
    details: &ItemDetails,
    except: Option<ItemId>,
) -> Result<(), StoreError> {
    let others = items.values().filter(|item| Some(item.id) != except);
    for other in others {
        match (details, &other.details) {
            (ItemDetails::Book(new), ItemDetails::Book(existing)) if new.isbn == existing.isbn => {
                return Err(StoreError::UniqueViolation { field: "isbn" });
            }
            (ItemDetails::Magazine(new), ItemDetails::Magazine(existing))
                if new.issue_number == existing.issue_number =>
            {
                return Err(StoreError::UniqueViolation {
                    field: "issueNumber",
                });
            }
            _ => {}
        }
    }
    Ok(())
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn insert(&self, draft: ItemDraft) -> Result<Item, StoreError> {
        let mut items = self.items.write().await;
        check_unique(&items, &draft.details, None)?;

        let now = Utc::now();
        let item = Item {
            id: ItemId::new_random(),
            title: draft.title,
            details: draft.details,
            is_borrowed: false,
            created_at: now,
            updated_at: now,
        };
        items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn find_by_id(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Item>, StoreError> {
        Ok(self.items.read().await.values().cloned().collect())
    }

    async fn update_fields(
        &self,
        id: ItemId,
        draft: ItemDraft,
    ) -> Result<Option<Item>, StoreError> {
        let mut items = self.items.write().await;
        let same_kind = items
            .get(&id)
            .is_some_and(|item| item.kind() == draft.kind());
        if !same_kind {
            return Ok(None);
        }
        check_unique(&items, &draft.details, Some(id))?;

        Ok(items.get_mut(&id).map(|item| {
            item.title = draft.title;
            item.details = draft.details;
            item.updated_at = Utc::now();
            item.clone()
        }))
    }

    async fn delete_by_id(&self, id: ItemId) -> Result<bool, StoreError> {
        Ok(self.items.write().await.shift_remove(&id).is_some())
    }

    async fn set_borrowed(&self, id: ItemId, borrowed: bool) -> Result<Option<Item>, StoreError> {
        let mut items = self.items.write().await;
        Ok(items
            .get_mut(&id)
            .filter(|item| item.is_borrowed != borrowed)
            .map(|item| {
                item.is_borrowed = borrowed;
                item.updated_at = Utc::now();
                item.clone()
            }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
