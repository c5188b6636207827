//! Repository layer: the item store contract and its implementations

pub mod items;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::item::{Item, ItemDraft, ItemId};

pub use items::PgItemStore;
pub use memory::MemoryItemStore;

/// Errors raised by item store implementations
#[derive(Error, Debug)]
pub enum StoreError {
    /// `isbn` (books) or `issueNumber` (magazines) already taken
    #[error("unique constraint violated on {field}")]
    UniqueViolation { field: &'static str },

    /// A stored row does not resolve to exactly one item kind
    #[error("corrupt item record {id}: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Durable keyed storage of catalog items.
///
/// Implementations own identifier generation, timestamps and uniqueness of
/// `isbn` among books and `issueNumber` among magazines.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Persist a new item, not borrowed
    async fn insert(&self, draft: ItemDraft) -> Result<Item, StoreError>;

    async fn find_by_id(&self, id: ItemId) -> Result<Option<Item>, StoreError>;

    /// All items, in the store's natural order
    async fn find_all(&self) -> Result<Vec<Item>, StoreError>;

    /// Replace the title and kind-specific fields of an item. Only applies
    /// when the stored kind equals the draft's kind; `None` when no such
    /// item exists.
    async fn update_fields(&self, id: ItemId, draft: ItemDraft)
        -> Result<Option<Item>, StoreError>;

    /// Returns whether an item was removed
    async fn delete_by_id(&self, id: ItemId) -> Result<bool, StoreError>;

    /// Atomically set the borrow flag to `borrowed`, only if it currently
    /// holds the opposite value. `None` when the item is missing or already
    /// in the requested state.
    async fn set_borrowed(&self, id: ItemId, borrowed: bool) -> Result<Option<Item>, StoreError>;

    /// Cheap liveness check of the backing store
    async fn ping(&self) -> Result<(), StoreError>;
}
