//! Data models for the catalog

pub mod fields;
pub mod item;

// Re-export commonly used types
pub use fields::{FieldValue, ItemFields, ItemPatch};
pub use item::{Book, IssueNumber, Item, ItemDetails, ItemDraft, ItemId, ItemKind, Magazine};
