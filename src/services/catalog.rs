//! Catalog management service

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{
        fields::{ItemFields, ItemPatch},
        item::{Item, ItemId, ItemKind},
    },
    repository::ItemStore,
    validation,
};

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn ItemStore>,
}

fn parse_id(id: &str) -> AppResult<ItemId> {
    id.parse::<ItemId>().map_err(|e| AppError::InvalidId(e.0))
}

fn not_found(id: ItemId) -> AppError {
    AppError::NotFound(format!("Item with id {} not found", id))
}

impl CatalogService {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self { store }
    }

    /// List every item in the catalog
    pub async fn list_all(&self) -> AppResult<Vec<Item>> {
        let items = self.store.find_all().await?;
        tracing::debug!("Catalog list: {} items", items.len());
        Ok(items)
    }

    /// Check that the item store answers
    pub async fn ping(&self) -> AppResult<()> {
        self.store.ping().await?;
        Ok(())
    }

    /// List items whose title or author/publisher contains `term`
    pub async fn search(&self, term: &str) -> AppResult<Vec<Item>> {
        let term = term.trim();
        let items = self.list_all().await?;
        if term.is_empty() {
            return Ok(items);
        }
        Ok(items.into_iter().filter(|item| item.matches(term)).collect())
    }

    /// Get item by ID
    pub async fn get_by_id(&self, id: &str) -> AppResult<Item> {
        let id = parse_id(id)?;
        self.store.find_by_id(id).await?.ok_or_else(|| not_found(id))
    }

    /// Create a new item of the given kind
    pub async fn create(&self, kind: &str, fields: &ItemFields) -> AppResult<Item> {
        let draft = validation::validate(kind, fields)?;

        match self.store.insert(draft).await {
            Ok(item) => {
                tracing::info!("Catalog create: {} id={} \"{}\"", item.kind(), item.id, item.title);
                Ok(item)
            }
            Err(e) => {
                let err = AppError::from(e);
                if let AppError::Conflict { field } = &err {
                    tracing::warn!("Catalog create rejected: duplicate {}", field);
                }
                Err(err)
            }
        }
    }

    /// Update the fields of an existing item. The kind, id and borrow state
    /// of the stored record are never changed by this operation.
    pub async fn update(&self, id: &str, patch: ItemPatch) -> AppResult<Item> {
        let id = parse_id(id)?;
        let existing = self.store.find_by_id(id).await?.ok_or_else(|| not_found(id))?;
        let kind = existing.kind();

        if let Some(ref requested) = patch.kind {
            if requested.parse::<ItemKind>().ok() != Some(kind) {
                tracing::warn!("Catalog update id={}: refused kind change to {:?}", id, requested);
                return Err(AppError::ImmutableField("kind"));
            }
        }
        if let Some(ref requested) = patch.id {
            if requested.parse::<ItemId>().ok() != Some(id) {
                return Err(AppError::ImmutableField("id"));
            }
        }
        if patch.is_borrowed.is_some_and(|b| b != existing.is_borrowed) {
            return Err(AppError::ImmutableField("isBorrowed"));
        }

        let merged = ItemFields::from(&existing).merged_with(patch.fields);
        let draft = validation::validate_kind(kind, &merged)?;

        let updated = self
            .store
            .update_fields(id, draft)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!("Catalog update: {} id={}", kind, id);
        Ok(updated)
    }

    /// Delete an item; `false` when nothing was stored under `id`
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let id = parse_id(id)?;
        let deleted = self.store.delete_by_id(id).await?;
        tracing::info!("Catalog delete: id={} deleted={}", id, deleted);
        Ok(deleted)
    }

    /// Mark an available item as borrowed
    pub async fn borrow(&self, id: &str) -> AppResult<Item> {
        let id = parse_id(id)?;
        self.transition(id, true).await
    }

    /// Mark a borrowed item as available again
    pub async fn return_item(&self, id: &str) -> AppResult<Item> {
        let id = parse_id(id)?;
        self.transition(id, false).await
    }

    async fn transition(&self, id: ItemId, borrowed: bool) -> AppResult<Item> {
        if let Some(item) = self.store.set_borrowed(id, borrowed).await? {
            tracing::info!(
                "Catalog {}: id={}",
                if borrowed { "borrow" } else { "return" },
                id
            );
            return Ok(item);
        }

        // The conditional update did not apply: either the item is gone or
        // it is already in the requested state.
        match self.store.find_by_id(id).await? {
            None => Err(not_found(id)),
            Some(_) if borrowed => {
                tracing::warn!("Catalog borrow refused: id={} already borrowed", id);
                Err(AppError::AlreadyBorrowed(id))
            }
            Some(_) => {
                tracing::warn!("Catalog return refused: id={} not borrowed", id);
                Err(AppError::NotCurrentlyBorrowed(id))
            }
        }
    }
}
