//! Item (catalog) endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::AppJson;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult, ErrorResponse},
    models::{
        fields::{ItemFields, ItemPatch},
        item::{IssueNumber, Item, ItemDetails, ItemKind},
    },
};

/// Item as returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    pub id: Uuid,
    pub kind: ItemKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_number: Option<IssueNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<NaiveDate>,
    pub is_borrowed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        let kind = item.kind();
        let mut response = ItemResponse {
            id: item.id.as_uuid(),
            kind,
            title: item.title,
            author: None,
            isbn: None,
            published_year: None,
            genre: None,
            publisher: None,
            issue_number: None,
            publication_date: None,
            is_borrowed: item.is_borrowed,
            created_at: item.created_at,
            updated_at: item.updated_at,
        };
        match item.details {
            ItemDetails::Book(book) => {
                response.author = Some(book.author);
                response.isbn = Some(book.isbn);
                response.published_year = Some(book.published_year);
                response.genre = Some(book.genre);
            }
            ItemDetails::Magazine(magazine) => {
                response.publisher = Some(magazine.publisher);
                response.issue_number = Some(magazine.issue_number);
                response.publication_date = Some(magazine.publication_date);
            }
        }
        response
    }
}

/// Create item request: the kind plus its fields
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateItemRequest {
    /// `book` or `magazine`; absent is reported as an invalid kind
    #[serde(
        default,
        alias = "itemType",
        deserialize_with = "crate::models::fields::lenient_text"
    )]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub fields: ItemFields,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListItemsQuery {
    /// Case-insensitive filter on title and author/publisher
    pub q: Option<String>,
}

/// List items
#[utoipa::path(
    get,
    path = "/items",
    tag = "items",
    params(ListItemsQuery),
    responses(
        (status = 200, description = "List of items", body = Vec<ItemResponse>)
    )
)]
pub async fn list_items(
    State(state): State<crate::AppState>,
    Query(query): Query<ListItemsQuery>,
) -> AppResult<Json<Vec<ItemResponse>>> {
    let catalog = &state.services.catalog;
    let items = match query.q.as_deref() {
        Some(term) => catalog.search(term).await?,
        None => catalog.list_all().await?,
    };
    Ok(Json(items.into_iter().map(ItemResponse::from).collect()))
}

/// Get item details by ID
#[utoipa::path(
    get,
    path = "/items/{id}",
    tag = "items",
    params(
        ("id" = String, Path, description = "Item ID (UUID)")
    ),
    responses(
        (status = 200, description = "Item details", body = ItemResponse),
        (status = 400, description = "Malformed item ID", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse)
    )
)]
pub async fn get_item(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ItemResponse>> {
    let item = state.services.catalog.get_by_id(&id).await?;
    Ok(Json(item.into()))
}

/// Create a new item
#[utoipa::path(
    post,
    path = "/items",
    tag = "items",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created", body = ItemResponse),
        (status = 400, description = "Invalid kind, missing fields or malformed body", body = ErrorResponse),
        (status = 409, description = "Duplicate ISBN or issue number", body = ErrorResponse)
    )
)]
pub async fn create_item(
    State(state): State<crate::AppState>,
    AppJson(request): AppJson<CreateItemRequest>,
) -> AppResult<(StatusCode, Json<ItemResponse>)> {
    let kind = request.kind.as_deref().unwrap_or_default();
    let created = state
        .services
        .catalog
        .create(kind, &request.fields)
        .await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Update an existing item
#[utoipa::path(
    put,
    path = "/items/{id}",
    tag = "items",
    params(
        ("id" = String, Path, description = "Item ID (UUID)")
    ),
    request_body = ItemPatch,
    responses(
        (status = 200, description = "Item updated", body = ItemResponse),
        (status = 400, description = "Invalid patch", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse),
        (status = 409, description = "Duplicate ISBN or issue number", body = ErrorResponse)
    )
)]
pub async fn update_item(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    AppJson(patch): AppJson<ItemPatch>,
) -> AppResult<Json<ItemResponse>> {
    let updated = state.services.catalog.update(&id, patch).await?;
    Ok(Json(updated.into()))
}

/// Delete an item
#[utoipa::path(
    delete,
    path = "/items/{id}",
    tag = "items",
    params(
        ("id" = String, Path, description = "Item ID (UUID)")
    ),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 404, description = "Item not found", body = ErrorResponse)
    )
)]
pub async fn delete_item(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    if state.services.catalog.delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Item with id {} not found", id)))
    }
}

/// Borrow an item
#[utoipa::path(
    post,
    path = "/items/{id}/borrow",
    tag = "items",
    params(
        ("id" = String, Path, description = "Item ID (UUID)")
    ),
    responses(
        (status = 200, description = "Item borrowed", body = ItemResponse),
        (status = 404, description = "Item not found", body = ErrorResponse),
        (status = 409, description = "Item already borrowed", body = ErrorResponse)
    )
)]
pub async fn borrow_item(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ItemResponse>> {
    let item = state.services.catalog.borrow(&id).await?;
    Ok(Json(item.into()))
}

/// Return a borrowed item
#[utoipa::path(
    post,
    path = "/items/{id}/return",
    tag = "items",
    params(
        ("id" = String, Path, description = "Item ID (UUID)")
    ),
    responses(
        (status = 200, description = "Item returned", body = ItemResponse),
        (status = 404, description = "Item not found", body = ErrorResponse),
        (status = 409, description = "Item not currently borrowed", body = ErrorResponse)
    )
)]
pub async fn return_item(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ItemResponse>> {
    let item = state.services.catalog.return_item(&id).await?;
    Ok(Json(item.into()))
}
