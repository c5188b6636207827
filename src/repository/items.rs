//! PostgreSQL item store.
//!
//! Books and magazines share the `items` table; the variant columns of the
//! other kind stay NULL. Uniqueness of `isbn` / `issue_number` is enforced by
//! partial unique indexes and reported back as `StoreError::UniqueViolation`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, Pool, Postgres};
use uuid::Uuid;

use super::{ItemStore, StoreError};
use crate::models::item::{
    Book, IssueNumber, Item, ItemDetails, ItemDraft, ItemId, ItemKind, Magazine,
};

const ITEM_COLUMNS: &str = "id, kind, title, author, isbn, published_year, genre, \
     publisher, issue_number, publication_date, is_borrowed, created_at, updated_at";

const ISBN_INDEX: &str = "items_isbn_key";
const ISSUE_NUMBER_INDEX: &str = "items_issue_number_key";

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    kind: String,
    title: String,
    author: Option<String>,
    isbn: Option<String>,
    published_year: Option<i32>,
    genre: Option<String>,
    publisher: Option<String>,
    issue_number: Option<String>,
    publication_date: Option<NaiveDate>,
    is_borrowed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ItemRow> for Item {
    type Error = StoreError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |reason: String| StoreError::Corrupt {
            id: id.to_string(),
            reason,
        };

        let details = match row.kind.parse::<ItemKind>() {
            Ok(ItemKind::Book) => match (row.author, row.isbn, row.published_year, row.genre) {
                (Some(author), Some(isbn), Some(published_year), Some(genre)) => {
                    ItemDetails::Book(Book {
                        author,
                        isbn,
                        published_year,
                        genre,
                    })
                }
                _ => return Err(corrupt("book row without book columns".to_string())),
            },
            Ok(ItemKind::Magazine) => {
                match (row.publisher, row.issue_number, row.publication_date) {
                    (Some(publisher), Some(issue_number), Some(publication_date)) => {
                        ItemDetails::Magazine(Magazine {
                            publisher,
                            issue_number: IssueNumber::from_stored(&issue_number),
                            publication_date,
                        })
                    }
                    _ => return Err(corrupt("magazine row without magazine columns".to_string())),
                }
            }
            Err(e) => return Err(corrupt(e.to_string())),
        };

        Ok(Item {
            id: ItemId::from(id),
            title: row.title,
            details,
            is_borrowed: row.is_borrowed,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Variant columns of a draft, NULL for the other kind
struct VariantColumns<'a> {
    author: Option<&'a str>,
    isbn: Option<&'a str>,
    published_year: Option<i32>,
    genre: Option<&'a str>,
    publisher: Option<&'a str>,
    issue_number: Option<String>,
    publication_date: Option<NaiveDate>,
}

impl<'a> From<&'a ItemDetails> for VariantColumns<'a> {
    fn from(details: &'a ItemDetails) -> Self {
        match details {
            ItemDetails::Book(book) => Self {
                author: Some(&book.author),
                isbn: Some(&book.isbn),
                published_year: Some(book.published_year),
                genre: Some(&book.genre),
                publisher: None,
                issue_number: None,
                publication_date: None,
            },
            ItemDetails::Magazine(magazine) => Self {
                author: None,
                isbn: None,
                published_year: None,
                genre: None,
                publisher: Some(&magazine.publisher),
                issue_number: Some(magazine.issue_number.to_string()),
                publication_date: Some(magazine.publication_date),
            },
        }
    }
}

/// Translate unique index violations; everything else is a plain database error.
fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db) = err {
        if db.is_unique_violation() {
            match db.constraint() {
                Some(ISBN_INDEX) => return StoreError::UniqueViolation { field: "isbn" },
                Some(ISSUE_NUMBER_INDEX) => {
                    return StoreError::UniqueViolation { field: "issueNumber" }
                }
                _ => {}
            }
        }
    }
    StoreError::Database(err)
}

#[derive(Clone)]
pub struct PgItemStore {
    pool: Pool<Postgres>,
}

impl PgItemStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemStore for PgItemStore {
    async fn insert(&self, draft: ItemDraft) -> Result<Item, StoreError> {
        let columns = VariantColumns::from(&draft.details);
        let query = format!(
            r#"
            INSERT INTO items (id, kind, title, author, isbn, published_year, genre,
                               publisher, issue_number, publication_date, is_borrowed,
                               created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, FALSE, NOW(), NOW())
            RETURNING {}
            "#,
            ITEM_COLUMNS
        );

        let row = sqlx::query_as::<_, ItemRow>(&query)
            .bind(Uuid::new_v4())
            .bind(draft.kind().as_str())
            .bind(&draft.title)
            .bind(columns.author)
            .bind(columns.isbn)
            .bind(columns.published_year)
            .bind(columns.genre)
            .bind(columns.publisher)
            .bind(columns.issue_number)
            .bind(columns.publication_date)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;

        let item = Item::try_from(row)?;
        tracing::debug!("Inserted item row id={}", item.id);
        Ok(item)
    }

    async fn find_by_id(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        let query = format!("SELECT {} FROM items WHERE id = $1", ITEM_COLUMNS);
        sqlx::query_as::<_, ItemRow>(&query)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(Item::try_from)
            .transpose()
    }

    async fn find_all(&self) -> Result<Vec<Item>, StoreError> {
        let query = format!("SELECT {} FROM items", ITEM_COLUMNS);
        sqlx::query_as::<_, ItemRow>(&query)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Item::try_from)
            .collect()
    }

    async fn update_fields(
        &self,
        id: ItemId,
        draft: ItemDraft,
    ) -> Result<Option<Item>, StoreError> {
        let columns = VariantColumns::from(&draft.details);
        let query = format!(
            r#"
            UPDATE items
            SET title = $3, author = $4, isbn = $5, published_year = $6, genre = $7,
                publisher = $8, issue_number = $9, publication_date = $10,
                updated_at = NOW()
            WHERE id = $1 AND kind = $2
            RETURNING {}
            "#,
            ITEM_COLUMNS
        );

        sqlx::query_as::<_, ItemRow>(&query)
            .bind(id.as_uuid())
            .bind(draft.kind().as_str())
            .bind(&draft.title)
            .bind(columns.author)
            .bind(columns.isbn)
            .bind(columns.published_year)
            .bind(columns.genre)
            .bind(columns.publisher)
            .bind(columns.issue_number)
            .bind(columns.publication_date)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?
            .map(Item::try_from)
            .transpose()
    }

    async fn delete_by_id(&self, id: ItemId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_borrowed(&self, id: ItemId, borrowed: bool) -> Result<Option<Item>, StoreError> {
        // The WHERE clause on the current flag makes the transition a single
        // compare-and-set: concurrent callers cannot both succeed.
        let query = format!(
            r#"
            UPDATE items
            SET is_borrowed = $2, updated_at = NOW()
            WHERE id = $1 AND is_borrowed = $3
            RETURNING {}
            "#,
            ITEM_COLUMNS
        );

        sqlx::query_as::<_, ItemRow>(&query)
            .bind(id.as_uuid())
            .bind(borrowed)
            .bind(!borrowed)
            .fetch_optional(&self.pool)
            .await?
            .map(Item::try_from)
            .transpose()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
