//! Item (catalog entry) model and related types.
//!
//! An item is a closed tagged union over books and magazines. The common
//! record carries identity, title, borrow state and store timestamps; the
//! variant carries the kind-specific fields.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Store-assigned item identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    /// Generate a fresh identifier
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for ItemId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// A string that does not parse as an item identifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed item id: {0}")]
pub struct MalformedId(pub String);

impl FromStr for ItemId {
    type Err = MalformedId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| MalformedId(s.to_string()))
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Item discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Book,
    Magazine,
}

impl ItemKind {
    /// Stored / wire code for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Book => "book",
            ItemKind::Magazine => "magazine",
        }
    }
}

/// A kind outside the closed `{book, magazine}` set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown item kind: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for ItemKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("book") {
            Ok(ItemKind::Book)
        } else if s.eq_ignore_ascii_case("magazine") {
            Ok(ItemKind::Magazine)
        } else {
            Err(UnknownKind(s.to_string()))
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Magazine issue number: either a plain integer or free text (e.g. "Spring 2024")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum IssueNumber {
    Number(i64),
    Text(String),
}

impl IssueNumber {
    /// Rebuild an issue number from its stored text column
    pub fn from_stored(s: &str) -> Self {
        match s.parse::<i64>() {
            Ok(n) => IssueNumber::Number(n),
            Err(_) => IssueNumber::Text(s.to_string()),
        }
    }
}

impl fmt::Display for IssueNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueNumber::Number(n) => write!(f, "{}", n),
            IssueNumber::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub author: String,
    pub isbn: String,
    pub published_year: i32,
    pub genre: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Magazine {
    pub publisher: String,
    pub issue_number: IssueNumber,
    pub publication_date: NaiveDate,
}

/// Kind-specific part of an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemDetails {
    Book(Book),
    Magazine(Magazine),
}

impl ItemDetails {
    pub fn kind(&self) -> ItemKind {
        match self {
            ItemDetails::Book(_) => ItemKind::Book,
            ItemDetails::Magazine(_) => ItemKind::Magazine,
        }
    }
}

/// Validated, store-ready content of an item (everything the store does not own)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDraft {
    pub title: String,
    pub details: ItemDetails,
}

impl ItemDraft {
    pub fn kind(&self) -> ItemKind {
        self.details.kind()
    }
}

/// Stored catalog item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub details: ItemDetails,
    pub is_borrowed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn kind(&self) -> ItemKind {
        self.details.kind()
    }

    /// Case-insensitive substring match over the title and the author (books)
    /// or publisher (magazines).
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        let second = match &self.details {
            ItemDetails::Book(book) => &book.author,
            ItemDetails::Magazine(magazine) => &magazine.publisher,
        };
        self.title.to_lowercase().contains(&term) || second.to_lowercase().contains(&term)
    }
}
