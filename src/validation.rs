//! Required-field validation for catalog items.
//!
//! A field is "required" when it must be present and not empty/falsy after
//! coercion to its target type. Numeric fields holding `0` are treated as
//! missing, as are numbers or dates that fail to coerce.

use chrono::{DateTime, NaiveDate};
use thiserror::Error;

use crate::models::{
    fields::{FieldValue, ItemFields},
    item::{Book, IssueNumber, ItemDetails, ItemDraft, ItemKind, Magazine},
};

/// Required fields for books, in reporting order
pub const BOOK_REQUIRED: [&str; 5] = ["title", "author", "isbn", "publishedYear", "genre"];

/// Required fields for magazines, in reporting order
pub const MAGAZINE_REQUIRED: [&str; 4] = ["title", "publisher", "issueNumber", "publicationDate"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid item kind: {0}")]
    InvalidKind(String),

    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

/// Validate `fields` for the kind named by `kind`.
pub fn validate(kind: &str, fields: &ItemFields) -> Result<ItemDraft, ValidationError> {
    let kind = kind
        .parse::<ItemKind>()
        .map_err(|e| ValidationError::InvalidKind(e.0))?;
    validate_kind(kind, fields)
}

/// Validate `fields` for an already-resolved kind and build the typed draft.
pub fn validate_kind(kind: ItemKind, fields: &ItemFields) -> Result<ItemDraft, ValidationError> {
    let mut missing = Vec::new();
    let title = required(text(&fields.title), "title", &mut missing);

    let draft = match kind {
        ItemKind::Book => {
            let author = required(text(&fields.author), "author", &mut missing);
            let isbn = required(text(&fields.isbn), "isbn", &mut missing);
            let published_year = required(
                fields.published_year.as_ref().and_then(coerce_year),
                "publishedYear",
                &mut missing,
            );
            let genre = required(text(&fields.genre), "genre", &mut missing);

            match (title, author, isbn, published_year, genre) {
                (Some(title), Some(author), Some(isbn), Some(published_year), Some(genre)) => {
                    ItemDraft {
                        title,
                        details: ItemDetails::Book(Book {
                            author,
                            isbn,
                            published_year,
                            genre,
                        }),
                    }
                }
                _ => return Err(ValidationError::MissingFields(missing)),
            }
        }
        ItemKind::Magazine => {
            let publisher = required(text(&fields.publisher), "publisher", &mut missing);
            let issue_number = required(
                fields.issue_number.as_ref().and_then(coerce_issue_number),
                "issueNumber",
                &mut missing,
            );
            let publication_date = required(
                fields.publication_date.as_deref().and_then(coerce_date),
                "publicationDate",
                &mut missing,
            );

            match (title, publisher, issue_number, publication_date) {
                (Some(title), Some(publisher), Some(issue_number), Some(publication_date)) => {
                    ItemDraft {
                        title,
                        details: ItemDetails::Magazine(Magazine {
                            publisher,
                            issue_number,
                            publication_date,
                        }),
                    }
                }
                _ => return Err(ValidationError::MissingFields(missing)),
            }
        }
    };

    Ok(draft)
}

fn required<T>(value: Option<T>, name: &'static str, missing: &mut Vec<&'static str>) -> Option<T> {
    if value.is_none() {
        missing.push(name);
    }
    value
}

fn text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn coerce_year(value: &FieldValue) -> Option<i32> {
    let year = match value {
        FieldValue::Integer(n) => i32::try_from(*n).ok()?,
        FieldValue::Text(s) => s.trim().parse::<i32>().ok()?,
        FieldValue::Other(_) => return None,
    };
    (year != 0).then_some(year)
}

fn coerce_issue_number(value: &FieldValue) -> Option<IssueNumber> {
    match value {
        FieldValue::Integer(0) => None,
        FieldValue::Integer(n) => Some(IssueNumber::Number(*n)),
        FieldValue::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            match s.parse::<i64>() {
                Ok(0) => None,
                Ok(n) => Some(IssueNumber::Number(n)),
                Err(_) => Some(IssueNumber::Text(s.to_string())),
            }
        }
        FieldValue::Other(_) => None,
    }
}

fn coerce_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}
