//! Loosely-typed item fields as submitted by callers, before validation.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::item::{IssueNumber, Item, ItemDetails};

/// Scalar submitted for a numeric-ish field: a JSON number or a string.
/// Anything else (booleans, fractions, arrays...) lands in `Other` and is
/// treated as missing by validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
    Other(Value),
}

/// Keep string values only; any other JSON type reads as absent.
pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Integer(n)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<&IssueNumber> for FieldValue {
    fn from(n: &IssueNumber) -> Self {
        match n {
            IssueNumber::Number(n) => FieldValue::Integer(*n),
            IssueNumber::Text(s) => FieldValue::Text(s.clone()),
        }
    }
}

/// Item fields for both kinds. Fields that do not belong to the validated
/// kind are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemFields {
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    // Book
    #[serde(default, deserialize_with = "lenient_text")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub isbn: Option<String>,
    pub published_year: Option<FieldValue>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub genre: Option<String>,
    // Magazine
    #[serde(default, deserialize_with = "lenient_text")]
    pub publisher: Option<String>,
    pub issue_number: Option<FieldValue>,
    /// `YYYY-MM-DD` or RFC 3339
    #[serde(default, deserialize_with = "lenient_text")]
    pub publication_date: Option<String>,
}

impl ItemFields {
    /// Overlay `patch` on top of `self`; fields present in the patch win.
    pub fn merged_with(self, patch: ItemFields) -> Self {
        Self {
            title: patch.title.or(self.title),
            author: patch.author.or(self.author),
            isbn: patch.isbn.or(self.isbn),
            published_year: patch.published_year.or(self.published_year),
            genre: patch.genre.or(self.genre),
            publisher: patch.publisher.or(self.publisher),
            issue_number: patch.issue_number.or(self.issue_number),
            publication_date: patch.publication_date.or(self.publication_date),
        }
    }
}

impl From<&Item> for ItemFields {
    fn from(item: &Item) -> Self {
        let mut fields = ItemFields {
            title: Some(item.title.clone()),
            ..Default::default()
        };
        match &item.details {
            ItemDetails::Book(book) => {
                fields.author = Some(book.author.clone());
                fields.isbn = Some(book.isbn.clone());
                fields.published_year = Some(FieldValue::Integer(i64::from(book.published_year)));
                fields.genre = Some(book.genre.clone());
            }
            ItemDetails::Magazine(magazine) => {
                fields.publisher = Some(magazine.publisher.clone());
                fields.issue_number = Some(FieldValue::from(&magazine.issue_number));
                fields.publication_date =
                    Some(magazine.publication_date.format("%Y-%m-%d").to_string());
            }
        }
        fields
    }
}

/// Partial update of an item. `kind`, `id` and `isBorrowed` are accepted on
/// the wire only so that attempts to change them can be rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    pub kind: Option<String>,
    pub id: Option<String>,
    pub is_borrowed: Option<bool>,
    #[serde(flatten)]
    pub fields: ItemFields,
}

impl From<ItemFields> for ItemPatch {
    fn from(fields: ItemFields) -> Self {
        Self {
            fields,
            ..Default::default()
        }
    }
}
