//! Book model and the request bodies that create or change it.

use serde::{Deserialize, Deserializer, Serialize};

/// A book entry managed by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub year: i32,
    pub isbn: Option<String>,
}

impl Book {
    /// Build a record from a validated payload and a store-issued id.
    pub fn from_payload(id: i64, payload: BookPayload) -> Self {
        Self {
            id,
            title: payload.title,
            author: payload.author,
            year: payload.year,
            isbn: payload.isbn,
        }
    }

    /// Replace every field except the id.
    pub fn replace_with(&mut self, payload: BookPayload) {
        self.title = payload.title;
        self.author = payload.author;
        self.year = payload.year;
        self.isbn = payload.isbn;
    }
}

/// Request body for creating a book or replacing one in full.
///
/// A client-supplied `id` is not part of the payload and is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BookPayload {
    pub title: String,
    pub author: String,
    pub year: i32,
    #[serde(default)]
    pub isbn: Option<String>,
}

/// Request body for a partial update.
///
/// Only fields present in the body are applied. For `isbn`, an explicit
/// `null` clears the value while an absent key leaves it alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BookPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub isbn: Option<Option<String>>,
}

impl BookPatch {
    /// Merge the present fields into `book`.
    pub fn apply_to(self, book: &mut Book) {
        if let Some(title) = self.title {
            book.title = title;
        }
        if let Some(author) = self.author {
            book.author = author;
        }
        if let Some(year) = self.year {
            book.year = year;
        }
        if let Some(isbn) = self.isbn {
            book.isbn = isbn;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.year.is_none() && self.isbn.is_none()
    }
}

/// Maps a present key to `Some(value)`, including `Some(None)` for `null`.
/// Absent keys fall through to `#[serde(default)]`.
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
