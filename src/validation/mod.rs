//! Field-level validation for book payloads and list parameters.
//!
//! Every check runs and every violation is reported, so a client can fix a
//! payload in one round trip.

use chrono::{Datelike, Utc};
use serde::Serialize;

use crate::models::{BookPatch, BookPayload};

pub const TITLE_MAX_LEN: usize = 200;
pub const AUTHOR_MAX_LEN: usize = 100;
pub const ISBN_MIN_LEN: usize = 10;
pub const ISBN_MAX_LEN: usize = 13;
pub const MIN_YEAR: i32 = 1000;

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;

/// A single violated constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// The current calendar year in UTC, the upper bound for `year`.
pub fn current_year() -> i32 {
    Utc::now().year()
}

/// Validate a create or full-update payload.
pub fn validate_payload(
    payload: BookPayload,
    current_year: i32,
) -> Result<BookPayload, Vec<FieldError>> {
    let mut errors = Vec::new();

    let title = check_text("title", &payload.title, 1, TITLE_MAX_LEN, &mut errors);
    let author = check_text("author", &payload.author, 1, AUTHOR_MAX_LEN, &mut errors);
    check_year(payload.year, current_year, &mut errors);
    let isbn = payload
        .isbn
        .as_deref()
        .map(|isbn| check_text("isbn", isbn, ISBN_MIN_LEN, ISBN_MAX_LEN, &mut errors));

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(BookPayload {
        title,
        author,
        year: payload.year,
        isbn,
    })
}

/// Validate only the fields present in a partial update.
pub fn validate_patch(patch: BookPatch, current_year: i32) -> Result<BookPatch, Vec<FieldError>> {
    let mut errors = Vec::new();

    let title = patch
        .title
        .as_deref()
        .map(|t| check_text("title", t, 1, TITLE_MAX_LEN, &mut errors));
    let author = patch
        .author
        .as_deref()
        .map(|a| check_text("author", a, 1, AUTHOR_MAX_LEN, &mut errors));
    if let Some(year) = patch.year {
        check_year(year, current_year, &mut errors);
    }
    let isbn = patch.isbn.as_ref().map(|isbn| {
        isbn.as_deref()
            .map(|i| check_text("isbn", i, ISBN_MIN_LEN, ISBN_MAX_LEN, &mut errors))
    });

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(BookPatch {
        title,
        author,
        year: patch.year,
        isbn,
    })
}

/// Validated `skip`/`limit` window over a filtered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub skip: usize,
    pub limit: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Check raw query values; `None` takes the default.
pub fn validate_pagination(
    skip: Option<i64>,
    limit: Option<i64>,
) -> Result<Pagination, Vec<FieldError>> {
    let mut errors = Vec::new();
    let mut page = Pagination::default();

    if let Some(skip) = skip {
        match usize::try_from(skip) {
            Ok(skip) => page.skip = skip,
            Err(_) => errors.push(FieldError::new("skip", "must be greater than or equal to 0")),
        }
    }

    if let Some(limit) = limit {
        match usize::try_from(limit) {
            Ok(limit) if (1..=MAX_LIMIT).contains(&limit) => page.limit = limit,
            _ => errors.push(FieldError::new(
                "limit",
                format!("must be between 1 and {}", MAX_LIMIT),
            )),
        }
    }

    if errors.is_empty() {
        Ok(page)
    } else {
        Err(errors)
    }
}

/// Trim `value` and check its length in characters. Returns the trimmed value.
fn check_text(
    field: &str,
    value: &str,
    min: usize,
    max: usize,
    errors: &mut Vec<FieldError>,
) -> String {
    let trimmed = value.trim();
    let len = trimmed.chars().count();

    if len == 0 && min > 0 {
        errors.push(FieldError::new(field, "must not be empty"));
    } else if len < min {
        errors.push(FieldError::new(
            field,
            format!("must be at least {} characters", min),
        ));
    } else if len > max {
        errors.push(FieldError::new(
            field,
            format!("must be at most {} characters", max),
        ));
    }

    trimmed.to_string()
}

fn check_year(year: i32, current_year: i32, errors: &mut Vec<FieldError>) {
    if year < MIN_YEAR || year > current_year {
        errors.push(FieldError::new(
            "year",
            format!("must be between {} and {}", MIN_YEAR, current_year),
        ));
    }
}
