//! Book API endpoints.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use super::{ApiResult, AppJson, AppPath, AppQuery};
use crate::models::{Book, BookPatch, BookPayload};
use crate::stats::BookStats;
use crate::store::BookFilter;
use crate::validation;
use crate::AppState;

/// Query parameters for listing books.
#[derive(Debug, Default, Deserialize)]
pub struct ListBooksQuery {
    /// Case-insensitive author substring.
    pub author: Option<String>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    /// Offset into the filtered list (default: 0).
    pub skip: Option<i64>,
    /// Page size (default: 10, at most 100).
    pub limit: Option<i64>,
}

/// GET /api/books - List books with optional filters and pagination.
pub async fn list_books(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ListBooksQuery>,
) -> ApiResult<Json<Vec<Book>>> {
    let page = validation::validate_pagination(params.skip, params.limit)?;
    let filter = BookFilter {
        author: params.author.filter(|a| !a.is_empty()),
        year_from: params.year_from,
        year_to: params.year_to,
    };

    let books = state.store.list(&filter, page).await;
    tracing::debug!("Listed {} books", books.len());
    Ok(Json(books))
}

/// GET /api/books/stats - Counts by author and by century.
pub async fn book_stats(State(state): State<AppState>) -> Json<BookStats> {
    Json(state.store.stats().await)
}

/// GET /api/books/{id} - Get a single book.
pub async fn get_book(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Json<Book>> {
    Ok(Json(state.store.get(id).await?))
}

/// POST /api/books - Create a new book.
pub async fn create_book(
    State(state): State<AppState>,
    AppJson(payload): AppJson<BookPayload>,
) -> ApiResult<(StatusCode, Json<Book>)> {
    let book = state.store.create(payload).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// PUT /api/books/{id} - Replace a book.
pub async fn update_book(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<BookPayload>,
) -> ApiResult<Json<Book>> {
    Ok(Json(state.store.update(id, payload).await?))
}

/// PATCH /api/books/{id} - Change only the fields present in the body.
pub async fn patch_book(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppJson(patch): AppJson<BookPatch>,
) -> ApiResult<Json<Book>> {
    Ok(Json(state.store.patch(id, patch).await?))
}

/// DELETE /api/books/{id} - Delete a book.
pub async fn delete_book(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<StatusCode> {
    state.store.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
