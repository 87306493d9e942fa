//! In-memory book store.
//!
//! Holds the ordered collection and the last issued id behind one lock, so
//! every operation sees and leaves a consistent state. When a repository is
//! attached, each write is persisted before it becomes visible in memory.
//!
//! Writes run on a detached task that owns the write guard. A caller that
//! goes away mid-write (client disconnect, timeout) cannot leave SQLite and
//! memory disagreeing: the task always finishes both halves or neither.

mod filter;

pub use filter::*;

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{Book, BookPatch, BookPayload};
use crate::stats::BookStats;
use crate::validation::{self, Pagination};

#[derive(Debug, Default)]
struct StoreState {
    /// Creation order. Ids are strictly increasing along this vector.
    books: Vec<Book>,
    last_id: i64,
}

impl StoreState {
    fn position(&self, id: i64) -> Result<usize, AppError> {
        self.books
            .binary_search_by_key(&id, |b| b.id)
            .map_err(|_| AppError::book_not_found(id))
    }
}

type StateGuard = OwnedRwLockWriteGuard<StoreState>;

/// Owner of the authoritative book collection.
pub struct BookStore {
    state: Arc<RwLock<StoreState>>,
    repo: Option<Repository>,
}

impl Default for BookStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BookStore {
    /// Create an empty, memory-only store.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
            repo: None,
        }
    }

    /// Create a store backed by SQLite, loading what is already persisted.
    pub async fn open(repo: Repository) -> Result<Self, AppError> {
        let books = repo.load_books().await?;
        let max_loaded = books.last().map(|b| b.id).unwrap_or(0);
        let last_id = repo.last_issued_id().await?.max(max_loaded);

        tracing::info!("Loaded {} books (last issued id {})", books.len(), last_id);

        Ok(Self {
            state: Arc::new(RwLock::new(StoreState { books, last_id })),
            repo: Some(repo),
        })
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.books.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Validate and insert a new book under the next id.
    ///
    /// A rejected payload or a failed write does not consume an id.
    pub async fn create(&self, payload: BookPayload) -> Result<Book, AppError> {
        let payload = validation::validate_payload(payload, validation::current_year())?;

        self.write(move |mut state, repo| async move {
            let book = Book::from_payload(state.last_id + 1, payload);

            if let Some(repo) = &repo {
                repo.insert_book(&book).await?;
            }

            state.last_id = book.id;
            state.books.push(book.clone());

            tracing::info!("Created book {} ({:?})", book.id, book.title);
            Ok(book)
        })
        .await
    }

    /// Get a book by id.
    pub async fn get(&self, id: i64) -> Result<Book, AppError> {
        let state = self.state.read().await;
        let idx = state.position(id)?;
        Ok(state.books[idx].clone())
    }

    /// Filtered page of books in creation order.
    pub async fn list(&self, filter: &BookFilter, page: Pagination) -> Vec<Book> {
        let state = self.state.read().await;
        state
            .books
            .iter()
            .filter(|b| filter.matches(b))
            .skip(page.skip)
            .take(page.limit)
            .cloned()
            .collect()
    }

    /// Replace every field of a book; the id is kept.
    pub async fn update(&self, id: i64, payload: BookPayload) -> Result<Book, AppError> {
        let payload = validation::validate_payload(payload, validation::current_year())?;

        self.write(move |state, repo| async move {
            let updated = replace_book(state, repo, id, |book| book.replace_with(payload)).await?;
            tracing::info!("Updated book {}", id);
            Ok(updated)
        })
        .await
    }

    /// Apply only the fields present in `patch`.
    pub async fn patch(&self, id: i64, patch: BookPatch) -> Result<Book, AppError> {
        let patch = validation::validate_patch(patch, validation::current_year())?;

        if patch.is_empty() {
            return self.get(id).await;
        }

        self.write(move |state, repo| async move {
            let patched = replace_book(state, repo, id, |book| patch.apply_to(book)).await?;
            tracing::info!("Patched book {}", id);
            Ok(patched)
        })
        .await
    }

    /// Remove a book. Deleting twice fails the second time.
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        self.write(move |mut state, repo| async move {
            let idx = state.position(id)?;

            if let Some(repo) = &repo {
                repo.delete_book(id).await?;
            }
            state.books.remove(idx);

            tracing::info!("Deleted book {}", id);
            Ok(())
        })
        .await
    }

    /// Statistics over a single snapshot of the collection.
    pub async fn stats(&self) -> BookStats {
        let state = self.state.read().await;
        BookStats::collect(&state.books)
    }

    /// Run a mutation to completion on its own task, holding the write lock.
    ///
    /// Only waiting for the lock can be cancelled; once the guard is taken the
    /// task owns it and finishes even if the returned future is dropped.
    async fn write<T, F, Fut>(&self, op: F) -> Result<T, AppError>
    where
        F: FnOnce(StateGuard, Option<Repository>) -> Fut,
        Fut: Future<Output = Result<T, AppError>> + Send + 'static,
        T: Send + 'static,
    {
        let state = self.state.clone().write_owned().await;
        let task = tokio::spawn(op(state, self.repo.clone()));

        task.await.map_err(|e| {
            tracing::error!("Store write task failed: {}", e);
            AppError::Internal(format!("Store write task failed: {}", e))
        })?
    }
}

/// Persist and apply an in-place edit of one book.
async fn replace_book(
    mut state: StateGuard,
    repo: Option<Repository>,
    id: i64,
    edit: impl FnOnce(&mut Book),
) -> Result<Book, AppError> {
    let idx = state.position(id)?;

    let mut edited = state.books[idx].clone();
    edit(&mut edited);

    if let Some(repo) = &repo {
        repo.replace_book(&edited).await?;
    }
    state.books[idx] = edited.clone();

    Ok(edited)
}
