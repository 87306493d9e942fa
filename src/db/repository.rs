//! Database repository mirroring book writes to SQLite.

use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::Book;

/// SQLite-backed persistence for books.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Load every stored book in id order, which is creation order.
    pub async fn load_books(&self) -> Result<Vec<Book>, AppError> {
        let rows = sqlx::query("SELECT id, title, author, year, isbn FROM books ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(book_from_row).collect())
    }

    /// Highest id ever issued, including ids of deleted books.
    pub async fn last_issued_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT last_book_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("last_book_id"))
    }

    /// Insert a new book and advance the id watermark in one transaction.
    pub async fn insert_book(&self, book: &Book) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO books (id, title, author, year, isbn) VALUES (?, ?, ?, ?, ?)")
            .bind(book.id)
            .bind(&book.title)
            .bind(&book.author)
            .bind(book.year)
            .bind(&book.isbn)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE meta SET last_book_id = MAX(last_book_id, ?) WHERE id = 1")
            .bind(book.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Overwrite every column of an existing book.
    pub async fn replace_book(&self, book: &Book) -> Result<(), AppError> {
        let result =
            sqlx::query("UPDATE books SET title = ?, author = ?, year = ?, isbn = ? WHERE id = ?")
                .bind(&book.title)
                .bind(&book.author)
                .bind(book.year)
                .bind(&book.isbn)
                .bind(book.id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::book_not_found(book.id));
        }
        Ok(())
    }

    /// Delete a book.
    pub async fn delete_book(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::book_not_found(id));
        }
        Ok(())
    }
}

fn book_from_row(row: &sqlx::sqlite::SqliteRow) -> Book {
    Book {
        id: row.get("id"),
        title: row.get("title"),
        author: row.get("author"),
        year: row.get("year"),
        isbn: row.get("isbn"),
    }
}
