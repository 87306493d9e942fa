//! List predicates. All provided predicates must hold.

use crate::models::Book;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    /// Case-insensitive substring of the author
    pub author: Option<String>,
    /// Inclusive lower bound on year
    pub year_from: Option<i32>,
    /// Inclusive upper bound on year
    pub year_to: Option<i32>,
}

impl BookFilter {
    pub fn matches(&self, book: &Book) -> bool {
        if let Some(author) = &self.author {
            if !book.author.to_lowercase().contains(&author.to_lowercase()) {
                return false;
            }
        }
        if self.year_from.is_some_and(|from| book.year < from) {
            return false;
        }
        if self.year_to.is_some_and(|to| book.year > to) {
            return false;
        }
        true
    }
}
