//! Read-only statistics over the book collection.

use std::collections::BTreeMap;

use serde::ser::{Serialize, Serializer};

use crate::models::Book;

/// Aggregated counts over one snapshot of the store.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BookStats {
    pub total_books: usize,
    pub books_by_author: BTreeMap<String, usize>,
    pub books_by_century: CenturyCounts,
}

impl BookStats {
    pub fn collect(books: &[Book]) -> Self {
        let mut books_by_author = BTreeMap::new();
        let mut centuries = BTreeMap::new();

        for book in books {
            *books_by_author.entry(book.author.clone()).or_insert(0) += 1;
            *centuries.entry(century_of(book.year)).or_insert(0) += 1;
        }

        Self {
            total_books: books.len(),
            books_by_author,
            books_by_century: CenturyCounts(centuries),
        }
    }
}

/// Century bucket for a publication year: `year / 100 + 1`.
pub fn century_of(year: i32) -> i32 {
    year.div_euclid(100) + 1
}

pub fn century_label(century: i32) -> String {
    format!("{} век", century)
}

/// Counts keyed by century number, serialized as labelled keys in
/// ascending numeric order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CenturyCounts(pub BTreeMap<i32, usize>);

impl Serialize for CenturyCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.0
                .iter()
                .map(|(century, count)| (century_label(*century), count)),
        )
    }
}
