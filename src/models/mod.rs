//! Data models for the Books API.

mod book;

pub use book::*;
