//! REST API module.
//!
//! Contains the book routes and handlers plus the extractors they share.

mod books;
mod extract;
mod root;

pub use books::*;
pub use extract::*;
pub use root::*;

/// Handler result; errors render through the shared error envelope.
pub type ApiResult<T> = Result<T, crate::errors::AppError>;
