mod bookmarks;
mod saved_articles;
mod schema;
mod types;

pub use bookmarks::{BookmarkChange, BookmarkStore};
pub use schema::Database;
pub use types::DatabaseError;
