//! SQLite persistence layer.
//!
//! A single [`Database`] handle (a thin newtype over an sqlx pool) is
//! constructed at startup and passed wherever persistence is needed — there
//! is no process-wide singleton. Operations are split per entity across
//! submodules, each an `impl Database` block.
//!
//! Cascade semantics live here, not in the schema: deleting a feed or an
//! article removes its children first in application code (see
//! [`Database::delete_feed`] and [`Database::delete_article`]).

mod articles;
mod feeds;
mod highlights;
mod schema;
mod types;

pub use schema::Database;
pub use types::{
    Article, ArticleSummary, DatabaseError, Feed, Highlight, HighlightWithTitle, NewFeedItem,
    UnreadItem,
};
