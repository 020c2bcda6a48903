//! Terminal dashboard for a topical news feed.
//!
//! Articles are fetched from a NewsAPI-style endpoint ([`feed`]), normalised,
//! and shown through a filter → sort → paginate pipeline ([`pipeline`]).
//! Fetches are single-flight and optionally repeated on a timer
//! ([`refresh`]); bookmarks live in memory and can be written through to
//! SQLite ([`storage`]).

pub mod app;
pub mod config;
pub mod feed;
pub mod pipeline;
pub mod refresh;
pub mod share;
pub mod storage;
pub mod ui;
pub mod util;
