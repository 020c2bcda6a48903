//! Terminal User Interface module.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `events` - Background task event processing
//! - `render` - Layout, header and pagination footer
//! - `articles` - Article card grid
//! - `filters` - Filter bar and source picker
//! - `saved` - Saved articles panel
//! - `status` - Status bar widget
//! - `help` - Help overlay

mod articles;
mod events;
mod filters;
mod help;
mod input;
mod loop_runner;
mod render;
mod saved;
mod status;

pub use articles::format_relative_time;
pub use loop_runner::{run, Action};
