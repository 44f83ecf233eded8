//! Terminal client for a categorized, searchable, paginated news feed.
//!
//! - [`controller`] - pagination state machine (category/search mode, page cursor)
//! - [`api`] - HTTP access to the feed endpoint
//! - [`feed`] - item, fact and query types
//! - [`session`] - interactive command loop driving the controller
//! - [`render`] - plain-text output
//! - [`config`] - TOML configuration with environment overrides
//! - [`util`] - URL validation and text helpers

pub mod api;
pub mod config;
pub mod controller;
pub mod feed;
pub mod render;
pub mod session;
pub mod util;
