//! Feed data model.
//!
//! - [`item`] - `FeedItem`, `Fact` and the response envelope, decoded leniently
//! - [`query`] - category/search mode and the request parameters built from it

mod item;
mod query;

pub use item::{Fact, FeedItem, FeedResponse, ItemKey};
pub use query::{FeedQuery, Mode};
