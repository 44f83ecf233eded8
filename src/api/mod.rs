//! Feed API access.
//!
//! One GET per page, no retries. See [`FeedClient::fetch_page`].

mod client;

pub use client::{
    ClientSettings, FeedClient, FetchError, DEFAULT_MAX_RESPONSE_BYTES, DEFAULT_TIMEOUT,
};
