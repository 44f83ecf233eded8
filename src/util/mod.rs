//! Utility functions for common operations.
//!
//! - **URL validation**: checks the configured feed API base URL
//! - **Text processing**: Unicode-aware width, truncation, wrapping and
//!   terminal-safe output of API-provided text

mod text;
mod url_validator;

pub use text::{display_width, strip_control_chars, truncate_to_width, wrap_to_width};
pub use url_validator::{validate_api_url, UrlValidationError};

/// Maximum search query length in characters; longer input is cut
pub const MAX_SEARCH_QUERY_LENGTH: usize = 256;
