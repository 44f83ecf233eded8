use crate::util::MAX_SEARCH_QUERY_LENGTH;
use std::fmt;

/// What the feed is currently filtered by.
///
/// Category mode and search mode are mutually exclusive. An empty category
/// id selects the API's unfiltered feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Category(String),
    Search(String),
}

impl Mode {
    /// Search mode for `text`, trimmed and cut to
    /// [`MAX_SEARCH_QUERY_LENGTH`] characters. Blank text yields `None`.
    pub fn search(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(Mode::Search(text.chars().take(MAX_SEARCH_QUERY_LENGTH).collect()))
    }

    /// Build the request parameters for `page` under this mode.
    pub fn query(&self, page: u32) -> FeedQuery {
        match self {
            Mode::Category(id) => FeedQuery {
                category: id.clone(),
                query: String::new(),
                page,
            },
            Mode::Search(text) => FeedQuery {
                category: String::new(),
                query: text.clone(),
                page,
            },
        }
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Category(String::new())
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Category(id) if id.is_empty() => write!(f, "all news"),
            Mode::Category(id) => write!(f, "category '{}'", id),
            Mode::Search(text) => write!(f, "search \"{}\"", text),
        }
    }
}

/// Exact parameters of one feed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    /// Topic id; empty in search mode.
    pub category: String,
    /// Free-text query; empty in category mode.
    pub query: String,
    /// 1-based page number.
    pub page: u32,
}

impl FeedQuery {
    /// Query-string pairs in the order the API documents them.
    pub fn params(&self) -> [(&'static str, String); 3] {
        [
            ("category", self.category.clone()),
            ("query", self.query.clone()),
            ("page", self.page.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_mode_clears_query() {
        let q = Mode::Category("sports".into()).query(3);
        assert_eq!(q.category, "sports");
        assert_eq!(q.query, "");
        assert_eq!(q.page, 3);
    }

    #[test]
    fn test_search_mode_clears_category() {
        let q = Mode::Search("mars rover".into()).query(1);
        assert_eq!(q.category, "");
        assert_eq!(q.query, "mars rover");
    }

    #[test]
    fn test_params_always_carry_all_keys() {
        let params = Mode::default().query(1).params();
        assert_eq!(params[0], ("category", String::new()));
        assert_eq!(params[1], ("query", String::new()));
        assert_eq!(params[2], ("page", "1".to_string()));
    }

    #[test]
    fn test_search_mode_trims_and_cuts() {
        assert_eq!(Mode::search("  rates "), Some(Mode::Search("rates".into())));
        assert_eq!(Mode::search(""), None);
        assert_eq!(Mode::search(" \t "), None);

        let long = "ж".repeat(MAX_SEARCH_QUERY_LENGTH + 5);
        let Some(Mode::Search(text)) = Mode::search(&long) else {
            panic!("expected search mode");
        };
        assert_eq!(text.chars().count(), MAX_SEARCH_QUERY_LENGTH);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(Mode::default().to_string(), "all news");
        assert_eq!(Mode::Category("world".into()).to_string(), "category 'world'");
        assert_eq!(Mode::Search("rates".into()).to_string(), "search \"rates\"");
    }
}
