//! Feed pagination state machine.
//!
//! [`FeedController`] owns the loaded items and the category/search mode.
//! It never performs I/O itself: operations that need the network hand out a
//! [`FetchTicket`], the caller runs the request, and the outcome comes back
//! through [`FeedController::complete`].
//!
//! Each ticket carries a generation number. Only the most recent ticket can
//! change state, so a slow response for a category the user already left is
//! dropped instead of overwriting the newer feed.

use crate::api::FetchError;
use crate::feed::{FeedItem, FeedQuery, ItemKey, Mode};

/// How a completed request merges into the item list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeKind {
    /// First page of a new mode: items are replaced.
    Replace,
    /// Next page of the current mode: items are appended.
    Append,
}

/// One network call the controller wants made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub kind: MergeKind,
    pub query: FeedQuery,
}

/// Result of applying a completed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Replaced { count: usize },
    Appended { count: usize },
    Failed,
    /// The ticket was superseded; nothing changed.
    Stale,
}

#[derive(Debug)]
pub struct FeedController {
    items: Vec<FeedItem>,
    /// Last page merged for the current mode.
    page: u32,
    mode: Mode,
    loading: bool,
    /// Set on a mode switch until its first page lands.
    needs_replace: bool,
    generation: u64,
}

impl FeedController {
    pub fn new(mode: Mode) -> Self {
        Self {
            items: Vec::new(),
            page: 1,
            mode,
            loading: false,
            needs_replace: true,
            generation: 0,
        }
    }

    pub fn items(&self) -> &[FeedItem] {
        &self.items
    }

    /// Items paired with their [`ItemKey`].
    pub fn keyed_items(&self) -> impl Iterator<Item = (ItemKey<'_>, &FeedItem)> {
        self.items.iter().enumerate().map(|(index, item)| {
            (
                ItemKey {
                    index,
                    url: item.url.as_str(),
                },
                item,
            )
        })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// Active category id, empty in search mode.
    pub fn active_category(&self) -> &str {
        match &self.mode {
            Mode::Category(id) => id,
            Mode::Search(_) => "",
        }
    }

    /// Active search text, empty in category mode.
    pub fn search_query(&self) -> &str {
        match &self.mode {
            Mode::Search(text) => text,
            Mode::Category(_) => "",
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Switch to a category and request its first page.
    pub fn select_category(&mut self, category: impl Into<String>) -> FetchTicket {
        self.switch_mode(Mode::Category(category.into()))
    }

    /// Switch to search mode and request the first page of results.
    ///
    /// Blank text is ignored and returns `None`. Text is normalized by
    /// [`Mode::search`].
    pub fn search(&mut self, text: &str) -> Option<FetchTicket> {
        let Some(mode) = Mode::search(text) else {
            tracing::debug!("Ignoring blank search");
            return None;
        };
        Some(self.switch_mode(mode))
    }

    /// Reload page 1 of the current mode, replacing the items.
    pub fn refresh(&mut self) -> FetchTicket {
        self.page = 1;
        self.needs_replace = true;
        self.start(MergeKind::Replace, 1)
    }

    /// Request the page after the last one loaded.
    ///
    /// Returns `None` while a request is in flight. If the current mode's
    /// first page never arrived, page 1 is requested again instead.
    pub fn load_more(&mut self) -> Option<FetchTicket> {
        if self.loading {
            tracing::debug!(page = self.page, "Request in flight, ignoring load more");
            return None;
        }
        if self.needs_replace {
            return Some(self.start(MergeKind::Replace, 1));
        }
        Some(self.start(MergeKind::Append, self.page.saturating_add(1)))
    }

    /// Apply the result of the request described by `ticket`.
    pub fn complete(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Vec<FeedItem>, FetchError>,
    ) -> Outcome {
        if ticket.generation != self.generation {
            tracing::debug!(
                expected = self.generation,
                got = ticket.generation,
                page = ticket.query.page,
                "Ignoring stale feed response (generation mismatch)"
            );
            return Outcome::Stale;
        }
        self.loading = false;

        let items = match result {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    category = %ticket.query.category,
                    query = %ticket.query.query,
                    page = ticket.query.page,
                    "Feed fetch failed"
                );
                return Outcome::Failed;
            }
        };

        let count = items.len();
        match ticket.kind {
            MergeKind::Replace => {
                self.items = items;
                self.page = 1;
                self.needs_replace = false;
                tracing::debug!(mode = %self.mode, count, "Feed replaced");
                Outcome::Replaced { count }
            }
            MergeKind::Append => {
                self.items.extend(items);
                self.page = ticket.query.page;
                tracing::debug!(mode = %self.mode, page = self.page, count, "Feed page appended");
                Outcome::Appended { count }
            }
        }
    }

    fn switch_mode(&mut self, mode: Mode) -> FetchTicket {
        tracing::debug!(from = %self.mode, to = %mode, "Switching feed mode");
        self.mode = mode;
        self.refresh()
    }

    fn start(&mut self, kind: MergeKind, page: u32) -> FetchTicket {
        self.generation = self.generation.wrapping_add(1);
        self.loading = true;
        FetchTicket {
            generation: self.generation,
            kind,
            query: self.mode.query(page),
        }
    }
}

impl Default for FeedController {
    fn default() -> Self {
        Self::new(Mode::default())
    }
}
