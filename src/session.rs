//! Interactive feed session.
//!
//! The session owns the [`FeedController`] and is the only place its state
//! changes. Each ticket the controller hands out is executed on a spawned
//! task; the response comes back over an mpsc channel as a
//! [`SessionEvent`] and is applied on the loop. User commands arrive as
//! lines of text.

use crate::api::{FeedClient, FetchError};
use crate::config::Config;
use crate::controller::{FeedController, FetchTicket, Outcome};
use crate::feed::{FeedItem, Mode};
use crate::render::{render_categories, render_items, status_line};
use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const HELP: &str = "\
Commands:
  cat <id>, category <id>   switch to a category (empty id = all news)
  search <text>             search all news
  more                      load the next page
  refresh                   reload the first page
  categories                list categories
  show                      print the loaded feed
  help                      this text
  quit                      exit
";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Category(String),
    Search(String),
    More,
    Refresh,
    Categories,
    Show,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        match word.to_ascii_lowercase().as_str() {
            "" => Command::Empty,
            "cat" | "category" => Command::Category(rest.to_string()),
            "search" | "/" => Command::Search(rest.to_string()),
            "more" | "m" => Command::More,
            "refresh" | "r" => Command::Refresh,
            "categories" | "cats" => Command::Categories,
            "show" | "ls" => Command::Show,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            _ => Command::Unknown(word.to_string()),
        }
    }
}

/// Completion of a spawned fetch task.
#[derive(Debug)]
pub enum SessionEvent {
    PageLoaded {
        ticket: FetchTicket,
        result: Result<Vec<FeedItem>, FetchError>,
    },
}

/// Whether the loop should keep running after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Session<W: Write> {
    controller: FeedController,
    client: FeedClient,
    config: Config,
    out: W,
    event_tx: mpsc::Sender<SessionEvent>,
    event_rx: mpsc::Receiver<SessionEvent>,
    fetch_handle: Option<JoinHandle<()>>,
}

impl<W: Write> Session<W> {
    pub fn new(client: FeedClient, config: Config, mode: Mode, out: W) -> Self {
        let (event_tx, event_rx) = mpsc::channel(8);
        Self {
            controller: FeedController::new(mode),
            client,
            config,
            out,
            event_tx,
            event_rx,
            fetch_handle: None,
        }
    }

    pub fn controller(&self) -> &FeedController {
        &self.controller
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Load the first page of the starting mode.
    pub fn start(&mut self) {
        let ticket = self.controller.refresh();
        self.spawn_fetch(ticket);
    }

    /// Run until `quit` or end of input, starting with the initial load.
    pub async fn run<R>(&mut self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        self.start();
        self.prompt()?;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let line = match line {
                        Ok(Some(line)) => line,
                        Ok(None) => {
                            tracing::debug!("Input closed, ending session");
                            break;
                        }
                        Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                            tracing::warn!(error = %e, "Skipping input line that is not valid UTF-8");
                            writeln!(self.out, "ignored line (not valid UTF-8)")?;
                            self.prompt()?;
                            continue;
                        }
                        Err(e) => return Err(e.into()),
                    };
                    if self.handle_command(Command::parse(&line))? == Flow::Quit {
                        break;
                    }
                    self.prompt()?;
                }
                Some(event) = self.event_rx.recv() => {
                    self.handle_event(event)?;
                    self.prompt()?;
                }
            }
        }

        if let Some(handle) = self.fetch_handle.take() {
            handle.abort();
        }
        Ok(())
    }

    /// Wait for the next fetch completion and apply it.
    ///
    /// Only call this with a fetch in flight; it waits indefinitely otherwise.
    pub async fn next_event(&mut self) -> Option<Result<Outcome>> {
        let event = self.event_rx.recv().await?;
        Some(self.handle_event(event))
    }

    pub fn handle_command(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Category(id) => {
                if !self.config.has_category(&id) {
                    tracing::warn!(category = %id, "Category not in configured list, requesting anyway");
                    writeln!(self.out, "note: '{}' is not a known category", id)?;
                }
                let ticket = self.controller.select_category(id);
                self.spawn_fetch(ticket);
            }
            Command::Search(text) => match self.controller.search(&text) {
                Some(ticket) => self.spawn_fetch(ticket),
                None => writeln!(self.out, "usage: search <text>")?,
            },
            Command::More => match self.controller.load_more() {
                Some(ticket) => self.spawn_fetch(ticket),
                None => writeln!(self.out, "still loading...")?,
            },
            Command::Refresh => {
                let ticket = self.controller.refresh();
                self.spawn_fetch(ticket);
            }
            Command::Categories => {
                let listing =
                    render_categories(&self.config.categories, self.controller.active_category());
                write!(self.out, "{}", listing)?;
            }
            Command::Show => {
                let listing = render_items(&self.controller, 0, self.config.summary_width);
                write!(self.out, "{}", listing)?;
                writeln!(self.out, "{}", status_line(&self.controller))?;
            }
            Command::Help => write!(self.out, "{}", HELP)?,
            Command::Quit => return Ok(Flow::Quit),
            Command::Empty => {}
            Command::Unknown(word) => {
                writeln!(self.out, "unknown command '{}' (try 'help')", word)?;
            }
        }
        Ok(Flow::Continue)
    }

    pub fn handle_event(&mut self, event: SessionEvent) -> Result<Outcome> {
        let SessionEvent::PageLoaded { ticket, result } = event;
        let before = self.controller.items().len();
        let outcome = self.controller.complete(&ticket, result);

        match outcome {
            Outcome::Replaced { .. } => {
                self.fetch_handle = None;
                let listing = render_items(&self.controller, 0, self.config.summary_width);
                write!(self.out, "{}", listing)?;
                writeln!(self.out, "{}", status_line(&self.controller))?;
            }
            Outcome::Appended { count } => {
                self.fetch_handle = None;
                if count == 0 {
                    writeln!(self.out, "no more items")?;
                } else {
                    let listing = render_items(&self.controller, before, self.config.summary_width);
                    write!(self.out, "{}", listing)?;
                }
                writeln!(self.out, "{}", status_line(&self.controller))?;
            }
            Outcome::Failed => {
                self.fetch_handle = None;
                writeln!(self.out, "could not load the feed, try again")?;
            }
            Outcome::Stale => {}
        }
        Ok(outcome)
    }

    fn spawn_fetch(&mut self, ticket: FetchTicket) {
        // A newer ticket supersedes whatever is still running.
        if let Some(handle) = self.fetch_handle.take() {
            handle.abort();
            tracing::debug!("Aborted superseded fetch task");
        }

        let client = self.client.clone();
        let tx = self.event_tx.clone();
        tracing::debug!(
            generation = ticket.generation,
            page = ticket.query.page,
            kind = ?ticket.kind,
            "Spawning fetch task"
        );

        self.fetch_handle = Some(tokio::spawn(async move {
            let result = client.fetch_page(&ticket.query).await;
            let event = SessionEvent::PageLoaded { ticket, result };
            if let Err(e) = tx.send(event).await {
                tracing::warn!(error = %e, "Failed to deliver feed page (receiver dropped)");
            }
        }));
    }

    fn prompt(&mut self) -> Result<()> {
        write!(self.out, "> ")?;
        self.out.flush()?;
        Ok(())
    }
}

/// Starting mode from command-line choices.
///
/// A search wins over a category; with neither, the configured default
/// category is used. Returns `None` for a blank search.
pub fn initial_mode(config: &Config, category: Option<String>, search: Option<&str>) -> Option<Mode> {
    match (search, category) {
        (Some(text), _) => Mode::search(text),
        (None, Some(id)) => Some(Mode::Category(id)),
        (None, None) => Some(Mode::Category(config.default_category.clone())),
    }
}

/// Load `pages` pages of `mode` without spawning tasks.
///
/// Stops at the first failed page and returns the controller as it stands.
pub async fn load_pages(client: &FeedClient, mode: Mode, pages: u32) -> FeedController {
    let mut controller = FeedController::new(mode);
    let mut ticket = Some(controller.refresh());

    for loaded in 0..pages.max(1) {
        let Some(t) = ticket.take() else { break };
        let result = client.fetch_page(&t.query).await;
        if controller.complete(&t, result) == Outcome::Failed {
            tracing::warn!(loaded, "Stopping after failed page");
            break;
        }
        if loaded + 1 < pages {
            ticket = controller.load_more();
        }
    }
    controller
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("cat science"), Command::Category("science".into()));
        assert_eq!(Command::parse("  category   world "), Command::Category("world".into()));
        assert_eq!(Command::parse("cat"), Command::Category(String::new()));
        assert_eq!(Command::parse("search mars  rover"), Command::Search("mars  rover".into()));
        assert_eq!(Command::parse("search"), Command::Search(String::new()));
        assert_eq!(Command::parse("MORE"), Command::More);
        assert_eq!(Command::parse("r"), Command::Refresh);
        assert_eq!(Command::parse("categories"), Command::Categories);
        assert_eq!(Command::parse("show"), Command::Show);
        assert_eq!(Command::parse("?"), Command::Help);
        assert_eq!(Command::parse("q"), Command::Quit);
        assert_eq!(Command::parse("   "), Command::Empty);
        assert_eq!(Command::parse("frobnicate now"), Command::Unknown("frobnicate".into()));
    }

    #[test]
    fn test_initial_mode_defaults_to_configured_category() {
        let config = Config::default();
        assert_eq!(
            initial_mode(&config, None, None),
            Some(Mode::Category("all".into()))
        );
        assert_eq!(
            initial_mode(&config, Some("sports".into()), None),
            Some(Mode::Category("sports".into()))
        );
    }

    #[test]
    fn test_initial_search_is_normalized() {
        let config = Config::default();
        assert_eq!(
            initial_mode(&config, None, Some("  budget vote ")),
            Some(Mode::Search("budget vote".into()))
        );
        assert_eq!(initial_mode(&config, None, Some("   ")), None);

        let long = "x".repeat(crate::util::MAX_SEARCH_QUERY_LENGTH * 2);
        let Some(Mode::Search(text)) = initial_mode(&config, None, Some(&long)) else {
            panic!("expected search mode");
        };
        assert_eq!(text.len(), crate::util::MAX_SEARCH_QUERY_LENGTH);
    }
}
