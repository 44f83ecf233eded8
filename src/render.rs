//! Plain-text rendering of feed items.
//!
//! Output is line oriented so it works in pipes as well as terminals. All
//! API-provided text passes through [`strip_control_chars`] first.

use crate::config::Category;
use crate::controller::FeedController;
use crate::feed::{Fact, FeedItem, ItemKey};
use crate::util::{strip_control_chars, truncate_to_width, wrap_to_width};
use std::fmt::Write;

const INDENT: &str = "    ";

/// Render one item. The display number is `key.index + 1`.
pub fn render_item(key: ItemKey<'_>, item: &FeedItem, width: usize) -> String {
    let mut out = String::new();
    let body_width = width.saturating_sub(INDENT.len()).max(20);

    let title = clean(&item.title);
    let title = if title.is_empty() { "(untitled)" } else { title.as_str() };
    let _ = writeln!(
        out,
        "{:>3}. {}",
        key.index + 1,
        truncate_to_width(title, width.saturating_sub(5).max(20))
    );

    let source = clean(&item.source);
    if !source.is_empty() {
        let _ = writeln!(out, "{}{}", INDENT, truncate_to_width(&source, body_width));
    }
    if !key.url.is_empty() {
        let _ = writeln!(out, "{}{}", INDENT, clean(key.url));
    }

    for line in wrap_to_width(&clean(&item.summary), body_width) {
        let _ = writeln!(out, "{}{}", INDENT, line);
    }

    for fact in item.valid_facts() {
        let _ = writeln!(
            out,
            "{}• {}",
            INDENT,
            truncate_to_width(&fact_line(fact), body_width.saturating_sub(2))
        );
    }
    out
}

/// Render items from `start` onwards (used to print only a freshly appended page).
pub fn render_items(controller: &FeedController, start: usize, width: usize) -> String {
    let mut out = String::new();
    for (key, item) in controller.keyed_items().skip(start) {
        out.push_str(&render_item(key, item, width));
        out.push('\n');
    }
    out
}

/// One-line summary of the controller state.
pub fn status_line(controller: &FeedController) -> String {
    let mut line = format!(
        "[{}] page {}, {} item{}",
        controller.mode(),
        controller.page(),
        controller.items().len(),
        if controller.items().len() == 1 { "" } else { "s" }
    );
    if controller.is_loading() {
        line.push_str(" (loading...)");
    }
    line
}

/// List of configured categories, marking the active one.
pub fn render_categories(categories: &[Category], active: &str) -> String {
    let mut out = String::new();
    for category in categories {
        let marker = if category.id == active { '*' } else { ' ' };
        let _ = writeln!(
            out,
            " {} {:<16} {}",
            marker,
            category.id,
            category.display_label()
        );
    }
    out
}

fn fact_line(fact: &Fact) -> String {
    let mut line = format!("{} {}", clean(fact.actor.trim()), clean(fact.action.trim()));
    let object = clean(fact.object.trim());
    if !object.is_empty() {
        line.push(' ');
        line.push_str(&object);
    }
    line
}

/// Control-stripped, single-line text.
fn clean(s: &str) -> String {
    strip_control_chars(s)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
