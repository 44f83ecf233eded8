use serde::{Deserialize, Deserializer};

/// An extracted (actor, action, object) triple summarizing part of an item.
///
/// Facts come straight from the API and are frequently partial. Use
/// [`Fact::is_valid`] (or [`FeedItem::valid_facts`]) before displaying them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Fact {
    #[serde(deserialize_with = "null_as_empty")]
    pub actor: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub action: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub object: String,
}

impl Fact {
    /// A fact is displayable only when both actor and action carry text.
    /// Whitespace-only fields count as empty; the object may be empty.
    pub fn is_valid(&self) -> bool {
        !self.actor.trim().is_empty() && !self.action.trim().is_empty()
    }
}

/// A single news entry as returned by the feed API.
///
/// Every field is optional on the wire. Missing strings decode as empty,
/// a missing, `null` or blank `image` decodes as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedItem {
    #[serde(deserialize_with = "null_as_empty")]
    pub url: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub summary: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub source: String,
    #[serde(deserialize_with = "blank_as_none")]
    pub image: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub facts: Vec<Fact>,
}

impl FeedItem {
    /// Facts with a non-empty actor and action, in their original order.
    pub fn valid_facts(&self) -> impl Iterator<Item = &Fact> {
        self.facts.iter().filter(|f| f.is_valid())
    }
}

/// Identity of an item within a loaded feed.
///
/// The API does not guarantee unique URLs, so the list position is part of
/// the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemKey<'a> {
    pub index: usize,
    pub url: &'a str,
}

/// Top-level JSON body returned by the feed endpoint.
///
/// Only `feed` is read. An absent or `null` feed is an empty page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeedResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub feed: Vec<FeedItem>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
