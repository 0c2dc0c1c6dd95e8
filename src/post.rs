//! Defines the [`Post`] type and the [`PostNeighborLink`] used to point from
//! one post page to its chronological neighbours. See [`crate::source`] for
//! how posts are loaded from disk.

use crate::tag::TagPage;
use chrono::NaiveDate;
use gtmpl_value::Value;
use std::collections::HashMap;

/// The format used to display post dates in templates.
pub const DATE_FORMAT: &str = "%B %d, %Y";

/// A single markdown-authored post. Posts are immutable once loaded and only
/// live for one build.
#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    /// The title of the post.
    pub title: String,

    /// The URL path of the post (e.g., `/2018-03-04-hello`). This is the
    /// post's unique identifier.
    pub path: String,

    /// The tags on the post, in the order the author listed them. Empty when
    /// the frontmatter has no `tags` field.
    pub tags: Vec<String>,

    /// The publication date. Only used for ordering and display.
    pub date: NaiveDate,

    /// The rendered HTML body.
    pub body: String,
}

impl Post {
    /// Converts a [`Post`] into a template-friendly [`Value`]. The result is a
    /// [`Value::Object`] with fields `title`, `path`, `date`, `raw_date`,
    /// `tags` (a list of `{tag, path}` objects) and `body`.
    pub fn to_value(&self) -> Value {
        let mut m = self.summary_map();
        m.insert(
            "tags".to_owned(),
            Value::Array(
                self.tags
                    .iter()
                    .map(|t| Value::from(&TagPage::new(t)))
                    .collect(),
            ),
        );
        m.insert("body".to_owned(), Value::String(self.body.clone()));
        Value::Object(m)
    }

    /// Converts a [`Post`] into the abbreviated [`Value`] used on listing
    /// pages: `title`, `path`, `date` and `raw_date` only.
    pub fn summarize(&self) -> Value {
        Value::Object(self.summary_map())
    }

    fn summary_map(&self) -> HashMap<String, Value> {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("title".to_owned(), Value::String(self.title.clone()));
        m.insert("path".to_owned(), Value::String(self.path.clone()));
        m.insert(
            "date".to_owned(),
            Value::String(self.date.format(DATE_FORMAT).to_string()),
        );
        m.insert("raw_date".to_owned(), Value::String(self.date.to_string()));
        m
    }

    /// Whether the post carries `tag` (exact, case-sensitive match).
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// A minimal reference to an adjacent post.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostNeighborLink {
    pub path: String,
    pub title: String,
}

impl From<&Post> for PostNeighborLink {
    fn from(post: &Post) -> PostNeighborLink {
        PostNeighborLink {
            path: post.path.clone(),
            title: post.title.clone(),
        }
    }
}

impl From<&PostNeighborLink> for Value {
    fn from(link: &PostNeighborLink) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("path".to_owned(), Value::String(link.path.clone()));
        m.insert("title".to_owned(), Value::String(link.title.clone()));
        Value::Object(m)
    }
}
