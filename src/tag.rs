//! Defines the [`TagPage`] type and the slug rules for tag listing pages.

use gtmpl_value::Value;
use std::hash::{Hash, Hasher};

/// The URL path prefix under which tag listing pages live.
pub const TAGS_PATH_PREFIX: &str = "/tags/";

/// Normalizes a free-text tag into a URL-safe slug: lowercase, runs of
/// non-alphanumeric characters collapsed into a single hyphen, no leading or
/// trailing hyphens. Non-ASCII letters are transliterated (`Déjà` becomes
/// `deja`).
pub fn slugify(tag: &str) -> String {
    slug::slugify(tag)
}

/// Describes the listing page generated for one distinct tag. The `tag` field
/// keeps the tag exactly as the author wrote it; only `path` is slugged.
#[derive(Clone, Debug)]
pub struct TagPage {
    /// The tag as written in the post frontmatter.
    pub tag: String,

    /// The page path, `/tags/{slug}`.
    pub path: String,
}

impl TagPage {
    pub fn new(tag: &str) -> TagPage {
        TagPage {
            tag: tag.to_owned(),
            path: format!("{}{}", TAGS_PATH_PREFIX, slugify(tag)),
        }
    }

    /// The slug portion of [`TagPage::path`].
    pub fn slug(&self) -> &str {
        self.path.trim_start_matches(TAGS_PATH_PREFIX)
    }
}

impl Hash for TagPage {
    /// Implements [`Hash`] for [`TagPage`] by delegating directly to the `tag`
    /// field.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tag.hash(state)
    }
}

impl PartialEq for TagPage {
    /// Two tag pages are the same page when their original tags are equal.
    /// Tags are compared case-sensitively and before slugging.
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
    }
}
impl Eq for TagPage {}

impl From<&TagPage> for Value {
    /// Converts [`TagPage`]s into [`Value`]s for templating.
    fn from(t: &TagPage) -> Value {
        use std::collections::HashMap;
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("tag".to_owned(), Value::String(t.tag.clone()));
        m.insert("path".to_owned(), Value::String(t.path.clone()));
        Value::Object(m)
    }
}
