//! Converts post bodies from markdown to HTML. The markdown dialect and the
//! link handling are controlled by an explicit [`RenderOptions`] value rather
//! than global state, so the same source always renders the same way for the
//! same options.

use pulldown_cmark::escape::{escape_href, escape_html};
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};
use serde::Deserialize;
use url::Url;

/// Attributes added to links which leave the site.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ExternalLinks {
    /// The `target` attribute, e.g., `_blank`.
    #[serde(default)]
    pub target: Option<String>,

    /// The `rel` attribute, e.g., `noopener noreferrer`.
    #[serde(default)]
    pub rel: Option<String>,
}

impl Default for ExternalLinks {
    fn default() -> Self {
        ExternalLinks {
            target: Some(String::from("_blank")),
            rel: Some(String::from("noopener noreferrer")),
        }
    }
}

/// The enumerated set of markdown features used when rendering post bodies.
/// Every field has a default so a project file only needs to name what it
/// changes.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderOptions {
    pub footnotes: bool,
    pub tables: bool,
    pub strikethrough: bool,
    pub tasklists: bool,
    pub smart_punctuation: bool,

    /// The number of levels by which to demote headings, so a post's `#`
    /// doesn't compete with the page title. Clamped at `h6`.
    pub heading_offset: u32,

    /// Extra attributes for external links. `None` leaves them untouched.
    pub external_links: Option<ExternalLinks>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            footnotes: true,
            tables: true,
            strikethrough: true,
            tasklists: true,
            smart_punctuation: false,
            heading_offset: 0,
            external_links: Some(ExternalLinks::default()),
        }
    }
}

impl RenderOptions {
    fn parser_options(&self) -> Options {
        let mut options = Options::empty();
        let toggles = [
            (self.footnotes, Options::ENABLE_FOOTNOTES),
            (self.tables, Options::ENABLE_TABLES),
            (self.strikethrough, Options::ENABLE_STRIKETHROUGH),
            (self.tasklists, Options::ENABLE_TASKLISTS),
            (self.smart_punctuation, Options::ENABLE_SMART_PUNCTUATION),
        ];
        for (enabled, option) in toggles.iter() {
            if *enabled {
                options.insert(*option);
            }
        }
        options
    }
}

/// Converts `markdown` to HTML, appending the result to `out`.
pub fn to_html(out: &mut String, markdown: &str, options: &RenderOptions) {
    let converter = EventConverter { options };
    html::push_html(
        out,
        Parser::new_ext(markdown, options.parser_options()).map(|ev| converter.convert(ev)),
    );
}

struct EventConverter<'a> {
    options: &'a RenderOptions,
}

impl<'a> EventConverter<'a> {
    fn convert<'b>(&self, ev: Event<'b>) -> Event<'b> {
        match ev {
            Event::Start(Tag::Heading(level)) => {
                Event::Start(Tag::Heading(self.heading_level(level)))
            }
            Event::End(Tag::Heading(level)) => {
                Event::End(Tag::Heading(self.heading_level(level)))
            }

            // pulldown-cmark has no way to attach extra attributes to a
            // link, so external links are written out as raw HTML. Start and
            // End carry the same URL, so both sides make the same decision.
            Event::Start(Tag::Link(kind, url, title)) => match &self.options.external_links {
                Some(attrs) if is_external(&url) => {
                    Event::Html(CowStr::Boxed(open_link(&url, &title, attrs).into_boxed_str()))
                }
                _ => Event::Start(Tag::Link(kind, url, title)),
            },
            Event::End(Tag::Link(kind, url, title)) => match &self.options.external_links {
                Some(_) if is_external(&url) => Event::Html(CowStr::Borrowed("</a>")),
                _ => Event::End(Tag::Link(kind, url, title)),
            },
            _ => ev,
        }
    }

    fn heading_level(&self, level: u32) -> u32 {
        level.saturating_add(self.options.heading_offset).min(6)
    }
}

fn is_external(url: &str) -> bool {
    match Url::parse(url) {
        Ok(url) => url.scheme() == "http" || url.scheme() == "https",
        Err(_) => false,
    }
}

fn open_link(url: &str, title: &str, attrs: &ExternalLinks) -> String {
    // Writing into a `String` can't fail.
    let mut s = String::from("<a href=\"");
    let _ = escape_href(&mut s, url);
    s.push('"');
    if !title.is_empty() {
        s.push_str(" title=\"");
        let _ = escape_html(&mut s, title);
        s.push('"');
    }
    for (name, value) in [("target", &attrs.target), ("rel", &attrs.rel)].iter() {
        if let Some(value) = value {
            s.push(' ');
            s.push_str(name);
            s.push_str("=\"");
            let _ = escape_html(&mut s, value);
            s.push('"');
        }
    }
    s.push('>');
    s
}
