//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: fetching the posts
//! ([`crate::source`]), planning the pages ([`crate::index`]) and rendering
//! them to disk ([`crate::render`]).
//!
//! The first two steps are pure with respect to the output directory, so any
//! content or planning error aborts the build before a single file is
//! written.

use crate::config::Config;
use crate::index::{plan_pages, Error as IndexError, SitePlan};
use crate::post::Post;
use crate::render::{parse_template, Error as RenderError, Renderer};
use crate::source::{ContentSource, DirectorySource, Error as ContentQueryError};
use std::fmt;

/// Builds the site from a [`Config`] object.
pub fn build_site(config: &Config) -> Result<()> {
    let source = DirectorySource::new(&config.posts_source_directory, &config.render_options);
    let (posts, plan) = plan_site(&source, config.home_posts)?;

    // Parse the templates before touching the output directory.
    let post_template = parse_template(config.post_template.iter())?;
    let listing_template = parse_template(config.listing_template.iter())?;
    let home_template = parse_template(config.home_template.iter())?;

    let renderer = Renderer {
        post_template: &post_template,
        listing_template: &listing_template,
        home_template: &home_template,
        site_title: &config.title,
        site_root: &config.site_root,
        output_directory: &config.output_directory,
    };
    renderer.render_site(&plan, &posts)?;
    Ok(())
}

/// Fetches every post from `source` and plans the site's pages, with the
/// `home_posts` most recent posts on the home page. Nothing is planned unless
/// every post loads.
pub fn plan_site(source: &dyn ContentSource, home_posts: usize) -> Result<(Vec<Post>, SitePlan)> {
    let posts = source.fetch_posts()?;
    let plan = plan_pages(&posts, home_posts)?;
    log::info!(
        "planned {} pages for {} posts and {} tags",
        plan.directives.len(),
        posts.len(),
        plan.tags.len()
    );
    Ok((posts, plan))
}

/// The result of a build.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can happen while fetching
/// content, planning pages, or rendering.
#[derive(Debug)]
pub enum Error {
    /// Returned when the posts can't be fetched.
    ContentQuery(ContentQueryError),

    /// Returned when the pages can't be planned (e.g., colliding tag slugs).
    Index(IndexError),

    /// Returned for errors rendering pages to disk.
    Render(RenderError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ContentQuery(err) => write!(f, "{}", err),
            Error::Index(err) => write!(f, "{}", err),
            Error::Render(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ContentQuery(err) => Some(err),
            Error::Index(err) => Some(err),
            Error::Render(err) => Some(err),
        }
    }
}

impl From<ContentQueryError> for Error {
    /// Converts [`ContentQueryError`]s into [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: ContentQueryError) -> Error {
        Error::ContentQuery(err)
    }
}

impl From<IndexError> for Error {
    /// Converts [`IndexError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: IndexError) -> Error {
        Error::Index(err)
    }
}

impl From<RenderError> for Error {
    /// Converts [`RenderError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: RenderError) -> Error {
        Error::Render(err)
    }
}
