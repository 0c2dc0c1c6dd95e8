//! The library code for the `leaflet` static blog generator. A build is
//! broken down into three steps:
//!
//! 1. Fetching the posts from their markdown sources ([`crate::source`])
//! 2. Planning the pages ([`crate::index`])
//! 3. Rendering the pages to disk ([`crate::render`])
//!
//! The second step is where the site takes its shape. Posts arrive sorted by
//! date (most recent first), and each post page is linked to its neighbours
//! in that order. Every distinct tag gets its own listing page under
//! `/tags/{slug}`, and one more listing at `/posts` holds every post. Two
//! distinct tags which would share a slug are reported rather than allowed to
//! overwrite each other's page.
//!
//! Steps one and two don't touch the output directory, so a malformed post
//! or a slug collision aborts the build without leaving a half-written site
//! behind. [`crate::build::build_site`] stitches the steps together.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod index;
pub mod markdown;
pub mod post;
pub mod render;
pub mod source;
pub mod tag;
