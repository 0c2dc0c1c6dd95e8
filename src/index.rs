//! Builds the page index for a site: one [`PageDescriptor`] per post, linked
//! to its chronological neighbours, and one [`TagPage`] per distinct tag.
//!
//! Everything in here is a pure function of the post sequence. The posts are
//! expected to arrive sorted by date, most recent first (see
//! [`crate::source::ContentSource`]); nothing here re-sorts them. "Previous"
//! therefore means the post *above* in the list (the more recent one) and
//! "next" the post below it (the older one).
//!
//! [`plan_pages`] combines the two into the list of [`PageDirective`]s that
//! the renderer ([`crate::render`]) turns into files.

use crate::post::{Post, PostNeighborLink};
use crate::tag::TagPage;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// The path of the listing page containing every post.
pub const ALL_POSTS_PATH: &str = "/posts";

/// The path of the home page, which lists the most recent posts.
pub const HOME_PATH: &str = "/";

/// The number of posts listed on the home page unless configured otherwise.
pub const DEFAULT_HOME_POSTS: usize = 5;

/// The non-empty segments of a page path. Two paths with the same segments
/// (`/tags` and `/tags/`) are rendered to the same file.
pub fn path_segments(path: &str) -> impl Iterator<Item = &str> + '_ {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// The navigation context for one post page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageDescriptor {
    /// The path of the post this page renders.
    pub path: String,

    /// The more recent neighbour, if any.
    pub previous: Option<PostNeighborLink>,

    /// The older neighbour, if any.
    pub next: Option<PostNeighborLink>,
}

/// Links each post to its neighbours. Returns exactly one [`PageDescriptor`]
/// per post, in input order. The first descriptor has no `previous` and the
/// last has no `next`.
pub fn link_posts(posts: &[Post]) -> Vec<PageDescriptor> {
    posts
        .iter()
        .enumerate()
        .map(|(i, post)| PageDescriptor {
            path: post.path.clone(),
            previous: match i {
                0 => None,
                _ => Some(PostNeighborLink::from(&posts[i - 1])),
            },
            next: posts.get(i + 1).map(PostNeighborLink::from),
        })
        .collect()
}

/// Two or more distinct tags which slugify to the same listing page path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlugCollision {
    pub slug: String,

    /// The colliding tags, in first-seen order.
    pub tags: Vec<String>,
}

impl fmt::Display for SlugCollision {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "tags {} all map to `/tags/{}`",
            self.tags
                .iter()
                .map(|t| format!("`{}`", t))
                .collect::<Vec<String>>()
                .join(", "),
            self.slug
        )
    }
}

/// The result of aggregating tags across all posts.
#[derive(Clone, Debug, Default)]
pub struct TagIndex {
    /// One page per distinct tag, in first-seen order.
    pub pages: Vec<TagPage>,

    /// Groups of distinct tags sharing a slug, ordered by slug. Empty when
    /// every tag page has a unique path.
    pub collisions: Vec<SlugCollision>,

    /// Tags with no alphanumeric characters at all, whose slug is empty.
    pub empty_slugs: Vec<String>,
}

/// Collects every distinct tag across `posts` into a [`TagIndex`]. Tags are
/// compared exactly (case-sensitive, before slugging), so `Rust` and `rust`
/// are two distinct tags; since they share the slug `rust`, they are also
/// reported as a [`SlugCollision`]. This function never fails.
pub fn aggregate_tags(posts: &[Post]) -> TagIndex {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut pages: Vec<TagPage> = Vec::new();
    for tag in posts.iter().flat_map(|p| p.tags.iter()) {
        if seen.insert(tag.as_str()) {
            pages.push(TagPage::new(tag));
        }
    }

    let mut by_slug: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    let mut empty_slugs = Vec::new();
    for page in pages.iter() {
        if page.slug().is_empty() {
            empty_slugs.push(page.tag.clone());
            continue;
        }
        by_slug
            .entry(page.slug())
            .or_default()
            .push(page.tag.clone());
    }
    let collisions = by_slug
        .into_iter()
        .filter(|(_, tags)| tags.len() > 1)
        .map(|(slug, tags)| SlugCollision {
            slug: slug.to_owned(),
            tags,
        })
        .collect();

    TagIndex {
        pages,
        collisions,
        empty_slugs,
    }
}

/// A request to render one page. See [`crate::render::Renderer`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageDirective {
    /// Render a post page with the post template.
    Post(PageDescriptor),

    /// Render the listing of posts carrying a tag with the listing template.
    TagListing(TagPage),

    /// Render the listing of all posts with the listing template.
    AllPosts,

    /// Render the home page with the given number of most recent posts.
    Home(usize),
}

impl PageDirective {
    /// The URL path of the page to render.
    pub fn path(&self) -> &str {
        match self {
            PageDirective::Post(page) => &page.path,
            PageDirective::TagListing(page) => &page.path,
            PageDirective::AllPosts => ALL_POSTS_PATH,
            PageDirective::Home(_) => HOME_PATH,
        }
    }
}

impl fmt::Display for PageDirective {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let link = |l: &Option<PostNeighborLink>| match l {
            Some(l) => l.path.clone(),
            None => String::from("-"),
        };
        match self {
            PageDirective::Post(page) => write!(
                f,
                "post     {} (previous: {}, next: {})",
                page.path,
                link(&page.previous),
                link(&page.next)
            ),
            PageDirective::TagListing(page) => {
                write!(f, "tag      {} ({})", page.path, page.tag)
            }
            PageDirective::AllPosts => write!(f, "listing  {}", ALL_POSTS_PATH),
            PageDirective::Home(n) => write!(f, "home     {} ({} latest)", HOME_PATH, n),
        }
    }
}

/// The full set of pages for a build, plus the tag pages for navigation.
#[derive(Clone, Debug)]
pub struct SitePlan {
    pub directives: Vec<PageDirective>,
    pub tags: Vec<TagPage>,
}

/// Plans every page for `posts`: the home page listing the `home_posts` most
/// recent posts, the all-posts listing, one page per post and one listing per
/// distinct tag. Fails if two distinct tags share a slug, if a tag has no
/// slug at all, or if two pages would be written to the same file, so that
/// no page silently overwrites another.
pub fn plan_pages(posts: &[Post], home_posts: usize) -> Result<SitePlan> {
    let tags = aggregate_tags(posts);
    if !tags.empty_slugs.is_empty() {
        return Err(Error::EmptySlug(tags.empty_slugs));
    }
    if !tags.collisions.is_empty() {
        return Err(Error::SlugCollision(tags.collisions));
    }

    let mut directives = Vec::with_capacity(2 + posts.len() + tags.pages.len());
    directives.push(PageDirective::Home(std::cmp::min(home_posts, posts.len())));
    directives.push(PageDirective::AllPosts);
    directives.extend(link_posts(posts).into_iter().map(PageDirective::Post));
    directives.extend(tags.pages.iter().cloned().map(PageDirective::TagListing));

    let mut seen_paths: HashSet<Vec<&str>> = HashSet::new();
    for directive in directives.iter() {
        if !seen_paths.insert(path_segments(directive.path()).collect()) {
            return Err(Error::PathConflict(directive.path().to_owned()));
        }
    }

    log::debug!(
        "planned {} pages ({} posts, {} tags)",
        directives.len(),
        posts.len(),
        tags.pages.len()
    );
    Ok(SitePlan {
        directives,
        tags: tags.pages,
    })
}

/// The result of a page-planning operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error planning the site's pages.
#[derive(Debug)]
pub enum Error {
    /// Returned when distinct tags would produce the same listing page.
    SlugCollision(Vec<SlugCollision>),

    /// Returned when tags have an empty slug (e.g., `!!!`) and so no listing
    /// page of their own.
    EmptySlug(Vec<String>),

    /// Returned when two pages claim the same output file (e.g., a post whose
    /// path is `/posts` or lives under `/tags/`).
    PathConflict(String),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::SlugCollision(collisions) => {
                write!(f, "conflicting tag slugs: ")?;
                for (i, collision) in collisions.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", collision)?;
                }
                Ok(())
            }
            Error::EmptySlug(tags) => write!(
                f,
                "tags with no letters or digits can't have a listing page: {}",
                tags.iter()
                    .map(|t| format!("`{}`", t))
                    .collect::<Vec<String>>()
                    .join(", ")
            ),
            Error::PathConflict(path) => {
                write!(f, "more than one page wants path `{}`", path)
            }
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;

    fn post(path: &str, day: u32, tags: &[&str]) -> Post {
        Post {
            title: format!("Title of {}", path),
            path: path.to_owned(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            date: NaiveDate::from_ymd_opt(2020, 1, day).unwrap(),
            body: String::new(),
        }
    }

    fn link(path: &str) -> Option<PostNeighborLink> {
        Some(PostNeighborLink {
            path: path.to_owned(),
            title: format!("Title of {}", path),
        })
    }

    #[test]
    fn test_link_posts_three() {
        let posts = vec![post("/p3", 3, &[]), post("/p2", 2, &[]), post("/p1", 1, &[])];
        let wanted = vec![
            PageDescriptor {
                path: "/p3".to_owned(),
                previous: None,
                next: link("/p2"),
            },
            PageDescriptor {
                path: "/p2".to_owned(),
                previous: link("/p3"),
                next: link("/p1"),
            },
            PageDescriptor {
                path: "/p1".to_owned(),
                previous: link("/p2"),
                next: None,
            },
        ];
        assert_eq!(wanted, link_posts(&posts));
    }

    #[test]
    fn test_link_posts_single() {
        let pages = link_posts(&[post("/only", 1, &[])]);
        assert_eq!(1, pages.len());
        assert_eq!(None, pages[0].previous);
        assert_eq!(None, pages[0].next);
    }

    #[test]
    fn test_link_posts_empty() {
        assert!(link_posts(&[]).is_empty());
    }

    #[test]
    fn test_link_posts_interior() {
        let posts: Vec<Post> = (1..=9)
            .rev()
            .map(|day| post(&format!("/p{}", day), day, &[]))
            .collect();
        let pages = link_posts(&posts);
        assert_eq!(posts.len(), pages.len());
        for i in 1..posts.len() - 1 {
            assert_eq!(posts[i].path, pages[i].path);
            assert_eq!(posts[i - 1].path, pages[i].previous.as_ref().unwrap().path);
            assert_eq!(posts[i + 1].path, pages[i].next.as_ref().unwrap().path);
        }
    }

    #[test]
    fn test_link_posts_does_not_resort() {
        // Out of date order on purpose: adjacency follows input order.
        let posts = vec![post("/old", 1, &[]), post("/new", 9, &[])];
        let pages = link_posts(&posts);
        assert_eq!(link("/new"), pages[0].next);
        assert_eq!(link("/old"), pages[1].previous);
    }

    #[test]
    fn test_aggregate_tags_dedups() {
        let posts = vec![
            post("/p3", 3, &["a", "b"]),
            post("/p2", 2, &["b"]),
            post("/p1", 1, &[]),
        ];
        let index = aggregate_tags(&posts);
        let tags: HashSet<&str> = index.pages.iter().map(|p| p.tag.as_str()).collect();
        assert_eq!(2, index.pages.len());
        assert_eq!(vec!["a", "b"].into_iter().collect::<HashSet<&str>>(), tags);
        assert!(index.collisions.is_empty());
    }

    #[test]
    fn test_aggregate_tags_keeps_original_tag() {
        let index = aggregate_tags(&[post("/p", 1, &["Web Dev"])]);
        assert_eq!("Web Dev", index.pages[0].tag);
        assert_eq!("/tags/web-dev", index.pages[0].path);
    }

    #[test]
    fn test_aggregate_tags_reports_collisions() {
        let posts = vec![
            post("/p2", 2, &["Rust", "web dev"]),
            post("/p1", 1, &["rust", "Web-Dev", "go"]),
        ];
        let index = aggregate_tags(&posts);
        assert_eq!(5, index.pages.len());
        assert_eq!(
            vec![
                SlugCollision {
                    slug: "rust".to_owned(),
                    tags: vec!["Rust".to_owned(), "rust".to_owned()],
                },
                SlugCollision {
                    slug: "web-dev".to_owned(),
                    tags: vec!["web dev".to_owned(), "Web-Dev".to_owned()],
                },
            ],
            index.collisions
        );
    }

    #[test]
    fn test_aggregate_tags_empty() {
        let index = aggregate_tags(&[]);
        assert!(index.pages.is_empty());
        assert!(index.collisions.is_empty());
    }

    #[test]
    fn test_plan_pages() -> Result<()> {
        let posts = vec![post("/p2", 2, &["a"]), post("/p1", 1, &["a", "b"])];
        let plan = plan_pages(&posts, DEFAULT_HOME_POSTS)?;
        let paths: Vec<&str> = plan.directives.iter().map(|d| d.path()).collect();
        assert_eq!(vec!["/", "/posts", "/p2", "/p1", "/tags/a", "/tags/b"], paths);
        assert_eq!(PageDirective::Home(2), plan.directives[0]);
        assert_eq!(2, plan.tags.len());
        Ok(())
    }

    #[test]
    fn test_plan_pages_empty() -> Result<()> {
        let plan = plan_pages(&[], DEFAULT_HOME_POSTS)?;
        assert_eq!(vec![PageDirective::Home(0), PageDirective::AllPosts], plan.directives);
        assert!(plan.tags.is_empty());
        Ok(())
    }

    #[test]
    fn test_plan_pages_rejects_slug_collision() {
        match plan_pages(&[post("/p", 1, &["C++", "C"])], DEFAULT_HOME_POSTS) {
            Err(Error::SlugCollision(collisions)) => {
                assert_eq!(1, collisions.len());
                assert_eq!("c", collisions[0].slug);
            }
            other => panic!("wanted slug collision, got {:?}", other),
        }
    }

    #[test]
    fn test_plan_pages_rejects_path_conflict() {
        match plan_pages(&[post("/posts", 1, &[])], DEFAULT_HOME_POSTS) {
            Err(Error::PathConflict(path)) => assert_eq!("/posts", path),
            other => panic!("wanted path conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_plan_pages_home_limit() -> Result<()> {
        let posts: Vec<Post> = (1..=9)
            .rev()
            .map(|day| post(&format!("/p{}", day), day, &[]))
            .collect();
        let plan = plan_pages(&posts, 3)?;
        assert_eq!(PageDirective::Home(3), plan.directives[0]);
        assert_eq!(HOME_PATH, plan.directives[0].path());
        Ok(())
    }

    #[test]
    fn test_plan_pages_rejects_same_output_file() {
        // `/tags/` and `/tags` are the same file once rendered.
        let posts = vec![post("/tags/", 2, &[]), post("/tags", 1, &[])];
        match plan_pages(&posts, DEFAULT_HOME_POSTS) {
            Err(Error::PathConflict(path)) => assert_eq!("/tags", path),
            other => panic!("wanted path conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_aggregate_tags_reports_empty_slugs() {
        let index = aggregate_tags(&[post("/p", 1, &["!!!", "", "ok"])]);
        assert_eq!(vec!["!!!".to_owned(), "".to_owned()], index.empty_slugs);
        assert!(index.collisions.is_empty());
    }

    #[test]
    fn test_plan_pages_rejects_empty_slug() {
        match plan_pages(&[post("/tags", 1, &["!!!"])], DEFAULT_HOME_POSTS) {
            Err(Error::EmptySlug(tags)) => assert_eq!(vec!["!!!".to_owned()], tags),
            other => panic!("wanted empty slug, got {:?}", other),
        }
    }

    #[test]
    fn test_path_segments() {
        let segments: Vec<&str> = path_segments("//a/b/").collect();
        assert_eq!(vec!["a", "b"], segments);
        assert_eq!(0, path_segments(HOME_PATH).count());
    }

    #[test]
    fn test_directive_display() {
        let posts = vec![post("/p2", 2, &[]), post("/p1", 1, &[])];
        let pages = link_posts(&posts);
        assert_eq!(
            "post     /p2 (previous: -, next: /p1)",
            PageDirective::Post(pages[0].clone()).to_string()
        );
    }
}
