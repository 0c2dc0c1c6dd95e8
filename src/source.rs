//! Defines the [`ContentSource`] trait, through which the build fetches its
//! posts, and [`DirectorySource`], which loads posts from markdown files on
//! disk.

use crate::markdown::{self, RenderOptions};
use crate::post::Post;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// A source of posts.
pub trait ContentSource {
    /// Fetches every post, sorted by date with the most recent first. Posts
    /// sharing a date are ordered by path so the result is deterministic.
    /// Either every post is returned or none is: a single unreadable or
    /// malformed post fails the whole query.
    fn fetch_posts(&self) -> Result<Vec<Post>>;
}

/// Loads posts from the `*.md` files under a directory (recursively).
pub struct DirectorySource<'a> {
    directory: &'a Path,
    options: &'a RenderOptions,
}

impl<'a> DirectorySource<'a> {
    pub fn new(directory: &'a Path, options: &'a RenderOptions) -> DirectorySource<'a> {
        DirectorySource { directory, options }
    }

    fn parse_file(&self, path: &Path) -> Result<Post> {
        match self._parse_file(path) {
            Ok(p) => Ok(p),
            Err(e) => Err(Error::Annotated(
                format!("parsing post `{}`", path.display()),
                Box::new(e),
            )),
        }
    }

    fn _parse_file(&self, path: &Path) -> Result<Post> {
        use std::io::Read;
        let mut contents = String::new();
        File::open(path)?.read_to_string(&mut contents)?;
        parse_post(&contents, self.options)
    }
}

impl ContentSource for DirectorySource<'_> {
    /// Walks the source directory for post files (extension = `.md`). Each
    /// post file must be structured as follows:
    ///
    /// 1. Initial frontmatter fence (`---`)
    /// 2. YAML frontmatter with fields `title`, `path`, `date` and optionally
    ///    `tags`
    /// 3. Terminal frontmatter fence (`---`)
    /// 4. Post body
    ///
    /// For example:
    ///
    /// ```md
    /// ---
    /// title: Hello, world!
    /// path: /hello-world
    /// date: 2021-04-16
    /// tags: [greet]
    /// ---
    /// # Hello
    ///
    /// World
    /// ```
    fn fetch_posts(&self) -> Result<Vec<Post>> {
        use walkdir::WalkDir;
        const MARKDOWN_EXTENSION: &str = "md";

        let mut posts = Vec::new();
        let mut sources: HashMap<String, PathBuf> = HashMap::new();
        for result in WalkDir::new(self.directory).sort_by(|a, b| a.file_name().cmp(b.file_name())) {
            let entry = result?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().map_or(true, |ext| ext != MARKDOWN_EXTENSION)
            {
                continue;
            }

            log::debug!("parsing post `{}`", path.display());
            let post = self.parse_file(path)?;
            if let Some(first) = sources.insert(post.path.clone(), path.to_owned()) {
                return Err(Error::DuplicatePath {
                    path: post.path,
                    first,
                    second: path.to_owned(),
                });
            }
            posts.push(post);
        }

        sort_posts(&mut posts);
        log::info!(
            "loaded {} posts from `{}`",
            posts.len(),
            self.directory.display()
        );
        Ok(posts)
    }
}

/// Sorts posts by date (most recent first), breaking ties by path.
pub fn sort_posts(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.path.cmp(&b.path)));
}

#[derive(Deserialize)]
struct Frontmatter {
    /// The title of the post.
    title: String,

    /// The URL path of the post.
    path: String,

    /// The date of the post (`YYYY-MM-DD`).
    date: NaiveDate,

    /// The tags associated with the post. YAML `null` and a missing field are
    /// both treated as no tags.
    #[serde(default)]
    tags: Option<Vec<String>>,
}

/// Parses a single post from the contents of its source file.
pub fn parse_post(input: &str, options: &RenderOptions) -> Result<Post> {
    // The closing fence must start a line, so `---` inside a frontmatter
    // value doesn't end the YAML.
    fn frontmatter_indices(input: &str) -> Result<(usize, usize, usize)> {
        const FENCE: &str = "---";
        const CLOSING_FENCE: &str = "\n---";
        if !input.starts_with(FENCE) {
            return Err(Error::FrontmatterMissingStartFence);
        }
        match input[FENCE.len()..].find(CLOSING_FENCE) {
            None => Err(Error::FrontmatterMissingEndFence),
            Some(offset) => Ok((
                FENCE.len(),                                // yaml_start
                FENCE.len() + offset,                       // yaml_stop
                FENCE.len() + offset + CLOSING_FENCE.len(), // body_start
            )),
        }
    }

    let (yaml_start, yaml_stop, body_start) = frontmatter_indices(input)?;
    let frontmatter: Frontmatter = serde_yaml::from_str(&input[yaml_start..yaml_stop])?;
    validate_path(&frontmatter.path)?;
    if frontmatter.title.trim().is_empty() {
        log::warn!("post `{}` has an empty title", frontmatter.path);
    }

    let mut post = Post {
        title: frontmatter.title,
        path: frontmatter.path,
        tags: frontmatter.tags.unwrap_or_default(),
        date: frontmatter.date,
        body: String::default(),
    };
    markdown::to_html(&mut post.body, &input[body_start..], options);
    Ok(post)
}

/// A post path must be absolute (`/a/b`) with no empty, `.` or `..` segments,
/// since it becomes a directory under the output root.
fn validate_path(path: &str) -> Result<()> {
    let valid = match path.strip_prefix('/') {
        None => false,
        Some(rest) => rest
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != ".."),
    };
    match valid {
        true => Ok(()),
        false => Err(Error::InvalidPath(path.to_owned())),
    }
}

/// Represents the result of a content query.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error fetching posts from a [`ContentSource`]. Any of these
/// aborts the build before a single page is written.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post source file is missing its starting frontmatter
    /// fence (`---`).
    FrontmatterMissingStartFence,

    /// Returned when a post source file is missing its terminal frontmatter
    /// fence (`---` i.e., the starting fence was found but the ending one was
    /// missing).
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when a post's `path` is not a usable URL path.
    InvalidPath(String),

    /// Returned when two source files declare the same post `path`.
    DuplicatePath {
        path: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// Returned for WalkDir I/O errors.
    WalkDir(walkdir::Error),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingStartFence => {
                write!(f, "Post must begin with `---`")
            }
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `---`")
            }
            Error::DeserializeYaml(err) => write!(f, "{}", err),
            Error::InvalidPath(path) => write!(
                f,
                "invalid post path `{}`: must start with `/` and contain no empty, `.` or `..` segments",
                path
            ),
            Error::DuplicatePath {
                path,
                first,
                second,
            } => write!(
                f,
                "post path `{}` is used by both `{}` and `{}`",
                path,
                first.display(),
                second.display()
            ),
            Error::Io(err) => write!(f, "{}", err),
            Error::WalkDir(err) => write!(f, "{}", err),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontmatterMissingStartFence => None,
            Error::FrontmatterMissingEndFence => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::InvalidPath(_) => None,
            Error::DuplicatePath { .. } => None,
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator while walking the source directory.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    const HELLO: &str = "---
title: Hello, world!
path: /hello-world
date: 2021-04-16
tags: [greet, Web Dev]
---
# Hello

World
";

    fn write_post(dir: &Path, name: &str, contents: &str) {
        let mut file = File::create(dir.join(name)).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    fn post_source(title: &str, path: &str, date: &str) -> String {
        format!("---\ntitle: {}\npath: {}\ndate: {}\n---\nbody\n", title, path, date)
    }

    #[test]
    fn test_parse_post() -> Result<()> {
        let post = parse_post(HELLO, &RenderOptions::default())?;
        assert_eq!("Hello, world!", post.title);
        assert_eq!("/hello-world", post.path);
        assert_eq!(NaiveDate::from_ymd_opt(2021, 4, 16).unwrap(), post.date);
        assert_eq!(vec!["greet", "Web Dev"], post.tags);
        assert_eq!("<h1>Hello</h1>\n<p>World</p>\n", post.body);
        Ok(())
    }

    #[test]
    fn test_parse_post_without_tags() -> Result<()> {
        let post = parse_post(&post_source("T", "/t", "2020-01-01"), &RenderOptions::default())?;
        assert!(post.tags.is_empty());

        let input = "---\ntitle: T\npath: /t\ndate: 2020-01-01\ntags:\n---\nbody\n";
        let post = parse_post(input, &RenderOptions::default())?;
        assert!(post.tags.is_empty());
        Ok(())
    }

    #[test]
    fn test_parse_post_missing_fences() {
        match parse_post("title: x\n", &RenderOptions::default()) {
            Err(Error::FrontmatterMissingStartFence) => {}
            other => panic!("wanted missing start fence, got {:?}", other),
        }
        match parse_post("---\ntitle: x\n", &RenderOptions::default()) {
            Err(Error::FrontmatterMissingEndFence) => {}
            other => panic!("wanted missing end fence, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_post_dashes_in_frontmatter() -> Result<()> {
        let input = "---\ntitle: before --- after\npath: /dashes\ndate: 2020-01-01\n---\nbody --- text\n";
        let post = parse_post(input, &RenderOptions::default())?;
        assert_eq!("before --- after", post.title);
        assert_eq!("/dashes", post.path);
        assert_eq!("<p>body --- text</p>\n", post.body);
        Ok(())
    }

    #[test]
    fn test_parse_post_bad_yaml() {
        let input = post_source("T", "/t", "not-a-date");
        match parse_post(&input, &RenderOptions::default()) {
            Err(Error::DeserializeYaml(_)) => {}
            other => panic!("wanted yaml error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("/hello").is_ok());
        assert!(validate_path("/2018/hello-world").is_ok());
        for bad in &["hello", "/", "/a//b", "/a/", "/../etc", "/a/./b", ""] {
            match validate_path(bad) {
                Err(Error::InvalidPath(p)) => assert_eq!(*bad, p),
                other => panic!("wanted invalid path for `{}`, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_fetch_posts_sorted() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::create_dir(dir.path().join("nested"))?;
        write_post(dir.path(), "a.md", &post_source("One", "/p1", "2020-01-01"));
        write_post(dir.path(), "b.md", &post_source("Three", "/p3", "2020-03-01"));
        write_post(&dir.path().join("nested"), "c.md", &post_source("Two", "/p2", "2020-02-01"));
        write_post(dir.path(), "d.md", &post_source("Also two", "/p2b", "2020-02-01"));
        write_post(dir.path(), "notes.txt", "not a post");

        let options = RenderOptions::default();
        let posts = DirectorySource::new(dir.path(), &options).fetch_posts()?;
        let paths: Vec<&str> = posts.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(vec!["/p3", "/p2", "/p2b", "/p1"], paths);
        Ok(())
    }

    #[test]
    fn test_fetch_posts_empty_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let options = RenderOptions::default();
        assert!(DirectorySource::new(dir.path(), &options).fetch_posts()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_fetch_posts_malformed_fails_whole_query() -> Result<()> {
        let dir = tempfile::tempdir()?;
        write_post(dir.path(), "a.md", &post_source("Good", "/good", "2020-01-01"));
        write_post(dir.path(), "b.md", "no frontmatter here");

        let options = RenderOptions::default();
        match DirectorySource::new(dir.path(), &options).fetch_posts() {
            Err(Error::Annotated(annotation, err)) => {
                assert!(annotation.contains("b.md"), "{}", annotation);
                match *err {
                    Error::FrontmatterMissingStartFence => {}
                    other => panic!("wanted missing start fence, got {:?}", other),
                }
            }
            other => panic!("wanted annotated error, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_fetch_posts_duplicate_path() -> Result<()> {
        let dir = tempfile::tempdir()?;
        write_post(dir.path(), "a.md", &post_source("A", "/same", "2020-01-01"));
        write_post(dir.path(), "b.md", &post_source("B", "/same", "2020-01-02"));

        let options = RenderOptions::default();
        match DirectorySource::new(dir.path(), &options).fetch_posts() {
            Err(Error::DuplicatePath { path, .. }) => assert_eq!("/same", path),
            other => panic!("wanted duplicate path, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_fetch_posts_missing_directory() {
        let options = RenderOptions::default();
        let source = DirectorySource::new(Path::new("./testdata/does-not-exist"), &options);
        match source.fetch_posts() {
            Err(Error::WalkDir(_)) => {}
            other => panic!("wanted walkdir error, got {:?}", other),
        }
    }
}
