//! Loads the project configuration (`leaflet.yaml`) and the theme
//! configuration (`theme/theme.yaml`) into a resolved [`Config`].

use crate::index::DEFAULT_HOME_POSTS;
use crate::markdown::RenderOptions;
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the project file.
pub const PROJECT_FILE: &str = "leaflet.yaml";

#[derive(Deserialize)]
struct Project {
    title: String,
    site_root: Url,

    #[serde(default)]
    markdown: RenderOptions,

    #[serde(default)]
    home_posts: HomePosts,
}

#[derive(Deserialize)]
struct HomePosts(usize);
impl Default for HomePosts {
    fn default() -> Self {
        HomePosts(DEFAULT_HOME_POSTS)
    }
}

#[derive(Deserialize)]
struct Theme {
    post_template: Vec<PathBuf>,
    listing_template: Vec<PathBuf>,

    /// Falls back to `listing_template` when omitted.
    #[serde(default)]
    home_template: Vec<PathBuf>,
}

/// The resolved configuration for a build.
#[derive(Debug)]
pub struct Config {
    /// The site title, made available to every template.
    pub title: String,

    /// The absolute URL of the site root, made available to every template.
    pub site_root: Url,

    /// The directory containing the post sources.
    pub posts_source_directory: PathBuf,

    /// The files which make up the post template, concatenated in order.
    pub post_template: Vec<PathBuf>,

    /// The files which make up the listing template, concatenated in order.
    pub listing_template: Vec<PathBuf>,

    /// The files which make up the home page template, concatenated in
    /// order.
    pub home_template: Vec<PathBuf>,

    /// The number of most recent posts listed on the home page.
    pub home_posts: usize,

    /// The directory the site is rendered into.
    pub output_directory: PathBuf,

    /// Markdown features for post bodies.
    pub render_options: RenderOptions,
}

impl Config {
    /// Searches `dir` and then each of its ancestors for a `leaflet.yaml`
    /// project file and loads the first one found.
    pub fn from_directory(dir: &Path, output_directory: &Path) -> Result<Config> {
        for candidate in dir.ancestors() {
            let path = candidate.join(PROJECT_FILE);
            if path.exists() {
                log::debug!("using project file `{}`", path.display());
                return Config::from_project_file(&path, output_directory);
            }
        }
        Err(Error::MissingProjectFile(dir.to_owned()))
    }

    /// Loads a [`Config`] from a project file. Post sources live in the
    /// `posts` directory next to the project file and the theme in `theme`.
    pub fn from_project_file(path: &Path, output_directory: &Path) -> Result<Config> {
        let project: Project = serde_yaml::from_reader(open(path)?)
            .map_err(|err| Error::Deserialize(path.to_owned(), err))?;
        let project_root = match path.parent() {
            Some(parent) => parent,
            None => return Err(Error::MissingProjectFile(path.to_owned())),
        };

        let theme_dir = project_root.join("theme");
        let theme_path = theme_dir.join("theme.yaml");
        let theme: Theme = serde_yaml::from_reader(open(&theme_path)?)
            .map_err(|err| Error::Deserialize(theme_path.clone(), err))?;

        let in_theme = |relpaths: &[PathBuf]| -> Vec<PathBuf> {
            relpaths
                .iter()
                .map(|relpath| theme_dir.join(relpath))
                .collect()
        };
        let listing_template = in_theme(&theme.listing_template);
        let home_template = match theme.home_template.is_empty() {
            true => listing_template.clone(),
            false => in_theme(&theme.home_template),
        };

        Ok(Config {
            title: project.title,
            site_root: project.site_root,
            posts_source_directory: project_root.join("posts"),
            post_template: in_theme(&theme.post_template),
            listing_template,
            home_template,
            home_posts: project.home_posts.0,
            output_directory: output_directory.to_owned(),
            render_options: project.markdown,
        })
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|err| Error::Open(path.to_owned(), err))
}

/// The result of loading configuration.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading the project or theme configuration.
#[derive(Debug)]
pub enum Error {
    /// Returned when no `leaflet.yaml` exists in the directory or any of its
    /// ancestors.
    MissingProjectFile(PathBuf),

    /// Returned when a configuration file can't be opened.
    Open(PathBuf, std::io::Error),

    /// Returned when a configuration file isn't valid.
    Deserialize(PathBuf, serde_yaml::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingProjectFile(dir) => write!(
                f,
                "Could not find `{}` in `{}` or any parent directory",
                PROJECT_FILE,
                dir.display()
            ),
            Error::Open(path, err) => {
                write!(f, "Opening `{}`: {}", path.display(), err)
            }
            Error::Deserialize(path, err) => {
                write!(f, "Loading `{}`: {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MissingProjectFile(_) => None,
            Error::Open(_, err) => Some(err),
            Error::Deserialize(_, err) => Some(err),
        }
    }
}
