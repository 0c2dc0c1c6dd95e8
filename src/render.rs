use crate::index::{path_segments, PageDescriptor, PageDirective, SitePlan, ALL_POSTS_PATH};
use crate::post::{Post, PostNeighborLink};
use crate::tag::TagPage;
use gtmpl::{Template, Value};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use url::Url;

/// The file which marks an output directory as created by `leaflet`. Only
/// marked (or empty) directories are cleaned before a build.
pub const WATERMARK_FILE: &str = ".leaflet";

/// Templates and writes the pages in a [`SitePlan`] to disk.
pub struct Renderer<'a> {
    /// The template for post pages.
    pub post_template: &'a Template,

    /// The template for listing pages (all posts and tag listings).
    pub listing_template: &'a Template,

    /// The template for the home page.
    pub home_template: &'a Template,

    /// The site title, available to templates as `site.title`.
    pub site_title: &'a str,

    /// The site root URL, available to templates as `site.root`.
    pub site_root: &'a Url,

    /// The directory the pages are written into. A page with path `/a/b` is
    /// written to `{output_directory}/a/b/index.html`.
    pub output_directory: &'a Path,
}

impl Renderer<'_> {
    /// Writes every page in `plan`. `posts` must be the same posts the plan
    /// was built from.
    pub fn render_site(&self, plan: &SitePlan, posts: &[Post]) -> Result<()> {
        prepare_output_directory(self.output_directory)?;

        let by_path: HashMap<&str, &Post> = posts.iter().map(|p| (p.path.as_str(), p)).collect();
        let tags: Vec<Value> = plan.tags.iter().map(Value::from).collect();
        for directive in plan.directives.iter() {
            let (template, value) = match directive {
                PageDirective::Post(page) => {
                    let post = by_path
                        .get(page.path.as_str())
                        .ok_or_else(|| Error::UnknownPost(page.path.clone()))?;
                    (self.post_template, self.post_value(page, post))
                }
                PageDirective::TagListing(tag) => (
                    self.listing_template,
                    self.listing_value(
                        Some(tag),
                        false,
                        posts.iter().filter(|p| p.has_tag(&tag.tag)),
                        &tags,
                    ),
                ),
                PageDirective::AllPosts => (
                    self.listing_template,
                    self.listing_value(None, false, posts.iter(), &tags),
                ),
                PageDirective::Home(latest) => (
                    self.home_template,
                    self.listing_value(None, true, posts.iter().take(*latest), &tags),
                ),
            };
            self.write_page(directive.path(), template, value)?;
        }

        log::info!(
            "wrote {} pages to `{}`",
            plan.directives.len(),
            self.output_directory.display()
        );
        Ok(())
    }

    /// Takes a single page, templates it, and writes it to disk.
    fn write_page(&self, path: &str, template: &Template, value: Value) -> Result<()> {
        let file_path = output_file(self.output_directory, path);
        log::debug!("writing `{}` to `{}`", path, file_path.display());
        if let Some(dir) = file_path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let context = gtmpl::Context::from(value)?;
        template.execute(&mut File::create(&file_path)?, &context)?;
        Ok(())
    }

    fn site_value(&self) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("title".to_owned(), Value::String(self.site_title.to_owned()));
        m.insert("root".to_owned(), Value::String(self.site_root.to_string()));
        Value::Object(m)
    }

    /// The context for a post page: `site`, `post`, `previous` and `next`.
    fn post_value(&self, page: &PageDescriptor, post: &Post) -> Value {
        let link_to_value = |link: &Option<PostNeighborLink>| match link {
            Some(link) => Value::from(link),
            None => Value::Nil,
        };

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("site".to_owned(), self.site_value());
        m.insert("post".to_owned(), post.to_value());
        m.insert("previous".to_owned(), link_to_value(&page.previous));
        m.insert("next".to_owned(), link_to_value(&page.next));
        Value::Object(m)
    }

    /// The context for a listing page: `site`, `tag` (nil for the all-posts
    /// listing and the home page), `home`, `all_posts` (the path of the
    /// all-posts listing), `posts` and `tags` (every tag page, for
    /// navigation).
    fn listing_value<'p>(
        &self,
        tag: Option<&TagPage>,
        home: bool,
        posts: impl Iterator<Item = &'p Post>,
        tags: &[Value],
    ) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("site".to_owned(), self.site_value());
        m.insert("home".to_owned(), Value::Bool(home));
        m.insert(
            "all_posts".to_owned(),
            Value::String(ALL_POSTS_PATH.to_owned()),
        );
        m.insert(
            "tag".to_owned(),
            match tag {
                Some(tag) => Value::String(tag.tag.clone()),
                None => Value::Nil,
            },
        );
        m.insert(
            "posts".to_owned(),
            Value::Array(posts.map(|p| p.summarize()).collect()),
        );
        m.insert("tags".to_owned(), Value::Array(tags.to_vec()));
        Value::Object(m)
    }
}

/// Maps a page path onto its output file.
fn output_file(output_directory: &Path, path: &str) -> PathBuf {
    let mut file_path = output_directory.to_owned();
    file_path.extend(path_segments(path));
    file_path.push("index.html");
    file_path
}

/// Makes sure `dir` exists, is empty and carries the watermark. A missing or
/// empty directory is claimed; a watermarked directory is wiped and
/// reclaimed; anything else is refused so that pointing `--output` at the
/// wrong place doesn't destroy it.
fn prepare_output_directory(dir: &Path) -> Result<()> {
    let owned = match std::fs::read_dir(dir) {
        Ok(mut entries) => entries.next().is_none() || dir.join(WATERMARK_FILE).is_file(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => true,
        Err(e) => return Err(Error::Io(e)),
    };
    if !owned {
        return Err(Error::UnownedOutputDirectory(dir.to_owned()));
    }

    match std::fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            })
        }
    }
    std::fs::create_dir_all(dir)?;
    File::create(dir.join(WATERMARK_FILE))?;
    Ok(())
}

/// Loads the template file contents, concatenates them, and parses the
/// result into a template.
pub fn parse_template<P: AsRef<Path>>(template_files: impl Iterator<Item = P>) -> Result<Template> {
    let mut contents = String::new();
    for template_file in template_files {
        use std::io::Read;
        let template_file = template_file.as_ref();
        File::open(&template_file)
            .map_err(|e| Error::OpenTemplateFile {
                path: template_file.to_owned(),
                err: e,
            })?
            .read_to_string(&mut contents)?;
        contents.push(' ');
    }

    let mut template = Template::default();
    template.parse(&contents).map_err(Error::ParseTemplate)?;
    Ok(template)
}

/// The result of a fallible page-rendering operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-rendering operation.
#[derive(Debug)]
pub enum Error {
    /// An error during templating.
    Template(String),

    /// Returned for errors parsing template files.
    ParseTemplate(String),

    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: io::Error },

    /// Returned when the output directory has content not created by
    /// `leaflet`.
    UnownedOutputDirectory(PathBuf),

    /// Returned for I/O problems while cleaning the output directory.
    Clean { path: PathBuf, err: io::Error },

    /// Returned when a post page refers to a post that wasn't provided.
    UnknownPost(String),

    /// An error writing the output files.
    Io(io::Error),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`]. This
    /// allows us to use the `?` operator for fallible template operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => write!(f, "Rendering template: {}", err),
            Error::ParseTemplate(err) => write!(f, "Parsing template: {}", err),
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::UnownedOutputDirectory(path) => write!(
                f,
                "Refusing to overwrite '{}': it is not empty and has no `{}` file",
                path.display(),
                WATERMARK_FILE
            ),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::UnknownPost(path) => write!(f, "No post with path `{}`", path),
            Error::Io(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::Clean { path: _, err } => Some(err),
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}
