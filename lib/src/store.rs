use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::config::Config;
use crate::error::{Chainable, Result};
use crate::post::{Document, PostSummary};

/// Recognized post extensions, in order of preference.
pub const EXTENSIONS: [&str; 2] = ["mdx", "md"];

/// Read-only access to the posts in a content directory.
///
/// Every post is a single file directly inside the directory, named after its
/// slug. Nothing is cached: each call reflects what is on disk.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Store { root: root.as_ref().to_path_buf() }
    }

    pub fn from_config(config: &Config) -> Self {
        Store::new(&config.content_dir)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The path of every post file, keyed by slug. When a slug exists with
    /// several extensions, the preferred one wins.
    fn files(&self) -> Vec<(String, PathBuf)> {
        let walker = jwalk::WalkDir::new(&self.root)
            .max_depth(1)
            .sort(true)
            .follow_links(true)
            .skip_hidden(true);

        let mut files: FxHashMap<String, (usize, PathBuf)> = FxHashMap::default();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!(root = %self.root.display(), "skipping unreadable entry: {e}");
                    continue;
                }
            };

            if entry.depth != 1 || !entry.file_type.is_file() && !entry.file_type.is_symlink() {
                continue;
            }

            let path = entry.path();
            let rank = path.extension()
                .and_then(|ext| ext.to_str())
                .and_then(|ext| EXTENSIONS.iter().position(|e| *e == ext));

            let (Some(rank), Some(slug)) = (rank, path.file_stem().and_then(|s| s.to_str())) else {
                continue;
            };

            let slug = slug.to_string();
            if files.get(&slug).map_or(true, |(existing, _)| rank < *existing) {
                files.insert(slug, (rank, path));
            }
        }

        let mut files: Vec<_> = files.into_iter()
            .map(|(slug, (_, path))| (slug, path))
            .collect();

        files.sort_by(|a, b| a.0.cmp(&b.0));
        files
    }

    /// Every listed document, newest first.
    ///
    /// Documents without a title or date are left out, as are documents that
    /// fail to read or parse. A missing directory is an empty store.
    pub fn documents(&self) -> Vec<Document> {
        let mut documents: Vec<Document> = self.files()
            .into_iter()
            .filter_map(|(slug, path)| match read(&slug, &path) {
                Ok(document) if document.is_listed() => Some(document),
                Ok(_) => {
                    tracing::debug!(slug = %slug, "missing title or date, not listed");
                    None
                }
                Err(e) => {
                    tracing::warn!(slug = %slug, "skipping post:\n{e}");
                    None
                }
            })
            .collect();

        documents.sort_by(|a, b| newest_first(&a.date, &b.date));
        documents
    }

    /// Summaries of every listed document, newest first.
    pub fn list_all(&self) -> Vec<PostSummary> {
        self.documents().iter().map(Document::summary).collect()
    }

    /// Looks up the document for `slug`, preferring `.mdx` over `.md`.
    ///
    /// Returns `Ok(None)` when there is no such document, including for slugs
    /// that aren't plain file names. A document without a title or date is
    /// still returned.
    pub fn get_by_slug(&self, slug: &str) -> Result<Option<Document>> {
        if !is_valid_slug(slug) {
            tracing::debug!(slug = %slug, "rejecting invalid slug");
            return Ok(None);
        }

        for ext in EXTENSIONS {
            let path = self.root.join(format!("{slug}.{ext}"));
            if path.is_file() {
                return read(slug, &path).map(Some);
            }
        }

        Ok(None)
    }
}

fn read(slug: &str, path: &Path) -> Result<Document> {
    let source = std::fs::read_to_string(path).chain_with(|| error! {
        "failed to read post",
        "path" => path.display(),
    })?;

    Document::parse(slug, &source).chain_with(|| error! {
        "invalid post",
        "path" => path.display(),
    })
}

fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('.')
        && !slug.contains(['/', '\\', '\0'])
        && slug != ".."
}

/// Orders dates newest first. Dates that don't parse go last.
fn newest_first(a: &str, b: &str) -> Ordering {
    match (crate::date::parse(a), crate::date::parse(b)) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
