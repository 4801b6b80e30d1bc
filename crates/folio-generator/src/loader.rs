//! Content loading.
//!
//! Walks each collection directory and parses its markdown files into raw
//! pages. Drafts are dropped here unless the build includes them.

use std::{
    collections::BTreeSet,
    fs, io,
    path::{Path, PathBuf},
};

use folio_core::{CollectionConfig, Config, ContentPath, Page, Result, parse_frontmatter};
use rayon::prelude::*;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

/// Pages of every collection, in collection then path order.
#[derive(Debug, Default)]
pub struct LoadedContent {
    pub pages: Vec<Page>,
    /// Translation keys of drafts left out of the build.
    pub excluded_drafts: BTreeSet<String>,
}

/// Loads raw pages from the content directory.
#[derive(Debug)]
pub struct ContentLoader<'a> {
    config: &'a Config,
    content_dir: PathBuf,
}

impl<'a> ContentLoader<'a> {
    #[must_use]
    pub fn new(config: &'a Config, content_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            content_dir: content_dir.into(),
        }
    }

    /// Load every collection.
    pub fn load(&self) -> Result<LoadedContent> {
        info!(dir = %self.content_dir.display(), "loading content");

        let mut files = Vec::new();
        for collection in &self.config.collections {
            for path in self.find_files(collection)? {
                files.push((collection, path));
            }
        }

        let pages = files
            .par_iter()
            .map(|(collection, path)| self.parse_file(collection, path))
            .collect::<Result<Vec<_>>>()?;

        let mut content = LoadedContent::default();
        for page in pages.into_iter().flatten() {
            if page.is_draft() && !self.config.build.drafts {
                debug!(path = %page.source_path.display(), "skipping draft");
                content.excluded_drafts.insert(page.translation_key.clone());
                continue;
            }
            content.pages.push(page);
        }

        info!(
            pages = content.pages.len(),
            drafts = content.excluded_drafts.len(),
            "content loaded"
        );
        Ok(content)
    }

    /// Markdown files of one collection, sorted by path.
    fn find_files(&self, collection: &CollectionConfig) -> Result<Vec<PathBuf>> {
        let dir = self.content_dir.join(collection.directory());
        if !dir.is_dir() {
            debug!(collection = %collection.name, dir = %dir.display(), "collection directory missing");
            return Ok(Vec::new());
        }

        let max_depth = if collection.nested { usize::MAX } else { 1 };
        let mut files = Vec::new();
        for entry in WalkDir::new(&dir)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        {
            let entry = entry.map_err(io::Error::from)?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    /// Parse one file. `None` for files that are not markdown content.
    fn parse_file(&self, collection: &CollectionConfig, path: &Path) -> Result<Option<Page>> {
        let dir = self.content_dir.join(collection.directory());
        let relative = path.strip_prefix(&dir).unwrap_or(path);

        let languages = self.config.all_languages();
        let Some(content_path) = ContentPath::from_path(relative, self.config.default_language(), &languages)
        else {
            debug!(path = %path.display(), "skipping non-content file");
            return Ok(None);
        };

        debug!(path = %path.display(), lang = %content_path.lang, "parsing file");
        let source = fs::read_to_string(path)?;
        let mut doc = parse_frontmatter(&source, path)?;
        if collection.has_date {
            doc.frontmatter.require_date(path, content_path.filename_date)?;
        }

        Ok(Some(Page::new(
            path.to_path_buf(),
            &collection.name,
            &content_path,
            doc.frontmatter,
            doc.body,
            doc.body_line,
        )))
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}
