//! Build orchestration.
//!
//! [`Builder`] validates the configuration, assembles the stage pipeline and
//! runs it over a fresh [`BuildContext`].

use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use folio_core::{Config, CoreError};
use folio_parser::ParserError;
use folio_search::SearchError;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    assets::{AssetError, ImageProcessor, PassthroughImages},
    i18n::I18nError,
    links::{BrokenLink, BrokenLinkError},
    output::OutputError,
    pipeline::{Pipeline, PipelineError},
    rss::RssError,
    shortcode::ShortcodeError,
    stages::{self, BuildContext},
    template::TemplateError,
};

/// Build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("markdown error: {0}")]
    Parser(#[from] ParserError),

    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// Template failure while rendering one document.
    #[error("failed to render {url}: {source}")]
    Render {
        url: String,
        #[source]
        source: TemplateError,
    },

    #[error(transparent)]
    Shortcode(#[from] ShortcodeError),

    #[error(transparent)]
    I18n(#[from] I18nError),

    #[error(transparent)]
    Output(#[from] OutputError),

    /// Asset error.
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),

    /// RSS generation error.
    #[error("RSS error: {0}")]
    Rss(#[from] RssError),

    #[error("search index error: {0}")]
    Search(#[from] SearchError),

    #[error("invalid pipeline: {0}")]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    BrokenLinks(#[from] BrokenLinkError),

    #[error("worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("stage `{stage}` failed: {message}")]
    Stage { stage: &'static str, message: String },
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Build statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Content pages rendered.
    pub pages: usize,

    /// Listing pages, tag listings included.
    pub listings: usize,

    /// Generated home pages.
    pub homes: usize,

    /// Static files published.
    pub assets: usize,

    /// Files in the output set.
    pub artifacts: usize,

    pub broken_links: usize,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

/// Outcome of a successful build or check.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub stats: BuildStats,

    /// Broken internal links tolerated outside strict mode.
    pub broken_links: Vec<BrokenLink>,

    /// Drafts left out of the build.
    pub skipped_drafts: usize,

    /// Whether files were written.
    pub written: bool,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.broken_links.is_empty()
    }

    /// Log the summary line and any non-fatal findings.
    pub fn log_summary(&self) {
        let stats = &self.stats;
        info!(
            pages = stats.pages,
            listings = stats.listings,
            homes = stats.homes,
            assets = stats.assets,
            artifacts = stats.artifacts,
            drafts = self.skipped_drafts,
            duration_ms = stats.duration_ms,
            "build complete"
        );
        if !self.broken_links.is_empty() {
            warn!(count = self.broken_links.len(), "site has broken internal links");
        }
    }
}

/// Site builder that orchestrates the build process.
#[derive(Debug)]
pub struct Builder {
    config: Config,
    root: PathBuf,
    output_dir: PathBuf,
    images: Box<dyn ImageProcessor>,
}

impl Builder {
    /// Create a builder for the project at `root`. Directories from
    /// `[build]` resolve against it.
    #[must_use]
    pub fn new(config: Config, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let output_dir = root.join(&config.build.output_dir);
        Self {
            config,
            root,
            output_dir,
            images: Box::new(PassthroughImages),
        }
    }

    /// Override the output directory.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Use an image collaborator instead of passing images through.
    #[must_use]
    pub fn with_image_processor(mut self, images: impl ImageProcessor + 'static) -> Self {
        self.images = Box::new(images);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Execute the full build and write the output directory.
    pub fn build(&self) -> Result<BuildReport> {
        info!(
            root = %self.root.display(),
            output = %self.output_dir.display(),
            "starting build"
        );
        self.run(true, self.config.build.strict)
    }

    /// Run every stage except writing. Broken links are reported, never
    /// fatal.
    pub fn check(&self) -> Result<BuildReport> {
        info!(root = %self.root.display(), "checking site");
        self.run(false, false)
    }

    fn run(&self, write: bool, strict: bool) -> Result<BuildReport> {
        let start = Instant::now();
        self.config.validate()?;

        let pipeline = Pipeline::new(stages::stages(write))?;
        let mut ctx = BuildContext::new(&self.config, &self.root, &self.output_dir, self.images.as_ref())?;
        ctx.strict = strict;
        pipeline.run(&mut ctx)?;

        let mut report = ctx.into_report();
        report.stats.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        Ok(report)
    }
}
