//! The build stages and the context they share.
//!
//! Order: load, i18n, pagination, assets, render, asset rewriting, link
//! validation, aggregates, write. Rendering and writing fan out over a
//! bounded rayon pool; everything else runs on the calling thread.

use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use folio_core::{
    Config, Page,
    data::load_data_dir,
    url::{markdown_path, output_path},
};
use folio_parser::MarkdownRenderer;
use folio_search::SearchIndex;
use rayon::{ThreadPool, ThreadPoolBuilder, prelude::*};
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    assets::{AssetManifest, AssetProcessor, ImageProcessor, STATIC_PREFIX, add_lazy_loading},
    build::{BuildError, BuildReport, BuildStats, Result},
    html::{HtmlGenerator, feeds_enabled},
    i18n::{self, check_unique},
    links::{self, BrokenLink, LinkGraph},
    llms::{LLMS_FULL_PATH, LLMS_PATH, LlmsGenerator},
    loader::ContentLoader,
    output::{ArtifactKind, BuildArtifact, OutputSet},
    pagination::{ListingPage, build_listings, home_languages},
    pipeline::{Resource, Stage},
    robots::RobotsGenerator,
    rss::{RssGenerator, feed_path},
    shortcode::{ShortcodeProcessor, ShortcodeRegistry},
    sitemap::{SitemapEntry, SitemapGenerator},
    template::{RenderContext, TemplateRegistry},
};

pub const SITEMAP_PATH: &str = "sitemap.xml";
pub const ROBOTS_PATH: &str = "robots.txt";
pub const SEARCH_INDEX_PATH: &str = "search-index.json";
pub const NOT_FOUND_PATH: &str = "404.html";

/// Mutable state threaded through the stages of one build.
pub struct BuildContext<'a> {
    pub config: &'a Config,
    pub root: PathBuf,
    pub output_dir: PathBuf,
    pub images: &'a dyn ImageProcessor,
    /// Fail on broken links.
    pub strict: bool,

    pub templates: TemplateRegistry,
    pub shortcodes: ShortcodeRegistry,
    pub renderer: MarkdownRenderer,
    pub data: Value,

    pub pages: Vec<Page>,
    pub excluded_drafts: BTreeSet<String>,
    pub listings: Vec<ListingPage>,
    /// Languages that get a generated home page.
    pub homes: Vec<String>,
    /// Languages with published content, default first.
    pub languages: Vec<String>,

    pub manifest: AssetManifest,
    pub output: OutputSet,
    pub broken_links: Vec<BrokenLink>,
    pub stats: BuildStats,
    pub written: bool,
}

impl<'a> BuildContext<'a> {
    pub fn new(
        config: &'a Config,
        root: &Path,
        output_dir: &Path,
        images: &'a dyn ImageProcessor,
    ) -> Result<Self> {
        Ok(Self {
            config,
            root: root.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            images,
            strict: config.build.strict,
            templates: TemplateRegistry::new()?,
            shortcodes: ShortcodeRegistry::new(),
            renderer: MarkdownRenderer::with_theme(&config.build.syntax_theme)?,
            data: Value::Object(serde_json::Map::new()),
            pages: Vec::new(),
            excluded_drafts: BTreeSet::new(),
            listings: Vec::new(),
            homes: Vec::new(),
            languages: Vec::new(),
            manifest: AssetManifest::new(),
            output: OutputSet::new(),
            broken_links: Vec::new(),
            stats: BuildStats::default(),
            written: false,
        })
    }

    fn dir(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    fn pool(&self) -> Result<ThreadPool> {
        let mut builder = ThreadPoolBuilder::new();
        if let Some(workers) = self.config.build.workers {
            builder = builder.num_threads(workers);
        }
        Ok(builder.build()?)
    }

    fn insert(&mut self, path: impl Into<PathBuf>, content: String, kind: ArtifactKind, origin: &str) -> Result<()> {
        self.output.insert(BuildArtifact::text(path, content, kind, origin))?;
        Ok(())
    }

    pub fn into_report(self) -> BuildReport {
        let mut stats = self.stats;
        stats.artifacts = self.output.len();
        stats.broken_links = self.broken_links.len();
        BuildReport {
            stats,
            broken_links: self.broken_links,
            skipped_drafts: self.excluded_drafts.len(),
            written: self.written,
        }
    }
}

/// Every stage, with or without writing the output directory.
pub fn stages<'a>(write: bool) -> Vec<Box<dyn Stage<BuildContext<'a>>>> {
    let mut stages: Vec<Box<dyn Stage<BuildContext<'a>>>> = vec![
        Box::new(LoadStage),
        Box::new(I18nStage),
        Box::new(PaginationStage),
        Box::new(AssetsStage),
        Box::new(RenderStage),
        Box::new(RewriteAssetsStage),
        Box::new(ValidateLinksStage),
        Box::new(AggregatesStage),
    ];
    if write {
        stages.push(Box::new(WriteStage));
    }
    stages
}

/// Aggregate files published after link validation, as site URLs.
fn planned_aggregates(config: &Config, languages: &[String]) -> Vec<String> {
    let mut urls = vec![
        format!("/{SITEMAP_PATH}"),
        format!("/{ROBOTS_PATH}"),
        format!("/{LLMS_PATH}"),
        format!("/{LLMS_FULL_PATH}"),
    ];
    if config.search.enabled {
        urls.push(format!("/{SEARCH_INDEX_PATH}"));
    }
    if feeds_enabled(config) {
        urls.extend(languages.iter().map(|lang| format!("/{}", feed_path(config, lang))));
    }
    urls
}

/// Reads templates, shortcodes, data files and content.
struct LoadStage;

impl<'a> Stage<BuildContext<'a>> for LoadStage {
    fn name(&self) -> &'static str {
        "load"
    }

    fn reads(&self) -> &'static [Resource] {
        &[]
    }

    fn writes(&self) -> &'static [Resource] {
        &[Resource::Content, Resource::Registries, Resource::Data]
    }

    fn run(&self, ctx: &mut BuildContext<'a>) -> Result<()> {
        let templates_dir = ctx.dir(&ctx.config.build.templates_dir);
        let loaded = ctx.templates.load_dir(&templates_dir)?;
        let shortcodes = ctx
            .shortcodes
            .load_dir(&templates_dir.join("shortcodes"), &mut ctx.templates)?;
        debug!(templates = loaded, shortcodes, "loaded templates");

        ctx.data = load_data_dir(&ctx.dir(&ctx.config.build.data_dir))?;

        let content = ContentLoader::new(ctx.config, ctx.dir(&ctx.config.build.content_dir)).load()?;
        ctx.pages = content.pages;
        ctx.excluded_drafts = content.excluded_drafts;
        Ok(())
    }
}

/// Groups translations and assigns URLs.
struct I18nStage;

impl<'a> Stage<BuildContext<'a>> for I18nStage {
    fn name(&self) -> &'static str {
        "i18n"
    }

    fn reads(&self) -> &'static [Resource] {
        &[Resource::Content]
    }

    fn writes(&self) -> &'static [Resource] {
        &[Resource::Pages]
    }

    fn run(&self, ctx: &mut BuildContext<'a>) -> Result<()> {
        let pages = std::mem::take(&mut ctx.pages);
        ctx.pages = i18n::resolve(ctx.config, pages, &ctx.excluded_drafts)?;

        let config = ctx.config;
        ctx.languages = config
            .all_languages()
            .into_iter()
            .filter(|lang| *lang == config.default_language() || ctx.pages.iter().any(|p| p.lang == *lang))
            .map(str::to_string)
            .collect();
        info!(pages = ctx.pages.len(), languages = ctx.languages.len(), "resolved translations");
        Ok(())
    }
}

/// Plans listing and home pages, then checks every planned URL is unique.
struct PaginationStage;

impl<'a> Stage<BuildContext<'a>> for PaginationStage {
    fn name(&self) -> &'static str {
        "pagination"
    }

    fn reads(&self) -> &'static [Resource] {
        &[Resource::Pages]
    }

    fn writes(&self) -> &'static [Resource] {
        &[Resource::Listings]
    }

    fn run(&self, ctx: &mut BuildContext<'a>) -> Result<()> {
        ctx.listings = build_listings(ctx.config, &ctx.pages);
        ctx.homes = home_languages(ctx.config, &ctx.pages, &ctx.listings)
            .into_iter()
            .map(str::to_string)
            .collect();

        let config = ctx.config;
        let homes: Vec<String> = ctx.homes.iter().map(|lang| config.home_url(lang)).collect();
        check_unique(
            ctx.pages
                .iter()
                .map(|p| (p.url.as_str(), p.source_path.display().to_string()))
                .chain(ctx.listings.iter().map(|l| (l.url.as_str(), format!("{} listing", l.collection))))
                .chain(homes.iter().map(|url| (url.as_str(), "home page".to_string()))),
        )?;

        ctx.stats.listings = ctx.listings.len();
        ctx.stats.homes = ctx.homes.len();
        info!(listings = ctx.listings.len(), homes = ctx.homes.len(), "planned listings");
        Ok(())
    }
}

/// Publishes static files under `static/`.
struct AssetsStage;

impl<'a> Stage<BuildContext<'a>> for AssetsStage {
    fn name(&self) -> &'static str {
        "assets"
    }

    fn reads(&self) -> &'static [Resource] {
        &[]
    }

    fn writes(&self) -> &'static [Resource] {
        &[Resource::Assets, Resource::Output]
    }

    fn run(&self, ctx: &mut BuildContext<'a>) -> Result<()> {
        let processor = AssetProcessor::new(ctx.config.build.fingerprint, ctx.images, ctx.config.images.as_ref());
        let processed = processor.process(&ctx.dir(&ctx.config.build.static_dir))?;

        ctx.stats.assets = processed
            .artifacts
            .iter()
            .filter(|a| a.kind == ArtifactKind::Static)
            .count();
        for artifact in processed.artifacts {
            ctx.output.insert(artifact)?;
        }
        ctx.manifest = processed.manifest;
        debug!(prefix = STATIC_PREFIX, count = ctx.stats.assets, "published static files");
        Ok(())
    }
}

/// Expands shortcodes, renders markdown and templates for every document.
struct RenderStage;

impl RenderStage {
    fn render_body(
        page: &mut Page,
        generator: &HtmlGenerator<'_>,
        processor: &ShortcodeProcessor<'_>,
        renderer: &MarkdownRenderer,
        data: &Value,
        lazy_images: bool,
    ) -> Result<()> {
        let context = RenderContext::new()
            .with_page(generator.page_value(page))
            .with_collection(generator.collection_value(&page.collection, &page.lang))
            .with_site(generator.site_value(&page.lang))
            .with_data(data);
        let expansion = processor.expand(&page.body, &page.source_path, page.body_line, &context)?;

        let rendered = renderer.render(&expansion.placeholder_markdown);
        let mut html = expansion.restore(&rendered.html);
        if lazy_images {
            html = add_lazy_loading(&html);
        }
        debug!(url = %page.url, shortcodes = expansion.fragment_count(), "rendered body");
        page.set_rendered(html, expansion.markdown, rendered.toc);
        Ok(())
    }
}

impl<'a> Stage<BuildContext<'a>> for RenderStage {
    fn name(&self) -> &'static str {
        "render"
    }

    fn reads(&self) -> &'static [Resource] {
        &[Resource::Pages, Resource::Listings, Resource::Registries, Resource::Data]
    }

    fn writes(&self) -> &'static [Resource] {
        &[Resource::RenderedPages, Resource::Output]
    }

    fn run(&self, ctx: &mut BuildContext<'a>) -> Result<()> {
        let pool = ctx.pool()?;
        let config = ctx.config;
        let lazy_images = config.images.as_ref().is_some_and(|i| i.lazy_loading);
        info!(pages = ctx.pages.len(), threads = pool.current_num_threads(), "rendering pages");

        let generator = HtmlGenerator::new(config, &ctx.templates, &ctx.data, &ctx.listings);
        let processor = ShortcodeProcessor::new(&ctx.shortcodes, &ctx.templates, &ctx.renderer);
        let renderer = &ctx.renderer;
        let data = &ctx.data;

        let pages = &mut ctx.pages;
        pool.install(|| {
            pages
                .par_iter_mut()
                .try_for_each(|page| Self::render_body(page, &generator, &processor, renderer, data, lazy_images))
        })?;

        let documents = pool.install(|| {
            pages
                .par_iter()
                .map(|page| {
                    generator.render_page(page).map_err(|source| BuildError::Render {
                        url: page.url.clone(),
                        source,
                    })
                })
                .collect::<Result<Vec<String>>>()
        })?;

        for (page, html) in pages.iter().zip(documents) {
            let origin = page.source_path.display().to_string();
            ctx.output
                .insert(BuildArtifact::text(output_path(&page.url), html, ArtifactKind::Html, origin.as_str()))?;
            ctx.output.insert(BuildArtifact::text(
                markdown_path(&page.url),
                page.markdown.clone(),
                ArtifactKind::Markdown,
                origin,
            ))?;
        }

        for listing in &ctx.listings {
            let html = generator
                .render_listing(listing, pages)
                .map_err(|source| BuildError::Render {
                    url: listing.url.clone(),
                    source,
                })?;
            let origin = format!("{} listing", listing.collection);
            ctx.output
                .insert(BuildArtifact::text(output_path(&listing.url), html, ArtifactKind::Html, origin.as_str()))?;
            ctx.output.insert(BuildArtifact::text(
                markdown_path(&listing.url),
                generator.listing_markdown(listing, pages),
                ArtifactKind::Markdown,
                origin,
            ))?;
        }

        let homes: Vec<&str> = ctx.homes.iter().map(String::as_str).collect();
        for lang in &homes {
            let url = config.home_url(lang);
            let html = generator
                .render_home(lang, &homes, pages)
                .map_err(|source| BuildError::Render { url: url.clone(), source })?;
            ctx.output
                .insert(BuildArtifact::text(output_path(&url), html, ArtifactKind::Html, "home page"))?;
            ctx.output.insert(BuildArtifact::text(
                markdown_path(&url),
                generator.home_markdown(lang, pages),
                ArtifactKind::Markdown,
                "home page",
            ))?;
        }

        let not_found = generator.render_not_found().map_err(|source| BuildError::Render {
            url: format!("/{NOT_FOUND_PATH}"),
            source,
        })?;
        ctx.output
            .insert(BuildArtifact::text(NOT_FOUND_PATH, not_found, ArtifactKind::Html, "404 page"))?;

        ctx.stats.pages = pages.len();
        Ok(())
    }
}

/// Points asset references in emitted HTML at fingerprinted files.
struct RewriteAssetsStage;

impl<'a> Stage<BuildContext<'a>> for RewriteAssetsStage {
    fn name(&self) -> &'static str {
        "rewrite-assets"
    }

    fn reads(&self) -> &'static [Resource] {
        &[Resource::Assets, Resource::Output]
    }

    fn writes(&self) -> &'static [Resource] {
        &[Resource::Output]
    }

    fn run(&self, ctx: &mut BuildContext<'a>) -> Result<()> {
        if !ctx.config.build.fingerprint {
            return Ok(());
        }
        let manifest = &ctx.manifest;
        let mut rewritten = 0usize;
        for artifact in ctx.output.iter_mut().filter(|a| a.kind == ArtifactKind::Html) {
            let Some(html) = artifact.as_str() else {
                continue;
            };
            let updated = manifest.rewrite_html(html);
            if updated != html {
                artifact.bytes = updated.into_bytes();
                rewritten += 1;
            }
        }
        debug!(documents = rewritten, "rewrote asset references");
        Ok(())
    }
}

/// Resolves every internal reference against the published URL set.
struct ValidateLinksStage;

impl<'a> Stage<BuildContext<'a>> for ValidateLinksStage {
    fn name(&self) -> &'static str {
        "validate-links"
    }

    fn reads(&self) -> &'static [Resource] {
        &[Resource::Output, Resource::RenderedPages, Resource::Listings]
    }

    fn writes(&self) -> &'static [Resource] {
        &[Resource::LinkReport]
    }

    fn run(&self, ctx: &mut BuildContext<'a>) -> Result<()> {
        let planned = planned_aggregates(ctx.config, &ctx.languages);
        let graph = LinkGraph::new(&ctx.output, planned.iter().map(String::as_str));
        let broken = graph.check(&ctx.output);
        info!(broken = broken.len(), "validated internal links");
        ctx.broken_links = links::enforce(broken, ctx.strict)?;
        Ok(())
    }
}

/// Feeds, sitemap, search index, llms files and robots.txt.
struct AggregatesStage;

impl<'a> Stage<BuildContext<'a>> for AggregatesStage {
    fn name(&self) -> &'static str {
        "aggregates"
    }

    fn reads(&self) -> &'static [Resource] {
        &[Resource::RenderedPages, Resource::Listings, Resource::Registries, Resource::Data, Resource::LinkReport]
    }

    fn writes(&self) -> &'static [Resource] {
        &[Resource::Aggregates]
    }

    fn run(&self, ctx: &mut BuildContext<'a>) -> Result<()> {
        let config = ctx.config;

        if feeds_enabled(config) {
            let generator = RssGenerator::new(config);
            for lang in ctx.languages.clone() {
                let xml = generator.generate(&lang, &ctx.pages)?;
                ctx.insert(feed_path(config, &lang), xml, ArtifactKind::Xml, "feed")?;
            }
        }

        // Generated documents list the same variants as their `<head>`.
        let entries = {
            let generator = HtmlGenerator::new(config, &ctx.templates, &ctx.data, &ctx.listings);
            let homes: Vec<&str> = ctx.homes.iter().map(String::as_str).collect();
            let home_alternates = generator.home_alternates(&homes);
            let mut entries: Vec<SitemapEntry> = homes
                .iter()
                .map(|lang| SitemapEntry::with_alternates(config.home_url(lang), home_alternates.clone()))
                .collect();
            entries.extend(ctx.pages.iter().filter_map(SitemapEntry::for_page));
            entries.extend(
                ctx.listings
                    .iter()
                    .map(|l| SitemapEntry::with_alternates(l.url.clone(), generator.listing_alternates(l))),
            );
            entries
        };
        let sitemap = SitemapGenerator::new(config).generate(&entries);
        ctx.insert(SITEMAP_PATH, sitemap, ArtifactKind::Xml, "sitemap")?;

        if config.search.enabled {
            let index = SearchIndex::from_pages(ctx.pages.iter().filter(|p| !p.is_noindex()));
            ctx.insert(SEARCH_INDEX_PATH, index.to_json()?, ArtifactKind::Json, "search index")?;
        }

        let llms = LlmsGenerator::new(config);
        let index = llms.generate_index(&ctx.pages);
        let full = llms.generate_full(&ctx.pages);
        ctx.insert(LLMS_PATH, index, ArtifactKind::Text, "llms")?;
        ctx.insert(LLMS_FULL_PATH, full, ArtifactKind::Text, "llms")?;

        let robots = RobotsGenerator::new(config).generate(&ctx.pages);
        ctx.insert(ROBOTS_PATH, robots, ArtifactKind::Text, "robots")?;

        info!(artifacts = ctx.output.len(), "generated aggregates");
        Ok(())
    }
}

/// Replaces the output directory with the output set.
struct WriteStage;

impl WriteStage {
    fn clean_output(dir: &Path) -> Result<()> {
        if dir.exists() {
            debug!(dir = %dir.display(), "cleaning output directory");
            fs::remove_dir_all(dir)?;
        }
        fs::create_dir_all(dir)?;
        Ok(())
    }

    fn minify(html: &[u8]) -> Vec<u8> {
        let mut cfg = minify_html::Cfg::new();
        cfg.keep_closing_tags = true;
        cfg.keep_html_and_head_opening_tags = true;
        cfg.minify_css = true;
        cfg.minify_js = true;
        minify_html::minify(html, &cfg)
    }
}

impl<'a> Stage<BuildContext<'a>> for WriteStage {
    fn name(&self) -> &'static str {
        "write"
    }

    fn reads(&self) -> &'static [Resource] {
        &[Resource::Output, Resource::Aggregates, Resource::LinkReport]
    }

    fn writes(&self) -> &'static [Resource] {
        &[Resource::Site]
    }

    fn run(&self, ctx: &mut BuildContext<'a>) -> Result<()> {
        Self::clean_output(&ctx.output_dir)?;

        let pool = ctx.pool()?;
        let minify = ctx.config.build.minify;
        let output_dir = &ctx.output_dir;
        let artifacts: Vec<&BuildArtifact> = ctx.output.iter().collect();

        pool.install(|| {
            artifacts.par_iter().try_for_each(|artifact| {
                let path = output_dir.join(&artifact.path);
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                if minify && artifact.kind == ArtifactKind::Html {
                    fs::write(&path, Self::minify(&artifact.bytes))?;
                } else {
                    fs::write(&path, &artifact.bytes)?;
                }
                debug!(path = %path.display(), "wrote file");
                Ok::<_, BuildError>(())
            })
        })?;

        info!(files = artifacts.len(), dir = %output_dir.display(), "wrote site");
        ctx.written = true;
        Ok(())
    }
}
