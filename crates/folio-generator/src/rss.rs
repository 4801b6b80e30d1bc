//! RSS feed generation.
//!
//! One RSS 2.0 feed per language, holding the most recent dated pages of
//! collections with `has_rss` set.

use chrono::Utc;
use folio_core::{Config, Page};
use rss::{Category, ChannelBuilder, GuidBuilder, Item, ItemBuilder};
use thiserror::Error;
use tracing::debug;

/// RSS generation errors.
#[derive(Debug, Error)]
pub enum RssError {
    /// RSS building error.
    #[error("RSS build error: {0}")]
    Build(String),

    #[error("RSS write error: {0}")]
    Write(#[from] rss::Error),
}

/// Result type for RSS operations.
pub type Result<T> = std::result::Result<T, RssError>;

/// Output path of a language's feed: `feed.xml` or `es/feed.xml`.
pub fn feed_path(config: &Config, lang: &str) -> String {
    format!("{}/feed.xml", config.lang_prefix(lang))
        .trim_start_matches('/')
        .to_string()
}

/// RSS feed generator.
#[derive(Debug)]
pub struct RssGenerator<'a> {
    config: &'a Config,
}

impl<'a> RssGenerator<'a> {
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Feed entries of one language, newest first, capped at `rss.limit`.
    pub fn entries<'p>(&self, lang: &str, pages: &'p [Page]) -> Vec<&'p Page> {
        let mut entries: Vec<&Page> = pages
            .iter()
            .filter(|p| p.lang == lang && p.date().is_some())
            .filter(|p| self.config.collection(&p.collection).is_some_and(|c| c.has_rss))
            .collect();
        entries.sort_by(|a, b| b.date().cmp(&a.date()));
        entries.truncate(self.config.rss.limit);
        entries
    }

    /// Generate the feed XML of one language.
    pub fn generate(&self, lang: &str, pages: &[Page]) -> Result<String> {
        let entries = self.entries(lang, pages);
        debug!(lang = %lang, count = entries.len(), limit = self.config.rss.limit, "generating RSS feed");

        let site_title = self.config.title_for_language(lang);
        let last_build = entries
            .iter()
            .filter_map(|p| p.last_modified())
            .max()
            .unwrap_or_else(Utc::now);

        let channel = ChannelBuilder::default()
            .title(site_title)
            .link(self.config.url_for(&self.config.home_url(lang)))
            .description(self.config.description_for_language(lang).unwrap_or(site_title))
            .language(Some(lang.to_string()))
            .last_build_date(Some(last_build.to_rfc2822()))
            .items(entries.iter().map(|page| self.page_to_item(page)).collect::<Vec<_>>())
            .build();

        let bytes = channel.write_to(Vec::new())?;
        String::from_utf8(bytes).map_err(|e| RssError::Build(e.to_string()))
    }

    /// Convert a page to an RSS item.
    fn page_to_item(&self, page: &Page) -> Item {
        let url = self.config.url_for(&page.url);
        let guid = GuidBuilder::default().value(&url).permalink(true).build();

        let mut builder = ItemBuilder::default();
        builder.title(Some(page.title().to_string()));
        builder.link(Some(url));
        builder.guid(Some(guid));

        if let Some(date) = page.date() {
            builder.pub_date(Some(date.to_rfc2822()));
        }

        if let Some(desc) = page.description() {
            builder.description(Some(desc.to_string()));
        } else if !page.summary.is_empty() {
            builder.description(Some(page.summary.clone()));
        }

        if let Some(author) = &self.config.site.author {
            builder.author(Some(author.clone()));
        }

        let categories: Vec<_> = page
            .tags()
            .iter()
            .map(|tag| Category {
                name: tag.clone(),
                domain: None,
            })
            .collect();
        if !categories.is_empty() {
            builder.categories(categories);
        }

        builder.build()
    }
}
