//! Sitemap generation.
//!
//! Generates `sitemap.xml` with `xhtml:link` hreflang alternates for pages
//! that exist in more than one language.

use chrono::{DateTime, Utc};
use folio_core::{Alternate, Config, Page};
use tracing::debug;

/// A sitemap URL entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    /// Site-relative URL.
    pub url: String,
    pub lastmod: Option<DateTime<Utc>>,
    /// Language variants, the entry itself included. Empty for single-language
    /// entries.
    pub alternates: Vec<Alternate>,
}

impl SitemapEntry {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            lastmod: None,
            alternates: Vec::new(),
        }
    }

    /// Entry for a generated document whose language variants are
    /// `alternates`. A lone variant yields no alternates.
    #[must_use]
    pub fn with_alternates(url: impl Into<String>, alternates: Vec<Alternate>) -> Self {
        let mut entry = Self::new(url);
        if alternates.len() > 1 {
            entry.alternates = alternates;
        }
        entry
    }

    /// Entry for a content page. `None` for `noindex` pages.
    pub fn for_page(page: &Page) -> Option<Self> {
        if page.is_noindex() {
            return None;
        }
        let mut entry = Self::with_alternates(page.url.clone(), page.alternates.clone());
        entry.lastmod = page.last_modified();
        Some(entry)
    }
}

/// Sitemap generator.
#[derive(Debug)]
pub struct SitemapGenerator<'a> {
    config: &'a Config,
}

impl<'a> SitemapGenerator<'a> {
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Generate sitemap XML.
    pub fn generate(&self, entries: &[SitemapEntry]) -> String {
        debug!(count = entries.len(), "generating sitemap");

        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9""#);
        if entries.iter().any(|e| !e.alternates.is_empty()) {
            xml.push_str(r#" xmlns:xhtml="http://www.w3.org/1999/xhtml""#);
        }
        xml.push_str(">\n");

        for entry in entries {
            xml.push_str(&self.entry_to_xml(entry));
        }

        xml.push_str("</urlset>\n");
        xml
    }

    fn entry_to_xml(&self, entry: &SitemapEntry) -> String {
        let mut xml = String::from("  <url>\n");
        xml.push_str(&format!(
            "    <loc>{}</loc>\n",
            escape_xml(&self.config.url_for(&entry.url))
        ));

        if let Some(lastmod) = &entry.lastmod {
            xml.push_str(&format!("    <lastmod>{}</lastmod>\n", lastmod.format("%Y-%m-%d")));
        }

        for alt in &entry.alternates {
            xml.push_str(&format!(
                r#"    <xhtml:link rel="alternate" hreflang="{}" href="{}" />"#,
                alt.lang,
                escape_xml(&self.config.url_for(&alt.url))
            ));
            xml.push('\n');
        }

        xml.push_str("  </url>\n");
        xml
    }
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
