//! HTML generation from rendered pages and listings.
//!
//! Builds the template context for each document (`page`, `collection`,
//! `site` and `data` namespaces plus locals such as `head`, `nav` and
//! `items`) and renders it through the [`TemplateRegistry`].

use std::collections::BTreeMap;

use chrono::{Datelike, Utc};
use folio_core::{
    Alternate, Config, Page,
    url::{markdown_url, page_url, slugify},
};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::{
    pagination::{ListingKind, ListingPage},
    template::{RenderContext, Result, TemplateRegistry},
};

/// Template used when neither the page nor its collection names one.
pub const FALLBACK_TEMPLATE: &str = "page";

/// Number of recent dated pages on a generated home page.
const HOME_RECENT: usize = 10;

/// Escape text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Renders pages, listings, home pages and the not-found page.
#[derive(Debug)]
pub struct HtmlGenerator<'a> {
    config: &'a Config,
    templates: &'a TemplateRegistry,
    data: &'a Value,
    /// Listed collection indexes per language: `(label, url)`.
    nav: BTreeMap<String, Vec<(String, String)>>,
    /// First page of each listing, by `(collection, kind, lang)`.
    listing_roots: BTreeMap<(String, String, String), String>,
}

impl<'a> HtmlGenerator<'a> {
    #[must_use]
    pub fn new(
        config: &'a Config,
        templates: &'a TemplateRegistry,
        data: &'a Value,
        listings: &[ListingPage],
    ) -> Self {
        let mut nav: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();
        let mut listing_roots = BTreeMap::new();

        for listing in listings.iter().filter(|l| l.number == 1) {
            listing_roots.insert(
                (listing.collection.clone(), kind_key(&listing.kind), listing.lang.clone()),
                listing.url.clone(),
            );
            if listing.kind == ListingKind::Index {
                let label = config
                    .collection(&listing.collection)
                    .map_or(listing.collection.as_str(), |c| c.label());
                nav.entry(listing.lang.clone())
                    .or_default()
                    .push((label.to_string(), listing.url.clone()));
            }
        }

        Self {
            config,
            templates,
            data,
            nav,
            listing_roots,
        }
    }

    /// Template a page renders with.
    pub fn template_for<'p>(&'p self, page: &'p Page) -> &'p str {
        page.frontmatter
            .template
            .as_deref()
            .or_else(|| {
                self.config
                    .collection(&page.collection)
                    .and_then(|c| c.default_template.as_deref())
            })
            .unwrap_or(FALLBACK_TEMPLATE)
    }

    /// Render a content page.
    pub fn render_page(&self, page: &Page) -> Result<String> {
        let template = self.template_for(page);
        debug!(url = %page.url, template, "rendering page");

        let description = page
            .description()
            .or_else(|| self.config.description_for_language(&page.lang))
            .unwrap_or_default();

        let mut head = Head::new(self.config, &page.lang, &page.url, &page.alternates);
        head.robots = page.frontmatter.robots.clone();
        head.markdown_url = Some(page.markdown_url());
        head.json_ld = Some(self.page_json_ld(page));

        let ctx = self
            .context(&page.lang)
            .with_page(self.page_value(page))
            .with_collection(self.collection_value(&page.collection, &page.lang))
            .with_var("title", page.title())
            .with_var("description", description)
            .with_var("content", page.html.as_str())
            .with_var("head", head.render())
            .with_var("lang_switcher", self.lang_switcher(&page.lang, &page.alternates));

        self.templates.render(template, &ctx)
    }

    /// Render one listing page.
    pub fn render_listing(&self, listing: &ListingPage, pages: &[Page]) -> Result<String> {
        debug!(url = %listing.url, "rendering listing");

        let title = self.listing_title(listing);
        let items: String = listing
            .items
            .iter()
            .map(|&i| list_item_html(&pages[i]))
            .collect::<Vec<_>>()
            .join("\n");

        let alternates = self.listing_alternates(listing);
        let mut head = Head::new(self.config, &listing.lang, &listing.url, &alternates);
        head.markdown_url = Some(markdown_url(&listing.url));

        let mut ctx = self
            .context(&listing.lang)
            .with_collection(self.collection_value(&listing.collection, &listing.lang))
            .with_var("title", title)
            .with_var("items", items)
            .with_var("head", head.render())
            .with_var("lang_switcher", self.lang_switcher(&listing.lang, &alternates))
            .with_var("page_number", listing.number)
            .with_var("page_total", listing.total);
        if let Some(description) = self.config.description_for_language(&listing.lang) {
            ctx.insert("description", description);
        }
        if let Some(pagination) = pagination_html(listing) {
            ctx.insert("pagination", pagination);
        }
        if let ListingKind::Tag { name, slug } = &listing.kind {
            ctx.insert("tag", json!({ "name": name, "slug": slug }));
        }

        self.templates.render("list", &ctx)
    }

    /// Render a generated home page.
    ///
    /// Lists the most recent dated pages of the language and links every
    /// listed collection index.
    pub fn render_home(&self, lang: &str, homes: &[&str], pages: &[Page]) -> Result<String> {
        let url = self.config.home_url(lang);
        debug!(%url, "rendering home page");

        let items = recent_pages(pages, lang)
            .into_iter()
            .map(list_item_html)
            .collect::<Vec<_>>()
            .join("\n");

        let alternates = self.home_alternates(homes);
        let mut head = Head::new(self.config, lang, &url, &alternates);
        head.markdown_url = Some(markdown_url(&url));
        head.json_ld = Some(json!({
            "@context": "https://schema.org",
            "@type": "WebSite",
            "name": self.config.title_for_language(lang),
            "url": self.config.url_for(&url),
        }));

        let mut ctx = self
            .context(lang)
            .with_var("title", self.config.title_for_language(lang))
            .with_var("items", items)
            .with_var("head", head.render())
            .with_var("lang_switcher", self.lang_switcher(lang, &alternates));
        if let Some(description) = self.config.description_for_language(lang) {
            ctx.insert("description", description);
        }
        if let Some(sections) = self.sections_html(lang) {
            ctx.insert("sections", sections);
        }

        self.templates.render("home", &ctx)
    }

    /// Render the default-language `404.html`.
    pub fn render_not_found(&self) -> Result<String> {
        let lang = self.config.default_language();
        let mut head = Head::new(self.config, lang, "", &[]);
        head.robots = Some("noindex".to_string());

        let ctx = self
            .context(lang)
            .with_var("title", "Page not found")
            .with_var("head", head.render());
        self.templates.render("404", &ctx)
    }

    /// Markdown sibling of a listing page.
    pub fn listing_markdown(&self, listing: &ListingPage, pages: &[Page]) -> String {
        let mut out = format!("# {}\n\n", self.listing_title(listing));
        for &index in &listing.items {
            out.push_str(&markdown_item(&pages[index]));
        }
        if let Some(next) = &listing.next {
            out.push_str(&format!("\n[Next page]({next})\n"));
        }
        out
    }

    /// Markdown sibling of a generated home page.
    pub fn home_markdown(&self, lang: &str, pages: &[Page]) -> String {
        let mut out = format!("# {}\n\n", self.config.title_for_language(lang));
        if let Some(description) = self.config.description_for_language(lang) {
            out.push_str(&format!("{description}\n\n"));
        }
        for page in recent_pages(pages, lang) {
            out.push_str(&markdown_item(page));
        }
        out
    }

    fn context(&self, lang: &str) -> RenderContext<'a> {
        RenderContext::new()
            .with_site(self.site_value(lang))
            .with_data(self.data)
            .with_var("lang", lang)
            .with_var("nav", self.nav_html(lang))
    }

    /// The `site` namespace for one language.
    pub fn site_value(&self, lang: &str) -> Value {
        let site = &self.config.site;
        json!({
            "title": self.config.title_for_language(lang),
            "description": self.config.description_for_language(lang),
            "base_url": site.base_url,
            "language": lang,
            "default_language": site.language,
            "author": site.author,
            "deploy": serde_json::to_value(&self.config.deploy).unwrap_or_default(),
            "year": Utc::now().year(),
            "home_url": self.config.home_url(lang),
            "lang_prefix": self.config.lang_prefix(lang),
        })
    }

    /// The `page` namespace. `extra` keys are also flattened to the top.
    pub fn page_value(&self, page: &Page) -> Value {
        let fm = &page.frontmatter;
        let extra: Map<String, Value> = fm.extra.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        let translations: Vec<Value> = page
            .alternates
            .iter()
            .filter(|a| a.url != page.url)
            .map(|a| json!({ "lang": a.lang, "url": a.url }))
            .collect();

        let mut value = Map::new();
        for (key, v) in &extra {
            value.insert(key.clone(), v.clone());
        }

        let fields = json!({
            "title": page.title(),
            "date": page.date().map(|d| d.format("%Y-%m-%d").to_string()),
            "date_iso": page.date().map(|d| d.to_rfc3339()),
            "updated": fm.updated.map(|d| d.format("%Y-%m-%d").to_string()),
            "description": page.description(),
            "image": fm.image,
            "slug": page.slug,
            "tags": page.tags(),
            "tags_html": self.tags_html(page),
            "url": page.url,
            "permalink": self.config.url_for(&page.url),
            "lang": page.lang,
            "content": page.html,
            "summary": page.summary,
            "toc_html": toc_html(page),
            "word_count": page.word_count,
            "reading_time": page.reading_time,
            "collection": page.collection,
            "markdown_url": page.markdown_url(),
            "translations": translations,
            "extra": extra,
        });
        if let Value::Object(fields) = fields {
            value.extend(fields);
        }
        Value::Object(value)
    }

    /// The `collection` namespace of a page or listing.
    pub fn collection_value(&self, name: &str, lang: &str) -> Value {
        let Some(collection) = self.config.collection(name) else {
            return Value::Null;
        };
        json!({
            "name": collection.name,
            "label": collection.label(),
            "url": self.listing_roots.get(&(name.to_string(), kind_key(&ListingKind::Index), lang.to_string())),
        })
    }

    fn listing_title(&self, listing: &ListingPage) -> String {
        let label = self
            .config
            .collection(&listing.collection)
            .map_or(listing.collection.as_str(), |c| c.label());
        let title = match &listing.kind {
            ListingKind::Index => label.to_string(),
            ListingKind::Tag { name, .. } => format!("{label}: {name}"),
        };
        if listing.number > 1 {
            format!("{title} ({}/{})", listing.number, listing.total)
        } else {
            title
        }
    }

    /// Language variants of a listing; only first pages have them.
    pub fn listing_alternates(&self, listing: &ListingPage) -> Vec<Alternate> {
        if listing.number != 1 {
            return Vec::new();
        }
        let kind = kind_key(&listing.kind);
        self.config
            .all_languages()
            .into_iter()
            .filter_map(|lang| {
                self.listing_roots
                    .get(&(listing.collection.clone(), kind.clone(), lang.to_string()))
                    .map(|url| Alternate {
                        lang: lang.to_string(),
                        url: url.clone(),
                    })
            })
            .collect()
    }

    /// Language variants of the generated home pages.
    pub fn home_alternates(&self, homes: &[&str]) -> Vec<Alternate> {
        homes
            .iter()
            .map(|lang| Alternate {
                lang: lang.to_string(),
                url: self.config.home_url(lang),
            })
            .collect()
    }

    fn nav_html(&self, lang: &str) -> String {
        self.nav
            .get(lang)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(label, url)| format!(r#"<a href="{url}">{}</a>"#, escape_html(label)))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default()
    }

    fn sections_html(&self, lang: &str) -> Option<String> {
        let entries = self.nav.get(lang)?;
        let links: Vec<String> = entries
            .iter()
            .map(|(label, url)| format!(r#"<li><a href="{url}">{}</a></li>"#, escape_html(label)))
            .collect();
        Some(format!(r#"<ul class="sections">{}</ul>"#, links.join("")))
    }

    /// Links to the other language versions of a document.
    fn lang_switcher(&self, current: &str, alternates: &[Alternate]) -> String {
        if alternates.len() <= 1 {
            return String::new();
        }
        let options: Vec<String> = alternates
            .iter()
            .map(|alt| {
                let active = if alt.lang == current { " active" } else { "" };
                format!(
                    r#"<a href="{}" hreflang="{}" class="lang-option{active}">{}</a>"#,
                    alt.url,
                    alt.lang,
                    escape_html(&alt.lang.to_uppercase())
                )
            })
            .collect();
        format!(r#"<div class="lang-switcher">{}</div>"#, options.join(" "))
    }

    /// Tag links; they point at tag listings only when the collection is listed.
    fn tags_html(&self, page: &Page) -> Option<String> {
        if page.tags().is_empty() {
            return None;
        }
        let listed = self.config.collection(&page.collection).filter(|c| c.listed);

        let tags: Vec<String> = page
            .tags()
            .iter()
            .map(|tag| match listed {
                Some(collection) => {
                    let index = page_url(&self.config.lang_prefix(&page.lang), &collection.url_prefix(), "");
                    format!(
                        r#"<a href="{index}tags/{}/" rel="tag">{}</a>"#,
                        slugify(tag),
                        escape_html(tag)
                    )
                }
                None => format!(r#"<span class="tag">{}</span>"#, escape_html(tag)),
            })
            .collect();
        Some(format!(r#"<div class="tags">{}</div>"#, tags.join(" ")))
    }

    fn page_json_ld(&self, page: &Page) -> Value {
        let mut ld = json!({
            "@context": "https://schema.org",
            "@type": if page.date().is_some() { "BlogPosting" } else { "WebPage" },
            "headline": page.title(),
            "url": self.config.url_for(&page.url),
            "inLanguage": page.lang,
        });
        if let Value::Object(map) = &mut ld {
            if let Some(description) = page.description() {
                map.insert("description".into(), description.into());
            }
            if let Some(date) = page.date() {
                map.insert("datePublished".into(), date.to_rfc3339().into());
            }
            if let Some(modified) = page.last_modified() {
                map.insert("dateModified".into(), modified.to_rfc3339().into());
            }
            if let Some(author) = &self.config.site.author {
                map.insert("author".into(), json!({ "@type": "Person", "name": author }));
            }
        }
        ld
    }
}

/// `<head>` additions for one document.
struct Head<'c> {
    config: &'c Config,
    lang: &'c str,
    url: &'c str,
    alternates: &'c [Alternate],
    robots: Option<String>,
    markdown_url: Option<String>,
    json_ld: Option<Value>,
}

impl<'c> Head<'c> {
    fn new(config: &'c Config, lang: &'c str, url: &'c str, alternates: &'c [Alternate]) -> Self {
        Self {
            config,
            lang,
            url,
            alternates,
            robots: None,
            markdown_url: None,
            json_ld: None,
        }
    }

    fn render(&self) -> String {
        let mut lines = Vec::new();

        if !self.url.is_empty() {
            lines.push(format!(r#"<link rel="canonical" href="{}">"#, self.config.url_for(self.url)));
        }

        if self.alternates.len() > 1 {
            for alt in self.alternates {
                lines.push(format!(
                    r#"<link rel="alternate" hreflang="{}" href="{}">"#,
                    alt.lang,
                    self.config.url_for(&alt.url)
                ));
            }
            if let Some(default) = self.alternates.iter().find(|a| a.lang == self.config.default_language()) {
                lines.push(format!(
                    r#"<link rel="alternate" hreflang="x-default" href="{}">"#,
                    self.config.url_for(&default.url)
                ));
            }
        }

        if let Some(robots) = &self.robots {
            lines.push(format!(r#"<meta name="robots" content="{}">"#, escape_html(robots)));
        }

        if let Some(md) = &self.markdown_url {
            lines.push(format!(r#"<link rel="alternate" type="text/markdown" href="{md}">"#));
        }

        if feeds_enabled(self.config) {
            lines.push(format!(
                r#"<link rel="alternate" type="application/rss+xml" title="{}" href="{}/feed.xml">"#,
                escape_html(self.config.title_for_language(self.lang)),
                self.config.lang_prefix(self.lang)
            ));
        }

        if let Some(ld) = &self.json_ld {
            // `</` would end the script element early.
            let json = ld.to_string().replace("</", "<\\/");
            lines.push(format!(r#"<script type="application/ld+json">{json}</script>"#));
        }

        lines.join("\n    ")
    }
}

/// Whether any feed is generated.
pub fn feeds_enabled(config: &Config) -> bool {
    config.rss.enabled && config.collections.iter().any(|c| c.has_rss)
}

fn kind_key(kind: &ListingKind) -> String {
    match kind {
        ListingKind::Index => String::new(),
        ListingKind::Tag { slug, .. } => slug.clone(),
    }
}

/// Dated pages of one language, newest first.
fn recent_pages<'p>(pages: &'p [Page], lang: &str) -> Vec<&'p Page> {
    let mut dated: Vec<&Page> = pages
        .iter()
        .filter(|p| p.lang == lang && p.date().is_some())
        .collect();
    dated.sort_by(|a, b| b.date().cmp(&a.date()));
    dated.truncate(HOME_RECENT);
    dated
}

fn markdown_item(page: &Page) -> String {
    match page.description() {
        Some(description) => format!("- [{}]({}): {description}\n", page.title(), page.url),
        None => format!("- [{}]({})\n", page.title(), page.url),
    }
}

fn toc_html(page: &Page) -> Option<String> {
    if page.toc.is_empty() {
        return None;
    }
    let items: Vec<String> = page
        .toc
        .iter()
        .map(|entry| {
            format!(
                r##"<li class="toc-level-{}"><a href="#{}">{}</a></li>"##,
                entry.level,
                entry.id,
                escape_html(&entry.text)
            )
        })
        .collect();
    Some(format!(r#"<nav class="toc"><ul>{}</ul></nav>"#, items.join("")))
}

/// One entry of a listing.
pub fn list_item_html(page: &Page) -> String {
    let date_html = page
        .date()
        .map(|d| {
            format!(
                r#"<time datetime="{}">{}</time>"#,
                d.to_rfc3339(),
                d.format("%Y-%m-%d")
            )
        })
        .unwrap_or_default();

    let description_html = page
        .description()
        .filter(|d| !d.is_empty())
        .map(|d| format!(r#"<p class="post-description">{}</p>"#, escape_html(d)))
        .unwrap_or_default();

    format!(
        r#"<li class="post-item">
    <a href="{}" class="post-title">{}</a>
    {date_html}
    {description_html}
</li>"#,
        page.url,
        escape_html(page.title())
    )
}

/// Previous/next navigation, absent for single-page listings.
pub fn pagination_html(listing: &ListingPage) -> Option<String> {
    if listing.total <= 1 {
        return None;
    }

    let mut parts = Vec::new();
    if let Some(prev) = &listing.prev {
        parts.push(format!(r#"<a href="{prev}" rel="prev">← Previous</a>"#));
    }
    parts.push(format!("Page {} of {}", listing.number, listing.total));
    if let Some(next) = &listing.next {
        parts.push(format!(r#"<a href="{next}" rel="next">Next →</a>"#));
    }

    Some(format!(r#"<nav class="pagination">{}</nav>"#, parts.join(" ")))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::{
        i18n,
        pagination::build_listings,
        test_support::{config, page, post},
    };

    fn rendered(mut page: Page) -> Page {
        let html = format!("<p>{}</p>", page.body.trim());
        let markdown = page.body.clone();
        page.set_rendered(html, markdown, Vec::new());
        page
    }

    fn site(config: &Config) -> Vec<Page> {
        let pages = vec![
            post(config, "2026-01-01-first.md", "First", "2026-01-01", &["Rust"]),
            post(config, "2026-01-02-second.md", "Second", "2026-01-02", &[]),
            page(config, "pages", "about.md", "---\ntitle: About\nrobots: noindex\nextra:\n  mood: calm\n---\nAbout us\n"),
            page(config, "pages", "about.es.md", "---\ntitle: Sobre\n---\nSobre nosotros\n"),
        ];
        i18n::resolve(config, pages, &BTreeSet::new())
            .unwrap()
            .into_iter()
            .map(rendered)
            .collect()
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn test_render_page_head() {
        let config = config();
        let templates = TemplateRegistry::new().unwrap();
        let data = json!({});
        let pages = site(&config);
        let listings = build_listings(&config, &pages);
        let generator = HtmlGenerator::new(&config, &templates, &data, &listings);

        let about = pages.iter().find(|p| p.url == "/about").unwrap();
        let html = generator.render_page(about).unwrap();

        assert!(html.contains(r#"<html lang="en">"#));
        assert!(html.contains("<title>About | Test Site</title>"));
        assert!(html.contains(r#"<link rel="canonical" href="https://example.com/about">"#));
        assert!(html.contains(r#"hreflang="es" href="https://example.com/es/about""#));
        assert!(html.contains(r#"hreflang="x-default" href="https://example.com/about""#));
        assert!(html.contains(r#"<meta name="robots" content="noindex">"#));
        assert!(html.contains(r#"type="text/markdown" href="/about.md""#));
        assert!(html.contains(r#""@type":"WebPage""#));
        assert!(html.contains(r#"href="/es/about" hreflang="es" class="lang-option""#));
        assert!(html.contains(r#"<a href="/posts/">Posts</a>"#));
    }

    #[test]
    fn test_page_value_flattens_extra() {
        let config = config();
        let templates = TemplateRegistry::new().unwrap();
        let data = json!({});
        let pages = site(&config);
        let generator = HtmlGenerator::new(&config, &templates, &data, &[]);

        let about = pages.iter().find(|p| p.url == "/about").unwrap();
        let value = generator.page_value(about);
        assert_eq!(value["mood"], json!("calm"));
        assert_eq!(value["extra"]["mood"], json!("calm"));
        assert_eq!(value["permalink"], json!("https://example.com/about"));
        assert_eq!(value["translations"], json!([{ "lang": "es", "url": "/es/about" }]));
    }

    #[test]
    fn test_template_choice() {
        let config = Config::from_toml_str(&format!(
            "{}\n[[collections]]\nname = \"docs\"\ndefault_template = \"post\"\n",
            crate::test_support::SITE_TOML
        ))
        .unwrap();
        let templates = TemplateRegistry::new().unwrap();
        let data = json!({});
        let generator = HtmlGenerator::new(&config, &templates, &data, &[]);

        let doc = page(&config, "docs", "a.md", "---\ntitle: A\n---\n");
        assert_eq!(generator.template_for(&doc), "post");
        let custom = page(&config, "docs", "b.md", "---\ntitle: B\ntemplate: home\n---\n");
        assert_eq!(generator.template_for(&custom), "home");
        let plain = page(&config, "pages", "c.md", "---\ntitle: C\n---\n");
        assert_eq!(generator.template_for(&plain), FALLBACK_TEMPLATE);
    }

    #[test]
    fn test_render_listing() {
        let config = config();
        let templates = TemplateRegistry::new().unwrap();
        let data = json!({});
        let pages = site(&config);
        let listings = build_listings(&config, &pages);
        let generator = HtmlGenerator::new(&config, &templates, &data, &listings);

        let index = listings.iter().find(|l| l.url == "/posts/").unwrap();
        let html = generator.render_listing(index, &pages).unwrap();
        let second = html.find("Second").unwrap();
        let first = html.find("First").unwrap();
        assert!(second < first);
        assert!(html.contains("<title>Posts | Test Site</title>"));

        let markdown = generator.listing_markdown(index, &pages);
        assert!(markdown.starts_with("# Posts\n\n- [Second](/posts/second)"));
    }

    #[test]
    fn test_tags_link_to_listing() {
        let config = config();
        let templates = TemplateRegistry::new().unwrap();
        let data = json!({});
        let pages = site(&config);
        let generator = HtmlGenerator::new(&config, &templates, &data, &[]);

        let first = pages.iter().find(|p| p.title() == "First").unwrap();
        let value = generator.page_value(first);
        assert_eq!(
            value["tags_html"],
            json!(r#"<div class="tags"><a href="/posts/tags/rust/" rel="tag">Rust</a></div>"#)
        );
    }

    #[test]
    fn test_render_home_and_not_found() {
        let config = config();
        let templates = TemplateRegistry::new().unwrap();
        let data = json!({});
        let pages = site(&config);
        let listings = build_listings(&config, &pages);
        let generator = HtmlGenerator::new(&config, &templates, &data, &listings);

        let home = generator.render_home("en", &["en", "es"], &pages).unwrap();
        assert!(home.contains(r#"<ul class="sections"><li><a href="/posts/">Posts</a></li></ul>"#));
        assert!(home.contains(r#""@type":"WebSite""#));
        assert!(home.contains(r#"href="/feed.xml""#));

        let es = generator.home_markdown("es", &pages);
        assert!(es.starts_with("# Sitio de prueba\n"));

        let not_found = generator.render_not_found().unwrap();
        assert!(not_found.contains("Page not found"));
        assert!(!not_found.contains("rel=\"canonical\""));
    }

    #[test]
    fn test_pagination_html() {
        let config = config();
        let pages = site(&config);
        let listings = build_listings(&config, &pages);
        let index = listings.iter().find(|l| l.url == "/posts/").unwrap();
        assert!(pagination_html(index).is_none());

        let mut middle = index.clone();
        middle.number = 2;
        middle.total = 3;
        middle.prev = Some("/posts/".into());
        middle.next = Some("/posts/page/3".into());
        let html = pagination_html(&middle).unwrap();
        assert!(html.contains(r#"<a href="/posts/" rel="prev">"#));
        assert!(html.contains("Page 2 of 3"));
        assert!(html.contains(r#"<a href="/posts/page/3" rel="next">"#));
    }
}
