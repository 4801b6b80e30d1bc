//! Content types and structures.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    frontmatter::Frontmatter,
    url::{markdown_url, slugify},
};

/// Words per minute used for reading time.
const WORDS_PER_MINUTE: usize = 200;

/// Summary length in characters when no description is given.
const SUMMARY_CHARS: usize = 160;

/// Parsed content path with language, slug and date prefix extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPath {
    /// Path relative to the collection directory.
    pub path: PathBuf,

    /// Language code for this content (always set, defaults to site default).
    pub lang: String,

    /// Whether this is the default language version.
    pub is_default_lang: bool,

    /// Relative path without language suffix or extension, `/`-separated.
    /// `guide/intro.md` and `guide/intro.es.md` share `guide/intro`.
    pub translation_key: String,

    /// URL slug derived from the path: date prefix stripped, `index` files
    /// take their directory name, each segment slugified.
    pub slug: String,

    /// Date from a `YYYY-MM-DD-` filename prefix.
    pub filename_date: Option<NaiveDate>,
}

impl ContentPath {
    /// Parse a collection-relative content path.
    ///
    /// Only codes in `languages` count as a language suffix, so `v1.2.md`
    /// or `notes.draft.md` keep their full stem.
    ///
    /// - `hello.md` → default language, slug `hello`
    /// - `hello.es.md` → `es`, slug `hello`
    /// - `2026-01-02-hello.md` → slug `hello`, filename date 2026-01-02
    /// - `guide/index.md` → slug `guide`
    pub fn from_path(path: &Path, default_lang: &str, languages: &[&str]) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        if !matches!(extension.to_ascii_lowercase().as_str(), "md" | "markdown") {
            return None;
        }

        let stem = path.file_stem()?.to_str()?;

        let (base_stem, detected_lang) = match stem.rsplit_once('.') {
            Some((base, suffix)) if languages.contains(&suffix) => (base, Some(suffix)),
            _ => (stem, None),
        };

        let lang = detected_lang.unwrap_or(default_lang).to_string();
        let is_default_lang = lang == default_lang;

        let parent: Vec<String> = path
            .parent()
            .map(|p| {
                p.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();

        let mut key_segments = parent.clone();
        key_segments.push(base_stem.to_string());
        let translation_key = key_segments.join("/");

        let (filename_date, undated_stem) = split_date_prefix(base_stem);

        let mut slug_segments: Vec<String> = parent.iter().map(|s| slugify(s)).collect();
        if undated_stem != "index" {
            slug_segments.push(slugify(undated_stem));
        }
        let slug = slug_segments
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/");

        Some(Self {
            path: path.to_path_buf(),
            lang,
            is_default_lang,
            translation_key,
            slug,
            filename_date,
        })
    }
}

/// Split a `YYYY-MM-DD-` prefix off a file stem.
fn split_date_prefix(stem: &str) -> (Option<NaiveDate>, &str) {
    if stem.len() > 11 && stem.is_char_boundary(10) && stem.as_bytes()[10] == b'-' {
        if let Ok(date) = NaiveDate::parse_from_str(&stem[..10], "%Y-%m-%d") {
            return (Some(date), &stem[11..]);
        }
    }
    (None, stem)
}

/// Table of contents entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,

    /// Heading text.
    pub text: String,

    /// Anchor ID for linking.
    pub id: String,
}

/// A language variant of the same logical page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alternate {
    pub lang: String,
    pub url: String,
}

/// One content file in one language.
///
/// Created by the loader with frontmatter and body; `url` and `alternates`
/// are assigned during i18n resolution and the rendered fields are filled
/// in by the render stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Source file path.
    pub source_path: PathBuf,

    /// Owning collection name.
    pub collection: String,

    /// Language code for this page.
    pub lang: String,

    /// Whether this is the default language version.
    pub is_default_lang: bool,

    /// Groups language variants of one logical page.
    pub translation_key: String,

    /// Parsed frontmatter.
    pub frontmatter: Frontmatter,

    /// Raw markdown body.
    pub body: String,

    /// 1-based source line of the first body line.
    pub body_line: usize,

    /// URL slug relative to the collection prefix.
    pub slug: String,

    /// Canonical site-relative URL.
    #[serde(default)]
    pub url: String,

    /// Every language variant of this page, itself included.
    #[serde(default)]
    pub alternates: Vec<Alternate>,

    /// Rendered body HTML.
    #[serde(default)]
    pub html: String,

    /// Shortcode-expanded markdown body.
    #[serde(default)]
    pub markdown: String,

    /// Table of contents.
    #[serde(default)]
    pub toc: Vec<TocEntry>,

    #[serde(default)]
    pub word_count: usize,

    /// Reading time in minutes.
    #[serde(default)]
    pub reading_time: usize,

    /// Summary/excerpt for listings.
    #[serde(default)]
    pub summary: String,
}

impl Page {
    /// Create a raw page from a parsed content path and its document parts.
    pub fn new(
        source_path: PathBuf,
        collection: &str,
        content_path: &ContentPath,
        frontmatter: Frontmatter,
        body: String,
        body_line: usize,
    ) -> Self {
        let slug = frontmatter
            .slug
            .as_deref()
            .map(|s| s.trim_matches('/').to_string())
            .unwrap_or_else(|| content_path.slug.clone());

        Self {
            source_path,
            collection: collection.to_string(),
            lang: content_path.lang.clone(),
            is_default_lang: content_path.is_default_lang,
            translation_key: format!("{collection}/{}", content_path.translation_key),
            frontmatter,
            body,
            body_line,
            slug,
            url: String::new(),
            alternates: Vec::new(),
            html: String::new(),
            markdown: String::new(),
            toc: Vec::new(),
            word_count: 0,
            reading_time: 0,
            summary: String::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.frontmatter.title
    }

    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.frontmatter.date
    }

    /// `updated` when present, otherwise `date`.
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.frontmatter.updated.or(self.frontmatter.date)
    }

    pub fn description(&self) -> Option<&str> {
        self.frontmatter.description.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        &self.frontmatter.tags
    }

    pub fn is_draft(&self) -> bool {
        self.frontmatter.draft
    }

    pub fn is_noindex(&self) -> bool {
        self.frontmatter.is_noindex()
    }

    /// Public URL of the Markdown sibling.
    pub fn markdown_url(&self) -> String {
        markdown_url(&self.url)
    }

    /// Store render results and derive word count, reading time and summary.
    pub fn set_rendered(&mut self, html: String, markdown: String, toc: Vec<TocEntry>) {
        self.word_count = markdown.split_whitespace().count();
        self.reading_time = self.word_count.div_ceil(WORDS_PER_MINUTE).max(1);
        self.summary = match &self.frontmatter.description {
            Some(description) => description.clone(),
            None => truncate_at_word_boundary(strip_html(&html).trim(), SUMMARY_CHARS),
        };
        self.html = html;
        self.markdown = markdown;
        self.toc = toc;
    }
}

/// Strip HTML tags from content.
pub fn strip_html(html: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                result.push(' ');
            }
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate text at word boundary, respecting UTF-8 character boundaries.
pub fn truncate_at_word_boundary(text: &str, max_chars: usize) -> String {
    let char_count = text.chars().count();
    if char_count <= max_chars {
        return text.to_string();
    }

    let truncate_byte_idx = text
        .char_indices()
        .nth(max_chars)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());

    let truncated = &text[..truncate_byte_idx];

    if let Some(last_space_byte) = truncated.rfind(' ') {
        format!("{}...", &truncated[..last_space_byte])
    } else {
        format!("{truncated}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LANGS: &[&str] = &["en", "es"];

    #[test]
    fn test_content_path_simple() {
        let cp = ContentPath::from_path(Path::new("hello.md"), "en", LANGS).expect("parse path");

        assert_eq!(cp.lang, "en");
        assert!(cp.is_default_lang);
        assert_eq!(cp.translation_key, "hello");
        assert_eq!(cp.slug, "hello");
        assert!(cp.filename_date.is_none());
    }

    #[test]
    fn test_content_path_with_language() {
        let cp = ContentPath::from_path(Path::new("about.es.md"), "en", LANGS).expect("parse path");

        assert_eq!(cp.lang, "es");
        assert!(!cp.is_default_lang);
        assert_eq!(cp.translation_key, "about");
        assert_eq!(cp.slug, "about");
    }

    #[test]
    fn test_content_path_explicit_default_language() {
        let cp = ContentPath::from_path(Path::new("about.en.md"), "en", LANGS).expect("parse path");

        assert_eq!(cp.lang, "en");
        assert!(cp.is_default_lang);
        assert_eq!(cp.translation_key, "about");
    }

    #[test]
    fn test_unconfigured_suffix_is_part_of_stem() {
        let cp = ContentPath::from_path(Path::new("notes.fr.md"), "en", LANGS).expect("parse path");

        assert_eq!(cp.lang, "en");
        assert_eq!(cp.translation_key, "notes.fr");
        assert_eq!(cp.slug, "notes-fr");
    }

    #[test]
    fn test_content_path_index_file() {
        let cp = ContentPath::from_path(Path::new("guide/index.md"), "en", LANGS).expect("parse path");

        assert_eq!(cp.translation_key, "guide/index");
        assert_eq!(cp.slug, "guide");
    }

    #[test]
    fn test_root_index_has_empty_slug() {
        let cp = ContentPath::from_path(Path::new("index.es.md"), "en", LANGS).expect("parse path");
        assert_eq!(cp.slug, "");
        assert_eq!(cp.lang, "es");
    }

    #[test]
    fn test_date_prefix() {
        let cp = ContentPath::from_path(Path::new("2026-01-02-new-year.md"), "en", LANGS)
            .expect("parse path");

        assert_eq!(cp.filename_date, NaiveDate::from_ymd_opt(2026, 1, 2));
        assert_eq!(cp.slug, "new-year");
        assert_eq!(cp.translation_key, "2026-01-02-new-year");
    }

    #[test]
    fn test_non_markdown_is_skipped() {
        assert!(ContentPath::from_path(Path::new("image.png"), "en", LANGS).is_none());
    }

    fn page_with(description: Option<&str>) -> Page {
        let cp = ContentPath::from_path(Path::new("hello.md"), "en", LANGS).unwrap();
        let fm = Frontmatter {
            title: "Hello".to_string(),
            description: description.map(String::from),
            ..Default::default()
        };
        Page::new(PathBuf::from("content/posts/hello.md"), "posts", &cp, fm, String::new(), 4)
    }

    #[test]
    fn test_page_translation_key_includes_collection() {
        let page = page_with(None);
        assert_eq!(page.translation_key, "posts/hello");
        assert_eq!(page.slug, "hello");
    }

    #[test]
    fn test_set_rendered_derives_stats() {
        let mut page = page_with(None);
        let words = vec!["word"; 450].join(" ");
        page.set_rendered(format!("<p>{words}</p>"), words.clone(), Vec::new());

        assert_eq!(page.word_count, 450);
        assert_eq!(page.reading_time, 3);
        assert!(page.summary.ends_with("..."));
        assert!(page.summary.chars().count() <= 163);
    }

    #[test]
    fn test_summary_prefers_description() {
        let mut page = page_with(Some("Short blurb"));
        page.set_rendered("<p>Body text</p>".to_string(), "Body text".to_string(), Vec::new());
        assert_eq!(page.summary, "Short blurb");
        assert_eq!(page.reading_time, 1);
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<p>Hello <b>world</b></p><p>Again</p>"), "Hello world Again");
    }

    #[test]
    fn test_truncate_at_word_boundary_utf8() {
        let text = "日本語のテキスト 日本語のテキスト";
        let truncated = truncate_at_word_boundary(text, 10);
        assert!(truncated.ends_with("..."));
    }
}
