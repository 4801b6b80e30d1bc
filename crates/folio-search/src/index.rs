//! JSON search index for client-side search.
//!
//! The whole index is fetched by the browser, so it stores a compact entry
//! per page plus an inverted term index pointing into the entry list.

use std::collections::{BTreeMap, BTreeSet};

use folio_core::{Page, content::strip_html};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::Result;

/// Maximum recommended size for the serialized index (500KB).
pub const MAX_INDEX_SIZE: usize = 500 * 1024;

/// A searchable projection of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchIndexEntry {
    /// Page title.
    pub title: String,

    /// Canonical page URL.
    pub url: String,

    /// Description or summary.
    pub excerpt: String,

    /// Tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Language code.
    pub lang: String,

    /// Publication date as RFC 3339.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// A JSON search index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchIndex {
    /// Index format version.
    pub version: u32,

    /// Indexed entries.
    pub entries: Vec<SearchIndexEntry>,

    /// Inverted index: term -> entry positions.
    pub index: BTreeMap<String, Vec<usize>>,
}

impl SearchIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self {
            version: 1,
            entries: Vec::new(),
            index: BTreeMap::new(),
        }
    }

    /// Build an index from pages in publication order.
    pub fn from_pages<'a>(pages: impl IntoIterator<Item = &'a Page>) -> Self {
        let mut index = Self::new();
        for page in pages {
            index.add_page(page);
        }

        info!(
            entries = index.entries.len(),
            terms = index.index.len(),
            "built search index"
        );
        index
    }

    /// Add a page to the index.
    pub fn add_page(&mut self, page: &Page) {
        let position = self.entries.len();
        for term in tokenize_content(page.title(), &page.html, page.tags()) {
            self.index.entry(term).or_default().push(position);
        }

        self.entries.push(SearchIndexEntry {
            title: page.title().to_string(),
            url: page.url.clone(),
            excerpt: page.summary.clone(),
            tags: page.tags().to_vec(),
            lang: page.lang.clone(),
            date: page.date().map(|d| d.to_rfc3339()),
        });
    }

    /// Search the index for entries containing all query terms.
    pub fn search(&self, query: &str) -> Vec<&SearchIndexEntry> {
        let terms = tokenize_text(query);
        if terms.is_empty() {
            return Vec::new();
        }

        let mut matches: Option<Vec<usize>> = None;
        for term in &terms {
            let Some(postings) = self.index.get(term) else {
                return Vec::new();
            };
            match &mut matches {
                None => matches = Some(postings.clone()),
                Some(current) => current.retain(|idx| postings.binary_search(idx).is_ok()),
            }
        }

        matches
            .unwrap_or_default()
            .iter()
            .filter_map(|&idx| self.entries.get(idx))
            .collect()
    }

    /// Serialize the index to JSON, warning when it grows past `MAX_INDEX_SIZE`.
    pub fn to_json(&self) -> Result<String> {
        let json = serde_json::to_string(self)?;
        if json.len() > MAX_INDEX_SIZE {
            warn!(
                size = json.len(),
                max = MAX_INDEX_SIZE,
                "search index exceeds recommended size"
            );
        }
        Ok(json)
    }

    /// Deserialize an index from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Deduplicated terms from title, body HTML and tags.
fn tokenize_content(title: &str, html: &str, tags: &[String]) -> BTreeSet<String> {
    let mut terms: BTreeSet<String> = tokenize_text(title).into_iter().collect();
    terms.extend(tokenize_text(&strip_html(html)));
    terms.extend(tags.iter().map(|tag| normalize_term(tag)));
    terms
}

/// Tokenize text into normalized terms.
///
/// Space-separated scripts yield words of two or more characters; CJK runs
/// yield single characters and bigrams.
fn tokenize_text(text: &str) -> Vec<String> {
    let mut terms: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric() || is_cjk_char(c))
        .filter(|word| word.chars().count() >= 2)
        .map(normalize_term)
        .collect();

    let cjk: Vec<char> = text.chars().filter(|c| is_cjk_char(*c)).collect();
    terms.extend(cjk.iter().map(char::to_string));
    terms.extend(cjk.windows(2).map(|pair| pair.iter().collect::<String>()));

    terms
}

/// Check if a character is a CJK (Chinese, Japanese, Korean) character.
fn is_cjk_char(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}' |
        '\u{3400}'..='\u{4DBF}' |
        '\u{20000}'..='\u{2A6DF}' |
        '\u{F900}'..='\u{FAFF}' |
        '\u{3040}'..='\u{309F}' |
        '\u{30A0}'..='\u{30FF}' |
        '\u{AC00}'..='\u{D7AF}'
    )
}

fn normalize_term(term: &str) -> String {
    term.trim().to_lowercase()
}
