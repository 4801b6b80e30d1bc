//! llms.txt and llms-full.txt generation.
//!
//! `llms.txt` lists every published page with its description and absolute
//! URL, grouped by language and collection. `llms-full.txt` carries the full
//! Markdown of the same pages in the same order.

use folio_core::{Config, Page};
use tracing::debug;

pub const LLMS_PATH: &str = "llms.txt";
pub const LLMS_FULL_PATH: &str = "llms-full.txt";

/// Generator for the llms files.
#[derive(Debug)]
pub struct LlmsGenerator<'a> {
    config: &'a Config,
}

impl<'a> LlmsGenerator<'a> {
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Published pages grouped by language then collection, with their
    /// collection label. A `noindex` robots directive does not remove a page.
    fn sections<'p>(&self, pages: &'p [Page]) -> Vec<(String, Vec<&'p Page>)> {
        let multilingual = self.config.is_multilingual();
        let mut sections = Vec::new();

        for lang in self.config.all_languages() {
            for collection in &self.config.collections {
                let members: Vec<&Page> = pages
                    .iter()
                    .filter(|p| p.lang == lang && p.collection == collection.name)
                    .collect();
                if members.is_empty() {
                    continue;
                }
                let heading = if multilingual {
                    format!("{} ({lang})", collection.label())
                } else {
                    collection.label().to_string()
                };
                sections.push((heading, members));
            }
        }
        sections
    }

    fn header(&self) -> String {
        let mut out = format!("# {}\n\n", self.config.site.title);
        if let Some(description) = &self.config.site.description {
            out.push_str(&format!("> {description}\n\n"));
        }
        out
    }

    /// Generate llms.txt.
    pub fn generate_index(&self, pages: &[Page]) -> String {
        let mut out = self.header();
        let sections = self.sections(pages);
        debug!(sections = sections.len(), "generating llms.txt");

        for (heading, members) in sections {
            out.push_str(&format!("## {heading}\n\n"));
            for page in members {
                let url = self.config.url_for(&page.url);
                match page.description() {
                    Some(description) => {
                        out.push_str(&format!("- [{}]({url}): {description}\n", page.title()));
                    }
                    None => out.push_str(&format!("- [{}]({url})\n", page.title())),
                }
            }
            out.push('\n');
        }
        out
    }

    /// Generate llms-full.txt.
    pub fn generate_full(&self, pages: &[Page]) -> String {
        let mut out = self.header();

        for (_, members) in self.sections(pages) {
            for page in members {
                out.push_str(&format!("## {}\n\n", page.title()));
                out.push_str(&format!("URL: {}\n", self.config.url_for(&page.url)));
                if let Some(date) = page.date() {
                    out.push_str(&format!("Date: {}\n", date.format("%Y-%m-%d")));
                }
                out.push('\n');
                let markdown = page.markdown.trim();
                if !markdown.is_empty() {
                    out.push_str(markdown);
                    out.push_str("\n\n");
                }
                out.push_str("---\n\n");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{config, page, post};

    fn pages(config: &Config) -> Vec<Page> {
        let mut pages = vec![
            post(config, "hello.md", "Hello", "2026-01-01", &[]),
            page(config, "pages", "about.md", "---\ntitle: About\ndescription: Who we are\n---\n"),
            page(config, "pages", "about.es.md", "---\ntitle: Sobre\n---\n"),
            page(config, "pages", "private.md", "---\ntitle: Private\nrobots: noindex\n---\n"),
        ];
        for page in &mut pages {
            page.url = format!("{}/{}", config.lang_prefix(&page.lang), page.slug);
            let markdown = format!("# {}\n\nText.", page.title());
            page.set_rendered(String::new(), markdown, Vec::new());
        }
        pages
    }

    #[test]
    fn test_llms_index() {
        let config = config();
        let pages = pages(&config);
        let llms = LlmsGenerator::new(&config).generate_index(&pages);

        assert!(llms.starts_with("# Test Site\n\n> A test site\n\n"));
        assert!(llms.contains("## Posts (en)\n\n- [Hello](https://example.com/hello)\n"));
        assert!(llms.contains(
            "## Pages (en)\n\n- [About](https://example.com/about): Who we are\n- [Private](https://example.com/private)\n"
        ));
        assert!(llms.contains("## Pages (es)\n\n- [Sobre](https://example.com/es/about)\n"));
    }

    #[test]
    fn test_llms_full_matches_index_order() {
        let config = config();
        let pages = pages(&config);
        let full = LlmsGenerator::new(&config).generate_full(&pages);

        let hello = full.find("## Hello").unwrap();
        let about = full.find("## About").unwrap();
        let sobre = full.find("## Sobre").unwrap();
        let private = full.find("## Private").unwrap();
        assert!(hello < about && about < private && private < sobre);
        assert!(full.contains("URL: https://example.com/hello\nDate: 2026-01-01\n\n# Hello\n\nText.\n\n---\n"));
    }
}
