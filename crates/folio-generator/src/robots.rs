//! Robots.txt generation.

use folio_core::{Config, Page};
use tracing::debug;

/// Robots.txt generator.
#[derive(Debug)]
pub struct RobotsGenerator<'a> {
    config: &'a Config,
}

impl<'a> RobotsGenerator<'a> {
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Render robots.txt: configured rules, a `Disallow` for every `noindex`
    /// page, then the sitemap URL.
    pub fn generate(&self, pages: &[Page]) -> String {
        let mut out = String::from("User-agent: *\n");

        for path in &self.config.robots.allow {
            out.push_str(&format!("Allow: {path}\n"));
        }
        for path in &self.config.robots.disallow {
            out.push_str(&format!("Disallow: {path}\n"));
        }

        let mut hidden = 0usize;
        for page in pages.iter().filter(|p| p.is_noindex()) {
            out.push_str(&format!("Disallow: {}\n", page.url));
            hidden += 1;
        }
        debug!(hidden, "generating robots.txt");

        out.push_str(&format!("\nSitemap: {}\n", self.config.url_for("/sitemap.xml")));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{config, page};

    #[test]
    fn test_generate_robots() {
        let mut config = config();
        config.robots.allow = vec!["/".into()];
        config.robots.disallow = vec!["/drafts/".into()];

        let mut hidden = page(&config, "pages", "hidden.md", "---\ntitle: Hidden\nrobots: noindex\n---\n");
        hidden.url = "/hidden".into();
        let mut shown = page(&config, "pages", "shown.md", "---\ntitle: Shown\n---\n");
        shown.url = "/shown".into();

        let robots = RobotsGenerator::new(&config).generate(&[hidden, shown]);
        assert_eq!(
            robots,
            "User-agent: *\nAllow: /\nDisallow: /drafts/\nDisallow: /hidden\n\nSitemap: https://example.com/sitemap.xml\n"
        );
    }

    #[test]
    fn test_default_robots() {
        let config = config();
        let robots = RobotsGenerator::new(&config).generate(&[]);
        assert_eq!(robots, "User-agent: *\n\nSitemap: https://example.com/sitemap.xml\n");
    }
}
