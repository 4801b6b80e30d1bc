//! Fixtures shared by unit tests.

use std::path::Path;

use folio_core::{Config, ContentPath, Page, parse_frontmatter};

pub const SITE_TOML: &str = r#"
[site]
title = "Test Site"
description = "A test site"
base_url = "https://example.com"
language = "en"
author = "Test Author"

[languages.es]
title = "Sitio de prueba"

[[collections]]
name = "posts"
label = "Posts"
has_date = true
has_rss = true
listed = true
paginate = 2

[[collections]]
name = "pages"
label = "Pages"
url_prefix = ""
"#;

pub fn config() -> Config {
    Config::from_toml_str(SITE_TOML).unwrap()
}

/// Build a raw page from a collection-relative path and a full source file.
pub fn page(config: &Config, collection: &str, relative: &str, source: &str) -> Page {
    let source_path = Path::new("content").join(collection).join(relative);
    let languages = config.all_languages();
    let content_path =
        ContentPath::from_path(Path::new(relative), config.default_language(), &languages).unwrap();

    let mut doc = parse_frontmatter(source, &source_path).unwrap();
    if config.collection(collection).is_some_and(|c| c.has_date) {
        doc.frontmatter
            .require_date(&source_path, content_path.filename_date)
            .unwrap();
    }
    Page::new(
        source_path,
        collection,
        &content_path,
        doc.frontmatter,
        doc.body,
        doc.body_line,
    )
}

/// A dated post with tags.
pub fn post(config: &Config, relative: &str, title: &str, date: &str, tags: &[&str]) -> Page {
    let tags = tags
        .iter()
        .map(|t| format!("\"{t}\""))
        .collect::<Vec<_>>()
        .join(", ");
    page(
        config,
        "posts",
        relative,
        &format!("---\ntitle: \"{title}\"\ndate: {date}\ntags: [{tags}]\n---\nBody of {title}.\n"),
    )
}
