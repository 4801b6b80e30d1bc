//! URL construction and URL → output path mapping.
//!
//! Every published address is a site-relative path starting with `/`.
//! Directory-style URLs end with `/` and map to `index.html`; everything
//! else maps to `<path>.html`.

use std::path::PathBuf;

/// Convert arbitrary text into a URL-safe slug.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut last_dash = true;

    for c in text.chars() {
        if c.is_alphanumeric() {
            for lower in c.to_lowercase() {
                slug.push(lower);
            }
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Normalize a collection URL prefix to `""` or `/segment[/segment]`.
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// Build a page URL from a language prefix, a collection prefix and a slug.
///
/// An empty slug yields the directory URL of the prefix (`/`, `/es/`, `/docs/`).
pub fn page_url(lang_prefix: &str, collection_prefix: &str, slug: &str) -> String {
    let slug = slug.trim_matches('/');
    if slug.is_empty() {
        format!("{lang_prefix}{collection_prefix}/")
    } else {
        format!("{lang_prefix}{collection_prefix}/{slug}")
    }
}

/// URL of page `number` (1-based) of a listing rooted at `base`.
///
/// `base` is a directory URL; page 1 lives at the base itself.
pub fn listing_url(base: &str, number: usize) -> String {
    if number <= 1 {
        base.to_string()
    } else {
        format!("{}/page/{number}", base.trim_end_matches('/'))
    }
}

/// Map a URL to the HTML file that serves it.
pub fn output_path(url: &str) -> PathBuf {
    with_extension(url, "html")
}

/// Map a URL to its Markdown sibling file.
pub fn markdown_path(url: &str) -> PathBuf {
    with_extension(url, "md")
}

/// The public URL of a page's Markdown sibling.
pub fn markdown_url(url: &str) -> String {
    format!("/{}", markdown_path(url).to_string_lossy().replace('\\', "/"))
}

fn with_extension(url: &str, ext: &str) -> PathBuf {
    let trimmed = url.trim_start_matches('/');
    if trimmed.is_empty() {
        PathBuf::from(format!("index.{ext}"))
    } else if trimmed.ends_with('/') {
        PathBuf::from(format!("{trimmed}index.{ext}"))
    } else {
        PathBuf::from(format!("{trimmed}.{ext}"))
    }
}

/// Normalize an internal URL for comparison.
///
/// `/posts/`, `/posts/index.html` and `/posts` all normalize to `/posts`;
/// `/posts/hello.html` normalizes to `/posts/hello`.
pub fn normalize(url: &str) -> String {
    let mut path = url.to_string();
    if let Some(stripped) = path.strip_suffix("index.html") {
        path = stripped.to_string();
    } else if let Some(stripped) = path.strip_suffix(".html") {
        path = stripped.to_string();
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
