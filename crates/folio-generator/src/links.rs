//! Internal link validation.
//!
//! Every `href`/`src` on `a`, `link`, `img`, `script`, `source` and `iframe`
//! elements of emitted HTML is resolved against the set of published URLs.

use std::{
    collections::HashSet,
    sync::LazyLock,
};

use folio_core::url::normalize;
use regex::{Captures, Regex};
use thiserror::Error;
use tracing::{debug, warn};

use crate::output::{ArtifactKind, OutputSet};

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<(?:a|link|img|script|source|iframe)\b[^>]*?\s(?:href|src)\s*=\s*(?:"([^"]*)"|'([^']*)')"#,
    )
    .unwrap_or_else(|e| unreachable!("reference pattern is valid: {e}"))
});

/// An internal reference with no matching URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenLink {
    /// Output path of the document holding the reference.
    pub source: String,
    /// The reference as written.
    pub target: String,
}

/// Broken links found in strict mode.
#[derive(Debug, Error)]
#[error("{} broken internal link(s), first `{}` in {}", .links.len(), first_target(.links), first_source(.links))]
pub struct BrokenLinkError {
    pub links: Vec<BrokenLink>,
}

fn first_target(links: &[BrokenLink]) -> &str {
    links.first().map_or("", |l| l.target.as_str())
}

fn first_source(links: &[BrokenLink]) -> &str {
    links.first().map_or("", |l| l.source.as_str())
}

/// Every `href`/`src` value in `html`, in document order.
pub fn references(html: &str) -> Vec<&str> {
    REFERENCE
        .captures_iter(html)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str())
        .collect()
}

/// Replace `href`/`src` values for which `rewrite` returns a new value.
pub fn rewrite_references(html: &str, rewrite: impl Fn(&str) -> Option<String>) -> String {
    REFERENCE
        .replace_all(html, |caps: &Captures<'_>| {
            let whole = caps.get(0).map_or("", |m| m.as_str());
            let Some(value) = caps.get(1).or_else(|| caps.get(2)) else {
                return whole.to_string();
            };
            let Some(replacement) = rewrite(value.as_str()) else {
                return whole.to_string();
            };
            let start = value.start() - caps.get(0).map_or(0, |m| m.start());
            format!(
                "{}{replacement}{}",
                &whole[..start],
                &whole[start + value.as_str().len()..]
            )
        })
        .into_owned()
}

/// Whether a reference points into the site.
///
/// References with a scheme (`https:`, `mailto:`, `data:`, ...), protocol
/// relative references and fragment-only references are external.
pub fn is_internal(reference: &str) -> bool {
    let reference = reference.trim();
    if reference.is_empty() || reference.starts_with('#') || reference.starts_with("//") {
        return false;
    }
    let head_end = reference.find(['/', '?', '#']).unwrap_or(reference.len());
    !reference[..head_end].contains(':')
}

/// Strip query and fragment.
pub fn path_part(reference: &str) -> &str {
    let end = reference.find(['?', '#']).unwrap_or(reference.len());
    &reference[..end]
}

/// Resolve an internal reference found in the document served from
/// `document_url` to a normalized site URL.
pub fn resolve(reference: &str, document_url: &str) -> String {
    let path = path_part(reference.trim());
    let joined = if path.starts_with('/') {
        path.to_string()
    } else {
        let dir_end = document_url.rfind('/').map_or(0, |i| i + 1);
        format!("{}{path}", &document_url[..dir_end])
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    let mut resolved = format!("/{}", segments.join("/"));
    if (joined.ends_with('/') || joined.ends_with("/.") || joined.ends_with("/..")) && resolved != "/" {
        resolved.push('/');
    }
    normalize(&resolved)
}

/// Published URLs and the references between them.
#[derive(Debug, Default)]
pub struct LinkGraph {
    known: HashSet<String>,
}

impl LinkGraph {
    /// Build the node set from emitted artifacts plus URLs published later
    /// (aggregate files).
    pub fn new<'a>(output: &OutputSet, planned: impl IntoIterator<Item = &'a str>) -> Self {
        let known = output
            .iter()
            .map(|artifact| normalize(&artifact.url()))
            .chain(planned.into_iter().map(normalize))
            .collect();
        Self { known }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.known.contains(&normalize(url))
    }

    /// Check every HTML artifact and return the broken links in path order.
    pub fn check(&self, output: &OutputSet) -> Vec<BrokenLink> {
        let mut broken = Vec::new();
        let mut checked = 0usize;

        for artifact in output.of_kind(ArtifactKind::Html) {
            let document_url = artifact.url();
            for reference in references(artifact.as_str().unwrap_or_default()) {
                if !is_internal(reference) {
                    continue;
                }
                checked += 1;
                let target = resolve(reference, &document_url);
                if !self.known.contains(&target) {
                    broken.push(BrokenLink {
                        source: artifact.path.display().to_string(),
                        target: reference.to_string(),
                    });
                }
            }
        }

        debug!(checked, broken = broken.len(), "validated internal links");
        broken
    }
}

/// Apply the strict-mode policy: warn for each broken link, then fail when
/// `strict` is set.
pub fn enforce(broken: Vec<BrokenLink>, strict: bool) -> Result<Vec<BrokenLink>, BrokenLinkError> {
    for link in &broken {
        warn!(source = %link.source, target = %link.target, "broken internal link");
    }
    if strict && !broken.is_empty() {
        return Err(BrokenLinkError { links: broken });
    }
    Ok(broken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::BuildArtifact;

    fn output(files: &[(&str, &str)]) -> OutputSet {
        let mut set = OutputSet::new();
        for (path, content) in files {
            let kind = if path.ends_with(".html") {
                ArtifactKind::Html
            } else {
                ArtifactKind::Static
            };
            set.insert(BuildArtifact::text(*path, *content, kind, "test")).unwrap();
        }
        set
    }

    #[test]
    fn test_references() {
        let html = r#"<a class="x" href="/a">A</a><img alt='' src='/b.png'><link rel="stylesheet" href="/c.css"><div href="/ignored"></div><IFRAME SRC="/d"></iframe>"#;
        assert_eq!(references(html), vec!["/a", "/b.png", "/c.css", "/d"]);
    }

    #[test]
    fn test_is_internal() {
        for internal in ["/posts/", "about", "../x", "./y?z=1", "/a#frag", "page/2"] {
            assert!(is_internal(internal), "{internal}");
        }
        for external in ["https://x.com", "//cdn.x/y", "#top", "mailto:a@b", "tel:123", "data:image/png;base64,xx", ""] {
            assert!(!is_internal(external), "{external}");
        }
    }

    #[test]
    fn test_resolve() {
        assert_eq!(resolve("/posts/", "/index.html"), "/posts");
        assert_eq!(resolve("/posts/index.html", "/index.html"), "/posts");
        assert_eq!(resolve("/posts/hello.html#x", "/index.html"), "/posts/hello");
        assert_eq!(resolve("../about?x=1", "/posts/hello.html"), "/about");
        assert_eq!(resolve("page/2", "/posts/index.html"), "/posts/page/2");
        assert_eq!(resolve("./", "/posts/index.html"), "/posts");
        assert_eq!(resolve("../../..", "/a/b.html"), "/");
    }

    #[test]
    fn test_rewrite_references() {
        let html = r#"<link href="/static/a.css"><img src='/static/b.png' alt="b"><a href="/x">x</a>"#;
        let rewritten = rewrite_references(html, |value| {
            value
                .strip_prefix("/static/")
                .map(|rest| format!("/static/v1/{rest}"))
        });
        assert_eq!(
            rewritten,
            r#"<link href="/static/v1/a.css"><img src='/static/v1/b.png' alt="b"><a href="/x">x</a>"#
        );
    }

    #[test]
    fn test_link_graph() {
        let set = output(&[
            ("index.html", r#"<a href="/posts/">P</a> <a href="/posts/hello">H</a> <a href="/feed.xml">F</a> <a href="/missing">M</a> <a href="https://x.com">X</a>"#),
            ("posts/index.html", r#"<a href="hello">H</a><a href="../static/a.css">S</a>"#),
            ("posts/hello.html", r##"<a href="#top">T</a><a href="/posts/hello.md">md</a>"##),
            ("posts/hello.md", "# Hello"),
            ("static/a.css", "body{}"),
        ]);
        let graph = LinkGraph::new(&set, ["/feed.xml"]);
        assert!(graph.contains("/posts/index.html"));

        let broken = graph.check(&set);
        assert_eq!(
            broken,
            vec![BrokenLink {
                source: "index.html".into(),
                target: "/missing".into(),
            }]
        );
    }

    #[test]
    fn test_enforce() {
        let broken = vec![BrokenLink {
            source: "index.html".into(),
            target: "/posts/does-not-exist".into(),
        }];
        assert_eq!(enforce(broken.clone(), false).unwrap().len(), 1);

        let err = enforce(broken, true).unwrap_err();
        assert_eq!(
            err.to_string(),
            "1 broken internal link(s), first `/posts/does-not-exist` in index.html"
        );
        assert!(enforce(Vec::new(), true).unwrap().is_empty());
    }
}
