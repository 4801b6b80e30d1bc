//! Markdown rendering using pulldown-cmark.

use std::collections::HashMap;

use folio_core::{TocEntry, url::slugify};
use pulldown_cmark::{CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::{Result, syntax::SyntaxHighlighter};

/// HTML and table of contents produced from a markdown body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedMarkdown {
    pub html: String,
    pub toc: Vec<TocEntry>,
}

/// Markdown renderer with syntax highlighting and heading anchors.
#[derive(Debug)]
pub struct MarkdownRenderer {
    highlighter: SyntaxHighlighter,
    options: Options,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

struct PendingHeading {
    level: HeadingLevel,
    id: Option<String>,
    start: usize,
    text: String,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer with default options.
    pub fn new() -> Self {
        Self::with_highlighter(SyntaxHighlighter::default())
    }

    /// Create a renderer highlighting with a named syntect theme.
    pub fn with_theme(theme: &str) -> Result<Self> {
        Ok(Self::with_highlighter(SyntaxHighlighter::new(theme)?))
    }

    fn with_highlighter(highlighter: SyntaxHighlighter) -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        Self {
            highlighter,
            options,
        }
    }

    /// Render a markdown body to HTML, collecting headings into a TOC.
    ///
    /// Every heading gets a unique `id`; an explicit `{#id}` attribute wins
    /// over the slug of its text. Fenced code is highlighted.
    pub fn render(&self, markdown: &str) -> RenderedMarkdown {
        let mut toc = Vec::new();
        let mut used_ids: HashMap<String, usize> = HashMap::new();
        let mut events: Vec<Event<'_>> = Vec::new();
        let mut heading: Option<PendingHeading> = None;
        let mut code: Option<(Option<String>, String)> = None;

        for event in Parser::new_ext(markdown, self.options) {
            if let Some((_, buffer)) = code.as_mut() {
                match event {
                    Event::Text(text) => buffer.push_str(&text),
                    Event::End(TagEnd::CodeBlock) => {
                        if let Some((lang, buffer)) = code.take() {
                            let highlighted = self.highlighter.highlight(&buffer, lang.as_deref());
                            events.push(Event::Html(CowStr::from(highlighted)));
                        }
                    }
                    _ => {}
                }
                continue;
            }

            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split_whitespace()
                            .next()
                            .filter(|l| !l.is_empty())
                            .map(str::to_string),
                        CodeBlockKind::Indented => None,
                    };
                    code = Some((lang, String::new()));
                }
                Event::Start(Tag::Heading { level, id, .. }) => {
                    heading = Some(PendingHeading {
                        level,
                        id: id.map(|i| i.to_string()),
                        start: events.len(),
                        text: String::new(),
                    });
                    events.push(Event::Html(CowStr::Borrowed("")));
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some(pending) = heading.take() {
                        let level = pending.level as u8;
                        let base = pending.id.unwrap_or_else(|| slugify(&pending.text));
                        let id = unique_id(base, &mut used_ids);
                        events[pending.start] =
                            Event::Html(CowStr::from(format!("<h{level} id=\"{id}\">")));
                        events.push(Event::Html(CowStr::from(format!("</h{level}>\n"))));
                        toc.push(TocEntry {
                            level,
                            text: pending.text.trim().to_string(),
                            id,
                        });
                    }
                }
                Event::Text(ref text) | Event::Code(ref text) => {
                    if let Some(pending) = heading.as_mut() {
                        pending.text.push_str(text);
                    }
                    events.push(event);
                }
                other => events.push(other),
            }
        }

        let mut html = String::with_capacity(markdown.len() * 3 / 2);
        pulldown_cmark::html::push_html(&mut html, events.into_iter());

        RenderedMarkdown { html, toc }
    }
}

fn unique_id(base: String, used: &mut HashMap<String, usize>) -> String {
    let base = if base.is_empty() {
        "section".to_string()
    } else {
        base
    };
    let count = used.entry(base.clone()).or_insert(0);
    *count += 1;
    if *count == 1 {
        base
    } else {
        format!("{base}-{}", *count - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_simple_markdown() {
        let renderer = MarkdownRenderer::new();
        let out = renderer.render("# Hello World\n\nThis is a *test*.");

        assert!(out.html.contains("<h1 id=\"hello-world\">Hello World</h1>"));
        assert!(out.html.contains("<p>This is a <em>test</em>.</p>"));
    }

    #[test]
    fn test_render_code_block() {
        let renderer = MarkdownRenderer::new();
        let out = renderer.render("```rust\nfn main() {\n    println!(\"Hello\");\n}\n```");

        assert!(out.html.contains("<pre"));
        assert!(out.html.contains("main"));
        assert!(!out.html.contains("```"));
    }

    #[test]
    fn test_toc_extraction() {
        let renderer = MarkdownRenderer::new();
        let out = renderer.render("# Heading 1\n## Heading `2`\n### Heading 3");

        assert_eq!(out.toc.len(), 3);
        assert_eq!(out.toc[0].level, 1);
        assert_eq!(out.toc[0].text, "Heading 1");
        assert_eq!(out.toc[1].text, "Heading 2");
        assert_eq!(out.toc[1].id, "heading-2");
        assert_eq!(out.toc[2].level, 3);
    }

    #[test]
    fn test_duplicate_heading_ids() {
        let renderer = MarkdownRenderer::new();
        let out = renderer.render("## Setup\n\n## Setup\n");

        assert_eq!(out.toc[0].id, "setup");
        assert_eq!(out.toc[1].id, "setup-1");
        assert!(out.html.contains("id=\"setup-1\""));
    }

    #[test]
    fn test_explicit_heading_id() {
        let renderer = MarkdownRenderer::new();
        let out = renderer.render("## Install {#install-guide}\n");
        assert_eq!(out.toc[0].id, "install-guide");
    }

    #[test]
    fn test_table_rendering() {
        let renderer = MarkdownRenderer::new();
        let out = renderer.render("| Header 1 | Header 2 |\n|----------|----------|\n| Cell 1   | Cell 2   |");

        assert!(out.html.contains("<table>"));
        assert!(out.html.contains("<thead>"));
        assert!(out.html.contains("<td>Cell 1</td>"));
    }

    #[test]
    fn test_task_list() {
        let renderer = MarkdownRenderer::new();
        let out = renderer.render("- [x] Done\n- [ ] Not done");

        assert!(out.html.contains("checkbox"));
        assert!(out.html.contains("checked"));
    }

    #[test]
    fn test_links_and_raw_html_pass_through() {
        let renderer = MarkdownRenderer::new();
        let out = renderer.render("[About](/about) and <span class=\"x\">raw</span>\n\n<div id=\"keep\"></div>\n");

        assert!(out.html.contains("<a href=\"/about\">About</a>"));
        assert!(out.html.contains("<span class=\"x\">raw</span>"));
        assert!(out.html.contains("<div id=\"keep\"></div>"));
    }

    #[test]
    fn test_unknown_theme_is_error() {
        assert!(MarkdownRenderer::with_theme("no-such-theme").is_err());
        assert!(MarkdownRenderer::with_theme("InspiredGitHub").is_ok());
    }
}
