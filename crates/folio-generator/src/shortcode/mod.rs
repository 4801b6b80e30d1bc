//! Shortcode expansion.
//!
//! A markdown body is tokenized into text and shortcode tags (code regions
//! stay text), then expanded with a stack of open body shortcodes. The
//! result comes in two forms:
//!
//! - `markdown`: shortcodes replaced by their HTML, for the `.md` sibling
//! - `placeholder_markdown`: shortcodes replaced by opaque tokens, so the
//!   markdown renderer never touches shortcode HTML; [`Expansion::restore`]
//!   swaps the tokens back after rendering
//!
//! Tokens are `FOLIOSC000000Z`, with the prefix lengthened until it does
//! not occur in the body.

pub mod args;
pub mod builtins;
pub mod lexer;
pub mod registry;

use std::path::{Path, PathBuf};

use folio_parser::MarkdownRenderer;
use serde_json::{Map, Value};
use thiserror::Error;

pub use registry::{ShortcodeCall, ShortcodeDef, ShortcodeKind, ShortcodeRegistry, ShortcodeSource};

use self::lexer::{Tag, Token};
use crate::template::{RenderContext, TemplateError, TemplateRegistry};

/// Default prefix of placeholder tokens.
const PLACEHOLDER_PREFIX: &str = "FOLIOSC";

/// Argument names that would shadow template namespaces.
pub const RESERVED_ARGUMENTS: &[&str] = &["page", "site", "data", "collection", "body", "args"];

/// Shortcode expansion errors. Lines are 1-based lines of the source file.
#[derive(Debug, Error)]
pub enum ShortcodeError {
    #[error("{}:{line}: unknown shortcode `{name}` (known: {known})", path.display())]
    Unknown {
        path: PathBuf,
        line: usize,
        name: String,
        known: String,
    },

    #[error("{}:{line}: shortcode `{name}` is never closed with `{{% end %}}`", path.display())]
    Unclosed {
        path: PathBuf,
        line: usize,
        name: String,
    },

    #[error("{}:{line}: `{{% end {found} %}}` does not close the open shortcode `{expected}`", path.display())]
    MismatchedEnd {
        path: PathBuf,
        line: usize,
        found: String,
        expected: String,
    },

    #[error("{}:{line}: `{{% end %}}` without an open shortcode", path.display())]
    UnexpectedEnd { path: PathBuf, line: usize },

    #[error("{}:{line}: bad arguments to `{name}`: {message}", path.display())]
    Argument {
        path: PathBuf,
        line: usize,
        name: String,
        message: String,
    },

    #[error("{}:{line}: argument `{argument}` of `{name}` is reserved", path.display())]
    ReservedArgument {
        path: PathBuf,
        line: usize,
        name: String,
        argument: String,
    },

    /// Inline use of a body-only shortcode, or the reverse.
    #[error("{}:{line}: {message}", path.display())]
    Usage {
        path: PathBuf,
        line: usize,
        name: String,
        message: String,
    },

    #[error("{}:{line}: shortcode `{name}` failed: {message}", path.display())]
    Render {
        path: PathBuf,
        line: usize,
        name: String,
        message: String,
    },

    #[error("{}:{line}: shortcode `{name}`: {source}", path.display())]
    Template {
        path: PathBuf,
        line: usize,
        name: String,
        #[source]
        source: TemplateError,
    },

    #[error("{}:{line}: {message}", path.display())]
    Syntax {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, ShortcodeError>;

/// Result of expanding one markdown body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    pub markdown: String,
    pub placeholder_markdown: String,
    fragments: Fragments,
}

impl Expansion {
    /// Number of shortcode outputs held for restoration.
    pub fn fragment_count(&self) -> usize {
        self.fragments.html.len()
    }

    /// Replace placeholder tokens in rendered HTML with shortcode output.
    ///
    /// A token alone in a paragraph replaces the whole `<p>` element so
    /// block-level output is not wrapped.
    pub fn restore(&self, html: &str) -> String {
        self.fragments.restore(html)
    }
}

/// Shortcode outputs and the token prefix standing in for them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Fragments {
    prefix: String,
    html: Vec<String>,
}

impl Fragments {
    fn for_body(body: &str) -> Self {
        let mut prefix = PLACEHOLDER_PREFIX.to_string();
        while body.contains(&prefix) {
            prefix.push('X');
        }
        Self {
            prefix,
            html: Vec::new(),
        }
    }

    fn token(&self, index: usize) -> String {
        format!("{}{index:06}Z", self.prefix)
    }

    fn push(&mut self, frame: &mut Frame<'_>, html: String) {
        frame.markdown.push_str(&html);
        frame.placeholder.push_str(&self.token(self.html.len()));
        self.html.push(html);
    }

    fn restore(&self, html: &str) -> String {
        let mut out = html.to_string();
        for (index, fragment) in self.html.iter().enumerate() {
            let token = self.token(index);
            if !out.contains(&token) {
                continue;
            }
            out = out
                .replace(&format!("<p>{token}</p>"), fragment)
                .replace(&token, fragment);
        }
        out
    }
}

/// An open body shortcode and the text collected inside it.
struct Frame<'s> {
    open: Option<(Tag<'s>, &'s ShortcodeDef, Map<String, Value>)>,
    markdown: String,
    placeholder: String,
}

impl Frame<'_> {
    fn push_text(&mut self, text: &str) {
        self.markdown.push_str(text);
        self.placeholder.push_str(text);
    }
}

/// Expands shortcodes against a registry.
#[derive(Debug, Clone, Copy)]
pub struct ShortcodeProcessor<'a> {
    registry: &'a ShortcodeRegistry,
    templates: &'a TemplateRegistry,
    renderer: &'a MarkdownRenderer,
}

impl<'a> ShortcodeProcessor<'a> {
    #[must_use]
    pub fn new(
        registry: &'a ShortcodeRegistry,
        templates: &'a TemplateRegistry,
        renderer: &'a MarkdownRenderer,
    ) -> Self {
        Self {
            registry,
            templates,
            renderer,
        }
    }

    /// Expand every shortcode in `body`.
    ///
    /// `first_line` is the file line on which `body` starts; `context`
    /// supplies the namespaces template shortcodes render against.
    pub fn expand(
        &self,
        body: &str,
        path: &Path,
        first_line: usize,
        context: &RenderContext<'_>,
    ) -> Result<Expansion> {
        let at = |line: usize| first_line + line.saturating_sub(1);

        let tokens = lexer::tokenize(body).map_err(|e| ShortcodeError::Syntax {
            path: path.to_path_buf(),
            line: at(e.line),
            message: e.message,
        })?;

        let mut fragments = Fragments::for_body(body);
        let mut stack = vec![Frame {
            open: None,
            markdown: String::with_capacity(body.len()),
            placeholder: String::with_capacity(body.len()),
        }];

        for token in tokens {
            match token {
                Token::Text(text) => top(&mut stack).push_text(text),
                Token::Inline(tag) => {
                    let def = self.lookup(&tag, path, at(tag.line))?;
                    if !def.kind.allows_inline() {
                        return Err(usage(path, at(tag.line), &def.name, "a body", "{{% name %}}…{{% end %}}"));
                    }
                    let args = parse_tag_args(&tag, path, at(tag.line))?;
                    let html = self.render(def, &args, None, path, at(tag.line), context)?;
                    fragments.push(top(&mut stack), html);
                }
                Token::Open(tag) => {
                    let def = self.lookup(&tag, path, at(tag.line))?;
                    if !def.kind.allows_body() {
                        return Err(usage(path, at(tag.line), &def.name, "an inline", "{{< name >}}"));
                    }
                    let args = parse_tag_args(&tag, path, at(tag.line))?;
                    stack.push(Frame {
                        open: Some((tag, def, args)),
                        markdown: String::new(),
                        placeholder: String::new(),
                    });
                }
                Token::Close { name, line } => {
                    let frame = if stack.len() > 1 { stack.pop() } else { None };
                    let Some(Frame {
                        open: Some((tag, def, args)),
                        placeholder: inner_markdown,
                        ..
                    }) = frame
                    else {
                        return Err(ShortcodeError::UnexpectedEnd {
                            path: path.to_path_buf(),
                            line: at(line),
                        });
                    };
                    if let Some(found) = name.filter(|n| *n != tag.name) {
                        return Err(ShortcodeError::MismatchedEnd {
                            path: path.to_path_buf(),
                            line: at(line),
                            found: found.to_string(),
                            expected: tag.name.to_string(),
                        });
                    }

                    let rendered = self.renderer.render(&inner_markdown);
                    let inner = fragments.restore(&rendered.html);
                    let html = self.render(def, &args, Some(&inner), path, at(tag.line), context)?;
                    fragments.push(top(&mut stack), html);
                }
            }
        }

        if let Some((tag, _, _)) = stack.last().and_then(|f| f.open.as_ref()) {
            return Err(ShortcodeError::Unclosed {
                path: path.to_path_buf(),
                line: at(tag.line),
                name: tag.name.to_string(),
            });
        }

        let root = stack.swap_remove(0);
        Ok(Expansion {
            markdown: root.markdown,
            placeholder_markdown: root.placeholder,
            fragments,
        })
    }

    fn lookup(&self, tag: &Tag<'_>, path: &Path, line: usize) -> Result<&'a ShortcodeDef> {
        self.registry
            .get(tag.name)
            .ok_or_else(|| ShortcodeError::Unknown {
                path: path.to_path_buf(),
                line,
                name: tag.name.to_string(),
                known: self.registry.names().join(", "),
            })
    }

    fn render(
        &self,
        def: &ShortcodeDef,
        args: &Map<String, Value>,
        body: Option<&str>,
        path: &Path,
        line: usize,
        context: &RenderContext<'_>,
    ) -> Result<String> {
        match &def.source {
            ShortcodeSource::Builtin(render) => {
                render(&ShortcodeCall { args, body }).map_err(|message| ShortcodeError::Render {
                    path: path.to_path_buf(),
                    line,
                    name: def.name.clone(),
                    message,
                })
            }
            ShortcodeSource::Template(id) => {
                let mut ctx = context.clone();
                for (key, value) in args {
                    ctx.insert(key.clone(), value.clone());
                }
                ctx.insert("args", Value::Object(args.clone()));
                if let Some(body) = body {
                    ctx.insert("body", body);
                }
                self.templates
                    .render(id, &ctx)
                    .map_err(|source| ShortcodeError::Template {
                        path: path.to_path_buf(),
                        line,
                        name: def.name.clone(),
                        source,
                    })
            }
        }
    }
}

fn top<'f, 's>(stack: &'f mut [Frame<'s>]) -> &'f mut Frame<'s> {
    let last = stack.len() - 1;
    &mut stack[last]
}

fn parse_tag_args(tag: &Tag<'_>, path: &Path, line: usize) -> Result<Map<String, Value>> {
    let args = args::parse_args(tag.args).map_err(|message| ShortcodeError::Argument {
        path: path.to_path_buf(),
        line,
        name: tag.name.to_string(),
        message,
    })?;

    if let Some(reserved) = args.keys().find(|k| RESERVED_ARGUMENTS.contains(&k.as_str())) {
        return Err(ShortcodeError::ReservedArgument {
            path: path.to_path_buf(),
            line,
            name: tag.name.to_string(),
            argument: reserved.clone(),
        });
    }
    Ok(args)
}

fn usage(path: &Path, line: usize, name: &str, kind: &str, form: &str) -> ShortcodeError {
    ShortcodeError::Usage {
        path: path.to_path_buf(),
        line,
        name: name.to_string(),
        message: format!(
            "`{name}` is {kind} shortcode, write it as `{}`",
            form.replace("name", name)
        ),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    struct Fixture {
        registry: ShortcodeRegistry,
        templates: TemplateRegistry,
        renderer: MarkdownRenderer,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                registry: ShortcodeRegistry::new(),
                templates: TemplateRegistry::new().unwrap(),
                renderer: MarkdownRenderer::new(),
            }
        }

        fn with_template(mut self, name: &str, source: &str) -> Self {
            let id = format!("shortcodes/{name}");
            self.templates.register_source(&id, source).unwrap();
            self.registry.register(ShortcodeDef {
                name: name.to_string(),
                kind: ShortcodeKind::Either,
                source: ShortcodeSource::Template(id),
            });
            self
        }

        fn expand(&self, body: &str) -> Result<Expansion> {
            let processor = ShortcodeProcessor::new(&self.registry, &self.templates, &self.renderer);
            let ctx = RenderContext::new().with_page(json!({ "title": "Host" }));
            processor.expand(body, Path::new("content/posts/a.md"), 5, &ctx)
        }
    }

    #[test]
    fn test_inline_builtin() {
        let expansion = Fixture::new()
            .expand("Watch {{< youtube id=\"abc\" >}} now.\n")
            .unwrap();
        assert!(expansion.markdown.contains("youtube-nocookie.com/embed/abc"));
        assert_eq!(expansion.placeholder_markdown, "Watch FOLIOSC000000Z now.\n");
        assert_eq!(expansion.fragment_count(), 1);
    }

    #[test]
    fn test_restore_unwraps_block_paragraph() {
        let fixture = Fixture::new();
        let expansion = fixture
            .expand("{{% callout %}}\nInside **bold**.\n{{% end %}}\n")
            .unwrap();
        let html = fixture.renderer.render(&expansion.placeholder_markdown).html;
        let restored = expansion.restore(&html);
        assert!(restored.starts_with(r#"<div class="callout callout-note">"#));
        assert!(restored.contains("<strong>bold</strong>"));
        assert!(!restored.contains("FOLIOSC"));
    }

    #[test]
    fn test_nested_body_shortcodes() {
        let fixture = Fixture::new();
        let body = "{{% callout type=\"tip\" %}}\nOuter\n\n{{% figure src=\"/a.png\" %}}\nCaption\n{{% end figure %}}\n{{% end callout %}}\n";
        let expansion = fixture.expand(body).unwrap();
        let restored = expansion.restore(&fixture.renderer.render(&expansion.placeholder_markdown).html);

        let callout = restored.find("callout-tip").unwrap();
        let figure = restored.find("<figure").unwrap();
        assert!(callout < figure);
        assert!(restored.contains("<figcaption><p>Caption</p></figcaption>"));
        assert!(!restored.contains("FOLIOSC"));
    }

    #[test]
    fn test_code_regions_are_untouched() {
        let body = "```\n{{< youtube id=\"x\" >}}\n```\n\nUse `{{% callout %}}` here.\n";
        let expansion = Fixture::new().expand(body).unwrap();
        assert_eq!(expansion.markdown, body);
        assert_eq!(expansion.placeholder_markdown, body);
        assert_eq!(expansion.fragment_count(), 0);
    }

    #[test]
    fn test_literal_token_text_survives() {
        let fixture = Fixture::new();
        let body = "Literal FOLIOSC000000Z stays.\n\n{{< youtube id=\"abc\" >}}\n";
        let expansion = fixture.expand(body).unwrap();
        assert!(expansion.placeholder_markdown.contains("FOLIOSCX000000Z"));

        let restored = expansion.restore(&fixture.renderer.render(&expansion.placeholder_markdown).html);
        assert!(restored.contains("Literal FOLIOSC000000Z stays."), "{restored}");
        assert_eq!(restored.matches("youtube-nocookie.com/embed/abc").count(), 1);
        assert!(!restored.contains("FOLIOSCX"));
    }

    fn segment() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-z ]{0,20}\n",
            Just("```\n{{< youtube id=\"x\" >}}\n```\n".to_string()),
            Just("Use `{{% callout %}}` inline.\n".to_string()),
            "[a-z0-9]{1,8}".prop_map(|id| format!("{{{{< youtube id=\"{id}\" >}}}}\n")),
            "[a-z ]{1,20}".prop_map(|text| format!("{{{{% callout %}}}}\n{text} **bold**\n{{{{% end %}}}}\n")),
        ]
    }

    proptest! {
        #[test]
        fn prop_expansion_is_idempotent(segments in prop::collection::vec(segment(), 0..8)) {
            let fixture = Fixture::new();
            let body = segments.concat();

            let once = fixture.expand(&body).unwrap();
            let twice = fixture.expand(&once.markdown).unwrap();

            prop_assert_eq!(&twice.markdown, &once.markdown);
            prop_assert_eq!(&twice.placeholder_markdown, &once.markdown);
            prop_assert_eq!(twice.fragment_count(), 0);
        }
    }

    #[test]
    fn test_template_shortcode_sees_args_and_page() {
        let fixture = Fixture::new().with_template(
            "note",
            "<aside data-level=\"{{ level }}\" data-n=\"{{ args.level }}\">{{ page.title }}: {{ body? | safe }}</aside>",
        );
        let expansion = fixture.expand("{{< note level=2 >}}").unwrap();
        assert_eq!(
            expansion.markdown,
            "<aside data-level=\"2\" data-n=\"2\">Host: </aside>"
        );
    }

    #[test]
    fn test_template_missing_variable() {
        let fixture = Fixture::new().with_template("note", "{{ missing }}");
        let err = fixture.expand("line\n{{< note >}}").unwrap_err();
        assert!(matches!(err, ShortcodeError::Template { line: 6, .. }), "{err}");
    }

    #[test]
    fn test_unknown_lists_known_names() {
        let err = Fixture::new().expand("\n\n{{< tweet id=1 >}}").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("content/posts/a.md:7"), "{msg}");
        assert!(msg.contains("unknown shortcode `tweet`"));
        assert!(msg.contains("callout, figure, gist, vimeo, youtube"));
    }

    #[test]
    fn test_structure_errors() {
        let fixture = Fixture::new();
        assert!(matches!(
            fixture.expand("{{% callout %}}\nnever closed\n").unwrap_err(),
            ShortcodeError::Unclosed { line: 5, .. }
        ));
        assert!(matches!(
            fixture
                .expand("{{% callout %}}{{% figure src=\"a\" %}}{{% end callout %}}{{% end %}}")
                .unwrap_err(),
            ShortcodeError::MismatchedEnd { ref found, ref expected, .. } if found == "callout" && expected == "figure"
        ));
        assert!(matches!(
            fixture.expand("text {{% end %}}").unwrap_err(),
            ShortcodeError::UnexpectedEnd { .. }
        ));
    }

    #[test]
    fn test_usage_errors() {
        let fixture = Fixture::new();
        assert!(matches!(
            fixture.expand("{{< callout >}}").unwrap_err(),
            ShortcodeError::Usage { .. }
        ));
        assert!(matches!(
            fixture.expand("{{% youtube id=\"x\" %}}{{% end %}}").unwrap_err(),
            ShortcodeError::Usage { .. }
        ));
    }

    #[test]
    fn test_argument_errors() {
        let fixture = Fixture::new();
        assert!(matches!(
            fixture.expand("{{< youtube id=abc >}}").unwrap_err(),
            ShortcodeError::Argument { .. }
        ));
        assert!(matches!(
            fixture.expand("{{< youtube id=\"a\", page=\"x\" >}}").unwrap_err(),
            ShortcodeError::ReservedArgument { ref argument, .. } if argument == "page"
        ));
        assert!(matches!(
            fixture.expand("{{< youtube >}}").unwrap_err(),
            ShortcodeError::Render { .. }
        ));
    }
}
