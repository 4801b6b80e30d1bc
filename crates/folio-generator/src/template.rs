//! HTML template system for page generation.
//!
//! A lightweight interpolation language rather than a full template engine:
//!
//! - `{{ path }}` interpolates a value HTML-escaped, `{{ path? }}` renders
//!   nothing when the value is missing
//! - `{{ path | safe }}` interpolates a trusted HTML value as is
//! - `{% extends "base" %}` makes a template a child of another
//! - `{% block name %}…{% endblock %}` defines or overrides a block
//! - `{% yield name %}` renders a block the child must define
//!
//! Values come from a [`RenderContext`] with `page`, `collection`, `site`
//! and `data` namespaces plus render-local values.

use std::{collections::HashMap, fs, path::Path};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::html::escape_html;

/// Extends chains longer than this are treated as cycles.
const MAX_EXTENDS_DEPTH: usize = 16;

/// Template rendering errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// A required variable is not in the context.
    #[error("missing variable `{name}` in template `{template}` at line {line}")]
    MissingVariable {
        template: String,
        name: String,
        line: usize,
    },

    /// Template not found.
    #[error("template not found: {0}")]
    NotFound(String),

    /// A `{% yield %}` names a block the rendered template does not define.
    #[error("template `{template}` yields block `{block}`, which `{child}` does not define")]
    MissingBlock {
        template: String,
        block: String,
        child: String,
    },

    /// Invalid template syntax.
    #[error("invalid template syntax in `{template}` at line {line}: {message}")]
    InvalidSyntax {
        template: String,
        line: usize,
        message: String,
    },

    /// IO error while loading templates.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

static NULL: Value = Value::Null;

/// Layered values visible to a template.
///
/// Unqualified lookups try render-local values first, then `page`,
/// `collection`, `site` and `data` in that order. A context is assembled
/// before rendering and never modified by it.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    locals: Map<String, Value>,
    page: Value,
    collection: Value,
    site: Value,
    data: &'a Value,
}

impl Default for RenderContext<'_> {
    fn default() -> Self {
        Self {
            locals: Map::new(),
            page: Value::Null,
            collection: Value::Null,
            site: Value::Null,
            data: &NULL,
        }
    }
}

impl<'a> RenderContext<'a> {
    /// Create a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_page(mut self, page: Value) -> Self {
        self.page = page;
        self
    }

    #[must_use]
    pub fn with_collection(mut self, collection: Value) -> Self {
        self.collection = collection;
        self
    }

    #[must_use]
    pub fn with_site(mut self, site: Value) -> Self {
        self.site = site;
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: &'a Value) -> Self {
        self.data = data;
        self
    }

    /// Insert a render-local variable.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.locals.insert(key.into(), value.into());
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Resolve a dotted path. `null` counts as missing.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let segments: Vec<&str> = path.split('.').collect();
        let (first, rest) = segments.split_first()?;

        let root = match *first {
            "page" => &self.page,
            "collection" => &self.collection,
            "site" => &self.site,
            "data" => self.data,
            name => {
                let found = self
                    .locals
                    .get(name)
                    .or_else(|| self.page.get(name))
                    .or_else(|| self.collection.get(name))
                    .or_else(|| self.site.get(name))
                    .or_else(|| self.data.get(name))?;
                return descend(found, rest);
            }
        };
        descend(root, rest)
    }
}

fn descend<'v>(mut value: &'v Value, segments: &[&str]) -> Option<&'v Value> {
    for segment in segments {
        value = match value {
            Value::Object(map) => map.get(*segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    (!value.is_null()).then_some(value)
}

/// Text form of a context value.
fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

#[derive(Debug, Clone)]
enum Node {
    Text(String),
    Var {
        path: String,
        optional: bool,
        /// Written without escaping (`| safe`).
        raw: bool,
        line: usize,
    },
    Block {
        name: String,
        body: Vec<Node>,
    },
    Yield {
        name: String,
    },
}

/// A parsed template.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    extends: Option<String>,
    nodes: Vec<Node>,
}

impl Template {
    /// Parse a template from source.
    pub fn parse(name: impl Into<String>, source: &str) -> Result<Self> {
        let name = name.into();
        let (extends, nodes) = Parser::new(&name, source).parse()?;
        Ok(Self {
            name,
            extends,
            nodes,
        })
    }

    /// Get the template name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent template, if this template extends one.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.extends.as_deref()
    }

    /// Render the template on its own, ignoring any `extends`.
    pub fn render(&self, context: &RenderContext<'_>) -> Result<String> {
        let renderer = Renderer {
            blocks: HashMap::new(),
            child: &self.name,
            context,
        };
        let mut out = String::new();
        renderer.render_nodes(&self.name, &self.nodes, &mut out)?;
        Ok(out)
    }
}

struct Parser<'s> {
    template: &'s str,
    rest: &'s str,
    line: usize,
}

impl<'s> Parser<'s> {
    fn new(template: &'s str, source: &'s str) -> Self {
        Self {
            template,
            rest: source,
            line: 1,
        }
    }

    fn syntax(&self, line: usize, message: impl Into<String>) -> TemplateError {
        TemplateError::InvalidSyntax {
            template: self.template.to_string(),
            line,
            message: message.into(),
        }
    }

    fn parse(mut self) -> Result<(Option<String>, Vec<Node>)> {
        let mut extends = None;
        let mut current: Vec<Node> = Vec::new();
        let mut open: Vec<(String, Vec<Node>, usize)> = Vec::new();

        loop {
            let next_var = self.rest.find("{{");
            let next_tag = self.rest.find("{%");
            let (start, is_var) = match (next_var, next_tag) {
                (None, None) => {
                    if !self.rest.is_empty() {
                        current.push(Node::Text(self.rest.to_string()));
                    }
                    break;
                }
                (Some(v), Some(t)) if t < v => (t, false),
                (Some(v), _) => (v, true),
                (None, Some(t)) => (t, false),
            };

            let text = &self.rest[..start];
            if !text.is_empty() {
                current.push(Node::Text(text.to_string()));
            }
            self.line += text.matches('\n').count();

            let close = if is_var { "}}" } else { "%}" };
            let after = &self.rest[start + 2..];
            let Some(end) = after.find(close) else {
                let opener = if is_var { "{{" } else { "{%" };
                return Err(self.syntax(self.line, format!("unclosed `{opener}`")));
            };
            let inner = after[..end].trim();
            let line = self.line;

            if is_var {
                let (expr, raw) = match inner.split_once('|') {
                    Some((expr, filter)) if filter.trim() == "safe" => (expr.trim(), true),
                    Some((_, filter)) => {
                        return Err(self.syntax(line, format!("unknown filter `{}`", filter.trim())));
                    }
                    None => (inner, false),
                };
                let (path, optional) = match expr.strip_suffix('?') {
                    Some(path) => (path.trim(), true),
                    None => (inner, false),
                };
                if path.is_empty()
                    || !path
                        .chars()
                        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
                {
                    return Err(self.syntax(line, format!("invalid variable `{inner}`")));
                }
                current.push(Node::Var {
                    path: path.to_string(),
                    optional,
                    raw,
                    line,
                });
            } else {
                let mut words = inner.split_whitespace();
                let keyword = words.next().unwrap_or_default();
                let argument = words.next();
                if words.next().is_some() {
                    return Err(self.syntax(line, format!("unexpected arguments in `{inner}`")));
                }
                match (keyword, argument) {
                    ("extends", Some(parent)) => {
                        let only_whitespace = current
                            .iter()
                            .all(|n| matches!(n, Node::Text(t) if t.trim().is_empty()));
                        if extends.is_some() || !open.is_empty() || !only_whitespace {
                            return Err(
                                self.syntax(line, "`extends` must be the first tag of a template")
                            );
                        }
                        current.clear();
                        extends = Some(parent.trim_matches(|c| c == '"' || c == '\'').to_string());
                    }
                    ("block", Some(name)) => {
                        open.push((name.to_string(), std::mem::take(&mut current), line));
                    }
                    ("endblock", _) => {
                        let Some((name, parent_nodes, _)) = open.pop() else {
                            return Err(self.syntax(line, "`endblock` without an open block"));
                        };
                        let body = std::mem::replace(&mut current, parent_nodes);
                        current.push(Node::Block { name, body });
                    }
                    ("yield", Some(name)) => {
                        current.push(Node::Yield {
                            name: name.to_string(),
                        });
                    }
                    _ => return Err(self.syntax(line, format!("unknown tag `{inner}`"))),
                }
            }

            let consumed = start + 2 + end + 2;
            self.line += self.rest[start..consumed].matches('\n').count();
            self.rest = &self.rest[consumed..];
        }

        if let Some((name, _, line)) = open.pop() {
            return Err(self.syntax(line, format!("block `{name}` is never closed")));
        }

        Ok((extends, current))
    }
}

struct Renderer<'t, 'c> {
    blocks: HashMap<&'t str, &'t [Node]>,
    child: &'t str,
    context: &'c RenderContext<'c>,
}

impl<'t> Renderer<'t, '_> {
    fn render_nodes(&self, template: &str, nodes: &'t [Node], out: &mut String) -> Result<()> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Var {
                    path,
                    optional,
                    raw,
                    line,
                } => match self.context.lookup(path) {
                    Some(value) if *raw => out.push_str(&display_value(value)),
                    Some(value) => out.push_str(&escape_html(&display_value(value))),
                    None if *optional => {}
                    None => {
                        return Err(TemplateError::MissingVariable {
                            template: template.to_string(),
                            name: path.clone(),
                            line: *line,
                        });
                    }
                },
                Node::Block { name, body } => {
                    let nodes = self
                        .blocks
                        .get(name.as_str())
                        .copied()
                        .unwrap_or(body.as_slice());
                    self.render_nodes(template, nodes, out)?;
                }
                Node::Yield { name } => {
                    let Some(nodes) = self.blocks.get(name.as_str()).copied() else {
                        return Err(TemplateError::MissingBlock {
                            template: template.to_string(),
                            block: name.clone(),
                            child: self.child.to_string(),
                        });
                    };
                    self.render_nodes(template, nodes, out)?;
                }
            }
        }
        Ok(())
    }
}

fn collect_blocks<'t>(nodes: &'t [Node], blocks: &mut HashMap<&'t str, &'t [Node]>) {
    for node in nodes {
        if let Node::Block { name, body } = node {
            blocks.entry(name.as_str()).or_insert(body.as_slice());
            collect_blocks(body, blocks);
        }
    }
}

/// Registry of templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Template>,
}

impl TemplateRegistry {
    /// Create a new registry with default templates.
    pub fn new() -> Result<Self> {
        let mut registry = Self::default();
        registry.register_defaults()?;
        Ok(registry)
    }

    /// Register default built-in templates.
    fn register_defaults(&mut self) -> Result<()> {
        for (name, source) in [
            ("base", DEFAULT_BASE_TEMPLATE),
            ("page", DEFAULT_PAGE_TEMPLATE),
            ("post", DEFAULT_POST_TEMPLATE),
            ("list", DEFAULT_LIST_TEMPLATE),
            ("home", DEFAULT_HOME_TEMPLATE),
            ("404", DEFAULT_NOT_FOUND_TEMPLATE),
        ] {
            self.register(Template::parse(name, source)?);
        }
        Ok(())
    }

    /// Register a template, replacing any template with the same name.
    pub fn register(&mut self, template: Template) {
        self.templates.insert(template.name.clone(), template);
    }

    /// Parse and register a template.
    pub fn register_source(&mut self, name: &str, source: &str) -> Result<()> {
        self.register(Template::parse(name, source)?);
        Ok(())
    }

    /// Register every `*.html` file directly inside `dir`, named by stem.
    ///
    /// Returns the number of templates loaded; a missing directory loads none.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        if !dir.is_dir() {
            return Ok(0);
        }

        let mut paths: Vec<_> = fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?;
        paths.sort();

        let mut count = 0;
        for path in paths {
            if !path.is_file() || path.extension().is_none_or(|ext| ext != "html") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let source = fs::read_to_string(&path)?;
            self.register_source(name, &source)?;
            debug!(name, path = %path.display(), "loaded template");
            count += 1;
        }
        Ok(count)
    }

    /// Get a template by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Render a named template, resolving its `extends` chain.
    pub fn render(&self, name: &str, context: &RenderContext<'_>) -> Result<String> {
        let leaf = self
            .get(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;

        let mut blocks = HashMap::new();
        let mut root = leaf;
        let mut depth = 0;
        while let Some(parent) = root.extends.as_deref() {
            collect_blocks(&root.nodes, &mut blocks);
            root = self
                .get(parent)
                .ok_or_else(|| TemplateError::NotFound(parent.to_string()))?;
            depth += 1;
            if depth > MAX_EXTENDS_DEPTH {
                return Err(TemplateError::InvalidSyntax {
                    template: name.to_string(),
                    line: 1,
                    message: "extends chain is cyclic".to_string(),
                });
            }
        }

        let renderer = Renderer {
            blocks,
            child: &leaf.name,
            context,
        };
        let mut out = String::new();
        renderer.render_nodes(&root.name, &root.nodes, &mut out)?;
        Ok(out)
    }
}

/// Default base HTML template.
pub const DEFAULT_BASE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="{{ lang }}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{ title }} | {{ site.title }}</title>
    <meta name="description" content="{{ description? }}">
    <meta name="author" content="{{ site.author? }}">
    {{ head? | safe }}
    <style>
        :root { --fg: #1e293b; --muted: #64748b; --accent: #2563eb; --border: #e2e8f0; color-scheme: light dark; }
        body { font-family: system-ui, sans-serif; line-height: 1.7; color: var(--fg); margin: 0; }
        .container { max-width: 720px; margin: 0 auto; padding: 0 1.5rem; }
        header nav { display: flex; gap: 1.5rem; align-items: center; padding: 1rem 0; border-bottom: 1px solid var(--border); }
        .site-title { font-weight: 600; color: inherit; text-decoration: none; margin-right: auto; }
        a { color: var(--accent); }
        .post-item { list-style: none; margin: 1rem 0; }
        .post-item time, .meta { color: var(--muted); font-size: 0.875rem; }
        .lang-option.active { font-weight: 600; }
        .callout { border-left: 4px solid var(--accent); padding: 0.5rem 1rem; margin: 1rem 0; }
        .embed iframe { width: 100%; aspect-ratio: 16 / 9; border: 0; }
        pre { padding: 1rem; overflow-x: auto; border-radius: 6px; }
        footer { color: var(--muted); font-size: 0.875rem; padding: 2rem 0; }
    </style>
</head>
<body>
    <header>
        <div class="container">
            <nav>
                <a href="{{ site.home_url }}" class="site-title">{{ site.title }}</a>
                {{ nav? | safe }}
                {{ lang_switcher? | safe }}
            </nav>
        </div>
    </header>
    <main>
        <div class="container">
            {% yield main %}
        </div>
    </main>
    <footer>
        <div class="container">
            <p>&copy; {{ site.year }} {{ site.title }}</p>
        </div>
    </footer>
</body>
</html>
"##;

/// Default page template (for standalone pages).
pub const DEFAULT_PAGE_TEMPLATE: &str = r#"{% extends "base" %}
{% block main %}<article class="page">
    <h1>{{ page.title }}</h1>
    <div class="content">
        {{ page.content | safe }}
    </div>
</article>{% endblock %}"#;

/// Default post template (for dated pages with metadata).
pub const DEFAULT_POST_TEMPLATE: &str = r#"{% extends "base" %}
{% block main %}<article class="post">
    <header>
        <h1>{{ page.title }}</h1>
        <p class="meta"><time datetime="{{ page.date_iso? }}">{{ page.date? }}</time> · {{ page.reading_time }} min</p>
        {{ page.tags_html? | safe }}
    </header>
    <div class="content">
        {{ page.content | safe }}
    </div>
</article>{% endblock %}"#;

/// Default list template (for collection and tag listings).
pub const DEFAULT_LIST_TEMPLATE: &str = r#"{% extends "base" %}
{% block main %}<section class="post-list">
    <h1>{{ title }}</h1>
    <ul>
        {{ items | safe }}
    </ul>
    {{ pagination? | safe }}
</section>{% endblock %}"#;

/// Default home page template.
pub const DEFAULT_HOME_TEMPLATE: &str = r#"{% extends "base" %}
{% block main %}<section class="home">
    <p>{{ site.description? }}</p>
    <ul>
        {{ items | safe }}
    </ul>
    {{ sections? | safe }}
</section>{% endblock %}"#;

/// Default not-found template.
pub const DEFAULT_NOT_FOUND_TEMPLATE: &str = r#"{% extends "base" %}
{% block main %}<section class="not-found">
    <h1>Page not found</h1>
    <p><a href="{{ site.home_url }}">Back to the home page</a></p>
</section>{% endblock %}"#;
