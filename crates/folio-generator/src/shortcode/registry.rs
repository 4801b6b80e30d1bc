//! Shortcode lookup table.

use std::{collections::BTreeMap, fs, path::Path};

use serde_json::{Map, Value};
use tracing::debug;

use super::builtins;
use crate::template::{Result as TemplateResult, TemplateRegistry};

/// Render function of a built-in shortcode. Errors are plain messages; the
/// processor attaches the source location.
pub type BuiltinFn = fn(&ShortcodeCall<'_>) -> Result<String, String>;

/// Where a shortcode may appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcodeKind {
    /// `{{< name >}}` only.
    Inline,
    /// `{{% name %}}…{{% end %}}` only.
    Body,
    Either,
}

impl ShortcodeKind {
    pub fn allows_inline(self) -> bool {
        matches!(self, Self::Inline | Self::Either)
    }

    pub fn allows_body(self) -> bool {
        matches!(self, Self::Body | Self::Either)
    }
}

#[derive(Debug, Clone)]
pub enum ShortcodeSource {
    Builtin(BuiltinFn),
    /// Name of a template in the [`TemplateRegistry`].
    Template(String),
}

#[derive(Debug, Clone)]
pub struct ShortcodeDef {
    pub name: String,
    pub kind: ShortcodeKind,
    pub source: ShortcodeSource,
}

/// Arguments and rendered body handed to a built-in.
#[derive(Debug, Clone, Copy)]
pub struct ShortcodeCall<'a> {
    pub args: &'a Map<String, Value>,
    pub body: Option<&'a str>,
}

impl ShortcodeCall<'_> {
    /// A string or number argument as text.
    pub fn arg(&self, name: &str) -> Option<String> {
        match self.args.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Like [`arg`](Self::arg), failing when the argument is absent.
    pub fn required(&self, name: &str) -> Result<String, String> {
        self.arg(name)
            .ok_or_else(|| format!("missing required argument `{name}`"))
    }
}

/// Shortcodes by name. User templates replace built-ins of the same name.
#[derive(Debug, Clone)]
pub struct ShortcodeRegistry {
    entries: BTreeMap<String, ShortcodeDef>,
}

impl Default for ShortcodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ShortcodeRegistry {
    /// Create a registry holding the built-in shortcodes.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            entries: BTreeMap::new(),
        };
        for def in builtins::all() {
            registry.register(def);
        }
        registry
    }

    /// Register a shortcode, replacing any existing one with the same name.
    pub fn register(&mut self, def: ShortcodeDef) {
        self.entries.insert(def.name.clone(), def);
    }

    /// Register every `<name>.html` in `dir` as a template shortcode.
    ///
    /// The templates are added to `templates` as `shortcodes/<name>`.
    pub fn load_dir(&mut self, dir: &Path, templates: &mut TemplateRegistry) -> TemplateResult<usize> {
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

            let id = format!("shortcodes/{name}");
            templates.register_source(&id, &fs::read_to_string(&path)?)?;
            self.register(ShortcodeDef {
                name: name.to_string(),
                kind: ShortcodeKind::Either,
                source: ShortcodeSource::Template(id),
            });
            debug!(name, "registered template shortcode");
            count += 1;
        }
        Ok(count)
    }

    pub fn get(&self, name: &str) -> Option<&ShortcodeDef> {
        self.entries.get(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }
}
