//! Site configuration management.

use std::{
    collections::{BTreeMap, HashSet},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{CoreError, Result},
    url::normalize_prefix,
};

/// Main configuration structure for folio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Site-wide settings.
    pub site: SiteConfig,

    /// Content collections.
    #[serde(default)]
    pub collections: Vec<CollectionConfig>,

    /// Build settings.
    #[serde(default)]
    pub build: BuildConfig,

    /// Deploy settings, exposed to templates as `site.deploy`.
    #[serde(default)]
    pub deploy: DeployConfig,

    /// Additional languages keyed by code.
    #[serde(default)]
    pub languages: BTreeMap<String, LanguageConfig>,

    /// Image processing settings. Absent means static files pass through.
    #[serde(default)]
    pub images: Option<ImagesConfig>,

    /// RSS feed settings.
    #[serde(default)]
    pub rss: RssConfig,

    /// robots.txt rules.
    #[serde(default)]
    pub robots: RobotsConfig,

    /// Search settings.
    #[serde(default)]
    pub search: SearchConfig,
}

/// Site-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site title.
    pub title: String,

    /// Site description for meta tags.
    #[serde(default)]
    pub description: Option<String>,

    /// Base URL for the site (e.g., "https://example.com").
    pub base_url: String,

    /// Default language code.
    #[serde(default = "default_language")]
    pub language: String,

    /// Site author name.
    #[serde(default)]
    pub author: Option<String>,
}

/// A named group of content files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Collection name, unique per site.
    pub name: String,

    /// Human label used in listings and llms.txt.
    #[serde(default)]
    pub label: Option<String>,

    /// Directory under the content dir. Defaults to the name.
    #[serde(default)]
    pub directory: Option<String>,

    /// URL prefix. Defaults to `/<name>`; `""` mounts the collection at the root.
    #[serde(default)]
    pub url_prefix: Option<String>,

    /// Template used when a page does not name one.
    #[serde(default)]
    pub default_template: Option<String>,

    /// Pages carry a required date and sort newest first.
    #[serde(default)]
    pub has_date: bool,

    /// Pages appear in the RSS feed.
    #[serde(default)]
    pub has_rss: bool,

    /// Collection gets index and tag listing pages.
    #[serde(default)]
    pub listed: bool,

    /// Recurse into subdirectories.
    #[serde(default)]
    pub nested: bool,

    /// Items per listing page.
    #[serde(default)]
    pub paginate: Option<usize>,
}

/// Build configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Output directory for generated site.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Content root directory.
    #[serde(default = "default_content_dir")]
    pub content_dir: String,

    /// Data files directory.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Static files directory.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    /// User templates directory.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,

    /// Whether to minify HTML output.
    #[serde(default)]
    pub minify: bool,

    /// Whether to fingerprint static assets.
    #[serde(default)]
    pub fingerprint: bool,

    /// Whether to generate drafts.
    #[serde(default)]
    pub drafts: bool,

    /// Whether broken internal links fail the build.
    #[serde(default)]
    pub strict: bool,

    /// Render worker count. Defaults to available parallelism.
    #[serde(default)]
    pub workers: Option<usize>,

    /// Syntax highlighting theme name.
    #[serde(default = "default_syntax_theme")]
    pub syntax_theme: String,
}

/// Deploy target description. Only surfaced to templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployConfig {
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub repo: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
}

/// Per-language overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// Site title in this language.
    #[serde(default)]
    pub title: Option<String>,

    /// Site description in this language.
    #[serde(default)]
    pub description: Option<String>,
}

/// Image processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagesConfig {
    /// Responsive widths to generate.
    #[serde(default = "default_image_widths")]
    pub widths: Vec<u32>,

    /// Encoder quality (1-100).
    #[serde(default = "default_image_quality")]
    pub quality: u8,

    /// Also emit WebP variants.
    #[serde(default)]
    pub webp: bool,

    /// Add `loading="lazy"` to images in rendered HTML.
    #[serde(default = "default_true")]
    pub lazy_loading: bool,
}

/// RSS feed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RssConfig {
    /// Whether RSS feed is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum number of items in feed.
    #[serde(default = "default_rss_limit")]
    pub limit: usize,
}

/// robots.txt configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RobotsConfig {
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub disallow: Vec<String>,
}

/// Search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Whether search is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

// Default value functions
fn default_language() -> String {
    "en".to_string()
}

fn default_output_dir() -> String {
    "public".to_string()
}

fn default_content_dir() -> String {
    "content".to_string()
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_static_dir() -> String {
    "static".to_string()
}

fn default_templates_dir() -> String {
    "templates".to_string()
}

fn default_syntax_theme() -> String {
    "base16-ocean.dark".to_string()
}

fn default_image_widths() -> Vec<u32> {
    vec![480, 960, 1440]
}

fn default_image_quality() -> u8 {
    80
}

fn default_true() -> bool {
    true
}

fn default_rss_limit() -> usize {
    20
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            content_dir: default_content_dir(),
            data_dir: default_data_dir(),
            static_dir: default_static_dir(),
            templates_dir: default_templates_dir(),
            minify: false,
            fingerprint: false,
            drafts: false,
            strict: false,
            workers: None,
            syntax_theme: default_syntax_theme(),
        }
    }
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            widths: default_image_widths(),
            quality: default_image_quality(),
            webp: false,
            lazy_loading: true,
        }
    }
}

impl Default for RssConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            limit: default_rss_limit(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl CollectionConfig {
    /// Label shown for the collection, falling back to its name.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Directory under the content root.
    pub fn directory(&self) -> &str {
        self.directory.as_deref().unwrap_or(&self.name)
    }

    /// Normalized URL prefix: `""` for root collections, `/name` otherwise.
    pub fn url_prefix(&self) -> String {
        match &self.url_prefix {
            Some(prefix) => normalize_prefix(prefix),
            None => normalize_prefix(&self.name),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            CoreError::Toml(source) => CoreError::config_with_source(
                format!("Failed to parse config file: {}", path.display()),
                source,
            ),
            other => other,
        })
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, layering `FOLIO__*` environment variables on top.
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("FOLIO").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.site.title.is_empty() {
            return Err(CoreError::config("site.title cannot be empty"));
        }

        if self.site.base_url.is_empty() {
            return Err(CoreError::config("site.base_url cannot be empty"));
        }

        if self.site.base_url.ends_with('/') {
            tracing::warn!("site.base_url should not have a trailing slash");
        }

        for code in std::iter::once(&self.site.language).chain(self.languages.keys()) {
            if !is_valid_language_code(code) {
                return Err(CoreError::config(format!("invalid language code `{code}`")));
            }
        }

        let mut names = HashSet::new();
        let mut prefixes: BTreeMap<String, &str> = BTreeMap::new();
        for collection in &self.collections {
            if collection.name.trim().is_empty() {
                return Err(CoreError::config("collection name cannot be empty"));
            }
            if !names.insert(collection.name.as_str()) {
                return Err(CoreError::config(format!(
                    "duplicate collection `{}`",
                    collection.name
                )));
            }
            if collection.paginate == Some(0) {
                return Err(CoreError::config(format!(
                    "collections.{}.paginate must be greater than zero",
                    collection.name
                )));
            }
            if let Some(other) = prefixes.insert(collection.url_prefix(), collection.name.as_str()) {
                // Two root-mounted collections are allowed only when unlisted.
                if collection.listed || self.collection(other).is_some_and(|c| c.listed) {
                    return Err(CoreError::config(format!(
                        "collections `{other}` and `{}` share url prefix `{}`",
                        collection.name,
                        collection.url_prefix()
                    )));
                }
            }
        }

        if self.build.workers == Some(0) {
            return Err(CoreError::config("build.workers must be greater than zero"));
        }

        if self.rss.enabled && self.rss.limit == 0 {
            return Err(CoreError::config("rss.limit must be greater than zero"));
        }

        Ok(())
    }

    /// Get the full URL for a path.
    pub fn url_for(&self, path: &str) -> String {
        let base = self.site.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// The default language code.
    pub fn default_language(&self) -> &str {
        &self.site.language
    }

    /// All language codes, default first, then the others in code order.
    pub fn all_languages(&self) -> Vec<&str> {
        std::iter::once(self.site.language.as_str())
            .chain(
                self.languages
                    .keys()
                    .map(String::as_str)
                    .filter(|code| *code != self.site.language),
            )
            .collect()
    }

    /// Whether `code` is a configured language (default included).
    pub fn is_language(&self, code: &str) -> bool {
        code == self.site.language || self.languages.contains_key(code)
    }

    /// Whether the site publishes more than one language.
    pub fn is_multilingual(&self) -> bool {
        self.all_languages().len() > 1
    }

    /// URL prefix for a language: `""` for the default, `/code` otherwise.
    pub fn lang_prefix(&self, lang: &str) -> String {
        if lang == self.site.language {
            String::new()
        } else {
            format!("/{lang}")
        }
    }

    /// Home URL for a language (`/` or `/es/`).
    pub fn home_url(&self, lang: &str) -> String {
        format!("{}/", self.lang_prefix(lang))
    }

    /// Site title in a language.
    pub fn title_for_language(&self, lang: &str) -> &str {
        self.languages
            .get(lang)
            .and_then(|l| l.title.as_deref())
            .unwrap_or(&self.site.title)
    }

    /// Site description in a language.
    pub fn description_for_language(&self, lang: &str) -> Option<&str> {
        self.languages
            .get(lang)
            .and_then(|l| l.description.as_deref())
            .or(self.site.description.as_deref())
    }

    /// Look up a collection by name.
    pub fn collection(&self, name: &str) -> Option<&CollectionConfig> {
        self.collections.iter().find(|c| c.name == name)
    }
}

fn is_valid_language_code(code: &str) -> bool {
    !code.is_empty() && code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn create_test_config() -> String {
        r#"
[site]
title = "Test Site"
base_url = "https://example.com"
language = "en"
author = "Ada"

[[collections]]
name = "posts"
label = "Blog"
has_date = true
has_rss = true
listed = true
paginate = 5

[[collections]]
name = "pages"
url_prefix = ""

[build]
output_dir = "dist"
minify = true
strict = true
workers = 2

[languages.es]
title = "Sitio de prueba"

[rss]
limit = 15

[robots]
disallow = ["/private/"]
"#
        .to_string()
    }

    #[test]
    fn test_load_config() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("folio.toml");
        let mut file = std::fs::File::create(&config_path).expect("create file");
        file.write_all(create_test_config().as_bytes())
            .expect("write");

        let config = Config::load(&config_path).expect("load config");

        assert_eq!(config.site.title, "Test Site");
        assert_eq!(config.site.author.as_deref(), Some("Ada"));
        assert_eq!(config.collections.len(), 2);
        assert_eq!(config.collections[0].label(), "Blog");
        assert_eq!(config.collections[0].paginate, Some(5));
        assert_eq!(config.collections[1].url_prefix(), "");
        assert_eq!(config.build.output_dir, "dist");
        assert!(config.build.minify);
        assert!(config.build.strict);
        assert_eq!(config.build.workers, Some(2));
        assert_eq!(config.rss.limit, 15);
        assert_eq!(config.robots.disallow, vec!["/private/"]);
        assert!(config.images.is_none());
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_toml_str(
            r#"
[site]
title = "Minimal Site"
base_url = "https://example.com"
"#,
        )
        .expect("parse config");

        assert_eq!(config.site.language, "en");
        assert_eq!(config.build.output_dir, "public");
        assert_eq!(config.build.content_dir, "content");
        assert_eq!(config.build.templates_dir, "templates");
        assert!(!config.build.minify);
        assert!(!config.build.fingerprint);
        assert!(config.search.enabled);
        assert_eq!(config.rss.limit, 20);
        assert!(config.collections.is_empty());
        assert!(!config.is_multilingual());
    }

    #[test]
    fn test_collection_defaults() {
        let config = Config::from_toml_str(
            r#"
[site]
title = "T"
base_url = "https://example.com"

[[collections]]
name = "docs"
"#,
        )
        .unwrap();
        let docs = config.collection("docs").unwrap();

        assert_eq!(docs.label(), "docs");
        assert_eq!(docs.directory(), "docs");
        assert_eq!(docs.url_prefix(), "/docs");
        assert!(!docs.listed);
    }

    #[test]
    fn test_languages() {
        let config = Config::from_toml_str(&create_test_config()).unwrap();

        assert_eq!(config.all_languages(), vec!["en", "es"]);
        assert!(config.is_language("es"));
        assert!(!config.is_language("fr"));
        assert_eq!(config.lang_prefix("en"), "");
        assert_eq!(config.lang_prefix("es"), "/es");
        assert_eq!(config.home_url("es"), "/es/");
        assert_eq!(config.title_for_language("es"), "Sitio de prueba");
        assert_eq!(config.title_for_language("en"), "Test Site");
    }

    #[test]
    fn test_url_for() {
        let config = Config::from_toml_str(&create_test_config()).unwrap();

        assert_eq!(
            config.url_for("/posts/hello"),
            "https://example.com/posts/hello"
        );
        assert_eq!(
            config.url_for("posts/hello"),
            "https://example.com/posts/hello"
        );
    }

    #[test]
    fn test_config_validation_empty_title() {
        let result = Config::from_toml_str(
            r#"
[site]
title = ""
base_url = "https://example.com"
"#,
        );
        assert!(result.unwrap_err().to_string().contains("title cannot be empty"));
    }

    #[test]
    fn test_config_validation_duplicate_collection() {
        let result = Config::from_toml_str(
            r#"
[site]
title = "T"
base_url = "https://example.com"

[[collections]]
name = "posts"

[[collections]]
name = "posts"
directory = "other"
"#,
        );
        assert!(result.unwrap_err().to_string().contains("duplicate collection"));
    }

    #[test]
    fn test_config_validation_zero_paginate() {
        let result = Config::from_toml_str(
            r#"
[site]
title = "T"
base_url = "https://example.com"

[[collections]]
name = "posts"
listed = true
paginate = 0
"#,
        );
        assert!(result.unwrap_err().to_string().contains("paginate"));
    }

    #[test]
    fn test_config_validation_shared_listed_prefix() {
        let result = Config::from_toml_str(
            r#"
[site]
title = "T"
base_url = "https://example.com"

[[collections]]
name = "posts"
listed = true

[[collections]]
name = "notes"
url_prefix = "/posts"
"#,
        );
        assert!(result.unwrap_err().to_string().contains("share url prefix"));
    }

    #[test]
    fn test_config_not_found() {
        let result = Config::load(Path::new("/nonexistent/folio.toml"));
        assert!(result.unwrap_err().to_string().contains("not found"));
    }
}
