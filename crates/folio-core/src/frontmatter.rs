//! Frontmatter parsing for content files.
//!
//! A content file may open with a YAML block delimited by `---` lines or a
//! TOML block delimited by `+++` lines. The block is parsed into a generic
//! map first so that known fields can be type-checked individually and every
//! unknown top-level key can be kept in [`Frontmatter::extra`].

use std::{collections::BTreeMap, path::Path};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    error::{CoreError, Result},
    value,
};

/// Page fields that `extra` keys may not shadow.
pub const RESERVED_KEYS: &[&str] = &[
    "title",
    "date",
    "updated",
    "description",
    "image",
    "slug",
    "tags",
    "draft",
    "template",
    "robots",
    "weight",
    "extra",
    "url",
    "lang",
    "content",
    "summary",
    "toc",
    "word_count",
    "reading_time",
    "collection",
    "permalink",
    "markdown_url",
    "translations",
];

/// Frontmatter metadata for content files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frontmatter {
    /// Page title (required).
    pub title: String,

    /// Publication date, used for sorting.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,

    /// Last updated date, display only.
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,

    /// Page description for meta tags and summaries.
    #[serde(default)]
    pub description: Option<String>,

    /// Social preview image.
    #[serde(default)]
    pub image: Option<String>,

    /// Explicit URL slug.
    #[serde(default)]
    pub slug: Option<String>,

    /// Tags for the page.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Whether this is a draft.
    #[serde(default)]
    pub draft: bool,

    /// Template to use for rendering.
    #[serde(default)]
    pub template: Option<String>,

    /// Robots directive, e.g. `noindex, nofollow`.
    #[serde(default)]
    pub robots: Option<String>,

    /// Sort weight for ordering undated collections.
    #[serde(default)]
    pub weight: i32,

    /// Custom fields: the `extra` table plus unknown top-level keys.
    #[serde(default)]
    pub extra: BTreeMap<String, Value>,
}

/// Delimiter types for frontmatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontmatterFormat {
    /// YAML frontmatter delimited by `---`.
    Yaml,
    /// TOML frontmatter delimited by `+++`.
    Toml,
}

impl FrontmatterFormat {
    /// Get the delimiter string for this format.
    pub fn delimiter(&self) -> &'static str {
        match self {
            Self::Yaml => "---",
            Self::Toml => "+++",
        }
    }

    fn from_line(line: &str) -> Option<Self> {
        match line.trim_end() {
            "---" => Some(Self::Yaml),
            "+++" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// A frontmatter block located inside a content file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontmatterBlock<'a> {
    pub format: FrontmatterFormat,
    /// Text between the delimiters.
    pub raw: &'a str,
    /// Everything after the closing delimiter.
    pub body: &'a str,
    /// 1-based line number on which the body starts.
    pub body_line: usize,
}

/// A content file split into validated frontmatter and body.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub frontmatter: Frontmatter,
    pub body: String,
    pub body_line: usize,
}

/// Locate the frontmatter block of a file.
///
/// Returns `None` when the file does not open with a delimiter line or when
/// the block is never closed.
pub fn split_frontmatter(content: &str) -> Option<FrontmatterBlock<'_>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.split_inclusive('\n');
    let first = lines.next()?;
    let format = FrontmatterFormat::from_line(first)?;

    let raw_start = first.len();
    let mut offset = raw_start;
    for (index, line) in lines.enumerate() {
        if line.trim_end() == format.delimiter() {
            return Some(FrontmatterBlock {
                format,
                raw: &content[raw_start..offset],
                body: &content[offset + line.len()..],
                // opening line + block lines + closing line, then the next one
                body_line: index + 3,
            });
        }
        offset += line.len();
    }
    None
}

/// Parse a content file into frontmatter and body.
pub fn parse_frontmatter(content: &str, path: &Path) -> Result<ParsedDocument> {
    let Some(block) = split_frontmatter(content) else {
        let opens = content
            .strip_prefix('\u{feff}')
            .unwrap_or(content)
            .lines()
            .next()
            .and_then(FrontmatterFormat::from_line);
        let message = match opens {
            Some(format) => format!("unclosed frontmatter block, expected `{}`", format.delimiter()),
            None => "missing frontmatter block".to_string(),
        };
        return Err(CoreError::frontmatter(path, 1, message));
    };

    let map = parse_map(&block, path)?;
    let frontmatter = extract(map, &block, path)?;

    Ok(ParsedDocument {
        frontmatter,
        body: block.body.to_string(),
        body_line: block.body_line,
    })
}

fn parse_map(block: &FrontmatterBlock<'_>, path: &Path) -> Result<Map<String, Value>> {
    let parsed = match block.format {
        FrontmatterFormat::Yaml => {
            let yaml: serde_yaml::Value = serde_yaml::from_str(block.raw).map_err(|e| {
                let line = e.location().map_or(1, |loc| loc.line() + 1);
                CoreError::frontmatter(path, line, e.to_string())
            })?;
            value::from_yaml(yaml)
        }
        FrontmatterFormat::Toml => {
            let table: toml::Table = block.raw.parse().map_err(|e: toml::de::Error| {
                let line = e
                    .span()
                    .map_or(1, |span| block.raw[..span.start].matches('\n').count() + 2);
                CoreError::frontmatter(path, line, e.message().to_string())
            })?;
            Value::Object(value::from_toml_table(table))
        }
    };

    match parsed {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(CoreError::frontmatter(
            path,
            2,
            "frontmatter must be a key/value mapping",
        )),
    }
}

fn extract(
    mut map: Map<String, Value>,
    block: &FrontmatterBlock<'_>,
    path: &Path,
) -> Result<Frontmatter> {
    let line_of = |key: &str| key_line(block, key);
    let invalid = |key: &str, expected: &str| {
        CoreError::frontmatter(path, line_of(key), format!("`{key}` must be {expected}"))
    };

    let title = match map.remove("title") {
        Some(Value::String(s)) if !s.trim().is_empty() => s,
        Some(Value::String(_)) => return Err(invalid("title", "a non-empty string")),
        Some(_) => return Err(invalid("title", "a string")),
        None => {
            return Err(CoreError::frontmatter(
                path,
                1,
                "missing required field `title`",
            ));
        }
    };

    let mut take_string = |key: &str| -> Result<Option<String>> {
        match map.remove(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(invalid(key, "a string")),
        }
    };

    let description = take_string("description")?;
    let image = take_string("image")?;
    let slug = take_string("slug")?;
    let template = take_string("template")?;
    let robots = take_string("robots")?;
    let date = take_string("date")?
        .map(|s| parse_date(&s).ok_or_else(|| invalid("date", "a YYYY-MM-DD or RFC 3339 date")))
        .transpose()?;
    let updated = take_string("updated")?
        .map(|s| {
            parse_date(&s).ok_or_else(|| invalid("updated", "a YYYY-MM-DD or RFC 3339 date"))
        })
        .transpose()?;

    let tags = match map.remove("tags") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) => vec![s],
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                Value::Number(n) => Ok(n.to_string()),
                _ => Err(invalid("tags", "a list of strings")),
            })
            .collect::<Result<Vec<_>>>()?,
        Some(_) => return Err(invalid("tags", "a list of strings")),
    };

    let draft = match map.remove("draft") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => b,
        Some(_) => return Err(invalid("draft", "a boolean")),
    };

    let weight = match map.remove("weight") {
        None | Some(Value::Null) => 0,
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|w| i32::try_from(w).ok())
            .ok_or_else(|| invalid("weight", "an integer"))?,
        Some(_) => return Err(invalid("weight", "an integer")),
    };

    let explicit_extra = match map.remove("extra") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(extra)) => extra,
        Some(_) => return Err(invalid("extra", "a table")),
    };

    let mut extra: BTreeMap<String, Value> = map.into_iter().collect();
    for (key, value) in explicit_extra {
        if RESERVED_KEYS.contains(&key.as_str()) {
            return Err(CoreError::ReservedKey {
                path: path.to_path_buf(),
                line: line_of("extra"),
                key,
            });
        }
        extra.insert(key, value);
    }

    Ok(Frontmatter {
        title,
        date,
        updated,
        description,
        image,
        slug,
        tags,
        draft,
        template,
        robots,
        weight,
        extra,
    })
}

/// 1-based file line of a top-level key, or the opening delimiter line.
fn key_line(block: &FrontmatterBlock<'_>, key: &str) -> usize {
    let separator = match block.format {
        FrontmatterFormat::Yaml => ':',
        FrontmatterFormat::Toml => '=',
    };
    block
        .raw
        .lines()
        .position(|line| {
            let rest = line
                .strip_prefix(key)
                .or_else(|| line.strip_prefix(&format!("\"{key}\"")));
            if let Some(rest) = rest {
                return rest.trim_start().starts_with(separator);
            }
            // TOML tables: `[extra]`
            block.format == FrontmatterFormat::Toml && line.trim() == format!("[{key}]")
        })
        .map_or(1, |index| index + 2)
}

/// Parse a date as `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`, naive ISO datetime or RFC 3339.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

impl Frontmatter {
    /// Ensure a date is present, falling back to a filename date.
    pub fn require_date(&mut self, path: &Path, filename_date: Option<NaiveDate>) -> Result<()> {
        if self.date.is_none() {
            self.date = filename_date
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc());
        }
        if self.date.is_none() {
            return Err(CoreError::frontmatter(
                path,
                1,
                "missing required field `date`",
            ));
        }
        Ok(())
    }

    /// Whether the robots directive contains `noindex`.
    pub fn is_noindex(&self) -> bool {
        self.robots
            .as_deref()
            .is_some_and(|r| r.split(',').any(|d| d.trim().eq_ignore_ascii_case("noindex")))
    }
}
