//! Syntax highlighting for code blocks.

use syntect::{highlighting::ThemeSet, html::highlighted_html_for_string, parsing::SyntaxSet};

use crate::{ParserError, Result};

/// Default syntect theme.
pub const DEFAULT_THEME: &str = "base16-ocean.dark";

/// Syntax highlighter using syntect with inline styles.
#[derive(Debug)]
pub struct SyntaxHighlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme: String,
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme: DEFAULT_THEME.to_string(),
        }
    }
}

impl SyntaxHighlighter {
    /// Create a highlighter for a named theme, failing on unknown names.
    pub fn new(theme: &str) -> Result<Self> {
        let mut highlighter = Self::default();
        if !highlighter.theme_set.themes.contains_key(theme) {
            return Err(ParserError::UnknownTheme {
                name: theme.to_string(),
                available: highlighter.available_themes().join(", "),
            });
        }
        highlighter.theme = theme.to_string();
        Ok(highlighter)
    }

    /// Get available theme names.
    pub fn available_themes(&self) -> Vec<&str> {
        self.theme_set.themes.keys().map(|s| s.as_str()).collect()
    }

    /// Highlight code with the given language.
    ///
    /// Unknown languages are highlighted as plain text; if syntect fails the
    /// code is returned escaped in a `<pre><code>` block.
    pub fn highlight(&self, code: &str, lang: Option<&str>) -> String {
        let syntax = lang
            .and_then(|l| self.syntax_set.find_syntax_by_token(l))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let Some(theme) = self.theme_set.themes.get(&self.theme) else {
            return fallback(code, lang);
        };

        highlighted_html_for_string(code, &self.syntax_set, syntax, theme)
            .unwrap_or_else(|_| fallback(code, lang))
    }
}

fn fallback(code: &str, lang: Option<&str>) -> String {
    let lang_class = lang
        .map(|l| format!(" class=\"language-{}\"", html_escape(l)))
        .unwrap_or_default();
    format!("<pre><code{lang_class}>{}</code></pre>", html_escape(code))
}

/// Escape HTML special characters.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_rust() {
        let highlighter = SyntaxHighlighter::default();
        let html = highlighter.highlight("fn main() {\n    println!(\"Hello\");\n}", Some("rust"));

        assert!(html.contains("<pre"));
        assert!(html.contains("fn"));
    }

    #[test]
    fn test_highlight_unknown_language() {
        let highlighter = SyntaxHighlighter::default();
        let html = highlighter.highlight("some code", Some("unknown_lang_xyz"));

        assert!(html.contains("some code"));
    }

    #[test]
    fn test_highlight_escapes_markup() {
        let highlighter = SyntaxHighlighter::default();
        let html = highlighter.highlight("<script>alert(1)</script>", None);

        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_fallback_escapes() {
        assert_eq!(
            fallback("a < b", Some("txt")),
            "<pre><code class=\"language-txt\">a &lt; b</code></pre>"
        );
    }

    #[test]
    fn test_unknown_theme() {
        let err = SyntaxHighlighter::new("nope").unwrap_err();
        assert!(err.to_string().contains("base16-ocean.dark"));
    }
}
