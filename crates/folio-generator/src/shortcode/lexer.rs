//! Shortcode tokenizer.
//!
//! Splits a markdown body into plain text and shortcode tags. Fenced code
//! blocks and inline code spans are consumed whole as text, so tags inside
//! them are never seen.

/// A shortcode tag with its raw argument source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag<'a> {
    pub name: &'a str,
    pub args: &'a str,
    /// 1-based line within the tokenized source.
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Text(&'a str),
    /// `{{< name args >}}`
    Inline(Tag<'a>),
    /// `{{% name args %}}`
    Open(Tag<'a>),
    /// `{{% end %}}` or `{{% end name %}}`
    Close { name: Option<&'a str>, line: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub line: usize,
    pub message: String,
}

impl LexError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Tokenize a markdown body.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, LexError> {
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut pos = 0;
    let mut line = 1;
    let mut at_line_start = true;

    while pos < source.len() {
        if at_line_start {
            if let Some(end) = fenced_block_end(source, pos) {
                line += source[pos..end].matches('\n').count();
                pos = end;
                continue;
            }
        }

        let rest = &source[pos..];

        if rest.starts_with('`') {
            let run = rest.bytes().take_while(|b| *b == b'`').count();
            let span = closing_backticks(&rest[run..], run).map_or(run, |close| run + close + run);
            line += rest[..span].matches('\n').count();
            pos += span;
            at_line_start = false;
            continue;
        }

        let delimiters = if rest.starts_with("{{<") {
            Some((">}}", true))
        } else if rest.starts_with("{{%") {
            Some(("%}}", false))
        } else {
            None
        };

        if let Some((close, inline)) = delimiters {
            let Some(end) = rest[3..].find(close) else {
                return Err(LexError::new(line, format!("shortcode tag is missing `{close}`")));
            };
            if text_start < pos {
                tokens.push(Token::Text(&source[text_start..pos]));
            }
            tokens.push(tag_token(rest[3..3 + end].trim(), inline, line)?);

            let consumed = 3 + end + close.len();
            line += rest[..consumed].matches('\n').count();
            pos += consumed;
            text_start = pos;
            at_line_start = false;
            continue;
        }

        let Some(c) = rest.chars().next() else {
            break;
        };
        if c == '\n' {
            line += 1;
            at_line_start = true;
        } else {
            at_line_start = false;
        }
        pos += c.len_utf8();
    }

    if text_start < source.len() {
        tokens.push(Token::Text(&source[text_start..]));
    }
    Ok(tokens)
}

fn tag_token(inner: &str, inline: bool, line: usize) -> Result<Token<'_>, LexError> {
    let (name, args) = match inner.find(char::is_whitespace) {
        Some(split) => (&inner[..split], inner[split..].trim()),
        None => (inner, ""),
    };

    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_'))
    {
        return Err(LexError::new(line, format!("invalid shortcode name `{name}`")));
    }

    if name == "end" {
        if inline {
            return Err(LexError::new(line, "`end` only closes body shortcodes: `{{% end %}}`"));
        }
        return Ok(Token::Close {
            name: (!args.is_empty()).then_some(args),
            line,
        });
    }

    let tag = Tag { name, args, line };
    Ok(if inline {
        Token::Inline(tag)
    } else {
        Token::Open(tag)
    })
}

/// Offset, relative to `rest`, of a backtick run of exactly `len`.
fn closing_backticks(rest: &str, len: usize) -> Option<usize> {
    let mut offset = 0;
    while let Some(found) = rest[offset..].find('`') {
        let start = offset + found;
        let run = rest[start..].bytes().take_while(|b| *b == b'`').count();
        if run == len {
            return Some(start);
        }
        offset = start + run;
    }
    None
}

/// If a fence opens on the line starting at `start`, the offset just past
/// its closing fence (or the end of input when it never closes).
fn fenced_block_end(source: &str, start: usize) -> Option<usize> {
    let (fence, len, _) = fence_marker(line_at(source, start))?;

    let mut pos = next_line_start(source, start);
    while pos < source.len() {
        if let Some((c, n, rest)) = fence_marker(line_at(source, pos)) {
            if c == fence && n >= len && rest.trim().is_empty() {
                return Some(next_line_start(source, pos));
            }
        }
        pos = next_line_start(source, pos);
    }
    Some(source.len())
}

/// Fence character, run length and the remainder of the line.
fn fence_marker(line: &str) -> Option<(char, usize, &str)> {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let c = trimmed.chars().next().filter(|c| matches!(c, '`' | '~'))?;
    let len = trimmed.chars().take_while(|x| *x == c).count();
    (len >= 3).then(|| (c, len, &trimmed[len..]))
}

fn line_at(source: &str, start: usize) -> &str {
    let rest = &source[start..];
    rest.find('\n').map_or(rest, |i| &rest[..i])
}

fn next_line_start(source: &str, start: usize) -> usize {
    source[start..]
        .find('\n')
        .map_or(source.len(), |i| start + i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(source: &str) -> Vec<Token<'_>> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .filter(|t| !matches!(t, Token::Text(_)))
            .collect()
    }

    #[test]
    fn test_inline_and_body_tags() {
        let tokens = tokenize("a {{< youtube id=\"x\" >}} b\n{{% callout %}}\nhi\n{{% end %}}\n").unwrap();
        assert_eq!(tokens[0], Token::Text("a "));
        assert_eq!(
            tokens[1],
            Token::Inline(Tag {
                name: "youtube",
                args: "id=\"x\"",
                line: 1
            })
        );
        assert_eq!(tokens[2], Token::Text(" b\n"));
        assert_eq!(
            tokens[3],
            Token::Open(Tag {
                name: "callout",
                args: "",
                line: 2
            })
        );
        assert_eq!(tokens[4], Token::Text("\nhi\n"));
        assert_eq!(tokens[5], Token::Close { name: None, line: 4 });
        assert_eq!(tokens[6], Token::Text("\n"));
    }

    #[test]
    fn test_named_end() {
        assert_eq!(
            tags("{{% note %}}x{{% end note %}}")[1],
            Token::Close {
                name: Some("note"),
                line: 1
            }
        );
    }

    #[test]
    fn test_fenced_code_is_not_scanned() {
        let source = "```md\n{{< youtube id=\"x\" >}}\n```\n~~~\n{{% callout %}}\n~~~\nafter {{< gist >}}";
        let found = tags(source);
        assert_eq!(found.len(), 1);
        assert!(matches!(&found[0], Token::Inline(tag) if tag.name == "gist" && tag.line == 7));
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        assert!(tags("````\n{{< youtube >}}\n```\nstill code {{< gist >}}").is_empty());
    }

    #[test]
    fn test_inline_code_is_not_scanned() {
        let found = tags("use `{{< youtube >}}` or ``{{% callout %}}`` then {{< vimeo id=\"1\" >}}");
        assert_eq!(found.len(), 1);
        assert!(matches!(&found[0], Token::Inline(tag) if tag.name == "vimeo"));
    }

    #[test]
    fn test_unmatched_backtick_is_text() {
        let found = tags("a ` b {{< gist >}}");
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_text_is_preserved_exactly() {
        let source = "x ```inline``` y\n\n```\ncode\n```\n";
        let tokens = tokenize(source).unwrap();
        assert_eq!(tokens, vec![Token::Text(source)]);
    }

    #[test]
    fn test_lex_errors() {
        assert_eq!(tokenize("line\n{{< youtube").unwrap_err().line, 2);
        assert!(tokenize("{{<  >}}").is_err());
        assert!(tokenize("{{< bad!name >}}").is_err());
        assert!(tokenize("{{< end >}}").is_err());
    }
}
