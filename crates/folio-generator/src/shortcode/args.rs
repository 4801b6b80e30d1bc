//! Shortcode argument parsing.
//!
//! Arguments are named and comma separated: `id="abc", width=640, ratio=1.5,
//! autoplay=false`. Quoted values are strings, bare digits integers, digits
//! with a dot floats and `true`/`false` booleans.

use serde_json::{Map, Number, Value};

/// Parse an argument list into a JSON object.
pub fn parse_args(source: &str) -> Result<Map<String, Value>, String> {
    let mut args = Map::new();
    let mut rest = source.trim_start();

    while !rest.is_empty() {
        let key_len = rest
            .find(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | '-')))
            .unwrap_or(rest.len());
        if key_len == 0 {
            return Err(format!("expected an argument name at `{}`", preview(rest)));
        }
        let key = &rest[..key_len];

        let Some(after_eq) = rest[key_len..].trim_start().strip_prefix('=') else {
            return Err(format!("argument `{key}` has no value"));
        };
        let (value, remaining) =
            parse_value(after_eq.trim_start()).map_err(|message| format!("argument `{key}`: {message}"))?;

        if args.insert(key.to_string(), value).is_some() {
            return Err(format!("argument `{key}` is given twice"));
        }

        rest = remaining.trim_start();
        if let Some(after_comma) = rest.strip_prefix(',') {
            rest = after_comma.trim_start();
        }
    }

    Ok(args)
}

fn parse_value(source: &str) -> Result<(Value, &str), String> {
    if let Some(quote) = source.chars().next().filter(|c| matches!(c, '"' | '\'')) {
        return parse_quoted(source, quote);
    }

    let end = source
        .find(|c: char| c.is_whitespace() || c == ',')
        .unwrap_or(source.len());
    let literal = &source[..end];
    let value = parse_literal(literal).ok_or_else(|| {
        if literal.is_empty() {
            "missing value".to_string()
        } else {
            format!("`{literal}` is not a quoted string, number or boolean")
        }
    })?;
    Ok((value, &source[end..]))
}

fn parse_quoted(source: &str, quote: char) -> Result<(Value, &str), String> {
    let mut value = String::new();
    let mut chars = source.char_indices().skip(1);

    while let Some((index, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, escaped)) => value.push(escaped),
                None => break,
            },
            c if c == quote => {
                return Ok((Value::String(value), &source[index + c.len_utf8()..]));
            }
            c => value.push(c),
        }
    }

    Err("unterminated string".to_string())
}

fn parse_literal(literal: &str) -> Option<Value> {
    match literal {
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        _ => {}
    }

    let digits = literal.strip_prefix('-').unwrap_or(literal);
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    if all_digits(digits) {
        return literal.parse::<i64>().ok().map(Value::from);
    }

    let (whole, fraction) = digits.split_once('.')?;
    if all_digits(whole) && all_digits(fraction) {
        return literal
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number);
    }
    None
}

fn preview(s: &str) -> String {
    s.chars().take(16).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_typed_values() {
        let args = parse_args(r#"id="abc", width=640, ratio=1.5, autoplay=false, offset=-3"#).unwrap();
        assert_eq!(args["id"], json!("abc"));
        assert_eq!(args["width"], json!(640));
        assert_eq!(args["ratio"], json!(1.5));
        assert_eq!(args["autoplay"], json!(false));
        assert_eq!(args["offset"], json!(-3));
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert!(parse_args("").unwrap().is_empty());
        assert!(parse_args("   ").unwrap().is_empty());
        let args = parse_args(" a = 1 ,b='two' ").unwrap();
        assert_eq!(args["a"], json!(1));
        assert_eq!(args["b"], json!("two"));
    }

    #[test]
    fn test_quoted_escapes() {
        let args = parse_args(r#"caption="say \"hi\", then, go", path='it\'s'"#).unwrap();
        assert_eq!(args["caption"], json!("say \"hi\", then, go"));
        assert_eq!(args["path"], json!("it's"));
    }

    #[test]
    fn test_bad_literals() {
        for source in [
            "id=abc",
            "n=1.2.3",
            "n=.5",
            "flag=True",
            "x=",
            "=1",
            "x",
            "s=\"open",
            "a=1, a=2",
        ] {
            assert!(parse_args(source).is_err(), "expected error for {source:?}");
        }
    }

    #[test]
    fn test_error_names_argument() {
        let err = parse_args("id=abc").unwrap_err();
        assert!(err.contains("`id`"));
        assert!(err.contains("abc"));
    }
}
