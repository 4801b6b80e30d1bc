//! Built-in shortcodes.

use super::registry::{BuiltinFn, ShortcodeCall, ShortcodeDef, ShortcodeKind, ShortcodeSource};
use crate::html::escape_html;

/// Every built-in shortcode definition.
pub fn all() -> Vec<ShortcodeDef> {
    vec![
        builtin("youtube", ShortcodeKind::Inline, youtube),
        builtin("vimeo", ShortcodeKind::Inline, vimeo),
        builtin("gist", ShortcodeKind::Inline, gist),
        builtin("figure", ShortcodeKind::Either, figure),
        builtin("callout", ShortcodeKind::Body, callout),
    ]
}

fn builtin(name: &str, kind: ShortcodeKind, render: BuiltinFn) -> ShortcodeDef {
    ShortcodeDef {
        name: name.to_string(),
        kind,
        source: ShortcodeSource::Builtin(render),
    }
}

/// `{{< youtube id="dQw4w9WgXcQ" title="..." >}}`
fn youtube(call: &ShortcodeCall<'_>) -> Result<String, String> {
    let id = call.required("id")?;
    let title = call.arg("title").unwrap_or_else(|| "YouTube video".to_string());
    Ok(format!(
        r#"<div class="embed embed-youtube"><iframe src="https://www.youtube-nocookie.com/embed/{}" title="{}" allow="encrypted-media; picture-in-picture" allowfullscreen loading="lazy"></iframe></div>"#,
        escape_html(&id),
        escape_html(&title)
    ))
}

/// `{{< vimeo id="76979871" >}}`
fn vimeo(call: &ShortcodeCall<'_>) -> Result<String, String> {
    let id = call.required("id")?;
    let title = call.arg("title").unwrap_or_else(|| "Vimeo video".to_string());
    Ok(format!(
        r#"<div class="embed embed-vimeo"><iframe src="https://player.vimeo.com/video/{}" title="{}" allow="fullscreen; picture-in-picture" allowfullscreen loading="lazy"></iframe></div>"#,
        escape_html(&id),
        escape_html(&title)
    ))
}

/// `{{< gist user="octocat" id="6cad326836d38bd3a7ae" file="hello.rs" >}}`
fn gist(call: &ShortcodeCall<'_>) -> Result<String, String> {
    let user = call.required("user")?;
    let id = call.required("id")?;
    let file = call
        .arg("file")
        .map(|f| format!("?file={}", escape_html(&f)))
        .unwrap_or_default();
    Ok(format!(
        r#"<script src="https://gist.github.com/{}/{}.js{file}"></script>"#,
        escape_html(&user),
        escape_html(&id)
    ))
}

/// `{{< figure src="/static/a.png" alt="..." caption="..." >}}`, or with the
/// caption as a markdown body.
fn figure(call: &ShortcodeCall<'_>) -> Result<String, String> {
    let src = call.required("src")?;
    let alt = call.arg("alt").unwrap_or_default();

    let caption = match (call.body.map(str::trim).filter(|b| !b.is_empty()), call.arg("caption")) {
        (Some(body), _) => format!("<figcaption>{body}</figcaption>"),
        (None, Some(caption)) => format!("<figcaption>{}</figcaption>", escape_html(&caption)),
        (None, None) => String::new(),
    };

    Ok(format!(
        r#"<figure class="figure"><img src="{}" alt="{}">{caption}</figure>"#,
        escape_html(&src),
        escape_html(&alt)
    ))
}

/// `{{% callout type="warning" title="Heads up" %}}markdown{{% end %}}`
fn callout(call: &ShortcodeCall<'_>) -> Result<String, String> {
    let kind = call.arg("type").unwrap_or_else(|| "note".to_string());
    let title = call
        .arg("title")
        .map(|t| format!(r#"<p class="callout-title">{}</p>"#, escape_html(&t)))
        .unwrap_or_default();
    let body = call.body.unwrap_or_default().trim();

    Ok(format!(
        r#"<div class="callout callout-{}">{title}{body}</div>"#,
        escape_html(&kind)
    ))
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value};

    use super::*;

    fn call<'a>(args: &'a Map<String, Value>, body: Option<&'a str>) -> ShortcodeCall<'a> {
        ShortcodeCall { args, body }
    }

    fn args(pairs: &[(&str, &str)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(*v)))
            .collect()
    }

    #[test]
    fn test_youtube() {
        let a = args(&[("id", "abc123")]);
        let html = youtube(&call(&a, None)).unwrap();
        assert!(html.contains("https://www.youtube-nocookie.com/embed/abc123"));
        assert!(youtube(&call(&Map::new(), None)).unwrap_err().contains("`id`"));
    }

    #[test]
    fn test_gist_file() {
        let a = args(&[("user", "octo"), ("id", "42"), ("file", "main.rs")]);
        assert_eq!(
            gist(&call(&a, None)).unwrap(),
            r#"<script src="https://gist.github.com/octo/42.js?file=main.rs"></script>"#
        );
    }

    #[test]
    fn test_figure_caption_sources() {
        let a = args(&[("src", "/static/a.png"), ("alt", "A \"quoted\" alt"), ("caption", "Plain")]);
        let html = figure(&call(&a, None)).unwrap();
        assert!(html.contains(r#"alt="A &quot;quoted&quot; alt""#));
        assert!(html.contains("<figcaption>Plain</figcaption>"));

        let html = figure(&call(&a, Some("<p><em>Rich</em></p>\n"))).unwrap();
        assert!(html.contains("<figcaption><p><em>Rich</em></p></figcaption>"));
    }

    #[test]
    fn test_callout() {
        let a = args(&[("type", "warning"), ("title", "Careful")]);
        let html = callout(&call(&a, Some("<p>Body</p>"))).unwrap();
        assert_eq!(
            html,
            r#"<div class="callout callout-warning"><p class="callout-title">Careful</p><p>Body</p></div>"#
        );
    }

    #[test]
    fn test_all_kinds() {
        let defs = all();
        let kind = |name: &str| defs.iter().find(|d| d.name == name).map(|d| d.kind);
        assert_eq!(kind("youtube"), Some(ShortcodeKind::Inline));
        assert_eq!(kind("figure"), Some(ShortcodeKind::Either));
        assert_eq!(kind("callout"), Some(ShortcodeKind::Body));
    }
}
