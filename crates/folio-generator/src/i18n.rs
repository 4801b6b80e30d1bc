//! Translation grouping and URL assignment.
//!
//! Pages whose paths differ only by a language suffix share a translation
//! key. Each group takes the slug of its default-language variant and every
//! variant gets its own URL under its language prefix.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    path::PathBuf,
};

use folio_core::{
    Alternate, Config, Page,
    url::{normalize_prefix, page_url},
};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum I18nError {
    /// A translation exists without its default-language page.
    #[error("{} is a translation of `{key}`, which has no default-language ({lang}) page", path.display())]
    MissingDefaultLanguage {
        key: String,
        lang: String,
        path: PathBuf,
    },

    /// Two published documents claim the same URL.
    #[error("URL collision on `{url}`: {first} and {second}")]
    UrlCollision {
        url: String,
        first: String,
        second: String,
    },
}

pub type Result<T> = std::result::Result<T, I18nError>;

/// Assign slugs, URLs and hreflang alternates to every page.
///
/// Groups whose default-language page is an excluded draft are dropped with
/// a warning; any other group without one is an error. Page order is kept.
pub fn resolve(config: &Config, pages: Vec<Page>, excluded_drafts: &BTreeSet<String>) -> Result<Vec<Page>> {
    let default_lang = config.default_language();
    let language_order: HashMap<&str, usize> = config
        .all_languages()
        .into_iter()
        .enumerate()
        .map(|(i, code)| (code, i))
        .collect();

    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (index, page) in pages.iter().enumerate() {
        groups.entry(page.translation_key.as_str()).or_default().push(index);
    }

    let mut slugs: HashMap<usize, String> = HashMap::new();
    let mut dropped: HashSet<usize> = HashSet::new();
    let mut alternates: HashMap<usize, Vec<usize>> = HashMap::new();

    for (key, members) in &groups {
        let Some(&default_index) = members.iter().find(|&&i| pages[i].lang == default_lang) else {
            let first = &pages[members[0]];
            if excluded_drafts.contains(*key) {
                warn!(key = %key, "dropping translations of a draft page");
                dropped.extend(members.iter().copied());
                continue;
            }
            return Err(I18nError::MissingDefaultLanguage {
                key: key.to_string(),
                lang: first.lang.clone(),
                path: first.source_path.clone(),
            });
        };

        let mut ordered = members.clone();
        ordered.sort_by_key(|&i| language_order.get(pages[i].lang.as_str()).copied().unwrap_or(usize::MAX));

        for &member in members {
            slugs.insert(member, pages[default_index].slug.clone());
            alternates.insert(member, ordered.clone());
        }
    }

    let urls: Vec<String> = pages
        .iter()
        .enumerate()
        .map(|(i, page)| {
            let prefix = config
                .collection(&page.collection)
                .map(|c| c.url_prefix())
                .unwrap_or_else(|| normalize_prefix(&page.collection));
            let slug = slugs.get(&i).map_or(page.slug.as_str(), String::as_str);
            page_url(&config.lang_prefix(&page.lang), &prefix, slug)
        })
        .collect();

    let langs: Vec<String> = pages.iter().map(|p| p.lang.clone()).collect();

    let mut resolved = Vec::with_capacity(pages.len() - dropped.len());
    for (index, mut page) in pages.into_iter().enumerate() {
        if dropped.contains(&index) {
            continue;
        }
        if let Some(slug) = slugs.remove(&index) {
            page.slug = slug;
        }
        page.url = urls[index].clone();
        page.alternates = alternates
            .get(&index)
            .map(|members| {
                members
                    .iter()
                    .map(|&m| Alternate {
                        lang: langs[m].clone(),
                        url: urls[m].clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        debug!(url = %page.url, lang = %page.lang, "resolved page URL");
        resolved.push(page);
    }

    check_unique(resolved.iter().map(|p| (p.url.as_str(), p.source_path.display().to_string())))?;
    Ok(resolved)
}

/// Fail on the first URL claimed twice. `origin` names the claimant.
pub fn check_unique<'a>(claims: impl IntoIterator<Item = (&'a str, String)>) -> Result<()> {
    let mut seen: HashMap<&str, String> = HashMap::new();
    for (url, origin) in claims {
        if let Some(first) = seen.get(url) {
            return Err(I18nError::UrlCollision {
                url: url.to_string(),
                first: first.clone(),
                second: origin,
            });
        }
        seen.insert(url, origin);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{config, page};

    fn about(config: &Config, relative: &str, title: &str) -> Page {
        page(config, "pages", relative, &format!("---\ntitle: {title}\n---\nHi\n"))
    }

    #[test]
    fn test_translations_share_slug_and_link_each_other() {
        let config = config();
        let pages = vec![
            about(&config, "about.es.md", "Sobre"),
            about(&config, "about.md", "About"),
        ];

        let resolved = resolve(&config, pages, &BTreeSet::new()).unwrap();
        assert_eq!(resolved[0].url, "/es/about");
        assert_eq!(resolved[1].url, "/about");

        let expected = vec![
            Alternate {
                lang: "en".into(),
                url: "/about".into(),
            },
            Alternate {
                lang: "es".into(),
                url: "/es/about".into(),
            },
        ];
        assert_eq!(resolved[0].alternates, expected);
        assert_eq!(resolved[1].alternates, expected);
    }

    #[test]
    fn test_translation_uses_default_slug() {
        let config = config();
        let default = page(&config, "pages", "about.md", "---\ntitle: About\nslug: who-we-are\n---\n");
        let spanish = page(&config, "pages", "about.es.md", "---\ntitle: Sobre\nslug: quienes\n---\n");

        let resolved = resolve(&config, vec![default, spanish], &BTreeSet::new()).unwrap();
        assert_eq!(resolved[1].url, "/es/who-we-are");
    }

    #[test]
    fn test_missing_default_language() {
        let config = config();
        let err = resolve(&config, vec![about(&config, "about.es.md", "Sobre")], &BTreeSet::new()).unwrap_err();
        assert!(matches!(err, I18nError::MissingDefaultLanguage { ref key, .. } if key == "pages/about"));
        assert!(err.to_string().contains("about.es.md"));
    }

    #[test]
    fn test_translation_of_excluded_draft_is_dropped() {
        let config = config();
        let drafts = BTreeSet::from(["pages/about".to_string()]);
        let resolved = resolve(&config, vec![about(&config, "about.es.md", "Sobre")], &drafts).unwrap();
        assert!(resolved.is_empty());
    }

    #[test]
    fn test_url_collision() {
        let config = config();
        let pages = vec![
            page(&config, "pages", "hello.md", "---\ntitle: A\n---\n"),
            page(&config, "pages", "other.md", "---\ntitle: B\nslug: hello\n---\n"),
        ];
        let err = resolve(&config, pages, &BTreeSet::new()).unwrap_err();
        assert!(matches!(err, I18nError::UrlCollision { ref url, .. } if url == "/hello"));
    }

    #[test]
    fn test_check_unique() {
        assert!(check_unique([("/a", "x".into()), ("/b", "y".into())]).is_ok());
        let err = check_unique([("/a", "x".into()), ("/a", "y".into())]).unwrap_err();
        assert_eq!(err.to_string(), "URL collision on `/a`: x and y");
    }
}
