//! Listing pages for listed collections and their tags.

use std::collections::{BTreeMap, HashSet};

use folio_core::{
    CollectionConfig, Config, Page,
    url::{listing_url, page_url, slugify},
};
use tracing::debug;

/// What a listing enumerates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingKind {
    Index,
    Tag { name: String, slug: String },
}

/// One page of a collection or tag listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    pub collection: String,
    pub lang: String,
    pub kind: ListingKind,
    /// 1-based page number.
    pub number: usize,
    pub total: usize,
    pub url: String,
    /// URL of page 1.
    pub base_url: String,
    pub prev: Option<String>,
    pub next: Option<String>,
    /// Indices into the page list, in listing order.
    pub items: Vec<usize>,
}

/// Number of listing pages for `items` entries at `per_page` each.
pub fn page_count(items: usize, per_page: usize) -> usize {
    items.div_ceil(per_page.max(1)).max(1)
}

/// Sort page indices for a listing.
///
/// Dated collections run newest first; others by weight, then input order.
/// Both sorts are stable.
pub fn sort_for_listing(pages: &[Page], indices: &mut [usize], has_date: bool) {
    if has_date {
        indices.sort_by(|&a, &b| pages[b].date().cmp(&pages[a].date()));
    } else {
        indices.sort_by_key(|&i| pages[i].frontmatter.weight);
    }
}

/// Split `items` into consecutive listing pages rooted at `base_url`.
fn paginate(
    collection: &CollectionConfig,
    lang: &str,
    kind: &ListingKind,
    base_url: &str,
    items: &[usize],
) -> Vec<ListingPage> {
    let per_page = collection.paginate.unwrap_or(items.len()).max(1);
    let total = page_count(items.len(), per_page);

    (1..=total)
        .map(|number| {
            let start = (number - 1) * per_page;
            let end = (start + per_page).min(items.len());
            ListingPage {
                collection: collection.name.clone(),
                lang: lang.to_string(),
                kind: kind.clone(),
                number,
                total,
                url: listing_url(base_url, number),
                base_url: base_url.to_string(),
                prev: (number > 1).then(|| listing_url(base_url, number - 1)),
                next: (number < total).then(|| listing_url(base_url, number + 1)),
                items: items.get(start..end).map(<[usize]>::to_vec).unwrap_or_default(),
            }
        })
        .collect()
}

/// Build every listing page of the site.
///
/// The default language always gets an index for each listed collection;
/// other languages only when they have pages in it. Tag listings follow at
/// `<index>/tags/<tag-slug>/`.
pub fn build_listings(config: &Config, pages: &[Page]) -> Vec<ListingPage> {
    let mut listings = Vec::new();

    for collection in config.collections.iter().filter(|c| c.listed) {
        let prefix = collection.url_prefix();

        for lang in config.all_languages() {
            let mut indices: Vec<usize> = pages
                .iter()
                .enumerate()
                .filter(|(_, p)| p.collection == collection.name && p.lang == lang)
                .map(|(i, _)| i)
                .collect();
            if indices.is_empty() && lang != config.default_language() {
                continue;
            }
            sort_for_listing(pages, &mut indices, collection.has_date);

            let base = page_url(&config.lang_prefix(lang), &prefix, "");
            listings.extend(paginate(collection, lang, &ListingKind::Index, &base, &indices));

            let mut tags: BTreeMap<String, (String, Vec<usize>)> = BTreeMap::new();
            for &index in &indices {
                let mut seen = HashSet::new();
                for tag in pages[index].tags() {
                    let slug = slugify(tag);
                    if slug.is_empty() || !seen.insert(slug.clone()) {
                        continue;
                    }
                    tags.entry(slug)
                        .or_insert_with(|| (tag.clone(), Vec::new()))
                        .1
                        .push(index);
                }
            }

            for (slug, (name, items)) in tags {
                let tag_base = format!("{}tags/{slug}/", base);
                let kind = ListingKind::Tag { name, slug };
                listings.extend(paginate(collection, lang, &kind, &tag_base, &items));
            }
        }
    }

    debug!(count = listings.len(), "planned listing pages");
    listings
}

/// Languages that need a generated home page: those whose home URL is not
/// already a page or listing. Non-default languages need at least one page.
pub fn home_languages<'c>(
    config: &'c Config,
    pages: &[Page],
    listings: &[ListingPage],
) -> Vec<&'c str> {
    let claimed: HashSet<&str> = pages
        .iter()
        .map(|p| p.url.as_str())
        .chain(listings.iter().map(|l| l.url.as_str()))
        .collect();

    config
        .all_languages()
        .into_iter()
        .filter(|lang| *lang == config.default_language() || pages.iter().any(|p| p.lang == *lang))
        .filter(|lang| !claimed.contains(config.home_url(lang).as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;

    use super::*;
    use crate::{
        i18n,
        test_support::{config, post},
    };

    fn resolved_posts(config: &Config) -> Vec<Page> {
        let pages = vec![
            post(config, "a.md", "A", "2026-01-01", &["Rust", "Web"]),
            post(config, "b.md", "B", "2026-01-03", &["Rust"]),
            post(config, "c.md", "C", "2026-01-02", &[]),
            post(config, "a.es.md", "A es", "2026-01-01", &[]),
        ];
        i18n::resolve(config, pages, &BTreeSet::new()).unwrap()
    }

    #[test]
    fn test_index_pages_newest_first() {
        let config = config();
        let pages = resolved_posts(&config);
        let listings = build_listings(&config, &pages);

        let index: Vec<_> = listings
            .iter()
            .filter(|l| l.kind == ListingKind::Index && l.lang == "en")
            .collect();
        assert_eq!(index.len(), 2);

        assert_eq!(index[0].url, "/posts/");
        assert_eq!(index[0].prev, None);
        assert_eq!(index[0].next.as_deref(), Some("/posts/page/2"));
        let titles: Vec<_> = index[0].items.iter().map(|&i| pages[i].title()).collect();
        assert_eq!(titles, vec!["B", "C"]);

        assert_eq!(index[1].url, "/posts/page/2");
        assert_eq!(index[1].prev.as_deref(), Some("/posts/"));
        assert_eq!(index[1].next, None);
        assert_eq!(index[1].items.len(), 1);
    }

    #[test]
    fn test_tag_listings() {
        let config = config();
        let pages = resolved_posts(&config);
        let listings = build_listings(&config, &pages);

        let rust = listings
            .iter()
            .find(|l| matches!(&l.kind, ListingKind::Tag { slug, .. } if slug == "rust"))
            .unwrap();
        assert_eq!(rust.url, "/posts/tags/rust/");
        assert_eq!(rust.items.len(), 2);
        assert!(matches!(&rust.kind, ListingKind::Tag { name, .. } if name == "Rust"));
    }

    #[test]
    fn test_translated_index_only_with_pages() {
        let config = config();
        let pages = resolved_posts(&config);
        let listings = build_listings(&config, &pages);

        let es: Vec<_> = listings.iter().filter(|l| l.lang == "es").collect();
        assert_eq!(es.len(), 1);
        assert_eq!(es[0].url, "/es/posts/");

        let listings = build_listings(&config, &[]);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].url, "/posts/");
        assert!(listings[0].items.is_empty());
    }

    #[test]
    fn test_home_languages() {
        let config = config();
        let pages = resolved_posts(&config);
        let listings = build_listings(&config, &pages);
        assert_eq!(home_languages(&config, &pages, &listings), vec!["en", "es"]);
        assert_eq!(home_languages(&config, &[], &[]), vec!["en"]);
    }

    #[test]
    fn test_weight_order_is_stable() {
        let config = config();
        let mut pages = resolved_posts(&config);
        pages[0].frontmatter.weight = 5;
        let mut indices = vec![0, 1, 2, 3];
        sort_for_listing(&pages, &mut indices, false);
        assert_eq!(indices, vec![1, 2, 3, 0]);
    }

    proptest! {
        #[test]
        fn prop_pagination_sizes(items in 0usize..60, per_page in 1usize..12) {
            let collection = CollectionConfig {
                name: "posts".to_string(),
                label: None,
                directory: None,
                url_prefix: None,
                default_template: None,
                has_date: true,
                has_rss: false,
                listed: true,
                nested: false,
                paginate: Some(per_page),
            };
            let indices: Vec<usize> = (0..items).collect();
            let pages = paginate(&collection, "en", &ListingKind::Index, "/posts/", &indices);

            prop_assert_eq!(pages.len(), page_count(items, per_page));
            prop_assert_eq!(pages.len(), items.div_ceil(per_page).max(1));

            let last = pages.last().unwrap();
            let expected_last = if items == 0 {
                0
            } else if items % per_page == 0 {
                per_page
            } else {
                items % per_page
            };
            prop_assert_eq!(last.items.len(), expected_last);

            let flattened: Vec<usize> = pages.iter().flat_map(|p| p.items.clone()).collect();
            prop_assert_eq!(flattened, indices);
        }
    }
}
