use std::collections::HashSet;

use advisor_core::NewsItem;
use url::Url;

/// Near-duplicate titles above this token-set Jaccard similarity are
/// considered the same story.
const TITLE_SIMILARITY_THRESHOLD: f64 = 0.75;

/// Minimum items the relevance filter must leave; below this the filter
/// is skipped entirely so a thin news day still produces a signal.
const MIN_RELEVANT_ITEMS: usize = 3;

/// Drops items that mention the entity only as part of a longer compound
/// name (affiliate noise like a same-prefix subsidiary). Items that do
/// not mention the name at all are kept; the upstream search already
/// scoped them to the entity.
pub fn relevance_filter(items: Vec<NewsItem>, entity_name: &str) -> Vec<NewsItem> {
    if entity_name.is_empty() {
        return items;
    }

    let filtered: Vec<NewsItem> = items
        .iter()
        .filter(|item| mentions_exact_name(&item.title, entity_name))
        .cloned()
        .collect();

    if filtered.len() < MIN_RELEVANT_ITEMS {
        return items;
    }
    filtered
}

fn mentions_exact_name(title: &str, name: &str) -> bool {
    let mut search_from = 0;
    let mut found_any = false;
    while let Some(offset) = title[search_from..].find(name) {
        found_any = true;
        let end = search_from + offset + name.len();
        match title[end..].chars().next() {
            Some(next) if next.is_alphanumeric() => {
                // Compound mention; keep scanning for a standalone one.
                search_from = end;
            }
            _ => return true,
        }
    }
    !found_any
}

/// Keeps one item per source domain. Items arrive newest first, so the
/// first seen per domain is the most recent; items without a parseable
/// domain are all kept.
pub fn dedup_by_domain(items: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut seen: HashSet<String> = HashSet::new();
    items
        .into_iter()
        .filter(|item| {
            match Url::parse(&item.link).ok().and_then(|u| u.host_str().map(str::to_string)) {
                Some(domain) => seen.insert(domain),
                None => true,
            }
        })
        .collect()
}

/// Drops titles whose token sets nearly match any previously kept title.
pub fn dedup_by_title(items: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut kept: Vec<NewsItem> = Vec::with_capacity(items.len());
    let mut kept_tokens: Vec<HashSet<String>> = Vec::with_capacity(items.len());

    for item in items {
        let tokens = tokenize(&item.title);
        let duplicate = kept_tokens
            .iter()
            .any(|existing| jaccard(&tokens, existing) > TITLE_SIMILARITY_THRESHOLD);
        if !duplicate {
            kept.push(item);
            kept_tokens.push(tokens);
        }
    }
    kept
}

fn tokenize(title: &str) -> HashSet<String> {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    intersection as f64 / union as f64
}
