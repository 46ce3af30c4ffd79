//! `[[target]]` / `[[domain::target|alias]]` wiki-link parsing.

use regex::Regex;
use std::sync::OnceLock;

/// A single parsed wiki-link occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiLink {
    pub raw: String,
    pub target: String,
    pub domain: Option<String>,
    pub alias: Option<String>,
}

fn wiki_link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\[([^\]]+)\]\]").unwrap())
}

/// Extract every wiki-link occurrence from `text`. Per match: split on the
/// first `::` to recover an optional domain, then split the remainder on the
/// first `|` to recover an optional display alias. Targets empty after
/// trimming are dropped.
pub fn extract_wiki_links(text: &str) -> Vec<WikiLink> {
    wiki_link_regex()
        .captures_iter(text)
        .filter_map(|caps| {
            let raw = caps[1].to_string();

            let (domain, after_domain) = match raw.split_once("::") {
                Some((d, rest)) => (Some(d.to_string()), rest),
                None => (None, raw.as_str()),
            };

            let (target, alias) = match after_domain.split_once('|') {
                Some((t, a)) => (t.trim().to_string(), Some(a.trim().to_string())),
                None => (after_domain.trim().to_string(), None),
            };

            if target.is_empty() {
                return None;
            }

            Some(WikiLink { raw, target, domain, alias })
        })
        .collect()
}

/// Convenience wrapper returning just the resolved target strings.
pub fn extract_wiki_link_targets(text: &str) -> Vec<String> {
    extract_wiki_links(text).into_iter().map(|l| l.target).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_plain_target() {
        let links = extract_wiki_links("see [[BR-DOCUMENT-001]] for details");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target, "BR-DOCUMENT-001");
        assert_eq!(links[0].domain, None);
        assert_eq!(links[0].alias, None);
    }

    #[test]
    fn extracts_domain_and_alias() {
        let links = extract_wiki_links("[[billing::Invoice|the invoice]]");
        assert_eq!(links[0].domain, Some("billing".to_string()));
        assert_eq!(links[0].target, "Invoice");
        assert_eq!(links[0].alias, Some("the invoice".to_string()));
    }

    #[test]
    fn drops_empty_targets_after_trim() {
        let links = extract_wiki_links("[[   ]] and [[Real]]");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target, "Real");
    }

    #[test]
    fn extracts_multiple_occurrences() {
        let targets = extract_wiki_link_targets("[[A]] then [[B]] then [[C]]");
        assert_eq!(targets, vec!["A", "B", "C"]);
    }
}
