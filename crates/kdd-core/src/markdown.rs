//! Front-matter extraction, heading-hierarchy sectioning, and snippet building.
//!
//! Parsing is strictly structural: no AST beyond sections.

use std::collections::HashMap;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::model::Section;

/// Split a file's content into front-matter (if any) and body. A malformed or
/// missing `---`-delimited YAML block yields an empty map and the full content
/// as body — no information is lost beyond the malformed YAML itself.
pub fn extract_frontmatter(content: &str) -> (HashMap<String, serde_json::Value>, String) {
    let Some(rest) = content.strip_prefix("---") else {
        return (HashMap::new(), content.to_string());
    };
    let Some(end) = rest.find("\n---") else {
        return (HashMap::new(), content.to_string());
    };

    let yaml_block = &rest[..end];
    let body = rest[end + 4..].trim_start_matches('\n').to_string();

    match serde_yaml::from_str::<serde_yaml::Value>(yaml_block) {
        Ok(value) => {
            let map = yaml_value_to_json_map(value);
            (map, body)
        }
        Err(_) => (HashMap::new(), content.to_string()),
    }
}

fn yaml_value_to_json_map(value: serde_yaml::Value) -> HashMap<String, serde_json::Value> {
    let serde_yaml::Value::Mapping(mapping) = value else {
        return HashMap::new();
    };
    mapping
        .into_iter()
        .filter_map(|(k, v)| {
            let key = k.as_str()?.to_string();
            let json_value: serde_json::Value = serde_json::to_value(&v).ok()?;
            Some((key, json_value))
        })
        .collect()
}

/// Parse a document body into an ordered list of [`Section`]s using a
/// heading-stack algorithm: a heading at level `n` closes every open ancestor
/// at level `>= n` before opening itself.
pub fn parse_markdown_sections(body: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut stack: Vec<(String, u8)> = Vec::new();
    let mut current_heading: Option<(String, u8)> = None;
    let mut current_content: Vec<&str> = Vec::new();

    let flush = |sections: &mut Vec<Section>,
                 stack: &[(String, u8)],
                 heading: &Option<(String, u8)>,
                 content: &[&str]| {
        if let Some((heading_text, level)) = heading {
            let path = stack
                .iter()
                .map(|(h, _)| heading_to_anchor(h))
                .collect::<Vec<_>>()
                .join(".");
            sections.push(Section {
                heading: heading_text.clone(),
                level: *level,
                content: content.join("\n").trim().to_string(),
                path,
            });
        }
    };

    for line in body.lines() {
        let trimmed = line.trim_start();
        let hash_count = trimmed.chars().take_while(|&c| c == '#').count();
        let is_heading = hash_count >= 1 && hash_count <= 6 && trimmed.as_bytes().get(hash_count) == Some(&b' ');

        if is_heading {
            flush(&mut sections, &stack, &current_heading, &current_content);
            current_content.clear();

            let level = hash_count as u8;
            while matches!(stack.last(), Some((_, top_level)) if *top_level >= level) {
                stack.pop();
            }

            let heading_text = trimmed[hash_count..].trim().to_string();
            stack.push((heading_text.clone(), level));
            current_heading = Some((heading_text, level));
        } else {
            current_content.push(line);
        }
    }
    flush(&mut sections, &stack, &current_heading, &current_content);

    sections
}

/// Convert a heading string to its URL-safe anchor slug: NFKD-normalize,
/// lowercase, strip characters outside `[\w\s-]`, collapse whitespace runs to a
/// single hyphen, strip leading/trailing hyphens.
pub fn heading_to_anchor(heading: &str) -> String {
    let normalized: String = heading.nfkd().collect();
    let lowered = normalized.to_lowercase();

    // `\w` in the regex crate's Unicode mode includes combining marks (unlike
    // Python's `re`), so NFKD-decomposed accents survive a plain `[^\w\s-]`
    // strip. Drop them explicitly first.
    let mark_re = Regex::new(r"\p{M}").unwrap();
    let without_marks = mark_re.replace_all(&lowered, "");

    let strip_re = Regex::new(r"[^\w\s-]").unwrap();
    let stripped = strip_re.replace_all(&without_marks, "");

    let whitespace_re = Regex::new(r"\s+").unwrap();
    let hyphenated = whitespace_re.replace_all(&stripped, "-");

    hyphenated.trim_matches('-').to_string()
}

/// Build a short plain-text snippet from raw markdown content: strip heading
/// markers, bold/italic/link syntax, collapse whitespace, then truncate at a
/// sentence or word boundary with a trailing ellipsis.
pub fn extract_snippet(content: &str, max_length: usize) -> String {
    let heading_re = Regex::new(r"(?m)^#+\s*").unwrap();
    let without_headings = heading_re.replace_all(content, "");

    let link_re = Regex::new(r"\[\[?([^\]|]+)(?:\|[^\]]*)?\]\]?").unwrap();
    let without_links = link_re.replace_all(&without_headings, "$1");

    let emphasis_re = Regex::new(r"[*_]{1,3}").unwrap();
    let without_emphasis = emphasis_re.replace_all(&without_links, "");

    let whitespace_re = Regex::new(r"\s+").unwrap();
    let collapsed = whitespace_re.replace_all(&without_emphasis, " ");
    let trimmed = collapsed.trim();

    if trimmed.len() <= max_length {
        return trimmed.to_string();
    }

    let slice = &trimmed[..max_length];
    if let Some(sentence_end) = slice.rfind(". ") {
        return format!("{}...", &slice[..=sentence_end].trim_end());
    }
    if let Some(word_boundary) = slice.rfind(' ') {
        return format!("{}...", &slice[..word_boundary]);
    }
    format!("{slice}...")
}
