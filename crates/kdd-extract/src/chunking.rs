//! Hierarchical chunking for embedding generation (the BR-EMBEDDING-001
//! rule encoded in [`kdd_core::embeddable_sections`]). Selects embeddable
//! sections per kind, splits them into paragraph-level chunks, and
//! enriches each chunk with document-identity context.

use kdd_core::{Document, embeddable_sections};

pub const DEFAULT_MAX_CHUNK_CHARS: usize = 1500;
pub const DEFAULT_OVERLAP_CHARS: usize = 200;
pub const DEFAULT_MIN_PARAGRAPH_WORDS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub chunk_id: String,
    pub document_id: String,
    pub section_heading: String,
    pub content: String,
    pub context_text: String,
    pub char_offset: usize,
}

/// Chunk a document's embeddable sections into embedding-ready pieces.
/// Returns an empty list for kinds with no embeddable sections (e.g. event).
pub fn chunk_document(document: &Document) -> Vec<Chunk> {
    chunk_document_with(document, DEFAULT_MAX_CHUNK_CHARS, DEFAULT_OVERLAP_CHARS)
}

pub fn chunk_document_with(document: &Document, max_chunk_chars: usize, overlap_chars: usize) -> Vec<Chunk> {
    let allowed = embeddable_sections(document.kind);
    if allowed.is_empty() {
        return Vec::new();
    }

    let identity = build_identity(document);
    let mut chunks = Vec::new();
    let mut chunk_idx = 0usize;

    for section in &document.sections {
        if !allowed.contains(section.heading.to_lowercase().as_str()) {
            continue;
        }
        if section.content.trim().is_empty() {
            continue;
        }

        for (offset, text) in split_paragraphs(&section.content, max_chunk_chars, overlap_chars) {
            let context = format!("{identity}\nSection: {}\n\n{text}", section.heading);
            chunks.push(Chunk {
                chunk_id: format!("{}:chunk-{chunk_idx}", document.id),
                document_id: document.id.clone(),
                section_heading: section.heading.clone(),
                content: text,
                context_text: context,
                char_offset: offset,
            });
            chunk_idx += 1;
        }
    }

    chunks
}

fn build_identity(document: &Document) -> String {
    let mut parts = vec![
        format!("Document: {}", document.id),
        format!("Kind: {}", document.kind.as_str()),
        format!("Layer: {}", document.layer.as_str()),
    ];
    if let Some(title) = document.front_matter.get("title").and_then(|v| v.as_str()) {
        parts.push(format!("Title: {title}"));
    }
    parts.join("\n")
}

/// Split content on paragraph boundaries (`\n\n`), merge paragraphs shorter
/// than [`DEFAULT_MIN_PARAGRAPH_WORDS`] into a neighbor, then accumulate the
/// result into chunks until `max_chars` is reached; a single oversized
/// paragraph is split at sentence boundaries instead. Returns
/// `(char_offset, text)` pairs.
fn split_paragraphs(content: &str, max_chars: usize, overlap: usize) -> Vec<(usize, String)> {
    let raw_paragraphs = collect_paragraphs(content);
    let paragraphs = merge_short_paragraphs(raw_paragraphs, DEFAULT_MIN_PARAGRAPH_WORDS);
    let mut results = Vec::new();

    let mut current_parts: Vec<String> = Vec::new();
    let mut current_len = 0usize;
    let mut current_offset = 0usize;

    for (para_offset, para) in paragraphs {
        let para_len = para.chars().count();
        let char_pos = para_offset;

        if current_len + para_len + 2 > max_chars && !current_parts.is_empty() {
            results.push((current_offset, current_parts.join("\n\n")));

            if overlap > 0 {
                let last = current_parts.last().cloned().unwrap_or_default();
                if last.chars().count() <= overlap {
                    let last_len = last.chars().count();
                    current_offset = char_pos.saturating_sub(last_len + 2);
                    current_len = last_len;
                    current_parts = vec![last];
                } else {
                    current_parts = Vec::new();
                    current_len = 0;
                    current_offset = char_pos;
                }
            } else {
                current_parts = Vec::new();
                current_len = 0;
                current_offset = char_pos;
            }
        }

        if para_len > max_chars && current_parts.is_empty() {
            let sentences = split_sentences(&para);
            let mut sent_buf: Vec<String> = Vec::new();
            let mut sent_len = 0usize;
            let mut sent_offset = char_pos;

            for sent in sentences {
                let sent_chars = sent.chars().count();
                if sent_len + sent_chars + 1 > max_chars && !sent_buf.is_empty() {
                    results.push((sent_offset, sent_buf.join(" ")));
                    sent_buf = Vec::new();
                    sent_len = 0;
                    sent_offset = char_pos;
                }
                sent_buf.push(sent.to_string());
                sent_len += sent_chars + 1;
            }

            if !sent_buf.is_empty() {
                current_offset = sent_offset;
                current_len = sent_len;
                current_parts = sent_buf;
            }
        } else {
            if current_parts.is_empty() {
                current_offset = char_pos;
            }
            current_parts.push(para);
            current_len += para_len + 2;
        }
    }

    if !current_parts.is_empty() {
        results.push((current_offset, current_parts.join("\n\n")));
    }

    results
}

/// Split `content` on `\n\n`, trim each piece, drop empties, and record each
/// surviving paragraph's starting offset into the original content.
fn collect_paragraphs(content: &str) -> Vec<(usize, String)> {
    let mut paragraphs = Vec::new();
    let mut char_pos = 0usize;

    for raw_para in content.split("\n\n") {
        let para = raw_para.trim();
        if !para.is_empty() {
            paragraphs.push((char_pos, para.to_string()));
        }
        char_pos += raw_para.chars().count() + 2;
    }

    paragraphs
}

/// Merge paragraphs with fewer than `min_words` words forward into the next
/// paragraph; a trailing short paragraph with no successor merges backward
/// into the previous one instead. Each merged group keeps the offset of its
/// first (earliest) paragraph.
fn merge_short_paragraphs(paragraphs: Vec<(usize, String)>, min_words: usize) -> Vec<(usize, String)> {
    let mut merged: Vec<(usize, String)> = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (offset, text) in paragraphs {
        let (group_offset, group_text) = match pending.take() {
            Some((pend_offset, pend_text)) => (pend_offset, format!("{pend_text}\n\n{text}")),
            None => (offset, text),
        };

        if word_count(&group_text) < min_words {
            pending = Some((group_offset, group_text));
        } else {
            merged.push((group_offset, group_text));
        }
    }

    if let Some((offset, text)) = pending {
        match merged.last_mut() {
            Some(last) => last.1 = format!("{}\n\n{}", last.1, text),
            None => merged.push((offset, text)),
        }
    }

    merged
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Naive sentence splitter: break after a `.` followed by whitespace. The
/// `regex` crate has no lookbehind, so the split is done by hand rather than
/// porting the original's `(?<=\.)\s+` pattern.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let bytes = text.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        if bytes[i] == b'.' {
            let mut j = i + 1;
            let ws_start = j;
            while j < bytes.len() && (bytes[j] as char).is_whitespace() {
                j += 1;
            }
            if j > ws_start {
                sentences.push(text[start..i + 1].trim());
                start = j;
                i = j;
                continue;
            }
        }
        i += 1;
    }

    if start < text.len() {
        sentences.push(text[start..].trim());
    }

    sentences.into_iter().filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdd_core::{KDDKind, KDDLayer, compute_content_hash, parse_markdown_sections};
    use std::collections::HashMap;

    fn doc(kind: KDDKind, body: &str) -> Document {
        Document {
            id: "Order".into(),
            kind,
            source_path: "specs/x.md".into(),
            source_hash: compute_content_hash(body),
            layer: KDDLayer::Domain,
            front_matter: HashMap::new(),
            sections: parse_markdown_sections(body),
            wiki_links: Vec::new(),
            status: Default::default(),
            indexed_at: None,
            domain: None,
        }
    }

    #[test]
    fn event_kind_produces_no_chunks() {
        let document = doc(KDDKind::Event, "## Descripción\n\nSomething.\n");
        assert!(chunk_document(&document).is_empty());
    }

    #[test]
    fn entity_description_produces_a_context_enriched_chunk() {
        let document = doc(KDDKind::Entity, "## Descripción\n\nAn order aggregate.\n");
        let chunks = chunk_document(&document);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "An order aggregate.");
        assert!(chunks[0].context_text.contains("Document: Order"));
        assert!(chunks[0].context_text.contains("Section: Descripción"));
    }

    #[test]
    fn oversized_section_splits_into_multiple_chunks() {
        let para_a = "apple ".repeat(150);
        let para_b = "banana ".repeat(130);
        let body = format!("## Descripción\n\n{para_a}\n\n{para_b}\n");
        let document = doc(KDDKind::Entity, &body);
        let chunks = chunk_document_with(&document, 1500, 200);
        assert!(chunks.len() >= 2);
    }

    #[test]
    fn short_paragraph_merges_forward_into_next_paragraph() {
        let short = "Just a stub.";
        let next = "This section elaborates with enough additional words to stand well past the twenty word merge threshold on its own, describing the entity in detail.";
        let body = format!("## Descripción\n\n{short}\n\n{next}\n");
        let document = doc(KDDKind::Entity, &body);
        let chunks = chunk_document_with(&document, 1500, 200);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].content.contains(short));
        assert!(chunks[0].content.contains(next));
    }

    #[test]
    fn trailing_short_paragraph_merges_into_previous_paragraph() {
        let first = "This is a normal paragraph with plenty of words describing the entity so it clears the merge threshold comfortably on its own merits.";
        let trailing = "The end.";
        let body = format!("## Descripción\n\n{first}\n\n{trailing}\n");
        let document = doc(KDDKind::Entity, &body);
        let chunks = chunk_document_with(&document, 1500, 200);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].content.contains(first));
        assert!(chunks[0].content.contains(trailing));
    }
}
