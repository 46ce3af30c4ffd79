//! Prompt templates for the L3 agent-enrichment call (CMD-003).

/// System prompt steering the agent toward the fixed `{summary,
/// implicit_relations}` response shape the `AgentClient::enrich` contract
/// requires.
pub const ENRICHMENT_SYSTEM_PROMPT: &str = r#"You are a software architecture analyst reviewing a Knowledge-Driven Development spec document and its existing graph neighborhood.

Your job:
1. Write a one-to-two sentence summary of the node's role in the system.
2. Identify *implicit* relationships to other spec nodes that are evident from the document's prose but were not captured by the mechanical wiki-link and section extractors already applied to it.

Be conservative: only report a relationship you can point to textual evidence for. Do not repeat a relationship that is already listed under "Existing Relations" in the context you are given.

Respond with a single JSON object and nothing else:
{
  "summary": "...",
  "implicit_relations": [
    {"target": "Entity:Customer", "type": "references", "confidence": 0.7}
  ]
}

If there are no implicit relations, return an empty array."#;

/// Wrap a caller-assembled context string (node identity, truncated source,
/// existing relations — built by `kdd_index::enrichment::build_context`)
/// into the final user-turn prompt.
pub fn enrichment_user_prompt(context: &str) -> String {
    format!("{context}\n\nReturn the JSON object described in your instructions.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_prompt_wraps_context_verbatim() {
        let wrapped = enrichment_user_prompt("# Node: Entity:Order");
        assert!(wrapped.starts_with("# Node: Entity:Order"));
        assert!(wrapped.contains("Return the JSON object"));
    }
}
