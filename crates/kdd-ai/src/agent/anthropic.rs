//! HTTP `AgentClient` adapter against the Anthropic Messages API: a
//! reqwest::Client, bearer/auth-header request shape, and
//! environment-variable API-key fallback, producing the
//! `enrich(node, context) -> {summary, implicit_relations}` contract.

use async_trait::async_trait;
use kdd_core::{AgentClient, EnrichmentResult, ErrorCode, GraphNode, ImplicitRelation, KddError, KddResult};
use serde::{Deserialize, Serialize};

use crate::prompt::{ENRICHMENT_SYSTEM_PROMPT, enrichment_user_prompt};

const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicAgentClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
    max_retries: u32,
}

impl AnthropicAgentClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.unwrap_or_else(|| std::env::var("ANTHROPIC_API_KEY").unwrap_or_default()),
            model: "claude-3-5-haiku-20241022".to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_retries: 2,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[cfg(test)]
    fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn call_once(&self, user_prompt: &str) -> KddResult<String> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: 1024,
            system: ENRICHMENT_SYSTEM_PROMPT,
            messages: vec![Message { role: "user", content: user_prompt }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| KddError::new(ErrorCode::AgentError, format!("anthropic request failed: {e}")))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KddError::new(ErrorCode::AgentError, format!("anthropic error: {body}")));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| KddError::new(ErrorCode::AgentError, format!("invalid anthropic response: {e}")))?;

        parsed
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| KddError::new(ErrorCode::AgentError, "anthropic response had no text content"))
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EnrichmentPayload {
    summary: String,
    #[serde(default)]
    implicit_relations: Vec<ImplicitRelationPayload>,
}

#[derive(Debug, Deserialize)]
struct ImplicitRelationPayload {
    target: String,
    #[serde(rename = "type")]
    relation_type: String,
    #[serde(default = "default_confidence")]
    confidence: f32,
}

fn default_confidence() -> f32 {
    0.6
}

/// Extract the first balanced `{...}` object in `text`, tolerating the model
/// wrapping its JSON in prose or a fenced code block.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

#[async_trait]
impl AgentClient for AnthropicAgentClient {
    async fn enrich(&self, _node: &GraphNode, context: &str) -> KddResult<EnrichmentResult> {
        let user_prompt = enrichment_user_prompt(context);

        let mut last_err = None;
        for attempt in 0..=self.max_retries {
            let raw = match self.call_once(&user_prompt).await {
                Ok(r) => r,
                Err(e) => {
                    last_err = Some(e);
                    continue;
                }
            };

            let Some(json_str) = extract_json_object(&raw) else {
                last_err = Some(KddError::new(ErrorCode::AgentError, "no JSON object found in agent response"));
                continue;
            };

            match serde_json::from_str::<EnrichmentPayload>(json_str) {
                Ok(payload) => {
                    return Ok(EnrichmentResult {
                        summary: payload.summary,
                        implicit_relations: payload
                            .implicit_relations
                            .into_iter()
                            .map(|r| ImplicitRelation {
                                target_node: r.target,
                                relation: r.relation_type,
                                confidence: r.confidence,
                            })
                            .collect(),
                    });
                }
                Err(e) => {
                    last_err = Some(KddError::new(ErrorCode::AgentError, format!("malformed enrichment JSON on attempt {attempt}: {e}")));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| KddError::new(ErrorCode::AgentError, "enrichment failed with no captured error")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_json_object_from_prose_wrapped_response() {
        let raw = "Sure, here you go:\n```json\n{\"summary\": \"x\", \"implicit_relations\": []}\n```\nHope that helps!";
        let extracted = extract_json_object(raw).unwrap();
        let payload: EnrichmentPayload = serde_json::from_str(extracted).unwrap();
        assert_eq!(payload.summary, "x");
    }

    #[test]
    fn missing_confidence_defaults_to_point_six() {
        let raw = r#"{"summary": "s", "implicit_relations": [{"target": "Entity:Customer", "type": "references"}]}"#;
        let payload: EnrichmentPayload = serde_json::from_str(raw).unwrap();
        assert_eq!(payload.implicit_relations[0].confidence, 0.6);
    }

    #[tokio::test]
    async fn surfaces_agent_error_on_unreachable_endpoint() {
        let client = AnthropicAgentClient::new(Some("test-key".to_string())).with_endpoint("http://127.0.0.1:0/unreachable");
        let node = GraphNode {
            id: "Entity:Order".to_string(),
            kind: kdd_core::KDDKind::Entity,
            source_file: "x.md".to_string(),
            source_hash: "h".to_string(),
            layer: kdd_core::KDDLayer::Domain,
            status: "draft".to_string(),
            aliases: Vec::new(),
            domain: None,
            indexed_fields: std::collections::HashMap::new(),
            indexed_at: None,
        };
        let result = client.enrich(&node, "context").await;
        assert!(result.is_err());
    }
}
