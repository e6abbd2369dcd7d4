use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::console::{GeoLocation, GroundingLink, GroundingSource};
use shared::settings::ConsoleSettings;
use std::env;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::modes::{ModeConfig, ModeRegistry, ToolConfiguration};
use crate::{ProviderKind, ProviderOutcome, ProviderReply, ProviderRequest, ResponseProvider};

/// Substituted when the endpoint answers successfully with no text.
pub const EMPTY_RESPONSE_TEXT: &str = "SYSTEM_STASIS: NO DATA RETURNED";

const DEFAULT_FAILURE_DETAIL: &str = "Logic cycle interrupted";

pub fn recovery_text(detail: &str) -> String {
    let detail = detail.trim();
    let detail = if detail.is_empty() {
        DEFAULT_FAILURE_DETAIL
    } else {
        detail
    };
    format!(
        "CORE_RECOVERY: {}. Re-initializing architectural sync...",
        detail
    )
}

// ── Request types ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            thought: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub thinking_budget: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub thinking_config: ThinkingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Tool {
    GoogleSearch {},
    GoogleMaps {},
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalConfig {
    pub lat_lng: GeoLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfig {
    pub retrieval_config: RetrievalConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub system_instruction: Content,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<ToolConfig>,
}

impl GenerateContentRequest {
    pub fn from_config(prompt: &str, config: &ModeConfig) -> Self {
        let mut req = Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part::text(prompt)],
            }],
            system_instruction: Content {
                role: None,
                parts: vec![Part::text(config.system_prompt.clone())],
            },
            generation_config: None,
            tools: Vec::new(),
            tool_config: None,
        };
        match &config.tools {
            ToolConfiguration::Reasoning { thinking_budget } => {
                req.generation_config = Some(GenerationConfig {
                    thinking_config: ThinkingConfig {
                        thinking_budget: *thinking_budget,
                    },
                });
            }
            ToolConfiguration::WebSearch => req.tools.push(Tool::GoogleSearch {}),
            ToolConfiguration::Maps { location } => {
                req.tools.push(Tool::GoogleMaps {});
                req.tool_config = location.map(|lat_lng| ToolConfig {
                    retrieval_config: RetrievalConfig { lat_lng },
                });
            }
        }
        req
    }
}

// ── Response types ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkSource {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroundingChunk {
    #[serde(default)]
    pub web: Option<ChunkSource>,
    #[serde(default)]
    pub maps: Option<ChunkSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, thought parts excluded.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter(|p| !p.thought.unwrap_or(false))
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    /// Grounding citations of the first candidate. Chunks carrying neither a
    /// web nor a maps source are skipped.
    pub fn grounding_links(&self) -> Vec<GroundingLink> {
        let chunks = self
            .candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|m| m.grounding_chunks.as_slice())
            .unwrap_or_default();

        chunks
            .iter()
            .filter_map(|chunk| {
                let (source, kind) = if let Some(web) = &chunk.web {
                    (web, GroundingSource::Search)
                } else if let Some(maps) = &chunk.maps {
                    (maps, GroundingSource::Maps)
                } else {
                    return None;
                };
                Some(GroundingLink::new(
                    source.uri.clone().unwrap_or_default(),
                    source.title.clone().unwrap_or_default(),
                    Some(kind),
                ))
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

// ── Transport ────────────────────────────────────────────────────────

/// Carries one generate-content call to the remote endpoint.
#[async_trait]
pub trait ContentTransport: Send + Sync {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse>;
}

/// HTTPS transport for the Generative Language API.
///
/// The client and credential are rebuilt on every call so a rotated key is
/// picked up without restarting the console. A missing key is sent as an
/// empty string and left for the endpoint to reject.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    api_key_env: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, api_key_env: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key_env: api_key_env.into(),
            timeout,
        }
    }

    pub fn from_settings(settings: &ConsoleSettings) -> Self {
        Self::new(
            settings.api_base_url.clone(),
            settings.api_key_env.clone(),
            Duration::from_secs(settings.request_timeout_secs),
        )
    }

    pub fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl ContentTransport for HttpTransport {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let api_key = env::var(&self.api_key_env).unwrap_or_default();
        let http = Client::builder().timeout(self.timeout).build()?;

        let resp = http
            .post(self.endpoint(model))
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(&body) {
                if !parsed.error.message.trim().is_empty() {
                    return Err(anyhow!("{}", parsed.error.message.trim()));
                }
            }
            return Err(anyhow!("gemini error: {}", status));
        }

        let body: GenerateContentResponse = resp.json().await?;
        Ok(body)
    }
}

// ── Provider ─────────────────────────────────────────────────────────

/// Live provider backed by the remote generation endpoint.
pub struct LiveProvider<T = HttpTransport> {
    registry: ModeRegistry,
    transport: T,
}

impl LiveProvider<HttpTransport> {
    pub fn from_settings(settings: &ConsoleSettings) -> Self {
        Self::new(
            ModeRegistry::with_models(settings.models.clone()),
            HttpTransport::from_settings(settings),
        )
    }
}

impl<T: ContentTransport> LiveProvider<T> {
    pub fn new(registry: ModeRegistry, transport: T) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// Resolve the mode and assemble the wire request. Returns the model id
    /// alongside the body.
    pub fn build_request(&self, request: &ProviderRequest) -> (String, GenerateContentRequest) {
        let config = self.registry.resolve(request.mode, request.location);
        let body = GenerateContentRequest::from_config(&request.prompt, &config);
        (config.model, body)
    }
}

#[async_trait]
impl<T: ContentTransport> ResponseProvider for LiveProvider<T> {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Live
    }

    async fn execute(&self, request: &ProviderRequest) -> ProviderOutcome {
        let (model, body) = self.build_request(request);
        debug!(model = %model, mode = %request.mode, tools = body.tools.len(), "dispatching generate-content");

        match self.transport.generate_content(&model, &body).await {
            Ok(response) => {
                let mut text = response.text();
                if text.is_empty() {
                    text = EMPTY_RESPONSE_TEXT.to_string();
                }
                let links = response.grounding_links();
                info!(model = %model, links = links.len(), "generate-content returned");
                ProviderOutcome::Delivered(ProviderReply { text, links })
            }
            Err(e) => {
                error!(model = %model, error = %e, "generate-content failed");
                ProviderOutcome::Degraded(ProviderReply {
                    text: recovery_text(&e.to_string()),
                    links: Vec::new(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use shared::console::OperationMode;

    /// Transport returning a canned result and remembering what it was sent.
    struct ScriptedTransport {
        result: Mutex<Option<Result<GenerateContentResponse>>>,
        seen: Mutex<Vec<(String, serde_json::Value)>>,
    }

    impl ScriptedTransport {
        fn ok(body: serde_json::Value) -> Self {
            Self {
                result: Mutex::new(Some(Ok(serde_json::from_value(body).unwrap()))),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                result: Mutex::new(Some(Err(anyhow!("{}", message)))),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ContentTransport for ScriptedTransport {
        async fn generate_content(
            &self,
            model: &str,
            request: &GenerateContentRequest,
        ) -> Result<GenerateContentResponse> {
            self.seen
                .lock()
                .push((model.to_string(), serde_json::to_value(request).unwrap()));
            self.result
                .lock()
                .take()
                .unwrap_or_else(|| Err(anyhow!("script exhausted")))
        }
    }

    fn provider(transport: ScriptedTransport) -> LiveProvider<ScriptedTransport> {
        LiveProvider::new(ModeRegistry::new(), transport)
    }

    #[test]
    fn test_reasoning_request_shape() {
        let p = provider(ScriptedTransport::failing("unused"));
        let (model, body) =
            p.build_request(&ProviderRequest::new("design a mesh", OperationMode::ArchitecturalModeling));
        assert_eq!(model, "gemini-3-pro-preview");

        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["contents"][0]["role"], "user");
        assert_eq!(v["contents"][0]["parts"][0]["text"], "design a mesh");
        assert_eq!(
            v["generationConfig"]["thinkingConfig"]["thinkingBudget"],
            32768
        );
        assert!(v["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .ends_with("Design robust, hypothetical frameworks."));
        assert!(v.get("tools").is_none());
        assert!(v.get("toolConfig").is_none());
    }

    #[test]
    fn test_search_request_shape() {
        let p = provider(ScriptedTransport::failing("unused"));
        let (_, body) = p.build_request(
            &ProviderRequest::new("trends", OperationMode::DataSynthesis)
                .with_location(Some(GeoLocation::new(1.0, 2.0))),
        );
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["tools"], json!([{ "googleSearch": {} }]));
        assert!(v.get("toolConfig").is_none());
        assert!(v.get("generationConfig").is_none());
    }

    #[test]
    fn test_maps_request_carries_location_only_when_given() {
        let p = provider(ScriptedTransport::failing("unused"));

        let (model, body) = p.build_request(
            &ProviderRequest::new("grid", OperationMode::SpatialAnalysis)
                .with_location(Some(GeoLocation::new(37.42, -122.08))),
        );
        assert_eq!(model, "gemini-2.5-flash");
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["tools"], json!([{ "googleMaps": {} }]));
        assert_eq!(
            v["toolConfig"]["retrievalConfig"]["latLng"],
            json!({ "latitude": 37.42, "longitude": -122.08 })
        );

        let (_, body) = p.build_request(&ProviderRequest::new("grid", OperationMode::SpatialAnalysis));
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["tools"], json!([{ "googleMaps": {} }]));
        assert!(v.get("toolConfig").is_none());
    }

    #[tokio::test]
    async fn test_extracts_text_and_links() {
        let transport = ScriptedTransport::ok(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [
                    { "text": "internal musing", "thought": true },
                    { "text": "Result " },
                    { "text": "ready." }
                ]},
                "groundingMetadata": { "groundingChunks": [
                    { "web": { "uri": "https://a.example", "title": "A" } },
                    { "maps": { "uri": "https://maps.example/x", "title": "X" } },
                    { "retrievedContext": { "uri": "ignored" } },
                    { "web": { "uri": "https://b.example" } }
                ]}
            }]
        }));
        let outcome = provider(transport)
            .execute(&ProviderRequest::new("q", OperationMode::DataSynthesis))
            .await;

        assert!(!outcome.is_degraded());
        let reply = outcome.into_reply();
        assert_eq!(reply.text, "Result ready.");
        assert_eq!(
            reply.links,
            vec![
                GroundingLink::new("https://a.example", "A", Some(GroundingSource::Search)),
                GroundingLink::new("https://maps.example/x", "X", Some(GroundingSource::Maps)),
                GroundingLink::new("https://b.example", "", Some(GroundingSource::Search)),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_text_gets_placeholder() {
        let transport = ScriptedTransport::ok(json!({ "candidates": [] }));
        let reply = provider(transport)
            .execute(&ProviderRequest::new("q", OperationMode::ArchitecturalModeling))
            .await
            .into_reply();
        assert_eq!(reply.text, EMPTY_RESPONSE_TEXT);
        assert!(reply.links.is_empty());
    }

    #[tokio::test]
    async fn test_failure_resolves_to_recovery_message() {
        let transport = ScriptedTransport::failing("quota exhausted");
        let outcome = provider(transport)
            .execute(&ProviderRequest::new("q", OperationMode::SpatialAnalysis))
            .await;

        assert!(outcome.is_degraded());
        let reply = outcome.into_reply();
        assert_eq!(
            reply.text,
            "CORE_RECOVERY: quota exhausted. Re-initializing architectural sync..."
        );
        assert!(reply.links.is_empty());
    }

    #[tokio::test]
    async fn test_transport_sees_resolved_model() {
        let transport = ScriptedTransport::ok(json!({}));
        let p = provider(transport);
        p.execute(&ProviderRequest::new("q", OperationMode::DataSynthesis))
            .await;
        let seen = p.transport.seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "gemini-3-flash-preview");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_fail_soft() {
        // Port 1 on loopback refuses connections immediately.
        let transport = HttpTransport::new(
            "http://127.0.0.1:1",
            "ARISE_TEST_KEY_THAT_IS_NOT_SET",
            Duration::from_secs(5),
        );
        let p = LiveProvider::new(ModeRegistry::new(), transport);
        let outcome = p
            .execute(&ProviderRequest::new("q", OperationMode::DataSynthesis))
            .await;
        assert!(outcome.is_degraded());
        let reply = outcome.into_reply();
        assert!(reply.text.starts_with("CORE_RECOVERY: "));
        assert!(reply.text.ends_with(". Re-initializing architectural sync..."));
        assert!(reply.links.is_empty());
    }

    #[test]
    fn test_recovery_text_default_detail() {
        assert_eq!(
            recovery_text("  "),
            "CORE_RECOVERY: Logic cycle interrupted. Re-initializing architectural sync..."
        );
    }

    #[test]
    fn test_endpoint_format() {
        let t = HttpTransport::new("https://example.test/", "KEY", Duration::from_secs(1));
        assert_eq!(
            t.endpoint("gemini-2.5-flash"),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
