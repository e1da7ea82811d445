//! LLM service client
//!
//! HTTP client for the text/alias generation service. The service is
//! treated as unreliable: every call is timeout-wrapped, transient
//! failures are retried once with jittered backoff, and every call site
//! defines a fallback. Answer generation additionally carries a hard
//! ceiling, since complex answers can be slow.

use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::alias::{alias_prompt, AliasResponse, AliasSource};
use crate::content::types::NodeType;
use crate::errors::{CoachError, Result};

/// Connection settings for the LLM service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    /// Credential for the service; absent means alias generation runs
    /// fallback-only and answering is unavailable
    pub api_key: Option<String>,
    /// Per-call timeout for alias and other short calls
    pub request_timeout_secs: u64,
    /// Hard ceiling for answer generation
    pub answer_ceiling_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:11434".to_string(),
            model: "qwen2.5:7b-instruct".to_string(),
            api_key: None,
            request_timeout_secs: 20,
            answer_ceiling_secs: 90,
        }
    }
}

/// Generation tuning passed per call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 1024,
        }
    }
}

/// Generated answer text with the model's self-reported confidence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedAnswer {
    pub text: String,
    pub confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Shape the answer prompt asks for; parse failure falls back to
/// treating the whole response as plain answer text.
#[derive(Debug, Deserialize)]
struct StructuredAnswer {
    answer: String,
    confidence: Option<f64>,
}

/// HTTP client for the generation service
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.answer_ceiling_secs.max(1)))
            .build()
            .map_err(CoachError::HttpError)?;
        Ok(Self { client, config })
    }

    /// Whether a credential is configured. Callers without one must use
    /// their local fallback instead of calling.
    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Generate answer text for a question, constrained by `context`.
    ///
    /// Wrapped in the hard ceiling; one retry with jittered backoff on
    /// transient failure.
    pub async fn generate(
        &self,
        prompt: &str,
        context: &str,
        options: &GenerationOptions,
    ) -> Result<GeneratedAnswer> {
        let full_prompt = format!(
            "{prompt}\n\nCourse material:\n{context}\n\n\
             Respond with JSON: {{\"answer\": \"...\", \"confidence\": 0.0}}",
        );
        let ceiling = Duration::from_secs(self.config.answer_ceiling_secs);
        let raw = self.call_with_retry(&full_prompt, options, ceiling).await?;

        // Structured shape preferred; plain text accepted
        match serde_json::from_str::<StructuredAnswer>(raw.trim()) {
            Ok(parsed) => Ok(GeneratedAnswer {
                text: parsed.answer,
                confidence: parsed.confidence,
            }),
            Err(_) => Ok(GeneratedAnswer {
                text: raw,
                confidence: None,
            }),
        }
    }

    /// One structured-output call returning raw response text. The
    /// caller owns schema validation and its fallback.
    pub async fn generate_structured(&self, prompt: &str) -> Result<String> {
        let timeout = Duration::from_secs(self.config.request_timeout_secs);
        self.call_with_retry(prompt, &GenerationOptions::default(), timeout)
            .await
    }

    async fn call_with_retry(
        &self,
        prompt: &str,
        options: &GenerationOptions,
        timeout: Duration,
    ) -> Result<String> {
        match self.call_once(prompt, options, timeout).await {
            Ok(text) => Ok(text),
            Err(first_err) => {
                let jitter = rand::thread_rng().gen_range(0..250);
                tokio::time::sleep(Duration::from_millis(250 + jitter)).await;
                self.call_once(prompt, options, timeout)
                    .await
                    .map_err(|_| first_err)
            }
        }
    }

    async fn call_once(
        &self,
        prompt: &str,
        options: &GenerationOptions,
        timeout: Duration,
    ) -> Result<String> {
        let url = format!("{}/api/generate", self.config.base_url);
        let mut request = self.client.post(&url).json(&json!({
            "model": self.config.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": options.temperature,
                "num_predict": options.max_tokens,
            },
        }));
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = tokio::time::timeout(timeout, request.send())
            .await
            .map_err(|_| CoachError::Timeout {
                duration_ms: timeout.as_millis() as u64,
            })?
            .map_err(CoachError::HttpError)?;

        if !response.status().is_success() {
            return Err(CoachError::LlmError(format!(
                "service returned {}",
                response.status()
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| CoachError::LlmError(format!("malformed response: {}", e)))?;
        Ok(body.response)
    }
}

#[async_trait]
impl AliasSource for LlmClient {
    async fn same_concept_aliases(
        &self,
        primary_topic: &str,
        short_definition: &str,
        node_type: NodeType,
    ) -> anyhow::Result<Vec<String>> {
        let prompt = alias_prompt(primary_topic, short_definition, node_type);
        let raw = self.generate_structured(&prompt).await?;

        // Strict schema: anything else is a parse error and the caller
        // degrades to its fallback.
        let parsed: AliasResponse = serde_json::from_str(raw.trim())?;
        Ok(parsed.aliases)
    }
}
