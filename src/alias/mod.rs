//! Alias & keyword extraction
//!
//! Derives same-concept aliases for a node's primary topic. The LLM path
//! is optional; every failure (missing credentials, timeout, malformed
//! JSON, empty output) degrades to the deterministic local fallback and
//! never raises an error to the caller.

pub mod cache;

pub use cache::{AliasCache, MemoryAliasCache};

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::content::types::NodeType;

/// Maximum aliases kept per topic, primary topic included
pub const MAX_ALIASES: usize = 8;

/// Seam to the external model for semantic alias generation
#[async_trait]
pub trait AliasSource: Send + Sync {
    /// Ask for same-concept aliases only. Broader, narrower, or
    /// related-but-different concepts are forbidden by the prompt;
    /// post-validation enforces shape.
    async fn same_concept_aliases(
        &self,
        primary_topic: &str,
        short_definition: &str,
        node_type: NodeType,
    ) -> anyhow::Result<Vec<String>>;
}

/// Strict response schema for the structured LLM call. Anything that
/// does not parse into this shape is a single documented failure mode:
/// parse error, degrade to fallback.
#[derive(Debug, Deserialize)]
pub struct AliasResponse {
    pub aliases: Vec<String>,
}

/// Generates and caches alias sets for primary topics
pub struct AliasExtractor {
    cache: Arc<dyn AliasCache>,
    source: Option<Arc<dyn AliasSource>>,
}

impl AliasExtractor {
    /// Fallback-only extractor (no LLM credentials configured)
    pub fn offline() -> Self {
        Self {
            cache: Arc::new(MemoryAliasCache::new()),
            source: None,
        }
    }

    pub fn new(cache: Arc<dyn AliasCache>, source: Option<Arc<dyn AliasSource>>) -> Self {
        Self { cache, source }
    }

    /// Produce the ordered alias set for a topic.
    ///
    /// The normalized primary topic is always the first element; the set
    /// is deduplicated and capped at [`MAX_ALIASES`].
    pub async fn generate_aliases(
        &self,
        primary_topic: &str,
        short_definition: &str,
        node_type: NodeType,
    ) -> Vec<String> {
        let normalized_topic = normalize_phrase(primary_topic);
        if normalized_topic.is_empty() {
            return Vec::new();
        }

        let key = cache_key(&normalized_topic, short_definition);
        if let Some(cached) = self.cache.get(&key) {
            return cached;
        }

        let candidates = match &self.source {
            Some(source) => source
                .same_concept_aliases(primary_topic, short_definition, node_type)
                .await
                .unwrap_or_default(),
            None => Vec::new(),
        };

        let aliases = if candidates.is_empty() {
            fallback_aliases(&normalized_topic)
        } else {
            assemble(&normalized_topic, candidates)
        };

        self.cache.set(&key, aliases.clone());
        aliases
    }

    pub fn cache(&self) -> &Arc<dyn AliasCache> {
        &self.cache
    }
}

/// Cache key: normalized topic plus the first 100 chars of the definition
fn cache_key(normalized_topic: &str, definition: &str) -> String {
    let prefix: String = definition.chars().take(100).collect();
    format!("{}|{}", normalized_topic, prefix.to_lowercase())
}

/// Lowercase and strip punctuation, keeping hyphens and inner spaces
pub fn normalize_phrase(phrase: &str) -> String {
    let lowered = phrase.to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-')
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Deterministic fallback: the topic itself, plus a derived acronym when
/// the topic has 2-5 words and the acronym lands at 2-5 characters.
pub fn fallback_aliases(normalized_topic: &str) -> Vec<String> {
    let mut aliases = vec![normalized_topic.to_string()];

    let words: Vec<&str> = normalized_topic.split_whitespace().collect();
    if (2..=5).contains(&words.len()) {
        let acronym: String = words.iter().filter_map(|w| w.chars().next()).collect();
        if (2..=5).contains(&acronym.len()) && acronym != *normalized_topic {
            aliases.push(acronym);
        }
    }

    aliases
}

/// Validate model candidates and assemble the final ordered set
fn assemble(normalized_topic: &str, candidates: Vec<String>) -> Vec<String> {
    let mut aliases = vec![normalized_topic.to_string()];

    for candidate in candidates {
        if aliases.len() >= MAX_ALIASES {
            break;
        }
        let normalized = normalize_phrase(&candidate);
        if !(2..=50).contains(&normalized.len()) {
            continue;
        }
        if normalized == normalized_topic {
            continue;
        }
        if !normalized
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == ' ')
        {
            continue;
        }
        if aliases.contains(&normalized) {
            continue;
        }
        aliases.push(normalized);
    }

    aliases
}

/// Prompt sent on the LLM path, constraining output to same-concept
/// aliases in the strict `{"aliases": [...]}` shape.
pub fn alias_prompt(primary_topic: &str, short_definition: &str, node_type: NodeType) -> String {
    format!(
        "List alternative names for the concept \"{topic}\".\n\
         Definition context: {definition}\n\
         Unit kind: {kind:?}\n\
         Rules:\n\
         - Only names that mean EXACTLY the same concept.\n\
         - Never broader concepts, narrower concepts, or related-but-different concepts.\n\
         - Lowercase, at most {max} entries.\n\
         Respond with JSON only: {{\"aliases\": [\"...\"]}}",
        topic = primary_topic,
        definition = short_definition,
        kind = node_type,
        max = MAX_ALIASES - 1,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticSource(Vec<String>);

    #[async_trait]
    impl AliasSource for StaticSource {
        async fn same_concept_aliases(
            &self,
            _primary_topic: &str,
            _short_definition: &str,
            _node_type: NodeType,
        ) -> anyhow::Result<Vec<String>> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl AliasSource for FailingSource {
        async fn same_concept_aliases(
            &self,
            _primary_topic: &str,
            _short_definition: &str,
            _node_type: NodeType,
        ) -> anyhow::Result<Vec<String>> {
            anyhow::bail!("model unavailable")
        }
    }

    #[test]
    fn test_normalize_phrase() {
        assert_eq!(normalize_phrase("Canonical Tag!"), "canonical tag");
        assert_eq!(normalize_phrase("  Self-Referencing  URL "), "self-referencing url");
    }

    #[test]
    fn test_fallback_includes_acronym() {
        let aliases = fallback_aliases("search engine optimization");
        assert_eq!(aliases[0], "search engine optimization");
        assert!(aliases.contains(&"seo".to_string()));
    }

    #[test]
    fn test_fallback_single_word_no_acronym() {
        let aliases = fallback_aliases("crawling");
        assert_eq!(aliases, vec!["crawling".to_string()]);
    }

    #[test]
    fn test_fallback_long_topic_no_acronym() {
        // Six words: outside the 2-5 word window
        let aliases = fallback_aliases("a very long topic name indeed");
        assert_eq!(aliases.len(), 1);
    }

    #[tokio::test]
    async fn test_offline_extractor_uses_fallback() {
        let extractor = AliasExtractor::offline();
        let aliases = extractor
            .generate_aliases("Technical SEO", "site-level optimization", NodeType::Concept)
            .await;
        assert_eq!(aliases[0], "technical seo");
    }

    #[tokio::test]
    async fn test_topic_always_first_on_llm_path() {
        let source = Arc::new(StaticSource(vec![
            "canonical url".to_string(),
            "rel canonical".to_string(),
        ]));
        let extractor =
            AliasExtractor::new(Arc::new(MemoryAliasCache::new()), Some(source));
        let aliases = extractor
            .generate_aliases("Canonical Tag", "preferred URL signal", NodeType::Definition)
            .await;
        assert_eq!(aliases[0], "canonical tag");
        assert!(aliases.contains(&"canonical url".to_string()));
    }

    #[tokio::test]
    async fn test_candidates_validated_and_capped() {
        let mut noisy: Vec<String> = (0..20).map(|i| format!("alias number {}", i)).collect();
        noisy.push("X".to_string()); // too short after normalization
        noisy.push("Canonical Tag".to_string()); // equals the topic
        let extractor = AliasExtractor::new(
            Arc::new(MemoryAliasCache::new()),
            Some(Arc::new(StaticSource(noisy))),
        );
        let aliases = extractor
            .generate_aliases("Canonical Tag", "", NodeType::Definition)
            .await;
        assert!(aliases.len() <= MAX_ALIASES);
        assert_eq!(aliases[0], "canonical tag");
        assert_eq!(aliases.iter().filter(|a| *a == "canonical tag").count(), 1);
    }

    #[tokio::test]
    async fn test_source_failure_degrades_to_fallback() {
        let extractor = AliasExtractor::new(
            Arc::new(MemoryAliasCache::new()),
            Some(Arc::new(FailingSource)),
        );
        let aliases = extractor
            .generate_aliases("Core Web Vitals", "performance metrics", NodeType::Concept)
            .await;
        assert_eq!(aliases[0], "core web vitals");
        assert!(aliases.contains(&"cwv".to_string()));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_source() {
        let cache = Arc::new(MemoryAliasCache::new());
        cache.set(
            "canonical tag|preferred url signal",
            vec!["canonical tag".to_string(), "seeded".to_string()],
        );
        let extractor = AliasExtractor::new(cache, Some(Arc::new(FailingSource)));
        let aliases = extractor
            .generate_aliases("Canonical Tag", "preferred URL signal", NodeType::Definition)
            .await;
        assert!(aliases.contains(&"seeded".to_string()));
    }

    #[test]
    fn test_alias_response_schema_strict() {
        let ok: Result<AliasResponse, _> =
            serde_json::from_str(r#"{"aliases": ["a", "b"]}"#);
        assert!(ok.is_ok());
        let bad: Result<AliasResponse, _> =
            serde_json::from_str(r#"{"synonyms": ["a"]}"#);
        assert!(bad.is_err());
    }
}
