//! Content atomizer
//!
//! Splits raw course documents into atomic, uniquely addressable nodes.
//! Segmentation is blank-line based with a single-newline fallback;
//! classification uses ordered pattern checks; oversized segments are
//! re-split at sentence boundaries.

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

use crate::content::canonical;
use crate::content::types::{ContainerType, ContentNode, CoverageLevel, NodeType};
use crate::errors::{CoachError, Result};

/// Atomizer tuning parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtomizerConfig {
    /// Segments shorter than this are dropped unless heading/list-like
    pub min_segment_chars: usize,
    /// Segments longer than this are re-split at sentence boundaries
    pub max_words_per_node: usize,
    /// Cap on extracted keywords per node
    pub max_keywords: usize,
}

impl Default for AtomizerConfig {
    fn default() -> Self {
        Self {
            min_segment_chars: 25,
            max_words_per_node: 300,
            max_keywords: 10,
        }
    }
}

/// Metadata describing the source document being atomized
#[derive(Debug, Clone)]
pub struct DocumentMeta {
    pub course_id: String,
    pub day: u32,
    pub container_type: ContainerType,
    pub container_seq: u32,
    pub container_id: String,
    pub title: String,
}

fn step_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^step\s+(\d+)\b|^(\d+)[.)]\s+\S").unwrap())
}

fn definition_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^definition[:\s]|^[A-Z][\w\s-]{1,60}\s+(is|are|refers to|means)\s")
            .unwrap()
    })
}

fn example_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(example[:\s]|for example|e\.g\.)").unwrap())
}

fn procedure_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(procedure[:\s]|to\s+\w+.*,|how to\s)").unwrap())
}

fn list_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*[-*•]\s+").unwrap())
}

fn heading_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#{1,6}\s+\S|^[A-Z][A-Za-z0-9 /&-]{2,70}$").unwrap())
}

fn bold_term_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*([^*]{2,60})\*\*").unwrap())
}

fn capitalized_phrase_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([A-Z][a-z]+(?:\s+[A-Z][a-z]+){1,3})\b").unwrap())
}

/// Splits documents into classified, addressable content nodes
pub struct Atomizer {
    config: AtomizerConfig,
}

impl Atomizer {
    pub fn new() -> Self {
        Self::with_config(AtomizerConfig::default())
    }

    pub fn with_config(config: AtomizerConfig) -> Self {
        Self { config }
    }

    /// Atomize a raw document into content nodes.
    ///
    /// Nodes carry everything except alias sets, which the ingestion
    /// pipeline fills in afterwards (alias generation may call out to
    /// the LLM service).
    pub fn atomize(&self, text: &str, meta: &DocumentMeta) -> Result<Vec<ContentNode>> {
        let segments = self.split_segments(text);

        let mut classified: Vec<(NodeType, String)> = Vec::new();
        for segment in segments {
            let trimmed = segment.trim();
            if trimmed.is_empty() {
                continue;
            }
            let node_type = classify_segment(trimmed);
            let keep = trimmed.len() >= self.config.min_segment_chars
                || matches!(node_type, NodeType::Heading | NodeType::ListItem);
            if !keep {
                continue;
            }

            if word_count(trimmed) > self.config.max_words_per_node {
                for piece in split_at_sentences(trimmed, self.config.max_words_per_node) {
                    classified.push((node_type, piece));
                }
            } else {
                classified.push((node_type, trimmed.to_string()));
            }
        }

        if classified.is_empty() {
            return Err(CoachError::EmptyAtomization(meta.container_id.clone()));
        }

        let doc_heading = classified
            .iter()
            .find(|(t, _)| *t == NodeType::Heading)
            .map(|(_, text)| strip_heading_markers(text));

        let mut nodes = Vec::with_capacity(classified.len());
        for (idx, (node_type, text)) in classified.into_iter().enumerate() {
            let sequence = (idx + 1) as u32;
            let canonical_ref = canonical::allocate(
                meta.day,
                meta.container_type,
                meta.container_seq,
                node_type,
                sequence,
            )?;

            let primary_topic = node_topic(&text, node_type)
                .or_else(|| doc_heading.clone())
                .unwrap_or_else(|| meta.title.clone());
            let keywords = self.extract_keywords(&text);
            let completeness = completeness_score(&text, node_type);
            let coverage_level = coverage_level(&text, &meta.title, completeness);
            let dedicated_topic = is_dedicated_topic(&meta.title, &primary_topic);
            let step_number = match node_type {
                NodeType::Step => parse_step_number(&text),
                _ => None,
            };

            nodes.push(ContentNode {
                course_id: meta.course_id.clone(),
                canonical_ref,
                node_type,
                day: meta.day,
                container_type: meta.container_type,
                container_id: meta.container_id.clone(),
                container_title: meta.title.clone(),
                sequence,
                content_hash: content_hash(&text),
                text,
                version: 1,
                valid: true,
                primary_topic: Some(primary_topic),
                aliases: None,
                keywords: if keywords.is_empty() {
                    None
                } else {
                    Some(keywords)
                },
                coverage_level,
                completeness,
                dedicated_topic,
                step_number,
            });
        }

        Ok(nodes)
    }

    /// Blank-line segmentation with a single-newline fallback
    fn split_segments(&self, text: &str) -> Vec<String> {
        let normalized = text.replace("\r\n", "\n");
        let has_blank_lines = normalized
            .split('\n')
            .any(|line| line.trim().is_empty());

        if has_blank_lines {
            normalized
                .split("\n\n")
                .flat_map(|block| {
                    // A block may still mix a list with prose; keep list
                    // items as their own segments.
                    split_block(block)
                })
                .collect()
        } else {
            normalized.split('\n').map(|s| s.to_string()).collect()
        }
    }

    /// Derive up to `max_keywords` salient terms for a node
    fn extract_keywords(&self, text: &str) -> Vec<String> {
        let mut keywords: Vec<String> = Vec::new();

        for cap in bold_term_re().captures_iter(text) {
            push_keyword(&mut keywords, &cap[1]);
        }

        if list_marker_re().is_match(text) {
            let lead = list_marker_re().replace(text, "");
            let lead_phrase = lead
                .split(|c| c == ':' || c == '.' || c == ',')
                .next()
                .unwrap_or("")
                .trim();
            if !lead_phrase.is_empty() && word_count(lead_phrase) <= 6 {
                push_keyword(&mut keywords, lead_phrase);
            }
        }

        for cap in capitalized_phrase_re().captures_iter(text) {
            push_keyword(&mut keywords, &cap[1]);
        }

        keywords.truncate(self.config.max_keywords);
        keywords
    }
}

impl Default for Atomizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Ordered classification: step > definition > example > procedure >
/// list marker > heading > concept.
pub fn classify_segment(segment: &str) -> NodeType {
    if step_prefix_re().is_match(segment) {
        NodeType::Step
    } else if definition_prefix_re().is_match(segment) {
        NodeType::Definition
    } else if example_prefix_re().is_match(segment) {
        NodeType::Example
    } else if procedure_prefix_re().is_match(segment) {
        NodeType::Procedure
    } else if list_marker_re().is_match(segment) {
        NodeType::ListItem
    } else if is_heading(segment) {
        NodeType::Heading
    } else {
        NodeType::Concept
    }
}

fn is_heading(segment: &str) -> bool {
    if segment.contains('\n') {
        return false;
    }
    heading_marker_re().is_match(segment) && word_count(segment) <= 12 && !segment.ends_with('.')
}

fn split_block(block: &str) -> Vec<String> {
    let lines: Vec<&str> = block.lines().collect();
    let has_list_lines = lines.iter().any(|l| list_marker_re().is_match(l));
    if !has_list_lines {
        return vec![block.to_string()];
    }

    let mut segments = Vec::new();
    let mut prose = String::new();
    for line in lines {
        if list_marker_re().is_match(line) {
            if !prose.trim().is_empty() {
                segments.push(prose.trim().to_string());
            }
            prose.clear();
            segments.push(line.to_string());
        } else {
            if !prose.is_empty() {
                prose.push('\n');
            }
            prose.push_str(line);
        }
    }
    if !prose.trim().is_empty() {
        segments.push(prose.trim().to_string());
    }
    segments
}

/// Re-split an oversized segment at sentence boundaries, each piece
/// staying under `max_words`.
fn split_at_sentences(text: &str, max_words: usize) -> Vec<String> {
    static SENTENCE_RE: OnceLock<Regex> = OnceLock::new();
    let re = SENTENCE_RE.get_or_init(|| Regex::new(r"[^.!?]+[.!?]+\s*|[^.!?]+$").unwrap());

    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_words = 0;

    for m in re.find_iter(text) {
        let sentence = m.as_str();
        let words = word_count(sentence);
        if current_words + words > max_words && !current.is_empty() {
            pieces.push(current.trim().to_string());
            current.clear();
            current_words = 0;
        }
        current.push_str(sentence);
        current_words += words;
    }
    if !current.trim().is_empty() {
        pieces.push(current.trim().to_string());
    }
    pieces
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// SHA-256 hex digest of the raw text
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn strip_heading_markers(text: &str) -> String {
    text.trim_start_matches('#').trim().to_string()
}

/// Topic from the node's own leading heading line, if it has one
fn node_topic(text: &str, node_type: NodeType) -> Option<String> {
    if node_type == NodeType::Heading {
        return Some(strip_heading_markers(text));
    }
    let first_line = text.lines().next()?;
    if first_line.starts_with('#') {
        Some(strip_heading_markers(first_line))
    } else {
        None
    }
}

fn push_keyword(keywords: &mut Vec<String>, candidate: &str) {
    let normalized = candidate.trim().to_lowercase();
    if normalized.len() >= 2 && !keywords.contains(&normalized) {
        keywords.push(normalized);
    }
}

fn parse_step_number(text: &str) -> Option<u32> {
    let caps = step_prefix_re().captures(text)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .and_then(|m| m.as_str().parse().ok())
}

/// Thoroughness heuristic in [0, 1]: grows with length, boosted by
/// structural richness (steps, examples, bolded terms).
fn completeness_score(text: &str, node_type: NodeType) -> f64 {
    let words = word_count(text) as f64;
    let mut score = (words / 150.0).min(0.7);
    if matches!(node_type, NodeType::Step | NodeType::Procedure) {
        score += 0.2;
    }
    if matches!(node_type, NodeType::Example | NodeType::Definition) {
        score += 0.1;
    }
    if bold_term_re().is_match(text) {
        score += 0.1;
    }
    score.clamp(0.0, 1.0)
}

fn coverage_level(text: &str, title: &str, completeness: f64) -> CoverageLevel {
    let haystack = format!("{} {}", title, text).to_lowercase();
    if haystack.contains("advanced") {
        CoverageLevel::Advanced
    } else if haystack.contains("implement")
        || haystack.contains("how to")
        || haystack.contains("in depth")
    {
        CoverageLevel::Comprehensive
    } else if haystack.contains("introduction")
        || haystack.contains("overview")
        || haystack.contains("getting started")
    {
        CoverageLevel::Introduction
    } else if completeness >= 0.5 {
        CoverageLevel::Intermediate
    } else {
        CoverageLevel::Introduction
    }
}

fn is_dedicated_topic(title: &str, topic: &str) -> bool {
    let title = title.to_lowercase();
    let topic = topic.to_lowercase();
    !topic.is_empty() && (title.contains(&topic) || topic.contains(title.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> DocumentMeta {
        DocumentMeta {
            course_id: "seo-101".to_string(),
            day: 20,
            container_type: ContainerType::Chapter,
            container_seq: 1,
            container_id: "d20c1".to_string(),
            title: "Canonical Tags".to_string(),
        }
    }

    #[test]
    fn test_classify_step() {
        assert_eq!(classify_segment("Step 1: Open the CMS settings panel"), NodeType::Step);
        assert_eq!(classify_segment("3. Add the link element to the head"), NodeType::Step);
    }

    #[test]
    fn test_classify_definition() {
        assert_eq!(
            classify_segment("A canonical tag is an HTML element that signals the preferred URL."),
            NodeType::Definition
        );
        assert_eq!(classify_segment("Definition: duplicate content"), NodeType::Definition);
    }

    #[test]
    fn test_classify_example() {
        assert_eq!(
            classify_segment("For example, an online shop may serve the same product on two URLs."),
            NodeType::Example
        );
    }

    #[test]
    fn test_classify_list_and_heading() {
        assert_eq!(classify_segment("- rel=\"canonical\" in the head"), NodeType::ListItem);
        assert_eq!(classify_segment("## Why Canonical Tags Matter"), NodeType::Heading);
        assert_eq!(classify_segment("Duplicate Content Basics"), NodeType::Heading);
    }

    #[test]
    fn test_classify_default_concept() {
        assert_eq!(
            classify_segment(
                "Search engines consolidate ranking signals when duplicates point at one URL."
            ),
            NodeType::Concept
        );
    }

    #[test]
    fn test_atomize_blank_line_split() {
        let text = "## Canonical Tags\n\nA canonical tag is an HTML element that signals the preferred URL for duplicate pages.\n\nSearch engines consolidate signals onto the canonical URL when duplicates exist.";
        let nodes = Atomizer::new().atomize(text, &meta()).unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].node_type, NodeType::Heading);
        assert_eq!(nodes[1].node_type, NodeType::Definition);
        assert_eq!(nodes[2].node_type, NodeType::Concept);
        // Sequences are consecutive and references derived
        assert_eq!(nodes[0].canonical_ref, "D20.C1.H1");
        assert_eq!(nodes[1].canonical_ref, "D20.C1.D2");
        assert_eq!(nodes[2].canonical_ref, "D20.C1.C3");
    }

    #[test]
    fn test_atomize_single_newline_fallback() {
        let text = "Step 1: Audit your duplicate URLs across the site today\nStep 2: Choose the preferred canonical URL for each group";
        let nodes = Atomizer::new().atomize(text, &meta()).unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(nodes.iter().all(|n| n.node_type == NodeType::Step));
        assert_eq!(nodes[0].step_number, Some(1));
        assert_eq!(nodes[1].step_number, Some(2));
    }

    #[test]
    fn test_atomize_drops_short_segments() {
        let text = "ok\n\nA canonical tag is an HTML element that signals the preferred URL for duplicates.";
        let nodes = Atomizer::new().atomize(text, &meta()).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].node_type, NodeType::Definition);
    }

    #[test]
    fn test_atomize_keeps_short_list_items() {
        let text = "- crawl\n\n- index\n\nSearch engines consolidate ranking signals onto canonical URLs.";
        let nodes = Atomizer::new().atomize(text, &meta()).unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].node_type, NodeType::ListItem);
    }

    #[test]
    fn test_oversized_segment_resplit() {
        let sentence = "This sentence pads out the segment with enough words to matter. ";
        let text = sentence.repeat(60);
        let config = AtomizerConfig::default();
        let nodes = Atomizer::new().atomize(&text, &meta()).unwrap();
        assert!(nodes.len() > 1);
        for node in &nodes {
            assert!(node.text.split_whitespace().count() <= config.max_words_per_node);
            assert_eq!(node.node_type, nodes[0].node_type);
        }
        // Consecutive sequence numbers
        for (i, node) in nodes.iter().enumerate() {
            assert_eq!(node.sequence, (i + 1) as u32);
        }
    }

    #[test]
    fn test_empty_document_is_error() {
        let err = Atomizer::new().atomize("   \n\n  ", &meta()).unwrap_err();
        assert!(matches!(err, CoachError::EmptyAtomization(_)));
    }

    #[test]
    fn test_content_hash_deterministic() {
        let a = content_hash("same text");
        let b = content_hash("same text");
        assert_eq!(a, b);
        assert_ne!(a, content_hash("different text"));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_primary_topic_from_heading() {
        let text = "## Canonical Tags Explained\n\nSearch engines consolidate ranking signals onto the canonical URL.";
        let nodes = Atomizer::new().atomize(text, &meta()).unwrap();
        assert_eq!(
            nodes[1].primary_topic.as_deref(),
            Some("Canonical Tags Explained")
        );
    }

    #[test]
    fn test_primary_topic_falls_back_to_title() {
        let text = "Search engines consolidate ranking signals onto the canonical URL they select.";
        let nodes = Atomizer::new().atomize(text, &meta()).unwrap();
        assert_eq!(nodes[0].primary_topic.as_deref(), Some("Canonical Tags"));
    }

    #[test]
    fn test_keyword_extraction_bold_and_caps() {
        let atomizer = Atomizer::new();
        let keywords = atomizer
            .extract_keywords("Use **rel canonical** to point Google Search at the preferred URL.");
        assert!(keywords.contains(&"rel canonical".to_string()));
        assert!(keywords.contains(&"google search".to_string()));
        assert!(keywords.len() <= 10);
    }

    #[test]
    fn test_idempotent_atomization() {
        let text = "## Canonical Tags\n\nA canonical tag is an HTML element that signals the preferred URL for duplicate pages.";
        let a = Atomizer::new().atomize(text, &meta()).unwrap();
        let b = Atomizer::new().atomize(text, &meta()).unwrap();
        let refs_a: Vec<_> = a.iter().map(|n| n.canonical_ref.clone()).collect();
        let refs_b: Vec<_> = b.iter().map(|n| n.canonical_ref.clone()).collect();
        assert_eq!(refs_a, refs_b);
        let hashes_a: Vec<_> = a.iter().map(|n| n.content_hash.clone()).collect();
        let hashes_b: Vec<_> = b.iter().map(|n| n.content_hash.clone()).collect();
        assert_eq!(hashes_a, hashes_b);
    }
}
