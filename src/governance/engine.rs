//! Answer governance engine
//!
//! Combines depth classification, concept maturity, and the retrieved
//! unit set into a single decision: answerable with a primary
//! reference, answerable with a disclaimer, or escalate to a human.
//! Governance violations are first-class outcomes, not errors.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use uuid::Uuid;

use crate::content::types::{ContainerType, ContentNode};
use crate::depth::{self, DepthClassification, ProceduralCheck};
use crate::maturity::{MaturityLevel, MaturitySignal};

/// Disclaimer attached to the first secondary reference when no
/// authoritative primary exists
pub const SECONDARY_DISCLAIMER: &str =
    "this concept is introduced here and applied in later chapters";

/// Terminal outcomes of the per-question state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GovernanceOutcome {
    AnswerableWithPrimary,
    AnswerableWithDisclaimer,
    Escalate,
}

/// One governed reference shown to the learner; identity comes from the
/// stored node, never from generator output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceReference {
    pub canonical_ref: String,
    pub day: u32,
    pub container_type: ContainerType,
    pub container_title: String,
    pub is_primary: bool,
    pub disclaimer: Option<String>,
}

impl GovernanceReference {
    fn from_node(node: &ContentNode, is_primary: bool) -> Self {
        Self {
            canonical_ref: node.canonical_ref.clone(),
            day: node.day,
            container_type: node.container_type,
            container_title: node.container_title.clone(),
            is_primary,
            disclaimer: None,
        }
    }
}

/// Ephemeral, per-question governance decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceDecision {
    pub outcome: GovernanceOutcome,
    /// Ordered references, primary (if any) first
    pub references: Vec<GovernanceReference>,
    pub requires_disclaimer: bool,
    pub escalated: bool,
    pub escalation_id: Option<String>,
    pub escalation_reason: Option<String>,
    pub procedural_check: ProceduralCheck,
}

impl GovernanceDecision {
    pub fn primary(&self) -> Option<&GovernanceReference> {
        self.references.iter().find(|r| r.is_primary)
    }
}

/// Governance tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Generator self-reported confidence at or above this, with weak
    /// evidence, forces escalation
    pub high_generator_confidence: f64,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            high_generator_confidence: 0.8,
        }
    }
}

/// Per-question decision engine
pub struct GovernanceEngine {
    config: GovernanceConfig,
}

impl GovernanceEngine {
    pub fn new() -> Self {
        Self::with_config(GovernanceConfig::default())
    }

    pub fn with_config(config: GovernanceConfig) -> Self {
        Self { config }
    }

    /// Decide what shape the answer must take for this question.
    ///
    /// Pure and synchronous over the already-fetched candidate set.
    pub fn decide(
        &self,
        question: &str,
        candidates: &[ContentNode],
        classification: &DepthClassification,
        maturity: &MaturitySignal,
        generator_confidence: Option<f64>,
    ) -> GovernanceDecision {
        let procedural_check =
            depth::validate_procedural_requirements(candidates, classification);

        let concepts = detect_concepts(question);
        let (primary, secondaries) = select_primary(candidates, &concepts);

        let mut references: Vec<GovernanceReference> = Vec::new();
        if let Some(p) = primary {
            references.push(GovernanceReference::from_node(p, true));
        }
        references.extend(
            secondaries
                .iter()
                .map(|n| GovernanceReference::from_node(n, false)),
        );

        let has_primary = primary.is_some();
        let requires_disclaimer = !has_primary;

        // Escalation triggers, checked in order
        let escalation_reason = if !procedural_check.passed {
            procedural_check.reason.clone()
        } else if !has_primary && maturity.level == MaturityLevel::NotCovered {
            Some("question requires course anchoring but no content covers it".to_string())
        } else if !has_primary
            && generator_confidence
                .map(|c| c >= self.config.high_generator_confidence)
                .unwrap_or(false)
        {
            Some("generator confidence is high while retrieved evidence is weak".to_string())
        } else {
            None
        };

        if !has_primary {
            if let Some(first_secondary) =
                references.iter_mut().find(|r| !r.is_primary)
            {
                first_secondary.disclaimer = Some(SECONDARY_DISCLAIMER.to_string());
            }
        }

        let escalated = escalation_reason.is_some();
        let outcome = if escalated {
            GovernanceOutcome::Escalate
        } else if has_primary {
            GovernanceOutcome::AnswerableWithPrimary
        } else {
            GovernanceOutcome::AnswerableWithDisclaimer
        };

        GovernanceDecision {
            outcome,
            references,
            requires_disclaimer,
            escalated,
            escalation_id: escalated.then(|| Uuid::new_v4().to_string()),
            escalation_reason,
            procedural_check,
        }
    }
}

impl Default for GovernanceEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Select the primary reference: foundational units are excluded from
/// candidacy regardless of textual relevance; survivors must anchor to a
/// detected concept; ranking is (dedicated-topic desc, completeness
/// desc). Everything else becomes a secondary reference.
fn select_primary<'a>(
    candidates: &'a [ContentNode],
    concepts: &[String],
) -> (Option<&'a ContentNode>, Vec<&'a ContentNode>) {
    let mut eligible: Vec<&ContentNode> = candidates
        .iter()
        .filter(|u| !u.is_foundational())
        .filter(|u| anchors_to_concept(u, concepts))
        .collect();

    eligible.sort_by(|a, b| {
        b.dedicated_topic
            .cmp(&a.dedicated_topic)
            .then(
                b.completeness
                    .partial_cmp(&a.completeness)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
    });

    let primary = eligible.first().copied();
    let secondaries: Vec<&ContentNode> = candidates
        .iter()
        .filter(|u| {
            primary
                .map(|p| !std::ptr::eq(*u, p))
                .unwrap_or(true)
        })
        .collect();

    (primary, secondaries)
}

fn anchors_to_concept(unit: &ContentNode, concepts: &[String]) -> bool {
    if concepts.is_empty() {
        // No detectable concept: any non-foundational unit may anchor
        return true;
    }
    if unit.dedicated_topic {
        return true;
    }
    let topic = unit.primary_topic.as_deref().unwrap_or("").to_lowercase();
    let title = unit.container_title.to_lowercase();
    concepts
        .iter()
        .any(|c| topic.contains(c.as_str()) || title.contains(c.as_str()))
}

const QUESTION_STOPWORDS: &[&str] = &[
    "how", "to", "do", "i", "can", "what", "is", "are", "a", "an", "the", "why", "my", "me",
    "of", "for", "in", "on", "and", "or", "between", "should", "does", "not", "it", "this",
    "that", "explain", "implement", "configure", "fix", "debug", "working", "set", "up",
    "install", "deploy", "difference", "versus", "compare", "compared", "define", "meaning",
    "step", "by",
];

fn capitalized_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([A-Z][A-Za-z0-9]+(?:\s+[A-Z][A-Za-z0-9]+)+)\b").unwrap())
}

/// Extract concept names from the question: capitalized runs, plus the
/// residual phrase after indicator words and stopwords are removed.
pub fn detect_concepts(question: &str) -> Vec<String> {
    let mut concepts: Vec<String> = Vec::new();

    for cap in capitalized_run_re().captures_iter(question) {
        let phrase = cap[1].to_lowercase();
        if !concepts.contains(&phrase) {
            concepts.push(phrase);
        }
    }

    let lowered = question.to_lowercase();
    let residual: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .filter(|w| !w.is_empty() && !QUESTION_STOPWORDS.contains(w))
        .collect();
    if !residual.is_empty() {
        let phrase = residual.join(" ");
        if !concepts.contains(&phrase) {
            concepts.push(phrase);
        }
    }

    concepts
}
