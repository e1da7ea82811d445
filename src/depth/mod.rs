//! Question depth classification
//!
//! Maps a free-text question to an expected answer shape and validates
//! whether retrieved evidence satisfies that shape. Classification walks
//! an ordered rule table with early exit; the first matching category
//! wins, so procedural phrasing outranks troubleshooting, comparison,
//! definition, and conceptual phrasing in that order.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::content::types::{ContentNode, CoverageLevel};

/// Expected answer shape for a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthType {
    Definition,
    Conceptual,
    Procedural,
    Troubleshooting,
    Comparison,
}

/// Ephemeral, per-question classification result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthClassification {
    pub depth: DepthType,
    pub confidence: f64,
    /// Indicator phrases that fired, for explainability and testing
    pub matched_indicators: Vec<String>,
    pub requires_step_by_step: bool,
    pub requires_implementation_evidence: bool,
    pub requires_comparison: bool,
}

/// Result of checking retrieved evidence against a procedural question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProceduralCheck {
    pub passed: bool,
    pub reason: Option<String>,
    pub missing_requirements: Vec<String>,
}

impl ProceduralCheck {
    fn pass() -> Self {
        Self {
            passed: true,
            reason: None,
            missing_requirements: Vec::new(),
        }
    }

    fn fail(reason: &str, missing: &[&str]) -> Self {
        Self {
            passed: false,
            reason: Some(reason.to_string()),
            missing_requirements: missing.iter().map(|m| m.to_string()).collect(),
        }
    }
}

const PROCEDURAL_INDICATORS: &[&str] = &[
    "how to",
    "how do i",
    "how can i",
    "step by step",
    "implement",
    "configure",
    "set up",
    "install",
    "deploy",
    "walk me through",
];

const TROUBLESHOOTING_INDICATORS: &[&str] = &[
    "not working",
    "doesn't work",
    "does not work",
    "error",
    "fix",
    "debug",
    "broken",
    "fails",
    "failing",
    "wrong",
];

const COMPARISON_INDICATORS: &[&str] = &[
    "difference",
    "differences",
    "versus",
    " vs ",
    " vs.",
    "compare",
    "compared to",
    "better than",
    "or should i",
];

/// Anchored at string start or present as a standalone phrase
const DEFINITION_INDICATORS: &[&str] = &["what is", "what are", "define", "meaning of"];

const CONCEPTUAL_INDICATORS: &[&str] = &[
    "why",
    "explain",
    "principle",
    "concept",
    "understand",
    "purpose of",
    "idea behind",
];

type Matcher = fn(&str) -> Vec<String>;

fn contains_any(indicators: &'static [&'static str]) -> impl Fn(&str) -> Vec<String> {
    move |question: &str| {
        indicators
            .iter()
            .filter(|phrase| question.contains(*phrase))
            .map(|phrase| phrase.trim().to_string())
            .collect()
    }
}

fn match_procedural(q: &str) -> Vec<String> {
    contains_any(PROCEDURAL_INDICATORS)(q)
}

fn match_troubleshooting(q: &str) -> Vec<String> {
    contains_any(TROUBLESHOOTING_INDICATORS)(q)
}

fn match_comparison(q: &str) -> Vec<String> {
    contains_any(COMPARISON_INDICATORS)(q)
}

/// Definition phrases must anchor the question or stand alone, so that
/// "explain what is meant by crawling" does not shadow conceptual intent.
fn match_definition(q: &str) -> Vec<String> {
    DEFINITION_INDICATORS
        .iter()
        .filter(|phrase| {
            q.starts_with(*phrase) || q.contains(&format!(". {}", phrase))
        })
        .map(|phrase| phrase.to_string())
        .collect()
}

fn match_conceptual(q: &str) -> Vec<String> {
    contains_any(CONCEPTUAL_INDICATORS)(q)
}

/// Ordered rule table; first match wins
const RULES: &[(DepthType, f64, Matcher)] = &[
    (DepthType::Procedural, 0.9, match_procedural),
    (DepthType::Troubleshooting, 0.85, match_troubleshooting),
    (DepthType::Comparison, 0.8, match_comparison),
    (DepthType::Definition, 0.75, match_definition),
    (DepthType::Conceptual, 0.7, match_conceptual),
];

/// Classify a question into its expected answer shape.
pub fn classify_depth(question: &str) -> DepthClassification {
    let normalized = question.to_lowercase();

    for (depth, confidence, matcher) in RULES {
        let matched = matcher(&normalized);
        if !matched.is_empty() {
            return build(*depth, *confidence, matched);
        }
    }

    // Nothing fired: conceptual with low confidence
    build(DepthType::Conceptual, 0.5, Vec::new())
}

fn build(depth: DepthType, confidence: f64, matched: Vec<String>) -> DepthClassification {
    DepthClassification {
        requires_step_by_step: depth == DepthType::Procedural,
        requires_implementation_evidence: matches!(
            depth,
            DepthType::Procedural | DepthType::Troubleshooting
        ),
        requires_comparison: depth == DepthType::Comparison,
        depth,
        confidence,
        matched_indicators: matched,
    }
}

const IMPLEMENTATION_MARKERS: &[&str] = &[
    "implement",
    "implementation",
    "configure",
    "set up",
    "setup",
    "install",
    "deploy",
    "apply",
    "in practice",
];

const ORDINAL_TRANSITIONS: &[&str] = &["first,", "then,", "finally,"];

fn step_pattern_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?im)\bstep\s+\d+\b|^\s*\d+[.)]\s+\S|first\b.*\bthen\b").unwrap()
    })
}

fn container_guide_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)implementation|how to|guide|tutorial").unwrap())
}

/// Validate that retrieved units can support a procedural answer.
///
/// Non-procedural classifications pass trivially. Procedural checks fail
/// closed: foundational-only evidence is rejected outright.
pub fn validate_procedural_requirements(
    units: &[ContentNode],
    classification: &DepthClassification,
) -> ProceduralCheck {
    if classification.depth != DepthType::Procedural {
        return ProceduralCheck::pass();
    }

    let only_foundational = !units.is_empty()
        && units
            .iter()
            .all(|u| u.coverage_level == CoverageLevel::Introduction && u.completeness < 0.4);
    if units.is_empty() || only_foundational {
        return ProceduralCheck::fail(
            "only foundational content available; no implementation content covers this topic",
            &["implementation evidence", "step-by-step content"],
        );
    }

    let has_implementation_evidence = units.iter().any(|u| {
        matches!(
            u.coverage_level,
            CoverageLevel::Comprehensive | CoverageLevel::Advanced
        ) || unit_mentions_implementation(u)
            || ORDINAL_TRANSITIONS
                .iter()
                .any(|t| u.text.to_lowercase().contains(t))
    });

    let has_step_by_step = units.iter().any(|u| step_pattern_re().is_match(&u.text));

    let has_implementation_containers = units
        .iter()
        .any(|u| container_guide_re().is_match(&u.container_title));

    match (
        has_implementation_evidence || has_implementation_containers,
        has_step_by_step,
    ) {
        (true, true) => ProceduralCheck::pass(),
        (true, false) => ProceduralCheck::fail(
            "implementation content exists but lacks step-by-step structure",
            &["step-by-step content"],
        ),
        (false, _) => ProceduralCheck::fail(
            "retrieved content has neither implementation evidence nor step-by-step structure",
            &["implementation evidence", "step-by-step content"],
        ),
    }
}

fn unit_mentions_implementation(unit: &ContentNode) -> bool {
    let topic = unit.primary_topic.as_deref().unwrap_or("").to_lowercase();
    let title = unit.container_title.to_lowercase();
    let text = unit.text.to_lowercase();
    IMPLEMENTATION_MARKERS
        .iter()
        .any(|m| topic.contains(m) || title.contains(m) || text.contains(m))
}
