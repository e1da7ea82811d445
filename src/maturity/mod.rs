//! Concept maturity classification
//!
//! Estimates how thoroughly the course covers a named concept from the
//! units retrieved for it: not_covered, introduced, applied, implemented.

use serde::{Deserialize, Serialize};

use crate::content::types::{ContainerType, ContentNode, CoverageLevel};

/// How far the course takes a concept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaturityLevel {
    NotCovered,
    Introduced,
    Applied,
    Implemented,
}

/// Raw signals extracted from the relevant unit subset
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaturitySignals {
    pub relevant_units: usize,
    pub dedicated_chapter: bool,
    pub max_coverage: Option<CoverageLevel>,
    pub max_completeness: f64,
    pub has_labs: bool,
    pub has_step_markers: bool,
    pub has_implementation_keywords: bool,
}

/// Ephemeral, per-(concept, unit-set) classification result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaturitySignal {
    pub level: MaturityLevel,
    pub confidence: f64,
    pub reason: String,
    pub signals: MaturitySignals,
}

const IMPLEMENTATION_KEYWORDS: &[&str] = &[
    "implement",
    "implementation",
    "configure",
    "deploy",
    "set up",
    "hands-on",
    "in practice",
];

/// Classify how mature the course's treatment of `concept` is, given
/// the candidate units retrieved for it.
pub fn classify_maturity(concept: &str, candidates: &[ContentNode]) -> MaturitySignal {
    if candidates.is_empty() {
        return MaturitySignal {
            level: MaturityLevel::NotCovered,
            confidence: 1.0,
            reason: format!("no course content retrieved for '{}'", concept),
            signals: MaturitySignals::default(),
        };
    }

    let relevant = filter_relevant(concept, candidates);
    if relevant.is_empty() {
        return MaturitySignal {
            level: MaturityLevel::NotCovered,
            confidence: 0.8,
            reason: format!(
                "{} units retrieved but none mention '{}'",
                candidates.len(),
                concept
            ),
            signals: MaturitySignals::default(),
        };
    }

    let signals = extract_signals(&relevant);
    let (level, reason) = classify(&signals);
    let confidence = confidence_for(&signals, level);

    MaturitySignal {
        level,
        confidence,
        reason,
        signals,
    }
}

/// Keep units whose topic, container title, or text mentions the
/// concept (case-folded), or which are flagged dedicated-topic.
fn filter_relevant<'a>(concept: &str, candidates: &'a [ContentNode]) -> Vec<&'a ContentNode> {
    let needle = concept.to_lowercase();
    candidates
        .iter()
        .filter(|u| {
            u.dedicated_topic
                || u.primary_topic
                    .as_deref()
                    .map(|t| t.to_lowercase().contains(&needle))
                    .unwrap_or(false)
                || u.container_title.to_lowercase().contains(&needle)
                || u.text.to_lowercase().contains(&needle)
        })
        .collect()
}

fn extract_signals(relevant: &[&ContentNode]) -> MaturitySignals {
    let dedicated_chapter = relevant.iter().any(|u| u.dedicated_topic);
    let max_coverage = relevant.iter().map(|u| u.coverage_level).max();
    let max_completeness = relevant
        .iter()
        .map(|u| u.completeness)
        .fold(0.0_f64, f64::max);
    let has_labs = relevant
        .iter()
        .any(|u| u.container_type == ContainerType::Lab);
    let has_step_markers = relevant.iter().any(|u| u.step_number.is_some())
        || relevant
            .iter()
            .any(|u| u.text.to_lowercase().contains("step "));
    let has_implementation_keywords = relevant.iter().any(|u| {
        let text = u.text.to_lowercase();
        IMPLEMENTATION_KEYWORDS.iter().any(|k| text.contains(k))
    });

    MaturitySignals {
        relevant_units: relevant.len(),
        dedicated_chapter,
        max_coverage,
        max_completeness,
        has_labs,
        has_step_markers,
        has_implementation_keywords,
    }
}

/// Ordered classification rules over the extracted signals
fn classify(s: &MaturitySignals) -> (MaturityLevel, String) {
    let practice = s.has_labs || s.has_step_markers || s.has_implementation_keywords;

    if s.dedicated_chapter && s.max_completeness >= 0.7 && practice {
        return (
            MaturityLevel::Implemented,
            "dedicated chapter with thorough content and hands-on material".to_string(),
        );
    }

    let mid_coverage = matches!(
        s.max_coverage,
        Some(CoverageLevel::Intermediate) | Some(CoverageLevel::Comprehensive)
    );
    if (0.4..0.7).contains(&s.max_completeness) && (s.dedicated_chapter || mid_coverage) {
        return (
            MaturityLevel::Applied,
            "concept applied beyond its introduction".to_string(),
        );
    }

    let intro_only = s.max_coverage == Some(CoverageLevel::Introduction);
    if s.max_completeness <= 0.4 && (intro_only || !s.dedicated_chapter) {
        return (
            MaturityLevel::Introduced,
            "concept only introduced at foundational depth".to_string(),
        );
    }

    if s.max_completeness >= 0.4 {
        (
            MaturityLevel::Applied,
            "moderately thorough coverage without stronger signals".to_string(),
        )
    } else {
        (
            MaturityLevel::Introduced,
            "thin coverage without stronger signals".to_string(),
        )
    }
}

/// Confidence: 0.5 base, additive boosts for strong signals, clamped to
/// [0.3, 1.0], with a small boost when the strongest signals align with
/// the chosen level.
fn confidence_for(s: &MaturitySignals, level: MaturityLevel) -> f64 {
    let mut confidence: f64 = 0.5;
    if s.dedicated_chapter {
        confidence += 0.2;
    }
    if s.has_labs {
        confidence += 0.15;
    }
    if s.has_step_markers {
        confidence += 0.1;
    }
    if s.relevant_units >= 3 {
        confidence += 0.1;
    }

    let aligned = match level {
        MaturityLevel::Implemented => s.dedicated_chapter && (s.has_labs || s.has_step_markers),
        MaturityLevel::Applied => s.max_completeness >= 0.4,
        MaturityLevel::Introduced => s.max_completeness <= 0.4,
        MaturityLevel::NotCovered => false,
    };
    if aligned {
        confidence += 0.05;
    }

    confidence.clamp(0.3, 1.0)
}
