//! Answering surface
//!
//! Online pipeline per question: retrieve candidates, classify depth
//! and maturity over the candidate set, let governance decide the
//! answer shape, generate constrained text, strip generator-authored
//! references, and attach the governed reference list. The learner
//! always gets an answer, an answer with disclaimer, or an escalation
//! notice; never a raw technical error.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::content::types::{ContainerType, ContentNode};
use crate::depth::{self, DepthType};
use crate::governance::{
    detect_concepts, strip_references, GovernanceEngine, GovernanceReference,
};
use crate::llm::{GenerationOptions, LlmClient};
use crate::maturity;
use crate::store::Retriever;

/// Generic apology shown on total answering failure
pub const APOLOGY: &str =
    "Sorry, something went wrong while preparing your answer. Please try again in a moment.";

/// Answering surface configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerConfig {
    /// Candidates requested from the retriever
    pub top_k: usize,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self { top_k: 8 }
    }
}

/// Response contract of the answering surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub success: bool,
    pub answer: String,
    pub references: Vec<GovernanceReference>,
    pub confidence: f64,
    pub is_lab_guidance: bool,
    pub escalated: bool,
    pub escalation_id: Option<String>,
}

/// Orchestrates retrieval, classification, governance, and generation
pub struct AnswerService {
    retriever: Arc<dyn Retriever>,
    llm: Option<Arc<LlmClient>>,
    governance: GovernanceEngine,
    config: AnswerConfig,
}

impl AnswerService {
    pub fn new(retriever: Arc<dyn Retriever>, llm: Option<Arc<LlmClient>>) -> Self {
        Self {
            retriever,
            llm,
            governance: GovernanceEngine::new(),
            config: AnswerConfig::default(),
        }
    }

    pub fn with_config(
        retriever: Arc<dyn Retriever>,
        llm: Option<Arc<LlmClient>>,
        config: AnswerConfig,
    ) -> Self {
        Self {
            retriever,
            llm,
            governance: GovernanceEngine::new(),
            config,
        }
    }

    /// Answer one learner question against verified course content.
    pub async fn answer(&self, question: &str, course_id: &str, learner_id: &str) -> AnswerResponse {
        let _ = learner_id; // Reserved for escalation routing

        let candidates = match self
            .retriever
            .retrieve(course_id, question, self.config.top_k)
            .await
        {
            Ok(candidates) => candidates,
            Err(_) => return failure_response(),
        };
        let nodes: Vec<ContentNode> = candidates.into_iter().map(|c| c.node).collect();

        // Depth and maturity are pure computations over the same
        // candidate set; order between them does not matter.
        let classification = depth::classify_depth(question);
        let concept = detect_concepts(question)
            .into_iter()
            .next()
            .unwrap_or_else(|| question.to_string());
        let maturity_signal = maturity::classify_maturity(&concept, &nodes);

        let generated = self.generate_text(question, &nodes, classification.depth).await;
        let (raw_answer, generator_confidence) = match generated {
            Some(answer) => (answer.0, answer.1),
            None => (extractive_answer(&nodes), None),
        };

        let decision = self.governance.decide(
            question,
            &nodes,
            &classification,
            &maturity_signal,
            generator_confidence,
        );

        let answer = strip_references(&raw_answer);
        let answer = if answer.is_empty() {
            APOLOGY.to_string()
        } else {
            answer
        };

        let is_lab_guidance = classification.depth == DepthType::Procedural
            && decision
                .references
                .iter()
                .any(|r| r.container_type == ContainerType::Lab);

        let confidence = blend_confidence(
            classification.confidence,
            maturity_signal.confidence,
            decision.requires_disclaimer,
        );

        AnswerResponse {
            success: true,
            answer,
            references: decision.references.clone(),
            confidence,
            is_lab_guidance,
            escalated: decision.escalated,
            escalation_id: decision.escalation_id.clone(),
        }
    }

    /// Constrained generation; any failure falls back to the extractive
    /// answer so the learner never sees a raw error.
    async fn generate_text(
        &self,
        question: &str,
        nodes: &[ContentNode],
        depth: DepthType,
    ) -> Option<(String, Option<f64>)> {
        let llm = self.llm.as_ref()?;
        if !llm.is_configured() || nodes.is_empty() {
            return None;
        }

        let context: String = nodes
            .iter()
            .take(5)
            .map(|n| n.text.as_str())
            .collect::<Vec<_>>()
            .join("\n---\n");
        let prompt = format!(
            "Answer the learner's question using ONLY the course material below. \
             Do not cite chapters, days, or labs; references are attached separately. \
             Expected answer shape: {:?}.\n\nQuestion: {}",
            depth, question
        );

        match llm.generate(&prompt, &context, &GenerationOptions::default()).await {
            Ok(answer) => Some((answer.text, answer.confidence)),
            Err(_) => None,
        }
    }
}

/// Deterministic fallback answer assembled from the strongest units
fn extractive_answer(nodes: &[ContentNode]) -> String {
    let mut ranked: Vec<&ContentNode> = nodes.iter().collect();
    ranked.sort_by(|a, b| {
        b.dedicated_topic.cmp(&a.dedicated_topic).then(
            b.completeness
                .partial_cmp(&a.completeness)
                .unwrap_or(std::cmp::Ordering::Equal),
        )
    });
    ranked
        .iter()
        .take(2)
        .map(|n| n.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn blend_confidence(depth: f64, maturity: f64, disclaimer: bool) -> f64 {
    let blended = (depth + maturity) / 2.0;
    if disclaimer {
        (blended * 0.8).clamp(0.0, 1.0)
    } else {
        blended.clamp(0.0, 1.0)
    }
}

fn failure_response() -> AnswerResponse {
    AnswerResponse {
        success: false,
        answer: APOLOGY.to_string(),
        references: Vec::new(),
        confidence: 0.0,
        is_lab_guidance: false,
        escalated: false,
        escalation_id: None,
    }
}
