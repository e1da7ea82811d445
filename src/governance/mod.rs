//! Answer governance
//!
//! Decides, per question, what shape the answer must take, which
//! reference is authoritative, and whether a human must follow up.
//!
//! Components:
//! - Engine: primary selection, disclaimers, escalation
//! - Stripping: removal of generator-authored provenance claims

pub mod engine;
pub mod stripping;

pub use engine::{
    detect_concepts, GovernanceConfig, GovernanceDecision, GovernanceEngine, GovernanceOutcome,
    GovernanceReference, SECONDARY_DISCLAIMER,
};
pub use stripping::strip_references;
