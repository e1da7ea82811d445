//! Course Coach - Content Atomization & Answer Governance Engine
//!
//! Augments a static course library with retrieval-augmented question
//! answering. Learners ask free-text questions; answers use only
//! verified course content, and the generation step is never allowed to
//! invent which part of the course it is citing.
//!
//! # Architecture
//!
//! - Offline: the ingestion pipeline atomizes course documents into
//!   canonical, addressable units
//! - Online: depth and maturity classification feed the governance
//!   engine, which constrains generation and owns the reference list

pub mod errors;
pub mod config;

// Re-export commonly used types
pub use errors::{CoachError, Result};

// Offline ingestion
pub mod alias;
pub mod content;

// Online classification and governance
pub mod depth;
pub mod governance;
pub mod maturity;

// External seams
pub mod llm;
pub mod store;

// Answering surface
pub mod answer;

// CLI
pub mod cli;
