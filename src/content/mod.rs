//! Content atomization
//!
//! Offline side of the engine: turns long-form course documents into
//! uniquely addressable, metadata-rich atomic units and keeps the
//! canonical registry current.
//!
//! Components:
//! - Canonical: deterministic reference allocation
//! - Atomizer: segmentation, classification, hashing, keywords
//! - Ingest: batch pipeline with replace-not-merge container updates

pub mod atomizer;
pub mod canonical;
pub mod ingest;
pub mod types;

pub use atomizer::{Atomizer, AtomizerConfig, DocumentMeta};
pub use ingest::{IngestOptions, IngestPipeline, IngestSummary};
pub use types::{
    ContainerKey, ContainerType, ContentContainer, ContentNode, CoverageLevel, NodeType,
    RetrievedUnit,
};
