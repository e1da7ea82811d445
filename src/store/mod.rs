//! Content store seams
//!
//! The engine consumes the store through narrow traits: container and
//! node persistence keyed by container key and (course id, canonical
//! reference), plus a retrieval seam returning similarity-ranked
//! candidates. The similarity search itself is external.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::content::types::{ContainerKey, ContentContainer, ContentNode, RetrievedUnit};
use crate::errors::Result;

/// Persistence seam for containers and nodes.
///
/// `replace_container` is the single all-or-nothing step per container:
/// delete-old plus insert-new must never leave a window where the
/// container has zero nodes visible to queries.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Upsert the container record and atomically replace its node set
    async fn replace_container(
        &self,
        container: ContentContainer,
        nodes: Vec<ContentNode>,
    ) -> Result<()>;

    async fn get_container(&self, key: &ContainerKey) -> Result<Option<ContentContainer>>;

    async fn nodes_for_container(&self, key: &ContainerKey) -> Result<Vec<ContentNode>>;

    async fn get_node(&self, course_id: &str, canonical_ref: &str)
        -> Result<Option<ContentNode>>;

    async fn container_count(&self, course_id: &str) -> Result<usize>;

    async fn node_count(&self, course_id: &str) -> Result<usize>;
}

/// Retrieval seam: similarity-ranked candidates for a question.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(
        &self,
        course_id: &str,
        question: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedUnit>>;
}
