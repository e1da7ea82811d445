//! In-memory content store
//!
//! Backs tests and local runs. `replace_container` holds the write lock
//! across the delete and insert, so queries never observe a container
//! with zero nodes. Retrieval is a deterministic term-overlap ranking
//! standing in for the external similarity search.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

use crate::content::types::{ContainerKey, ContentContainer, ContentNode, RetrievedUnit};
use crate::errors::Result;
use crate::store::{ContentStore, Retriever};

#[derive(Default)]
struct StoreState {
    containers: HashMap<ContainerKey, ContentContainer>,
    nodes: HashMap<ContainerKey, Vec<ContentNode>>,
}

/// Process-local store implementation
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn replace_container(
        &self,
        container: ContentContainer,
        nodes: Vec<ContentNode>,
    ) -> Result<()> {
        let key = container.key();
        let mut state = self.state.write().await;
        state.nodes.remove(&key);
        state.nodes.insert(key.clone(), nodes);
        state.containers.insert(key, container);
        Ok(())
    }

    async fn get_container(&self, key: &ContainerKey) -> Result<Option<ContentContainer>> {
        let state = self.state.read().await;
        Ok(state.containers.get(key).cloned())
    }

    async fn nodes_for_container(&self, key: &ContainerKey) -> Result<Vec<ContentNode>> {
        let state = self.state.read().await;
        Ok(state.nodes.get(key).cloned().unwrap_or_default())
    }

    async fn get_node(
        &self,
        course_id: &str,
        canonical_ref: &str,
    ) -> Result<Option<ContentNode>> {
        let state = self.state.read().await;
        for (key, nodes) in state.nodes.iter() {
            if key.course_id != course_id {
                continue;
            }
            if let Some(node) = nodes.iter().find(|n| n.canonical_ref == canonical_ref) {
                return Ok(Some(node.clone()));
            }
        }
        Ok(None)
    }

    async fn container_count(&self, course_id: &str) -> Result<usize> {
        let state = self.state.read().await;
        Ok(state
            .containers
            .keys()
            .filter(|k| k.course_id == course_id)
            .count())
    }

    async fn node_count(&self, course_id: &str) -> Result<usize> {
        let state = self.state.read().await;
        Ok(state
            .nodes
            .iter()
            .filter(|(k, _)| k.course_id == course_id)
            .map(|(_, v)| v.len())
            .sum())
    }
}

#[async_trait]
impl Retriever for MemoryStore {
    async fn retrieve(
        &self,
        course_id: &str,
        question: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedUnit>> {
        let terms: HashSet<String> = question
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric() && c != '-')
            .filter(|w| w.len() > 2)
            .map(|w| w.to_string())
            .collect();

        let state = self.state.read().await;
        let mut scored: Vec<RetrievedUnit> = state
            .nodes
            .iter()
            .filter(|(k, _)| k.course_id == course_id)
            .flat_map(|(_, nodes)| nodes.iter())
            .filter(|n| n.valid)
            .filter_map(|n| {
                let score = overlap_score(n, &terms);
                if score > 0.0 {
                    Some(RetrievedUnit {
                        node: n.clone(),
                        score,
                        metadata: HashMap::new(),
                    })
                } else {
                    None
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.node.canonical_ref.cmp(&b.node.canonical_ref))
        });
        scored.truncate(top_k);
        Ok(scored)
    }
}

fn overlap_score(node: &ContentNode, terms: &HashSet<String>) -> f32 {
    if terms.is_empty() {
        return 0.0;
    }
    let haystack = format!(
        "{} {} {} {}",
        node.text,
        node.container_title,
        node.primary_topic.as_deref().unwrap_or(""),
        node.aliases
            .as_ref()
            .map(|a| a.join(" "))
            .unwrap_or_default()
    )
    .to_lowercase();

    let hits = terms.iter().filter(|t| haystack.contains(t.as_str())).count();
    hits as f32 / terms.len() as f32
}
