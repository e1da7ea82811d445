//! Data model for atomized course content
//!
//! A container is one source document (chapter or lab within a day); a
//! node is one atomic unit of meaning inside it. `(course_id, canonical
//! reference)` is unique and immutable for a given piece of content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of source document a container was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerType {
    Chapter,
    Lab,
}

impl ContainerType {
    /// Single-letter code used inside canonical references
    pub fn code(&self) -> char {
        match self {
            Self::Chapter => 'C',
            Self::Lab => 'L',
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Chapter => "chapter",
            Self::Lab => "lab",
        }
    }
}

/// Classification of an atomic content unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Step,
    Concept,
    Definition,
    Example,
    Procedure,
    ListItem,
    Heading,
}

impl NodeType {
    /// Single-letter code used inside canonical references
    pub fn code(&self) -> char {
        match self {
            Self::Step => 'S',
            Self::Concept => 'C',
            Self::Definition => 'D',
            Self::Example => 'E',
            Self::Procedure => 'P',
            Self::ListItem => 'L',
            Self::Heading => 'H',
        }
    }

    /// Inverse of [`NodeType::code`]
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'S' => Some(Self::Step),
            'C' => Some(Self::Concept),
            'D' => Some(Self::Definition),
            'E' => Some(Self::Example),
            'P' => Some(Self::Procedure),
            'L' => Some(Self::ListItem),
            'H' => Some(Self::Heading),
            _ => None,
        }
    }
}

/// Editorial depth tag assigned to a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageLevel {
    Introduction,
    Intermediate,
    Comprehensive,
    Advanced,
}

impl CoverageLevel {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Introduction => "introduction",
            Self::Intermediate => "intermediate",
            Self::Comprehensive => "comprehensive",
            Self::Advanced => "advanced",
        }
    }
}

/// Identity of one source document within a course
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerKey {
    pub course_id: String,
    pub container_type: ContainerType,
    pub container_id: String,
}

/// One source document: a chapter or lab within a day.
///
/// Superseded (not versioned) on re-ingestion of the same container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentContainer {
    pub course_id: String,
    pub container_type: ContainerType,
    pub container_id: String,
    pub day: u32,
    pub sequence: u32,
    pub title: String,
    pub node_count: usize,
    pub ingested_at: DateTime<Utc>,
}

impl ContentContainer {
    pub fn key(&self) -> ContainerKey {
        ContainerKey {
            course_id: self.course_id.clone(),
            container_type: self.container_type,
            container_id: self.container_id.clone(),
        }
    }
}

/// One atomic unit of meaning inside a container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentNode {
    pub course_id: String,
    /// Derived key of the form `D<day>.<C|L><seq>.<type><seq>`
    pub canonical_ref: String,
    pub node_type: NodeType,
    pub day: u32,
    pub container_type: ContainerType,
    pub container_id: String,
    pub container_title: String,
    /// Position within the container, 1-based
    pub sequence: u32,
    pub text: String,
    /// SHA-256 of the raw text, for change detection
    pub content_hash: String,
    pub version: u32,
    pub valid: bool,
    pub primary_topic: Option<String>,
    /// Ordered lowercase phrases equivalent to the primary topic
    pub aliases: Option<Vec<String>>,
    pub keywords: Option<Vec<String>>,
    pub coverage_level: CoverageLevel,
    /// Normalized 0-1 estimate of how thorough the unit is
    pub completeness: f64,
    /// Whether the container is specifically about this unit's topic
    pub dedicated_topic: bool,
    pub step_number: Option<u32>,
}

impl ContentNode {
    pub fn container_key(&self) -> ContainerKey {
        ContainerKey {
            course_id: self.course_id.clone(),
            container_type: self.container_type,
            container_id: self.container_id.clone(),
        }
    }

    /// True for introduction-level units too thin to cite as authoritative
    pub fn is_foundational(&self) -> bool {
        self.coverage_level == CoverageLevel::Introduction && self.completeness < 0.4
    }
}

/// A node returned by the external similarity search, with its score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedUnit {
    pub node: ContentNode,
    pub score: f32,
    pub metadata: HashMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_type_codes_round_trip() {
        for nt in [
            NodeType::Step,
            NodeType::Concept,
            NodeType::Definition,
            NodeType::Example,
            NodeType::Procedure,
            NodeType::ListItem,
            NodeType::Heading,
        ] {
            assert_eq!(NodeType::from_code(nt.code()), Some(nt));
        }
        assert_eq!(NodeType::from_code('X'), None);
    }

    #[test]
    fn test_coverage_level_ordering() {
        assert!(CoverageLevel::Introduction < CoverageLevel::Intermediate);
        assert!(CoverageLevel::Intermediate < CoverageLevel::Comprehensive);
        assert!(CoverageLevel::Comprehensive < CoverageLevel::Advanced);
    }

    #[test]
    fn test_foundational_detection() {
        let mut node = test_node();
        node.coverage_level = CoverageLevel::Introduction;
        node.completeness = 0.3;
        assert!(node.is_foundational());

        node.completeness = 0.5;
        assert!(!node.is_foundational());

        node.completeness = 0.3;
        node.coverage_level = CoverageLevel::Intermediate;
        assert!(!node.is_foundational());
    }

    fn test_node() -> ContentNode {
        ContentNode {
            course_id: "seo-101".to_string(),
            canonical_ref: "D1.C1.C1".to_string(),
            node_type: NodeType::Concept,
            day: 1,
            container_type: ContainerType::Chapter,
            container_id: "d1c1".to_string(),
            container_title: "Introduction to SEO".to_string(),
            sequence: 1,
            text: "Search engines crawl and index pages.".to_string(),
            content_hash: String::new(),
            version: 1,
            valid: true,
            primary_topic: None,
            aliases: None,
            keywords: None,
            coverage_level: CoverageLevel::Introduction,
            completeness: 0.3,
            dedicated_topic: false,
            step_number: None,
        }
    }
}
