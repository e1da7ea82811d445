//! Canonical reference allocation
//!
//! References have the form `D<day>.<C|L><containerSeq>.<typeCode><nodeSeq>`
//! and are derived keys: the same logical position always yields the same
//! reference across re-ingestions.

use crate::content::types::{ContainerType, NodeType};
use crate::errors::{CoachError, Result};

/// Components of a canonical reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefComponents {
    pub day: u32,
    pub container_type: ContainerType,
    pub container_seq: u32,
    pub node_type: NodeType,
    pub node_seq: u32,
}

/// Allocate the canonical reference for a node position.
///
/// Pure and deterministic; the only failure mode is an invalid input
/// range (day and sequences must be positive).
pub fn allocate(
    day: u32,
    container_type: ContainerType,
    container_seq: u32,
    node_type: NodeType,
    node_seq: u32,
) -> Result<String> {
    if day == 0 {
        return Err(CoachError::InvalidReference {
            component: "day",
            value: day,
        });
    }
    if container_seq == 0 {
        return Err(CoachError::InvalidReference {
            component: "container_seq",
            value: container_seq,
        });
    }
    if node_seq == 0 {
        return Err(CoachError::InvalidReference {
            component: "node_seq",
            value: node_seq,
        });
    }

    Ok(format!(
        "D{}.{}{}.{}{}",
        day,
        container_type.code(),
        container_seq,
        node_type.code(),
        node_seq
    ))
}

/// Parse a canonical reference back to its components.
pub fn parse(reference: &str) -> Result<RefComponents> {
    let malformed = || CoachError::MalformedReference(reference.to_string());

    let mut parts = reference.split('.');
    let day_part = parts.next().ok_or_else(malformed)?;
    let container_part = parts.next().ok_or_else(malformed)?;
    let node_part = parts.next().ok_or_else(malformed)?;
    if parts.next().is_some() {
        return Err(malformed());
    }

    let day = day_part
        .strip_prefix('D')
        .and_then(|d| d.parse::<u32>().ok())
        .filter(|d| *d > 0)
        .ok_or_else(malformed)?;

    let container_type = match container_part.chars().next() {
        Some('C') => ContainerType::Chapter,
        Some('L') => ContainerType::Lab,
        _ => return Err(malformed()),
    };
    let container_seq = container_part[1..]
        .parse::<u32>()
        .ok()
        .filter(|s| *s > 0)
        .ok_or_else(malformed)?;

    let node_type = node_part
        .chars()
        .next()
        .and_then(NodeType::from_code)
        .ok_or_else(malformed)?;
    let node_seq = node_part[1..]
        .parse::<u32>()
        .ok()
        .filter(|s| *s > 0)
        .ok_or_else(malformed)?;

    Ok(RefComponents {
        day,
        container_type,
        container_seq,
        node_type,
        node_seq,
    })
}
