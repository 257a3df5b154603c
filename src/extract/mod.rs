//! Raw extraction adapter.
//!
//! The driver hands over raw units in one of two shapes: a flattened mapping
//! that already carries the post fields, or the HTML of one post container.
//! Both are turned into a [`PostRecord`], or dropped when they carry neither a
//! permalink nor any text.

mod locators;
mod mapping;
mod node;

pub use node::PostNode;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::post::{PostRecord, RawPost};

/// Something that can be turned into a post record.
pub trait Extract {
    /// Build a record, or `None` if the unit is unusable.
    fn extract(&self, now: DateTime<Utc>) -> Option<PostRecord>;
}

/// One unit of evidence from the browser driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawUnit {
    Mapping(RawPost),
    Node(PostNode),
}

impl RawUnit {
    /// Wrap the outer HTML of a post container.
    #[must_use]
    pub fn node(html: impl Into<String>) -> Self {
        Self::Node(PostNode::new(html))
    }
}

impl From<RawPost> for RawUnit {
    fn from(raw: RawPost) -> Self {
        Self::Mapping(raw)
    }
}

impl Extract for RawUnit {
    fn extract(&self, now: DateTime<Utc>) -> Option<PostRecord> {
        match self {
            Self::Mapping(raw) => raw.extract(now),
            Self::Node(node) => node.extract(now),
        }
    }
}

/// Adapt every unit, dropping invalid ones.
#[must_use]
pub fn adapt_all(units: &[RawUnit], now: DateTime<Utc>) -> Vec<PostRecord> {
    let records: Vec<PostRecord> = units.iter().filter_map(|unit| unit.extract(now)).collect();
    let dropped = units.len() - records.len();
    if dropped > 0 {
        debug!(dropped, "Dropped raw units with neither permalink nor text");
    }
    records
}
