//! Worksite record identifiers taken from the viewer URL.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A worksite record reference parsed from a URL path segment.
///
/// Two identifier schemas are in circulation:
/// - `Single`: one opaque key, filtered upstream as `pk='<key>'`.
/// - `BlockSite`: the older underscore-joined form `<blockid>_<workingsiteid>`,
///   filtered upstream as `blockid='..' AND workingsiteid='..'`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "schema", rename_all = "snake_case")]
pub enum RecordRef {
    Single { pk: String },
    BlockSite {
        block_id: String,
        working_site_id: String,
    },
}

impl RecordRef {
    /// Parse a URL path segment into a record reference.
    ///
    /// A segment with exactly one underscore separating two non-empty halves
    /// parses as the legacy two-key schema; anything else is a single key.
    /// Empty segments are rejected.
    pub fn parse(segment: &str) -> Result<Self, RecordParseError> {
        let segment = segment.trim();
        if segment.is_empty() {
            return Err(RecordParseError::Empty);
        }

        if let Some((block_id, working_site_id)) = segment.split_once('_') {
            if !block_id.is_empty()
                && !working_site_id.is_empty()
                && !working_site_id.contains('_')
            {
                return Ok(RecordRef::BlockSite {
                    block_id: block_id.to_string(),
                    working_site_id: working_site_id.to_string(),
                });
            }
        }

        Ok(RecordRef::Single {
            pk: segment.to_string(),
        })
    }

    /// The raw key for a single-schema reference, if it is one.
    pub fn pk(&self) -> Option<&str> {
        match self {
            RecordRef::Single { pk } => Some(pk),
            RecordRef::BlockSite { .. } => None,
        }
    }

    /// The original path-segment form of this reference.
    pub fn as_segment(&self) -> String {
        match self {
            RecordRef::Single { pk } => pk.clone(),
            RecordRef::BlockSite {
                block_id,
                working_site_id,
            } => format!("{}_{}", block_id, working_site_id),
        }
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_segment())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RecordParseError {
    #[error("Empty record identifier")]
    Empty,
}
