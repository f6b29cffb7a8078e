//! Serializable checkpoint of a search in progress.

use super::prop::PropId;
use super::provider::SearchMode;
use crate::result::HexlResult;
use serde::{Deserialize, Serialize};

/// Cursor positions of one property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropCursor {
    /// Property id
    pub prop: PropId,
    /// Number of valid values consumed
    pub positive: usize,
    /// Number of values consumed by the negative sweep
    pub negative: usize,
}

/// Everything needed to resume a [`TestGen`](super::TestGen) search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchState {
    /// Opcode the search runs over
    pub opcode: String,
    /// Whether this is the base-format variant
    pub basic: bool,
    /// Secondary search mode
    pub mode: SearchMode,
    /// Index of the primary property validated last
    pub primary_current: usize,
    /// Negative sweep position in the primary list
    pub primary_pos: usize,
    /// Secondary position (optimal search or negative sweep)
    pub secondary_pos: usize,
    /// Primary property cursors in order
    pub primary: Vec<PropCursor>,
    /// Secondary property cursors in order
    pub secondary: Vec<PropCursor>,
}

impl SearchState {
    /// Serialize to pretty JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> HexlResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid state.
    pub fn from_json(json: &str) -> HexlResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
