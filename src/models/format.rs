use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{Side, MAX_TIME_MS};
use crate::error::{DebateError, DebateResult};

/// One timed speech in a format. Immutable once the format is built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SegmentDefinition {
    pub id: String,
    pub name: String,
    /// Target time budget in seconds.
    pub duration: u64,
    #[serde(default)]
    pub allow_negative: bool,
}

impl SegmentDefinition {
    pub fn new(id: &str, name: &str, duration: u64, allow_negative: bool) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            duration,
            allow_negative,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration.saturating_mul(1000)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DebateFormat {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub affirmative: Vec<SegmentDefinition>,
    pub negative: Vec<SegmentDefinition>,
}

impl DebateFormat {
    /// Affirmative segments first, then negative, each in declared order.
    pub fn segments(&self) -> impl Iterator<Item = (Side, &SegmentDefinition)> {
        self.affirmative
            .iter()
            .map(|segment| (Side::Affirmative, segment))
            .chain(self.negative.iter().map(|segment| (Side::Negative, segment)))
    }

    pub fn find(&self, id: &str) -> Option<(Side, &SegmentDefinition)> {
        self.segments().find(|(_, segment)| segment.id == id)
    }

    /// Structural checks that do not depend on the rest of the catalog.
    pub fn validate(&self) -> DebateResult<()> {
        if self.name.trim().is_empty() {
            return Err(DebateError::validation("format name must not be empty"));
        }

        let mut seen = HashSet::new();
        for (_, segment) in self.segments() {
            if segment.id.is_empty() {
                return Err(DebateError::validation(format!(
                    "format '{}' has a segment without an id",
                    self.name
                )));
            }
            if segment
                .duration
                .checked_mul(1000)
                .map_or(true, |ms| ms > MAX_TIME_MS)
            {
                return Err(DebateError::validation(format!(
                    "segment '{}' has an out-of-range duration {}",
                    segment.id, segment.duration
                )));
            }
            if !seen.insert(segment.id.as_str()) {
                return Err(DebateError::validation(format!(
                    "format '{}' defines segment '{}' more than once",
                    self.name, segment.id
                )));
            }
        }

        Ok(())
    }
}
