//! Raw provider log records.
//!
//! The record shape is owned by the external log provider; we deserialize
//! it loosely (every field optional) so one malformed entry never aborts a
//! run. Validation happens in the normalizer, which tags bad records and
//! moves on.

use chrono::NaiveDateTime;
use serde::Deserialize;

/// One raw record as delivered by the log provider.
///
/// `kind` is the provider's event-type string (`"cast"`, `"applybuff"`,
/// ...); unknown strings and records missing required fields are dropped by
/// the normalizer with a per-record issue.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderRecord {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    /// Absolute wall-clock timestamp of the record.
    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,

    #[serde(default)]
    pub source_id: Option<i64>,

    #[serde(default)]
    pub target_id: Option<i64>,

    #[serde(default)]
    pub ability_id: Option<u32>,

    #[serde(default)]
    pub status_id: Option<u32>,

    #[serde(default)]
    pub amount: Option<i64>,
}

impl ProviderRecord {
    /// Convenience constructor for building records in code (tests, synthetic
    /// streams). `time` is an offset in ms applied to an arbitrary epoch.
    pub fn at(kind: &str, time_ms: i64) -> Self {
        let epoch = NaiveDateTime::default();
        Self {
            kind: Some(kind.to_string()),
            timestamp: Some(epoch + chrono::Duration::milliseconds(time_ms)),
            ..Self::default()
        }
    }

    pub fn source(mut self, id: i64) -> Self {
        self.source_id = Some(id);
        self
    }

    pub fn target(mut self, id: i64) -> Self {
        self.target_id = Some(id);
        self
    }

    pub fn ability(mut self, id: u32) -> Self {
        self.ability_id = Some(id);
        self
    }

    pub fn status(mut self, id: u32) -> Self {
        self.status_id = Some(id);
        self
    }
}
