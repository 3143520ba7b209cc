//! Canonical combat events.
//!
//! Everything downstream of the normalizer consumes these. Timestamps are
//! integer milliseconds relative to pull start; `seq` is the stable intake
//! order used to break timestamp ties.

use serde::{Deserialize, Serialize};

/// Kinds of canonical events analysis modules can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// An ability started casting (channel/cast bar began).
    CastStart,
    /// An ability resolved (instant cast, or a cast bar completing).
    Cast,
    BuffApply,
    BuffRemove,
    Damage,
    Heal,
    Death,
}

/// One normalized combat event. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Milliseconds since pull start.
    pub timestamp: i64,

    /// Intake sequence number; stable tiebreak for equal timestamps.
    pub seq: u64,

    pub kind: EventKind,

    /// Acting entity.
    pub source: i64,

    /// Affected entity, where the kind has one (buff target, damage target,
    /// the entity that died).
    pub target: Option<i64>,

    /// Action id for cast/damage/heal kinds.
    pub action: Option<u32>,

    /// Status id for buff kinds.
    pub status: Option<u32>,

    /// Kind-specific magnitude (damage dealt, healing done); zero otherwise.
    pub amount: i64,
}

impl Event {
    /// Sort key: timestamp order with stable intake-order tiebreak.
    pub fn order_key(&self) -> (i64, u64) {
        (self.timestamp, self.seq)
    }
}
