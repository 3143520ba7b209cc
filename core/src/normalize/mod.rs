//! Event normalization.
//!
//! Converts provider-specific raw records into the canonical [`Event`]
//! sequence: validates per record (malformed entries are tagged and
//! skipped, never fatal), resolves action/status references against the
//! static game-data tables, assigns stable sequence numbers, and sorts by
//! `(timestamp, seq)` so ties keep intake order.
//!
//! Records are consumed one at a time from any iterator; the resulting
//! [`Timeline`] is a finite, restartable sequence that the event bus
//! replays once per dependency layer.

use chrono::NaiveDateTime;
use hashbrown::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

use crate::combat_log::ProviderRecord;
use crate::events::{Event, EventKind};
use crate::game_data::GameData;

/// Per-record problems found during normalization. Never fatal: malformed
/// records are dropped, unknown references degrade to info findings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizeIssue {
    #[error("malformed record #{seq}: {reason}")]
    MalformedRecord { seq: u64, reason: String },

    #[error("unknown {kind} id {id}")]
    UnknownReference { kind: RefKind, id: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    Action,
    Status,
}

impl std::fmt::Display for RefKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Action => write!(f, "action"),
            Self::Status => write!(f, "status"),
        }
    }
}

/// The ordered canonical event sequence for one fight, plus the issues
/// collected while producing it.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    events: Vec<Event>,
    issues: Vec<NormalizeIssue>,
    duration_ms: i64,
}

impl Timeline {
    /// Build a timeline from already-canonical events (embedders whose
    /// provider emits relative timestamps directly). Sorts and derives the
    /// fight duration.
    pub fn from_events(mut events: Vec<Event>) -> Self {
        events.sort_by_key(Event::order_key);
        let duration_ms = events.last().map(|e| e.timestamp).unwrap_or(0);
        Self {
            events,
            issues: Vec::new(),
            duration_ms,
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn issues(&self) -> &[NormalizeIssue] {
        &self.issues
    }

    /// Fight length in ms: pull start (zero) to the last event.
    pub fn duration_ms(&self) -> i64 {
        self.duration_ms
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Converts raw provider records into a [`Timeline`].
pub struct Normalizer<'a> {
    data: &'a GameData,
}

/// A validated record awaiting pull-start conversion.
struct Staged {
    time: NaiveDateTime,
    seq: u64,
    kind: EventKind,
    source: i64,
    target: Option<i64>,
    action: Option<u32>,
    status: Option<u32>,
    amount: i64,
}

impl<'a> Normalizer<'a> {
    pub fn new(data: &'a GameData) -> Self {
        Self { data }
    }

    /// Normalize a stream of provider records.
    ///
    /// Pull start (timestamp zero) is the earliest valid record; input may
    /// arrive out of order.
    pub fn normalize<I>(&self, records: I) -> Timeline
    where
        I: IntoIterator<Item = ProviderRecord>,
    {
        let mut staged: Vec<Staged> = Vec::new();
        let mut issues: Vec<NormalizeIssue> = Vec::new();

        for (seq, record) in records.into_iter().enumerate() {
            let seq = seq as u64;
            match self.validate(seq, record) {
                Ok(s) => staged.push(s),
                Err(reason) => {
                    warn!(seq, %reason, "dropping malformed provider record");
                    issues.push(NormalizeIssue::MalformedRecord { seq, reason });
                }
            }
        }

        let Some(pull_start) = staged.iter().map(|s| s.time).min() else {
            debug!("no valid records; empty timeline");
            return Timeline {
                events: Vec::new(),
                issues,
                duration_ms: 0,
            };
        };

        self.collect_unknown_references(&staged, &mut issues);

        let mut events: Vec<Event> = staged
            .into_iter()
            .map(|s| Event {
                timestamp: (s.time - pull_start).num_milliseconds(),
                seq: s.seq,
                kind: s.kind,
                source: s.source,
                target: s.target,
                action: s.action,
                status: s.status,
                amount: s.amount,
            })
            .collect();

        events.sort_by_key(Event::order_key);
        let duration_ms = events.last().map(|e| e.timestamp).unwrap_or(0);

        debug!(
            events = events.len(),
            issues = issues.len(),
            duration_ms,
            "normalized timeline"
        );

        Timeline {
            events,
            issues,
            duration_ms,
        }
    }

    fn validate(&self, seq: u64, record: ProviderRecord) -> Result<Staged, String> {
        let Some(kind_str) = record.kind.as_deref() else {
            return Err("missing event type".to_string());
        };

        let Some(kind) = classify(kind_str) else {
            return Err(format!("unrecognized event type `{kind_str}`"));
        };

        let Some(time) = record.timestamp else {
            return Err("missing timestamp".to_string());
        };

        // Death records identify the dying entity via target; everything
        // else must name an acting source.
        let source = match (record.source_id, kind) {
            (Some(id), _) => id,
            (None, EventKind::Death) => record.target_id.ok_or("death without target")?,
            (None, _) => return Err("missing source".to_string()),
        };

        match kind {
            EventKind::CastStart | EventKind::Cast | EventKind::Damage | EventKind::Heal => {
                if record.ability_id.is_none() {
                    return Err(format!("{kind_str} record without ability id"));
                }
            }
            EventKind::BuffApply | EventKind::BuffRemove => {
                if record.status_id.is_none() {
                    return Err(format!("{kind_str} record without status id"));
                }
            }
            EventKind::Death => {
                if record.target_id.is_none() {
                    return Err("death without target".to_string());
                }
            }
        }

        Ok(Staged {
            time,
            seq,
            kind,
            source,
            // Buffs with no explicit target are self-applied.
            target: record.target_id.or(match kind {
                EventKind::BuffApply | EventKind::BuffRemove => Some(source),
                _ => None,
            }),
            action: record.ability_id,
            status: record.status_id,
            amount: record.amount.unwrap_or(0),
        })
    }

    /// Record one issue per distinct id that fails reference resolution.
    fn collect_unknown_references(&self, staged: &[Staged], issues: &mut Vec<NormalizeIssue>) {
        let mut seen: HashSet<(RefKind, u32)> = HashSet::new();

        for s in staged {
            if let Some(id) = s.action
                && self.data.action(id).is_none()
                && seen.insert((RefKind::Action, id))
            {
                issues.push(NormalizeIssue::UnknownReference {
                    kind: RefKind::Action,
                    id,
                });
            }
            if let Some(id) = s.status
                && self.data.status(id).is_none()
                && seen.insert((RefKind::Status, id))
            {
                issues.push(NormalizeIssue::UnknownReference {
                    kind: RefKind::Status,
                    id,
                });
            }
        }
    }
}

/// Map a provider event-type string onto a canonical kind.
fn classify(kind: &str) -> Option<EventKind> {
    match kind {
        "begincast" => Some(EventKind::CastStart),
        "cast" => Some(EventKind::Cast),
        "applybuff" => Some(EventKind::BuffApply),
        "removebuff" => Some(EventKind::BuffRemove),
        "damage" => Some(EventKind::Damage),
        "heal" => Some(EventKind::Heal),
        "death" => Some(EventKind::Death),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_data::{ActionInfo, GameData, GameDataConfig, StatusInfo};

    fn test_data() -> GameData {
        let mut data = GameData::new();
        data.add_config(GameDataConfig {
            actions: vec![ActionInfo {
                id: 16478,
                name: "High Jump".into(),
                cooldown_ms: 30_000,
                charges: 1,
                i18n: None,
            }],
            statuses: vec![StatusInfo {
                id: 786,
                name: "Battle Litany".into(),
                i18n: None,
            }],
        });
        data
    }

    #[test]
    fn test_out_of_order_input_is_sorted() {
        let data = test_data();
        let timeline = Normalizer::new(&data).normalize(vec![
            ProviderRecord::at("cast", 5000).source(1).ability(16478),
            ProviderRecord::at("cast", 0).source(1).ability(16478),
            ProviderRecord::at("cast", 2500).source(1).ability(16478),
        ]);

        let stamps: Vec<i64> = timeline.events().iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![0, 2500, 5000]);
        assert_eq!(timeline.duration_ms(), 5000);
        assert!(timeline.issues().is_empty());
    }

    #[test]
    fn test_equal_timestamps_keep_intake_order() {
        let data = test_data();
        let timeline = Normalizer::new(&data).normalize(vec![
            ProviderRecord::at("applybuff", 1000).source(1).status(786),
            ProviderRecord::at("cast", 1000).source(1).ability(16478),
        ]);

        assert_eq!(timeline.events()[0].kind, EventKind::BuffApply);
        assert_eq!(timeline.events()[1].kind, EventKind::Cast);
        assert_eq!(timeline.events()[0].seq, 0);
        assert_eq!(timeline.events()[1].seq, 1);
    }

    #[test]
    fn test_malformed_records_are_tagged_not_fatal() {
        let data = test_data();
        let timeline = Normalizer::new(&data).normalize(vec![
            ProviderRecord::at("cast", 0).source(1).ability(16478),
            // unknown provider noise
            ProviderRecord::at("heartbeat", 100),
            // cast with no ability id
            ProviderRecord::at("cast", 200).source(1),
            // no timestamp at all
            ProviderRecord {
                kind: Some("cast".into()),
                ..ProviderRecord::default()
            },
        ]);

        assert_eq!(timeline.len(), 1);
        let malformed = timeline
            .issues()
            .iter()
            .filter(|i| matches!(i, NormalizeIssue::MalformedRecord { .. }))
            .count();
        assert_eq!(malformed, 3);
    }

    #[test]
    fn test_unknown_reference_degrades_to_issue() {
        let data = test_data();
        let timeline = Normalizer::new(&data).normalize(vec![
            ProviderRecord::at("cast", 0).source(1).ability(16478),
            ProviderRecord::at("cast", 100).source(1).ability(4242),
            ProviderRecord::at("cast", 200).source(1).ability(4242),
        ]);

        // Event is kept; the unresolved id is reported once.
        assert_eq!(timeline.len(), 3);
        let unknown: Vec<_> = timeline
            .issues()
            .iter()
            .filter(|i| matches!(i, NormalizeIssue::UnknownReference { .. }))
            .collect();
        assert_eq!(unknown.len(), 1);
        assert_eq!(
            unknown[0],
            &NormalizeIssue::UnknownReference {
                kind: RefKind::Action,
                id: 4242
            }
        );
    }

    #[test]
    fn test_unknown_action_and_status_ids_are_distinct_issues() {
        let data = test_data();
        // Same numeric id in both namespaces: two distinct issues.
        let timeline = Normalizer::new(&data).normalize(vec![
            ProviderRecord::at("cast", 0).source(1).ability(4242),
            ProviderRecord::at("applybuff", 100).source(1).status(4242),
        ]);

        let kinds: Vec<RefKind> = timeline
            .issues()
            .iter()
            .filter_map(|i| match i {
                NormalizeIssue::UnknownReference { kind, id: 4242 } => Some(*kind),
                _ => None,
            })
            .collect();
        assert_eq!(kinds, vec![RefKind::Action, RefKind::Status]);
    }

    #[test]
    fn test_empty_input_yields_empty_timeline() {
        let data = test_data();
        let timeline = Normalizer::new(&data).normalize(Vec::new());
        assert!(timeline.is_empty());
        assert_eq!(timeline.duration_ms(), 0);
    }

    #[test]
    fn test_pull_start_is_earliest_valid_record() {
        let data = test_data();
        let timeline = Normalizer::new(&data).normalize(vec![
            ProviderRecord::at("cast", 90_000).source(1).ability(16478),
            ProviderRecord::at("cast", 60_000).source(1).ability(16478),
        ]);

        assert_eq!(timeline.events()[0].timestamp, 0);
        assert_eq!(timeline.events()[1].timestamp, 30_000);
    }
}
