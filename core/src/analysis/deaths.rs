//! Death counter.
//!
//! Every death of the analyzed player is reportable; dead time is damage
//! and healing not happening.

use tomestone_types::Severity;

use crate::analysis::{AnalysisContext, AnalysisModule};
use crate::errors::ModuleFault;
use crate::events::{Event, EventKind};
use crate::report::{Finding, template};

pub const MODULE_NAME: &str = "deaths";

const SUBSCRIPTIONS: &[EventKind] = &[EventKind::Death];

#[derive(Default)]
pub struct Deaths {
    timestamps: Vec<i64>,
}

impl Deaths {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AnalysisModule for Deaths {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    fn subscriptions(&self) -> &'static [EventKind] {
        SUBSCRIPTIONS
    }

    fn on_event(&mut self, event: &Event, ctx: &AnalysisContext<'_>) -> Result<(), ModuleFault> {
        if event.target == Some(ctx.fight.actor) {
            self.timestamps.push(event.timestamp);
        }
        Ok(())
    }

    fn finalize(&mut self, _ctx: &AnalysisContext<'_>) -> Result<Vec<Finding>, ModuleFault> {
        if self.timestamps.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![
            Finding::new(MODULE_NAME, Severity::Error, template::DEATHS)
                .with("count", self.timestamps.len() as i64)
                .with("timestamps_ms", self.timestamps.clone()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashbrown::HashMap;
    use crate::analysis::FightMeta;
    use crate::game_data::GameData;

    fn death(target: i64, timestamp: i64) -> Event {
        Event {
            timestamp,
            seq: timestamp as u64,
            kind: EventKind::Death,
            source: target,
            target: Some(target),
            action: None,
            status: None,
            amount: 0,
        }
    }

    fn run(module: &mut Deaths, events: &[Event]) -> Vec<Finding> {
        let data = GameData::new();
        let fight = FightMeta {
            duration_ms: 100_000,
            actor: 1,
        };
        let finalized = HashMap::new();
        let ctx = AnalysisContext::new(&fight, &data, &finalized);
        for event in events {
            module.on_event(event, &ctx).unwrap();
        }
        module.finalize(&ctx).unwrap()
    }

    #[test]
    fn test_no_deaths_no_finding() {
        let mut module = Deaths::new();
        assert!(run(&mut module, &[death(42, 5_000)]).is_empty());
    }

    #[test]
    fn test_deaths_reported_with_timestamps() {
        let mut module = Deaths::new();
        let findings = run(&mut module, &[death(1, 5_000), death(1, 80_000)]);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
        assert_eq!(findings[0].data["count"], 2);
        assert_eq!(findings[0].data["timestamps_ms"][1], 80_000);
    }
}
