//! Buff uptime judge.
//!
//! Pairs apply/remove events for configured statuses on the analyzed
//! player, closes any window still open at fight end, and reports uptime
//! as a percentage of fight duration.

use tomestone_types::{BuffWindow, Severity};

use crate::analysis::{AnalysisContext, AnalysisModule};
use crate::errors::ModuleFault;
use crate::events::{Event, EventKind};
use crate::report::{Finding, template};

pub const MODULE_NAME: &str = "buff_uptime";

const SUBSCRIPTIONS: &[EventKind] = &[EventKind::BuffApply, EventKind::BuffRemove];

struct BuffState {
    spec: BuffWindow,
    applied_at: Option<i64>,
    active_ms: i64,
    applications: u32,
}

pub struct BuffUptime {
    buffs: Vec<BuffState>,
}

impl BuffUptime {
    pub fn new(windows: Vec<BuffWindow>) -> Self {
        let buffs = windows
            .into_iter()
            .filter(|w| w.enabled)
            .map(|spec| BuffState {
                spec,
                applied_at: None,
                active_ms: 0,
                applications: 0,
            })
            .collect();
        Self { buffs }
    }
}

impl AnalysisModule for BuffUptime {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    fn subscriptions(&self) -> &'static [EventKind] {
        SUBSCRIPTIONS
    }

    fn on_event(&mut self, event: &Event, ctx: &AnalysisContext<'_>) -> Result<(), ModuleFault> {
        if event.target != Some(ctx.fight.actor) {
            return Ok(());
        }
        let Some(status) = event.status else {
            return Ok(());
        };

        for buff in &mut self.buffs {
            if buff.spec.status != status {
                continue;
            }
            match event.kind {
                EventKind::BuffApply => {
                    // Re-applies while active refresh the window; the clock
                    // keeps running from the original apply.
                    if buff.applied_at.is_none() {
                        buff.applied_at = Some(event.timestamp);
                    }
                    buff.applications += 1;
                }
                EventKind::BuffRemove => {
                    if let Some(start) = buff.applied_at.take() {
                        buff.active_ms += event.timestamp - start;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn finalize(&mut self, ctx: &AnalysisContext<'_>) -> Result<Vec<Finding>, ModuleFault> {
        let duration = ctx.fight.duration_ms;
        let mut findings = Vec::new();

        for buff in &mut self.buffs {
            // A buff still active at fight end counts to the end.
            if let Some(start) = buff.applied_at.take() {
                buff.active_ms += duration - start;
            }

            let uptime_pct = if duration > 0 {
                buff.active_ms as f64 / duration as f64 * 100.0
            } else {
                0.0
            };

            let below = uptime_pct < buff.spec.expected_uptime_pct;
            let (severity, tpl) = if below {
                (Severity::Warning, template::BUFF_LOW_UPTIME)
            } else {
                (Severity::Info, template::BUFF_UPTIME)
            };

            findings.push(
                Finding::new(MODULE_NAME, severity, tpl)
                    .with("status", buff.spec.status)
                    .with("status_name", ctx.data.status_name(buff.spec.status))
                    .with("uptime_pct", uptime_pct)
                    .with("expected_pct", buff.spec.expected_uptime_pct)
                    .with("active_ms", buff.active_ms)
                    .with("applications", buff.applications),
            );
        }

        Ok(findings)
    }
}
