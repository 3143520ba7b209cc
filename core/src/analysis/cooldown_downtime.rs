//! Cooldown/downtime judge.
//!
//! Watches a configured set of cooldown pools (one or more action ids
//! sharing a reuse timer) and judges, per pool, whether the first use came
//! as early as expected and how many theoretical uses were wasted over the
//! fight. Each job-specific judge is a configuration value over this one
//! algorithm, not a subclass.

use hashbrown::HashSet;
use tomestone_types::{CooldownGroup, Severity};
use tracing::debug;

use crate::analysis::{AnalysisContext, AnalysisModule};
use crate::errors::ModuleFault;
use crate::events::{Event, EventKind};
use crate::report::{Finding, template};

pub const MODULE_NAME: &str = "cooldown_downtime";

const SUBSCRIPTIONS: &[EventKind] = &[EventKind::CastStart, EventKind::Cast];

/// Per-pool runtime state.
struct PoolState {
    spec: CooldownGroup,

    /// Observed use offsets, ms from pull start. Arrival order is
    /// timestamp order (bus guarantee), so this stays sorted.
    uses: Vec<i64>,

    /// Action ids with a cast-start whose resolve has not arrived yet.
    /// Tracked per action: in a shared pool, a resolve only pairs with
    /// its own cast-start, never another action's.
    pending_starts: HashSet<u32>,
}

pub struct CooldownDowntime {
    pools: Vec<PoolState>,
}

impl CooldownDowntime {
    /// Build from tracked-cooldown specs. Pools explicitly flagged
    /// not-applicable (`enabled = false`) are excluded from judging
    /// entirely, as are degenerate empty pools.
    pub fn new(groups: Vec<CooldownGroup>) -> Self {
        let pools = groups
            .into_iter()
            .filter(|g| {
                if !g.enabled {
                    debug!(pool = ?g.cooldowns, "cooldown pool disabled by config");
                }
                g.enabled && !g.cooldowns.is_empty()
            })
            .map(|spec| PoolState {
                spec,
                uses: Vec::new(),
                pending_starts: HashSet::new(),
            })
            .collect();
        Self { pools }
    }

    fn judge_pool(pool: &PoolState, ctx: &AnalysisContext<'_>, findings: &mut Vec<Finding>) {
        let spec = &pool.spec;
        let key = spec.cooldowns[0];
        let names: Vec<String> = spec
            .cooldowns
            .iter()
            .map(|&id| ctx.data.action_name(id))
            .collect();

        // Pool-wide cooldown/charge data comes from the first action that
        // resolves; actions sharing a pool share these by definition.
        let info = spec.cooldowns.iter().find_map(|&id| ctx.data.action(id));
        let cooldown = info.map(|a| a.cooldown_ms).unwrap_or(0);
        let charges = info.map(|a| i64::from(a.charges.max(1))).unwrap_or(1);

        let expected = expected_uses(
            ctx.fight.duration_ms,
            spec.first_use_offset,
            cooldown,
            charges,
        );
        let observed = pool.uses.len() as i64;

        if observed == 0 {
            // Never silently omit an unused pool: report full downtime even
            // when the fight was too short to derive a reuse count.
            findings.push(
                Finding::new(MODULE_NAME, Severity::Warning, template::DOWNTIME)
                    .with("action", key)
                    .with("actions", names)
                    .with("expected_uses", expected.max(1))
                    .with("observed_uses", 0)
                    .with("lost_uses", expected.max(1))
                    .with("downtime_pct", 100.0),
            );
            return;
        }

        let first = pool.uses[0];
        let delta = first - spec.first_use_offset;
        if delta > spec.tolerance {
            findings.push(
                Finding::new(MODULE_NAME, Severity::Warning, template::LATE_FIRST_USE)
                    .with("action", key)
                    .with("actions", names.clone())
                    .with("expected_ms", spec.first_use_offset)
                    .with("observed_ms", first)
                    .with("delta_ms", delta),
            );
        }

        // Subsequent-use slots judged against explicit expected offsets,
        // when the config provides them.
        for (i, &expected_at) in spec.expected_use_offsets.iter().enumerate() {
            let Some(&observed_at) = pool.uses.get(i + 1) else {
                break; // missing uses show up in the lost-use count
            };
            let delta = observed_at - expected_at;
            if delta > spec.tolerance {
                findings.push(
                    Finding::new(MODULE_NAME, Severity::Info, template::LATE_USE)
                        .with("action", key)
                        .with("use_index", (i + 2) as i64)
                        .with("expected_ms", expected_at)
                        .with("observed_ms", observed_at)
                        .with("delta_ms", delta),
                );
            }
        }

        let lost = (expected - observed).max(0);
        if lost > 0 {
            // Full precision here; display rounds to one decimal.
            let downtime_pct = lost as f64 / expected as f64 * 100.0;
            findings.push(
                Finding::new(MODULE_NAME, Severity::Warning, template::DOWNTIME)
                    .with("action", key)
                    .with("actions", names)
                    .with("expected_uses", expected)
                    .with("observed_uses", observed)
                    .with("lost_uses", lost)
                    .with("downtime_pct", downtime_pct)
                    .with("wasted_ms", lost * cooldown)
                    .with(
                        "max_idle_ms",
                        max_idle_gap(&pool.uses, spec.first_use_offset, cooldown, ctx.fight.duration_ms),
                    ),
            );
        }
    }
}

/// Theoretical maximum uses: a pool starting with `charges` charges and a
/// per-charge recharge of `cooldown` ms, first expected at `first_offset`,
/// over a fight of `duration` ms.
fn expected_uses(duration: i64, first_offset: i64, cooldown: i64, charges: i64) -> i64 {
    let window = duration - first_offset;
    if window < 0 {
        0
    } else if cooldown > 0 {
        charges + window / cooldown
    } else {
        1
    }
}

/// Largest idle stretch: time between theoretical availability and the
/// next actual use (or fight end).
fn max_idle_gap(uses: &[i64], first_offset: i64, cooldown: i64, duration: i64) -> i64 {
    let mut max_idle = (uses[0] - first_offset).max(0);
    if cooldown > 0 {
        for pair in uses.windows(2) {
            max_idle = max_idle.max(pair[1] - pair[0] - cooldown);
        }
        if let Some(&last) = uses.last() {
            max_idle = max_idle.max(duration - (last + cooldown));
        }
    }
    max_idle
}

impl AnalysisModule for CooldownDowntime {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    fn subscriptions(&self) -> &'static [EventKind] {
        SUBSCRIPTIONS
    }

    fn on_event(&mut self, event: &Event, ctx: &AnalysisContext<'_>) -> Result<(), ModuleFault> {
        if event.source != ctx.fight.actor {
            return Ok(());
        }
        let Some(action) = event.action else {
            return Ok(());
        };

        for pool in &mut self.pools {
            if !pool.spec.cooldowns.contains(&action) {
                continue;
            }
            match event.kind {
                EventKind::CastStart => {
                    pool.uses.push(event.timestamp);
                    pool.pending_starts.insert(action);
                }
                EventKind::Cast => {
                    // A resolve paired with this action's pending
                    // cast-start is the same use, not a second one.
                    if !pool.pending_starts.remove(&action) {
                        pool.uses.push(event.timestamp);
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn finalize(&mut self, ctx: &AnalysisContext<'_>) -> Result<Vec<Finding>, ModuleFault> {
        let mut findings = Vec::new();
        for pool in &self.pools {
            Self::judge_pool(pool, ctx, &mut findings);
        }
        Ok(findings)
    }
}
