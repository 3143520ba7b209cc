//! Analysis modules.
//!
//! A module is a self-contained state machine over the event stream: it
//! declares which event kinds it wants, accumulates internal state per
//! analysis run, and finalizes into zero or more findings. Modules may
//! declare dependencies on other modules by name; the registry guarantees
//! a dependent only starts processing after its dependencies finalized.

pub mod buff_uptime;
pub mod cooldown_downtime;
pub mod deaths;

pub use buff_uptime::BuffUptime;
pub use cooldown_downtime::CooldownDowntime;
pub use deaths::Deaths;

use hashbrown::HashMap;

use crate::errors::ModuleFault;
use crate::events::{Event, EventKind};
use crate::game_data::GameData;
use crate::report::Finding;

/// Fight-level metadata shared with every module.
#[derive(Debug, Clone, Copy)]
pub struct FightMeta {
    /// Pull start (zero) to last event, in ms.
    pub duration_ms: i64,

    /// The player this run analyzes.
    pub actor: i64,
}

/// Read-only context handed to modules on every call.
pub struct AnalysisContext<'a> {
    pub fight: &'a FightMeta,
    pub data: &'a GameData,
    finalized: &'a HashMap<String, Vec<Finding>>,
}

impl<'a> AnalysisContext<'a> {
    pub(crate) fn new(
        fight: &'a FightMeta,
        data: &'a GameData,
        finalized: &'a HashMap<String, Vec<Finding>>,
    ) -> Self {
        Self {
            fight,
            data,
            finalized,
        }
    }

    /// Finalized findings of a dependency, by module name.
    ///
    /// Only modules named in [`AnalysisModule::dependencies`] are guaranteed
    /// to be present; anything else depends on layer ordering and must not
    /// be relied on.
    pub fn dependency_findings(&self, module: &str) -> Option<&[Finding]> {
        self.finalized.get(module).map(Vec::as_slice)
    }
}

/// One named analysis unit driven by the event bus.
pub trait AnalysisModule {
    /// Unique module name; also used in dependency declarations and
    /// finding handles.
    fn name(&self) -> &'static str;

    /// Names of modules whose finalized output this module reads.
    fn dependencies(&self) -> &[&'static str] {
        &[]
    }

    /// Event kinds this module wants. The bus never delivers anything
    /// outside this set.
    fn subscriptions(&self) -> &'static [EventKind];

    /// Called once per subscribed event, in timestamp order.
    fn on_event(&mut self, event: &Event, ctx: &AnalysisContext<'_>) -> Result<(), ModuleFault>;

    /// Called exactly once per run, after all events were dispatched and
    /// all declared dependencies finalized.
    fn finalize(&mut self, ctx: &AnalysisContext<'_>) -> Result<Vec<Finding>, ModuleFault>;
}
