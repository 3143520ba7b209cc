//! Timeline dispatch.
//!
//! Runs registered modules over a normalized timeline in dependency
//! layers: every module in a layer shares one replay pass and finalizes
//! together before the next layer replays. This is what lets a dependent
//! module read its dependencies' finalized output before seeing its first
//! event.


use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use hashbrown::HashMap;
use tomestone_types::Severity;
use tracing::{debug, warn};

use crate::analysis::{AnalysisContext, FightMeta};
use crate::errors::{AnalysisError, ModuleFault};
use crate::game_data::GameData;
use crate::normalize::{NormalizeIssue, Timeline};
use crate::registry::ModuleRegistry;
use crate::report::{Finding, Report, template};

/// Cooperative cancellation flag, checked between events. Cloneable so a
/// UI thread can hold one end while the run holds the other.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One analysis run: a module set dispatched over one fight's timeline.
///
/// Independent runs share nothing mutable and may execute in parallel with
/// each other; within a run, layers are strictly sequential.
pub struct Pipeline<'a> {
    data: &'a GameData,
    cancel: CancelToken,
}

impl<'a> Pipeline<'a> {
    pub fn new(data: &'a GameData) -> Self {
        Self {
            data,
            cancel: CancelToken::new(),
        }
    }

    /// A handle for cancelling this pipeline from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Dispatch the timeline to every registered module and aggregate
    /// their findings into a report for `actor`.
    ///
    /// Structural failures (dependency cycles, unknown dependency names)
    /// abort before any event is dispatched. A fault inside one module is
    /// isolated to a single `module-failed` finding; the run continues.
    /// Cancellation discards all partial state and yields no findings.
    pub fn run(
        &self,
        registry: ModuleRegistry,
        timeline: &Timeline,
        actor: i64,
    ) -> Result<Report, AnalysisError> {
        let layers = registry.resolve()?;
        let mut modules = registry.into_modules();

        let fight = FightMeta {
            duration_ms: timeline.duration_ms(),
            actor,
        };

        // Finalized output per module name, readable by later layers.
        let mut finalized: HashMap<String, Vec<Finding>> = HashMap::new();
        let mut ordered: Vec<Finding> = Vec::new();

        for (layer_idx, layer) in layers.iter().enumerate() {
            debug!(layer = layer_idx, modules = layer.len(), "replaying timeline");
            let mut faults: HashMap<usize, ModuleFault> = HashMap::new();

            // Shared pass: all modules of this layer see the full timeline.
            for event in timeline.events() {
                if self.cancel.is_cancelled() {
                    return Err(AnalysisError::Cancelled);
                }

                for &idx in layer {
                    if faults.contains_key(&idx) {
                        continue;
                    }
                    let module = &mut modules[idx];
                    if !module.subscriptions().contains(&event.kind) {
                        continue;
                    }
                    let ctx = AnalysisContext::new(&fight, self.data, &finalized);
                    if let Err(fault) = module.on_event(event, &ctx) {
                        warn!(module = module.name(), error = %fault, "module faulted during dispatch");
                        faults.insert(idx, fault);
                    }
                }
            }

            if self.cancel.is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }

            // Finalize the whole layer together, after its shared pass.
            for &idx in layer {
                let name = modules[idx].name().to_string();
                let findings = match faults.remove(&idx) {
                    Some(fault) => vec![module_failed(&name, &fault)],
                    None => {
                        let ctx = AnalysisContext::new(&fight, self.data, &finalized);
                        match modules[idx].finalize(&ctx) {
                            Ok(findings) => findings,
                            Err(fault) => {
                                warn!(module = %name, error = %fault, "module faulted during finalize");
                                vec![module_failed(&name, &fault)]
                            }
                        }
                    }
                };
                ordered.extend(findings.iter().cloned());
                finalized.insert(name, findings);
            }
        }

        // Normalization problems surface as degraded findings, never as a
        // truncated report.
        for issue in timeline.issues() {
            if let NormalizeIssue::UnknownReference { kind, id } = issue {
                ordered.push(
                    Finding::new("normalizer", Severity::Info, template::UNKNOWN_REFERENCE)
                        .with("ref_kind", kind.to_string())
                        .with("id", *id),
                );
            }
        }

        Ok(Report::from_findings(ordered))
    }
}

fn module_failed(name: &str, fault: &ModuleFault) -> Finding {
    Finding::new(name, Severity::Error, template::MODULE_FAILED)
        .with("module", name)
        .with("error", fault.message())
}
