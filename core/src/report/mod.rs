//! Findings and the result aggregator.
//!
//! Modules emit [`Finding`]s: a severity, a message template id, and the
//! substitution data the presentation layer needs to render it. The core
//! never formats localized strings; it only selects template ids and
//! supplies data. The aggregator collects findings in module execution
//! order into a [`Report`] with a stable handle per entry.

use serde::Serialize;
use serde_json::{Map, Value};
use tomestone_types::Severity;

/// Message template ids understood by the presentation layer.
pub mod template {
    pub const LATE_FIRST_USE: &str = "cooldown.late-first-use";
    pub const LATE_USE: &str = "cooldown.late-use";
    pub const DOWNTIME: &str = "cooldown.downtime";
    pub const BUFF_UPTIME: &str = "buff.uptime";
    pub const BUFF_LOW_UPTIME: &str = "buff.low-uptime";
    pub const DEATHS: &str = "deaths.count";
    pub const MODULE_FAILED: &str = "core.module-failed";
    pub const UNKNOWN_REFERENCE: &str = "core.unknown-reference";
}

/// One reportable judgment about player performance. Immutable once
/// emitted; the aggregator only reorders and filters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    /// Name of the emitting module.
    pub module: String,

    pub severity: Severity,

    /// Message template id; localization happens outside the core.
    pub template: &'static str,

    /// Substitution data for the template (timestamps, action names,
    /// counts).
    pub data: Map<String, Value>,
}

impl Finding {
    pub fn new(module: &str, severity: Severity, template: &'static str) -> Self {
        Self {
            module: module.to_string(),
            severity,
            template,
            data: Map::new(),
        }
    }

    /// Attach one substitution value. Builder-style so emission sites stay
    /// single expressions.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }
}

/// A finding plus the stable handle downstream consumers (scroll
/// coordination, deep links) key on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    /// `<module>/<index>`: stable across identical runs.
    pub handle: String,
    pub finding: Finding,
}

/// The full, ordered list of findings for one analysis run.
///
/// Always complete: isolated module faults appear as `module-failed`
/// entries rather than truncating the list.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    entries: Vec<ReportEntry>,
}

impl Report {
    /// Build a report from findings in emission order, assigning each a
    /// per-module sequential handle.
    pub fn from_findings(findings: Vec<Finding>) -> Self {
        let mut counters: hashbrown::HashMap<String, usize> = hashbrown::HashMap::new();
        let entries = findings
            .into_iter()
            .map(|finding| {
                let n = counters.entry(finding.module.clone()).or_insert(0);
                let handle = format!("{}/{}", finding.module, *n);
                *n += 1;
                ReportEntry { handle, finding }
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.entries.iter().map(|e| &e.finding)
    }

    /// Entries at or above the given severity, original order preserved.
    pub fn with_min_severity(&self, min: Severity) -> Vec<&ReportEntry> {
        self.entries
            .iter()
            .filter(|e| e.finding.severity >= min)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_per_module_sequential() {
        let report = Report::from_findings(vec![
            Finding::new("a", Severity::Info, template::DOWNTIME),
            Finding::new("b", Severity::Warning, template::DEATHS),
            Finding::new("a", Severity::Error, template::DOWNTIME),
        ]);

        let handles: Vec<_> = report.entries().iter().map(|e| e.handle.as_str()).collect();
        assert_eq!(handles, vec!["a/0", "b/0", "a/1"]);
    }

    #[test]
    fn test_severity_filter_keeps_order() {
        let report = Report::from_findings(vec![
            Finding::new("a", Severity::Info, template::BUFF_UPTIME),
            Finding::new("a", Severity::Error, template::DEATHS),
            Finding::new("b", Severity::Warning, template::DOWNTIME),
        ]);

        let filtered = report.with_min_severity(Severity::Warning);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].finding.template, template::DEATHS);
        assert_eq!(filtered[1].finding.template, template::DOWNTIME);
    }

    #[test]
    fn test_finding_data_builder() {
        let finding = Finding::new("cooldown_downtime", Severity::Warning, template::LATE_FIRST_USE)
            .with("delta_ms", 450)
            .with("action", "High Jump");
        assert_eq!(finding.data["delta_ms"], 450);
        assert_eq!(finding.data["action"], "High Jump");
    }
}
