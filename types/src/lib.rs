//! Shared configuration types for tomestone.
//!
//! These types cross the boundary between the analysis core, the per-job
//! TOML config files, and the presentation layer, so they live in their own
//! dependency-light crate.

pub mod formatting;

use serde::{Deserialize, Serialize};

/// Severity of a reported finding.
///
/// Ordering is meaningful: `Info < Warning < Error`, so findings can be
/// filtered with a simple comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Error,
}

/// A set of actions sharing one cooldown/charge pool, with timing
/// expectations (loaded from per-job config).
///
/// Action ids within one group share a single reuse timer; a cast of any of
/// them counts as a use of the group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CooldownGroup {
    /// Action ids sharing the pool. Must be non-empty.
    pub cooldowns: Vec<u32>,

    /// Expected offset of the first use, in milliseconds from pull start.
    pub first_use_offset: i64,

    /// Allowed lateness in milliseconds before a finding is emitted.
    #[serde(default)]
    pub tolerance: i64,

    /// Expected offsets for subsequent uses (optional; when absent, reuse
    /// expectations derive from cooldown length and charges).
    #[serde(default)]
    pub expected_use_offsets: Vec<i64>,

    /// Explicit not-applicable switch: a job variant that lacks the skill
    /// sets this to false rather than letting the judge guess from silence.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Expected uptime for one tracked buff/status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuffWindow {
    /// Status id applied/removed in the log.
    pub status: u32,

    /// Minimum acceptable uptime over the fight, percent.
    #[serde(default = "default_uptime")]
    pub expected_uptime_pct: f64,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Per-job analysis configuration (one TOML file per job).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Job identifier, e.g. "drg".
    pub job: String,

    /// Config schema/data version, bumped when timing expectations change.
    #[serde(default)]
    pub version: u32,

    #[serde(default, rename = "cooldown")]
    pub cooldowns: Vec<CooldownGroup>,

    #[serde(default, rename = "buff")]
    pub buffs: Vec<BuffWindow>,
}

fn default_true() -> bool {
    true
}

fn default_uptime() -> f64 {
    100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_job_config_toml() {
        let toml = r#"
job = "drg"
version = 3

[[cooldown]]
cooldowns = [16478]
first_use_offset = 11750

[[cooldown]]
cooldowns = [85, 7398, 3557]
first_use_offset = 5000
tolerance = 2500
enabled = false

[[buff]]
status = 786
expected_uptime_pct = 95.0
"#;

        let config: JobConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.job, "drg");
        assert_eq!(config.version, 3);
        assert_eq!(config.cooldowns.len(), 2);
        assert_eq!(config.cooldowns[0].cooldowns, vec![16478]);
        assert_eq!(config.cooldowns[0].tolerance, 0);
        assert!(config.cooldowns[0].enabled);
        assert!(!config.cooldowns[1].enabled);
        assert_eq!(config.buffs[0].status, 786);
        assert_eq!(config.buffs[0].expected_uptime_pct, 95.0);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }
}
