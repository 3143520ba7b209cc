//! Static action/status reference tables.
//!
//! Loaded once per process from TOML definition files (builtin directory
//! plus an optional user override directory) and treated as read-only for
//! the lifetime of the process.

mod config;

pub use config::{ConfigError, default_custom_dir, load_game_data, load_file};

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// Reference data for one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionInfo {
    pub id: u32,
    pub name: String,

    /// Recharge time per charge, in milliseconds. Zero means the action has
    /// no meaningful cooldown (reuse expectations cannot be derived).
    #[serde(default)]
    pub cooldown_ms: i64,

    /// Charge count for actions with a charge pool.
    #[serde(default = "default_charges")]
    pub charges: u8,

    /// Localization key the presentation layer resolves; never formatted
    /// by the core.
    #[serde(default)]
    pub i18n: Option<String>,
}

/// Reference data for one buff/debuff status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusInfo {
    pub id: u32,
    pub name: String,

    #[serde(default)]
    pub i18n: Option<String>,
}

/// One TOML definition file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameDataConfig {
    #[serde(default, rename = "action")]
    pub actions: Vec<ActionInfo>,

    #[serde(default, rename = "status")]
    pub statuses: Vec<StatusInfo>,
}

/// Merged reference tables, keyed by game id.
#[derive(Debug, Clone, Default)]
pub struct GameData {
    actions: HashMap<u32, ActionInfo>,
    statuses: HashMap<u32, StatusInfo>,
}

impl GameData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add definitions from a config, returns ids of any duplicates.
    /// Later configs override earlier ones (user files override builtins).
    pub fn add_config(&mut self, config: GameDataConfig) -> Vec<u32> {
        let mut duplicates = Vec::new();

        for action in config.actions {
            if self.actions.contains_key(&action.id) {
                duplicates.push(action.id);
            }
            self.actions.insert(action.id, action);
        }

        for status in config.statuses {
            if self.statuses.contains_key(&status.id) {
                duplicates.push(status.id);
            }
            self.statuses.insert(status.id, status);
        }

        duplicates
    }

    pub fn action(&self, id: u32) -> Option<&ActionInfo> {
        self.actions.get(&id)
    }

    pub fn status(&self, id: u32) -> Option<&StatusInfo> {
        self.statuses.get(&id)
    }

    /// Display name for an action, falling back to the numeric id for
    /// unresolved references.
    pub fn action_name(&self, id: u32) -> String {
        self.action(id)
            .map(|a| a.name.clone())
            .unwrap_or_else(|| format!("#{id}"))
    }

    pub fn status_name(&self, id: u32) -> String {
        self.status(id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| format!("#{id}"))
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.statuses.is_empty()
    }
}

fn default_charges() -> u8 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action_toml() {
        let toml = r#"
[[action]]
id = 16478
name = "High Jump"
cooldown_ms = 30000
i18n = "action.high-jump"

[[action]]
id = 95
name = "Spineshatter Dive"
cooldown_ms = 60000
charges = 2

[[status]]
id = 786
name = "Battle Litany"
"#;

        let config: GameDataConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.actions.len(), 2);
        assert_eq!(config.actions[0].charges, 1);
        assert_eq!(config.actions[1].charges, 2);

        let mut data = GameData::new();
        let duplicates = data.add_config(config);
        assert!(duplicates.is_empty());
        assert_eq!(data.action(16478).unwrap().name, "High Jump");
        assert_eq!(data.status_name(786), "Battle Litany");
        assert_eq!(data.action_name(999), "#999");
    }

    #[test]
    fn test_later_config_overrides() {
        let mut data = GameData::new();
        data.add_config(GameDataConfig {
            actions: vec![ActionInfo {
                id: 1,
                name: "Old".into(),
                cooldown_ms: 0,
                charges: 1,
                i18n: None,
            }],
            statuses: vec![],
        });
        let duplicates = data.add_config(GameDataConfig {
            actions: vec![ActionInfo {
                id: 1,
                name: "New".into(),
                cooldown_ms: 1000,
                charges: 1,
                i18n: None,
            }],
            statuses: vec![],
        });
        assert_eq!(duplicates, vec![1]);
        assert_eq!(data.action(1).unwrap().name, "New");
    }
}
