//! Raw configuration schema (as parsed from JSON or TOML)

use serde::{Deserialize, Serialize};

/// A `[weekday, hour, minute]` triple, unvalidated
pub type RawTimePoint = [i64; 3];

/// A `[start, end]` pair of triples, unvalidated
pub type RawTimeSpan = [RawTimePoint; 2];

/// Raw configuration document
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Master switch; a disabled configuration never restricts
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Weekly windows during which nothing is restricted
    #[serde(default)]
    pub unrestricted_times: Vec<RawTimeSpan>,

    /// Restriction rules in priority order
    #[serde(default)]
    pub rules: Vec<RawRule>,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            unrestricted_times: Vec::new(),
            rules: Vec::new(),
        }
    }
}

/// Raw rule entry
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawRule {
    /// Pattern searched in the process name (case-insensitive)
    pub process_regex: Option<String>,

    /// Pattern searched in the window title (case-insensitive)
    pub title_regex: Option<String>,

    /// "minimize", "terminate", "force_navigation" or "ignore"
    pub action: Option<RawAction>,
}

/// Action field of a rule entry.
///
/// Anything that is not a string is kept so the rule can be dropped on its
/// own instead of failing the whole document.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawAction {
    Name(String),
    Other(serde_json::Value),
}

impl RawAction {
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Other(_) => None,
        }
    }
}

impl From<&str> for RawAction {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

fn default_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_document() {
        let json = r#"{
            "enabled": false,
            "unrestricted_times": [
                [[0, 10, 0], [0, 12, 0]],
                [[1, 14, 0], [1, 16, 0]]
            ],
            "rules": [
                { "title_regex": "Minecraft", "action": "minimize" },
                { "process_regex": "chrome", "action": "force_navigation" }
            ]
        }"#;

        let config: RawConfig = serde_json::from_str(json).unwrap();
        assert!(!config.enabled);
        assert_eq!(config.unrestricted_times.len(), 2);
        assert_eq!(config.unrestricted_times[1], [[1, 14, 0], [1, 16, 0]]);
        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.rules[0].title_regex.as_deref(), Some("Minecraft"));
        assert!(config.rules[0].process_regex.is_none());
    }

    #[test]
    fn enabled_defaults_to_true() {
        let config: RawConfig = serde_json::from_str("{}").unwrap();
        assert!(config.enabled);
        assert!(config.unrestricted_times.is_empty());
        assert!(config.rules.is_empty());
    }

    #[test]
    fn rule_without_action_still_parses() {
        let config: RawConfig =
            serde_json::from_str(r#"{ "rules": [ { "process_regex": "steam" } ] }"#).unwrap();
        assert!(config.rules[0].action.is_none());
    }

    #[test]
    fn non_string_action_still_parses() {
        let config: RawConfig = serde_json::from_str(
            r#"{ "rules": [ { "process_regex": "a", "action": 5 }, { "action": ["minimize"] } ] }"#,
        )
        .unwrap();
        assert_eq!(config.rules[0].action, Some(RawAction::Other(serde_json::json!(5))));
        assert!(config.rules[1].action.as_ref().is_some_and(|a| a.as_name().is_none()));
    }

    #[test]
    fn triple_with_wrong_arity_is_rejected() {
        let json = r#"{ "unrestricted_times": [ [[0, 10], [0, 12, 0]] ] }"#;
        assert!(serde_json::from_str::<RawConfig>(json).is_err());
    }

    #[test]
    fn parse_toml_document() {
        let toml_str = r#"
            enabled = true
            unrestricted_times = [
                [[5, 10, 0], [5, 21, 0]],
            ]

            [[rules]]
            process_regex = "firefox"
            action = "terminate"
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.unrestricted_times, vec![[[5, 10, 0], [5, 21, 0]]]);
        assert_eq!(config.rules[0].action, Some(RawAction::from("terminate")));
    }
}
