//! Validated policy structures

use curfew_util::{TimePoint, WeeklyCalendar};
use regex::Regex;
use std::fmt;

use crate::schema::{RawAction, RawConfig, RawRule};
use crate::validation::{ValidationError, build_calendar, compile_pattern};

/// What to do with a window matched by a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RestrictionAction {
    Minimize,
    Terminate,
    ForceNavigation,
    Ignore,
}

impl RestrictionAction {
    /// Parse a configuration identifier. Unknown identifiers yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "minimize" => Some(Self::Minimize),
            "terminate" => Some(Self::Terminate),
            "force_navigation" => Some(Self::ForceNavigation),
            "ignore" => Some(Self::Ignore),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minimize => "minimize",
            Self::Terminate => "terminate",
            Self::ForceNavigation => "force_navigation",
            Self::Ignore => "ignore",
        }
    }
}

impl fmt::Display for RestrictionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pattern that may be absent. An absent pattern matches anything,
/// including a missing value; a present one needs a present, matching value.
#[derive(Debug, Clone, Default)]
pub struct OptionalPattern(Option<Regex>);

impl OptionalPattern {
    pub fn any() -> Self {
        Self(None)
    }

    pub fn new(regex: Option<Regex>) -> Self {
        Self(regex)
    }

    pub fn is_any(&self) -> bool {
        self.0.is_none()
    }

    pub fn as_str(&self) -> Option<&str> {
        self.0.as_ref().map(Regex::as_str)
    }

    pub fn matches(&self, value: Option<&str>) -> bool {
        match &self.0 {
            None => true,
            Some(re) => value.is_some_and(|v| re.is_match(v)),
        }
    }
}

/// One `(process pattern, title pattern) -> action` rule
#[derive(Debug, Clone)]
pub struct RestrictionRule {
    process: OptionalPattern,
    title: OptionalPattern,
    action: RestrictionAction,
}

impl RestrictionRule {
    pub fn new(process: OptionalPattern, title: OptionalPattern, action: RestrictionAction) -> Self {
        Self {
            process,
            title,
            action,
        }
    }

    pub fn process(&self) -> &OptionalPattern {
        &self.process
    }

    pub fn title(&self) -> &OptionalPattern {
        &self.title
    }

    pub fn action(&self) -> RestrictionAction {
        self.action
    }

    pub fn matches(&self, process_name: Option<&str>, title: Option<&str>) -> bool {
        self.process.matches(process_name) && self.title.matches(title)
    }
}

/// Why a rule entry was left out of the policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingAction,
    UnknownAction(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAction => f.write_str("no action given"),
            Self::UnknownAction(action) => write!(f, "unknown action '{}'", action),
        }
    }
}

/// A rule entry that was dropped while parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRule {
    pub index: usize,
    pub reason: SkipReason,
}

/// Ordered rule list, evaluated first-match-wins
#[derive(Debug, Clone, Default)]
pub struct RestrictionPolicy {
    rules: Vec<RestrictionRule>,
}

impl RestrictionPolicy {
    pub fn new(rules: Vec<RestrictionRule>) -> Self {
        Self { rules }
    }

    /// Build from raw entries.
    ///
    /// Entries without an action or with an unknown action are skipped and
    /// reported; a pattern that fails to compile rejects the whole list.
    pub fn from_raw(raw: &[RawRule]) -> Result<(Self, Vec<SkippedRule>), Vec<ValidationError>> {
        let mut rules = Vec::new();
        let mut skipped = Vec::new();
        let mut errors = Vec::new();

        for (index, entry) in raw.iter().enumerate() {
            let action = match entry.action.as_ref() {
                None => {
                    skipped.push(SkippedRule {
                        index,
                        reason: SkipReason::MissingAction,
                    });
                    continue;
                }
                Some(RawAction::Name(id)) if id.is_empty() => {
                    skipped.push(SkippedRule {
                        index,
                        reason: SkipReason::MissingAction,
                    });
                    continue;
                }
                Some(RawAction::Other(value)) => {
                    tracing::warn!(rule = index, action = %value, "Skipping rule with non-string action");
                    skipped.push(SkippedRule {
                        index,
                        reason: SkipReason::UnknownAction(value.to_string()),
                    });
                    continue;
                }
                Some(RawAction::Name(id)) => match RestrictionAction::parse(id) {
                    Some(action) => action,
                    None => {
                        tracing::warn!(rule = index, action = %id, "Skipping rule with unknown action");
                        skipped.push(SkippedRule {
                            index,
                            reason: SkipReason::UnknownAction(id.to_string()),
                        });
                        continue;
                    }
                },
            };

            let process = compile_pattern(index, "process_regex", entry.process_regex.as_deref());
            let title = compile_pattern(index, "title_regex", entry.title_regex.as_deref());
            match (process, title) {
                (Ok(process), Ok(title)) => rules.push(RestrictionRule::new(
                    OptionalPattern::new(process),
                    OptionalPattern::new(title),
                    action,
                )),
                (process, title) => {
                    errors.extend(process.err());
                    errors.extend(title.err());
                }
            }
        }

        if errors.is_empty() {
            Ok((Self { rules }, skipped))
        } else {
            Err(errors)
        }
    }

    /// Rules used while no configuration has ever been loaded
    pub fn builtin() -> Self {
        const BUILTIN: &[(Option<&str>, Option<&str>, RestrictionAction)] = &[
            (
                Some("chrome|chromium"),
                Some("Minecraft|GeForce NOW"),
                RestrictionAction::ForceNavigation,
            ),
            (
                Some("firefox|iexplore|edge|opera"),
                None,
                RestrictionAction::Terminate,
            ),
            (Some(r"^minecraft(\.exe)?$"), None, RestrictionAction::Minimize),
            (Some("java"), Some("Minecraft"), RestrictionAction::Minimize),
            (Some(r"^steamwebhelper(\.exe)?$"), None, RestrictionAction::Minimize),
            (Some(r"^WindowsTerminal\.exe$"), None, RestrictionAction::Minimize),
        ];

        let rules = BUILTIN
            .iter()
            .enumerate()
            .filter_map(|(index, (process, title, action))| {
                let process = compile_pattern(index, "process_regex", *process);
                let title = compile_pattern(index, "title_regex", *title);
                match (process, title) {
                    (Ok(process), Ok(title)) => Some(RestrictionRule::new(
                        OptionalPattern::new(process),
                        OptionalPattern::new(title),
                        *action,
                    )),
                    (process, title) => {
                        for e in process.err().into_iter().chain(title.err()) {
                            tracing::error!(error = %e, "Built-in rule failed to compile");
                        }
                        None
                    }
                }
            })
            .collect();

        Self { rules }
    }

    /// Action of the first rule matching the observed window, if any
    pub fn evaluate(&self, process_name: Option<&str>, title: Option<&str>) -> Option<RestrictionAction> {
        self.rules
            .iter()
            .find(|rule| rule.matches(process_name, title))
            .map(RestrictionRule::action)
    }

    pub fn rules(&self) -> &[RestrictionRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Validated configuration snapshot, ready for the guard
#[derive(Debug, Clone)]
pub struct PolicyConfiguration {
    /// Windows during which nothing is restricted
    pub unrestricted_times: WeeklyCalendar,

    /// Rules applied during restricted time
    pub policy: RestrictionPolicy,

    /// A disabled configuration never restricts
    pub enabled: bool,

    /// Rule entries dropped while parsing
    pub skipped_rules: Vec<SkippedRule>,
}

impl PolicyConfiguration {
    /// Convert from a raw document, collecting every validation error
    pub fn from_raw(raw: RawConfig) -> Result<Self, Vec<ValidationError>> {
        let calendar = build_calendar(&raw.unrestricted_times);
        let rules = RestrictionPolicy::from_raw(&raw.rules);

        match (calendar, rules) {
            (Ok(unrestricted_times), Ok((policy, skipped_rules))) => Ok(Self {
                unrestricted_times,
                policy,
                enabled: raw.enabled,
                skipped_rules,
            }),
            (calendar, rules) => {
                let mut errors = calendar.err().unwrap_or_default();
                errors.extend(rules.err().unwrap_or_default());
                Err(errors)
            }
        }
    }

    /// Whether `point` falls inside an unrestricted window
    pub fn is_unrestricted_at(&self, point: TimePoint) -> bool {
        self.unrestricted_times.contains_point(point)
    }

    /// Restricted means enabled and outside every unrestricted window
    pub fn is_restricted_at(&self, point: TimePoint) -> bool {
        self.enabled && !self.is_unrestricted_at(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_rule(process: Option<&str>, title: Option<&str>, action: Option<&str>) -> RawRule {
        RawRule {
            process_regex: process.map(Into::into),
            title_regex: title.map(Into::into),
            action: action.map(Into::into),
        }
    }

    fn point(weekday: u8, hour: u8, minute: u8) -> TimePoint {
        TimePoint::new(weekday, hour, minute).unwrap()
    }

    #[test]
    fn test_action_parse() {
        assert_eq!(RestrictionAction::parse("minimize"), Some(RestrictionAction::Minimize));
        assert_eq!(RestrictionAction::parse("terminate"), Some(RestrictionAction::Terminate));
        assert_eq!(
            RestrictionAction::parse("force_navigation"),
            Some(RestrictionAction::ForceNavigation)
        );
        assert_eq!(RestrictionAction::parse("ignore"), Some(RestrictionAction::Ignore));
        assert_eq!(RestrictionAction::parse("explode"), None);
        assert_eq!(RestrictionAction::parse("Minimize"), None);
    }

    #[test]
    fn test_first_match_wins() {
        let (policy, _) = RestrictionPolicy::from_raw(&[
            raw_rule(None, Some("Minecraft"), Some("minimize")),
            raw_rule(Some("chrome"), None, Some("force_navigation")),
        ])
        .unwrap();

        assert_eq!(
            policy.evaluate(Some("chrome.exe"), Some("Minecraft")),
            Some(RestrictionAction::Minimize)
        );
        assert_eq!(
            policy.evaluate(Some("chrome.exe"), Some("Wikipedia")),
            Some(RestrictionAction::ForceNavigation)
        );
    }

    #[test]
    fn test_rule_without_patterns_matches_everything() {
        let (policy, _) = RestrictionPolicy::from_raw(&[raw_rule(None, None, Some("minimize"))]).unwrap();

        assert_eq!(policy.evaluate(Some("anything"), Some("at all")), Some(RestrictionAction::Minimize));
        assert_eq!(policy.evaluate(None, None), Some(RestrictionAction::Minimize));
    }

    #[test]
    fn test_present_pattern_requires_present_value() {
        let (policy, _) = RestrictionPolicy::from_raw(&[raw_rule(Some("steam"), None, Some("minimize"))]).unwrap();

        assert_eq!(policy.evaluate(None, Some("steam")), None);
        assert_eq!(policy.evaluate(Some("STEAM"), None), Some(RestrictionAction::Minimize));
    }

    #[test]
    fn test_both_patterns_must_match() {
        let (policy, _) =
            RestrictionPolicy::from_raw(&[raw_rule(Some("java"), Some("Minecraft"), Some("minimize"))]).unwrap();

        assert_eq!(policy.evaluate(Some("java"), Some("Minecraft 1.20")), Some(RestrictionAction::Minimize));
        assert_eq!(policy.evaluate(Some("java"), Some("IntelliJ IDEA")), None);
        assert_eq!(policy.evaluate(Some("python"), Some("Minecraft")), None);
    }

    #[test]
    fn test_explicit_ignore_short_circuits() {
        let (policy, _) = RestrictionPolicy::from_raw(&[
            raw_rule(None, Some("homework"), Some("ignore")),
            raw_rule(Some("chrome"), None, Some("terminate")),
        ])
        .unwrap();

        assert_eq!(
            policy.evaluate(Some("chrome"), Some("Math homework")),
            Some(RestrictionAction::Ignore)
        );
    }

    #[test]
    fn test_no_match_is_none() {
        let (policy, _) = RestrictionPolicy::from_raw(&[raw_rule(Some("steam"), None, Some("minimize"))]).unwrap();
        assert_eq!(policy.evaluate(Some("code"), Some("main.rs")), None);
        assert_eq!(RestrictionPolicy::default().evaluate(Some("code"), None), None);
    }

    #[test]
    fn test_unknown_and_missing_actions_are_skipped() {
        let (policy, skipped) = RestrictionPolicy::from_raw(&[
            raw_rule(Some("a"), None, Some("explode")),
            raw_rule(Some("b"), None, None),
            raw_rule(Some("c"), None, Some("")),
            raw_rule(Some("d"), None, Some("terminate")),
        ])
        .unwrap();

        assert_eq!(policy.len(), 1);
        assert_eq!(policy.rules()[0].process().as_str(), Some("d"));
        assert_eq!(
            skipped,
            vec![
                SkippedRule {
                    index: 0,
                    reason: SkipReason::UnknownAction("explode".into())
                },
                SkippedRule {
                    index: 1,
                    reason: SkipReason::MissingAction
                },
                SkippedRule {
                    index: 2,
                    reason: SkipReason::MissingAction
                },
            ]
        );
    }

    #[test]
    fn test_non_string_action_drops_only_that_rule() {
        let config = crate::parse_config(
            r#"{ "rules": [
                { "process_regex": "a", "action": 5 },
                { "process_regex": "firefox", "action": "terminate" }
            ] }"#,
        )
        .unwrap();

        assert_eq!(config.policy.len(), 1);
        assert_eq!(config.policy.evaluate(Some("firefox"), None), Some(RestrictionAction::Terminate));
        assert_eq!(
            config.skipped_rules,
            vec![SkippedRule {
                index: 0,
                reason: SkipReason::UnknownAction("5".into())
            }]
        );
    }

    #[test]
    fn test_skipped_rule_pattern_is_not_compiled() {
        // A broken pattern on a rule that is dropped anyway does not fail the load
        let (policy, skipped) =
            RestrictionPolicy::from_raw(&[raw_rule(Some("chrome("), None, Some("explode"))]).unwrap();
        assert!(policy.is_empty());
        assert_eq!(skipped.len(), 1);
    }

    #[test]
    fn test_invalid_pattern_rejects_policy() {
        let errors = RestrictionPolicy::from_raw(&[
            raw_rule(Some("chrome("), Some("[unclosed"), Some("minimize")),
            raw_rule(Some("fine"), None, Some("minimize")),
        ])
        .unwrap_err();

        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_builtin_rules_compile() {
        let policy = RestrictionPolicy::builtin();
        assert_eq!(policy.len(), 6);

        assert_eq!(
            policy.evaluate(Some("chrome.exe"), Some("Minecraft Classic - Google Chrome")),
            Some(RestrictionAction::ForceNavigation)
        );
        assert_eq!(policy.evaluate(Some("firefox"), Some("Mozilla Firefox")), Some(RestrictionAction::Terminate));
        assert_eq!(policy.evaluate(Some("Minecraft.exe"), None), Some(RestrictionAction::Minimize));
        assert_eq!(policy.evaluate(Some("steamwebhelper"), Some("Steam")), Some(RestrictionAction::Minimize));
        assert_eq!(policy.evaluate(Some("chrome.exe"), Some("Wikipedia")), None);
    }

    #[test]
    fn test_configuration_restriction() {
        let raw = RawConfig {
            enabled: true,
            unrestricted_times: vec![[[0, 10, 0], [0, 12, 0]]],
            rules: vec![],
        };
        let config = PolicyConfiguration::from_raw(raw).unwrap();

        assert!(!config.is_restricted_at(point(0, 11, 0)));
        assert!(config.is_restricted_at(point(0, 12, 0)));
        assert!(config.is_restricted_at(point(4, 18, 0)));
    }

    #[test]
    fn test_disabled_configuration_never_restricts() {
        let raw = RawConfig {
            enabled: false,
            ..Default::default()
        };
        let config = PolicyConfiguration::from_raw(raw).unwrap();

        assert!(!config.is_restricted_at(point(1, 3, 0)));
    }

    #[test]
    fn test_configuration_collects_span_and_pattern_errors() {
        let raw = RawConfig {
            enabled: true,
            unrestricted_times: vec![[[0, 25, 0], [0, 26, 0]]],
            rules: vec![raw_rule(Some("("), None, Some("minimize"))],
        };
        let errors = PolicyConfiguration::from_raw(raw).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
