// SPDX-License-Identifier: GPL-2.0-only

//! Window rules (4.I): match by identifier/title/window type/sandbox tags,
//! resolve per-view property overrides, fire on-first-map actions.

/// `window_type` as surfaced by xdg-shell/xwayland (closed set, spec.md §9
/// note on keeping string-keyed dispatch enum-keyed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowType {
    Normal,
    Dialog,
    Utility,
    Splash,
    Toolbar,
    Menu,
    PopupMenu,
    DropdownMenu,
    Tooltip,
    Notification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tristate {
    Unspecified,
    Yes,
    No,
}

impl Default for Tristate {
    fn default() -> Self {
        Tristate::Unspecified
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecorationMode {
    Unspecified,
    Ssd,
    Csd,
}

/// The closed set of rule-resolvable properties (spec.md §4.I). Kept as an
/// enum rather than string-keyed lookup per the REDESIGN FLAGS note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    ServerDecoration,
    SkipTaskbar,
    SkipWindowSwitcher,
    IgnoreFocusRequest,
    IgnoreConfigureRequest,
    FixedPosition,
    WantAbsorbedModifierReleaseEvents,
    IconPreferClient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyValue {
    Unspecified,
    Yes,
    No,
}

impl Default for PropertyValue {
    fn default() -> Self {
        PropertyValue::Unspecified
    }
}

/// Query describing the view a rule is matched against.
#[derive(Debug, Clone)]
pub struct MatchQuery<'a> {
    pub identifier: &'a str,
    pub title: &'a str,
    pub window_type: Option<WindowType>,
    pub sandbox_engine: Option<&'a str>,
    pub sandbox_app_id: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Maximize,
    Minimize,
    Fullscreen,
    Close,
    Center,
}

#[derive(Debug, Clone)]
pub struct WindowRule {
    pub identifier_glob: Option<String>,
    pub title_glob: Option<String>,
    pub window_type: Option<WindowType>,
    pub sandbox_engine: Option<String>,
    pub sandbox_app_id: Option<String>,
    pub match_once: bool,
    pub on_first_map: Vec<Action>,
    pub properties: Vec<(Property, PropertyValue)>,
}

impl WindowRule {
    fn matches_field(glob: &Option<String>, value: &str) -> bool {
        match glob {
            None => true,
            Some(pattern) => glob_match_ci(pattern, value),
        }
    }

    /// All configured fields must match, case-insensitively (spec.md §4.I).
    pub fn matches(&self, query: &MatchQuery) -> bool {
        if !Self::matches_field(&self.identifier_glob, query.identifier) {
            return false;
        }
        if !Self::matches_field(&self.title_glob, query.title) {
            return false;
        }
        if let Some(wt) = self.window_type {
            if query.window_type != Some(wt) {
                return false;
            }
        }
        if let Some(engine) = &self.sandbox_engine {
            if query.sandbox_engine.map(str::to_lowercase) != Some(engine.to_lowercase()) {
                return false;
            }
        }
        if let Some(app_id) = &self.sandbox_app_id {
            if query.sandbox_app_id.map(str::to_lowercase) != Some(app_id.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

/// Very small glob matcher supporting `*` and `?`, case-insensitive, which
/// is all `rc.xml`'s identifier/title matching needs (the real XML parser
/// producing `WindowRule`s is out of scope per spec.md §6).
fn glob_match_ci(pattern: &str, value: &str) -> bool {
    fn rec(p: &[char], v: &[char]) -> bool {
        match p.first() {
            None => v.is_empty(),
            Some('*') => rec(&p[1..], v) || (!v.is_empty() && rec(p, &v[1..])),
            Some('?') => !v.is_empty() && rec(&p[1..], &v[1..]),
            Some(c) => match v.first() {
                Some(vc) if vc.eq_ignore_ascii_case(c) => rec(&p[1..], &v[1..]),
                _ => false,
            },
        }
    }
    let p: Vec<char> = pattern.chars().collect();
    let v: Vec<char> = value.chars().collect();
    rec(&p, &v)
}

/// Resolves window-rule properties against a registered set of rules for
/// one query. Iteration order is reverse (later-defined rules override
/// earlier ones); first non-`Unspecified` hit wins (spec.md §4.I).
pub struct RuleSet {
    pub rules: Vec<WindowRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<WindowRule>) -> Self {
        Self { rules }
    }

    /// `match_once` skips a rule if any *other* view matching the same
    /// query already exists.
    pub fn matching_rules<'a>(
        &'a self,
        query: &MatchQuery,
        other_view_matches: impl Fn(&WindowRule) -> bool,
    ) -> Vec<&'a WindowRule> {
        self.rules
            .iter()
            .filter(|rule| rule.matches(query))
            .filter(|rule| !rule.match_once || !other_view_matches(rule))
            .collect()
    }

    pub fn resolve_property(&self, query: &MatchQuery, property: Property) -> PropertyValue {
        for rule in self.matching_rules(query, |_| false).into_iter().rev() {
            for (p, v) in &rule.properties {
                if *p == property && *v != PropertyValue::Unspecified {
                    return *v;
                }
            }
        }
        PropertyValue::Unspecified
    }

    pub fn on_first_map_actions(&self, query: &MatchQuery) -> Vec<Action> {
        self.matching_rules(query, |_| false)
            .into_iter()
            .flat_map(|rule| rule.on_first_map.iter().copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(identifier: &str, properties: Vec<(Property, PropertyValue)>) -> WindowRule {
        WindowRule {
            identifier_glob: Some(identifier.to_string()),
            title_glob: None,
            window_type: None,
            sandbox_engine: None,
            sandbox_app_id: None,
            match_once: false,
            on_first_map: Vec::new(),
            properties,
        }
    }

    #[test]
    fn glob_matches_wildcard_case_insensitive() {
        assert!(glob_match_ci("Foot*", "footclient"));
        assert!(glob_match_ci("*term*", "xterm"));
        assert!(!glob_match_ci("Foot", "footclient"));
    }

    #[test]
    fn later_rule_overrides_earlier_for_same_property() {
        let rules = RuleSet::new(vec![
            rule("*", vec![(Property::SkipTaskbar, PropertyValue::No)]),
            rule("*", vec![(Property::SkipTaskbar, PropertyValue::Yes)]),
        ]);
        let query = MatchQuery {
            identifier: "foot",
            title: "",
            window_type: None,
            sandbox_engine: None,
            sandbox_app_id: None,
        };
        assert_eq!(
            rules.resolve_property(&query, Property::SkipTaskbar),
            PropertyValue::Yes
        );
    }

    #[test]
    fn first_non_unspecified_wins_when_later_rule_doesnt_set_it() {
        let rules = RuleSet::new(vec![
            rule("*", vec![(Property::SkipTaskbar, PropertyValue::Yes)]),
            rule("*", vec![(Property::IgnoreFocusRequest, PropertyValue::Yes)]),
        ]);
        let query = MatchQuery {
            identifier: "foot",
            title: "",
            window_type: None,
            sandbox_engine: None,
            sandbox_app_id: None,
        };
        assert_eq!(
            rules.resolve_property(&query, Property::SkipTaskbar),
            PropertyValue::Yes
        );
    }

    #[test]
    fn unspecified_is_final_fallback() {
        let rules = RuleSet::new(vec![]);
        let query = MatchQuery {
            identifier: "foot",
            title: "",
            window_type: None,
            sandbox_engine: None,
            sandbox_app_id: None,
        };
        assert_eq!(
            rules.resolve_property(&query, Property::SkipTaskbar),
            PropertyValue::Unspecified
        );
    }
}
