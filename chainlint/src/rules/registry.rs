//! Rule catalog: strongly typed metadata for every rule, plus construction of
//! the active rule set for a file.

use crate::config::Config;
use crate::rules::Rule;

/// Canonical high-level category for a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleCategory {
    /// The code is likely wrong at runtime.
    Problem,
    /// The code works but should be improved.
    Suggestion,
}

impl RuleCategory {
    /// Returns the canonical display form for this category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RuleCategory::Problem => "Problem",
            RuleCategory::Suggestion => "Suggestion",
        }
    }
}

/// Default severity for a rule when no override applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleSeverity {
    /// Highest severity.
    High,
    /// Medium severity.
    Medium,
    /// Low severity.
    Low,
}

impl RuleSeverity {
    /// Returns the canonical display form for this severity.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RuleSeverity::High => "HIGH",
            RuleSeverity::Medium => "MEDIUM",
            RuleSeverity::Low => "LOW",
        }
    }
}

/// Strongly typed rule metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleDescriptor {
    /// Stable rule identifier (for example `CHL-P101`).
    pub id: &'static str,
    /// Stable kebab-case rule name.
    pub name: &'static str,
    /// Rule category.
    pub category: RuleCategory,
    /// Default severity for the rule.
    pub default_severity: RuleSeverity,
    /// Documentation path for end-user guidance.
    pub docs_url: &'static str,
}

const fn rule(
    id: &'static str,
    name: &'static str,
    category: RuleCategory,
    default_severity: RuleSeverity,
    docs_url: &'static str,
) -> RuleDescriptor {
    RuleDescriptor {
        id,
        name,
        category,
        default_severity,
        docs_url,
    }
}

/// Continuation invoked more than once along an execution path.
pub static META_MULTIPLE_NEXT: RuleDescriptor = rule(
    "CHL-P101",
    "no-multiple-next",
    RuleCategory::Problem,
    RuleSeverity::High,
    "docs/rules/no-multiple-next.md",
);

/// `c.req.param()` naming a parameter absent from the route path.
pub static META_PARAM_NAME_MISMATCH: RuleDescriptor = rule(
    "CHL-P102",
    "param-name-mismatch",
    RuleCategory::Problem,
    RuleSeverity::High,
    "docs/rules/param-name-mismatch.md",
);

/// Context response value discarded.
pub static META_UNUSED_RESPONSE: RuleDescriptor = rule(
    "CHL-P103",
    "no-unused-context-response",
    RuleCategory::Problem,
    RuleSeverity::Medium,
    "docs/rules/no-unused-context-response.md",
);

/// Route registrations for one path not grouped / out of method order.
pub static META_ROUTE_GROUPING: RuleDescriptor = rule(
    "CHL-S201",
    "route-grouping",
    RuleCategory::Suggestion,
    RuleSeverity::Low,
    "docs/rules/route-grouping.md",
);

/// Global middleware registered after a route definition.
pub static META_MIDDLEWARE_PLACEMENT: RuleDescriptor = rule(
    "CHL-S202",
    "global-middleware-placement",
    RuleCategory::Suggestion,
    RuleSeverity::Medium,
    "docs/rules/global-middleware-placement.md",
);

/// `process.env` used inside a handler.
pub static META_PROCESS_ENV: RuleDescriptor = rule(
    "CHL-S203",
    "no-process-env",
    RuleCategory::Suggestion,
    RuleSeverity::Low,
    "docs/rules/no-process-env.md",
);

/// Generic `Error` thrown with an HTTP reason phrase.
pub static META_HTTP_EXCEPTION: RuleDescriptor = rule(
    "CHL-S204",
    "prefer-http-exception",
    RuleCategory::Suggestion,
    RuleSeverity::Low,
    "docs/rules/prefer-http-exception.md",
);

/// Every rule the toolkit ships, in catalog order.
pub static CATALOG: &[&RuleDescriptor] = &[
    &META_MULTIPLE_NEXT,
    &META_PARAM_NAME_MISMATCH,
    &META_UNUSED_RESPONSE,
    &META_ROUTE_GROUPING,
    &META_MIDDLEWARE_PLACEMENT,
    &META_PROCESS_ENV,
    &META_HTTP_EXCEPTION,
];

/// Looks up a catalog entry by rule id or kebab-case name.
#[must_use]
pub fn find_descriptor(key: &str) -> Option<&'static RuleDescriptor> {
    CATALOG
        .iter()
        .find(|d| d.id.eq_ignore_ascii_case(key) || d.name.eq_ignore_ascii_case(key))
        .copied()
}

fn is_ignored(descriptor: &RuleDescriptor, config: &Config) -> bool {
    config.chainlint.ignore.as_ref().is_some_and(|ignored| {
        ignored
            .iter()
            .any(|key| descriptor.id.eq_ignore_ascii_case(key) || descriptor.name.eq_ignore_ascii_case(key))
    })
}

/// Builds fresh instances of every rule enabled by `config`.
///
/// Rule instances carry per-file state, so a new set is built for each file.
#[must_use]
pub fn build_rules(config: &Config) -> Vec<Box<dyn Rule>> {
    let mut rules: Vec<Box<dyn Rule>> = Vec::new();
    if !is_ignored(&META_MULTIPLE_NEXT, config) {
        rules.push(Box::new(super::flow::MultipleNextRule::new()));
    }
    if !is_ignored(&META_PARAM_NAME_MISMATCH, config) {
        rules.push(Box::new(super::routing::ParamNameMismatchRule::new()));
    }
    if !is_ignored(&META_UNUSED_RESPONSE, config) {
        rules.push(Box::new(super::handler::UnusedResponseRule::new()));
    }
    if !is_ignored(&META_ROUTE_GROUPING, config) {
        rules.push(Box::new(super::routing::RouteGroupingRule::new(config)));
    }
    if !is_ignored(&META_MIDDLEWARE_PLACEMENT, config) {
        rules.push(Box::new(super::routing::MiddlewarePlacementRule::new(config)));
    }
    if !is_ignored(&META_PROCESS_ENV, config) {
        rules.push(Box::new(super::handler::ProcessEnvRule::new()));
    }
    if !is_ignored(&META_HTTP_EXCEPTION, config) {
        rules.push(Box::new(super::handler::HttpExceptionRule::new()));
    }
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn catalog_ids_are_unique() {
        for (i, a) in CATALOG.iter().enumerate() {
            for b in &CATALOG[i + 1..] {
                assert_ne!(a.id, b.id);
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn lookup_accepts_id_and_name() {
        assert_eq!(
            find_descriptor("CHL-P101").map(|d| d.name),
            Some("no-multiple-next")
        );
        assert_eq!(
            find_descriptor("no-multiple-next").map(|d| d.id),
            Some("CHL-P101")
        );
        assert!(find_descriptor("no-such-rule").is_none());
    }

    #[test]
    fn ignore_list_drops_rules() {
        let full = build_rules(&Config::default()).len();
        let mut config = Config::default();
        config.chainlint.ignore = Some(vec!["no-multiple-next".to_owned(), "CHL-S204".to_owned()]);
        assert_eq!(build_rules(&config).len(), full - 2);
    }
}
