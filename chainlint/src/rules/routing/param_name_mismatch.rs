//! `c.req.param("name")` must name a parameter the route path declares.

use regex::Regex;
use std::sync::OnceLock;

use crate::ast::{for_each_expr, for_each_expr_in, Expr, Function, FunctionBody, MemberProperty};
use crate::rules::registry::{RuleDescriptor, META_PARAM_NAME_MISMATCH};
use crate::rules::{create_finding, Context, Finding, Rule};

/// Routing methods whose handlers are validated.
const TARGET_METHODS: &[&str] = &["get", "post", "put", "patch", "delete", "all"];

/// Returns the compiled `:param` placeholder regex (optional `?` suffix).
fn route_param_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| {
        Regex::new(r":([a-zA-Z0-9_]+)(\?)?").expect("Invalid route param regex pattern")
    })
}

fn route_params(path: &str) -> Vec<&str> {
    route_param_re()
        .captures_iter(path)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

/// Rule checking `c.req.param()` argument names against the route path.
pub struct ParamNameMismatchRule;

impl ParamNameMismatchRule {
    /// Creates a fresh rule instance.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn validate_handler(
        func: &Function,
        context_param: &str,
        defined: &[&str],
        route_path: &str,
        context: &Context,
        findings: &mut Vec<Finding>,
    ) {
        let mut visit = |expr: &Expr| {
            let Expr::Call {
                callee, arguments, ..
            } = expr
            else {
                return;
            };
            if !is_req_param_call(callee, context_param) {
                return;
            }
            let Some(first) = arguments.first() else {
                return;
            };
            let Expr::String { value, span } = first else {
                return;
            };
            if defined.contains(&value.as_str()) {
                return;
            }
            let expected = if defined.is_empty() {
                "(none)".to_owned()
            } else {
                defined.join(", ")
            };
            findings.push(create_finding(
                format!(
                    "Parameter '{value}' is not defined in the route path '{route_path}'. Expected one of: {expected}"
                ),
                &META_PARAM_NAME_MISMATCH,
                context,
                *span,
            ));
        };
        match &func.body {
            FunctionBody::Block(body) => {
                for stmt in body {
                    for_each_expr(stmt, &mut visit);
                }
            }
            FunctionBody::Expr(expr) => for_each_expr_in(expr, &mut visit),
        }
    }
}

/// Matches `<ctx>.req.param` as a callee shape.
fn is_req_param_call(callee: &Expr, context_param: &str) -> bool {
    let Expr::Member {
        object, property, ..
    } = callee
    else {
        return false;
    };
    if property.as_static() != Some("param") {
        return false;
    }
    let Expr::Member {
        object: inner,
        property: MemberProperty::Static(req),
        ..
    } = object.as_ref()
    else {
        return false;
    };
    req == "req" && inner.as_identifier() == Some(context_param)
}

impl Default for ParamNameMismatchRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for ParamNameMismatchRule {
    fn name(&self) -> &'static str {
        "ParamNameMismatchRule"
    }

    fn descriptor(&self) -> &'static RuleDescriptor {
        &META_PARAM_NAME_MISMATCH
    }

    fn enter_expr(&mut self, expr: &Expr, context: &Context) -> Option<Vec<Finding>> {
        let Expr::Call {
            callee, arguments, ..
        } = expr
        else {
            return None;
        };
        let Expr::Member { property, .. } = callee.as_ref() else {
            return None;
        };
        let method = property.as_static()?;
        if !TARGET_METHODS.contains(&method) || arguments.len() < 2 {
            return None;
        }
        let route_path = arguments.first().and_then(Expr::as_string)?.to_owned();
        let defined = route_params(&route_path);

        let mut findings = Vec::new();
        for argument in &arguments[1..] {
            let Expr::Function(func) = argument else {
                continue;
            };
            let Some(context_param) = func.params.first().and_then(|p| p.as_identifier()) else {
                continue;
            };
            Self::validate_handler(
                func,
                context_param.as_str(),
                &defined,
                &route_path,
                context,
                &mut findings,
            );
        }
        if findings.is_empty() {
            None
        } else {
            Some(findings)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::run_rule;

    fn check(source: &str) -> Vec<Finding> {
        run_rule(Box::new(ParamNameMismatchRule::new()), source)
    }

    #[test]
    fn matching_param_is_clean() {
        let findings = check(
            "app.get('/users/:id', (c) => {
                const id = c.req.param('id');
                return c.json({ id });
            });",
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn unknown_param_reports_with_expected_list() {
        let findings = check(
            "app.get('/users/:id/posts/:postId', (c) => {
                const userId = c.req.param('userId');
                return c.json({ userId });
            });",
        );
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("'userId'"));
        assert!(findings[0].message.contains("id, postId"));
        assert_eq!(findings[0].line, 2);
    }

    #[test]
    fn route_without_params_reports_none_placeholder() {
        let findings = check(
            "app.get('/health', (c) => {
                return c.json({ v: c.req.param('id') });
            });",
        );
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("(none)"));
    }

    #[test]
    fn optional_param_suffix_still_matches() {
        let findings = check(
            "app.get('/items/:id?', (c) => {
                return c.text(c.req.param('id'));
            });",
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn other_objects_are_not_confused_with_the_context() {
        let findings = check(
            "app.get('/users/:id', (c) => {
                const other = makeThing();
                other.req.param('nope');
                return c.text('ok');
            });",
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn middleware_argument_before_handler_is_also_checked() {
        let findings = check(
            "app.get('/users/:id', auth, (c) => {
                return c.text(c.req.param('uid'));
            });",
        );
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn dynamic_param_names_are_ignored() {
        let findings = check(
            "app.get('/users/:id', (c) => {
                return c.text(c.req.param(key));
            });",
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn nested_callbacks_inside_handlers_are_visited() {
        let findings = check(
            "app.get('/users/:id', (c) => {
                return withTx(() => {
                    return c.req.param('uid');
                });
            });",
        );
        assert_eq!(findings.len(), 1);
    }
}
