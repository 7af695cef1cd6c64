//! Global middleware must be registered before any route definitions on the
//! same application instance.

use compact_str::CompactString;
use rustc_hash::FxHashMap;

use crate::ast::{Expr, Stmt};
use crate::config::Config;
use crate::rules::registry::{RuleDescriptor, META_MIDDLEWARE_PLACEMENT};
use crate::rules::routing::ROUTE_METHODS;
use crate::rules::{create_finding, Context, Finding, Rule};

/// Default application constructor names recognized as instances.
const DEFAULT_CONSTRUCTORS: &[&str] = &["Hono"];

/// Rule flagging global `use(...)` calls that follow a route definition.
pub struct MiddlewarePlacementRule {
    constructors: Vec<String>,
    /// instance name -> whether a route was already defined on it.
    instances: FxHashMap<CompactString, bool>,
}

impl MiddlewarePlacementRule {
    /// Creates the rule with the configured constructor names.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let constructors = config.chainlint.app_constructors.clone().unwrap_or_else(|| {
            DEFAULT_CONSTRUCTORS.iter().map(|c| (*c).to_owned()).collect()
        });
        Self {
            constructors,
            instances: FxHashMap::default(),
        }
    }

    /// `use()` with no path, a non-literal first argument, or the `'*'` path
    /// applies to every route.
    fn is_global_use(arguments: &[Expr]) -> bool {
        match arguments.first() {
            None => true,
            Some(Expr::String { value, .. }) => value == "*",
            Some(Expr::Literal { .. }) => false,
            Some(_) => true,
        }
    }
}

impl Rule for MiddlewarePlacementRule {
    fn name(&self) -> &'static str {
        "MiddlewarePlacementRule"
    }

    fn descriptor(&self) -> &'static RuleDescriptor {
        &META_MIDDLEWARE_PLACEMENT
    }

    fn enter_stmt(&mut self, stmt: &Stmt, _context: &Context) -> Option<Vec<Finding>> {
        let Stmt::VarDecl { declarators, .. } = stmt else {
            return None;
        };
        for declarator in declarators {
            let Some(name) = declarator.name.as_identifier() else {
                continue;
            };
            let Some(Expr::New { callee, .. }) = &declarator.init else {
                continue;
            };
            let Some(ctor) = callee.as_identifier() else {
                continue;
            };
            if self.constructors.iter().any(|c| c == ctor) {
                self.instances.insert(name.clone(), false);
            }
        }
        None
    }

    fn enter_expr(&mut self, expr: &Expr, context: &Context) -> Option<Vec<Finding>> {
        let Expr::Call {
            callee,
            arguments,
            span,
        } = expr
        else {
            return None;
        };
        let Expr::Member {
            object, property, ..
        } = callee.as_ref()
        else {
            return None;
        };
        let instance = object.as_identifier()?;
        let route_defined = self.instances.get_mut(instance)?;
        let method = property.as_static()?;

        if method == "use" {
            if Self::is_global_use(arguments) && *route_defined {
                return Some(vec![create_finding(
                    "Global middleware (e.g., `app.use(logger)` or `app.use('*', logger)`) \
                     should be placed before any route definitions.",
                    &META_MIDDLEWARE_PLACEMENT,
                    context,
                    *span,
                )]);
            }
        } else if ROUTE_METHODS.contains(&method) {
            *route_defined = true;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{run_rule, run_rule_with_config};

    fn check(source: &str) -> Vec<Finding> {
        run_rule(
            Box::new(MiddlewarePlacementRule::new(&Config::default())),
            source,
        )
    }

    #[test]
    fn middleware_before_routes_is_clean() {
        let findings = check(
            "const app = new Hono();
             app.use(logger);
             app.get('/a', h);",
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn global_middleware_after_route_reports() {
        let findings = check(
            "const app = new Hono();
             app.get('/a', h);
             app.use(logger);",
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 3);
    }

    #[test]
    fn star_path_counts_as_global() {
        let findings = check(
            "const app = new Hono();
             app.get('/a', h);
             app.use('*', logger);",
        );
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn scoped_path_middleware_is_allowed_after_routes() {
        let findings = check(
            "const app = new Hono();
             app.get('/a', h);
             app.use('/admin', auth);",
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn untracked_objects_are_ignored() {
        let findings = check(
            "router.get('/a', h);
             router.use(logger);",
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn instances_are_tracked_independently() {
        let findings = check(
            "const app = new Hono();
             const admin = new Hono();
             app.get('/a', h);
             admin.use(auth);
             admin.get('/panel', h);",
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn custom_constructor_names_are_recognized() {
        let mut config = Config::default();
        config.chainlint.app_constructors = Some(vec!["Router".to_owned()]);
        let findings = run_rule_with_config(
            Box::new(MiddlewarePlacementRule::new(&config)),
            "const app = new Router();
             app.get('/a', h);
             app.use(logger);",
            config.clone(),
        );
        assert_eq!(findings.len(), 1);
    }
}
