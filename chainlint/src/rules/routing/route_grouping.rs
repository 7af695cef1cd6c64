//! Route registrations for one path should sit together, with HTTP methods
//! in a canonical order.

use compact_str::CompactString;
use rustc_hash::FxHashSet;

use crate::ast::{Expr, Function, FunctionBody, Span, Stmt};
use crate::config::Config;
use crate::rules::registry::{RuleDescriptor, META_ROUTE_GROUPING};
use crate::rules::{create_finding, Context, Finding, Rule};

/// Default method order; `use` first so middleware precedes handlers.
const DEFAULT_ORDER: &[&str] = &[
    "use", "all", "get", "post", "put", "patch", "delete", "options", "on",
];

#[derive(Debug, Clone)]
struct MethodRef {
    name: CompactString,
    span: Span,
}

#[derive(Debug)]
struct RouteDefinition {
    path: String,
    methods: Vec<MethodRef>,
}

/// Rule enforcing grouping and method ordering of route registrations.
pub struct RouteGroupingRule {
    order: Vec<String>,
}

impl RouteGroupingRule {
    /// Creates the rule with the configured method order.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let order = config.chainlint.method_order.clone().unwrap_or_else(|| {
            DEFAULT_ORDER.iter().map(|m| (*m).to_owned()).collect()
        });
        Self { order }
    }

    fn order_index(&self, name: &str) -> Option<usize> {
        self.order.iter().position(|m| m == name)
    }

    /// Collects the ordered method names of a chained registration
    /// (`app.get(...).post(...)` yields `get`, `post`).
    fn method_chain(&self, call: &Expr) -> Vec<MethodRef> {
        let mut methods = Vec::new();
        let mut current = call;
        while let Expr::Call { callee, .. } = current {
            if let Expr::Member {
                object,
                property,
                span,
            } = callee.as_ref()
            {
                if let Some(name) = property.as_static() {
                    if self.order_index(name).is_some() {
                        methods.push(MethodRef {
                            name: CompactString::from(name),
                            span: *span,
                        });
                    }
                }
                current = object;
            } else {
                break;
            }
        }
        methods.reverse();
        methods
    }

    /// The route path key of a registration chain: the first argument of the
    /// innermost routing call. Non-literal paths key on their identifier
    /// text; anything unrepresentable skips the route.
    fn route_path(&self, call: &Expr) -> Option<String> {
        let mut stack = Vec::new();
        let mut current = call;
        while let Expr::Call { callee, .. } = current {
            stack.push(current);
            if let Expr::Member { object, .. } = callee.as_ref() {
                current = object;
            } else {
                break;
            }
        }
        while let Some(link) = stack.pop() {
            let Expr::Call {
                callee, arguments, ..
            } = link
            else {
                continue;
            };
            let Expr::Member { property, .. } = callee.as_ref() else {
                continue;
            };
            let Some(name) = property.as_static() else {
                continue;
            };
            if self.order_index(name).is_none() {
                continue;
            }
            if let Some(first) = arguments.first() {
                return path_key(first);
            }
        }
        None
    }

    fn check_block(&self, body: &[Stmt], context: &Context) -> Option<Vec<Finding>> {
        let mut routes = Vec::new();
        for stmt in body {
            let Stmt::Expr { expr, .. } = stmt else {
                continue;
            };
            if !matches!(expr, Expr::Call { .. }) {
                continue;
            }
            let methods = self.method_chain(expr);
            if methods.is_empty() {
                continue;
            }
            let Some(path) = self.route_path(expr) else {
                continue;
            };
            routes.push(RouteDefinition { path, methods });
        }

        let mut findings = Vec::new();

        // Grouping: a path re-appearing after another path was registered in
        // between means its registrations are scattered.
        let mut seen_paths: FxHashSet<&str> = FxHashSet::default();
        let mut last_path: Option<&str> = None;
        for route in &routes {
            if last_path != Some(route.path.as_str()) {
                if seen_paths.contains(route.path.as_str()) {
                    findings.push(create_finding(
                        format!("Routes for path '{}' should be grouped together.", route.path),
                        &META_ROUTE_GROUPING,
                        context,
                        route.methods[0].span,
                    ));
                }
                seen_paths.insert(route.path.as_str());
                last_path = Some(route.path.as_str());
            }
        }

        // Ordering: within one path, methods must follow the configured
        // order. Insertion order of paths is kept so reports stay stable.
        let mut per_path: Vec<(&str, Vec<&MethodRef>)> = Vec::new();
        for route in &routes {
            match per_path.iter_mut().find(|(p, _)| *p == route.path) {
                Some((_, methods)) => methods.extend(route.methods.iter()),
                None => per_path.push((route.path.as_str(), route.methods.iter().collect())),
            }
        }
        for (path, methods) in &per_path {
            let mut reported: FxHashSet<usize> = FxHashSet::default();
            for i in 0..methods.len() {
                let Some(current_index) = self.order_index(&methods[i].name) else {
                    continue;
                };
                for j in i + 1..methods.len() {
                    if reported.contains(&j) {
                        continue;
                    }
                    let Some(later_index) = self.order_index(&methods[j].name) else {
                        continue;
                    };
                    if current_index > later_index {
                        findings.push(create_finding(
                            format!(
                                "Method '{}' should be before '{}' for path '{}'.",
                                methods[j].name, methods[i].name, path
                            ),
                            &META_ROUTE_GROUPING,
                            context,
                            methods[j].span,
                        ));
                        reported.insert(j);
                    }
                }
            }
        }

        if findings.is_empty() {
            None
        } else {
            Some(findings)
        }
    }
}

fn path_key(expr: &Expr) -> Option<String> {
    match expr {
        Expr::String { value, .. } => Some(value.clone()),
        Expr::Literal { raw, .. } => Some(raw.to_string()),
        Expr::Identifier { name, .. } => Some(name.to_string()),
        _ => None,
    }
}

impl Rule for RouteGroupingRule {
    fn name(&self) -> &'static str {
        "RouteGroupingRule"
    }

    fn descriptor(&self) -> &'static RuleDescriptor {
        &META_ROUTE_GROUPING
    }

    fn enter_program(
        &mut self,
        program: &crate::ast::Program,
        context: &Context,
    ) -> Option<Vec<Finding>> {
        self.check_block(&program.body, context)
    }

    fn enter_stmt(&mut self, stmt: &Stmt, context: &Context) -> Option<Vec<Finding>> {
        match stmt {
            Stmt::Block { body, .. } => self.check_block(body, context),
            _ => None,
        }
    }

    fn code_path_start(&mut self, func: &Function, context: &Context) -> Option<Vec<Finding>> {
        match &func.body {
            FunctionBody::Block(body) => self.check_block(body, context),
            FunctionBody::Expr(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{run_rule, run_rule_with_config};

    fn check(source: &str) -> Vec<Finding> {
        run_rule(Box::new(RouteGroupingRule::new(&Config::default())), source)
    }

    #[test]
    fn grouped_routes_are_clean() {
        let findings = check(
            "app.get('/users', listUsers);
             app.post('/users', createUser);
             app.get('/posts', listPosts);",
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn scattered_path_reports_grouping() {
        let findings = check(
            "app.get('/users', listUsers);
             app.get('/posts', listPosts);
             app.post('/users', createUser);",
        );
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("'/users'"));
        assert_eq!(findings[0].line, 3);
    }

    #[test]
    fn method_out_of_order_reports() {
        let findings = check(
            "app.post('/users', createUser);
             app.get('/users', listUsers);",
        );
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("'get' should be before 'post'"));
        assert_eq!(findings[0].line, 2);
    }

    #[test]
    fn chained_registration_keeps_one_path() {
        let findings = check("app.get('/users', listUsers).post(createUser);");
        assert!(findings.is_empty());
    }

    #[test]
    fn chained_registration_out_of_order_reports() {
        let findings = check("app.post('/users', createUser).get(listUsers);");
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("'get'"));
    }

    #[test]
    fn routes_inside_function_bodies_are_checked() {
        let findings = check(
            "function setup(app) {
                app.get('/a', h);
                app.get('/b', h);
                app.post('/a', h);
            }",
        );
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn custom_method_order_is_honored() {
        let mut config = Config::default();
        config.chainlint.method_order =
            Some(vec!["post".to_owned(), "get".to_owned()]);
        let findings = run_rule_with_config(
            Box::new(RouteGroupingRule::new(&config)),
            "app.post('/users', createUser);
             app.get('/users', listUsers);",
            config.clone(),
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn unrelated_calls_are_ignored() {
        let findings = check(
            "console.log('ready');
             db.get('key');
             app.get('/a', h);",
        );
        // `db.get('key')` keys on path 'key' and never repeats; no report.
        assert!(findings.is_empty());
    }
}
