//! Handlers should read configuration from `c.env`, not `process.env`, so
//! the code keeps working on runtimes that have no Node process global.

use crate::ast::{Expr, Function};
use crate::rules::registry::{RuleDescriptor, META_PROCESS_ENV};
use crate::rules::{create_finding, Context, Finding, Rule};

/// Rule flagging `process.env` access inside handlers.
pub struct ProcessEnvRule {
    /// One entry per enclosing function: whether it is handler-shaped.
    handler_frames: Vec<bool>,
}

/// A handler is recognized by convention: any parameter named exactly `c`.
fn is_handler(func: &Function) -> bool {
    func.params
        .iter()
        .any(|p| p.as_identifier().is_some_and(|name| name == "c"))
}

impl ProcessEnvRule {
    /// Creates a fresh rule instance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handler_frames: Vec::new(),
        }
    }

    fn inside_handler(&self) -> bool {
        self.handler_frames.iter().any(|is_handler| *is_handler)
    }
}

impl Default for ProcessEnvRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for ProcessEnvRule {
    fn name(&self) -> &'static str {
        "ProcessEnvRule"
    }

    fn descriptor(&self) -> &'static RuleDescriptor {
        &META_PROCESS_ENV
    }

    fn code_path_start(&mut self, func: &Function, _context: &Context) -> Option<Vec<Finding>> {
        self.handler_frames.push(is_handler(func));
        None
    }

    fn code_path_end(&mut self, _context: &Context) -> Option<Vec<Finding>> {
        self.handler_frames.pop();
        None
    }

    fn enter_expr(&mut self, expr: &Expr, context: &Context) -> Option<Vec<Finding>> {
        let Expr::Member {
            object, property, ..
        } = expr
        else {
            return None;
        };
        if object.as_identifier() != Some("process") || property.as_static() != Some("env") {
            return None;
        }
        if !self.inside_handler() {
            return None;
        }
        Some(vec![create_finding(
            "Use `c.env` instead of `process.env` inside handlers to maintain \
             platform-agnostic code.",
            &META_PROCESS_ENV,
            context,
            expr.span(),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::run_rule;

    fn check(source: &str) -> Vec<Finding> {
        run_rule(Box::new(ProcessEnvRule::new()), source)
    }

    #[test]
    fn process_env_inside_handler_reports() {
        let findings = check(
            "app.get('/a', (c) => {
                const key = process.env.API_KEY;
                return c.text(key);
            });",
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 2);
    }

    #[test]
    fn process_env_outside_handlers_is_allowed() {
        let findings = check(
            "const port = process.env.PORT;
             const setup = (options) => {
                 return process.env.MODE;
             };",
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn context_env_is_clean() {
        let findings = check(
            "app.get('/a', (c) => {
                return c.text(c.env.API_KEY);
            });",
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn nested_helper_inside_handler_still_counts() {
        let findings = check(
            "app.get('/a', (c) => {
                const read = () => process.env.TOKEN;
                return c.text(read());
            });",
        );
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn leaving_a_handler_clears_the_state() {
        let findings = check(
            "app.get('/a', (c) => {
                return c.text('ok');
            });
            const later = () => process.env.AFTER;",
        );
        assert!(findings.is_empty());
    }
}
