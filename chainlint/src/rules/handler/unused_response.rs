//! A context response whose value is discarded never reaches the client.

use compact_str::CompactString;

use crate::ast::{Expr, Function, Stmt};
use crate::rules::registry::{RuleDescriptor, META_UNUSED_RESPONSE};
use crate::rules::{create_finding, Context, Finding, Rule};

/// Context methods that produce a response value.
const RESPONSE_METHODS: &[&str] = &["json", "text", "html", "redirect", "body", "notFound"];

/// Rule flagging bare `c.json(...)`-style statements.
pub struct UnusedResponseRule {
    /// First-parameter name per enclosing function, innermost last.
    context_params: Vec<Option<CompactString>>,
}

impl UnusedResponseRule {
    /// Creates a fresh rule instance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            context_params: Vec::new(),
        }
    }
}

impl Default for UnusedResponseRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for UnusedResponseRule {
    fn name(&self) -> &'static str {
        "UnusedResponseRule"
    }

    fn descriptor(&self) -> &'static RuleDescriptor {
        &META_UNUSED_RESPONSE
    }

    fn code_path_start(&mut self, func: &Function, _context: &Context) -> Option<Vec<Finding>> {
        self.context_params
            .push(func.params.first().and_then(|p| p.as_identifier().cloned()));
        None
    }

    fn code_path_end(&mut self, _context: &Context) -> Option<Vec<Finding>> {
        self.context_params.pop();
        None
    }

    fn enter_stmt(&mut self, stmt: &Stmt, context: &Context) -> Option<Vec<Finding>> {
        // Only a call that *is* the whole statement discards its value;
        // `return c.json(...)` and `await c.json(...)` use it.
        let Stmt::Expr {
            expr:
                Expr::Call {
                    callee,
                    span,
                    ..
                },
            ..
        } = stmt
        else {
            return None;
        };
        let Expr::Member {
            object, property, ..
        } = callee.as_ref()
        else {
            return None;
        };
        let method = property.as_static()?;
        if !RESPONSE_METHODS.contains(&method) {
            return None;
        }
        let object_name = object.as_identifier()?;
        let is_context_param = self
            .context_params
            .iter()
            .any(|p| p.as_ref().is_some_and(|name| name.as_str() == object_name));
        if !is_context_param {
            return None;
        }
        Some(vec![create_finding(
            format!(
                "The result of {object_name}.{method}() is not returned or used. \
                 This response will not be sent."
            ),
            &META_UNUSED_RESPONSE,
            context,
            *span,
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::run_rule;

    fn check(source: &str) -> Vec<Finding> {
        run_rule(Box::new(UnusedResponseRule::new()), source)
    }

    #[test]
    fn returned_response_is_clean() {
        let findings = check(
            "app.get('/a', (c) => {
                return c.json({ ok: true });
            });",
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn bare_response_statement_reports() {
        let findings = check(
            "app.get('/a', (c) => {
                c.json({ ok: true });
                return c.text('done');
            });",
        );
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("c.json()"));
        assert_eq!(findings[0].line, 2);
    }

    #[test]
    fn awaited_response_is_not_a_bare_statement() {
        let findings = check(
            "app.get('/a', async (c) => {
                await c.html(page);
            });",
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn assignment_uses_the_value() {
        let findings = check(
            "app.get('/a', (c) => {
                const res = c.text('hi');
                return res;
            });",
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn non_context_objects_are_ignored() {
        let findings = check(
            "app.get('/a', (c) => {
                logger.text('hi');
                return c.text('ok');
            });",
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn context_from_enclosing_function_still_counts() {
        let findings = check(
            "app.get('/a', (c) => {
                const send = () => {
                    c.notFound();
                };
                send();
                return c.text('ok');
            });",
        );
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("c.notFound()"));
    }

    #[test]
    fn top_level_calls_are_ignored() {
        let findings = check("c.json({ ok: true });");
        assert!(findings.is_empty());
    }
}
