//! Continuation single-invocation analysis.
//!
//! A middleware handler receives a continuation as its second parameter and
//! must invoke it at most once along every execution path; a second
//! invocation corrupts the downstream handler chain at runtime. This rule
//! tracks, per control-flow segment, whether every path reaching the segment
//! has already invoked the continuation, joining with OR across predecessors
//! so that "called in one branch, then called again after the join" is
//! caught.
//!
//! Calls lexically inside a loop body are reported unconditionally: across
//! iterations such a call can run more than once no matter what the
//! per-segment state says. This also covers what the segment join cannot
//! see — loop back-edges are announced before the body is walked, so the
//! header's join reads the pre-loop state (see [`crate::cfg`]).

use compact_str::CompactString;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::ast::{Expr, Function, Span, Stmt};
use crate::cfg::SegmentId;
use crate::rules::registry::{RuleDescriptor, META_MULTIPLE_NEXT};
use crate::rules::{create_finding, Context, Finding, Rule};

/// Analysis scope for one function body.
///
/// `continuation` is the name of the second declared parameter when it is a
/// simple identifier; otherwise the scope is inert and never reports.
/// Segment state is retained for the scope's whole lifetime so later
/// segments can join over segments that already ended.
#[derive(Debug, Default)]
struct ScopeFrame {
    continuation: Option<CompactString>,
    open_segments: FxHashSet<SegmentId>,
    segment_called: FxHashMap<SegmentId, bool>,
}

/// Lexical ancestry relevant to the loop check: loop constructs, cut off at
/// the nearest enclosing function boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexicalFrame {
    Loop,
    FunctionBoundary,
}

/// Rule detecting multiple invocations of a handler's continuation.
pub struct MultipleNextRule {
    scopes: Vec<ScopeFrame>,
    lexical: Vec<LexicalFrame>,
}

impl MultipleNextRule {
    /// Creates a fresh rule instance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scopes: Vec::new(),
            lexical: Vec::new(),
        }
    }

    fn report(continuation: &str, span: Span, context: &Context) -> Finding {
        create_finding(
            format!("{continuation}() must not be invoked more than once along any execution path."),
            &META_MULTIPLE_NEXT,
            context,
            span,
        )
    }

    /// Whether the call site sits lexically inside a loop, scanning ancestors
    /// up to (not across) the nearest enclosing function boundary.
    fn inside_loop(&self) -> bool {
        for frame in self.lexical.iter().rev() {
            match frame {
                LexicalFrame::FunctionBoundary => return false,
                LexicalFrame::Loop => return true,
            }
        }
        false
    }
}

impl Default for MultipleNextRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for MultipleNextRule {
    fn name(&self) -> &'static str {
        "MultipleNextRule"
    }

    fn descriptor(&self) -> &'static RuleDescriptor {
        &META_MULTIPLE_NEXT
    }

    fn enter_stmt(&mut self, stmt: &Stmt, _context: &Context) -> Option<Vec<Finding>> {
        if stmt.is_loop() {
            self.lexical.push(LexicalFrame::Loop);
        }
        None
    }

    fn leave_stmt(&mut self, stmt: &Stmt, _context: &Context) -> Option<Vec<Finding>> {
        if stmt.is_loop() {
            debug_assert_eq!(self.lexical.last(), Some(&LexicalFrame::Loop));
            self.lexical.pop();
        }
        None
    }

    fn code_path_start(&mut self, func: &Function, _context: &Context) -> Option<Vec<Finding>> {
        let continuation = func
            .params
            .get(1)
            .and_then(crate::ast::Pattern::as_identifier)
            .cloned();
        self.scopes.push(ScopeFrame {
            continuation,
            ..ScopeFrame::default()
        });
        self.lexical.push(LexicalFrame::FunctionBoundary);
        None
    }

    fn code_path_end(&mut self, _context: &Context) -> Option<Vec<Finding>> {
        debug_assert_eq!(self.lexical.last(), Some(&LexicalFrame::FunctionBoundary));
        self.lexical.pop();
        // Pairing is the walker's contract; an unmatched end would mean the
        // traversal itself is broken, so it must not pass silently in tests.
        debug_assert!(!self.scopes.is_empty(), "code path end without start");
        self.scopes.pop();
        None
    }

    fn segment_start(
        &mut self,
        segment: SegmentId,
        predecessors: &[SegmentId],
        _context: &Context,
    ) -> Option<Vec<Finding>> {
        let scope = self.scopes.last_mut()?;
        // OR-join: one incoming path having already invoked the continuation
        // is enough to make a further invocation here a violation.
        // Predecessors without stored state (loop back-edge targets) read as
        // not-called.
        let called = predecessors
            .iter()
            .any(|p| scope.segment_called.get(p).copied().unwrap_or(false));
        scope.segment_called.insert(segment, called);
        scope.open_segments.insert(segment);
        None
    }

    fn segment_end(&mut self, segment: SegmentId, _context: &Context) -> Option<Vec<Finding>> {
        if let Some(scope) = self.scopes.last_mut() {
            scope.open_segments.remove(&segment);
        }
        None
    }

    fn enter_expr(&mut self, expr: &Expr, context: &Context) -> Option<Vec<Finding>> {
        let Expr::Call { callee, span, .. } = expr else {
            return None;
        };
        let continuation = {
            let scope = self.scopes.last()?;
            let name = scope.continuation.as_ref()?;
            if callee.as_identifier() != Some(name.as_str()) {
                return None;
            }
            name.clone()
        };

        // Inside a loop the call can run once per iteration; report without
        // consulting segment state, and short-circuit so the call site
        // reports at most once.
        if self.inside_loop() {
            return Some(vec![Self::report(&continuation, *span, context)]);
        }

        let scope = self.scopes.last_mut()?;
        let ScopeFrame {
            open_segments,
            segment_called,
            ..
        } = scope;
        let mut already_called = false;
        for segment in open_segments.iter() {
            if let Some(called) = segment_called.get_mut(segment) {
                if *called {
                    already_called = true;
                } else {
                    *called = true;
                }
            }
        }
        if already_called {
            Some(vec![Self::report(&continuation, *span, context)])
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{run_rule, run_rule_ts};

    fn check(source: &str) -> Vec<Finding> {
        run_rule(Box::new(MultipleNextRule::new()), source)
    }

    // ---- clean handlers --------------------------------------------------

    #[test]
    fn single_call_is_clean() {
        let findings = check(
            "const middleware = async (c, next) => {
                await next();
            };",
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn one_call_in_each_branch_is_clean() {
        let findings = check(
            "const middleware = async (c, next) => {
                if (c.req.header('X-Custom')) {
                    await next();
                } else {
                    await next();
                }
            };",
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn handler_without_call_is_clean() {
        let findings = check(
            "const middleware = async (c, next) => {
                return c.text('Hello');
            };",
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn nested_handler_does_not_pollute_outer_scope() {
        let findings = check(
            "const middleware = async (c, next) => {
                const other = async (c, next) => {
                    await next();
                };
                await next();
            };",
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn call_after_early_return_is_unreachable_and_clean() {
        let findings = check(
            "const middleware = async (c, next) => {
                if (c.ok) {
                    return next();
                }
                await next();
            };",
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn scope_without_continuation_parameter_is_inert() {
        let findings = check(
            "const handler = (c) => {
                c.next();
                next();
                next();
            };",
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn destructured_second_parameter_is_inert() {
        let findings = check(
            "const handler = (c, { next }) => {
                next();
                next();
            };",
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn shadowing_local_in_nested_function_is_not_attributed_to_outer() {
        let findings = check(
            "const middleware = async (c, next) => {
                const helper = (x) => {
                    const next = () => {};
                    next();
                    next();
                };
                await next();
            };",
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn switch_with_breaks_calls_once_per_arm() {
        let findings = check(
            "const middleware = (c, next) => {
                switch (c.kind) {
                    case 'a':
                        next();
                        break;
                    case 'b':
                        next();
                        break;
                }
            };",
        );
        assert!(findings.is_empty());
    }

    // ---- violations ------------------------------------------------------

    #[test]
    fn sequential_double_call_reports_at_second_call() {
        let findings = check(
            "const middleware = async (c, next) => {
                await next();
                await next();
            };",
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 3);
        assert_eq!(findings[0].rule_id, "CHL-P101");
        assert!(findings[0].message.contains("next()"));
    }

    #[test]
    fn call_in_branch_then_call_after_join_reports() {
        let findings = check(
            "const middleware = async (c, next) => {
                if (c.cond) {
                    await next();
                }
                await next();
            };",
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 5);
    }

    #[test]
    fn both_branches_called_then_call_after_join_reports_once() {
        let findings = check(
            "const middleware = async (c, next) => {
                if (c.cond) {
                    await next();
                } else {
                    await next();
                }
                await next();
            };",
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 7);
    }

    #[test]
    fn call_inside_while_loop_reports_exactly_once() {
        let findings = check(
            "const middleware = async (c, next) => {
                while (true) {
                    await next();
                }
            };",
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 3);
    }

    #[test]
    fn call_inside_for_of_loop_reports() {
        let findings = check(
            "const middleware = async (c, next) => {
                for (const item of c.items) {
                    await next();
                }
            };",
        );
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn call_inside_do_while_loop_reports() {
        let findings = check(
            "const middleware = (c, go) => {
                do {
                    go();
                } while (c.retry);
            };",
        );
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("go()"));
    }

    #[test]
    fn loop_in_nested_function_does_not_leak_into_outer_call() {
        // The ancestor scan stops at the nested function boundary; the outer
        // call is not inside a loop even though the walk passed through one.
        let findings = check(
            "const middleware = (c, next) => {
                while (c.busy) {
                    const tick = (t, go) => { go(); };
                }
            };",
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn three_sequential_calls_report_twice() {
        let findings = check(
            "const middleware = (c, next) => {
                next();
                next();
                next();
            };",
        );
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].line, 3);
        assert_eq!(findings[1].line, 4);
    }

    #[test]
    fn call_in_try_then_call_in_catch_reports() {
        let findings = check(
            "const middleware = async (c, next) => {
                try {
                    await next();
                } catch (err) {
                    await next();
                }
            };",
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 5);
    }

    #[test]
    fn typescript_handler_reports_like_javascript() {
        let findings = run_rule_ts(
            Box::new(MultipleNextRule::new()),
            "const middleware = async (c: Context, next: Next) => {
                await next();
                await next();
            };",
        );
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn runs_are_idempotent_and_order_stable() {
        let source = "const middleware = (c, next) => {
            if (c.a) { next(); }
            next();
            next();
        };";
        let first: Vec<(usize, usize)> = check(source).iter().map(|f| (f.line, f.col)).collect();
        let second: Vec<(usize, usize)> = check(source).iter().map(|f| (f.line, f.col)).collect();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }
}
