//! Single-pass traversal of one file.
//!
//! The walker visits the AST depth-first in program order exactly once,
//! dispatching every [`Rule`] hook as it goes. For each function it also
//! drives the control-flow lifecycle: the function body is sliced into
//! segments at branch points, loops, and jump statements, and rules observe
//! `segment_start`/`segment_end` interleaved with the node callbacks.
//! A nested function is fully entered and exited before the enclosing walk
//! resumes past its definition, so per-function rule state can be a plain
//! stack.

use smallvec::smallvec;

use crate::ast::{CatchClause, Expr, Function, FunctionBody, MemberProperty, Program, Stmt, SwitchCase};
use crate::cfg::{CodePath, Predecessors, SegmentId};
use crate::rules::{Context, Finding, Rule};

/// Walks one [`Program`], feeding the given rules, and collects findings.
pub struct Walker<'a> {
    rules: Vec<Box<dyn Rule>>,
    context: &'a Context,
    findings: Vec<Finding>,
    next_segment: SegmentId,
    paths: Vec<CodePath>,
}

impl<'a> Walker<'a> {
    /// Creates a walker over `rules` for one file.
    #[must_use]
    pub fn new(rules: Vec<Box<dyn Rule>>, context: &'a Context) -> Self {
        Self {
            rules,
            context,
            findings: Vec::new(),
            next_segment: 0,
            paths: Vec::new(),
        }
    }

    /// Runs the walk and returns the findings in detection order.
    #[must_use]
    pub fn run(mut self, program: &Program) -> Vec<Finding> {
        self.emit(|rule, ctx| rule.enter_program(program, ctx));
        for stmt in &program.body {
            self.walk_stmt(stmt);
        }
        self.findings
    }

    fn emit<F>(&mut self, mut hook: F)
    where
        F: FnMut(&mut dyn Rule, &Context) -> Option<Vec<Finding>>,
    {
        for rule in &mut self.rules {
            if let Some(found) = hook(rule.as_mut(), self.context) {
                self.findings.extend(found);
            }
        }
    }

    // ---- segment plumbing ------------------------------------------------

    fn fresh_segment(&mut self) -> SegmentId {
        let id = self.next_segment;
        self.next_segment += 1;
        id
    }

    fn in_path(&self) -> bool {
        !self.paths.is_empty()
    }

    fn start_segment(&mut self, predecessors: &[SegmentId]) -> SegmentId {
        let id = self.fresh_segment();
        self.emit(|rule, ctx| rule.segment_start(id, predecessors, ctx));
        if let Some(path) = self.paths.last_mut() {
            path.set_current(id);
        }
        id
    }

    fn end_current(&mut self) -> SegmentId {
        let id = self.paths.last().map_or(0, CodePath::current);
        self.emit(|rule, ctx| rule.segment_end(id, ctx));
        id
    }

    /// A jump statement (`return`, `throw`, `break`, `continue`) closes the
    /// current segment; whatever the walk visits next in this body is not
    /// reached from here, so its segment opens with no predecessors.
    fn after_jump(&mut self) {
        if !self.in_path() {
            return;
        }
        self.end_current();
        self.start_segment(&[]);
    }

    fn push_frame(&mut self) {
        if let Some(path) = self.paths.last_mut() {
            path.push_frame();
        }
    }

    fn pop_frame(&mut self) -> Predecessors {
        self.paths
            .last_mut()
            .map(CodePath::pop_frame)
            .unwrap_or_default()
    }

    // ---- functions -------------------------------------------------------

    fn walk_function(&mut self, func: &Function) {
        self.emit(|rule, ctx| rule.code_path_start(func, ctx));
        let entry = self.fresh_segment();
        self.paths.push(CodePath::new(entry));
        self.emit(|rule, ctx| rule.segment_start(entry, &[], ctx));
        match &func.body {
            FunctionBody::Block(body) => {
                for stmt in body {
                    self.walk_stmt(stmt);
                }
            }
            FunctionBody::Expr(expr) => self.walk_expr(expr),
        }
        self.end_current();
        self.paths.pop();
        self.emit(|rule, ctx| rule.code_path_end(ctx));
    }

    // ---- statements ------------------------------------------------------

    fn walk_stmt(&mut self, stmt: &Stmt) {
        self.emit(|rule, ctx| rule.enter_stmt(stmt, ctx));
        match stmt {
            Stmt::Expr { expr, .. } => self.walk_expr(expr),
            Stmt::VarDecl { declarators, .. } => {
                for declarator in declarators {
                    if let Some(init) = &declarator.init {
                        self.walk_expr(init);
                    }
                }
            }
            Stmt::FunctionDecl { func, .. } => self.walk_function(func),
            Stmt::Block { body, .. } => {
                for inner in body {
                    self.walk_stmt(inner);
                }
            }
            Stmt::If {
                test,
                consequent,
                alternate,
                ..
            } => self.walk_if(test, consequent, alternate.as_deref()),
            Stmt::While { test, body, .. } => self.walk_while(test, body),
            Stmt::DoWhile { body, test, .. } => self.walk_do_while(body, test),
            Stmt::For {
                init,
                test,
                update,
                body,
                ..
            } => self.walk_for(init.as_deref(), test.as_ref(), update.as_ref(), body),
            Stmt::ForIn {
                left, right, body, ..
            }
            | Stmt::ForOf {
                left, right, body, ..
            } => self.walk_for_each(left, right, body),
            Stmt::Return { argument, .. } => {
                if let Some(argument) = argument {
                    self.walk_expr(argument);
                }
                self.after_jump();
            }
            Stmt::Throw { argument, .. } => {
                self.walk_expr(argument);
                self.after_jump();
            }
            Stmt::Try {
                block,
                handler,
                finalizer,
                ..
            } => self.walk_try(block, handler.as_ref(), finalizer.as_deref()),
            Stmt::Switch {
                discriminant,
                cases,
                ..
            } => self.walk_switch(discriminant, cases),
            Stmt::Break { .. } => {
                if let Some(path) = self.paths.last_mut() {
                    path.record_break();
                }
                self.after_jump();
            }
            Stmt::Continue { .. } => self.after_jump(),
            Stmt::Empty { .. } => {}
            Stmt::Other { exprs, stmts, .. } => {
                for expr in exprs {
                    self.walk_expr(expr);
                }
                for inner in stmts {
                    self.walk_stmt(inner);
                }
            }
        }
        self.emit(|rule, ctx| rule.leave_stmt(stmt, ctx));
    }

    fn walk_if(&mut self, test: &Expr, consequent: &Stmt, alternate: Option<&Stmt>) {
        self.walk_expr(test);
        if !self.in_path() {
            self.walk_stmt(consequent);
            if let Some(alternate) = alternate {
                self.walk_stmt(alternate);
            }
            return;
        }
        let fork = self.end_current();
        self.start_segment(&[fork]);
        self.walk_stmt(consequent);
        let then_exit = self.end_current();
        match alternate {
            Some(alternate) => {
                self.start_segment(&[fork]);
                self.walk_stmt(alternate);
                let else_exit = self.end_current();
                self.start_segment(&[then_exit, else_exit]);
            }
            // No else branch: the join can also be reached straight from the
            // fork point.
            None => {
                self.start_segment(&[then_exit, fork]);
            }
        }
    }

    fn walk_while(&mut self, test: &Expr, body: &Stmt) {
        if !self.in_path() {
            self.walk_expr(test);
            self.walk_stmt(body);
            return;
        }
        let before = self.end_current();
        let header = self.start_segment(&[before]);
        self.walk_expr(test);
        self.end_current();
        self.push_frame();
        self.start_segment(&[header]);
        self.walk_stmt(body);
        self.end_current();
        let breaks = self.pop_frame();
        let mut exit: Predecessors = smallvec![header];
        exit.extend(breaks);
        self.start_segment(&exit);
    }

    fn walk_do_while(&mut self, body: &Stmt, test: &Expr) {
        if !self.in_path() {
            self.walk_stmt(body);
            self.walk_expr(test);
            return;
        }
        let before = self.end_current();
        self.push_frame();
        self.start_segment(&[before]);
        self.walk_stmt(body);
        self.walk_expr(test);
        let tail = self.end_current();
        let breaks = self.pop_frame();
        let mut exit: Predecessors = smallvec![tail];
        exit.extend(breaks);
        self.start_segment(&exit);
    }

    fn walk_for(
        &mut self,
        init: Option<&Stmt>,
        test: Option<&Expr>,
        update: Option<&Expr>,
        body: &Stmt,
    ) {
        if let Some(init) = init {
            // The initializer is part of the loop header, not a free-standing
            // statement; expression initializers skip the statement hooks.
            match init {
                Stmt::Expr { expr, .. } => self.walk_expr(expr),
                other => self.walk_stmt(other),
            }
        }
        if !self.in_path() {
            if let Some(test) = test {
                self.walk_expr(test);
            }
            self.walk_stmt(body);
            if let Some(update) = update {
                self.walk_expr(update);
            }
            return;
        }
        let before = self.end_current();
        let header = self.start_segment(&[before]);
        if let Some(test) = test {
            self.walk_expr(test);
        }
        self.end_current();
        self.push_frame();
        self.start_segment(&[header]);
        self.walk_stmt(body);
        if let Some(update) = update {
            self.walk_expr(update);
        }
        self.end_current();
        let breaks = self.pop_frame();
        let mut exit: Predecessors = smallvec![header];
        exit.extend(breaks);
        self.start_segment(&exit);
    }

    fn walk_for_each(&mut self, left: &Expr, right: &Expr, body: &Stmt) {
        self.walk_expr(right);
        if !self.in_path() {
            self.walk_expr(left);
            self.walk_stmt(body);
            return;
        }
        let before = self.end_current();
        let header = self.start_segment(&[before]);
        self.walk_expr(left);
        self.end_current();
        self.push_frame();
        self.start_segment(&[header]);
        self.walk_stmt(body);
        self.end_current();
        let breaks = self.pop_frame();
        let mut exit: Predecessors = smallvec![header];
        exit.extend(breaks);
        self.start_segment(&exit);
    }

    fn walk_try(
        &mut self,
        block: &[Stmt],
        handler: Option<&CatchClause>,
        finalizer: Option<&[Stmt]>,
    ) {
        if !self.in_path() {
            for stmt in block {
                self.walk_stmt(stmt);
            }
            if let Some(handler) = handler {
                for stmt in &handler.body {
                    self.walk_stmt(stmt);
                }
            }
            if let Some(finalizer) = finalizer {
                for stmt in finalizer {
                    self.walk_stmt(stmt);
                }
            }
            return;
        }
        let before = self.end_current();
        self.start_segment(&[before]);
        for stmt in block {
            self.walk_stmt(stmt);
        }
        let try_exit = self.end_current();
        let mut join: Predecessors = smallvec![try_exit];
        if let Some(handler) = handler {
            self.start_segment(&[try_exit]);
            for stmt in &handler.body {
                self.walk_stmt(stmt);
            }
            let catch_exit = self.end_current();
            join.push(catch_exit);
        }
        if let Some(finalizer) = finalizer {
            let preds = join.clone();
            self.start_segment(&preds);
            for stmt in finalizer {
                self.walk_stmt(stmt);
            }
            let finally_exit = self.end_current();
            join = smallvec![finally_exit];
        }
        self.start_segment(&join);
    }

    fn walk_switch(&mut self, discriminant: &Expr, cases: &[SwitchCase]) {
        self.walk_expr(discriminant);
        if !self.in_path() {
            for case in cases {
                if let Some(test) = &case.test {
                    self.walk_expr(test);
                }
                for stmt in &case.body {
                    self.walk_stmt(stmt);
                }
            }
            return;
        }
        let disc = self.end_current();
        self.push_frame();
        let mut prev_exit: Option<SegmentId> = None;
        let mut has_default = false;
        for case in cases {
            let mut preds: Predecessors = smallvec![disc];
            if let Some(prev) = prev_exit {
                preds.push(prev);
            }
            self.start_segment(&preds);
            match &case.test {
                Some(test) => self.walk_expr(test),
                None => has_default = true,
            }
            for stmt in &case.body {
                self.walk_stmt(stmt);
            }
            prev_exit = Some(self.end_current());
        }
        let breaks = self.pop_frame();
        let mut join = Predecessors::new();
        if let Some(prev) = prev_exit {
            join.push(prev);
        }
        if !has_default {
            join.push(disc);
        }
        join.extend(breaks);
        self.start_segment(&join);
    }

    // ---- expressions -----------------------------------------------------

    fn walk_expr(&mut self, expr: &Expr) {
        self.emit(|rule, ctx| rule.enter_expr(expr, ctx));
        match expr {
            Expr::Function(func) => self.walk_function(func),
            Expr::Call {
                callee, arguments, ..
            }
            | Expr::New {
                callee, arguments, ..
            } => {
                self.walk_expr(callee);
                for argument in arguments {
                    self.walk_expr(argument);
                }
            }
            Expr::Member {
                object, property, ..
            } => {
                self.walk_expr(object);
                if let MemberProperty::Computed(index) = property {
                    self.walk_expr(index);
                }
            }
            Expr::Await { argument, .. }
            | Expr::Unary { argument, .. }
            | Expr::Spread { argument, .. } => self.walk_expr(argument),
            Expr::Assign { target, value, .. } => {
                self.walk_expr(target);
                self.walk_expr(value);
            }
            Expr::Binary { left, right, .. } => {
                self.walk_expr(left);
                self.walk_expr(right);
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
                ..
            } => {
                self.walk_expr(test);
                self.walk_expr(consequent);
                self.walk_expr(alternate);
            }
            Expr::Template { exprs, .. } => {
                for inner in exprs {
                    self.walk_expr(inner);
                }
            }
            Expr::Array { elements, .. } => {
                for element in elements {
                    self.walk_expr(element);
                }
            }
            Expr::Object { values, .. } => {
                for value in values {
                    self.walk_expr(value);
                }
            }
            Expr::Other { children, .. } => {
                for child in children {
                    self.walk_expr(child);
                }
            }
            Expr::Identifier { .. } | Expr::String { .. } | Expr::Literal { .. } => {}
        }
        self.emit(|rule, ctx| rule.leave_expr(expr, ctx));
    }
}
