//! Closed, tagged-variant AST for the JavaScript/TypeScript subset the rules
//! inspect.
//!
//! The concrete syntax tree produced by tree-sitter is lowered into these
//! types once per file; everything downstream (visitor, control-flow walk,
//! rules) pattern-matches exhaustively instead of introspecting node kinds at
//! runtime. Constructs the rules never look inside (classes, JSX, imports)
//! lower to the `Other` variants, which still carry their children so
//! traversal and nested-function discovery stay complete.

use compact_str::CompactString;

/// Source position of a node, 1-indexed lines and columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Starting line (1-indexed).
    pub line: usize,
    /// Starting column (1-indexed).
    pub col: usize,
    /// Ending line (1-indexed, inclusive).
    pub end_line: usize,
    /// Ending column (1-indexed, exclusive).
    pub end_col: usize,
}

/// A parsed source file.
#[derive(Debug, Clone)]
pub struct Program {
    /// Top-level statements in source order.
    pub body: Vec<Stmt>,
}

/// A function of any flavor: declaration, expression, arrow, method value.
#[derive(Debug, Clone)]
pub struct Function {
    /// Declared name, if any (`function foo() {}`).
    pub name: Option<CompactString>,
    /// Declared parameters in order.
    pub params: Vec<Pattern>,
    /// Block body or arrow expression body.
    pub body: FunctionBody,
    /// Whether the function is `async`.
    pub is_async: bool,
    /// Whether the function is an arrow function.
    pub is_arrow: bool,
    /// Source span of the whole function.
    pub span: Span,
}

/// Body of a function.
#[derive(Debug, Clone)]
pub enum FunctionBody {
    /// `{ ... }` block body.
    Block(Vec<Stmt>),
    /// Arrow expression body (`(x) => x + 1`).
    Expr(Box<Expr>),
}

/// A binding pattern in a parameter list or declarator.
///
/// Only simple identifiers matter to the rules (the continuation heuristic
/// requires the second parameter to be a plain bound name); destructuring,
/// defaults, and rest patterns collapse to `Other`.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// A plain identifier binding.
    Identifier {
        /// Bound name.
        name: CompactString,
        /// Source span.
        span: Span,
    },
    /// Any other pattern shape.
    Other {
        /// Source span.
        span: Span,
    },
}

impl Pattern {
    /// Returns the bound name when the pattern is a simple identifier.
    #[must_use]
    pub fn as_identifier(&self) -> Option<&CompactString> {
        match self {
            Pattern::Identifier { name, .. } => Some(name),
            Pattern::Other { .. } => None,
        }
    }
}

/// One `name = init` declarator inside a variable declaration.
#[derive(Debug, Clone)]
pub struct Declarator {
    /// Binding pattern on the left-hand side.
    pub name: Pattern,
    /// Initializer, if present.
    pub init: Option<Expr>,
    /// Source span.
    pub span: Span,
}

/// A `catch` clause.
#[derive(Debug, Clone)]
pub struct CatchClause {
    /// Catch binding, if present.
    pub param: Option<Pattern>,
    /// Handler body.
    pub body: Vec<Stmt>,
    /// Source span.
    pub span: Span,
}

/// One `case`/`default` arm of a switch statement.
#[derive(Debug, Clone)]
pub struct SwitchCase {
    /// Case test; `None` for `default`.
    pub test: Option<Expr>,
    /// Arm body.
    pub body: Vec<Stmt>,
    /// Source span.
    pub span: Span,
}

/// Statements.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// Expression statement.
    Expr {
        /// The expression.
        expr: Expr,
        /// Source span.
        span: Span,
    },
    /// `var`/`let`/`const` declaration.
    VarDecl {
        /// Declarators in order.
        declarators: Vec<Declarator>,
        /// Source span.
        span: Span,
    },
    /// `function f() {}` declaration.
    FunctionDecl {
        /// The declared function.
        func: Function,
        /// Source span.
        span: Span,
    },
    /// `{ ... }` block.
    Block {
        /// Statements in the block.
        body: Vec<Stmt>,
        /// Source span.
        span: Span,
    },
    /// `if`/`else`.
    If {
        /// Condition.
        test: Expr,
        /// Then branch.
        consequent: Box<Stmt>,
        /// Else branch, if present.
        alternate: Option<Box<Stmt>>,
        /// Source span.
        span: Span,
    },
    /// Condition-tested loop.
    While {
        /// Condition.
        test: Expr,
        /// Loop body.
        body: Box<Stmt>,
        /// Source span.
        span: Span,
    },
    /// Post-tested loop.
    DoWhile {
        /// Loop body.
        body: Box<Stmt>,
        /// Condition.
        test: Expr,
        /// Source span.
        span: Span,
    },
    /// Counting loop.
    For {
        /// Initializer statement (declaration or expression), if present.
        init: Option<Box<Stmt>>,
        /// Condition, if present.
        test: Option<Expr>,
        /// Update expression, if present.
        update: Option<Expr>,
        /// Loop body.
        body: Box<Stmt>,
        /// Source span.
        span: Span,
    },
    /// `for (x in y)` iteration loop.
    ForIn {
        /// Iteration target (identifier or pattern-shaped expression).
        left: Box<Expr>,
        /// Iterated object.
        right: Expr,
        /// Loop body.
        body: Box<Stmt>,
        /// Source span.
        span: Span,
    },
    /// `for (x of y)` iteration loop.
    ForOf {
        /// Iteration target.
        left: Box<Expr>,
        /// Iterated value.
        right: Expr,
        /// Loop body.
        body: Box<Stmt>,
        /// Source span.
        span: Span,
    },
    /// `return`.
    Return {
        /// Returned value, if present.
        argument: Option<Expr>,
        /// Source span.
        span: Span,
    },
    /// `throw`.
    Throw {
        /// Thrown value.
        argument: Expr,
        /// Source span.
        span: Span,
    },
    /// `try`/`catch`/`finally`.
    Try {
        /// Protected block.
        block: Vec<Stmt>,
        /// Catch clause, if present.
        handler: Option<CatchClause>,
        /// Finally block, if present.
        finalizer: Option<Vec<Stmt>>,
        /// Source span.
        span: Span,
    },
    /// `switch`.
    Switch {
        /// Discriminant expression.
        discriminant: Expr,
        /// Case arms in order.
        cases: Vec<SwitchCase>,
        /// Source span.
        span: Span,
    },
    /// `break`.
    Break {
        /// Source span.
        span: Span,
    },
    /// `continue`.
    Continue {
        /// Source span.
        span: Span,
    },
    /// `;`
    Empty {
        /// Source span.
        span: Span,
    },
    /// Any construct the rules do not model (class, import, export, label...).
    /// Children are preserved so traversal still reaches nested functions.
    Other {
        /// Child expressions in source order.
        exprs: Vec<Expr>,
        /// Child statements in source order.
        stmts: Vec<Stmt>,
        /// Source span.
        span: Span,
    },
}

impl Stmt {
    /// Source span of the statement.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Stmt::Expr { span, .. }
            | Stmt::VarDecl { span, .. }
            | Stmt::FunctionDecl { span, .. }
            | Stmt::Block { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::DoWhile { span, .. }
            | Stmt::For { span, .. }
            | Stmt::ForIn { span, .. }
            | Stmt::ForOf { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::Throw { span, .. }
            | Stmt::Try { span, .. }
            | Stmt::Switch { span, .. }
            | Stmt::Break { span }
            | Stmt::Continue { span }
            | Stmt::Empty { span }
            | Stmt::Other { span, .. } => *span,
        }
    }

    /// Whether this statement is one of the loop constructs.
    #[must_use]
    pub fn is_loop(&self) -> bool {
        matches!(
            self,
            Stmt::While { .. }
                | Stmt::DoWhile { .. }
                | Stmt::For { .. }
                | Stmt::ForIn { .. }
                | Stmt::ForOf { .. }
        )
    }
}

/// Member access property: `a.b` vs `a[b]`.
#[derive(Debug, Clone)]
pub enum MemberProperty {
    /// Static property name (`a.b`).
    Static(CompactString),
    /// Computed property (`a[b]`).
    Computed(Box<Expr>),
}

impl MemberProperty {
    /// Returns the property name for a static (non-computed) access.
    #[must_use]
    pub fn as_static(&self) -> Option<&str> {
        match self {
            MemberProperty::Static(name) => Some(name),
            MemberProperty::Computed(_) => None,
        }
    }
}

/// Expressions.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A bare identifier reference.
    Identifier {
        /// Referenced name.
        name: CompactString,
        /// Source span.
        span: Span,
    },
    /// A string literal; `value` has quotes stripped and simple escapes
    /// resolved.
    String {
        /// Literal value.
        value: String,
        /// Source span.
        span: Span,
    },
    /// A template string; only substitution expressions are retained.
    Template {
        /// Substitution expressions in order.
        exprs: Vec<Expr>,
        /// Source span.
        span: Span,
    },
    /// Number, boolean, `null`, `undefined`, or regex literal.
    Literal {
        /// Raw source text.
        raw: CompactString,
        /// Source span.
        span: Span,
    },
    /// A call expression.
    Call {
        /// Callee expression.
        callee: Box<Expr>,
        /// Arguments in order.
        arguments: Vec<Expr>,
        /// Source span.
        span: Span,
    },
    /// A `new` expression.
    New {
        /// Constructor expression.
        callee: Box<Expr>,
        /// Arguments in order.
        arguments: Vec<Expr>,
        /// Source span.
        span: Span,
    },
    /// Member access, static or computed.
    Member {
        /// Object expression.
        object: Box<Expr>,
        /// Property.
        property: MemberProperty,
        /// Source span.
        span: Span,
    },
    /// A function expression or arrow function.
    Function(Box<Function>),
    /// `await`.
    Await {
        /// Awaited expression.
        argument: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// Assignment (`=` and compound forms).
    Assign {
        /// Assignment target.
        target: Box<Expr>,
        /// Assigned value.
        value: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// Binary or logical operation.
    Binary {
        /// Left operand.
        left: Box<Expr>,
        /// Operator text.
        op: CompactString,
        /// Right operand.
        right: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// Unary or update operation.
    Unary {
        /// Operator text.
        op: CompactString,
        /// Operand.
        argument: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// Ternary conditional.
    Conditional {
        /// Condition.
        test: Box<Expr>,
        /// Value when truthy.
        consequent: Box<Expr>,
        /// Value when falsy.
        alternate: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// Array literal.
    Array {
        /// Element expressions.
        elements: Vec<Expr>,
        /// Source span.
        span: Span,
    },
    /// Object literal; only property values are retained.
    Object {
        /// Property value expressions in order.
        values: Vec<Expr>,
        /// Source span.
        span: Span,
    },
    /// Spread element.
    Spread {
        /// Spread target.
        argument: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// Any expression the rules do not model (JSX, class expression, ...).
    Other {
        /// Child expressions in source order.
        children: Vec<Expr>,
        /// Source span.
        span: Span,
    },
}

impl Expr {
    /// Source span of the expression.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Expr::Identifier { span, .. }
            | Expr::String { span, .. }
            | Expr::Template { span, .. }
            | Expr::Literal { span, .. }
            | Expr::Call { span, .. }
            | Expr::New { span, .. }
            | Expr::Member { span, .. }
            | Expr::Await { span, .. }
            | Expr::Assign { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Conditional { span, .. }
            | Expr::Array { span, .. }
            | Expr::Object { span, .. }
            | Expr::Spread { span, .. }
            | Expr::Other { span, .. } => *span,
            Expr::Function(func) => func.span,
        }
    }

    /// Returns the identifier name when the expression is a bare reference.
    #[must_use]
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Expr::Identifier { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Returns the literal value when the expression is a string literal.
    #[must_use]
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Expr::String { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// Calls `f` for every expression in the statement subtree, nested function
/// bodies included.
pub fn for_each_expr<'a>(stmt: &'a Stmt, f: &mut impl FnMut(&'a Expr)) {
    match stmt {
        Stmt::Expr { expr, .. } => for_each_expr_in(expr, f),
        Stmt::VarDecl { declarators, .. } => {
            for declarator in declarators {
                if let Some(init) = &declarator.init {
                    for_each_expr_in(init, f);
                }
            }
        }
        Stmt::FunctionDecl { func, .. } => for_each_expr_in_function(func, f),
        Stmt::Block { body, .. } => {
            for inner in body {
                for_each_expr(inner, f);
            }
        }
        Stmt::If {
            test,
            consequent,
            alternate,
            ..
        } => {
            for_each_expr_in(test, f);
            for_each_expr(consequent, f);
            if let Some(alternate) = alternate {
                for_each_expr(alternate, f);
            }
        }
        Stmt::While { test, body, .. } => {
            for_each_expr_in(test, f);
            for_each_expr(body, f);
        }
        Stmt::DoWhile { body, test, .. } => {
            for_each_expr(body, f);
            for_each_expr_in(test, f);
        }
        Stmt::For {
            init,
            test,
            update,
            body,
            ..
        } => {
            if let Some(init) = init {
                for_each_expr(init, f);
            }
            if let Some(test) = test {
                for_each_expr_in(test, f);
            }
            if let Some(update) = update {
                for_each_expr_in(update, f);
            }
            for_each_expr(body, f);
        }
        Stmt::ForIn {
            left, right, body, ..
        }
        | Stmt::ForOf {
            left, right, body, ..
        } => {
            for_each_expr_in(left, f);
            for_each_expr_in(right, f);
            for_each_expr(body, f);
        }
        Stmt::Return { argument, .. } => {
            if let Some(argument) = argument {
                for_each_expr_in(argument, f);
            }
        }
        Stmt::Throw { argument, .. } => for_each_expr_in(argument, f),
        Stmt::Try {
            block,
            handler,
            finalizer,
            ..
        } => {
            for inner in block {
                for_each_expr(inner, f);
            }
            if let Some(handler) = handler {
                for inner in &handler.body {
                    for_each_expr(inner, f);
                }
            }
            if let Some(finalizer) = finalizer {
                for inner in finalizer {
                    for_each_expr(inner, f);
                }
            }
        }
        Stmt::Switch {
            discriminant,
            cases,
            ..
        } => {
            for_each_expr_in(discriminant, f);
            for case in cases {
                if let Some(test) = &case.test {
                    for_each_expr_in(test, f);
                }
                for inner in &case.body {
                    for_each_expr(inner, f);
                }
            }
        }
        Stmt::Break { .. } | Stmt::Continue { .. } | Stmt::Empty { .. } => {}
        Stmt::Other { exprs, stmts, .. } => {
            for expr in exprs {
                for_each_expr_in(expr, f);
            }
            for inner in stmts {
                for_each_expr(inner, f);
            }
        }
    }
}

/// Calls `f` for `expr` and every expression nested inside it, nested
/// function bodies included.
pub fn for_each_expr_in<'a>(expr: &'a Expr, f: &mut impl FnMut(&'a Expr)) {
    f(expr);
    match expr {
        Expr::Function(func) => for_each_expr_in_function(func, f),
        Expr::Call {
            callee, arguments, ..
        }
        | Expr::New {
            callee, arguments, ..
        } => {
            for_each_expr_in(callee, f);
            for argument in arguments {
                for_each_expr_in(argument, f);
            }
        }
        Expr::Member {
            object, property, ..
        } => {
            for_each_expr_in(object, f);
            if let MemberProperty::Computed(index) = property {
                for_each_expr_in(index, f);
            }
        }
        Expr::Await { argument, .. }
        | Expr::Unary { argument, .. }
        | Expr::Spread { argument, .. } => for_each_expr_in(argument, f),
        Expr::Assign { target, value, .. } => {
            for_each_expr_in(target, f);
            for_each_expr_in(value, f);
        }
        Expr::Binary { left, right, .. } => {
            for_each_expr_in(left, f);
            for_each_expr_in(right, f);
        }
        Expr::Conditional {
            test,
            consequent,
            alternate,
            ..
        } => {
            for_each_expr_in(test, f);
            for_each_expr_in(consequent, f);
            for_each_expr_in(alternate, f);
        }
        Expr::Template { exprs, .. } => {
            for inner in exprs {
                for_each_expr_in(inner, f);
            }
        }
        Expr::Array { elements, .. } => {
            for element in elements {
                for_each_expr_in(element, f);
            }
        }
        Expr::Object { values, .. } => {
            for value in values {
                for_each_expr_in(value, f);
            }
        }
        Expr::Other { children, .. } => {
            for child in children {
                for_each_expr_in(child, f);
            }
        }
        Expr::Identifier { .. } | Expr::String { .. } | Expr::Literal { .. } => {}
    }
}

fn for_each_expr_in_function<'a>(func: &'a Function, f: &mut impl FnMut(&'a Expr)) {
    match &func.body {
        FunctionBody::Block(body) => {
            for stmt in body {
                for_each_expr(stmt, f);
            }
        }
        FunctionBody::Expr(expr) => for_each_expr_in(expr, f),
    }
}
