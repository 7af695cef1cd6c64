//! CST → AST lowering.
//!
//! Each tree-sitter node kind the rules care about maps to a dedicated
//! variant; everything else falls through to the `Other` variants while still
//! lowering recognizable children, so nested functions buried in unmodeled
//! constructs (class bodies, JSX, exports) are never lost.

use compact_str::CompactString;
use tree_sitter::Node;

use crate::ast::{
    CatchClause, Declarator, Expr, Function, FunctionBody, MemberProperty, Pattern, Program, Span,
    Stmt, SwitchCase,
};

pub(super) fn lower_program(root: Node<'_>, src: &[u8]) -> Program {
    let lowerer = Lowerer { src };
    let mut body = Vec::new();
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        if child.kind() == "comment" {
            continue;
        }
        body.push(lowerer.lower_stmt(child));
    }
    Program { body }
}

fn span(node: Node<'_>) -> Span {
    let start = node.start_position();
    let end = node.end_position();
    Span {
        line: start.row + 1,
        col: start.column + 1,
        end_line: end.row + 1,
        end_col: end.column + 1,
    }
}

fn is_stmt_kind(kind: &str) -> bool {
    matches!(
        kind,
        "expression_statement"
            | "variable_declaration"
            | "lexical_declaration"
            | "function_declaration"
            | "generator_function_declaration"
            | "statement_block"
            | "if_statement"
            | "while_statement"
            | "do_statement"
            | "for_statement"
            | "for_in_statement"
            | "return_statement"
            | "throw_statement"
            | "try_statement"
            | "switch_statement"
            | "break_statement"
            | "continue_statement"
            | "empty_statement"
            | "labeled_statement"
            | "debugger_statement"
            | "import_statement"
            | "export_statement"
    )
}

fn is_expr_kind(kind: &str) -> bool {
    matches!(
        kind,
        "identifier"
            | "this"
            | "super"
            | "property_identifier"
            | "shorthand_property_identifier"
            | "string"
            | "template_string"
            | "number"
            | "regex"
            | "true"
            | "false"
            | "null"
            | "undefined"
            | "call_expression"
            | "new_expression"
            | "member_expression"
            | "subscript_expression"
            | "arrow_function"
            | "function_expression"
            | "function"
            | "generator_function"
            | "method_definition"
            | "await_expression"
            | "yield_expression"
            | "assignment_expression"
            | "augmented_assignment_expression"
            | "binary_expression"
            | "unary_expression"
            | "update_expression"
            | "ternary_expression"
            | "parenthesized_expression"
            | "sequence_expression"
            | "array"
            | "object"
            | "spread_element"
            | "as_expression"
            | "satisfies_expression"
            | "non_null_expression"
            | "type_assertion"
    )
}

struct Lowerer<'a> {
    src: &'a [u8],
}

impl Lowerer<'_> {
    fn text(&self, node: Node<'_>) -> &str {
        node.utf8_text(self.src).unwrap_or("")
    }

    fn name(&self, node: Node<'_>) -> CompactString {
        CompactString::from(self.text(node))
    }

    fn lower_stmt(&self, node: Node<'_>) -> Stmt {
        let sp = span(node);
        match node.kind() {
            "expression_statement" => match self.first_named(node) {
                Some(inner) => Stmt::Expr {
                    expr: self.lower_expr(inner),
                    span: sp,
                },
                None => Stmt::Empty { span: sp },
            },
            "variable_declaration" | "lexical_declaration" => Stmt::VarDecl {
                declarators: self.lower_declarators(node),
                span: sp,
            },
            "function_declaration" | "generator_function_declaration" => Stmt::FunctionDecl {
                func: self.lower_function(node, false),
                span: sp,
            },
            "statement_block" => Stmt::Block {
                body: self.lower_block(node),
                span: sp,
            },
            "if_statement" => {
                let test = self.lower_field_expr(node, "condition");
                let consequent = node
                    .child_by_field_name("consequence")
                    .map_or(Stmt::Empty { span: sp }, |n| self.lower_stmt(n));
                let alternate = node
                    .child_by_field_name("alternative")
                    .and_then(|clause| self.first_named(clause))
                    .map(|n| Box::new(self.lower_stmt(n)));
                Stmt::If {
                    test,
                    consequent: Box::new(consequent),
                    alternate,
                    span: sp,
                }
            }
            "while_statement" => Stmt::While {
                test: self.lower_field_expr(node, "condition"),
                body: Box::new(self.lower_field_stmt(node, "body", sp)),
                span: sp,
            },
            "do_statement" => Stmt::DoWhile {
                body: Box::new(self.lower_field_stmt(node, "body", sp)),
                test: self.lower_field_expr(node, "condition"),
                span: sp,
            },
            "for_statement" => {
                let init = node
                    .child_by_field_name("initializer")
                    .filter(|n| n.kind() != "empty_statement")
                    .map(|n| Box::new(self.lower_stmt(n)));
                let test = node
                    .child_by_field_name("condition")
                    .filter(|n| n.kind() != "empty_statement")
                    .map(|n| self.unwrap_expr_stmt(n));
                let update = node
                    .child_by_field_name("increment")
                    .map(|n| self.lower_expr(n));
                Stmt::For {
                    init,
                    test,
                    update,
                    body: Box::new(self.lower_field_stmt(node, "body", sp)),
                    span: sp,
                }
            }
            "for_in_statement" => {
                let left = Box::new(
                    node.child_by_field_name("left")
                        .map_or(Expr::Other { children: Vec::new(), span: sp }, |n| {
                            self.lower_expr(n)
                        }),
                );
                let right = self.lower_field_expr(node, "right");
                let body = Box::new(self.lower_field_stmt(node, "body", sp));
                let is_of = node
                    .child_by_field_name("operator")
                    .is_some_and(|op| self.text(op) == "of");
                if is_of {
                    Stmt::ForOf { left, right, body, span: sp }
                } else {
                    Stmt::ForIn { left, right, body, span: sp }
                }
            }
            "return_statement" => Stmt::Return {
                argument: self.first_named(node).map(|n| self.lower_expr(n)),
                span: sp,
            },
            "throw_statement" => match self.first_named(node) {
                Some(arg) => Stmt::Throw {
                    argument: self.lower_expr(arg),
                    span: sp,
                },
                None => Stmt::Empty { span: sp },
            },
            "try_statement" => {
                let block = node
                    .child_by_field_name("body")
                    .map(|n| self.lower_block(n))
                    .unwrap_or_default();
                let handler = node.child_by_field_name("handler").map(|clause| {
                    let param = clause
                        .child_by_field_name("parameter")
                        .map(|p| self.lower_pattern(p));
                    let body = clause
                        .child_by_field_name("body")
                        .map(|n| self.lower_block(n))
                        .unwrap_or_default();
                    CatchClause { param, body, span: span(clause) }
                });
                let finalizer = node.child_by_field_name("finalizer").map(|clause| {
                    self.first_named(clause)
                        .map(|n| self.lower_block(n))
                        .unwrap_or_default()
                });
                Stmt::Try { block, handler, finalizer, span: sp }
            }
            "switch_statement" => {
                let discriminant = self.lower_field_expr(node, "value");
                let cases = node
                    .child_by_field_name("body")
                    .map(|body| self.lower_switch_body(body))
                    .unwrap_or_default();
                Stmt::Switch { discriminant, cases, span: sp }
            }
            "break_statement" => Stmt::Break { span: sp },
            "continue_statement" => Stmt::Continue { span: sp },
            "empty_statement" | "debugger_statement" => Stmt::Empty { span: sp },
            // Labels are transparent: the labeled statement is what matters.
            "labeled_statement" => node
                .child_by_field_name("body")
                .map_or(Stmt::Empty { span: sp }, |n| self.lower_stmt(n)),
            "export_statement" => {
                if let Some(decl) = node.child_by_field_name("declaration") {
                    self.lower_stmt(decl)
                } else if let Some(value) = node.child_by_field_name("value") {
                    Stmt::Expr { expr: self.lower_expr(value), span: sp }
                } else {
                    Stmt::Other { exprs: Vec::new(), stmts: Vec::new(), span: sp }
                }
            }
            "import_statement" => Stmt::Other {
                exprs: Vec::new(),
                stmts: Vec::new(),
                span: sp,
            },
            _ => {
                let (exprs, stmts) = self.lower_any_children(node);
                Stmt::Other { exprs, stmts, span: sp }
            }
        }
    }

    fn lower_expr(&self, node: Node<'_>) -> Expr {
        let sp = span(node);
        match node.kind() {
            "identifier" | "this" | "super" | "property_identifier"
            | "shorthand_property_identifier" => Expr::Identifier {
                name: self.name(node),
                span: sp,
            },
            "string" => Expr::String {
                value: self.string_value(node),
                span: sp,
            },
            "template_string" => {
                let mut exprs = Vec::new();
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if child.kind() == "template_substitution" {
                        if let Some(inner) = self.first_named(child) {
                            exprs.push(self.lower_expr(inner));
                        }
                    }
                }
                Expr::Template { exprs, span: sp }
            }
            "number" | "regex" | "true" | "false" | "null" | "undefined" => Expr::Literal {
                raw: self.name(node),
                span: sp,
            },
            "call_expression" => Expr::Call {
                callee: Box::new(self.lower_field_expr(node, "function")),
                arguments: self.lower_arguments(node),
                span: sp,
            },
            "new_expression" => Expr::New {
                callee: Box::new(self.lower_field_expr(node, "constructor")),
                arguments: self.lower_arguments(node),
                span: sp,
            },
            "member_expression" => Expr::Member {
                object: Box::new(self.lower_field_expr(node, "object")),
                property: node
                    .child_by_field_name("property")
                    .map_or(MemberProperty::Static(CompactString::default()), |p| {
                        MemberProperty::Static(self.name(p))
                    }),
                span: sp,
            },
            "subscript_expression" => Expr::Member {
                object: Box::new(self.lower_field_expr(node, "object")),
                property: MemberProperty::Computed(Box::new(self.lower_field_expr(node, "index"))),
                span: sp,
            },
            "arrow_function" => Expr::Function(Box::new(self.lower_function(node, true))),
            "function_expression" | "function" | "generator_function" | "method_definition" => {
                Expr::Function(Box::new(self.lower_function(node, false)))
            }
            "await_expression" => match self.first_named(node) {
                Some(inner) => Expr::Await {
                    argument: Box::new(self.lower_expr(inner)),
                    span: sp,
                },
                None => Expr::Other { children: Vec::new(), span: sp },
            },
            "assignment_expression" | "augmented_assignment_expression" => Expr::Assign {
                target: Box::new(self.lower_field_expr(node, "left")),
                value: Box::new(self.lower_field_expr(node, "right")),
                span: sp,
            },
            "binary_expression" => Expr::Binary {
                left: Box::new(self.lower_field_expr(node, "left")),
                op: node
                    .child_by_field_name("operator")
                    .map(|o| self.name(o))
                    .unwrap_or_default(),
                right: Box::new(self.lower_field_expr(node, "right")),
                span: sp,
            },
            "unary_expression" | "update_expression" => Expr::Unary {
                op: node
                    .child_by_field_name("operator")
                    .map(|o| self.name(o))
                    .unwrap_or_default(),
                argument: Box::new(self.lower_field_expr(node, "argument")),
                span: sp,
            },
            "ternary_expression" => Expr::Conditional {
                test: Box::new(self.lower_field_expr(node, "condition")),
                consequent: Box::new(self.lower_field_expr(node, "consequence")),
                alternate: Box::new(self.lower_field_expr(node, "alternative")),
                span: sp,
            },
            "parenthesized_expression" => match self.first_named(node) {
                Some(inner) => self.lower_expr(inner),
                None => Expr::Other { children: Vec::new(), span: sp },
            },
            "sequence_expression" | "yield_expression" => {
                let mut children = Vec::new();
                self.collect_expr_children(node, &mut children);
                Expr::Other { children, span: sp }
            }
            "array" => {
                let mut elements = Vec::new();
                self.collect_expr_children(node, &mut elements);
                Expr::Array { elements, span: sp }
            }
            "object" => {
                let mut values = Vec::new();
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    match child.kind() {
                        "pair" => {
                            if let Some(value) = child.child_by_field_name("value") {
                                values.push(self.lower_expr(value));
                            }
                        }
                        "shorthand_property_identifier" | "method_definition"
                        | "spread_element" => values.push(self.lower_expr(child)),
                        _ => {}
                    }
                }
                Expr::Object { values, span: sp }
            }
            "spread_element" => match self.first_named(node) {
                Some(inner) => Expr::Spread {
                    argument: Box::new(self.lower_expr(inner)),
                    span: sp,
                },
                None => Expr::Other { children: Vec::new(), span: sp },
            },
            // TypeScript wrappers are transparent.
            "as_expression" | "satisfies_expression" | "non_null_expression"
            | "type_assertion" => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if is_expr_kind(child.kind()) {
                        return self.lower_expr(child);
                    }
                }
                Expr::Other { children: Vec::new(), span: sp }
            }
            _ => {
                let mut children = Vec::new();
                self.collect_expr_children(node, &mut children);
                Expr::Other { children, span: sp }
            }
        }
    }

    fn lower_function(&self, node: Node<'_>, is_arrow: bool) -> Function {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.name(n))
            .filter(|n| !n.is_empty());
        let params = if let Some(single) = node.child_by_field_name("parameter") {
            vec![self.lower_pattern(single)]
        } else {
            node.child_by_field_name("parameters")
                .map(|p| self.lower_params(p))
                .unwrap_or_default()
        };
        let body = match node.child_by_field_name("body") {
            Some(body) if body.kind() == "statement_block" => {
                FunctionBody::Block(self.lower_block(body))
            }
            Some(body) => FunctionBody::Expr(Box::new(self.lower_expr(body))),
            None => FunctionBody::Block(Vec::new()),
        };
        let is_async = {
            let mut cursor = node.walk();
            let x = node.children(&mut cursor).any(|c| c.kind() == "async");
            x
        };
        Function {
            name,
            params,
            body,
            is_async,
            is_arrow,
            span: span(node),
        }
    }

    fn lower_params(&self, node: Node<'_>) -> Vec<Pattern> {
        let mut params = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() == "comment" {
                continue;
            }
            params.push(self.lower_pattern(child));
        }
        params
    }

    /// A parameter counts as a simple identifier only when it is a bare bound
    /// name: defaults, destructuring, and rest shapes all collapse to `Other`.
    fn lower_pattern(&self, node: Node<'_>) -> Pattern {
        let sp = span(node);
        match node.kind() {
            "identifier" => Pattern::Identifier {
                name: self.name(node),
                span: sp,
            },
            // TS parameters wrap the pattern and may carry a default value.
            "required_parameter" | "optional_parameter" => {
                if node.child_by_field_name("value").is_some() {
                    return Pattern::Other { span: sp };
                }
                match node.child_by_field_name("pattern") {
                    Some(p) if p.kind() == "identifier" => Pattern::Identifier {
                        name: self.name(p),
                        span: sp,
                    },
                    _ => Pattern::Other { span: sp },
                }
            }
            _ => Pattern::Other { span: sp },
        }
    }

    fn lower_declarators(&self, node: Node<'_>) -> Vec<Declarator> {
        let mut declarators = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() != "variable_declarator" {
                continue;
            }
            let name = child
                .child_by_field_name("name")
                .map_or(Pattern::Other { span: span(child) }, |n| {
                    self.lower_pattern(n)
                });
            let init = child
                .child_by_field_name("value")
                .map(|v| self.lower_expr(v));
            declarators.push(Declarator {
                name,
                init,
                span: span(child),
            });
        }
        declarators
    }

    fn lower_block(&self, node: Node<'_>) -> Vec<Stmt> {
        let mut body = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() == "comment" {
                continue;
            }
            body.push(self.lower_stmt(child));
        }
        body
    }

    fn lower_arguments(&self, node: Node<'_>) -> Vec<Expr> {
        match node.child_by_field_name("arguments") {
            Some(args) if args.kind() == "arguments" => {
                let mut out = Vec::new();
                let mut cursor = args.walk();
                for child in args.named_children(&mut cursor) {
                    if child.kind() == "comment" {
                        continue;
                    }
                    out.push(self.lower_expr(child));
                }
                out
            }
            // Tagged template: the template is the lone argument.
            Some(args) => vec![self.lower_expr(args)],
            None => Vec::new(),
        }
    }

    fn lower_switch_body(&self, node: Node<'_>) -> Vec<SwitchCase> {
        let mut cases = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "switch_case" => {
                    let value = child.child_by_field_name("value");
                    let test = value.map(|v| self.lower_expr(v));
                    let mut body = Vec::new();
                    let mut inner = child.walk();
                    for stmt in child.named_children(&mut inner) {
                        if stmt.kind() == "comment" {
                            continue;
                        }
                        if value.is_some_and(|v| v.id() == stmt.id()) {
                            continue;
                        }
                        body.push(self.lower_stmt(stmt));
                    }
                    cases.push(SwitchCase {
                        test,
                        body,
                        span: span(child),
                    });
                }
                "switch_default" => {
                    let mut body = Vec::new();
                    let mut inner = child.walk();
                    for stmt in child.named_children(&mut inner) {
                        if stmt.kind() == "comment" {
                            continue;
                        }
                        body.push(self.lower_stmt(stmt));
                    }
                    cases.push(SwitchCase {
                        test: None,
                        body,
                        span: span(child),
                    });
                }
                _ => {}
            }
        }
        cases
    }

    fn lower_any_children(&self, node: Node<'_>) -> (Vec<Expr>, Vec<Stmt>) {
        let mut exprs = Vec::new();
        let mut stmts = Vec::new();
        self.collect_any_children(node, &mut exprs, &mut stmts);
        (exprs, stmts)
    }

    fn collect_any_children(&self, node: Node<'_>, exprs: &mut Vec<Expr>, stmts: &mut Vec<Stmt>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            let kind = child.kind();
            if kind == "comment" {
                continue;
            }
            if is_stmt_kind(kind) {
                stmts.push(self.lower_stmt(child));
            } else if is_expr_kind(kind) {
                exprs.push(self.lower_expr(child));
            } else {
                self.collect_any_children(child, exprs, stmts);
            }
        }
    }

    fn collect_expr_children(&self, node: Node<'_>, out: &mut Vec<Expr>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            let kind = child.kind();
            if kind == "comment" {
                continue;
            }
            if is_expr_kind(kind) {
                out.push(self.lower_expr(child));
            } else {
                self.collect_expr_children(child, out);
            }
        }
    }

    fn first_named<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        let mut cursor = node.walk();
        let found = node
            .named_children(&mut cursor)
            .find(|c| c.kind() != "comment");
        found
    }

    /// for-loop conditions arrive wrapped in an `expression_statement`.
    fn unwrap_expr_stmt(&self, node: Node<'_>) -> Expr {
        if node.kind() == "expression_statement" {
            if let Some(inner) = self.first_named(node) {
                return self.lower_expr(inner);
            }
        }
        self.lower_expr(node)
    }

    fn lower_field_expr(&self, node: Node<'_>, field: &str) -> Expr {
        node.child_by_field_name(field)
            .map_or(
                Expr::Other {
                    children: Vec::new(),
                    span: span(node),
                },
                |n| self.lower_expr(n),
            )
    }

    fn lower_field_stmt(&self, node: Node<'_>, field: &str, fallback: Span) -> Stmt {
        node.child_by_field_name(field)
            .map_or(Stmt::Empty { span: fallback }, |n| self.lower_stmt(n))
    }

    fn string_value(&self, node: Node<'_>) -> String {
        let mut out = String::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "string_fragment" => out.push_str(self.text(child)),
                "escape_sequence" => {
                    let mut chars = self.text(child).chars();
                    chars.next();
                    match chars.next() {
                        Some('n') => out.push('\n'),
                        Some('t') => out.push('\t'),
                        Some('r') => out.push('\r'),
                        Some('0') => out.push('\0'),
                        Some(c) => out.push(c),
                        None => {}
                    }
                }
                _ => {}
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Expr, FunctionBody, Stmt};
    use crate::parser::{parse_source, Language};

    fn first_stmt(source: &str) -> Stmt {
        let parsed = parse_source(source, Language::JavaScript).unwrap();
        parsed.program.body.into_iter().next().unwrap()
    }

    #[test]
    fn lowers_arrow_handler_params() {
        let stmt = first_stmt("const mw = async (c, next) => { await next(); };");
        let Stmt::VarDecl { declarators, .. } = stmt else {
            panic!("expected var decl");
        };
        let Some(Expr::Function(func)) = &declarators[0].init else {
            panic!("expected arrow function initializer");
        };
        assert!(func.is_async);
        assert!(func.is_arrow);
        assert_eq!(func.params.len(), 2);
        assert_eq!(func.params[1].as_identifier().map(|n| n.as_str()), Some("next"));
        let FunctionBody::Block(body) = &func.body else {
            panic!("expected block body");
        };
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn default_valued_param_is_not_a_simple_identifier() {
        let stmt = first_stmt("const mw = (c, next = fallback) => {};");
        let Stmt::VarDecl { declarators, .. } = stmt else {
            panic!("expected var decl");
        };
        let Some(Expr::Function(func)) = &declarators[0].init else {
            panic!("expected function");
        };
        assert!(func.params[1].as_identifier().is_none());
    }

    #[test]
    fn lowers_member_call_chain() {
        let stmt = first_stmt("app.get('/users/:id', handler);");
        let Stmt::Expr { expr: Expr::Call { callee, arguments, .. }, .. } = stmt else {
            panic!("expected call statement");
        };
        let Expr::Member { object, property, .. } = *callee else {
            panic!("expected member callee");
        };
        assert_eq!(object.as_identifier(), Some("app"));
        assert_eq!(property.as_static(), Some("get"));
        assert_eq!(arguments[0].as_string(), Some("/users/:id"));
    }

    #[test]
    fn lowers_for_of_as_its_own_variant() {
        let stmt = first_stmt("for (const x of items) { use(x); }");
        assert!(matches!(stmt, Stmt::ForOf { .. }));
        let stmt = first_stmt("for (const k in table) { use(k); }");
        assert!(matches!(stmt, Stmt::ForIn { .. }));
    }

    #[test]
    fn typescript_types_are_transparent() {
        let parsed = parse_source(
            "const mw = async (c: Context, next: Next) => { await next(); };",
            Language::TypeScript,
        )
        .unwrap();
        let Stmt::VarDecl { declarators, .. } = &parsed.program.body[0] else {
            panic!("expected var decl");
        };
        let Some(Expr::Function(func)) = &declarators[0].init else {
            panic!("expected function");
        };
        assert_eq!(func.params[1].as_identifier().map(|n| n.as_str()), Some("next"));
    }

    #[test]
    fn functions_inside_classes_are_still_found() {
        let stmt = first_stmt("class A { handle(c, next) { next(); } }");
        let Stmt::Other { exprs, .. } = stmt else {
            panic!("expected class to lower as Other");
        };
        assert!(exprs.iter().any(|e| matches!(e, Expr::Function(_))));
    }

    #[test]
    fn string_escapes_resolve() {
        let stmt = first_stmt(r#"app.get("/a\"b", h);"#);
        let Stmt::Expr { expr: Expr::Call { arguments, .. }, .. } = stmt else {
            panic!("expected call");
        };
        assert_eq!(arguments[0].as_string(), Some("/a\"b"));
    }
}
