//! Abstract Emitter Module
//!
//! Base emitter functionality for code generation. Concrete emitters implement
//! [`AbstractEmitterVisitor`] and only override the nodes whose syntax differs.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::output::output_ast as o;

const INDENT_WITH: &str = "  ";

static LEGAL_IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_$ɵ][0-9a-zA-Z_$ɵ]*$").unwrap());

#[derive(Debug, Clone)]
struct EmittedLine {
    parts_length: usize,
    parts: Vec<String>,
    indent: usize,
}

impl EmittedLine {
    fn new(indent: usize) -> Self {
        EmittedLine {
            parts_length: 0,
            parts: Vec::new(),
            indent,
        }
    }
}

lazy_static::lazy_static! {
    pub static ref BINARY_OPERATORS: HashMap<o::BinaryOperator, &'static str> = {
        let mut m = HashMap::new();
        m.insert(o::BinaryOperator::And, "&&");
        m.insert(o::BinaryOperator::Bigger, ">");
        m.insert(o::BinaryOperator::BiggerEquals, ">=");
        m.insert(o::BinaryOperator::Divide, "/");
        m.insert(o::BinaryOperator::Assign, "=");
        m.insert(o::BinaryOperator::Equals, "==");
        m.insert(o::BinaryOperator::Identical, "===");
        m.insert(o::BinaryOperator::Lower, "<");
        m.insert(o::BinaryOperator::LowerEquals, "<=");
        m.insert(o::BinaryOperator::Minus, "-");
        m.insert(o::BinaryOperator::Modulo, "%");
        m.insert(o::BinaryOperator::Multiply, "*");
        m.insert(o::BinaryOperator::NotEquals, "!=");
        m.insert(o::BinaryOperator::NotIdentical, "!==");
        m.insert(o::BinaryOperator::NullishCoalesce, "??");
        m.insert(o::BinaryOperator::Or, "||");
        m.insert(o::BinaryOperator::Plus, "+");
        m
    };
}

pub struct EmitterVisitorContext {
    lines: Vec<EmittedLine>,
    indent: usize,
}

impl EmitterVisitorContext {
    pub fn create_root() -> Self {
        EmitterVisitorContext::new(0)
    }

    pub fn new(indent: usize) -> Self {
        EmitterVisitorContext {
            lines: vec![EmittedLine::new(indent)],
            indent,
        }
    }

    fn current_line_mut(&mut self) -> &mut EmittedLine {
        if self.lines.is_empty() {
            self.lines.push(EmittedLine::new(self.indent));
        }
        let last = self.lines.len() - 1;
        &mut self.lines[last]
    }

    pub fn println(&mut self, last_part: &str) {
        self.print(last_part, true);
    }

    pub fn line_is_empty(&self) -> bool {
        self.lines.last().map_or(true, |l| l.parts.is_empty())
    }

    pub fn line_length(&self) -> usize {
        self.lines
            .last()
            .map_or(0, |l| l.indent * INDENT_WITH.len() + l.parts_length)
    }

    pub fn print(&mut self, part: &str, new_line: bool) {
        if !part.is_empty() {
            let current = self.current_line_mut();
            current.parts.push(part.to_string());
            current.parts_length += part.len();
        }
        if new_line {
            self.lines.push(EmittedLine::new(self.indent));
        }
    }

    pub fn remove_empty_last_line(&mut self) {
        if self.line_is_empty() {
            self.lines.pop();
        }
    }

    pub fn inc_indent(&mut self) {
        self.indent += 1;
        if self.line_is_empty() {
            let indent = self.indent;
            self.current_line_mut().indent = indent;
        }
    }

    pub fn dec_indent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        if self.line_is_empty() {
            let indent = self.indent;
            self.current_line_mut().indent = indent;
        }
    }

    pub fn to_source(&self) -> String {
        let mut lines: &[EmittedLine] = &self.lines;
        if lines.last().map_or(false, |l| l.parts.is_empty()) {
            lines = &lines[..lines.len() - 1];
        }
        lines
            .iter()
            .map(|l| {
                if !l.parts.is_empty() {
                    format!("{}{}", create_indent(l.indent), l.parts.join(""))
                } else {
                    String::new()
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn create_indent(count: usize) -> String {
    INDENT_WITH.repeat(count)
}

/// Escape identifier for safe use in generated code
pub fn escape_identifier(input: &str, escape_dollar: bool, always_quote: bool) -> String {
    if input.is_empty() {
        return "''".to_string();
    }

    if !always_quote && LEGAL_IDENTIFIER_RE.is_match(input) {
        return input.to_string();
    }

    let mut escaped = input.replace('\\', "\\\\");
    escaped = escaped.replace('\'', "\\'");
    escaped = escaped.replace('\n', "\\n");
    escaped = escaped.replace('\r', "\\r");
    if escape_dollar {
        escaped = escaped.replace('$', "\\$");
    }

    format!("'{}'", escaped)
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Shared printing logic for JavaScript-like output.
///
/// Binary and conditional expressions are always parenthesized, so the emitter never has to
/// reason about operator precedence. Assignments are parenthesized unless they start a line.
pub trait AbstractEmitterVisitor {
    fn visit_external_expr(&mut self, expr: &o::ExternalExpr, ctx: &mut EmitterVisitorContext);

    fn visit_declare_var_stmt(&mut self, stmt: &o::DeclareVarStmt, ctx: &mut EmitterVisitorContext);

    fn visit_function_expr(&mut self, expr: &o::FunctionExpr, ctx: &mut EmitterVisitorContext);

    fn visit_arrow_function_expr(
        &mut self,
        expr: &o::ArrowFunctionExpr,
        ctx: &mut EmitterVisitorContext,
    );

    fn visit_declare_function_stmt(
        &mut self,
        stmt: &o::DeclareFunctionStmt,
        ctx: &mut EmitterVisitorContext,
    );

    fn visit_expression(&mut self, expr: &o::Expression, ctx: &mut EmitterVisitorContext) {
        match expr {
            o::Expression::ReadVar(e) => self.visit_read_var_expr(e, ctx),
            o::Expression::WriteVar(e) => self.visit_write_var_expr(e, ctx),
            o::Expression::WriteKey(e) => self.visit_write_key_expr(e, ctx),
            o::Expression::WriteProp(e) => self.visit_write_prop_expr(e, ctx),
            o::Expression::InvokeFn(e) => self.visit_invoke_function_expr(e, ctx),
            o::Expression::Instantiate(e) => self.visit_instantiate_expr(e, ctx),
            o::Expression::Literal(e) => self.visit_literal_expr(e, ctx),
            o::Expression::External(e) => self.visit_external_expr(e, ctx),
            o::Expression::Conditional(e) => self.visit_conditional_expr(e, ctx),
            o::Expression::NotExpr(e) => self.visit_not_expr(e, ctx),
            o::Expression::Unary(e) => self.visit_unary_operator_expr(e, ctx),
            o::Expression::Fn(e) => self.visit_function_expr(e, ctx),
            o::Expression::ArrowFn(e) => self.visit_arrow_function_expr(e, ctx),
            o::Expression::BinaryOp(e) => self.visit_binary_operator_expr(e, ctx),
            o::Expression::ReadProp(e) => self.visit_read_prop_expr(e, ctx),
            o::Expression::ReadKey(e) => self.visit_read_key_expr(e, ctx),
            o::Expression::LiteralArray(e) => self.visit_literal_array_expr(e, ctx),
            o::Expression::LiteralMap(e) => self.visit_literal_map_expr(e, ctx),
            o::Expression::CommaExpr(e) => self.visit_comma_expr(e, ctx),
        }
    }

    fn visit_statement(&mut self, stmt: &o::Statement, ctx: &mut EmitterVisitorContext) {
        match stmt {
            o::Statement::DeclareVar(s) => self.visit_declare_var_stmt(s, ctx),
            o::Statement::DeclareFn(s) => self.visit_declare_function_stmt(s, ctx),
            o::Statement::Expression(s) => self.visit_expression_stmt(s, ctx),
            o::Statement::Return(s) => self.visit_return_stmt(s, ctx),
            o::Statement::IfStmt(s) => self.visit_if_stmt(s, ctx),
        }
    }

    fn visit_all_statements(&mut self, statements: &[o::Statement], ctx: &mut EmitterVisitorContext) {
        for statement in statements {
            self.visit_statement(statement, ctx);
        }
    }

    fn visit_all_expressions(
        &mut self,
        expressions: &[o::Expression],
        ctx: &mut EmitterVisitorContext,
        separator: &str,
    ) {
        for (i, expr) in expressions.iter().enumerate() {
            if i > 0 {
                ctx.print(separator, false);
            }
            self.visit_expression(expr, ctx);
        }
    }

    fn visit_params(&mut self, params: &[o::FnParam], ctx: &mut EmitterVisitorContext) {
        let names: Vec<String> = params
            .iter()
            .map(|p| escape_identifier(&p.name, false, false))
            .collect();
        ctx.print(&names.join(", "), false);
    }

    /// Prints `{ ... }` for a function body, or `{}` when it has no statements.
    fn visit_block(&mut self, statements: &[o::Statement], ctx: &mut EmitterVisitorContext) {
        if statements.is_empty() {
            ctx.print("{}", false);
            return;
        }
        ctx.println("{");
        ctx.inc_indent();
        self.visit_all_statements(statements, ctx);
        ctx.dec_indent();
        ctx.print("}", false);
    }

    fn visit_read_var_expr(&mut self, expr: &o::ReadVarExpr, ctx: &mut EmitterVisitorContext) {
        ctx.print(&escape_identifier(&expr.name, false, false), false);
    }

    fn visit_write_var_expr(&mut self, expr: &o::WriteVarExpr, ctx: &mut EmitterVisitorContext) {
        let line_was_empty = ctx.line_is_empty();
        if !line_was_empty {
            ctx.print("(", false);
        }
        ctx.print(&escape_identifier(&expr.name, false, false), false);
        ctx.print(" = ", false);
        self.visit_expression(&expr.value, ctx);
        if !line_was_empty {
            ctx.print(")", false);
        }
    }

    fn visit_write_key_expr(&mut self, expr: &o::WriteKeyExpr, ctx: &mut EmitterVisitorContext) {
        let line_was_empty = ctx.line_is_empty();
        if !line_was_empty {
            ctx.print("(", false);
        }
        self.visit_expression(&expr.receiver, ctx);
        ctx.print("[", false);
        self.visit_expression(&expr.index, ctx);
        ctx.print("] = ", false);
        self.visit_expression(&expr.value, ctx);
        if !line_was_empty {
            ctx.print(")", false);
        }
    }

    fn visit_write_prop_expr(&mut self, expr: &o::WritePropExpr, ctx: &mut EmitterVisitorContext) {
        let line_was_empty = ctx.line_is_empty();
        if !line_was_empty {
            ctx.print("(", false);
        }
        self.visit_expression(&expr.receiver, ctx);
        ctx.print(".", false);
        ctx.print(&expr.name, false);
        ctx.print(" = ", false);
        self.visit_expression(&expr.value, ctx);
        if !line_was_empty {
            ctx.print(")", false);
        }
    }

    fn visit_invoke_function_expr(
        &mut self,
        expr: &o::InvokeFunctionExpr,
        ctx: &mut EmitterVisitorContext,
    ) {
        self.visit_expression(&expr.fn_, ctx);
        ctx.print("(", false);
        self.visit_all_expressions(&expr.args, ctx, ", ");
        ctx.print(")", false);
    }

    fn visit_instantiate_expr(&mut self, expr: &o::InstantiateExpr, ctx: &mut EmitterVisitorContext) {
        ctx.print("new ", false);
        self.visit_expression(&expr.class_expr, ctx);
        ctx.print("(", false);
        self.visit_all_expressions(&expr.args, ctx, ", ");
        ctx.print(")", false);
    }

    fn visit_literal_expr(&mut self, expr: &o::LiteralExpr, ctx: &mut EmitterVisitorContext) {
        let value_str = match &expr.value {
            o::LiteralValue::Null => "null".to_string(),
            o::LiteralValue::Undefined => "undefined".to_string(),
            o::LiteralValue::String(s) => escape_identifier(s, false, true),
            o::LiteralValue::Number(n) => format_number(*n),
            o::LiteralValue::Bool(b) => b.to_string(),
        };
        ctx.print(&value_str, false);
    }

    fn visit_conditional_expr(&mut self, expr: &o::ConditionalExpr, ctx: &mut EmitterVisitorContext) {
        ctx.print("(", false);
        self.visit_expression(&expr.condition, ctx);
        ctx.print(" ? ", false);
        self.visit_expression(&expr.true_case, ctx);
        ctx.print(" : ", false);
        match &expr.false_case {
            Some(false_case) => self.visit_expression(false_case, ctx),
            None => ctx.print("null", false),
        }
        ctx.print(")", false);
    }

    fn visit_not_expr(&mut self, expr: &o::NotExpr, ctx: &mut EmitterVisitorContext) {
        ctx.print("!", false);
        self.visit_expression(&expr.condition, ctx);
    }

    fn visit_unary_operator_expr(
        &mut self,
        expr: &o::UnaryOperatorExpr,
        ctx: &mut EmitterVisitorContext,
    ) {
        let op = match expr.operator {
            o::UnaryOperator::Minus => "-",
            o::UnaryOperator::Plus => "+",
        };
        ctx.print("(", false);
        ctx.print(op, false);
        self.visit_expression(&expr.expr, ctx);
        ctx.print(")", false);
    }

    fn visit_binary_operator_expr(
        &mut self,
        expr: &o::BinaryOperatorExpr,
        ctx: &mut EmitterVisitorContext,
    ) {
        let op_str = BINARY_OPERATORS.get(&expr.operator).copied().unwrap_or("=");
        ctx.print("(", false);
        self.visit_expression(&expr.lhs, ctx);
        ctx.print(" ", false);
        ctx.print(op_str, false);
        ctx.print(" ", false);
        self.visit_expression(&expr.rhs, ctx);
        ctx.print(")", false);
    }

    fn visit_read_prop_expr(&mut self, expr: &o::ReadPropExpr, ctx: &mut EmitterVisitorContext) {
        self.visit_expression(&expr.receiver, ctx);
        ctx.print(".", false);
        ctx.print(&expr.name, false);
    }

    fn visit_read_key_expr(&mut self, expr: &o::ReadKeyExpr, ctx: &mut EmitterVisitorContext) {
        self.visit_expression(&expr.receiver, ctx);
        ctx.print("[", false);
        self.visit_expression(&expr.index, ctx);
        ctx.print("]", false);
    }

    fn visit_literal_array_expr(
        &mut self,
        expr: &o::LiteralArrayExpr,
        ctx: &mut EmitterVisitorContext,
    ) {
        ctx.print("[", false);
        self.visit_all_expressions(&expr.entries, ctx, ", ");
        ctx.print("]", false);
    }

    fn visit_literal_map_expr(&mut self, expr: &o::LiteralMapExpr, ctx: &mut EmitterVisitorContext) {
        ctx.print("{", false);
        for (i, entry) in expr.entries.iter().enumerate() {
            if i > 0 {
                ctx.print(", ", false);
            }
            ctx.print(&escape_identifier(&entry.key, false, entry.quoted), false);
            ctx.print(": ", false);
            self.visit_expression(&entry.value, ctx);
        }
        ctx.print("}", false);
    }

    fn visit_comma_expr(&mut self, expr: &o::CommaExpr, ctx: &mut EmitterVisitorContext) {
        ctx.print("(", false);
        self.visit_all_expressions(&expr.parts, ctx, ", ");
        ctx.print(")", false);
    }

    fn visit_expression_stmt(&mut self, stmt: &o::ExpressionStatement, ctx: &mut EmitterVisitorContext) {
        self.visit_expression(&stmt.expr, ctx);
        ctx.println(";");
    }

    fn visit_return_stmt(&mut self, stmt: &o::ReturnStatement, ctx: &mut EmitterVisitorContext) {
        ctx.print("return ", false);
        self.visit_expression(&stmt.value, ctx);
        ctx.println(";");
    }

    fn visit_if_stmt(&mut self, stmt: &o::IfStmt, ctx: &mut EmitterVisitorContext) {
        ctx.print("if (", false);
        self.visit_expression(&stmt.condition, ctx);
        ctx.println(") {");
        ctx.inc_indent();
        self.visit_all_statements(&stmt.true_case, ctx);
        ctx.dec_indent();
        if !stmt.false_case.is_empty() {
            ctx.println("} else {");
            ctx.inc_indent();
            self.visit_all_statements(&stmt.false_case, ctx);
            ctx.dec_indent();
        }
        ctx.println("}");
    }
}
