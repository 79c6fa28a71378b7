//! Constant Pool
//!
//! The ConstantPool hoists literals, pure functions and shared definition references to
//! file-level `const` declarations and reuses a declaration when two requests are
//! structurally identical.

use indexmap::IndexMap;
use tracing::debug;

use crate::output::output_ast as o;

const CONSTANT_PREFIX: &str = "_c";

/// Describes how a shared constant is keyed, named and declared.
pub trait SharedConstantDefinition {
    fn key_of(&self, expr: &o::Expression) -> String;

    /// A preferred declaration name. `None` falls back to a fresh `_cN` name.
    fn preferred_name(&self, _expr: &o::Expression) -> Option<String> {
        None
    }

    fn to_shared_constant_declaration(&self, name: String, expr: o::Expression) -> o::Statement {
        o::declare_var(name, Some(expr), o::StmtModifier::Final)
    }
}

/// Generic key function (for expression deduplication)
pub struct GenericKeyFn;

impl GenericKeyFn {
    pub const INSTANCE: GenericKeyFn = GenericKeyFn;

    pub fn key_of(&self, expr: &o::Expression) -> String {
        let mut out = String::new();
        write_expression_key(expr, &mut out);
        out
    }
}

impl SharedConstantDefinition for GenericKeyFn {
    fn key_of(&self, expr: &o::Expression) -> String {
        GenericKeyFn::key_of(self, expr)
    }
}

fn write_list_key(exprs: &[o::Expression], out: &mut String) {
    for (i, e) in exprs.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_expression_key(e, out);
    }
}

fn write_statement_key(stmt: &o::Statement, out: &mut String) {
    match stmt {
        o::Statement::DeclareVar(s) => {
            out.push_str(if s.modifiers == o::StmtModifier::Final { "const " } else { "var " });
            out.push_str(&s.name);
            if let Some(value) = &s.value {
                out.push('=');
                write_expression_key(value, out);
            }
        }
        o::Statement::DeclareFn(s) => {
            out.push_str("function ");
            out.push_str(&s.name);
            write_params_key(&s.params, out);
            write_body_key(&s.statements, out);
        }
        o::Statement::Expression(s) => write_expression_key(&s.expr, out),
        o::Statement::Return(s) => {
            out.push_str("return ");
            write_expression_key(&s.value, out);
        }
        o::Statement::IfStmt(s) => {
            out.push_str("if(");
            write_expression_key(&s.condition, out);
            out.push(')');
            write_body_key(&s.true_case, out);
            out.push_str("else");
            write_body_key(&s.false_case, out);
        }
    }
    out.push(';');
}

fn write_params_key(params: &[o::FnParam], out: &mut String) {
    out.push('(');
    let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
    out.push_str(&names.join(","));
    out.push(')');
}

fn write_body_key(statements: &[o::Statement], out: &mut String) {
    out.push('{');
    for stmt in statements {
        write_statement_key(stmt, out);
    }
    out.push('}');
}

/// Writes a compact, unambiguous rendering of `expr`. Two expressions get the same key
/// exactly when they would print the same code.
fn write_expression_key(expr: &o::Expression, out: &mut String) {
    match expr {
        o::Expression::ReadVar(e) => out.push_str(&e.name),
        o::Expression::WriteVar(e) => {
            out.push_str(&e.name);
            out.push('=');
            write_expression_key(&e.value, out);
        }
        o::Expression::WriteKey(e) => {
            write_expression_key(&e.receiver, out);
            out.push('[');
            write_expression_key(&e.index, out);
            out.push_str("]=");
            write_expression_key(&e.value, out);
        }
        o::Expression::WriteProp(e) => {
            write_expression_key(&e.receiver, out);
            out.push('.');
            out.push_str(&e.name);
            out.push('=');
            write_expression_key(&e.value, out);
        }
        o::Expression::InvokeFn(e) => {
            write_expression_key(&e.fn_, out);
            out.push('(');
            write_list_key(&e.args, out);
            out.push(')');
        }
        o::Expression::Instantiate(e) => {
            out.push_str("new ");
            write_expression_key(&e.class_expr, out);
            out.push('(');
            write_list_key(&e.args, out);
            out.push(')');
        }
        o::Expression::Literal(e) => match &e.value {
            o::LiteralValue::Null => out.push_str("null"),
            o::LiteralValue::Undefined => out.push_str("undefined"),
            o::LiteralValue::String(s) => {
                out.push_str(&serde_json::Value::String(s.clone()).to_string())
            }
            o::LiteralValue::Number(n) => out.push_str(&n.to_string()),
            o::LiteralValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        },
        o::Expression::External(e) => {
            out.push_str(e.value.module_name.as_deref().unwrap_or(""));
            out.push('#');
            out.push_str(e.value.name.as_deref().unwrap_or(""));
        }
        o::Expression::Conditional(e) => {
            out.push('(');
            write_expression_key(&e.condition, out);
            out.push('?');
            write_expression_key(&e.true_case, out);
            out.push(':');
            match &e.false_case {
                Some(f) => write_expression_key(f, out),
                None => out.push_str("null"),
            }
            out.push(')');
        }
        o::Expression::NotExpr(e) => {
            out.push('!');
            write_expression_key(&e.condition, out);
        }
        o::Expression::Unary(e) => {
            out.push('(');
            out.push(match e.operator {
                o::UnaryOperator::Minus => '-',
                o::UnaryOperator::Plus => '+',
            });
            write_expression_key(&e.expr, out);
            out.push(')');
        }
        o::Expression::Fn(e) => {
            out.push_str("function ");
            out.push_str(e.name.as_deref().unwrap_or(""));
            write_params_key(&e.params, out);
            write_body_key(&e.statements, out);
        }
        o::Expression::ArrowFn(e) => {
            write_params_key(&e.params, out);
            out.push_str("=>");
            match &e.body {
                o::ArrowFunctionBody::Expression(body) => write_expression_key(body, out),
                o::ArrowFunctionBody::Statements(stmts) => write_body_key(stmts, out),
            }
        }
        o::Expression::BinaryOp(e) => {
            out.push('(');
            write_expression_key(&e.lhs, out);
            out.push_str(&format!("{:?}", e.operator));
            write_expression_key(&e.rhs, out);
            out.push(')');
        }
        o::Expression::ReadProp(e) => {
            write_expression_key(&e.receiver, out);
            out.push('.');
            out.push_str(&e.name);
        }
        o::Expression::ReadKey(e) => {
            write_expression_key(&e.receiver, out);
            out.push('[');
            write_expression_key(&e.index, out);
            out.push(']');
        }
        o::Expression::LiteralArray(e) => {
            out.push('[');
            write_list_key(&e.entries, out);
            out.push(']');
        }
        o::Expression::LiteralMap(e) => {
            out.push('{');
            for (i, entry) in e.entries.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                if entry.quoted {
                    out.push_str(&serde_json::Value::String(entry.key.clone()).to_string());
                } else {
                    out.push_str(&entry.key);
                }
                out.push(':');
                write_expression_key(&entry.value, out);
            }
            out.push('}');
        }
        o::Expression::CommaExpr(e) => {
            out.push('(');
            write_list_key(&e.parts, out);
            out.push(')');
        }
    }
}

/// File-scoped pool of hoisted declarations.
///
/// The pool is `Clone` so a driver can snapshot it before compiling a definition and roll
/// back every declaration that definition added if it fails.
#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    pub statements: Vec<o::Statement>,
    literals: IndexMap<String, o::Expression>,
    shared_constants: IndexMap<String, o::Expression>,
    functions: IndexMap<String, o::Expression>,
    claimed_names: IndexMap<String, u32>,
    next_name_index: u32,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a reference to a hoisted `const` holding `literal`.
    ///
    /// Primitive literals are returned unchanged. Identical composite literals share a single
    /// declaration.
    pub fn get_const_literal(&mut self, literal: o::Expression) -> o::Expression {
        if literal.is_primitive_literal() {
            return literal;
        }

        let key = GenericKeyFn::INSTANCE.key_of(&literal);
        if let Some(existing) = self.literals.get(&key) {
            return existing.clone();
        }

        let name = self.fresh_name();
        debug!(name = %name, key = %key, "hoisting constant literal");
        self.statements
            .push(o::declare_var(name.clone(), Some(literal), o::StmtModifier::Final));
        let var_expr = o::variable(name);
        self.literals.insert(key, var_expr.clone());
        var_expr
    }

    pub fn get_shared_constant(
        &mut self,
        definition: &dyn SharedConstantDefinition,
        initial_value: o::Expression,
    ) -> o::Expression {
        let key = definition.key_of(&initial_value);
        if let Some(existing) = self.shared_constants.get(&key) {
            return existing.clone();
        }

        let id = match definition.preferred_name(&initial_value) {
            Some(preferred) => self.unique_name(&preferred),
            None => self.fresh_name(),
        };
        debug!(name = %id, "declaring shared constant");
        let stmt = definition.to_shared_constant_declaration(id.clone(), initial_value);
        self.statements.push(stmt);

        let var_expr = o::variable(id);
        self.shared_constants.insert(key, var_expr.clone());
        var_expr
    }

    /// Declares `fn_expr` as a `const` named after `prefix`, or returns the reference to an
    /// identical function declared earlier.
    pub fn get_shared_function_reference(&mut self, fn_expr: o::Expression, prefix: &str) -> o::Expression {
        let key = GenericKeyFn::INSTANCE.key_of(&fn_expr);
        if let Some(existing) = self.functions.get(&key) {
            return existing.clone();
        }

        let name = self.unique_name(prefix);
        debug!(name = %name, "declaring shared function");
        self.statements
            .push(o::declare_var(name.clone(), Some(fn_expr), o::StmtModifier::Final));
        let var_expr = o::variable(name);
        self.functions.insert(key, var_expr.clone());
        var_expr
    }

    /// Claims `preferred_name`, or `preferred_name_N` if it was already claimed.
    pub fn unique_name(&mut self, preferred_name: &str) -> String {
        let count = match self.claimed_names.get_mut(preferred_name) {
            None => {
                self.claimed_names.insert(preferred_name.to_string(), 0);
                return preferred_name.to_string();
            }
            Some(count) => {
                *count += 1;
                *count
            }
        };
        let unique = format!("{}_{}", preferred_name, count);
        if self.claimed_names.contains_key(&unique) {
            return self.unique_name(preferred_name);
        }
        self.claimed_names.insert(unique.clone(), 0);
        unique
    }

    fn fresh_name(&mut self) -> String {
        loop {
            let name = format!("{}{}", CONSTANT_PREFIX, self.next_name_index);
            self.next_name_index += 1;
            if !self.claimed_names.contains_key(&name) {
                self.claimed_names.insert(name.clone(), 0);
                return name;
            }
        }
    }
}
