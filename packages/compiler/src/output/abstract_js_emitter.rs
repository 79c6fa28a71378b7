//! Abstract JavaScript Emitter Module
//!
//! JavaScript-specific emitter functionality: `var`/`const` declarations, function and
//! arrow function syntax, and aliased runtime imports.

use crate::config::CompilerConfig;
use crate::output::abstract_emitter::{escape_identifier, AbstractEmitterVisitor, EmitterVisitorContext};
use crate::output::output_ast as o;

/// Prints output statements as ES2015 JavaScript.
///
/// References into the runtime module are printed through its namespace alias
/// (`i0.ɵE`). References without a module, or into any other module, print their bare name.
pub struct JavaScriptEmitter {
    core_module: String,
    core_alias: String,
}

impl JavaScriptEmitter {
    pub fn new(core_module: impl Into<String>, core_alias: impl Into<String>) -> Self {
        JavaScriptEmitter {
            core_module: core_module.into(),
            core_alias: core_alias.into(),
        }
    }

    pub fn from_config(config: &CompilerConfig) -> Self {
        JavaScriptEmitter::new(config.core_module.clone(), config.core_alias.clone())
    }

    pub fn emit_statements(&mut self, statements: &[o::Statement]) -> String {
        let mut ctx = EmitterVisitorContext::create_root();
        self.visit_all_statements(statements, &mut ctx);
        ctx.to_source()
    }

    pub fn emit_expression(&mut self, expr: &o::Expression) -> String {
        let mut ctx = EmitterVisitorContext::create_root();
        self.visit_expression(expr, &mut ctx);
        ctx.to_source()
    }
}

impl AbstractEmitterVisitor for JavaScriptEmitter {
    fn visit_external_expr(&mut self, expr: &o::ExternalExpr, ctx: &mut EmitterVisitorContext) {
        let reference = &expr.value;
        if reference.module_name.as_deref() == Some(self.core_module.as_str()) {
            ctx.print(&self.core_alias, false);
            ctx.print(".", false);
        }
        if let Some(name) = &reference.name {
            ctx.print(name, false);
        }
    }

    fn visit_declare_var_stmt(&mut self, stmt: &o::DeclareVarStmt, ctx: &mut EmitterVisitorContext) {
        let keyword = match stmt.modifiers {
            o::StmtModifier::Final => "const ",
            o::StmtModifier::None => "var ",
        };
        ctx.print(keyword, false);
        ctx.print(&escape_identifier(&stmt.name, false, false), false);
        if let Some(value) = &stmt.value {
            ctx.print(" = ", false);
            self.visit_expression(value, ctx);
        }
        ctx.println(";");
    }

    fn visit_function_expr(&mut self, expr: &o::FunctionExpr, ctx: &mut EmitterVisitorContext) {
        ctx.print("function", false);
        if let Some(name) = &expr.name {
            ctx.print(" ", false);
            ctx.print(name, false);
        }
        ctx.print("(", false);
        self.visit_params(&expr.params, ctx);
        ctx.print(") ", false);
        self.visit_block(&expr.statements, ctx);
    }

    fn visit_arrow_function_expr(
        &mut self,
        expr: &o::ArrowFunctionExpr,
        ctx: &mut EmitterVisitorContext,
    ) {
        ctx.print("(", false);
        self.visit_params(&expr.params, ctx);
        ctx.print(") => ", false);
        match &expr.body {
            o::ArrowFunctionBody::Expression(body) => {
                let needs_parens = matches!(body.as_ref(), o::Expression::LiteralMap(_));
                if needs_parens {
                    ctx.print("(", false);
                }
                self.visit_expression(body, ctx);
                if needs_parens {
                    ctx.print(")", false);
                }
            }
            o::ArrowFunctionBody::Statements(statements) => self.visit_block(statements, ctx),
        }
    }

    fn visit_declare_function_stmt(
        &mut self,
        stmt: &o::DeclareFunctionStmt,
        ctx: &mut EmitterVisitorContext,
    ) {
        ctx.print("function ", false);
        ctx.print(&escape_identifier(&stmt.name, false, false), false);
        ctx.print("(", false);
        self.visit_params(&stmt.params, ctx);
        ctx.print(") ", false);
        self.visit_block(&stmt.statements, ctx);
        ctx.println("");
    }
}
