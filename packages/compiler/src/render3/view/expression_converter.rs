//! Expression Converter
//!
//! Lowers template expressions into output expressions the instruction set can
//! consume. Composite literals with dynamic parts become memoized pure function
//! calls, fully literal ones are hoisted as constants, pipes become pipe binding
//! instructions and implicit reads resolve against the template scope chain.

use tracing::debug;

use super::util::{invoke_instruction, CONTEXT_NAME, EVENT_NAME};
use crate::constant_pool::ConstantPool;
use crate::error::{CompileError, Result};
use crate::expression_parser::ast::{self as e, AbsoluteSourceSpan, AstVisitor, AST};
use crate::output::output_ast as o;
use crate::parse_util::ParseSourceSpan;
use crate::render3::r3_identifiers::{Identifiers as R3, MAX_FIXED_ARITY, MAX_PIPE_BIND_ARITY};

/// Prefix of the module-level pure functions.
const PURE_FUNCTION_PREFIX: &str = "_ff";

/// What the converter can ask of the template it converts for.
pub trait BindingScope {
    /// Resolves a template variable or reference. `None` reads from the component.
    fn resolve_local(&mut self, name: &str) -> Option<o::Expression>;

    /// Allocates the slot of a pipe instance and emits its creation.
    fn allocate_pipe(&mut self, pipe_name: &str, span: AbsoluteSourceSpan) -> Result<usize>;

    fn constant_pool(&mut self) -> &mut ConstantPool;

    /// The `_t` temporary of the view being emitted, declared on first use.
    fn allocate_temporary(&mut self) -> Result<o::Expression>;

    fn source_span(&self, _span: AbsoluteSourceSpan) -> Option<ParseSourceSpan> {
        None
    }
}

/// Whether an expression is evaluated as a binding (every refresh) or as an event
/// handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingForm {
    Binding,
    Action,
}

/// How a property binding value was lowered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionClass {
    /// Fully literal.
    Constant,
    /// A single dynamic value.
    Simple,
    /// An array or object literal wrapped in a pure function of `arity` arguments.
    Composite { arity: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedBinding {
    /// The value to pass to the binding instruction.
    pub value: o::Expression,
    pub class: ExpressionClass,
}

/// A lowered sub-expression and whether it is input independent.
#[derive(Debug, Clone, PartialEq)]
pub struct LoweredExpression {
    pub expr: o::Expression,
    pub constant: bool,
}

impl LoweredExpression {
    fn dynamic(expr: o::Expression) -> Self {
        LoweredExpression {
            expr,
            constant: false,
        }
    }

    fn constant(expr: o::Expression) -> Self {
        LoweredExpression {
            expr,
            constant: true,
        }
    }
}

/// Lowers a property, attribute, class or style binding.
///
/// Interpolations are passed through the interpolation instructions. Everything else is
/// wrapped in `ɵb` so the binding is only marked dirty when its value changes.
pub fn convert_property_binding(
    scope: &mut dyn BindingScope,
    ast: &AST,
) -> Result<ConvertedBinding> {
    let mut converter = ExpressionConverter::new(scope, BindingForm::Binding);
    if let AST::Interpolation(interpolation) = ast {
        let value = converter.interpolate(interpolation)?;
        return Ok(ConvertedBinding {
            value,
            class: ExpressionClass::Simple,
        });
    }

    let lowered = ast.visit(&mut converter)?;
    let class = if lowered.constant {
        ExpressionClass::Constant
    } else {
        match (ast, &lowered.expr) {
            (AST::LiteralArray(_) | AST::LiteralMap(_), o::Expression::InvokeFn(call)) => {
                ExpressionClass::Composite {
                    arity: call.args.len().saturating_sub(1),
                }
            }
            _ => ExpressionClass::Simple,
        }
    };
    Ok(ConvertedBinding {
        value: invoke_instruction(R3::bind(), vec![lowered.expr]),
        class,
    })
}

/// Lowers the interpolation of a bound text node.
pub fn convert_interpolation(scope: &mut dyn BindingScope, ast: &AST) -> Result<o::Expression> {
    let mut converter = ExpressionConverter::new(scope, BindingForm::Binding);
    match ast {
        AST::Interpolation(interpolation) => converter.interpolate(interpolation),
        other => Ok(other.visit(&mut converter)?.expr),
    }
}

/// Lowers an event handler into the statements of a listener function. The value of the
/// last expression is returned.
pub fn convert_action_binding(
    scope: &mut dyn BindingScope,
    ast: &AST,
) -> Result<Vec<o::Statement>> {
    let mut converter = ExpressionConverter::new(scope, BindingForm::Action);
    let expressions: Vec<&AST> = match ast {
        AST::Chain(chain) => chain.expressions.iter().map(Box::as_ref).collect(),
        other => vec![other],
    };

    let mut statements = Vec::with_capacity(expressions.len());
    let last = expressions.len().saturating_sub(1);
    for (i, expression) in expressions.into_iter().enumerate() {
        let lowered = expression.visit(&mut converter)?;
        if i == last {
            statements.push(o::return_stmt(lowered.expr));
        } else {
            statements.push(lowered.expr.into_stmt());
        }
    }
    Ok(statements)
}

/// Converts one expression tree. Composites are lowered post-order so inner pure
/// functions are declared before the ones that call them.
pub struct ExpressionConverter<'s> {
    scope: &'s mut dyn BindingScope,
    form: BindingForm,
    implicit_receiver: o::Expression,
}

impl<'s> ExpressionConverter<'s> {
    pub fn new(scope: &'s mut dyn BindingScope, form: BindingForm) -> Self {
        ExpressionConverter {
            scope,
            form,
            implicit_receiver: o::variable(CONTEXT_NAME),
        }
    }

    fn syntax_error(&self, message: impl Into<String>, span: AbsoluteSourceSpan) -> CompileError {
        CompileError::syntax(message, self.scope.source_span(span))
    }

    fn visit_all(&mut self, asts: &[Box<AST>]) -> Result<Vec<LoweredExpression>> {
        asts.iter().map(|ast| ast.visit(self)).collect()
    }

    /// `ɵiN(s0, v0, s1, ..., sN)` for up to eight values, `ɵiV([...])` above that.
    pub fn interpolate(&mut self, interpolation: &e::Interpolation) -> Result<o::Expression> {
        let values = self.visit_all(&interpolation.expressions)?;
        if values.is_empty() {
            return Ok(o::literal(interpolation.strings.concat()));
        }

        let string_at = |i: usize| -> o::Expression {
            o::literal(interpolation.strings.get(i).map_or("", String::as_str))
        };
        let mut args = Vec::with_capacity(values.len() * 2 + 1);
        args.push(string_at(0));
        let count = values.len();
        for (i, value) in values.into_iter().enumerate() {
            args.push(value.expr);
            args.push(string_at(i + 1));
        }

        if count <= MAX_FIXED_ARITY {
            Ok(invoke_instruction(R3::interpolation(count), args))
        } else {
            Ok(invoke_instruction(
                R3::interpolation_v(),
                vec![o::literal_arr(args)],
            ))
        }
    }

    /// Lowers an array or object literal from its lowered entries.
    ///
    /// Constant literals are hoisted. Literals with dynamic entries become a call to a
    /// shared pure function whose body rebuilds the literal from its `vN` parameters.
    fn lower_composite(
        &mut self,
        entries: Vec<LoweredExpression>,
        build: impl Fn(Vec<o::Expression>) -> o::Expression,
    ) -> LoweredExpression {
        if self.form == BindingForm::Action {
            return LoweredExpression::dynamic(build(entries.into_iter().map(|e| e.expr).collect()));
        }

        if entries.iter().all(|entry| entry.constant) {
            let literal = build(entries.into_iter().map(|e| e.expr).collect());
            return LoweredExpression::constant(self.scope.constant_pool().get_const_literal(literal));
        }

        let mut params = Vec::new();
        let mut args = Vec::new();
        let mut shape = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.constant {
                shape.push(entry.expr);
            } else {
                let param = format!("v{}", params.len());
                shape.push(o::variable(param.as_str()));
                params.push(o::FnParam::new(param));
                args.push(entry.expr);
            }
        }

        let pure_fn = o::arrow_fn(
            params,
            o::ArrowFunctionBody::Expression(Box::new(build(shape))),
        );
        let fn_ref = self
            .scope
            .constant_pool()
            .get_shared_function_reference(pure_fn, PURE_FUNCTION_PREFIX);
        debug!(arity = args.len(), "lowered composite literal to a pure function");
        LoweredExpression::dynamic(pure_function_call(fn_ref, args))
    }
}

/// Whether evaluating the expression twice could repeat a call, such as a pipe binding
/// or a pure function.
fn needs_temporary(expr: &o::Expression) -> bool {
    let mut calls = false;
    expr.walk(&mut |sub| {
        if matches!(sub, o::Expression::InvokeFn(_) | o::Expression::Instantiate(_)) {
            calls = true;
        }
    });
    calls
}

/// `ɵfN(fn, a0, ...)` for up to eight arguments, `ɵfV(fn, a0, ...)` above that.
pub fn pure_function_call(fn_ref: o::Expression, args: Vec<o::Expression>) -> o::Expression {
    let reference = R3::pure_function(args.len());
    let mut call_args = Vec::with_capacity(args.len() + 1);
    call_args.push(fn_ref);
    call_args.extend(args);
    invoke_instruction(reference, call_args)
}

impl<'s> AstVisitor for ExpressionConverter<'s> {
    type Result = Result<LoweredExpression>;

    fn visit_empty_expr(&mut self, _ast: &e::EmptyExpr) -> Self::Result {
        Ok(LoweredExpression::constant(o::literal(o::LiteralValue::Undefined)))
    }

    fn visit_binary(&mut self, ast: &e::Binary) -> Self::Result {
        let operator = o::BinaryOperator::from_template_operator(&ast.operation).ok_or_else(|| {
            self.syntax_error(format!("Unsupported operator {}", ast.operation), ast.source_span)
        })?;
        let left = ast.left.visit(self)?;
        let right = ast.right.visit(self)?;
        Ok(LoweredExpression {
            expr: left.expr.binary(operator, right.expr),
            constant: left.constant && right.constant,
        })
    }

    fn visit_chain(&mut self, ast: &e::Chain) -> Self::Result {
        Err(self.syntax_error(
            "Expression chains are only allowed in event bindings",
            ast.source_span,
        ))
    }

    fn visit_conditional(&mut self, ast: &e::Conditional) -> Self::Result {
        let condition = ast.condition.visit(self)?;
        let true_exp = ast.true_exp.visit(self)?;
        let false_exp = ast.false_exp.visit(self)?;
        Ok(LoweredExpression {
            constant: condition.constant && true_exp.constant && false_exp.constant,
            expr: condition.expr.conditional(true_exp.expr, Some(false_exp.expr)),
        })
    }

    fn visit_implicit_receiver(&mut self, _ast: &e::ImplicitReceiver) -> Self::Result {
        Ok(LoweredExpression::dynamic(self.implicit_receiver.clone()))
    }

    fn visit_this_receiver(&mut self, _ast: &e::ThisReceiver) -> Self::Result {
        Ok(LoweredExpression::dynamic(self.implicit_receiver.clone()))
    }

    fn visit_interpolation(&mut self, ast: &e::Interpolation) -> Self::Result {
        Ok(LoweredExpression::dynamic(self.interpolate(ast)?))
    }

    fn visit_property_read(&mut self, ast: &e::PropertyRead) -> Self::Result {
        if ast.receiver.is_implicit_receiver() {
            if self.form == BindingForm::Action && ast.name == EVENT_NAME {
                return Ok(LoweredExpression::dynamic(o::variable(EVENT_NAME)));
            }
            if let Some(local) = self.scope.resolve_local(&ast.name) {
                return Ok(LoweredExpression::dynamic(local));
            }
        }
        let receiver = ast.receiver.visit(self)?;
        Ok(LoweredExpression::dynamic(receiver.expr.prop(ast.name.as_str())))
    }

    /// `a?.b` reads `null` when `a` is nullish. A receiver that calls anything is
    /// cached in `_t`, which is only live between the assignment and the read.
    fn visit_safe_property_read(&mut self, ast: &e::SafePropertyRead) -> Self::Result {
        let receiver = ast.receiver.visit(self)?.expr;
        let (guard, target) = if needs_temporary(&receiver) {
            let temporary = self.scope.allocate_temporary()?;
            (temporary.set(receiver), temporary)
        } else {
            (receiver.clone(), receiver)
        };
        Ok(LoweredExpression::dynamic(
            guard
                .equals(o::null_expr())
                .conditional(o::null_expr(), Some(target.prop(ast.name.as_str()))),
        ))
    }

    fn visit_keyed_read(&mut self, ast: &e::KeyedRead) -> Self::Result {
        let receiver = ast.receiver.visit(self)?;
        let key = ast.key.visit(self)?;
        Ok(LoweredExpression::dynamic(receiver.expr.key(key.expr)))
    }

    fn visit_literal_primitive(&mut self, ast: &e::LiteralPrimitive) -> Self::Result {
        let value = match ast {
            e::LiteralPrimitive::String { value, .. } => o::LiteralValue::String(value.clone()),
            e::LiteralPrimitive::Number { value, .. } => o::LiteralValue::Number(*value),
            e::LiteralPrimitive::Boolean { value, .. } => o::LiteralValue::Bool(*value),
            e::LiteralPrimitive::Null { .. } => o::LiteralValue::Null,
            e::LiteralPrimitive::Undefined { .. } => o::LiteralValue::Undefined,
        };
        Ok(LoweredExpression::constant(o::literal(value)))
    }

    fn visit_literal_array(&mut self, ast: &e::LiteralArray) -> Self::Result {
        let entries = self.visit_all(&ast.expressions)?;
        Ok(self.lower_composite(entries, o::literal_arr))
    }

    fn visit_literal_map(&mut self, ast: &e::LiteralMap) -> Self::Result {
        if ast.keys.len() != ast.values.len() {
            return Err(self.syntax_error("Malformed object literal", ast.source_span));
        }
        let values = self.visit_all(&ast.values)?;
        let keys = ast.keys.clone();
        Ok(self.lower_composite(values, move |values| {
            o::literal_map(
                keys.iter()
                    .zip(values)
                    .map(|(key, value)| o::LiteralMapEntry::new(key.key.as_str(), value, key.quoted))
                    .collect(),
            )
        }))
    }

    fn visit_call(&mut self, ast: &e::Call) -> Self::Result {
        let receiver = ast.receiver.visit(self)?;
        let args = self.visit_all(&ast.args)?;
        Ok(LoweredExpression::dynamic(
            receiver.expr.call_fn(args.into_iter().map(|a| a.expr).collect()),
        ))
    }

    fn visit_pipe(&mut self, ast: &e::BindingPipe) -> Self::Result {
        if self.form == BindingForm::Action {
            return Err(self.syntax_error(
                "Cannot have a pipe in an action expression",
                ast.source_span,
            ));
        }
        // The outermost pipe takes its slot before the pipes nested in its arguments.
        let slot = self.scope.allocate_pipe(&ast.name, ast.source_span)?;

        let mut values = Vec::with_capacity(ast.args.len() + 1);
        values.push(ast.exp.visit(self)?.expr);
        values.extend(self.visit_all(&ast.args)?.into_iter().map(|a| a.expr));

        let count = values.len();
        let call = if count <= MAX_PIPE_BIND_ARITY {
            let mut args = Vec::with_capacity(count + 1);
            args.push(o::literal(slot));
            args.extend(values);
            invoke_instruction(R3::pipe_bind(count), args)
        } else {
            invoke_instruction(
                R3::pipe_bind_v(),
                vec![o::literal(slot), o::literal_arr(values)],
            )
        };
        Ok(LoweredExpression::dynamic(call))
    }

    fn visit_prefix_not(&mut self, ast: &e::PrefixNot) -> Self::Result {
        let inner = ast.expression.visit(self)?;
        Ok(LoweredExpression {
            expr: o::not(inner.expr),
            constant: inner.constant,
        })
    }

    fn visit_unary(&mut self, ast: &e::Unary) -> Self::Result {
        let operator = match ast.operator.as_str() {
            "-" => o::UnaryOperator::Minus,
            "+" => o::UnaryOperator::Plus,
            other => {
                return Err(self.syntax_error(
                    format!("Unsupported unary operator {}", other),
                    ast.source_span,
                ))
            }
        };
        let inner = ast.expr.visit(self)?;
        Ok(LoweredExpression {
            expr: o::Expression::Unary(o::UnaryOperatorExpr {
                operator,
                expr: Box::new(inner.expr),
            }),
            constant: inner.constant,
        })
    }

    fn visit_non_null_assert(&mut self, ast: &e::NonNullAssert) -> Self::Result {
        ast.expression.visit(self)
    }

    fn visit_property_write(&mut self, ast: &e::PropertyWrite) -> Self::Result {
        if self.form == BindingForm::Binding {
            return Err(self.syntax_error("Bindings cannot contain assignments", ast.source_span));
        }
        if ast.receiver.is_implicit_receiver() && self.scope.resolve_local(&ast.name).is_some() {
            return Err(CompileError::resolution(
                format!("Cannot assign to the template name '{}'", ast.name),
                self.scope.source_span(ast.source_span),
            ));
        }
        let receiver = ast.receiver.visit(self)?;
        let value = ast.value.visit(self)?;
        Ok(LoweredExpression::dynamic(
            receiver.expr.prop(ast.name.as_str()).set(value.expr),
        ))
    }

    fn visit_keyed_write(&mut self, ast: &e::KeyedWrite) -> Self::Result {
        if self.form == BindingForm::Binding {
            return Err(self.syntax_error("Bindings cannot contain assignments", ast.source_span));
        }
        let receiver = ast.receiver.visit(self)?;
        let key = ast.key.visit(self)?;
        let value = ast.value.visit(self)?;
        Ok(LoweredExpression::dynamic(
            receiver.expr.key(key.expr).set(value.expr),
        ))
    }
}
