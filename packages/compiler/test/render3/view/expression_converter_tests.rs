//! Expression Converter Tests
//!
//! Lowering of bound expressions against a hand-rolled binding scope, so the output can
//! be checked without building a whole template.

use std::collections::HashSet;

use r3_compiler::constant_pool::ConstantPool;
use r3_compiler::error::{CompileError, DiagnosticKind, Result};
use r3_compiler::expression_parser::ast::{AbsoluteSourceSpan, AST};
use r3_compiler::output::abstract_js_emitter::JavaScriptEmitter;
use r3_compiler::output::output_ast as o;
use r3_compiler::render3::view::expression_converter::{
    convert_action_binding, convert_interpolation, convert_property_binding, BindingScope,
    ExpressionClass,
};
use r3_compiler::render3::view::util::TemporaryAllocator;

#[path = "util.rs"]
mod view_util;

#[cfg(test)]
mod tests {
    use super::view_util::*;
    use super::*;

    struct TestScope {
        pool: ConstantPool,
        locals: HashSet<String>,
        pipes: Vec<String>,
        temporary: TemporaryAllocator,
    }

    impl TestScope {
        fn new(locals: &[&str]) -> Self {
            TestScope {
                pool: ConstantPool::new(),
                locals: locals.iter().map(|l| l.to_string()).collect(),
                pipes: Vec::new(),
                temporary: TemporaryAllocator::new(),
            }
        }

        fn constants(&self) -> String {
            emitter().emit_statements(&self.pool.statements)
        }
    }

    impl BindingScope for TestScope {
        fn resolve_local(&mut self, name: &str) -> Option<o::Expression> {
            self.locals.contains(name).then(|| o::variable(name))
        }

        fn allocate_pipe(&mut self, pipe_name: &str, _span: AbsoluteSourceSpan) -> Result<usize> {
            if pipe_name == "nope" {
                return Err(CompileError::resolution(
                    format!("The pipe '{}' could not be found", pipe_name),
                    None,
                ));
            }
            self.pipes.push(pipe_name.to_string());
            // Slot 0 is the host element.
            Ok(self.pipes.len())
        }

        fn constant_pool(&mut self) -> &mut ConstantPool {
            &mut self.pool
        }

        fn allocate_temporary(&mut self) -> Result<o::Expression> {
            Ok(self.temporary.allocate())
        }
    }

    fn emitter() -> JavaScriptEmitter {
        JavaScriptEmitter::new("@angular/core", "i0")
    }

    fn binding(scope: &mut TestScope, ast: AST) -> (String, ExpressionClass) {
        let converted = convert_property_binding(scope, &ast).unwrap();
        (emitter().emit_expression(&converted.value), converted.class)
    }

    mod property_bindings {
        use super::*;

        #[test]
        fn should_read_from_the_component_context() {
            let mut scope = TestScope::new(&[]);
            let (code, class) = binding(&mut scope, prop(read("user"), "name"));
            assert_eq!(code, "i0.ɵb(ctx.user.name)");
            assert_eq!(class, ExpressionClass::Simple);
        }

        #[test]
        fn should_prefer_template_names() {
            let mut scope = TestScope::new(&["item"]);
            let (code, _) = binding(&mut scope, prop(read("item"), "name"));
            assert_eq!(code, "i0.ɵb(item.name)");
        }

        #[test]
        fn should_lower_safe_reads_to_null_checks() {
            let mut scope = TestScope::new(&[]);
            let (code, _) = binding(&mut scope, safe_prop(read("user"), "name"));
            assert_eq!(code, "i0.ɵb(((ctx.user == null) ? null : ctx.user.name))");
        }

        #[test]
        fn should_not_need_a_temporary_for_plain_receivers() {
            let mut scope = TestScope::new(&[]);
            binding(&mut scope, safe_prop(prop(read("a"), "b"), "c"));
            assert!(!scope.temporary.is_used());
        }

        #[test]
        fn should_evaluate_piped_safe_receivers_once() {
            let mut scope = TestScope::new(&[]);
            let (code, _) = binding(&mut scope, safe_prop(pipe(read("name"), "p", vec![]), "length"));
            assert_eq!(
                code,
                "i0.ɵb((((_t = i0.ɵpb1(1, ctx.name)) == null) ? null : _t.length))"
            );
            assert_eq!(code.matches("ɵpb1(").count(), 1);
            assert!(scope.temporary.is_used());
        }

        #[test]
        fn should_evaluate_composite_safe_receivers_once() {
            let mut scope = TestScope::new(&[]);
            let (code, _) = binding(&mut scope, safe_prop(array(vec![read("a")]), "length"));
            assert_eq!(
                code,
                "i0.ɵb((((_t = i0.ɵf1(_ff, ctx.a)) == null) ? null : _t.length))"
            );
        }

        #[test]
        fn should_reuse_the_temporary_for_chained_safe_reads() {
            let mut scope = TestScope::new(&[]);
            let (code, _) = binding(
                &mut scope,
                safe_prop(safe_prop(pipe(read("a"), "p", vec![]), "b"), "c"),
            );
            assert_eq!(
                code,
                "i0.ɵb((((_t = (((_t = i0.ɵpb1(1, ctx.a)) == null) ? null : _t.b)) == null) ? null : _t.c))"
            );
            assert_eq!(code.matches("ɵpb1(").count(), 1);
        }

        #[test]
        fn should_hoist_fully_literal_composites() {
            let mut scope = TestScope::new(&[]);
            let (code, class) = binding(&mut scope, array(vec![number(1.0), string("a")]));
            assert_eq!(code, "i0.ɵb(_c0)");
            assert_eq!(class, ExpressionClass::Constant);

            let (code, _) = binding(&mut scope, array(vec![number(1.0), string("a")]));
            assert_eq!(code, "i0.ɵb(_c0)");
            assert_eq!(scope.constants(), "const _c0 = [1, 'a'];");
        }

        #[test]
        fn should_wrap_dynamic_composites_in_pure_functions() {
            let mut scope = TestScope::new(&[]);
            let (code, class) = binding(&mut scope, array(vec![read("a"), number(1.0)]));
            assert_eq!(code, "i0.ɵb(i0.ɵf1(_ff, ctx.a))");
            assert_eq!(class, ExpressionClass::Composite { arity: 1 });
            assert_eq!(scope.constants(), "const _ff = (v0) => [v0, 1];");
        }

        #[test]
        fn should_share_pure_functions_of_the_same_shape() {
            let mut scope = TestScope::new(&[]);
            binding(&mut scope, array(vec![read("a"), number(1.0)]));
            let (same, _) = binding(&mut scope, array(vec![read("b"), number(1.0)]));
            let (other, _) = binding(&mut scope, map(vec![("k", read("c"))]));
            assert_eq!(same, "i0.ɵb(i0.ɵf1(_ff, ctx.b))");
            assert_eq!(other, "i0.ɵb(i0.ɵf1(_ff_1, ctx.c))");
            assert_eq!(
                scope.constants(),
                "const _ff = (v0) => [v0, 1];\nconst _ff_1 = (v0) => ({k: v0});"
            );
        }

        #[test]
        fn should_declare_inner_pure_functions_first() {
            let mut scope = TestScope::new(&[]);
            let (code, class) = binding(&mut scope, map(vec![("a", array(vec![read("x")]))]));
            assert_eq!(code, "i0.ɵb(i0.ɵf1(_ff_1, i0.ɵf1(_ff, ctx.x)))");
            assert_eq!(class, ExpressionClass::Composite { arity: 1 });
            assert_eq!(
                scope.constants(),
                "const _ff = (v0) => [v0];\nconst _ff_1 = (v0) => ({a: v0});"
            );
        }

        #[test]
        fn should_keep_the_fixed_arity_pure_function_at_eight_arguments() {
            let mut scope = TestScope::new(&[]);
            let names: Vec<String> = (0..8).map(|i| format!("a{}", i)).collect();
            let (code, class) = binding(&mut scope, array(names.iter().map(|n| read(n)).collect()));
            assert_eq!(
                code,
                "i0.ɵb(i0.ɵf8(_ff, ctx.a0, ctx.a1, ctx.a2, ctx.a3, ctx.a4, ctx.a5, ctx.a6, ctx.a7))"
            );
            assert_eq!(class, ExpressionClass::Composite { arity: 8 });
        }

        #[test]
        fn should_switch_to_the_variadic_pure_function_above_eight_arguments() {
            let mut scope = TestScope::new(&[]);
            let names: Vec<String> = (0..9).map(|i| format!("a{}", i)).collect();
            let (code, class) = binding(&mut scope, array(names.iter().map(|n| read(n)).collect()));
            assert_eq!(
                code,
                "i0.ɵb(i0.ɵfV(_ff, ctx.a0, ctx.a1, ctx.a2, ctx.a3, ctx.a4, ctx.a5, ctx.a6, ctx.a7, ctx.a8))"
            );
            assert_eq!(class, ExpressionClass::Composite { arity: 9 });
        }

        #[test]
        fn should_allocate_the_outer_pipe_first() {
            let mut scope = TestScope::new(&[]);
            let (code, _) = binding(
                &mut scope,
                pipe(pipe(read("a"), "inner", vec![]), "outer", vec![number(2.0)]),
            );
            assert_eq!(code, "i0.ɵb(i0.ɵpb2(1, i0.ɵpb1(2, ctx.a), 2))");
            assert_eq!(scope.pipes, vec!["outer".to_string(), "inner".to_string()]);
        }

        #[test]
        fn should_propagate_unknown_pipes() {
            let mut scope = TestScope::new(&[]);
            let err = convert_property_binding(&mut scope, &pipe(read("a"), "nope", vec![]))
                .unwrap_err();
            assert_eq!(err.kind(), DiagnosticKind::Resolution);
        }

        #[test]
        fn should_reject_assignments_and_chains() {
            let mut scope = TestScope::new(&[]);
            let err = convert_property_binding(&mut scope, &write("a", number(1.0))).unwrap_err();
            assert_eq!(err.kind(), DiagnosticKind::Syntax);
            assert_eq!(err.to_string(), "Bindings cannot contain assignments");

            let err = convert_property_binding(&mut scope, &chain(vec![read("a"), read("b")]))
                .unwrap_err();
            assert_eq!(
                err.to_string(),
                "Expression chains are only allowed in event bindings"
            );
        }
    }

    mod interpolations {
        use super::*;

        fn interpolate(ast: AST) -> String {
            let mut scope = TestScope::new(&[]);
            let value = convert_interpolation(&mut scope, &ast).unwrap();
            emitter().emit_expression(&value)
        }

        #[test]
        fn should_use_the_fixed_arity_instructions() {
            assert_eq!(
                interpolate(interpolation(&["Hello ", " and ", "!"], vec![read("a"), read("b")])),
                "i0.ɵi2('Hello ', ctx.a, ' and ', ctx.b, '!')"
            );
        }

        #[test]
        fn should_use_the_variadic_instruction_above_eight_values() {
            let strings = vec![""; 10];
            let names: Vec<String> = (0..9).map(|i| format!("v{}", i)).collect();
            let code = interpolate(interpolation(&strings, names.iter().map(|n| read(n)).collect()));
            assert!(code.starts_with("i0.ɵiV(['', ctx.v0, '', ctx.v1, "));
            assert!(code.ends_with("ctx.v8, ''])"));
        }

        #[test]
        fn should_fold_interpolations_without_values() {
            assert_eq!(interpolate(interpolation(&["plain"], vec![])), "'plain'");
        }
    }

    mod actions {
        use super::*;

        fn action(scope: &mut TestScope, ast: AST) -> String {
            let statements = convert_action_binding(scope, &ast).unwrap();
            emitter().emit_statements(&statements)
        }

        #[test]
        fn should_return_the_last_expression() {
            let mut scope = TestScope::new(&[]);
            let code = action(
                &mut scope,
                chain(vec![
                    call(read("save"), vec![read("$event")]),
                    write("saved", number(1.0)),
                ]),
            );
            assert_eq!(code, "ctx.save($event);\nreturn (ctx.saved = 1);");
        }

        #[test]
        fn should_not_hoist_literals_in_handlers() {
            let mut scope = TestScope::new(&[]);
            let code = action(&mut scope, call(read("emit"), vec![array(vec![read("a")])]));
            assert_eq!(code, "return ctx.emit([ctx.a]);");
            assert!(scope.pool.statements.is_empty());
        }

        #[test]
        fn should_reject_pipes() {
            let mut scope = TestScope::new(&[]);
            let err = convert_action_binding(&mut scope, &pipe(read("a"), "p", vec![])).unwrap_err();
            assert_eq!(err.kind(), DiagnosticKind::Syntax);
            assert!(scope.pipes.is_empty());
        }

        #[test]
        fn should_reject_writes_to_template_names() {
            let mut scope = TestScope::new(&["item"]);
            let err = convert_action_binding(&mut scope, &write("item", number(1.0))).unwrap_err();
            assert_eq!(err.kind(), DiagnosticKind::Resolution);
            assert_eq!(err.to_string(), "Cannot assign to the template name 'item'");
        }
    }
}
