//! Literal Tests
//!
//! Array and object literals in bindings: constant hoisting and pure functions.

use r3_compiler::render3::view::api::Declaration;

#[path = "util.rs"]
mod view_util;

#[cfg(test)]
mod tests {
    use super::view_util::*;
    use super::*;

    fn my_comp() -> Declaration {
        let mut meta = component(
            "MyComp",
            "my-comp",
            vec![element("p")
                .child(bound_text(interpolation(
                    &["", ""],
                    vec![keyed(read("names"), number(0.0))],
                )))
                .node()],
        );
        meta.directive
            .inputs
            .insert("names".to_string(), "names".to_string());
        Declaration::Component(meta)
    }

    fn my_app(binding: r3_compiler::expression_parser::ast::AST) -> Declaration {
        Declaration::Component(component(
            "MyApp",
            "my-app",
            vec![element("my-comp").property("names", binding).node()],
        ))
    }

    #[test]
    fn should_support_array_literals() {
        let source = compile_clean(vec![
            my_comp(),
            my_app(array(vec![string("Nancy"), read("customName")])),
        ]);
        expect_emit(
            &source,
            r"
            const $e0_ff$ = (v0) => ['Nancy', v0];
            …
            MyApp.ngComponentDef = i0.ɵdefineComponent({
              type: MyApp,
              tag: 'my-app',
              factory: function MyApp_Factory() { return new MyApp(); },
              template: function MyApp_Template(ctx, cm) {
                if (cm) {
                  i0.ɵE(0, MyComp);
                  i0.ɵe();
                }
                i0.ɵp(0, 'names', i0.ɵb(i0.ɵf1($e0_ff$, ctx.customName)));
                MyComp.ngComponentDef.h(1, 0);
                i0.ɵr(1, 0);
              }
            });
            ",
            "Invalid array emit",
        );
    }

    #[test]
    fn should_support_nine_or_more_bindings_in_array_literals() {
        let mut entries = vec![string("start-")];
        entries.extend((0..5).map(|i| read(&format!("n{}", i))));
        entries.push(string("-middle-"));
        entries.extend((5..9).map(|i| read(&format!("n{}", i))));
        entries.push(string("-end"));

        let source = compile_clean(vec![my_comp(), my_app(array(entries))]);
        expect_emit(
            &source,
            r"
            const $e0_ff$ = (v0, v1, v2, v3, v4, v5, v6, v7, v8) => ['start-', v0, v1, v2, v3, v4, '-middle-', v5, v6, v7, v8, '-end'];
            …
            i0.ɵp(0, 'names', i0.ɵb(i0.ɵfV($e0_ff$, ctx.n0, ctx.n1, ctx.n2, ctx.n3, ctx.n4, ctx.n5, ctx.n6, ctx.n7, ctx.n8)));
            ",
            "Invalid array binding",
        );
    }

    #[test]
    fn should_support_object_literals() {
        let source = compile_clean(vec![
            my_comp(),
            my_app(map(vec![("duration", number(500.0)), ("animation", read("name"))])),
        ]);
        expect_emit(
            &source,
            r"
            const $e0_ff$ = (v0) => ({duration: 500, animation: v0});
            …
            i0.ɵp(0, 'names', i0.ɵb(i0.ɵf1($e0_ff$, ctx.name)));
            ",
            "Invalid object literal binding",
        );
    }

    #[test]
    fn should_support_expressions_nested_deeply_in_object_and_array_literals() {
        let binding = map(vec![
            ("animation", read("name")),
            (
                "actions",
                array(vec![
                    map(vec![("opacity", number(0.0)), ("duration", number(0.0))]),
                    map(vec![("opacity", number(1.0)), ("duration", read("duration"))]),
                ]),
            ),
        ]);
        let source = compile_clean(vec![my_comp(), my_app(binding)]);
        expect_emit(
            &source,
            r"
            const $c0$ = {opacity: 0, duration: 0};
            const $e0_ff$ = (v0) => ({opacity: 1, duration: v0});
            const $e0_ff_1$ = (v0) => [$c0$, v0];
            const $e0_ff_2$ = (v0, v1) => ({animation: v0, actions: v1});
            …
            i0.ɵp(0, 'names', i0.ɵb(i0.ɵf2($e0_ff_2$, ctx.name, i0.ɵf1($e0_ff_1$, i0.ɵf1($e0_ff$, ctx.duration)))));
            ",
            "Invalid array/object literal binding",
        );
    }

    #[test]
    fn should_hoist_fully_constant_literals() {
        let source = compile_clean(vec![
            my_comp(),
            my_app(array(vec![string("a"), string("b")])),
        ]);
        expect_emit(
            &source,
            r"
            const $c$ = ['a', 'b'];
            …
            i0.ɵp(0, 'names', i0.ɵb($c$));
            ",
            "Constant literals are hoisted",
        );
        expect_no_emit(&source, "_ff", "No pure function for a constant literal");
    }

    #[test]
    fn should_share_pure_functions_with_the_same_shape() {
        let source = compile_clean(vec![
            my_comp(),
            Declaration::Component(component(
                "MyApp",
                "my-app",
                vec![
                    element("my-comp")
                        .property("names", array(vec![string("x"), read("first")]))
                        .node(),
                    element("my-comp")
                        .property("names", array(vec![string("x"), read("second")]))
                        .node(),
                ],
            )),
        ]);
        expect_emit(
            &source,
            r"
            i0.ɵp(0, 'names', i0.ɵb(i0.ɵf1(_ff, ctx.first)));
            i0.ɵp(2, 'names', i0.ɵb(i0.ɵf1(_ff, ctx.second)));
            ",
            "Identical shapes share one pure function",
        );
        expect_no_emit(&source, "_ff_1", "Only one pure function is declared");
    }

    #[test]
    fn should_keep_literals_inline_in_event_handlers() {
        let source = compile_clean(vec![Declaration::Component(component(
            "MyApp",
            "my-app",
            vec![element("button")
                .on("click", call(read("select"), vec![array(vec![read("item"), number(1.0)])]))
                .node()],
        ))]);
        expect_emit(
            &source,
            "return ctx.select([ctx.item, 1]);",
            "Handler literals are not memoized",
        );
        expect_no_emit(&source, "_ff", "No pure function in handlers");
    }
}
