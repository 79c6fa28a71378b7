//! Element Tests
//!
//! Creation and update instructions emitted for plain elements, text and bindings.

use r3_compiler::render3::r3_ast::BindingType;
use r3_compiler::render3::view::api::Declaration;

#[path = "util.rs"]
mod view_util;

#[cfg(test)]
mod tests {
    use super::view_util::*;
    use super::*;

    fn compile_component(nodes: Vec<r3_compiler::render3::r3_ast::R3Node>) -> String {
        compile_clean(vec![Declaration::Component(component(
            "MyComponent",
            "my-component",
            nodes,
        ))])
    }

    #[test]
    fn should_translate_dom_structure() {
        let source = compile_component(vec![element("div")
            .attr("class", "my-app")
            .attr("title", "Hello")
            .child(text("Hello "))
            .child(element("b").child(text("World")).node())
            .child(text("!"))
            .node()]);

        expect_emit(
            &source,
            "factory: function MyComponent_Factory() { return new MyComponent(); }",
            "Incorrect factory",
        );
        expect_emit(
            &source,
            r"
            const $c1$ = ['class', 'my-app', 'title', 'Hello'];
            …
            template: function MyComponent_Template(ctx, cm) {
              if (cm) {
                i0.ɵE(0, 'div', $c1$);
                i0.ɵT(1, 'Hello ');
                i0.ɵE(2, 'b');
                i0.ɵT(3, 'World');
                i0.ɵe();
                i0.ɵT(4, '!');
                i0.ɵe();
              }
            }
            ",
            "Incorrect template",
        );
    }

    #[test]
    fn should_emit_an_empty_function_for_an_empty_template() {
        let source = compile_component(vec![]);
        assert!(source.contains("template: function MyComponent_Template(ctx, cm) {}"));
        expect_no_emit(&source, "if (cm)", "Empty templates have no creation block");
    }

    #[test]
    fn should_escape_static_text() {
        let source = compile_component(vec![text("it's\nhere")]);
        assert!(source.contains(r"i0.ɵT(0, 'it\'s\nhere');"));
    }

    #[test]
    fn should_emit_each_binding_kind() {
        let source = compile_component(vec![element("div")
            .property("id", read("id"))
            .binding("aria-label", BindingType::Attribute, source(read("label")), None)
            .binding("active", BindingType::Class, source(read("isActive")), None)
            .binding("width", BindingType::Style, source(read("width")), Some("px"))
            .binding("color", BindingType::Style, source(read("color")), None)
            .node()]);

        expect_emit(
            &source,
            r"
            if (cm) {
              i0.ɵE(0, 'div');
              i0.ɵe();
            }
            i0.ɵp(0, 'id', i0.ɵb(ctx.id));
            i0.ɵa(0, 'aria-label', i0.ɵb(ctx.label));
            i0.ɵk(0, 'active', i0.ɵb(ctx.isActive));
            i0.ɵs(0, 'width', i0.ɵb(ctx.width), 'px');
            i0.ɵs(0, 'color', i0.ɵb(ctx.color));
            ",
            "Incorrect bindings",
        );
    }

    #[test]
    fn should_pass_interpolated_properties_without_bind() {
        let source = compile_component(vec![element("a")
            .property("title", interpolation(&["Hello ", "!"], vec![read("name")]))
            .node()]);
        expect_emit(
            &source,
            "i0.ɵp(0, 'title', i0.ɵi1('Hello ', ctx.name, '!'));",
            "Interpolations are not wrapped in ɵb",
        );
    }

    #[test]
    fn should_update_bound_text_in_the_refresh_block() {
        let source = compile_component(vec![
            element("span").child(bound_text(interpolation(&["Hi ", ""], vec![read("name")]))).node(),
            bound_text(interpolation(
                &["", " and ", ""],
                vec![read("a"), prop(read("b"), "c")],
            )),
        ]);
        expect_emit(
            &source,
            r"
            if (cm) {
              i0.ɵE(0, 'span');
              i0.ɵT(1);
              i0.ɵe();
              i0.ɵT(2);
            }
            i0.ɵt(1, i0.ɵi1('Hi ', ctx.name, ''));
            i0.ɵt(2, i0.ɵi2('', ctx.a, ' and ', ctx.b.c, ''));
            ",
            "Incorrect text refresh",
        );
    }

    #[test]
    fn should_use_the_variadic_interpolation_past_eight_values() {
        let names = ["a", "b", "c", "d", "e", "f", "g", "h", "i"];
        let strings = vec![""; names.len() + 1];
        let source = compile_component(vec![bound_text(interpolation(
            &strings,
            names.iter().map(|name| read(name)).collect(),
        ))]);
        expect_emit(
            &source,
            "i0.ɵt(0, i0.ɵiV(['', ctx.a, '', ctx.b, '', ctx.c, '', ctx.d, '', ctx.e, '', ctx.f, '', ctx.g, '', ctx.h, '', ctx.i, '']));",
            "Incorrect variadic interpolation",
        );
    }

    #[test]
    fn should_lower_safe_reads_to_null_checks() {
        let source = compile_component(vec![bound_text(interpolation(
            &["", ""],
            vec![safe_prop(read("user"), "name")],
        ))]);
        expect_emit(
            &source,
            "i0.ɵi1('', ((ctx.user == null) ? null : ctx.user.name), '')",
            "Incorrect safe read",
        );
    }

    #[test]
    fn should_emit_listeners_after_the_element_start() {
        let source = compile_component(vec![element("button")
            .on("click", call(read("onClick"), vec![read("$event")]))
            .child(text("Go"))
            .node()]);
        expect_emit(
            &source,
            r"
            if (cm) {
              i0.ɵE(0, 'button');
              i0.ɵL('click', function($event) {
                return ctx.onClick($event);
              });
              i0.ɵT(1, 'Go');
              i0.ɵe();
            }
            ",
            "Incorrect listener",
        );
    }

    #[test]
    fn should_return_the_last_expression_of_a_handler_chain() {
        let source = compile_component(vec![element("input")
            .on(
                "change",
                chain(vec![
                    write("value", prop(read("$event"), "target")),
                    call(read("save"), vec![]),
                ]),
            )
            .node()]);
        expect_emit(
            &source,
            r"
            i0.ɵL('change', function($event) {
              ctx.value = $event.target;
              return ctx.save();
            });
            ",
            "Incorrect handler chain",
        );
    }

    #[test]
    fn should_keep_binary_and_keyed_expressions() {
        let source = compile_component(vec![element("div")
            .property(
                "hidden",
                binary("&&", read("ready"), keyed(read("items"), number(0.0))),
            )
            .node()]);
        expect_emit(
            &source,
            "i0.ɵp(0, 'hidden', i0.ɵb((ctx.ready && ctx.items[0])));",
            "Incorrect binary expression",
        );
    }

    #[test]
    fn should_share_identical_attribute_arrays() {
        let source = compile_component(vec![
            element("p").attr("class", "note").node(),
            element("p").attr("class", "note").node(),
        ]);
        expect_emit(
            &source,
            r"
            const $c$ = ['class', 'note'];
            …
            i0.ɵE(0, 'p', $c$);
            i0.ɵe();
            i0.ɵE(1, 'p', $c$);
            ",
            "Identical attribute arrays are declared once",
        );
        expect_no_emit(&source, "_c1", "Only one constant is declared");
    }
}
