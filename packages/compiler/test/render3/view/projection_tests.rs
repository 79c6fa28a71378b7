//! Content Projection Tests

use r3_compiler::render3::view::api::Declaration;

#[path = "util.rs"]
mod view_util;

#[cfg(test)]
mod tests {
    use super::view_util::*;
    use super::*;

    #[test]
    fn should_support_simple_content_projection() {
        let source = compile_clean(vec![Declaration::Component(component(
            "SimpleComponent",
            "simple",
            vec![element("div").child(content("")).node()],
        ))]);
        expect_emit(
            &source,
            r"
            SimpleComponent.ngComponentDef = i0.ɵdefineComponent({
              type: SimpleComponent,
              tag: 'simple',
              factory: function SimpleComponent_Factory() { return new SimpleComponent(); },
              template: function SimpleComponent_Template(ctx, cm) {
                if (cm) {
                  i0.ɵpD(0);
                  i0.ɵE(1, 'div');
                  i0.ɵP(2, 0);
                  i0.ɵe();
                }
              }
            });
            ",
            "Incorrect SimpleComponent definition",
        );
    }

    #[test]
    fn should_support_content_projection_with_selectors() {
        let source = compile_clean(vec![Declaration::Component(component(
            "ComplexComponent",
            "complex",
            vec![
                element("div")
                    .attr("id", "first")
                    .child(content("span[title=toFirst]"))
                    .node(),
                element("div")
                    .attr("id", "second")
                    .child(content("span[title=toSecond]"))
                    .node(),
            ],
        ))]);
        expect_emit(
            &source,
            r"
            const $c1$ = [[[['span', 'title', 'tofirst'], null]], [[['span', 'title', 'tosecond'], null]]];
            const $c2$ = ['id', 'first'];
            const $c3$ = ['id', 'second'];
            …
            template: function ComplexComponent_Template(ctx, cm) {
              if (cm) {
                i0.ɵpD(0, $c1$);
                i0.ɵE(1, 'div', $c2$);
                i0.ɵP(2, 0, 1);
                i0.ɵe();
                i0.ɵE(3, 'div', $c3$);
                i0.ɵP(4, 0, 2);
                i0.ɵe();
              }
            }
            ",
            "Incorrect ComplexComponent definition",
        );
    }

    #[test]
    fn should_mix_default_and_selected_slots() {
        let source = compile_clean(vec![Declaration::Component(component(
            "MixedComponent",
            "mixed",
            vec![
                content("header"),
                content("*"),
                content("header"),
                content("div:not(.hidden)"),
            ],
        ))]);
        expect_emit(
            &source,
            r"
            const $c1$ = [[[['header'], null]], [[['div'], ['', 'class', 'hidden']]]];
            …
            if (cm) {
              i0.ɵpD(0, $c1$);
              i0.ɵP(1, 0, 1);
              i0.ɵP(2, 0);
              i0.ɵP(3, 0, 1);
              i0.ɵP(4, 0, 2);
            }
            ",
            "A selector used twice keeps its slot and the wildcard uses the default",
        );
    }

    #[test]
    fn should_not_declare_projection_without_insertion_points() {
        let source = compile_clean(vec![Declaration::Component(component(
            "Plain",
            "plain",
            vec![element("div").node()],
        ))]);
        expect_no_emit(&source, "ɵpD", "No projection definition");
    }

    #[test]
    fn should_point_nested_insertion_points_at_the_component_projection_def() {
        let source = compile_clean(vec![Declaration::Component(component(
            "MyComponent",
            "my-component",
            vec![template()
                .structural_text("if", "")
                .child(content("span"))
                .node()],
        ))]);
        expect_emit(
            &source,
            r"
            if (cm) {
              i0.ɵpD(0, $c1$);
            …
            function MyComponent_Template_1(ctx0, cm) {
              if (cm) {
                i0.ɵP(0, 0, 1);
              }
            }
            ",
            "Nested insertion point",
        );
    }
}
