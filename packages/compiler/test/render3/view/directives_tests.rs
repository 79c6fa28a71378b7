//! Directive Tests
//!
//! Matching directives and components on template nodes, their slots, host
//! instantiation and refresh.

use r3_compiler::render3::r3_factory::R3DependencyMetadata;
use r3_compiler::render3::view::api::Declaration;

#[path = "util.rs"]
mod view_util;

#[cfg(test)]
mod tests {
    use super::view_util::*;
    use super::*;

    fn child_component() -> Declaration {
        Declaration::Component(component("ChildComponent", "child", vec![text("child-view")]))
    }

    #[test]
    fn should_instantiate_directives() {
        let source = compile_clean(vec![
            child_component(),
            Declaration::Directive(directive("SomeDirective", "[some-directive]")),
            Declaration::Component(component(
                "MyComponent",
                "my-component",
                vec![
                    element("child").attr("some-directive", "").node(),
                    text("!"),
                ],
            )),
        ]);

        expect_emit(
            &source,
            r"
            ChildComponent.ngComponentDef = i0.ɵdefineComponent({
              type: ChildComponent,
              tag: 'child',
              factory: function ChildComponent_Factory() { return new ChildComponent(); },
              template: function ChildComponent_Template(ctx, cm) {
                if (cm) {
                  i0.ɵT(0, 'child-view');
                }
              }
            });
            ",
            "Incorrect ChildComponent.ngComponentDef",
        );
        expect_emit(
            &source,
            r"
            SomeDirective.ngDirectiveDef = i0.ɵdefineDirective({
              type: SomeDirective,
              factory: function SomeDirective_Factory() { return new SomeDirective(); }
            });
            ",
            "Incorrect SomeDirective.ngDirectiveDef",
        );
        expect_emit(
            &source,
            r"
            const $c1$ = ['some-directive', ''];
            const $c2$ = [SomeDirective];
            …
            MyComponent.ngComponentDef = i0.ɵdefineComponent({
              type: MyComponent,
              tag: 'my-component',
              factory: function MyComponent_Factory() { return new MyComponent(); },
              template: function MyComponent_Template(ctx, cm) {
                if (cm) {
                  i0.ɵE(0, ChildComponent, $c1$, $c2$);
                  i0.ɵe();
                  i0.ɵT(3, '!');
                }
                ChildComponent.ngComponentDef.h(1, 0);
                SomeDirective.ngDirectiveDef.h(2, 0);
                i0.ɵr(1, 0);
                i0.ɵr(2, 0);
              }
            });
            ",
            "Incorrect MyComponent.ngComponentDef",
        );
    }

    #[test]
    fn should_support_structural_directives() {
        let mut if_directive = directive("IfDirective", "[if]");
        if_directive.deps = vec![R3DependencyMetadata::TemplateRef];

        let source = compile_clean(vec![
            Declaration::Directive(if_directive),
            Declaration::Component(component(
                "MyComponent",
                "my-component",
                vec![element("ul")
                    .reference("foo", "")
                    .child(
                        template()
                            .tag("li")
                            .structural_text("if", "")
                            .child(
                                element("li")
                                    .child(bound_text(interpolation(
                                        &["", " ", ""],
                                        vec![read("salutation"), read("foo")],
                                    )))
                                    .node(),
                            )
                            .node(),
                    )
                    .node()],
            )),
        ]);

        expect_emit(
            &source,
            r"
            IfDirective.ngDirectiveDef = i0.ɵdefineDirective({
              type: IfDirective,
              factory: function IfDirective_Factory() { return new IfDirective(i0.ɵinjectTemplateRef()); }
            });
            ",
            "Incorrect IfDirective.ngDirectiveDef",
        );
        expect_emit(
            &source,
            r"
            const $c1$ = ['foo', ''];
            const $c2$ = [IfDirective];
            …
            template: function MyComponent_Template(ctx, cm) {
              if (cm) {
                i0.ɵE(0, 'ul', null, null, $c1$);
                i0.ɵC(1, $c2$, MyComponent_IfDirective_Template_1);
                i0.ɵe();
              }
              const foo = i0.ɵld(0);
              IfDirective.ngDirectiveDef.h(2, 1);
              i0.ɵcR(1);
              i0.ɵr(2, 1);
              i0.ɵcr();
              function MyComponent_IfDirective_Template_1(ctx0, cm) {
                if (cm) {
                  i0.ɵE(0, 'li');
                  i0.ɵT(1);
                  i0.ɵe();
                }
                i0.ɵt(1, i0.ɵi2('', ctx.salutation, ' ', foo, ''));
              }
            }
            ",
            "Incorrect MyComponent.ngComponentDef",
        );
    }

    #[test]
    fn should_name_plain_embedded_views_by_slot() {
        let source = compile_clean(vec![Declaration::Component(component(
            "MyComponent",
            "my-component",
            vec![
                text("a"),
                template().child(text("inside")).node(),
            ],
        ))]);
        expect_emit(
            &source,
            r"
            if (cm) {
              i0.ɵT(0, 'a');
              i0.ɵC(1, null, MyComponent_Template_1);
            }
            i0.ɵcR(1);
            i0.ɵcr();
            function MyComponent_Template_1(ctx0, cm) {
              if (cm) {
                i0.ɵT(0, 'inside');
              }
            }
            ",
            "Incorrect embedded view without directives",
        );
    }

    #[test]
    fn should_pass_static_template_attributes_to_the_container() {
        let source = compile_clean(vec![Declaration::Component(component(
            "MyComponent",
            "my-component",
            vec![template().tag("ng-template").attr("role", "list").node()],
        ))]);
        expect_emit(
            &source,
            r"
            const $c1$ = ['role', 'list'];
            …
            i0.ɵC(0, null, MyComponent_Template_0, 'ng-template', $c1$);
            ",
            "Incorrect container with attributes",
        );
    }

    #[test]
    fn should_alias_references_to_exported_directives() {
        let mut tooltip = directive("TooltipDirective", "[tooltip]");
        tooltip.export_as = Some(vec!["tooltip".to_string()]);

        let source = compile_clean(vec![
            Declaration::Directive(tooltip),
            Declaration::Component(component(
                "MyComponent",
                "my-component",
                vec![
                    element("span")
                        .attr("tooltip", "")
                        .reference("tip", "tooltip")
                        .node(),
                    bound_text(interpolation(&["", ""], vec![prop(read("tip"), "visible")])),
                ],
            )),
        ]);
        expect_emit(
            &source,
            r"
            const $c1$ = ['tooltip', ''];
            const $c2$ = [TooltipDirective];
            const $c3$ = ['tip', 'tooltip'];
            …
            if (cm) {
              i0.ɵE(0, 'span', $c1$, $c2$, $c3$);
              i0.ɵe();
              i0.ɵT(2);
            }
            const tip = i0.ɵld(1);
            TooltipDirective.ngDirectiveDef.h(1, 0);
            i0.ɵr(1, 0);
            i0.ɵt(2, i0.ɵi1('', tip.visible, ''));
            ",
            "Incorrect exported reference",
        );
    }

    #[test]
    fn should_alias_plain_references_to_the_component() {
        let source = compile_clean(vec![
            child_component(),
            Declaration::Component(component(
                "MyComponent",
                "my-component",
                vec![
                    element("child").reference("c", "").node(),
                    bound_text(interpolation(&["", ""], vec![prop(read("c"), "title")])),
                ],
            )),
        ]);
        expect_emit(
            &source,
            r"
            const c = i0.ɵld(1);
            ChildComponent.ngComponentDef.h(1, 0);
            i0.ɵr(1, 0);
            i0.ɵt(2, i0.ɵi1('', c.title, ''));
            ",
            "A plain reference on a component host points at the component",
        );
    }

    #[test]
    fn should_match_directives_on_bound_properties_and_events() {
        let source = compile_clean(vec![
            Declaration::Directive(directive("ModelDirective", "[model]")),
            Declaration::Directive(directive("ClickDirective", "[tap]")),
            Declaration::Component(component(
                "MyComponent",
                "my-component",
                vec![element("input")
                    .property("model", read("value"))
                    .on("tap", call(read("go"), vec![]))
                    .node()],
            )),
        ]);
        expect_emit(
            &source,
            r"
            const $c1$ = [ModelDirective, ClickDirective];
            …
            i0.ɵE(0, 'input', null, $c1$);
            …
            i0.ɵp(0, 'model', i0.ɵb(ctx.value));
            ModelDirective.ngDirectiveDef.h(1, 0);
            ClickDirective.ngDirectiveDef.h(2, 0);
            i0.ɵr(1, 0);
            i0.ɵr(2, 0);
            ",
            "Bound names take part in matching",
        );
    }

    #[test]
    fn should_only_see_the_listed_directives() {
        let mut meta = component(
            "MyComponent",
            "my-component",
            vec![element("div").attr("a", "").attr("b", "").node()],
        );
        meta.directives = Some(vec!["BDirective".to_string()]);

        let source = compile_clean(vec![
            Declaration::Directive(directive("ADirective", "[a]")),
            Declaration::Directive(directive("BDirective", "[b]")),
            Declaration::Component(meta),
        ]);
        expect_emit(&source, "const $c$ = [BDirective];", "Only BDirective is visible");
        expect_no_emit(&source, "ADirective.ngDirectiveDef.h", "ADirective is not visible");
    }

    #[test]
    fn should_hoist_definitions_read_twice() {
        let mut lifecycle = component("LifecycleComp", "lifecycle-comp", vec![]);
        lifecycle
            .directive
            .inputs
            .insert("nameMin".to_string(), "name".to_string());
        lifecycle.directive.lifecycle.uses_on_changes = true;

        let source = compile_clean(vec![
            Declaration::Component(lifecycle),
            Declaration::Component(component(
                "SimpleLayout",
                "simple-layout",
                vec![
                    element("lifecycle-comp").property("name", read("name1")).node(),
                    element("lifecycle-comp").property("name", read("name2")).node(),
                ],
            )),
        ]);

        expect_emit(
            &source,
            r"
            LifecycleComp.ngComponentDef = i0.ɵdefineComponent({
              type: LifecycleComp,
              tag: 'lifecycle-comp',
              factory: function LifecycleComp_Factory() { return new LifecycleComp(); },
              template: function LifecycleComp_Template(ctx, cm) {},
              inputs: {nameMin: 'name'},
              features: [i0.ɵNgOnChangesFeature(LifecycleComp)]
            });
            ",
            "Invalid LifecycleComp definition",
        );
        expect_emit(
            &source,
            r"
            const $c1$ = LifecycleComp.ngComponentDef;
            …
            SimpleLayout.ngComponentDef = i0.ɵdefineComponent({
              type: SimpleLayout,
              tag: 'simple-layout',
              factory: function SimpleLayout_Factory() { return new SimpleLayout(); },
              template: function SimpleLayout_Template(ctx, cm) {
                if (cm) {
                  i0.ɵE(0, LifecycleComp);
                  i0.ɵe();
                  i0.ɵE(2, LifecycleComp);
                  i0.ɵe();
                }
                i0.ɵp(0, 'name', i0.ɵb(ctx.name1));
                i0.ɵp(2, 'name', i0.ɵb(ctx.name2));
                $c1$.h(1, 0);
                $c1$.h(3, 2);
                i0.ɵr(1, 0);
                i0.ɵr(3, 2);
              }
            });
            ",
            "Invalid SimpleLayout definition",
        );
    }

    #[test]
    fn should_instantiate_directives_of_nested_hosts_after_their_children() {
        let source = compile_clean(vec![
            Declaration::Directive(directive("Outer", "[outer]")),
            Declaration::Directive(directive("Inner", "[inner]")),
            Declaration::Component(component(
                "MyComponent",
                "my-component",
                vec![element("div")
                    .attr("outer", "")
                    .child(element("span").attr("inner", "").node())
                    .node()],
            )),
        ]);
        expect_emit(
            &source,
            r"
            Inner.ngDirectiveDef.h(3, 2);
            Outer.ngDirectiveDef.h(1, 0);
            i0.ɵr(3, 2);
            i0.ɵr(1, 0);
            ",
            "Hosts are instantiated when they are closed",
        );
    }
}
