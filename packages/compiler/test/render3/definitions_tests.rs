//! Definition Tests
//!
//! The static definition objects of pipes, directives and components, and the
//! file-level behavior of a compilation unit.

use r3_compiler::config::CompilerConfig;
use r3_compiler::render3::r3_factory::R3DependencyMetadata;
use r3_compiler::render3::view::api::{CompilationUnit, Declaration};
use r3_compiler::render3::view::compiler::compile_file;

#[path = "view/util.rs"]
mod view_util;

#[cfg(test)]
mod tests {
    use super::view_util::*;
    use super::*;

    mod pipes {
        use super::*;

        #[test]
        fn should_define_pure_pipes() {
            let source = compile_clean(vec![Declaration::Pipe(pipe_def("MyPipe", "myPipe", true))]);
            expect_emit(
                &source,
                r"
                MyPipe.ngPipeDef = i0.ɵdefinePipe({
                  type: MyPipe,
                  factory: function MyPipe_Factory() { return new MyPipe(); },
                  pure: true
                });
                ",
                "Invalid pipe definition",
            );
        }

        #[test]
        fn should_leave_out_the_flag_of_impure_pipes() {
            let source = compile_clean(vec![Declaration::Pipe(pipe_def("MyPipe", "myPipe", false))]);
            expect_emit(
                &source,
                r"
                MyPipe.ngPipeDef = i0.ɵdefinePipe({
                  type: MyPipe,
                  factory: function MyPipe_Factory() { return new MyPipe(); }
                });
                ",
                "Invalid impure pipe definition",
            );
            expect_no_emit(&source, "pure", "Impure pipes carry no flag");
        }

        #[test]
        fn should_inject_pipe_dependencies() {
            let mut meta = pipe_def("DatePipe", "date", true);
            meta.deps = vec![R3DependencyMetadata::token("LOCALE")];
            let source = compile_clean(vec![Declaration::Pipe(meta)]);
            expect_emit(
                &source,
                "return new DatePipe(i0.ɵdirectiveInject(LOCALE));",
                "Pipe constructor dependencies",
            );
        }
    }

    mod directives {
        use super::*;

        #[test]
        fn should_declare_inputs_outputs_and_features() {
            let mut meta = directive("SomeDirective", "[some-directive]");
            meta.inputs.insert("nameMin".to_string(), "name".to_string());
            meta.outputs.insert("changed".to_string(), "change".to_string());
            meta.lifecycle.uses_on_changes = true;
            let source = compile_clean(vec![Declaration::Directive(meta)]);
            expect_emit(
                &source,
                r"
                SomeDirective.ngDirectiveDef = i0.ɵdefineDirective({
                  type: SomeDirective,
                  factory: function SomeDirective_Factory() { return new SomeDirective(); },
                  inputs: {nameMin: 'name'},
                  outputs: {changed: 'change'},
                  features: [i0.ɵNgOnChangesFeature(SomeDirective)]
                });
                ",
                "Invalid directive definition",
            );
        }

        #[test]
        fn should_not_add_the_changes_feature_without_inputs() {
            let mut meta = directive("SomeDirective", "[some-directive]");
            meta.lifecycle.uses_on_changes = true;
            let source = compile_clean(vec![Declaration::Directive(meta)]);
            expect_no_emit(&source, "features", "No inputs means no changes to report");
        }

        #[test]
        fn should_inject_node_dependencies() {
            let mut meta = directive("Tooltip", "[tooltip]");
            meta.deps = vec![
                R3DependencyMetadata::ElementRef,
                R3DependencyMetadata::token("Overlay"),
            ];
            let source = compile_clean(vec![Declaration::Directive(meta)]);
            expect_emit(
                &source,
                "return new Tooltip(i0.ɵinjectElementRef(), i0.ɵdirectiveInject(Overlay));",
                "Directive constructor dependencies",
            );
        }
    }

    mod components {
        use super::*;

        #[test]
        fn should_take_the_tag_from_the_element_selector() {
            let source = compile_clean(vec![Declaration::Component(component(
                "MyComponent",
                "my-component[big], other",
                vec![],
            ))]);
            expect_emit(
                &source,
                r"
                MyComponent.ngComponentDef = i0.ɵdefineComponent({
                  type: MyComponent,
                  tag: 'my-component',
                  factory: function MyComponent_Factory() { return new MyComponent(); },
                  template: function MyComponent_Template(ctx, cm) {}
                });
                ",
                "Invalid component definition",
            );
        }

        #[test]
        fn should_leave_out_the_tag_of_attribute_selectors() {
            let source = compile_clean(vec![Declaration::Component(component(
                "AttrComponent",
                "[attr-component]",
                vec![],
            ))]);
            expect_emit(
                &source,
                r"
                AttrComponent.ngComponentDef = i0.ɵdefineComponent({
                  type: AttrComponent,
                  factory: function AttrComponent_Factory() { return new AttrComponent(); },
                ",
                "No tag without an element selector",
            );
            expect_no_emit(&source, "tag:", "No tag without an element selector");
        }
    }

    mod units {
        use super::*;

        #[test]
        fn should_use_the_configured_alias() {
            let config = CompilerConfig {
                core_alias: "r3".to_string(),
                core_module: "@angular/core/render3".to_string(),
                ..CompilerConfig::default()
            };
            let file = compile_with(vec![Declaration::Pipe(pipe_def("MyPipe", "myPipe", true))], &config);
            expect_emit(&file.source, "MyPipe.ngPipeDef = r3.ɵdefinePipe({", "Aliased runtime");
            expect_no_emit(&file.source, "i0", "Default alias is not used");
        }

        #[test]
        fn should_emit_constants_before_definitions_in_declaration_order() {
            let file = compile(vec![
                Declaration::Pipe(pipe_def("First", "first", true)),
                Declaration::Component(component(
                    "Second",
                    "second",
                    vec![element("div").attr("id", "x").node()],
                )),
            ]);
            let constant = file.source.find("const _c0 = ['id', 'x'];").unwrap();
            let first = file.source.find("First.ngPipeDef").unwrap();
            let second = file.source.find("Second.ngComponentDef").unwrap();
            assert!(constant < first);
            assert!(first < second);
            assert_eq!(file.file_name, "test.ts");
        }

        #[test]
        fn should_compile_identical_units_identically() {
            let declarations = || {
                let mut app = component(
                    "MyApp",
                    "my-app",
                    vec![
                        element("div")
                            .attr("id", "x")
                            .property("items", array(vec![read("a"), number(1.0)]))
                            .property("title", pipe(read("name"), "myPipe", vec![]))
                            .node(),
                        template()
                            .structural_text("if", "")
                            .child(element("span").reference("s", "").node())
                            .node(),
                    ],
                );
                app.view_queries.push(ref_query("spans", &["s"], false));
                vec![
                    Declaration::Pipe(pipe_def("MyPipe", "myPipe", true)),
                    Declaration::Directive(directive("If", "[if]")),
                    Declaration::Component(app),
                ]
            };

            let first = compile(declarations());
            let second = compile(declarations());
            assert_eq!(first.source, second.source);
            assert_eq!(first.statements, second.statements);
            assert_eq!(first.dropped, second.dropped);
            assert!(!first.source.is_empty());
        }

        #[test]
        fn should_roll_back_constants_of_dropped_declarations() {
            let file = compile(vec![
                Declaration::Component(component(
                    "Broken",
                    "broken",
                    vec![element("div")
                        .attr("id", "a")
                        .property("title", pipe(read("x"), "missing", vec![]))
                        .node()],
                )),
                Declaration::Component(component(
                    "Working",
                    "working",
                    vec![element("div").attr("id", "b").node()],
                )),
            ]);

            assert_eq!(file.dropped, vec!["Broken".to_string()]);
            assert!(file.source.contains("const _c0 = ['id', 'b'];"));
            expect_no_emit(&file.source, "'a'", "Constants of Broken are rolled back");
            expect_no_emit(&file.source, "Broken", "Broken is left out");
        }

        #[test]
        fn should_compile_units_read_from_json() {
            let unit = CompilationUnit::from_json(
                r#"{
                    "fileName": "app.ts",
                    "declarations": [
                        {"kind": "pipe", "name": "UpperPipe", "pipeName": "upper"},
                        {"kind": "directive", "name": "Focus", "selector": "[focus]",
                         "deps": [{"kind": "elementRef"}],
                         "inputs": {"focus": "focus"}}
                    ]
                }"#,
            )
            .unwrap();
            let file = compile_file(&unit, &CompilerConfig::default());

            assert!(file.diagnostics.is_empty());
            assert_eq!(file.file_name, "app.ts");
            expect_emit(
                &file.source,
                r"
                UpperPipe.ngPipeDef = i0.ɵdefinePipe({
                  type: UpperPipe,
                  factory: function UpperPipe_Factory() { return new UpperPipe(); },
                  pure: true
                });
                Focus.ngDirectiveDef = i0.ɵdefineDirective({
                  type: Focus,
                  factory: function Focus_Factory() { return new Focus(i0.ɵinjectElementRef()); },
                  inputs: {focus: 'focus'}
                });
                ",
                "Unit read from JSON",
            );
        }
    }
}
