//! Render3 View Compiler
//!
//! Assembles the definition objects of components, directives and pipes and drives the
//! compilation of a whole [`CompilationUnit`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, info_span, warn};

use crate::config::{CompilerConfig, DEFAULT_CORE_MODULE};
use crate::constant_pool::{ConstantPool, GenericKeyFn, SharedConstantDefinition};
use crate::directive_matching::CssSelector;
use crate::error::{CompileError, Diagnostic, Result};
use crate::output::abstract_js_emitter::JavaScriptEmitter;
use crate::output::output_ast as o;
use crate::parse_util::ParseSourceFile;
use crate::render3::r3_factory::compile_factory_function;
use crate::render3::r3_identifiers::Identifiers as R3;
use crate::render3::r3_pipe_compiler::compile_pipe_from_metadata;
use crate::render3::util::R3CompiledExpression;

use super::api::{CompilationUnit, Declaration, R3ComponentMetadata, R3DirectiveMetadata};
use super::query_generation::{content_query_creations, content_query_host_bindings};
use super::t2_binder::DirectiveRegistry;
use super::template::TemplateDefinitionBuilder;
use super::util::{map_to_expression, DefinitionMap};

const COMPONENT_DEF: &str = "ngComponentDef";
const DIRECTIVE_DEF: &str = "ngDirectiveDef";
const PIPE_DEF: &str = "ngPipeDef";

/// Compile a directive for the render3 runtime.
///
/// Content queries by type may target any directive or component among `declarations`.
pub fn compile_directive_from_metadata(
    meta: &R3DirectiveMetadata,
    declarations: &[Declaration],
    constant_pool: &mut ConstantPool,
) -> Result<R3CompiledExpression> {
    let mut definition_map = base_directive_fields(meta, declarations, constant_pool, None)?;
    add_features(&mut definition_map, meta);

    let expression =
        o::import_ref(R3::define_directive()).call_fn(vec![definition_map.to_literal_map()]);
    Ok(R3CompiledExpression::new(expression, vec![]))
}

/// A compiled component and the non-fatal problems found in its template.
#[derive(Debug, Clone)]
pub struct R3CompiledComponent {
    pub compiled: R3CompiledExpression,
    pub diagnostics: Vec<Diagnostic>,
}

/// Compile a component for the render3 runtime.
///
/// `declarations` are the declarations of the component's unit; the directives and pipes
/// visible to the template are looked up among them.
pub fn compile_component_from_metadata(
    meta: &R3ComponentMetadata,
    declarations: &[Declaration],
    constant_pool: &mut ConstantPool,
    config: &CompilerConfig,
) -> Result<R3CompiledComponent> {
    let tag = selector_tag(&meta.directive)?;
    let mut definition_map =
        base_directive_fields(&meta.directive, declarations, constant_pool, tag)?;

    let registry = DirectiveRegistry::for_component(meta, declarations)?;
    let source_file = meta.template.source.as_ref().map(|source| {
        Arc::new(ParseSourceFile::new(source.clone(), meta.template.url.clone()))
    });
    let template = TemplateDefinitionBuilder::new(
        meta.name(),
        &registry,
        constant_pool,
        source_file,
        config.strict,
    )
    .build_template_function(&meta.template.nodes, &meta.view_queries)?;

    let mut template_function = template.function;
    share_definition_references(&mut template_function, constant_pool);

    // e.g. `template: function MyComponent_Template(ctx, cm) {...}`
    definition_map.set("template", Some(template_function));
    add_features(&mut definition_map, &meta.directive);

    let expression =
        o::import_ref(R3::define_component()).call_fn(vec![definition_map.to_literal_map()]);
    Ok(R3CompiledComponent {
        compiled: R3CompiledExpression::new(expression, vec![]),
        diagnostics: template.diagnostics,
    })
}

/// `type`, `tag`, `factory` and `hostBindings`, in that order.
fn base_directive_fields(
    meta: &R3DirectiveMetadata,
    declarations: &[Declaration],
    constant_pool: &mut ConstantPool,
    tag: Option<String>,
) -> Result<DefinitionMap> {
    let mut definition_map = DefinitionMap::new();

    // e.g. `type: MyDirective`
    definition_map.set("type", Some(o::variable(meta.name.as_str())));

    // e.g. `tag: 'my-component'`
    definition_map.set("tag", tag.map(o::literal));

    // e.g. `factory: function MyDirective_Factory() { return [new MyDirective(), ɵQ(...)]; }`
    let directive_types: HashSet<String> = declarations
        .iter()
        .filter(|decl| decl.as_directive().is_some())
        .map(|decl| decl.name().to_string())
        .collect();
    let queries = content_query_creations(&meta.queries, constant_pool, &directive_types)?;
    definition_map.set(
        "factory",
        Some(compile_factory_function(&meta.name, &meta.deps, queries)),
    );

    // e.g. `hostBindings: function MyDirective_HostBindings(dirIndex, elIndex) {...}`
    definition_map.set(
        "hostBindings",
        content_query_host_bindings(&meta.name, &meta.queries),
    );

    Ok(definition_map)
}

/// `inputs`, `outputs` and `features`.
fn add_features(definition_map: &mut DefinitionMap, meta: &R3DirectiveMetadata) {
    definition_map.set("inputs", map_to_expression(&meta.inputs));
    definition_map.set("outputs", map_to_expression(&meta.outputs));

    // ngOnChanges only sees changes of declared inputs.
    if meta.lifecycle.uses_on_changes && !meta.inputs.is_empty() {
        let feature = o::import_ref(R3::ng_on_changes_feature())
            .call_fn(vec![o::variable(meta.name.as_str())]);
        definition_map.set("features", Some(o::literal_arr(vec![feature])));
    }
}

/// The element name of the first selector, when it names one.
fn selector_tag(meta: &R3DirectiveMetadata) -> Result<Option<String>> {
    let selector = match meta.selector.as_deref().map(str::trim) {
        Some(selector) if !selector.is_empty() => selector,
        _ => return Ok(None),
    };
    let selectors = CssSelector::parse(selector).map_err(|err| {
        CompileError::resolution(
            format!("Invalid selector '{}' on {}: {}", selector, meta.name, err),
            None,
        )
    })?;
    Ok(selectors
        .into_iter()
        .next()
        .filter(CssSelector::has_element_selector)
        .and_then(|first| first.element))
}

/// Hoists `<Type>.ngComponentDef` and `<Type>.ngDirectiveDef` as `_cN`.
struct DefinitionReference;

impl SharedConstantDefinition for DefinitionReference {
    fn key_of(&self, expr: &o::Expression) -> String {
        GenericKeyFn::INSTANCE.key_of(expr)
    }
}

fn is_definition_reference(expr: &o::Expression) -> bool {
    match expr {
        o::Expression::ReadProp(read) => {
            (read.name == COMPONENT_DEF || read.name == DIRECTIVE_DEF)
                && matches!(read.receiver.as_ref(), o::Expression::ReadVar(_))
        }
        _ => false,
    }
}

/// Replaces definition references read at least twice in `function`, nested template
/// functions included, with a shared constant.
fn share_definition_references(function: &mut o::Expression, constant_pool: &mut ConstantPool) {
    let mut usages: IndexMap<String, (o::Expression, usize)> = IndexMap::new();
    function.walk(&mut |expr| {
        if is_definition_reference(expr) {
            usages
                .entry(GenericKeyFn::INSTANCE.key_of(expr))
                .or_insert_with(|| (expr.clone(), 0))
                .1 += 1;
        }
    });

    let mut shared: HashMap<String, o::Expression> = HashMap::new();
    for (key, (expr, count)) in usages {
        if count >= 2 {
            debug!(reference = %key, count, "sharing definition reference");
            shared.insert(key, constant_pool.get_shared_constant(&DefinitionReference, expr));
        }
    }
    if shared.is_empty() {
        return;
    }

    function.transform(&mut |expr| {
        if is_definition_reference(expr) {
            if let Some(constant) = shared.get(&GenericKeyFn::INSTANCE.key_of(expr)) {
                *expr = constant.clone();
            }
        }
    });
}

/// Output of compiling one unit.
#[derive(Debug, Clone)]
pub struct CompiledFile {
    pub file_name: String,
    /// Hoisted constants followed by one definition statement per compiled declaration.
    pub statements: Vec<o::Statement>,
    /// `statements` printed as JavaScript.
    pub source: String,
    pub diagnostics: Vec<Diagnostic>,
    /// Names of the declarations left out because compiling them failed.
    pub dropped: Vec<String>,
}

impl CompiledFile {
    /// Whether a declaration of the unit was dropped.
    pub fn has_errors(&self) -> bool {
        !self.dropped.is_empty()
    }
}

/// Compiles every declaration of `unit` in order.
///
/// A declaration that fails is left out of the output together with every constant it
/// hoisted; its error is reported as a diagnostic and the next declaration is compiled.
pub fn compile_file(unit: &CompilationUnit, config: &CompilerConfig) -> CompiledFile {
    let span = info_span!("compile_unit", file = %unit.file_name);
    let _enter = span.enter();

    let mut constant_pool = ConstantPool::new();
    let mut definitions = Vec::new();
    let mut diagnostics = Vec::new();
    let mut dropped = Vec::new();

    for declaration in &unit.declarations {
        let snapshot = constant_pool.clone();
        match compile_declaration(declaration, &unit.declarations, &mut constant_pool, config) {
            Ok((statements, found)) => {
                definitions.extend(statements);
                diagnostics.extend(found);
            }
            Err(err) => {
                constant_pool = snapshot;
                warn!(
                    declaration = %declaration.name(),
                    kind = %err.kind(),
                    "{}",
                    err
                );
                diagnostics.push(Diagnostic::from(err));
                dropped.push(declaration.name().to_string());
            }
        }
    }

    let mut statements = constant_pool.statements;
    statements.extend(definitions);
    relocate_core_module(&mut statements, &config.core_module);

    let source = JavaScriptEmitter::from_config(config).emit_statements(&statements);
    debug!(
        statements = statements.len(),
        diagnostics = diagnostics.len(),
        "compiled unit"
    );
    CompiledFile {
        file_name: unit.file_name.clone(),
        statements,
        source,
        diagnostics,
        dropped,
    }
}

fn compile_declaration(
    declaration: &Declaration,
    declarations: &[Declaration],
    constant_pool: &mut ConstantPool,
    config: &CompilerConfig,
) -> Result<(Vec<o::Statement>, Vec<Diagnostic>)> {
    match declaration {
        Declaration::Component(meta) => {
            let span = info_span!("compile_component", name = %meta.name());
            let _enter = span.enter();
            let component =
                compile_component_from_metadata(meta, declarations, constant_pool, config)?;
            Ok((
                component
                    .compiled
                    .into_definition_statement(meta.name(), COMPONENT_DEF),
                component.diagnostics,
            ))
        }
        Declaration::Directive(meta) => {
            let span = info_span!("compile_directive", name = %meta.name);
            let _enter = span.enter();
            let compiled = compile_directive_from_metadata(meta, declarations, constant_pool)?;
            Ok((
                compiled.into_definition_statement(&meta.name, DIRECTIVE_DEF),
                vec![],
            ))
        }
        Declaration::Pipe(meta) => {
            let span = info_span!("compile_pipe", name = %meta.name);
            let _enter = span.enter();
            let compiled = compile_pipe_from_metadata(meta);
            Ok((compiled.into_definition_statement(&meta.name, PIPE_DEF), vec![]))
        }
    }
}

/// Points runtime references at `core_module` when it is not the default module.
fn relocate_core_module(statements: &mut [o::Statement], core_module: &str) {
    if core_module == DEFAULT_CORE_MODULE {
        return;
    }
    for statement in statements.iter_mut() {
        statement.transform_expressions(&mut |expr| {
            if let o::Expression::External(external) = expr {
                if external.value.module_name.as_deref() == Some(DEFAULT_CORE_MODULE) {
                    external.value.module_name = Some(core_module.to_string());
                }
            }
        });
    }
}
