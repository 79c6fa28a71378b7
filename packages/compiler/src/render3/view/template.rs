//! Render3 Template Builder
//!
//! Walks a component template and emits its template function: the creation block that
//! builds the view once and the update statements that run on every refresh. Embedded
//! views become nested template functions with their own slot numbering.
//!
//! Each view collects its update statements in separate streams that are concatenated
//! when the view is closed:
//!
//! 1. declarations of the template names read by the view or a nested one
//! 2. view query refreshes
//! 3. bindings, in document order
//! 4. directive host instantiations, after the host's children
//! 5. refreshes: text updates, directive and container refreshes
//! 6. nested template functions

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use super::api::{R3PipeMetadata, R3QueryMetadata};
use super::expression_converter::{
    convert_action_binding, convert_interpolation, convert_property_binding, BindingScope,
};
use super::projection::{insertion_point, ProjectionDef};
use super::query_generation::{get_query_predicate, view_query_declaration, view_query_refresh};
use super::scope::{NodeKind, ScopeStack};
use super::t2_binder::{DirectiveRef, DirectiveRegistry, MatchedDirectives};
use super::util::{
    attributes_array, element_css_selector, invoke_instruction, template_css_selector,
    trim_trailing_nulls, TemporaryAllocator, CREATION_MODE_FLAG, EVENT_NAME,
};
use crate::constant_pool::{ConstantPool, GenericKeyFn, SharedConstantDefinition};
use crate::directive_matching::CssSelector;
use crate::error::{CompileError, Diagnostic, Result};
use crate::expression_parser::ast::{ASTWithSource, AbsoluteSourceSpan};
use crate::output::output_ast as o;
use crate::parse_util::{ParseSourceFile, ParseSourceSpan};
use crate::render3::r3_ast as t;
use crate::render3::r3_identifiers::Identifiers as R3;

/// Hoists `<Pipe>.ngPipeDef` as `<Pipe>_ngPipeDef`.
struct PipeDefinitionReference;

impl SharedConstantDefinition for PipeDefinitionReference {
    fn key_of(&self, expr: &o::Expression) -> String {
        GenericKeyFn::INSTANCE.key_of(expr)
    }

    fn preferred_name(&self, expr: &o::Expression) -> Option<String> {
        match expr {
            o::Expression::ReadProp(read) => match read.receiver.as_ref() {
                o::Expression::ReadVar(type_ref) => Some(format!("{}_{}", type_ref.name, read.name)),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Statement streams of the view being emitted.
#[derive(Debug, Default)]
struct ViewInstructions {
    /// Prefix of the functions of views nested in this one.
    name_prefix: String,
    creation: Vec<o::Statement>,
    query_refresh: Vec<o::Statement>,
    bindings: Vec<o::Statement>,
    host: Vec<o::Statement>,
    refresh: Vec<o::Statement>,
    nested_templates: Vec<o::Statement>,
    temporary: TemporaryAllocator,
}

impl ViewInstructions {
    fn new(name_prefix: impl Into<String>) -> Self {
        ViewInstructions {
            name_prefix: name_prefix.into(),
            ..Default::default()
        }
    }

    /// The body of the template function: `var _t;`, `if (cm) {...}`, then the update
    /// streams in order.
    fn into_statements(self, declarations: Vec<o::Statement>) -> Vec<o::Statement> {
        let mut statements = Vec::new();
        statements.extend(self.temporary.declaration());
        if !self.creation.is_empty() {
            statements.push(o::if_stmt(o::variable(CREATION_MODE_FLAG), self.creation));
        }
        statements.extend(declarations);
        statements.extend(self.query_refresh);
        statements.extend(self.bindings);
        statements.extend(self.host);
        statements.extend(self.refresh);
        statements.extend(self.nested_templates);
        statements
    }
}

/// Result of building a component template function.
#[derive(Debug, Clone)]
pub struct TemplateFunction {
    pub function: o::Expression,
    /// Non-fatal problems, such as bindings skipped because of syntax errors.
    pub diagnostics: Vec<Diagnostic>,
}

/// Emits the template function of one component.
pub struct TemplateDefinitionBuilder<'a, 'p> {
    component_name: String,
    registry: &'p DirectiveRegistry<'a>,
    constant_pool: &'p mut ConstantPool,
    source_file: Option<Arc<ParseSourceFile>>,
    strict: bool,
    scopes: ScopeStack,
    views: Vec<ViewInstructions>,
    projection: Option<(ProjectionDef, usize)>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a, 'p> TemplateDefinitionBuilder<'a, 'p> {
    pub fn new(
        component_name: impl Into<String>,
        registry: &'p DirectiveRegistry<'a>,
        constant_pool: &'p mut ConstantPool,
        source_file: Option<Arc<ParseSourceFile>>,
        strict: bool,
    ) -> Self {
        TemplateDefinitionBuilder {
            component_name: component_name.into(),
            registry,
            constant_pool,
            source_file,
            strict,
            scopes: ScopeStack::new(),
            views: Vec::new(),
            projection: None,
            diagnostics: Vec::new(),
        }
    }

    /// Builds `function <Component>_Template(ctx, cm) {...}`.
    pub fn build_template_function(
        mut self,
        nodes: &[t::R3Node],
        view_queries: &[R3QueryMetadata],
    ) -> Result<TemplateFunction> {
        let name_prefix = self.component_name.clone();
        self.scopes.push();
        self.views.push(ViewInstructions::new(name_prefix.as_str()));

        self.declare_view_queries(nodes, view_queries)?;

        if let Some(def) = ProjectionDef::collect(nodes)? {
            let slot = self.scopes.allocate(NodeKind::ProjectionDef)?;
            let declaration = def.declaration(slot, self.constant_pool)?;
            self.view()?.creation.push(declaration);
            self.projection = Some((def, slot));
        }

        self.declare_references(nodes)?;
        self.visit_nodes(nodes)?;

        let (context_name, statements) = self.close_view()?;
        if self.scopes.depth() != 0 || !self.views.is_empty() {
            return Err(CompileError::internal(format!(
                "unbalanced view scopes after compiling {}",
                self.component_name
            )));
        }

        Ok(TemplateFunction {
            function: o::fn_expr(
                vec![o::FnParam::new(context_name), o::FnParam::new(CREATION_MODE_FLAG)],
                statements,
                Some(format!("{}_Template", name_prefix)),
            ),
            diagnostics: self.diagnostics,
        })
    }

    fn view(&mut self) -> Result<&mut ViewInstructions> {
        self.views
            .last_mut()
            .ok_or_else(|| CompileError::internal("no view is being emitted"))
    }

    /// Pops the current view and returns its context parameter name and function body.
    fn close_view(&mut self) -> Result<(String, Vec<o::Statement>)> {
        let scope = self.scopes.pop()?;
        scope.allocator.verify()?;
        let view = self
            .views
            .pop()
            .ok_or_else(|| CompileError::internal("no view is being emitted"))?;
        let declarations = scope.declarations()?;
        Ok((scope.context_name, view.into_statements(declarations)))
    }

    fn span(&self, span: AbsoluteSourceSpan) -> Option<ParseSourceSpan> {
        self.source_file
            .as_ref()
            .map(|file| ParseSourceSpan::from_absolute(file, span))
    }

    /// Attaches `span` to errors raised without a location.
    fn locate(&self, err: CompileError, span: AbsoluteSourceSpan) -> CompileError {
        match err {
            CompileError::Resolution {
                message,
                span: None,
            } => CompileError::resolution(message, self.span(span)),
            CompileError::Syntax {
                message,
                span: None,
            } => CompileError::syntax(message, self.span(span)),
            other => other,
        }
    }

    /// Records a syntax error and lets the caller skip the binding, unless running strict.
    fn recover(&mut self, err: CompileError) -> Result<()> {
        match err {
            CompileError::Syntax { .. } if !self.strict => {
                let diagnostic = Diagnostic::from(err);
                warn!(component = %self.component_name, "{}", diagnostic);
                self.diagnostics.push(diagnostic);
                Ok(())
            }
            other => Err(other),
        }
    }

    /// Reports the errors the expression parser left on `value`. Returns `false` when the
    /// binding has to be skipped.
    fn check_parsed(&mut self, value: &ASTWithSource, span: AbsoluteSourceSpan) -> Result<bool> {
        match value.errors.first() {
            None => Ok(true),
            Some(error) => {
                let span = self.span(error.span.unwrap_or(span));
                self.recover(CompileError::syntax(error.message.clone(), span))?;
                Ok(false)
            }
        }
    }

    /// Runs `lower` for one binding. Syntax errors skip the binding, anything else aborts.
    fn lower_binding<T>(
        &mut self,
        value: &ASTWithSource,
        span: AbsoluteSourceSpan,
        lower: impl FnOnce(&mut Self, &ASTWithSource) -> Result<T>,
    ) -> Result<Option<T>> {
        if !self.check_parsed(value, span)? {
            return Ok(None);
        }
        match lower(self, value) {
            Ok(lowered) => Ok(Some(lowered)),
            Err(err) => {
                let err = self.locate(err, span);
                self.recover(err)?;
                Ok(None)
            }
        }
    }

    fn declare_view_queries(
        &mut self,
        nodes: &[t::R3Node],
        view_queries: &[R3QueryMetadata],
    ) -> Result<()> {
        if view_queries.is_empty() {
            return Ok(());
        }
        let mut known_references = HashSet::new();
        t::walk_nodes(nodes, &mut |node| {
            let references = match node {
                t::R3Node::Element(element) => &element.references,
                t::R3Node::Template(template) => &template.references,
                _ => return,
            };
            known_references.extend(references.iter().map(|r| r.name.clone()));
        });

        for query in view_queries {
            let slot = self.scopes.allocate(NodeKind::Query)?;
            let predicate = get_query_predicate(
                query,
                self.constant_pool,
                self.registry.directive_names(),
                Some(&known_references),
            )?;
            let view = self.view()?;
            view.creation
                .push(view_query_declaration(slot, predicate, query.first));
            let refresh = view_query_refresh(slot, query, &mut view.temporary);
            view.query_refresh.push(refresh);
        }
        Ok(())
    }

    /// Declares the references of a view up front so bindings can read them before the
    /// node that defines them. Embedded views declare their own.
    fn declare_references(&mut self, nodes: &[t::R3Node]) -> Result<()> {
        for node in nodes {
            match node {
                t::R3Node::Element(element) => {
                    for reference in &element.references {
                        let span = self.span(reference.source_span);
                        self.scopes.declare_reference(&reference.name, span)?;
                    }
                    self.declare_references(&element.children)?;
                }
                t::R3Node::Template(template) => {
                    for reference in &template.references {
                        let span = self.span(reference.source_span);
                        self.scopes.declare_reference(&reference.name, span)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn visit_nodes(&mut self, nodes: &[t::R3Node]) -> Result<()> {
        for node in nodes {
            node.visit(self)?;
        }
        Ok(())
    }

    fn match_directives(
        &self,
        selector: &CssSelector,
        span: AbsoluteSourceSpan,
    ) -> Result<MatchedDirectives<'a>> {
        self.registry
            .match_directives(selector)
            .map_err(|err| self.locate(err, span))
    }

    /// One slot per matched directive, component first.
    fn allocate_directives(
        &mut self,
        matched: &MatchedDirectives<'a>,
        host: usize,
    ) -> Result<Vec<(DirectiveRef<'a>, usize)>> {
        matched
            .all()
            .map(|directive| {
                let slot = self.scopes.allocate(NodeKind::Directive {
                    name: directive.name().to_string(),
                    host,
                })?;
                Ok((directive, slot))
            })
            .collect()
    }

    /// Points each reference at the node, its component or the directive it exports.
    fn attach_references(
        &mut self,
        references: &[t::Reference],
        host: usize,
        directives: &[(DirectiveRef<'a>, usize)],
    ) -> Result<()> {
        for reference in references {
            let slot = if reference.value.is_empty() {
                directives
                    .iter()
                    .find(|(directive, _)| directive.is_component)
                    .map_or(host, |(_, slot)| *slot)
            } else {
                directives
                    .iter()
                    .find(|(directive, _)| directive.meta.is_exported_as(&reference.value))
                    .map(|(_, slot)| *slot)
                    .ok_or_else(|| {
                        CompileError::resolution(
                            format!(
                                "No directive is exported as '{}' for the reference '{}'",
                                reference.value, reference.name
                            ),
                            self.span(reference.source_span),
                        )
                    })?
            };
            self.scopes.attach_reference(&reference.name, slot)?;
        }
        Ok(())
    }

    /// `[Dir, ...]` of the non-component directives, hoisted.
    fn directives_constant(&mut self, matched: &MatchedDirectives<'a>) -> o::Expression {
        if matched.directives.is_empty() {
            return o::null_expr();
        }
        let types = matched
            .directives
            .iter()
            .map(|directive| o::variable(directive.name()))
            .collect();
        self.constant_pool.get_const_literal(o::literal_arr(types))
    }

    fn attributes_constant(&mut self, attributes: &[t::TextAttribute]) -> o::Expression {
        match attributes_array(attributes) {
            Some(array) => self.constant_pool.get_const_literal(array),
            None => o::null_expr(),
        }
    }

    fn references_constant(&mut self, references: &[t::Reference]) -> o::Expression {
        if references.is_empty() {
            return o::null_expr();
        }
        let mut pairs = Vec::with_capacity(references.len() * 2);
        for reference in references {
            pairs.push(o::literal(reference.name.as_str()));
            pairs.push(o::literal(reference.value.as_str()));
        }
        self.constant_pool.get_const_literal(o::literal_arr(pairs))
    }

    /// `ɵL('name', function($event) {...})` right after the node's creation.
    fn emit_listeners(&mut self, outputs: &[t::BoundEvent]) -> Result<()> {
        for output in outputs {
            let statements = self.lower_binding(&output.handler, output.source_span, |this, handler| {
                convert_action_binding(this, &handler.ast)
            })?;
            if let Some(statements) = statements {
                let handler = o::fn_expr(vec![o::FnParam::new(EVENT_NAME)], statements, None);
                let listener =
                    invoke_instruction(R3::listener(), vec![o::literal(output.name.as_str()), handler]);
                self.view()?.creation.push(listener.into_stmt());
            }
        }
        Ok(())
    }

    /// `ɵp`, `ɵa`, `ɵk` or `ɵs` for one bound attribute of the node at `slot`.
    fn emit_binding(&mut self, slot: usize, input: &t::BoundAttribute) -> Result<()> {
        let converted = self.lower_binding(&input.value, input.source_span, |this, value| {
            convert_property_binding(this, &value.ast)
        })?;
        let Some(converted) = converted else {
            return Ok(());
        };

        let instruction = match input.type_ {
            t::BindingType::Property => R3::element_property(),
            t::BindingType::Attribute => R3::element_attribute(),
            t::BindingType::Class => R3::element_class_named(),
            t::BindingType::Style => R3::element_style_named(),
        };
        let mut args = vec![o::literal(slot), o::literal(input.name.as_str()), converted.value];
        if input.type_ == t::BindingType::Style {
            if let Some(unit) = &input.unit {
                args.push(o::literal(unit.as_str()));
            }
        }
        self.view()?
            .bindings
            .push(invoke_instruction(instruction, args).into_stmt());
        Ok(())
    }

    /// `<Dir>.ngXDef.h(dirSlot, hostSlot)` for each directive on the host.
    fn emit_host_instantiations(
        &mut self,
        directives: &[(DirectiveRef<'a>, usize)],
        host: usize,
    ) -> Result<()> {
        let view = self.view()?;
        for (directive, slot) in directives {
            let def = o::variable(directive.name()).prop(directive.def_property());
            view.host.push(
                def.prop(R3::HOST_METHOD)
                    .call_fn(vec![o::literal(*slot), o::literal(host)])
                    .into_stmt(),
            );
        }
        Ok(())
    }

    fn directive_refreshes(directives: &[(DirectiveRef<'a>, usize)], host: usize) -> Vec<o::Statement> {
        directives
            .iter()
            .map(|(_, slot)| {
                invoke_instruction(R3::directive_refresh(), vec![o::literal(*slot), o::literal(host)])
                    .into_stmt()
            })
            .collect()
    }
}

impl<'a, 'p> BindingScope for TemplateDefinitionBuilder<'a, 'p> {
    fn resolve_local(&mut self, name: &str) -> Option<o::Expression> {
        self.scopes.lookup(name)
    }

    fn allocate_pipe(&mut self, pipe_name: &str, span: AbsoluteSourceSpan) -> Result<usize> {
        let pipe: &R3PipeMetadata = self.registry.pipe(pipe_name).ok_or_else(|| {
            CompileError::resolution(
                format!("The pipe '{}' could not be found", pipe_name),
                self.span(span),
            )
        })?;
        let slot = self.scopes.allocate(NodeKind::Pipe {
            name: pipe.name.clone(),
        })?;
        let def = self.constant_pool.get_shared_constant(
            &PipeDefinitionReference,
            o::variable(pipe.name.as_str()).prop("ngPipeDef"),
        );
        debug!(pipe = %pipe.name, slot, pure = pipe.pure, "allocated pipe");
        let create = invoke_instruction(
            R3::pipe(),
            vec![o::literal(slot), def.clone(), def.prop(R3::NEW_METHOD).call_fn(vec![])],
        );
        self.view()?.creation.push(create.into_stmt());
        Ok(slot)
    }

    fn constant_pool(&mut self) -> &mut ConstantPool {
        &mut *self.constant_pool
    }

    fn allocate_temporary(&mut self) -> Result<o::Expression> {
        Ok(self.view()?.temporary.allocate())
    }

    fn source_span(&self, span: AbsoluteSourceSpan) -> Option<ParseSourceSpan> {
        self.span(span)
    }
}

impl<'a, 'p> t::Visitor for TemplateDefinitionBuilder<'a, 'p> {
    type Result = Result<()>;

    fn visit_element(&mut self, element: &t::Element) -> Self::Result {
        let slot = self.scopes.allocate(NodeKind::Element {
            tag: element.name.clone(),
        })?;
        let matched = self.match_directives(&element_css_selector(element), element.source_span)?;
        let directives = self.allocate_directives(&matched, slot)?;
        self.attach_references(&element.references, slot, &directives)?;

        let tag = match matched.component {
            Some(component) => o::variable(component.name()),
            None => o::literal(element.name.as_str()),
        };
        let attrs = self.attributes_constant(&element.attributes);
        let dirs = self.directives_constant(&matched);
        let refs = self.references_constant(&element.references);
        let start = invoke_instruction(
            R3::element_start(),
            trim_trailing_nulls(vec![o::literal(slot), tag, attrs, dirs, refs]),
        );
        self.view()?.creation.push(start.into_stmt());

        self.emit_listeners(&element.outputs)?;
        for input in &element.inputs {
            self.emit_binding(slot, input)?;
        }

        self.visit_nodes(&element.children)?;

        let view = self.view()?;
        view.creation
            .push(invoke_instruction(R3::element_end(), vec![]).into_stmt());
        self.emit_host_instantiations(&directives, slot)?;
        let refreshes = Self::directive_refreshes(&directives, slot);
        self.view()?.refresh.extend(refreshes);
        Ok(())
    }

    fn visit_template(&mut self, template: &t::Template) -> Self::Result {
        let slot = self.scopes.allocate(NodeKind::Container)?;
        let matched = self.match_directives(&template_css_selector(template), template.source_span)?;
        let directives = self.allocate_directives(&matched, slot)?;
        self.attach_references(&template.references, slot, &directives)?;

        let parent_prefix = self.view()?.name_prefix.clone();
        let (function_name, nested_prefix) = match matched.all().next() {
            Some(first) => (
                format!("{}_{}_Template_{}", parent_prefix, first.name(), slot),
                format!("{}_{}", parent_prefix, first.name()),
            ),
            None => {
                let name = format!("{}_Template_{}", parent_prefix, slot);
                (name.clone(), name)
            }
        };

        let dirs = self.directives_constant(&matched);
        let mut args = vec![o::literal(slot), dirs, o::variable(function_name.as_str())];
        if !template.attributes.is_empty() {
            let tag = template
                .tag_name
                .as_deref()
                .map_or_else(o::null_expr, o::literal);
            args.push(tag);
            args.push(self.attributes_constant(&template.attributes));
        }
        let container = invoke_instruction(R3::container_create(), args);
        self.view()?.creation.push(container.into_stmt());

        self.emit_listeners(&template.outputs)?;
        let bound_template_attrs = template.template_attrs.iter().filter_map(|attr| match attr {
            t::TemplateAttr::Bound(bound) => Some(bound),
            t::TemplateAttr::Text(_) => None,
        });
        for input in template.inputs.iter().chain(bound_template_attrs) {
            self.emit_binding(slot, input)?;
        }

        self.emit_host_instantiations(&directives, slot)?;
        let mut refreshes = vec![invoke_instruction(R3::container_refresh_start(), vec![o::literal(slot)]).into_stmt()];
        refreshes.extend(Self::directive_refreshes(&directives, slot));
        refreshes.push(invoke_instruction(R3::container_refresh_end(), vec![]).into_stmt());
        self.view()?.refresh.extend(refreshes);

        // Embedded view
        self.scopes.push();
        self.views.push(ViewInstructions::new(nested_prefix));
        for variable in &template.variables {
            let span = self.span(variable.source_span);
            self.scopes.declare_variable(&variable.name, &variable.value, span)?;
        }
        self.declare_references(&template.children)?;
        self.visit_nodes(&template.children)?;
        let (context_name, statements) = self.close_view()?;

        let function = o::Statement::DeclareFn(o::DeclareFunctionStmt {
            name: function_name,
            params: vec![o::FnParam::new(context_name), o::FnParam::new(CREATION_MODE_FLAG)],
            statements,
        });
        self.view()?.nested_templates.push(function);
        Ok(())
    }

    fn visit_content(&mut self, content: &t::Content) -> Self::Result {
        let slot = self.scopes.allocate(NodeKind::Projection)?;
        // `def_slot` lives in the component view, whatever view this is.
        let (def_slot, index) = match &self.projection {
            Some((def, def_slot)) => (*def_slot, def.index_of(content)),
            None => {
                return Err(CompileError::internal(
                    "insertion point visited without a projection definition",
                ))
            }
        };
        self.view()?
            .creation
            .push(insertion_point(slot, def_slot, index));
        Ok(())
    }

    fn visit_text(&mut self, text: &t::Text) -> Self::Result {
        let slot = self.scopes.allocate(NodeKind::Text)?;
        let create = invoke_instruction(
            R3::text(),
            vec![o::literal(slot), o::literal(text.value.as_str())],
        );
        self.view()?.creation.push(create.into_stmt());
        Ok(())
    }

    fn visit_bound_text(&mut self, text: &t::BoundText) -> Self::Result {
        let slot = self.scopes.allocate(NodeKind::Text)?;
        self.view()?
            .creation
            .push(invoke_instruction(R3::text(), vec![o::literal(slot)]).into_stmt());

        let value = self.lower_binding(&text.value, text.source_span, |this, value| {
            convert_interpolation(this, &value.ast)
        })?;
        if let Some(value) = value {
            let update = invoke_instruction(R3::text_create_bound(), vec![o::literal(slot), value]);
            self.view()?.refresh.push(update.into_stmt());
        }
        Ok(())
    }
}
