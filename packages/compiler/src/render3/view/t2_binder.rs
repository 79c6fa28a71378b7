//! Render3 T2 Binder
//!
//! Resolves which directives and pipes a component template can see and matches
//! template nodes against the visible directive selectors.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::debug;

use super::api::{Declaration, R3ComponentMetadata, R3DirectiveMetadata, R3PipeMetadata};
use crate::directive_matching::{CssSelector, SelectorMatcher};
use crate::error::{CompileError, Result};

/// A directive visible to a template.
#[derive(Debug, Clone, Copy)]
pub struct DirectiveRef<'a> {
    pub meta: &'a R3DirectiveMetadata,
    pub is_component: bool,
}

impl<'a> DirectiveRef<'a> {
    pub fn name(&self) -> &'a str {
        &self.meta.name
    }

    /// `ngComponentDef` or `ngDirectiveDef`.
    pub fn def_property(&self) -> &'static str {
        if self.is_component {
            "ngComponentDef"
        } else {
            "ngDirectiveDef"
        }
    }
}

/// Directives matched on one node.
#[derive(Debug, Clone, Default)]
pub struct MatchedDirectives<'a> {
    pub component: Option<DirectiveRef<'a>>,
    /// Non-component directives in declaration order.
    pub directives: Vec<DirectiveRef<'a>>,
}

impl<'a> MatchedDirectives<'a> {
    pub fn is_empty(&self) -> bool {
        self.component.is_none() && self.directives.is_empty()
    }

    /// The component first, then the other directives. This is also the order their
    /// slots are allocated in.
    pub fn all(&self) -> impl Iterator<Item = DirectiveRef<'a>> + '_ {
        self.component.iter().copied().chain(self.directives.iter().copied())
    }
}

/// Directives and pipes visible to one component template.
pub struct DirectiveRegistry<'a> {
    matcher: SelectorMatcher<DirectiveRef<'a>>,
    pipes: IndexMap<String, &'a R3PipeMetadata>,
    /// Names of every visible directive, including ones without a selector.
    directive_names: HashSet<String>,
}

impl<'a> DirectiveRegistry<'a> {
    pub fn new() -> Self {
        DirectiveRegistry {
            matcher: SelectorMatcher::new(),
            pipes: IndexMap::new(),
            directive_names: HashSet::new(),
        }
    }

    /// Builds the registry for `component` from the declarations of its unit.
    ///
    /// Names listed by the component that do not refer to a declaration of the unit are
    /// resolution errors, and so are selectors that fail to parse.
    pub fn for_component(
        component: &R3ComponentMetadata,
        declarations: &'a [Declaration],
    ) -> Result<Self> {
        let mut registry = DirectiveRegistry::new();

        let visible: Vec<&'a Declaration> = match &component.directives {
            None => declarations
                .iter()
                .filter(|decl| decl.as_directive().is_some())
                .collect(),
            Some(names) => names
                .iter()
                .map(|name| {
                    declarations
                        .iter()
                        .find(|decl| decl.name() == name && decl.as_directive().is_some())
                        .ok_or_else(|| {
                            CompileError::resolution(
                                format!(
                                    "Unknown directive '{}' in the directives of {}",
                                    name,
                                    component.name()
                                ),
                                None,
                            )
                        })
                })
                .collect::<Result<_>>()?,
        };

        for decl in visible {
            let directive = match decl {
                Declaration::Component(meta) => DirectiveRef {
                    meta: &meta.directive,
                    is_component: true,
                },
                Declaration::Directive(meta) => DirectiveRef {
                    meta,
                    is_component: false,
                },
                Declaration::Pipe(_) => continue,
            };
            registry.add_directive(directive)?;
        }

        let visible_pipes: Vec<&'a R3PipeMetadata> = match &component.pipes {
            None => declarations
                .iter()
                .filter_map(|decl| match decl {
                    Declaration::Pipe(meta) => Some(meta),
                    _ => None,
                })
                .collect(),
            Some(names) => names
                .iter()
                .map(|name| {
                    declarations
                        .iter()
                        .find_map(|decl| match decl {
                            Declaration::Pipe(meta) if &meta.name == name => Some(meta),
                            _ => None,
                        })
                        .ok_or_else(|| {
                            CompileError::resolution(
                                format!("Unknown pipe '{}' in the pipes of {}", name, component.name()),
                                None,
                            )
                        })
                })
                .collect::<Result<_>>()?,
        };
        for pipe in visible_pipes {
            registry.add_pipe(pipe);
        }

        debug!(
            component = %component.name(),
            directives = registry.matcher.len(),
            pipes = registry.pipes.len(),
            "built directive registry"
        );
        Ok(registry)
    }

    /// Registers a directive. Directives without a selector can never match and are
    /// skipped.
    pub fn add_directive(&mut self, directive: DirectiveRef<'a>) -> Result<()> {
        self.directive_names.insert(directive.name().to_string());
        let selector = match directive.meta.selector.as_deref() {
            Some(selector) if !selector.trim().is_empty() => selector,
            _ => return Ok(()),
        };
        let css_selectors = CssSelector::parse(selector).map_err(|err| {
            CompileError::resolution(
                format!("Invalid selector '{}' on {}: {}", selector, directive.name(), err),
                None,
            )
        })?;
        self.matcher.add_selectables(css_selectors, directive);
        Ok(())
    }

    pub fn add_pipe(&mut self, pipe: &'a R3PipeMetadata) {
        self.pipes.entry(pipe.pipe_name.clone()).or_insert(pipe);
    }

    pub fn pipe(&self, pipe_name: &str) -> Option<&'a R3PipeMetadata> {
        self.pipes.get(pipe_name).copied()
    }

    /// The directive types a view query of the template may target.
    pub fn directive_names(&self) -> &HashSet<String> {
        &self.directive_names
    }

    /// All directives whose selector matches `element`, in declaration order.
    ///
    /// More than one matching component is a resolution error.
    pub fn match_directives(&self, element: &CssSelector) -> Result<MatchedDirectives<'a>> {
        let mut matched = MatchedDirectives::default();
        for directive in self.matcher.match_all(element) {
            if directive.is_component {
                if let Some(existing) = matched.component {
                    return Err(CompileError::resolution(
                        format!(
                            "More than one component matched on this element: {} and {}",
                            existing.name(),
                            directive.name()
                        ),
                        None,
                    ));
                }
                matched.component = Some(*directive);
            } else {
                matched.directives.push(*directive);
            }
        }
        Ok(matched)
    }
}

impl<'a> Default for DirectiveRegistry<'a> {
    fn default() -> Self {
        Self::new()
    }
}
