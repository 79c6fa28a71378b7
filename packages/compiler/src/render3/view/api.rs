//! Render3 View API
//!
//! Metadata handed to the compiler by the external declaration extractor, one
//! [`CompilationUnit`] per source file.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::render3::r3_ast as t;
use crate::render3::r3_factory::R3DependencyMetadata;

/// Information needed to compile a directive for the render3 runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct R3DirectiveMetadata {
    /// Name of the directive type.
    pub name: String,
    /// Unparsed selector of the directive, or `None` if there was no selector.
    #[serde(default)]
    pub selector: Option<String>,
    /// Reference names under which the directive is exported in a template.
    #[serde(default)]
    pub export_as: Option<Vec<String>>,
    /// A mapping of inputs from class property names to binding property names.
    #[serde(default)]
    pub inputs: IndexMap<String, String>,
    /// A mapping of outputs from class property names to binding property names.
    #[serde(default)]
    pub outputs: IndexMap<String, String>,
    /// Dependencies of the directive's constructor.
    #[serde(default)]
    pub deps: Vec<R3DependencyMetadata>,
    /// Information about the content queries made by the directive.
    #[serde(default)]
    pub queries: Vec<R3QueryMetadata>,
    /// Information about usage of specific lifecycle events.
    #[serde(default)]
    pub lifecycle: R3LifecycleMetadata,
}

impl R3DirectiveMetadata {
    pub fn new(name: impl Into<String>, selector: Option<&str>) -> Self {
        R3DirectiveMetadata {
            name: name.into(),
            selector: selector.map(str::to_string),
            export_as: None,
            inputs: IndexMap::new(),
            outputs: IndexMap::new(),
            deps: Vec::new(),
            queries: Vec::new(),
            lifecycle: R3LifecycleMetadata::default(),
        }
    }

    /// Whether any public input or output is named `name`.
    pub fn has_binding_property_name(&self, name: &str) -> bool {
        self.inputs.values().any(|public| public == name)
            || self.outputs.values().any(|public| public == name)
    }

    pub fn is_exported_as(&self, name: &str) -> bool {
        self.export_as
            .as_ref()
            .map_or(false, |names| names.iter().any(|n| n == name))
    }
}

/// Lifecycle metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct R3LifecycleMetadata {
    /// Whether the directive uses NgOnChanges.
    #[serde(default)]
    pub uses_on_changes: bool,
}

/// What a query looks for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum R3QueryPredicate {
    /// A directive or component type.
    Type(String),
    /// Local reference names declared in the template.
    Selectors(Vec<String>),
}

/// Information needed to compile a query (view or content).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct R3QueryMetadata {
    /// Name of the property on the class to update with query results.
    pub property_name: String,
    /// Whether to read only the first matching result, or an array of results.
    #[serde(default)]
    pub first: bool,
    pub predicate: R3QueryPredicate,
}

/// Template of a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct R3ComponentTemplate {
    /// Parsed nodes of the template.
    #[serde(default)]
    pub nodes: Vec<t::R3Node>,
    /// Template text, used to turn offsets into line and column for diagnostics.
    #[serde(default)]
    pub source: Option<String>,
    /// Where the template came from.
    #[serde(default)]
    pub url: String,
}

/// Information needed to compile a component for the render3 runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct R3ComponentMetadata {
    /// Base directive metadata.
    #[serde(flatten)]
    pub directive: R3DirectiveMetadata,
    /// Information about the component's template.
    pub template: R3ComponentTemplate,
    /// Information about the view queries made by the component.
    #[serde(default)]
    pub view_queries: Vec<R3QueryMetadata>,
    /// Names of the directives visible to the template in declaration order. `None` makes
    /// every directive and component of the unit visible.
    #[serde(default)]
    pub directives: Option<Vec<String>>,
    /// Names of the pipe types visible to the template. `None` makes every pipe of the
    /// unit visible.
    #[serde(default)]
    pub pipes: Option<Vec<String>>,
}

impl R3ComponentMetadata {
    pub fn name(&self) -> &str {
        &self.directive.name
    }
}

/// Information needed to compile a pipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct R3PipeMetadata {
    /// Name of the pipe type.
    pub name: String,
    /// Name the pipe is used under in templates.
    pub pipe_name: String,
    /// Whether the pipe is marked as pure.
    #[serde(default = "default_pure")]
    pub pure: bool,
    /// Dependencies of the pipe's constructor.
    #[serde(default)]
    pub deps: Vec<R3DependencyMetadata>,
}

fn default_pure() -> bool {
    true
}

/// A type declared in a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Declaration {
    Component(R3ComponentMetadata),
    Directive(R3DirectiveMetadata),
    Pipe(R3PipeMetadata),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Component(meta) => meta.name(),
            Declaration::Directive(meta) => &meta.name,
            Declaration::Pipe(meta) => &meta.name,
        }
    }

    /// Directive metadata of a component or directive declaration.
    pub fn as_directive(&self) -> Option<&R3DirectiveMetadata> {
        match self {
            Declaration::Component(meta) => Some(&meta.directive),
            Declaration::Directive(meta) => Some(meta),
            Declaration::Pipe(_) => None,
        }
    }
}

/// All declarations of one source file. Hoisted constants are shared inside a unit
/// and never across units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilationUnit {
    pub file_name: String,
    #[serde(default)]
    pub declarations: Vec<Declaration>,
}

impl CompilationUnit {
    pub fn new(file_name: impl Into<String>, declarations: Vec<Declaration>) -> Self {
        CompilationUnit {
            file_name: file_name.into(),
            declarations,
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
