//! View scopes, slot allocation and template variable resolution.
//!
//! Every template level (the component view and each embedded view) owns one
//! [`ViewScope`]. Scopes live on a [`ScopeStack`] while the emitter walks the tree:
//! a nested view can read the names of every enclosing scope, an enclosing scope never
//! sees the names of a nested one.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::util::CONTEXT_NAME;
use crate::error::{CompileError, Result};
use crate::output::output_ast as o;
use crate::parse_util::ParseSourceSpan;
use crate::render3::r3_identifiers::Identifiers as R3;

static NESTED_CONTEXT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ctx\d+$").unwrap());

/// Names generated code relies on. Template variables and references may not use them.
const RESERVED_NAMES: &[&str] = &["ctx", "cm", "$event", "this", "_t"];

pub fn is_reserved_name(name: &str) -> bool {
    RESERVED_NAMES.contains(&name) || NESTED_CONTEXT_RE.is_match(name)
}

/// What occupies a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element { tag: String },
    Text,
    /// Host of an embedded view.
    Container,
    /// Directive instance living on the node at `host`.
    Directive { name: String, host: usize },
    Pipe { name: String },
    Query,
    ProjectionDef,
    Projection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    pub slot: usize,
    pub kind: NodeKind,
}

/// Hands out the dense slot indices of one view.
#[derive(Debug, Clone, Default)]
pub struct SlotAllocator {
    records: Vec<NodeRecord>,
}

impl SlotAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, kind: NodeKind) -> usize {
        let slot = self.records.len();
        self.records.push(NodeRecord { slot, kind });
        slot
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Checks that the allocated slots are exactly `0..len` with no index used twice.
    pub fn verify(&self) -> Result<()> {
        let mut seen = vec![false; self.records.len()];
        for record in &self.records {
            match seen.get_mut(record.slot) {
                Some(flag) if !*flag => *flag = true,
                Some(_) => {
                    return Err(CompileError::internal(format!(
                        "slot {} allocated twice",
                        record.slot
                    )))
                }
                None => {
                    return Err(CompileError::internal(format!(
                        "slot {} is out of range for a view with {} slots",
                        record.slot,
                        self.records.len()
                    )))
                }
            }
        }
        Ok(())
    }
}

/// What a template name stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableKind {
    /// Local reference. The slot is filled in when the node defining it is visited.
    Reference { slot: Option<usize> },
    /// Property of the embedded view context.
    Context { property: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableBinding {
    pub name: String,
    pub kind: VariableKind,
    pub used: bool,
}

/// Names and slots of one template level.
#[derive(Debug, Clone)]
pub struct ViewScope {
    /// Nesting depth, 0 for the component view.
    pub level: usize,
    /// Parameter holding this view's context: `ctx` at level 0, `ctx{level - 1}` below.
    pub context_name: String,
    pub allocator: SlotAllocator,
    bindings: IndexMap<String, VariableBinding>,
}

impl ViewScope {
    pub fn new(level: usize) -> Self {
        let context_name = if level == 0 {
            CONTEXT_NAME.to_string()
        } else {
            format!("{}{}", CONTEXT_NAME, level - 1)
        };
        ViewScope {
            level,
            context_name,
            allocator: SlotAllocator::new(),
            bindings: IndexMap::new(),
        }
    }

    fn declare(
        &mut self,
        name: &str,
        kind: VariableKind,
        span: Option<ParseSourceSpan>,
    ) -> Result<()> {
        if is_reserved_name(name) {
            return Err(CompileError::resolution(
                format!("'{}' is reserved and cannot be used as a template name", name),
                span,
            ));
        }
        if self.bindings.contains_key(name) {
            return Err(CompileError::resolution(
                format!("Duplicate template name '{}' in the same view", name),
                span,
            ));
        }
        self.bindings.insert(
            name.to_string(),
            VariableBinding {
                name: name.to_string(),
                kind,
                used: false,
            },
        );
        Ok(())
    }

    /// `const` declarations for every name read from this view or a nested one, in
    /// declaration order.
    pub fn declarations(&self) -> Result<Vec<o::Statement>> {
        let mut statements = Vec::new();
        for binding in self.bindings.values().filter(|b| b.used) {
            let value = match &binding.kind {
                VariableKind::Context { property } => {
                    o::variable(self.context_name.as_str()).prop(property.as_str())
                }
                VariableKind::Reference { slot: Some(slot) } => {
                    o::import_ref(R3::load()).call_fn(vec![o::literal(*slot)])
                }
                VariableKind::Reference { slot: None } => {
                    return Err(CompileError::internal(format!(
                        "reference '{}' was never attached to a node",
                        binding.name
                    )))
                }
            };
            statements.push(o::declare_var(
                binding.name.as_str(),
                Some(value),
                o::StmtModifier::Final,
            ));
        }
        Ok(statements)
    }
}

/// The scopes from the component view down to the view being emitted.
#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<ViewScope>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn push(&mut self) -> &mut ViewScope {
        let level = self.scopes.len();
        debug!(level, "entering view scope");
        self.scopes.push(ViewScope::new(level));
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    pub fn pop(&mut self) -> Result<ViewScope> {
        let scope = self
            .scopes
            .pop()
            .ok_or_else(|| CompileError::internal("popped a view scope that was never pushed"))?;
        debug!(level = scope.level, slots = scope.allocator.len(), "leaving view scope");
        Ok(scope)
    }

    pub fn current_mut(&mut self) -> Result<&mut ViewScope> {
        self.scopes
            .last_mut()
            .ok_or_else(|| CompileError::internal("no view scope is active"))
    }

    pub fn allocate(&mut self, kind: NodeKind) -> Result<usize> {
        Ok(self.current_mut()?.allocator.allocate(kind))
    }

    pub fn declare_reference(&mut self, name: &str, span: Option<ParseSourceSpan>) -> Result<()> {
        self.current_mut()?
            .declare(name, VariableKind::Reference { slot: None }, span)
    }

    /// Declares a template variable reading `property` from the current view context.
    /// An empty property means `$implicit`.
    pub fn declare_variable(
        &mut self,
        name: &str,
        property: &str,
        span: Option<ParseSourceSpan>,
    ) -> Result<()> {
        let property = if property.is_empty() {
            "$implicit"
        } else {
            property
        };
        self.current_mut()?.declare(
            name,
            VariableKind::Context {
                property: property.to_string(),
            },
            span,
        )
    }

    /// Points a reference declared in the current view at `slot`.
    pub fn attach_reference(&mut self, name: &str, slot: usize) -> Result<()> {
        let scope = self.current_mut()?;
        match scope.bindings.get_mut(name) {
            Some(VariableBinding {
                kind: VariableKind::Reference { slot: target },
                ..
            }) => {
                *target = Some(slot);
                Ok(())
            }
            _ => Err(CompileError::internal(format!(
                "reference '{}' was not declared in the current view",
                name
            ))),
        }
    }

    /// Resolves `name` innermost scope first and marks it used so the defining view
    /// declares it.
    pub fn lookup(&mut self, name: &str) -> Option<o::Expression> {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(binding) = scope.bindings.get_mut(name) {
                binding.used = true;
                return Some(o::variable(name));
            }
        }
        None
    }

    /// Whether `name` is visible from the current view, without marking it used.
    pub fn is_visible(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.bindings.contains_key(name))
    }
}
