//! Render3 View Utilities
//!
//! Shared names and small builders used by the view compiler.

use crate::directive_matching::{create_element_css_selector, CssSelector};
use crate::output::output_ast as o;
use crate::render3::r3_ast as t;

/// Name of the temporary to use during data binding
pub const TEMPORARY_NAME: &str = "_t";

/// Name of the context parameter passed into a template function
pub const CONTEXT_NAME: &str = "ctx";

/// Name of the creation mode flag passed into a template function
pub const CREATION_MODE_FLAG: &str = "cm";

/// Name of the event parameter of a listener function
pub const EVENT_NAME: &str = "$event";

/// Tag used when matching embedded view hosts against selectors
pub const NG_TEMPLATE_TAG_NAME: &str = "ng-template";

/// Declares `var _t;` the first time a binding needs the temporary.
#[derive(Debug, Default)]
pub struct TemporaryAllocator {
    declared: bool,
}

impl TemporaryAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> o::Expression {
        self.declared = true;
        o::variable(TEMPORARY_NAME)
    }

    pub fn is_used(&self) -> bool {
        self.declared
    }

    /// The declaration to put at the top of the function, if the temporary was used.
    pub fn declaration(&self) -> Option<o::Statement> {
        self.declared
            .then(|| o::declare_var(TEMPORARY_NAME, None, o::StmtModifier::None))
    }
}

/// Calls a runtime instruction.
pub fn invoke_instruction(
    reference: o::ExternalReference,
    args: Vec<o::Expression>,
) -> o::Expression {
    o::import_ref(reference).call_fn(args)
}

/// Drops trailing `null` arguments so optional instruction parameters can be omitted.
pub fn trim_trailing_nulls(mut args: Vec<o::Expression>) -> Vec<o::Expression> {
    while matches!(
        args.last(),
        Some(o::Expression::Literal(o::LiteralExpr {
            value: o::LiteralValue::Null,
            ..
        }))
    ) {
        args.pop();
    }
    args
}

/// Ordered key/value pairs of a definition object. Keys set to `None` are left out.
#[derive(Debug, Clone, Default)]
pub struct DefinitionMap {
    values: Vec<o::LiteralMapEntry>,
}

impl DefinitionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: Option<o::Expression>) {
        if let Some(value) = value {
            if let Some(existing) = self.values.iter_mut().find(|entry| entry.key == key) {
                existing.value = Box::new(value);
            } else {
                self.values.push(o::LiteralMapEntry::new(key, value, false));
            }
        }
    }

    pub fn to_literal_map(self) -> o::Expression {
        o::literal_map(self.values)
    }
}

/// `{classProperty: 'publicName', ...}`, or `None` for an empty map.
pub fn map_to_expression<'a>(
    map: impl IntoIterator<Item = (&'a String, &'a String)>,
) -> Option<o::Expression> {
    let entries: Vec<o::LiteralMapEntry> = map
        .into_iter()
        .map(|(key, value)| o::LiteralMapEntry::new(key.as_str(), o::literal(value.as_str()), false))
        .collect();
    if entries.is_empty() {
        None
    } else {
        Some(o::literal_map(entries))
    }
}

/// Flat `[name, value, name, value, ...]` list of static attributes.
pub fn attributes_array(attributes: &[t::TextAttribute]) -> Option<o::Expression> {
    if attributes.is_empty() {
        return None;
    }
    let mut entries = Vec::with_capacity(attributes.len() * 2);
    for attr in attributes {
        entries.push(o::literal(attr.name.as_str()));
        entries.push(o::literal(attr.value.as_str()));
    }
    Some(o::literal_arr(entries))
}

/// The selector an element exposes for directive matching: its tag, static attributes
/// and the names of its property inputs and outputs.
pub fn element_css_selector(element: &t::Element) -> CssSelector {
    create_element_css_selector(
        &element.name,
        element
            .attributes
            .iter()
            .map(|attr| (attr.name.as_str(), attr.value.as_str())),
        element
            .inputs
            .iter()
            .filter(|input| input.type_ == t::BindingType::Property)
            .map(|input| input.name.as_str())
            .chain(element.outputs.iter().map(|output| output.name.as_str())),
    )
}

/// Embedded view hosts match as `ng-template`, with the structural shorthand attributes
/// included.
pub fn template_css_selector(template: &t::Template) -> CssSelector {
    let text_attrs = template
        .attributes
        .iter()
        .chain(template.template_attrs.iter().filter_map(|attr| match attr {
            t::TemplateAttr::Text(text) => Some(text),
            t::TemplateAttr::Bound(_) => None,
        }))
        .map(|attr| (attr.name.as_str(), attr.value.as_str()));
    let bound_names = template
        .inputs
        .iter()
        .filter(|input| input.type_ == t::BindingType::Property)
        .chain(template.template_attrs.iter().filter_map(|attr| match attr {
            t::TemplateAttr::Bound(bound) => Some(bound),
            t::TemplateAttr::Text(_) => None,
        }))
        .map(|input| input.name.as_str())
        .chain(template.outputs.iter().map(|output| output.name.as_str()));
    create_element_css_selector(NG_TEMPLATE_TAG_NAME, text_attrs, bound_names)
}
