//! Render3 AST
//!
//! Template nodes handed to the compiler by the external template parser. Structural
//! directives have already been desugared into [`Template`] nodes.

use serde::{Deserialize, Serialize};

use crate::expression_parser::ast::{ASTWithSource, AbsoluteSourceSpan};

/// Text node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub value: String,
    #[serde(default)]
    pub source_span: AbsoluteSourceSpan,
}

impl Text {
    pub fn new(value: impl Into<String>, source_span: AbsoluteSourceSpan) -> Self {
        Text {
            value: value.into(),
            source_span,
        }
    }
}

/// Bound text node. The value is an interpolation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundText {
    pub value: ASTWithSource,
    #[serde(default)]
    pub source_span: AbsoluteSourceSpan,
}

/// Text attribute in the template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAttribute {
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub source_span: AbsoluteSourceSpan,
}

impl TextAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        TextAttribute {
            name: name.into(),
            value: value.into(),
            source_span: AbsoluteSourceSpan::default(),
        }
    }
}

/// What a bound attribute writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingType {
    /// `[prop]="exp"`
    Property,
    /// `[attr.name]="exp"`
    Attribute,
    /// `[class.name]="cond"`
    Class,
    /// `[style.name.unit]="exp"`
    Style,
}

/// Bound attribute (`[name]="value"`, or an interpolated attribute)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundAttribute {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: BindingType,
    pub value: ASTWithSource,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub source_span: AbsoluteSourceSpan,
}

/// Event binding (`(name)="handler"`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundEvent {
    pub name: String,
    pub handler: ASTWithSource,
    #[serde(default)]
    pub source_span: AbsoluteSourceSpan,
}

/// Element node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<TextAttribute>,
    #[serde(default)]
    pub inputs: Vec<BoundAttribute>,
    #[serde(default)]
    pub outputs: Vec<BoundEvent>,
    #[serde(default)]
    pub children: Vec<R3Node>,
    #[serde(default)]
    pub references: Vec<Reference>,
    #[serde(default)]
    pub source_span: AbsoluteSourceSpan,
}

/// Attributes that came from the structural shorthand (`*ngFor="let x of xs"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TemplateAttr {
    Bound(BoundAttribute),
    Text(TextAttribute),
}

/// `<ng-template>` or a desugared structural directive host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(default)]
    pub tag_name: Option<String>,
    #[serde(default)]
    pub attributes: Vec<TextAttribute>,
    #[serde(default)]
    pub inputs: Vec<BoundAttribute>,
    #[serde(default)]
    pub outputs: Vec<BoundEvent>,
    #[serde(default)]
    pub template_attrs: Vec<TemplateAttr>,
    #[serde(default)]
    pub children: Vec<R3Node>,
    #[serde(default)]
    pub references: Vec<Reference>,
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default)]
    pub source_span: AbsoluteSourceSpan,
}

/// Content projection slot (`<ng-content select="...">`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default = "default_content_selector")]
    pub selector: String,
    #[serde(default)]
    pub attributes: Vec<TextAttribute>,
    #[serde(default)]
    pub source_span: AbsoluteSourceSpan,
}

fn default_content_selector() -> String {
    "*".to_string()
}

impl Content {
    pub fn name(&self) -> &str {
        "ng-content"
    }

    pub fn is_wildcard(&self) -> bool {
        let selector = self.selector.trim();
        selector.is_empty() || selector == "*"
    }
}

/// Template variable (`let-item`, `let i = index`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub source_span: AbsoluteSourceSpan,
}

/// Local reference (`#name` or `#name="exportAs"`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub source_span: AbsoluteSourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum R3Node {
    Text(Text),
    BoundText(BoundText),
    Element(Element),
    Template(Template),
    Content(Content),
}

impl R3Node {
    pub fn visit<V: Visitor>(&self, visitor: &mut V) -> V::Result {
        match self {
            R3Node::Text(node) => visitor.visit_text(node),
            R3Node::BoundText(node) => visitor.visit_bound_text(node),
            R3Node::Element(node) => visitor.visit_element(node),
            R3Node::Template(node) => visitor.visit_template(node),
            R3Node::Content(node) => visitor.visit_content(node),
        }
    }
}

pub trait Visitor {
    type Result;

    fn visit_element(&mut self, element: &Element) -> Self::Result;
    fn visit_template(&mut self, template: &Template) -> Self::Result;
    fn visit_content(&mut self, content: &Content) -> Self::Result;
    fn visit_text(&mut self, text: &Text) -> Self::Result;
    fn visit_bound_text(&mut self, text: &BoundText) -> Self::Result;
}

pub fn visit_all<V: Visitor>(visitor: &mut V, nodes: &[R3Node]) -> Vec<V::Result> {
    nodes.iter().map(|node| node.visit(visitor)).collect()
}

/// Calls `f` for every node of the tree in document pre-order, nested templates included.
pub fn walk_nodes<'a>(nodes: &'a [R3Node], f: &mut dyn FnMut(&'a R3Node)) {
    for node in nodes {
        f(node);
        match node {
            R3Node::Element(element) => walk_nodes(&element.children, f),
            R3Node::Template(template) => walk_nodes(&template.children, f),
            _ => {}
        }
    }
}
