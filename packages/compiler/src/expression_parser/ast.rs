/**
 * Template Expression AST
 *
 * Node types for bound template expressions as produced by the external expression
 * parser. The compiler only consumes this tree; every type is serde-deserializable so
 * units can be handed over as JSON.
 */

use serde::{Deserialize, Serialize};

/// Span relative to the start of the expression source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseSpan {
    pub start: usize,
    pub end: usize,
}

impl ParseSpan {
    pub fn new(start: usize, end: usize) -> Self {
        ParseSpan { start, end }
    }

    pub fn to_absolute(&self, absolute_offset: usize) -> AbsoluteSourceSpan {
        AbsoluteSourceSpan::new(absolute_offset + self.start, absolute_offset + self.end)
    }
}

/// Absolute source span for mapping back to source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsoluteSourceSpan {
    pub start: usize,
    pub end: usize,
}

impl AbsoluteSourceSpan {
    pub fn new(start: usize, end: usize) -> Self {
        AbsoluteSourceSpan { start, end }
    }
}

/// Visitor pattern for AST traversal
pub trait AstVisitor {
    type Result;

    fn visit_empty_expr(&mut self, ast: &EmptyExpr) -> Self::Result;
    fn visit_binary(&mut self, ast: &Binary) -> Self::Result;
    fn visit_chain(&mut self, ast: &Chain) -> Self::Result;
    fn visit_conditional(&mut self, ast: &Conditional) -> Self::Result;
    fn visit_implicit_receiver(&mut self, ast: &ImplicitReceiver) -> Self::Result;
    fn visit_this_receiver(&mut self, ast: &ThisReceiver) -> Self::Result;
    fn visit_interpolation(&mut self, ast: &Interpolation) -> Self::Result;
    fn visit_property_read(&mut self, ast: &PropertyRead) -> Self::Result;
    fn visit_safe_property_read(&mut self, ast: &SafePropertyRead) -> Self::Result;
    fn visit_keyed_read(&mut self, ast: &KeyedRead) -> Self::Result;
    fn visit_literal_primitive(&mut self, ast: &LiteralPrimitive) -> Self::Result;
    fn visit_literal_array(&mut self, ast: &LiteralArray) -> Self::Result;
    fn visit_literal_map(&mut self, ast: &LiteralMap) -> Self::Result;
    fn visit_call(&mut self, ast: &Call) -> Self::Result;
    fn visit_pipe(&mut self, ast: &BindingPipe) -> Self::Result;
    fn visit_prefix_not(&mut self, ast: &PrefixNot) -> Self::Result;
    fn visit_unary(&mut self, ast: &Unary) -> Self::Result;
    fn visit_non_null_assert(&mut self, ast: &NonNullAssert) -> Self::Result;
    fn visit_property_write(&mut self, ast: &PropertyWrite) -> Self::Result;
    fn visit_keyed_write(&mut self, ast: &KeyedWrite) -> Self::Result;
}

/// Main AST enum containing all node types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AST {
    EmptyExpr(EmptyExpr),
    ImplicitReceiver(ImplicitReceiver),
    ThisReceiver(ThisReceiver),
    Chain(Chain),
    Conditional(Conditional),
    PropertyRead(PropertyRead),
    SafePropertyRead(SafePropertyRead),
    KeyedRead(KeyedRead),
    BindingPipe(BindingPipe),
    LiteralPrimitive(LiteralPrimitive),
    LiteralArray(LiteralArray),
    LiteralMap(LiteralMap),
    Interpolation(Interpolation),
    Binary(Binary),
    PrefixNot(PrefixNot),
    Unary(Unary),
    NonNullAssert(NonNullAssert),
    Call(Call),
    PropertyWrite(PropertyWrite),
    KeyedWrite(KeyedWrite),
}

impl AST {
    pub fn visit<V: AstVisitor>(&self, visitor: &mut V) -> V::Result {
        match self {
            AST::EmptyExpr(ast) => visitor.visit_empty_expr(ast),
            AST::ImplicitReceiver(ast) => visitor.visit_implicit_receiver(ast),
            AST::ThisReceiver(ast) => visitor.visit_this_receiver(ast),
            AST::Chain(ast) => visitor.visit_chain(ast),
            AST::Conditional(ast) => visitor.visit_conditional(ast),
            AST::PropertyRead(ast) => visitor.visit_property_read(ast),
            AST::SafePropertyRead(ast) => visitor.visit_safe_property_read(ast),
            AST::KeyedRead(ast) => visitor.visit_keyed_read(ast),
            AST::BindingPipe(ast) => visitor.visit_pipe(ast),
            AST::LiteralPrimitive(ast) => visitor.visit_literal_primitive(ast),
            AST::LiteralArray(ast) => visitor.visit_literal_array(ast),
            AST::LiteralMap(ast) => visitor.visit_literal_map(ast),
            AST::Interpolation(ast) => visitor.visit_interpolation(ast),
            AST::Binary(ast) => visitor.visit_binary(ast),
            AST::PrefixNot(ast) => visitor.visit_prefix_not(ast),
            AST::Unary(ast) => visitor.visit_unary(ast),
            AST::NonNullAssert(ast) => visitor.visit_non_null_assert(ast),
            AST::Call(ast) => visitor.visit_call(ast),
            AST::PropertyWrite(ast) => visitor.visit_property_write(ast),
            AST::KeyedWrite(ast) => visitor.visit_keyed_write(ast),
        }
    }

    pub fn source_span(&self) -> AbsoluteSourceSpan {
        match self {
            AST::EmptyExpr(ast) => ast.source_span,
            AST::ImplicitReceiver(ast) => ast.source_span,
            AST::ThisReceiver(ast) => ast.source_span,
            AST::Chain(ast) => ast.source_span,
            AST::Conditional(ast) => ast.source_span,
            AST::PropertyRead(ast) => ast.source_span,
            AST::SafePropertyRead(ast) => ast.source_span,
            AST::KeyedRead(ast) => ast.source_span,
            AST::BindingPipe(ast) => ast.source_span,
            AST::LiteralPrimitive(ast) => ast.source_span(),
            AST::LiteralArray(ast) => ast.source_span,
            AST::LiteralMap(ast) => ast.source_span,
            AST::Interpolation(ast) => ast.source_span,
            AST::Binary(ast) => ast.source_span,
            AST::PrefixNot(ast) => ast.source_span,
            AST::Unary(ast) => ast.source_span,
            AST::NonNullAssert(ast) => ast.source_span,
            AST::Call(ast) => ast.source_span,
            AST::PropertyWrite(ast) => ast.source_span,
            AST::KeyedWrite(ast) => ast.source_span,
        }
    }

    /// `true` for receivers that stand for the component context.
    pub fn is_implicit_receiver(&self) -> bool {
        matches!(self, AST::ImplicitReceiver(_) | AST::ThisReceiver(_))
    }
}

/// Empty expression
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmptyExpr {
    #[serde(default)]
    pub span: ParseSpan,
    #[serde(default)]
    pub source_span: AbsoluteSourceSpan,
}

/// Implicit receiver (the component instance)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImplicitReceiver {
    #[serde(default)]
    pub span: ParseSpan,
    #[serde(default)]
    pub source_span: AbsoluteSourceSpan,
}

/// This receiver (explicit `this`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThisReceiver {
    #[serde(default)]
    pub span: ParseSpan,
    #[serde(default)]
    pub source_span: AbsoluteSourceSpan,
}

/// Chain of expressions (e.g., `a; b; c`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    #[serde(default)]
    pub span: ParseSpan,
    #[serde(default)]
    pub source_span: AbsoluteSourceSpan,
    pub expressions: Vec<Box<AST>>,
}

/// Ternary conditional (e.g., `condition ? true : false`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditional {
    #[serde(default)]
    pub span: ParseSpan,
    #[serde(default)]
    pub source_span: AbsoluteSourceSpan,
    pub condition: Box<AST>,
    pub true_exp: Box<AST>,
    pub false_exp: Box<AST>,
}

/// Property read (e.g., `obj.property`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRead {
    #[serde(default)]
    pub span: ParseSpan,
    #[serde(default)]
    pub source_span: AbsoluteSourceSpan,
    pub receiver: Box<AST>,
    pub name: String,
}

/// Property write (e.g., `obj.property = value`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyWrite {
    #[serde(default)]
    pub span: ParseSpan,
    #[serde(default)]
    pub source_span: AbsoluteSourceSpan,
    pub receiver: Box<AST>,
    pub name: String,
    pub value: Box<AST>,
}

/// Safe property read (e.g., `obj?.property`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafePropertyRead {
    #[serde(default)]
    pub span: ParseSpan,
    #[serde(default)]
    pub source_span: AbsoluteSourceSpan,
    pub receiver: Box<AST>,
    pub name: String,
}

/// Keyed read (e.g., `obj[key]`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyedRead {
    #[serde(default)]
    pub span: ParseSpan,
    #[serde(default)]
    pub source_span: AbsoluteSourceSpan,
    pub receiver: Box<AST>,
    pub key: Box<AST>,
}

/// Keyed write (e.g., `obj[key] = value`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyedWrite {
    #[serde(default)]
    pub span: ParseSpan,
    #[serde(default)]
    pub source_span: AbsoluteSourceSpan,
    pub receiver: Box<AST>,
    pub key: Box<AST>,
    pub value: Box<AST>,
}

/// Pipe binding (e.g., `value | pipeName:arg1:arg2`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingPipe {
    #[serde(default)]
    pub span: ParseSpan,
    #[serde(default)]
    pub source_span: AbsoluteSourceSpan,
    pub exp: Box<AST>,
    pub name: String,
    #[serde(default)]
    pub args: Vec<Box<AST>>,
}

/// Literal primitive (string, number, boolean, null)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "literalType")]
pub enum LiteralPrimitive {
    String {
        #[serde(default)]
        span: ParseSpan,
        #[serde(default)]
        source_span: AbsoluteSourceSpan,
        value: String,
    },
    Number {
        #[serde(default)]
        span: ParseSpan,
        #[serde(default)]
        source_span: AbsoluteSourceSpan,
        value: f64,
    },
    Boolean {
        #[serde(default)]
        span: ParseSpan,
        #[serde(default)]
        source_span: AbsoluteSourceSpan,
        value: bool,
    },
    Null {
        #[serde(default)]
        span: ParseSpan,
        #[serde(default)]
        source_span: AbsoluteSourceSpan,
    },
    Undefined {
        #[serde(default)]
        span: ParseSpan,
        #[serde(default)]
        source_span: AbsoluteSourceSpan,
    },
}

impl LiteralPrimitive {
    pub fn source_span(&self) -> AbsoluteSourceSpan {
        match self {
            LiteralPrimitive::String { source_span, .. }
            | LiteralPrimitive::Number { source_span, .. }
            | LiteralPrimitive::Boolean { source_span, .. }
            | LiteralPrimitive::Null { source_span, .. }
            | LiteralPrimitive::Undefined { source_span, .. } => *source_span,
        }
    }
}

/// Array literal (e.g., `[1, 2, 3]`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteralArray {
    #[serde(default)]
    pub span: ParseSpan,
    #[serde(default)]
    pub source_span: AbsoluteSourceSpan,
    pub expressions: Vec<Box<AST>>,
}

/// Map literal key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteralMapKey {
    pub key: String,
    #[serde(default)]
    pub quoted: bool,
}

/// Object literal (e.g., `{a: 1, b: 2}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteralMap {
    #[serde(default)]
    pub span: ParseSpan,
    #[serde(default)]
    pub source_span: AbsoluteSourceSpan,
    pub keys: Vec<LiteralMapKey>,
    pub values: Vec<Box<AST>>,
}

/// Binary operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binary {
    #[serde(default)]
    pub span: ParseSpan,
    #[serde(default)]
    pub source_span: AbsoluteSourceSpan,
    pub operation: String,
    pub left: Box<AST>,
    pub right: Box<AST>,
}

/// Prefix not operator (e.g., `!expr`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefixNot {
    #[serde(default)]
    pub span: ParseSpan,
    #[serde(default)]
    pub source_span: AbsoluteSourceSpan,
    pub expression: Box<AST>,
}

/// Unary operator (e.g., `+expr`, `-expr`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unary {
    #[serde(default)]
    pub span: ParseSpan,
    #[serde(default)]
    pub source_span: AbsoluteSourceSpan,
    pub operator: String,
    pub expr: Box<AST>,
}

/// Function or method call (e.g., `fn(a, b)`, `obj.method(a)`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    #[serde(default)]
    pub span: ParseSpan,
    #[serde(default)]
    pub source_span: AbsoluteSourceSpan,
    pub receiver: Box<AST>,
    #[serde(default)]
    pub args: Vec<Box<AST>>,
}

/// Non-null assertion (e.g., `expr!`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonNullAssert {
    #[serde(default)]
    pub span: ParseSpan,
    #[serde(default)]
    pub source_span: AbsoluteSourceSpan,
    pub expression: Box<AST>,
}

/// Interpolation (`a{{b}}c`): `strings` always has one more entry than `expressions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpolation {
    #[serde(default)]
    pub span: ParseSpan,
    #[serde(default)]
    pub source_span: AbsoluteSourceSpan,
    pub strings: Vec<String>,
    pub expressions: Vec<Box<AST>>,
}

/// An error reported by the expression parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParserError {
    pub message: String,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub err_location: String,
    #[serde(default)]
    pub span: Option<AbsoluteSourceSpan>,
}

impl ParserError {
    pub fn new(message: impl Into<String>, input: impl Into<String>, err_location: impl Into<String>) -> Self {
        ParserError {
            message: message.into(),
            input: input.into(),
            err_location: err_location.into(),
            span: None,
        }
    }
}

/// AST with source location info
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ASTWithSource {
    pub ast: Box<AST>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub absolute_offset: usize,
    #[serde(default)]
    pub errors: Vec<ParserError>,
}

impl ASTWithSource {
    pub fn new(
        ast: Box<AST>,
        source: Option<String>,
        location: String,
        absolute_offset: usize,
        errors: Vec<ParserError>,
    ) -> Self {
        ASTWithSource {
            ast,
            source,
            location,
            absolute_offset,
            errors,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The absolute span of the whole expression, falling back to the offset when the
    /// parser gave no span for the root node.
    pub fn absolute_span(&self) -> AbsoluteSourceSpan {
        let span = self.ast.source_span();
        if span.end > span.start {
            span
        } else {
            let len = self.source.as_ref().map_or(0, |s| s.len());
            AbsoluteSourceSpan::new(self.absolute_offset, self.absolute_offset + len)
        }
    }
}
