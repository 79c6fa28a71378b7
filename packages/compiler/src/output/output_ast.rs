//! Output AST Module
//!
//! The JavaScript-shaped tree the compiler builds before printing. Instruction calls,
//! hoisted constants and definition objects are all expressed with these nodes.

///// Expressions

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Minus,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Equals,
    NotEquals,
    Assign,
    Identical,
    NotIdentical,
    Minus,
    Plus,
    Divide,
    Multiply,
    Modulo,
    And,
    Or,
    Lower,
    LowerEquals,
    Bigger,
    BiggerEquals,
    NullishCoalesce,
}

impl BinaryOperator {
    /// Maps a template expression operator to its output counterpart.
    pub fn from_template_operator(op: &str) -> Option<BinaryOperator> {
        let operator = match op {
            "==" => BinaryOperator::Equals,
            "!=" => BinaryOperator::NotEquals,
            "===" => BinaryOperator::Identical,
            "!==" => BinaryOperator::NotIdentical,
            "-" => BinaryOperator::Minus,
            "+" => BinaryOperator::Plus,
            "/" => BinaryOperator::Divide,
            "*" => BinaryOperator::Multiply,
            "%" => BinaryOperator::Modulo,
            "&&" => BinaryOperator::And,
            "||" => BinaryOperator::Or,
            "<" => BinaryOperator::Lower,
            "<=" => BinaryOperator::LowerEquals,
            ">" => BinaryOperator::Bigger,
            ">=" => BinaryOperator::BiggerEquals,
            "??" => BinaryOperator::NullishCoalesce,
            _ => return None,
        };
        Some(operator)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    ReadVar(ReadVarExpr),
    WriteVar(WriteVarExpr),
    WriteKey(WriteKeyExpr),
    WriteProp(WritePropExpr),
    InvokeFn(InvokeFunctionExpr),
    Instantiate(InstantiateExpr),
    Literal(LiteralExpr),
    External(ExternalExpr),
    Conditional(ConditionalExpr),
    NotExpr(NotExpr),
    Unary(UnaryOperatorExpr),
    Fn(FunctionExpr),
    ArrowFn(ArrowFunctionExpr),
    BinaryOp(BinaryOperatorExpr),
    ReadProp(ReadPropExpr),
    ReadKey(ReadKeyExpr),
    LiteralArray(LiteralArrayExpr),
    LiteralMap(LiteralMapExpr),
    CommaExpr(CommaExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadVarExpr {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriteVarExpr {
    pub name: String,
    pub value: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriteKeyExpr {
    pub receiver: Box<Expression>,
    pub index: Box<Expression>,
    pub value: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WritePropExpr {
    pub receiver: Box<Expression>,
    pub name: String,
    pub value: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvokeFunctionExpr {
    pub fn_: Box<Expression>,
    pub args: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstantiateExpr {
    pub class_expr: Box<Expression>,
    pub args: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralExpr {
    pub value: LiteralValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Null,
    Undefined,
    String(String),
    Number(f64),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExternalExpr {
    pub value: ExternalReference,
}

/// A symbol imported from another module, e.g. a runtime instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExternalReference {
    pub module_name: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalExpr {
    pub condition: Box<Expression>,
    pub true_case: Box<Expression>,
    pub false_case: Option<Box<Expression>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotExpr {
    pub condition: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryOperatorExpr {
    pub operator: UnaryOperator,
    pub expr: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnParam {
    pub name: String,
}

impl FnParam {
    pub fn new(name: impl Into<String>) -> Self {
        FnParam { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionExpr {
    pub params: Vec<FnParam>,
    pub statements: Vec<Statement>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrowFunctionExpr {
    pub params: Vec<FnParam>,
    pub body: ArrowFunctionBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrowFunctionBody {
    Expression(Box<Expression>),
    Statements(Vec<Statement>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOperatorExpr {
    pub operator: BinaryOperator,
    pub lhs: Box<Expression>,
    pub rhs: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadPropExpr {
    pub receiver: Box<Expression>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadKeyExpr {
    pub receiver: Box<Expression>,
    pub index: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralArrayExpr {
    pub entries: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralMapEntry {
    pub key: String,
    pub value: Box<Expression>,
    pub quoted: bool,
}

impl LiteralMapEntry {
    pub fn new(key: impl Into<String>, value: Expression, quoted: bool) -> Self {
        LiteralMapEntry {
            key: key.into(),
            value: Box::new(value),
            quoted,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralMapExpr {
    pub entries: Vec<LiteralMapEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommaExpr {
    pub parts: Vec<Expression>,
}

///// Statements

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StmtModifier {
    None,
    Final,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    DeclareVar(DeclareVarStmt),
    DeclareFn(DeclareFunctionStmt),
    Expression(ExpressionStatement),
    Return(ReturnStatement),
    IfStmt(IfStmt),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclareVarStmt {
    pub name: String,
    pub value: Option<Box<Expression>>,
    pub modifiers: StmtModifier,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclareFunctionStmt {
    pub name: String,
    pub params: Vec<FnParam>,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStatement {
    pub expr: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    pub value: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Box<Expression>,
    pub true_case: Vec<Statement>,
    pub false_case: Vec<Statement>,
}

// Helper functions for creating common expressions
pub fn variable(name: impl Into<String>) -> Expression {
    Expression::ReadVar(ReadVarExpr { name: name.into() })
}

pub fn literal(value: impl Into<LiteralValue>) -> Expression {
    Expression::Literal(LiteralExpr {
        value: value.into(),
    })
}

pub fn literal_arr(values: Vec<Expression>) -> Expression {
    Expression::LiteralArray(LiteralArrayExpr { entries: values })
}

pub fn literal_map(entries: Vec<LiteralMapEntry>) -> Expression {
    Expression::LiteralMap(LiteralMapExpr { entries })
}

pub fn import_ref(id: ExternalReference) -> Expression {
    Expression::External(ExternalExpr { value: id })
}

pub fn import_expr(module_name: impl Into<String>, name: impl Into<String>) -> Expression {
    import_ref(ExternalReference {
        module_name: Some(module_name.into()),
        name: Some(name.into()),
    })
}

pub fn not(expr: Expression) -> Expression {
    Expression::NotExpr(NotExpr {
        condition: Box::new(expr),
    })
}

pub fn fn_expr(params: Vec<FnParam>, statements: Vec<Statement>, name: Option<String>) -> Expression {
    Expression::Fn(FunctionExpr {
        params,
        statements,
        name,
    })
}

pub fn arrow_fn(params: Vec<FnParam>, body: ArrowFunctionBody) -> Expression {
    Expression::ArrowFn(ArrowFunctionExpr { params, body })
}

pub fn null_expr() -> Expression {
    literal(LiteralValue::Null)
}

pub fn declare_var(name: impl Into<String>, value: Option<Expression>, modifiers: StmtModifier) -> Statement {
    Statement::DeclareVar(DeclareVarStmt {
        name: name.into(),
        value: value.map(Box::new),
        modifiers,
    })
}

pub fn return_stmt(value: Expression) -> Statement {
    Statement::Return(ReturnStatement {
        value: Box::new(value),
    })
}

pub fn if_stmt(condition: Expression, true_case: Vec<Statement>) -> Statement {
    Statement::IfStmt(IfStmt {
        condition: Box::new(condition),
        true_case,
        false_case: Vec::new(),
    })
}

// Implement conversions
impl From<String> for LiteralValue {
    fn from(s: String) -> Self {
        LiteralValue::String(s)
    }
}

impl From<&str> for LiteralValue {
    fn from(s: &str) -> Self {
        LiteralValue::String(s.to_string())
    }
}

impl From<f64> for LiteralValue {
    fn from(n: f64) -> Self {
        LiteralValue::Number(n)
    }
}

impl From<usize> for LiteralValue {
    fn from(n: usize) -> Self {
        LiteralValue::Number(n as f64)
    }
}

impl From<bool> for LiteralValue {
    fn from(b: bool) -> Self {
        LiteralValue::Bool(b)
    }
}

impl Expression {
    pub fn prop(&self, name: impl Into<String>) -> Expression {
        Expression::ReadProp(ReadPropExpr {
            receiver: Box::new(self.clone()),
            name: name.into(),
        })
    }

    pub fn key(&self, index: Expression) -> Expression {
        Expression::ReadKey(ReadKeyExpr {
            receiver: Box::new(self.clone()),
            index: Box::new(index),
        })
    }

    pub fn call_fn(&self, params: Vec<Expression>) -> Expression {
        Expression::InvokeFn(InvokeFunctionExpr {
            fn_: Box::new(self.clone()),
            args: params,
        })
    }

    pub fn instantiate(&self, params: Vec<Expression>) -> Expression {
        Expression::Instantiate(InstantiateExpr {
            class_expr: Box::new(self.clone()),
            args: params,
        })
    }

    pub fn conditional(&self, true_case: Expression, false_case: Option<Expression>) -> Expression {
        Expression::Conditional(ConditionalExpr {
            condition: Box::new(self.clone()),
            true_case: Box::new(true_case),
            false_case: false_case.map(Box::new),
        })
    }

    pub fn binary(&self, operator: BinaryOperator, rhs: Expression) -> Expression {
        Expression::BinaryOp(BinaryOperatorExpr {
            operator,
            lhs: Box::new(self.clone()),
            rhs: Box::new(rhs),
        })
    }

    pub fn and(&self, rhs: Expression) -> Expression {
        self.binary(BinaryOperator::And, rhs)
    }

    pub fn or(&self, rhs: Expression) -> Expression {
        self.binary(BinaryOperator::Or, rhs)
    }

    pub fn equals(&self, rhs: Expression) -> Expression {
        self.binary(BinaryOperator::Equals, rhs)
    }

    /// Creates an assignment to this expression. Reads of variables, properties and keys
    /// become the matching write node; anything else falls back to a plain `=` operator.
    pub fn set(&self, value: Expression) -> Expression {
        match self {
            Expression::ReadVar(read_var) => Expression::WriteVar(WriteVarExpr {
                name: read_var.name.clone(),
                value: Box::new(value),
            }),
            Expression::ReadProp(read_prop) => Expression::WriteProp(WritePropExpr {
                receiver: read_prop.receiver.clone(),
                name: read_prop.name.clone(),
                value: Box::new(value),
            }),
            Expression::ReadKey(read_key) => Expression::WriteKey(WriteKeyExpr {
                receiver: read_key.receiver.clone(),
                index: read_key.index.clone(),
                value: Box::new(value),
            }),
            _ => self.binary(BinaryOperator::Assign, value),
        }
    }

    pub fn to_stmt(&self) -> Statement {
        Statement::Expression(ExpressionStatement {
            expr: Box::new(self.clone()),
        })
    }

    pub fn into_stmt(self) -> Statement {
        Statement::Expression(ExpressionStatement {
            expr: Box::new(self),
        })
    }

    /// Whether the expression is made only of literal values.
    pub fn is_constant(&self) -> bool {
        match self {
            Expression::Literal(_) => true,
            Expression::LiteralArray(arr) => arr.entries.iter().all(Expression::is_constant),
            Expression::LiteralMap(map) => map.entries.iter().all(|e| e.value.is_constant()),
            _ => false,
        }
    }

    pub fn is_primitive_literal(&self) -> bool {
        matches!(self, Expression::Literal(_))
    }

    /// Rewrites every sub-expression in post order.
    pub fn transform(&mut self, f: &mut dyn FnMut(&mut Expression)) {
        match self {
            Expression::ReadVar(_) | Expression::Literal(_) | Expression::External(_) => {}
            Expression::WriteVar(e) => e.value.transform(f),
            Expression::WriteKey(e) => {
                e.receiver.transform(f);
                e.index.transform(f);
                e.value.transform(f);
            }
            Expression::WriteProp(e) => {
                e.receiver.transform(f);
                e.value.transform(f);
            }
            Expression::InvokeFn(e) => {
                e.fn_.transform(f);
                e.args.iter_mut().for_each(|a| a.transform(f));
            }
            Expression::Instantiate(e) => {
                e.class_expr.transform(f);
                e.args.iter_mut().for_each(|a| a.transform(f));
            }
            Expression::Conditional(e) => {
                e.condition.transform(f);
                e.true_case.transform(f);
                if let Some(false_case) = e.false_case.as_mut() {
                    false_case.transform(f);
                }
            }
            Expression::NotExpr(e) => e.condition.transform(f),
            Expression::Unary(e) => e.expr.transform(f),
            Expression::Fn(e) => e.statements.iter_mut().for_each(|s| s.transform_expressions(f)),
            Expression::ArrowFn(e) => match &mut e.body {
                ArrowFunctionBody::Expression(body) => body.transform(f),
                ArrowFunctionBody::Statements(stmts) => {
                    stmts.iter_mut().for_each(|s| s.transform_expressions(f))
                }
            },
            Expression::BinaryOp(e) => {
                e.lhs.transform(f);
                e.rhs.transform(f);
            }
            Expression::ReadProp(e) => e.receiver.transform(f),
            Expression::ReadKey(e) => {
                e.receiver.transform(f);
                e.index.transform(f);
            }
            Expression::LiteralArray(e) => e.entries.iter_mut().for_each(|a| a.transform(f)),
            Expression::LiteralMap(e) => e.entries.iter_mut().for_each(|en| en.value.transform(f)),
            Expression::CommaExpr(e) => e.parts.iter_mut().for_each(|a| a.transform(f)),
        }
        f(self);
    }

    /// Visits every sub-expression in pre order.
    pub fn walk(&self, f: &mut dyn FnMut(&Expression)) {
        f(self);
        match self {
            Expression::ReadVar(_) | Expression::Literal(_) | Expression::External(_) => {}
            Expression::WriteVar(e) => e.value.walk(f),
            Expression::WriteKey(e) => {
                e.receiver.walk(f);
                e.index.walk(f);
                e.value.walk(f);
            }
            Expression::WriteProp(e) => {
                e.receiver.walk(f);
                e.value.walk(f);
            }
            Expression::InvokeFn(e) => {
                e.fn_.walk(f);
                e.args.iter().for_each(|a| a.walk(f));
            }
            Expression::Instantiate(e) => {
                e.class_expr.walk(f);
                e.args.iter().for_each(|a| a.walk(f));
            }
            Expression::Conditional(e) => {
                e.condition.walk(f);
                e.true_case.walk(f);
                if let Some(false_case) = e.false_case.as_ref() {
                    false_case.walk(f);
                }
            }
            Expression::NotExpr(e) => e.condition.walk(f),
            Expression::Unary(e) => e.expr.walk(f),
            Expression::Fn(e) => e.statements.iter().for_each(|s| s.walk_expressions(f)),
            Expression::ArrowFn(e) => match &e.body {
                ArrowFunctionBody::Expression(body) => body.walk(f),
                ArrowFunctionBody::Statements(stmts) => {
                    stmts.iter().for_each(|s| s.walk_expressions(f))
                }
            },
            Expression::BinaryOp(e) => {
                e.lhs.walk(f);
                e.rhs.walk(f);
            }
            Expression::ReadProp(e) => e.receiver.walk(f),
            Expression::ReadKey(e) => {
                e.receiver.walk(f);
                e.index.walk(f);
            }
            Expression::LiteralArray(e) => e.entries.iter().for_each(|a| a.walk(f)),
            Expression::LiteralMap(e) => e.entries.iter().for_each(|en| en.value.walk(f)),
            Expression::CommaExpr(e) => e.parts.iter().for_each(|a| a.walk(f)),
        }
    }
}

impl Statement {
    pub fn transform_expressions(&mut self, f: &mut dyn FnMut(&mut Expression)) {
        match self {
            Statement::DeclareVar(stmt) => {
                if let Some(value) = stmt.value.as_mut() {
                    value.transform(f);
                }
            }
            Statement::DeclareFn(stmt) => stmt
                .statements
                .iter_mut()
                .for_each(|s| s.transform_expressions(f)),
            Statement::Expression(stmt) => stmt.expr.transform(f),
            Statement::Return(stmt) => stmt.value.transform(f),
            Statement::IfStmt(stmt) => {
                stmt.condition.transform(f);
                stmt.true_case
                    .iter_mut()
                    .chain(stmt.false_case.iter_mut())
                    .for_each(|s| s.transform_expressions(f));
            }
        }
    }

    pub fn walk_expressions(&self, f: &mut dyn FnMut(&Expression)) {
        match self {
            Statement::DeclareVar(stmt) => {
                if let Some(value) = stmt.value.as_ref() {
                    value.walk(f);
                }
            }
            Statement::DeclareFn(stmt) => stmt.statements.iter().for_each(|s| s.walk_expressions(f)),
            Statement::Expression(stmt) => stmt.expr.walk(f),
            Statement::Return(stmt) => stmt.value.walk(f),
            Statement::IfStmt(stmt) => {
                stmt.condition.walk(f);
                stmt.true_case
                    .iter()
                    .chain(stmt.false_case.iter())
                    .for_each(|s| s.walk_expressions(f));
            }
        }
    }
}
