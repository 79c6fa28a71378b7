//! Render3 Utilities
//!
//! Shapes shared by the definition compilers.

use crate::output::output_ast as o;

/// Result of compiling one definition (component, directive or pipe).
#[derive(Debug, Clone)]
pub struct R3CompiledExpression {
    /// The `ɵdefine*({...})` call.
    pub expression: o::Expression,
    /// Statements that have to precede the definition in the output.
    pub statements: Vec<o::Statement>,
}

impl R3CompiledExpression {
    pub fn new(expression: o::Expression, statements: Vec<o::Statement>) -> Self {
        R3CompiledExpression {
            expression,
            statements,
        }
    }

    /// `<Type>.<property> = <expression>;`
    pub fn into_definition_statement(self, type_name: &str, property: &str) -> Vec<o::Statement> {
        let mut statements = self.statements;
        statements.push(
            o::variable(type_name)
                .prop(property)
                .set(self.expression)
                .into_stmt(),
        );
        statements
    }
}
