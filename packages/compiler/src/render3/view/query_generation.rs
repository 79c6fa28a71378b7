//! Render3 Query Generation
//!
//! View queries are declared in the component template and refreshed at the top of its
//! update block. Content queries are created by the directive factory next to the
//! instance and refreshed from the directive's `hostBindings` function.

use std::collections::HashSet;

use super::api::{R3QueryMetadata, R3QueryPredicate};
use super::util::{invoke_instruction, TemporaryAllocator, CONTEXT_NAME, TEMPORARY_NAME};
use crate::constant_pool::ConstantPool;
use crate::error::{CompileError, Result};
use crate::output::output_ast as o;
use crate::render3::r3_identifiers::Identifiers as R3;

const DIRECTIVE_INDEX: &str = "dirIndex";
const ELEMENT_INDEX: &str = "elIndex";

/// Get the query predicate expression.
///
/// Type predicates have to name one of `known_types` and are referenced directly.
/// Selector predicates are split on commas and hoisted as a constant array of names.
/// When `known_references` is given every name has to be a reference declared in the
/// template.
pub fn get_query_predicate(
    query: &R3QueryMetadata,
    constant_pool: &mut ConstantPool,
    known_types: &HashSet<String>,
    known_references: Option<&HashSet<String>>,
) -> Result<o::Expression> {
    match &query.predicate {
        R3QueryPredicate::Type(type_name) => {
            if !known_types.contains(type_name) {
                return Err(CompileError::resolution(
                    format!(
                        "Query '{}' targets '{}', which is not a visible directive",
                        query.property_name, type_name
                    ),
                    None,
                ));
            }
            Ok(o::variable(type_name.as_str()))
        }
        R3QueryPredicate::Selectors(selectors) => {
            let mut predicates = Vec::new();
            for selector in selectors {
                for token in selector.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                    if let Some(known) = known_references {
                        if !known.contains(token) {
                            return Err(CompileError::resolution(
                                format!(
                                    "Query '{}' selects '{}', which is not a reference in the template",
                                    query.property_name, token
                                ),
                                None,
                            ));
                        }
                    }
                    predicates.push(o::literal(token));
                }
            }
            Ok(constant_pool.get_const_literal(o::literal_arr(predicates)))
        }
    }
}

/// `ɵQ(slot, predicate, first)` in the creation block of the component view.
pub fn view_query_declaration(slot: usize, predicate: o::Expression, first: bool) -> o::Statement {
    invoke_instruction(
        R3::query(),
        vec![o::literal(slot), predicate, o::literal(first)],
    )
    .into_stmt()
}

/// `(ɵqR((_t = ɵld(slot))) && (ctx.prop = _t.first))`
pub fn view_query_refresh(
    slot: usize,
    query: &R3QueryMetadata,
    temporary: &mut TemporaryAllocator,
) -> o::Statement {
    let temporary = temporary.allocate();
    let load = invoke_instruction(R3::load(), vec![o::literal(slot)]);
    let refresh = invoke_instruction(R3::query_refresh(), vec![temporary.set(load)]);
    let result = if query.first {
        temporary.prop("first")
    } else {
        temporary
    };
    let assign = o::variable(CONTEXT_NAME)
        .prop(query.property_name.as_str())
        .set(result);
    refresh.and(assign).into_stmt()
}

/// `ɵQ(null, predicate, first)` for each content query, returned by the factory after
/// the directive instance.
pub fn content_query_creations(
    queries: &[R3QueryMetadata],
    constant_pool: &mut ConstantPool,
    known_types: &HashSet<String>,
) -> Result<Vec<o::Expression>> {
    queries
        .iter()
        .map(|query| {
            let predicate = get_query_predicate(query, constant_pool, known_types, None)?;
            Ok(invoke_instruction(
                R3::query(),
                vec![o::null_expr(), predicate, o::literal(query.first)],
            ))
        })
        .collect()
}

/// The `hostBindings` function that copies content query results onto the instance.
///
/// The factory result lives at `ɵld(dirIndex)`: the instance at index 0 and query `i` at
/// index `i + 1`.
pub fn content_query_host_bindings(
    type_name: &str,
    queries: &[R3QueryMetadata],
) -> Option<o::Expression> {
    if queries.is_empty() {
        return None;
    }

    let temporary = o::variable(TEMPORARY_NAME);
    let instance_array =
        || invoke_instruction(R3::load(), vec![o::variable(DIRECTIVE_INDEX)]);

    let mut statements = vec![o::declare_var(TEMPORARY_NAME, None, o::StmtModifier::None)];
    for (i, query) in queries.iter().enumerate() {
        let query_handle = instance_array().key(o::literal(i + 1));
        let refresh = invoke_instruction(R3::query_refresh(), vec![temporary.set(query_handle)]);
        let result = if query.first {
            temporary.key(o::literal(0usize))
        } else {
            temporary.clone()
        };
        let assign = instance_array()
            .key(o::literal(0usize))
            .prop(query.property_name.as_str())
            .set(result);
        statements.push(refresh.and(assign).into_stmt());
    }

    Some(o::fn_expr(
        vec![o::FnParam::new(DIRECTIVE_INDEX), o::FnParam::new(ELEMENT_INDEX)],
        statements,
        Some(format!("{}_HostBindings", type_name)),
    ))
}
