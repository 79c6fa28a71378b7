//! Content projection
//!
//! A component template with `<ng-content>` insertion points declares its projection
//! slots once with `ɵpD`. Slot 0 is the default slot that receives everything no explicit
//! selector claims; each distinct explicit selector gets the next index in document order.

use indexmap::IndexMap;

use super::util::invoke_instruction;
use crate::constant_pool::ConstantPool;
use crate::directive_matching::CssSelector;
use crate::error::{CompileError, Result};
use crate::output::output_ast as o;
use crate::render3::r3_ast as t;
use crate::render3::r3_identifiers::Identifiers as R3;

/// Projection slots of one component template.
#[derive(Debug, Clone, Default)]
pub struct ProjectionDef {
    /// Explicit selectors in first-use order. The slot index is the position plus one.
    selectors: IndexMap<String, Vec<CssSelector>>,
}

impl ProjectionDef {
    /// Collects the insertion points of `nodes`, embedded views included. `None` when the
    /// template has no insertion point at all.
    pub fn collect(nodes: &[t::R3Node]) -> Result<Option<ProjectionDef>> {
        let mut contents = Vec::new();
        t::walk_nodes(nodes, &mut |node| {
            if let t::R3Node::Content(content) = node {
                contents.push(content);
            }
        });
        if contents.is_empty() {
            return Ok(None);
        }

        let mut def = ProjectionDef::default();
        for content in contents {
            if content.is_wildcard() {
                continue;
            }
            let selector = content.selector.trim();
            if def.selectors.contains_key(selector) {
                continue;
            }
            let parsed = CssSelector::parse(selector).map_err(|err| {
                CompileError::resolution(
                    format!("Invalid projection selector '{}': {}", selector, err),
                    None,
                )
            })?;
            def.selectors.insert(selector.to_string(), parsed);
        }
        Ok(Some(def))
    }

    /// The projection slot an insertion point surfaces.
    pub fn index_of(&self, content: &t::Content) -> usize {
        if content.is_wildcard() {
            return 0;
        }
        self.selectors
            .get_index_of(content.selector.trim())
            .map_or(0, |index| index + 1)
    }

    /// `ɵpD(slot, table)`. The selector table is hoisted and left out when every insertion
    /// point uses the default slot.
    pub fn declaration(&self, slot: usize, constant_pool: &mut ConstantPool) -> Result<o::Statement> {
        let mut args = vec![o::literal(slot)];
        if !self.selectors.is_empty() {
            let mut table = Vec::with_capacity(self.selectors.len());
            for (source, selectors) in &self.selectors {
                let list = CssSelector::to_r3_selector_list(selectors, source).map_err(|err| {
                    CompileError::resolution(
                        format!("Invalid projection selector '{}': {}", source, err),
                        None,
                    )
                })?;
                table.push(list);
            }
            args.push(constant_pool.get_const_literal(o::literal_arr(table)));
        }
        Ok(invoke_instruction(R3::projection_def(), args).into_stmt())
    }
}

/// `ɵP(slot, pDSlot, index)`, the index left out for the default slot.
///
/// `slot` belongs to the view being emitted. `pDSlot` always addresses the `ɵpD` of the
/// component view, also from inside an embedded view: the runtime reads the projection
/// definition from the view of the component host, not from the current view.
pub fn insertion_point(slot: usize, def_slot: usize, index: usize) -> o::Statement {
    let mut args = vec![o::literal(slot), o::literal(def_slot)];
    if index > 0 {
        args.push(o::literal(index));
    }
    invoke_instruction(R3::projection(), args).into_stmt()
}
