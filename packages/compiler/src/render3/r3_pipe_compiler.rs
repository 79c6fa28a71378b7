//! Render3 Pipe Compiler
//!
//! `MyPipe.ngPipeDef = ɵdefinePipe({type, factory, pure})`.

use super::r3_factory::compile_factory_function;
use super::r3_identifiers::Identifiers as R3;
use super::util::R3CompiledExpression;
use super::view::api::R3PipeMetadata;
use super::view::util::DefinitionMap;
use crate::output::output_ast as o;

/// Compile a pipe from metadata
pub fn compile_pipe_from_metadata(metadata: &R3PipeMetadata) -> R3CompiledExpression {
    let mut definition_map = DefinitionMap::new();

    // e.g. `type: MyPipe`
    definition_map.set("type", Some(o::variable(metadata.name.as_str())));

    // e.g. `factory: function MyPipe_Factory() { return new MyPipe(); }`
    definition_map.set(
        "factory",
        Some(compile_factory_function(&metadata.name, &metadata.deps, vec![])),
    );

    // Impure pipes leave the flag out and the runtime treats them as impure.
    if metadata.pure {
        definition_map.set("pure", Some(o::literal(true)));
    }

    let expression = o::import_ref(R3::define_pipe()).call_fn(vec![definition_map.to_literal_map()]);
    R3CompiledExpression::new(expression, vec![])
}
