//! Edit-and-continue (EnC) support.
//!
//! Between two generations of a running program this crate decides which
//! definitions changed ([`SymbolChanges`]), how the new generation's
//! definitions map onto the previous one's ([`SymbolMatcher`],
//! [`DefinitionMap`]) and which local and hoisted storage slots can be
//! reused ([`EncVariableSlotAllocator`]).

mod baseline;
mod definition_map;
mod error;
pub mod generated_names;
mod local_info;
mod semantic_edit;
mod slot_allocator;
mod symbol_changes;
mod symbol_matcher;

#[cfg(test)]
#[path = "../tests/fixtures.rs"]
mod fixtures;

pub use baseline::{
    AddedOrChangedMethodInfo, AnonymousTypeValue, EditAndContinueMethodDebugInformation,
    EmitBaseline, GenerationDelta, LocalSlotMetadata, PeModule, SynthesizedMembers, TableSizes,
};
pub use definition_map::{
    DefinitionMap, MethodDefinitionEntry, SymbolDefinitionMap, create_local_slot_map,
    generate_method_map, get_local_info,
};
pub use error::EncError;
pub use local_info::{
    EncHoistedLocalInfo, EncLocalInfo, LocalDebugId, LocalDefinition, LocalSlotConstraints,
    LocalSlotDebugInfo, SynthesizedLocalKind,
};
pub use semantic_edit::{SemanticEdit, SemanticEditKind, SyntaxMap};
pub use slot_allocator::{EncVariableSlotAllocator, StateMachineSlots};
pub use symbol_changes::{SymbolChange, SymbolChanges, change_relevant_container};
pub use symbol_matcher::{CompilationSymbolMatcher, SymbolMatcher, merge_synthesized_members};
