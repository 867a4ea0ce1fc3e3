//! Resolution of definitions to the metadata rows of earlier generations.

use crate::baseline::{EditAndContinueMethodDebugInformation, EmitBaseline, LocalSlotMetadata};
use crate::generated_names::{self, GeneratedNameKind};
use crate::local_info::{EncHoistedLocalInfo, EncLocalInfo, LocalDefinition};
use crate::semantic_edit::{SemanticEdit, SemanticEditKind, SyntaxMap};
use crate::slot_allocator::{EncVariableSlotAllocator, StateMachineSlots};
use crate::symbol_matcher::SymbolMatcher;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, trace};
use xsym_symbols::{
    EntityHandle, EventDefinitionHandle, EventRef, FieldDefinitionHandle, FieldRef,
    MethodDefinitionHandle, MethodRef, NamedTypeRef, PropertyDefinitionHandle, PropertyRef,
    SymbolRef, TypeDefinitionHandle,
};

/// What the method map knows about an updated method.
#[derive(Clone)]
pub struct MethodDefinitionEntry {
    /// The method as it was in the previous generation.
    pub previous_method: MethodRef,
    pub preserve_local_variables: bool,
    pub syntax_map: Option<SyntaxMap>,
}

impl fmt::Debug for MethodDefinitionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDefinitionEntry")
            .field("previous_method", &self.previous_method.name())
            .field("preserve_local_variables", &self.preserve_local_variables)
            .field("has_syntax_map", &self.syntax_map.is_some())
            .finish()
    }
}

/// Keys every updated method of `edits` by its new-generation symbol.
/// Inserts, deletes and non-method updates have no entry.
pub fn generate_method_map(
    edits: &[SemanticEdit],
) -> FxHashMap<MethodRef, MethodDefinitionEntry> {
    let mut map = FxHashMap::default();
    for edit in edits {
        if edit.kind != SemanticEditKind::Update {
            continue;
        }
        let (Some(SymbolRef::Method(new)), Some(SymbolRef::Method(old))) =
            (&edit.new_symbol, &edit.old_symbol)
        else {
            continue;
        };
        map.insert(
            new.clone(),
            MethodDefinitionEntry {
                previous_method: old.clone(),
                preserve_local_variables: edit.preserve_local_variables,
                syntax_map: edit.syntax_map.clone(),
            },
        );
    }
    map
}

/// Slot identities of the locals a generation emitted. Locals without a
/// debug id keep only their signature.
pub fn get_local_info(locals: &[LocalDefinition]) -> Vec<EncLocalInfo> {
    locals
        .iter()
        .map(|local| match &local.ty {
            Some(ty) if !local.slot_info.id.is_none() => EncLocalInfo::new(
                local.slot_info,
                ty.clone(),
                local.constraints,
                Some(local.signature.clone()),
            ),
            _ => EncLocalInfo::unused(local.signature.clone()),
        })
        .collect()
}

/// Slot identities of a generation-0 method body, joining its local
/// signature with the slot debug info. Short-lived slots and slots the debug
/// info does not describe are kept by signature only.
pub fn create_local_slot_map(
    debug_info: &EditAndContinueMethodDebugInformation,
    locals: &[LocalSlotMetadata],
) -> Vec<EncLocalInfo> {
    locals
        .iter()
        .enumerate()
        .map(|(slot, local)| match debug_info.local_slots.get(slot) {
            Some(info) if info.kind.is_long_lived() => EncLocalInfo::new(
                *info,
                local.ty.clone(),
                local.constraints,
                Some(local.signature.clone()),
            ),
            _ => EncLocalInfo::unused(local.signature.clone()),
        })
        .collect()
}

/// Metadata rows of the definitions earlier generations emitted.
pub trait DefinitionMap: Send + Sync {
    fn method_entry(&self, method: &MethodRef) -> Option<&MethodDefinitionEntry>;

    fn try_get_type_handle(&self, definition: &NamedTypeRef) -> Option<TypeDefinitionHandle>;

    fn try_get_event_handle(&self, definition: &EventRef) -> Option<EventDefinitionHandle>;

    fn try_get_field_handle(&self, definition: &FieldRef) -> Option<FieldDefinitionHandle>;

    fn try_get_method_handle(&self, definition: &MethodRef) -> Option<MethodDefinitionHandle>;

    fn try_get_property_handle(
        &self,
        definition: &PropertyRef,
    ) -> Option<PropertyDefinitionHandle>;

    /// `None` when the method's locals are not preserved, or the method has
    /// no previous body to take slots from.
    fn try_create_variable_slot_allocator(
        &self,
        method: &MethodRef,
    ) -> Option<EncVariableSlotAllocator>;

    /// True if `definition` already has a row.
    fn definition_exists(&self, definition: &SymbolRef) -> bool {
        match definition {
            SymbolRef::Assembly(_) | SymbolRef::Module(_) => true,
            SymbolRef::NamedType(ty) => self.try_get_type_handle(ty).is_some(),
            SymbolRef::Method(method) => self.try_get_method_handle(method).is_some(),
            SymbolRef::Property(property) => self.try_get_property_handle(property).is_some(),
            SymbolRef::Field(field) => self.try_get_field_handle(field).is_some(),
            SymbolRef::Event(event) => self.try_get_event_handle(event).is_some(),
            SymbolRef::Parameter(parameter) => parameter
                .containing_symbol()
                .is_some_and(|owner| self.definition_exists(&owner)),
        }
    }
}

// =============================================================================
// SymbolDefinitionMap
// =============================================================================

/// Definition map backed by the generation-0 module and the rows later
/// generations added.
pub struct SymbolDefinitionMap {
    method_map: FxHashMap<MethodRef, MethodDefinitionEntry>,
    /// Maps the current generation onto the generation-0 metadata symbols.
    map_to_metadata: Arc<dyn SymbolMatcher>,
    /// Maps the current generation onto the previous one; absent when the
    /// previous generation is generation 0.
    map_to_previous: Option<Arc<dyn SymbolMatcher>>,
    baseline: Arc<EmitBaseline>,
}

impl SymbolDefinitionMap {
    pub fn new(
        edits: &[SemanticEdit],
        map_to_metadata: Arc<dyn SymbolMatcher>,
        map_to_previous: Option<Arc<dyn SymbolMatcher>>,
        baseline: Arc<EmitBaseline>,
    ) -> Self {
        let method_map = generate_method_map(edits);
        debug!(
            generation = baseline.ordinal(),
            updated_methods = method_map.len(),
            "SymbolDefinitionMap::new"
        );
        Self {
            method_map,
            map_to_metadata,
            map_to_previous,
            baseline,
        }
    }

    pub fn baseline(&self) -> &Arc<EmitBaseline> {
        &self.baseline
    }

    /// Row `symbol` got from a generation after the first.
    fn added_row<K: Eq + Hash>(
        &self,
        symbol: &SymbolRef,
        table: &IndexMap<K, u32>,
        unwrap: impl Fn(&SymbolRef) -> Option<&K>,
    ) -> Option<u32> {
        if let Some(&row) = unwrap(symbol).and_then(|key| table.get(key)) {
            return Some(row);
        }
        let previous = self.map_to_previous.as_ref()?.map_definition(symbol)?;
        unwrap(&previous).and_then(|key| table.get(key)).copied()
    }

    /// Row of the generation-0 counterpart of `symbol`.
    fn metadata_handle(&self, symbol: &SymbolRef) -> Option<EntityHandle> {
        let mapped = self.map_to_metadata.map_definition(symbol)?;
        self.baseline.original_metadata().handle_of(&mapped)
    }

    /// Previous locals and state machine layout of a method whose last body
    /// is the generation-0 one.
    fn initial_method_slots(
        &self,
        handle: MethodDefinitionHandle,
    ) -> (Arc<[EncLocalInfo]>, Option<StateMachineSlots>) {
        let module = self.baseline.original_metadata();
        let debug_info = module.method_debug_info(handle).cloned().unwrap_or_default();
        match &debug_info.state_machine_type_name {
            Some(type_name) => {
                let slots = self.initial_state_machine_slots(type_name, &debug_info);
                (Arc::from([]), Some(slots))
            }
            None => {
                let locals = create_local_slot_map(&debug_info, module.locals(handle));
                (locals.into(), None)
            }
        }
    }

    /// Recovers the hoisted-local and awaiter slots of a generation-0 state
    /// machine from its field names.
    fn initial_state_machine_slots(
        &self,
        type_name: &Arc<str>,
        debug_info: &EditAndContinueMethodDebugInformation,
    ) -> StateMachineSlots {
        let mut slots = StateMachineSlots {
            type_name: type_name.clone(),
            ..StateMachineSlots::default()
        };
        let Some(state_machine) = self.baseline.original_metadata().find_type(type_name) else {
            debug!(type_name = %type_name, "SymbolDefinitionMap::state machine type not found");
            return slots;
        };
        for member in state_machine.members().iter() {
            let SymbolRef::Field(field) = member else {
                continue;
            };
            let Some((kind, index)) = generated_names::try_parse_slot_index(field.name()) else {
                continue;
            };
            match kind {
                GeneratedNameKind::AwaiterField => {
                    slots.awaiter_slots.entry(field.ty()).or_insert(index);
                    slots.awaiter_slot_count = slots.awaiter_slot_count.max(index + 1);
                }
                GeneratedNameKind::HoistedLocalField
                | GeneratedNameKind::HoistedSynthesizedLocalField
                | GeneratedNameKind::DisplayClassLocalOrField => {
                    if let Some(info) = debug_info.state_machine_hoisted_local_slots.get(index) {
                        let local = EncHoistedLocalInfo::new(*info, field.ty());
                        slots.hoisted_local_slots.entry(local).or_insert(index);
                    }
                    slots.hoisted_local_slot_count = slots.hoisted_local_slot_count.max(index + 1);
                }
                GeneratedNameKind::StateMachineType => {}
            }
        }
        slots
    }
}

impl DefinitionMap for SymbolDefinitionMap {
    fn method_entry(&self, method: &MethodRef) -> Option<&MethodDefinitionEntry> {
        self.method_map.get(method)
    }

    fn try_get_type_handle(&self, definition: &NamedTypeRef) -> Option<TypeDefinitionHandle> {
        let symbol = SymbolRef::NamedType(definition.clone());
        let table = self.baseline.type_defs_added();
        match self.added_row(&symbol, table, SymbolRef::as_named_type) {
            Some(row) => Some(TypeDefinitionHandle(row)),
            None => self.metadata_handle(&symbol)?.type_definition(),
        }
    }

    fn try_get_event_handle(&self, definition: &EventRef) -> Option<EventDefinitionHandle> {
        let symbol = SymbolRef::Event(definition.clone());
        let table = self.baseline.event_defs_added();
        match self.added_row(&symbol, table, SymbolRef::as_event) {
            Some(row) => Some(EventDefinitionHandle(row)),
            None => self.metadata_handle(&symbol)?.event_definition(),
        }
    }

    fn try_get_field_handle(&self, definition: &FieldRef) -> Option<FieldDefinitionHandle> {
        let symbol = SymbolRef::Field(definition.clone());
        let table = self.baseline.field_defs_added();
        match self.added_row(&symbol, table, SymbolRef::as_field) {
            Some(row) => Some(FieldDefinitionHandle(row)),
            None => self.metadata_handle(&symbol)?.field_definition(),
        }
    }

    fn try_get_method_handle(&self, definition: &MethodRef) -> Option<MethodDefinitionHandle> {
        let symbol = SymbolRef::Method(definition.clone());
        let table = self.baseline.method_defs_added();
        match self.added_row(&symbol, table, SymbolRef::as_method) {
            Some(row) => Some(MethodDefinitionHandle(row)),
            None => self.metadata_handle(&symbol)?.method_definition(),
        }
    }

    fn try_get_property_handle(
        &self,
        definition: &PropertyRef,
    ) -> Option<PropertyDefinitionHandle> {
        let symbol = SymbolRef::Property(definition.clone());
        let table = self.baseline.property_defs_added();
        match self.added_row(&symbol, table, SymbolRef::as_property) {
            Some(row) => Some(PropertyDefinitionHandle(row)),
            None => self.metadata_handle(&symbol)?.property_definition(),
        }
    }

    fn try_create_variable_slot_allocator(
        &self,
        method: &MethodRef,
    ) -> Option<EncVariableSlotAllocator> {
        let entry = self.method_map.get(method)?;
        if !entry.preserve_local_variables {
            return None;
        }
        let handle = self.try_get_method_handle(method)?;

        let (symbol_map, previous_locals, state_machine) =
            match self.baseline.added_or_changed_methods().get(&handle) {
                Some(info) => {
                    let symbol_map = self
                        .map_to_previous
                        .clone()
                        .unwrap_or_else(|| self.map_to_metadata.clone());
                    let state_machine = StateMachineSlots::from_added_or_changed(info);
                    (symbol_map, info.locals.clone(), state_machine)
                }
                None => {
                    let (locals, state_machine) = self.initial_method_slots(handle);
                    (self.map_to_metadata.clone(), locals, state_machine)
                }
            };
        trace!(
            method = method.name(),
            row = handle.row(),
            previous_locals = previous_locals.len(),
            state_machine = state_machine.is_some(),
            "SymbolDefinitionMap::try_create_variable_slot_allocator"
        );
        Some(EncVariableSlotAllocator::new(
            symbol_map,
            entry.syntax_map.clone(),
            entry.previous_method.clone(),
            previous_locals,
            state_machine,
        ))
    }
}

impl fmt::Debug for SymbolDefinitionMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolDefinitionMap")
            .field("generation", &self.baseline.ordinal())
            .field("updated_methods", &self.method_map.len())
            .field("has_previous", &self.map_to_previous.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../tests/definition_map_tests.rs"]
mod tests;
