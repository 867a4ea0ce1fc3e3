//! Reuse of local, hoisted-field and awaiter slots across an edit.
//!
//! A local of the edited method gets its previous slot back when its
//! declaration maps to the previous source through the edit's syntax map and
//! its kind, ordinal, type (mapped to the previous generation) and
//! constraints all match a previous local. Everything else gets a fresh slot
//! after the previous ones, which stay reserved.

use crate::baseline::AddedOrChangedMethodInfo;
use crate::generated_names;
use crate::local_info::{
    EncHoistedLocalInfo, EncLocalInfo, LocalDebugId, LocalDefinition, LocalSlotConstraints,
    LocalSlotDebugInfo, SynthesizedLocalKind,
};
use crate::semantic_edit::SyntaxMap;
use crate::symbol_matcher::SymbolMatcher;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;
use xsym_symbols::{MethodRef, TypeSymbol};

/// Field layout of the previous generation's state machine.
#[derive(Clone, Debug, Default)]
pub struct StateMachineSlots {
    pub type_name: Arc<str>,
    pub hoisted_local_slot_count: usize,
    pub hoisted_local_slots: FxHashMap<EncHoistedLocalInfo, usize>,
    pub awaiter_slot_count: usize,
    pub awaiter_slots: FxHashMap<TypeSymbol, usize>,
}

impl StateMachineSlots {
    pub fn from_added_or_changed(info: &AddedOrChangedMethodInfo) -> Option<Self> {
        let type_name = info.state_machine_type_name.clone()?;
        let hoisted = info.state_machine_hoisted_local_slots.as_deref().unwrap_or_default();
        let awaiters = info.state_machine_awaiter_slots.as_deref().unwrap_or_default();

        let mut hoisted_local_slots = FxHashMap::default();
        for (slot, local) in hoisted.iter().enumerate() {
            if !local.is_unused() {
                hoisted_local_slots.entry(local.clone()).or_insert(slot);
            }
        }
        let mut awaiter_slots = FxHashMap::default();
        for (slot, awaiter) in awaiters.iter().enumerate() {
            if let Some(ty) = awaiter {
                awaiter_slots.entry(ty.clone()).or_insert(slot);
            }
        }
        Some(Self {
            type_name,
            hoisted_local_slot_count: hoisted.len(),
            hoisted_local_slots,
            awaiter_slot_count: awaiters.len(),
            awaiter_slots,
        })
    }
}

pub struct EncVariableSlotAllocator {
    /// Maps types of the new generation to the previous generation.
    symbol_map: Arc<dyn SymbolMatcher>,
    syntax_map: Option<SyntaxMap>,
    previous_top_level_method: MethodRef,
    previous_locals: Arc<[EncLocalInfo]>,
    previous_local_slots: FxHashMap<EncLocalInfo, usize>,
    state_machine: Option<StateMachineSlots>,
}

impl EncVariableSlotAllocator {
    pub fn new(
        symbol_map: Arc<dyn SymbolMatcher>,
        syntax_map: Option<SyntaxMap>,
        previous_top_level_method: MethodRef,
        previous_locals: Arc<[EncLocalInfo]>,
        state_machine: Option<StateMachineSlots>,
    ) -> Self {
        let mut previous_local_slots = FxHashMap::default();
        for (slot, local) in previous_locals.iter().enumerate() {
            if !local.is_unused() {
                previous_local_slots.entry(local.clone()).or_insert(slot);
            }
        }
        Self {
            symbol_map,
            syntax_map,
            previous_top_level_method,
            previous_locals,
            previous_local_slots,
            state_machine,
        }
    }

    pub fn previous_method(&self) -> &MethodRef {
        &self.previous_top_level_method
    }

    pub fn previous_locals(&self) -> &[EncLocalInfo] {
        &self.previous_locals
    }

    pub fn previous_state_machine_type_name(&self) -> Option<&str> {
        self.state_machine.as_ref().map(|sm| &*sm.type_name)
    }

    pub fn hoisted_local_slot_count(&self) -> usize {
        self.state_machine
            .as_ref()
            .map_or(0, |sm| sm.hoisted_local_slot_count)
    }

    pub fn awaiter_slot_count(&self) -> usize {
        self.state_machine.as_ref().map_or(0, |sm| sm.awaiter_slot_count)
    }

    /// Reserves every previous slot, in order, before new locals are added.
    pub fn add_previous_locals(&self, builder: &mut Vec<LocalDefinition>) {
        builder.extend(self.previous_locals.iter().enumerate().map(|(slot, local)| {
            let signature = local.signature().cloned().unwrap_or_else(|| Arc::from([]));
            LocalDefinition::signature_only(slot, signature)
        }));
    }

    /// Id the local declared at `declarator_position` (new source) had in the
    /// previous generation.
    fn previous_local_id(
        &self,
        declarator_position: u32,
        current: LocalDebugId,
    ) -> Option<LocalDebugId> {
        let syntax_map = self.syntax_map.as_deref()?;
        let previous_position = syntax_map(declarator_position)?;
        let syntax_offset = self
            .previous_top_level_method
            .calculate_local_syntax_offset(previous_position);
        Some(LocalDebugId {
            syntax_offset,
            ..current
        })
    }

    /// The previous slot a local can reuse.
    pub fn get_previous_local(
        &self,
        current_type: &TypeSymbol,
        name: Option<&str>,
        declarator_position: u32,
        kind: SynthesizedLocalKind,
        id: LocalDebugId,
        constraints: LocalSlotConstraints,
    ) -> Option<LocalDefinition> {
        if id.is_none() {
            return None;
        }
        let previous_id = self.previous_local_id(declarator_position, id)?;
        let previous_type = self.symbol_map.map_reference(current_type)?;
        let key = EncLocalInfo::new(
            LocalSlotDebugInfo::new(kind, previous_id),
            previous_type,
            constraints,
            None,
        );
        let Some(&slot) = self.previous_local_slots.get(&key) else {
            trace!(
                method = self.previous_top_level_method.name(),
                syntax_offset = previous_id.syntax_offset,
                "EncVariableSlotAllocator::no previous local"
            );
            return None;
        };
        trace!(
            method = self.previous_top_level_method.name(),
            slot,
            "EncVariableSlotAllocator::reuse local slot"
        );
        let signature = self.previous_locals[slot]
            .signature()
            .cloned()
            .unwrap_or_else(|| Arc::from([]));
        Some(LocalDefinition {
            slot,
            name: name.map(Into::into),
            ty: Some(current_type.clone()),
            slot_info: LocalSlotDebugInfo::new(kind, id),
            constraints,
            signature,
        })
    }

    /// Name of the previous state machine field a hoisted local can reuse.
    pub fn get_previous_hoisted_local(
        &self,
        declarator_position: u32,
        current_type: &TypeSymbol,
        kind: SynthesizedLocalKind,
        id: LocalDebugId,
        local_name: Option<&str>,
    ) -> Option<String> {
        let state_machine = self.state_machine.as_ref()?;
        let previous_id = self.previous_local_id(declarator_position, id)?;
        let previous_type = self.symbol_map.map_reference(current_type)?;
        let key =
            EncHoistedLocalInfo::new(LocalSlotDebugInfo::new(kind, previous_id), previous_type);
        let &slot = state_machine.hoisted_local_slots.get(&key)?;
        trace!(slot, "EncVariableSlotAllocator::reuse hoisted local");
        Some(generated_names::make_hoisted_local_field_name(kind, slot, local_name))
    }

    /// Name of the previous awaiter field of the same type.
    pub fn get_previous_awaiter(&self, current_type: &TypeSymbol) -> Option<String> {
        let state_machine = self.state_machine.as_ref()?;
        let previous_type = self.symbol_map.map_reference(current_type)?;
        let &slot = state_machine.awaiter_slots.get(&previous_type)?;
        Some(generated_names::make_awaiter_field_name(slot))
    }
}

impl fmt::Debug for EncVariableSlotAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncVariableSlotAllocator")
            .field("previous_method", &self.previous_top_level_method.name())
            .field("previous_locals", &self.previous_locals.len())
            .field("state_machine", &self.state_machine)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../tests/slot_allocator_tests.rs"]
mod tests;
