//! Identity of local variable slots across generations.
//!
//! A local keeps its slot in the next generation when its identity matches a
//! previous local: same synthesized kind, same debug id (syntax offset within
//! the method plus ordinal), same type and same constraints. The raw
//! signature bytes never take part in that comparison.

use std::hash::{Hash, Hasher};
use std::sync::Arc;
use xsym_symbols::TypeSymbol;

/// Why a local exists. Negative kinds are short-lived temporaries whose
/// slots are never carried to the next generation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i8)]
pub enum SynthesizedLocalKind {
    EmitterTemp = -3,
    OptimizerTemp = -2,
    LoweringTemp = -1,
    UserDefined = 0,
    LambdaDisplayClass = 1,
    StateMachineReturnValue = 2,
    ForEachEnumerator = 3,
    ForEachArray = 4,
    ForEachArrayIndex = 5,
    LockTaken = 6,
    UsingVariable = 7,
    InstrumentationPayload = 8,
    Awaiter = 9,
    AwaitByRefSpill = 10,
}

impl SynthesizedLocalKind {
    /// Long-lived locals keep their identity across generations.
    pub const fn is_long_lived(self) -> bool {
        self as i8 >= SynthesizedLocalKind::UserDefined as i8
    }

    /// Locals that live across an `await` or `yield` get hoisted to fields
    /// of the state machine instead of taking a slot.
    pub const fn must_survive_state_machine_suspension(self) -> bool {
        matches!(
            self,
            Self::UserDefined
                | Self::LambdaDisplayClass
                | Self::ForEachEnumerator
                | Self::ForEachArray
                | Self::ForEachArrayIndex
                | Self::LockTaken
                | Self::UsingVariable
                | Self::InstrumentationPayload
                | Self::AwaitByRefSpill
        )
    }
}

/// Position-based identity of a local within its method.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LocalDebugId {
    /// Offset of the declarator from the start of the method declaration.
    pub syntax_offset: i32,
    /// Distinguishes locals declared by the same syntax.
    pub ordinal: i32,
    /// Distinguishes the parts of one local that a lowering splits apart.
    pub subordinal: i32,
}

impl LocalDebugId {
    /// The id of a local that cannot be matched across generations.
    pub const NONE: LocalDebugId = LocalDebugId {
        syntax_offset: -1,
        ordinal: -1,
        subordinal: -1,
    };

    pub const fn new(syntax_offset: i32, ordinal: i32) -> Self {
        Self {
            syntax_offset,
            ordinal,
            subordinal: 0,
        }
    }

    pub const fn is_none(self) -> bool {
        self.syntax_offset == -1 && self.ordinal == -1
    }
}

impl Default for LocalDebugId {
    fn default() -> Self {
        Self::NONE
    }
}

/// Kind and id of one local slot, as recorded in the debug information.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LocalSlotDebugInfo {
    pub kind: SynthesizedLocalKind,
    pub id: LocalDebugId,
}

impl LocalSlotDebugInfo {
    pub const fn new(kind: SynthesizedLocalKind, id: LocalDebugId) -> Self {
        Self { kind, id }
    }
}

impl Default for LocalSlotDebugInfo {
    fn default() -> Self {
        Self::new(SynthesizedLocalKind::EmitterTemp, LocalDebugId::NONE)
    }
}

bitflags::bitflags! {
    /// Constraints on the storage a local occupies.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct LocalSlotConstraints: u8 {
        const PINNED = 1 << 0;
        const BY_REF = 1 << 1;
    }
}

// =============================================================================
// EncLocalInfo
// =============================================================================

/// A local slot of a previous generation.
///
/// Unused slots (locals without a debug id, or short-lived temporaries) are
/// kept only by signature so they stay occupied; they match nothing.
#[derive(Clone, Debug)]
pub struct EncLocalInfo {
    slot_info: LocalSlotDebugInfo,
    ty: Option<TypeSymbol>,
    constraints: LocalSlotConstraints,
    signature: Option<Arc<[u8]>>,
}

impl EncLocalInfo {
    pub fn new(
        slot_info: LocalSlotDebugInfo,
        ty: TypeSymbol,
        constraints: LocalSlotConstraints,
        signature: Option<Arc<[u8]>>,
    ) -> Self {
        Self {
            slot_info,
            ty: Some(ty),
            constraints,
            signature,
        }
    }

    /// A slot that is preserved by its signature alone.
    pub fn unused(signature: Arc<[u8]>) -> Self {
        Self {
            slot_info: LocalSlotDebugInfo::default(),
            ty: None,
            constraints: LocalSlotConstraints::empty(),
            signature: Some(signature),
        }
    }

    pub fn slot_info(&self) -> LocalSlotDebugInfo {
        self.slot_info
    }

    pub fn ty(&self) -> Option<&TypeSymbol> {
        self.ty.as_ref()
    }

    pub fn constraints(&self) -> LocalSlotConstraints {
        self.constraints
    }

    pub fn signature(&self) -> Option<&Arc<[u8]>> {
        self.signature.as_ref()
    }

    pub fn is_unused(&self) -> bool {
        self.ty.is_none()
    }

    /// Rewrites the type through `map`, keeping everything else. Unused
    /// slots have no type and stay as they are.
    ///
    /// # Panics
    /// If `map` has no counterpart for the type of a used slot.
    pub fn map_type(&self, map: impl FnOnce(&TypeSymbol) -> Option<TypeSymbol>) -> Self {
        let Some(ty) = &self.ty else {
            return self.clone();
        };
        let Some(mapped) = map(ty) else {
            panic!("type {ty} of a previous local has no counterpart in the new generation");
        };
        Self {
            ty: Some(mapped),
            ..self.clone()
        }
    }
}

impl PartialEq for EncLocalInfo {
    fn eq(&self, other: &Self) -> bool {
        self.slot_info == other.slot_info
            && self.ty == other.ty
            && self.constraints == other.constraints
    }
}

impl Eq for EncLocalInfo {}

impl Hash for EncLocalInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.slot_info.hash(state);
        self.ty.hash(state);
        self.constraints.hash(state);
    }
}

/// A field of a previous state machine that held a hoisted local.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EncHoistedLocalInfo {
    slot_info: LocalSlotDebugInfo,
    ty: Option<TypeSymbol>,
}

impl EncHoistedLocalInfo {
    pub fn new(slot_info: LocalSlotDebugInfo, ty: TypeSymbol) -> Self {
        Self {
            slot_info,
            ty: Some(ty),
        }
    }

    /// A hoisted field that is kept only to reserve its slot.
    pub fn unused() -> Self {
        Self {
            slot_info: LocalSlotDebugInfo::default(),
            ty: None,
        }
    }

    pub fn slot_info(&self) -> LocalSlotDebugInfo {
        self.slot_info
    }

    pub fn ty(&self) -> Option<&TypeSymbol> {
        self.ty.as_ref()
    }

    pub fn is_unused(&self) -> bool {
        self.ty.is_none()
    }

    pub fn map_type(&self, map: impl FnOnce(&TypeSymbol) -> Option<TypeSymbol>) -> Self {
        let Some(ty) = &self.ty else {
            return self.clone();
        };
        let Some(mapped) = map(ty) else {
            panic!(
                "type {ty} of a previous hoisted local has no counterpart in the new generation"
            );
        };
        Self::new(self.slot_info, mapped)
    }
}

/// A local the code generator emitted into a method body.
#[derive(Clone, Debug)]
pub struct LocalDefinition {
    pub slot: usize,
    pub name: Option<Arc<str>>,
    /// Absent for slots that only carry a previous generation's signature.
    pub ty: Option<TypeSymbol>,
    pub slot_info: LocalSlotDebugInfo,
    pub constraints: LocalSlotConstraints,
    pub signature: Arc<[u8]>,
}

impl LocalDefinition {
    /// Occupies `slot` with a previous generation's signature.
    pub fn signature_only(slot: usize, signature: Arc<[u8]>) -> Self {
        Self {
            slot,
            name: None,
            ty: None,
            slot_info: LocalSlotDebugInfo::default(),
            constraints: LocalSlotConstraints::empty(),
            signature,
        }
    }
}

#[cfg(test)]
#[path = "../tests/local_info_tests.rs"]
mod tests;
