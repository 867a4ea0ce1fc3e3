use super::{DeclInfo, MetadataNamedTypeSymbol};
use crate::attributes::{AttributeData, ConstantValue, MarshalInfo};
use crate::handles::{
    EntityHandle, EventDefinitionHandle, FieldDefinitionHandle, MethodDefinitionHandle,
    ParameterHandle, PropertyDefinitionHandle,
};
use crate::identity::CompilationId;
use crate::symbol::{
    Accessibility, AssemblyRef, CallingConvention, EventRef, EventSymbol, FieldSymbol, MemberFlags,
    MethodKind, MethodRef, MethodSymbol, ModuleRef, NamedTypeRef, ParameterFlags, ParameterRef,
    ParameterSymbol, PropertyRef, PropertySymbol, RefKind, Symbol, SymbolKind, SymbolRef,
    SynthesizedInfo,
};
use crate::types::{CustomModifier, TypeParameterSymbol, TypeSymbol};
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};
use xsym_common::Location;

fn upgrade_type(containing: &Weak<MetadataNamedTypeSymbol>) -> Option<NamedTypeRef> {
    containing.upgrade().map(|ty| ty as NamedTypeRef)
}

/// Property or event an accessor or backing field belongs to.
#[derive(Clone)]
pub(super) enum AssociatedLink {
    Property(Weak<MetadataPropertySymbol>),
    Event(Weak<MetadataEventSymbol>),
}

impl AssociatedLink {
    fn upgrade(&self) -> Option<SymbolRef> {
        match self {
            Self::Property(p) => p.upgrade().map(|p| SymbolRef::Property(p as PropertyRef)),
            Self::Event(e) => e.upgrade().map(|e| SymbolRef::Event(e as EventRef)),
        }
    }
}

/// Implements the `Symbol` methods shared by every type member.
macro_rules! member_symbol_common {
    ($kind:expr) => {
        fn kind(&self) -> SymbolKind {
            $kind
        }

        fn name(&self) -> &str {
            &self.decl.name
        }

        fn containing_symbol(&self) -> Option<SymbolRef> {
            upgrade_type(&self.containing_type).map(SymbolRef::NamedType)
        }

        fn containing_assembly(&self) -> Option<AssemblyRef> {
            upgrade_type(&self.containing_type)?.containing_assembly()
        }

        fn containing_module(&self) -> Option<ModuleRef> {
            upgrade_type(&self.containing_type)?.containing_module()
        }

        fn declared_accessibility(&self) -> Accessibility {
            self.decl.accessibility
        }

        fn locations(&self) -> Arc<[Location]> {
            self.decl.locations()
        }

        fn attributes(&self) -> Arc<[AttributeData]> {
            self.decl.attributes.clone()
        }

        fn declaring_compilation(&self) -> Option<CompilationId> {
            self.decl.compilation
        }

        fn is_implicitly_declared(&self) -> bool {
            self.decl.implicitly_declared
        }

        fn metadata_handle(&self) -> Option<EntityHandle> {
            Some(self.handle.into())
        }
    };
}

// =============================================================================
// Methods
// =============================================================================

pub struct MetadataMethodSymbol {
    pub(super) decl: DeclInfo,
    pub(super) method_kind: MethodKind,
    pub(super) flags: MemberFlags,
    pub(super) calling_convention: CallingConvention,
    pub(super) type_parameters: Arc<[TypeParameterSymbol]>,
    pub(super) return_type: TypeSymbol,
    pub(super) return_ref_kind: RefKind,
    pub(super) return_custom_modifiers: Arc<[CustomModifier]>,
    pub(super) return_attributes: Arc<[AttributeData]>,
    pub(super) return_marshalling: Option<MarshalInfo>,
    pub(super) parameters: Arc<[ParameterRef]>,
    pub(super) explicit_implementations: Arc<[MethodRef]>,
    pub(super) synthesized: Option<SynthesizedInfo>,
    pub(super) handle: MethodDefinitionHandle,
    pub(super) containing_type: Weak<MetadataNamedTypeSymbol>,
    pub(super) associated: OnceLock<AssociatedLink>,
    pub(super) partial_definition: OnceLock<Weak<MetadataMethodSymbol>>,
    pub(super) partial_implementation: OnceLock<Weak<MetadataMethodSymbol>>,
}

impl MetadataMethodSymbol {
    pub fn handle(&self) -> MethodDefinitionHandle {
        self.handle
    }
}

impl fmt::Debug for MetadataMethodSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MetadataMethodSymbol({})", self.decl.name)
    }
}

impl Symbol for MetadataMethodSymbol {
    member_symbol_common!(SymbolKind::Method);
}

impl MethodSymbol for MetadataMethodSymbol {
    fn method_kind(&self) -> MethodKind {
        self.method_kind
    }

    fn flags(&self) -> MemberFlags {
        self.flags
    }

    fn calling_convention(&self) -> CallingConvention {
        self.calling_convention
    }

    fn arity(&self) -> usize {
        self.type_parameters.len()
    }

    fn type_parameters(&self) -> Arc<[TypeParameterSymbol]> {
        self.type_parameters.clone()
    }

    fn return_type(&self) -> TypeSymbol {
        self.return_type.clone()
    }

    fn return_ref_kind(&self) -> RefKind {
        self.return_ref_kind
    }

    fn return_type_custom_modifiers(&self) -> Arc<[CustomModifier]> {
        self.return_custom_modifiers.clone()
    }

    fn return_type_attributes(&self) -> Arc<[AttributeData]> {
        self.return_attributes.clone()
    }

    fn return_value_marshalling_info(&self) -> Option<MarshalInfo> {
        self.return_marshalling.clone()
    }

    fn parameters(&self) -> Arc<[ParameterRef]> {
        self.parameters.clone()
    }

    fn explicit_interface_implementations(&self) -> Arc<[MethodRef]> {
        self.explicit_implementations.clone()
    }

    fn containing_type(&self) -> Option<NamedTypeRef> {
        upgrade_type(&self.containing_type)
    }

    fn associated_symbol(&self) -> Option<SymbolRef> {
        self.associated.get()?.upgrade()
    }

    fn partial_definition_part(&self) -> Option<MethodRef> {
        let definition = self.partial_definition.get()?.upgrade()?;
        Some(definition as MethodRef)
    }

    fn partial_implementation_part(&self) -> Option<MethodRef> {
        let implementation = self.partial_implementation.get()?.upgrade()?;
        Some(implementation as MethodRef)
    }

    fn synthesized_info(&self) -> Option<SynthesizedInfo> {
        self.synthesized.clone()
    }
}

// =============================================================================
// Parameters
// =============================================================================

#[derive(Clone)]
pub(super) enum ParameterOwner {
    Method(Weak<MetadataMethodSymbol>),
    Property(Weak<MetadataPropertySymbol>),
}

pub struct MetadataParameterSymbol {
    pub(super) decl: DeclInfo,
    pub(super) ordinal: usize,
    pub(super) ty: TypeSymbol,
    pub(super) ref_kind: RefKind,
    pub(super) flags: ParameterFlags,
    pub(super) default_value: Option<ConstantValue>,
    pub(super) custom_modifiers: Arc<[CustomModifier]>,
    pub(super) marshalling: Option<MarshalInfo>,
    pub(super) handle: ParameterHandle,
    pub(super) owner: ParameterOwner,
}

impl MetadataParameterSymbol {
    fn owner(&self) -> Option<SymbolRef> {
        match &self.owner {
            ParameterOwner::Method(m) => m.upgrade().map(|m| SymbolRef::Method(m as MethodRef)),
            ParameterOwner::Property(p) => {
                p.upgrade().map(|p| SymbolRef::Property(p as PropertyRef))
            }
        }
    }
}

impl fmt::Debug for MetadataParameterSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MetadataParameterSymbol({}#{})", self.decl.name, self.ordinal)
    }
}

impl Symbol for MetadataParameterSymbol {
    fn kind(&self) -> SymbolKind {
        SymbolKind::Parameter
    }

    fn name(&self) -> &str {
        &self.decl.name
    }

    fn containing_symbol(&self) -> Option<SymbolRef> {
        self.owner()
    }

    fn containing_assembly(&self) -> Option<AssemblyRef> {
        self.owner()?.containing_assembly()
    }

    fn containing_module(&self) -> Option<ModuleRef> {
        self.owner()?.containing_module()
    }

    fn locations(&self) -> Arc<[Location]> {
        self.decl.locations()
    }

    fn attributes(&self) -> Arc<[AttributeData]> {
        self.decl.attributes.clone()
    }

    fn declaring_compilation(&self) -> Option<CompilationId> {
        self.decl.compilation
    }

    fn metadata_handle(&self) -> Option<EntityHandle> {
        Some(self.handle.into())
    }
}

impl ParameterSymbol for MetadataParameterSymbol {
    fn ordinal(&self) -> usize {
        self.ordinal
    }

    fn ty(&self) -> TypeSymbol {
        self.ty.clone()
    }

    fn ref_kind(&self) -> RefKind {
        self.ref_kind
    }

    fn flags(&self) -> ParameterFlags {
        self.flags
    }

    fn explicit_default_value(&self) -> Option<ConstantValue> {
        self.default_value.clone()
    }

    fn custom_modifiers(&self) -> Arc<[CustomModifier]> {
        self.custom_modifiers.clone()
    }

    fn marshalling_info(&self) -> Option<MarshalInfo> {
        self.marshalling.clone()
    }
}

// =============================================================================
// Properties
// =============================================================================

pub struct MetadataPropertySymbol {
    pub(super) decl: DeclInfo,
    pub(super) ty: TypeSymbol,
    pub(super) ref_kind: RefKind,
    pub(super) custom_modifiers: Arc<[CustomModifier]>,
    pub(super) flags: MemberFlags,
    pub(super) parameters: Arc<[ParameterRef]>,
    pub(super) get_method: Option<MethodRef>,
    pub(super) set_method: Option<MethodRef>,
    pub(super) handle: PropertyDefinitionHandle,
    pub(super) containing_type: Weak<MetadataNamedTypeSymbol>,
}

impl fmt::Debug for MetadataPropertySymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MetadataPropertySymbol({})", self.decl.name)
    }
}

impl Symbol for MetadataPropertySymbol {
    member_symbol_common!(SymbolKind::Property);
}

impl PropertySymbol for MetadataPropertySymbol {
    fn ty(&self) -> TypeSymbol {
        self.ty.clone()
    }

    fn ref_kind(&self) -> RefKind {
        self.ref_kind
    }

    fn type_custom_modifiers(&self) -> Arc<[CustomModifier]> {
        self.custom_modifiers.clone()
    }

    fn flags(&self) -> MemberFlags {
        self.flags
    }

    fn parameters(&self) -> Arc<[ParameterRef]> {
        self.parameters.clone()
    }

    fn get_method(&self) -> Option<MethodRef> {
        self.get_method.clone()
    }

    fn set_method(&self) -> Option<MethodRef> {
        self.set_method.clone()
    }

    fn containing_type(&self) -> Option<NamedTypeRef> {
        upgrade_type(&self.containing_type)
    }
}

// =============================================================================
// Fields
// =============================================================================

pub struct MetadataFieldSymbol {
    pub(super) decl: DeclInfo,
    pub(super) ty: TypeSymbol,
    pub(super) custom_modifiers: Arc<[CustomModifier]>,
    pub(super) flags: MemberFlags,
    pub(super) constant_value: Option<ConstantValue>,
    pub(super) marshalling: Option<MarshalInfo>,
    pub(super) synthesized: Option<SynthesizedInfo>,
    pub(super) handle: FieldDefinitionHandle,
    pub(super) containing_type: Weak<MetadataNamedTypeSymbol>,
    pub(super) associated: OnceLock<AssociatedLink>,
}

impl fmt::Debug for MetadataFieldSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MetadataFieldSymbol({})", self.decl.name)
    }
}

impl Symbol for MetadataFieldSymbol {
    member_symbol_common!(SymbolKind::Field);
}

impl FieldSymbol for MetadataFieldSymbol {
    fn ty(&self) -> TypeSymbol {
        self.ty.clone()
    }

    fn custom_modifiers(&self) -> Arc<[CustomModifier]> {
        self.custom_modifiers.clone()
    }

    fn flags(&self) -> MemberFlags {
        self.flags
    }

    fn constant_value(&self) -> Option<ConstantValue> {
        self.constant_value.clone()
    }

    fn marshalling_info(&self) -> Option<MarshalInfo> {
        self.marshalling.clone()
    }

    fn associated_symbol(&self) -> Option<SymbolRef> {
        self.associated.get()?.upgrade()
    }

    fn synthesized_info(&self) -> Option<SynthesizedInfo> {
        self.synthesized.clone()
    }

    fn containing_type(&self) -> Option<NamedTypeRef> {
        upgrade_type(&self.containing_type)
    }
}

// =============================================================================
// Events
// =============================================================================

pub struct MetadataEventSymbol {
    pub(super) decl: DeclInfo,
    pub(super) ty: TypeSymbol,
    pub(super) flags: MemberFlags,
    pub(super) add_method: Option<MethodRef>,
    pub(super) remove_method: Option<MethodRef>,
    pub(super) handle: EventDefinitionHandle,
    pub(super) containing_type: Weak<MetadataNamedTypeSymbol>,
}

impl fmt::Debug for MetadataEventSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MetadataEventSymbol({})", self.decl.name)
    }
}

impl Symbol for MetadataEventSymbol {
    member_symbol_common!(SymbolKind::Event);
}

impl EventSymbol for MetadataEventSymbol {
    fn ty(&self) -> TypeSymbol {
        self.ty.clone()
    }

    fn flags(&self) -> MemberFlags {
        self.flags
    }

    fn add_method(&self) -> Option<MethodRef> {
        self.add_method.clone()
    }

    fn remove_method(&self) -> Option<MethodRef> {
        self.remove_method.clone()
    }

    fn containing_type(&self) -> Option<NamedTypeRef> {
        upgrade_type(&self.containing_type)
    }
}
