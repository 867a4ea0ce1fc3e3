use super::{DeclInfo, MetadataModuleSymbol};
use crate::attributes::AttributeData;
use crate::handles::{EntityHandle, TypeDefinitionHandle};
use crate::identity::CompilationId;
use crate::symbol::{
    Accessibility, AnonymousTypeKey, AssemblyRef, MemberFlags, ModuleRef, NamedTypeRef,
    NamedTypeSymbol, Symbol, SymbolKind, SymbolRef, SynthesizedInfo, TypeKind,
};
use crate::types::{SpecialType, TypeIdentifier, TypeParameterSymbol, TypeSymbol};
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};
use xsym_common::Location;

pub struct MetadataNamedTypeSymbol {
    pub(super) decl: DeclInfo,
    pub(super) namespace: Arc<str>,
    pub(super) type_kind: TypeKind,
    pub(super) flags: MemberFlags,
    pub(super) special_type: Option<SpecialType>,
    pub(super) type_parameters: Arc<[TypeParameterSymbol]>,
    pub(super) base_type: Option<TypeSymbol>,
    pub(super) interfaces: Arc<[TypeSymbol]>,
    pub(super) handle: TypeDefinitionHandle,
    pub(super) anonymous_key: Option<AnonymousTypeKey>,
    pub(super) synthesized: Option<SynthesizedInfo>,
    pub(super) no_pia_local: Option<TypeIdentifier>,
    pub(super) type_identifier: Option<TypeIdentifier>,
    pub(super) containing_type: Option<Weak<MetadataNamedTypeSymbol>>,
    pub(super) module: OnceLock<Weak<MetadataModuleSymbol>>,
    pub(super) members: OnceLock<Arc<[SymbolRef]>>,
}

impl MetadataNamedTypeSymbol {
    pub fn handle(&self) -> TypeDefinitionHandle {
        self.handle
    }

    fn module(&self) -> Option<Arc<MetadataModuleSymbol>> {
        self.module.get()?.upgrade()
    }
}

impl fmt::Debug for MetadataNamedTypeSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MetadataNamedTypeSymbol({})", self.full_name())
    }
}

impl Symbol for MetadataNamedTypeSymbol {
    fn kind(&self) -> SymbolKind {
        SymbolKind::NamedType
    }

    fn name(&self) -> &str {
        &self.decl.name
    }

    fn containing_symbol(&self) -> Option<SymbolRef> {
        match &self.containing_type {
            Some(outer) => outer
                .upgrade()
                .map(|outer| SymbolRef::NamedType(outer as NamedTypeRef)),
            None => self
                .module()
                .map(|module| SymbolRef::Module(module as ModuleRef)),
        }
    }

    fn containing_assembly(&self) -> Option<AssemblyRef> {
        self.module()?.containing_assembly()
    }

    fn containing_module(&self) -> Option<ModuleRef> {
        self.module().map(|module| module as ModuleRef)
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
}

impl NamedTypeSymbol for MetadataNamedTypeSymbol {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn arity(&self) -> usize {
        self.type_parameters.len()
    }

    fn type_kind(&self) -> TypeKind {
        self.type_kind
    }

    fn flags(&self) -> MemberFlags {
        self.flags
    }

    fn special_type(&self) -> Option<SpecialType> {
        self.special_type
    }

    fn containing_type(&self) -> Option<NamedTypeRef> {
        let outer = self.containing_type.as_ref()?.upgrade()?;
        Some(outer as NamedTypeRef)
    }

    fn type_parameters(&self) -> Arc<[TypeParameterSymbol]> {
        self.type_parameters.clone()
    }

    fn base_type(&self) -> Option<TypeSymbol> {
        self.base_type.clone()
    }

    fn interfaces(&self) -> Arc<[TypeSymbol]> {
        self.interfaces.clone()
    }

    fn members(&self) -> Arc<[SymbolRef]> {
        self.members
            .get()
            .cloned()
            .unwrap_or_else(|| Arc::from([]))
    }

    fn anonymous_type_key(&self) -> Option<AnonymousTypeKey> {
        self.anonymous_key.clone()
    }

    fn synthesized_info(&self) -> Option<SynthesizedInfo> {
        self.synthesized.clone()
    }

    fn no_pia_local_identity(&self) -> Option<TypeIdentifier> {
        self.no_pia_local.clone()
    }

    fn type_identifier(&self) -> Option<TypeIdentifier> {
        self.type_identifier.clone()
    }
}
