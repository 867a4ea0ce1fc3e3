use super::DeclInfo;
use crate::attributes::AttributeData;
use crate::identity::{AssemblyIdentity, CompilationId};
use crate::symbol::{
    AssemblyRef, AssemblySymbol, ModuleRef, ModuleSymbol, NamedTypeRef, Symbol, SymbolKind,
    SymbolRef,
};
use crate::types::{MetadataTypeName, SpecialType};
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};
use tracing::trace;
use xsym_common::Location;

pub struct MetadataAssemblySymbol {
    pub(super) decl: DeclInfo,
    pub(super) identity: AssemblyIdentity,
    pub(super) is_cor_library: bool,
    pub(super) is_linked: bool,
    pub(super) self_ref: Weak<MetadataAssemblySymbol>,
    pub(super) cor_library: Option<AssemblyRef>,
    pub(super) modules: Arc<[ModuleRef]>,
    pub(super) special_types: FxHashMap<SpecialType, NamedTypeRef>,
    pub(super) forwarders: OnceLock<FxHashMap<MetadataTypeName, Weak<dyn AssemblySymbol>>>,
    pub(super) no_pia_resolution_assemblies: OnceLock<Arc<[AssemblyRef]>>,
    pub(super) linked_referenced_assemblies: OnceLock<Arc<[AssemblyRef]>>,
}

impl MetadataAssemblySymbol {
    /// Installs the assembly's type forwarders. Forwarders may point at
    /// assemblies built later, so they are installed after construction.
    ///
    /// # Panics
    /// If forwarders were already installed.
    pub fn set_type_forwarders(&self, forwarders: Vec<(MetadataTypeName, AssemblyRef)>) {
        trace!(
            assembly = %self.identity,
            count = forwarders.len(),
            "MetadataAssemblySymbol::set_type_forwarders"
        );
        let map = forwarders
            .into_iter()
            .map(|(name, destination)| (name, Arc::downgrade(&destination)))
            .collect();
        assert!(
            self.forwarders.set(map).is_ok(),
            "type forwarders of {} are already set",
            self.identity
        );
    }

    pub fn as_assembly_ref(&self) -> Option<AssemblyRef> {
        self.self_ref
            .upgrade()
            .map(|assembly| assembly as AssemblyRef)
    }
}

impl fmt::Debug for MetadataAssemblySymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MetadataAssemblySymbol({})", self.identity)
    }
}

impl Symbol for MetadataAssemblySymbol {
    fn kind(&self) -> SymbolKind {
        SymbolKind::Assembly
    }

    fn name(&self) -> &str {
        &self.identity.name
    }

    fn containing_symbol(&self) -> Option<SymbolRef> {
        None
    }

    fn containing_assembly(&self) -> Option<AssemblyRef> {
        None
    }

    fn containing_module(&self) -> Option<ModuleRef> {
        None
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
}

impl AssemblySymbol for MetadataAssemblySymbol {
    fn identity(&self) -> &AssemblyIdentity {
        &self.identity
    }

    fn modules(&self) -> Arc<[ModuleRef]> {
        self.modules.clone()
    }

    fn is_cor_library(&self) -> bool {
        self.is_cor_library
    }

    fn cor_library(&self) -> Option<AssemblyRef> {
        if self.is_cor_library {
            self.as_assembly_ref()
        } else {
            self.cor_library.clone()
        }
    }

    fn get_declared_special_type(&self, special: SpecialType) -> Option<NamedTypeRef> {
        self.special_types.get(&special).cloned()
    }

    fn is_linked(&self) -> bool {
        self.is_linked
    }

    fn no_pia_resolution_assemblies(&self) -> Arc<[AssemblyRef]> {
        self.no_pia_resolution_assemblies
            .get()
            .cloned()
            .unwrap_or_else(|| Arc::from([]))
    }

    fn set_no_pia_resolution_assemblies(&self, assemblies: Vec<AssemblyRef>) {
        assert!(
            self.no_pia_resolution_assemblies
                .set(assemblies.into())
                .is_ok(),
            "NoPia resolution assemblies of {} are already set",
            self.identity
        );
    }

    fn linked_referenced_assemblies(&self) -> Arc<[AssemblyRef]> {
        self.linked_referenced_assemblies
            .get()
            .cloned()
            .unwrap_or_else(|| Arc::from([]))
    }

    fn set_linked_referenced_assemblies(&self, assemblies: Vec<AssemblyRef>) {
        assert!(
            self.linked_referenced_assemblies
                .set(assemblies.into())
                .is_ok(),
            "linked referenced assemblies of {} are already set",
            self.identity
        );
    }

    fn forwarding_destination(&self, name: &MetadataTypeName) -> Option<AssemblyRef> {
        self.forwarders.get()?.get(name)?.upgrade()
    }
}

pub struct MetadataModuleSymbol {
    pub(super) decl: DeclInfo,
    pub(super) ordinal: usize,
    pub(super) assembly: Weak<MetadataAssemblySymbol>,
    pub(super) referenced_assemblies: Arc<[AssemblyRef]>,
    pub(super) types: Arc<[NamedTypeRef]>,
}

impl fmt::Debug for MetadataModuleSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MetadataModuleSymbol({})", self.decl.name)
    }
}

impl MetadataModuleSymbol {
    fn assembly(&self) -> Option<AssemblyRef> {
        self.assembly
            .upgrade()
            .map(|assembly| assembly as AssemblyRef)
    }
}

impl Symbol for MetadataModuleSymbol {
    fn kind(&self) -> SymbolKind {
        SymbolKind::NetModule
    }

    fn name(&self) -> &str {
        &self.decl.name
    }

    fn containing_symbol(&self) -> Option<SymbolRef> {
        self.assembly().map(SymbolRef::Assembly)
    }

    fn containing_assembly(&self) -> Option<AssemblyRef> {
        self.assembly()
    }

    fn containing_module(&self) -> Option<ModuleRef> {
        None
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
}

impl ModuleSymbol for MetadataModuleSymbol {
    fn ordinal(&self) -> usize {
        self.ordinal
    }

    fn referenced_assemblies(&self) -> Arc<[AssemblyRef]> {
        self.referenced_assemblies.clone()
    }

    fn types(&self) -> Arc<[NamedTypeRef]> {
        self.types.clone()
    }
}
