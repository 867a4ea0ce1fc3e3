use crate::module::RetargetingModuleSymbol;
use crate::translator::RetargetOptions;
use dashmap::DashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};
use tracing::{debug, trace};
use xsym_common::Location;
use xsym_symbols::{
    AssemblyIdentity, AssemblyRef, AssemblySymbol, AttributeData, ForwardedTypeLookup,
    ForwardingVisited, LazyField, MetadataTypeName, MissingTypeReason, ModuleRef, NamedTypeRef,
    SpecialType, Symbol, SymbolKind, SymbolRef, TypeSymbol,
};

/// An assembly observed through a different reference set than the one it
/// was compiled against.
///
/// Module 0 is a [`RetargetingModuleSymbol`] over the underlying manifest
/// module; any further modules are shared with the underlying assembly.
pub struct RetargetingAssemblySymbol {
    underlying: AssemblyRef,
    is_linked: bool,
    primary_module: Arc<RetargetingModuleSymbol>,
    modules: Arc<[ModuleRef]>,
    cor_library: OnceLock<Option<AssemblyRef>>,
    no_pia_resolution_assemblies: OnceLock<Arc<[AssemblyRef]>>,
    linked_referenced_assemblies: OnceLock<Arc<[AssemblyRef]>>,
    /// Local embedded interop type -> its canonical type.
    no_pia_unification_map: DashMap<NamedTypeRef, TypeSymbol>,
    attributes: LazyField<Arc<[AttributeData]>>,
}

impl RetargetingAssemblySymbol {
    /// # Panics
    /// If `underlying` is itself a retargeting assembly, or is a core
    /// library. Core libraries are never retargeted; the reference set
    /// binds its own.
    pub fn new(underlying: AssemblyRef, is_linked: bool) -> Arc<Self> {
        assert!(
            !underlying.is_retargeting(),
            "cannot retarget assembly {}: it is already a retargeting assembly",
            underlying.identity()
        );
        assert!(
            !underlying.is_cor_library(),
            "cannot retarget core library {}",
            underlying.identity()
        );
        let underlying_modules = underlying.modules();
        assert!(
            !underlying_modules.is_empty(),
            "assembly {} has no manifest module",
            underlying.identity()
        );
        debug!(
            assembly = %underlying.identity(),
            is_linked,
            "RetargetingAssemblySymbol::new"
        );
        Arc::new_cyclic(|self_ref: &Weak<RetargetingAssemblySymbol>| {
            let primary_module =
                RetargetingModuleSymbol::new(self_ref.clone(), underlying_modules[0].clone());
            let modules = std::iter::once(primary_module.clone() as ModuleRef)
                .chain(underlying_modules.iter().skip(1).cloned())
                .collect();
            Self {
                underlying,
                is_linked,
                primary_module,
                modules,
                cor_library: OnceLock::new(),
                no_pia_resolution_assemblies: OnceLock::new(),
                linked_referenced_assemblies: OnceLock::new(),
                no_pia_unification_map: DashMap::new(),
                attributes: LazyField::new(),
            }
        })
    }

    pub fn underlying_assembly(&self) -> &AssemblyRef {
        &self.underlying
    }

    pub fn primary_module(&self) -> &Arc<RetargetingModuleSymbol> {
        &self.primary_module
    }

    /// Binds the assembly to the new reference set. The core library is the
    /// first reference that is one, or else the one those references bind
    /// against.
    ///
    /// # Panics
    /// If references were already set.
    pub fn set_references(&self, references: Vec<AssemblyRef>) {
        let cor_library = references
            .iter()
            .find(|r| r.is_cor_library())
            .cloned()
            .or_else(|| references.iter().find_map(|r| r.cor_library()));
        assert!(
            self.cor_library.set(cor_library).is_ok(),
            "references of retargeting assembly {} are already set",
            self.underlying.identity()
        );
        self.primary_module.set_references(references);
    }

    /// Canonical types discovered so far for local embedded interop types.
    pub fn no_pia_unification_map(&self) -> &DashMap<NamedTypeRef, TypeSymbol> {
        &self.no_pia_unification_map
    }

    /// Records `canonical` as the unification of `local` unless another
    /// thread got there first. Returns the recorded value.
    pub fn unify_no_pia_type(&self, local: NamedTypeRef, canonical: TypeSymbol) -> TypeSymbol {
        let entry = self
            .no_pia_unification_map
            .entry(local)
            .or_insert_with(|| {
                trace!(canonical = %canonical, "RetargetingAssemblySymbol::unify_no_pia_type");
                canonical
            });
        entry.value().clone()
    }
}

impl fmt::Debug for RetargetingAssemblySymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RetargetingAssemblySymbol({})", self.underlying.identity())
    }
}

impl Symbol for RetargetingAssemblySymbol {
    fn kind(&self) -> SymbolKind {
        SymbolKind::Assembly
    }

    fn name(&self) -> &str {
        self.underlying.name()
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
        self.underlying.locations()
    }

    fn attributes(&self) -> Arc<[AttributeData]> {
        self.primary_module
            .translator()
            .get_retargeted_attributes(&self.attributes, || self.underlying.attributes())
    }

    fn is_retargeting(&self) -> bool {
        true
    }
}

impl AssemblySymbol for RetargetingAssemblySymbol {
    fn identity(&self) -> &AssemblyIdentity {
        self.underlying.identity()
    }

    fn modules(&self) -> Arc<[ModuleRef]> {
        self.modules.clone()
    }

    fn cor_library(&self) -> Option<AssemblyRef> {
        self.cor_library.get().cloned().flatten()
    }

    fn get_declared_special_type(&self, special: SpecialType) -> Option<NamedTypeRef> {
        panic!(
            "retargeting assembly {} never declares special type {special:?}",
            self.identity()
        )
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
            self.identity()
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
            self.identity()
        );
    }

    /// Follows the underlying assembly's forwarders, then retargets what
    /// they lead to by name.
    fn try_lookup_forwarded_type_with_cycle_detection(
        &self,
        name: &MetadataTypeName,
        visited: &mut ForwardingVisited,
    ) -> ForwardedTypeLookup {
        let found = match self
            .underlying
            .try_lookup_forwarded_type_with_cycle_detection(name, visited)
        {
            ForwardedTypeLookup::Found(found) => found,
            unresolved => return unresolved,
        };
        match self
            .primary_module
            .translator()
            .retarget_named_type(&found, RetargetOptions::RetargetPrimitiveTypesByName)
        {
            TypeSymbol::Named(handle) => ForwardedTypeLookup::Found(handle.get()),
            TypeSymbol::Error(missing) if missing.reason == MissingTypeReason::ForwardingCycle => {
                ForwardedTypeLookup::Cycle
            }
            _ => ForwardedTypeLookup::NotFound,
        }
    }
}
