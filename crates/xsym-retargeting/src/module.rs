use crate::assembly::RetargetingAssemblySymbol;
use crate::translator::RetargetingSymbolTranslator;
use dashmap::DashMap;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};
use tracing::{debug, trace};
use xsym_common::Location;
use xsym_symbols::{
    AssemblyRef, AttributeData, LazyField, ModuleRef, ModuleSymbol, NamedTypeRef, Symbol,
    SymbolKind, SymbolRef, TypeSymbol,
};

/// Where references to one underlying assembly are redirected, plus the
/// type translations already performed against it.
pub(crate) struct DestinationData {
    pub(crate) to: AssemblyRef,
    pub(crate) symbol_map: DashMap<NamedTypeRef, TypeSymbol>,
}

/// Wraps the manifest module of a retargeted assembly.
///
/// Owns every wrapper created for symbols defined in the underlying module;
/// wrappers point back at the module weakly.
pub struct RetargetingModuleSymbol {
    assembly: Weak<RetargetingAssemblySymbol>,
    underlying: ModuleRef,
    self_ref: Weak<RetargetingModuleSymbol>,
    /// Underlying symbol -> its wrapper.
    symbol_map: DashMap<SymbolRef, SymbolRef>,
    retargeting_assembly_map: OnceLock<FxHashMap<AssemblyRef, DestinationData>>,
    referenced_assemblies: OnceLock<Arc<[AssemblyRef]>>,
    types: LazyField<Arc<[NamedTypeRef]>>,
    attributes: LazyField<Arc<[AttributeData]>>,
}

impl RetargetingModuleSymbol {
    pub(crate) fn new(
        assembly: Weak<RetargetingAssemblySymbol>,
        underlying: ModuleRef,
    ) -> Arc<Self> {
        assert!(
            !underlying.is_retargeting(),
            "cannot retarget module {}: it is already a retargeting module",
            underlying.name()
        );
        Arc::new_cyclic(|self_ref| Self {
            assembly,
            underlying,
            self_ref: self_ref.clone(),
            symbol_map: DashMap::new(),
            retargeting_assembly_map: OnceLock::new(),
            referenced_assemblies: OnceLock::new(),
            types: LazyField::new(),
            attributes: LazyField::new(),
        })
    }

    pub fn underlying_module(&self) -> &ModuleRef {
        &self.underlying
    }

    pub fn retargeting_assembly(&self) -> Arc<RetargetingAssemblySymbol> {
        match self.assembly.upgrade() {
            Some(assembly) => assembly,
            None => panic!("retargeting assembly dropped while its module is still in use"),
        }
    }

    pub fn translator(&self) -> RetargetingSymbolTranslator<'_> {
        RetargetingSymbolTranslator::new(self)
    }

    pub(crate) fn self_weak(&self) -> Weak<RetargetingModuleSymbol> {
        self.self_ref.clone()
    }

    pub(crate) fn self_arc(&self) -> Arc<RetargetingModuleSymbol> {
        upgrade_module!(self.self_ref)
    }

    /// Binds the module to its new reference set.
    ///
    /// `references` are paired positionally with the underlying module's
    /// references, skipping underlying references that are linked. Every
    /// pair whose two sides differ redirects the underlying assembly to the
    /// new one.
    ///
    /// # Panics
    /// If references were already set.
    pub fn set_references(&self, references: Vec<AssemblyRef>) {
        let underlying_references = self.underlying.referenced_assemblies();
        let mut map: FxHashMap<AssemblyRef, DestinationData> = FxHashMap::default();
        let mut j = 0;
        for new_reference in &references {
            while underlying_references
                .get(j)
                .is_some_and(|old| old.is_linked())
            {
                j += 1;
            }
            let Some(old_reference) = underlying_references.get(j) else {
                break;
            };
            if old_reference != new_reference {
                debug!(
                    module = %self.underlying.name(),
                    from = %old_reference.identity(),
                    to = %new_reference.identity(),
                    "RetargetingModuleSymbol::set_references"
                );
                map.entry(old_reference.clone())
                    .or_insert_with(|| DestinationData {
                        to: new_reference.clone(),
                        symbol_map: DashMap::new(),
                    });
            }
            j += 1;
        }
        assert!(
            self.retargeting_assembly_map.set(map).is_ok(),
            "references of retargeting module {} are already set",
            self.underlying.name()
        );
        let stored = self.referenced_assemblies.set(references.into()).is_ok();
        debug_assert!(
            stored,
            "referenced assemblies of retargeting module {} set twice",
            self.underlying.name()
        );
    }

    pub(crate) fn destination(
        &self,
        underlying_assembly: &AssemblyRef,
    ) -> Option<&DestinationData> {
        self.retargeting_assembly_map
            .get()?
            .get(underlying_assembly)
    }

    /// Underlying assemblies redirected by this module, with their targets.
    pub fn retargeted_assemblies(&self) -> Vec<(AssemblyRef, AssemblyRef)> {
        self.retargeting_assembly_map
            .get()
            .map(|map| {
                map.iter()
                    .map(|(from, data)| (from.clone(), data.to.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the wrapper cached for `underlying`, creating it if absent.
    ///
    /// `create` runs under the map's shard lock and must not call back into
    /// this module.
    pub(crate) fn get_or_create_wrapper(
        &self,
        underlying: SymbolRef,
        create: impl FnOnce() -> SymbolRef,
    ) -> SymbolRef {
        if let Some(existing) = self.symbol_map.get(&underlying) {
            return existing.value().clone();
        }
        let entry = self.symbol_map.entry(underlying).or_insert_with(|| {
            let wrapper = create();
            trace!(
                kind = ?wrapper.kind(),
                name = %wrapper.name(),
                "RetargetingModuleSymbol::create_wrapper"
            );
            wrapper
        });
        entry.value().clone()
    }

    /// Number of wrappers created so far.
    pub fn wrapper_count(&self) -> usize {
        self.symbol_map.len()
    }
}

impl fmt::Debug for RetargetingModuleSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RetargetingModuleSymbol({})", self.underlying.name())
    }
}

impl Symbol for RetargetingModuleSymbol {
    fn kind(&self) -> SymbolKind {
        SymbolKind::NetModule
    }

    fn name(&self) -> &str {
        self.underlying.name()
    }

    fn containing_symbol(&self) -> Option<SymbolRef> {
        Some(SymbolRef::Assembly(self.retargeting_assembly()))
    }

    fn containing_assembly(&self) -> Option<AssemblyRef> {
        Some(self.retargeting_assembly() as AssemblyRef)
    }

    fn containing_module(&self) -> Option<ModuleRef> {
        None
    }

    fn locations(&self) -> Arc<[Location]> {
        self.underlying.locations()
    }

    fn attributes(&self) -> Arc<[AttributeData]> {
        self.translator()
            .get_retargeted_attributes(&self.attributes, || self.underlying.attributes())
    }

    fn is_retargeting(&self) -> bool {
        true
    }
}

impl ModuleSymbol for RetargetingModuleSymbol {
    fn ordinal(&self) -> usize {
        0
    }

    fn referenced_assemblies(&self) -> Arc<[AssemblyRef]> {
        self.referenced_assemblies
            .get()
            .cloned()
            .unwrap_or_else(|| Arc::from([]))
    }

    fn types(&self) -> Arc<[NamedTypeRef]> {
        self.types
            .get_or_init(|| {
                let translator = self.translator();
                self.underlying
                    .types()
                    .iter()
                    .map(|ty| translator.retarget_type_definition(ty))
                    .collect()
            })
            .clone()
    }
}
