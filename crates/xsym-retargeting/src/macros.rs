/// `Symbol` methods shared by every retargeting member wrapper.
///
/// Expects the wrapper to have an `underlying` field, an `attributes`
/// `LazyField`, and a `module()` accessor.
macro_rules! retargeting_symbol_common {
    ($kind:expr) => {
        fn kind(&self) -> xsym_symbols::SymbolKind {
            $kind
        }

        fn name(&self) -> &str {
            self.underlying.name()
        }

        fn containing_symbol(&self) -> Option<xsym_symbols::SymbolRef> {
            let container = self.underlying.containing_symbol()?;
            Some(self.module().translator().retarget_symbol(&container))
        }

        fn containing_assembly(&self) -> Option<xsym_symbols::AssemblyRef> {
            self.module().containing_assembly()
        }

        fn containing_module(&self) -> Option<xsym_symbols::ModuleRef> {
            Some(self.module() as xsym_symbols::ModuleRef)
        }

        fn declared_accessibility(&self) -> xsym_symbols::Accessibility {
            self.underlying.declared_accessibility()
        }

        fn locations(&self) -> std::sync::Arc<[xsym_common::Location]> {
            self.underlying.locations()
        }

        fn attributes(&self) -> std::sync::Arc<[xsym_symbols::AttributeData]> {
            self.module()
                .translator()
                .get_retargeted_attributes(&self.attributes, || self.underlying.attributes())
        }

        fn declaring_compilation(&self) -> Option<xsym_symbols::CompilationId> {
            None
        }

        fn is_implicitly_declared(&self) -> bool {
            self.underlying.is_implicitly_declared()
        }

        fn is_retargeting(&self) -> bool {
            true
        }

        fn metadata_handle(&self) -> Option<xsym_symbols::EntityHandle> {
            self.underlying.metadata_handle()
        }
    };
}

/// Upgrades a wrapper's weak module link.
macro_rules! upgrade_module {
    ($weak:expr) => {
        match $weak.upgrade() {
            Some(module) => module,
            None => panic!("retargeting module dropped while its symbols are still in use"),
        }
    };
}
