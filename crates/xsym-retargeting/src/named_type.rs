use crate::module::RetargetingModuleSymbol;
use crate::translator::{RetargetOptions, first_missing_diagnostic};
use std::fmt;
use std::sync::{Arc, Weak};
use xsym_common::Diagnostic;
use xsym_symbols::{
    AnonymousTypeKey, AttributeData, LazyField, MemberFlags, NamedTypeRef, NamedTypeSymbol,
    SpecialType, Symbol, SymbolKind, SymbolRef, SynthesizedInfo, TypeIdentifier, TypeKind,
    TypeParameterSymbol, TypeSymbol,
};

/// A type of the underlying module, seen through the retargeting module.
pub struct RetargetingNamedTypeSymbol {
    module: Weak<RetargetingModuleSymbol>,
    underlying: NamedTypeRef,
    type_parameters: LazyField<Arc<[TypeParameterSymbol]>>,
    base_type: LazyField<Option<TypeSymbol>>,
    interfaces: LazyField<Arc<[TypeSymbol]>>,
    members: LazyField<Arc<[SymbolRef]>>,
    attributes: LazyField<Arc<[AttributeData]>>,
    use_site_diagnostic: LazyField<Option<Diagnostic>>,
}

impl RetargetingNamedTypeSymbol {
    pub(crate) fn new(
        module: Weak<RetargetingModuleSymbol>,
        underlying: NamedTypeRef,
    ) -> Arc<Self> {
        assert!(
            !underlying.is_retargeting(),
            "cannot wrap a retargeting named type symbol ({})",
            underlying.full_name()
        );
        Arc::new(Self {
            module,
            underlying,
            type_parameters: LazyField::new(),
            base_type: LazyField::new(),
            interfaces: LazyField::new(),
            members: LazyField::new(),
            attributes: LazyField::new(),
            use_site_diagnostic: LazyField::new(),
        })
    }

    pub fn underlying_named_type(&self) -> &NamedTypeRef {
        &self.underlying
    }

    pub(crate) fn module(&self) -> Arc<RetargetingModuleSymbol> {
        upgrade_module!(self.module)
    }
}

impl fmt::Debug for RetargetingNamedTypeSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RetargetingNamedTypeSymbol({})", self.underlying.full_name())
    }
}

impl Symbol for RetargetingNamedTypeSymbol {
    retargeting_symbol_common!(SymbolKind::NamedType);

    fn use_site_diagnostic(&self) -> Option<Diagnostic> {
        self.use_site_diagnostic
            .get_or_init(|| first_missing_diagnostic(self.base_type().iter()))
            .clone()
    }
}

impl NamedTypeSymbol for RetargetingNamedTypeSymbol {
    fn namespace(&self) -> &str {
        self.underlying.namespace()
    }

    fn arity(&self) -> usize {
        self.underlying.arity()
    }

    fn type_kind(&self) -> TypeKind {
        self.underlying.type_kind()
    }

    fn flags(&self) -> MemberFlags {
        self.underlying.flags()
    }

    fn special_type(&self) -> Option<SpecialType> {
        self.underlying.special_type()
    }

    fn containing_type(&self) -> Option<NamedTypeRef> {
        let outer = self.underlying.containing_type()?;
        Some(self.module().translator().retarget_type_definition(&outer))
    }

    fn type_parameters(&self) -> Arc<[TypeParameterSymbol]> {
        self.type_parameters
            .get_or_init(|| {
                self.module()
                    .translator()
                    .retarget_type_parameters(&self.underlying.type_parameters())
            })
            .clone()
    }

    fn base_type(&self) -> Option<TypeSymbol> {
        self.base_type
            .get_or_init(|| {
                let base = self.underlying.base_type()?;
                Some(
                    self.module()
                        .translator()
                        .retarget_type(&base, RetargetOptions::RetargetPrimitiveTypesByTypeCode),
                )
            })
            .clone()
    }

    fn interfaces(&self) -> Arc<[TypeSymbol]> {
        self.interfaces
            .get_or_init(|| {
                let module = self.module();
                let translator = module.translator();
                let options = RetargetOptions::RetargetPrimitiveTypesByTypeCode;
                self.underlying
                    .interfaces()
                    .iter()
                    .map(|interface| translator.retarget_type(interface, options))
                    .collect()
            })
            .clone()
    }

    fn members(&self) -> Arc<[SymbolRef]> {
        self.members
            .get_or_init(|| {
                let module = self.module();
                let translator = module.translator();
                self.underlying
                    .members()
                    .iter()
                    .map(|member| translator.retarget_member_definition(member))
                    .collect()
            })
            .clone()
    }

    fn anonymous_type_key(&self) -> Option<AnonymousTypeKey> {
        self.underlying.anonymous_type_key()
    }

    fn synthesized_info(&self) -> Option<SynthesizedInfo> {
        let info = self.underlying.synthesized_info()?;
        Some(self.module().translator().retarget_synthesized_info(info))
    }

    fn no_pia_local_identity(&self) -> Option<TypeIdentifier> {
        self.underlying.no_pia_local_identity()
    }

    fn type_identifier(&self) -> Option<TypeIdentifier> {
        self.underlying.type_identifier()
    }
}
