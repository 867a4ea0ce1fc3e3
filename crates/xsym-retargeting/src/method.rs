use crate::module::RetargetingModuleSymbol;
use crate::parameter::{ParameterOwner, RetargetingParameterSymbol};
use crate::translator::{RetargetOptions, first_missing_diagnostic};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;
use xsym_common::Diagnostic;
use xsym_symbols::{
    AttributeData, CallingConvention, CustomModifier, FieldState, LazyField, MarshalInfo,
    MemberFlags, MethodKind, MethodRef, MethodSignatureComparer, MethodSymbol, NamedTypeRef,
    ParameterRef, RefKind, Symbol, SymbolKind, SymbolRef, SynthesizedInfo, TypeParameterSymbol,
    TypeSymbol,
};

/// A method of the underlying module, seen through the retargeting module.
///
/// Only members that mention types are recomputed; flags, names, kind and
/// locations are read from the underlying method.
pub struct RetargetingMethodSymbol {
    module: Weak<RetargetingModuleSymbol>,
    underlying: MethodRef,
    self_ref: Weak<RetargetingMethodSymbol>,
    type_parameters: LazyField<Arc<[TypeParameterSymbol]>>,
    parameters: LazyField<Arc<[ParameterRef]>>,
    return_type: LazyField<TypeSymbol>,
    return_type_custom_modifiers: LazyField<Arc<[CustomModifier]>>,
    attributes: LazyField<Arc<[AttributeData]>>,
    return_type_attributes: LazyField<Arc<[AttributeData]>>,
    explicit_interface_implementations: LazyField<Arc<[MethodRef]>>,
    use_site_diagnostic: LazyField<Option<Diagnostic>>,
}

impl RetargetingMethodSymbol {
    pub(crate) fn new(module: Weak<RetargetingModuleSymbol>, underlying: MethodRef) -> Arc<Self> {
        assert!(
            !underlying.is_retargeting(),
            "cannot wrap a retargeting method symbol ({})",
            underlying.name()
        );
        Arc::new_cyclic(|self_ref| Self {
            module,
            underlying,
            self_ref: self_ref.clone(),
            type_parameters: LazyField::new(),
            parameters: LazyField::new(),
            return_type: LazyField::new(),
            return_type_custom_modifiers: LazyField::new(),
            attributes: LazyField::new(),
            return_type_attributes: LazyField::new(),
            explicit_interface_implementations: LazyField::new(),
            use_site_diagnostic: LazyField::new(),
        })
    }

    pub fn underlying_method(&self) -> &MethodRef {
        &self.underlying
    }

    pub(crate) fn module(&self) -> Arc<RetargetingModuleSymbol> {
        upgrade_module!(self.module)
    }

    /// Whether the use-site diagnostic was computed yet, and its value.
    pub fn use_site_diagnostic_state(&self) -> FieldState<'_, Option<Diagnostic>> {
        self.use_site_diagnostic.state()
    }

    fn compute_use_site_diagnostic(&self) -> Option<Diagnostic> {
        let return_type = self.return_type();
        let parameter_types: Vec<TypeSymbol> = self.parameters().iter().map(|p| p.ty()).collect();
        first_missing_diagnostic(std::iter::once(&return_type).chain(&parameter_types))
    }
}

impl fmt::Debug for RetargetingMethodSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RetargetingMethodSymbol({})", self.underlying.name())
    }
}

impl Symbol for RetargetingMethodSymbol {
    retargeting_symbol_common!(SymbolKind::Method);

    fn use_site_diagnostic(&self) -> Option<Diagnostic> {
        self.use_site_diagnostic
            .get_or_init(|| self.compute_use_site_diagnostic())
            .clone()
    }
}

impl MethodSymbol for RetargetingMethodSymbol {
    fn method_kind(&self) -> MethodKind {
        self.underlying.method_kind()
    }

    fn flags(&self) -> MemberFlags {
        self.underlying.flags()
    }

    fn calling_convention(&self) -> CallingConvention {
        self.underlying.calling_convention()
    }

    fn arity(&self) -> usize {
        self.underlying.arity()
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

    fn return_type(&self) -> TypeSymbol {
        self.return_type
            .get_or_init(|| {
                self.module().translator().retarget_type(
                    &self.underlying.return_type(),
                    RetargetOptions::RetargetPrimitiveTypesByTypeCode,
                )
            })
            .clone()
    }

    fn return_ref_kind(&self) -> RefKind {
        self.underlying.return_ref_kind()
    }

    fn return_type_custom_modifiers(&self) -> Arc<[CustomModifier]> {
        self.module().translator().get_retargeted_modifiers(
            &self.return_type_custom_modifiers,
            || self.underlying.return_type_custom_modifiers(),
        )
    }

    fn return_type_attributes(&self) -> Arc<[AttributeData]> {
        self.module()
            .translator()
            .get_retargeted_attributes(&self.return_type_attributes, || {
                self.underlying.return_type_attributes()
            })
    }

    fn return_value_marshalling_info(&self) -> Option<MarshalInfo> {
        self.module()
            .translator()
            .retarget_marshalling(self.underlying.return_value_marshalling_info())
    }

    fn parameters(&self) -> Arc<[ParameterRef]> {
        self.parameters
            .get_or_init(|| {
                self.underlying
                    .parameters()
                    .iter()
                    .map(|parameter| {
                        RetargetingParameterSymbol::new(
                            ParameterOwner::OwnedByMethod(self.self_ref.clone()),
                            parameter.clone(),
                        ) as ParameterRef
                    })
                    .collect()
            })
            .clone()
    }

    /// Implementations whose interface method has no structural match in the
    /// retargeted interface are left out.
    fn explicit_interface_implementations(&self) -> Arc<[MethodRef]> {
        self.explicit_interface_implementations
            .get_or_init(|| {
                let module = self.module();
                let translator = module.translator();
                self.underlying
                    .explicit_interface_implementations()
                    .iter()
                    .filter_map(|implemented| {
                        let retargeted = translator.retarget_method(
                            implemented,
                            &MethodSignatureComparer::RETARGETED_EXPLICIT_IMPLEMENTATION,
                        );
                        if retargeted.is_none() {
                            debug!(
                                method = %SymbolRef::Method(self.underlying.clone()),
                                implemented = %SymbolRef::Method(implemented.clone()),
                                "RetargetingMethodSymbol::drop explicit implementation"
                            );
                        }
                        retargeted
                    })
                    .collect()
            })
            .clone()
    }

    fn containing_type(&self) -> Option<NamedTypeRef> {
        let containing = self.underlying.containing_type()?;
        Some(self.module().translator().retarget_type_definition(&containing))
    }

    fn associated_symbol(&self) -> Option<SymbolRef> {
        let associated = self.underlying.associated_symbol()?;
        Some(self.module().translator().retarget_symbol(&associated))
    }

    fn partial_definition_part(&self) -> Option<MethodRef> {
        let part = self.underlying.partial_definition_part()?;
        Some(self.module().translator().retarget_method_definition(&part))
    }

    fn partial_implementation_part(&self) -> Option<MethodRef> {
        let part = self.underlying.partial_implementation_part()?;
        Some(self.module().translator().retarget_method_definition(&part))
    }

    fn synthesized_info(&self) -> Option<SynthesizedInfo> {
        let info = self.underlying.synthesized_info()?;
        Some(self.module().translator().retarget_synthesized_info(info))
    }

    fn calculate_local_syntax_offset(&self, position: u32) -> i32 {
        self.underlying.calculate_local_syntax_offset(position)
    }
}
