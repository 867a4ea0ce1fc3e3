use crate::members::RetargetingPropertySymbol;
use crate::method::RetargetingMethodSymbol;
use crate::module::RetargetingModuleSymbol;
use crate::translator::RetargetOptions;
use std::fmt;
use std::sync::{Arc, Weak};
use xsym_common::Location;
use xsym_symbols::{
    Accessibility, AssemblyRef, AttributeData, ConstantValue, CustomModifier, EntityHandle,
    LazyField, MarshalInfo, ModuleRef, ParameterFlags, ParameterSymbol, RefKind, Symbol,
    SymbolKind, SymbolRef, TypeSymbol,
};

/// The retargeted member a parameter belongs to. The owner decides which
/// retargeting module the parameter's types are translated through.
#[derive(Clone)]
pub enum ParameterOwner {
    OwnedByMethod(Weak<RetargetingMethodSymbol>),
    OwnedByProperty(Weak<RetargetingPropertySymbol>),
}

impl ParameterOwner {
    pub fn symbol(&self) -> Option<SymbolRef> {
        match self {
            Self::OwnedByMethod(method) => method.upgrade().map(|m| SymbolRef::Method(m)),
            Self::OwnedByProperty(property) => property.upgrade().map(|p| SymbolRef::Property(p)),
        }
    }

    fn module(&self) -> Arc<RetargetingModuleSymbol> {
        let module = match self {
            Self::OwnedByMethod(method) => method.upgrade().map(|m| m.module()),
            Self::OwnedByProperty(property) => property.upgrade().map(|p| p.module()),
        };
        match module {
            Some(module) => module,
            None => panic!("retargeted parameter outlived the member that owns it"),
        }
    }
}

impl fmt::Debug for ParameterOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OwnedByMethod(_) => f.write_str("OwnedByMethod"),
            Self::OwnedByProperty(_) => f.write_str("OwnedByProperty"),
        }
    }
}

/// A parameter of a retargeted method or property.
///
/// Ordinal, ref kind, flags and default value pass through; type, custom
/// modifiers, attributes and marshalling are retargeted.
pub struct RetargetingParameterSymbol {
    owner: ParameterOwner,
    underlying: Arc<dyn ParameterSymbol>,
    ty: LazyField<TypeSymbol>,
    custom_modifiers: LazyField<Arc<[CustomModifier]>>,
    attributes: LazyField<Arc<[AttributeData]>>,
    marshalling_info: LazyField<Option<MarshalInfo>>,
}

impl RetargetingParameterSymbol {
    pub(crate) fn new(owner: ParameterOwner, underlying: Arc<dyn ParameterSymbol>) -> Arc<Self> {
        assert!(
            !underlying.is_retargeting(),
            "cannot wrap a retargeting parameter symbol ({})",
            underlying.name()
        );
        Arc::new(Self {
            owner,
            underlying,
            ty: LazyField::new(),
            custom_modifiers: LazyField::new(),
            attributes: LazyField::new(),
            marshalling_info: LazyField::new(),
        })
    }

    pub fn owner(&self) -> &ParameterOwner {
        &self.owner
    }

    pub fn underlying_parameter(&self) -> &Arc<dyn ParameterSymbol> {
        &self.underlying
    }
}

impl fmt::Debug for RetargetingParameterSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RetargetingParameterSymbol({} #{}, {:?})",
            self.underlying.name(),
            self.underlying.ordinal(),
            self.owner
        )
    }
}

impl Symbol for RetargetingParameterSymbol {
    fn kind(&self) -> SymbolKind {
        SymbolKind::Parameter
    }

    fn name(&self) -> &str {
        self.underlying.name()
    }

    fn containing_symbol(&self) -> Option<SymbolRef> {
        self.owner.symbol()
    }

    fn containing_assembly(&self) -> Option<AssemblyRef> {
        self.owner.module().containing_assembly()
    }

    fn containing_module(&self) -> Option<ModuleRef> {
        Some(self.owner.module() as ModuleRef)
    }

    fn declared_accessibility(&self) -> Accessibility {
        self.underlying.declared_accessibility()
    }

    fn locations(&self) -> Arc<[Location]> {
        self.underlying.locations()
    }

    fn attributes(&self) -> Arc<[AttributeData]> {
        self.owner
            .module()
            .translator()
            .get_retargeted_attributes(&self.attributes, || self.underlying.attributes())
    }

    fn is_implicitly_declared(&self) -> bool {
        self.underlying.is_implicitly_declared()
    }

    fn is_retargeting(&self) -> bool {
        true
    }

    fn metadata_handle(&self) -> Option<EntityHandle> {
        self.underlying.metadata_handle()
    }
}

impl ParameterSymbol for RetargetingParameterSymbol {
    fn ordinal(&self) -> usize {
        self.underlying.ordinal()
    }

    fn ty(&self) -> TypeSymbol {
        self.ty
            .get_or_init(|| {
                self.owner.module().translator().retarget_type(
                    &self.underlying.ty(),
                    RetargetOptions::RetargetPrimitiveTypesByTypeCode,
                )
            })
            .clone()
    }

    fn ref_kind(&self) -> RefKind {
        self.underlying.ref_kind()
    }

    fn flags(&self) -> ParameterFlags {
        self.underlying.flags()
    }

    fn explicit_default_value(&self) -> Option<ConstantValue> {
        self.underlying.explicit_default_value()
    }

    fn custom_modifiers(&self) -> Arc<[CustomModifier]> {
        self.owner
            .module()
            .translator()
            .get_retargeted_modifiers(&self.custom_modifiers, || self.underlying.custom_modifiers())
    }

    fn marshalling_info(&self) -> Option<MarshalInfo> {
        self.marshalling_info
            .get_or_init(|| {
                self.owner
                    .module()
                    .translator()
                    .retarget_marshalling(self.underlying.marshalling_info())
            })
            .clone()
    }
}
