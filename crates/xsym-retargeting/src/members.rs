//! Properties, fields and events of retargeted types.

use crate::module::RetargetingModuleSymbol;
use crate::parameter::{ParameterOwner, RetargetingParameterSymbol};
use crate::translator::RetargetOptions;
use std::fmt;
use std::sync::{Arc, Weak};
use xsym_symbols::{
    AttributeData, ConstantValue, CustomModifier, EventRef, EventSymbol, FieldRef, FieldSymbol,
    LazyField, MarshalInfo, MemberFlags, MethodRef, NamedTypeRef, ParameterRef, PropertyRef,
    PropertySymbol, RefKind, Symbol, SymbolKind, SymbolRef, SynthesizedInfo, TypeSymbol,
};

// =============================================================================
// Properties
// =============================================================================

pub struct RetargetingPropertySymbol {
    module: Weak<RetargetingModuleSymbol>,
    underlying: PropertyRef,
    self_ref: Weak<RetargetingPropertySymbol>,
    ty: LazyField<TypeSymbol>,
    type_custom_modifiers: LazyField<Arc<[CustomModifier]>>,
    parameters: LazyField<Arc<[ParameterRef]>>,
    attributes: LazyField<Arc<[AttributeData]>>,
}

impl RetargetingPropertySymbol {
    pub(crate) fn new(module: Weak<RetargetingModuleSymbol>, underlying: PropertyRef) -> Arc<Self> {
        assert!(
            !underlying.is_retargeting(),
            "cannot wrap a retargeting property symbol ({})",
            underlying.name()
        );
        Arc::new_cyclic(|self_ref| Self {
            module,
            underlying,
            self_ref: self_ref.clone(),
            ty: LazyField::new(),
            type_custom_modifiers: LazyField::new(),
            parameters: LazyField::new(),
            attributes: LazyField::new(),
        })
    }

    pub fn underlying_property(&self) -> &PropertyRef {
        &self.underlying
    }

    pub(crate) fn module(&self) -> Arc<RetargetingModuleSymbol> {
        upgrade_module!(self.module)
    }
}

impl fmt::Debug for RetargetingPropertySymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RetargetingPropertySymbol({})", self.underlying.name())
    }
}

impl Symbol for RetargetingPropertySymbol {
    retargeting_symbol_common!(SymbolKind::Property);
}

impl PropertySymbol for RetargetingPropertySymbol {
    fn ty(&self) -> TypeSymbol {
        self.ty
            .get_or_init(|| {
                self.module().translator().retarget_type(
                    &self.underlying.ty(),
                    RetargetOptions::RetargetPrimitiveTypesByTypeCode,
                )
            })
            .clone()
    }

    fn ref_kind(&self) -> RefKind {
        self.underlying.ref_kind()
    }

    fn type_custom_modifiers(&self) -> Arc<[CustomModifier]> {
        self.module()
            .translator()
            .get_retargeted_modifiers(&self.type_custom_modifiers, || {
                self.underlying.type_custom_modifiers()
            })
    }

    fn flags(&self) -> MemberFlags {
        self.underlying.flags()
    }

    fn parameters(&self) -> Arc<[ParameterRef]> {
        self.parameters
            .get_or_init(|| {
                self.underlying
                    .parameters()
                    .iter()
                    .map(|parameter| {
                        RetargetingParameterSymbol::new(
                            ParameterOwner::OwnedByProperty(self.self_ref.clone()),
                            parameter.clone(),
                        ) as ParameterRef
                    })
                    .collect()
            })
            .clone()
    }

    fn get_method(&self) -> Option<MethodRef> {
        let getter = self.underlying.get_method()?;
        Some(self.module().translator().retarget_method_definition(&getter))
    }

    fn set_method(&self) -> Option<MethodRef> {
        let setter = self.underlying.set_method()?;
        Some(self.module().translator().retarget_method_definition(&setter))
    }

    fn containing_type(&self) -> Option<NamedTypeRef> {
        let containing = self.underlying.containing_type()?;
        Some(self.module().translator().retarget_type_definition(&containing))
    }
}

// =============================================================================
// Fields
// =============================================================================

pub struct RetargetingFieldSymbol {
    module: Weak<RetargetingModuleSymbol>,
    underlying: FieldRef,
    ty: LazyField<TypeSymbol>,
    custom_modifiers: LazyField<Arc<[CustomModifier]>>,
    attributes: LazyField<Arc<[AttributeData]>>,
    marshalling_info: LazyField<Option<MarshalInfo>>,
}

impl RetargetingFieldSymbol {
    pub(crate) fn new(module: Weak<RetargetingModuleSymbol>, underlying: FieldRef) -> Arc<Self> {
        assert!(
            !underlying.is_retargeting(),
            "cannot wrap a retargeting field symbol ({})",
            underlying.name()
        );
        Arc::new(Self {
            module,
            underlying,
            ty: LazyField::new(),
            custom_modifiers: LazyField::new(),
            attributes: LazyField::new(),
            marshalling_info: LazyField::new(),
        })
    }

    pub fn underlying_field(&self) -> &FieldRef {
        &self.underlying
    }

    pub(crate) fn module(&self) -> Arc<RetargetingModuleSymbol> {
        upgrade_module!(self.module)
    }
}

impl fmt::Debug for RetargetingFieldSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RetargetingFieldSymbol({})", self.underlying.name())
    }
}

impl Symbol for RetargetingFieldSymbol {
    retargeting_symbol_common!(SymbolKind::Field);
}

impl FieldSymbol for RetargetingFieldSymbol {
    fn ty(&self) -> TypeSymbol {
        self.ty
            .get_or_init(|| {
                self.module().translator().retarget_type(
                    &self.underlying.ty(),
                    RetargetOptions::RetargetPrimitiveTypesByTypeCode,
                )
            })
            .clone()
    }

    fn custom_modifiers(&self) -> Arc<[CustomModifier]> {
        self.module()
            .translator()
            .get_retargeted_modifiers(&self.custom_modifiers, || self.underlying.custom_modifiers())
    }

    fn flags(&self) -> MemberFlags {
        self.underlying.flags()
    }

    fn constant_value(&self) -> Option<ConstantValue> {
        self.underlying.constant_value()
    }

    fn marshalling_info(&self) -> Option<MarshalInfo> {
        self.marshalling_info
            .get_or_init(|| {
                self.module()
                    .translator()
                    .retarget_marshalling(self.underlying.marshalling_info())
            })
            .clone()
    }

    fn associated_symbol(&self) -> Option<SymbolRef> {
        let associated = self.underlying.associated_symbol()?;
        Some(self.module().translator().retarget_symbol(&associated))
    }

    fn synthesized_info(&self) -> Option<SynthesizedInfo> {
        let info = self.underlying.synthesized_info()?;
        Some(self.module().translator().retarget_synthesized_info(info))
    }

    fn containing_type(&self) -> Option<NamedTypeRef> {
        let containing = self.underlying.containing_type()?;
        Some(self.module().translator().retarget_type_definition(&containing))
    }
}

// =============================================================================
// Events
// =============================================================================

pub struct RetargetingEventSymbol {
    module: Weak<RetargetingModuleSymbol>,
    underlying: EventRef,
    ty: LazyField<TypeSymbol>,
    attributes: LazyField<Arc<[AttributeData]>>,
}

impl RetargetingEventSymbol {
    pub(crate) fn new(module: Weak<RetargetingModuleSymbol>, underlying: EventRef) -> Arc<Self> {
        assert!(
            !underlying.is_retargeting(),
            "cannot wrap a retargeting event symbol ({})",
            underlying.name()
        );
        Arc::new(Self {
            module,
            underlying,
            ty: LazyField::new(),
            attributes: LazyField::new(),
        })
    }

    pub fn underlying_event(&self) -> &EventRef {
        &self.underlying
    }

    pub(crate) fn module(&self) -> Arc<RetargetingModuleSymbol> {
        upgrade_module!(self.module)
    }
}

impl fmt::Debug for RetargetingEventSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RetargetingEventSymbol({})", self.underlying.name())
    }
}

impl Symbol for RetargetingEventSymbol {
    retargeting_symbol_common!(SymbolKind::Event);
}

impl EventSymbol for RetargetingEventSymbol {
    fn ty(&self) -> TypeSymbol {
        self.ty
            .get_or_init(|| {
                self.module().translator().retarget_type(
                    &self.underlying.ty(),
                    RetargetOptions::RetargetPrimitiveTypesByTypeCode,
                )
            })
            .clone()
    }

    fn flags(&self) -> MemberFlags {
        self.underlying.flags()
    }

    fn add_method(&self) -> Option<MethodRef> {
        let adder = self.underlying.add_method()?;
        Some(self.module().translator().retarget_method_definition(&adder))
    }

    fn remove_method(&self) -> Option<MethodRef> {
        let remover = self.underlying.remove_method()?;
        Some(self.module().translator().retarget_method_definition(&remover))
    }

    fn containing_type(&self) -> Option<NamedTypeRef> {
        let containing = self.underlying.containing_type()?;
        Some(self.module().translator().retarget_type_definition(&containing))
    }
}
