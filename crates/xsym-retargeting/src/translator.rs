//! Substitution of underlying symbols and types by their retargeted
//! counterparts.

use crate::members::{RetargetingEventSymbol, RetargetingFieldSymbol, RetargetingPropertySymbol};
use crate::method::RetargetingMethodSymbol;
use crate::module::{DestinationData, RetargetingModuleSymbol};
use crate::named_type::RetargetingNamedTypeSymbol;
use crate::no_pia;
use std::sync::Arc;
use tracing::{debug, trace};
use xsym_common::Diagnostic;
use xsym_symbols::{
    ArrayType, AssemblyRef, AssemblySymbol, AttributeData, ConstructedType, CustomModifier,
    EventRef, FieldRef, ForwardedTypeLookup, ForwardingVisited, LazyField, MarshalInfo,
    MetadataTypeName, MethodRef, MethodSignature, MethodSignatureComparer, MissingType,
    MissingTypeReason, NamedTypeHandle, NamedTypeRef, ParameterRef, PropertyRef, SpecialType,
    SymbolRef, SynthesizedInfo, TypeIdentifier, TypeParameterSymbol, TypeSymbol, TypedConstant,
    TypedConstantValue,
};

/// How primitive types are located in the new reference set.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RetargetOptions {
    /// Treat primitive types like any other named type: look them up by name
    /// in the destination assembly. Used when only a name is known, e.g. for
    /// forwarded types and custom modifiers.
    RetargetPrimitiveTypesByName,
    /// Primitive types are taken from the new core library by type code,
    /// wherever they were defined before.
    RetargetPrimitiveTypesByTypeCode,
}

/// Wrapper cache lookup for a definition of the underlying module.
macro_rules! wrap_definition {
    ($translator:expr, $variant:ident, $underlying:expr, $wrapper:ty) => {{
        let module = $translator.module;
        let underlying = $underlying;
        let cached = module.get_or_create_wrapper(SymbolRef::$variant(underlying.clone()), || {
            SymbolRef::$variant(<$wrapper>::new(module.self_weak(), underlying.clone()))
        });
        match cached {
            SymbolRef::$variant(wrapper) => wrapper,
            other => panic!(
                "retargeting cache maps a {} to a {:?}",
                stringify!($variant),
                other.kind()
            ),
        }
    }};
}

enum Container {
    /// The containing type is not affected by retargeting.
    Unchanged,
    Moved(NamedTypeRef),
}

/// Translates symbols reachable from a retargeting module's underlying
/// module into the retargeted graph.
///
/// Definitions of the underlying module become (cached) wrappers. Symbols of
/// redirected assemblies are looked up in their destination. Everything else
/// is returned unchanged.
#[derive(Clone, Copy)]
pub struct RetargetingSymbolTranslator<'a> {
    module: &'a RetargetingModuleSymbol,
}

impl<'a> RetargetingSymbolTranslator<'a> {
    pub(crate) fn new(module: &'a RetargetingModuleSymbol) -> Self {
        Self { module }
    }

    fn is_defined_in_underlying_module(&self, symbol: &SymbolRef) -> bool {
        symbol
            .containing_module()
            .is_some_and(|module| &module == self.module.underlying_module())
    }

    fn underlying_assembly(&self) -> AssemblyRef {
        self.module
            .retargeting_assembly()
            .underlying_assembly()
            .clone()
    }

    // =========================================================================
    // Symbols
    // =========================================================================

    /// Retargets a symbol of any kind. A symbol without a counterpart in the
    /// new reference set is returned unchanged.
    pub fn retarget_symbol(&self, symbol: &SymbolRef) -> SymbolRef {
        let retargeted = match symbol {
            SymbolRef::Assembly(assembly) => {
                Some(SymbolRef::Assembly(self.retarget_assembly(assembly)))
            }
            SymbolRef::Module(module) => (module == self.module.underlying_module())
                .then(|| SymbolRef::Module(self.module.self_arc())),
            SymbolRef::NamedType(ty) => self
                .retarget_named_type(ty, RetargetOptions::RetargetPrimitiveTypesByTypeCode)
                .as_named()
                .map(SymbolRef::NamedType),
            SymbolRef::Method(method) => self
                .retarget_method(method, &MethodSignatureComparer::EXACT)
                .map(SymbolRef::Method),
            SymbolRef::Parameter(parameter) => {
                self.retarget_parameter(parameter).map(SymbolRef::Parameter)
            }
            SymbolRef::Property(property) => {
                self.retarget_property(property).map(SymbolRef::Property)
            }
            SymbolRef::Field(field) => self.retarget_field(field).map(SymbolRef::Field),
            SymbolRef::Event(event) => self.retarget_event(event).map(SymbolRef::Event),
        };
        retargeted.unwrap_or_else(|| symbol.clone())
    }

    pub fn retarget_assembly(&self, assembly: &AssemblyRef) -> AssemblyRef {
        if assembly == &self.underlying_assembly() {
            return self.module.retargeting_assembly();
        }
        match self.module.destination(assembly) {
            Some(destination) => destination.to.clone(),
            None => assembly.clone(),
        }
    }

    /// Wrapper of a type defined in the underlying module.
    pub fn retarget_type_definition(&self, ty: &NamedTypeRef) -> NamedTypeRef {
        wrap_definition!(self, NamedType, ty, RetargetingNamedTypeSymbol)
    }

    /// Wrapper of a method defined in the underlying module.
    pub fn retarget_method_definition(&self, method: &MethodRef) -> MethodRef {
        wrap_definition!(self, Method, method, RetargetingMethodSymbol)
    }

    pub fn retarget_property_definition(&self, property: &PropertyRef) -> PropertyRef {
        wrap_definition!(self, Property, property, RetargetingPropertySymbol)
    }

    pub fn retarget_field_definition(&self, field: &FieldRef) -> FieldRef {
        wrap_definition!(self, Field, field, RetargetingFieldSymbol)
    }

    pub fn retarget_event_definition(&self, event: &EventRef) -> EventRef {
        wrap_definition!(self, Event, event, RetargetingEventSymbol)
    }

    /// Wrapper of a member of a type defined in the underlying module.
    pub(crate) fn retarget_member_definition(&self, member: &SymbolRef) -> SymbolRef {
        match member {
            SymbolRef::NamedType(ty) => SymbolRef::NamedType(self.retarget_type_definition(ty)),
            SymbolRef::Method(method) => SymbolRef::Method(self.retarget_method_definition(method)),
            SymbolRef::Property(property) => {
                SymbolRef::Property(self.retarget_property_definition(property))
            }
            SymbolRef::Field(field) => SymbolRef::Field(self.retarget_field_definition(field)),
            SymbolRef::Event(event) => SymbolRef::Event(self.retarget_event_definition(event)),
            other => self.retarget_symbol(other),
        }
    }

    /// Where a member of a foreign type must be looked up. `None` when the
    /// containing type has no counterpart.
    fn retargeted_container(&self, member: &SymbolRef) -> Option<Container> {
        let containing = member.containing_type()?;
        let retargeted = self
            .retarget_named_type(&containing, RetargetOptions::RetargetPrimitiveTypesByTypeCode)
            .as_named()?;
        if Arc::ptr_eq(&retargeted, &containing) {
            Some(Container::Unchanged)
        } else {
            Some(Container::Moved(retargeted))
        }
    }

    /// Retargets a method referenced from the underlying module.
    ///
    /// Methods of other assemblies are matched in their retargeted
    /// containing type with `comparer`. Returns `None` when no member
    /// matches.
    pub fn retarget_method(
        &self,
        method: &MethodRef,
        comparer: &MethodSignatureComparer,
    ) -> Option<MethodRef> {
        if method.is_retargeting() {
            return Some(method.clone());
        }
        let symbol = SymbolRef::Method(method.clone());
        if self.is_defined_in_underlying_module(&symbol) {
            return Some(self.retarget_method_definition(method));
        }
        let container = match self.retargeted_container(&symbol)? {
            Container::Moved(container) => container,
            Container::Unchanged => return Some(method.clone()),
        };
        let signature = self.retarget_signature(&MethodSignature::of_method(method.as_ref()));
        comparer
            .find_match(&signature, &container.members_named(method.name()))
            .and_then(|found| found.as_method().cloned())
    }

    pub fn retarget_property(&self, property: &PropertyRef) -> Option<PropertyRef> {
        if property.is_retargeting() {
            return Some(property.clone());
        }
        let symbol = SymbolRef::Property(property.clone());
        if self.is_defined_in_underlying_module(&symbol) {
            return Some(self.retarget_property_definition(property));
        }
        let container = match self.retargeted_container(&symbol)? {
            Container::Moved(container) => container,
            Container::Unchanged => return Some(property.clone()),
        };
        let signature = self.retarget_signature(&MethodSignature::of_property(property.as_ref()));
        MethodSignatureComparer::PROPERTY
            .find_match(&signature, &container.members_named(property.name()))
            .and_then(|found| found.as_property().cloned())
    }

    pub fn retarget_field(&self, field: &FieldRef) -> Option<FieldRef> {
        if field.is_retargeting() {
            return Some(field.clone());
        }
        let symbol = SymbolRef::Field(field.clone());
        if self.is_defined_in_underlying_module(&symbol) {
            return Some(self.retarget_field_definition(field));
        }
        match self.retargeted_container(&symbol)? {
            Container::Moved(container) => container
                .members_named(field.name())
                .iter()
                .find_map(|member| member.as_field().cloned()),
            Container::Unchanged => Some(field.clone()),
        }
    }

    pub fn retarget_event(&self, event: &EventRef) -> Option<EventRef> {
        if event.is_retargeting() {
            return Some(event.clone());
        }
        let symbol = SymbolRef::Event(event.clone());
        if self.is_defined_in_underlying_module(&symbol) {
            return Some(self.retarget_event_definition(event));
        }
        match self.retargeted_container(&symbol)? {
            Container::Moved(container) => container
                .members_named(event.name())
                .iter()
                .find_map(|member| member.as_event().cloned()),
            Container::Unchanged => Some(event.clone()),
        }
    }

    /// The parameter at the same ordinal of the retargeted owner.
    pub fn retarget_parameter(&self, parameter: &ParameterRef) -> Option<ParameterRef> {
        if parameter.is_retargeting() {
            return Some(parameter.clone());
        }
        let parameters = match parameter.containing_symbol()? {
            SymbolRef::Method(owner) => self
                .retarget_method(&owner, &MethodSignatureComparer::EXACT)?
                .parameters(),
            SymbolRef::Property(owner) => self.retarget_property(&owner)?.parameters(),
            _ => return None,
        };
        parameters.get(parameter.ordinal()).cloned()
    }

    pub fn retarget_synthesized_info(&self, info: SynthesizedInfo) -> SynthesizedInfo {
        let generator = self
            .retarget_method(&info.generator, &MethodSignatureComparer::EXACT)
            .unwrap_or(info.generator);
        SynthesizedInfo {
            generator,
            has_method_body_dependency: info.has_method_body_dependency,
        }
    }

    // =========================================================================
    // Types
    // =========================================================================

    /// Retargets a type appearing in a signature.
    ///
    /// Idempotent: a type already expressed in the retargeted graph is
    /// returned as is.
    pub fn retarget_type(&self, ty: &TypeSymbol, options: RetargetOptions) -> TypeSymbol {
        match ty {
            TypeSymbol::Named(handle) => self.retarget_named_type(&handle.get(), options),
            TypeSymbol::Constructed(constructed) => {
                let retargeted = self.retarget_named_type(&constructed.definition.get(), options);
                let definition = match retargeted {
                    TypeSymbol::Named(handle) => handle,
                    missing => return missing,
                };
                let type_arguments: Vec<TypeSymbol> = constructed
                    .type_arguments
                    .iter()
                    .map(|argument| self.retarget_type(argument, options))
                    .collect();
                if definition == constructed.definition
                    && type_arguments[..] == constructed.type_arguments[..]
                {
                    return ty.clone();
                }
                TypeSymbol::Constructed(Arc::new(ConstructedType {
                    definition,
                    type_arguments: type_arguments.into(),
                }))
            }
            TypeSymbol::Array(array) => {
                let element = self.retarget_type(&array.element, options);
                let element_custom_modifiers =
                    self.retarget_modifiers(&array.element_custom_modifiers);
                if element == array.element
                    && element_custom_modifiers == array.element_custom_modifiers
                {
                    return ty.clone();
                }
                TypeSymbol::Array(Arc::new(ArrayType {
                    element,
                    rank: array.rank,
                    element_custom_modifiers,
                }))
            }
            TypeSymbol::Pointer(pointee) => {
                let retargeted = self.retarget_type(pointee, options);
                if retargeted == **pointee {
                    ty.clone()
                } else {
                    TypeSymbol::pointer(retargeted)
                }
            }
            TypeSymbol::TypeParameter(_) | TypeSymbol::Error(_) => ty.clone(),
        }
    }

    pub fn retarget_named_type(&self, ty: &NamedTypeRef, options: RetargetOptions) -> TypeSymbol {
        if ty.is_retargeting() {
            return TypeSymbol::named(ty);
        }

        if options == RetargetOptions::RetargetPrimitiveTypesByTypeCode {
            if let Some(special) = ty.special_type().filter(|s| s.is_primitive_type_code()) {
                return self.retarget_special_type(special);
            }
        }

        if let Some(identifier) = ty.no_pia_local_identity() {
            return self.unify_no_pia_type(ty, &identifier);
        }

        let symbol = SymbolRef::NamedType(ty.clone());
        if self.is_defined_in_underlying_module(&symbol) {
            return TypeSymbol::named(&self.retarget_type_definition(ty));
        }

        let Some(assembly) = ty.containing_assembly() else {
            return TypeSymbol::named(ty);
        };
        // Added modules are shared with the underlying assembly.
        if Arc::ptr_eq(&assembly, &self.underlying_assembly()) {
            return TypeSymbol::named(ty);
        }
        match self.module.destination(&assembly) {
            Some(destination) => self.perform_type_retargeting(destination, ty),
            None => TypeSymbol::named(ty),
        }
    }

    fn retarget_special_type(&self, special: SpecialType) -> TypeSymbol {
        let assembly = self.module.retargeting_assembly();
        match assembly.get_special_type(special) {
            Some(found) => TypeSymbol::named(&found),
            None => TypeSymbol::missing(MissingType {
                name: MetadataTypeName::of_special(special),
                assembly: assembly.cor_library().map(|cor| cor.identity().clone()),
                reason: MissingTypeReason::NotFound,
            }),
        }
    }

    /// Finds `ty` in `destination`, nested types through their retargeted
    /// containing type, top-level types through the destination's
    /// forwarders.
    fn perform_type_retargeting(
        &self,
        destination: &DestinationData,
        ty: &NamedTypeRef,
    ) -> TypeSymbol {
        if let Some(cached) = destination.symbol_map.get(ty) {
            return cached.value().clone();
        }

        let missing_because = |reason| {
            TypeSymbol::missing(MissingType {
                name: ty.metadata_name(),
                assembly: Some(destination.to.identity().clone()),
                reason,
            })
        };
        let missing = || missing_because(MissingTypeReason::NotFound);

        let result = match ty.containing_type() {
            Some(outer) => match self.perform_type_retargeting(destination, &outer) {
                TypeSymbol::Named(retargeted_outer) => retargeted_outer
                    .get()
                    .get_nested_type(ty.name(), ty.arity())
                    .map_or_else(missing, |nested| TypeSymbol::named(&nested)),
                _ => missing(),
            },
            None => {
                let mut visited = ForwardingVisited::new();
                match destination
                    .to
                    .try_lookup_forwarded_type_with_cycle_detection(
                        &ty.metadata_name(),
                        &mut visited,
                    ) {
                    ForwardedTypeLookup::Found(found) => TypeSymbol::named(&found),
                    ForwardedTypeLookup::NotFound => missing(),
                    ForwardedTypeLookup::Cycle => {
                        missing_because(MissingTypeReason::ForwardingCycle)
                    }
                }
            }
        };

        trace!(
            from = %ty.full_name(),
            to = %result,
            destination = %destination.to.identity(),
            "RetargetingSymbolTranslator::perform_type_retargeting"
        );
        destination
            .symbol_map
            .entry(ty.clone())
            .or_insert(result)
            .value()
            .clone()
    }

    fn unify_no_pia_type(&self, local: &NamedTypeRef, identifier: &TypeIdentifier) -> TypeSymbol {
        let assembly = self.module.retargeting_assembly();
        if let Some(cached) = assembly.no_pia_unification_map().get(local) {
            return cached.value().clone();
        }
        let canonical = no_pia::find_canonical_type(
            local,
            identifier,
            &assembly.no_pia_resolution_assemblies(),
        );
        assembly.unify_no_pia_type(local.clone(), canonical)
    }

    pub fn retarget_type_parameters(
        &self,
        parameters: &[TypeParameterSymbol],
    ) -> Arc<[TypeParameterSymbol]> {
        parameters
            .iter()
            .map(|parameter| TypeParameterSymbol {
                constraint_types: parameter
                    .constraint_types
                    .iter()
                    .map(|ty| {
                        self.retarget_type(ty, RetargetOptions::RetargetPrimitiveTypesByTypeCode)
                    })
                    .collect(),
                ..parameter.clone()
            })
            .collect()
    }

    /// Rewrites a signature into the retargeted graph, custom modifiers
    /// included.
    pub fn retarget_signature(&self, signature: &MethodSignature) -> MethodSignature {
        let mut retargeted = signature.map_types(|ty| {
            self.retarget_type(ty, RetargetOptions::RetargetPrimitiveTypesByTypeCode)
        });
        retargeted.return_custom_modifiers =
            self.retarget_modifiers(&signature.return_custom_modifiers);
        for parameter in &mut retargeted.parameters {
            parameter.custom_modifiers = self.retarget_modifiers(&parameter.custom_modifiers);
        }
        retargeted
    }

    // =========================================================================
    // Modifiers, attributes, marshalling
    // =========================================================================

    /// Modifier types are located by name. A modifier whose type is missing
    /// in the new reference set is dropped.
    pub fn retarget_modifiers(&self, modifiers: &[CustomModifier]) -> Arc<[CustomModifier]> {
        modifiers
            .iter()
            .filter_map(|modifier| {
                let retargeted = self.retarget_named_type(
                    &modifier.modifier.get(),
                    RetargetOptions::RetargetPrimitiveTypesByName,
                );
                match retargeted {
                    TypeSymbol::Named(handle) => Some(CustomModifier {
                        modifier: handle,
                        is_optional: modifier.is_optional,
                    }),
                    other => {
                        debug!(modifier = %other, "RetargetingSymbolTranslator::drop modifier");
                        None
                    }
                }
            })
            .collect()
    }

    /// Cached form of [`Self::retarget_modifiers`]. Concurrent first calls
    /// converge on one published array.
    pub fn get_retargeted_modifiers(
        &self,
        cache: &LazyField<Arc<[CustomModifier]>>,
        underlying: impl FnOnce() -> Arc<[CustomModifier]>,
    ) -> Arc<[CustomModifier]> {
        cache
            .get_or_init(|| {
                let modifiers = underlying();
                if modifiers.is_empty() {
                    modifiers
                } else {
                    self.retarget_modifiers(&modifiers)
                }
            })
            .clone()
    }

    /// Retargets attribute classes, constructors and `typeof` arguments.
    /// An attribute whose constructor has no counterpart is dropped.
    pub fn retarget_attributes(&self, attributes: &[AttributeData]) -> Arc<[AttributeData]> {
        attributes
            .iter()
            .filter_map(|attribute| self.retarget_attribute(attribute))
            .collect()
    }

    fn retarget_attribute(&self, attribute: &AttributeData) -> Option<AttributeData> {
        let constructor = match &attribute.constructor {
            Some(constructor) => {
                let comparer = &MethodSignatureComparer::ATTRIBUTE_CONSTRUCTOR;
                match self.retarget_method(constructor, comparer) {
                    Some(retargeted) => Some(retargeted),
                    None => {
                        debug!(
                            constructor = %SymbolRef::Method(constructor.clone()),
                            "RetargetingSymbolTranslator::drop attribute"
                        );
                        return None;
                    }
                }
            }
            None => None,
        };

        let attribute_class = match constructor.as_ref().and_then(|c| c.containing_type()) {
            Some(class) => Some(NamedTypeHandle::new(&class)),
            None => attribute.attribute_class.as_ref().map(|class| {
                let options = RetargetOptions::RetargetPrimitiveTypesByTypeCode;
                match self.retarget_named_type(&class.get(), options) {
                    TypeSymbol::Named(handle) => handle,
                    _ => class.clone(),
                }
            }),
        };

        Some(AttributeData {
            attribute_class,
            constructor,
            constructor_arguments: attribute
                .constructor_arguments
                .iter()
                .map(|argument| self.retarget_typed_constant(argument))
                .collect(),
            named_arguments: attribute
                .named_arguments
                .iter()
                .map(|(name, argument)| (name.clone(), self.retarget_typed_constant(argument)))
                .collect(),
        })
    }

    fn retarget_typed_constant(&self, constant: &TypedConstant) -> TypedConstant {
        let options = RetargetOptions::RetargetPrimitiveTypesByTypeCode;
        let value = match &constant.value {
            TypedConstantValue::Primitive(value) => TypedConstantValue::Primitive(value.clone()),
            TypedConstantValue::Type(ty) => {
                TypedConstantValue::Type(self.retarget_type(ty, options))
            }
            TypedConstantValue::Array(items) => TypedConstantValue::Array(
                items
                    .iter()
                    .map(|item| self.retarget_typed_constant(item))
                    .collect(),
            ),
        };
        TypedConstant {
            ty: self.retarget_type(&constant.ty, options),
            value,
        }
    }

    /// Cached form of [`Self::retarget_attributes`].
    pub fn get_retargeted_attributes(
        &self,
        cache: &LazyField<Arc<[AttributeData]>>,
        underlying: impl FnOnce() -> Arc<[AttributeData]>,
    ) -> Arc<[AttributeData]> {
        cache
            .get_or_init(|| {
                let attributes = underlying();
                if attributes.is_empty() {
                    attributes
                } else {
                    self.retarget_attributes(&attributes)
                }
            })
            .clone()
    }

    pub fn retarget_marshalling(&self, info: Option<MarshalInfo>) -> Option<MarshalInfo> {
        let mut info = info?;
        if let Some(marshal_type) = &info.marshal_type {
            let options = RetargetOptions::RetargetPrimitiveTypesByTypeCode;
            info.marshal_type = Some(self.retarget_type(marshal_type, options));
        }
        Some(info)
    }
}

/// Use-site error of the first missing type among `types`.
pub(crate) fn first_missing_diagnostic<'t>(
    types: impl IntoIterator<Item = &'t TypeSymbol>,
) -> Option<Diagnostic> {
    types
        .into_iter()
        .find_map(TypeSymbol::first_missing)
        .map(MissingType::diagnostic)
}
