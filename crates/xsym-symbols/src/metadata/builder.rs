//! Incremental construction of a metadata symbol tree.
//!
//! Types are allocated as soon as they are added so that later signatures
//! can refer to them; their members and module links are installed by
//! [`AssemblyBuilder::build`].

use super::assembly::{MetadataAssemblySymbol, MetadataModuleSymbol};
use super::members::{
    AssociatedLink, MetadataEventSymbol, MetadataFieldSymbol, MetadataMethodSymbol,
    MetadataParameterSymbol, MetadataPropertySymbol, ParameterOwner,
};
use super::named_type::MetadataNamedTypeSymbol;
use super::DeclInfo;
use crate::attributes::{AttributeData, ConstantValue, MarshalInfo};
use crate::handles::{
    EventDefinitionHandle, FieldDefinitionHandle, MethodDefinitionHandle, ParameterHandle,
    PropertyDefinitionHandle, TableIndex, TypeDefinitionHandle,
};
use crate::identity::{AssemblyIdentity, CompilationId};
use crate::symbol::{
    Accessibility, AnonymousTypeKey, AssemblyRef, CallingConvention, EventRef, FieldRef,
    MemberFlags, MethodKind, MethodRef, ModuleRef, NamedTypeRef, ParameterFlags, ParameterRef,
    PropertyRef, RefKind, SymbolRef, SynthesizedInfo, TypeKind,
};
use crate::types::{
    CustomModifier, MetadataTypeName, SpecialType, TypeIdentifier, TypeParameterOwnerKind,
    TypeParameterSymbol, TypeSymbol,
};
use rustc_hash::FxHashMap;
use std::sync::{Arc, OnceLock, Weak};
use tracing::{debug, trace};
use xsym_common::Location;

fn address<T: ?Sized>(symbol: &Arc<T>) -> usize {
    Arc::as_ptr(symbol).cast::<()>() as usize
}

fn type_parameters(names: &[&str], owner: TypeParameterOwnerKind) -> Vec<TypeParameterSymbol> {
    names
        .iter()
        .enumerate()
        .map(|(ordinal, name)| TypeParameterSymbol::new(*name, owner, ordinal as u32))
        .collect()
}

// =============================================================================
// Definitions
// =============================================================================

/// Declaration data common to every definition.
#[derive(Clone, Debug)]
struct DefCommon {
    name: Arc<str>,
    accessibility: Accessibility,
    locations: Vec<Location>,
    attributes: Vec<AttributeData>,
    implicitly_declared: bool,
}

impl DefCommon {
    fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            accessibility: Accessibility::Public,
            locations: Vec::new(),
            attributes: Vec::new(),
            implicitly_declared: false,
        }
    }

    fn into_decl(self, compilation: Option<CompilationId>) -> DeclInfo {
        DeclInfo {
            name: self.name,
            accessibility: self.accessibility,
            compilation,
            locations: self.locations.into(),
            attributes: self.attributes.into(),
            implicitly_declared: self.implicitly_declared,
        }
    }
}

macro_rules! common_setters {
    () => {
        pub fn at(mut self, location: Location) -> Self {
            self.common.locations.push(location);
            self
        }

        pub fn with_attribute(mut self, attribute: AttributeData) -> Self {
            self.common.attributes.push(attribute);
            self
        }

        pub fn accessibility(mut self, accessibility: Accessibility) -> Self {
            self.common.accessibility = accessibility;
            self
        }

        pub fn implicitly_declared(mut self) -> Self {
            self.common.implicitly_declared = true;
            self
        }
    };
}

#[derive(Clone, Debug)]
pub struct TypeDef {
    common: DefCommon,
    namespace: Arc<str>,
    kind: TypeKind,
    flags: MemberFlags,
    special: Option<SpecialType>,
    type_parameters: Vec<TypeParameterSymbol>,
    base_type: Option<TypeSymbol>,
    interfaces: Vec<TypeSymbol>,
    anonymous_key: Option<AnonymousTypeKey>,
    synthesized: Option<SynthesizedInfo>,
    no_pia_local: Option<TypeIdentifier>,
    type_identifier: Option<TypeIdentifier>,
    module: usize,
}

impl TypeDef {
    pub fn new(kind: TypeKind, namespace: impl Into<Arc<str>>, name: impl Into<Arc<str>>) -> Self {
        Self {
            common: DefCommon::new(name),
            namespace: namespace.into(),
            kind,
            flags: MemberFlags::empty(),
            special: None,
            type_parameters: Vec::new(),
            base_type: None,
            interfaces: Vec::new(),
            anonymous_key: None,
            synthesized: None,
            no_pia_local: None,
            type_identifier: None,
            module: 0,
        }
    }

    pub fn class(namespace: impl Into<Arc<str>>, name: impl Into<Arc<str>>) -> Self {
        Self::new(TypeKind::Class, namespace, name)
    }

    pub fn interface(namespace: impl Into<Arc<str>>, name: impl Into<Arc<str>>) -> Self {
        Self::new(TypeKind::Interface, namespace, name).flags(MemberFlags::ABSTRACT)
    }

    pub fn structure(namespace: impl Into<Arc<str>>, name: impl Into<Arc<str>>) -> Self {
        Self::new(TypeKind::Struct, namespace, name).flags(MemberFlags::SEALED)
    }

    common_setters!();

    pub fn flags(mut self, flags: MemberFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn generic(mut self, names: &[&str]) -> Self {
        self.type_parameters = type_parameters(names, TypeParameterOwnerKind::Type);
        self
    }

    pub fn special(mut self, special: SpecialType) -> Self {
        self.special = Some(special);
        self
    }

    pub fn extends(mut self, base: TypeSymbol) -> Self {
        self.base_type = Some(base);
        self
    }

    pub fn implements(mut self, interface: TypeSymbol) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn anonymous(mut self, key: AnonymousTypeKey) -> Self {
        self.anonymous_key = Some(key);
        self.common.implicitly_declared = true;
        self.common.accessibility = Accessibility::Internal;
        self
    }

    /// Marks the type as compiler-generated from `generator`'s body.
    pub fn synthesized_for(
        mut self,
        generator: &MethodRef,
        has_method_body_dependency: bool,
    ) -> Self {
        self.synthesized = Some(SynthesizedInfo {
            generator: generator.clone(),
            has_method_body_dependency,
        });
        self.common.implicitly_declared = true;
        self
    }

    pub fn no_pia_local(mut self, identifier: TypeIdentifier) -> Self {
        self.no_pia_local = Some(identifier);
        self
    }

    pub fn type_identifier(mut self, identifier: TypeIdentifier) -> Self {
        self.type_identifier = Some(identifier);
        self
    }

    pub fn in_module(mut self, ordinal: usize) -> Self {
        self.module = ordinal;
        self
    }
}

#[derive(Clone, Debug)]
pub struct ParamDef {
    common: DefCommon,
    ty: TypeSymbol,
    ref_kind: RefKind,
    flags: ParameterFlags,
    default_value: Option<ConstantValue>,
    custom_modifiers: Vec<CustomModifier>,
    marshalling: Option<MarshalInfo>,
}

impl ParamDef {
    pub fn new(name: impl Into<Arc<str>>, ty: TypeSymbol) -> Self {
        Self {
            common: DefCommon::new(name),
            ty,
            ref_kind: RefKind::None,
            flags: ParameterFlags::empty(),
            default_value: None,
            custom_modifiers: Vec::new(),
            marshalling: None,
        }
    }

    common_setters!();

    pub fn ref_kind(mut self, ref_kind: RefKind) -> Self {
        self.ref_kind = ref_kind;
        self
    }

    pub fn flags(mut self, flags: ParameterFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn default_value(mut self, value: ConstantValue) -> Self {
        self.default_value = Some(value);
        self.flags |= ParameterFlags::OPTIONAL;
        self
    }

    pub fn modifier(mut self, modifier: CustomModifier) -> Self {
        self.custom_modifiers.push(modifier);
        self
    }

    pub fn marshalling(mut self, info: MarshalInfo) -> Self {
        self.marshalling = Some(info);
        self.flags |= ParameterFlags::MARSHALLED_EXPLICITLY;
        self
    }
}

#[derive(Clone, Debug)]
pub struct MethodDef {
    common: DefCommon,
    kind: MethodKind,
    flags: MemberFlags,
    calling_convention: CallingConvention,
    type_parameters: Vec<TypeParameterSymbol>,
    return_type: TypeSymbol,
    return_ref_kind: RefKind,
    return_custom_modifiers: Vec<CustomModifier>,
    return_attributes: Vec<AttributeData>,
    return_marshalling: Option<MarshalInfo>,
    parameters: Vec<ParamDef>,
    explicit_implementations: Vec<MethodRef>,
    synthesized: Option<SynthesizedInfo>,
}

impl MethodDef {
    pub fn new(name: impl Into<Arc<str>>, return_type: TypeSymbol) -> Self {
        Self {
            common: DefCommon::new(name),
            kind: MethodKind::Ordinary,
            flags: MemberFlags::HIDE_BY_SIG,
            calling_convention: CallingConvention::Default,
            type_parameters: Vec::new(),
            return_type,
            return_ref_kind: RefKind::None,
            return_custom_modifiers: Vec::new(),
            return_attributes: Vec::new(),
            return_marshalling: None,
            parameters: Vec::new(),
            explicit_implementations: Vec::new(),
            synthesized: None,
        }
    }

    common_setters!();

    pub fn kind(mut self, kind: MethodKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn flags(mut self, flags: MemberFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn calling_convention(mut self, calling_convention: CallingConvention) -> Self {
        self.calling_convention = calling_convention;
        self
    }

    pub fn generic(mut self, names: &[&str]) -> Self {
        self.type_parameters = type_parameters(names, TypeParameterOwnerKind::Method);
        self
    }

    pub fn return_ref_kind(mut self, ref_kind: RefKind) -> Self {
        self.return_ref_kind = ref_kind;
        self
    }

    pub fn return_modifier(mut self, modifier: CustomModifier) -> Self {
        self.return_custom_modifiers.push(modifier);
        self
    }

    pub fn return_attribute(mut self, attribute: AttributeData) -> Self {
        self.return_attributes.push(attribute);
        self
    }

    pub fn return_marshalling(mut self, info: MarshalInfo) -> Self {
        self.return_marshalling = Some(info);
        self
    }

    pub fn param(mut self, parameter: ParamDef) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Explicitly implements `interface_method`.
    pub fn implements(mut self, interface_method: &MethodRef) -> Self {
        self.explicit_implementations.push(interface_method.clone());
        self.kind = MethodKind::ExplicitInterfaceImplementation;
        self
    }

    pub fn synthesized_for(
        mut self,
        generator: &MethodRef,
        has_method_body_dependency: bool,
    ) -> Self {
        self.synthesized = Some(SynthesizedInfo {
            generator: generator.clone(),
            has_method_body_dependency,
        });
        self.common.implicitly_declared = true;
        self
    }
}

#[derive(Clone, Debug)]
pub struct PropertyDef {
    common: DefCommon,
    ty: TypeSymbol,
    ref_kind: RefKind,
    custom_modifiers: Vec<CustomModifier>,
    flags: MemberFlags,
    parameters: Vec<ParamDef>,
    getter: Option<MethodRef>,
    setter: Option<MethodRef>,
}

impl PropertyDef {
    pub fn new(name: impl Into<Arc<str>>, ty: TypeSymbol) -> Self {
        Self {
            common: DefCommon::new(name),
            ty,
            ref_kind: RefKind::None,
            custom_modifiers: Vec::new(),
            flags: MemberFlags::empty(),
            parameters: Vec::new(),
            getter: None,
            setter: None,
        }
    }

    common_setters!();

    pub fn ref_kind(mut self, ref_kind: RefKind) -> Self {
        self.ref_kind = ref_kind;
        self
    }

    pub fn modifier(mut self, modifier: CustomModifier) -> Self {
        self.custom_modifiers.push(modifier);
        self
    }

    pub fn flags(mut self, flags: MemberFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn param(mut self, parameter: ParamDef) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn getter(mut self, method: &MethodRef) -> Self {
        self.getter = Some(method.clone());
        self
    }

    pub fn setter(mut self, method: &MethodRef) -> Self {
        self.setter = Some(method.clone());
        self
    }
}

#[derive(Clone, Debug)]
pub struct FieldDef {
    common: DefCommon,
    ty: TypeSymbol,
    custom_modifiers: Vec<CustomModifier>,
    flags: MemberFlags,
    constant_value: Option<ConstantValue>,
    marshalling: Option<MarshalInfo>,
    synthesized: Option<SynthesizedInfo>,
    associated: Option<SymbolRef>,
}

impl FieldDef {
    pub fn new(name: impl Into<Arc<str>>, ty: TypeSymbol) -> Self {
        Self {
            common: DefCommon::new(name),
            ty,
            custom_modifiers: Vec::new(),
            flags: MemberFlags::empty(),
            constant_value: None,
            marshalling: None,
            synthesized: None,
            associated: None,
        }
    }

    common_setters!();

    pub fn modifier(mut self, modifier: CustomModifier) -> Self {
        self.custom_modifiers.push(modifier);
        self
    }

    pub fn flags(mut self, flags: MemberFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn constant(mut self, value: ConstantValue) -> Self {
        self.constant_value = Some(value);
        self.flags |= MemberFlags::CONST | MemberFlags::STATIC;
        self
    }

    pub fn marshalling(mut self, info: MarshalInfo) -> Self {
        self.marshalling = Some(info);
        self
    }

    pub fn synthesized_for(
        mut self,
        generator: &MethodRef,
        has_method_body_dependency: bool,
    ) -> Self {
        self.synthesized = Some(SynthesizedInfo {
            generator: generator.clone(),
            has_method_body_dependency,
        });
        self.common.implicitly_declared = true;
        self
    }

    /// Backing field of a property or event built by the same builder.
    pub fn backing(mut self, owner: SymbolRef) -> Self {
        self.associated = Some(owner);
        self.common.implicitly_declared = true;
        self.common.accessibility = Accessibility::Private;
        self
    }
}

#[derive(Clone, Debug)]
pub struct EventDef {
    common: DefCommon,
    ty: TypeSymbol,
    flags: MemberFlags,
    add_method: Option<MethodRef>,
    remove_method: Option<MethodRef>,
}

impl EventDef {
    pub fn new(name: impl Into<Arc<str>>, ty: TypeSymbol) -> Self {
        Self {
            common: DefCommon::new(name),
            ty,
            flags: MemberFlags::empty(),
            add_method: None,
            remove_method: None,
        }
    }

    common_setters!();

    pub fn flags(mut self, flags: MemberFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn adder(mut self, method: &MethodRef) -> Self {
        self.add_method = Some(method.clone());
        self
    }

    pub fn remover(mut self, method: &MethodRef) -> Self {
        self.remove_method = Some(method.clone());
        self
    }
}

// =============================================================================
// AssemblyBuilder
// =============================================================================

struct TypeEntry {
    symbol: Arc<MetadataNamedTypeSymbol>,
    module: usize,
    is_nested: bool,
    members: Vec<SymbolRef>,
}

/// Builds one assembly's symbol tree.
pub struct AssemblyBuilder {
    identity: AssemblyIdentity,
    is_cor_library: bool,
    is_linked: bool,
    compilation: Option<CompilationId>,
    attributes: Vec<AttributeData>,
    references: Vec<AssemblyRef>,
    module_names: Vec<Arc<str>>,
    types: Vec<TypeEntry>,
    type_index: FxHashMap<usize, usize>,
    methods: FxHashMap<usize, Arc<MetadataMethodSymbol>>,
    properties: FxHashMap<usize, Arc<MetadataPropertySymbol>>,
    events: FxHashMap<usize, Arc<MetadataEventSymbol>>,
    forwarders: Vec<(MetadataTypeName, AssemblyRef)>,
    rows: FxHashMap<TableIndex, u32>,
}

impl AssemblyBuilder {
    pub fn new(identity: AssemblyIdentity) -> Self {
        let manifest: Arc<str> = format!("{}.dll", identity.name).into();
        Self {
            identity,
            is_cor_library: false,
            is_linked: false,
            compilation: None,
            attributes: Vec::new(),
            references: Vec::new(),
            module_names: vec![manifest],
            types: Vec::new(),
            type_index: FxHashMap::default(),
            methods: FxHashMap::default(),
            properties: FxHashMap::default(),
            events: FxHashMap::default(),
            forwarders: Vec::new(),
            rows: FxHashMap::default(),
        }
    }

    /// A core library defining `System.Object` and the given special types.
    pub fn cor_library(identity: AssemblyIdentity, special_types: &[SpecialType]) -> Self {
        let mut builder = Self::new(identity);
        builder.is_cor_library = true;
        let object =
            builder.add_type(TypeDef::class("System", "Object").special(SpecialType::Object));
        for &special in special_types {
            if special == SpecialType::Object {
                continue;
            }
            let (namespace, name) = special.metadata_name();
            let def = if special.is_primitive_type_code() && special != SpecialType::String {
                TypeDef::structure(namespace, name)
            } else {
                TypeDef::class(namespace, name)
            };
            builder.add_type(def.special(special).extends(TypeSymbol::named(&object)));
        }
        builder
    }

    /// Symbols added from now on are declared by `compilation`.
    pub fn source(mut self, compilation: CompilationId) -> Self {
        self.compilation = Some(compilation);
        self
    }

    /// Referenced with its interop types embedded.
    pub fn linked(mut self) -> Self {
        self.is_linked = true;
        self
    }

    pub fn reference(mut self, assembly: &AssemblyRef) -> Self {
        self.references.push(assembly.clone());
        self
    }

    pub fn with_attribute(mut self, attribute: AttributeData) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Adds a secondary module and returns its ordinal.
    pub fn add_module(&mut self, name: impl Into<Arc<str>>) -> usize {
        self.module_names.push(name.into());
        self.module_names.len() - 1
    }

    pub fn forward_type(&mut self, name: MetadataTypeName, destination: &AssemblyRef) {
        self.forwarders.push((name, destination.clone()));
    }

    fn next_row(&mut self, table: TableIndex) -> u32 {
        let row = self.rows.entry(table).or_insert(0);
        *row += 1;
        *row
    }

    fn reserve_rows(&mut self, table: TableIndex, count: usize) -> u32 {
        let row = self.rows.entry(table).or_insert(0);
        let first = *row + 1;
        *row += count as u32;
        first
    }

    fn type_entry(&self, ty: &NamedTypeRef) -> usize {
        match self.type_index.get(&address(ty)) {
            Some(&index) => index,
            None => panic!("type {} was not created by this builder", ty.full_name()),
        }
    }

    fn concrete_method(&self, method: &MethodRef) -> &Arc<MetadataMethodSymbol> {
        match self.methods.get(&address(method)) {
            Some(concrete) => concrete,
            None => panic!("method {} was not created by this builder", method.name()),
        }
    }

    pub fn add_type(&mut self, def: TypeDef) -> NamedTypeRef {
        assert!(
            def.module < self.module_names.len(),
            "module {} does not exist",
            def.module
        );
        let module = def.module;
        self.insert_type(def, None, module)
    }

    pub fn add_nested_type(&mut self, outer: &NamedTypeRef, def: TypeDef) -> NamedTypeRef {
        let outer_index = self.type_entry(outer);
        let outer_symbol = Arc::downgrade(&self.types[outer_index].symbol);
        let module = self.types[outer_index].module;
        let nested = self.insert_type(def, Some(outer_symbol), module);
        self.types[outer_index]
            .members
            .push(SymbolRef::NamedType(nested.clone()));
        nested
    }

    fn insert_type(
        &mut self,
        def: TypeDef,
        containing_type: Option<Weak<MetadataNamedTypeSymbol>>,
        module: usize,
    ) -> NamedTypeRef {
        let handle = TypeDefinitionHandle(self.next_row(TableIndex::TypeDef));
        let is_nested = containing_type.is_some();
        let symbol = Arc::new(MetadataNamedTypeSymbol {
            decl: def.common.into_decl(self.compilation),
            namespace: def.namespace,
            type_kind: def.kind,
            flags: def.flags,
            special_type: def.special,
            type_parameters: def.type_parameters.into(),
            base_type: def.base_type,
            interfaces: def.interfaces.into(),
            handle,
            anonymous_key: def.anonymous_key,
            synthesized: def.synthesized,
            no_pia_local: def.no_pia_local,
            type_identifier: def.type_identifier,
            containing_type,
            module: OnceLock::new(),
            members: OnceLock::new(),
        });
        trace!(
            assembly = %self.identity.name,
            name = %symbol.decl.name,
            row = handle.row(),
            "AssemblyBuilder::add_type"
        );
        self.type_index.insert(address(&symbol), self.types.len());
        self.types.push(TypeEntry {
            symbol: symbol.clone(),
            module,
            is_nested,
            members: Vec::new(),
        });
        symbol
    }

    fn build_parameters(
        &mut self,
        parameters: Vec<ParamDef>,
        owner: ParameterOwner,
    ) -> Arc<[ParameterRef]> {
        let first_row = self.reserve_rows(TableIndex::Param, parameters.len());
        let compilation = self.compilation;
        parameters
            .into_iter()
            .enumerate()
            .map(|(ordinal, def)| {
                Arc::new(MetadataParameterSymbol {
                    decl: def.common.into_decl(compilation),
                    ordinal,
                    ty: def.ty,
                    ref_kind: def.ref_kind,
                    flags: def.flags,
                    default_value: def.default_value,
                    custom_modifiers: def.custom_modifiers.into(),
                    marshalling: def.marshalling,
                    handle: ParameterHandle(first_row + ordinal as u32),
                    owner: owner.clone(),
                }) as ParameterRef
            })
            .collect()
    }

    pub fn add_method(&mut self, ty: &NamedTypeRef, def: MethodDef) -> MethodRef {
        let index = self.type_entry(ty);
        let containing_type = Arc::downgrade(&self.types[index].symbol);
        let handle = MethodDefinitionHandle(self.next_row(TableIndex::MethodDef));
        let compilation = self.compilation;

        // Parameters need the method's own weak handle as their owner.
        let method = Arc::new_cyclic(|weak: &Weak<MetadataMethodSymbol>| {
            let parameters =
                self.build_parameters(def.parameters, ParameterOwner::Method(weak.clone()));
            MetadataMethodSymbol {
                decl: def.common.into_decl(compilation),
                method_kind: def.kind,
                flags: def.flags,
                calling_convention: def.calling_convention,
                type_parameters: def.type_parameters.into(),
                return_type: def.return_type,
                return_ref_kind: def.return_ref_kind,
                return_custom_modifiers: def.return_custom_modifiers.into(),
                return_attributes: def.return_attributes.into(),
                return_marshalling: def.return_marshalling,
                parameters,
                explicit_implementations: def.explicit_implementations.into(),
                synthesized: def.synthesized,
                handle,
                containing_type,
                associated: OnceLock::new(),
                partial_definition: OnceLock::new(),
                partial_implementation: OnceLock::new(),
            }
        });
        trace!(
            name = %method.decl.name,
            row = handle.row(),
            "AssemblyBuilder::add_method"
        );
        self.methods.insert(address(&method), method.clone());
        let method: MethodRef = method;
        self.types[index]
            .members
            .push(SymbolRef::Method(method.clone()));
        method
    }

    pub fn add_property(&mut self, ty: &NamedTypeRef, def: PropertyDef) -> PropertyRef {
        let index = self.type_entry(ty);
        let containing_type = Arc::downgrade(&self.types[index].symbol);
        let handle = PropertyDefinitionHandle(self.next_row(TableIndex::Property));
        let compilation = self.compilation;
        let accessors: Vec<MethodRef> = def.getter.iter().chain(&def.setter).cloned().collect();

        let property = Arc::new_cyclic(|weak: &Weak<MetadataPropertySymbol>| {
            let parameters =
                self.build_parameters(def.parameters, ParameterOwner::Property(weak.clone()));
            MetadataPropertySymbol {
                decl: def.common.into_decl(compilation),
                ty: def.ty,
                ref_kind: def.ref_kind,
                custom_modifiers: def.custom_modifiers.into(),
                flags: def.flags,
                parameters,
                get_method: def.getter,
                set_method: def.setter,
                handle,
                containing_type,
            }
        });
        for accessor in &accessors {
            let concrete = self.concrete_method(accessor);
            let _ = concrete
                .associated
                .set(AssociatedLink::Property(Arc::downgrade(&property)));
        }
        self.properties.insert(address(&property), property.clone());
        let property: PropertyRef = property;
        self.types[index]
            .members
            .push(SymbolRef::Property(property.clone()));
        property
    }

    pub fn add_field(&mut self, ty: &NamedTypeRef, def: FieldDef) -> FieldRef {
        let index = self.type_entry(ty);
        let containing_type = Arc::downgrade(&self.types[index].symbol);
        let handle = FieldDefinitionHandle(self.next_row(TableIndex::Field));
        let associated = OnceLock::new();
        match &def.associated {
            Some(SymbolRef::Property(property)) => {
                if let Some(concrete) = self.properties.get(&address(property)) {
                    let _ = associated.set(AssociatedLink::Property(Arc::downgrade(concrete)));
                }
            }
            Some(SymbolRef::Event(event)) => {
                if let Some(concrete) = self.events.get(&address(event)) {
                    let _ = associated.set(AssociatedLink::Event(Arc::downgrade(concrete)));
                }
            }
            _ => {}
        }
        let field = Arc::new(MetadataFieldSymbol {
            decl: def.common.into_decl(self.compilation),
            ty: def.ty,
            custom_modifiers: def.custom_modifiers.into(),
            flags: def.flags,
            constant_value: def.constant_value,
            marshalling: def.marshalling,
            synthesized: def.synthesized,
            handle,
            containing_type,
            associated,
        });
        let field: FieldRef = field;
        self.types[index].members.push(SymbolRef::Field(field.clone()));
        field
    }

    pub fn add_event(&mut self, ty: &NamedTypeRef, def: EventDef) -> EventRef {
        let index = self.type_entry(ty);
        let containing_type = Arc::downgrade(&self.types[index].symbol);
        let handle = EventDefinitionHandle(self.next_row(TableIndex::Event));
        let accessors: Vec<MethodRef> = def
            .add_method
            .iter()
            .chain(&def.remove_method)
            .cloned()
            .collect();
        let event = Arc::new(MetadataEventSymbol {
            decl: def.common.into_decl(self.compilation),
            ty: def.ty,
            flags: def.flags,
            add_method: def.add_method,
            remove_method: def.remove_method,
            handle,
            containing_type,
        });
        for accessor in &accessors {
            let concrete = self.concrete_method(accessor);
            let _ = concrete
                .associated
                .set(AssociatedLink::Event(Arc::downgrade(&event)));
        }
        self.events.insert(address(&event), event.clone());
        let event: EventRef = event;
        self.types[index].members.push(SymbolRef::Event(event.clone()));
        event
    }

    /// Links the two declarations of a partial method.
    pub fn link_partial_parts(&self, definition: &MethodRef, implementation: &MethodRef) {
        let definition = self.concrete_method(definition).clone();
        let implementation = self.concrete_method(implementation).clone();
        let _ = definition
            .partial_implementation
            .set(Arc::downgrade(&implementation));
        let _ = implementation
            .partial_definition
            .set(Arc::downgrade(&definition));
    }

    pub fn build(self) -> Arc<MetadataAssemblySymbol> {
        let AssemblyBuilder {
            identity,
            is_cor_library,
            is_linked,
            compilation,
            attributes,
            references,
            module_names,
            types,
            forwarders,
            ..
        } = self;

        let cor_library = if is_cor_library {
            None
        } else {
            references.iter().find(|r| r.is_cor_library()).cloned()
        };
        let special_types = types
            .iter()
            .filter_map(|entry| {
                let special = entry.symbol.special_type?;
                Some((special, entry.symbol.clone() as NamedTypeRef))
            })
            .collect();
        let references: Arc<[AssemblyRef]> = references.into();

        let mut modules: Vec<Arc<MetadataModuleSymbol>> = Vec::with_capacity(module_names.len());
        let assembly = Arc::new_cyclic(|weak: &Weak<MetadataAssemblySymbol>| {
            for (ordinal, name) in module_names.iter().enumerate() {
                let top_level: Arc<[NamedTypeRef]> = types
                    .iter()
                    .filter(|entry| entry.module == ordinal && !entry.is_nested)
                    .map(|entry| entry.symbol.clone() as NamedTypeRef)
                    .collect();
                let mut decl = DeclInfo::new(name.clone());
                decl.compilation = compilation;
                modules.push(Arc::new(MetadataModuleSymbol {
                    decl,
                    ordinal,
                    assembly: weak.clone(),
                    referenced_assemblies: references.clone(),
                    types: top_level,
                }));
            }
            let mut decl = DeclInfo::new(identity.name.clone());
            decl.compilation = compilation;
            decl.attributes = attributes.into();
            MetadataAssemblySymbol {
                decl,
                identity,
                is_cor_library,
                is_linked,
                self_ref: weak.clone(),
                cor_library,
                modules: modules
                    .iter()
                    .map(|module| module.clone() as ModuleRef)
                    .collect(),
                special_types,
                forwarders: OnceLock::new(),
                no_pia_resolution_assemblies: OnceLock::new(),
                linked_referenced_assemblies: OnceLock::new(),
            }
        });

        let type_count = types.len();
        for entry in types {
            let _ = entry
                .symbol
                .module
                .set(Arc::downgrade(&modules[entry.module]));
            let _ = entry.symbol.members.set(entry.members.into());
        }
        if !forwarders.is_empty() {
            assembly.set_type_forwarders(forwarders);
        }
        debug!(
            assembly = %assembly.identity,
            types = type_count,
            modules = modules.len(),
            "AssemblyBuilder::build"
        );
        assembly
    }
}
