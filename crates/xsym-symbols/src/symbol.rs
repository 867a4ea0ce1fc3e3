//! Symbol capability traits and identity-hashed symbol references.
//!
//! Every program entity (assembly, module, type, member, parameter) is a
//! trait object behind an `Arc`. Equality and hashing of symbol references is
//! object identity: two references are equal only when they point at the same
//! symbol instance.

use crate::attributes::{AttributeData, ConstantValue, MarshalInfo};
use crate::handles::EntityHandle;
use crate::identity::{AssemblyIdentity, CompilationId};
use crate::types::{
    CustomModifier, MetadataTypeName, SpecialType, TypeIdentifier, TypeParameterSymbol, TypeSymbol,
};
use smallvec::SmallVec;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::debug;
use xsym_common::limits::{FORWARDING_VISITED_INLINE, MAX_FORWARDING_CHAIN_DEPTH};
use xsym_common::{Diagnostic, Location};

// =============================================================================
// Kinds and flags
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Assembly,
    NetModule,
    NamedType,
    Method,
    Parameter,
    Property,
    Field,
    Event,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Accessibility {
    #[default]
    NotApplicable,
    Private,
    ProtectedAndInternal,
    Protected,
    Internal,
    ProtectedOrInternal,
    Public,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum MethodKind {
    #[default]
    Ordinary,
    Constructor,
    StaticConstructor,
    Destructor,
    PropertyGet,
    PropertySet,
    EventAdd,
    EventRemove,
    ExplicitInterfaceImplementation,
    UserDefinedOperator,
    Conversion,
    DelegateInvoke,
    LambdaMethod,
    LocalFunction,
}

impl MethodKind {
    pub const fn is_accessor(self) -> bool {
        matches!(
            self,
            Self::PropertyGet | Self::PropertySet | Self::EventAdd | Self::EventRemove
        )
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum CallingConvention {
    #[default]
    Default,
    VarArgs,
    Unmanaged,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum RefKind {
    #[default]
    None,
    Ref,
    Out,
    In,
}

bitflags::bitflags! {
    /// Metadata flags of types and members. Retargeting never changes them.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MemberFlags: u32 {
        const STATIC = 1 << 0;
        const VIRTUAL = 1 << 1;
        const OVERRIDE = 1 << 2;
        const ABSTRACT = 1 << 3;
        const SEALED = 1 << 4;
        const EXTERN = 1 << 5;
        const ASYNC = 1 << 6;
        const ITERATOR = 1 << 7;
        const READONLY = 1 << 8;
        const CONST = 1 << 9;
        const VOLATILE = 1 << 10;
        const HIDE_BY_SIG = 1 << 11;
        const EXTENSION = 1 << 12;
        const IMPLICITLY_DECLARED = 1 << 13;
    }
}

bitflags::bitflags! {
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ParameterFlags: u16 {
        const PARAMS = 1 << 0;
        const OPTIONAL = 1 << 1;
        const CALLER_LINE_NUMBER = 1 << 2;
        const CALLER_FILE_PATH = 1 << 3;
        const CALLER_MEMBER_NAME = 1 << 4;
        const METADATA_IN = 1 << 5;
        const METADATA_OUT = 1 << 6;
        const MARSHALLED_EXPLICITLY = 1 << 7;
    }
}

/// Links a compiler-synthesized definition to the method whose body produced
/// it (state machine types, closure classes, lambdas, hoisted fields).
#[derive(Clone, Debug)]
pub struct SynthesizedInfo {
    pub generator: MethodRef,
    /// The synthesized shape depends on the generator's body, not only on
    /// its signature or capture set.
    pub has_method_body_dependency: bool,
}

/// Structural key of an anonymous type: its ordered property names.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AnonymousTypeKey {
    pub fields: Arc<[Arc<str>]>,
    pub is_delegate: bool,
}

impl AnonymousTypeKey {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            is_delegate: false,
        }
    }
}

// =============================================================================
// Capability traits
// =============================================================================

pub type AssemblyRef = Arc<dyn AssemblySymbol>;
pub type ModuleRef = Arc<dyn ModuleSymbol>;
pub type NamedTypeRef = Arc<dyn NamedTypeSymbol>;
pub type MethodRef = Arc<dyn MethodSymbol>;
pub type ParameterRef = Arc<dyn ParameterSymbol>;
pub type PropertyRef = Arc<dyn PropertySymbol>;
pub type FieldRef = Arc<dyn FieldSymbol>;
pub type EventRef = Arc<dyn EventSymbol>;

/// Visited assemblies while following type forwarders.
pub type ForwardingVisited = SmallVec<[AssemblyIdentity; FORWARDING_VISITED_INLINE]>;

/// Where following type forwarders for a top-level type ended.
#[derive(Clone, Debug)]
pub enum ForwardedTypeLookup {
    Found(NamedTypeRef),
    NotFound,
    /// The forwarders lead back to an assembly already on the chain, or the
    /// chain grew past its depth limit.
    Cycle,
}

impl ForwardedTypeLookup {
    pub fn found(self) -> Option<NamedTypeRef> {
        match self {
            Self::Found(ty) => Some(ty),
            Self::NotFound | Self::Cycle => None,
        }
    }

    pub fn is_cycle(&self) -> bool {
        matches!(self, Self::Cycle)
    }
}

/// Properties shared by every symbol.
pub trait Symbol: Send + Sync + fmt::Debug {
    fn kind(&self) -> SymbolKind;

    fn name(&self) -> &str;

    /// Parent in the symbol tree. Never owned by the child.
    fn containing_symbol(&self) -> Option<SymbolRef>;

    fn containing_assembly(&self) -> Option<AssemblyRef>;

    fn containing_module(&self) -> Option<ModuleRef>;

    fn declared_accessibility(&self) -> Accessibility {
        Accessibility::NotApplicable
    }

    fn locations(&self) -> Arc<[Location]>;

    fn attributes(&self) -> Arc<[AttributeData]>;

    /// Compilation that declared this symbol from source. Always `None` for
    /// metadata symbols and retargeting wrappers.
    fn declaring_compilation(&self) -> Option<CompilationId> {
        None
    }

    fn is_implicitly_declared(&self) -> bool {
        false
    }

    fn is_retargeting(&self) -> bool {
        false
    }

    /// Row in the defining module's metadata, if the symbol has one.
    fn metadata_handle(&self) -> Option<EntityHandle> {
        None
    }

    /// Error to report wherever this symbol is used.
    fn use_site_diagnostic(&self) -> Option<Diagnostic> {
        None
    }
}

pub trait AssemblySymbol: Symbol {
    fn identity(&self) -> &AssemblyIdentity;

    /// Modules in declaration order; index 0 is the manifest module.
    fn modules(&self) -> Arc<[ModuleRef]>;

    fn is_cor_library(&self) -> bool {
        false
    }

    /// The core library special types are bound against.
    fn cor_library(&self) -> Option<AssemblyRef>;

    /// Special type declared by this assembly itself.
    fn get_declared_special_type(&self, special: SpecialType) -> Option<NamedTypeRef>;

    /// Special type from the core library this assembly binds against.
    fn get_special_type(&self, special: SpecialType) -> Option<NamedTypeRef> {
        self.cor_library()?.get_declared_special_type(special)
    }

    /// Referenced with interop types embedded (linked) into the output.
    fn is_linked(&self) -> bool {
        false
    }

    fn no_pia_resolution_assemblies(&self) -> Arc<[AssemblyRef]>;

    fn set_no_pia_resolution_assemblies(&self, assemblies: Vec<AssemblyRef>);

    fn linked_referenced_assemblies(&self) -> Arc<[AssemblyRef]>;

    fn set_linked_referenced_assemblies(&self, assemblies: Vec<AssemblyRef>);

    /// Assembly a type forwarder for `name` points at.
    fn forwarding_destination(&self, _name: &MetadataTypeName) -> Option<AssemblyRef> {
        None
    }

    /// Top-level type defined in one of this assembly's own modules.
    fn lookup_declared_top_level_type(&self, name: &MetadataTypeName) -> Option<NamedTypeRef> {
        self.modules()
            .iter()
            .find_map(|module| module.lookup_top_level_type(name))
    }

    /// Look a top-level type up here, following forwarders into other
    /// assemblies. `visited` carries the assemblies already seen on this
    /// forwarding chain; a repeat means the forwarders form a cycle.
    fn try_lookup_forwarded_type_with_cycle_detection(
        &self,
        name: &MetadataTypeName,
        visited: &mut ForwardingVisited,
    ) -> ForwardedTypeLookup {
        if let Some(found) = self.lookup_declared_top_level_type(name) {
            return ForwardedTypeLookup::Found(found);
        }
        let Some(destination) = self.forwarding_destination(name) else {
            return ForwardedTypeLookup::NotFound;
        };
        if visited.contains(self.identity()) || visited.len() >= MAX_FORWARDING_CHAIN_DEPTH {
            debug!(
                type_name = %name,
                assembly = %self.identity(),
                "AssemblySymbol::forwarding cycle"
            );
            return ForwardedTypeLookup::Cycle;
        }
        visited.push(self.identity().clone());
        destination.try_lookup_forwarded_type_with_cycle_detection(name, visited)
    }

    /// Type whose interop identity matches `identifier`, searching
    /// top-level types of every module.
    fn find_type_by_identifier(&self, identifier: &TypeIdentifier) -> Option<NamedTypeRef> {
        self.modules().iter().find_map(|module| {
            module
                .types()
                .iter()
                .find(|ty| ty.type_identifier().as_ref() == Some(identifier))
                .cloned()
        })
    }
}

pub trait ModuleSymbol: Symbol {
    fn ordinal(&self) -> usize;

    /// Assemblies this module references, in metadata order.
    fn referenced_assemblies(&self) -> Arc<[AssemblyRef]>;

    /// Top-level types.
    fn types(&self) -> Arc<[NamedTypeRef]>;

    fn lookup_top_level_type(&self, name: &MetadataTypeName) -> Option<NamedTypeRef> {
        self.types()
            .iter()
            .find(|ty| {
                ty.namespace() == &*name.namespace
                    && ty.name() == &*name.name
                    && ty.arity() == name.arity
            })
            .cloned()
    }
}

pub trait NamedTypeSymbol: Symbol {
    fn namespace(&self) -> &str;

    fn arity(&self) -> usize;

    fn type_kind(&self) -> TypeKind;

    fn flags(&self) -> MemberFlags {
        MemberFlags::empty()
    }

    fn special_type(&self) -> Option<SpecialType> {
        None
    }

    fn containing_type(&self) -> Option<NamedTypeRef>;

    fn type_parameters(&self) -> Arc<[TypeParameterSymbol]>;

    fn base_type(&self) -> Option<TypeSymbol>;

    fn interfaces(&self) -> Arc<[TypeSymbol]>;

    /// All members, nested types included, in declaration order.
    fn members(&self) -> Arc<[SymbolRef]>;

    fn anonymous_type_key(&self) -> Option<AnonymousTypeKey> {
        None
    }

    fn synthesized_info(&self) -> Option<SynthesizedInfo> {
        None
    }

    /// Interop identity when this is a local copy of an embedded interop
    /// type that must be unified with its canonical definition.
    fn no_pia_local_identity(&self) -> Option<TypeIdentifier> {
        None
    }

    /// Interop identity of a canonical interop type.
    fn type_identifier(&self) -> Option<TypeIdentifier> {
        None
    }

    fn is_anonymous_type(&self) -> bool {
        self.anonymous_type_key().is_some()
    }

    fn metadata_name(&self) -> MetadataTypeName {
        MetadataTypeName::new(self.namespace(), self.name(), self.arity())
    }

    /// `Namespace.Outer.Inner` display name.
    fn full_name(&self) -> String {
        match self.containing_type() {
            Some(outer) => format!("{}.{}", outer.full_name(), self.name()),
            None if self.namespace().is_empty() => self.name().to_string(),
            None => format!("{}.{}", self.namespace(), self.name()),
        }
    }

    fn members_named(&self, name: &str) -> Vec<SymbolRef> {
        self.members()
            .iter()
            .filter(|member| member.name() == name)
            .cloned()
            .collect()
    }

    fn nested_types(&self) -> Vec<NamedTypeRef> {
        self.members()
            .iter()
            .filter_map(SymbolRef::as_named_type)
            .cloned()
            .collect()
    }

    fn get_nested_type(&self, name: &str, arity: usize) -> Option<NamedTypeRef> {
        self.members().iter().find_map(|member| match member {
            SymbolRef::NamedType(ty) if ty.name() == name && ty.arity() == arity => {
                Some(ty.clone())
            }
            _ => None,
        })
    }
}

pub trait MethodSymbol: Symbol {
    fn method_kind(&self) -> MethodKind;

    fn flags(&self) -> MemberFlags;

    fn calling_convention(&self) -> CallingConvention {
        CallingConvention::Default
    }

    fn arity(&self) -> usize;

    fn type_parameters(&self) -> Arc<[TypeParameterSymbol]>;

    fn return_type(&self) -> TypeSymbol;

    fn return_ref_kind(&self) -> RefKind {
        RefKind::None
    }

    fn return_type_custom_modifiers(&self) -> Arc<[CustomModifier]>;

    fn return_type_attributes(&self) -> Arc<[AttributeData]>;

    fn return_value_marshalling_info(&self) -> Option<MarshalInfo> {
        None
    }

    fn parameters(&self) -> Arc<[ParameterRef]>;

    fn explicit_interface_implementations(&self) -> Arc<[MethodRef]>;

    fn containing_type(&self) -> Option<NamedTypeRef>;

    /// Property or event this accessor belongs to.
    fn associated_symbol(&self) -> Option<SymbolRef> {
        None
    }

    /// For a partial implementation part, its definition part.
    fn partial_definition_part(&self) -> Option<MethodRef> {
        None
    }

    /// For a partial definition part, its implementation part.
    fn partial_implementation_part(&self) -> Option<MethodRef> {
        None
    }

    fn synthesized_info(&self) -> Option<SynthesizedInfo> {
        None
    }

    fn is_static(&self) -> bool {
        self.flags().contains(MemberFlags::STATIC)
    }

    fn is_virtual(&self) -> bool {
        self.flags().contains(MemberFlags::VIRTUAL)
    }

    fn is_override(&self) -> bool {
        self.flags().contains(MemberFlags::OVERRIDE)
    }

    fn is_abstract(&self) -> bool {
        self.flags().contains(MemberFlags::ABSTRACT)
    }

    fn is_sealed(&self) -> bool {
        self.flags().contains(MemberFlags::SEALED)
    }

    fn is_extern(&self) -> bool {
        self.flags().contains(MemberFlags::EXTERN)
    }

    fn is_async(&self) -> bool {
        self.flags().contains(MemberFlags::ASYNC)
    }

    fn is_iterator(&self) -> bool {
        self.flags().contains(MemberFlags::ITERATOR)
    }

    fn is_generic(&self) -> bool {
        self.arity() > 0
    }

    fn is_partial_implementation(&self) -> bool {
        self.partial_definition_part().is_some()
    }

    /// Offset of `position` from the start of the method declaration, used
    /// as the syntax part of local identities.
    fn calculate_local_syntax_offset(&self, position: u32) -> i32 {
        let start = self
            .locations()
            .iter()
            .find_map(Location::span)
            .map_or(0, |span| span.start);
        position as i32 - start as i32
    }
}

pub trait ParameterSymbol: Symbol {
    fn ordinal(&self) -> usize;

    fn ty(&self) -> TypeSymbol;

    fn ref_kind(&self) -> RefKind {
        RefKind::None
    }

    fn flags(&self) -> ParameterFlags;

    fn explicit_default_value(&self) -> Option<ConstantValue> {
        None
    }

    fn custom_modifiers(&self) -> Arc<[CustomModifier]>;

    fn marshalling_info(&self) -> Option<MarshalInfo> {
        None
    }

    fn is_params(&self) -> bool {
        self.flags().contains(ParameterFlags::PARAMS)
    }

    fn is_optional(&self) -> bool {
        self.flags().contains(ParameterFlags::OPTIONAL)
    }
}

pub trait PropertySymbol: Symbol {
    fn ty(&self) -> TypeSymbol;

    fn ref_kind(&self) -> RefKind {
        RefKind::None
    }

    fn type_custom_modifiers(&self) -> Arc<[CustomModifier]>;

    fn flags(&self) -> MemberFlags;

    fn parameters(&self) -> Arc<[ParameterRef]>;

    fn get_method(&self) -> Option<MethodRef>;

    fn set_method(&self) -> Option<MethodRef>;

    fn containing_type(&self) -> Option<NamedTypeRef>;
}

pub trait FieldSymbol: Symbol {
    fn ty(&self) -> TypeSymbol;

    fn custom_modifiers(&self) -> Arc<[CustomModifier]>;

    fn flags(&self) -> MemberFlags;

    fn constant_value(&self) -> Option<ConstantValue> {
        None
    }

    fn marshalling_info(&self) -> Option<MarshalInfo> {
        None
    }

    /// Property or event this field backs.
    fn associated_symbol(&self) -> Option<SymbolRef> {
        None
    }

    fn synthesized_info(&self) -> Option<SynthesizedInfo> {
        None
    }

    fn containing_type(&self) -> Option<NamedTypeRef>;
}

pub trait EventSymbol: Symbol {
    fn ty(&self) -> TypeSymbol;

    fn flags(&self) -> MemberFlags;

    fn add_method(&self) -> Option<MethodRef>;

    fn remove_method(&self) -> Option<MethodRef>;

    fn containing_type(&self) -> Option<NamedTypeRef>;
}

// =============================================================================
// Identity equality for trait objects
// =============================================================================

macro_rules! identity_eq {
    ($($trait:ident),* $(,)?) => {$(
        impl PartialEq for dyn $trait {
            fn eq(&self, other: &Self) -> bool {
                std::ptr::addr_eq(self as *const Self, other as *const Self)
            }
        }

        impl Eq for dyn $trait {}

        impl Hash for dyn $trait {
            fn hash<H: Hasher>(&self, state: &mut H) {
                (self as *const Self).cast::<()>().hash(state);
            }
        }
    )*};
}

identity_eq!(
    AssemblySymbol,
    ModuleSymbol,
    NamedTypeSymbol,
    MethodSymbol,
    ParameterSymbol,
    PropertySymbol,
    FieldSymbol,
    EventSymbol,
);

// =============================================================================
// SymbolRef
// =============================================================================

/// A reference to a symbol of any kind.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SymbolRef {
    Assembly(AssemblyRef),
    Module(ModuleRef),
    NamedType(NamedTypeRef),
    Method(MethodRef),
    Parameter(ParameterRef),
    Property(PropertyRef),
    Field(FieldRef),
    Event(EventRef),
}

macro_rules! dispatch {
    ($self:expr, $s:ident => $body:expr) => {
        match $self {
            SymbolRef::Assembly($s) => $body,
            SymbolRef::Module($s) => $body,
            SymbolRef::NamedType($s) => $body,
            SymbolRef::Method($s) => $body,
            SymbolRef::Parameter($s) => $body,
            SymbolRef::Property($s) => $body,
            SymbolRef::Field($s) => $body,
            SymbolRef::Event($s) => $body,
        }
    };
}

impl SymbolRef {
    pub fn kind(&self) -> SymbolKind {
        dispatch!(self, s => s.kind())
    }

    pub fn name(&self) -> &str {
        dispatch!(self, s => s.name())
    }

    pub fn containing_symbol(&self) -> Option<SymbolRef> {
        dispatch!(self, s => s.containing_symbol())
    }

    pub fn containing_assembly(&self) -> Option<AssemblyRef> {
        dispatch!(self, s => s.containing_assembly())
    }

    pub fn containing_module(&self) -> Option<ModuleRef> {
        dispatch!(self, s => s.containing_module())
    }

    pub fn declared_accessibility(&self) -> Accessibility {
        dispatch!(self, s => s.declared_accessibility())
    }

    pub fn locations(&self) -> Arc<[Location]> {
        dispatch!(self, s => s.locations())
    }

    pub fn attributes(&self) -> Arc<[AttributeData]> {
        dispatch!(self, s => s.attributes())
    }

    pub fn declaring_compilation(&self) -> Option<CompilationId> {
        dispatch!(self, s => s.declaring_compilation())
    }

    pub fn is_implicitly_declared(&self) -> bool {
        dispatch!(self, s => s.is_implicitly_declared())
    }

    pub fn is_retargeting(&self) -> bool {
        dispatch!(self, s => s.is_retargeting())
    }

    pub fn metadata_handle(&self) -> Option<EntityHandle> {
        dispatch!(self, s => s.metadata_handle())
    }

    pub fn use_site_diagnostic(&self) -> Option<Diagnostic> {
        dispatch!(self, s => s.use_site_diagnostic())
    }

    /// Containing type of a member or nested type.
    pub fn containing_type(&self) -> Option<NamedTypeRef> {
        match self {
            Self::Assembly(_) | Self::Module(_) => None,
            Self::NamedType(s) => s.containing_type(),
            Self::Method(s) => s.containing_type(),
            Self::Property(s) => s.containing_type(),
            Self::Field(s) => s.containing_type(),
            Self::Event(s) => s.containing_type(),
            Self::Parameter(s) => s
                .containing_symbol()
                .and_then(|owner| owner.containing_type()),
        }
    }

    pub fn synthesized_info(&self) -> Option<SynthesizedInfo> {
        match self {
            Self::NamedType(s) => s.synthesized_info(),
            Self::Method(s) => s.synthesized_info(),
            Self::Field(s) => s.synthesized_info(),
            _ => None,
        }
    }

    /// Property or event an accessor or backing field belongs to.
    pub fn associated_symbol(&self) -> Option<SymbolRef> {
        match self {
            Self::Method(s) => s.associated_symbol(),
            Self::Field(s) => s.associated_symbol(),
            _ => None,
        }
    }

    pub fn is_type(&self) -> bool {
        matches!(self, Self::NamedType(_))
    }

    pub fn as_assembly(&self) -> Option<&AssemblyRef> {
        match self {
            Self::Assembly(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_module(&self) -> Option<&ModuleRef> {
        match self {
            Self::Module(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_named_type(&self) -> Option<&NamedTypeRef> {
        match self {
            Self::NamedType(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&MethodRef> {
        match self {
            Self::Method(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_parameter(&self) -> Option<&ParameterRef> {
        match self {
            Self::Parameter(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_property(&self) -> Option<&PropertyRef> {
        match self {
            Self::Property(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_field(&self) -> Option<&FieldRef> {
        match self {
            Self::Field(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_event(&self) -> Option<&EventRef> {
        match self {
            Self::Event(s) => Some(s),
            _ => None,
        }
    }

    /// Walks containing types up to the outermost one. A top-level type is
    /// its own top-level type.
    pub fn top_level_type(&self) -> Option<NamedTypeRef> {
        let mut current = match self {
            Self::NamedType(ty) => ty.clone(),
            other => other.containing_type()?,
        };
        while let Some(outer) = current.containing_type() {
            current = outer;
        }
        Some(current)
    }
}

macro_rules! symbol_ref_from {
    ($($variant:ident($ty:ty)),* $(,)?) => {$(
        impl From<$ty> for SymbolRef {
            fn from(symbol: $ty) -> Self {
                SymbolRef::$variant(symbol)
            }
        }
    )*};
}

symbol_ref_from!(
    Assembly(AssemblyRef),
    Module(ModuleRef),
    NamedType(NamedTypeRef),
    Method(MethodRef),
    Parameter(ParameterRef),
    Property(PropertyRef),
    Field(FieldRef),
    Event(EventRef),
);

impl fmt::Display for SymbolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assembly(s) => write!(f, "{}", s.identity()),
            Self::NamedType(s) => f.write_str(&s.full_name()),
            Self::Module(s) => f.write_str(s.name()),
            Self::Parameter(s) => write!(f, "parameter {}", s.name()),
            Self::Method(_) | Self::Property(_) | Self::Field(_) | Self::Event(_) => {
                match self.containing_type() {
                    Some(ty) => write!(f, "{}.{}", ty.full_name(), self.name()),
                    None => f.write_str(self.name()),
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/symbol_tests.rs"]
mod tests;
