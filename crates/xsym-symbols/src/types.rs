//! Type references appearing in signatures.
//!
//! A [`TypeSymbol`] refers to named types through [`NamedTypeHandle`], a weak
//! handle. The assembly that declares a type owns it; signatures elsewhere in
//! the graph only point at it, so cyclic signatures never keep a graph alive.

use crate::identity::AssemblyIdentity;
use crate::symbol::{NamedTypeRef, NamedTypeSymbol};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};
use xsym_common::Diagnostic;
use xsym_common::diagnostics::diagnostic_messages;

// =============================================================================
// Named type handles
// =============================================================================

/// Non-owning reference to a named type. Equality is identity.
#[derive(Clone)]
pub struct NamedTypeHandle(Weak<dyn NamedTypeSymbol>);

impl NamedTypeHandle {
    pub fn new(target: &NamedTypeRef) -> Self {
        Self(Arc::downgrade(target))
    }

    /// Resolve the handle.
    ///
    /// # Panics
    /// If the declaring assembly was dropped while signatures referring to
    /// its types are still in use.
    pub fn get(&self) -> NamedTypeRef {
        match self.0.upgrade() {
            Some(target) => target,
            None => panic!("named type outlived the assembly that declares it"),
        }
    }

    pub fn try_get(&self) -> Option<NamedTypeRef> {
        self.0.upgrade()
    }

    /// True if this handle points at `target`.
    pub fn is(&self, target: &NamedTypeRef) -> bool {
        std::ptr::addr_eq(self.0.as_ptr(), Arc::as_ptr(target))
    }
}

impl PartialEq for NamedTypeHandle {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(self.0.as_ptr(), other.0.as_ptr())
    }
}

impl Eq for NamedTypeHandle {}

impl Hash for NamedTypeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.as_ptr().cast::<()>().hash(state);
    }
}

impl fmt::Debug for NamedTypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.upgrade() {
            Some(target) => write!(f, "{}", target.full_name()),
            None => f.write_str("<dropped type>"),
        }
    }
}

impl From<&NamedTypeRef> for NamedTypeHandle {
    fn from(target: &NamedTypeRef) -> Self {
        Self::new(target)
    }
}

// =============================================================================
// Special types
// =============================================================================

/// Types the core library is expected to define.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpecialType {
    Object,
    ValueType,
    Enum,
    Void,
    Boolean,
    Char,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    String,
    IntPtr,
    UIntPtr,
}

impl SpecialType {
    /// Types that carry a primitive type code in signatures. These are
    /// identified by their code, not by the assembly that defines them.
    pub const fn is_primitive_type_code(self) -> bool {
        !matches!(self, Self::Object | Self::ValueType | Self::Enum)
    }

    pub const fn metadata_name(self) -> (&'static str, &'static str) {
        let name = match self {
            Self::Object => "Object",
            Self::ValueType => "ValueType",
            Self::Enum => "Enum",
            Self::Void => "Void",
            Self::Boolean => "Boolean",
            Self::Char => "Char",
            Self::SByte => "SByte",
            Self::Byte => "Byte",
            Self::Int16 => "Int16",
            Self::UInt16 => "UInt16",
            Self::Int32 => "Int32",
            Self::UInt32 => "UInt32",
            Self::Int64 => "Int64",
            Self::UInt64 => "UInt64",
            Self::Single => "Single",
            Self::Double => "Double",
            Self::String => "String",
            Self::IntPtr => "IntPtr",
            Self::UIntPtr => "UIntPtr",
        };
        ("System", name)
    }
}

// =============================================================================
// Metadata names and missing types
// =============================================================================

/// Namespace-qualified name of a top-level type, as written in metadata.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MetadataTypeName {
    pub namespace: Arc<str>,
    pub name: Arc<str>,
    pub arity: usize,
}

impl MetadataTypeName {
    pub fn new(namespace: impl Into<Arc<str>>, name: impl Into<Arc<str>>, arity: usize) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            arity,
        }
    }

    pub fn of_special(special: SpecialType) -> Self {
        let (namespace, name) = special.metadata_name();
        Self::new(namespace, name, 0)
    }
}

impl fmt::Display for MetadataTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.namespace.is_empty() {
            write!(f, "{}.", self.namespace)?;
        }
        f.write_str(&self.name)?;
        if self.arity > 0 {
            write!(f, "`{}", self.arity)?;
        }
        Ok(())
    }
}

/// Why a type could not be resolved.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MissingTypeReason {
    /// No referenced assembly defines the type.
    NotFound,
    /// Forwarders form a cycle.
    ForwardingCycle,
    /// An embedded interop type has no canonical definition.
    NoPiaMissingCanonical,
    /// An embedded interop type has several canonical definitions.
    NoPiaAmbiguousCanonical,
}

/// Placeholder for a type that cannot be resolved in the current
/// assembly set. Appears wherever the type was referenced.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MissingType {
    pub name: MetadataTypeName,
    /// Assembly expected to define the type, when known.
    pub assembly: Option<AssemblyIdentity>,
    pub reason: MissingTypeReason,
}

impl MissingType {
    /// Use-site error reported where the missing type is referenced.
    pub fn diagnostic(&self) -> Diagnostic {
        let type_name = self.name.to_string();
        let assembly = self
            .assembly
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        let message = match self.reason {
            MissingTypeReason::NotFound => {
                &diagnostic_messages::TYPE_DEFINED_IN_UNREFERENCED_ASSEMBLY
            }
            MissingTypeReason::ForwardingCycle => &diagnostic_messages::CYCLE_IN_TYPE_FORWARDER,
            MissingTypeReason::NoPiaMissingCanonical => {
                &diagnostic_messages::NO_PIA_MISSING_CANONICAL_TYPE
            }
            MissingTypeReason::NoPiaAmbiguousCanonical => {
                &diagnostic_messages::NO_PIA_AMBIGUOUS_CANONICAL_TYPE
            }
        };
        Diagnostic::from_message(message, &[&type_name, &assembly])
    }
}

// =============================================================================
// Type parameters and modifiers
// =============================================================================

/// Whether a type parameter is declared by a type or a method.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeParameterOwnerKind {
    Type,
    Method,
}

/// Positional reference to a type parameter in a signature.
///
/// Positions are preserved by retargeting, so the same reference is valid
/// in both the underlying and the retargeted signature.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeParameterRef {
    pub owner: TypeParameterOwnerKind,
    pub ordinal: u32,
}

bitflags::bitflags! {
    /// Special constraints on a type parameter.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TypeParameterConstraints: u8 {
        const REFERENCE_TYPE = 1 << 0;
        const VALUE_TYPE = 1 << 1;
        const CONSTRUCTOR = 1 << 2;
    }
}

/// Declaration of a type parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeParameterSymbol {
    pub name: Arc<str>,
    pub owner: TypeParameterOwnerKind,
    pub ordinal: u32,
    pub constraints: TypeParameterConstraints,
    pub constraint_types: Arc<[TypeSymbol]>,
}

impl TypeParameterSymbol {
    pub fn new(name: impl Into<Arc<str>>, owner: TypeParameterOwnerKind, ordinal: u32) -> Self {
        Self {
            name: name.into(),
            owner,
            ordinal,
            constraints: TypeParameterConstraints::empty(),
            constraint_types: Arc::from([]),
        }
    }

    pub fn reference(&self) -> TypeParameterRef {
        TypeParameterRef {
            owner: self.owner,
            ordinal: self.ordinal,
        }
    }
}

/// `modopt`/`modreq` attached to a type in a signature.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CustomModifier {
    pub modifier: NamedTypeHandle,
    pub is_optional: bool,
}

// =============================================================================
// TypeSymbol
// =============================================================================

/// Instantiation of a generic type definition.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConstructedType {
    pub definition: NamedTypeHandle,
    pub type_arguments: Arc<[TypeSymbol]>,
}

/// Array of some element type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArrayType {
    pub element: TypeSymbol,
    pub rank: u32,
    pub element_custom_modifiers: Arc<[CustomModifier]>,
}

/// A type as it appears in a signature.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeSymbol {
    Named(NamedTypeHandle),
    Constructed(Arc<ConstructedType>),
    Array(Arc<ArrayType>),
    Pointer(Arc<TypeSymbol>),
    TypeParameter(TypeParameterRef),
    Error(Arc<MissingType>),
}

impl TypeSymbol {
    pub fn named(target: &NamedTypeRef) -> Self {
        Self::Named(NamedTypeHandle::new(target))
    }

    pub fn constructed(definition: &NamedTypeRef, type_arguments: Vec<TypeSymbol>) -> Self {
        Self::Constructed(Arc::new(ConstructedType {
            definition: NamedTypeHandle::new(definition),
            type_arguments: type_arguments.into(),
        }))
    }

    pub fn array(element: TypeSymbol, rank: u32) -> Self {
        Self::Array(Arc::new(ArrayType {
            element,
            rank,
            element_custom_modifiers: Arc::from([]),
        }))
    }

    pub fn pointer(pointee: TypeSymbol) -> Self {
        Self::Pointer(Arc::new(pointee))
    }

    pub fn type_parameter(owner: TypeParameterOwnerKind, ordinal: u32) -> Self {
        Self::TypeParameter(TypeParameterRef { owner, ordinal })
    }

    pub fn missing(missing: MissingType) -> Self {
        Self::Error(Arc::new(missing))
    }

    /// The named type, if this is a plain named type.
    pub fn as_named(&self) -> Option<NamedTypeRef> {
        match self {
            Self::Named(handle) => Some(handle.get()),
            _ => None,
        }
    }

    /// Definition of a named or constructed type.
    pub fn original_definition(&self) -> Option<NamedTypeRef> {
        match self {
            Self::Named(handle) => Some(handle.get()),
            Self::Constructed(constructed) => Some(constructed.definition.get()),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// First missing type reachable from this type, depth-first.
    pub fn first_missing(&self) -> Option<&MissingType> {
        match self {
            Self::Error(missing) => Some(missing),
            Self::Constructed(constructed) => constructed
                .type_arguments
                .iter()
                .find_map(TypeSymbol::first_missing),
            Self::Array(array) => array.element.first_missing(),
            Self::Pointer(pointee) => pointee.first_missing(),
            Self::Named(_) | Self::TypeParameter(_) => None,
        }
    }
}

impl fmt::Display for TypeSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(handle) => write!(f, "{handle:?}"),
            Self::Constructed(constructed) => {
                write!(f, "{:?}<", constructed.definition)?;
                for (i, arg) in constructed.type_arguments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(">")
            }
            Self::Array(array) => {
                write!(f, "{}[", array.element)?;
                for _ in 1..array.rank {
                    f.write_str(",")?;
                }
                f.write_str("]")
            }
            Self::Pointer(pointee) => write!(f, "{pointee}*"),
            Self::TypeParameter(param) => match param.owner {
                TypeParameterOwnerKind::Type => write!(f, "!{}", param.ordinal),
                TypeParameterOwnerKind::Method => write!(f, "!!{}", param.ordinal),
            },
            Self::Error(missing) => write!(f, "?{}", missing.name),
        }
    }
}

/// Interop identity of a type embedded from a primary interop assembly.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeIdentifier {
    pub scope: Arc<str>,
    pub name: MetadataTypeName,
}
