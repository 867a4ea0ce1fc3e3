//! Symbol model for the xsym compiler platform.
//!
//! This crate defines what every layer above it binds against:
//! - Symbol capability traits (`Symbol`, `AssemblySymbol`, `MethodSymbol`, ...)
//!   and identity-compared references (`SymbolRef`, `MethodRef`, ...)
//! - Signature types (`TypeSymbol`, custom modifiers, attributes, marshalling)
//! - Metadata row handles
//! - Race-safe compute-once fields (`LazyField`)
//! - Metadata-backed symbol trees (`metadata::AssemblyBuilder`)
//! - Structural signature comparison (`MethodSignatureComparer`)

pub mod attributes;
pub mod handles;
pub mod identity;
pub mod lazy;
pub mod metadata;
pub mod signature;
pub mod symbol;
pub mod types;

pub use attributes::{
    AttributeData, ConstantValue, MarshalInfo, TypedConstant, TypedConstantValue, UnmanagedType,
};
pub use handles::{
    EntityHandle, EventDefinitionHandle, FieldDefinitionHandle, MethodDefinitionHandle,
    ParameterHandle, PropertyDefinitionHandle, TableIndex, TypeDefinitionHandle,
};
pub use identity::{AssemblyIdentity, CompilationId, Version};
pub use lazy::{FieldState, LazyField};
pub use metadata::{
    AssemblyBuilder, EventDef, FieldDef, MethodDef, ParamDef, PropertyDef, TypeDef,
};
pub use signature::{MethodSignature, MethodSignatureComparer, ParameterSignature, SignatureParts};
pub use symbol::{
    Accessibility, AnonymousTypeKey, AssemblyRef, AssemblySymbol, CallingConvention, EventRef,
    EventSymbol, FieldRef, FieldSymbol, ForwardedTypeLookup, ForwardingVisited, MemberFlags,
    MethodKind, MethodRef, MethodSymbol, ModuleRef, ModuleSymbol, NamedTypeRef, NamedTypeSymbol,
    ParameterFlags, ParameterRef, ParameterSymbol, PropertyRef, PropertySymbol, RefKind, Symbol,
    SymbolKind, SymbolRef, SynthesizedInfo, TypeKind,
};
pub use types::{
    ArrayType, ConstructedType, CustomModifier, MetadataTypeName, MissingType, MissingTypeReason,
    NamedTypeHandle, SpecialType, TypeIdentifier, TypeParameterConstraints, TypeParameterOwnerKind,
    TypeParameterRef, TypeParameterSymbol, TypeSymbol,
};
