//! Custom attributes and marshalling descriptors.

use crate::symbol::MethodRef;
use crate::types::{NamedTypeHandle, TypeSymbol};
use std::sync::Arc;

/// Compile-time constant.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstantValue {
    Null,
    Bool(bool),
    Char(char),
    Int(i64),
    UInt(u64),
    Double(f64),
    String(Arc<str>),
}

/// Value of an attribute argument.
#[derive(Clone, Debug, PartialEq)]
pub enum TypedConstantValue {
    Primitive(ConstantValue),
    /// `typeof(T)` argument.
    Type(TypeSymbol),
    Array(Vec<TypedConstant>),
}

/// An attribute argument together with its declared type.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedConstant {
    pub ty: TypeSymbol,
    pub value: TypedConstantValue,
}

impl TypedConstant {
    pub fn primitive(ty: TypeSymbol, value: ConstantValue) -> Self {
        Self {
            ty,
            value: TypedConstantValue::Primitive(value),
        }
    }

    pub fn type_of(ty: TypeSymbol, argument: TypeSymbol) -> Self {
        Self {
            ty,
            value: TypedConstantValue::Type(argument),
        }
    }
}

/// One application of a custom attribute.
///
/// The constructor is absent when the attribute class could not be bound;
/// such attributes are carried through unchanged.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeData {
    pub attribute_class: Option<NamedTypeHandle>,
    pub constructor: Option<MethodRef>,
    pub constructor_arguments: Vec<TypedConstant>,
    pub named_arguments: Vec<(Arc<str>, TypedConstant)>,
}

impl AttributeData {
    pub fn new(constructor: MethodRef, constructor_arguments: Vec<TypedConstant>) -> Self {
        let attribute_class = constructor
            .containing_type()
            .map(|class| NamedTypeHandle::new(&class));
        Self {
            attribute_class,
            constructor: Some(constructor),
            constructor_arguments,
            named_arguments: Vec::new(),
        }
    }

    pub fn with_named_argument(mut self, name: impl Into<Arc<str>>, value: TypedConstant) -> Self {
        self.named_arguments.push((name.into(), value));
        self
    }

    /// True if the attribute class is the named type `namespace.name`.
    pub fn is_target_attribute(&self, namespace: &str, name: &str) -> bool {
        self.attribute_class
            .as_ref()
            .and_then(NamedTypeHandle::try_get)
            .is_some_and(|class| class.namespace() == namespace && class.name() == name)
    }
}

/// Unmanaged type codes used in marshalling descriptors.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnmanagedType {
    Bool,
    I4,
    LPStr,
    LPWStr,
    Interface,
    SafeArray,
    ByValArray,
    CustomMarshaler,
    Other(u8),
}

/// Marshalling descriptor of a parameter, return value, or field.
#[derive(Clone, Debug, PartialEq)]
pub struct MarshalInfo {
    pub unmanaged_type: UnmanagedType,
    /// Custom marshaller type, for `UnmanagedType::CustomMarshaler`.
    pub marshal_type: Option<TypeSymbol>,
    pub marshal_cookie: Option<Arc<str>>,
    pub size_const: Option<u32>,
}

impl MarshalInfo {
    pub fn simple(unmanaged_type: UnmanagedType) -> Self {
        Self {
            unmanaged_type,
            marshal_type: None,
            marshal_cookie: None,
            size_const: None,
        }
    }
}
