//! Structural signature comparison.
//!
//! Used to find the member of a type whose signature matches a signature
//! computed elsewhere, e.g. the interface method an explicit implementation
//! refers to after its types were rewritten.

use crate::symbol::{
    CallingConvention, MethodSymbol, PropertySymbol, RefKind, SymbolRef,
};
use crate::types::{CustomModifier, TypeSymbol};
use std::sync::Arc;

/// One parameter position of a signature.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterSignature {
    pub ty: TypeSymbol,
    pub ref_kind: RefKind,
    pub custom_modifiers: Arc<[CustomModifier]>,
}

/// Signature of a method or property, detached from any symbol.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodSignature {
    pub name: Arc<str>,
    pub arity: usize,
    pub calling_convention: CallingConvention,
    pub return_type: TypeSymbol,
    pub return_ref_kind: RefKind,
    pub return_custom_modifiers: Arc<[CustomModifier]>,
    pub parameters: Vec<ParameterSignature>,
}

impl MethodSignature {
    pub fn of_method(method: &dyn MethodSymbol) -> Self {
        Self {
            name: method.name().into(),
            arity: method.arity(),
            calling_convention: method.calling_convention(),
            return_type: method.return_type(),
            return_ref_kind: method.return_ref_kind(),
            return_custom_modifiers: method.return_type_custom_modifiers(),
            parameters: method
                .parameters()
                .iter()
                .map(|p| ParameterSignature {
                    ty: p.ty(),
                    ref_kind: p.ref_kind(),
                    custom_modifiers: p.custom_modifiers(),
                })
                .collect(),
        }
    }

    pub fn of_property(property: &dyn PropertySymbol) -> Self {
        Self {
            name: property.name().into(),
            arity: 0,
            calling_convention: CallingConvention::Default,
            return_type: property.ty(),
            return_ref_kind: property.ref_kind(),
            return_custom_modifiers: property.type_custom_modifiers(),
            parameters: property
                .parameters()
                .iter()
                .map(|p| ParameterSignature {
                    ty: p.ty(),
                    ref_kind: p.ref_kind(),
                    custom_modifiers: p.custom_modifiers(),
                })
                .collect(),
        }
    }

    /// Rewrites every type in the signature.
    pub fn map_types(&self, mut map: impl FnMut(&TypeSymbol) -> TypeSymbol) -> Self {
        Self {
            name: self.name.clone(),
            arity: self.arity,
            calling_convention: self.calling_convention,
            return_type: map(&self.return_type),
            return_ref_kind: self.return_ref_kind,
            return_custom_modifiers: self.return_custom_modifiers.clone(),
            parameters: self
                .parameters
                .iter()
                .map(|p| ParameterSignature {
                    ty: map(&p.ty),
                    ref_kind: p.ref_kind,
                    custom_modifiers: p.custom_modifiers.clone(),
                })
                .collect(),
        }
    }
}

bitflags::bitflags! {
    /// Signature parts a comparer takes into account.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct SignatureParts: u8 {
        const NAME = 1 << 0;
        const ARITY = 1 << 1;
        const CALLING_CONVENTION = 1 << 2;
        const RETURN_TYPE = 1 << 3;
        const RETURN_CUSTOM_MODIFIERS = 1 << 4;
        const PARAMETER_CUSTOM_MODIFIERS = 1 << 5;
        const REF_KINDS = 1 << 6;
    }
}

/// Compares method and property signatures on a fixed set of parts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MethodSignatureComparer {
    parts: SignatureParts,
}

impl MethodSignatureComparer {
    /// Every part of the signature.
    pub const EXACT: Self = Self {
        parts: SignatureParts::all(),
    };

    /// Matching an explicit implementation against an interface member
    /// whose types were rewritten. Custom modifiers on the return type may
    /// legitimately differ between assembly versions.
    pub const RETARGETED_EXPLICIT_IMPLEMENTATION: Self = Self {
        parts: SignatureParts::all().difference(SignatureParts::RETURN_CUSTOM_MODIFIERS),
    };

    /// Locating an attribute constructor: parameters only.
    pub const ATTRIBUTE_CONSTRUCTOR: Self = Self {
        parts: SignatureParts::NAME
            .union(SignatureParts::ARITY)
            .union(SignatureParts::REF_KINDS),
    };

    /// Locating a property: name, type, and indexer parameters.
    pub const PROPERTY: Self = Self {
        parts: SignatureParts::NAME
            .union(SignatureParts::RETURN_TYPE)
            .union(SignatureParts::REF_KINDS),
    };

    pub const fn new(parts: SignatureParts) -> Self {
        Self { parts }
    }

    pub const fn parts(self) -> SignatureParts {
        self.parts
    }

    pub fn equals(&self, a: &MethodSignature, b: &MethodSignature) -> bool {
        if self.parts.contains(SignatureParts::NAME) && a.name != b.name {
            return false;
        }
        if self.parts.contains(SignatureParts::ARITY) && a.arity != b.arity {
            return false;
        }
        if self.parts.contains(SignatureParts::CALLING_CONVENTION)
            && a.calling_convention != b.calling_convention
        {
            return false;
        }
        if self.parts.contains(SignatureParts::RETURN_TYPE)
            && (a.return_type != b.return_type || a.return_ref_kind != b.return_ref_kind)
        {
            return false;
        }
        if self.parts.contains(SignatureParts::RETURN_CUSTOM_MODIFIERS)
            && a.return_custom_modifiers != b.return_custom_modifiers
        {
            return false;
        }
        if a.parameters.len() != b.parameters.len() {
            return false;
        }
        a.parameters
            .iter()
            .zip(&b.parameters)
            .all(|(pa, pb)| self.parameters_equal(pa, pb))
    }

    fn parameters_equal(&self, a: &ParameterSignature, b: &ParameterSignature) -> bool {
        if a.ty != b.ty {
            return false;
        }
        if self.parts.contains(SignatureParts::REF_KINDS) && a.ref_kind != b.ref_kind {
            return false;
        }
        !self.parts.contains(SignatureParts::PARAMETER_CUSTOM_MODIFIERS)
            || a.custom_modifiers == b.custom_modifiers
    }

    /// First member of `candidates` whose signature matches `signature`.
    pub fn find_match<'a>(
        &self,
        signature: &MethodSignature,
        candidates: impl IntoIterator<Item = &'a SymbolRef>,
    ) -> Option<SymbolRef> {
        candidates.into_iter().find_map(|candidate| {
            let candidate_signature = match candidate {
                SymbolRef::Method(method) => MethodSignature::of_method(method.as_ref()),
                SymbolRef::Property(property) => MethodSignature::of_property(property.as_ref()),
                _ => return None,
            };
            self.equals(signature, &candidate_signature)
                .then(|| candidate.clone())
        })
    }
}

#[cfg(test)]
#[path = "../tests/signature_tests.rs"]
mod tests;
