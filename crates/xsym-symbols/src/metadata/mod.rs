//! Concrete symbols describing assemblies loaded from metadata or declared
//! by a compilation.
//!
//! The tree is assembled by [`AssemblyBuilder`]. Parents own their children
//! through `Arc`; children point back through `Weak` links that are wired
//! once, during [`AssemblyBuilder::build`], and never change afterwards.

mod assembly;
mod builder;
mod members;
mod named_type;

pub use assembly::{MetadataAssemblySymbol, MetadataModuleSymbol};
pub use builder::{AssemblyBuilder, EventDef, FieldDef, MethodDef, ParamDef, PropertyDef, TypeDef};
pub use members::{
    MetadataEventSymbol, MetadataFieldSymbol, MetadataMethodSymbol, MetadataParameterSymbol,
    MetadataPropertySymbol,
};
pub use named_type::MetadataNamedTypeSymbol;

use crate::attributes::AttributeData;
use crate::identity::CompilationId;
use crate::symbol::Accessibility;
use std::sync::Arc;
use xsym_common::Location;

/// Declaration data every metadata symbol carries.
#[derive(Clone, Debug)]
pub(crate) struct DeclInfo {
    pub name: Arc<str>,
    pub accessibility: Accessibility,
    pub compilation: Option<CompilationId>,
    pub locations: Arc<[Location]>,
    pub attributes: Arc<[AttributeData]>,
    pub implicitly_declared: bool,
}

impl DeclInfo {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            accessibility: Accessibility::Public,
            compilation: None,
            locations: Arc::from([]),
            attributes: Arc::from([]),
            implicitly_declared: false,
        }
    }

    /// Symbols without an explicit location report a metadata location.
    pub fn locations(&self) -> Arc<[Location]> {
        if self.locations.is_empty() && self.compilation.is_none() {
            Arc::from([Location::Metadata])
        } else {
            self.locations.clone()
        }
    }
}

#[cfg(test)]
#[path = "../../tests/metadata_tests.rs"]
mod tests;
