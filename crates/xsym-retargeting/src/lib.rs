//! Retargeting symbol facade.
//!
//! When a compilation references an assembly `C1` that was built against
//! `Lib` version 1, while the compilation itself references `Lib` version 2,
//! `C1`'s symbols must be observed as if `C1` had been built against version
//! 2. A [`RetargetingAssemblySymbol`] wraps `C1` and lazily re-derives every
//! type-graph-touching member (signatures, attributes, explicit
//! implementations) through a [`RetargetingSymbolTranslator`], without
//! copying the underlying symbol tree.
//!
//! Wrappers are created on demand, cached per module, and never wrap another
//! wrapper.

#[macro_use]
mod macros;

mod assembly;
mod members;
mod method;
mod module;
mod named_type;
mod no_pia;
mod parameter;
mod translator;

pub use assembly::RetargetingAssemblySymbol;
pub use members::{RetargetingEventSymbol, RetargetingFieldSymbol, RetargetingPropertySymbol};
pub use method::RetargetingMethodSymbol;
pub use module::RetargetingModuleSymbol;
pub use named_type::RetargetingNamedTypeSymbol;
pub use parameter::{ParameterOwner, RetargetingParameterSymbol};
pub use translator::{RetargetOptions, RetargetingSymbolTranslator};

#[cfg(test)]
#[path = "../tests/retargeting_tests.rs"]
mod tests;
