//! xsym: the symbol layer a compiler needs to observe assemblies through
//! different reference sets (retargeting) and to compile edits of a running
//! program against its previous generations (edit-and-continue).
//!
//! The workspace crates are re-exported under short names; the most used
//! types are also available at the root.

// Spans, locations, diagnostics and limits shared by every layer
pub use xsym_common as common;
pub use xsym_common::{Diagnostic, Location, SyntaxTreeId, TextSpan};

// Symbol capability traits and the metadata-backed symbol model
pub use xsym_symbols as symbols;
pub use xsym_symbols::{
    AssemblyBuilder, AssemblyIdentity, AssemblyRef, CompilationId, MethodRef, NamedTypeRef,
    SymbolKind, SymbolRef, TypeSymbol,
};

// Retargeting facade over assemblies built against other references
pub use xsym_retargeting as retargeting;
pub use xsym_retargeting::{
    RetargetingAssemblySymbol, RetargetingModuleSymbol, RetargetingSymbolTranslator,
};

// Edit-and-continue: definition maps, matchers, change tables and slot reuse
pub use xsym_enc as enc;
pub use xsym_enc::{
    CompilationSymbolMatcher, DefinitionMap, EmitBaseline, EncError, EncVariableSlotAllocator,
    SemanticEdit, SymbolChange, SymbolChanges, SymbolDefinitionMap, SymbolMatcher,
};

// Tracing configuration (XSYM_LOG / XSYM_LOG_FORMAT)
pub mod tracing_config;
