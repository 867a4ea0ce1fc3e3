//! Assembly and compilation identities.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Four-part assembly version.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
    pub build: u16,
    pub revision: u16,
}

impl Version {
    pub const fn new(major: u16, minor: u16, build: u16, revision: u16) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

/// Name and version of an assembly.
///
/// Two assemblies with the same name but different versions are the same
/// logical assembly; retargeting maps one onto the other.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AssemblyIdentity {
    pub name: Arc<str>,
    pub version: Version,
}

impl AssemblyIdentity {
    pub fn new(name: impl Into<Arc<str>>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }

    /// Same logical assembly, possibly a different version.
    pub fn is_same_logical_assembly(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Display for AssemblyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, Version={}", self.name, self.version)
    }
}

static NEXT_COMPILATION_ID: AtomicU32 = AtomicU32::new(1);

/// Identifies the compilation that declared a source symbol.
///
/// Symbols loaded from metadata and retargeting wrappers have no declaring
/// compilation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompilationId(pub u32);

impl CompilationId {
    /// Allocate a fresh, process-unique compilation id.
    pub fn fresh() -> Self {
        Self(NEXT_COMPILATION_ID.fetch_add(1, Ordering::Relaxed))
    }
}
