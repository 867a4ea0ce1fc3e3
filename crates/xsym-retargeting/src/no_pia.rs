//! Unification of embedded interop types with their canonical definitions.

use tracing::debug;
use xsym_symbols::{
    AssemblyRef, MissingType, MissingTypeReason, NamedTypeRef, TypeIdentifier, TypeSymbol,
};

/// Finds the one canonical type for the local embedded interop type `local`
/// among `candidates`.
///
/// The assembly that embeds `local` is never a candidate. No match yields a
/// missing-canonical error type; more than one yields an ambiguous one.
pub(crate) fn find_canonical_type(
    local: &NamedTypeRef,
    identifier: &TypeIdentifier,
    candidates: &[AssemblyRef],
) -> TypeSymbol {
    let embedding_assembly = local.containing_assembly();
    let mut found: Option<(NamedTypeRef, &AssemblyRef)> = None;

    for assembly in candidates {
        if embedding_assembly.as_ref() == Some(assembly) {
            continue;
        }
        let Some(candidate) = assembly.find_type_by_identifier(identifier) else {
            continue;
        };
        if candidate.no_pia_local_identity().is_some() {
            continue;
        }
        if let Some((_, first)) = &found {
            debug!(
                type_name = %identifier.name,
                first = %first.identity(),
                second = %assembly.identity(),
                "no_pia::ambiguous canonical type"
            );
            return TypeSymbol::missing(MissingType {
                name: identifier.name.clone(),
                assembly: Some(first.identity().clone()),
                reason: MissingTypeReason::NoPiaAmbiguousCanonical,
            });
        }
        found = Some((candidate, assembly));
    }

    match found {
        Some((canonical, _)) => TypeSymbol::named(&canonical),
        None => {
            debug!(type_name = %identifier.name, "no_pia::missing canonical type");
            TypeSymbol::missing(MissingType {
                name: identifier.name.clone(),
                assembly: embedding_assembly.map(|assembly| assembly.identity().clone()),
                reason: MissingTypeReason::NoPiaMissingCanonical,
            })
        }
    }
}
