//! Centralized limits and thresholds for symbol graph traversals.
//!
//! The symbol graphs handed to this workspace are acyclic by construction,
//! but the walks below are driven by host-provided data. Each limit bounds
//! one walk so a malformed graph degrades instead of overflowing the stack.

/// Maximum number of change-relevant containers walked upward from one symbol.
///
/// Used by `SymbolChanges` when it propagates a verdict from a container to a
/// member and when it records `ContainsChanges` for the containers of an edit.
/// Lambdas and local functions nest inside each other, so the chain can be
/// long, but never this long for a well-formed tree.
pub const MAX_CONTAINER_CHAIN_DEPTH: usize = 512;

/// Maximum number of assemblies visited while following type forwarders.
///
/// Forwarders may point at assemblies that forward again. Cycles are caught
/// by the visited list; this bounds pathological but acyclic chains.
pub const MAX_FORWARDING_CHAIN_DEPTH: usize = 64;

/// Inline capacity of the visited-assembly list used during forwarded type lookup.
pub const FORWARDING_VISITED_INLINE: usize = 4;
