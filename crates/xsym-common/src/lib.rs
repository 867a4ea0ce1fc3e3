//! Common types and utilities for the xsym symbol model.
//!
//! This crate provides foundational types used across all xsym crates:
//! - Source spans and locations (`TextSpan`, `Location`, `SyntaxTreeId`)
//! - Diagnostics (`Diagnostic`, `DiagnosticCategory`, diagnostic codes)
//! - Centralized limits and thresholds

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::{Location, SyntaxTreeId, TextSpan};

// Diagnostics shared by symbol use-site checks
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory, format_message};

// Centralized limits and thresholds
pub mod limits;
