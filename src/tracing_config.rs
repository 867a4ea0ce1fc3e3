//! Tracing configuration for debugging retargeting and EnC sessions.
//!
//! Supports three output formats controlled by `XSYM_LOG_FORMAT`:
//!
//! - `text` (default): flat `tracing-subscriber` lines
//! - `tree`: hierarchical indented output via `tracing-tree`
//! - `json`: one JSON object per span or event
//!
//! ## Quick start
//!
//! ```bash
//! # Which symbols each edit classified, as a tree
//! XSYM_LOG=xsym_enc=trace XSYM_LOG_FORMAT=tree cargo test -p xsym-enc
//!
//! # Retargeting wrappers and NoPia unification as JSON
//! XSYM_LOG="xsym_retargeting=debug" XSYM_LOG_FORMAT=json cargo test --test retargeting
//! ```
//!
//! The subscriber is only installed when `XSYM_LOG` (or `RUST_LOG`) is set.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

/// Filter directives, `RUST_LOG` syntax.
pub const LOG_ENV: &str = "XSYM_LOG";

/// Output format selector.
pub const LOG_FORMAT_ENV: &str = "XSYM_LOG_FORMAT";

/// Tracing output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Standard flat text lines.
    #[default]
    Text,
    /// Hierarchical indented tree via `tracing-tree`.
    Tree,
    /// Newline-delimited JSON objects.
    Json,
}

impl LogFormat {
    /// Case-insensitive; anything unrecognized is `Text`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "tree" => Self::Tree,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    fn from_env() -> Self {
        std::env::var(LOG_FORMAT_ENV)
            .map(|value| Self::parse(&value))
            .unwrap_or_default()
    }
}

/// `XSYM_LOG` takes precedence over `RUST_LOG`.
fn build_filter() -> EnvFilter {
    match std::env::var(LOG_ENV) {
        Ok(directives) => EnvFilter::builder().parse_lossy(directives),
        Err(_) => EnvFilter::from_default_env(),
    }
}

/// Installs the global subscriber, writing to stderr.
///
/// Returns `false` when neither `XSYM_LOG` nor `RUST_LOG` is set, or when a
/// global subscriber is already installed.
pub fn init_tracing() -> bool {
    if std::env::var_os(LOG_ENV).is_none() && std::env::var_os("RUST_LOG").is_none() {
        return false;
    }

    let filter = build_filter();
    let format = LogFormat::from_env();
    let installed = match format {
        LogFormat::Tree => {
            let tree_layer = tracing_tree::HierarchicalLayer::default()
                .with_writer(std::io::stderr)
                .with_indent_amount(2)
                .with_indent_lines(true)
                .with_deferred_spans(true)
                .with_targets(true);
            Registry::default().with(filter).with(tree_layer).try_init()
        }
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);
            Registry::default().with(filter).with(json_layer).try_init()
        }
        LogFormat::Text => {
            let text_layer = fmt::layer().with_writer(std::io::stderr);
            Registry::default().with(filter).with(text_layer).try_init()
        }
    };
    if installed.is_err() {
        return false;
    }
    tracing::debug!(?format, "tracing_config::init_tracing");
    true
}

#[cfg(test)]
#[path = "tests/tracing_config_tests.rs"]
mod tests;
