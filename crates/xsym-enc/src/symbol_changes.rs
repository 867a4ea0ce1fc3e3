//! Classification of every definition of a new generation as unchanged,
//! updated, added, or merely containing changes.

use crate::definition_map::DefinitionMap;
use crate::error::EncError;
use crate::semantic_edit::{SemanticEdit, SemanticEditKind};
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use smallvec::{SmallVec, smallvec};
use std::sync::Arc;
use tracing::{debug, trace, warn};
use xsym_common::limits::MAX_CONTAINER_CHAIN_DEPTH;
use xsym_symbols::{CompilationId, NamedTypeRef, SymbolKind, SymbolRef};

/// Verdict for one definition.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SymbolChange {
    /// Emitted as it was; nothing to do.
    None,
    /// Unchanged itself but some member is added or updated.
    ContainsChanges,
    Updated,
    /// Gets a new row in this generation.
    Added,
}

/// The container whose verdict a symbol inherits.
///
/// Accessors and backing fields report their property or event, not the
/// type that syntactically contains them. Modules and assemblies are never
/// containers.
pub fn change_relevant_container(symbol: &SymbolRef) -> Option<SymbolRef> {
    let associated = match symbol {
        SymbolRef::Method(method) if method.method_kind().is_accessor() => {
            method.associated_symbol()
        }
        SymbolRef::Field(field) => field.associated_symbol(),
        _ => None,
    };
    if associated.is_some() {
        return associated;
    }
    match symbol.containing_symbol()? {
        SymbolRef::Assembly(_) | SymbolRef::Module(_) => None,
        container => Some(container),
    }
}

/// The change table of one generation, built from the host's edits.
pub struct SymbolChanges {
    definition_map: Arc<dyn DefinitionMap>,
    changes: IndexMap<SymbolRef, SymbolChange>,
}

impl SymbolChanges {
    /// Builds the table for `edits` of `compilation`.
    ///
    /// Every edited member is recorded with its own verdict and each of its
    /// change-relevant containers with `ContainsChanges`, except properties
    /// and events, which become `Updated` because their rows change with
    /// their accessors. Edits of a partial method's implementation part are
    /// recorded on its definition part. Delete edits are ignored.
    pub fn new(
        definition_map: Arc<dyn DefinitionMap>,
        edits: &[SemanticEdit],
        compilation: CompilationId,
    ) -> Result<Self, EncError> {
        let mut changes: IndexMap<SymbolRef, SymbolChange> = IndexMap::new();
        let mut edited: FxHashSet<SymbolRef> = FxHashSet::default();

        for edit in edits {
            let verdict = match edit.kind {
                SemanticEditKind::Insert => SymbolChange::Added,
                SemanticEditKind::Update => SymbolChange::Updated,
                SemanticEditKind::Delete => continue,
            };
            let Some(new_symbol) = &edit.new_symbol else {
                return Err(EncError::MissingNewSymbol { kind: edit.kind });
            };
            if edit.kind == SemanticEditKind::Update && edit.old_symbol.is_none() {
                return Err(EncError::UpdateWithoutOldSymbol {
                    symbol: new_symbol.to_string(),
                });
            }
            if new_symbol.declaring_compilation() != Some(compilation) {
                return Err(EncError::SymbolNotInCompilation {
                    symbol: new_symbol.to_string(),
                    compilation,
                });
            }

            let member = match new_symbol {
                SymbolRef::Method(method) => match method.partial_definition_part() {
                    Some(definition) => SymbolRef::Method(definition),
                    None => new_symbol.clone(),
                },
                _ => new_symbol.clone(),
            };
            if !edited.insert(member.clone()) {
                return Err(EncError::DuplicateEdit {
                    symbol: member.to_string(),
                });
            }

            record_containers(&mut changes, &member);
            changes.insert(member, verdict);
        }

        debug!(
            edits = edits.len(),
            entries = changes.len(),
            "SymbolChanges::new"
        );
        Ok(Self {
            definition_map,
            changes,
        })
    }

    pub fn changes(&self) -> &IndexMap<SymbolRef, SymbolChange> {
        &self.changes
    }

    pub fn definition_map(&self) -> &Arc<dyn DefinitionMap> {
        &self.definition_map
    }

    /// Verdict for a source symbol.
    ///
    /// Symbols without an entry inherit from the nearest change-relevant
    /// container that has one: below an added container everything is
    /// added, below an unchanged one nothing changed, and below an updated
    /// one a symbol is added exactly when it has no row yet.
    pub fn get_change(&self, symbol: &SymbolRef) -> SymbolChange {
        if let Some(&change) = self.changes.get(symbol) {
            return change;
        }

        let mut chain: SmallVec<[SymbolRef; 4]> = smallvec![symbol.clone()];
        let mut inherited = SymbolChange::None;
        let mut current = symbol.clone();
        while let Some(container) = change_relevant_container(&current) {
            if let Some(&change) = self.changes.get(&container) {
                inherited = change;
                break;
            }
            if chain.len() >= MAX_CONTAINER_CHAIN_DEPTH {
                warn!(
                    symbol = %symbol,
                    depth = chain.len(),
                    "SymbolChanges::container chain too deep"
                );
                return SymbolChange::None;
            }
            chain.push(container.clone());
            current = container;
        }

        chain.iter().rev().fold(inherited, |container, member| match container {
            SymbolChange::Added => SymbolChange::Added,
            SymbolChange::None => SymbolChange::None,
            SymbolChange::Updated | SymbolChange::ContainsChanges => {
                if self.definition_map.definition_exists(member) {
                    SymbolChange::None
                } else {
                    SymbolChange::Added
                }
            }
        })
    }

    /// Verdict for a definition the emitter is about to write, which may be
    /// a synthesized one.
    ///
    /// A synthesized definition follows its generator method:
    /// - If the generator's containing type has no row yet, it is `Added`.
    /// - If it does not depend on the generator's body, an updated generator
    ///   leaves it unchanged.
    /// - Otherwise it is `Added` when it has no row yet, `ContainsChanges`
    ///   when it is a type, and `Updated` when it is a member.
    ///
    /// # Panics
    /// If the generator method itself is classified `ContainsChanges`.
    pub fn get_change_for_definition(&self, definition: &SymbolRef) -> SymbolChange {
        let Some(info) = definition.synthesized_info() else {
            return self.get_change(definition);
        };
        let generator = info
            .generator
            .partial_definition_part()
            .unwrap_or_else(|| info.generator.clone());

        let change = match self.get_change(&SymbolRef::Method(generator.clone())) {
            SymbolChange::Added => SymbolChange::Added,
            SymbolChange::None => SymbolChange::None,
            SymbolChange::Updated => {
                let container_exists = generator.containing_type().is_some_and(|ty| {
                    self.definition_map
                        .definition_exists(&SymbolRef::NamedType(ty))
                });
                if !container_exists {
                    SymbolChange::Added
                } else if !info.has_method_body_dependency {
                    SymbolChange::None
                } else if !self.definition_map.definition_exists(definition) {
                    SymbolChange::Added
                } else if definition.kind() == SymbolKind::NamedType {
                    SymbolChange::ContainsChanges
                } else {
                    SymbolChange::Updated
                }
            }
            SymbolChange::ContainsChanges => panic!(
                "generator method {} of {definition} cannot be classified as containing changes",
                generator.name()
            ),
        };
        trace!(
            definition = %definition,
            change = ?change,
            "SymbolChanges::get_change_for_definition"
        );
        change
    }

    /// True if `symbol` has to be compiled for this generation.
    pub fn requires_compilation(&self, symbol: &SymbolRef) -> bool {
        self.get_change(symbol) != SymbolChange::None
    }

    pub fn is_added(&self, symbol: &SymbolRef) -> bool {
        self.get_change(symbol) == SymbolChange::Added
    }

    /// Types the emitter has to look into: every anonymous type, then every
    /// top-level type with an entry in the change table.
    pub fn get_top_level_types(&self, anonymous_types: &[NamedTypeRef]) -> Vec<NamedTypeRef> {
        let mut types: Vec<NamedTypeRef> = Vec::new();
        let top_level = self.changes.keys().filter_map(|symbol| match symbol {
            SymbolRef::NamedType(ty) if ty.containing_type().is_none() => Some(ty),
            _ => None,
        });
        for ty in anonymous_types.iter().chain(top_level) {
            if !types.contains(ty) {
                types.push(ty.clone());
            }
        }
        types
    }
}

/// Records `ContainsChanges` (or `Updated` for properties and events) on
/// every change-relevant container of `member` not already in the table.
fn record_containers(changes: &mut IndexMap<SymbolRef, SymbolChange>, member: &SymbolRef) {
    let mut current = member.clone();
    for _ in 0..MAX_CONTAINER_CHAIN_DEPTH {
        let Some(container) = change_relevant_container(&current) else {
            return;
        };
        if changes.contains_key(&container) {
            return;
        }
        let change = match container.kind() {
            SymbolKind::Property | SymbolKind::Event => SymbolChange::Updated,
            _ => SymbolChange::ContainsChanges,
        };
        trace!(container = %container, change = ?change, "SymbolChanges::record container");
        changes.insert(container.clone(), change);
        current = container;
    }
    warn!(member = %member, "SymbolChanges::container chain too deep");
}

#[cfg(test)]
#[path = "../tests/symbol_changes_tests.rs"]
mod tests;
