//! Mapping definitions of one generation onto another.

use crate::baseline::{AnonymousTypeValue, EmitBaseline, SynthesizedMembers};
use dashmap::DashMap;
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};
use xsym_symbols::{
    AnonymousTypeKey, ArrayType, AssemblyRef, CompilationId, MethodRef, NamedTypeRef,
    ParameterRef, PropertyRef, SymbolRef, TypeSymbol,
};

/// Maps definitions and type references from a source generation to their
/// counterparts in a target generation. `None` means the target has no
/// counterpart: the entity was deleted, or never existed there.
pub trait SymbolMatcher: Send + Sync {
    fn map_reference(&self, ty: &TypeSymbol) -> Option<TypeSymbol>;

    fn map_definition(&self, definition: &SymbolRef) -> Option<SymbolRef>;

    /// Re-homes `baseline` onto the compilation this matcher maps into.
    ///
    /// Added definitions that no longer map are dropped: their generator was
    /// not recompiled, so they have no distinct counterpart. Their rows stay
    /// allocated.
    ///
    /// # Panics
    /// If an anonymous type of the baseline has no counterpart; anonymous
    /// types stay reachable from every later compilation.
    fn map_baseline_to_compilation(
        &self,
        baseline: &EmitBaseline,
        target: CompilationId,
        new_synthesized_members: &SynthesizedMembers,
    ) -> EmitBaseline {
        let anonymous_types: IndexMap<AnonymousTypeKey, AnonymousTypeValue> = baseline
            .anonymous_type_map()
            .iter()
            .map(|(key, value)| {
                let mapped = self
                    .map_definition(&SymbolRef::NamedType(value.ty.clone()))
                    .and_then(|mapped| mapped.as_named_type().cloned());
                let Some(ty) = mapped else {
                    panic!(
                        "anonymous type {} has no counterpart in compilation {target:?}",
                        value.name
                    );
                };
                (key.clone(), AnonymousTypeValue { ty, ..value.clone() })
            })
            .collect();
        let synthesized_members = merge_synthesized_members(
            self,
            baseline.synthesized_members(),
            new_synthesized_members,
        );
        let methods = baseline
            .added_or_changed_methods()
            .iter()
            .map(|(handle, info)| (*handle, info.map_types(|ty| self.map_reference(ty))))
            .collect();

        let mapped = baseline
            .clone()
            .with_compilation(target)
            .with_mapped_definitions(|definition| self.map_definition(definition))
            .with_anonymous_types(anonymous_types)
            .with_synthesized_members(synthesized_members)
            .with_added_or_changed_methods(methods);
        debug!(
            generation = mapped.ordinal(),
            types_added = mapped.type_defs_added().len(),
            types_dropped = baseline.type_defs_added().len() - mapped.type_defs_added().len(),
            methods_added = mapped.method_defs_added().len(),
            methods_dropped = baseline.method_defs_added().len() - mapped.method_defs_added().len(),
            "SymbolMatcher::map_baseline_to_compilation"
        );
        mapped
    }
}

/// Merges the synthesized members of all previous generations with the ones
/// the new compilation produced.
///
/// The result is a union, never a replacement: rows allocated by any
/// generation stay valid for the rest of the session.
/// - A previous container that maps to a container with new members gets
///   the new list plus every previous member that did not map into it.
/// - A previous container that maps but produced no new members keeps its
///   previous members under the mapped container.
/// - A previous container that does not map is carried over unchanged.
pub fn merge_synthesized_members<M: SymbolMatcher + ?Sized>(
    matcher: &M,
    previous: &SynthesizedMembers,
    new: &SynthesizedMembers,
) -> SynthesizedMembers {
    if previous.is_empty() {
        return new.clone();
    }
    let mut merged = new.clone();
    for (previous_container, members) in previous {
        let mapped_container = matcher
            .map_definition(&SymbolRef::NamedType(previous_container.clone()))
            .and_then(|mapped| mapped.as_named_type().cloned());
        let Some(mapped_container) = mapped_container else {
            extend_unique(
                merged.entry(previous_container.clone()).or_default(),
                members.iter().cloned(),
            );
            continue;
        };
        let Some(new_members) = new.get(&mapped_container) else {
            extend_unique(
                merged.entry(mapped_container).or_default(),
                members.iter().cloned(),
            );
            continue;
        };

        let merged_members = merged.entry(mapped_container.clone()).or_default();
        for member in members {
            match matcher.map_definition(member) {
                Some(mapped) if new_members.contains(&mapped) => {}
                Some(mapped) => {
                    warn!(
                        container = %mapped_container.full_name(),
                        member = %mapped,
                        "SymbolMatcher::carry forward missing synthesized member"
                    );
                    extend_unique(merged_members, std::iter::once(mapped));
                }
                None => extend_unique(merged_members, std::iter::once(member.clone())),
            }
        }
    }
    merged
}

fn extend_unique(list: &mut Vec<SymbolRef>, items: impl IntoIterator<Item = SymbolRef>) {
    for item in items {
        if !list.contains(&item) {
            list.push(item);
        }
    }
}

// =============================================================================
// CompilationSymbolMatcher
// =============================================================================

/// Structural matcher between the symbol trees of two generations.
///
/// Types match by namespace, name, arity and nesting; methods by name,
/// arity, ref kinds and mapped parameter and return types; properties by
/// name and mapped parameter types; fields and events by name. Symbols of
/// other assemblies are shared by both generations and map to themselves.
pub struct CompilationSymbolMatcher {
    source_assembly: AssemblyRef,
    other_assembly: AssemblyRef,
    other_synthesized_members: SynthesizedMembers,
    other_anonymous_types: IndexMap<AnonymousTypeKey, AnonymousTypeValue>,
    cache: DashMap<SymbolRef, Option<SymbolRef>>,
}

impl CompilationSymbolMatcher {
    pub fn new(source_assembly: AssemblyRef, other_assembly: AssemblyRef) -> Self {
        Self {
            source_assembly,
            other_assembly,
            other_synthesized_members: IndexMap::new(),
            other_anonymous_types: IndexMap::new(),
            cache: DashMap::new(),
        }
    }

    /// Also matches the synthesized members and anonymous types `baseline`
    /// recorded for the target generation.
    pub fn with_previous_generation(mut self, baseline: &EmitBaseline) -> Self {
        self.other_synthesized_members = baseline.synthesized_members().clone();
        self.other_anonymous_types = baseline.anonymous_type_map().clone();
        self
    }

    pub fn into_shared(self) -> Arc<dyn SymbolMatcher> {
        Arc::new(self)
    }

    fn is_source_symbol(&self, symbol: &SymbolRef) -> bool {
        symbol
            .containing_assembly()
            .is_some_and(|assembly| Arc::ptr_eq(&assembly, &self.source_assembly))
    }

    fn map_named_type(&self, ty: &NamedTypeRef) -> Option<NamedTypeRef> {
        self.map_definition(&SymbolRef::NamedType(ty.clone()))?
            .as_named_type()
            .cloned()
    }

    /// Members of `container` named `name`, synthesized ones included.
    fn other_members(&self, container: &NamedTypeRef, name: &str) -> Vec<SymbolRef> {
        let mut found = container.members_named(name);
        if let Some(synthesized) = self.other_synthesized_members.get(container) {
            for member in synthesized {
                if member.name() == name && !found.contains(member) {
                    found.push(member.clone());
                }
            }
        }
        found
    }

    fn types_match(&self, source: &TypeSymbol, other: &TypeSymbol) -> bool {
        self.map_reference(source).as_ref() == Some(other)
    }

    fn parameters_match(&self, source: &[ParameterRef], other: &[ParameterRef]) -> bool {
        source.len() == other.len()
            && source.iter().zip(other).all(|(source, other)| {
                source.ref_kind() == other.ref_kind() && self.types_match(&source.ty(), &other.ty())
            })
    }

    fn methods_match(&self, source: &MethodRef, other: &MethodRef) -> bool {
        source.arity() == other.arity()
            && source.return_ref_kind() == other.return_ref_kind()
            && self.parameters_match(&source.parameters(), &other.parameters())
            && self.types_match(&source.return_type(), &other.return_type())
    }

    fn properties_match(&self, source: &PropertyRef, other: &PropertyRef) -> bool {
        source.ref_kind() == other.ref_kind()
            && self.parameters_match(&source.parameters(), &other.parameters())
            && self.types_match(&source.ty(), &other.ty())
    }

    fn match_named_type(&self, ty: &NamedTypeRef) -> Option<NamedTypeRef> {
        if let Some(key) = ty.anonymous_type_key() {
            if let Some(value) = self.other_anonymous_types.get(&key) {
                return Some(value.ty.clone());
            }
        }
        let Some(outer) = ty.containing_type() else {
            let name = ty.metadata_name();
            return self
                .other_assembly
                .modules()
                .iter()
                .find_map(|module| module.lookup_top_level_type(&name))
                .filter(|other| other.type_kind() == ty.type_kind());
        };
        let other_outer = self.map_named_type(&outer)?;
        self.other_members(&other_outer, ty.name())
            .into_iter()
            .find_map(|member| match member {
                SymbolRef::NamedType(other)
                    if other.arity() == ty.arity() && other.type_kind() == ty.type_kind() =>
                {
                    Some(other)
                }
                _ => None,
            })
    }

    fn match_definition(&self, definition: &SymbolRef) -> Option<SymbolRef> {
        if let SymbolRef::Assembly(assembly) = definition {
            if Arc::ptr_eq(assembly, &self.source_assembly) {
                return Some(SymbolRef::Assembly(self.other_assembly.clone()));
            }
            return Some(definition.clone());
        }
        if !self.is_source_symbol(definition) {
            return Some(definition.clone());
        }
        match definition {
            SymbolRef::Assembly(_) => None,
            SymbolRef::Module(module) => self
                .other_assembly
                .modules()
                .get(module.ordinal())
                .cloned()
                .map(SymbolRef::Module),
            SymbolRef::NamedType(ty) => self.match_named_type(ty).map(SymbolRef::NamedType),
            SymbolRef::Method(method) => {
                let container = self.map_named_type(&method.containing_type()?)?;
                self.other_members(&container, method.name())
                    .into_iter()
                    .find(|candidate| match candidate {
                        SymbolRef::Method(other) => self.methods_match(method, other),
                        _ => false,
                    })
            }
            SymbolRef::Property(property) => {
                let container = self.map_named_type(&property.containing_type()?)?;
                self.other_members(&container, property.name())
                    .into_iter()
                    .find(|candidate| match candidate {
                        SymbolRef::Property(other) => self.properties_match(property, other),
                        _ => false,
                    })
            }
            SymbolRef::Field(field) => {
                let container = self.map_named_type(&field.containing_type()?)?;
                self.other_members(&container, field.name())
                    .into_iter()
                    .find(|candidate| matches!(candidate, SymbolRef::Field(_)))
            }
            SymbolRef::Event(event) => {
                let container = self.map_named_type(&event.containing_type()?)?;
                self.other_members(&container, event.name())
                    .into_iter()
                    .find(|candidate| matches!(candidate, SymbolRef::Event(_)))
            }
            SymbolRef::Parameter(parameter) => {
                let owner = self.map_definition(&parameter.containing_symbol()?)?;
                let parameters = match &owner {
                    SymbolRef::Method(method) => method.parameters(),
                    SymbolRef::Property(property) => property.parameters(),
                    _ => return None,
                };
                parameters
                    .get(parameter.ordinal())
                    .cloned()
                    .map(SymbolRef::Parameter)
            }
        }
    }
}

impl SymbolMatcher for CompilationSymbolMatcher {
    fn map_reference(&self, ty: &TypeSymbol) -> Option<TypeSymbol> {
        match ty {
            TypeSymbol::Named(handle) => {
                let mapped = self.map_named_type(&handle.try_get()?)?;
                Some(TypeSymbol::named(&mapped))
            }
            TypeSymbol::Constructed(constructed) => {
                let definition = self.map_named_type(&constructed.definition.try_get()?)?;
                let arguments = constructed
                    .type_arguments
                    .iter()
                    .map(|argument| self.map_reference(argument))
                    .collect::<Option<Vec<_>>>()?;
                Some(TypeSymbol::constructed(&definition, arguments))
            }
            TypeSymbol::Array(array) => {
                let element = self.map_reference(&array.element)?;
                Some(TypeSymbol::Array(Arc::new(ArrayType {
                    element,
                    rank: array.rank,
                    element_custom_modifiers: array.element_custom_modifiers.clone(),
                })))
            }
            TypeSymbol::Pointer(pointee) => Some(TypeSymbol::pointer(self.map_reference(pointee)?)),
            TypeSymbol::TypeParameter(_) | TypeSymbol::Error(_) => Some(ty.clone()),
        }
    }

    fn map_definition(&self, definition: &SymbolRef) -> Option<SymbolRef> {
        if let Some(cached) = self.cache.get(definition) {
            return cached.value().clone();
        }
        let matched = self.match_definition(definition);
        trace!(
            definition = %definition,
            matched = matched.is_some(),
            "CompilationSymbolMatcher::map_definition"
        );
        self.cache
            .entry(definition.clone())
            .or_insert(matched)
            .value()
            .clone()
    }
}

#[cfg(test)]
#[path = "../tests/symbol_matcher_tests.rs"]
mod tests;
