//! What an EnC session remembers between generations.
//!
//! Generation 0 is the module loaded from disk ([`PeModule`]). Every later
//! generation appends rows to its tables; [`EmitBaseline`] records which
//! definitions got which rows, so the next delta can refer to them.

use crate::local_info::{
    EncHoistedLocalInfo, EncLocalInfo, LocalSlotConstraints, LocalSlotDebugInfo,
};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::hash::Hash;
use std::sync::Arc;
use tracing::debug;
use xsym_symbols::{
    AnonymousTypeKey, AssemblyRef, CompilationId, EntityHandle, EventRef, FieldRef,
    MethodDefinitionHandle, MethodRef, NamedTypeRef, PropertyRef, SymbolRef, TableIndex,
    TypeSymbol,
};

/// Synthesized members of each type, keyed by the type that contains them.
pub type SynthesizedMembers = IndexMap<NamedTypeRef, Vec<SymbolRef>>;

// =============================================================================
// Generation 0
// =============================================================================

/// Row counts of the definition tables.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TableSizes {
    pub type_defs: u32,
    pub field_defs: u32,
    pub method_defs: u32,
    pub param_defs: u32,
    pub event_defs: u32,
    pub property_defs: u32,
}

impl TableSizes {
    pub fn row_count(&self, table: TableIndex) -> u32 {
        match table {
            TableIndex::TypeDef => self.type_defs,
            TableIndex::Field => self.field_defs,
            TableIndex::MethodDef => self.method_defs,
            TableIndex::Param => self.param_defs,
            TableIndex::Event => self.event_defs,
            TableIndex::Property => self.property_defs,
        }
    }

    fn row_count_mut(&mut self, table: TableIndex) -> &mut u32 {
        match table {
            TableIndex::TypeDef => &mut self.type_defs,
            TableIndex::Field => &mut self.field_defs,
            TableIndex::MethodDef => &mut self.method_defs,
            TableIndex::Param => &mut self.param_defs,
            TableIndex::Event => &mut self.event_defs,
            TableIndex::Property => &mut self.property_defs,
        }
    }

    fn observe(&mut self, handle: EntityHandle) {
        let count = self.row_count_mut(handle.table);
        *count = (*count).max(handle.row);
    }
}

/// One local slot of a method body as declared in its local signature.
#[derive(Clone, Debug)]
pub struct LocalSlotMetadata {
    pub ty: TypeSymbol,
    pub constraints: LocalSlotConstraints,
    pub signature: Arc<[u8]>,
}

/// Per-method debug information the compiler writes for later edits.
#[derive(Clone, Debug, Default)]
pub struct EditAndContinueMethodDebugInformation {
    pub method_ordinal: u32,
    /// Kind and id of each local slot, in slot order.
    pub local_slots: Vec<LocalSlotDebugInfo>,
    /// Set for async and iterator methods, whose locals live in fields of
    /// this nested type.
    pub state_machine_type_name: Option<Arc<str>>,
    /// Kind and id of each hoisted local field, in slot order.
    pub state_machine_hoisted_local_slots: Vec<LocalSlotDebugInfo>,
}

/// The module an EnC session started from.
#[derive(Debug)]
pub struct PeModule {
    assembly: AssemblyRef,
    table_sizes: TableSizes,
    debug_info: FxHashMap<MethodDefinitionHandle, EditAndContinueMethodDebugInformation>,
    locals: FxHashMap<MethodDefinitionHandle, Arc<[LocalSlotMetadata]>>,
}

impl PeModule {
    pub fn new(assembly: AssemblyRef) -> Self {
        let table_sizes = compute_table_sizes(&assembly);
        debug!(
            assembly = %assembly.identity(),
            types = table_sizes.type_defs,
            methods = table_sizes.method_defs,
            "PeModule::new"
        );
        Self {
            assembly,
            table_sizes,
            debug_info: FxHashMap::default(),
            locals: FxHashMap::default(),
        }
    }

    pub fn with_method_debug_info(
        mut self,
        method: MethodDefinitionHandle,
        info: EditAndContinueMethodDebugInformation,
    ) -> Self {
        self.debug_info.insert(method, info);
        self
    }

    pub fn with_locals(
        mut self,
        method: MethodDefinitionHandle,
        locals: Vec<LocalSlotMetadata>,
    ) -> Self {
        self.locals.insert(method, locals.into());
        self
    }

    pub fn assembly(&self) -> &AssemblyRef {
        &self.assembly
    }

    pub fn table_sizes(&self) -> TableSizes {
        self.table_sizes
    }

    pub fn method_debug_info(
        &self,
        method: MethodDefinitionHandle,
    ) -> Option<&EditAndContinueMethodDebugInformation> {
        self.debug_info.get(&method)
    }

    pub fn locals(&self, method: MethodDefinitionHandle) -> &[LocalSlotMetadata] {
        match self.locals.get(&method) {
            Some(locals) => locals,
            None => &[],
        }
    }

    /// Row of `symbol`, if it is a definition of this module.
    pub fn handle_of(&self, symbol: &SymbolRef) -> Option<EntityHandle> {
        let assembly = symbol.containing_assembly()?;
        if !Arc::ptr_eq(&assembly, &self.assembly) {
            return None;
        }
        symbol.metadata_handle()
    }

    /// Finds a type of this module by simple name, nested types included.
    pub fn find_type(&self, name: &str) -> Option<NamedTypeRef> {
        let mut pending: Vec<NamedTypeRef> = self
            .assembly
            .modules()
            .iter()
            .flat_map(|module| module.types().to_vec())
            .collect();
        while let Some(ty) = pending.pop() {
            if ty.name() == name {
                return Some(ty);
            }
            pending.extend(ty.nested_types());
        }
        None
    }
}

fn compute_table_sizes(assembly: &AssemblyRef) -> TableSizes {
    let mut sizes = TableSizes::default();
    let mut pending: Vec<NamedTypeRef> = assembly
        .modules()
        .iter()
        .flat_map(|module| module.types().to_vec())
        .collect();
    while let Some(ty) = pending.pop() {
        if let Some(handle) = ty.metadata_handle() {
            sizes.observe(handle);
        }
        for member in ty.members().iter() {
            if let Some(handle) = member.metadata_handle() {
                sizes.observe(handle);
            }
            match member {
                SymbolRef::NamedType(nested) => pending.push(nested.clone()),
                SymbolRef::Method(method) => {
                    for parameter in method.parameters().iter() {
                        if let Some(handle) = parameter.metadata_handle() {
                            sizes.observe(handle);
                        }
                    }
                }
                _ => {}
            }
        }
    }
    sizes
}

// =============================================================================
// Later generations
// =============================================================================

#[derive(Clone, Debug)]
pub struct AnonymousTypeValue {
    pub name: Arc<str>,
    pub unique_index: u32,
    pub ty: NamedTypeRef,
}

/// Slot layout of a method emitted by some generation after the first.
#[derive(Clone, Debug, Default)]
pub struct AddedOrChangedMethodInfo {
    pub method_ordinal: u32,
    pub locals: Arc<[EncLocalInfo]>,
    pub state_machine_type_name: Option<Arc<str>>,
    pub state_machine_hoisted_local_slots: Option<Arc<[EncHoistedLocalInfo]>>,
    /// Awaiter type of each awaiter slot; `None` marks a slot that is reserved
    /// but unused.
    pub state_machine_awaiter_slots: Option<Arc<[Option<TypeSymbol>]>>,
}

impl AddedOrChangedMethodInfo {
    /// Rewrites every type this info mentions through `map`.
    pub fn map_types(&self, map: impl Fn(&TypeSymbol) -> Option<TypeSymbol>) -> Self {
        let locals = self.locals.iter().map(|local| local.map_type(&map)).collect();
        let hoisted = self
            .state_machine_hoisted_local_slots
            .as_ref()
            .map(|slots| slots.iter().map(|slot| slot.map_type(&map)).collect());
        let awaiters = self.state_machine_awaiter_slots.as_ref().map(|slots| {
            slots
                .iter()
                .map(|slot| slot.as_ref().and_then(&map))
                .collect()
        });
        Self {
            method_ordinal: self.method_ordinal,
            locals,
            state_machine_type_name: self.state_machine_type_name.clone(),
            state_machine_hoisted_local_slots: hoisted,
            state_machine_awaiter_slots: awaiters,
        }
    }
}

/// Definitions and method bodies one generation emitted.
#[derive(Clone, Debug, Default)]
pub struct GenerationDelta {
    pub types_added: Vec<NamedTypeRef>,
    pub events_added: Vec<EventRef>,
    pub fields_added: Vec<FieldRef>,
    pub methods_added: Vec<MethodRef>,
    pub properties_added: Vec<PropertyRef>,
    pub changed_methods: Vec<(MethodDefinitionHandle, AddedOrChangedMethodInfo)>,
    pub anonymous_types: Vec<(AnonymousTypeKey, AnonymousTypeValue)>,
    /// The complete synthesized member table after this generation.
    pub synthesized_members: SynthesizedMembers,
}

/// Everything the next generation needs to know about the previous ones.
#[derive(Clone, Debug)]
pub struct EmitBaseline {
    ordinal: u32,
    compilation: Option<CompilationId>,
    original_metadata: Arc<PeModule>,
    /// Highest row handed out per table. Rows of dropped entries stay taken.
    last_rows: TableSizes,
    type_defs_added: IndexMap<NamedTypeRef, u32>,
    event_defs_added: IndexMap<EventRef, u32>,
    field_defs_added: IndexMap<FieldRef, u32>,
    method_defs_added: IndexMap<MethodRef, u32>,
    property_defs_added: IndexMap<PropertyRef, u32>,
    anonymous_type_map: IndexMap<AnonymousTypeKey, AnonymousTypeValue>,
    synthesized_members: SynthesizedMembers,
    added_or_changed_methods: IndexMap<MethodDefinitionHandle, AddedOrChangedMethodInfo>,
}

impl EmitBaseline {
    /// The baseline of generation 0: nothing added yet.
    pub fn initial(module: Arc<PeModule>) -> Self {
        Self {
            ordinal: 0,
            compilation: None,
            last_rows: module.table_sizes(),
            original_metadata: module,
            type_defs_added: IndexMap::new(),
            event_defs_added: IndexMap::new(),
            field_defs_added: IndexMap::new(),
            method_defs_added: IndexMap::new(),
            property_defs_added: IndexMap::new(),
            anonymous_type_map: IndexMap::new(),
            synthesized_members: IndexMap::new(),
            added_or_changed_methods: IndexMap::new(),
        }
    }

    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    /// Compilation the latest generation was emitted from. `None` for
    /// generation 0.
    pub fn compilation(&self) -> Option<CompilationId> {
        self.compilation
    }

    pub fn original_metadata(&self) -> &Arc<PeModule> {
        &self.original_metadata
    }

    pub fn type_defs_added(&self) -> &IndexMap<NamedTypeRef, u32> {
        &self.type_defs_added
    }

    pub fn event_defs_added(&self) -> &IndexMap<EventRef, u32> {
        &self.event_defs_added
    }

    pub fn field_defs_added(&self) -> &IndexMap<FieldRef, u32> {
        &self.field_defs_added
    }

    pub fn method_defs_added(&self) -> &IndexMap<MethodRef, u32> {
        &self.method_defs_added
    }

    pub fn property_defs_added(&self) -> &IndexMap<PropertyRef, u32> {
        &self.property_defs_added
    }

    pub fn anonymous_type_map(&self) -> &IndexMap<AnonymousTypeKey, AnonymousTypeValue> {
        &self.anonymous_type_map
    }

    pub fn synthesized_members(&self) -> &SynthesizedMembers {
        &self.synthesized_members
    }

    pub fn added_or_changed_methods(
        &self,
    ) -> &IndexMap<MethodDefinitionHandle, AddedOrChangedMethodInfo> {
        &self.added_or_changed_methods
    }

    /// Row the next definition added to `table` will get.
    pub fn next_row(&self, table: TableIndex) -> u32 {
        self.last_rows.row_count(table) + 1
    }

    pub fn with_compilation(mut self, compilation: CompilationId) -> Self {
        self.compilation = Some(compilation);
        self
    }

    pub fn with_anonymous_types(
        mut self,
        anonymous_types: IndexMap<AnonymousTypeKey, AnonymousTypeValue>,
    ) -> Self {
        self.anonymous_type_map = anonymous_types;
        self
    }

    pub fn with_synthesized_members(mut self, synthesized_members: SynthesizedMembers) -> Self {
        self.synthesized_members = synthesized_members;
        self
    }

    pub fn with_added_or_changed_methods(
        mut self,
        methods: IndexMap<MethodDefinitionHandle, AddedOrChangedMethodInfo>,
    ) -> Self {
        self.added_or_changed_methods = methods;
        self
    }

    /// Re-keys the five added-definition tables through `map`. Entries whose
    /// definition has no counterpart are dropped; their rows stay allocated.
    pub fn with_mapped_definitions(
        mut self,
        map: impl Fn(&SymbolRef) -> Option<SymbolRef>,
    ) -> Self {
        self.type_defs_added = remap_table(
            &self.type_defs_added,
            SymbolRef::NamedType,
            SymbolRef::as_named_type,
            &map,
        );
        self.event_defs_added =
            remap_table(&self.event_defs_added, SymbolRef::Event, SymbolRef::as_event, &map);
        self.field_defs_added =
            remap_table(&self.field_defs_added, SymbolRef::Field, SymbolRef::as_field, &map);
        self.method_defs_added =
            remap_table(&self.method_defs_added, SymbolRef::Method, SymbolRef::as_method, &map);
        self.property_defs_added = remap_table(
            &self.property_defs_added,
            SymbolRef::Property,
            SymbolRef::as_property,
            &map,
        );
        self
    }

    /// The baseline after emitting `delta` from `compilation`. Definitions
    /// added for the first time get the next free rows of their tables.
    pub fn next_generation(&self, compilation: CompilationId, delta: GenerationDelta) -> Self {
        let mut next = self.clone();
        next.ordinal += 1;
        next.compilation = Some(compilation);

        let last = &mut next.last_rows;
        allocate_rows(&mut next.type_defs_added, &mut last.type_defs, delta.types_added);
        allocate_rows(&mut next.event_defs_added, &mut last.event_defs, delta.events_added);
        allocate_rows(&mut next.field_defs_added, &mut last.field_defs, delta.fields_added);
        allocate_rows(&mut next.method_defs_added, &mut last.method_defs, delta.methods_added);
        allocate_rows(
            &mut next.property_defs_added,
            &mut last.property_defs,
            delta.properties_added,
        );

        next.added_or_changed_methods.extend(delta.changed_methods);
        next.anonymous_type_map.extend(delta.anonymous_types);
        next.synthesized_members = delta.synthesized_members;

        debug!(
            generation = next.ordinal,
            types_added = next.type_defs_added.len(),
            methods_added = next.method_defs_added.len(),
            changed_methods = next.added_or_changed_methods.len(),
            "EmitBaseline::next_generation"
        );
        next
    }
}

fn allocate_rows<K: Eq + Hash>(
    table: &mut IndexMap<K, u32>,
    last_row: &mut u32,
    definitions: Vec<K>,
) {
    for definition in definitions {
        if !table.contains_key(&definition) {
            *last_row += 1;
            table.insert(definition, *last_row);
        }
    }
}

fn remap_table<K: Clone + Eq + Hash>(
    table: &IndexMap<K, u32>,
    wrap: impl Fn(K) -> SymbolRef,
    unwrap: impl Fn(&SymbolRef) -> Option<&K>,
    map: &impl Fn(&SymbolRef) -> Option<SymbolRef>,
) -> IndexMap<K, u32> {
    table
        .iter()
        .filter_map(|(definition, &row)| {
            let mapped = map(&wrap(definition.clone()))?;
            Some((unwrap(&mapped)?.clone(), row))
        })
        .collect()
}

#[cfg(test)]
#[path = "../tests/baseline_tests.rs"]
mod tests;
