use super::*;
use crate::baseline::{EmitBaseline, PeModule};
use crate::definition_map::{MethodDefinitionEntry, SymbolDefinitionMap};
use crate::fixtures::{World, corlib, identity, special, world};
use crate::slot_allocator::EncVariableSlotAllocator;
use crate::symbol_matcher::CompilationSymbolMatcher;
use xsym_symbols::{
    AssemblyBuilder, AssemblyRef, EventDefinitionHandle, EventRef, FieldDefinitionHandle,
    FieldRef, MethodDef, MethodDefinitionHandle, MethodRef, ParamDef, PropertyDefinitionHandle,
    PropertyRef, SpecialType, TypeDef, TypeDefinitionHandle,
};

fn method(method: &MethodRef) -> SymbolRef {
    SymbolRef::Method(method.clone())
}

fn ty(ty: &NamedTypeRef) -> SymbolRef {
    SymbolRef::NamedType(ty.clone())
}

/// Definition map of generation 1 over an untouched generation 0.
fn definition_map(world: &World, edits: &[SemanticEdit]) -> Arc<dyn DefinitionMap> {
    let to_metadata =
        CompilationSymbolMatcher::new(world.gen1.assembly.clone(), world.gen0.assembly.clone());
    let baseline = EmitBaseline::initial(Arc::new(PeModule::new(world.gen0.assembly.clone())));
    Arc::new(SymbolDefinitionMap::new(
        edits,
        to_metadata.into_shared(),
        None,
        Arc::new(baseline),
    ))
}

fn changes(world: &World, edits: &[SemanticEdit]) -> SymbolChanges {
    SymbolChanges::new(definition_map(world, edits), edits, world.gen1.compilation).unwrap()
}

fn update(old: &MethodRef, new: &MethodRef) -> SemanticEdit {
    SemanticEdit::update(method(old), method(new))
}

#[test]
fn test_method_update_marks_its_type() {
    let world = world();
    let changes = changes(&world, &[update(&world.gen0.foo, &world.gen1.foo)]);

    assert_eq!(changes.changes().len(), 2);
    assert_eq!(changes.get_change(&method(&world.gen1.foo)), SymbolChange::Updated);
    assert_eq!(changes.get_change(&ty(&world.gen1.widget)), SymbolChange::ContainsChanges);
    assert_eq!(changes.get_change(&method(&world.gen1.sibling)), SymbolChange::None);
    assert_eq!(changes.get_change(&method(&world.gen1.foo_text)), SymbolChange::None);
    assert!(changes.requires_compilation(&method(&world.gen1.foo)));
    assert!(!changes.requires_compilation(&method(&world.gen1.sibling)));
}

#[test]
fn test_unlisted_members_inherit_from_nearest_container() {
    let world = world();
    let changes = changes(&world, &[update(&world.gen0.foo, &world.gen1.foo)]);

    // Existing members below a container with changes are unchanged.
    assert_eq!(changes.get_change(&ty(&world.gen1.inner)), SymbolChange::None);
    assert_eq!(changes.get_change(&method(&world.gen1.run)), SymbolChange::None);
    assert_eq!(
        changes.get_change(&SymbolRef::Field(world.gen1.count_backing.clone())),
        SymbolChange::None
    );
    // Members without a row are new.
    let baz = method(world.gen1.baz.as_ref().unwrap());
    assert_eq!(changes.get_change(&baz), SymbolChange::Added);
    assert!(changes.is_added(&baz));
    let state_machine = world.gen1.bar_state_machine.as_ref().unwrap();
    assert_eq!(changes.get_change(&method(&state_machine.move_next)), SymbolChange::Added);
}

#[test]
fn test_nothing_changes_without_edits() {
    let world = world();
    let changes = changes(&world, &[]);

    assert!(changes.changes().is_empty());
    assert_eq!(changes.get_change(&ty(&world.gen1.widget)), SymbolChange::None);
    assert_eq!(
        changes.get_change(&method(world.gen1.baz.as_ref().unwrap())),
        SymbolChange::None
    );
    assert!(changes.get_top_level_types(&[]).is_empty());
}

#[test]
fn test_accessor_update_updates_its_property() {
    let world = world();
    let changes = changes(&world, &[update(&world.gen0.get_count, &world.gen1.get_count)]);
    let count = SymbolRef::Property(world.gen1.count.clone());

    let recorded: Vec<(SymbolRef, SymbolChange)> = changes
        .changes()
        .iter()
        .map(|(symbol, change)| (symbol.clone(), *change))
        .collect();
    assert_eq!(
        recorded,
        vec![
            (count.clone(), SymbolChange::Updated),
            (ty(&world.gen1.widget), SymbolChange::ContainsChanges),
            (method(&world.gen1.get_count), SymbolChange::Updated),
        ]
    );
    assert_eq!(change_relevant_container(&method(&world.gen1.get_count)), Some(count));
    // The backing field already has a row.
    assert_eq!(
        changes.get_change(&SymbolRef::Field(world.gen1.count_backing.clone())),
        SymbolChange::None
    );
}

#[test]
fn test_change_relevant_containers() {
    let world = world();
    let backing = SymbolRef::Field(world.gen1.count_backing.clone());

    assert_eq!(
        change_relevant_container(&backing),
        Some(SymbolRef::Property(world.gen1.count.clone()))
    );
    assert_eq!(
        change_relevant_container(&method(&world.gen1.run)),
        Some(ty(&world.gen1.inner))
    );
    assert_eq!(
        change_relevant_container(&ty(&world.gen1.inner)),
        Some(ty(&world.gen1.widget))
    );
    assert_eq!(change_relevant_container(&ty(&world.gen1.widget)), None);
}

#[test]
fn test_insert_adds_member() {
    let world = world();
    let baz = method(world.gen1.baz.as_ref().unwrap());
    let changes = changes(&world, &[SemanticEdit::insert(baz.clone())]);

    assert_eq!(changes.get_change(&baz), SymbolChange::Added);
    assert_eq!(changes.get_change(&ty(&world.gen1.widget)), SymbolChange::ContainsChanges);
    assert_eq!(changes.get_change(&method(&world.gen1.foo)), SymbolChange::None);
}

#[test]
fn test_delete_edits_are_ignored() {
    let world = world();
    let changes = changes(&world, &[SemanticEdit::delete(method(&world.gen0.bar))]);
    assert!(changes.changes().is_empty());
}

#[test]
fn test_state_machine_of_updated_iterator_is_added() {
    let world = world();
    let changes = changes(&world, &[update(&world.gen0.bar, &world.gen1.bar)]);
    let state_machine = world.gen1.bar_state_machine.as_ref().unwrap();

    assert_eq!(changes.get_change(&method(&world.gen1.bar)), SymbolChange::Updated);
    assert_eq!(
        changes.get_change_for_definition(&ty(&state_machine.ty)),
        SymbolChange::Added
    );
    assert_eq!(
        changes.get_change_for_definition(&method(&state_machine.move_next)),
        SymbolChange::Added
    );
    // `<>4__this` does not depend on the body of `Bar`.
    assert_eq!(
        changes.get_change_for_definition(&SymbolRef::Field(state_machine.this_field.clone())),
        SymbolChange::None
    );
}

#[test]
fn test_existing_state_machine_of_updated_method() {
    let world = world();
    let changes = changes(&world, &[update(&world.gen0.stream, &world.gen1.stream)]);
    let state_machine = ty(&world.gen1.stream_state_machine);

    assert_eq!(
        changes.get_change_for_definition(&state_machine),
        SymbolChange::ContainsChanges
    );
    let fields = world.gen1.stream_state_machine.members_named("<total>5__1");
    assert_eq!(fields.len(), 1);
    assert_eq!(changes.get_change_for_definition(&fields[0]), SymbolChange::Updated);
}

#[test]
fn test_synthesized_definitions_of_unchanged_generator() {
    let world = world();
    let changes = changes(&world, &[update(&world.gen0.foo, &world.gen1.foo)]);

    assert_eq!(
        changes.get_change_for_definition(&ty(&world.gen1.stream_state_machine)),
        SymbolChange::None
    );
    // Ordinary definitions take the plain verdict.
    assert_eq!(
        changes.get_change_for_definition(&method(&world.gen1.foo)),
        SymbolChange::Updated
    );
}

#[test]
fn test_top_level_types_start_with_anonymous_types() {
    let world = world();
    let changes = changes(
        &world,
        &[
            update(&world.gen0.run, &world.gen1.run),
            update(&world.gen0.foo, &world.gen1.foo),
        ],
    );

    assert_eq!(changes.get_change(&ty(&world.gen1.inner)), SymbolChange::ContainsChanges);
    let types = changes.get_top_level_types(&[world.gen1.awaiter.clone()]);
    assert_eq!(types, vec![world.gen1.awaiter.clone(), world.gen1.widget.clone()]);

    let deduplicated = changes.get_top_level_types(&[world.gen1.widget.clone()]);
    assert_eq!(deduplicated, vec![world.gen1.widget.clone()]);
}

// =============================================================================
// Invalid edits
// =============================================================================

fn try_changes(world: &World, edits: &[SemanticEdit]) -> Result<SymbolChanges, EncError> {
    SymbolChanges::new(definition_map(world, edits), edits, world.gen1.compilation)
}

#[test]
fn test_edit_without_new_symbol_is_rejected() {
    let world = world();
    let edit = SemanticEdit {
        new_symbol: None,
        ..SemanticEdit::insert(method(&world.gen1.foo))
    };

    let error = try_changes(&world, &[edit]).err();
    assert_eq!(
        error,
        Some(EncError::MissingNewSymbol {
            kind: SemanticEditKind::Insert
        })
    );
}

#[test]
fn test_update_without_old_symbol_is_rejected() {
    let world = world();
    let edit = SemanticEdit {
        old_symbol: None,
        ..update(&world.gen0.foo, &world.gen1.foo)
    };

    let error = try_changes(&world, &[edit]).err();
    assert!(matches!(error, Some(EncError::UpdateWithoutOldSymbol { .. })));
}

#[test]
fn test_symbol_of_other_compilation_is_rejected() {
    let world = world();
    let edit = update(&world.gen0.foo, &world.gen0.foo);

    let error = try_changes(&world, &[edit]).err();
    assert_eq!(
        error,
        Some(EncError::SymbolNotInCompilation {
            symbol: method(&world.gen0.foo).to_string(),
            compilation: world.gen1.compilation,
        })
    );
}

#[test]
fn test_duplicate_edit_is_rejected() {
    let world = world();
    let edits = [
        update(&world.gen0.foo, &world.gen1.foo),
        SemanticEdit::insert(method(&world.gen1.foo)),
    ];

    let error = try_changes(&world, &edits).err();
    assert!(matches!(error, Some(EncError::DuplicateEdit { .. })));
}

// =============================================================================
// Partial methods and generators
// =============================================================================

/// A definition map for a program no generation has emitted yet.
struct Unemitted;

impl DefinitionMap for Unemitted {
    fn method_entry(&self, _: &MethodRef) -> Option<&MethodDefinitionEntry> {
        None
    }

    fn try_get_type_handle(&self, _: &NamedTypeRef) -> Option<TypeDefinitionHandle> {
        None
    }

    fn try_get_event_handle(&self, _: &EventRef) -> Option<EventDefinitionHandle> {
        None
    }

    fn try_get_field_handle(&self, _: &FieldRef) -> Option<FieldDefinitionHandle> {
        None
    }

    fn try_get_method_handle(&self, _: &MethodRef) -> Option<MethodDefinitionHandle> {
        None
    }

    fn try_get_property_handle(&self, _: &PropertyRef) -> Option<PropertyDefinitionHandle> {
        None
    }

    fn try_create_variable_slot_allocator(
        &self,
        _: &MethodRef,
    ) -> Option<EncVariableSlotAllocator> {
        None
    }
}

struct PartialProgram {
    /// Owns the symbols below.
    _assembly: AssemblyRef,
    compilation: CompilationId,
    definition: MethodRef,
    implementation: MethodRef,
    generator: MethodRef,
    closure: NamedTypeRef,
}

/// `partial void Log()` split in two parts, and `Run(int n)` with a
/// closure class generated from its body.
fn partial_program() -> PartialProgram {
    let corlib = corlib();
    let compilation = CompilationId::fresh();
    let int32 = special(&corlib, SpecialType::Int32);
    let void = special(&corlib, SpecialType::Void);
    let mut builder = AssemblyBuilder::new(identity("Partial", 1))
        .source(compilation)
        .reference(&corlib);
    let service = builder.add_type(TypeDef::class("App", "Service"));
    let definition = builder.add_method(&service, MethodDef::new("Log", void.clone()));
    let implementation = builder.add_method(&service, MethodDef::new("Log", void.clone()));
    builder.link_partial_parts(&definition, &implementation);
    let generator = builder.add_method(
        &service,
        MethodDef::new("Run", void).param(ParamDef::new("n", int32)),
    );
    let closure = builder.add_nested_type(
        &service,
        TypeDef::class("", "<>c__DisplayClass2_0").synthesized_for(&generator, true),
    );
    PartialProgram {
        _assembly: builder.build(),
        compilation,
        definition,
        implementation,
        generator,
        closure,
    }
}

#[test]
fn test_partial_implementation_edit_lands_on_definition() {
    let program = partial_program();
    let edits = [SemanticEdit::update(
        method(&program.implementation),
        method(&program.implementation),
    )];

    let changes = SymbolChanges::new(Arc::new(Unemitted), &edits, program.compilation).unwrap();

    let recorded = changes.changes().get(&method(&program.definition));
    assert_eq!(recorded, Some(&SymbolChange::Updated));
    assert!(changes.changes().get(&method(&program.implementation)).is_none());
}

#[test]
fn test_editing_both_partial_parts_is_a_duplicate() {
    let program = partial_program();
    let edits = [
        SemanticEdit::update(method(&program.definition), method(&program.definition)),
        SemanticEdit::update(method(&program.implementation), method(&program.implementation)),
    ];

    let result = SymbolChanges::new(Arc::new(Unemitted), &edits, program.compilation);
    assert!(matches!(result, Err(EncError::DuplicateEdit { .. })));
}

#[test]
fn test_generator_of_new_type_adds_its_definitions() {
    let program = partial_program();
    let edits = [SemanticEdit::update(
        method(&program.generator),
        method(&program.generator),
    )];

    let changes = SymbolChanges::new(Arc::new(Unemitted), &edits, program.compilation).unwrap();

    // The generator's type has no row, so nothing it generated can exist.
    assert_eq!(
        changes.get_change_for_definition(&ty(&program.closure)),
        SymbolChange::Added
    );
}

#[test]
#[should_panic(expected = "cannot be classified as containing changes")]
fn test_generator_containing_changes_panics() {
    let program = partial_program();
    let parameter = SymbolRef::Parameter(program.generator.parameters()[0].clone());
    let edits = [SemanticEdit::update(parameter.clone(), parameter)];

    let changes = SymbolChanges::new(Arc::new(Unemitted), &edits, program.compilation).unwrap();
    assert_eq!(
        changes.get_change(&method(&program.generator)),
        SymbolChange::ContainsChanges
    );
    let _ = changes.get_change_for_definition(&ty(&program.closure));
}
