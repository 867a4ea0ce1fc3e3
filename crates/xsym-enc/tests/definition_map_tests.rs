use super::*;
use crate::baseline::{AddedOrChangedMethodInfo, GenerationDelta, PeModule};
use crate::fixtures::{FOO_SHIFT, FOO_START, World, special, world};
use crate::local_info::{
    LocalDebugId, LocalSlotConstraints, LocalSlotDebugInfo, SynthesizedLocalKind,
};
use crate::symbol_matcher::CompilationSymbolMatcher;
use xsym_symbols::{MethodSymbol, SpecialType, TypeSymbol};

const FOO_ROW: MethodDefinitionHandle = MethodDefinitionHandle(2);
const STREAM_ROW: MethodDefinitionHandle = MethodDefinitionHandle(7);

fn slot(kind: SynthesizedLocalKind, offset: i32) -> LocalSlotDebugInfo {
    LocalSlotDebugInfo::new(kind, LocalDebugId::new(offset, 0))
}

fn user(offset: i32) -> LocalSlotDebugInfo {
    slot(SynthesizedLocalKind::UserDefined, offset)
}

fn int32(world: &World) -> TypeSymbol {
    special(&world.corlib, SpecialType::Int32)
}

fn string(world: &World) -> TypeSymbol {
    special(&world.corlib, SpecialType::String)
}

fn metadata_local(ty: TypeSymbol, signature: u8) -> LocalSlotMetadata {
    LocalSlotMetadata {
        ty,
        constraints: LocalSlotConstraints::empty(),
        signature: Arc::from([signature]),
    }
}

/// Generation 0 with debug info for `Foo` (plain locals) and `Stream`
/// (state machine).
fn gen0_module(world: &World) -> PeModule {
    PeModule::new(world.gen0.assembly.clone())
        .with_method_debug_info(
            FOO_ROW,
            EditAndContinueMethodDebugInformation {
                method_ordinal: 1,
                local_slots: vec![
                    user(20),
                    slot(SynthesizedLocalKind::LoweringTemp, 30),
                    user(40),
                ],
                ..EditAndContinueMethodDebugInformation::default()
            },
        )
        .with_locals(
            FOO_ROW,
            vec![
                metadata_local(int32(world), 0x08),
                metadata_local(int32(world), 0x08),
                metadata_local(string(world), 0x0e),
            ],
        )
        .with_method_debug_info(
            STREAM_ROW,
            EditAndContinueMethodDebugInformation {
                method_ordinal: 5,
                state_machine_type_name: Some("<Stream>d__5".into()),
                state_machine_hoisted_local_slots: vec![
                    user(10),
                    slot(SynthesizedLocalKind::ForEachArray, 30),
                ],
                ..EditAndContinueMethodDebugInformation::default()
            },
        )
}

fn foo_syntax_map() -> SyntaxMap {
    Arc::new(|position: u32| (position >= FOO_START + FOO_SHIFT).then(|| position - FOO_SHIFT))
}

fn edits(world: &World) -> Vec<SemanticEdit> {
    let method = |m: &MethodRef| SymbolRef::Method(m.clone());
    vec![
        SemanticEdit::update_preserving_locals(
            method(&world.gen0.foo),
            method(&world.gen1.foo),
            foo_syntax_map(),
        ),
        SemanticEdit::update(method(&world.gen0.sibling), method(&world.gen1.sibling)),
        SemanticEdit::update_preserving_locals(
            method(&world.gen0.stream),
            method(&world.gen1.stream),
            Arc::new(|position: u32| Some(position)),
        ),
        SemanticEdit::insert(method(world.gen1.baz.as_ref().unwrap())),
        SemanticEdit::update(
            SymbolRef::Property(world.gen0.count.clone()),
            SymbolRef::Property(world.gen1.count.clone()),
        ),
        SemanticEdit::delete(method(&world.gen0.bar)),
    ]
}

fn definition_map(world: &World, baseline: EmitBaseline) -> SymbolDefinitionMap {
    let to_metadata =
        CompilationSymbolMatcher::new(world.gen1.assembly.clone(), world.gen0.assembly.clone());
    SymbolDefinitionMap::new(&edits(world), to_metadata.into_shared(), None, Arc::new(baseline))
}

fn initial(world: &World) -> EmitBaseline {
    EmitBaseline::initial(Arc::new(gen0_module(world)))
}

#[test]
fn test_method_map_holds_only_method_updates() {
    let world = world();
    let map = generate_method_map(&edits(&world));

    assert_eq!(map.len(), 3);
    let foo = &map[&world.gen1.foo];
    assert!(Arc::ptr_eq(&foo.previous_method, &world.gen0.foo));
    assert!(foo.preserve_local_variables);
    assert!(foo.syntax_map.is_some());

    let sibling = &map[&world.gen1.sibling];
    assert!(!sibling.preserve_local_variables);
    assert!(sibling.syntax_map.is_none());

    assert!(map.contains_key(&world.gen1.stream));
    assert!(!map.contains_key(world.gen1.baz.as_ref().unwrap()));
    assert!(!map.contains_key(&world.gen0.bar));
}

#[test]
fn test_local_info_of_emitted_locals() {
    let world = world();
    let typed = |slot_info: LocalSlotDebugInfo, ty: Option<TypeSymbol>| LocalDefinition {
        slot: 0,
        name: None,
        ty,
        slot_info,
        constraints: LocalSlotConstraints::empty(),
        signature: Arc::from([0x08_u8]),
    };
    let locals = [
        typed(user(20), Some(int32(&world))),
        typed(LocalSlotDebugInfo::default(), Some(int32(&world))),
        typed(user(40), None),
    ];

    let info = get_local_info(&locals);

    assert_eq!(info.len(), 3);
    assert_eq!(info[0].slot_info(), user(20));
    assert_eq!(info[0].ty(), Some(&int32(&world)));
    assert_eq!(info[0].signature().map(|s| &s[..]), Some(&[0x08_u8][..]));
    assert!(info[1].is_unused());
    assert!(info[2].is_unused());
    assert_eq!(info[2].signature().map(|s| &s[..]), Some(&[0x08_u8][..]));
}

#[test]
fn test_local_slot_map_keeps_only_long_lived_described_slots() {
    let world = world();
    let module = gen0_module(&world);
    let debug_info = module.method_debug_info(FOO_ROW).unwrap();
    let mut locals = module.locals(FOO_ROW).to_vec();
    locals.push(metadata_local(int32(&world), 0x09));

    let slots = create_local_slot_map(debug_info, &locals);

    assert_eq!(slots.len(), 4);
    assert_eq!(slots[0].slot_info(), user(20));
    assert!(slots[1].is_unused(), "short-lived temporaries are not matched");
    assert_eq!(slots[2].ty(), Some(&string(&world)));
    assert!(slots[3].is_unused(), "slots without debug info are not matched");
    assert_eq!(slots[3].signature().map(|s| &s[..]), Some(&[0x09_u8][..]));
}

#[test]
fn test_handles_resolve_through_generation_zero() {
    let world = world();
    let map = definition_map(&world, initial(&world));

    assert_eq!(map.try_get_method_handle(&world.gen1.foo), Some(FOO_ROW));
    assert_eq!(
        map.try_get_method_handle(&world.gen1.foo_text),
        Some(MethodDefinitionHandle(3))
    );
    assert_eq!(
        map.try_get_type_handle(&world.gen1.widget),
        Some(TypeDefinitionHandle(1))
    );
    assert_eq!(
        map.try_get_type_handle(&world.gen1.inner),
        Some(TypeDefinitionHandle(2))
    );
    assert_eq!(
        map.try_get_property_handle(&world.gen1.count),
        Some(PropertyDefinitionHandle(1))
    );
    assert_eq!(
        map.try_get_field_handle(&world.gen1.count_backing),
        Some(FieldDefinitionHandle(1))
    );
    assert_eq!(map.try_get_method_handle(world.gen1.baz.as_ref().unwrap()), None);
}

#[test]
fn test_definition_exists() {
    let world = world();
    let map = definition_map(&world, initial(&world));
    let state_machine = world.gen1.bar_state_machine.as_ref().unwrap();

    assert!(map.definition_exists(&SymbolRef::Assembly(world.gen1.assembly.clone())));
    assert!(map.definition_exists(&SymbolRef::NamedType(world.gen1.widget.clone())));
    assert!(map.definition_exists(&SymbolRef::Parameter(world.gen1.foo.parameters()[0].clone())));
    assert!(!map.definition_exists(&SymbolRef::NamedType(state_machine.ty.clone())));
    assert!(!map.definition_exists(&SymbolRef::Method(state_machine.move_next.clone())));
    assert!(!map.definition_exists(&SymbolRef::Field(state_machine.this_field.clone())));
}

#[test]
fn test_rows_added_by_later_generations_are_found() {
    let world = world();
    let baz = world.gen1.baz.clone().unwrap();
    let state_machine = world.gen1.bar_state_machine.as_ref().unwrap();
    let baseline = initial(&world).next_generation(
        world.gen1.compilation,
        GenerationDelta {
            types_added: vec![state_machine.ty.clone()],
            methods_added: vec![baz.clone()],
            ..GenerationDelta::default()
        },
    );
    let map = definition_map(&world, baseline);

    assert_eq!(map.try_get_method_handle(&baz), Some(MethodDefinitionHandle(8)));
    assert_eq!(
        map.try_get_type_handle(&state_machine.ty),
        Some(TypeDefinitionHandle(5))
    );
    assert!(map.definition_exists(&SymbolRef::NamedType(state_machine.ty.clone())));
}

#[test]
fn test_slot_allocator_from_generation_zero_locals() {
    let world = world();
    let map = definition_map(&world, initial(&world));

    let allocator = map.try_create_variable_slot_allocator(&world.gen1.foo).unwrap();
    assert_eq!(allocator.previous_locals().len(), 3);
    assert!(allocator.previous_locals()[1].is_unused());

    let reused = allocator.get_previous_local(
        &string(&world),
        Some("s"),
        FOO_START + FOO_SHIFT + 40,
        SynthesizedLocalKind::UserDefined,
        LocalDebugId::new(40, 0),
        LocalSlotConstraints::empty(),
    );
    assert_eq!(reused.map(|local| local.slot), Some(2));
}

#[test]
fn test_no_slot_allocator_without_preserved_locals() {
    let world = world();
    let map = definition_map(&world, initial(&world));

    assert!(map.try_create_variable_slot_allocator(&world.gen1.sibling).is_none());
    assert!(map.try_create_variable_slot_allocator(&world.gen1.bar).is_none());
    assert!(
        map.try_create_variable_slot_allocator(world.gen1.baz.as_ref().unwrap())
            .is_none()
    );
}

#[test]
fn test_slot_allocator_reads_state_machine_fields() {
    let world = world();
    let map = definition_map(&world, initial(&world));

    let allocator = map.try_create_variable_slot_allocator(&world.gen1.stream).unwrap();
    assert_eq!(allocator.previous_state_machine_type_name(), Some("<Stream>d__5"));
    assert_eq!(allocator.hoisted_local_slot_count(), 2);
    assert_eq!(allocator.awaiter_slot_count(), 1);
    assert!(allocator.previous_locals().is_empty());

    let total = allocator.get_previous_hoisted_local(
        510,
        &int32(&world),
        SynthesizedLocalKind::UserDefined,
        LocalDebugId::new(10, 0),
        Some("total"),
    );
    assert_eq!(total.as_deref(), Some("<total>5__1"));

    let array = allocator.get_previous_hoisted_local(
        530,
        &string(&world),
        SynthesizedLocalKind::ForEachArray,
        LocalDebugId::new(30, 0),
        None,
    );
    assert_eq!(array.as_deref(), Some("<>s__2"));

    let awaiter = allocator.get_previous_awaiter(&TypeSymbol::named(&world.gen1.awaiter));
    assert_eq!(awaiter.as_deref(), Some("<>u__1"));
}

#[test]
fn test_slot_allocator_prefers_later_generation_slots() {
    let world = world();
    let baseline = initial(&world).next_generation(
        world.gen1.compilation,
        GenerationDelta {
            changed_methods: vec![(
                FOO_ROW,
                AddedOrChangedMethodInfo {
                    method_ordinal: 1,
                    locals: vec![EncLocalInfo::new(
                        user(20),
                        string(&world),
                        LocalSlotConstraints::empty(),
                        Some(Arc::from([0x0e_u8])),
                    )]
                    .into(),
                    ..AddedOrChangedMethodInfo::default()
                },
            )],
            ..GenerationDelta::default()
        },
    );
    let map = definition_map(&world, baseline);

    let allocator = map.try_create_variable_slot_allocator(&world.gen1.foo).unwrap();
    assert_eq!(allocator.previous_locals().len(), 1);
    assert_eq!(allocator.previous_locals()[0].ty(), Some(&string(&world)));
}
