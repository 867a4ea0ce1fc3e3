use super::*;
use crate::baseline::{AddedOrChangedMethodInfo, GenerationDelta, PeModule};
use crate::fixtures::{World, generation, identity, special, world};
use crate::local_info::{
    EncLocalInfo, LocalDebugId, LocalSlotConstraints, LocalSlotDebugInfo, SynthesizedLocalKind,
};
use rayon::prelude::*;
use xsym_symbols::{AssemblyBuilder, MethodDefinitionHandle, SpecialType, TableIndex, TypeDef};

fn gen1_to_gen0(world: &World) -> CompilationSymbolMatcher {
    CompilationSymbolMatcher::new(world.gen1.assembly.clone(), world.gen0.assembly.clone())
}

fn gen0_to_gen1(world: &World) -> CompilationSymbolMatcher {
    CompilationSymbolMatcher::new(world.gen0.assembly.clone(), world.gen1.assembly.clone())
}

fn ty(ty: &NamedTypeRef) -> SymbolRef {
    SymbolRef::NamedType(ty.clone())
}

fn method(method: &MethodRef) -> SymbolRef {
    SymbolRef::Method(method.clone())
}

#[test]
fn test_types_match_by_name_and_nesting() {
    let world = world();
    let matcher = gen1_to_gen0(&world);

    assert_eq!(matcher.map_definition(&ty(&world.gen1.widget)), Some(ty(&world.gen0.widget)));
    assert_eq!(matcher.map_definition(&ty(&world.gen1.inner)), Some(ty(&world.gen0.inner)));
    assert_eq!(matcher.map_definition(&ty(&world.gen1.awaiter)), Some(ty(&world.gen0.awaiter)));
    assert_eq!(
        matcher.map_definition(&ty(&world.gen1.stream_state_machine)),
        Some(ty(&world.gen0.stream_state_machine))
    );
    assert_eq!(
        matcher.map_definition(&SymbolRef::Assembly(world.gen1.assembly.clone())),
        Some(SymbolRef::Assembly(world.gen0.assembly.clone()))
    );
}

#[test]
fn test_overloads_match_by_signature() {
    let world = world();
    let matcher = gen1_to_gen0(&world);

    assert_eq!(matcher.map_definition(&method(&world.gen1.foo)), Some(method(&world.gen0.foo)));
    assert_eq!(
        matcher.map_definition(&method(&world.gen1.foo_text)),
        Some(method(&world.gen0.foo_text))
    );
    assert_eq!(matcher.map_definition(&method(&world.gen1.run)), Some(method(&world.gen0.run)));
}

#[test]
fn test_members_and_parameters_match() {
    let world = world();
    let matcher = gen1_to_gen0(&world);

    assert_eq!(
        matcher.map_definition(&SymbolRef::Property(world.gen1.count.clone())),
        Some(SymbolRef::Property(world.gen0.count.clone()))
    );
    assert_eq!(
        matcher.map_definition(&SymbolRef::Field(world.gen1.count_backing.clone())),
        Some(SymbolRef::Field(world.gen0.count_backing.clone()))
    );

    let parameter = SymbolRef::Parameter(world.gen1.foo_text.parameters()[0].clone());
    let expected = SymbolRef::Parameter(world.gen0.foo_text.parameters()[0].clone());
    assert_eq!(matcher.map_definition(&parameter), Some(expected));
}

#[test]
fn test_definitions_missing_from_target_do_not_map() {
    let world = world();
    let matcher = gen1_to_gen0(&world);
    let state_machine = world.gen1.bar_state_machine.as_ref().unwrap();

    assert_eq!(matcher.map_definition(&method(world.gen1.baz.as_ref().unwrap())), None);
    assert_eq!(matcher.map_definition(&ty(&state_machine.ty)), None);
    assert_eq!(matcher.map_definition(&method(&state_machine.move_next)), None);
    assert_eq!(
        matcher.map_definition(&SymbolRef::Field(state_machine.this_field.clone())),
        None
    );
    // A miss is cached and stays a miss.
    assert_eq!(matcher.map_definition(&ty(&state_machine.ty)), None);
}

#[test]
fn test_symbols_of_other_assemblies_map_to_themselves() {
    let world = world();
    let matcher = gen1_to_gen0(&world);
    let int32 = special(&world.corlib, SpecialType::Int32);

    assert_eq!(matcher.map_reference(&int32), Some(int32.clone()));
    let corlib = SymbolRef::Assembly(world.corlib.clone());
    assert_eq!(matcher.map_definition(&corlib), Some(corlib));
}

#[test]
fn test_type_references_map_structurally() {
    let world = world();
    let matcher = gen1_to_gen0(&world);

    let widget = TypeSymbol::named(&world.gen1.widget);
    assert_eq!(matcher.map_reference(&widget), Some(TypeSymbol::named(&world.gen0.widget)));

    let array = TypeSymbol::Array(Arc::new(ArrayType {
        element: widget,
        rank: 1,
        element_custom_modifiers: Arc::from([]),
    }));
    let Some(TypeSymbol::Array(mapped)) = matcher.map_reference(&array) else {
        panic!("array of a mapped type should map to an array");
    };
    assert_eq!(mapped.element, TypeSymbol::named(&world.gen0.widget));
    assert_eq!(mapped.rank, 1);

    let state_machine = world.gen1.bar_state_machine.as_ref().unwrap();
    assert_eq!(matcher.map_reference(&TypeSymbol::named(&state_machine.ty)), None);
}

#[test]
fn test_concurrent_lookups_agree() {
    let world = world();
    let matcher = gen1_to_gen0(&world);
    let mut symbols = vec![
        ty(&world.gen1.widget),
        ty(&world.gen1.inner),
        method(&world.gen1.foo),
        method(&world.gen1.foo_text),
        method(&world.gen1.sibling),
        method(world.gen1.baz.as_ref().unwrap()),
        SymbolRef::Property(world.gen1.count.clone()),
        SymbolRef::Field(world.gen1.count_backing.clone()),
    ];
    let expected: Vec<Option<SymbolRef>> = {
        let fresh = gen1_to_gen0(&world);
        symbols.iter().map(|symbol| fresh.map_definition(symbol)).collect()
    };
    let count = symbols.len();
    symbols = symbols.into_iter().cycle().take(count * 64).collect();

    let results: Vec<Option<SymbolRef>> = symbols
        .par_iter()
        .map(|symbol| matcher.map_definition(symbol))
        .collect();

    for (index, result) in results.iter().enumerate() {
        assert_eq!(result, &expected[index % count]);
    }
}

#[test]
fn test_anonymous_types_match_by_key() {
    let key = AnonymousTypeKey::new(["Name", "Age"]);
    let build = |type_name: &str| {
        let mut builder =
            AssemblyBuilder::new(identity("Anon", 1)).source(CompilationId::fresh());
        let ty = builder.add_type(TypeDef::class("", type_name).anonymous(key.clone()));
        let assembly: AssemblyRef = builder.build();
        (assembly, ty)
    };
    let (current, current_type) = build("<>f__AnonymousType0");
    let (previous, previous_type) = build("<>f__AnonymousType3");
    let baseline = EmitBaseline::initial(Arc::new(PeModule::new(previous.clone())))
        .next_generation(
            CompilationId::fresh(),
            GenerationDelta {
                anonymous_types: vec![(
                    key.clone(),
                    AnonymousTypeValue {
                        name: "<>f__AnonymousType3".into(),
                        unique_index: 3,
                        ty: previous_type.clone(),
                    },
                )],
                ..GenerationDelta::default()
            },
        );

    let by_name = CompilationSymbolMatcher::new(current.clone(), previous.clone());
    assert_eq!(by_name.map_definition(&ty(&current_type)), None);

    let by_key =
        CompilationSymbolMatcher::new(current, previous).with_previous_generation(&baseline);
    assert_eq!(by_key.map_definition(&ty(&current_type)), Some(ty(&previous_type)));
}

// =============================================================================
// Synthesized members
// =============================================================================

#[test]
fn test_merge_with_no_previous_members_takes_new() {
    let world = world();
    let mut new = SynthesizedMembers::new();
    new.insert(world.gen1.widget.clone(), vec![method(&world.gen1.foo)]);

    let none = SynthesizedMembers::new();
    let merged = merge_synthesized_members(&gen0_to_gen1(&world), &none, &new);
    assert_eq!(merged, new);
}

#[test]
fn test_merge_keeps_members_missing_from_new_list() {
    let world = world();
    let mut previous = SynthesizedMembers::new();
    previous.insert(
        world.gen0.widget.clone(),
        vec![
            method(&world.gen0.foo),
            method(&world.gen0.sibling),
            method(&world.gen0.foo_text),
        ],
    );
    let mut new = SynthesizedMembers::new();
    new.insert(
        world.gen1.widget.clone(),
        vec![
            method(&world.gen1.foo),
            method(&world.gen1.sibling),
            method(world.gen1.baz.as_ref().unwrap()),
        ],
    );

    let merged = merge_synthesized_members(&gen0_to_gen1(&world), &previous, &new);

    assert_eq!(merged.len(), 1);
    assert_eq!(
        merged[&world.gen1.widget],
        vec![
            method(&world.gen1.foo),
            method(&world.gen1.sibling),
            method(world.gen1.baz.as_ref().unwrap()),
            method(&world.gen1.foo_text),
        ]
    );
}

#[test]
fn test_merge_carries_unmapped_containers_and_members() {
    let world = world();
    let state_machine = world.gen1.bar_state_machine.as_ref().unwrap();
    let this_field = SymbolRef::Field(state_machine.this_field.clone());
    let mut previous = SynthesizedMembers::new();
    previous.insert(state_machine.ty.clone(), vec![this_field.clone()]);
    previous.insert(world.gen1.widget.clone(), vec![ty(&state_machine.ty)]);
    let mut new = SynthesizedMembers::new();
    new.insert(world.gen0.widget.clone(), vec![method(&world.gen0.foo)]);

    let merged = merge_synthesized_members(&gen1_to_gen0(&world), &previous, &new);

    assert_eq!(merged[&state_machine.ty], vec![this_field]);
    assert_eq!(
        merged[&world.gen0.widget],
        vec![method(&world.gen0.foo), ty(&state_machine.ty)]
    );
}

#[test]
fn test_merge_moves_members_of_quiet_containers() {
    let world = world();
    let mut previous = SynthesizedMembers::new();
    previous.insert(world.gen0.widget.clone(), vec![method(&world.gen0.sibling)]);

    let none = SynthesizedMembers::new();
    let merged = merge_synthesized_members(&gen0_to_gen1(&world), &previous, &none);

    assert_eq!(merged.len(), 1);
    assert_eq!(merged[&world.gen1.widget], vec![method(&world.gen0.sibling)]);
}

// =============================================================================
// Baseline mapping
// =============================================================================

fn gen1_baseline(world: &World) -> EmitBaseline {
    let state_machine = world.gen1.bar_state_machine.as_ref().unwrap();
    let mut synthesized = SynthesizedMembers::new();
    synthesized.insert(world.gen1.widget.clone(), vec![ty(&state_machine.ty)]);
    let local = EncLocalInfo::new(
        LocalSlotDebugInfo::new(SynthesizedLocalKind::UserDefined, LocalDebugId::new(20, 0)),
        TypeSymbol::named(&world.gen1.awaiter),
        LocalSlotConstraints::empty(),
        None,
    );
    EmitBaseline::initial(Arc::new(PeModule::new(world.gen0.assembly.clone()))).next_generation(
        world.gen1.compilation,
        GenerationDelta {
            types_added: vec![state_machine.ty.clone()],
            methods_added: vec![state_machine.move_next.clone(), world.gen1.baz.clone().unwrap()],
            fields_added: vec![state_machine.this_field.clone()],
            changed_methods: vec![(
                MethodDefinitionHandle(2),
                AddedOrChangedMethodInfo {
                    method_ordinal: 1,
                    locals: vec![local].into(),
                    ..AddedOrChangedMethodInfo::default()
                },
            )],
            synthesized_members: synthesized,
            ..GenerationDelta::default()
        },
    )
}

#[test]
fn test_baseline_follows_the_recompiled_generation() {
    let world = world();
    let gen2 = generation(&world.corlib, true);
    let baseline = gen1_baseline(&world);
    let matcher =
        CompilationSymbolMatcher::new(world.gen1.assembly.clone(), gen2.assembly.clone());

    let mapped = matcher.map_baseline_to_compilation(
        &baseline,
        gen2.compilation,
        &SynthesizedMembers::new(),
    );

    let state_machine = gen2.bar_state_machine.as_ref().unwrap();
    assert_eq!(mapped.compilation(), Some(gen2.compilation));
    assert_eq!(mapped.ordinal(), 1);
    assert_eq!(mapped.type_defs_added().get(&state_machine.ty), Some(&5));
    assert_eq!(mapped.method_defs_added().get(&state_machine.move_next), Some(&8));
    assert_eq!(mapped.method_defs_added().get(gen2.baz.as_ref().unwrap()), Some(&9));
    assert_eq!(mapped.field_defs_added().get(&state_machine.this_field), Some(&6));
    // Members the new compilation did not list stay as they were recorded.
    let recorded = ty(&world.gen1.bar_state_machine.as_ref().unwrap().ty);
    assert_eq!(mapped.synthesized_members()[&gen2.widget], vec![recorded]);

    let info = &mapped.added_or_changed_methods()[&MethodDefinitionHandle(2)];
    assert_eq!(info.locals[0].ty(), Some(&TypeSymbol::named(&gen2.awaiter)));
}

#[test]
fn test_baseline_drops_definitions_without_counterpart() {
    let world = world();
    let baseline = gen1_baseline(&world);

    let mapped = gen1_to_gen0(&world).map_baseline_to_compilation(
        &baseline,
        world.gen0.compilation,
        &SynthesizedMembers::new(),
    );

    assert!(mapped.type_defs_added().is_empty());
    assert!(mapped.method_defs_added().is_empty());
    assert!(mapped.field_defs_added().is_empty());
    assert_eq!(mapped.next_row(TableIndex::MethodDef), 10);
    assert_eq!(mapped.next_row(TableIndex::TypeDef), 6);
}

#[test]
#[should_panic(expected = "has no counterpart in compilation")]
fn test_baseline_mapping_requires_anonymous_types() {
    let world = world();
    let state_machine = world.gen1.bar_state_machine.as_ref().unwrap();
    let baseline = EmitBaseline::initial(Arc::new(PeModule::new(world.gen0.assembly.clone())))
        .next_generation(
            world.gen1.compilation,
            GenerationDelta {
                anonymous_types: vec![(
                    AnonymousTypeKey::new(["Value"]),
                    AnonymousTypeValue {
                        name: "<>f__AnonymousType0".into(),
                        unique_index: 0,
                        ty: state_machine.ty.clone(),
                    },
                )],
                ..GenerationDelta::default()
            },
        );

    let _ = gen1_to_gen0(&world).map_baseline_to_compilation(
        &baseline,
        world.gen0.compilation,
        &SynthesizedMembers::new(),
    );
}
