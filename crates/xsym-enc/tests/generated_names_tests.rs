use super::*;

#[test]
fn test_hoisted_user_local_name() {
    assert_eq!(
        make_hoisted_local_field_name(SynthesizedLocalKind::UserDefined, 0, Some("total")),
        "<total>5__1"
    );
}

#[test]
fn test_hoisted_synthesized_local_names() {
    assert_eq!(
        make_hoisted_local_field_name(SynthesizedLocalKind::ForEachEnumerator, 1, None),
        "<>s__2"
    );
    assert_eq!(
        make_hoisted_local_field_name(SynthesizedLocalKind::LambdaDisplayClass, 2, None),
        "<>8__3"
    );
    // A user local without a name falls back to the synthesized form.
    assert_eq!(
        make_hoisted_local_field_name(SynthesizedLocalKind::UserDefined, 4, None),
        "<>s__5"
    );
}

#[test]
fn test_awaiter_name() {
    assert_eq!(make_awaiter_field_name(0), "<>u__1");
    assert_eq!(make_awaiter_field_name(9), "<>u__10");
}

#[test]
fn test_state_machine_type_name() {
    assert_eq!(make_state_machine_type_name("Stream", 5, 0), "<Stream>d__5");
    assert_eq!(make_state_machine_type_name("Bar", 4, 2), "<Bar>d__4#2");
}

#[test]
fn test_parse_round_trips_generated_names() {
    let name = make_hoisted_local_field_name(SynthesizedLocalKind::UserDefined, 6, Some("x"));
    assert_eq!(
        try_parse_slot_index(&name),
        Some((GeneratedNameKind::HoistedLocalField, 6))
    );
    assert_eq!(
        try_parse_slot_index(&make_awaiter_field_name(2)),
        Some((GeneratedNameKind::AwaiterField, 2))
    );
    assert_eq!(
        try_parse_slot_index("<>u__3#1"),
        Some((GeneratedNameKind::AwaiterField, 2))
    );
}

#[test]
fn test_parse_rejects_other_names() {
    assert_eq!(try_parse_slot_index("total"), None);
    assert_eq!(try_parse_slot_index("<>1__state"), None);
    assert_eq!(try_parse_slot_index("<>4__this"), None);
    assert_eq!(try_parse_slot_index("<x>5__0"), None);
    assert_eq!(try_parse_slot_index("<x>5__"), None);
    assert_eq!(try_parse_slot_index("<x>5_1"), None);
}
