use super::*;

#[test]
fn test_format_message_substitutes_positional_args() {
    let text = format_message("'{0}' lives in '{1}', not '{0}'", &["Foo", "LibV2"]);
    assert_eq!(text, "'Foo' lives in 'LibV2', not 'Foo'");
}

#[test]
fn test_diagnostic_from_message() {
    let diag = Diagnostic::from_message(
        &diagnostic_messages::TYPE_DEFINED_IN_UNREFERENCED_ASSEMBLY,
        &["N.Foo", "LibV3"],
    );
    assert!(diag.is_error());
    assert_eq!(
        diag.code,
        diagnostic_codes::TYPE_DEFINED_IN_UNREFERENCED_ASSEMBLY
    );
    assert!(diag.message_text.contains("'N.Foo'"));
    assert!(diag.message_text.contains("'LibV3'"));
    assert_eq!(diag.to_string(), format!("XS0012: {}", diag.message_text));
}

#[test]
fn test_message_template_lookup() {
    assert!(get_message_template(diagnostic_codes::CYCLE_IN_TYPE_FORWARDER).is_some());
    assert_eq!(get_message_template(9999), None);
}
