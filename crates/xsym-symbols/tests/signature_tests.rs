use super::*;
use crate::identity::{AssemblyIdentity, Version};
use crate::metadata::{AssemblyBuilder, MethodDef, ParamDef, TypeDef};
use crate::symbol::{AssemblyRef, AssemblySymbol, NamedTypeSymbol};
use crate::types::SpecialType;

fn corlib() -> AssemblyRef {
    AssemblyBuilder::cor_library(
        AssemblyIdentity::new("mscorlib", Version::new(4, 0, 0, 0)),
        &[SpecialType::Void, SpecialType::Int32, SpecialType::String],
    )
    .build()
}

fn special(corlib: &AssemblyRef, special: SpecialType) -> TypeSymbol {
    TypeSymbol::named(&corlib.get_declared_special_type(special).unwrap())
}

#[test]
fn test_find_match_selects_overload_by_parameter_types() {
    let corlib = corlib();
    let int32 = special(&corlib, SpecialType::Int32);
    let string = special(&corlib, SpecialType::String);
    let void = special(&corlib, SpecialType::Void);

    let mut builder = AssemblyBuilder::new(AssemblyIdentity::new("App", Version::default()))
        .reference(&corlib);
    let ty = builder.add_type(TypeDef::class("App", "C"));
    builder.add_method(
        &ty,
        MethodDef::new("M", void.clone()).param(ParamDef::new("x", int32.clone())),
    );
    let by_string = builder.add_method(
        &ty,
        MethodDef::new("M", void.clone()).param(ParamDef::new("x", string.clone())),
    );
    let _assembly = builder.build();

    let wanted = MethodSignature {
        name: "M".into(),
        arity: 0,
        calling_convention: CallingConvention::Default,
        return_type: void,
        return_ref_kind: RefKind::None,
        return_custom_modifiers: Arc::from([]),
        parameters: vec![ParameterSignature {
            ty: string,
            ref_kind: RefKind::None,
            custom_modifiers: Arc::from([]),
        }],
    };
    let members = ty.members();
    let found = MethodSignatureComparer::EXACT.find_match(&wanted, members.iter());
    assert_eq!(found, Some(SymbolRef::Method(by_string)));
}

#[test]
fn test_retargeted_explicit_implementation_ignores_return_modifiers() {
    let corlib = corlib();
    let int32 = special(&corlib, SpecialType::Int32);
    let mut builder = AssemblyBuilder::new(AssemblyIdentity::new("App", Version::default()))
        .reference(&corlib);
    let marker = builder.add_type(TypeDef::class("App", "IsConst"));
    let _assembly = builder.build();

    let plain = MethodSignature {
        name: "Get".into(),
        arity: 0,
        calling_convention: CallingConvention::Default,
        return_type: int32,
        return_ref_kind: RefKind::None,
        return_custom_modifiers: Arc::from([]),
        parameters: Vec::new(),
    };
    let mut modified = plain.clone();
    modified.return_custom_modifiers = Arc::from([CustomModifier {
        modifier: crate::types::NamedTypeHandle::new(&marker),
        is_optional: true,
    }]);

    assert!(!MethodSignatureComparer::EXACT.equals(&plain, &modified));
    assert!(MethodSignatureComparer::RETARGETED_EXPLICIT_IMPLEMENTATION.equals(&plain, &modified));
}

#[test]
fn test_ref_kind_and_arity_distinguish_signatures() {
    let corlib = corlib();
    let int32 = special(&corlib, SpecialType::Int32);
    let base = MethodSignature {
        name: "M".into(),
        arity: 0,
        calling_convention: CallingConvention::Default,
        return_type: int32.clone(),
        return_ref_kind: RefKind::None,
        return_custom_modifiers: Arc::from([]),
        parameters: vec![ParameterSignature {
            ty: int32,
            ref_kind: RefKind::None,
            custom_modifiers: Arc::from([]),
        }],
    };
    let mut by_ref = base.clone();
    by_ref.parameters[0].ref_kind = RefKind::Ref;
    let mut generic = base.clone();
    generic.arity = 1;

    assert!(!MethodSignatureComparer::EXACT.equals(&base, &by_ref));
    assert!(!MethodSignatureComparer::EXACT.equals(&base, &generic));
    assert!(MethodSignatureComparer::EXACT.equals(&base, &base.clone()));
}
