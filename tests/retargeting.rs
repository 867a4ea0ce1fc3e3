//! End-to-end retargeting: a compilation that references `C1` (built against
//! `Lib` 1) next to `Lib` 2 sees `C1`'s signatures in terms of `Lib` 2.

use std::sync::Arc;
use xsym::symbols::{
    AssemblySymbol, MetadataTypeName, MethodDef, MethodSymbol, NamedTypeSymbol, ParamDef,
    ParameterSymbol, SpecialType, Symbol, TypeDef,
};
use xsym::{
    AssemblyBuilder, AssemblyIdentity, AssemblyRef, CompilationId, MethodRef, NamedTypeRef,
    RetargetingAssemblySymbol, TypeSymbol,
};

fn identity(name: &str, major: u16) -> AssemblyIdentity {
    AssemblyIdentity::new(name, xsym::symbols::Version::new(major, 0, 0, 0))
}

fn corlib() -> AssemblyRef {
    AssemblyBuilder::cor_library(
        identity("mscorlib", 4),
        &[SpecialType::Void, SpecialType::Int32],
    )
    .build()
}

fn int32(corlib: &AssemblyRef) -> TypeSymbol {
    TypeSymbol::named(&corlib.get_declared_special_type(SpecialType::Int32).unwrap())
}

/// `Lib` version `major` with `Lib.Foo { int Size(); }`.
fn lib(corlib: &AssemblyRef, major: u16) -> (AssemblyRef, NamedTypeRef) {
    let mut builder = AssemblyBuilder::new(identity("Lib", major)).reference(corlib);
    let foo = builder.add_type(TypeDef::class("Lib", "Foo"));
    builder.add_method(&foo, MethodDef::new("Size", int32(corlib)));
    (builder.build(), foo)
}

struct Program {
    corlib: AssemblyRef,
    lib_v2: AssemblyRef,
    foo_v1: NamedTypeRef,
    foo_v2: NamedTypeRef,
    c1: AssemblyRef,
    make_foo: MethodRef,
}

/// `C1` declares `static Lib.Foo Factory.MakeFoo(int count)` against `Lib` 1.
fn program() -> Program {
    let corlib = corlib();
    let (lib_v1, foo_v1) = lib(&corlib, 1);
    let (lib_v2, foo_v2) = lib(&corlib, 2);

    let mut builder = AssemblyBuilder::new(identity("C1", 1))
        .reference(&corlib)
        .reference(&lib_v1);
    let factory = builder.add_type(TypeDef::class("App", "Factory"));
    let make_foo = builder.add_method(
        &factory,
        MethodDef::new("MakeFoo", TypeSymbol::named(&foo_v1))
            .param(ParamDef::new("count", int32(&corlib))),
    );

    Program {
        corlib,
        lib_v2,
        foo_v1,
        foo_v2,
        c1: builder.build(),
        make_foo,
    }
}

/// `C1` as the referencing compilation observes it.
fn observe_c1(program: &Program) -> Arc<RetargetingAssemblySymbol> {
    let retargeted = RetargetingAssemblySymbol::new(program.c1.clone(), false);
    retargeted.set_references(vec![program.corlib.clone(), program.lib_v2.clone()]);
    retargeted
}

fn observed_make_foo(c1: &RetargetingAssemblySymbol) -> MethodRef {
    let factory = c1
        .lookup_declared_top_level_type(&MetadataTypeName::new("App", "Factory", 0))
        .expect("Factory is visible through the retargeted assembly");
    factory
        .members_named("MakeFoo")
        .iter()
        .find_map(|member| member.as_method().cloned())
        .expect("MakeFoo is visible through the retargeted Factory")
}

#[test]
fn test_return_type_resolves_to_referenced_version() {
    let program = program();
    let c1 = observe_c1(&program);
    let make_foo = observed_make_foo(&c1);

    assert_eq!(make_foo.return_type(), TypeSymbol::named(&program.foo_v2));
    assert_ne!(make_foo.return_type(), TypeSymbol::named(&program.foo_v1));
    assert_eq!(make_foo.parameters()[0].ty(), int32(&program.corlib));
    // The underlying symbol is untouched.
    assert_eq!(program.make_foo.return_type(), TypeSymbol::named(&program.foo_v1));
}

#[test]
fn test_referencing_compilation_sees_one_foo() {
    let program = program();
    let c1 = observe_c1(&program);
    let c1_ref: AssemblyRef = c1.clone();

    // C2 passes the result of `MakeFoo` to its own `Use(Lib.Foo)`.
    let mut builder = AssemblyBuilder::new(identity("C2", 1))
        .source(CompilationId::fresh())
        .reference(&program.corlib)
        .reference(&c1_ref)
        .reference(&program.lib_v2);
    let consumer = builder.add_type(TypeDef::class("App", "Consumer"));
    let consume = builder.add_method(
        &consumer,
        MethodDef::new("Use", int32(&program.corlib))
            .param(ParamDef::new("foo", TypeSymbol::named(&program.foo_v2))),
    );
    let _c2 = builder.build();

    let make_foo = observed_make_foo(&c1);
    assert_eq!(make_foo.return_type(), consume.parameters()[0].ty());
}

#[test]
fn test_observed_symbols_are_stable_wrappers() {
    let program = program();
    let c1 = observe_c1(&program);

    let first = observed_make_foo(&c1);
    let second = observed_make_foo(&c1);
    assert_eq!(&first, &second);
    assert_eq!(first.name(), program.make_foo.name());
    assert!(first.is_retargeting());
    assert_eq!(
        first.containing_assembly().map(|assembly| assembly.identity().clone()),
        Some(identity("C1", 1))
    );
}
