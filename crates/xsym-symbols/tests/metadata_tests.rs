use super::*;
use crate::handles::{MethodDefinitionHandle, ParameterHandle, TypeDefinitionHandle};
use crate::identity::{AssemblyIdentity, CompilationId, Version};
use crate::symbol::{
    AssemblyRef, AssemblySymbol, MethodKind, MethodSymbol, ModuleSymbol, ParameterSymbol,
    PropertySymbol, Symbol, SymbolRef,
};
use crate::types::{SpecialType, TypeSymbol};
use xsym_common::{Location, SyntaxTreeId, TextSpan};

fn corlib() -> AssemblyRef {
    AssemblyBuilder::cor_library(
        AssemblyIdentity::new("mscorlib", Version::new(4, 0, 0, 0)),
        &[SpecialType::Void, SpecialType::Int32],
    )
    .build()
}

fn int32(corlib: &AssemblyRef) -> TypeSymbol {
    TypeSymbol::named(&corlib.get_declared_special_type(SpecialType::Int32).unwrap())
}

#[test]
fn test_rows_are_allocated_per_table() {
    let corlib = corlib();
    let mut builder = AssemblyBuilder::new(AssemblyIdentity::new("App", Version::default()))
        .reference(&corlib);
    let c = builder.add_type(TypeDef::class("App", "C"));
    let d = builder.add_type(TypeDef::class("App", "D"));
    let m1 = builder.add_method(
        &c,
        MethodDef::new("M1", int32(&corlib))
            .param(ParamDef::new("a", int32(&corlib)))
            .param(ParamDef::new("b", int32(&corlib))),
    );
    let m2 = builder.add_method(
        &d,
        MethodDef::new("M2", int32(&corlib)).param(ParamDef::new("c", int32(&corlib))),
    );
    let _assembly = builder.build();

    assert_eq!(c.metadata_handle(), Some(TypeDefinitionHandle(1).into()));
    assert_eq!(d.metadata_handle(), Some(TypeDefinitionHandle(2).into()));
    assert_eq!(m1.metadata_handle(), Some(MethodDefinitionHandle(1).into()));
    assert_eq!(m2.metadata_handle(), Some(MethodDefinitionHandle(2).into()));
    assert_eq!(m1.parameters()[1].metadata_handle(), Some(ParameterHandle(2).into()));
    assert_eq!(m2.parameters()[0].metadata_handle(), Some(ParameterHandle(3).into()));
}

#[test]
fn test_parameters_point_back_at_their_method() {
    let corlib = corlib();
    let mut builder = AssemblyBuilder::new(AssemblyIdentity::new("App", Version::default()))
        .reference(&corlib);
    let c = builder.add_type(TypeDef::class("App", "C"));
    let m = builder.add_method(
        &c,
        MethodDef::new("M", int32(&corlib)).param(ParamDef::new("x", int32(&corlib))),
    );
    let _assembly = builder.build();

    let parameter = &m.parameters()[0];
    assert_eq!(parameter.ordinal(), 0);
    assert_eq!(parameter.containing_symbol(), Some(SymbolRef::Method(m.clone())));
    assert_eq!(SymbolRef::Parameter(parameter.clone()).containing_type(), Some(c.clone()));
}

#[test]
fn test_accessors_and_backing_fields_know_their_property() {
    let corlib = corlib();
    let mut builder = AssemblyBuilder::new(AssemblyIdentity::new("App", Version::default()))
        .reference(&corlib);
    let c = builder.add_type(TypeDef::class("App", "C"));
    let getter = builder.add_method(
        &c,
        MethodDef::new("get_P", int32(&corlib)).kind(MethodKind::PropertyGet),
    );
    let property = builder.add_property(&c, PropertyDef::new("P", int32(&corlib)).getter(&getter));
    let field = builder.add_field(
        &c,
        FieldDef::new("<P>k__BackingField", int32(&corlib))
            .backing(SymbolRef::Property(property.clone())),
    );
    let _assembly = builder.build();

    let owner = SymbolRef::Property(property.clone());
    assert_eq!(getter.associated_symbol(), Some(owner.clone()));
    assert_eq!(SymbolRef::Field(field).associated_symbol(), Some(owner));
    assert_eq!(property.get_method(), Some(getter));
    assert!(property.set_method().is_none());
}

#[test]
fn test_partial_parts_are_linked_both_ways() {
    let corlib = corlib();
    let mut builder = AssemblyBuilder::new(AssemblyIdentity::new("App", Version::default()))
        .reference(&corlib);
    let c = builder.add_type(TypeDef::class("App", "C"));
    let definition = builder.add_method(&c, MethodDef::new("P", int32(&corlib)));
    let implementation = builder.add_method(&c, MethodDef::new("P", int32(&corlib)));
    builder.link_partial_parts(&definition, &implementation);
    let _assembly = builder.build();

    assert_eq!(implementation.partial_definition_part(), Some(definition.clone()));
    assert_eq!(definition.partial_implementation_part(), Some(implementation.clone()));
    assert!(implementation.is_partial_implementation());
    assert!(!definition.is_partial_implementation());
}

#[test]
fn test_modules_and_locations() {
    let compilation = CompilationId::fresh();
    let tree = SyntaxTreeId(0);
    let mut builder = AssemblyBuilder::new(AssemblyIdentity::new("App", Version::default()))
        .source(compilation);
    let extra = builder.add_module("App.extra.netmodule");
    let c = builder
        .add_type(TypeDef::class("App", "C").at(Location::source(tree, TextSpan::new(10, 40))));
    let e = builder.add_type(TypeDef::class("App", "E").in_module(extra));
    let assembly = builder.build();

    let modules = assembly.modules();
    assert_eq!(modules.len(), 2);
    assert_eq!(&*modules[0].types(), &[c.clone()]);
    assert_eq!(&*modules[1].types(), &[e.clone()]);
    assert_eq!(modules[1].ordinal(), 1);
    assert_eq!(c.declaring_compilation(), Some(compilation));
    assert_eq!(c.locations()[0].span(), Some(TextSpan::new(10, 40)));
    assert!(e.locations().is_empty());

    let metadata_only = corlib();
    assert_eq!(&*metadata_only.locations(), &[Location::Metadata]);
    assert_eq!(metadata_only.declaring_compilation(), None);
}

#[test]
fn test_local_syntax_offset_is_relative_to_declaration() {
    let corlib = corlib();
    let mut builder = AssemblyBuilder::new(AssemblyIdentity::new("App", Version::default()))
        .reference(&corlib);
    let c = builder.add_type(TypeDef::class("App", "C"));
    let m = builder.add_method(
        &c,
        MethodDef::new("M", int32(&corlib))
            .at(Location::source(SyntaxTreeId(0), TextSpan::new(100, 180))),
    );
    let _assembly = builder.build();

    assert_eq!(m.calculate_local_syntax_offset(130), 30);
    assert_eq!(m.calculate_local_syntax_offset(90), -10);
}

#[test]
#[should_panic(expected = "NoPia resolution assemblies of")]
fn test_no_pia_resolution_assemblies_are_write_once() {
    let corlib = corlib();
    let app = AssemblyBuilder::new(AssemblyIdentity::new("App", Version::default())).build();
    app.set_no_pia_resolution_assemblies(vec![corlib.clone()]);
    assert_eq!(app.no_pia_resolution_assemblies().len(), 1);
    app.set_no_pia_resolution_assemblies(vec![corlib]);
}
