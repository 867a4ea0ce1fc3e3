use super::*;
use crate::identity::Version;
use crate::metadata::{AssemblyBuilder, MethodDef, TypeDef};
use crate::types::{MetadataTypeName, SpecialType, TypeIdentifier, TypeSymbol};
use rustc_hash::FxHashSet;

fn corlib() -> AssemblyRef {
    AssemblyBuilder::cor_library(
        AssemblyIdentity::new("mscorlib", Version::new(4, 0, 0, 0)),
        &[SpecialType::Void, SpecialType::Int32],
    )
    .build()
}

fn void(corlib: &AssemblyRef) -> TypeSymbol {
    TypeSymbol::named(&corlib.get_declared_special_type(SpecialType::Void).unwrap())
}

#[test]
fn test_symbol_refs_compare_by_identity() {
    let corlib = corlib();
    let mut a = AssemblyBuilder::new(AssemblyIdentity::new("A", Version::new(1, 0, 0, 0)));
    let mut b = AssemblyBuilder::new(AssemblyIdentity::new("B", Version::new(1, 0, 0, 0)));
    let foo_a = a.add_type(TypeDef::class("N", "Foo"));
    let foo_b = b.add_type(TypeDef::class("N", "Foo"));
    let _a = a.build();
    let _b = b.build();

    assert_ne!(&foo_a, &foo_b);
    assert_eq!(&foo_a, &foo_a.clone());

    let set: FxHashSet<SymbolRef> = [
        SymbolRef::NamedType(foo_a.clone()),
        SymbolRef::NamedType(foo_a.clone()),
        SymbolRef::NamedType(foo_b.clone()),
    ]
    .into_iter()
    .collect();
    assert_eq!(set.len(), 2);
    assert_eq!(TypeSymbol::named(&foo_a), TypeSymbol::named(&foo_a));
    assert_ne!(TypeSymbol::named(&foo_a), TypeSymbol::named(&foo_b));
    assert!(corlib.is_cor_library());
}

#[test]
fn test_containing_chain_and_top_level_type() {
    let corlib = corlib();
    let mut builder = AssemblyBuilder::new(AssemblyIdentity::new("App", Version::default()))
        .reference(&corlib);
    let outer = builder.add_type(TypeDef::class("App", "Outer"));
    let inner = builder.add_nested_type(&outer, TypeDef::class("", "Inner"));
    let method = builder.add_method(&inner, MethodDef::new("Run", void(&corlib)));
    let assembly = builder.build();

    let method = SymbolRef::Method(method);
    assert_eq!(method.containing_type().as_ref(), Some(&inner));
    assert_eq!(method.top_level_type().as_ref(), Some(&outer));
    assert_eq!(
        method.containing_assembly().map(|a| a.identity().clone()),
        Some(assembly.identity().clone())
    );
    assert_eq!(inner.full_name(), "App.Outer.Inner");
    assert_eq!(method.to_string(), "App.Outer.Inner.Run");
    assert_eq!(outer.nested_types(), vec![inner.clone()]);
    assert_eq!(outer.get_nested_type("Inner", 0).as_ref(), Some(&inner));
    assert!(outer.get_nested_type("Inner", 1).is_none());
}

#[test]
fn test_special_types_resolve_through_cor_library() {
    let corlib = corlib();
    let app = AssemblyBuilder::new(AssemblyIdentity::new("App", Version::default()))
        .reference(&corlib)
        .build();

    let int32 = app.get_special_type(SpecialType::Int32).unwrap();
    assert_eq!(int32.full_name(), "System.Int32");
    assert!(app.get_declared_special_type(SpecialType::Int32).is_none());
    assert!(app.get_special_type(SpecialType::String).is_none());
    assert_eq!(
        corlib.cor_library().map(|c| c.identity().clone()),
        Some(corlib.identity().clone())
    );
}

#[test]
fn test_forwarded_type_lookup_follows_chain() {
    let mut target = AssemblyBuilder::new(AssemblyIdentity::new("Target", Version::default()));
    let foo = target.add_type(TypeDef::class("N", "Foo"));
    let target: AssemblyRef = target.build();

    let mut facade = AssemblyBuilder::new(AssemblyIdentity::new("Facade", Version::default()));
    facade.forward_type(MetadataTypeName::new("N", "Foo", 0), &target);
    let facade = facade.build();

    let mut visited = ForwardingVisited::new();
    let name = MetadataTypeName::new("N", "Foo", 0);
    let found = facade
        .try_lookup_forwarded_type_with_cycle_detection(&name, &mut visited)
        .found();
    assert_eq!(found.as_ref(), Some(&foo));
    assert_eq!(visited.len(), 1);

    let mut visited = ForwardingVisited::new();
    assert!(matches!(
        facade.try_lookup_forwarded_type_with_cycle_detection(
            &MetadataTypeName::new("N", "Bar", 0),
            &mut visited
        ),
        ForwardedTypeLookup::NotFound
    ));
}

#[test]
fn test_forwarding_cycle_is_detected() {
    let first = AssemblyBuilder::new(AssemblyIdentity::new("First", Version::default())).build();
    let first_ref: AssemblyRef = first.clone();
    let mut second = AssemblyBuilder::new(AssemblyIdentity::new("Second", Version::default()));
    let name = MetadataTypeName::new("N", "Loop", 0);
    second.forward_type(name.clone(), &first_ref);
    let second: AssemblyRef = second.build();
    first.set_type_forwarders(vec![(name.clone(), second.clone())]);

    let mut visited = ForwardingVisited::new();
    assert!(
        first
            .try_lookup_forwarded_type_with_cycle_detection(&name, &mut visited)
            .is_cycle()
    );
    assert_eq!(visited.len(), 2);
}

#[test]
fn test_find_type_by_identifier() {
    let identifier = TypeIdentifier {
        scope: "f0000000-0000-0000-0000-000000000001".into(),
        name: MetadataTypeName::new("Interop", "IWidget", 0),
    };
    let mut pia = AssemblyBuilder::new(AssemblyIdentity::new("Pia", Version::default()));
    let widget = pia
        .add_type(TypeDef::interface("Interop", "IWidget").type_identifier(identifier.clone()));
    let pia = pia.build();

    assert_eq!(pia.find_type_by_identifier(&identifier).as_ref(), Some(&widget));
    let other = TypeIdentifier {
        scope: "other".into(),
        name: identifier.name.clone(),
    };
    assert!(pia.find_type_by_identifier(&other).is_none());
}
