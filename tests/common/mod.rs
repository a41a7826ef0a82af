//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use schema_codec::ir::{EventDecl, FunctionDecl, Namespace, Origin, Property, Type};
use schema_codec::{Codegen, Dict, GeneratedNamespace, Resolver, Value};

/// A shop schema touching every type kind.
pub fn shop() -> Namespace {
    let io = Origin::json_and_client();
    Namespace::new("shop")
        .with_type(Type::enumeration(["RED", "GREEN", "BLUE"]).named("Color").with_origin(io))
        .with_type(
            Type::object([
                Property::required("name", Type::string()),
                Property::required("qty", Type::integer()),
                Property::optional("price", Type::double()),
                Property::optional("color", Type::reference("Color")),
                Property::optional("tags", Type::array(Type::string())),
                Property::optional("big", Type::int64()),
                Property::optional("extras", Type::any()),
            ])
            .named("Item")
            .with_origin(io),
        )
        .with_type(
            Type::choices([Type::integer(), Type::string(), Type::reference("Item")])
                .named("Pick")
                .with_origin(io),
        )
        .with_type(
            Type::object([
                Property::required("items", Type::array(Type::reference("Item"))),
                Property::required("colors", Type::array(Type::reference("Color"))),
                Property::required("pick", Type::reference("Pick")),
                Property::optional("note", Type::string()),
                Property::required("status", Type::reference("Color")),
            ])
            .with_additional_properties(Type::any())
            .named("Order")
            .with_origin(io),
        )
        .with_type(
            Type::object([
                Property::required("label", Type::string()),
                Property::required("children", Type::array(Type::reference("Node"))),
            ])
            .named("Node")
            .with_origin(io),
        )
        .with_type(
            Type::object([
                Property::required("a", Type::integer()),
                Property::required("b", Type::integer()),
            ])
            .named("Pair")
            .with_origin(io),
        )
        .with_type(
            Type::object([Property::required("x", Type::integer())]).named("Internal"),
        )
        .with_function(
            FunctionDecl::new(
                "create",
                vec![
                    Property::required("id", Type::integer()),
                    Property::optional("label", Type::string()),
                ],
            )
            .with_results(vec![
                Property::required("ok", Type::boolean()),
                Property::optional("item", Type::reference("Item")),
            ]),
        )
        .with_event(EventDecl::new("changed", vec![Property::required("value", Type::integer())]))
}

pub fn generate(namespaces: &[Namespace], name: &str) -> GeneratedNamespace {
    let resolver = Resolver::new(namespaces).expect("distinct namespaces");
    Codegen::new(&resolver).generate(name).expect("namespace generates")
}

pub fn value(json: serde_json::Value) -> Value {
    Value::from(json)
}

pub fn dict(json: serde_json::Value) -> Dict {
    match Value::from(json) {
        Value::Dict(d) => d,
        other => panic!("expected a JSON object, got {other:?}"),
    }
}
