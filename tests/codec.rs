mod common;

use common::{dict, generate, shop, value};
use schema_codec::ir::{Namespace, Origin, Property, Type};
use schema_codec::{
    AdditionalProperties, CodecError, Data, Dict, EnumValue, ErrorKind, Functions, Value,
};

fn diagnostic() -> schema_codec::GeneratedNamespace {
    generate(&[shop().with_error_messages(true)], "shop")
}

fn silent() -> schema_codec::GeneratedNamespace {
    generate(&[shop()], "shop")
}

fn failure(err: CodecError) -> schema_codec::Failure {
    match err {
        CodecError::Populate(f) => f,
        other => panic!("expected a populate failure, got {other:?}"),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DEFAULTS
// ————————————————————————————————————————————————————————————————————————————

#[test]
fn fresh_instance_follows_default_policy() {
    let ns = silent();
    let item = ns.object("Item").unwrap().new_instance();
    assert_eq!(item.get("name"), Some(&Data::String(String::new())));
    assert_eq!(item.get("qty"), Some(&Data::Integer(0)));
    assert_eq!(item.get("color"), Some(&Data::Enum(EnumValue::NONE)));
    for absent in ["price", "tags", "big", "extras"] {
        assert!(!item.is_present(absent), "{absent} should start absent");
    }

    let order = ns.object("Order").unwrap().new_instance();
    assert_eq!(order.get("status"), Some(&Data::Enum(EnumValue::NONE)));
    assert_eq!(order.get("colors"), Some(&Data::Array(Vec::new())));
    let pick = order.get("pick").and_then(Data::as_choice).unwrap();
    assert!(pick.engaged().is_empty());
    assert_eq!(pick.len(), 3);
    assert_eq!(order.additional(), &AdditionalProperties::Any(Default::default()));
}

// ————————————————————————————————————————————————————————————————————————————
// POPULATE
// ————————————————————————————————————————————————————————————————————————————

#[test]
fn required_field_short_circuits() {
    let ns = diagnostic();
    let pair = ns.object("Pair").unwrap();
    let err = failure(pair.from_value(&value(serde_json::json!({"b": 1}))).unwrap_err());
    assert_eq!(err.kind(), ErrorKind::MissingRequiredField);
    assert_eq!(err.message(), Some("'a' is required"));
}

#[test]
fn silent_convention_reports_kind_only() {
    let ns = silent();
    let pair = ns.object("Pair").unwrap();
    let err = failure(pair.from_value(&value(serde_json::json!({"b": 1}))).unwrap_err());
    assert_eq!(err.kind(), ErrorKind::MissingRequiredField);
    assert_eq!(err.message(), None);
    assert_eq!(err.to_string(), "missing required field");
}

#[test]
fn kind_mismatch_names_key_and_kinds() {
    let ns = diagnostic();
    let item = ns.object("Item").unwrap();
    let err = failure(
        item.from_value(&value(serde_json::json!({"name": "bolt", "qty": "4"})))
            .unwrap_err(),
    );
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert_eq!(err.message(), Some("'qty': expected integer, got string"));
}

#[test]
fn non_dictionary_source_is_a_type_mismatch() {
    let ns = diagnostic();
    let err = failure(ns.object("Pair").unwrap().from_value(&Value::Int(1)).unwrap_err());
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert_eq!(err.message(), Some("expected dictionary, got integer"));
}

#[test]
fn enum_array_keeps_converted_prefix() {
    let ns = diagnostic();
    let order = ns.object("Order").unwrap();
    let mut out = order.new_instance();
    let src = dict(serde_json::json!({"items": [], "colors": ["RED", "PURPLE"]}));
    let err = failure(order.populate_from_dict(&src, &mut out).unwrap_err());
    assert_eq!(err.kind(), ErrorKind::EnumUnrecognizedValue);
    assert_eq!(
        out.get("colors"),
        Some(&Data::Array(vec![Data::Enum(EnumValue::member(0))]))
    );
}

#[test]
fn list_element_failure_is_wrapped_with_index() {
    let ns = diagnostic();
    let order = ns.object("Order").unwrap();
    let src = value(serde_json::json!({
        "items": [{"name": "a", "qty": 1}, {"name": "b"}],
        "colors": [],
        "pick": 1,
        "status": "RED"
    }));
    let err = failure(order.from_value(&src).unwrap_err());
    assert_eq!(err.kind(), ErrorKind::ListElementInvalid);
    assert_eq!(
        err.message(),
        Some("Error at key 'items': Parsing array failed at index 1: 'qty' is required")
    );
}

#[test]
fn choices_pick_first_matching_variant() {
    let ns = diagnostic();
    let pick = ns.choices("Pick").unwrap();
    assert_eq!(pick.from_value(&Value::Int(3)).unwrap().engaged(), vec![0]);
    assert_eq!(pick.from_value(&Value::from("x")).unwrap().engaged(), vec![1]);
    let item = pick
        .from_value(&value(serde_json::json!({"name": "a", "qty": 1})))
        .unwrap();
    assert_eq!(item.engaged(), vec![pick.variant_index("Item").unwrap()]);

    let err = failure(pick.from_value(&Value::List(vec![])).unwrap_err());
    assert_eq!(err.kind(), ErrorKind::ChoiceNoVariantMatched);
    assert_eq!(err.message(), Some("expected integer or string or Item, got list"));
}

#[test]
fn repopulating_a_choice_resets_other_variants() {
    let ns = silent();
    let pick = ns.choices("Pick").unwrap();
    let mut choice = pick.new_instance();
    pick.populate(&Value::Int(1), &mut choice).unwrap();
    pick.populate(&Value::from("now a string"), &mut choice).unwrap();
    assert_eq!(choice.engaged(), vec![1]);
    assert_eq!(pick.to_value(&choice).unwrap(), Value::from("now a string"));
}

#[test]
fn every_key_lands_in_additional_properties() {
    let ns = silent();
    let order = ns.object("Order").unwrap();
    let src = value(serde_json::json!({
        "items": [],
        "colors": ["BLUE"],
        "pick": "p",
        "status": "GREEN",
        "x-trace": {"id": 7}
    }));
    let parsed = order.from_value(&src).unwrap();
    let extras = parsed.additional().as_any().unwrap();
    assert_eq!(
        extras.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["items", "colors", "pick", "status", "x-trace"]
    );

    let out = order.to_dict(&parsed).unwrap();
    assert_eq!(
        out.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["items", "colors", "pick", "status", "x-trace"]
    );
    assert_eq!(Value::Dict(out), src);
}

#[test]
fn absent_optional_fields_are_not_serialized() {
    let ns = silent();
    let item = ns.object("Item").unwrap();
    let parsed = item
        .from_value(&value(serde_json::json!({"name": "a", "qty": 2})))
        .unwrap();
    assert_eq!(
        item.to_value(&parsed).unwrap(),
        value(serde_json::json!({"name": "a", "qty": 2}))
    );
}

#[test]
fn int64_serializes_as_int_only_when_it_fits() {
    let ns = silent();
    let item = ns.object("Item").unwrap();
    let mut object = item.new_instance();
    object.set("big", 5i64);
    assert_eq!(item.to_dict(&object).unwrap()["big"], Value::Int(5));
    object.set("big", 1i64 << 40);
    assert_eq!(item.to_dict(&object).unwrap()["big"], Value::Double((1u64 << 40) as f64));

    let parsed = item
        .from_value(&value(serde_json::json!({"name": "a", "qty": 1, "big": 1099511627776.0})))
        .unwrap();
    assert_eq!(parsed.get("big"), Some(&Data::Int64(1 << 40)));
}

#[test]
fn int64_extremes_survive_a_round_trip() {
    let ns = silent();
    let item = ns.object("Item").unwrap();
    for extreme in [i64::MAX, i64::MIN] {
        let mut object = item.from_value(&value(serde_json::json!({"name": "a", "qty": 1}))).unwrap();
        object.set("big", extreme);
        let out = item.to_value(&object).unwrap();
        assert_eq!(out.as_dict().unwrap()["big"], Value::Double(extreme as f64));
        assert_eq!(item.from_value(&out).unwrap().get("big"), Some(&Data::Int64(extreme)));
    }
}

#[test]
fn any_additional_properties_deep_merge_on_repeat_populate() {
    let ns = silent();
    let order = ns.object("Order").unwrap();
    let base = serde_json::json!({"items": [], "colors": [], "pick": 1, "status": "RED"});
    let with_meta = |meta: serde_json::Value| {
        let mut src = base.clone();
        src["meta"] = meta;
        value(src)
    };
    let mut object = order.from_value(&with_meta(serde_json::json!({"a": 1, "n": {"x": 1}}))).unwrap();
    order
        .populate(&with_meta(serde_json::json!({"b": 2, "n": {"y": 2}})), &mut object)
        .unwrap();
    let extras = object.additional().as_any().unwrap();
    assert_eq!(
        extras["meta"],
        value(serde_json::json!({"a": 1, "n": {"x": 1, "y": 2}, "b": 2}))
    );
}

// ————————————————————————————————————————————————————————————————————————————
// STORE: typed additional properties, binary, functions, cross-namespace refs
// ————————————————————————————————————————————————————————————————————————————

fn store() -> Namespace {
    let io = Origin::json_and_client();
    Namespace::new("store")
        .with_error_messages(true)
        .with_type(
            Type::object([Property::required("total", Type::integer())])
                .with_additional_properties(Type::integer())
                .named("Tally")
                .with_origin(io),
        )
        .with_type(
            Type::object([Property::required("n", Type::string())])
                .with_additional_properties(Type::integer())
                .named("Counts")
                .with_origin(io),
        )
        .with_type(
            Type::object([
                Property::required("data", Type::binary()),
                Property::required("cb", Type::function(false)),
            ])
            .named("Blob")
            .with_origin(io),
        )
        .with_type(
            Type::object([
                Property::required("item", Type::reference("shop.Item")),
                Property::optional("tint", Type::reference("shop.Color")),
            ])
            .named("Shelf")
            .with_origin(io),
        )
}

fn stocked() -> schema_codec::GeneratedNamespace {
    generate(&[shop(), store()], "store")
}

#[test]
fn typed_additional_properties_convert_every_entry() {
    let ns = stocked();
    let tally = ns.object("Tally").unwrap();
    let src = value(serde_json::json!({"total": 3, "a": 1, "b": 2}));
    let parsed = tally.from_value(&src).unwrap();
    let extras = parsed.additional().as_typed().unwrap();
    assert_eq!(extras.keys().map(String::as_str).collect::<Vec<_>>(), vec!["total", "a", "b"]);
    assert_eq!(extras.get("b"), Some(&Data::Integer(2)));
    assert_eq!(tally.to_value(&parsed).unwrap(), src);
    assert_eq!(tally.clone_instance(&parsed).unwrap(), parsed);

    let err = failure(tally.from_value(&value(serde_json::json!({"total": 3, "a": "x"}))).unwrap_err());
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert_eq!(err.message(), Some("'a': expected integer, got string"));
}

#[test]
fn declared_keys_must_also_fit_the_additional_type() {
    let ns = stocked();
    let counts = ns.object("Counts").unwrap();
    let err = failure(counts.from_value(&value(serde_json::json!({"n": "x", "k": 1}))).unwrap_err());
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert_eq!(err.message(), Some("'n': expected integer, got string"));
}

#[test]
fn binary_and_function_properties() {
    let ns = stocked();
    let blob = ns.object("Blob").unwrap();
    let blob_of = |data: Value, cb: Value| {
        let mut d = Dict::new();
        d.insert("data".into(), data);
        d.insert("cb".into(), cb);
        Value::Dict(d)
    };

    let src = blob_of(Value::Binary(vec![0, 1, 255]), Value::Dict(Dict::new()));
    let parsed = blob.from_value(&src).unwrap();
    assert_eq!(parsed.get("data"), Some(&Data::Binary(vec![0, 1, 255])));
    assert_eq!(blob.to_value(&parsed).unwrap(), src);

    let err = failure(blob.from_value(&blob_of(Value::from("bytes"), Value::Dict(Dict::new()))).unwrap_err());
    assert_eq!(err.message(), Some("'data': expected binary, got string"));

    let err = failure(blob.from_value(&blob_of(Value::Binary(vec![]), value(serde_json::json!({"x": 1})))).unwrap_err());
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert_eq!(err.message(), Some("'cb': expected empty dictionary, got dictionary"));

    let err = failure(blob.from_value(&blob_of(Value::Binary(vec![]), Value::Int(5))).unwrap_err());
    assert_eq!(err.message(), Some("'cb': expected empty dictionary, got integer"));
}

#[test]
fn cross_namespace_refs_generate_and_round_trip() {
    let ns = stocked();
    let shelf = ns.object("Shelf").unwrap();
    let src = value(serde_json::json!({"item": {"name": "cup", "qty": 4}, "tint": "BLUE"}));
    let parsed = shelf.from_value(&src).unwrap();
    assert_eq!(parsed.get("tint").and_then(Data::as_enum).and_then(|e| e.ordinal()), Some(2));
    assert_eq!(shelf.to_value(&parsed).unwrap(), src);

    let err = failure(shelf.from_value(&value(serde_json::json!({"item": {"name": "cup"}}))).unwrap_err());
    assert_eq!(err.kind(), ErrorKind::MissingRequiredField);
    assert_eq!(err.message(), Some("'qty' is required"));
}

// ————————————————————————————————————————————————————————————————————————————
// SERIALIZE & CLONE
// ————————————————————————————————————————————————————————————————————————————

#[test]
fn one_engaged_variant_serializes_as_that_variant() {
    let ns = silent();
    let pick = ns.choices("Pick").unwrap();
    let mut choice = pick.new_instance();
    choice.set(0, 42);
    assert_eq!(pick.to_value(&choice).unwrap(), Value::Int(42));
}

#[test]
#[should_panic(expected = "exactly one variant")]
fn choice_with_no_variant_panics_on_serialize() {
    let ns = silent();
    let pick = ns.choices("Pick").unwrap();
    let _ = pick.to_value(&pick.new_instance());
}

#[test]
#[should_panic(expected = "exactly one variant")]
fn choice_with_two_variants_panics_on_serialize() {
    let ns = silent();
    let pick = ns.choices("Pick").unwrap();
    let mut choice = pick.new_instance();
    choice.set(0, 1);
    choice.set(1, "two");
    let _ = pick.to_value(&choice);
}

#[test]
fn clone_is_deep_and_independent() {
    let ns = silent();
    let order = ns.object("Order").unwrap();
    let src = value(serde_json::json!({
        "items": [{"name": "a", "qty": 1, "extras": {"k": [1, 2]}}],
        "colors": ["RED", "BLUE"],
        "pick": {"name": "p", "qty": 2},
        "status": "GREEN",
        "meta": true
    }));
    let original = order.from_value(&src).unwrap();
    let mut copy = order.clone_instance(&original).unwrap();
    assert_eq!(copy, original);

    let first = copy
        .get_mut("items")
        .and_then(Data::as_array_mut)
        .and_then(|xs| xs[0].as_object_mut())
        .unwrap();
    first.set("name", "changed");
    assert_ne!(copy, original);
    assert_eq!(order.to_value(&original).unwrap(), src);
}

#[test]
fn typed_extras_on_a_closed_object_are_a_shape_mismatch() {
    let ns = silent();
    let pair = ns.object("Pair").unwrap();
    let mut object = pair.new_instance();
    *object.additional_mut() = AdditionalProperties::Typed(Default::default());
    let expected = || CodecError::ShapeMismatch {
        at: "Pair".into(),
        expected: "closed object",
        found: "additional properties",
    };
    assert_eq!(pair.to_value(&object), Err(expected()));
    assert_eq!(pair.clone_instance(&object), Err(expected()));
}

#[test]
fn recursive_types_round_trip() {
    let ns = silent();
    let node = ns.object("Node").unwrap();
    let src = value(serde_json::json!({
        "label": "root",
        "children": [
            {"label": "a", "children": []},
            {"label": "b", "children": [{"label": "c", "children": []}]}
        ]
    }));
    let tree = node.from_value(&src).unwrap();
    assert_eq!(node.to_value(&tree).unwrap(), src);
    assert_eq!(node.clone_instance(&tree).unwrap(), tree);
}

#[test]
fn shape_mismatch_is_reported_not_panicked() {
    let ns = silent();
    let pair = ns.object("Pair").unwrap();
    let mut object = pair.new_instance();
    object.set("a", "not a number");
    assert_eq!(
        pair.to_value(&object),
        Err(CodecError::ShapeMismatch { at: "Pair.a".into(), expected: "integer", found: "string" })
    );
}

// ————————————————————————————————————————————————————————————————————————————
// GATING & LOOKUP
// ————————————————————————————————————————————————————————————————————————————

#[test]
fn functions_follow_origin_flags() {
    let ns = silent();
    assert_eq!(ns.functions_of("Internal"), Some(Functions::DEFAULT));
    assert!(ns.functions_of("Item").unwrap().contains(
        Functions::CLONE | Functions::POPULATE | Functions::FROM_VALUE | Functions::TO_VALUE
    ));

    let internal = ns.object("Internal").unwrap();
    assert_eq!(internal.new_instance().get("x"), Some(&Data::Integer(0)));
    assert_eq!(
        internal.from_value(&value(serde_json::json!({"x": 1}))),
        Err(CodecError::NotGenerated { name: "Internal".into(), function: "FromValue" })
    );
    assert!(matches!(
        internal.to_value(&internal.new_instance()),
        Err(CodecError::NotGenerated { function: "ToValue", .. })
    ));
}

#[test]
fn lookup_checks_name_and_kind() {
    let ns = silent();
    assert!(matches!(
        ns.object("Color"),
        Err(CodecError::WrongKind { expected: "object", actual: "enum", .. })
    ));
    assert!(matches!(ns.choices("Nope"), Err(CodecError::Unknown { what: "type", .. })));
    assert!(matches!(ns.manifest(), Err(CodecError::Unknown { .. })));
    assert_eq!(
        ns.type_names().collect::<Vec<_>>(),
        vec!["Color", "Item", "Pick", "Order", "Node", "Pair", "Internal"]
    );
}

#[test]
fn enum_codec_converts_both_ways() {
    let ns = silent();
    let color = ns.enumeration("Color").unwrap();
    let green = color.from_string("GREEN");
    assert_eq!(color.to_string(green), "GREEN");
    assert_eq!(color.from_string("PURPLE"), color.sentinel());
    assert_eq!(color.to_string(color.sentinel()), "");
    assert_eq!(
        color.parse_error_message("PURPLE"),
        "expected \"RED\" or \"GREEN\" or \"BLUE\", got \"PURPLE\""
    );
}

// ————————————————————————————————————————————————————————————————————————————
// FUNCTIONS & EVENTS
// ————————————————————————————————————————————————————————————————————————————

#[test]
fn params_create_checks_argument_count() {
    let ns = diagnostic();
    let create = ns.function("create").unwrap();

    let params = create.params_create(&[Value::Int(7)]).unwrap();
    assert_eq!(params.get("id"), Some(&Data::Integer(7)));
    assert!(!params.is_present("label"));

    let err = create.params_create(&[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArgumentCount);
    assert_eq!(err.message(), Some("expected 2 arguments, got 0"));

    let err = create
        .params_create(&[Value::Int(1), Value::from("l"), Value::Int(3)])
        .unwrap_err();
    assert_eq!(err.message(), Some("expected 2 arguments, got 3"));
}

#[test]
fn null_arguments_count_as_absent() {
    let ns = diagnostic();
    let create = ns.function("create").unwrap();
    let err = create.params_create(&[Value::None, Value::from("l")]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingRequiredField);
    assert_eq!(err.message(), Some("'id' is required"));

    let params = create.params_create(&[Value::Int(1), Value::None]).unwrap();
    assert!(!params.is_present("label"));
}

#[test]
fn results_and_events_serialize_positionally() {
    let ns = silent();
    let create = ns.function("create").unwrap();
    let mut results = create.new_results().unwrap();
    results.set("ok", true);
    assert_eq!(create.results_create(&results).unwrap(), vec![Value::Bool(true)]);

    let changed = ns.event("changed").unwrap();
    assert_eq!(changed.event_name(), "shop.changed");
    let mut args = changed.new_args();
    args.set("value", 5);
    assert_eq!(changed.create(&args).unwrap(), vec![Value::Int(5)]);
    assert!(matches!(ns.event("missing"), Err(CodecError::Unknown { what: "event", .. })));
}
