//! Tests for binding input into schema instances.

use std::sync::Arc;

use serde_json::json;
use structbind::{
    BindError, DiagnosticContext, FieldType, Fields, Resource, Schema, TypeDescriptor, Value,
};

fn payment(name: &str) -> Arc<Schema> {
    Schema::new(name)
        .field("id", FieldType::Int)
        .field("amount", FieldType::Float)
        .build()
}

fn context() -> Arc<DiagnosticContext> {
    Arc::new(DiagnosticContext::new())
}

#[test]
fn test_lenient_type_mismatch() {
    let schema = payment("Payment");
    let context = context();

    let instance = schema
        .make_in(&context, [("id", json!(1)), ("amount", json!("bad"))], false)
        .unwrap();

    assert_eq!(instance.get("id"), Some(&Value::from(1)));
    assert!(instance.get("amount").is_none());
    assert_eq!(
        context.errors("Payment"),
        vec!["Property Payment::$amount must be float, but string given!"]
    );
    assert!(!instance.is_valid());
}

#[test]
fn test_strict_unknown_field_rejected() {
    let schema = payment("Payment");
    let context = context();

    let error = schema
        .make_in(
            &context,
            [("id", json!(1)), ("amount", json!(2.5)), ("extra", json!("x"))],
            true,
        )
        .unwrap_err();

    assert!(error.to_string().contains("doesn't exist"));
    assert!(error.to_string().contains("$extra"));
    assert_eq!(error.messages().len(), 1);
}

#[test]
fn test_lazy_value_is_resolved() {
    let schema = Schema::new("Greeting").field("text", FieldType::String).build();
    let context = context();

    let instance = schema
        .make_in(&context, [("text", Value::lazy(|| Value::from("resolved")))], false)
        .unwrap();

    assert_eq!(instance.get("text"), Some(&Value::from("resolved")));
    assert!(instance.is_valid());
}

#[test]
fn test_mixed_structure_always_fails() {
    let schema = Schema::new("Mixed")
        .param("id", FieldType::Int)
        .field("note", FieldType::String)
        .build();
    let context = context();

    for strict in [true, false] {
        let error = schema.make_in(&context, Fields::new(), strict).unwrap_err();
        assert!(error.is_config());

        let error = schema
            .make_in(&context, [("id", json!(1)), ("note", json!("n"))], strict)
            .unwrap_err();
        assert!(error.is_config());
    }
    assert!(context.errors("Mixed").is_empty());
}

#[test]
fn test_lenient_never_keeps_undeclared_fields() {
    let schema = payment("Payment");
    let context = context();

    let instance = schema
        .make_in(
            &context,
            [("a", json!(1)), ("id", json!(5)), ("b", json!(null)), ("c", json!([]))],
            false,
        )
        .unwrap();

    assert_eq!(instance.assigned_fields(), vec!["id"]);
    assert_eq!(context.errors("Payment").len(), 3);
}

#[test]
fn test_strict_reports_every_problem_at_once() {
    let schema = payment("Payment");
    let context = context();

    let error = schema
        .make_in(
            &context,
            [("id", json!("1")), ("amount", json!(1)), ("nope", json!(true))],
            true,
        )
        .unwrap_err();

    assert_eq!(
        error.to_string(),
        "Property Payment::$id must be int, but string given!\n\
         Property Payment::$amount must be float, but int given!\n\
         Property Payment::$nope doesn't exist!"
    );
}

#[test]
fn test_empty_schema_empty_input() {
    let schema = Schema::new("Nothing").build();

    for strict in [true, false] {
        let context = context();
        let instance = schema.make_in(&context, Fields::new(), strict).unwrap();
        assert!(instance.values().is_empty());
        assert!(context.errors("Nothing").is_empty());
        assert!(instance.is_valid());
    }
}

#[test]
fn test_union_field() {
    let schema = Schema::new("Tag")
        .field("id", "int|string".parse::<TypeDescriptor>().unwrap())
        .build();
    let context = context();

    assert!(schema.make_in(&context, [("id", json!(3))], true).is_ok());
    assert!(schema.make_in(&context, [("id", json!("three"))], true).is_ok());

    let error = schema.make_in(&context, [("id", json!(3.5))], true).unwrap_err();
    assert_eq!(
        error.to_string(),
        "Property Tag::$id must be int|string, but float given!"
    );
}

#[test]
fn test_fixed_style_construction() {
    let schema = Schema::new("Point")
        .param("x", FieldType::Int)
        .param("y", FieldType::Int)
        .param_with_default("label", FieldType::String, "origin")
        .build();
    let context = context();

    let point = schema
        .make_in(&context, [("y", json!(2)), ("x", json!(1))], true)
        .unwrap();

    let keys: Vec<_> = point.values().keys().cloned().collect();
    assert_eq!(keys, vec!["x", "y", "label"]);
    assert_eq!(point.get("label"), Some(&Value::from("origin")));
}

#[test]
fn test_fixed_style_missing_argument() {
    let schema = Schema::new("Point")
        .param("x", FieldType::Int)
        .param("y", FieldType::Int)
        .build();
    let context = context();

    for strict in [true, false] {
        let error = schema.make_in(&context, [("x", json!(1))], strict).unwrap_err();
        assert!(matches!(error, BindError::Construction { .. }));
        assert!(error.to_string().contains("$y"));
    }
}

#[test]
fn test_fixed_style_lenient_mismatch_fails_construction() {
    let schema = Schema::new("Point")
        .param("x", FieldType::Int)
        .param_with_default("y", FieldType::Int, 0)
        .build();
    let context = context();

    let error = schema
        .make_in(&context, [("x", json!("one")), ("y", json!(2))], false)
        .unwrap_err();
    assert_eq!(
        error.to_string(),
        "Cannot construct Point: argument $x must be int, string given"
    );

    // A mismatched defaulted parameter falls back to its default
    let point = schema
        .make_in(&context, [("x", json!(1)), ("y", json!("two"))], false)
        .unwrap();
    assert_eq!(point.get("y"), Some(&Value::from(0)));
    assert_eq!(context.errors("Point").len(), 1);
}

#[test]
fn test_fixed_style_lenient_drops_unknown() {
    let schema = Schema::new("Point").param("x", FieldType::Int).build();
    let context = context();

    let point = schema
        .make_in(&context, [("x", json!(1)), ("z", json!(9))], false)
        .unwrap();
    assert_eq!(point.assigned_fields(), vec!["x"]);
}

#[test]
fn test_open_style_defaults_and_partial_population() {
    let schema = Schema::new("Settings")
        .field_with_default("theme", FieldType::String, "dark")
        .field("width", FieldType::Int)
        .field("height", FieldType::Int)
        .build();
    let context = context();

    let settings = schema.make_in(&context, [("width", json!(800))], true).unwrap();

    assert_eq!(settings.get("theme"), Some(&Value::from("dark")));
    assert_eq!(settings.get("width"), Some(&Value::from(800)));
    assert!(settings.get("height").is_none());
}

#[test]
fn test_nested_instance_never_mismatches() {
    let address = Schema::new("Address").field("city", FieldType::String).build();
    let user = Schema::new("User")
        .field("id", FieldType::Int)
        .field("home", "string|null".parse::<TypeDescriptor>().unwrap())
        .build();
    let context = context();

    let home = address.make_in(&context, [("city", json!("Oslo"))], true).unwrap();
    let instance = user
        .make_in(
            &context,
            vec![("id", Value::from(home.clone())), ("home", Value::from(home))],
            true,
        )
        .unwrap();

    assert!(instance.get("id").and_then(Value::as_object).is_some());
    assert!(instance.get("home").and_then(Value::as_object).is_some());
}

#[test]
fn test_nested_map_is_bound_by_nested_schema() {
    let address = Schema::new("Address").field("city", FieldType::String).build();
    let user = Schema::new("User")
        .field("name", FieldType::String)
        .field("address", &address)
        .build();
    let context = context();

    let instance = user
        .make_in(
            &context,
            [("name", json!("Ada")), ("address", json!({"city": "London"}))],
            true,
        )
        .unwrap();

    let nested = instance.get("address").and_then(Value::as_object).unwrap();
    assert_eq!(nested.name(), "Address");
    assert_eq!(nested.get("city"), Some(&Value::from("London")));
}

#[test]
fn test_nested_strict_failure_reported_on_outer_field() {
    let address = Schema::new("Address").field("city", FieldType::String).build();
    let user = Schema::new("User").field("address", &address).build();
    let context = context();

    let error = user
        .make_in(&context, [("address", json!({"city": 7, "zip": "x"}))], true)
        .unwrap_err();

    assert_eq!(error.messages().len(), 1);
    let message = &error.messages()[0];
    assert!(message.starts_with("Property User::$address must be Address"));
    assert!(message.contains("Property Address::$city must be string, but int given!"));
    assert!(message.contains("Property Address::$zip doesn't exist!"));
}

#[test]
fn test_nested_lenient_records_under_nested_identity() {
    let address = Schema::new("Address").field("city", FieldType::String).build();
    let user = Schema::new("User").field("address", &address).build();
    let context = context();

    let instance = user
        .make_in(&context, [("address", json!({"city": 7}))], false)
        .unwrap();

    assert!(context.errors("User").is_empty());
    assert_eq!(context.errors("Address").len(), 1);
    assert!(!instance.is_valid());
    let nested = instance.get("address").and_then(Value::as_object).unwrap();
    assert!(nested.get("city").is_none());
}

#[test]
fn test_to_array_round_trip() {
    let address = Schema::new("Address")
        .field("city", FieldType::String)
        .field("zip", "string|null".parse::<TypeDescriptor>().unwrap())
        .build();
    let user = Schema::new("User")
        .param("id", FieldType::Int)
        .param("score", FieldType::Float)
        .param("tags", FieldType::Array)
        .param("address", &address)
        .build();
    let context = context();

    let input = json!({
        "id": 7,
        "score": 2.0,
        "tags": ["a", 1, null],
        "address": {"city": "Lima", "zip": null}
    });
    let first = user
        .make_in(&context, structbind::fields_from_json(input.as_object().unwrap().clone()), true)
        .unwrap();

    let flat = first.to_array().unwrap();
    assert_eq!(serde_json::Value::Object(flat.clone()), input);

    let second = user
        .make_in(&context, structbind::fields_from_json(flat), true)
        .unwrap();
    assert_eq!(first, second);
    assert!(context.is_clean());
}

#[test]
fn test_to_array_fails_on_resource() {
    let schema = Schema::new("Upload").field("meta", FieldType::Array).build();
    let context = context();

    let instance = schema
        .make_in(
            &context,
            [("meta", Value::from(vec![Value::from(Resource::new("tmpfile", 3_i32))]))],
            true,
        )
        .unwrap();

    let error = instance.to_array().unwrap_err();
    assert!(matches!(error, BindError::Flatten { .. }));
    assert!(error.to_string().contains("meta[0]"));
}

#[test]
fn test_make_json_uses_global_context() {
    let schema = payment("GlobalPaymentJson");

    let instance = schema
        .make_json(&json!({"id": 1, "amount": "x"}), false)
        .unwrap();

    assert!(instance.get("amount").is_none());
    assert_eq!(
        DiagnosticContext::global().errors("GlobalPaymentJson"),
        vec!["Property GlobalPaymentJson::$amount must be float, but string given!"]
    );
}

#[test]
fn test_make_json_reports_errors_in_input_order() {
    let schema = payment("OrderedPaymentJson");

    let error = schema
        .make_json(&json!({"zone": 1, "id": "x", "amount": true}), true)
        .unwrap_err();

    assert_eq!(
        error.messages(),
        vec![
            "Property OrderedPaymentJson::$zone doesn't exist!",
            "Property OrderedPaymentJson::$id must be int, but string given!",
            "Property OrderedPaymentJson::$amount must be float, but bool given!",
        ]
    );
}

#[test]
fn test_make_json_assigns_in_input_order() {
    let schema = payment("OrderedPaymentAssign");

    let instance = schema
        .make_json(&json!({"amount": 2.5, "id": 7}), false)
        .unwrap();

    assert_eq!(instance.assigned_fields(), vec!["amount", "id"]);
}

#[test]
fn test_oversized_json_integer_binds_as_float() {
    let schema = payment("Payment");
    let context = context();

    let error = schema
        .make_in(&context, [("id", json!(u64::MAX))], true)
        .unwrap_err();

    assert_eq!(
        error.to_string(),
        "Property Payment::$id must be int, but float given!"
    );
}
