//! Tests for the diagnostic context as seen through bound instances.

use std::sync::Arc;

use serde_json::json;
use structbind::{DiagnosticContext, FieldType, Schema, Value, WARNING_KEY};

fn user() -> Arc<Schema> {
    Schema::new("User")
        .field("id", FieldType::Int)
        .field("name", FieldType::String)
        .build()
}

#[test]
fn test_strict_bind_warns_about_missing_diagnostics() {
    let context = Arc::new(DiagnosticContext::new());
    let instance = user()
        .make_in(&context, [("id", json!(1))], true)
        .unwrap();

    let errors = instance.errors();
    assert!(errors.contains_key(WARNING_KEY));
    assert_eq!(errors["User"], Vec::<String>::new());
    assert!(!context.is_enabled("User"));
    assert_eq!(context.strict("User"), Some(true));
}

#[test]
fn test_lenient_bind_enables_diagnostics() {
    let context = Arc::new(DiagnosticContext::new());
    let instance = user()
        .make_in(&context, [("id", json!(1)), ("age", json!(30))], false)
        .unwrap();

    let errors = instance.errors();
    assert!(!errors.contains_key(WARNING_KEY));
    assert_eq!(errors["User"], vec!["Property User::$age doesn't exist!"]);

    let entry = context.entry("User").unwrap();
    assert!(!entry.strict);
    assert_eq!(entry.properties.get("age"), Some(&Value::from(30)));
}

#[test]
fn test_is_valid_is_context_wide() {
    let context = Arc::new(DiagnosticContext::new());
    let other = Schema::new("Other").field("flag", FieldType::Bool).build();

    let clean = user().make_in(&context, [("id", json!(1))], false).unwrap();
    assert!(clean.is_valid());

    other
        .make_in(&context, [("flag", json!("yes"))], false)
        .unwrap();

    // Another schema's errors make this instance report invalid too
    assert!(!clean.is_valid());
    let errors = clean.errors();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors["Other"].len(), 1);
}

#[test]
fn test_last_bind_wins_per_schema() {
    let context = Arc::new(DiagnosticContext::new());
    let schema = user();

    let first = schema
        .make_in(&context, [("id", json!("bad"))], false)
        .unwrap();
    assert!(!first.is_valid());

    let second = schema.make_in(&context, [("id", json!(2))], false).unwrap();

    // The second bind reset the shared entry, so the first instance now
    // reports the second bind's (clean) diagnostics.
    assert!(second.is_valid());
    assert!(first.is_valid());
    assert!(first.errors()["User"].is_empty());
}

#[test]
fn test_nested_bind_overwrites_outer_history_of_same_schema() {
    let context = Arc::new(DiagnosticContext::new());
    let address = Schema::new("Address").field("city", FieldType::String).build();
    let user = Schema::new("Customer").field("address", &address).build();

    address
        .make_in(&context, [("city", json!(1))], false)
        .unwrap();
    assert_eq!(context.errors("Address").len(), 1);

    user.make_in(&context, [("address", json!({"city": "Rome"}))], false)
        .unwrap();
    assert!(context.errors("Address").is_empty());
}

#[test]
fn test_strict_bind_clears_previous_snapshot() {
    let context = Arc::new(DiagnosticContext::new());
    let schema = user();

    schema
        .make_in(&context, [("id", json!(1)), ("name", json!("a"))], false)
        .unwrap();
    assert_eq!(context.properties("User").map(|p| p.len()), Some(2));

    schema.make_in(&context, [("id", json!(2))], true).unwrap();
    let entry = context.entry("User").unwrap();
    assert!(entry.properties.is_empty());
    assert!(entry.strict);
    // Enablement is sticky once a lenient bind happened
    assert!(context.is_enabled("User"));
}

#[test]
fn test_rejected_strict_bind_keeps_errors() {
    let context = Arc::new(DiagnosticContext::new());
    let result = user().make_in(&context, [("id", json!(true))], true);

    assert!(result.is_err());
    assert_eq!(
        context.errors("User"),
        vec!["Property User::$id must be int, but bool given!"]
    );
    assert!(!context.is_clean());
}

#[test]
fn test_inspection_snapshot() {
    let context = Arc::new(DiagnosticContext::new());
    let instance = user()
        .make_in(
            &context,
            [("id", json!(1)), ("name", json!(5)), ("extra", json!(null))],
            false,
        )
        .unwrap();

    let snapshot = instance.inspect();
    assert_eq!(snapshot.schema, "User");
    assert_eq!(snapshot.assigned, vec!["id"]);
    assert_eq!(snapshot.input, vec!["id", "name", "extra"]);
    assert_eq!(snapshot.not_assigned, vec!["name", "extra"]);
    assert_eq!(snapshot.strict, Some(false));
    assert!(snapshot.diagnostics_enabled);
    assert_eq!(snapshot.errors.len(), 2);

    let text = snapshot.to_string();
    assert!(text.contains("not assigned: [name, extra]"));
    assert!(text.contains("- Property User::$extra doesn't exist!"));
}

#[test]
fn test_warning_entry_does_not_shadow_schema_named_warning() {
    let context = Arc::new(DiagnosticContext::new());
    let warning = Schema::new("warning").field("n", FieldType::Int).build();
    let other = Schema::new("Other").field("flag", FieldType::Bool).build();

    assert!(warning
        .make_in(&context, [("n", json!("x"))], true)
        .is_err());
    let instance = other
        .make_in(&context, [("flag", json!(true))], true)
        .unwrap();

    let errors = instance.errors();
    assert_eq!(
        errors["warning"],
        vec!["Property warning::$n must be int, but string given!"]
    );
    assert!(errors[WARNING_KEY][0].contains("Other"));
    assert_eq!(errors.len(), 3);
}

#[test]
fn test_fatal_nested_bind_keeps_outer_diagnostics() {
    let context = Arc::new(DiagnosticContext::new());
    let point = Schema::new("Point").param("x", FieldType::Int).build();
    let shape = Schema::new("Shape").field("origin", &point).build();

    let result = shape.make_in(&context, [("bogus", json!(1)), ("origin", json!({}))], false);

    assert!(result.is_err());
    assert_eq!(
        context.errors("Shape"),
        vec!["Property Shape::$bogus doesn't exist!"]
    );
    assert_eq!(context.properties("Shape").map(|p| p.len()), Some(2));
}
