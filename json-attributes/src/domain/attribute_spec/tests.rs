//! Unit tests for attribute spec validation and merging.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;
use std::sync::atomic::{AtomicI64, Ordering};

fn spec(name: &str, type_name: &str) -> AttributeSpec {
    AttributeSpec::validate(name, AttributeOptions::new().with_type(type_name))
        .expect("fixture spec should be valid")
}

#[fixture]
fn status_and_priority() -> AttributeSet {
    [spec("status", "String"), spec("priority", "Integer")]
        .into_iter()
        .collect()
}

#[rstest]
#[case("", "must not be empty")]
#[case("first name", "must not contain whitespace")]
#[case("tab\tbed", "must not contain whitespace")]
#[case("9lives", "must be a valid identifier")]
#[case("dash-ed", "must be a valid identifier")]
fn invalid_names_are_rejected(#[case] name: &str, #[case] expected_reason: &'static str) {
    let err = AttributeSpec::validate(name, AttributeOptions::new()).expect_err("name is invalid");
    assert_eq!(
        err,
        SpecError::InvalidName {
            name: name.to_owned(),
            reason: expected_reason,
        }
    );
}

#[rstest]
fn missing_type_defaults_to_string() {
    let spec = AttributeSpec::validate("nickname", AttributeOptions::new()).expect("valid spec");
    assert_eq!(spec.attribute_type(), AttributeType::String);
    assert_eq!(spec.default_value(), AttributeValue::from(""));
}

#[rstest]
fn unknown_type_names_the_attribute() {
    let err = AttributeSpec::validate("flag", AttributeOptions::new().with_type("NotAType"))
        .expect_err("type should be rejected");
    match err {
        SpecError::UnknownType { attribute, source } => {
            assert_eq!(attribute, "flag");
            assert_eq!(source.name, "NotAType");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[rstest]
fn literal_defaults_are_coerced_once() {
    let spec = AttributeSpec::validate(
        "count",
        AttributeOptions::new().with_type("Integer").with_default(json!("5")),
    )
    .expect("valid spec");
    assert_eq!(spec.default_value(), AttributeValue::Integer(5));
}

#[rstest]
fn literal_defaults_that_do_not_coerce_are_rejected() {
    let err = AttributeSpec::validate(
        "count",
        AttributeOptions::new().with_type("Integer").with_default(json!("many")),
    )
    .expect_err("default should be rejected");
    assert!(matches!(err, SpecError::InvalidDefault { ref attribute, .. } if attribute == "count"));
}

#[rstest]
fn generated_defaults_run_for_each_value() {
    let counter = std::sync::Arc::new(AtomicI64::new(0));
    let source = counter.clone();
    let spec = AttributeSpec::validate(
        "sequence",
        AttributeOptions::new()
            .with_type("Integer")
            .with_default_fn(move || json!(source.fetch_add(1, Ordering::SeqCst) + 1)),
    )
    .expect("valid spec");

    assert_eq!(spec.default_value(), AttributeValue::Integer(1));
    assert_eq!(spec.default_value(), AttributeValue::Integer(2));
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[rstest]
fn generated_defaults_that_do_not_coerce_fall_back_to_zero() {
    let spec = AttributeSpec::validate(
        "ratio",
        AttributeOptions::new()
            .with_type("Float")
            .with_default_fn(|| json!("not a number")),
    )
    .expect("valid spec");
    assert_eq!(spec.default_value(), AttributeValue::Float(0.0));
}

#[rstest]
fn options_from_json_accept_the_three_known_keys() {
    let options = AttributeOptions::from_json(
        "age",
        &json!({"type": "Integer", "default": 0, "validates": {"presence": true}}),
    )
    .expect("options should parse");
    let spec = AttributeSpec::validate("age", options).expect("valid spec");
    assert_eq!(spec.attribute_type(), AttributeType::Integer);
    assert_eq!(
        spec.validation().map(ValidationRule::as_value),
        Some(&json!({"presence": true}))
    );
    assert_eq!(spec.declared_default(), Some(&DefaultValue::Value(json!(0))));
}

#[rstest]
fn options_from_json_reject_unknown_keys() {
    let err = AttributeOptions::from_json("age", &json!({"type": "Integer", "index": true}))
        .expect_err("unknown key should be rejected");
    assert_eq!(
        err,
        SpecError::InvalidOption {
            attribute: "age".to_owned(),
            option: "index".to_owned(),
        }
    );
}

#[rstest]
#[case(json!("Integer"), "string")]
#[case(json!(["Integer"]), "array")]
#[case(json!(null), "null")]
fn options_from_json_require_an_object(#[case] raw: Value, #[case] found: &'static str) {
    let err = AttributeOptions::from_json("age", &raw).expect_err("options must be an object");
    assert_eq!(
        err,
        SpecError::InvalidOptions {
            attribute: "age".to_owned(),
            found,
        }
    );
}

#[rstest]
fn declarations_from_json_keep_document_order() {
    let declarations = AttributeDeclarations::from_json(&json!({
        "zeta": {},
        "alpha": {"type": "Boolean"},
        "mid": {"type": "Date"},
    }))
    .expect("declarations should parse");
    assert_eq!(declarations.names(), vec!["zeta", "alpha", "mid"]);

    let specs = declarations.validate().expect("declarations should validate");
    let types: Vec<_> = specs.iter().map(AttributeSpec::attribute_type).collect();
    assert_eq!(
        types,
        vec![AttributeType::String, AttributeType::Boolean, AttributeType::Date]
    );
}

#[rstest]
fn declarations_from_json_require_an_object() {
    let err = AttributeDeclarations::from_json(&json!([])).expect_err("array is not allowed");
    assert_eq!(err, SpecError::InvalidDeclarations { found: "array" });
}

#[rstest]
fn declaration_validation_stops_at_first_error() {
    let declarations = AttributeDeclarations::new()
        .attribute("ok", AttributeOptions::new())
        .attribute("bad name", AttributeOptions::new())
        .attribute("worse", AttributeOptions::new().with_type("Nope"));
    let err = declarations.validate().expect_err("validation should fail");
    assert!(matches!(err, SpecError::InvalidName { .. }));
}

#[rstest]
fn merge_overwrites_in_place_and_appends_new_names(mut status_and_priority: AttributeSet) {
    status_and_priority.merge([spec("priority", "Float"), spec("owner", "String")]);

    assert_eq!(status_and_priority.names(), vec!["status", "priority", "owner"]);
    assert_eq!(
        status_and_priority
            .get("priority")
            .map(AttributeSpec::attribute_type),
        Some(AttributeType::Float)
    );
    assert_eq!(status_and_priority.len(), 3);
}

#[rstest]
fn from_specs_rebuilds_equivalent_declarations(status_and_priority: AttributeSet) {
    let rebuilt: AttributeSet = AttributeDeclarations::from_specs(&status_and_priority)
        .validate()
        .expect("rebuilt declarations should validate")
        .into_iter()
        .collect();
    assert_eq!(rebuilt, status_and_priority);
}
