//! Unit tests for the JSON column codec.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::domain::{AttributeDeclarations, AttributeSet, AttributeValue, OwnerTypeId};

#[fixture]
fn codec() -> JsonColumnCodec {
    let owner = OwnerTypeId::new("Person").expect("valid owner");
    let specs: AttributeSet = AttributeDeclarations::from_json(&json!({
        "name": {"type": "String"},
        "age": {"type": "Integer", "default": 0},
        "count": {"type": "Integer", "default": 5},
        "tags": {"type": "Set"},
    }))
    .and_then(|declarations| declarations.validate())
    .expect("valid declarations")
    .into_iter()
    .collect();
    JsonColumnCodec::new(SchemaModel::compile(&owner, "data", &specs))
}

#[rstest]
fn encode_writes_declared_attributes_in_declaration_order(codec: JsonColumnCodec) {
    let value = codec.model().instantiate(
        json!({"tags": ["a", "a", "b"], "name": "Ada"})
            .as_object()
            .expect("object"),
    );
    let encoded = codec.encode(&ColumnValue::Typed(value));
    assert_eq!(
        encoded.as_text(),
        Some(r#"{"name":"Ada","age":0,"count":5,"tags":["a","b"]}"#)
    );
}

#[rstest]
fn decode_of_encoded_value_is_equal(codec: JsonColumnCodec) {
    let mut value = codec.model().defaults();
    value.set("name", "Grace").expect("set name");
    value.set("age", 85_i64).expect("set age");
    value.set_raw("tags", &json!(["navy", "cobol"])).expect("set tags");

    let encoded = codec.encode(&ColumnValue::Typed(value.clone()));
    let text = encoded.as_text().expect("typed values encode to text").to_owned();
    let decoded = codec.decode_with_diagnostics(RawColumnValue::Text(text));

    assert_eq!(decoded.fallback, None);
    assert_eq!(decoded.value, value);
}

fn single_attribute_codec(type_name: &str) -> JsonColumnCodec {
    let owner = OwnerTypeId::new("Person").expect("valid owner");
    let specs: AttributeSet = AttributeDeclarations::from_json(&json!({
        "value": {"type": type_name},
    }))
    .and_then(|declarations| declarations.validate())
    .expect("valid declarations")
    .into_iter()
    .collect();
    JsonColumnCodec::new(SchemaModel::compile(&owner, "data", &specs))
}

fn round_trip(codec: &JsonColumnCodec, value: &ModelValue) -> Decoded {
    let encoded = codec.encode(&ColumnValue::Typed(value.clone()));
    let text = encoded.as_text().expect("typed values encode to text").to_owned();
    codec.decode_with_diagnostics(RawColumnValue::Text(text))
}

#[rstest]
#[case::boolean("Boolean", AttributeValue::Boolean(true))]
#[case::string("String", AttributeValue::from("Ada"))]
#[case::decimal_keeps_scale(
    "Decimal",
    AttributeValue::Decimal(Decimal::from_str("12.3400").expect("decimal"))
)]
#[case::date(
    "Date",
    AttributeValue::Date(NaiveDate::from_ymd_opt(2024, 2, 29).expect("date"))
)]
#[case::date_time_keeps_offset_and_nanos(
    "DateTime",
    AttributeValue::DateTime(
        DateTime::parse_from_rfc3339("2024-05-01T09:30:15.123456789+02:00").expect("timestamp")
    )
)]
#[case::time_keeps_fraction(
    "Time",
    AttributeValue::Time(NaiveTime::from_hms_milli_opt(23, 59, 58, 250).expect("time"))
)]
#[case::float("Float", AttributeValue::Float(0.1))]
#[case::integer("Integer", AttributeValue::Integer(-42))]
#[case::object("Object", AttributeValue::Object(json!({"nested": [1, {"deep": true}]})))]
#[case::array("Array", AttributeValue::Array(vec![json!(1), json!("a"), json!(1)]))]
#[case::set("Set", AttributeValue::Set(vec![json!("x"), json!("y")]))]
#[case::hash(
    "Hash",
    AttributeValue::Hash(json!({"b": 1, "a": [2]}).as_object().cloned().expect("object"))
)]
#[case::null_of_any_type("Date", AttributeValue::Null)]
fn every_type_round_trips_through_storage(#[case] type_name: &str, #[case] input: AttributeValue) {
    let codec = single_attribute_codec(type_name);
    let mut value = codec.model().defaults();
    value.set("value", input.clone()).expect("value coerces");

    let decoded = round_trip(&codec, &value);

    assert_eq!(decoded.fallback, None);
    assert_eq!(decoded.value.get("value"), Some(&input));
    assert_eq!(decoded.value, value);
}

#[rstest]
fn decimal_scale_survives_storage() {
    let codec = single_attribute_codec("Decimal");
    let value = codec
        .model()
        .defaults()
        .with("value", Decimal::from_str("12.3400").expect("decimal"))
        .expect("decimal coerces");

    let decoded = round_trip(&codec, &value);

    let scale = decoded
        .value
        .get("value")
        .and_then(AttributeValue::as_decimal)
        .map(|decimal| decimal.scale());
    assert_eq!(scale, Some(4));
}

#[rstest]
fn null_objects_share_one_canonical_form() {
    let codec = single_attribute_codec("Object");
    let mut value = codec.model().defaults();
    value
        .set("value", AttributeValue::Object(Value::Null))
        .expect("null coerces");

    assert_eq!(value.get("value"), Some(&AttributeValue::Null));
    assert_eq!(round_trip(&codec, &value).value, value);
}

#[rstest]
fn raw_values_pass_through_encode(codec: JsonColumnCodec) {
    let raw = ColumnValue::Raw(json!({"anything": [1, 2]}));
    assert_eq!(codec.encode(&raw), EncodedColumn::Passthrough(raw.clone()));
}

#[rstest]
fn values_of_other_models_pass_through_encode(codec: JsonColumnCodec) {
    let owner = OwnerTypeId::new("Person").expect("valid owner");
    let other = SchemaModel::compile(&owner, "settings", &AttributeSet::new()).defaults();
    let encoded = codec.encode(&ColumnValue::Typed(other));
    assert!(encoded.as_text().is_none());
}

#[rstest]
#[case::truncated(RawColumnValue::from("{\"name\": \"Ad"))]
#[case::empty(RawColumnValue::from(""))]
#[case::array(RawColumnValue::Json(json!([1, 2, 3])))]
#[case::scalar_text(RawColumnValue::from("42"))]
#[case::invalid_utf8(RawColumnValue::Bytes(vec![0xff, 0xfe, 0x7b]))]
fn malformed_storage_decodes_to_defaults(codec: JsonColumnCodec, #[case] raw: RawColumnValue) {
    let decoded = codec.decode_with_diagnostics(raw);

    assert!(decoded.fallback.is_some());
    assert_eq!(decoded.value, codec.model().defaults());
    assert_eq!(decoded.value.get("count"), Some(&AttributeValue::Integer(5)));
}

#[rstest]
fn fallback_reports_the_json_kind(codec: JsonColumnCodec) {
    let decoded = codec.decode_with_diagnostics(RawColumnValue::Json(json!("text")));
    assert_eq!(
        decoded.fallback,
        Some(DecodeFallback::NotAnObject { found: "string" })
    );
}

#[rstest]
#[case::sql_null(RawColumnValue::Null)]
#[case::json_null(RawColumnValue::Json(Value::Null))]
#[case::text_null(RawColumnValue::from("null"))]
fn null_storage_decodes_to_defaults_without_fallback(
    codec: JsonColumnCodec,
    #[case] raw: RawColumnValue,
) {
    let decoded = codec.decode_with_diagnostics(raw);
    assert_eq!(decoded.fallback, None);
    assert_eq!(decoded.value.get("age"), Some(&AttributeValue::Integer(0)));
}

#[rstest]
fn missing_attributes_take_their_defaults(codec: JsonColumnCodec) {
    let value = codec.decode(RawColumnValue::from(r#"{"name": "Ada"}"#));
    assert_eq!(value.get("name").and_then(AttributeValue::as_str), Some("Ada"));
    assert_eq!(value.get("count"), Some(&AttributeValue::Integer(5)));
}

#[rstest]
fn bytes_decode_like_text(codec: JsonColumnCodec) {
    let value = codec.decode(RawColumnValue::Bytes(br#"{"age": "41"}"#.to_vec()));
    assert_eq!(value.get("age"), Some(&AttributeValue::Integer(41)));
}

#[rstest]
fn legacy_keys_are_dropped_on_rewrite(codec: JsonColumnCodec) {
    let value = codec.decode(RawColumnValue::from(
        r#"{"name": "Ada", "retired_flag": true, "age": 36}"#,
    ));
    let encoded = codec.encode(&ColumnValue::Typed(value));
    let rewritten: Value =
        serde_json::from_str(encoded.as_text().expect("text")).expect("valid json");

    assert_eq!(rewritten.get("retired_flag"), None);
    assert_eq!(rewritten.get("age"), Some(&json!(36)));
}

#[rstest]
fn typed_values_of_the_model_decode_unchanged(codec: JsonColumnCodec) {
    let value = codec
        .model()
        .defaults()
        .with("name", "Ada")
        .expect("set name");
    let decoded = codec.decode_with_diagnostics(RawColumnValue::Typed(value.clone()));
    assert_eq!(decoded.value, value);
    assert_eq!(decoded.fallback, None);
}
