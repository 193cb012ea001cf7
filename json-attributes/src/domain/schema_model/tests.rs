//! Unit tests for schema model compilation and typed values.

use super::*;
use crate::domain::AttributeOptions;
use rstest::{fixture, rstest};
use serde_json::json;

fn owner() -> OwnerTypeId {
    OwnerTypeId::new("Person").expect("valid owner")
}

#[fixture]
fn person_model() -> Arc<SchemaModel> {
    let attributes: AttributeSet = [
        AttributeSpec::validate("name", AttributeOptions::new().with_type("String"))
            .expect("valid spec"),
        AttributeSpec::validate(
            "age",
            AttributeOptions::new().with_type("Integer").with_default(json!(0)),
        )
        .expect("valid spec"),
        AttributeSpec::validate("count", AttributeOptions::new().with_type("Integer").with_default(json!(5)))
            .expect("valid spec"),
        AttributeSpec::validate("born_on", AttributeOptions::new().with_type("Date"))
            .expect("valid spec"),
    ]
    .into_iter()
    .collect();
    SchemaModel::compile(&owner(), "data", &attributes)
}

#[rstest]
#[case("data", "DataDynamicType")]
#[case("extra_info", "ExtraInfoDynamicType")]
#[case("meta-data", "MetaDataDynamicType")]
fn type_names_derive_from_the_column(#[case] column: &str, #[case] expected: &str) {
    let model = SchemaModel::compile(&owner(), column, &AttributeSet::new());
    assert_eq!(model.type_name(), expected);
}

#[rstest]
fn display_lists_the_attribute_set(person_model: Arc<SchemaModel>) {
    assert_eq!(
        person_model.to_string(),
        "<DataDynamicType type => Person attribute_set => [name:String, age:Integer, count:Integer, born_on:Date]>"
    );
}

#[rstest]
fn missing_keys_take_declared_defaults_or_zero_values(person_model: Arc<SchemaModel>) {
    let value = person_model.instantiate(&Map::new());
    assert_eq!(value.get("name"), Some(&AttributeValue::from("")));
    assert_eq!(value.get("age"), Some(&AttributeValue::Integer(0)));
    assert_eq!(value.get("count"), Some(&AttributeValue::Integer(5)));
    assert_eq!(value.get("born_on"), Some(&AttributeValue::Null));
}

#[rstest]
fn unknown_keys_are_ignored(person_model: Arc<SchemaModel>) {
    let input = json!({"name": "Ada", "legacy_flag": true});
    let value = person_model.instantiate(input.as_object().expect("object"));
    assert_eq!(value.get("name").and_then(AttributeValue::as_str), Some("Ada"));
    assert!(value.get("legacy_flag").is_none());
    assert!(!value.to_untyped().contains_key("legacy_flag"));
}

#[rstest]
fn uncoercible_values_fall_back_to_defaults(person_model: Arc<SchemaModel>) {
    let input = json!({"age": "forty", "count": [1, 2]});
    let value = person_model.instantiate(input.as_object().expect("object"));
    assert_eq!(value.get("age"), Some(&AttributeValue::Integer(0)));
    assert_eq!(value.get("count"), Some(&AttributeValue::Integer(5)));
}

#[rstest]
fn to_untyped_follows_declaration_order(person_model: Arc<SchemaModel>) {
    let input = json!({"born_on": "1815-12-10", "name": "Ada"});
    let untyped = person_model
        .instantiate(input.as_object().expect("object"))
        .to_untyped();
    let keys: Vec<_> = untyped.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["name", "age", "count", "born_on"]);
    assert_eq!(untyped.get("born_on"), Some(&json!("1815-12-10")));
}

#[rstest]
fn set_coerces_and_with_leaves_the_original_untouched(person_model: Arc<SchemaModel>) {
    let original = person_model.defaults();
    let updated = original.with("age", "36").expect("string age should coerce");
    assert_eq!(updated.get("age"), Some(&AttributeValue::Integer(36)));
    assert_eq!(original.get("age"), Some(&AttributeValue::Integer(0)));
}

#[rstest]
fn set_reports_unknown_attributes_and_bad_values(person_model: Arc<SchemaModel>) {
    let mut value = person_model.defaults();
    assert_eq!(
        value.set("nickname", "Countess"),
        Err(ModelValueError::UnknownAttribute {
            model: "DataDynamicType".to_owned(),
            attribute: "nickname".to_owned(),
        })
    );
    let err = value
        .set_raw("age", &json!({"years": 36}))
        .expect_err("object is not an integer");
    assert!(matches!(err, ModelValueError::Coercion { ref attribute, .. } if attribute == "age"));
}

#[rstest]
fn values_from_recompiled_models_with_the_same_shape_compare_equal(
    person_model: Arc<SchemaModel>,
) {
    let recompiled = SchemaModel::compile(&owner(), "data", person_model.attributes());
    let first = person_model.defaults();
    let second = recompiled.defaults();
    assert_eq!(first, second);
    assert!(second.is_instance_of(&person_model));
}

#[rstest]
fn debug_output_names_the_dynamic_type(person_model: Arc<SchemaModel>) {
    let rendered = format!("{:?}", person_model.defaults());
    assert!(rendered.starts_with("DataDynamicType {"), "unexpected: {rendered}");
}
