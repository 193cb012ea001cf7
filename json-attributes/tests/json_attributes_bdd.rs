//! Behaviour tests for declaring, decoding and encoding json attributes.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use json_attributes::domain::ports::NoopAttributeHooks;
use json_attributes::domain::{
    AttributeDeclarations, AttributeDeclarer, BindingRegistry, ColumnValue, DeclarationError,
    DeclarationPolicy, Decoded, JsonColumnCodec, OwnerContext, OwnerTypeId, RawColumnValue,
    RegistrationOutcome, to_json,
};
use json_attributes::outbound::schema::StaticRecordSchema;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::Value;

struct DeclarationWorld {
    declarer: AttributeDeclarer,
    owners: RefCell<HashMap<String, OwnerContext>>,
    outcome: RefCell<Option<Result<RegistrationOutcome, DeclarationError>>>,
    decoded: RefCell<Option<Decoded>>,
}

impl DeclarationWorld {
    fn new() -> Self {
        Self {
            declarer: AttributeDeclarer::new(
                Arc::new(BindingRegistry::new()),
                DeclarationPolicy::default(),
            ),
            owners: RefCell::new(HashMap::new()),
            outcome: RefCell::new(None),
            decoded: RefCell::new(None),
        }
    }

    fn add_owner(&self, name: &str, schema: StaticRecordSchema) {
        let owner = OwnerContext::new(
            OwnerTypeId::new(name).expect("valid owner"),
            Arc::new(schema),
            Arc::new(NoopAttributeHooks),
        );
        self.owners.borrow_mut().insert(name.to_owned(), owner);
    }

    fn owner(&self, name: &str) -> OwnerContext {
        self.owners
            .borrow()
            .get(name)
            .cloned()
            .expect("owner should be set up by a given step")
    }

    fn decoded(&self) -> Decoded {
        self.decoded
            .borrow()
            .clone()
            .expect("a value should have been decoded")
    }

    fn attribute_json(&self, attribute: &str) -> Value {
        let decoded = self.decoded();
        let value = decoded
            .value
            .get(attribute)
            .expect("attribute should be declared");
        to_json(value)
    }
}

fn orders_table(table: &str) -> StaticRecordSchema {
    StaticRecordSchema::new(table, Vec::new())
        .with_column("id", "bigint")
        .with_column("title", "character varying")
        .with_column("data", "jsonb")
        .with_column("settings", "json")
}

#[fixture]
fn world() -> DeclarationWorld {
    DeclarationWorld::new()
}

#[given("an owner {owner} backed by table {table}")]
fn an_owner_backed_by_table(world: &DeclarationWorld, owner: String, table: String) {
    world.add_owner(&owner, orders_table(&table));
}

#[given("an owner {owner} whose table {table} is not migrated")]
fn an_owner_whose_table_is_not_migrated(world: &DeclarationWorld, owner: String, table: String) {
    world.add_owner(&owner, StaticRecordSchema::without_table(table));
}

#[when("{owner} declares on {column} the attributes {declarations}")]
fn owner_declares_attributes(
    world: &DeclarationWorld,
    owner: String,
    column: String,
    declarations: String,
) {
    let raw: Value = serde_json::from_str(&declarations).expect("declarations should be JSON");
    let declarations =
        AttributeDeclarations::from_json(&raw).expect("declarations should be well formed");
    let outcome = world
        .declarer
        .declare_json_attributes(&world.owner(&owner), &column, &declarations);
    *world.outcome.borrow_mut() = Some(outcome);
}

#[when("{child} inherits from {parent}")]
fn child_inherits_from_parent(world: &DeclarationWorld, child: String, parent: String) {
    let parent = OwnerTypeId::new(parent).expect("valid owner");
    let inherited = world.declarer.inherit(&parent, &world.owner(&child));
    assert!(!inherited.is_empty());
    assert!(inherited.iter().all(|column| column.result.is_ok()));
}

#[when("{owner} decodes {column} from {raw}")]
fn owner_decodes_column(world: &DeclarationWorld, owner: String, column: String, raw: String) {
    let owner = OwnerTypeId::new(owner).expect("valid owner");
    let binding = world
        .declarer
        .registry()
        .binding(&owner, &column)
        .expect("column should be bound");
    let decoded = binding
        .codec()
        .decode_with_diagnostics(RawColumnValue::Text(raw));
    *world.decoded.borrow_mut() = Some(decoded);
}

#[then("the declaration is registered")]
fn the_declaration_is_registered(world: &DeclarationWorld) {
    let outcome = world.outcome.borrow();
    assert!(matches!(
        outcome.as_ref(),
        Some(Ok(RegistrationOutcome::Registered(_)))
    ));
}

#[then("the declaration is skipped")]
fn the_declaration_is_skipped(world: &DeclarationWorld) {
    let outcome = world.outcome.borrow();
    assert!(matches!(
        outcome.as_ref(),
        Some(Ok(RegistrationOutcome::Skipped(_)))
    ));
}

#[then("the declaration fails with {kind}")]
fn the_declaration_fails_with(world: &DeclarationWorld, kind: String) {
    let outcome = world.outcome.borrow();
    match outcome.as_ref() {
        Some(Err(error)) => assert_eq!(error.kind(), kind),
        other => panic!("expected a declaration error, got {other:?}"),
    }
}

#[then("{owner} binds {column} to attributes {attributes}")]
fn owner_binds_column_to_attributes(
    world: &DeclarationWorld,
    owner: String,
    column: String,
    attributes: String,
) {
    let owner = OwnerTypeId::new(owner).expect("valid owner");
    let binding = world
        .declarer
        .registry()
        .binding(&owner, &column)
        .expect("column should be bound");
    let described: Vec<String> = binding
        .model()
        .describe()
        .into_iter()
        .map(|(name, attribute_type)| format!("{name}:{attribute_type}"))
        .collect();
    let expected: Vec<String> = attributes.split(", ").map(str::to_owned).collect();
    assert_eq!(described, expected);
}

#[then("{owner} has no binding for {column}")]
fn owner_has_no_binding_for(world: &DeclarationWorld, owner: String, column: String) {
    let owner = OwnerTypeId::new(owner).expect("valid owner");
    assert!(world.declarer.registry().binding(&owner, &column).is_none());
    assert!(world.declarer.registry().attribute_sets(&owner).is_empty());
}

#[then("the decoded attribute {attribute} is {expected}")]
fn the_decoded_attribute_is(world: &DeclarationWorld, attribute: String, expected: String) {
    let expected: Value = serde_json::from_str(&expected).expect("expected value should be JSON");
    assert_eq!(world.attribute_json(&attribute), expected);
}

#[then("the decode fell back to defaults")]
fn the_decode_fell_back_to_defaults(world: &DeclarationWorld) {
    assert!(world.decoded().fallback.is_some());
}

#[then("the decode used the stored value")]
fn the_decode_used_the_stored_value(world: &DeclarationWorld) {
    assert!(world.decoded().fallback.is_none());
}

#[then("encoding the decoded value yields {expected}")]
fn encoding_the_decoded_value_yields(world: &DeclarationWorld, expected: String) {
    let decoded = world.decoded();
    let codec = JsonColumnCodec::new(Arc::clone(decoded.value.model()));
    let encoded = codec.encode(&ColumnValue::Typed(decoded.value));
    assert_eq!(encoded.as_text(), Some(expected.as_str()));
}

#[scenario(
    path = "tests/features/json_attributes.feature",
    name = "Declared attributes round trip through a jsonb column"
)]
fn declared_attributes_round_trip(world: DeclarationWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/json_attributes.feature",
    name = "Re-declaring an attribute keeps one binding and the last spec wins"
)]
fn redeclaration_last_spec_wins(world: DeclarationWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/json_attributes.feature",
    name = "An unknown type is rejected without touching the existing binding"
)]
fn unknown_type_is_rejected(world: DeclarationWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/json_attributes.feature",
    name = "An attribute may not shadow a physical column"
)]
fn attribute_may_not_shadow_column(world: DeclarationWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/json_attributes.feature",
    name = "Malformed storage decodes to defaults"
)]
fn malformed_storage_decodes_to_defaults(world: DeclarationWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/json_attributes.feature",
    name = "Missing attributes take their declared default"
)]
fn missing_attributes_take_declared_default(world: DeclarationWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/json_attributes.feature",
    name = "Subtypes inherit bindings without affecting their parent"
)]
fn subtypes_inherit_bindings(world: DeclarationWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/json_attributes.feature",
    name = "Undeclared legacy keys are dropped on rewrite"
)]
fn legacy_keys_are_dropped(world: DeclarationWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/json_attributes.feature",
    name = "Declarations before migration are skipped"
)]
fn declarations_before_migration_are_skipped(world: DeclarationWorld) {
    drop(world);
}
