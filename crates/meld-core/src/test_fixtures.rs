//! Shared schema and graph fixtures for unit tests.

use crate::value::{EntityValue, Value};
use meld_schema::{
    node::{Association, Entity, Property, PropertyKind},
    registry::{SchemaBuilder, SchemaRegistry},
    types::ScalarKind,
};

pub const PERSON: &str = "people::Person";
pub const ADDRESS: &str = "people::Address";
pub const ORDER: &str = "shop::Order";
pub const ORDER_LINE: &str = "shop::OrderLine";

pub fn registry() -> SchemaRegistry {
    SchemaBuilder::default()
        .entity(person_schema())
        .entity(address_schema())
        .entity(order_schema())
        .entity(order_line_schema())
        .build()
        .unwrap()
}

fn person_schema() -> Entity {
    Entity::new(
        PERSON,
        vec![
            Property::identifier("id", ScalarKind::Uint),
            Property::version("rev", ScalarKind::Uint),
            Property::scalar("name", ScalarKind::Text),
            Property::scalar("nickname", ScalarKind::Text),
            Property::scalar("slug", ScalarKind::Text).read_only(),
            Property::new(
                "tags",
                PropertyKind::sequence(PropertyKind::Scalar(ScalarKind::Text)),
            ),
            Property::new(
                "scores",
                PropertyKind::mapping(ScalarKind::Text, PropertyKind::Scalar(ScalarKind::Int)),
            ),
            Property::new("address", PropertyKind::Entity { target: ADDRESS }),
            // link-only reference: structural merge must never descend here
            Property::new("partner", PropertyKind::Entity { target: PERSON })
                .with_association(Association::unidirectional().linkable()),
        ],
    )
}

fn address_schema() -> Entity {
    Entity::new(
        ADDRESS,
        vec![
            Property::scalar("street", ScalarKind::Text),
            Property::scalar("city", ScalarKind::Text),
        ],
    )
}

fn order_schema() -> Entity {
    Entity::new(
        ORDER,
        vec![
            Property::identifier("id", ScalarKind::Uint),
            Property::scalar("code", ScalarKind::Text),
            Property::new(
                "lines",
                PropertyKind::sequence(PropertyKind::Entity { target: ORDER_LINE }),
            )
            .with_association(Association::bidirectional("order")),
        ],
    )
}

fn order_line_schema() -> Entity {
    Entity::new(
        ORDER_LINE,
        vec![
            Property::identifier("id", ScalarKind::Uint),
            Property::scalar("sku", ScalarKind::Text),
            Property::scalar("quantity", ScalarKind::Uint),
            Property::new("order", PropertyKind::Entity { target: ORDER })
                .with_association(Association::bidirectional("lines")),
        ],
    )
}

/// Fully-populated person graph: scalars, a list, a map, and one nested
/// entity.
pub fn person() -> EntityValue {
    EntityValue::new(PERSON)
        .with_field("id", 7_u64)
        .with_field("rev", 1_u64)
        .with_field("name", "Alice")
        .with_field("nickname", "Ally")
        .with_field("slug", "alice")
        .with_field("tags", Value::from_list(vec!["x", "y"]))
        .with_field(
            "scores",
            Value::from_map(vec![
                (Value::Text("math".into()), Value::Int(90)),
                (Value::Text("art".into()), Value::Int(70)),
            ])
            .unwrap(),
        )
        .with_field("address", address("1 Main St", "Springfield"))
}

pub fn address(street: &str, city: &str) -> EntityValue {
    EntityValue::new(ADDRESS)
        .with_field("street", street)
        .with_field("city", city)
}

pub fn order_line(id: u64, sku: &str, quantity: u64) -> EntityValue {
    EntityValue::new(ORDER_LINE)
        .with_field("id", id)
        .with_field("sku", sku)
        .with_field("quantity", quantity)
}
