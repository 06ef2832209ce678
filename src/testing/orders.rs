//! Orders: plain Rust members adapted onto column types

use binding_core::{ClassSchema, ConverterSpec, LiteralType, PropertyContainer, TypeBound, WrapperRef};
use binding_types::{EpochSeconds, NumericText, YesNoFlag, INTEGER};

/// Passes `i64` values through unchanged.
pub fn long_identity() -> ConverterSpec {
    ConverterSpec::from_fns(
        "LongIdentity",
        TypeBound::Single(LiteralType::Long),
        TypeBound::Single(LiteralType::Long),
        Ok,
        Ok,
    )
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Order {
    pub number: Option<WrapperRef>,
    pub customer_id: i64,
    pub quantity: i32,
    pub discount: Option<i32>,
    pub placed_at: i64,
    pub reference: i64,
    pub express: String,
}

impl PropertyContainer for Order {
    fn describe(schema: &mut ClassSchema<Self>) {
        schema
            .wrapper_field("number", &INTEGER, |o| &o.number, |o| &mut o.number)
            .primary_key();
        schema
            .field("customer_id", |o| &o.customer_id, |o| &mut o.customer_id)
            .foreign_key("Customer")
            .adapt(long_identity());
        schema
            .field("quantity", |o| &o.quantity, |o| &mut o.quantity)
            .adapt(long_identity());
        schema
            .field("discount", |o| &o.discount, |o| &mut o.discount)
            .adapt(long_identity());
        schema
            .field("placed_at", |o| &o.placed_at, |o| &mut o.placed_at)
            .adapt(ConverterSpec::of::<EpochSeconds>());
        schema
            .field("reference", |o| &o.reference, |o| &mut o.reference)
            .column("order_ref")
            .adapt(ConverterSpec::of::<NumericText>());
        schema
            .field("express", |o| &o.express, |o| &mut o.express)
            .adapt(ConverterSpec::of::<YesNoFlag>());
    }
}
