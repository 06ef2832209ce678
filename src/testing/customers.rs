//! Customers and regions: wrapper members carrying identity tags

use binding_core::{ClassSchema, PropertyContainer, WrapperRef};
use binding_types::{INTEGER, STRING};

/// Primary key, an explicitly named column and a foreign key.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Customer {
    pub id: Option<WrapperRef>,
    pub name: Option<WrapperRef>,
    pub region: Option<WrapperRef>,
}

impl PropertyContainer for Customer {
    fn describe(schema: &mut ClassSchema<Self>) {
        schema
            .wrapper_field("id", &INTEGER, |c| &c.id, |c| &mut c.id)
            .primary_key();
        schema
            .wrapper_field("name", &STRING, |c| &c.name, |c| &mut c.name)
            .column("customer_name");
        schema
            .wrapper_field("region", &INTEGER, |c| &c.region, |c| &mut c.region)
            .foreign_key("Region");
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Region {
    pub id: Option<WrapperRef>,
    pub label: Option<WrapperRef>,
}

impl PropertyContainer for Region {
    fn describe(schema: &mut ClassSchema<Self>) {
        schema
            .wrapper_field("id", &INTEGER, |r| &r.id, |r| &mut r.id)
            .primary_key();
        schema.wrapper_field("label", &STRING, |r| &r.label, |r| &mut r.label);
    }
}
