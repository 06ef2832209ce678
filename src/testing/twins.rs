//! Types that differ only by identity, and types with declaration defects

use binding_core::{ClassSchema, PropertyContainer, WrapperRef};
use binding_types::{INTEGER, STRING};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Left {
    pub id: Option<WrapperRef>,
}

impl PropertyContainer for Left {
    fn describe(schema: &mut ClassSchema<Self>) {
        schema
            .wrapper_field("id", &INTEGER, |l| &l.id, |l| &mut l.id)
            .primary_key();
    }
}

/// Same shape as [`Left`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Right {
    pub id: Option<WrapperRef>,
}

impl PropertyContainer for Right {
    fn describe(schema: &mut ClassSchema<Self>) {
        schema
            .wrapper_field("id", &INTEGER, |r| &r.id, |r| &mut r.id)
            .primary_key();
    }
}

#[derive(Debug, Default)]
pub struct DuplicateKeys {
    pub first: Option<WrapperRef>,
    pub second: Option<WrapperRef>,
}

impl PropertyContainer for DuplicateKeys {
    fn describe(schema: &mut ClassSchema<Self>) {
        schema
            .wrapper_field("first", &INTEGER, |d| &d.first, |d| &mut d.first)
            .primary_key();
        schema
            .wrapper_field("second", &STRING, |d| &d.second, |d| &mut d.second)
            .primary_key();
    }
}

/// `notes` is a plain `String` with no converter, so it cannot be bound.
#[derive(Debug, Default)]
pub struct PartlyBindable {
    pub id: Option<WrapperRef>,
    pub notes: String,
    pub title: Option<WrapperRef>,
}

impl PropertyContainer for PartlyBindable {
    fn describe(schema: &mut ClassSchema<Self>) {
        schema
            .wrapper_field("id", &INTEGER, |p| &p.id, |p| &mut p.id)
            .primary_key();
        schema.field("notes", |p| &p.notes, |p| &mut p.notes);
        schema.wrapper_field("title", &STRING, |p| &p.title, |p| &mut p.title);
    }
}
