//! Shared fixtures for unit tests: a small canonical type family, a domain
//! over it, converters and model types.

use crate::config::Visibility;
use crate::convert::ConverterSpec;
use crate::definition::PropertyInfo;
use crate::error::{BindError, Result};
use crate::handler::BindingDomain;
use crate::member::{ClassSchema, PropertyContainer};
use crate::types::{CanonicalType, CanonicalTypeInfo, LiteralType, TypeBound};
use crate::value::{AttachToken, CanonicalValue, Value, WrapperCore, WrapperRef};
use std::sync::Arc;

/// Installs a test subscriber honouring `RUST_LOG`; safe to call repeatedly.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Canonical types
// ============================================================================

pub static NUMBER: CanonicalTypeInfo = CanonicalTypeInfo {
    name: "number",
    literal_type: LiteralType::Number,
    parent: None,
    constructor: None,
};

pub static INTEGER: CanonicalTypeInfo = CanonicalTypeInfo {
    name: "integer",
    literal_type: LiteralType::Long,
    parent: Some(&NUMBER),
    constructor: Some(new_integer),
};

pub static TEXT: CanonicalTypeInfo = CanonicalTypeInfo {
    name: "text",
    literal_type: LiteralType::String,
    parent: None,
    constructor: Some(new_text),
};

pub static COMPOSITE: CanonicalTypeInfo = CanonicalTypeInfo {
    name: "composite",
    literal_type: LiteralType::Any,
    parent: None,
    constructor: Some(new_composite),
};

pub struct TestWrapper {
    canonical: CanonicalType,
    core: WrapperCore,
}

impl CanonicalValue for TestWrapper {
    fn canonical_type(&self) -> CanonicalType {
        self.canonical
    }

    fn value(&self) -> Value {
        self.core.literal().clone()
    }

    fn set_value(&mut self, value: Value) -> Result<()> {
        if !value.is_instance_of(&self.canonical.literal_type()) {
            return Err(BindError::illegal_argument(format!(
                "Cannot store {} in a {}",
                value.type_name(),
                self.canonical
            )));
        }
        self.core.set_literal(value);
        Ok(())
    }

    fn clear(&mut self) {
        self.core.clear();
    }

    fn property_definition(&self) -> Option<&Arc<PropertyInfo>> {
        self.core.definition()
    }

    fn attach_definition(&mut self, definition: Arc<PropertyInfo>, token: AttachToken) {
        self.core.attach(definition, token);
    }
}

fn wrapper_of(info: &'static CanonicalTypeInfo) -> WrapperRef {
    WrapperRef::new(TestWrapper {
        canonical: CanonicalType::of(info),
        core: WrapperCore::new(),
    })
}

fn new_integer() -> WrapperRef {
    wrapper_of(&INTEGER)
}

fn new_text() -> WrapperRef {
    wrapper_of(&TEXT)
}

fn new_composite() -> WrapperRef {
    wrapper_of(&COMPOSITE)
}

pub fn integer_ref(value: Option<i64>) -> WrapperRef {
    let wrapper = new_integer();
    if let Some(v) = value {
        wrapper.lock().set_value(Value::Long(v)).unwrap();
    }
    wrapper
}

pub fn text_ref(value: &str) -> WrapperRef {
    let wrapper = new_text();
    wrapper.set_value(Value::String(value.to_string())).unwrap();
    wrapper
}

pub fn composite_ref() -> WrapperRef {
    new_composite()
}

/// Integer, text and composite types, keyed by literal type.
pub struct TestDomain;

impl BindingDomain for TestDomain {
    fn inferred_canonical_type(&self, literal: &LiteralType) -> Option<CanonicalType> {
        match literal {
            LiteralType::Short | LiteralType::Int | LiteralType::Long => Some(CanonicalType::of(&INTEGER)),
            LiteralType::String => Some(CanonicalType::of(&TEXT)),
            LiteralType::Any => Some(CanonicalType::of(&COMPOSITE)),
            _ => None,
        }
    }
}

// ============================================================================
// Converters
// ============================================================================

pub fn long_identity_spec() -> ConverterSpec {
    ConverterSpec::from_fns(
        "LongIdentity",
        TypeBound::Single(LiteralType::Long),
        TypeBound::Single(LiteralType::Long),
        Ok,
        Ok,
    )
}

pub fn text_identity_spec() -> ConverterSpec {
    ConverterSpec::from_fns(
        "TextIdentity",
        TypeBound::Single(LiteralType::String),
        TypeBound::Single(LiteralType::String),
        Ok,
        Ok,
    )
}

/// Stores a numeric code as its decimal text.
pub fn code_as_text_spec() -> ConverterSpec {
    ConverterSpec::from_fns(
        "CodeAsText",
        TypeBound::Single(LiteralType::Long),
        TypeBound::Single(LiteralType::String),
        |external| match external {
            Value::Long(code) => Ok(Value::String(code.to_string())),
            other => anyhow::bail!("expected a code, got {other}"),
        },
        |internal| match internal {
            Value::String(text) => Ok(Value::Long(text.parse()?)),
            other => anyhow::bail!("expected text, got {other}"),
        },
    )
}

// ============================================================================
// Models
// ============================================================================

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Account {
    pub id: Option<WrapperRef>,
    pub owner: String,
    pub balance: i32,
    pub legacy_code: i64,
    pub audit_log: Vec<String>,
}

impl PropertyContainer for Account {
    fn describe(schema: &mut ClassSchema<Self>) {
        schema
            .wrapper_field("id", &INTEGER, |a| &a.id, |a| &mut a.id)
            .primary_key();
        schema
            .field("owner", |a| &a.owner, |a| &mut a.owner)
            .visibility(Visibility::Public)
            .column("owner_name")
            .adapt(text_identity_spec());
        schema
            .field("balance", |a| &a.balance, |a| &mut a.balance)
            .adapt(long_identity_spec());
        schema
            .field("legacy_code", |a| &a.legacy_code, |a| &mut a.legacy_code)
            .visibility(Visibility::Protected)
            .adapt(code_as_text_spec());
        schema.synthetic("serial_version");
        schema
            .accessor_read_only("label", |a: &Account| format!("{} #{}", a.owner, a.balance))
            .adapt(text_identity_spec());
        schema
            .accessor_write_only("audit", |a: &mut Account, entry: String| a.audit_log.push(entry))
            .adapt(text_identity_spec());
    }
}

/// Same member name as [`Account`]'s key, on a distinct type.
#[derive(Debug, Default)]
pub struct Ledger {
    pub id: Option<WrapperRef>,
}

impl PropertyContainer for Ledger {
    fn describe(schema: &mut ClassSchema<Self>) {
        schema
            .wrapper_field("id", &INTEGER, |l| &l.id, |l| &mut l.id)
            .primary_key();
    }
}

/// Has one member (`memo`) that cannot be bound.
#[derive(Debug, Default)]
pub struct Invoice {
    pub number: Option<WrapperRef>,
    pub memo: String,
    pub total: i64,
}

impl PropertyContainer for Invoice {
    fn describe(schema: &mut ClassSchema<Self>) {
        schema
            .wrapper_field("number", &INTEGER, |i| &i.number, |i| &mut i.number)
            .primary_key();
        schema.field("memo", |i| &i.memo, |i| &mut i.memo);
        schema
            .field("total", |i| &i.total, |i| &mut i.total)
            .adapt(long_identity_spec());
    }
}

#[derive(Debug, Default)]
pub struct TwoKeys {
    pub first: Option<WrapperRef>,
    pub second: Option<WrapperRef>,
}

impl PropertyContainer for TwoKeys {
    fn describe(schema: &mut ClassSchema<Self>) {
        schema
            .wrapper_field("first", &INTEGER, |t| &t.first, |t| &mut t.first)
            .primary_key();
        schema
            .wrapper_field("second", &INTEGER, |t| &t.second, |t| &mut t.second)
            .primary_key();
    }
}

#[derive(Debug, Default)]
pub struct UnadaptedModel {
    pub note: String,
}

impl PropertyContainer for UnadaptedModel {
    fn describe(schema: &mut ClassSchema<Self>) {
        schema.field("note", |m| &m.note, |m| &mut m.note);
    }
}

#[derive(Debug, Default)]
pub struct AbstractConverterModel {
    pub value: String,
}

impl PropertyContainer for AbstractConverterModel {
    fn describe(schema: &mut ClassSchema<Self>) {
        schema
            .field("value", |m| &m.value, |m| &mut m.value)
            .adapt(ConverterSpec::abstract_converter(
                "AbstractText",
                TypeBound::Single(LiteralType::String),
                TypeBound::Single(LiteralType::String),
            ));
    }
}

#[derive(Debug, Default)]
pub struct MultiBoundModel {
    pub value: String,
}

impl PropertyContainer for MultiBoundModel {
    fn describe(schema: &mut ClassSchema<Self>) {
        schema
            .field("value", |m| &m.value, |m| &mut m.value)
            .adapt(ConverterSpec::from_fns(
                "MultiBound",
                TypeBound::Multi(vec![LiteralType::String, LiteralType::Bytes]),
                TypeBound::Single(LiteralType::String),
                Ok,
                Ok,
            ));
    }
}

#[derive(Debug, Default)]
pub struct WrapperBoundModel {
    pub value: i64,
}

impl PropertyContainer for WrapperBoundModel {
    fn describe(schema: &mut ClassSchema<Self>) {
        schema
            .field("value", |m| &m.value, |m| &mut m.value)
            .adapt(ConverterSpec::from_fns(
                "IntoWrapper",
                TypeBound::Single(LiteralType::Long),
                TypeBound::Single(LiteralType::Canonical(CanonicalType::of(&INTEGER))),
                Ok,
                Ok,
            ));
    }
}

/// Converter stores integers but the explicit canonical type is text.
#[derive(Debug, Default)]
pub struct IncompatibleExplicitModel {
    pub value: i64,
}

impl PropertyContainer for IncompatibleExplicitModel {
    fn describe(schema: &mut ClassSchema<Self>) {
        schema
            .field("value", |m| &m.value, |m| &mut m.value)
            .adapt_as(long_identity_spec(), &TEXT);
    }
}

/// Adapted wrapper member declared with an abstract canonical type.
#[derive(Debug, Default)]
pub struct AbstractMemberModel {
    pub reading: Option<WrapperRef>,
}

impl PropertyContainer for AbstractMemberModel {
    fn describe(schema: &mut ClassSchema<Self>) {
        schema
            .wrapper_field("reading", &NUMBER, |m| &m.reading, |m| &mut m.reading)
            .adapt(code_as_text_spec());
    }
}

/// Wrapper member adapted into another wrapper type.
#[derive(Debug, Default)]
pub struct Gauge {
    pub reading: Option<WrapperRef>,
}

impl PropertyContainer for Gauge {
    fn describe(schema: &mut ClassSchema<Self>) {
        schema
            .wrapper_field("reading", &INTEGER, |g| &g.reading, |g| &mut g.reading)
            .adapt(code_as_text_spec());
    }
}
