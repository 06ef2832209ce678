//! Canonical value-wrapper types for database columns.
//!
//! Each wrapper holds one nullable literal and accepts a few looser inputs on
//! `set_value`, the way a column type accepts driver values:
//!
//! | Type      | Stores     | Also accepts                        |
//! |-----------|------------|-------------------------------------|
//! | `string`  | `String`   |                                     |
//! | `number`  | `f64`      | any integer or float, numeric text  |
//! | `integer` | `i64`      | `i16`, `i32`, integer text          |
//! | `date`    | `DateTime` | RFC 3339 text                       |
//! | `boolean` | `bool`     | `"true"` / `"false"`                |
//!
//! `integer` is-a `number`.

use std::sync::Arc;

use binding_core::{
    AttachToken, BindError, CanonicalType, CanonicalTypeInfo, CanonicalValue, LiteralType,
    PropertyInfo, Result, Value, WrapperCore, WrapperRef,
};
use chrono::{DateTime, Utc};

pub static STRING: CanonicalTypeInfo = CanonicalTypeInfo {
    name: "string",
    literal_type: LiteralType::String,
    parent: None,
    constructor: Some(new_string),
};

pub static NUMBER: CanonicalTypeInfo = CanonicalTypeInfo {
    name: "number",
    literal_type: LiteralType::Double,
    parent: None,
    constructor: Some(new_number),
};

pub static INTEGER: CanonicalTypeInfo = CanonicalTypeInfo {
    name: "integer",
    literal_type: LiteralType::Long,
    parent: Some(&NUMBER),
    constructor: Some(new_integer),
};

pub static DATE: CanonicalTypeInfo = CanonicalTypeInfo {
    name: "date",
    literal_type: LiteralType::DateTime,
    parent: None,
    constructor: Some(new_date),
};

pub static BOOLEAN: CanonicalTypeInfo = CanonicalTypeInfo {
    name: "boolean",
    literal_type: LiteralType::Bool,
    parent: None,
    constructor: Some(new_boolean),
};

/// Which of the column types a [`DbValue`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbKind {
    String,
    Number,
    Integer,
    Date,
    Boolean,
}

impl DbKind {
    pub fn info(self) -> &'static CanonicalTypeInfo {
        match self {
            Self::String => &STRING,
            Self::Number => &NUMBER,
            Self::Integer => &INTEGER,
            Self::Date => &DATE,
            Self::Boolean => &BOOLEAN,
        }
    }

    pub fn canonical_type(self) -> CanonicalType {
        CanonicalType::of(self.info())
    }

    /// Normalises `value` to the literal this kind stores.
    fn coerce(self, value: Value) -> Result<Value> {
        let coerced = match (self, value) {
            (Self::String, Value::String(s)) => Value::String(s),

            (Self::Integer, Value::String(text)) => {
                let parsed = text.trim().parse::<i64>().map_err(|e| {
                    BindError::illegal_argument(format!("Cannot parse {text:?} as an integer: {e}"))
                })?;
                tracing::trace!(%text, parsed, "Parsed integer text");
                Value::Long(parsed)
            }
            (Self::Integer, other) => match other.as_i64() {
                Some(v) => Value::Long(v),
                None => return Err(self.rejects(&other)),
            },

            (Self::Number, Value::String(text)) => {
                let parsed = text.trim().parse::<f64>().map_err(|e| {
                    BindError::illegal_argument(format!("Cannot parse {text:?} as a number: {e}"))
                })?;
                tracing::trace!(%text, parsed, "Parsed number text");
                Value::Double(parsed)
            }
            (Self::Number, other) => match other.as_f64() {
                Some(v) => Value::Double(v),
                None => return Err(self.rejects(&other)),
            },

            (Self::Date, Value::DateTime(dt)) => Value::DateTime(dt),
            (Self::Date, Value::String(text)) => {
                let parsed = DateTime::parse_from_rfc3339(text.trim()).map_err(|e| {
                    BindError::illegal_argument(format!("Cannot parse {text:?} as a date: {e}"))
                })?;
                Value::DateTime(parsed.with_timezone(&Utc))
            }

            (Self::Boolean, Value::Bool(b)) => Value::Bool(b),
            (Self::Boolean, Value::String(text)) => match text.trim() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => {
                    return Err(BindError::illegal_argument(format!(
                        "Cannot parse {text:?} as a boolean"
                    )))
                }
            },

            (_, other) => return Err(self.rejects(&other)),
        };
        Ok(coerced)
    }

    fn rejects(self, value: &Value) -> BindError {
        BindError::illegal_argument(format!(
            "Cannot store {} in a {}",
            value.type_name(),
            self.info().name
        ))
    }
}

/// A database column value.
#[derive(Debug, Clone)]
pub struct DbValue {
    kind: DbKind,
    core: WrapperCore,
}

impl DbValue {
    /// A null value of `kind`.
    pub fn new(kind: DbKind) -> Self {
        Self {
            kind,
            core: WrapperCore::new(),
        }
    }

    pub fn kind(&self) -> DbKind {
        self.kind
    }

    /// Shares a new null value of `kind`.
    pub fn new_ref(kind: DbKind) -> WrapperRef {
        WrapperRef::new(Self::new(kind))
    }

    fn with_literal(kind: DbKind, literal: Value) -> WrapperRef {
        WrapperRef::new(Self {
            kind,
            core: WrapperCore::with_literal(literal),
        })
    }
}

impl CanonicalValue for DbValue {
    fn canonical_type(&self) -> CanonicalType {
        self.kind.canonical_type()
    }

    fn value(&self) -> Value {
        self.core.literal().clone()
    }

    fn set_value(&mut self, value: Value) -> Result<()> {
        if value.is_null() {
            self.core.clear();
            return Ok(());
        }
        let coerced = self.kind.coerce(value)?;
        self.core.set_literal(coerced);
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

fn new_string() -> WrapperRef {
    DbValue::new_ref(DbKind::String)
}

fn new_number() -> WrapperRef {
    DbValue::new_ref(DbKind::Number)
}

fn new_integer() -> WrapperRef {
    DbValue::new_ref(DbKind::Integer)
}

fn new_date() -> WrapperRef {
    DbValue::new_ref(DbKind::Date)
}

fn new_boolean() -> WrapperRef {
    DbValue::new_ref(DbKind::Boolean)
}

// ============================================================================
// Constructors for populated values
// ============================================================================

pub fn string_value(value: impl Into<String>) -> WrapperRef {
    DbValue::with_literal(DbKind::String, Value::String(value.into()))
}

pub fn number_value(value: f64) -> WrapperRef {
    DbValue::with_literal(DbKind::Number, Value::Double(value))
}

pub fn integer_value(value: i64) -> WrapperRef {
    DbValue::with_literal(DbKind::Integer, Value::Long(value))
}

pub fn date_value(value: DateTime<Utc>) -> WrapperRef {
    DbValue::with_literal(DbKind::Date, Value::DateTime(value))
}

pub fn boolean_value(value: bool) -> WrapperRef {
    DbValue::with_literal(DbKind::Boolean, Value::Bool(value))
}
