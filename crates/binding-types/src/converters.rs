//! Ready-made converters for members whose Rust type differs from the column
//! type that stores them.

use binding_core::{Converter, DeclaredConverter, LiteralType, TypeBound, Value};
use chrono::{DateTime, Utc};

/// Stores an `i64` member in a `string` column as decimal text.
#[derive(Debug, Default)]
pub struct NumericText;

impl Converter for NumericText {
    fn to_internal(&self, external: Value) -> anyhow::Result<Value> {
        match external.as_i64() {
            Some(n) => Ok(Value::String(n.to_string())),
            None => anyhow::bail!("expected an integer, got {external}"),
        }
    }

    fn to_external(&self, internal: Value) -> anyhow::Result<Value> {
        match internal.as_str() {
            Some(text) => Ok(Value::Long(text.trim().parse()?)),
            None => anyhow::bail!("expected text, got {internal}"),
        }
    }
}

impl DeclaredConverter for NumericText {
    const NAME: &'static str = "NumericText";

    fn external_bound() -> TypeBound {
        TypeBound::Single(LiteralType::Long)
    }

    fn internal_bound() -> TypeBound {
        TypeBound::Single(LiteralType::String)
    }
}

/// Stores Unix epoch seconds (`i64`) in a `date` column.
#[derive(Debug, Default)]
pub struct EpochSeconds;

impl Converter for EpochSeconds {
    fn to_internal(&self, external: Value) -> anyhow::Result<Value> {
        let Some(seconds) = external.as_i64() else {
            anyhow::bail!("expected epoch seconds, got {external}");
        };
        match DateTime::<Utc>::from_timestamp(seconds, 0) {
            Some(dt) => Ok(Value::DateTime(dt)),
            None => anyhow::bail!("epoch seconds {seconds} out of range"),
        }
    }

    fn to_external(&self, internal: Value) -> anyhow::Result<Value> {
        match internal.as_datetime() {
            Some(dt) => Ok(Value::Long(dt.timestamp())),
            None => anyhow::bail!("expected a date, got {internal}"),
        }
    }
}

impl DeclaredConverter for EpochSeconds {
    const NAME: &'static str = "EpochSeconds";

    fn external_bound() -> TypeBound {
        TypeBound::Single(LiteralType::Long)
    }

    fn internal_bound() -> TypeBound {
        TypeBound::Single(LiteralType::DateTime)
    }
}

/// Stores a `"Y"`/`"N"` flag member in a `boolean` column.
#[derive(Debug, Default)]
pub struct YesNoFlag;

impl Converter for YesNoFlag {
    fn to_internal(&self, external: Value) -> anyhow::Result<Value> {
        match external.as_str().map(str::trim) {
            Some("Y") | Some("y") => Ok(Value::Bool(true)),
            Some("N") | Some("n") => Ok(Value::Bool(false)),
            _ => anyhow::bail!("expected Y or N, got {external}"),
        }
    }

    fn to_external(&self, internal: Value) -> anyhow::Result<Value> {
        match internal.as_bool() {
            Some(true) => Ok(Value::String("Y".into())),
            Some(false) => Ok(Value::String("N".into())),
            None => anyhow::bail!("expected a boolean, got {internal}"),
        }
    }
}

impl DeclaredConverter for YesNoFlag {
    const NAME: &'static str = "YesNoFlag";

    fn external_bound() -> TypeBound {
        TypeBound::Single(LiteralType::String)
    }

    fn internal_bound() -> TypeBound {
        TypeBound::Single(LiteralType::Bool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_numeric_text() {
        let converter = NumericText;
        assert_eq!(
            converter.to_internal(Value::Long(-42)).unwrap(),
            Value::String("-42".into())
        );
        assert_eq!(
            converter.to_external(Value::String("17".into())).unwrap(),
            Value::Long(17)
        );
        assert!(converter.to_external(Value::String("x".into())).is_err());
    }

    #[test]
    fn test_epoch_seconds() {
        let converter = EpochSeconds;
        let dt = Utc.with_ymd_and_hms(2001, 9, 9, 1, 46, 40).unwrap();
        assert_eq!(
            converter.to_internal(Value::Long(1_000_000_000)).unwrap(),
            Value::DateTime(dt)
        );
        assert_eq!(
            converter.to_external(Value::DateTime(dt)).unwrap(),
            Value::Long(1_000_000_000)
        );
        assert!(converter.to_internal(Value::Long(i64::MAX)).is_err());
    }

    #[test]
    fn test_yes_no_flag() {
        let converter = YesNoFlag;
        assert_eq!(
            converter.to_internal(Value::String("Y".into())).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            converter.to_external(Value::Bool(false)).unwrap(),
            Value::String("N".into())
        );
        assert!(converter.to_internal(Value::String("maybe".into())).is_err());
    }
}
