//! Unit tests for the binding-types crate: the column types bound through
//! binding-core.

use binding_core::{
    BindError, BindingConfig, CanonicalType, ClassMetadata, ClassSchema, ConverterSpec,
    LiteralType, PropertyContainer, TypeBound, Value, WrapperRef,
};
use chrono::{TimeZone, Utc};

use crate::{
    boolean_value, date_value, integer_value, number_value, string_value, DbTypeDomain,
    EpochSeconds, NumericText, YesNoFlag, BOOLEAN, DATE, INTEGER, NUMBER, STRING,
};

#[derive(Debug, Default)]
struct Reading {
    id: Option<WrapperRef>,
    taken_at: i64,
    scale: i64,
    serial: i64,
    verified: String,
}

fn long_identity() -> ConverterSpec {
    ConverterSpec::from_fns(
        "LongIdentity",
        TypeBound::Single(LiteralType::Long),
        TypeBound::Single(LiteralType::Long),
        Ok,
        Ok,
    )
}

impl PropertyContainer for Reading {
    fn describe(schema: &mut ClassSchema<Self>) {
        schema
            .wrapper_field("id", &INTEGER, |r| &r.id, |r| &mut r.id)
            .primary_key();
        schema
            .field("taken_at", |r| &r.taken_at, |r| &mut r.taken_at)
            .adapt(ConverterSpec::of::<EpochSeconds>());
        schema
            .field("scale", |r| &r.scale, |r| &mut r.scale)
            .adapt_as(long_identity(), &NUMBER);
        schema
            .field("serial", |r| &r.serial, |r| &mut r.serial)
            .adapt(ConverterSpec::of::<NumericText>());
        schema
            .field("verified", |r| &r.verified, |r| &mut r.verified)
            .adapt(ConverterSpec::of::<YesNoFlag>());
    }
}

fn reading_metadata() -> ClassMetadata<Reading> {
    ClassMetadata::build(&DbTypeDomain::new(), &BindingConfig::fail_fast()).unwrap()
}

#[test]
fn test_canonical_types_inferred_from_converters() {
    let metadata = reading_metadata();
    let canonical = |name: &str| {
        metadata
            .property_definition_by_name(name)
            .unwrap()
            .unwrap()
            .canonical_type()
    };

    assert_eq!(canonical("id"), CanonicalType::of(&INTEGER));
    assert_eq!(canonical("taken_at"), CanonicalType::of(&DATE));
    assert_eq!(canonical("scale"), CanonicalType::of(&NUMBER));
    assert_eq!(canonical("serial"), CanonicalType::of(&STRING));
    assert_eq!(canonical("verified"), CanonicalType::of(&BOOLEAN));
}

#[test]
fn test_epoch_member_reads_as_date() {
    let metadata = reading_metadata();
    let taken_at = metadata.property_definition_by_name("taken_at").unwrap().unwrap();
    let mut reading = Reading {
        taken_at: 86_400,
        ..Reading::default()
    };

    let read = taken_at.read(&reading).unwrap().unwrap();
    assert_eq!(
        read.value(),
        Value::DateTime(Utc.with_ymd_and_hms(1970, 1, 2, 0, 0, 0).unwrap())
    );

    let written = date_value(Utc.with_ymd_and_hms(1970, 1, 1, 0, 1, 0).unwrap());
    taken_at.write(&mut reading, Some(written)).unwrap();
    assert_eq!(reading.taken_at, 60);
}

#[test]
fn test_long_member_stored_in_number_column() {
    let metadata = reading_metadata();
    let scale = metadata.property_definition_by_name("scale").unwrap().unwrap();
    let mut reading = Reading {
        scale: 7,
        ..Reading::default()
    };

    assert_eq!(
        scale.read(&reading).unwrap().unwrap().value(),
        Value::Double(7.0)
    );

    // the number column narrows back to i64 on the way out
    scale.write(&mut reading, Some(number_value(2.9))).unwrap();
    assert_eq!(reading.scale, 2);

    // adapted members take exactly their canonical type, not subtypes
    let err = scale
        .write(&mut reading, Some(integer_value(11)))
        .unwrap_err();
    assert!(matches!(err, BindError::IllegalArgument { .. }));
    assert_eq!(reading.scale, 2);
}

#[test]
fn test_text_column_and_flag_column() {
    let metadata = reading_metadata();
    let serial = metadata.property_definition_by_name("serial").unwrap().unwrap();
    let verified = metadata.property_definition_by_name("verified").unwrap().unwrap();
    let mut reading = Reading::default();

    serial.write(&mut reading, Some(string_value("0042"))).unwrap();
    assert_eq!(reading.serial, 42);
    assert_eq!(
        serial.read(&reading).unwrap().unwrap().value(),
        Value::String("42".into())
    );

    verified.write(&mut reading, Some(boolean_value(true))).unwrap();
    assert_eq!(reading.verified, "Y");
}

#[test]
fn test_wrong_column_type_rejected_on_write() {
    let metadata = reading_metadata();
    let serial = metadata.property_definition_by_name("serial").unwrap().unwrap();
    let mut reading = Reading::default();

    let err = serial
        .write(&mut reading, Some(boolean_value(false)))
        .unwrap_err();
    assert!(matches!(err, BindError::IllegalArgument { .. }));
    assert_eq!(reading.serial, 0);
}
