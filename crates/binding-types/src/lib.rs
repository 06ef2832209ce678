//! Database column types for property-binding.
//!
//! This crate provides one concrete binding domain: canonical value-wrapper
//! types modelled on database columns, the literal → column inference table,
//! and converters for common representation mismatches.
//!
//! # Modules
//!
//! - [`wrappers`] - `string`, `number`, `integer`, `date` and `boolean` columns
//! - [`domain`] - [`DbTypeDomain`], the inference table
//! - [`converters`] - [`NumericText`], [`EpochSeconds`], [`YesNoFlag`]
//!
//! # Example
//!
//! ```ignore
//! use binding_core::{BindingConfig, MetadataFactory, RwLock};
//! use binding_types::{integer_value, DbTypeDomain};
//!
//! let factory = MetadataFactory::new(DbTypeDomain::new(), BindingConfig::default())?;
//! let instance = factory.instance_for(Arc::new(RwLock::new(Customer::default())))?;
//! instance.property_by_name("year").unwrap().write(Some(integer_value(1999)))?;
//! ```

pub mod converters;
pub mod domain;
pub mod wrappers;

#[cfg(test)]
mod tests;

pub use converters::{EpochSeconds, NumericText, YesNoFlag};
pub use domain::DbTypeDomain;
pub use wrappers::{
    boolean_value, date_value, integer_value, number_value, string_value, DbKind, DbValue,
    BOOLEAN, DATE, INTEGER, NUMBER, STRING,
};
