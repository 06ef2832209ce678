//! Property-binding library
//!
//! Discovers the data members of application types, builds cached metadata
//! describing each member's storage-facing canonical type, and adapts member
//! values to and from that canonical type through validated converters.
//!
//! # Crates
//!
//! - `binding_core` - member discovery, adaptation and metadata caching
//!   (re-exported at the root of this crate)
//! - `binding_types` - database column types and converters (re-exported as
//!   [`db`])
//!
//! # Usage
//!
//! ```ignore
//! use property_binding::{db::DbTypeDomain, BindingConfig, MetadataFactory, RwLock};
//!
//! let factory = MetadataFactory::new(DbTypeDomain::new(), BindingConfig::default())?;
//! let customer = factory.class_metadata_for::<Customer>()?;
//! for definition in customer.property_definitions()? {
//!     println!("{definition} -> column {}", definition.column_name());
//! }
//!
//! let instance = factory.instance_for(Arc::new(RwLock::new(Customer::default())))?;
//! let name = instance.property_by_name("name").unwrap();
//! name.write(Some(db::string_value("Ada")))?;
//! ```

pub mod testing;

pub use binding_core::*;

// Re-export the database column types for convenience
pub use binding_types as db;
