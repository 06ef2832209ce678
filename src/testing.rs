//! Model fixtures for integration tests
//!
//! Each module declares a few bindable types over the database column types,
//! covering plain wrapper members, adapted members, identity tags and
//! self-referencing wrapper graphs.

pub mod customers;
pub mod graph;
pub mod orders;
pub mod twins;

pub use customers::{Customer, Region};
pub use graph::{graph_node, Diagram, GraphNode, GRAPH};
pub use orders::{long_identity, Order};
pub use twins::{DuplicateKeys, Left, PartlyBindable, Right};

/// Installs a `RUST_LOG`-driven subscriber writing to the test output.
///
/// Safe to call from every test; only the first call installs it.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
