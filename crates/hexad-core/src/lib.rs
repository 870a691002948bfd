//! Addressing and selection for the Hexad array-store front end.
//!
//! * [`namespace`] – capability traits a hierarchical store implements
//! * [`resolver`] – path classification and creation availability
//! * [`hyperslab`] – read/write/append coordinate normalization

pub mod hyperslab;
pub mod namespace;
pub mod resolver;

pub use hyperslab::{
    DimSelection, Hyperslab, SelectionError, SelectionSpec, WritePlan, normalize_append,
    normalize_read, normalize_write,
};
pub use namespace::{ArrayStore, LeafSpec, Namespace, NamespaceError};
pub use resolver::{
    Availability, Blocker, Classification, availability, classify, is_available_for_create,
};
