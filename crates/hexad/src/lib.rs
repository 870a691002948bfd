//! Meta crate that re-exports the Hexad layers with sensible defaults.
//! Downstream users can depend on this crate and opt into specific layers
//! via feature flags while keeping access to the underlying crates when
//! deeper integration is required.

#[cfg(feature = "common")]
pub use hexad_common as common;

#[cfg(feature = "parse")]
pub use hexad_parse as parse;

#[cfg(feature = "core")]
pub use hexad_core as core;

#[cfg(feature = "store")]
pub use hexad_store as store;

#[cfg(feature = "common")]
pub mod text;

#[cfg(feature = "common")]
pub use hexad_common::{CellValue, DataType, Grid, ScalarType, Schema, Shape};

#[cfg(feature = "parse")]
pub use hexad_parse::{parse_chunk_spec, parse_dimensions, parse_properties, parse_schema};

#[cfg(feature = "core")]
pub use hexad_core::{Classification, SelectionSpec, classify, is_available_for_create};

#[cfg(feature = "store")]
pub use hexad_store::{MemoryStore, Session, SessionConfig, StoreError};

#[cfg(feature = "json")]
pub use hexad_store::{JsonBackend, SaveDestination};
