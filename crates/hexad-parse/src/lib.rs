pub mod dims;
pub mod heading;
pub mod properties;
pub mod types;
pub mod typespec;

pub use dims::{parse_chunk_spec, parse_dimensions};
pub use heading::{escape, parse_schema, render_schema, split_escaped};
pub use properties::{CreationProperties, PropertyKey, parse_properties};
pub use types::{ChunkError, DimsError, PropertyError, SchemaError};
pub use typespec::{TypeDescriptor, parse_type_spec};

/// Single-field form of [`parse_type_spec`], used where only one type is
/// needed (plain array creation).
pub fn parse_scalar_or_array_type(spec: &str) -> Result<TypeDescriptor, SchemaError> {
    parse_type_spec(spec)
}

// Re-export common types
pub use hexad_common::{ArrayType, DataType, Field, Schema, ScalarType, Shape};
