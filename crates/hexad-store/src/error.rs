//! Errors surfaced by the session layer.
//!
//! Parse, namespace and selection failures keep their own types and are
//! wrapped transparently; the front end decides how to show them.

use hexad_common::{ShapeError, ValueError};
use hexad_core::{Blocker, NamespaceError, SelectionError};
use hexad_parse::{DimsError, PropertyError, PropertyKey, SchemaError};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Dims(#[from] DimsError),
    #[error(transparent)]
    Property(#[from] PropertyError),
    #[error(transparent)]
    Namespace(#[from] NamespaceError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error("unable to create an object at `{path}`: {reason}")]
    PathUnavailable { path: String, reason: Blocker },
    #[error("invalid location `{0}`")]
    NotFound(String),
    #[error("the object at `{path}` is not {expected}")]
    WrongKind {
        path: String,
        expected: &'static str,
    },
    #[error("unsupported element type {0}")]
    UnsupportedType(String),
    #[error("chunk rank {found} does not match array rank {expected}")]
    ChunkRank { expected: usize, found: usize },
    #[error("property {0} does not apply to tables")]
    PropertyNotApplicable(PropertyKey),
    #[error("arrays of rank {0} cannot be shown in a grid")]
    UnsupportedRank(usize),
    #[error("the data must be a non-empty rectangular grid")]
    RaggedGrid,
    #[error("unknown column `{0}`")]
    UnknownColumn(String),
    #[error("column `{0}` given twice")]
    DuplicateColumn(String),
    #[error("no attribute `{name}` on `{path}`")]
    NoSuchAttribute { path: String, name: String },
    #[error("empty attribute name")]
    EmptyAttributeName,
    #[error("an empty cell cannot be stored")]
    EmptyValue,
    #[error("{rows} rows exceed the worksheet limit of {limit}")]
    TooManyRows { rows: usize, limit: usize },
    #[error("{cols} columns exceed the worksheet limit of {limit}")]
    TooManyColumns { cols: usize, limit: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "json")]
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;
