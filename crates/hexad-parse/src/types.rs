use hexad_common::{ShapeError, TypeError};

/// Errors from schema headings and type specifications.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("empty heading")]
    EmptyHeading,
    #[error("empty value in heading at token {index}")]
    EmptyToken { index: usize },
    #[error("heading must hold name/type pairs, found {count} values")]
    MalformedHeading { count: usize },
    #[error("invalid type specification `{0}`")]
    InvalidTypeSpec(String),
    #[error("unsupported scalar type `{0}`")]
    UnknownType(String),
    #[error("invalid array dimensions `{0}`")]
    InvalidArrayDims(String),
    #[error("duplicate column name `{0}`")]
    DuplicateField(String),
    #[error("`{0}` ends with a backslash, which a heading cannot hold")]
    TrailingEscape(String),
}

impl From<TypeError> for SchemaError {
    fn from(value: TypeError) -> Self {
        match value {
            TypeError::DuplicateField(name) => SchemaError::DuplicateField(name),
            TypeError::EmptySchema => SchemaError::MalformedHeading { count: 0 },
            TypeError::TrailingEscape(text) => SchemaError::TrailingEscape(text),
            other => SchemaError::InvalidArrayDims(other.to_string()),
        }
    }
}

/// Errors from size grids handed in for array creation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DimsError {
    #[error("size must be a single row or a single column")]
    Orientation,
    #[error("rank {0} outside 1..=32")]
    Rank(usize),
    #[error("dimension {index} is zero")]
    ZeroExtent { index: usize },
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

/// Errors from bracketed chunk specifications.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChunkError {
    #[error("chunk dimensions must be enclosed in brackets: `{0}`")]
    Brackets(String),
    #[error("invalid chunk dimension `{0}`")]
    Entry(String),
    #[error("no chunk dimensions given")]
    Empty,
}

/// Errors from `KEY,VALUE` creation property lists.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropertyError {
    #[error("property list must hold key/value pairs, found {0} values")]
    OddTokens(usize),
    #[error("unknown property `{0}`")]
    UnknownKey(String),
    #[error("property `{0}` given twice")]
    DuplicateKey(String),
    #[error("unsupported datatype: {0}")]
    Datatype(#[source] SchemaError),
    #[error("invalid chunk dimensions: {0}")]
    Chunk(#[source] ChunkError),
    #[error("invalid compression level `{0}` ([0-9])")]
    Deflate(String),
    #[error("`{key}` expects true or false, found `{value}`")]
    Boolean { key: String, value: String },
}
