//! The element type universe of the store.
//!
//! - **`ScalarType`** : the fixed catalog of scalar element types
//! - **`ArrayType`**  : a scalar wrapped in a fixed, non-empty shape
//! - **`DataType`**   : what a leaf (or a compound field) holds
//! - **`Schema`**     : ordered, duplicate-free compound field list
//!
//! Types are immutable value descriptors. They are built by the parsers in
//! `hexad-parse` (or by inference from written data) and never mutated.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum rank of any array or array-typed field.
pub const MAX_RANK: usize = 32;

/// Largest number of scalars in one array-typed value, the widest row a
/// worksheet can show.
pub const MAX_ARRAY_LEN: u64 = 16_384;

/// Errors raised while assembling type descriptors from already-parsed parts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    #[error("array rank {0} outside 1..=32")]
    Rank(usize),
    #[error("array dimension {index} must be positive")]
    ZeroExtent { index: usize },
    #[error("array type holds more than {limit} elements")]
    TooLarge { limit: u64 },
    #[error("duplicate field name `{0}`")]
    DuplicateField(String),
    #[error("compound type has no fields")]
    EmptySchema,
    /// A heading cannot spell a backslash directly before a comma.
    #[error("field name or fill `{0}` ends with a backslash")]
    TrailingEscape(String),
}

/// All supported scalar element types.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScalarType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    /// Variable-length string.
    String,
}

/// Case-insensitive keywords accepted in type specifications.
static KEYWORDS: &[(&str, ScalarType)] = &[
    ("BYTE", ScalarType::Int8),
    ("DOUBLE", ScalarType::Float64),
    ("FLOAT", ScalarType::Float32),
    ("FLOAT32", ScalarType::Float32),
    ("FLOAT64", ScalarType::Float64),
    ("INT", ScalarType::Int32),
    ("INT8", ScalarType::Int8),
    ("INT16", ScalarType::Int16),
    ("INT32", ScalarType::Int32),
    ("INT64", ScalarType::Int64),
    ("LONG", ScalarType::Int64),
    ("SHORT", ScalarType::Int16),
    ("SINGLE", ScalarType::Float32),
    ("STRING", ScalarType::String),
    ("UBYTE", ScalarType::UInt8),
    ("UINT", ScalarType::UInt32),
    ("UINT8", ScalarType::UInt8),
    ("UINT16", ScalarType::UInt16),
    ("UINT32", ScalarType::UInt32),
    ("UINT64", ScalarType::UInt64),
    ("ULONG", ScalarType::UInt64),
    ("USHORT", ScalarType::UInt16),
];

impl ScalarType {
    pub const ALL: [ScalarType; 11] = [
        ScalarType::Int8,
        ScalarType::Int16,
        ScalarType::Int32,
        ScalarType::Int64,
        ScalarType::UInt8,
        ScalarType::UInt16,
        ScalarType::UInt32,
        ScalarType::UInt64,
        ScalarType::Float32,
        ScalarType::Float64,
        ScalarType::String,
    ];

    /// Look up a catalog keyword, ignoring ASCII case and surrounding whitespace.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let wanted = keyword.trim();
        KEYWORDS
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(wanted))
            .map(|(_, ty)| *ty)
    }

    /// Every keyword the catalog accepts, in catalog order.
    pub fn keywords() -> impl Iterator<Item = &'static str> {
        KEYWORDS.iter().map(|(k, _)| *k)
    }

    /// Canonical lower-case name; always accepted by [`ScalarType::from_keyword`].
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::String => "string",
        }
    }

    pub const fn is_signed_integer(self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    pub const fn is_unsigned_integer(self) -> bool {
        matches!(self, Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64)
    }

    pub const fn is_integer(self) -> bool {
        self.is_signed_integer() || self.is_unsigned_integer()
    }

    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Storage width in bits; `None` for variable-length strings.
    pub const fn bit_width(self) -> Option<u32> {
        match self {
            Self::Int8 | Self::UInt8 => Some(8),
            Self::Int16 | Self::UInt16 => Some(16),
            Self::Int32 | Self::UInt32 | Self::Float32 => Some(32),
            Self::Int64 | Self::UInt64 | Self::Float64 => Some(64),
            Self::String => None,
        }
    }

    /// Inclusive value range of an integer type, widened to `i128`.
    pub const fn integer_range(self) -> Option<(i128, i128)> {
        match self {
            Self::Int8 => Some((i8::MIN as i128, i8::MAX as i128)),
            Self::Int16 => Some((i16::MIN as i128, i16::MAX as i128)),
            Self::Int32 => Some((i32::MIN as i128, i32::MAX as i128)),
            Self::Int64 => Some((i64::MIN as i128, i64::MAX as i128)),
            Self::UInt8 => Some((0, u8::MAX as i128)),
            Self::UInt16 => Some((0, u16::MAX as i128)),
            Self::UInt32 => Some((0, u32::MAX as i128)),
            Self::UInt64 => Some((0, u64::MAX as i128)),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A scalar element type with a fixed shape, e.g. `float32[3 3]`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawArrayType"))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayType {
    element: ScalarType,
    dims: Vec<u64>,
}

impl ArrayType {
    pub fn new(element: ScalarType, dims: Vec<u64>) -> Result<Self, TypeError> {
        if dims.is_empty() || dims.len() > MAX_RANK {
            return Err(TypeError::Rank(dims.len()));
        }
        if let Some(index) = dims.iter().position(|d| *d == 0) {
            return Err(TypeError::ZeroExtent { index });
        }
        let len = dims.iter().try_fold(1u64, |acc, d| acc.checked_mul(*d));
        if !len.is_some_and(|n| n <= MAX_ARRAY_LEN) {
            return Err(TypeError::TooLarge {
                limit: MAX_ARRAY_LEN,
            });
        }
        Ok(Self { element, dims })
    }

    pub fn element(&self) -> ScalarType {
        self.element
    }

    pub fn dims(&self) -> &[u64] {
        &self.dims
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Number of scalars per array value.
    pub fn len(&self) -> u64 {
        self.dims.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawArrayType {
    element: ScalarType,
    dims: Vec<u64>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawArrayType> for ArrayType {
    type Error = TypeError;

    fn try_from(raw: RawArrayType) -> Result<Self, Self::Error> {
        ArrayType::new(raw.element, raw.dims)
    }
}

impl fmt::Display for ArrayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.element)?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{d}")?;
        }
        f.write_str("]")
    }
}

/// What a leaf or a compound field holds.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "lowercase"))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    Scalar { scalar: ScalarType },
    Array { array: ArrayType },
    Compound { schema: Schema },
}

impl DataType {
    pub const fn scalar(scalar: ScalarType) -> Self {
        DataType::Scalar { scalar }
    }

    pub fn array(array: ArrayType) -> Self {
        DataType::Array { array }
    }

    pub fn compound(schema: Schema) -> Self {
        DataType::Compound { schema }
    }

    pub fn as_schema(&self) -> Option<&Schema> {
        match self {
            DataType::Compound { schema } => Some(schema),
            _ => None,
        }
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, DataType::Compound { .. })
    }

    /// Number of scalar cells one element occupies when laid out flat
    /// (array fields expand, compound fields concatenate).
    pub fn width(&self) -> usize {
        match self {
            DataType::Scalar { .. } => 1,
            DataType::Array { array } => array.len() as usize,
            DataType::Compound { schema } => schema.fields().iter().map(|f| f.dtype.width()).sum(),
        }
    }
}

impl From<ScalarType> for DataType {
    fn from(value: ScalarType) -> Self {
        DataType::scalar(value)
    }
}

impl From<ArrayType> for DataType {
    fn from(value: ArrayType) -> Self {
        DataType::array(value)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Scalar { scalar } => scalar.fmt(f),
            DataType::Array { array } => array.fmt(f),
            DataType::Compound { schema } => schema.fmt(f),
        }
    }
}

/// One named compound field, in declaration order.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
    pub dtype: DataType,
    /// Fill literal exactly as written; not range-checked against `dtype`.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub fill: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, dtype: impl Into<DataType>) -> Self {
        Self {
            name: name.into(),
            dtype: dtype.into(),
            fill: None,
        }
    }

    pub fn with_fill(mut self, fill: impl Into<String>) -> Self {
        self.fill = Some(fill.into());
        self
    }
}

/// Ordered, duplicate-free list of compound fields.
///
/// Order is significant: it is the on-disk field order and the column
/// order when a table is rendered.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<Field>", into = "Vec<Field>"))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Result<Self, TypeError> {
        if fields.is_empty() {
            return Err(TypeError::EmptySchema);
        }
        let mut seen = std::collections::HashSet::with_capacity(fields.len());
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(TypeError::DuplicateField(field.name.clone()));
            }
            let mut texts = std::iter::once(field.name.as_str()).chain(field.fill.as_deref());
            if let Some(text) = texts.find(|t| t.ends_with('\\')) {
                return Err(TypeError::TrailingEscape(text.to_string()));
            }
        }
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

impl TryFrom<Vec<Field>> for Schema {
    type Error = TypeError;

    fn try_from(value: Vec<Field>) -> Result<Self, Self::Error> {
        Schema::new(value)
    }
}

impl From<Schema> for Vec<Field> {
    fn from(value: Schema) -> Self {
        value.fields
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", field.name, field.dtype)?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(ScalarType::from_keyword("double"), Some(ScalarType::Float64));
        assert_eq!(ScalarType::from_keyword("Single"), Some(ScalarType::Float32));
        assert_eq!(ScalarType::from_keyword(" ushort "), Some(ScalarType::UInt16));
        assert_eq!(ScalarType::from_keyword("quad"), None);
    }

    #[test]
    fn canonical_names_resolve_to_themselves() {
        for ty in ScalarType::ALL {
            assert_eq!(ScalarType::from_keyword(ty.name()), Some(ty), "{ty}");
        }
    }

    #[test]
    fn every_keyword_maps_into_catalog() {
        assert_eq!(ScalarType::keywords().count(), 22);
        for kw in ScalarType::keywords() {
            assert!(ScalarType::from_keyword(kw).is_some(), "{kw}");
        }
    }

    #[test]
    fn array_type_rejects_bad_shapes() {
        assert_eq!(
            ArrayType::new(ScalarType::Int8, vec![]),
            Err(TypeError::Rank(0))
        );
        assert_eq!(
            ArrayType::new(ScalarType::Int8, vec![2, 0]),
            Err(TypeError::ZeroExtent { index: 1 })
        );
        assert_eq!(
            ArrayType::new(ScalarType::Int8, vec![1; 33]),
            Err(TypeError::Rank(33))
        );
        let ok = ArrayType::new(ScalarType::Float32, vec![3, 3]).unwrap();
        assert_eq!(ok.to_string(), "float32[3 3]");
        assert_eq!(ok.len(), 9);
    }

    #[test]
    fn array_type_element_count_is_capped() {
        let limit = MAX_ARRAY_LEN;
        assert!(ArrayType::new(ScalarType::Int32, vec![128, 128]).is_ok());
        assert_eq!(
            ArrayType::new(ScalarType::Int32, vec![100_000, 100_000]),
            Err(TypeError::TooLarge { limit })
        );
        assert_eq!(
            ArrayType::new(ScalarType::Int32, vec![1 << 32, 1 << 32]),
            Err(TypeError::TooLarge { limit })
        );
    }

    #[test]
    fn schema_rejects_duplicates_and_keeps_order() {
        let err = Schema::new(vec![
            Field::new("A", ScalarType::UInt8),
            Field::new("A", ScalarType::Float64),
        ])
        .unwrap_err();
        assert_eq!(err, TypeError::DuplicateField("A".into()));

        let schema = Schema::new(vec![
            Field::new("z", ScalarType::UInt8),
            Field::new("a", ArrayType::new(ScalarType::Float32, vec![2]).unwrap()),
        ])
        .unwrap();
        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["z", "a"]);
        assert_eq!(DataType::compound(schema.clone()).width(), 3);
        assert_eq!(schema.to_string(), "{z: uint8, a: float32[2]}");
    }

    #[test]
    fn schema_rejects_trailing_backslash() {
        let err = Schema::new(vec![
            Field::new("a\\", ScalarType::Int32),
            Field::new("b", ScalarType::Int32),
        ])
        .unwrap_err();
        assert_eq!(err, TypeError::TrailingEscape("a\\".into()));

        let err = Schema::new(vec![Field::new("s", ScalarType::String).with_fill("x\\")])
            .unwrap_err();
        assert_eq!(err, TypeError::TrailingEscape("x\\".into()));

        assert!(Schema::new(vec![Field::new("a\\b", ScalarType::Int32)]).is_ok());
    }
}
