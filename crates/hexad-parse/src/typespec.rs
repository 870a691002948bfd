use std::fmt;

use hexad_common::{ArrayType, DataType, MAX_RANK, ScalarType};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::SchemaError;

const FILL_SEPARATOR: char = ':';

/// A scalar or array type with an optional fill literal, as written in a
/// heading or a `DATATYPE` property.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    pub dtype: DataType,
    pub fill: Option<String>,
}

impl TypeDescriptor {
    pub fn new(dtype: impl Into<DataType>) -> Self {
        Self {
            dtype: dtype.into(),
            fill: None,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dtype)?;
        if let Some(fill) = &self.fill {
            write!(f, "{FILL_SEPARATOR}{fill}")?;
        }
        Ok(())
    }
}

/// Parse `BASE[:fill]` or `BASE[d1 d2 ...][:fill]`. The base keyword is
/// matched case-insensitively; the fill is kept as text.
pub fn parse_type_spec(spec: &str) -> Result<TypeDescriptor, SchemaError> {
    let mut parts = spec.split(FILL_SEPARATOR);
    let type_part = parts.next().unwrap_or_default().trim();
    let fill = parts.next().map(str::to_string);
    if parts.next().is_some() {
        return Err(SchemaError::InvalidTypeSpec(spec.to_string()));
    }
    if type_part.is_empty() || fill.as_deref() == Some("") {
        return Err(SchemaError::InvalidTypeSpec(spec.to_string()));
    }

    let dtype = match type_part.find('[') {
        None => {
            if type_part.contains(']') {
                return Err(SchemaError::InvalidTypeSpec(spec.to_string()));
            }
            DataType::scalar(lookup_base(type_part)?)
        }
        Some(0) => return Err(SchemaError::InvalidTypeSpec(spec.to_string())),
        Some(open) => {
            let Some(inner) = type_part[open + 1..].strip_suffix(']') else {
                return Err(SchemaError::InvalidTypeSpec(spec.to_string()));
            };
            let base = lookup_base(&type_part[..open])?;
            let dims = parse_array_dims(inner)?;
            DataType::array(ArrayType::new(base, dims)?)
        }
    };

    Ok(TypeDescriptor { dtype, fill })
}

fn lookup_base(base: &str) -> Result<ScalarType, SchemaError> {
    ScalarType::from_keyword(base).ok_or_else(|| SchemaError::UnknownType(base.trim().to_string()))
}

/// Whitespace-separated positive extents, rank `1..=32`.
fn parse_array_dims(text: &str) -> Result<Vec<u64>, SchemaError> {
    let invalid = || SchemaError::InvalidArrayDims(text.to_string());
    let dims = text
        .split_whitespace()
        .map(|t| t.parse::<u64>().ok().filter(|d| *d > 0))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(invalid)?;
    if dims.is_empty() || dims.len() > MAX_RANK {
        return Err(invalid());
    }
    Ok(dims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_with_and_without_fill() {
        let t = parse_type_spec("UInt16").unwrap();
        assert_eq!(t.dtype, DataType::scalar(ScalarType::UInt16));
        assert_eq!(t.fill, None);

        let t = parse_type_spec("single:1.2345").unwrap();
        assert_eq!(t.dtype, DataType::scalar(ScalarType::Float32));
        assert_eq!(t.fill.as_deref(), Some("1.2345"));
    }

    #[test]
    fn array_types() {
        let t = parse_type_spec("single[3 3]:0").unwrap();
        assert_eq!(
            t.dtype,
            DataType::array(ArrayType::new(ScalarType::Float32, vec![3, 3]).unwrap())
        );
        assert_eq!(t.to_string(), "float32[3 3]:0");
    }

    #[test]
    fn malformed_specs() {
        assert_eq!(
            parse_type_spec("int:1:2"),
            Err(SchemaError::InvalidTypeSpec("int:1:2".into()))
        );
        assert!(matches!(
            parse_type_spec("int:"),
            Err(SchemaError::InvalidTypeSpec(_))
        ));
        assert!(matches!(
            parse_type_spec("int[3"),
            Err(SchemaError::InvalidTypeSpec(_))
        ));
        assert!(matches!(
            parse_type_spec("[3]"),
            Err(SchemaError::InvalidTypeSpec(_))
        ));
        assert!(matches!(
            parse_type_spec("int[]"),
            Err(SchemaError::InvalidArrayDims(_))
        ));
        assert!(matches!(
            parse_type_spec("int[0 2]"),
            Err(SchemaError::InvalidArrayDims(_))
        ));
        assert!(matches!(
            parse_type_spec("int[-1]"),
            Err(SchemaError::InvalidArrayDims(_))
        ));
        assert!(matches!(
            parse_type_spec("int[4294967296 4294967296]"),
            Err(SchemaError::InvalidArrayDims(_))
        ));
        assert!(matches!(
            parse_type_spec("int[100000 100000]"),
            Err(SchemaError::InvalidArrayDims(_))
        ));
        assert_eq!(
            parse_type_spec("complex[2]"),
            Err(SchemaError::UnknownType("complex".into()))
        );
    }
}
