//! Narrowing of store element types to the spreadsheet's display universe.
//!
//! A spreadsheet cell can only hold a 32-bit integer, a 64-bit float or a
//! string. Every integer type narrows to [`DisplayScalar::Int32`], every
//! float type to [`DisplayScalar::Float64`] and strings to
//! [`DisplayScalar::Text`]. The integer mapping is lossy for `int64`,
//! `uint32` and `uint64`: values outside the `i32` range wrap. Callers
//! that narrow accept this; [`ScalarType::narrows_lossily`] reports it.

use std::fmt;

use crate::types::{DataType, ScalarType};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DisplayScalar {
    Int32,
    Float64,
    Text,
}

impl fmt::Display for DisplayScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DisplayScalar::Int32 => "int32",
            DisplayScalar::Float64 => "float64",
            DisplayScalar::Text => "string",
        })
    }
}

/// A [`DataType`] after narrowing. Field names, field order and array
/// shapes are preserved.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DisplayType {
    Scalar(DisplayScalar),
    Array {
        element: DisplayScalar,
        dims: Vec<u64>,
    },
    Compound(Vec<(String, DisplayType)>),
}

impl DisplayType {
    /// Number of grid cells one element occupies.
    pub fn width(&self) -> usize {
        match self {
            DisplayType::Scalar(_) => 1,
            DisplayType::Array { dims, .. } => dims.iter().product::<u64>() as usize,
            DisplayType::Compound(fields) => fields.iter().map(|(_, t)| t.width()).sum(),
        }
    }
}

impl ScalarType {
    pub const fn narrow(self) -> DisplayScalar {
        match self {
            ScalarType::Int8
            | ScalarType::Int16
            | ScalarType::Int32
            | ScalarType::Int64
            | ScalarType::UInt8
            | ScalarType::UInt16
            | ScalarType::UInt32
            | ScalarType::UInt64 => DisplayScalar::Int32,
            ScalarType::Float32 | ScalarType::Float64 => DisplayScalar::Float64,
            ScalarType::String => DisplayScalar::Text,
        }
    }

    /// True when some values of this type cannot be represented after narrowing.
    pub const fn narrows_lossily(self) -> bool {
        matches!(
            self,
            ScalarType::Int64 | ScalarType::UInt32 | ScalarType::UInt64
        )
    }
}

/// Narrow a store type to the display universe, recursing through compounds.
pub fn narrow(dtype: &DataType) -> DisplayType {
    match dtype {
        DataType::Scalar { scalar } => DisplayType::Scalar(scalar.narrow()),
        DataType::Array { array } => DisplayType::Array {
            element: array.element().narrow(),
            dims: array.dims().to_vec(),
        },
        DataType::Compound { schema } => DisplayType::Compound(
            schema
                .fields()
                .iter()
                .map(|f| (f.name.clone(), narrow(&f.dtype)))
                .collect(),
        ),
    }
}

/// True if narrowing `dtype` may lose information anywhere in its tree.
pub fn narrows_lossily(dtype: &DataType) -> bool {
    match dtype {
        DataType::Scalar { scalar } => scalar.narrows_lossily(),
        DataType::Array { array } => array.element().narrows_lossily(),
        DataType::Compound { schema } => schema.fields().iter().any(|f| narrows_lossily(&f.dtype)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArrayType, Field, Schema};

    #[test]
    fn scalar_table() {
        for ty in ScalarType::ALL {
            let expected = if ty.is_integer() {
                DisplayScalar::Int32
            } else if ty.is_float() {
                DisplayScalar::Float64
            } else {
                DisplayScalar::Text
            };
            assert_eq!(ty.narrow(), expected, "{ty}");
        }
        assert!(ScalarType::UInt64.narrows_lossily());
        assert!(!ScalarType::UInt16.narrows_lossily());
    }

    #[test]
    fn compound_narrows_field_by_field() {
        let schema = Schema::new(vec![
            Field::new("City, State", ScalarType::UInt8),
            Field::new("v", ArrayType::new(ScalarType::Float32, vec![3, 3]).unwrap()),
            Field::new("name", ScalarType::String),
        ])
        .unwrap();
        let narrowed = narrow(&DataType::compound(schema));
        assert_eq!(
            narrowed,
            DisplayType::Compound(vec![
                ("City, State".into(), DisplayType::Scalar(DisplayScalar::Int32)),
                (
                    "v".into(),
                    DisplayType::Array {
                        element: DisplayScalar::Float64,
                        dims: vec![3, 3]
                    }
                ),
                ("name".into(), DisplayType::Scalar(DisplayScalar::Text)),
            ])
        );
        assert_eq!(narrowed.width(), 11);
    }

    #[test]
    fn nested_compound_recurses() {
        let inner = Schema::new(vec![Field::new("big", ScalarType::Int64)]).unwrap();
        let outer = Schema::new(vec![
            Field::new("x", ScalarType::Float32),
            Field::new("inner", DataType::compound(inner)),
        ])
        .unwrap();
        let dtype = DataType::compound(outer);
        assert!(narrows_lossily(&dtype));
        match narrow(&dtype) {
            DisplayType::Compound(fields) => {
                assert_eq!(fields[1].0, "inner");
                assert_eq!(
                    fields[1].1,
                    DisplayType::Compound(vec![(
                        "big".into(),
                        DisplayType::Scalar(DisplayScalar::Int32)
                    )])
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
