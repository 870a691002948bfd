use std::{
    fmt::{self, Display},
    hash::{Hash, Hasher},
};

use crate::display::{DisplayScalar, DisplayType};
use crate::types::{DataType, ScalarType};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors produced when converting between spreadsheet cells and stored
/// elements.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    #[error("cannot store {found} in a {expected} element")]
    TypeMismatch { expected: String, found: String },
    #[error("{value} is outside the range of {ty}")]
    OutOfRange { value: String, ty: ScalarType },
    #[error("{0} is not an integer")]
    NotIntegral(f64),
    #[error("cannot parse `{literal}` as {ty}")]
    BadLiteral { literal: String, ty: ScalarType },
    #[error("expected {expected} cells per element, found {found}")]
    Width { expected: usize, found: usize },
}

/// A value as a spreadsheet cell holds it.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Int(i64),
    Number(f64),
    Text(String),
}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            CellValue::Empty => state.write_u8(0),
            CellValue::Int(i) => i.hash(state),
            CellValue::Number(n) => n.to_bits().hash(state),
            CellValue::Text(s) => s.hash(state),
        }
    }
}

impl Eq for CellValue {}

impl Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl CellValue {
    /// Parse a cell from free text the way a spreadsheet would: integers,
    /// then floats, then text. Empty text is an empty cell.
    pub fn parse(text: &str) -> Self {
        let t = text.trim();
        if t.is_empty() {
            CellValue::Empty
        } else if let Ok(i) = t.parse::<i64>() {
            CellValue::Int(i)
        } else if let Ok(n) = t.parse::<f64>() {
            CellValue::Number(n)
        } else {
            CellValue::Text(text.to_string())
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            CellValue::Empty => "empty",
            CellValue::Int(_) => "integer",
            CellValue::Number(_) => "number",
            CellValue::Text(_) => "text",
        }
    }

    /// Integral value of a numeric cell, if it has one.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            CellValue::Int(i) => Some(*i),
            CellValue::Number(n) if n.fract() == 0.0 && n.is_finite() => {
                if *n >= i64::MIN as f64 && *n <= i64::MAX as f64 {
                    Some(*n as i64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

/// A rectangular block of cells, row-major.
pub type Grid = Vec<Vec<CellValue>>;

/// `(rows, cols)` of a grid, or `None` when it is empty or ragged.
pub fn grid_shape(grid: &Grid) -> Option<(usize, usize)> {
    let cols = grid.first()?.len();
    if cols == 0 || grid.iter().any(|r| r.len() != cols) {
        return None;
    }
    Some((grid.len(), cols))
}

/// Pick the narrowest catalog type that can hold every cell: any text
/// makes a string array, all-integer cells an `int64` array, anything
/// else `float64`.
pub fn infer_scalar<'a>(cells: impl IntoIterator<Item = &'a CellValue>) -> ScalarType {
    let mut all_int = true;
    let mut any_value = false;
    for cell in cells {
        match cell {
            CellValue::Text(_) => return ScalarType::String,
            CellValue::Int(_) => any_value = true,
            CellValue::Number(_) => {
                any_value = true;
                all_int = false;
            }
            CellValue::Empty => {}
        }
    }
    if any_value && all_int {
        ScalarType::Int64
    } else {
        ScalarType::Float64
    }
}

/// A stored element (or part of one).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    /// Value of an array-typed element, row-major.
    Array(Vec<Datum>),
    /// Value of a compound element, in field order.
    Record(Vec<Datum>),
}

impl Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Int(i) => write!(f, "{i}"),
            Datum::UInt(u) => write!(f, "{u}"),
            Datum::Float(x) => write!(f, "{x}"),
            Datum::Text(s) => write!(f, "{s}"),
            Datum::Array(items) | Datum::Record(items) => {
                let open = if matches!(self, Datum::Array(_)) { '[' } else { '(' };
                let close = if open == '[' { ']' } else { ')' };
                write!(f, "{open}")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "{close}")
            }
        }
    }
}

impl Datum {
    /// The zero value of a type: `0`, `0.0`, `""`, recursively.
    pub fn zero(dtype: &DataType) -> Datum {
        match dtype {
            DataType::Scalar { scalar } => Self::scalar_zero(*scalar),
            DataType::Array { array } => {
                Datum::Array(vec![Self::scalar_zero(array.element()); array.len() as usize])
            }
            DataType::Compound { schema } => {
                Datum::Record(schema.fields().iter().map(Self::field_default).collect())
            }
        }
    }

    fn field_default(field: &crate::types::Field) -> Datum {
        field
            .fill
            .as_deref()
            .and_then(|lit| Self::from_fill(&field.dtype, lit).ok())
            .unwrap_or_else(|| Self::zero(&field.dtype))
    }

    fn scalar_zero(scalar: ScalarType) -> Datum {
        match scalar {
            ScalarType::String => Datum::Text(String::new()),
            ScalarType::Float32 | ScalarType::Float64 => Datum::Float(0.0),
            s if s.is_unsigned_integer() => Datum::UInt(0),
            _ => Datum::Int(0),
        }
    }

    /// Interpret a fill literal for `dtype`. Out-of-range literals are
    /// rejected, never clamped. Array types repeat the scalar fill.
    pub fn from_fill(dtype: &DataType, literal: &str) -> Result<Datum, ValueError> {
        let scalar_fill = |scalar: ScalarType| {
            Self::coerce(&CellValue::parse(literal), scalar).map_err(|e| match e {
                ValueError::TypeMismatch { .. } => ValueError::BadLiteral {
                    literal: literal.to_string(),
                    ty: scalar,
                },
                other => other,
            })
        };
        match dtype {
            DataType::Scalar { scalar } => scalar_fill(*scalar),
            DataType::Array { array } => {
                let one = scalar_fill(array.element())?;
                Ok(Datum::Array(vec![one; array.len() as usize]))
            }
            DataType::Compound { .. } => Err(ValueError::TypeMismatch {
                expected: dtype.to_string(),
                found: "fill literal".to_string(),
            }),
        }
    }

    /// Convert one cell into a scalar element of type `scalar`.
    pub fn coerce(cell: &CellValue, scalar: ScalarType) -> Result<Datum, ValueError> {
        match scalar {
            ScalarType::String => Ok(Datum::Text(match cell {
                CellValue::Text(s) => s.clone(),
                other => other.to_string(),
            })),
            ScalarType::Float32 | ScalarType::Float64 => match cell {
                CellValue::Empty => Ok(Datum::Float(0.0)),
                CellValue::Int(i) => Ok(Datum::Float(*i as f64)),
                CellValue::Number(n) => Ok(Datum::Float(if scalar == ScalarType::Float32 {
                    *n as f32 as f64
                } else {
                    *n
                })),
                CellValue::Text(_) => Err(Self::mismatch(scalar, cell)),
            },
            _ => {
                let value: i128 = match cell {
                    CellValue::Empty => 0,
                    CellValue::Int(i) => *i as i128,
                    CellValue::Number(n) => {
                        if n.fract() != 0.0 || !n.is_finite() {
                            return Err(ValueError::NotIntegral(*n));
                        }
                        *n as i128
                    }
                    CellValue::Text(_) => return Err(Self::mismatch(scalar, cell)),
                };
                let (lo, hi) = scalar
                    .integer_range()
                    .ok_or_else(|| Self::mismatch(scalar, cell))?;
                if value < lo || value > hi {
                    return Err(ValueError::OutOfRange {
                        value: value.to_string(),
                        ty: scalar,
                    });
                }
                if scalar.is_unsigned_integer() {
                    Ok(Datum::UInt(value as u64))
                } else {
                    Ok(Datum::Int(value as i64))
                }
            }
        }
    }

    fn mismatch(scalar: ScalarType, cell: &CellValue) -> ValueError {
        ValueError::TypeMismatch {
            expected: scalar.to_string(),
            found: cell.type_name().to_string(),
        }
    }

    /// Build one element of `dtype` from exactly `dtype.width()` cells.
    pub fn from_cells(dtype: &DataType, cells: &[CellValue]) -> Result<Datum, ValueError> {
        if cells.len() != dtype.width() {
            return Err(ValueError::Width {
                expected: dtype.width(),
                found: cells.len(),
            });
        }
        match dtype {
            DataType::Scalar { scalar } => Self::coerce(&cells[0], *scalar),
            DataType::Array { array } => cells
                .iter()
                .map(|c| Self::coerce(c, array.element()))
                .collect::<Result<Vec<_>, _>>()
                .map(Datum::Array),
            DataType::Compound { schema } => {
                let mut offset = 0;
                let mut parts = Vec::with_capacity(schema.len());
                for field in schema.fields() {
                    let w = field.dtype.width();
                    parts.push(Self::from_cells(&field.dtype, &cells[offset..offset + w])?);
                    offset += w;
                }
                Ok(Datum::Record(parts))
            }
        }
    }

    /// Flatten into display cells according to a narrowed type, appending
    /// to `out`. Integers wrap into the 32-bit range.
    pub fn narrow_into(&self, display: &DisplayType, out: &mut Vec<CellValue>) {
        match (self, display) {
            (Datum::Array(items), DisplayType::Array { element, .. }) => {
                let scalar = DisplayType::Scalar(*element);
                for item in items {
                    item.narrow_into(&scalar, out);
                }
            }
            (Datum::Record(items), DisplayType::Compound(fields)) => {
                for (item, (_, ty)) in items.iter().zip(fields) {
                    item.narrow_into(ty, out);
                }
            }
            (scalar, DisplayType::Scalar(target)) => out.push(scalar.narrow_scalar(*target)),
            (other, _) => out.push(CellValue::Text(other.to_string())),
        }
    }

    fn narrow_scalar(&self, target: DisplayScalar) -> CellValue {
        match (self, target) {
            (Datum::Int(i), DisplayScalar::Int32) => CellValue::Int(*i as i32 as i64),
            (Datum::UInt(u), DisplayScalar::Int32) => CellValue::Int(*u as i32 as i64),
            (Datum::Float(x), DisplayScalar::Float64) => CellValue::Number(*x),
            (Datum::Int(i), DisplayScalar::Float64) => CellValue::Number(*i as f64),
            (Datum::UInt(u), DisplayScalar::Float64) => CellValue::Number(*u as f64),
            (Datum::Text(s), _) => CellValue::Text(s.clone()),
            (other, _) => CellValue::Text(other.to_string()),
        }
    }
}
