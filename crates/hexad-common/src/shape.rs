//! Array extents and their optional upper bounds.

use std::fmt;

use crate::types::MAX_RANK;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors that can occur while constructing or growing a [`Shape`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("rank {0} outside 1..=32")]
    Rank(usize),
    #[error("{dims} extents but {maxdims} bounds")]
    LengthMismatch { dims: usize, maxdims: usize },
    #[error("extent {extent} of dimension {dim} exceeds its bound {bound}")]
    ExceedsBound { dim: usize, extent: u64, bound: u64 },
    #[error("dimension {dim} cannot shrink from {current} to {requested}")]
    Shrink {
        dim: usize,
        current: u64,
        requested: u64,
    },
    #[error("element count overflows at dimension {dim}")]
    TooManyElements { dim: usize },
}

/// One dimension: the current extent and an optional fixed maximum.
/// `bound == None` means the dimension is unlimited.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Dim {
    pub extent: u64,
    pub bound: Option<u64>,
}

impl Dim {
    pub const fn fixed(extent: u64) -> Self {
        Dim {
            extent,
            bound: Some(extent),
        }
    }

    pub const fn unlimited(extent: u64) -> Self {
        Dim {
            extent,
            bound: None,
        }
    }

    /// Whether the extent may grow to `extent`.
    pub fn admits(&self, extent: u64) -> bool {
        self.bound.is_none_or(|b| extent <= b)
    }
}

/// Ordered dimensions of an array, rank `1..=32`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<Dim>", into = "Vec<Dim>"))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: Vec<Dim>,
}

impl Shape {
    pub fn new(dims: Vec<Dim>) -> Result<Self, ShapeError> {
        if dims.is_empty() || dims.len() > MAX_RANK {
            return Err(ShapeError::Rank(dims.len()));
        }
        for (i, d) in dims.iter().enumerate() {
            if let Some(bound) = d.bound {
                if d.extent > bound {
                    return Err(ShapeError::ExceedsBound {
                        dim: i,
                        extent: d.extent,
                        bound,
                    });
                }
            }
        }
        dims.iter().enumerate().try_fold(1u64, |acc, (i, d)| {
            acc.checked_mul(d.extent)
                .ok_or(ShapeError::TooManyElements { dim: i })
        })?;
        Ok(Self { dims })
    }

    /// Build from parallel extent/bound vectors.
    pub fn from_parts(extents: &[u64], bounds: &[Option<u64>]) -> Result<Self, ShapeError> {
        if extents.len() != bounds.len() {
            return Err(ShapeError::LengthMismatch {
                dims: extents.len(),
                maxdims: bounds.len(),
            });
        }
        Self::new(
            extents
                .iter()
                .zip(bounds)
                .map(|(&extent, &bound)| Dim { extent, bound })
                .collect(),
        )
    }

    /// A shape whose bounds equal its extents.
    pub fn fixed(extents: &[u64]) -> Result<Self, ShapeError> {
        Self::new(extents.iter().map(|&e| Dim::fixed(e)).collect())
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn dims(&self) -> &[Dim] {
        &self.dims
    }

    pub fn extents(&self) -> Vec<u64> {
        self.dims.iter().map(|d| d.extent).collect()
    }

    pub fn bounds(&self) -> Vec<Option<u64>> {
        self.dims.iter().map(|d| d.bound).collect()
    }

    /// Total element count at the current extents. Construction
    /// guarantees it fits in a `u64`.
    pub fn len(&self) -> u64 {
        self.dims.iter().map(|d| d.extent).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_extensible(&self) -> bool {
        self.dims.iter().any(|d| d.bound != Some(d.extent))
    }

    /// Return a copy grown to `extents`. Growth past a bound and shrinking
    /// are both rejected.
    pub fn grown(&self, extents: &[u64]) -> Result<Self, ShapeError> {
        if extents.len() != self.rank() {
            return Err(ShapeError::LengthMismatch {
                dims: extents.len(),
                maxdims: self.rank(),
            });
        }
        let mut dims = self.dims.clone();
        for (i, (dim, &requested)) in dims.iter_mut().zip(extents).enumerate() {
            if requested < dim.extent {
                return Err(ShapeError::Shrink {
                    dim: i,
                    current: dim.extent,
                    requested,
                });
            }
            if !dim.admits(requested) {
                return Err(ShapeError::ExceedsBound {
                    dim: i,
                    extent: requested,
                    bound: dim.bound.unwrap_or(u64::MAX),
                });
            }
            dim.extent = requested;
        }
        Self::new(dims)
    }

    /// Render the bounds the way listings show them: `(12, None)`.
    pub fn bounds_string(&self) -> String {
        let parts: Vec<String> = self
            .dims
            .iter()
            .map(|d| match d.bound {
                Some(b) => b.to_string(),
                None => "None".to_string(),
            })
            .collect();
        tuple_string(&parts)
    }
}

fn tuple_string(parts: &[String]) -> String {
    if parts.len() == 1 {
        format!("({},)", parts[0])
    } else {
        format!("({})", parts.join(", "))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.dims.iter().map(|d| d.extent.to_string()).collect();
        f.write_str(&tuple_string(&parts))
    }
}

impl TryFrom<Vec<Dim>> for Shape {
    type Error = ShapeError;

    fn try_from(value: Vec<Dim>) -> Result<Self, Self::Error> {
        Shape::new(value)
    }
}

impl From<Shape> for Vec<Dim> {
    fn from(value: Shape) -> Self {
        value.dims
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_must_fit_bound() {
        let err = Shape::new(vec![Dim {
            extent: 5,
            bound: Some(4),
        }])
        .unwrap_err();
        assert_eq!(
            err,
            ShapeError::ExceedsBound {
                dim: 0,
                extent: 5,
                bound: 4
            }
        );
        assert_eq!(Shape::new(vec![]).unwrap_err(), ShapeError::Rank(0));
    }

    #[test]
    fn grows_only_within_bounds() {
        let shape = Shape::new(vec![Dim::fixed(12), Dim::unlimited(16)]).unwrap();
        assert!(shape.is_extensible());
        let grown = shape.grown(&[12, 40]).unwrap();
        assert_eq!(grown.extents(), vec![12, 40]);
        assert!(matches!(
            shape.grown(&[13, 16]),
            Err(ShapeError::ExceedsBound { dim: 0, .. })
        ));
        assert!(matches!(
            grown.grown(&[12, 39]),
            Err(ShapeError::Shrink { dim: 1, .. })
        ));
    }

    #[test]
    fn element_count_must_fit() {
        assert_eq!(
            Shape::fixed(&[1 << 40, 1 << 40]).unwrap_err(),
            ShapeError::TooManyElements { dim: 1 }
        );
        let shape = Shape::new(vec![Dim::unlimited(2), Dim::unlimited(2)]).unwrap();
        assert_eq!(
            shape.grown(&[1 << 60, 1 << 60]).unwrap_err(),
            ShapeError::TooManyElements { dim: 1 }
        );
    }

    #[test]
    fn renders_like_tuples() {
        let shape = Shape::from_parts(&[12, 16], &[Some(12), None]).unwrap();
        assert_eq!(shape.to_string(), "(12, 16)");
        assert_eq!(shape.bounds_string(), "(12, None)");
        assert_eq!(Shape::fixed(&[7]).unwrap().to_string(), "(7,)");
    }
}
