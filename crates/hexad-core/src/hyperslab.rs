//! 1-based, open-ended `first/last/step` coordinates turned into 0-based
//! strided selections.
//!
//! Reads clamp to the current extents. Writes may run past the end; the
//! returned [`WritePlan`] then carries the grown shape the caller must
//! resize to before writing. Appends are writes that start at the end of
//! a rank-1 array.

use hexad_common::{Shape, ShapeError};
use smallvec::SmallVec;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("`{what}` has {found} entries but the array has rank {expected}")]
    RankMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("`{what}` value {value} in dimension {dim} is out of range")]
    OutOfRange {
        what: &'static str,
        dim: usize,
        value: i64,
    },
    #[error("empty selection in dimension {dim}")]
    EmptySelection { dim: usize },
    /// Raised when the data to write or append is empty; a selection
    /// itself is never empty once every dimension passes its range check.
    #[error("the selection collapses to nothing")]
    DegenerateHyperslab,
    #[error("the selection holds {selected} elements but {supplied} were supplied")]
    CountMismatch { selected: u64, supplied: u64 },
    #[error("dimension {dim} cannot grow to {requested} (maximum {bound})")]
    CannotExtend {
        dim: usize,
        requested: u64,
        bound: u64,
    },
    #[error("only rank-1 arrays can be appended to, this one has rank {rank}")]
    NotExtensible { rank: usize },
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

/// One dimension of a selection: `start..stop` by `stride`, 0-based and
/// half-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DimSelection {
    pub start: u64,
    pub stop: u64,
    pub stride: u64,
}

impl DimSelection {
    pub const fn new(start: u64, stop: u64, stride: u64) -> Self {
        Self {
            start,
            stop,
            stride,
        }
    }

    /// Number of selected indices, `ceil((stop - start) / stride)`.
    pub fn count(&self) -> u64 {
        if self.stop <= self.start {
            0
        } else {
            (self.stop - self.start).div_ceil(self.stride)
        }
    }

    /// One past the last selected index; the extent a write needs.
    pub fn end(&self) -> u64 {
        match self.count() {
            0 => self.start,
            n => self.start + (n - 1) * self.stride + 1,
        }
    }

    pub fn indices(&self) -> impl Iterator<Item = u64> + '_ {
        (0..self.count()).map(move |k| self.start + k * self.stride)
    }
}

/// A per-dimension strided selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hyperslab {
    dims: SmallVec<[DimSelection; 4]>,
}

impl Hyperslab {
    pub fn new(dims: impl IntoIterator<Item = DimSelection>) -> Self {
        Self {
            dims: dims.into_iter().collect(),
        }
    }

    /// Every element at unit stride.
    pub fn full(shape: &Shape) -> Self {
        Self::new(shape.dims().iter().map(|d| DimSelection::new(0, d.extent, 1)))
    }

    pub fn dims(&self) -> &[DimSelection] {
        &self.dims
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Result shape of the selection.
    pub fn counts(&self) -> Vec<u64> {
        self.dims.iter().map(DimSelection::count).collect()
    }

    /// Saturates at `u64::MAX`; a write selection may reach far past any
    /// storable shape before its count is compared with the data.
    pub fn len(&self) -> u64 {
        self.dims
            .iter()
            .map(DimSelection::count)
            .try_fold(1u64, u64::checked_mul)
            .unwrap_or(u64::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row-major linear offsets of the selected elements inside an array
    /// with the given extents, in selection order.
    pub fn offsets(&self, extents: &[u64]) -> Vec<u64> {
        debug_assert_eq!(extents.len(), self.rank());
        let total = self.len();
        if total == 0 {
            return Vec::new();
        }

        let mut pitch: SmallVec<[u64; 4]> = SmallVec::from_elem(1, self.rank());
        for i in (0..self.rank().saturating_sub(1)).rev() {
            pitch[i] = pitch[i + 1] * extents[i + 1];
        }

        let counts: SmallVec<[u64; 4]> = self.dims.iter().map(DimSelection::count).collect();
        let mut cursor: SmallVec<[u64; 4]> = SmallVec::from_elem(0, self.rank());
        let mut out = Vec::with_capacity(total as usize);
        loop {
            let offset: u64 = self
                .dims
                .iter()
                .zip(&cursor)
                .zip(&pitch)
                .map(|((d, k), p)| (d.start + k * d.stride) * p)
                .sum();
            out.push(offset);

            // odometer, last dimension fastest
            let mut i = self.rank();
            loop {
                if i == 0 {
                    return out;
                }
                i -= 1;
                cursor[i] += 1;
                if cursor[i] < counts[i] {
                    break;
                }
                cursor[i] = 0;
            }
        }
    }
}

/// User coordinates: 1-based `first`, inclusive `last` (negative means
/// "through the end") and `step`, each either absent or one entry per
/// dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSpec {
    pub first: Option<Vec<i64>>,
    pub last: Option<Vec<i64>>,
    pub step: Option<Vec<i64>>,
}

impl SelectionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn first(mut self, first: impl Into<Vec<i64>>) -> Self {
        self.first = Some(first.into());
        self
    }

    pub fn last(mut self, last: impl Into<Vec<i64>>) -> Self {
        self.last = Some(last.into());
        self
    }

    pub fn step(mut self, step: impl Into<Vec<i64>>) -> Self {
        self.step = Some(step.into());
        self
    }

    fn check_rank(&self, rank: usize) -> Result<(), SelectionError> {
        for (what, v) in [("first", &self.first), ("last", &self.last), ("step", &self.step)] {
            if let Some(v) = v {
                if v.len() != rank {
                    return Err(SelectionError::RankMismatch {
                        what,
                        expected: rank,
                        found: v.len(),
                    });
                }
            }
        }
        Ok(())
    }

    fn start(&self, dim: usize) -> Result<u64, SelectionError> {
        match self.first.as_ref().map(|f| f[dim]) {
            None => Ok(0),
            Some(f) if f >= 1 => Ok((f - 1) as u64),
            Some(f) => Err(SelectionError::OutOfRange {
                what: "first",
                dim,
                value: f,
            }),
        }
    }

    /// Explicit stop, if `last` gives a non-negative one.
    fn stop(&self, dim: usize) -> Option<u64> {
        self.last
            .as_ref()
            .map(|l| l[dim])
            .filter(|l| *l >= 0)
            .map(|l| l as u64)
    }

    fn stride(&self, dim: usize) -> Result<u64, SelectionError> {
        match self.step.as_ref().map(|s| s[dim]) {
            None => Ok(1),
            Some(s) if s >= 1 => Ok(s as u64),
            Some(s) => Err(SelectionError::OutOfRange {
                what: "step",
                dim,
                value: s,
            }),
        }
    }
}

/// A validated write: the selection and, when the write runs past the
/// current extents, the shape to resize to first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritePlan {
    pub selection: Hyperslab,
    pub new_shape: Option<Shape>,
}

/// Resolve a read against the current extents. `stop` is clamped; a
/// selection that starts past the end or stops before it starts is empty.
pub fn normalize_read(shape: &Shape, spec: &SelectionSpec) -> Result<Hyperslab, SelectionError> {
    spec.check_rank(shape.rank())?;
    let mut dims = SmallVec::<[DimSelection; 4]>::new();
    for (i, dim) in shape.dims().iter().enumerate() {
        let start = spec.start(i)?;
        let stride = spec.stride(i)?;
        let stop = spec.stop(i).map_or(dim.extent, |s| s.min(dim.extent));
        if start >= dim.extent || stop <= start {
            return Err(SelectionError::EmptySelection { dim: i });
        }
        dims.push(DimSelection::new(start, stop, stride));
    }
    Ok(Hyperslab { dims })
}

/// Resolve a write of `data_shape` elements. The selection's element
/// count must equal the data's (any reshape with a matching count is
/// accepted). A selection reaching past the current extents yields the
/// grown shape, provided every bound admits it.
pub fn normalize_write(
    shape: &Shape,
    spec: &SelectionSpec,
    data_shape: &[u64],
) -> Result<WritePlan, SelectionError> {
    spec.check_rank(shape.rank())?;
    let supplied: u64 = data_shape.iter().product();
    if data_shape.is_empty() || supplied == 0 {
        return Err(SelectionError::DegenerateHyperslab);
    }

    let mut dims = SmallVec::<[DimSelection; 4]>::new();
    for (i, dim) in shape.dims().iter().enumerate() {
        let start = spec.start(i)?;
        let stride = spec.stride(i)?;
        let stop = spec.stop(i).unwrap_or(dim.extent);
        if stop <= start {
            return Err(SelectionError::EmptySelection { dim: i });
        }
        dims.push(DimSelection::new(start, stop, stride));
    }
    let selection = Hyperslab { dims };

    let selected = selection.len();
    if selected != supplied {
        return Err(SelectionError::CountMismatch { selected, supplied });
    }

    let needed: Vec<u64> = selection.dims().iter().map(DimSelection::end).collect();
    let new_shape = grow(shape, &needed)?;
    Ok(WritePlan {
        selection,
        new_shape,
    })
}

/// Resolve an append of `rows` elements to the end of a rank-1 array.
pub fn normalize_append(shape: &Shape, rows: u64) -> Result<WritePlan, SelectionError> {
    if shape.rank() != 1 {
        return Err(SelectionError::NotExtensible { rank: shape.rank() });
    }
    if rows == 0 {
        return Err(SelectionError::DegenerateHyperslab);
    }
    let end = shape.dims()[0].extent;
    let selection = Hyperslab::new([DimSelection::new(end, end + rows, 1)]);
    let new_shape = grow(shape, &[end + rows])?;
    Ok(WritePlan {
        selection,
        new_shape,
    })
}

fn grow(shape: &Shape, needed: &[u64]) -> Result<Option<Shape>, SelectionError> {
    if needed
        .iter()
        .zip(shape.dims())
        .all(|(&n, d)| n <= d.extent)
    {
        return Ok(None);
    }

    let mut target = Vec::with_capacity(needed.len());
    for (i, (&n, d)) in needed.iter().zip(shape.dims()).enumerate() {
        if !d.admits(n) {
            return Err(SelectionError::CannotExtend {
                dim: i,
                requested: n,
                bound: d.bound.unwrap_or(d.extent),
            });
        }
        target.push(n.max(d.extent));
    }

    let grown = shape.grown(&target)?;
    #[cfg(feature = "tracing")]
    tracing::debug!(from = %shape, to = %grown, "array extension required");
    Ok(Some(grown))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexad_common::Dim;

    fn shape(extents: &[u64]) -> Shape {
        Shape::fixed(extents).unwrap()
    }

    #[test]
    fn defaults_select_everything() {
        let s = Shape::from_parts(&[7, 3], &[None, Some(3)]).unwrap();
        let slab = normalize_read(&s, &SelectionSpec::new()).unwrap();
        assert_eq!(slab, Hyperslab::full(&s));
        assert_eq!(slab.counts(), s.extents());
    }

    #[test]
    fn strided_read() {
        let spec = SelectionSpec::new().first([10]).last([20]).step([3]);
        let slab = normalize_read(&shape(&[100]), &spec).unwrap();
        assert_eq!(slab.dims(), &[DimSelection::new(9, 20, 3)]);
        assert_eq!(slab.len(), 4);
        assert_eq!(slab.dims()[0].indices().collect::<Vec<_>>(), [9, 12, 15, 18]);
    }

    #[test]
    fn read_counts_round_up() {
        let spec = SelectionSpec::new().first([20]).step([19]);
        assert_eq!(normalize_read(&shape(&[5554]), &spec).unwrap().counts(), [292]);

        let spec = SelectionSpec::new().first([10, 20]).step([2, 3]);
        assert_eq!(
            normalize_read(&shape(&[5554, 145]), &spec).unwrap().counts(),
            [2773, 42]
        );
    }

    #[test]
    fn read_clamps_and_reads_through_end() {
        let spec = SelectionSpec::new().first([5]).last([500]);
        let slab = normalize_read(&shape(&[10]), &spec).unwrap();
        assert_eq!(slab.dims()[0], DimSelection::new(4, 10, 1));

        let spec = SelectionSpec::new().last([-1]);
        assert_eq!(normalize_read(&shape(&[10]), &spec).unwrap().len(), 10);
    }

    #[test]
    fn read_errors() {
        let s = shape(&[10]);
        assert_eq!(
            normalize_read(&s, &SelectionSpec::new().first([11])),
            Err(SelectionError::EmptySelection { dim: 0 })
        );
        assert_eq!(
            normalize_read(&s, &SelectionSpec::new().first([5]).last([4])),
            Err(SelectionError::EmptySelection { dim: 0 })
        );
        assert_eq!(
            normalize_read(&s, &SelectionSpec::new().first([0])),
            Err(SelectionError::OutOfRange {
                what: "first",
                dim: 0,
                value: 0
            })
        );
        assert_eq!(
            normalize_read(&s, &SelectionSpec::new().step([0])),
            Err(SelectionError::OutOfRange {
                what: "step",
                dim: 0,
                value: 0
            })
        );
        assert_eq!(
            normalize_read(&s, &SelectionSpec::new().first([1, 1])),
            Err(SelectionError::RankMismatch {
                what: "first",
                expected: 1,
                found: 2
            })
        );
    }

    #[test]
    fn write_grows_unlimited_dimension() {
        let s = Shape::new(vec![Dim::unlimited(100)]).unwrap();
        let spec = SelectionSpec::new().first([90]).last([150]);
        let plan = normalize_write(&s, &spec, &[61]).unwrap();
        assert_eq!(plan.new_shape.unwrap().extents(), [150]);
        assert_eq!(plan.selection.dims()[0], DimSelection::new(89, 150, 1));
    }

    #[test]
    fn write_past_fixed_bound_fails() {
        let spec = SelectionSpec::new().first([90]).last([150]);
        assert_eq!(
            normalize_write(&shape(&[100]), &spec, &[61]),
            Err(SelectionError::CannotExtend {
                dim: 0,
                requested: 150,
                bound: 100
            })
        );
    }

    #[test]
    fn write_growth_uses_last_selected_index() {
        let s = Shape::new(vec![Dim::unlimited(4)]).unwrap();
        let spec = SelectionSpec::new().first([3]).last([8]).step([2]);
        let plan = normalize_write(&s, &spec, &[3]).unwrap();
        assert_eq!(plan.selection.dims()[0].indices().collect::<Vec<_>>(), [2, 4, 6]);
        assert_eq!(plan.new_shape.unwrap().extents(), [7]);
    }

    #[test]
    fn oversized_selection_count_saturates() {
        let s = Shape::new(vec![Dim::unlimited(1), Dim::unlimited(1)]).unwrap();
        let spec = SelectionSpec::new().last([1_i64 << 40, 1 << 40]);
        assert_eq!(
            normalize_write(&s, &spec, &[4]),
            Err(SelectionError::CountMismatch {
                selected: u64::MAX,
                supplied: 4
            })
        );
    }

    #[test]
    fn write_inside_extents_needs_no_resize() {
        let plan = normalize_write(&shape(&[4, 5]), &SelectionSpec::new(), &[20]).unwrap();
        assert_eq!(plan.new_shape, None);
        assert_eq!(plan.selection.counts(), [4, 5]);
    }

    #[test]
    fn write_count_mismatch_and_reshape() {
        let s = shape(&[4, 5]);
        assert_eq!(
            normalize_write(&s, &SelectionSpec::new(), &[3, 5]),
            Err(SelectionError::CountMismatch {
                selected: 20,
                supplied: 15
            })
        );
        assert!(normalize_write(&s, &SelectionSpec::new(), &[20]).is_ok());
        assert_eq!(
            normalize_write(&s, &SelectionSpec::new(), &[0, 5]),
            Err(SelectionError::DegenerateHyperslab)
        );
        assert_eq!(
            normalize_write(&s, &SelectionSpec::new(), &[]),
            Err(SelectionError::DegenerateHyperslab)
        );
    }

    #[test]
    fn append_extends_rank_one() {
        let s = Shape::new(vec![Dim::unlimited(0)]).unwrap();
        let plan = normalize_append(&s, 3).unwrap();
        assert_eq!(plan.selection.dims()[0], DimSelection::new(0, 3, 1));
        assert_eq!(plan.new_shape.unwrap().extents(), [3]);

        assert_eq!(
            normalize_append(&s, 0),
            Err(SelectionError::DegenerateHyperslab)
        );
        assert_eq!(
            normalize_append(&shape(&[2, 2]), 1),
            Err(SelectionError::NotExtensible { rank: 2 })
        );
        assert!(matches!(
            normalize_append(&shape(&[2]), 1),
            Err(SelectionError::CannotExtend { .. })
        ));
    }

    #[test]
    fn offsets_are_row_major() {
        let slab = Hyperslab::new([DimSelection::new(1, 3, 1), DimSelection::new(0, 4, 2)]);
        assert_eq!(slab.offsets(&[3, 4]), [4, 6, 8, 10]);
        assert!(Hyperslab::new([DimSelection::new(2, 2, 1)]).offsets(&[5]).is_empty());
    }
}
