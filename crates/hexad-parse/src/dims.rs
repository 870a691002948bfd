//! Size grids and chunk specifications for array creation.

use hexad_common::{Dim, MAX_RANK, Shape};

use crate::types::{ChunkError, DimsError};

/// Interpret a size grid as array dimensions.
///
/// The grid is either a single row (one entry per dimension) or a single
/// column (one row per dimension, one entry each). A positive entry is a
/// fixed extent, a negative entry an initial extent whose dimension is
/// unlimited; zero is invalid.
pub fn parse_dimensions(size: &[Vec<i64>]) -> Result<Shape, DimsError> {
    let entries: Vec<i64> = match size {
        [] => return Err(DimsError::Rank(0)),
        [row] => row.clone(),
        rows => {
            if rows.iter().any(|r| r.len() != 1) {
                return Err(DimsError::Orientation);
            }
            rows.iter().map(|r| r[0]).collect()
        }
    };

    if entries.is_empty() || entries.len() > MAX_RANK {
        return Err(DimsError::Rank(entries.len()));
    }

    let dims = entries
        .iter()
        .enumerate()
        .map(|(index, &v)| match v {
            0 => Err(DimsError::ZeroExtent { index }),
            v if v > 0 => Ok(Dim::fixed(v as u64)),
            v => Ok(Dim::unlimited(v.unsigned_abs())),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Shape::new(dims)?)
}

/// Parse `"[d1 d2 ...]"` into positive chunk extents. Whether the rank
/// matches the array is checked by the caller.
pub fn parse_chunk_spec(text: &str) -> Result<Vec<u64>, ChunkError> {
    let s = text.trim();
    let inner = s
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| ChunkError::Brackets(text.to_string()))?;

    let chunk = inner
        .split_whitespace()
        .map(|tok| match tok.parse::<u64>() {
            Ok(d) if d > 0 => Ok(d),
            _ => Err(ChunkError::Entry(tok.to_string())),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if chunk.is_empty() {
        return Err(ChunkError::Empty);
    }
    Ok(chunk)
}
