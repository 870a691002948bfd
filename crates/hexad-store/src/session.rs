//! The operation surface a spreadsheet front end calls.
//!
//! Every operation validates its inputs (paths, grids, property lists,
//! coordinates) before touching the store, so a failed call leaves the
//! store unchanged.

use hexad_common::{
    CellValue, DataType, Datum, Dim, Grid, NodeKind, ROOT, ScalarType, Schema, Shape, ValueError,
    absolute, grid_shape, infer_scalar, narrow,
};
use hexad_core::{
    ArrayStore, Availability, Classification, Hyperslab, LeafSpec, NamespaceError, SelectionSpec,
    availability, classify, normalize_append, normalize_read, normalize_write,
};
use hexad_parse::{PropertyKey, parse_dimensions, parse_properties, parse_schema};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::listing::{self, InfoRow, ListRow, Tree};
use crate::memory::MemoryStore;

/// Worksheet grid limits.
pub const MAX_ROWS: usize = 1_048_576;
pub const MAX_COLS: usize = 16_384;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Element type of new arrays whose property list has no `DATATYPE`.
    pub default_dtype: ScalarType,
    /// Compression level of new tables whose property list has no `DEFLATE`.
    pub default_table_deflate: Option<u8>,
    pub max_rows: usize,
    pub max_cols: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_dtype: ScalarType::Float64,
            default_table_deflate: Some(4),
            max_rows: MAX_ROWS,
            max_cols: MAX_COLS,
        }
    }
}

impl SessionConfig {
    /// Defaults without table compression.
    pub fn uncompressed() -> Self {
        Self {
            default_table_deflate: None,
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct Session<S: ArrayStore = MemoryStore> {
    store: S,
    config: SessionConfig,
}

/// An empty location means the root.
fn location(path: &str) -> &str {
    if path.is_empty() { ROOT } else { path }
}

fn cell_to_attribute(value: &CellValue) -> Result<Datum> {
    let small = |i: i64| i32::try_from(i).ok().map(|v| Datum::Int(v as i64));
    match value {
        CellValue::Empty => Err(StoreError::EmptyValue),
        CellValue::Int(i) => Ok(small(*i).unwrap_or(Datum::Float(*i as f64))),
        CellValue::Number(n) => Ok(value
            .as_integer()
            .and_then(small)
            .unwrap_or(Datum::Float(*n))),
        CellValue::Text(s) => Ok(Datum::Text(s.clone())),
    }
}

fn attribute_to_cell(value: Datum) -> CellValue {
    match value {
        Datum::Int(i) => CellValue::Int(i),
        Datum::UInt(u) => CellValue::Number(u as f64),
        Datum::Float(x) => CellValue::Number(x),
        Datum::Text(s) => CellValue::Text(s),
        other => CellValue::Text(other.to_string()),
    }
}

/// Field positions for a column subset; `None` or an empty list selects
/// every field in declaration order.
fn pick_columns(schema: &Schema, names: Option<&[String]>) -> Result<Vec<usize>> {
    let names = match names {
        Some(names) if !names.is_empty() => names,
        _ => return Ok((0..schema.len()).collect()),
    };
    let mut picked = Vec::with_capacity(names.len());
    for name in names {
        let pos = schema
            .position(name)
            .ok_or_else(|| StoreError::UnknownColumn(name.clone()))?;
        if picked.contains(&pos) {
            return Err(StoreError::DuplicateColumn(name.clone()));
        }
        picked.push(pos);
    }
    Ok(picked)
}

/// Column headings for the picked fields; array fields expand into
/// `name[1]`, `name[2]`, ...
fn headings(schema: &Schema, picked: &[usize]) -> Vec<CellValue> {
    let mut out = Vec::new();
    for &pos in picked {
        let field = &schema.fields()[pos];
        match &field.dtype {
            DataType::Array { array } => {
                out.extend((1..=array.len()).map(|i| CellValue::Text(format!("{}[{i}]", field.name))));
            }
            _ => out.push(CellValue::Text(field.name.clone())),
        }
    }
    out
}

impl<S: ArrayStore> Session<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, SessionConfig::default())
    }

    pub fn with_config(store: S, config: SessionConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn classify(&self, path: &str) -> Result<Classification> {
        Ok(classify(&self.store, location(path))?)
    }

    fn require_exists(&self, path: &str) -> Result<()> {
        if classify(&self.store, path)?.valid {
            Ok(())
        } else {
            Err(StoreError::NotFound(absolute(path)))
        }
    }

    /// `Ok(true)` when a container already sits at `path`.
    fn require_available(&self, path: &str, kind: NodeKind) -> Result<bool> {
        match availability(&self.store, path, kind)? {
            Availability::Free => Ok(false),
            Availability::Reuse => Ok(true),
            Availability::Blocked(reason) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(path, %reason, "creation rejected");
                Err(StoreError::PathUnavailable {
                    path: absolute(path),
                    reason,
                })
            }
        }
    }

    fn leaf(&self, path: &str) -> Result<(Shape, DataType)> {
        self.require_exists(path)?;
        if self.store.node_kind(path)? != Some(NodeKind::Leaf) {
            return Err(StoreError::WrongKind {
                path: absolute(path),
                expected: "an array or table",
            });
        }
        let missing = || StoreError::NotFound(absolute(path));
        let shape = self.store.shape(path)?.ok_or_else(missing)?;
        let dtype = self.store.element_type(path)?.ok_or_else(missing)?;
        Ok((shape, dtype))
    }

    fn table(&self, path: &str) -> Result<(Shape, Schema)> {
        let (shape, dtype) = self.leaf(path)?;
        match dtype {
            DataType::Compound { schema } if shape.rank() == 1 => Ok((shape, schema)),
            _ => Err(StoreError::WrongKind {
                path: absolute(path),
                expected: "a table",
            }),
        }
    }

    fn check_rows(&self, rows: usize) -> Result<()> {
        if rows > self.config.max_rows {
            return Err(StoreError::TooManyRows {
                rows,
                limit: self.config.max_rows,
            });
        }
        Ok(())
    }

    fn check_cols(&self, cols: usize) -> Result<()> {
        if cols > self.config.max_cols {
            return Err(StoreError::TooManyColumns {
                cols,
                limit: self.config.max_cols,
            });
        }
        Ok(())
    }

    /* ───────────────────────────── Creation ───────────────────────────── */

    /// Ensure a group exists at `path`, creating missing parents. An
    /// existing group (including the root) is left as it is.
    pub fn new_group(&mut self, path: &str) -> Result<()> {
        if self.require_available(path, NodeKind::Container)? {
            return Ok(());
        }
        self.store.create_container(path)?;
        #[cfg(feature = "tracing")]
        tracing::info!(path, "created group");
        Ok(())
    }

    /// Create a plain array from a size grid and a property list.
    pub fn new_array(&mut self, path: &str, size: &[Vec<i64>], plist: &str) -> Result<()> {
        let shape = parse_dimensions(size)?;
        let props = parse_properties(plist)?;

        let dtype = match &props.dtype {
            Some(desc) => desc.dtype.clone(),
            None => DataType::scalar(self.config.default_dtype),
        };
        if !matches!(dtype, DataType::Scalar { .. }) {
            return Err(StoreError::UnsupportedType(dtype.to_string()));
        }
        if let Some(chunks) = &props.chunks {
            if chunks.len() != shape.rank() {
                return Err(StoreError::ChunkRank {
                    expected: shape.rank(),
                    found: chunks.len(),
                });
            }
        }
        let fill = props
            .effective_fill()
            .map(|lit| Datum::from_fill(&dtype, lit))
            .transpose()?;

        self.require_available(path, NodeKind::Leaf)?;
        let spec = LeafSpec {
            chunks: props.chunks,
            deflate: props.deflate,
            fletcher32: props.fletcher32,
            shuffle: props.shuffle,
            fill,
            ..LeafSpec::new(shape, dtype)
        };
        #[cfg(feature = "tracing")]
        tracing::info!(path, shape = %spec.shape, dtype = %spec.dtype, "created array");
        self.store.create_leaf(path, spec)?;
        Ok(())
    }

    /// Create an empty, growable table from a schema heading.
    pub fn new_table(&mut self, path: &str, heading: &str, plist: &str) -> Result<()> {
        let schema = parse_schema(heading)?;
        let props = parse_properties(plist)?;

        if props.dtype.is_some() {
            return Err(StoreError::PropertyNotApplicable(PropertyKey::Datatype));
        }
        if props.fill.is_some() {
            return Err(StoreError::PropertyNotApplicable(PropertyKey::FillValue));
        }
        if let Some(chunks) = &props.chunks {
            if chunks.len() != 1 {
                return Err(StoreError::ChunkRank {
                    expected: 1,
                    found: chunks.len(),
                });
            }
        }
        for field in schema.fields() {
            if let Some(lit) = &field.fill {
                Datum::from_fill(&field.dtype, lit)?;
            }
        }

        self.require_available(path, NodeKind::Leaf)?;
        let shape = Shape::new(vec![Dim::unlimited(0)])?;
        let spec = LeafSpec {
            chunks: props.chunks,
            deflate: props.deflate.or(self.config.default_table_deflate),
            fletcher32: props.fletcher32,
            shuffle: props.shuffle,
            ..LeafSpec::new(shape, DataType::compound(schema))
        };
        #[cfg(feature = "tracing")]
        tracing::info!(path, dtype = %spec.dtype, "created table");
        self.store.create_leaf(path, spec)?;
        Ok(())
    }

    /* ───────────────────────────── Writes ───────────────────────────── */

    /// Write a grid into an array, creating it when nothing is at `path`.
    /// A new array takes the grid's shape (`(rows,)` for a single column)
    /// and an element type inferred from the cells; coordinates only
    /// apply to existing arrays. Returns the array's shape afterwards.
    pub fn write_array(&mut self, path: &str, grid: &Grid, spec: &SelectionSpec) -> Result<Shape> {
        let (rows, cols) = grid_shape(grid).ok_or(StoreError::RaggedGrid)?;

        if !classify(&self.store, path)?.valid {
            self.require_available(path, NodeKind::Leaf)?;
            let scalar = infer_scalar(grid.iter().flatten());
            let data = grid
                .iter()
                .flatten()
                .map(|c| Datum::coerce(c, scalar))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            let extents = if cols == 1 {
                vec![rows as u64]
            } else {
                vec![rows as u64, cols as u64]
            };
            let shape = Shape::fixed(&extents)?;
            #[cfg(feature = "tracing")]
            {
                if spec != &SelectionSpec::default() {
                    tracing::debug!(path, "coordinates ignored for a new array");
                }
                tracing::info!(path, shape = %shape, dtype = %scalar, "created array from grid");
            }
            let selection = Hyperslab::full(&shape);
            self.store
                .create_leaf(path, LeafSpec::new(shape.clone(), DataType::scalar(scalar)))?;
            self.store.write_range(path, &selection, data)?;
            return Ok(shape);
        }

        let (shape, dtype) = self.leaf(path)?;
        let DataType::Scalar { scalar } = dtype else {
            return Err(StoreError::UnsupportedType(dtype.to_string()));
        };
        let plan = normalize_write(&shape, spec, &[rows as u64, cols as u64])?;
        let data = grid
            .iter()
            .flatten()
            .map(|c| Datum::coerce(c, scalar))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let shape = match plan.new_shape {
            Some(grown) => {
                self.store.resize(path, &grown)?;
                grown
            }
            None => shape,
        };
        self.store.write_range(path, &plan.selection, data)?;
        Ok(shape)
    }

    /// Append whole rows to the end of a rank-1 table or array. Returns
    /// the number of rows written.
    pub fn append_rows(&mut self, path: &str, grid: &Grid) -> Result<u64> {
        let (rows, _) = grid_shape(grid).ok_or(StoreError::RaggedGrid)?;
        let (shape, dtype) = self.leaf(path)?;
        let records = grid
            .iter()
            .map(|row| Datum::from_cells(&dtype, row))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let plan = normalize_append(&shape, rows as u64)?;

        if let Some(grown) = &plan.new_shape {
            self.store.resize(path, grown)?;
        }
        self.store.write_range(path, &plan.selection, records)?;
        #[cfg(feature = "tracing")]
        tracing::info!(path, rows, "appended rows");
        Ok(rows as u64)
    }

    /// Overwrite a column subset of consecutive table rows starting at the
    /// 1-based `first_row` (default 1), growing the table as needed.
    /// Fields outside the subset keep their values (or the fill value for
    /// new rows). Returns the number of rows written.
    pub fn write_rows(
        &mut self,
        path: &str,
        grid: &Grid,
        columns: Option<&[String]>,
        first_row: Option<i64>,
    ) -> Result<u64> {
        let (rows, _) = grid_shape(grid).ok_or(StoreError::RaggedGrid)?;
        let (shape, schema) = self.table(path)?;
        let picked = pick_columns(&schema, columns)?;

        let width: usize = picked.iter().map(|&p| schema.fields()[p].dtype.width()).sum();
        let mut patches = Vec::with_capacity(rows);
        for row in grid {
            if row.len() != width {
                return Err(ValueError::Width {
                    expected: width,
                    found: row.len(),
                }
                .into());
            }
            let mut offset = 0;
            let mut patch = Vec::with_capacity(picked.len());
            for &pos in &picked {
                let dtype = &schema.fields()[pos].dtype;
                let w = dtype.width();
                patch.push((pos, Datum::from_cells(dtype, &row[offset..offset + w])?));
                offset += w;
            }
            patches.push(patch);
        }

        let first = first_row.unwrap_or(1);
        let spec = SelectionSpec::new()
            .first([first])
            .last([first.saturating_add(rows as i64 - 1)]);
        let plan = normalize_write(&shape, &spec, &[rows as u64])?;

        if let Some(grown) = &plan.new_shape {
            self.store.resize(path, grown)?;
        }
        let mut records = self.store.read_range(path, &plan.selection)?;
        for (record, patch) in records.iter_mut().zip(patches) {
            let Datum::Record(items) = record else {
                return Err(NamespaceError::Backend(format!(
                    "`{}` holds a non-record element",
                    absolute(path)
                ))
                .into());
            };
            for (pos, value) in patch {
                if let Some(slot) = items.get_mut(pos) {
                    *slot = value;
                }
            }
        }
        self.store.write_range(path, &plan.selection, records)?;
        #[cfg(feature = "tracing")]
        tracing::info!(path, rows, first, "wrote rows");
        Ok(rows as u64)
    }

    /* ───────────────────────────── Reads ───────────────────────────── */

    /// Read a rank-1 or rank-2 array into display cells. Rank-1 arrays
    /// come back as a single column.
    pub fn read_array(&self, path: &str, spec: &SelectionSpec) -> Result<Grid> {
        let (shape, dtype) = self.leaf(path)?;
        if !matches!(dtype, DataType::Scalar { .. }) {
            return Err(StoreError::UnsupportedType(dtype.to_string()));
        }
        if !(1..=2).contains(&shape.rank()) {
            return Err(StoreError::UnsupportedRank(shape.rank()));
        }
        let selection = normalize_read(&shape, spec)?;
        let counts = selection.counts();
        let cols = counts.get(1).copied().unwrap_or(1) as usize;
        self.check_rows(counts[0] as usize)?;
        self.check_cols(cols)?;

        #[cfg(feature = "tracing")]
        if hexad_common::narrows_lossily(&dtype) {
            tracing::warn!(path, dtype = %dtype, "integers wider than 32 bits may wrap");
        }
        let display = narrow(&dtype);
        let data = self.store.read_range(path, &selection)?;
        let mut cells = Vec::with_capacity(data.len());
        for datum in &data {
            datum.narrow_into(&display, &mut cells);
        }
        Ok(cells.chunks(cols).map(<[CellValue]>::to_vec).collect())
    }

    /// Read table rows: a heading line, then one line per selected row.
    pub fn read_table(
        &self,
        path: &str,
        columns: Option<&[String]>,
        spec: &SelectionSpec,
    ) -> Result<Grid> {
        let (shape, schema) = self.table(path)?;
        let picked = pick_columns(&schema, columns)?;
        self.check_cols(picked.iter().map(|&p| schema.fields()[p].dtype.width()).sum())?;
        let heading = headings(&schema, &picked);

        if shape.is_empty() && spec == &SelectionSpec::default() {
            return Ok(vec![heading]);
        }
        let selection = normalize_read(&shape, spec)?;
        self.check_rows(selection.len() as usize + 1)?;

        #[cfg(feature = "tracing")]
        if picked
            .iter()
            .any(|&p| hexad_common::narrows_lossily(&schema.fields()[p].dtype))
        {
            tracing::warn!(path, "integers wider than 32 bits may wrap");
        }
        let displays: Vec<_> = picked
            .iter()
            .map(|&p| (p, narrow(&schema.fields()[p].dtype)))
            .collect();

        let mut grid = Vec::with_capacity(selection.len() as usize + 1);
        grid.push(heading);
        for record in self.store.read_range(path, &selection)? {
            let Datum::Record(items) = record else {
                return Err(NamespaceError::Backend(format!(
                    "`{}` holds a non-record element",
                    absolute(path)
                ))
                .into());
            };
            let mut line = Vec::new();
            for (pos, display) in &displays {
                if let Some(item) = items.get(*pos) {
                    item.narrow_into(display, &mut line);
                }
            }
            grid.push(line);
        }
        Ok(grid)
    }

    /* ───────────────────────────── Attributes ───────────────────────────── */

    pub fn read_attribute(&self, path: &str, name: &str) -> Result<CellValue> {
        let path = location(path);
        self.require_exists(path)?;
        self.store
            .attribute(path, name)?
            .map(attribute_to_cell)
            .ok_or_else(|| StoreError::NoSuchAttribute {
                path: absolute(path),
                name: name.to_string(),
            })
    }

    /// Create or overwrite an attribute. Integral numbers that fit 32 bits
    /// are stored as integers, other numbers as floats, text as strings.
    pub fn write_attribute(&mut self, path: &str, name: &str, value: &CellValue) -> Result<()> {
        if name.is_empty() {
            return Err(StoreError::EmptyAttributeName);
        }
        let path = location(path);
        self.require_exists(path)?;
        let datum = cell_to_attribute(value)?;
        self.store.set_attribute(path, name, datum)?;
        Ok(())
    }

    /* ───────────────────────────── Listings ───────────────────────────── */

    /// Key/value description of one object or link, cut off at the row
    /// limit.
    pub fn get_info(&self, path: &str) -> Result<Vec<InfoRow>> {
        let path = location(path);
        self.require_exists(path)?;
        let mut rows = listing::info(&self.store, path)?;
        rows.truncate(self.config.max_rows);
        Ok(rows)
    }

    /// The object at `path` and everything below it, one row each. The
    /// heading line counts against the row limit.
    pub fn show_list(&self, path: &str) -> Result<Vec<ListRow>> {
        let path = location(path);
        self.require_exists(path)?;
        let rows = listing::list(&self.store, path)?;
        self.check_rows(rows.len() + 1)?;
        Ok(rows)
    }

    pub fn show_tree(&self, path: &str) -> Result<Tree> {
        let path = location(path);
        self.require_exists(path)?;
        let tree = listing::tree(&self.store, path)?;
        self.check_rows(tree.rows.len())?;
        // column 0 holds the row index
        self.check_cols(tree.max_col + 1)?;
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexad_common::LinkKind;
    use hexad_core::{Blocker, Namespace, SelectionError, is_available_for_create};
    use hexad_parse::SchemaError;

    fn session() -> Session {
        Session::new(MemoryStore::new())
    }

    fn ints(values: &[i64]) -> Grid {
        values.iter().map(|&v| vec![CellValue::Int(v)]).collect()
    }

    #[test]
    fn new_group_is_idempotent_and_root_is_a_no_op() {
        let mut s = session();
        s.new_group("/").unwrap();
        s.new_group("A/B").unwrap();
        s.new_group("/A/B").unwrap();
        assert_eq!(
            s.classify("/A").unwrap(),
            Classification {
                valid: true,
                link: Some(LinkKind::Hard)
            }
        );
    }

    #[test]
    fn leaves_block_creation_below_and_at_them() {
        let mut s = session();
        s.new_array("/A/v", &[vec![10]], "").unwrap();
        assert!(!is_available_for_create(s.store(), "/A/v", NodeKind::Leaf).unwrap());
        assert!(matches!(
            s.new_group("/A/v/x"),
            Err(StoreError::PathUnavailable {
                reason: Blocker::Intermediate { .. },
                ..
            })
        ));
        assert!(matches!(
            s.new_array("/A/v", &[vec![10]], ""),
            Err(StoreError::PathUnavailable {
                reason: Blocker::Occupied { .. },
                ..
            })
        ));
    }

    #[test]
    fn new_array_applies_properties() {
        let mut s = session();
        s.new_array(
            "/m",
            &[vec![4], vec![-2]],
            "DATATYPE,int16:7,CHUNKSIZE,[2 2],DEFLATE,6",
        )
        .unwrap();
        let shape = s.store().shape("/m").unwrap().unwrap();
        assert_eq!(shape.bounds(), vec![Some(4), None]);
        let layout = s.store().layout("/m").unwrap();
        assert_eq!(layout.chunks, Some(vec![2, 2]));
        assert_eq!(layout.deflate, Some(6));
        assert_eq!(s.store().fill("/m").unwrap(), Some(&Datum::Int(7)));
    }

    #[test]
    fn new_array_rejects_bad_chunks_and_compound_types() {
        let mut s = session();
        assert!(matches!(
            s.new_array("/m", &[vec![4, 4]], "CHUNKSIZE,[2]"),
            Err(StoreError::ChunkRank {
                expected: 2,
                found: 1
            })
        ));
        assert!(matches!(
            s.new_array("/m", &[vec![4]], "DATATYPE,int[3]"),
            Err(StoreError::UnsupportedType(_))
        ));
        assert!(!s.classify("/m").unwrap().valid);
    }

    #[test]
    fn tables_default_to_compression_level_four() {
        let mut s = session();
        s.new_table("/t", "x,int,y,double", "").unwrap();
        assert_eq!(s.store().layout("/t").unwrap().deflate, Some(4));
        assert_eq!(
            s.store().shape("/t").unwrap().unwrap().bounds(),
            vec![None]
        );

        let mut s = Session::with_config(MemoryStore::new(), SessionConfig::uncompressed());
        s.new_table("/t", "x,int", "").unwrap();
        assert_eq!(s.store().layout("/t").unwrap().deflate, None);
    }

    #[test]
    fn tables_reject_element_properties() {
        let mut s = session();
        assert!(matches!(
            s.new_table("/t", "x,int", "DATATYPE,int"),
            Err(StoreError::PropertyNotApplicable(PropertyKey::Datatype))
        ));
        assert!(matches!(
            s.new_table("/t", "x,uint8:300", ""),
            Err(StoreError::Value(_))
        ));
    }

    #[test]
    fn write_array_creates_then_extends() {
        let mut s = session();
        let shape = s
            .write_array("/v", &ints(&[1, 2, 3]), &SelectionSpec::default())
            .unwrap();
        assert_eq!(shape.extents(), vec![3]);
        assert_eq!(
            s.read_array("/v", &SelectionSpec::default()).unwrap(),
            ints(&[1, 2, 3])
        );

        s.new_array("/g", &[vec![-2]], "DATATYPE,int32").unwrap();
        let shape = s
            .write_array("/g", &ints(&[5, 6]), &SelectionSpec::new().first([4]).last([5]))
            .unwrap();
        assert_eq!(shape.extents(), vec![5]);
        assert_eq!(
            s.read_array("/g", &SelectionSpec::default()).unwrap(),
            ints(&[0, 0, 0, 5, 6])
        );
    }

    #[test]
    fn write_past_a_fixed_bound_is_rejected() {
        let mut s = session();
        s.new_array("/f", &[vec![3]], "DATATYPE,int").unwrap();
        assert!(matches!(
            s.write_array("/f", &ints(&[1, 2]), &SelectionSpec::new().first([3]).last([4])),
            Err(StoreError::Selection(SelectionError::CannotExtend { .. }))
        ));
    }

    #[test]
    fn unallocatable_growth_is_an_error() {
        let mut s = session();
        s.new_array("/g", &[vec![-2]], "DATATYPE,int32").unwrap();
        let far = 1i64 << 60;
        assert!(matches!(
            s.write_array("/g", &ints(&[1]), &SelectionSpec::new().first([far]).last([far])),
            Err(StoreError::Namespace(NamespaceError::Backend(_)))
        ));
        assert_eq!(s.store().shape("/g").unwrap().unwrap().extents(), vec![2]);
        assert_eq!(
            s.read_array("/g", &SelectionSpec::default()).unwrap(),
            ints(&[0, 0])
        );

        s.new_array("/m", &[vec![-1, -1]], "DATATYPE,int32").unwrap();
        assert!(matches!(
            s.write_array(
                "/m",
                &ints(&[1]),
                &SelectionSpec::new().first([far, far]).last([far, far])
            ),
            Err(StoreError::Selection(SelectionError::Shape(_)))
        ));
    }

    #[test]
    fn oversized_array_fields_are_rejected_before_creation() {
        let mut s = session();
        for heading in ["v,int[4294967296 4294967296]", "v,int[100000 100000]"] {
            assert!(matches!(
                s.new_table("/t", heading, ""),
                Err(StoreError::Schema(SchemaError::InvalidArrayDims(_)))
            ));
        }
        assert!(!s.classify("/t").unwrap().valid);
    }

    #[test]
    fn read_array_strides_and_narrows() {
        let mut s = session();
        s.new_array("/w", &[vec![4]], "DATATYPE,int64").unwrap();
        let big = i64::from(i32::MAX) + 1;
        s.write_array(
            "/w",
            &ints(&[1, 2, 3, big]),
            &SelectionSpec::default(),
        )
        .unwrap();
        let got = s
            .read_array("/w", &SelectionSpec::new().first([2]).step([2]))
            .unwrap();
        assert_eq!(got, ints(&[2, i64::from(i32::MIN)]));
    }

    #[test]
    fn append_and_read_table() {
        let mut s = session();
        s.new_table("/t", "name,string,v,int[2]", "").unwrap();
        let rows = vec![
            vec!["a".into(), CellValue::Int(1), CellValue::Int(2)],
            vec!["b".into(), CellValue::Int(3), CellValue::Int(4)],
        ];
        assert_eq!(s.append_rows("/t", &rows).unwrap(), 2);
        assert_eq!(s.append_rows("/t", &rows).unwrap(), 2);

        let grid = s.read_table("/t", None, &SelectionSpec::default()).unwrap();
        assert_eq!(grid.len(), 5);
        assert_eq!(
            grid[0],
            vec![
                CellValue::from("name"),
                CellValue::from("v[1]"),
                CellValue::from("v[2]")
            ]
        );
        assert_eq!(grid[4], rows[1]);

        let only_v = vec!["v".to_string()];
        let grid = s
            .read_table("/t", Some(only_v.as_slice()), &SelectionSpec::new().first([2]).last([3]))
            .unwrap();
        assert_eq!(grid[1], vec![CellValue::Int(3), CellValue::Int(4)]);
        assert_eq!(grid.len(), 3);
    }

    #[test]
    fn empty_table_reads_as_heading_only() {
        let mut s = session();
        s.new_table("/t", "x,int", "").unwrap();
        assert_eq!(
            s.read_table("/t", None, &SelectionSpec::default()).unwrap(),
            vec![vec![CellValue::from("x")]]
        );
        assert!(matches!(
            s.read_table("/t", None, &SelectionSpec::new().first([1])),
            Err(StoreError::Selection(SelectionError::EmptySelection { dim: 0 }))
        ));
    }

    #[test]
    fn unknown_and_repeated_columns() {
        let mut s = session();
        s.new_table("/t", "x,int", "").unwrap();
        let cols = vec!["y".to_string()];
        assert!(matches!(
            s.read_table("/t", Some(cols.as_slice()), &SelectionSpec::default()),
            Err(StoreError::UnknownColumn(c)) if c == "y"
        ));
        let cols = vec!["x".to_string(), "x".to_string()];
        assert!(matches!(
            s.write_rows("/t", &ints(&[1]), Some(cols.as_slice()), None),
            Err(StoreError::DuplicateColumn(_))
        ));
    }

    #[test]
    fn write_rows_patches_a_column_subset() {
        let mut s = session();
        s.new_table("/t", "x,int,y,double:1.5", "").unwrap();
        let cols = vec!["x".to_string()];
        assert_eq!(
            s.write_rows("/t", &ints(&[7, 8]), Some(cols.as_slice()), Some(2))
                .unwrap(),
            2
        );

        let grid = s.read_table("/t", None, &SelectionSpec::default()).unwrap();
        assert_eq!(
            grid[1..],
            [
                vec![CellValue::Int(0), CellValue::Number(1.5)],
                vec![CellValue::Int(7), CellValue::Number(1.5)],
                vec![CellValue::Int(8), CellValue::Number(1.5)],
            ]
        );
    }

    #[test]
    fn append_requires_rank_one() {
        let mut s = session();
        s.new_array("/m", &[vec![-2, -2]], "").unwrap();
        assert!(matches!(
            s.append_rows("/m", &ints(&[1])),
            Err(StoreError::Selection(SelectionError::NotExtensible { rank: 2 }))
        ));
    }

    #[test]
    fn attributes_follow_cell_kinds() {
        let mut s = session();
        s.new_group("/A").unwrap();
        s.write_attribute("/A", "n", &CellValue::Number(3.0)).unwrap();
        s.write_attribute("/A", "x", &CellValue::Number(2.5)).unwrap();
        s.write_attribute("", "title", &CellValue::from("root"))
            .unwrap();
        assert_eq!(s.store().attribute("/A", "n").unwrap(), Some(Datum::Int(3)));
        assert_eq!(s.read_attribute("/A", "x").unwrap(), CellValue::Number(2.5));
        assert_eq!(
            s.read_attribute("/", "title").unwrap(),
            CellValue::from("root")
        );
        assert!(matches!(
            s.read_attribute("/A", "nope"),
            Err(StoreError::NoSuchAttribute { .. })
        ));
        assert!(matches!(
            s.write_attribute("/A", "", &CellValue::Int(1)),
            Err(StoreError::EmptyAttributeName)
        ));
        assert!(matches!(
            s.write_attribute("/B", "n", &CellValue::Int(1)),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn listing_limits() {
        let config = SessionConfig {
            max_rows: 3,
            max_cols: 2,
            ..SessionConfig::default()
        };
        let mut s = Session::with_config(MemoryStore::new(), config);
        s.new_group("/A").unwrap();
        assert_eq!(s.show_list("").unwrap().len(), 2);
        s.new_group("/B").unwrap();
        assert!(matches!(
            s.show_list("/"),
            Err(StoreError::TooManyRows { rows: 4, limit: 3 })
        ));
        assert_eq!(s.show_tree("/B").unwrap().max_col, 1);

        s.new_group("/A/C").unwrap();
        assert!(matches!(
            s.show_tree("/"),
            Err(StoreError::TooManyRows { rows: 4, .. })
        ));
        assert!(matches!(
            s.show_tree("/A"),
            Err(StoreError::TooManyColumns { cols: 3, limit: 2 })
        ));
    }
}
