//! Flat renderings of the namespace: key/value info, the object list and
//! the indented tree.
//!
//! Walks visit children in store order and recurse through hard-linked
//! groups only. Results are collected into an accumulator passed down the
//! walk rather than any shared cursor.

use std::fmt;

use hexad_common::{CellValue, Datum, Grid, Link, NodeKind, absolute, basename, is_root, join};
use hexad_core::{ArrayStore, NamespaceError};

/// One `key | value` line of [`crate::Session::get_info`].
#[derive(Debug, Clone, PartialEq)]
pub struct InfoRow {
    pub key: String,
    pub value: CellValue,
}

impl InfoRow {
    fn new(key: impl Into<String>, value: impl Into<CellValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn to_cells(&self) -> Vec<CellValue> {
        vec![CellValue::Text(self.key.clone()), self.value.clone()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Group,
    Array,
    Table,
    SoftLink,
    ExternalLink,
    Unknown,
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ObjectType::Group => "GROUP",
            ObjectType::Array => "ARRAY",
            ObjectType::Table => "TABLE",
            ObjectType::SoftLink => "SOFTLINK",
            ObjectType::ExternalLink => "EXTERNALLINK",
            ObjectType::Unknown => "UNKNOWN",
        })
    }
}

/// One object of [`crate::Session::show_list`]. Columns that do not apply
/// to the object's kind stay `None` and render as empty cells.
#[derive(Debug, Clone, PartialEq)]
pub struct ListRow {
    pub index: usize,
    pub object_type: ObjectType,
    pub name: String,
    pub attributes: Option<usize>,
    pub links: Option<usize>,
    pub dtype: Option<String>,
    pub rank: Option<usize>,
    pub space: Option<String>,
}

impl ListRow {
    pub const HEADINGS: [&'static str; 8] = [
        "INDEX",
        "OBJECT TYPE",
        "OBJECT NAME",
        "#ATTRIBUTES",
        "#LINKS",
        "DATA TYPE",
        "RANK",
        "DATA SPACE",
    ];

    fn bare(index: usize, object_type: ObjectType, name: String) -> Self {
        Self {
            index,
            object_type,
            name,
            attributes: None,
            links: None,
            dtype: None,
            rank: None,
            space: None,
        }
    }

    pub fn to_cells(&self) -> Vec<CellValue> {
        let count = |n: Option<usize>| n.map_or(CellValue::Empty, |n| CellValue::Int(n as i64));
        let text = |s: &Option<String>| s.clone().map_or(CellValue::Empty, CellValue::Text);
        vec![
            CellValue::Int(self.index as i64),
            CellValue::Text(self.object_type.to_string()),
            CellValue::Text(self.name.clone()),
            count(self.attributes),
            count(self.links),
            text(&self.dtype),
            count(self.rank),
            text(&self.space),
        ]
    }
}

/// Heading line followed by one line per object.
pub fn list_grid(rows: &[ListRow]) -> Grid {
    let mut grid = Vec::with_capacity(rows.len() + 1);
    grid.push(ListRow::HEADINGS.iter().map(|h| CellValue::from(*h)).collect());
    grid.extend(rows.iter().map(ListRow::to_cells));
    grid
}

/// `(column, name)` lines in document order; the row is the position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    pub rows: Vec<(usize, String)>,
    pub max_col: usize,
}

impl Tree {
    fn push(&mut self, col: usize, name: String) {
        self.max_col = self.max_col.max(col);
        self.rows.push((col, name));
    }

    /// Lay the tree out on a grid: column 0 holds the row index and each
    /// name sits in its own column.
    pub fn to_grid(&self) -> Grid {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, (col, name))| {
                let mut line = vec![CellValue::Empty; self.max_col + 1];
                line[0] = CellValue::Int(i as i64);
                line[*col] = CellValue::Text(name.clone());
                line
            })
            .collect()
    }
}

fn link_type(link: &Link, store: &impl ArrayStore, path: &str) -> Result<ObjectType, NamespaceError> {
    Ok(match link {
        Link::Hard {
            node: NodeKind::Container,
        } => ObjectType::Group,
        Link::Hard {
            node: NodeKind::Leaf,
        } => {
            let compound = store
                .element_type(path)?
                .is_some_and(|t| t.is_compound());
            if compound {
                ObjectType::Table
            } else {
                ObjectType::Array
            }
        }
        Link::Soft { .. } => ObjectType::SoftLink,
        Link::External { .. } => ObjectType::ExternalLink,
        Link::Unknown => ObjectType::Unknown,
    })
}

/// The link under `path`, with the root standing in as a hard group.
fn link_at<S: ArrayStore + ?Sized>(store: &S, path: &str) -> Result<Link, NamespaceError> {
    if is_root(path) {
        return Ok(Link::Hard {
            node: NodeKind::Container,
        });
    }
    store
        .link(path)?
        .ok_or_else(|| NamespaceError::NotFound(absolute(path)))
}

fn list_row<S: ArrayStore>(
    store: &S,
    index: usize,
    path: &str,
    link: &Link,
) -> Result<ListRow, NamespaceError> {
    let object_type = link_type(link, store, path)?;
    Ok(match object_type {
        ObjectType::Group => ListRow {
            attributes: Some(store.attributes(path)?.len()),
            links: Some(store.children(path)?.len()),
            ..ListRow::bare(index, object_type, absolute(path))
        },
        ObjectType::Array | ObjectType::Table => {
            let shape = store.shape(path)?;
            ListRow {
                attributes: Some(store.attributes(path)?.len()),
                dtype: store.element_type(path)?.map(|t| t.to_string()),
                rank: shape.as_ref().map(|s| s.rank()),
                space: shape.map(|s| s.to_string()),
                ..ListRow::bare(index, object_type, basename(path).to_string())
            }
        }
        _ => ListRow::bare(index, object_type, basename(path).to_string()),
    })
}

/// Rows for the object at `path` and, for a group, everything below it.
pub(crate) fn list<S: ArrayStore>(store: &S, path: &str) -> Result<Vec<ListRow>, NamespaceError> {
    let link = link_at(store, path)?;
    let mut rows = vec![list_row(store, 0, path, &link)?];
    if link.is_hard_container() {
        list_children(store, path, &mut rows)?;
    }
    Ok(rows)
}

fn list_children<S: ArrayStore>(
    store: &S,
    group: &str,
    rows: &mut Vec<ListRow>,
) -> Result<(), NamespaceError> {
    for (name, link) in store.children(group)? {
        let path = join(group, &name);
        rows.push(list_row(store, rows.len(), &path, &link)?);
        if link.is_hard_container() {
            list_children(store, &path, rows)?;
        }
    }
    Ok(())
}

/// The start object sits in column 1; each level below moves one column
/// right. Groups show their full path, everything else its name.
pub(crate) fn tree<S: ArrayStore>(store: &S, path: &str) -> Result<Tree, NamespaceError> {
    let link = link_at(store, path)?;
    let mut acc = Tree::default();
    acc.push(1, absolute(path));
    if link.is_hard_container() {
        tree_children(store, path, 2, &mut acc)?;
    }
    Ok(acc)
}

fn tree_children<S: ArrayStore>(
    store: &S,
    group: &str,
    col: usize,
    acc: &mut Tree,
) -> Result<(), NamespaceError> {
    for (name, link) in store.children(group)? {
        let path = join(group, &name);
        if link.is_hard_container() {
            acc.push(col, path.clone());
            tree_children(store, &path, col + 1, acc)?;
        } else {
            acc.push(col, name);
        }
    }
    Ok(())
}

fn attribute_cell(value: &Datum) -> CellValue {
    match value {
        Datum::Int(i) => CellValue::Int(*i),
        Datum::UInt(u) => CellValue::Number(*u as f64),
        Datum::Float(x) => CellValue::Number(*x),
        other => CellValue::Text(other.to_string()),
    }
}

pub(crate) fn info<S: ArrayStore>(store: &S, path: &str) -> Result<Vec<InfoRow>, NamespaceError> {
    let mut rows = Vec::new();
    match link_at(store, path)? {
        Link::Hard { node } => {
            let attrs = store.attributes(path)?;
            if !attrs.is_empty() {
                rows.push(InfoRow::new("Number of attributes:", attrs.len() as i64));
                rows.extend(
                    attrs
                        .iter()
                        .map(|(name, value)| InfoRow::new(name.clone(), attribute_cell(value))),
                );
            }
            match node {
                NodeKind::Container => {
                    let children = store.children(path)?;
                    rows.push(InfoRow::new("Number of links:", children.len() as i64));
                    if !children.is_empty() {
                        rows.push(InfoRow::new("Link names:", CellValue::Empty));
                        rows.extend(children.into_iter().map(|(name, _)| InfoRow::new("", name)));
                    }
                }
                NodeKind::Leaf => {
                    if let Some(shape) = store.shape(path)? {
                        rows.push(InfoRow::new("Number of elements:", shape.len() as i64));
                        rows.push(InfoRow::new("Shape:", shape.to_string()));
                    }
                    if let Some(dtype) = store.element_type(path)? {
                        rows.push(InfoRow::new("Type:", dtype.to_string()));
                    }
                }
            }
        }
        Link::Soft { target } => {
            rows.push(InfoRow::new("Link:", "SoftLink"));
            rows.push(InfoRow::new("Destination:", target));
        }
        Link::External { file, target } => {
            rows.push(InfoRow::new("Link:", "ExternalLink"));
            rows.push(InfoRow::new(
                "Destination:",
                format!("file://{file}/{}", target.trim_start_matches('/')),
            ));
        }
        Link::Unknown => rows.push(InfoRow::new("Link:", "Unknown link type.")),
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use hexad_common::{DataType, Field, ScalarType, Schema, Shape};
    use hexad_core::LeafSpec;

    fn sample() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.create_container("/A/B").unwrap();
        store
            .create_leaf(
                "/A/v",
                LeafSpec::new(
                    Shape::fixed(&[7]).unwrap(),
                    DataType::scalar(ScalarType::Float64),
                ),
            )
            .unwrap();
        let schema = Schema::new(vec![Field::new("x", ScalarType::Int32)]).unwrap();
        store
            .create_leaf(
                "/t",
                LeafSpec::new(Shape::fixed(&[0]).unwrap(), DataType::compound(schema)),
            )
            .unwrap();
        store.link_soft("/s", "/A").unwrap();
        store
    }

    #[test]
    fn list_is_in_document_order() {
        let store = sample();
        let rows = list(&store, "/").unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["/", "/A", "/A/B", "v", "s", "t"]);
        let kinds: Vec<_> = rows.iter().map(|r| r.object_type).collect();
        assert_eq!(
            kinds,
            [
                ObjectType::Group,
                ObjectType::Group,
                ObjectType::Group,
                ObjectType::Array,
                ObjectType::SoftLink,
                ObjectType::Table
            ]
        );
        assert_eq!(rows[0].links, Some(3));
        assert_eq!(rows[3].space.as_deref(), Some("(7,)"));
        assert_eq!(rows[3].rank, Some(1));
        assert_eq!(list_grid(&rows)[0][1], CellValue::from("OBJECT TYPE"));
    }

    #[test]
    fn tree_columns_follow_depth() {
        let store = sample();
        let t = tree(&store, "/A").unwrap();
        assert_eq!(
            t.rows,
            vec![(1, "/A".into()), (2, "/A/B".into()), (2, "v".into())]
        );
        assert_eq!(t.max_col, 2);
        let grid = t.to_grid();
        assert_eq!(grid[2], vec![CellValue::Int(2), CellValue::Empty, "v".into()]);
    }

    #[test]
    fn info_for_groups_leaves_and_links() {
        let mut store = sample();
        store
            .set_attribute("/A", "unit", Datum::Text("m".into()))
            .unwrap();
        let rows = info(&store, "/A").unwrap();
        assert_eq!(rows[0], InfoRow::new("Number of attributes:", 1i64));
        assert_eq!(rows[1], InfoRow::new("unit", "m"));
        assert_eq!(rows[2], InfoRow::new("Number of links:", 2i64));
        assert_eq!(rows[4], InfoRow::new("", "B"));

        let rows = info(&store, "/A/v").unwrap();
        assert_eq!(rows[0], InfoRow::new("Number of elements:", 7i64));
        assert_eq!(rows[2], InfoRow::new("Type:", "float64"));

        let rows = info(&store, "/s").unwrap();
        assert_eq!(rows[1], InfoRow::new("Destination:", "/A"));

        store.link_external("/e", "other.h5", "/x/y").unwrap();
        let rows = info(&store, "/e").unwrap();
        assert_eq!(rows[1], InfoRow::new("Destination:", "file://other.h5/x/y"));
    }

    #[test]
    fn missing_objects_are_not_found() {
        let store = sample();
        assert_eq!(
            info(&store, "/nope"),
            Err(NamespaceError::NotFound("/nope".into()))
        );
    }
}
