//! Capabilities the front end needs from a hierarchical array store.
//!
//! [`Namespace`] is the read-only half used by path resolution;
//! [`ArrayStore`] adds creation, resizing, ranged I/O and attributes.
//! Paths are absolute (`/A/B`) or relative to the root (`A/B`).

use std::fmt::Debug;

use hexad_common::{DataType, Datum, Link, LinkKind, NodeKind, Shape, is_root};

use crate::hyperslab::Hyperslab;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NamespaceError {
    #[error("no object at `{0}`")]
    NotFound(String),
    #[error("`{0}` is already in use")]
    Occupied(String),
    #[error("`{path}` is not a {expected:?}")]
    WrongKind { path: String, expected: NodeKind },
    #[error("{0}")]
    Backend(String),
}

/* ───────────────────────────── Namespace ───────────────────────────── */

pub trait Namespace: Debug {
    /// The link stored under `path`, reached through hard-linked
    /// containers only. `Ok(None)` when nothing is there; the root is not
    /// a link and also yields `Ok(None)`.
    fn link(&self, path: &str) -> Result<Option<Link>, NamespaceError>;

    /// Current shape of the leaf at `path`.
    fn shape(&self, path: &str) -> Result<Option<Shape>, NamespaceError>;

    /// Element type of the leaf at `path`.
    fn element_type(&self, path: &str) -> Result<Option<DataType>, NamespaceError>;

    fn exists(&self, path: &str) -> Result<bool, NamespaceError> {
        Ok(is_root(path) || self.link(path)?.is_some())
    }

    fn classify_link(&self, path: &str) -> Result<Option<LinkKind>, NamespaceError> {
        Ok(self.link(path)?.map(|l| l.kind()))
    }

    /// Kind of the node behind a hard link at `path`; the root is a container.
    fn node_kind(&self, path: &str) -> Result<Option<NodeKind>, NamespaceError> {
        if is_root(path) {
            return Ok(Some(NodeKind::Container));
        }
        Ok(self.link(path)?.and_then(|l| l.node()))
    }
}

impl<T: Namespace + ?Sized> Namespace for &T {
    fn link(&self, path: &str) -> Result<Option<Link>, NamespaceError> {
        (**self).link(path)
    }
    fn shape(&self, path: &str) -> Result<Option<Shape>, NamespaceError> {
        (**self).shape(path)
    }
    fn element_type(&self, path: &str) -> Result<Option<DataType>, NamespaceError> {
        (**self).element_type(path)
    }
}

/* ───────────────────────────── ArrayStore ───────────────────────────── */

/// Storage options for a new leaf. Chunking, compression and checksum
/// flags are layout hints the store may record but need not honor.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafSpec {
    pub shape: Shape,
    pub dtype: DataType,
    pub chunks: Option<Vec<u64>>,
    pub deflate: Option<u8>,
    pub fletcher32: bool,
    pub shuffle: bool,
    pub fill: Option<Datum>,
}

impl LeafSpec {
    pub fn new(shape: Shape, dtype: DataType) -> Self {
        Self {
            shape,
            dtype,
            chunks: None,
            deflate: None,
            fletcher32: false,
            shuffle: false,
            fill: None,
        }
    }
}

pub trait ArrayStore: Namespace {
    /// Create a container; missing intermediate containers are created too.
    fn create_container(&mut self, path: &str) -> Result<(), NamespaceError>;

    /// Create a leaf; missing intermediate containers are created too.
    fn create_leaf(&mut self, path: &str, spec: LeafSpec) -> Result<(), NamespaceError>;

    /// Change the current extents of a leaf. Existing elements keep their
    /// coordinates, new ones take the fill value.
    fn resize(&mut self, path: &str, shape: &Shape) -> Result<(), NamespaceError>;

    /// Elements of the selection, in row-major selection order.
    fn read_range(&self, path: &str, selection: &Hyperslab) -> Result<Vec<Datum>, NamespaceError>;

    /// Overwrite the selection with `data` (row-major selection order).
    fn write_range(
        &mut self,
        path: &str,
        selection: &Hyperslab,
        data: Vec<Datum>,
    ) -> Result<(), NamespaceError>;

    /// Links directly below the container at `path`, in store order.
    fn children(&self, path: &str) -> Result<Vec<(String, Link)>, NamespaceError>;

    /// Attributes of the object at `path`, in store order.
    fn attributes(&self, path: &str) -> Result<Vec<(String, Datum)>, NamespaceError>;

    fn attribute(&self, path: &str, name: &str) -> Result<Option<Datum>, NamespaceError>;

    fn set_attribute(&mut self, path: &str, name: &str, value: Datum) -> Result<(), NamespaceError>;
}
