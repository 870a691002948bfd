//! A rooted tree of groups and leaves held entirely in memory.
//!
//! Leaf data is stored row-major, one [`Datum`] per element. Soft,
//! external and unknown links are recorded by name but never followed.

use std::collections::BTreeMap;

use hexad_common::{DataType, Datum, Link, NodeKind, Shape, absolute, is_root, segments};
use hexad_core::{ArrayStore, Hyperslab, LeafSpec, Namespace, NamespaceError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryStore {
    root: Group,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Group {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attrs: BTreeMap<String, Datum>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    children: BTreeMap<String, Entry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum Entry {
    Group(Group),
    Leaf(Leaf),
    Soft { target: String },
    External { file: String, target: String },
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Leaf {
    shape: Shape,
    dtype: DataType,
    #[serde(flatten)]
    layout: Layout,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fill: Option<Datum>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attrs: BTreeMap<String, Datum>,
    #[serde(default)]
    data: Vec<Datum>,
}

/// Storage hints recorded for a leaf at creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deflate: Option<u8>,
    #[serde(default)]
    pub fletcher32: bool,
    #[serde(default)]
    pub shuffle: bool,
}

impl Leaf {
    fn fill_value(&self) -> Datum {
        self.fill.clone().unwrap_or_else(|| Datum::zero(&self.dtype))
    }

    fn check_selection(&self, path: &str, selection: &Hyperslab) -> Result<Vec<u64>, NamespaceError> {
        let extents = self.shape.extents();
        let inside = selection.rank() == extents.len()
            && selection
                .dims()
                .iter()
                .zip(&extents)
                .all(|(d, e)| d.end() <= *e);
        if !inside {
            return Err(NamespaceError::Backend(format!(
                "selection outside the extents of `{}`",
                absolute(path)
            )));
        }
        Ok(selection.offsets(&extents))
    }
}

impl Entry {
    fn link(&self) -> Link {
        match self {
            Entry::Group(_) => Link::Hard {
                node: NodeKind::Container,
            },
            Entry::Leaf(_) => Link::Hard {
                node: NodeKind::Leaf,
            },
            Entry::Soft { target } => Link::Soft {
                target: target.clone(),
            },
            Entry::External { file, target } => Link::External {
                file: file.clone(),
                target: target.clone(),
            },
            Entry::Unknown => Link::Unknown,
        }
    }
}

fn not_found(path: &str) -> NamespaceError {
    NamespaceError::NotFound(absolute(path))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, path: &str) -> Option<&Entry> {
        let parts = segments(path)?;
        let (last, parents) = parts.split_last()?;
        let mut group = &self.root;
        for name in parents {
            match group.children.get(*name)? {
                Entry::Group(g) => group = g,
                _ => return None,
            }
        }
        group.children.get(*last)
    }

    fn entry_mut(&mut self, path: &str) -> Option<&mut Entry> {
        let parts = segments(path)?;
        let (last, parents) = parts.split_last()?;
        let mut group = &mut self.root;
        for name in parents {
            match group.children.get_mut(*name)? {
                Entry::Group(g) => group = g,
                _ => return None,
            }
        }
        group.children.get_mut(*last)
    }

    fn leaf(&self, path: &str) -> Result<&Leaf, NamespaceError> {
        match self.entry(path) {
            Some(Entry::Leaf(leaf)) => Ok(leaf),
            Some(_) => Err(NamespaceError::WrongKind {
                path: absolute(path),
                expected: NodeKind::Leaf,
            }),
            None => Err(not_found(path)),
        }
    }

    fn leaf_mut(&mut self, path: &str) -> Result<&mut Leaf, NamespaceError> {
        match self.entry_mut(path) {
            Some(Entry::Leaf(leaf)) => Ok(leaf),
            Some(_) => Err(NamespaceError::WrongKind {
                path: absolute(path),
                expected: NodeKind::Leaf,
            }),
            None => Err(not_found(path)),
        }
    }

    fn attrs(&self, path: &str) -> Result<&BTreeMap<String, Datum>, NamespaceError> {
        if is_root(path) {
            return Ok(&self.root.attrs);
        }
        match self.entry(path) {
            Some(Entry::Group(g)) => Ok(&g.attrs),
            Some(Entry::Leaf(l)) => Ok(&l.attrs),
            _ => Err(not_found(path)),
        }
    }

    fn attrs_mut(&mut self, path: &str) -> Result<&mut BTreeMap<String, Datum>, NamespaceError> {
        if is_root(path) {
            return Ok(&mut self.root.attrs);
        }
        match self.entry_mut(path) {
            Some(Entry::Group(g)) => Ok(&mut g.attrs),
            Some(Entry::Leaf(l)) => Ok(&mut l.attrs),
            _ => Err(not_found(path)),
        }
    }

    /// Parent group of `path` and the final name, creating missing groups
    /// along the way.
    fn parent_mut(&mut self, path: &str) -> Result<(&mut Group, String), NamespaceError> {
        let parts = segments(path).ok_or_else(|| not_found(path))?;
        let Some((last, parents)) = parts.split_last() else {
            return Err(not_found(path));
        };
        let mut group = &mut self.root;
        let mut prefix = String::new();
        for name in parents {
            prefix.push('/');
            prefix.push_str(name);
            let entry = group
                .children
                .entry((*name).to_string())
                .or_insert_with(|| Entry::Group(Group::default()));
            group = match entry {
                Entry::Group(g) => g,
                _ => {
                    return Err(NamespaceError::WrongKind {
                        path: prefix,
                        expected: NodeKind::Container,
                    });
                }
            };
        }
        Ok((group, (*last).to_string()))
    }

    fn insert(&mut self, path: &str, entry: Entry) -> Result<(), NamespaceError> {
        let (group, name) = self.parent_mut(path)?;
        if group.children.contains_key(&name) {
            return Err(NamespaceError::Occupied(absolute(path)));
        }
        group.children.insert(name, entry);
        Ok(())
    }

    /// Record a soft link to `target`; the target need not exist.
    pub fn link_soft(&mut self, path: &str, target: impl Into<String>) -> Result<(), NamespaceError> {
        self.insert(
            path,
            Entry::Soft {
                target: target.into(),
            },
        )
    }

    pub fn link_external(
        &mut self,
        path: &str,
        file: impl Into<String>,
        target: impl Into<String>,
    ) -> Result<(), NamespaceError> {
        self.insert(
            path,
            Entry::External {
                file: file.into(),
                target: target.into(),
            },
        )
    }

    /// Record a link whose species the store cannot name.
    pub fn link_unknown(&mut self, path: &str) -> Result<(), NamespaceError> {
        self.insert(path, Entry::Unknown)
    }

    /// Storage hints of the leaf at `path`.
    pub fn layout(&self, path: &str) -> Result<&Layout, NamespaceError> {
        Ok(&self.leaf(path)?.layout)
    }

    /// Fill value of the leaf at `path`, if one was given at creation.
    pub fn fill(&self, path: &str) -> Result<Option<&Datum>, NamespaceError> {
        Ok(self.leaf(path)?.fill.as_ref())
    }
}

/// A buffer of `len` copies of `fill`, or an error when it cannot be
/// allocated.
fn filled(path: &str, len: u64, fill: Datum) -> Result<Vec<Datum>, NamespaceError> {
    let too_large = || {
        NamespaceError::Backend(format!(
            "cannot hold {len} elements for `{}`",
            absolute(path)
        ))
    };
    let len = usize::try_from(len).map_err(|_| too_large())?;
    let mut out = Vec::new();
    out.try_reserve_exact(len).map_err(|_| too_large())?;
    out.resize(len, fill);
    Ok(out)
}

/// Move row-major `data` laid out for `from` into `out`, laid out for
/// `to`, keeping every element whose coordinates survive.
fn relayout(data: Vec<Datum>, from: &[u64], to: &[u64], out: &mut [Datum]) {
    let mut coords = vec![0u64; from.len()];
    for (i, value) in data.into_iter().enumerate() {
        let mut rest = i as u64;
        for d in (0..from.len()).rev() {
            coords[d] = rest % from[d];
            rest /= from[d];
        }
        if coords.iter().zip(to).any(|(c, e)| c >= e) {
            continue;
        }
        let target = coords.iter().zip(to).fold(0u64, |acc, (c, e)| acc * e + c);
        if let Some(slot) = out.get_mut(target as usize) {
            *slot = value;
        }
    }
}

impl Namespace for MemoryStore {
    fn link(&self, path: &str) -> Result<Option<Link>, NamespaceError> {
        if is_root(path) {
            return Ok(None);
        }
        Ok(self.entry(path).map(Entry::link))
    }

    fn shape(&self, path: &str) -> Result<Option<Shape>, NamespaceError> {
        Ok(match self.entry(path) {
            Some(Entry::Leaf(leaf)) => Some(leaf.shape.clone()),
            _ => None,
        })
    }

    fn element_type(&self, path: &str) -> Result<Option<DataType>, NamespaceError> {
        Ok(match self.entry(path) {
            Some(Entry::Leaf(leaf)) => Some(leaf.dtype.clone()),
            _ => None,
        })
    }
}

impl ArrayStore for MemoryStore {
    fn create_container(&mut self, path: &str) -> Result<(), NamespaceError> {
        if is_root(path) {
            return Ok(());
        }
        let (group, name) = self.parent_mut(path)?;
        match group.children.get(&name) {
            Some(Entry::Group(_)) => Ok(()),
            Some(_) => Err(NamespaceError::Occupied(absolute(path))),
            None => {
                group.children.insert(name, Entry::Group(Group::default()));
                Ok(())
            }
        }
    }

    fn create_leaf(&mut self, path: &str, spec: LeafSpec) -> Result<(), NamespaceError> {
        let LeafSpec {
            shape,
            dtype,
            chunks,
            deflate,
            fletcher32,
            shuffle,
            fill,
        } = spec;
        let initial = fill.clone().unwrap_or_else(|| Datum::zero(&dtype));
        let data = filled(path, shape.len(), initial)?;
        self.insert(
            path,
            Entry::Leaf(Leaf {
                shape,
                dtype,
                layout: Layout {
                    chunks,
                    deflate,
                    fletcher32,
                    shuffle,
                },
                fill,
                attrs: BTreeMap::new(),
                data,
            }),
        )
    }

    fn resize(&mut self, path: &str, shape: &Shape) -> Result<(), NamespaceError> {
        let leaf = self.leaf_mut(path)?;
        if shape.rank() != leaf.shape.rank() {
            return Err(NamespaceError::Backend(format!(
                "cannot resize `{}` from rank {} to rank {}",
                absolute(path),
                leaf.shape.rank(),
                shape.rank()
            )));
        }
        let mut out = filled(path, shape.len(), leaf.fill_value())?;
        let data = std::mem::take(&mut leaf.data);
        relayout(data, &leaf.shape.extents(), &shape.extents(), &mut out);
        leaf.data = out;
        leaf.shape = shape.clone();
        Ok(())
    }

    fn read_range(&self, path: &str, selection: &Hyperslab) -> Result<Vec<Datum>, NamespaceError> {
        let leaf = self.leaf(path)?;
        let offsets = leaf.check_selection(path, selection)?;
        offsets
            .into_iter()
            .map(|o| {
                leaf.data.get(o as usize).cloned().ok_or_else(|| {
                    NamespaceError::Backend(format!("`{}` holds too few elements", absolute(path)))
                })
            })
            .collect()
    }

    fn write_range(
        &mut self,
        path: &str,
        selection: &Hyperslab,
        data: Vec<Datum>,
    ) -> Result<(), NamespaceError> {
        let leaf = self.leaf_mut(path)?;
        let offsets = leaf.check_selection(path, selection)?;
        if offsets.len() != data.len() {
            return Err(NamespaceError::Backend(format!(
                "{} values for a selection of {}",
                data.len(),
                offsets.len()
            )));
        }
        for (o, value) in offsets.into_iter().zip(data) {
            let slot = leaf.data.get_mut(o as usize).ok_or_else(|| {
                NamespaceError::Backend(format!("`{}` holds too few elements", absolute(path)))
            })?;
            *slot = value;
        }
        Ok(())
    }

    fn children(&self, path: &str) -> Result<Vec<(String, Link)>, NamespaceError> {
        let group = if is_root(path) {
            &self.root
        } else {
            match self.entry(path) {
                Some(Entry::Group(g)) => g,
                Some(_) => {
                    return Err(NamespaceError::WrongKind {
                        path: absolute(path),
                        expected: NodeKind::Container,
                    });
                }
                None => return Err(not_found(path)),
            }
        };
        Ok(group
            .children
            .iter()
            .map(|(name, entry)| (name.clone(), entry.link()))
            .collect())
    }

    fn attributes(&self, path: &str) -> Result<Vec<(String, Datum)>, NamespaceError> {
        Ok(self
            .attrs(path)?
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn attribute(&self, path: &str, name: &str) -> Result<Option<Datum>, NamespaceError> {
        Ok(self.attrs(path)?.get(name).cloned())
    }

    fn set_attribute(&mut self, path: &str, name: &str, value: Datum) -> Result<(), NamespaceError> {
        self.attrs_mut(path)?.insert(name.to_string(), value);
        Ok(())
    }
}
