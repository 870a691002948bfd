//! Namespace paths, node kinds and link species.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const SEPARATOR: char = '/';
pub const ROOT: &str = "/";

/// What a hard link points at.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Holds named child links (a group).
    Container,
    /// An array or compound-record table.
    Leaf,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::Container => "container",
            NodeKind::Leaf => "leaf",
        })
    }
}

/// Species of a link, without its payload.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LinkKind {
    Hard,
    Soft,
    External,
    /// The link exists but its species is not recognised (e.g. user-defined).
    Unknown,
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LinkKind::Hard => "HardLink",
            LinkKind::Soft => "SoftLink",
            LinkKind::External => "ExternalLink",
            LinkKind::Unknown => "Unknown",
        })
    }
}

/// A link as stored under a name in a container. Soft and external links
/// are never followed by the addressing layer.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "link", rename_all = "lowercase"))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Link {
    Hard { node: NodeKind },
    Soft { target: String },
    External { file: String, target: String },
    Unknown,
}

impl Link {
    pub const fn kind(&self) -> LinkKind {
        match self {
            Link::Hard { .. } => LinkKind::Hard,
            Link::Soft { .. } => LinkKind::Soft,
            Link::External { .. } => LinkKind::External,
            Link::Unknown => LinkKind::Unknown,
        }
    }

    /// The node kind behind a hard link.
    pub const fn node(&self) -> Option<NodeKind> {
        match self {
            Link::Hard { node } => Some(*node),
            _ => None,
        }
    }

    pub const fn is_hard_container(&self) -> bool {
        matches!(
            self,
            Link::Hard {
                node: NodeKind::Container
            }
        )
    }
}

pub fn is_root(path: &str) -> bool {
    path == ROOT
}

/// Split a path into its segments. A leading separator is accepted (paths
/// are always resolved from the root); empty segments from a trailing or
/// doubled separator make the path malformed and yield `None`.
pub fn segments(path: &str) -> Option<Vec<&str>> {
    let body = path.strip_prefix(SEPARATOR).unwrap_or(path);
    if body.is_empty() {
        return None;
    }
    let parts: Vec<&str> = body.split(SEPARATOR).collect();
    if parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    Some(parts)
}

/// Absolute form of a path: `"A/B"` and `"/A/B"` both become `"/A/B"`.
pub fn absolute(path: &str) -> String {
    if path.starts_with(SEPARATOR) {
        path.to_string()
    } else {
        format!("{SEPARATOR}{path}")
    }
}

/// Join a parent path and a child name.
pub fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() || is_root(parent) {
        format!("{SEPARATOR}{name}")
    } else {
        format!("{}{SEPARATOR}{name}", parent.trim_end_matches(SEPARATOR))
    }
}

/// Final segment of a path; `"/"` for the root.
pub fn basename(path: &str) -> &str {
    if is_root(path) {
        return ROOT;
    }
    path.rsplit(SEPARATOR).next().unwrap_or(path)
}
