//! Path validation and the "may I create something here" predicate.
//!
//! Neither function follows soft or external links: a link that is not a
//! hard link to a container blocks any path that walks through it.

use std::fmt;

use hexad_common::{LinkKind, NodeKind, SEPARATOR, is_root, segments};

use crate::namespace::{Namespace, NamespaceError};

/// Result of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// The path is the root or names an existing link.
    pub valid: bool,
    /// Species of that link; `None` for the root and for missing paths.
    pub link: Option<LinkKind>,
}

impl Classification {
    const ROOT: Classification = Classification {
        valid: true,
        link: None,
    };

    const MISSING: Classification = Classification {
        valid: false,
        link: None,
    };
}

pub fn classify<N: Namespace + ?Sized>(
    ns: &N,
    path: &str,
) -> Result<Classification, NamespaceError> {
    if is_root(path) {
        return Ok(Classification::ROOT);
    }
    if segments(path).is_none() {
        return Ok(Classification::MISSING);
    }
    Ok(match ns.link(path)? {
        Some(link) => Classification {
            valid: true,
            link: Some(link.kind()),
        },
        None => Classification::MISSING,
    })
}

/// Why a path cannot take a new object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Blocker {
    /// Empty, trailing or doubled separators.
    Malformed,
    /// Leaves cannot live at the root.
    RootLeaf,
    /// An intermediate segment is not a hard-linked container.
    Intermediate { prefix: String, link: LinkKind },
    /// Something already sits at the final segment.
    Occupied { link: LinkKind },
}

impl fmt::Display for Blocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Blocker::Malformed => f.write_str("malformed path"),
            Blocker::RootLeaf => f.write_str("the root is a group"),
            Blocker::Intermediate { prefix, link } => {
                write!(f, "`{prefix}` is not a group ({link})")
            }
            Blocker::Occupied { link } => write!(f, "the name is taken ({link})"),
        }
    }
}

/// Outcome of [`availability`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    /// Nothing at the path yet; the object (and any missing parents) can
    /// be created.
    Free,
    /// A container already exists and the caller asked for one.
    Reuse,
    Blocked(Blocker),
}

impl Availability {
    pub fn is_available(&self) -> bool {
        !matches!(self, Availability::Blocked(_))
    }
}

/// Decide whether an object of kind `desired` may be created at `path`.
///
/// The root is always reusable as a container and never available for a
/// leaf. Intermediate segments must be hard-linked containers; the walk
/// stops at the first missing one. Leaves never replace anything.
pub fn availability<N: Namespace + ?Sized>(
    ns: &N,
    path: &str,
    desired: NodeKind,
) -> Result<Availability, NamespaceError> {
    if is_root(path) {
        return Ok(match desired {
            NodeKind::Container => Availability::Reuse,
            NodeKind::Leaf => Availability::Blocked(Blocker::RootLeaf),
        });
    }
    if path.is_empty() || path.ends_with(SEPARATOR) {
        return Ok(Availability::Blocked(Blocker::Malformed));
    }
    let Some(parts) = segments(path) else {
        return Ok(Availability::Blocked(Blocker::Malformed));
    };

    let mut prefix = String::with_capacity(path.len() + 1);
    let last = parts.len() - 1;
    for (i, part) in parts.iter().enumerate() {
        prefix.push(SEPARATOR);
        prefix.push_str(part);

        let Some(link) = ns.link(&prefix)? else {
            return Ok(Availability::Free);
        };

        if i < last {
            if !link.is_hard_container() {
                return Ok(Availability::Blocked(Blocker::Intermediate {
                    prefix,
                    link: link.kind(),
                }));
            }
            continue;
        }

        return Ok(match (desired, link.is_hard_container()) {
            (NodeKind::Container, true) => Availability::Reuse,
            _ => Availability::Blocked(Blocker::Occupied { link: link.kind() }),
        });
    }

    // segments() never yields an empty list
    Ok(Availability::Blocked(Blocker::Malformed))
}

pub fn is_available_for_create<N: Namespace + ?Sized>(
    ns: &N,
    path: &str,
    desired: NodeKind,
) -> Result<bool, NamespaceError> {
    Ok(availability(ns, path, desired)?.is_available())
}
