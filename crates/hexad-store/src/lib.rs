//! Spreadsheet-facing operations over a hierarchical array store.
//!
//! [`Session`] is the entry point: it parses user input with
//! `hexad-parse`, resolves paths and selections with `hexad-core` and
//! drives any [`hexad_core::ArrayStore`]. [`MemoryStore`] is the bundled
//! store; [`JsonBackend`] persists it.

pub mod backends;
pub mod error;
pub mod listing;
pub mod memory;
pub mod session;

#[cfg(feature = "json")]
pub use backends::{JsonBackend, SaveDestination};
pub use error::{Result, StoreError};
pub use listing::{InfoRow, ListRow, ObjectType, Tree, list_grid};
pub use memory::{Layout, MemoryStore};
pub use session::{MAX_COLS, MAX_ROWS, Session, SessionConfig};

// Re-export for convenience
pub use hexad_common::{CellValue, Grid};
pub use hexad_core::SelectionSpec;
