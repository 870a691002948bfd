pub mod display;
pub mod path;
pub mod shape;
pub mod types;
pub mod value;

pub use display::*;
pub use path::{Link, LinkKind, NodeKind, ROOT, SEPARATOR, absolute, basename, is_root, join, segments};
pub use shape::*;
pub use types::*;
pub use value::*;
