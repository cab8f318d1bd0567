//! Item system: the item forest, its arena index and the template table.

pub mod graph;
pub mod templates;
pub mod types;

pub use graph::*;
pub use templates::*;
pub use types::*;
