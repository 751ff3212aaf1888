//! In-memory CIF data model

pub mod block;
pub mod container;
pub mod table;
pub mod value;

pub use block::Block;
pub use container::CifFile;
pub use table::{Table, TableError};
pub use value::Value;
