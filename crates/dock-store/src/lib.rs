//! # dock-store
//!
//! Store backends for the dock loader.
//!
//! - [`MemoryStore`]: ordered in-process tables. Used for dry runs and tests.
//! - [`DuckStore`]: a persistent `DuckDB` file with one table per entity type
//!   and one link table per collection field, created from the schema on open.

pub mod duck;
mod fields;
pub mod memory;

pub use duck::DuckStore;
pub use memory::MemoryStore;
