//! FILENAME: pivot-value/src/lib.rs
//! PURPOSE: Shared value types for the pivot transformer.
//! CONTEXT: Re-exports public types for use by `pivot-engine` and callers.

pub mod cell;

// Re-export commonly used types at the crate root
pub use cell::{CellError, CellValue, ValueKind};
