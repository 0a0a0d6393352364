//! FILENAME: pivot-engine/src/lib.rs
//! Dynamic pivot transformer.
//!
//! Reshapes a materialized slice of records into rows x dynamic columns:
//! each distinct row key becomes a row, each distinct column key becomes a
//! column, and each cell holds a caller-supplied aggregation over the
//! records matching that pair. Shared value types come from `pivot-value`.
//!
//! Layers:
//! - `definition`: Selectors, row-key shape and options (what to pivot)
//! - `cache`: Column-key interning and row grouping (HOW we compute)
//! - `view`: Table, row objects and drill-down output (WHAT we return)
//! - `engine`: Calculation engine (HOW we calculate)
//! - `aggregate`: Built-in data selectors

pub mod logging;

pub mod aggregate;
pub mod cache;
pub mod definition;
pub mod engine;
pub mod error;
pub mod view;

pub use aggregate::{aggregate, AggregateAccumulator};
pub use definition::*;
pub use engine::{drill_down, to_rows, to_table, PivotCalculator, PivotExt};
pub use error::{PivotError, SelectorError, SelectorKind, SelectorResult};
pub use view::*;

pub use pivot_value::{CellError, CellValue, ValueKind};
