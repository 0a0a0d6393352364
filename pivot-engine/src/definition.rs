//! FILENAME: pivot-engine/src/definition.rs
//! Pivot Definition - What to pivot and how.
//!
//! This module contains all the types needed to DESCRIBE a pivot:
//! - the column selector (record -> column key)
//! - the row selector (record -> single or composite row key)
//! - the data selector (matching records -> cell value)
//! - serializable options (column order, empty cell policy)
//!
//! The row-key shape is explicit configuration. It is validated once before
//! any record is grouped and never re-inspected per record.

use std::fmt;

use pivot_value::CellValue;
use serde::{Deserialize, Serialize};

use crate::error::{PivotError, SelectorResult};

/// Fallible record -> value function (column selector, row-key accessor).
pub type ValueSelectorFn<'a, T> = Box<dyn Fn(&T) -> SelectorResult<CellValue> + 'a>;

/// Fallible sub-collection -> value function (data selector).
pub type DataSelectorFn<'a, T> = Box<dyn Fn(&[&T]) -> SelectorResult<CellValue> + 'a>;

// ============================================================================
// AGGREGATION
// ============================================================================

/// Built-in aggregation functions, see [`crate::aggregate::aggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AggregationType {
    #[default]
    Sum,
    Count,
    Average,
    Min,
    Max,
    CountNumbers,
    StdDev,
    StdDevP,
    Var,
    VarP,
    Product,
}

// ============================================================================
// ROW KEY
// ============================================================================

/// Shape of the row key. Decides the leading columns of the output:
/// one for a single field, one per member for a composite key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowKeyShape {
    SingleField(String),
    /// Member field names in declaration order.
    CompositeFields(Vec<String>),
}

impl RowKeyShape {
    /// Field names in output order.
    pub fn field_names(&self) -> &[String] {
        match self {
            RowKeyShape::SingleField(name) => std::slice::from_ref(name),
            RowKeyShape::CompositeFields(names) => names,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, RowKeyShape::CompositeFields(_))
    }
}

/// Row-key configuration: a shape plus one accessor per field.
pub struct RowSelector<'a, T> {
    shape: RowKeyShape,
    accessors: Vec<ValueSelectorFn<'a, T>>,
}

impl<'a, T> RowSelector<'a, T> {
    /// Row key made of one field.
    pub fn single<F, V>(name: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&T) -> V + 'a,
        V: Into<CellValue>,
    {
        Self::try_single(name, move |record: &T| Ok(accessor(record).into()))
    }

    /// Row key made of one field whose accessor can fail.
    pub fn try_single<F>(name: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&T) -> SelectorResult<CellValue> + 'a,
    {
        RowSelector {
            shape: RowKeyShape::SingleField(name.into()),
            accessors: vec![Box::new(accessor)],
        }
    }

    /// Empty composite key; add members with [`RowSelector::field`].
    pub fn composite() -> Self {
        RowSelector {
            shape: RowKeyShape::CompositeFields(Vec::new()),
            accessors: Vec::new(),
        }
    }

    /// Appends a member field to the key.
    /// Calling this on a single-field key turns it into a composite key.
    pub fn field<F, V>(self, name: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&T) -> V + 'a,
        V: Into<CellValue>,
    {
        self.try_field(name, move |record: &T| Ok(accessor(record).into()))
    }

    /// Appends a member field whose accessor can fail.
    pub fn try_field<F>(mut self, name: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&T) -> SelectorResult<CellValue> + 'a,
    {
        let name = name.into();
        self.shape = match self.shape {
            RowKeyShape::SingleField(first) => RowKeyShape::CompositeFields(vec![first, name]),
            RowKeyShape::CompositeFields(mut names) => {
                names.push(name);
                RowKeyShape::CompositeFields(names)
            }
        };
        self.accessors.push(Box::new(accessor));
        self
    }

    /// Builds a selector from an explicit shape and accessor list.
    /// The pairing is checked when the pivot runs.
    pub fn from_parts(shape: RowKeyShape, accessors: Vec<ValueSelectorFn<'a, T>>) -> Self {
        RowSelector { shape, accessors }
    }

    pub fn shape(&self) -> &RowKeyShape {
        &self.shape
    }

    pub(crate) fn accessors(&self) -> &[ValueSelectorFn<'a, T>] {
        &self.accessors
    }

    /// Validates the shape and returns the field names in output order.
    pub fn resolve(&self) -> Result<&[String], PivotError> {
        let names = self.shape.field_names();

        if names.is_empty() {
            return Err(PivotError::UnsupportedRowKeyShape(
                "composite row key has no fields".to_string(),
            ));
        }
        if names.len() != self.accessors.len() {
            return Err(PivotError::UnsupportedRowKeyShape(format!(
                "{} field name(s) but {} accessor(s)",
                names.len(),
                self.accessors.len()
            )));
        }
        for (i, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(PivotError::UnsupportedRowKeyShape(format!(
                    "row key field {} has an empty name",
                    i
                )));
            }
            if names[..i].contains(name) {
                return Err(PivotError::UnsupportedRowKeyShape(format!(
                    "row key field '{}' is declared twice",
                    name
                )));
            }
        }

        Ok(names)
    }
}

impl<T> fmt::Debug for RowSelector<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowSelector")
            .field("shape", &self.shape)
            .field("accessors", &self.accessors.len())
            .finish()
    }
}

// ============================================================================
// OPTIONS
// ============================================================================

/// Order of the data columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ColumnOrder {
    /// Order in which column keys first appear in the source.
    #[default]
    DataSourceOrder,
    Ascending,
    Descending,
}

/// What to put in a cell whose (row, column) pair matched no record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum EmptyCellPolicy {
    /// Leave the cell unset.
    #[default]
    Unset,
    /// Store a fixed value.
    Fill(CellValue),
    /// Call the data selector with an empty sub-collection.
    Aggregate,
}

/// Serializable pivot options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PivotOptions {
    #[serde(default)]
    pub column_order: ColumnOrder,

    #[serde(default)]
    pub empty_cells: EmptyCellPolicy,
}

impl PivotOptions {
    /// Parses options from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, PivotError> {
        Ok(serde_json::from_str(json)?)
    }
}

// ============================================================================
// MAIN DEFINITION STRUCT
// ============================================================================

/// The complete definition of a pivot over records of type `T`.
pub struct PivotDefinition<'a, T> {
    pub(crate) column: ValueSelectorFn<'a, T>,
    pub(crate) row: RowSelector<'a, T>,
    pub(crate) data: DataSelectorFn<'a, T>,
    pub(crate) options: PivotOptions,
}

impl<'a, T> PivotDefinition<'a, T> {
    /// Creates a definition from infallible selectors.
    pub fn new<C, K, D, V>(column: C, row: RowSelector<'a, T>, data: D) -> Self
    where
        C: Fn(&T) -> K + 'a,
        K: Into<CellValue>,
        D: Fn(&[&T]) -> V + 'a,
        V: Into<CellValue>,
    {
        Self::try_new(
            move |record: &T| Ok(column(record).into()),
            row,
            move |group: &[&T]| Ok(data(group).into()),
        )
    }

    /// Creates a definition from selectors that can fail.
    pub fn try_new<C, D>(column: C, row: RowSelector<'a, T>, data: D) -> Self
    where
        C: Fn(&T) -> SelectorResult<CellValue> + 'a,
        D: Fn(&[&T]) -> SelectorResult<CellValue> + 'a,
    {
        PivotDefinition {
            column: Box::new(column),
            row,
            data: Box::new(data),
            options: PivotOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PivotOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &PivotOptions {
        &self.options
    }

    pub fn row_selector(&self) -> &RowSelector<'a, T> {
        &self.row
    }
}

impl<T> fmt::Debug for PivotDefinition<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PivotDefinition")
            .field("row", &self.row)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SelectorError;

    struct Sale {
        dept: &'static str,
        region: &'static str,
    }

    #[test]
    fn single_field_resolves_to_one_name() {
        let row = RowSelector::single("dept", |s: &Sale| s.dept);
        assert_eq!(row.resolve().unwrap(), &["dept".to_string()]);
        assert!(!row.shape().is_composite());
    }

    #[test]
    fn composite_keeps_declaration_order() {
        let row = RowSelector::composite()
            .field("region", |s: &Sale| s.region)
            .field("dept", |s: &Sale| s.dept);
        assert_eq!(
            row.resolve().unwrap(),
            &["region".to_string(), "dept".to_string()]
        );
        assert!(row.shape().is_composite());
    }

    #[test]
    fn field_on_single_promotes_to_composite() {
        let row = RowSelector::single("dept", |s: &Sale| s.dept).field("region", |s: &Sale| s.region);
        assert_eq!(
            row.shape(),
            &RowKeyShape::CompositeFields(vec!["dept".to_string(), "region".to_string()])
        );
    }

    #[test]
    fn empty_composite_is_rejected() {
        let row: RowSelector<'_, Sale> = RowSelector::composite();
        assert!(matches!(row.resolve(), Err(PivotError::UnsupportedRowKeyShape(_))));
    }

    #[test]
    fn duplicate_field_is_rejected() {
        let row = RowSelector::composite()
            .field("dept", |s: &Sale| s.dept)
            .field("dept", |s: &Sale| s.region);
        assert!(matches!(row.resolve(), Err(PivotError::UnsupportedRowKeyShape(_))));
    }

    #[test]
    fn blank_field_name_is_rejected() {
        let row = RowSelector::single("  ", |s: &Sale| s.dept);
        assert!(matches!(row.resolve(), Err(PivotError::UnsupportedRowKeyShape(_))));
    }

    #[test]
    fn accessor_count_mismatch_is_rejected() {
        let dept: ValueSelectorFn<'_, Sale> =
            Box::new(|s: &Sale| Ok::<_, SelectorError>(CellValue::from(s.dept)));
        let row = RowSelector::from_parts(
            RowKeyShape::CompositeFields(vec!["dept".to_string(), "region".to_string()]),
            vec![dept],
        );
        assert!(matches!(row.resolve(), Err(PivotError::UnsupportedRowKeyShape(_))));
    }

    #[test]
    fn options_default_from_empty_json() {
        let options = PivotOptions::from_json("{}").unwrap();
        assert_eq!(options, PivotOptions::default());
        assert_eq!(options.column_order, ColumnOrder::DataSourceOrder);
        assert_eq!(options.empty_cells, EmptyCellPolicy::Unset);
    }

    #[test]
    fn options_parse_fill_policy() {
        let options = PivotOptions::from_json(
            r#"{"column_order":"Ascending","empty_cells":{"Fill":{"Number":0.0}}}"#,
        )
        .unwrap();
        assert_eq!(options.column_order, ColumnOrder::Ascending);
        assert_eq!(options.empty_cells, EmptyCellPolicy::Fill(CellValue::Number(0.0)));
    }

    #[test]
    fn options_reject_malformed_json() {
        assert!(matches!(
            PivotOptions::from_json("{\"column_order\":"),
            Err(PivotError::InvalidOptions(_))
        ));
    }
}
