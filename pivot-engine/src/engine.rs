//! FILENAME: pivot-engine/src/engine.rs
//! Pivot Engine - The calculation core that reshapes records into a pivot.
//!
//! This module takes a PivotDefinition (selectors + options) and a source
//! slice and produces a PivotTable (fixed schema) or PivotRecords.
//!
//! Algorithm:
//! 1. Resolve the row-key shape (field names, validated once)
//! 2. Evaluate the column selector per record and intern distinct keys
//! 3. Declare the schema: row-key fields, then one column per distinct key
//! 4. Group records by row key in first-encounter order
//! 5. For each (group, column) pair with matching records, run the data selector
//! 6. Fill in the row-key fields and emit the row

use pivot_value::CellValue;
use rustc_hash::FxHashSet;

use crate::cache::{CacheValue, ColumnId, ColumnKeyCache, RowGroup, RowGroups};
use crate::definition::{EmptyCellPolicy, PivotDefinition, RowSelector};
use crate::error::{PivotError, SelectorKind};
use crate::logging::{log_debug, log_info};
use crate::view::{
    ColumnType, DrillDownResult, PivotColumnDescriptor, PivotColumnType, PivotRecord,
    PivotTable,
};

// ============================================================================
// PIVOT CALCULATOR
// ============================================================================

/// Runs one pivot over one source slice.
pub struct PivotCalculator<'d, 'a, T> {
    definition: &'d PivotDefinition<'a, T>,
    source: &'d [T],

    /// Row-key field names in output order.
    row_names: Vec<String>,

    /// Distinct non-empty column keys.
    columns: ColumnKeyCache,

    /// Column key of each source record (None = empty key, no column).
    record_columns: Vec<Option<ColumnId>>,

    /// Records grouped by row key.
    groups: RowGroups,
}

impl<'d, 'a, T> PivotCalculator<'d, 'a, T> {
    /// Creates a new calculator instance.
    pub fn new(definition: &'d PivotDefinition<'a, T>, source: &'d [T]) -> Self {
        PivotCalculator {
            definition,
            source,
            row_names: Vec::new(),
            columns: ColumnKeyCache::new(),
            record_columns: Vec::new(),
            groups: RowGroups::new(),
        }
    }

    /// Executes the full calculation and returns the table.
    pub fn calculate(&mut self) -> Result<PivotTable, PivotError> {
        log_debug!(
            "PIVOT",
            "calculate: {} record(s), row key {:?}",
            self.source.len(),
            self.definition.row.shape()
        );

        // Step 1: Row-key shape
        self.resolve_row_key()?;

        // Step 2: Distinct column keys
        self.collect_column_keys()?;

        // Step 3: Schema
        let order = self.columns.ordered_ids(self.definition.options.column_order);
        let mut table = self.declare_schema(&order)?;

        // Step 4: Row groups
        self.group_rows()?;

        // Step 5-7: One row per group
        let mut positions = vec![0usize; self.columns.unique_count()];
        for (pos, &id) in order.iter().enumerate() {
            positions[id as usize] = pos;
        }
        for group in self.groups.iter() {
            let cells = self.compute_row(group, order.len(), &positions)?;
            table.push_row(cells);
        }

        log_info!(
            "PIVOT",
            "pivoted {} record(s) into {} row(s) x {} data column(s)",
            self.source.len(),
            table.row_count(),
            table.data_column_count()
        );
        Ok(table)
    }

    /// Validates the row-key configuration and caches its field names.
    fn resolve_row_key(&mut self) -> Result<(), PivotError> {
        self.row_names = self.definition.row.resolve()?.to_vec();
        Ok(())
    }

    /// Evaluates the column selector once per record.
    fn collect_column_keys(&mut self) -> Result<(), PivotError> {
        self.columns = ColumnKeyCache::new();
        self.record_columns = Vec::with_capacity(self.source.len());

        for record in self.source {
            let key = (self.definition.column)(record)
                .map_err(|e| PivotError::selector(SelectorKind::Column, e))?;
            let id = self.columns.intern(CacheValue::from(key));
            self.record_columns.push(id);
        }

        if self.columns.empty_count() > 0 {
            log_debug!(
                "PIVOT",
                "{} record(s) have an empty column key and feed no cell",
                self.columns.empty_count()
            );
        }
        Ok(())
    }

    /// Builds the column list: row-key fields, then data columns in `order`.
    fn declare_schema(&self, order: &[ColumnId]) -> Result<PivotTable, PivotError> {
        let mut table = PivotTable::new(&self.row_names);
        let mut seen: FxHashSet<String> = self.row_names.iter().cloned().collect();

        for &id in order {
            let key = self.columns.get_value(id).map(CellValue::from).unwrap_or_default();
            let name = key.display_value();
            if !seen.insert(name.clone()) {
                return Err(PivotError::DuplicateColumnName(name));
            }
            table.columns.push(PivotColumnDescriptor {
                name,
                column_type: PivotColumnType::Data,
                value_type: ColumnType::Unknown,
                key: Some(key),
            });
        }

        log_debug!("PIVOT", "schema: {:?}", table.data_column_names());
        Ok(table)
    }

    /// Groups records by row key, keeping first-encounter order.
    fn group_rows(&mut self) -> Result<(), PivotError> {
        self.groups = RowGroups::new();
        for (index, record) in self.source.iter().enumerate() {
            let key = row_key_of(&self.definition.row, &self.row_names, record)?;
            self.groups.add(key, index);
        }
        log_debug!("PIVOT", "{} row group(s)", self.groups.len());
        Ok(())
    }

    /// Computes the cells of one output row.
    fn compute_row(
        &self,
        group: &RowGroup,
        data_columns: usize,
        positions: &[usize],
    ) -> Result<Vec<Option<CellValue>>, PivotError> {
        // Split the group's records by column, preserving source order
        let mut buckets: Vec<Vec<&T>> = vec![Vec::new(); data_columns];
        for &member in &group.members {
            if let Some(id) = self.record_columns[member] {
                buckets[positions[id as usize]].push(&self.source[member]);
            }
        }

        let mut cells = Vec::with_capacity(self.row_names.len() + data_columns);
        cells.extend(group.key.iter().cloned().map(Some));

        for bucket in &buckets {
            let cell = if bucket.is_empty() {
                self.empty_cell()?
            } else {
                Some(self.run_data_selector(bucket)?)
            };
            cells.push(cell);
        }

        Ok(cells)
    }

    /// Value for a (row, column) pair with no matching records.
    fn empty_cell(&self) -> Result<Option<CellValue>, PivotError> {
        match &self.definition.options.empty_cells {
            EmptyCellPolicy::Unset => Ok(None),
            EmptyCellPolicy::Fill(value) => Ok(Some(value.clone())),
            EmptyCellPolicy::Aggregate => self.run_data_selector(&[]).map(Some),
        }
    }

    fn run_data_selector(&self, records: &[&T]) -> Result<CellValue, PivotError> {
        (self.definition.data)(records).map_err(|e| PivotError::selector(SelectorKind::Data, e))
    }
}

/// Evaluates every row-key accessor for one record.
fn row_key_of<T>(
    row: &RowSelector<'_, T>,
    names: &[String],
    record: &T,
) -> Result<Vec<CellValue>, PivotError> {
    row.accessors()
        .iter()
        .zip(names)
        .map(|(accessor, name)| {
            accessor(record).map_err(|e| PivotError::selector(SelectorKind::Row(name.clone()), e))
        })
        .collect()
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Pivots `source` into a fixed-schema table.
/// This is the main entry point for the calculation engine.
pub fn to_table<T>(source: &[T], definition: &PivotDefinition<'_, T>) -> Result<PivotTable, PivotError> {
    PivotCalculator::new(definition, source).calculate()
}

/// Pivots `source` into loosely-typed row objects, one per row key.
pub fn to_rows<T>(
    source: &[T],
    definition: &PivotDefinition<'_, T>,
) -> Result<Vec<PivotRecord>, PivotError> {
    Ok(to_table(source, definition)?.to_records())
}

/// Finds the source records feeding the cell at (`row_key`, `column_key`).
/// `row_key` holds one value per row-key field, in declaration order.
pub fn drill_down<T>(
    source: &[T],
    definition: &PivotDefinition<'_, T>,
    row_key: &[CellValue],
    column_key: &CellValue,
    max_records: usize,
) -> Result<DrillDownResult, PivotError> {
    let mut result = DrillDownResult::new(row_key.to_vec(), column_key.clone(), max_records);

    let mut calculator = PivotCalculator::new(definition, source);
    calculator.resolve_row_key()?;
    calculator.collect_column_keys()?;
    calculator.group_rows()?;

    let Some(column_id) = calculator.columns.lookup(&CacheValue::from(column_key)) else {
        return Ok(result);
    };
    let Some(group) = calculator.groups.find(row_key) else {
        return Ok(result);
    };

    for &member in &group.members {
        if calculator.record_columns[member] == Some(column_id) {
            result.total_count += 1;
            if result.source_rows.len() < max_records {
                result.source_rows.push(member);
            }
        }
    }

    result.is_truncated = result.total_count > max_records;
    Ok(result)
}

/// Pivot entry points as methods on a record slice.
pub trait PivotExt<T> {
    /// `source.to_pivot_table(column, row, data)`; see [`to_table`].
    fn to_pivot_table<'a, C, K, D, V>(
        &self,
        column: C,
        row: RowSelector<'a, T>,
        data: D,
    ) -> Result<PivotTable, PivotError>
    where
        T: 'a,
        C: Fn(&T) -> K + 'a,
        K: Into<CellValue>,
        D: Fn(&[&T]) -> V + 'a,
        V: Into<CellValue>;

    /// `source.to_pivot_rows(column, row, data)`; see [`to_rows`].
    fn to_pivot_rows<'a, C, K, D, V>(
        &self,
        column: C,
        row: RowSelector<'a, T>,
        data: D,
    ) -> Result<Vec<PivotRecord>, PivotError>
    where
        T: 'a,
        C: Fn(&T) -> K + 'a,
        K: Into<CellValue>,
        D: Fn(&[&T]) -> V + 'a,
        V: Into<CellValue>;
}

impl<T> PivotExt<T> for [T] {
    fn to_pivot_table<'a, C, K, D, V>(
        &self,
        column: C,
        row: RowSelector<'a, T>,
        data: D,
    ) -> Result<PivotTable, PivotError>
    where
        T: 'a,
        C: Fn(&T) -> K + 'a,
        K: Into<CellValue>,
        D: Fn(&[&T]) -> V + 'a,
        V: Into<CellValue>,
    {
        to_table(self, &PivotDefinition::new(column, row, data))
    }

    fn to_pivot_rows<'a, C, K, D, V>(
        &self,
        column: C,
        row: RowSelector<'a, T>,
        data: D,
    ) -> Result<Vec<PivotRecord>, PivotError>
    where
        T: 'a,
        C: Fn(&T) -> K + 'a,
        K: Into<CellValue>,
        D: Fn(&[&T]) -> V + 'a,
        V: Into<CellValue>,
    {
        to_rows(self, &PivotDefinition::new(column, row, data))
    }
}
