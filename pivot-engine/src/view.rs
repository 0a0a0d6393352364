//! FILENAME: pivot-engine/src/view.rs
//! Pivot View - The output shapes of a pivot.
//!
//! - `PivotTable`: fixed schema (row-key columns, then data columns) with
//!   positional cells. Unset cells are `None`.
//! - `PivotRecord`: loosely-typed row object, an ordered field-name -> value
//!   map for interchange. Unset cells are simply absent.
//! - `DrillDownResult`: the source records behind one cell.

use pivot_value::{CellValue, ValueKind};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

// ============================================================================
// COLUMN DESCRIPTORS
// ============================================================================

/// Role of a column in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PivotColumnType {
    /// Holds one field of the row key.
    RowKey,
    /// Holds aggregated values for one column key.
    Data,
}

/// Storage type of a column, inferred from the values it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ColumnType {
    /// No non-empty value stored yet.
    #[default]
    Unknown,
    Number,
    Text,
    Boolean,
    Error,
    /// Values of more than one kind.
    Mixed,
}

impl ColumnType {
    /// Widens the type to also cover `value`. Empty values do not change it.
    pub fn widen(self, value: &CellValue) -> ColumnType {
        let kind = match value.kind() {
            ValueKind::Empty => return self,
            ValueKind::Number => ColumnType::Number,
            ValueKind::Text => ColumnType::Text,
            ValueKind::Boolean => ColumnType::Boolean,
            ValueKind::Error => ColumnType::Error,
        };
        match self {
            ColumnType::Unknown => kind,
            current if current == kind => current,
            _ => ColumnType::Mixed,
        }
    }
}

/// Describes one column of the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotColumnDescriptor {
    /// Column name: the row-key field name, or the column key's display value.
    pub name: String,

    pub column_type: PivotColumnType,

    /// Inferred storage type.
    pub value_type: ColumnType,

    /// The column key this data column stands for (None for row-key columns).
    pub key: Option<CellValue>,
}

// ============================================================================
// TABLE
// ============================================================================

/// One row of the table. `cells[i]` belongs to `columns[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotTableRow {
    pub cells: Vec<Option<CellValue>>,
}

/// Fixed-schema pivot output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotTable {
    /// Row-key columns first, then data columns.
    pub columns: Vec<PivotColumnDescriptor>,

    pub rows: Vec<PivotTableRow>,

    /// Number of leading row-key columns.
    pub row_key_count: usize,
}

impl PivotTable {
    /// Creates a table with the row-key columns declared and no data.
    pub fn new(row_key_names: &[String]) -> Self {
        PivotTable {
            columns: row_key_names
                .iter()
                .map(|name| PivotColumnDescriptor {
                    name: name.clone(),
                    column_type: PivotColumnType::RowKey,
                    value_type: ColumnType::Unknown,
                    key: None,
                })
                .collect(),
            rows: Vec::new(),
            row_key_count: row_key_names.len(),
        }
    }

    pub fn columns(&self) -> &[PivotColumnDescriptor] {
        &self.columns
    }

    pub fn rows(&self) -> &[PivotTableRow] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of data columns (excluding row-key columns).
    pub fn data_column_count(&self) -> usize {
        self.columns.len() - self.row_key_count
    }

    pub fn row_key_names(&self) -> Vec<&str> {
        self.columns[..self.row_key_count]
            .iter()
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn data_column_names(&self) -> Vec<&str> {
        self.columns[self.row_key_count..]
            .iter()
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Cell at (`row`, column `name`); None when unset or out of range.
    pub fn value(&self, row: usize, name: &str) -> Option<&CellValue> {
        let col = self.column_index(name)?;
        self.rows.get(row)?.cells.get(col)?.as_ref()
    }

    /// Converts every row into a loosely-typed record.
    pub fn to_records(&self) -> Vec<PivotRecord> {
        self.rows
            .iter()
            .map(|row| {
                let mut record = PivotRecord::with_capacity(self.columns.len());
                for (column, cell) in self.columns.iter().zip(&row.cells) {
                    if let Some(value) = cell {
                        record.insert(column.name.clone(), value.clone());
                    }
                }
                record
            })
            .collect()
    }

    /// Appends a row and widens column types to cover its cells.
    pub(crate) fn push_row(&mut self, cells: Vec<Option<CellValue>>) {
        for (column, cell) in self.columns.iter_mut().zip(&cells) {
            if let Some(value) = cell {
                column.value_type = column.value_type.widen(value);
            }
        }
        self.rows.push(PivotTableRow { cells });
    }
}

// ============================================================================
// RECORD
// ============================================================================

/// A loosely-typed row: field name -> value, in insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PivotRecord {
    fields: Vec<(String, CellValue)>,
}

impl PivotRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        PivotRecord {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Sets a field, replacing any previous value under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: CellValue) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&CellValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// JSON object with plain scalars (`null`, numbers, strings, booleans).
    /// Errors become their display text.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), plain_json(value)))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

fn plain_json(value: &CellValue) -> serde_json::Value {
    match value {
        CellValue::Empty => serde_json::Value::Null,
        CellValue::Number(n) => serde_json::Number::from_f64(*n)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        CellValue::Text(s) => serde_json::Value::String(s.clone()),
        CellValue::Boolean(b) => serde_json::Value::Bool(*b),
        CellValue::Error(e) => serde_json::Value::String(e.to_string()),
    }
}

/// Serializes a value as a bare scalar rather than a tagged enum.
struct PlainValue<'a>(&'a CellValue);

impl Serialize for PlainValue<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            CellValue::Empty => serializer.serialize_none(),
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Boolean(b) => serializer.serialize_bool(*b),
            CellValue::Error(e) => serializer.collect_str(e),
        }
    }
}

impl Serialize for PivotRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, &PlainValue(value))?;
        }
        map.end()
    }
}

impl<'a> IntoIterator for &'a PivotRecord {
    type Item = &'a (String, CellValue);
    type IntoIter = std::slice::Iter<'a, (String, CellValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

// ============================================================================
// DRILL-DOWN
// ============================================================================

/// The source records that feed one cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrillDownResult {
    pub row_key: Vec<CellValue>,

    pub column_key: CellValue,

    /// 0-based source indices, ascending, at most `max_records` of them.
    pub source_rows: Vec<usize>,

    /// Total number of matching records.
    pub total_count: usize,

    pub max_records: usize,

    pub is_truncated: bool,
}

impl DrillDownResult {
    pub fn new(row_key: Vec<CellValue>, column_key: CellValue, max_records: usize) -> Self {
        DrillDownResult {
            row_key,
            column_key,
            source_rows: Vec::new(),
            total_count: 0,
            max_records,
            is_truncated: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pivot_value::CellError;

    fn sample_table() -> PivotTable {
        let mut table = PivotTable::new(&["dept".to_string()]);
        for name in ["Jan", "Feb"] {
            table.columns.push(PivotColumnDescriptor {
                name: name.to_string(),
                column_type: PivotColumnType::Data,
                value_type: ColumnType::Unknown,
                key: Some(CellValue::text(name)),
            });
        }
        table.push_row(vec![
            Some(CellValue::text("A")),
            Some(CellValue::Number(10.0)),
            Some(CellValue::Number(5.0)),
        ]);
        table.push_row(vec![Some(CellValue::text("B")), Some(CellValue::Number(7.0)), None]);
        table
    }

    #[test]
    fn column_type_widening() {
        let t = ColumnType::Unknown.widen(&CellValue::Number(1.0));
        assert_eq!(t, ColumnType::Number);
        assert_eq!(t.widen(&CellValue::Empty), ColumnType::Number);
        assert_eq!(t.widen(&CellValue::Number(2.0)), ColumnType::Number);
        assert_eq!(t.widen(&CellValue::text("x")), ColumnType::Mixed);
    }

    #[test]
    fn table_lookup_by_name() {
        let table = sample_table();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.data_column_count(), 2);
        assert_eq!(table.row_key_names(), vec!["dept"]);
        assert_eq!(table.data_column_names(), vec!["Jan", "Feb"]);
        assert_eq!(table.value(0, "Feb"), Some(&CellValue::Number(5.0)));
        assert_eq!(table.value(1, "Feb"), None);
        assert_eq!(table.value(5, "Jan"), None);
        assert_eq!(table.columns()[1].value_type, ColumnType::Number);
        assert_eq!(table.columns()[0].value_type, ColumnType::Text);
    }

    #[test]
    fn records_skip_unset_cells() {
        let records = sample_table().to_records();
        assert_eq!(records[0].len(), 3);
        assert_eq!(records[1].len(), 2);
        assert!(!records[1].contains_key("Feb"));
        assert_eq!(records[1].keys().collect::<Vec<_>>(), vec!["dept", "Jan"]);
    }

    #[test]
    fn record_insert_replaces_existing() {
        let mut record = PivotRecord::new();
        record.insert("a", CellValue::Number(1.0));
        record.insert("a", CellValue::Number(2.0));
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("a"), Some(&CellValue::Number(2.0)));
    }

    #[test]
    fn record_json_uses_plain_scalars() {
        let mut record = PivotRecord::new();
        record.insert("dept", CellValue::text("A"));
        record.insert("Jan", CellValue::Number(10.0));
        record.insert("ok", CellValue::Boolean(true));
        record.insert("avg", CellValue::Error(CellError::Div0));
        record.insert("none", CellValue::Empty);

        let expected = serde_json::json!({
            "dept": "A", "Jan": 10.0, "ok": true, "avg": "#DIV/0!", "none": null
        });
        assert_eq!(record.to_json(), expected);
        assert_eq!(serde_json::to_value(&record).unwrap(), expected);
    }

    #[test]
    fn record_serializes_in_field_order() {
        let mut record = PivotRecord::new();
        record.insert("z", CellValue::Number(1.0));
        record.insert("a", CellValue::Number(2.0));
        assert_eq!(serde_json::to_string(&record).unwrap(), r#"{"z":1.0,"a":2.0}"#);
    }

    #[test]
    fn record_json_value_keeps_field_order() {
        let mut record = PivotRecord::new();
        record.insert("k", CellValue::Empty);
        record.insert("TRUE", CellValue::Number(2.0));
        record.insert("Feb", CellValue::Number(1.0));
        assert_eq!(record.to_json().to_string(), r#"{"k":null,"TRUE":2.0,"Feb":1.0}"#);
    }
}
