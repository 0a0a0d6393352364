//! FILENAME: tests/common/mod.rs
//! Fixtures and assertion helpers for pivot-engine integration tests.

#![allow(dead_code)]

use pivot_engine::{CellValue, PivotTable};

/// One sales line, as a caller would load it from a query.
#[derive(Debug, Clone)]
pub struct SaleRecord {
    pub region: &'static str,
    pub product: &'static str,
    pub quarter: Option<&'static str>,
    pub sales: f64,
    pub quantity: f64,
}

// ============================================================================
// FIXTURES
// ============================================================================

pub struct SalesFixture;

impl SalesFixture {
    pub fn data() -> Vec<(&'static str, &'static str, &'static str, f64, f64)> {
        vec![
            ("North", "Widget", "Q1", 10000.0, 100.0),
            ("North", "Widget", "Q2", 12000.0, 120.0),
            ("North", "Gadget", "Q1", 8000.0, 80.0),
            ("North", "Gadget", "Q2", 9000.0, 90.0),
            ("South", "Widget", "Q1", 15000.0, 150.0),
            ("South", "Widget", "Q2", 14000.0, 140.0),
            ("South", "Gadget", "Q1", 11000.0, 110.0),
            ("South", "Gadget", "Q2", 13000.0, 130.0),
            ("East", "Widget", "Q1", 9000.0, 90.0),
            ("East", "Widget", "Q2", 11000.0, 110.0),
            ("East", "Gadget", "Q1", 7000.0, 70.0),
            ("East", "Gadget", "Q3", 8500.0, 85.0),
        ]
    }

    pub fn records() -> Vec<SaleRecord> {
        Self::data()
            .into_iter()
            .map(|(region, product, quarter, sales, quantity)| SaleRecord {
                region,
                product,
                quarter: Some(quarter),
                sales,
                quantity,
            })
            .collect()
    }

    /// Records plus one line whose quarter is unknown.
    pub fn records_with_missing_quarter() -> Vec<SaleRecord> {
        let mut records = Self::records();
        records.push(SaleRecord {
            region: "West",
            product: "Widget",
            quarter: None,
            sales: 500.0,
            quantity: 5.0,
        });
        records
    }

    /// Large generated dataset for performance checks.
    pub fn generated(rows: usize) -> Vec<SaleRecord> {
        const REGIONS: [&str; 4] = ["North", "South", "East", "West"];
        const PRODUCTS: [&str; 3] = ["Widget", "Gadget", "Gizmo"];
        const QUARTERS: [&str; 4] = ["Q1", "Q2", "Q3", "Q4"];

        (0..rows)
            .map(|i| SaleRecord {
                region: REGIONS[i % REGIONS.len()],
                product: PRODUCTS[(i / 4) % PRODUCTS.len()],
                quarter: Some(QUARTERS[(i / 12) % QUARTERS.len()]),
                sales: (i % 100) as f64 * 10.0,
                quantity: (i % 7) as f64,
            })
            .collect()
    }
}

// ============================================================================
// ASSERTION HELPERS
// ============================================================================

/// Assert that a cell contains an expected number value.
pub fn assert_cell_number(table: &PivotTable, row: usize, column: &str, expected: f64) {
    match table.value(row, column) {
        Some(CellValue::Number(n)) => assert!(
            (n - expected).abs() < 1e-9,
            "row {} column {}: expected {}, got {}",
            row,
            column,
            expected,
            n
        ),
        other => panic!("row {} column {}: expected number {}, got {:?}", row, column, expected, other),
    }
}

/// Assert that a cell is unset.
pub fn assert_cell_unset(table: &PivotTable, row: usize, column: &str) {
    assert!(
        table.column_index(column).is_some(),
        "column {} is not part of the table",
        column
    );
    assert_eq!(table.value(row, column), None, "row {} column {} should be unset", row, column);
}
