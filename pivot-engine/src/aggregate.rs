//! FILENAME: pivot-engine/src/aggregate.rs
//! Built-in data selectors.
//!
//! `aggregate` turns a per-record value accessor and an `AggregationType`
//! into a data selector, so common pivots do not need a hand-written fold.

use pivot_value::{CellError, CellValue};

use crate::definition::AggregationType;

/// Accumulator for computing aggregates incrementally.
/// Stores intermediate state needed for all aggregation types.
#[derive(Debug, Clone)]
pub struct AggregateAccumulator {
    pub sum: f64,
    pub count: u64,
    pub count_numbers: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub product: Option<f64>,
    /// For variance/stddev: sum of squared differences from mean.
    /// Using Welford's algorithm for numerical stability.
    pub m2: f64,
    pub mean: f64,
}

impl Default for AggregateAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl AggregateAccumulator {
    pub fn new() -> Self {
        AggregateAccumulator {
            sum: 0.0,
            count: 0,
            count_numbers: 0,
            min: None,
            max: None,
            product: None,
            m2: 0.0,
            mean: 0.0,
        }
    }

    /// Adds any value: numbers feed every aggregate, other non-empty
    /// values only count, empty values are skipped.
    pub fn add(&mut self, value: &CellValue) {
        match value {
            CellValue::Number(n) => self.add_number(*n),
            CellValue::Empty => {}
            _ => self.add_non_number(),
        }
    }

    /// Adds a numeric value to the accumulator.
    pub fn add_number(&mut self, value: f64) {
        self.count += 1;
        self.count_numbers += 1;
        self.sum += value;

        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
        self.product = Some(self.product.map_or(value, |p| p * value));

        // Welford's algorithm for variance
        let delta = value - self.mean;
        self.mean += delta / (self.count_numbers as f64);
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    /// Adds a non-numeric value (only increments count).
    pub fn add_non_number(&mut self) {
        self.count += 1;
    }

    /// Computes the final aggregate value.
    pub fn compute(&self, aggregation: AggregationType) -> CellValue {
        let n = self.count_numbers as f64;
        match aggregation {
            AggregationType::Sum => CellValue::Number(self.sum),
            AggregationType::Count => CellValue::Number(self.count as f64),
            AggregationType::CountNumbers => CellValue::Number(n),
            AggregationType::Average => {
                if self.count_numbers > 0 {
                    CellValue::Number(self.sum / n)
                } else {
                    CellValue::Error(CellError::Div0)
                }
            }
            AggregationType::Min => CellValue::Number(self.min.unwrap_or(0.0)),
            AggregationType::Max => CellValue::Number(self.max.unwrap_or(0.0)),
            AggregationType::Product => CellValue::Number(self.product.unwrap_or(0.0)),
            AggregationType::Var => self.sample_variance().map_or(div0(), CellValue::Number),
            AggregationType::VarP => self.population_variance().map_or(div0(), CellValue::Number),
            AggregationType::StdDev => self
                .sample_variance()
                .map_or(div0(), |v| CellValue::Number(v.sqrt())),
            AggregationType::StdDevP => self
                .population_variance()
                .map_or(div0(), |v| CellValue::Number(v.sqrt())),
        }
    }

    fn sample_variance(&self) -> Option<f64> {
        (self.count_numbers > 1).then(|| self.m2 / ((self.count_numbers - 1) as f64))
    }

    fn population_variance(&self) -> Option<f64> {
        (self.count_numbers > 0).then(|| self.m2 / (self.count_numbers as f64))
    }
}

fn div0() -> CellValue {
    CellValue::Error(CellError::Div0)
}

/// Builds a data selector that folds `value` over the matching records.
///
/// ```
/// use pivot_engine::{aggregate, AggregationType, PivotDefinition, RowSelector};
///
/// struct Sale { dept: String, month: String, amt: f64 }
///
/// let definition = PivotDefinition::new(
///     |s: &Sale| s.month.clone(),
///     RowSelector::single("dept", |s: &Sale| s.dept.clone()),
///     aggregate(AggregationType::Sum, |s: &Sale| s.amt),
/// );
/// # let _ = definition;
/// ```
pub fn aggregate<T, F, V>(aggregation: AggregationType, value: F) -> impl Fn(&[&T]) -> CellValue
where
    F: Fn(&T) -> V,
    V: Into<CellValue>,
{
    move |records: &[&T]| {
        let mut acc = AggregateAccumulator::new();
        for &record in records {
            acc.add(&value(record).into());
        }
        acc.compute(aggregation)
    }
}
