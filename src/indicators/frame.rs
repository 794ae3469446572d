// =============================================================================
// IndicatorFrame — a candle series plus named, aligned value columns
// =============================================================================
//
// Indicators never mutate or reorder the underlying series; each one adds
// columns of the same length. Warm-up gaps are `None`, never zero.

use std::collections::BTreeMap;

use crate::market_data::{Candle, CandleSeries};

/// A candle series with derived indicator columns attached.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorFrame {
    series: CandleSeries,
    columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl IndicatorFrame {
    pub fn new(series: CandleSeries) -> Self {
        Self {
            series,
            columns: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn series(&self) -> &CandleSeries {
        &self.series
    }

    pub fn candles(&self) -> &[Candle] {
        self.series.as_slice()
    }

    /// Close prices in series order.
    pub fn closes(&self) -> Vec<f64> {
        self.series.closes()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Most recent value of a column, skipping trailing gaps.
    pub fn last_value(&self, name: &str) -> Option<f64> {
        self.columns
            .get(name)?
            .iter()
            .rev()
            .find_map(|v| *v)
    }

    /// Attach a column. The column must be aligned with the series;
    /// a mismatched length is a programming error, not a data condition.
    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) {
        assert_eq!(
            values.len(),
            self.series.len(),
            "indicator column must align with the candle series"
        );
        self.columns.insert(name.into(), values);
    }
}
