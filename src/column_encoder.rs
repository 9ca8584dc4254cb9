//! C1 — Column Encoder.
//!
//! Encodes each grouping column as small integer category ids and
//! precomputes per-category row bitmasks, dropping `amount = 0` rows first
//! (they cannot change any sum) while preserving the post-filter ->
//! original row index mapping.

use std::collections::BTreeSet;

use crate::bitset::RowMask;
use crate::error::EngineError;
use crate::rule::CatId;
use crate::table::Table;

/// Nulls are coerced to this sentinel so they participate as a regular
/// category instead of propagating as missing values.
const BLANK_SENTINEL: &str = "_blank_";

#[derive(Clone, Debug)]
pub(crate) struct ColumnEncoding {
    pub name: String,
    /// Distinct observed values, sorted by string representation; index is
    /// the category id.
    pub cats: Vec<String>,
    /// Category id per post-filter row.
    pub code: Vec<CatId>,
    /// `mask(i, c)`: one bitmask per category id.
    pub masks: Vec<RowMask>,
}

impl ColumnEncoding {
    pub fn domain(&self) -> BTreeSet<CatId> {
        (0..self.cats.len() as CatId).collect()
    }
}

pub(crate) struct EncodedTable {
    pub columns: Vec<ColumnEncoding>,
    pub amount: Vec<f64>,
    /// post-filter row index -> original row index.
    pub kept_indices: Vec<usize>,
    pub zero_rows_excluded: usize,
    /// Rows with `amount >= 0`.
    pub pos_mask: RowMask,
    /// Rows with `amount <= 0`.
    pub neg_mask: RowMask,
}

impl EncodedTable {
    pub fn n_rows(&self) -> usize {
        self.amount.len()
    }

    pub fn total_sum(&self) -> f64 {
        self.amount.iter().sum()
    }

    pub fn domains(&self) -> Vec<BTreeSet<CatId>> {
        self.columns.iter().map(|c| c.domain()).collect()
    }
}

pub(crate) fn encode(
    raw: &Table,
    grouping_columns: &[String],
    amount_column: &str,
) -> Result<EncodedTable, EngineError> {
    let amount_idx = raw
        .column_index(amount_column)
        .ok_or_else(|| EngineError::MissingColumn(amount_column.to_string()))?;

    let col_indices: Vec<usize> = grouping_columns
        .iter()
        .map(|c| {
            raw.column_index(c)
                .ok_or_else(|| EngineError::MissingColumn(c.clone()))
        })
        .collect::<Result<_, _>>()?;

    let mut all_amounts = Vec::with_capacity(raw.n_rows());
    for row in 0..raw.n_rows() {
        let cell = raw.cell(row, amount_idx).unwrap_or("");
        let value: f64 = cell
            .trim()
            .parse()
            .map_err(|_| EngineError::NonNumericAmount(amount_column.to_string()))?;
        all_amounts.push(value);
    }

    let mut kept_indices = Vec::new();
    let mut amount = Vec::new();
    for (orig_idx, &v) in all_amounts.iter().enumerate() {
        if v != 0.0 {
            kept_indices.push(orig_idx);
            amount.push(v);
        }
    }
    let zero_rows_excluded = raw.n_rows() - kept_indices.len();
    let n = amount.len();

    let mut columns = Vec::with_capacity(grouping_columns.len());
    for (&col_idx, name) in col_indices.iter().zip(grouping_columns) {
        let mut values: Vec<String> = Vec::with_capacity(n);
        for &orig_idx in &kept_indices {
            let v = raw
                .cell(orig_idx, col_idx)
                .map(|s| s.to_string())
                .unwrap_or_else(|| BLANK_SENTINEL.to_string());
            values.push(v);
        }

        let cats: Vec<String> = values
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let mut code = Vec::with_capacity(n);
        let mut masks = vec![RowMask::zeros(n); cats.len()];
        for (row, v) in values.iter().enumerate() {
            // cats is sorted; binary_search finds the category id directly.
            let cid = cats.binary_search(v).expect("value came from cats") as CatId;
            code.push(cid);
            masks[cid as usize].set(row);
        }

        columns.push(ColumnEncoding {
            name: name.clone(),
            cats,
            code,
            masks,
        });
    }

    let mut pos_mask = RowMask::zeros(n);
    let mut neg_mask = RowMask::zeros(n);
    for (i, &v) in amount.iter().enumerate() {
        if v >= 0.0 {
            pos_mask.set(i);
        }
        if v <= 0.0 {
            neg_mask.set(i);
        }
    }

    Ok(EncodedTable {
        columns,
        amount,
        kept_indices,
        zero_rows_excluded,
        pos_mask,
        neg_mask,
    })
}
