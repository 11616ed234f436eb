//! Table-index compression
//!
//! Each grid cell is assigned the id of its nearest discretized microphysical
//! state. A grid only samples a bounded region of parameter space, so the
//! number of distinct ids is usually far smaller than the table. Compression
//! keeps one phase function per distinct id instead of one per cell.
//!
//! The stages are kept as explicit artefacts:
//! `raw` (continuous lookup) → `rounded` → `unique` (sorted) → `compacted`
//! (dense ids starting at 1, per cell).

use crate::error::{OpticsError, Result};
use rustc_hash::FxHashMap;

/// Every intermediate stage of the compression
#[derive(Debug, Clone, PartialEq)]
pub struct TableIndexCompression {
    /// Nearest-neighbour table index per cell, before rounding
    pub raw: Vec<f64>,
    /// Rounded table index per cell
    pub rounded: Vec<i64>,
    /// Distinct rounded indices, ascending
    pub unique: Vec<i64>,
    /// Dense id per cell: position of its rounded index in `unique`, plus one
    pub compacted: Vec<usize>,
}

impl TableIndexCompression {
    /// Run every stage on the continuous per-cell indices
    ///
    /// # Errors
    ///
    /// `InterpolationDomainError` if any raw index is not finite.
    pub fn from_raw(raw: Vec<f64>) -> Result<Self> {
        if let Some(bad) = raw.iter().find(|v| !v.is_finite()) {
            return Err(OpticsError::domain(
                "table_index",
                format!("non-finite table index {bad}"),
            ));
        }
        let rounded: Vec<i64> = raw.iter().map(|v| v.round_ties_even() as i64).collect();

        let mut unique = rounded.clone();
        unique.sort_unstable();
        unique.dedup();

        let dense: FxHashMap<i64, usize> = unique
            .iter()
            .enumerate()
            .map(|(rank, &id)| (id, rank + 1))
            .collect();
        let compacted = rounded.iter().map(|id| dense[id]).collect();

        Ok(Self {
            raw,
            rounded,
            unique,
            compacted,
        })
    }

    /// Number of distinct phase functions realized
    pub fn distinct(&self) -> usize {
        self.unique.len()
    }
}
