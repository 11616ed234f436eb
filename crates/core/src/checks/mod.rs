//! Precondition checks over structured fields
//!
//! The primitives here test named variables for existence, sign, range and
//! dimensions. The composite contracts in [`grid`], [`legendre`] and [`sensor`]
//! build on them. Every check stops at the first violation.
//!
//! [`check_positivity`] is the one check that mutates: it is the composition of
//! [`normalize`] (rounding away floating point noise in place) and the pure
//! [`assert_non_negative`].

pub mod grid;
pub mod legendre;
pub mod sensor;

pub use grid::{check_grid, check_grid_with};
pub use legendre::{check_legendre, check_legendre_with};
pub use sensor::check_sensor;

use crate::core_types::StructuredField;
use crate::error::{OpticsError, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default number of decimals kept by [`check_positivity`].
///
/// Matches the single precision used by the downstream solver.
pub const DEFAULT_PRECISION: u32 = 7;

/// Numeric tolerances used by the composite contracts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckTolerances {
    /// Decimals kept when normalizing slightly negative values
    pub positivity_precision: u32,
    /// Absolute tolerance for horizontal grid spacing comparisons
    pub grid_spacing: f64,
    /// Absolute tolerance for the zeroth Legendre coefficient
    pub legendre_normalization: f64,
}

impl Default for CheckTolerances {
    fn default() -> Self {
        Self {
            positivity_precision: DEFAULT_PRECISION,
            grid_spacing: 1e-6,
            legendre_normalization: 1e-7,
        }
    }
}

/// Inclusive range requirement for one variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeRule {
    pub name: String,
    pub low: f64,
    pub high: f64,
}

impl RangeRule {
    pub fn new(name: &str, low: f64, high: f64) -> Self {
        Self {
            name: name.to_string(),
            low,
            high,
        }
    }
}

/// Required dimensions for one variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimRule {
    pub name: String,
    pub dims: Vec<String>,
}

impl DimRule {
    pub fn new<S: Into<String>>(name: &str, dims: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.to_string(),
            dims: dims.into_iter().map(Into::into).collect(),
        }
    }

    /// A single dimension is a one-element list
    pub fn single(name: &str, dim: &str) -> Self {
        Self::new(name, [dim])
    }
}

/// Fail if any of `names` cannot be resolved in `field`
///
/// # Errors
///
/// `MissingVariable` naming the first unresolved name.
pub fn check_exists(field: &StructuredField, names: &[&str]) -> Result<()> {
    for name in names {
        field.get_variable(name)?;
    }
    Ok(())
}

/// Round each variable holding a negative (or NaN) element to `precision` decimals
///
/// Variables that are already non-negative are left untouched. Returns the
/// names that were rewritten.
///
/// # Errors
///
/// `MissingVariable` if a name is absent, `InvalidShape` for non-float data.
pub fn normalize(field: &mut StructuredField, names: &[&str], precision: u32) -> Result<Vec<String>> {
    check_exists(field, names)?;
    let scale = 10f64.powi(precision as i32);
    let mut rewritten = Vec::new();
    for &name in names {
        let variable = field.get_variable_mut(name)?;
        let kind = variable.data().type_name();
        let values = variable.floats_mut().ok_or_else(|| {
            OpticsError::shape(name, format!("expected float values, found {kind}"))
        })?;
        if values.iter().all(|v| *v >= 0.0) {
            continue;
        }
        for v in values {
            // adding 0.0 turns a rounded -0.0 into 0.0
            *v = (*v * scale).round_ties_even() / scale + 0.0;
        }
        warn!(variable = name, precision, "rounded negative values in place");
        rewritten.push(name.to_string());
    }
    Ok(rewritten)
}

/// Fail if any element of the named variables is negative or NaN
///
/// # Errors
///
/// `MissingVariable`, `InvalidShape` for non-float data, or `NegativeValue`.
pub fn assert_non_negative(field: &StructuredField, names: &[&str]) -> Result<()> {
    check_exists(field, names)?;
    for &name in names {
        let values = field.get_variable(name)?.try_floats(name)?;
        if values.iter().any(|v| v.is_nan() || *v < 0.0) {
            return Err(OpticsError::NegativeValue {
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

/// Check that variables are non-negative up to `precision` decimals
///
/// A variable containing negative values is first rounded in place, so tiny
/// interpolation artefacts such as `-1e-18` become `0.0`. The rounding is
/// visible to the caller even when the check passes.
///
/// # Errors
///
/// `MissingVariable` (before anything is rewritten), `InvalidShape`, or
/// `NegativeValue` when negatives survive rounding.
pub fn check_positivity(field: &mut StructuredField, names: &[&str], precision: u32) -> Result<()> {
    check_exists(field, names)?;
    for &name in names {
        normalize(field, &[name], precision)?;
        assert_non_negative(field, &[name])?;
    }
    Ok(())
}

/// Check that every element of each rule's variable lies in `[low, high]`
///
/// # Errors
///
/// `MissingVariable` if any rule names an absent variable, `InvalidShape` for
/// non-numeric data, `OutOfRange` for the first rule violated.
pub fn check_range(field: &StructuredField, rules: &[RangeRule]) -> Result<()> {
    let names: Vec<&str> = rules.iter().map(|r| r.name.as_str()).collect();
    check_exists(field, &names)?;
    for rule in rules {
        let values = field.get_variable(&rule.name)?.to_f64_vec(&rule.name)?;
        if values
            .iter()
            .any(|&v| v.is_nan() || v < rule.low || v > rule.high)
        {
            return Err(OpticsError::OutOfRange {
                name: rule.name.clone(),
                low: rule.low,
                high: rule.high,
            });
        }
    }
    Ok(())
}

/// Check that each rule's variable carries all of its listed dimensions
///
/// # Errors
///
/// `MissingVariable` if any rule names an absent variable, `MissingDimension`
/// for the first absent dimension.
pub fn check_hasdim(field: &StructuredField, rules: &[DimRule]) -> Result<()> {
    let names: Vec<&str> = rules.iter().map(|r| r.name.as_str()).collect();
    check_exists(field, &names)?;
    for rule in rules {
        let variable = field.get_variable(&rule.name)?;
        if let Some(dim) = rule.dims.iter().find(|d| !variable.has_dim(d)) {
            return Err(OpticsError::MissingDimension {
                name: rule.name.clone(),
                dim: dim.clone(),
            });
        }
    }
    Ok(())
}
