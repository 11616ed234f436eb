//! Grid contract
//!
//! A field qualifies as a computational grid when it has coordinates `x`, `y`,
//! `z` and scalar spacings `delx`, `dely` such that:
//! - `x` and `y` start at 0.0 and are equispaced with the declared spacing
//! - the declared spacings are strictly positive
//! - `z` is non-negative, strictly increasing and has at least two levels
//!
//! Interpolation and cell geometry downstream rely on these without re-checking.

use super::{check_exists, CheckTolerances};
use crate::core_types::StructuredField;
use crate::error::{OpticsError, Result};

/// Check the grid contract with default tolerances
///
/// # Errors
///
/// `MissingVariable` for an absent coordinate or spacing, `GridInvariant`
/// naming the offending axis otherwise.
pub fn check_grid(field: &StructuredField) -> Result<()> {
    check_grid_with(field, &CheckTolerances::default())
}

/// Check the grid contract with explicit tolerances
///
/// # Errors
///
/// See [`check_grid`].
pub fn check_grid_with(field: &StructuredField, tolerances: &CheckTolerances) -> Result<()> {
    check_exists(field, &["x", "y", "z", "delx", "dely"])?;

    for (axis, spacing_name) in [("x", "delx"), ("y", "dely")] {
        let coords = field.get_variable(axis)?.to_f64_vec(axis)?;
        let spacing = scalar(field, spacing_name, axis)?;
        check_horizontal(axis, spacing_name, &coords, spacing, tolerances.grid_spacing)?;
    }

    let z = field.get_variable("z")?.to_f64_vec("z")?;
    check_vertical(&z)
}

fn scalar(field: &StructuredField, name: &str, axis: &str) -> Result<f64> {
    let values = field.get_variable(name)?.to_f64_vec(name)?;
    match values.as_slice() {
        [value] => Ok(*value),
        _ => Err(OpticsError::grid(
            axis,
            format!("'{name}' should hold a single value, found {}", values.len()),
        )),
    }
}

fn check_horizontal(
    axis: &str,
    spacing_name: &str,
    coords: &[f64],
    spacing: f64,
    tolerance: f64,
) -> Result<()> {
    let first = *coords
        .first()
        .ok_or_else(|| OpticsError::grid(axis, "axis has no points"))?;
    if first != 0.0 {
        return Err(OpticsError::grid(axis, "should start from 0.0"));
    }

    if coords.len() > 1 {
        let diffs: Vec<f64> = coords.windows(2).map(|w| w[1] - w[0]).collect();
        let reference = diffs[0];
        if diffs.iter().any(|d| !within(*d, reference, tolerance)) {
            return Err(OpticsError::grid(axis, "is not equispaced"));
        }
        if !within(reference, spacing, tolerance) {
            return Err(OpticsError::grid(
                axis,
                format!("'{spacing_name}' is not consistent with the spacing of '{axis}'"),
            ));
        }
        if diffs.iter().any(|d| d.is_nan() || *d <= 0.0) {
            return Err(OpticsError::grid(axis, "is not strictly increasing"));
        }
    }

    if spacing.is_nan() || spacing <= 0.0 {
        return Err(OpticsError::grid(
            axis,
            format!("declared spacing '{spacing_name}' must be strictly positive"),
        ));
    }
    Ok(())
}

fn within(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}

fn check_vertical(z: &[f64]) -> Result<()> {
    let non_negative = z.iter().all(|v| *v >= 0.0);
    let increasing = z.windows(2).all(|w| w[1] > w[0]);
    if !(non_negative && increasing && z.len() >= 2) {
        return Err(OpticsError::grid(
            "z",
            "should be non-negative, strictly increasing and have 2 or more elements",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Variable;
    use crate::error::ErrorKind;

    fn grid(x: Vec<f64>, delx: f64, z: Vec<f64>) -> StructuredField {
        StructuredField::new()
            .with_coord("x", Variable::coord("x", x))
            .unwrap()
            .with_coord("y", Variable::coord("y", vec![0.0, 0.5]))
            .unwrap()
            .with_coord("z", Variable::coord("z", z))
            .unwrap()
            .with_variable("delx", Variable::scalar(delx))
            .unwrap()
            .with_variable("dely", Variable::scalar(0.5))
            .unwrap()
    }

    fn failing_axis(field: &StructuredField) -> String {
        match check_grid(field).unwrap_err() {
            OpticsError::GridInvariant { axis, .. } => axis,
            other => panic!("expected grid error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_grid() {
        let field = grid(vec![0.0, 1.0, 2.0], 1.0, vec![0.0, 0.5, 1.5]);
        assert!(check_grid(&field).is_ok());
        // Idempotent on an unmodified field
        assert!(check_grid(&field).is_ok());
    }

    #[test]
    fn test_single_point_axis() {
        let field = grid(vec![0.0], 0.02, vec![0.0, 1.0]);
        assert!(check_grid(&field).is_ok());

        let field = grid(vec![0.0], 0.0, vec![0.0, 1.0]);
        assert_eq!(failing_axis(&field), "x");
    }

    #[test]
    fn test_non_equispaced() {
        let field = grid(vec![0.0, 1.0, 2.5], 1.0, vec![0.0, 1.0]);
        assert_eq!(failing_axis(&field), "x");
    }

    #[test]
    fn test_offset_origin() {
        let field = grid(vec![0.1, 1.1], 1.0, vec![0.0, 1.0]);
        assert_eq!(failing_axis(&field), "x");
    }

    #[test]
    fn test_spacing_mismatch() {
        let field = grid(vec![0.0, 1.0, 2.0], 0.5, vec![0.0, 1.0]);
        assert_eq!(failing_axis(&field), "x");
    }

    #[test]
    fn test_decreasing_horizontal() {
        let field = grid(vec![0.0, -1.0], -1.0, vec![0.0, 1.0]);
        assert_eq!(failing_axis(&field), "x");
    }

    #[test]
    fn test_vertical_requirements() {
        assert_eq!(failing_axis(&grid(vec![0.0], 1.0, vec![1.0, 0.0, 2.0])), "z");
        assert_eq!(failing_axis(&grid(vec![0.0], 1.0, vec![0.0])), "z");
        assert_eq!(failing_axis(&grid(vec![0.0], 1.0, vec![-0.5, 1.0])), "z");
    }

    #[test]
    fn test_missing_spacing() {
        let field = StructuredField::new()
            .with_coord("x", Variable::coord("x", vec![0.0]))
            .unwrap()
            .with_coord("y", Variable::coord("y", vec![0.0]))
            .unwrap()
            .with_coord("z", Variable::coord("z", vec![0.0, 1.0]))
            .unwrap()
            .with_variable("delx", Variable::scalar(1.0))
            .unwrap();
        let err = check_grid(&field).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingVariable);
        assert_eq!(err, OpticsError::missing("dely"));
    }
}
