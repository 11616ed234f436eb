//! Legendre/Wigner coefficient table contract

use super::{check_hasdim, CheckTolerances, DimRule};
use crate::core_types::{StructuredField, LEGENDRE_INDEX, STOKES_INDEX};
use crate::error::{OpticsError, Result};

/// Number of independent phase matrix expansion series for polarized scattering
pub const PHASE_SERIES: usize = 6;

/// Check the `legcoef` table with default tolerances
///
/// Requires dims `stokes_index` (size 6) and `legendre_index`, the zeroth
/// coefficient of the first series normalized to 1.0 for every table entry,
/// and the asymmetry parameter `legcoef[0, 1] / 3` within [-1, 1].
///
/// # Errors
///
/// `MissingVariable` / `MissingDimension` from the dimension check,
/// `LegendreTableInvalid` for the physical requirements.
pub fn check_legendre(field: &StructuredField) -> Result<()> {
    check_legendre_with(field, &CheckTolerances::default())
}

/// Check the `legcoef` table with explicit tolerances
///
/// # Errors
///
/// See [`check_legendre`].
pub fn check_legendre_with(field: &StructuredField, tolerances: &CheckTolerances) -> Result<()> {
    check_hasdim(field, &[DimRule::new("legcoef", [STOKES_INDEX, LEGENDRE_INDEX])])?;
    let legcoef = field.get_variable("legcoef")?;

    let nstokes = legcoef.size_of(STOKES_INDEX).unwrap_or(0);
    if nstokes != PHASE_SERIES {
        return Err(OpticsError::legendre(format!(
            "'stokes_index' dimension of 'legcoef' must have {PHASE_SERIES} components, found {nstokes}"
        )));
    }
    let nleg = legcoef.size_of(LEGENDRE_INDEX).unwrap_or(0);
    if nleg == 0 {
        return Err(OpticsError::legendre("'legcoef' holds no Legendre orders"));
    }

    let zeroth = legcoef.select(&[(STOKES_INDEX, 0), (LEGENDRE_INDEX, 0)])?;
    let zeroth = zeroth.try_floats("legcoef")?;
    if zeroth
        .iter()
        .any(|c| c.is_nan() || (c - 1.0).abs() > tolerances.legendre_normalization)
    {
        return Err(OpticsError::legendre(
            "0th Legendre/Wigner coefficients must be normalized to 1.0",
        ));
    }

    if nleg > 1 {
        let first = legcoef.select(&[(STOKES_INDEX, 0), (LEGENDRE_INDEX, 1)])?;
        let first = first.try_floats("legcoef")?;
        if first.iter().any(|c| {
            let asymmetry = c / 3.0;
            asymmetry.is_nan() || !(-1.0..=1.0).contains(&asymmetry)
        }) {
            return Err(OpticsError::legendre(
                "asymmetry parameter (1st Legendre coefficient divided by 3) is not in the range [-1.0, 1.0]",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Variable;
    use crate::error::ErrorKind;

    /// Table with `entries` identical phase functions
    fn table(c00: f64, c01: f64, entries: usize) -> StructuredField {
        let nleg = 3;
        let mut values = vec![0.0; PHASE_SERIES * nleg * entries];
        for entry in 0..entries {
            values[entry] = c00;
            values[entries + entry] = c01;
        }
        let legcoef = Variable::float(
            &[STOKES_INDEX, LEGENDRE_INDEX, "table_index"],
            &[PHASE_SERIES, nleg, entries],
            values,
        )
        .unwrap();
        StructuredField::new()
            .with_variable("legcoef", legcoef)
            .unwrap()
    }

    fn reason(field: &StructuredField) -> ErrorKind {
        check_legendre(field).unwrap_err().kind()
    }

    #[test]
    fn test_valid_table() {
        let field = table(1.0, 1.5, 4);
        assert!(check_legendre(&field).is_ok());
        assert!(check_legendre(&field).is_ok());
    }

    #[test]
    fn test_normalization() {
        assert_eq!(reason(&table(0.9, 1.5, 2)), ErrorKind::LegendreTableInvalid);
        assert!(check_legendre(&table(1.0 + 5e-8, 0.0, 1)).is_ok());
    }

    #[test]
    fn test_asymmetry_range() {
        assert_eq!(reason(&table(1.0, 5.0, 1)), ErrorKind::LegendreTableInvalid);
        assert_eq!(reason(&table(1.0, -3.3, 1)), ErrorKind::LegendreTableInvalid);
        assert!(check_legendre(&table(1.0, 3.0, 1)).is_ok());
    }

    #[test]
    fn test_stokes_count() {
        let legcoef = Variable::float(&[STOKES_INDEX, LEGENDRE_INDEX], &[1, 2], vec![1.0, 0.0]).unwrap();
        let field = StructuredField::new()
            .with_variable("legcoef", legcoef)
            .unwrap();
        assert_eq!(reason(&field), ErrorKind::LegendreTableInvalid);
    }

    #[test]
    fn test_missing_dimension() {
        let legcoef = Variable::full(&[STOKES_INDEX], &[6], 1.0);
        let field = StructuredField::new()
            .with_variable("legcoef", legcoef)
            .unwrap();
        assert_eq!(reason(&field), ErrorKind::MissingDimension);
        assert_eq!(reason(&StructuredField::new()), ErrorKind::MissingVariable);
    }
}
