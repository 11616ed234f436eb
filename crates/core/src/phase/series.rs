//! Legendre/Wigner series evaluation
//!
//! Coefficients use the six-series layout (a1, a2, a3, a4, b1, b2), one row
//! per series and one column per expansion order. The phase matrix elements
//! follow the generalized spherical function expansion:
//!
//! ```text
//! P11 = Σ a1_l d^l_00        P44 = Σ a4_l d^l_00
//! P22 = ½ [Σ (a2+a3)_l d^l_22 + Σ (a2-a3)_l d^l_2,-2]
//! P33 = ½ [Σ (a2+a3)_l d^l_22 - Σ (a2-a3)_l d^l_2,-2]
//! P12 = Σ b1_l d^l_02        P34 = Σ b2_l d^l_02
//! ```
//!
//! With `a1_0 = 1` and every other coefficient zero the phase function is
//! isotropic and `P11 == 1` at every angle.

use super::elements::PhaseElement;
use crate::error::{OpticsError, Result};

/// Wigner d-functions `d^l_mn(x)` for `l = 0..nleg`, `x = cos(theta)`
///
/// Only the (m, n) pairs used by the phase matrix are supported:
/// (0, 0), (0, 2), (2, 2), (2, -2).
fn wigner_d(m: i32, n: i32, x: f64, nleg: usize) -> Vec<f64> {
    let mut dl = vec![0.0; nleg];
    if nleg == 0 {
        return dl;
    }

    let lmin = m.abs().max(n.abs()) as usize;
    if lmin >= nleg {
        return dl;
    }
    dl[lmin] = match (m, n) {
        (0, 0) => 1.0,
        (0, 2) => (6.0_f64).sqrt() / 4.0 * (1.0 - x * x),
        (2, 2) => (1.0 + x) * (1.0 + x) / 4.0,
        (2, -2) => (1.0 - x) * (1.0 - x) / 4.0,
        _ => unreachable!("unsupported Wigner index pair ({m}, {n})"),
    };

    let (mf, nf) = (f64::from(m), f64::from(n));
    for l in lmin..nleg - 1 {
        let lf = l as f64;
        let previous = if l > lmin { dl[l - 1] } else { 0.0 };
        let next_norm = lf * ((lf + 1.0).powi(2) - mf * mf).sqrt() * ((lf + 1.0).powi(2) - nf * nf).sqrt();
        if next_norm == 0.0 {
            // only l == 0 of (0, 0) has a zero norm: d^1_00 = x
            dl[l + 1] = x;
            continue;
        }
        let current_term = (2.0 * lf + 1.0) * (lf * (lf + 1.0) * x - mf * nf) * dl[l];
        let previous_term = (lf + 1.0) * (lf * lf - mf * mf).sqrt() * (lf * lf - nf * nf).sqrt() * previous;
        dl[l + 1] = (current_term - previous_term) / next_norm;
    }
    dl
}

fn series(coefficients: &[f64], functions: &[f64]) -> f64 {
    coefficients.iter().zip(functions).map(|(c, f)| c * f).sum()
}

/// Evaluate one phase matrix element at `angles_deg`
///
/// `legcoef` is row-major `[nstokes, nleg]`.
///
/// # Errors
///
/// `LegendreTableInvalid` if the rows needed for `element` are absent or the
/// slice length disagrees with `nstokes * nleg`.
pub fn transform_leg_to_phase(
    legcoef: &[f64],
    nstokes: usize,
    nleg: usize,
    element: PhaseElement,
    angles_deg: &[f64],
) -> Result<Vec<f64>> {
    if legcoef.len() != nstokes * nleg {
        return Err(OpticsError::legendre(format!(
            "expected {nstokes}x{nleg} coefficients, got {}",
            legcoef.len()
        )));
    }
    let needed = match element {
        PhaseElement::P11 => 1,
        PhaseElement::P22 | PhaseElement::P33 => 3,
        PhaseElement::P44 => 4,
        PhaseElement::P12 => 5,
        PhaseElement::P34 => 6,
    };
    if nstokes < needed {
        return Err(OpticsError::legendre(format!(
            "{element} needs {needed} coefficient series, table has {nstokes}"
        )));
    }
    let row = |i: usize| &legcoef[i * nleg..(i + 1) * nleg];

    Ok(angles_deg
        .iter()
        .map(|angle| {
            let x = angle.to_radians().cos();
            match element {
                PhaseElement::P11 => series(row(0), &wigner_d(0, 0, x, nleg)),
                PhaseElement::P44 => series(row(3), &wigner_d(0, 0, x, nleg)),
                PhaseElement::P12 => series(row(4), &wigner_d(0, 2, x, nleg)),
                PhaseElement::P34 => series(row(5), &wigner_d(0, 2, x, nleg)),
                PhaseElement::P22 | PhaseElement::P33 => {
                    let (a2, a3) = (row(1), row(2));
                    let sum: Vec<f64> = a2.iter().zip(a3).map(|(p, q)| p + q).collect();
                    let diff: Vec<f64> = a2.iter().zip(a3).map(|(p, q)| p - q).collect();
                    let plus = series(&sum, &wigner_d(2, 2, x, nleg));
                    let minus = series(&diff, &wigner_d(2, -2, x, nleg));
                    if element == PhaseElement::P22 {
                        0.5 * (plus + minus)
                    } else {
                        0.5 * (plus - minus)
                    }
                }
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_legendre_polynomials() {
        let x: f64 = 0.3;
        let p = wigner_d(0, 0, x, 4);
        assert_relative_eq!(p[0], 1.0);
        assert_relative_eq!(p[1], x);
        assert_relative_eq!(p[2], 0.5 * (3.0 * x * x - 1.0), epsilon = 1e-12);
        assert_relative_eq!(p[3], 0.5 * (5.0 * x.powi(3) - 3.0 * x), epsilon = 1e-12);
    }

    #[test]
    fn test_wigner_closed_forms() {
        let x: f64 = -0.4;
        let d02 = wigner_d(0, 2, x, 4);
        assert_eq!(d02[0], 0.0);
        assert_eq!(d02[1], 0.0);
        // d^3_02 = sqrt(15/8) x (1 - x^2)
        assert_relative_eq!(d02[3], (15.0_f64 / 8.0).sqrt() * x * (1.0 - x * x), epsilon = 1e-12);

        // d^l_22(1) = 1 and d^l_2,-2(-1) = (-1)^l for every l >= 2
        let forward = wigner_d(2, 2, 1.0, 6);
        let backward = wigner_d(2, -2, -1.0, 6);
        for l in 2..6 {
            assert_relative_eq!(forward[l], 1.0, epsilon = 1e-12);
            assert_relative_eq!(backward[l], (-1.0_f64).powi(l as i32), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_isotropic_p11() {
        let nleg = 4;
        let mut coef = vec![0.0; 6 * nleg];
        coef[0] = 1.0;
        let angles: Vec<f64> = (0..=18).map(|i| f64::from(i) * 10.0).collect();
        let p11 = transform_leg_to_phase(&coef, 6, nleg, PhaseElement::P11, &angles).unwrap();
        for value in p11 {
            assert_relative_eq!(value, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rayleigh_like_forward_backward_symmetry() {
        // a1 = (1, 0, 0.5): P11 = 1 + 0.5 P2(cos θ), symmetric about 90°
        let nleg = 3;
        let mut coef = vec![0.0; 6 * nleg];
        coef[0] = 1.0;
        coef[2] = 0.5;
        let p11 = transform_leg_to_phase(&coef, 6, nleg, PhaseElement::P11, &[0.0, 90.0, 180.0]).unwrap();
        assert_relative_eq!(p11[0], 1.5, epsilon = 1e-12);
        assert_relative_eq!(p11[1], 0.75, epsilon = 1e-12);
        assert_relative_eq!(p11[2], 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_missing_series_rows() {
        let coef = vec![1.0, 0.0];
        assert!(transform_leg_to_phase(&coef, 1, 2, PhaseElement::P11, &[0.0]).is_ok());
        assert!(transform_leg_to_phase(&coef, 1, 2, PhaseElement::P12, &[0.0]).is_err());
        assert!(transform_leg_to_phase(&coef, 2, 2, PhaseElement::P11, &[0.0]).is_err());
    }
}
