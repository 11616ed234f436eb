//! Phase function reconstruction from a Legendre table

use super::elements::PhaseSelection;
use super::series::transform_leg_to_phase;
use crate::core_types::{StructuredField, VarData, Variable, LEGENDRE_INDEX, STOKES_INDEX};
use crate::error::{OpticsError, Result};
use ndarray::{indices, ArrayD, Dimension, IxDyn};
use rayon::prelude::*;
use tracing::{debug, info};

/// Output dimension holding the element labels
pub const PHASE_ELEMENTS: &str = "phase_elements";
/// Output dimension holding the angles, in degrees
pub const SCATTERING_ANGLE: &str = "scattering_angle";

/// Labelled axis sizes
type AxisSizes<'a> = Vec<(&'a str, usize)>;

/// Evaluate the selected phase matrix elements of every `legcoef` entry
///
/// Every `legcoef` dim other than `stokes_index` and `legendre_index` is an
/// additional axis. Axes of size 1 are squeezed; the rest (including empty
/// axes) are enumerated in row-major order and kept in the output after
/// `phase_elements` and `scattering_angle`.
///
/// # Errors
///
/// - `MissingVariable` if the table has no `legcoef`
/// - `MissingDimension` if `legcoef` lacks `stokes_index` or `legendre_index`
/// - `LegendreTableInvalid` if a selected element needs coefficient series
///   the table does not hold
pub fn get_phase_function(
    table: &StructuredField,
    angles_deg: &[f64],
    selection: &PhaseSelection,
) -> Result<StructuredField> {
    let legcoef = table.get_variable("legcoef")?;
    let dim_size = |dim: &str| {
        legcoef
            .size_of(dim)
            .ok_or_else(|| OpticsError::MissingDimension {
                name: "legcoef".to_string(),
                dim: dim.to_string(),
            })
    };
    let nstokes = dim_size(STOKES_INDEX)?;
    let nleg = dim_size(LEGENDRE_INDEX)?;

    let extra: AxisSizes = legcoef
        .dims()
        .iter()
        .zip(legcoef.shape())
        .filter(|(d, _)| d.as_str() != STOKES_INDEX && d.as_str() != LEGENDRE_INDEX)
        .map(|(d, &n)| (d.as_str(), n))
        .collect();
    let (kept, squeezed): (AxisSizes, AxisSizes) =
        extra.into_iter().partition(|&(_, n)| n != 1);
    let kept_shape: Vec<usize> = kept.iter().map(|&(_, n)| n).collect();
    let ncombo: usize = kept_shape.iter().product();

    let elements = selection.elements();
    let nangle = angles_deg.len();
    info!(
        elements = elements.len(),
        angles = nangle,
        entries = ncombo,
        "reconstructing phase functions"
    );
    if !squeezed.is_empty() {
        let names: Vec<&str> = squeezed.iter().map(|&(d, _)| d).collect();
        debug!(axes = ?names, "squeezed degenerate axes");
    }

    let coefficient_dims = [STOKES_INDEX.to_string(), LEGENDRE_INDEX.to_string()];
    let positions: Vec<IxDyn> = indices(IxDyn(&kept_shape)).into_iter().collect();
    // One row-major [element][angle] block per kept-axis combination
    let blocks: Vec<Vec<f64>> = positions
        .par_iter()
        .map(|position| -> Result<Vec<f64>> {
            let index: Vec<(&str, usize)> = kept
                .iter()
                .zip(position.slice())
                .map(|(&(d, _), &i)| (d, i))
                .chain(squeezed.iter().map(|&(d, _)| (d, 0)))
                .collect();
            let coefficients = legcoef
                .select(&index)?
                .broadcast_to("legcoef", &coefficient_dims, &[nstokes, nleg])?;
            let mut block = Vec::with_capacity(elements.len() * nangle);
            for &element in &elements {
                block.extend(transform_leg_to_phase(
                    &coefficients,
                    nstokes,
                    nleg,
                    element,
                    angles_deg,
                )?);
            }
            Ok(block)
        })
        .collect::<Result<_>>()?;

    // [kept..., element, angle] in combination order, moved to [element, angle, kept...]
    let mut stacked_shape = kept_shape.clone();
    stacked_shape.extend([elements.len(), nangle]);
    let stacked = ArrayD::from_shape_vec(IxDyn(&stacked_shape), blocks.concat())
        .map_err(|e| OpticsError::shape("phase_function", e.to_string()))?;
    let nkept = kept_shape.len();
    let order: Vec<usize> = [nkept, nkept + 1].into_iter().chain(0..nkept).collect();
    let values = stacked.permuted_axes(IxDyn(&order));

    let mut dims = vec![PHASE_ELEMENTS, SCATTERING_ANGLE];
    dims.extend(kept.iter().map(|&(d, _)| d));

    let mut output = StructuredField::new()
        .with_variable("phase_function", Variable::new(&dims, VarData::Float(values))?)?
        .with_coord(
            PHASE_ELEMENTS,
            Variable::labels(PHASE_ELEMENTS, elements.iter().map(|e| e.label())),
        )?
        .with_coord(
            SCATTERING_ANGLE,
            Variable::coord(SCATTERING_ANGLE, angles_deg.to_vec()),
        )?;
    for &(axis, _) in &kept {
        if let Some(coord) = table.index_coord(axis) {
            output.insert_coord(axis, coord.clone())?;
        }
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::TABLE_INDEX;
    use crate::error::ErrorKind;
    use crate::phase::PhaseElement;
    use approx::assert_relative_eq;

    /// Two-entry table over `reff`: entry 0 isotropic, entry 1 with a1 = (1, 0.6)
    fn table(nstokes: usize) -> StructuredField {
        let nleg = 2;
        let mut coef = vec![0.0; nstokes * nleg * 2];
        coef[0] = 1.0;
        coef[1] = 1.0;
        coef[3] = 0.6;
        StructuredField::new()
            .with_variable(
                "legcoef",
                Variable::float(&[STOKES_INDEX, LEGENDRE_INDEX, "reff"], &[nstokes, nleg, 2], coef)
                    .unwrap(),
            )
            .unwrap()
            .with_coord("reff", Variable::coord("reff", vec![5.0, 10.0]))
            .unwrap()
    }

    #[test]
    fn test_layout_and_values() {
        let selection = PhaseSelection::Elements(vec![PhaseElement::P11]);
        let out = get_phase_function(&table(6), &[0.0, 90.0, 180.0], &selection).unwrap();

        let phase = out.get_variable("phase_function").unwrap();
        assert_eq!(phase.dims(), &[PHASE_ELEMENTS, SCATTERING_ANGLE, "reff"]);
        assert_eq!(phase.shape(), &[1, 3, 2]);

        let iso = phase.select(&[(PHASE_ELEMENTS, 0), ("reff", 0)]).unwrap();
        for &v in iso.as_floats().unwrap() {
            assert_relative_eq!(v, 1.0, epsilon = 1e-12);
        }
        let forward = phase.select(&[(PHASE_ELEMENTS, 0), ("reff", 1)]).unwrap();
        let forward = forward.as_floats().unwrap();
        assert_relative_eq!(forward[0], 1.6, epsilon = 1e-12);
        assert_relative_eq!(forward[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(forward[2], 0.4, epsilon = 1e-12);

        assert_eq!(out.get_variable("reff").unwrap().as_floats().unwrap(), &[5.0, 10.0]);
        assert_eq!(
            out.get_variable(PHASE_ELEMENTS).unwrap().as_labels().unwrap(),
            &["P11".to_string()]
        );
    }

    #[test]
    fn test_degenerate_axes_squeezed() {
        let coef = vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let table = StructuredField::new()
            .with_variable(
                "legcoef",
                Variable::float(&[STOKES_INDEX, LEGENDRE_INDEX, TABLE_INDEX], &[6, 1, 1], coef)
                    .unwrap(),
            )
            .unwrap();
        let out = get_phase_function(&table, &[10.0, 20.0], &PhaseSelection::All).unwrap();
        let phase = out.get_variable("phase_function").unwrap();
        assert_eq!(phase.dims(), &[PHASE_ELEMENTS, SCATTERING_ANGLE]);
        assert_eq!(phase.shape(), &[6, 2]);
        assert_eq!(out.get_variable(PHASE_ELEMENTS).unwrap().len(), 6);
    }

    #[test]
    fn test_empty_axis_kept_with_empty_output() {
        let table = StructuredField::new()
            .with_variable(
                "legcoef",
                Variable::float(&[STOKES_INDEX, LEGENDRE_INDEX, "reff"], &[6, 1, 0], Vec::new())
                    .unwrap(),
            )
            .unwrap();
        let out = get_phase_function(&table, &[10.0, 20.0], &PhaseSelection::All).unwrap();
        let phase = out.get_variable("phase_function").unwrap();
        assert_eq!(phase.dims(), &[PHASE_ELEMENTS, SCATTERING_ANGLE, "reff"]);
        assert_eq!(phase.shape(), &[6, 2, 0]);
        assert!(phase.is_empty());
    }

    #[test]
    fn test_multiple_axes_in_any_dim_order() {
        // legcoef[reff, stokes_index, veff, legendre_index, alpha] with alpha degenerate
        let mut coef = vec![0.0; 2 * 3 * 2];
        for entry in 0..6 {
            coef[entry * 2] = 1.0;
            coef[entry * 2 + 1] = 0.1 * entry as f64;
        }
        let table = StructuredField::new()
            .with_variable(
                "legcoef",
                Variable::float(
                    &["reff", STOKES_INDEX, "veff", LEGENDRE_INDEX, "alpha"],
                    &[2, 1, 3, 2, 1],
                    coef,
                )
                .unwrap(),
            )
            .unwrap()
            .with_coord("veff", Variable::coord("veff", vec![0.1, 0.2, 0.3]))
            .unwrap();
        let selection = PhaseSelection::Elements(vec![PhaseElement::P11]);
        let out = get_phase_function(&table, &[0.0], &selection).unwrap();

        let phase = out.get_variable("phase_function").unwrap();
        assert_eq!(phase.dims(), &[PHASE_ELEMENTS, SCATTERING_ANGLE, "reff", "veff"]);
        assert_eq!(phase.shape(), &[1, 1, 2, 3]);
        for (entry, &value) in phase.as_floats().unwrap().iter().enumerate() {
            assert_relative_eq!(value, 1.0 + 0.1 * entry as f64, epsilon = 1e-12);
        }
        // reff has no coordinate in the table, veff does
        assert!(!out.contains("reff"));
        assert_eq!(out.get_variable("veff").unwrap().len(), 3);
    }

    #[test]
    fn test_element_needs_missing_rows() {
        let selection = PhaseSelection::Elements(vec![PhaseElement::P34]);
        let err = get_phase_function(&table(1), &[0.0], &selection).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LegendreTableInvalid);
    }

    #[test]
    fn test_missing_bookkeeping_dim() {
        let table = StructuredField::new()
            .with_variable("legcoef", Variable::coord(STOKES_INDEX, vec![1.0]))
            .unwrap();
        let err = get_phase_function(&table, &[0.0], &PhaseSelection::All).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingDimension);
    }
}
