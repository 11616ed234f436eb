//! Scattering table to grid mapping
//!
//! Interpolates a scattering lookup table onto the per-cell microphysics of a
//! grid and stores only the phase functions that the grid actually realizes.

use super::compression::TableIndexCompression;
use super::interpolate::{AxisPosition, TableAxes};
use crate::checks::{check_exists, check_positivity, DEFAULT_PRECISION};
use crate::core_types::{
    AttrValue, StructuredField, VarData, Variable, LEGENDRE_INDEX, STOKES_INDEX, TABLE_INDEX,
};
use crate::error::{OpticsError, Result};
use indexmap::IndexMap;
use ndarray::{indices, ArrayD, Axis, Dimension, IxDyn};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Table coordinates that index bookkeeping axes rather than microphysics
pub const BOOKKEEPING_COORDS: [&str; 3] = [TABLE_INDEX, STOKES_INDEX, LEGENDRE_INDEX];

/// Grid coordinates and spacings carried from the microphysics field
const GRID_COORDS: [&str; 3] = ["x", "y", "z"];
const GRID_SPACINGS: [&str; 2] = ["delx", "dely"];

/// Which side wins when table and microphysics attributes share a key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributePrecedence {
    /// Table units and metadata override the microphysics field
    #[default]
    Table,
    /// Microphysics provenance overrides the table
    Microphysics,
}

/// Configuration for [`table_to_grid`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Treat the interpolated efficiency as the extinction itself, ignoring density.
    /// Used when extinction is the retrieved quantity.
    pub inverse_mode: bool,
    /// Decimals kept when normalizing `density`
    pub precision: u32,
    /// Conflict rule for merged attributes
    pub attribute_precedence: AttributePrecedence,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            inverse_mode: false,
            precision: DEFAULT_PRECISION,
            attribute_precedence: AttributePrecedence::Table,
        }
    }
}

impl MappingConfig {
    /// Default configuration in inverse mode
    pub fn inverse() -> Self {
        Self {
            inverse_mode: true,
            ..Default::default()
        }
    }
}

/// Per-cell interpolation result
#[derive(Debug, Clone, Copy)]
struct CellSample {
    ssalb: f64,
    efficiency: f64,
    raw_index: f64,
}

/// Names of the table coordinates that need a microphysics variable
pub fn interpolation_axes(table: &StructuredField) -> Vec<String> {
    table
        .coord_names()
        .filter(|name| !BOOKKEEPING_COORDS.contains(name))
        .map(str::to_string)
        .collect()
}

/// Interpolate `table` onto the grid of `microphysics`
///
/// `density` is validated with [`check_positivity`] first, so slightly
/// negative density values in `microphysics` are rounded in place.
///
/// The result holds `extinction`, `ssalb`, `density`, a `legcoef` table over
/// `table_index` holding only the realized phase functions, and a `table_index`
/// coordinate over the grid dims holding dense ids starting at 1.
///
/// # Errors
///
/// - `MissingVariable` / `NegativeValue` from the density check or for absent
///   table variables
/// - `MissingInterpolationVariable` listing every table axis the
///   microphysics field lacks
/// - `InterpolationDomainError` when a cell falls outside the table or a
///   realized table index does not address a `legcoef` entry
/// - `InvalidShape` / `MissingDimension` for inconsistent variable layouts
pub fn table_to_grid(
    microphysics: &mut StructuredField,
    table: &StructuredField,
    config: &MappingConfig,
) -> Result<StructuredField> {
    check_positivity(microphysics, &["density"], config.precision)?;
    check_exists(table, &["extinction", "ssalb", "legcoef", TABLE_INDEX])?;

    let axis_names = interpolation_axes(table);
    let missing: Vec<String> = axis_names
        .iter()
        .filter(|name| !microphysics.contains(name))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(OpticsError::MissingInterpolationVariable { names: missing });
    }

    let density = microphysics.get_variable("density")?;
    let grid_dims = density.dims().to_vec();
    let grid_shape = density.shape().to_vec();
    let density_values = density.try_floats("density")?;
    let ncells = density_values.len();
    info!(
        cells = ncells,
        axes = ?axis_names,
        inverse_mode = config.inverse_mode,
        "mapping scattering table onto grid"
    );

    let axes = TableAxes::from_table(table, &axis_names)?;
    let ssalb = axes.bind("ssalb", table.get_variable("ssalb")?)?;
    let efficiency = axes.bind("extinction", table.get_variable("extinction")?)?;
    let index = axes.bind(TABLE_INDEX, table.get_variable(TABLE_INDEX)?)?;

    let inputs: Vec<Vec<f64>> = axis_names
        .iter()
        .map(|name| {
            microphysics
                .get_variable(name)?
                .broadcast_to(name, &grid_dims, &grid_shape)
        })
        .collect::<Result<_>>()?;

    // Cells are independent; errors are reported for the first failing cell in grid order
    let samples: Vec<Result<CellSample>> = (0..ncells)
        .into_par_iter()
        .map(|cell| {
            let positions: Vec<AxisPosition> = axes.locate_all(inputs.iter().map(|v| v[cell]))?;
            Ok(CellSample {
                ssalb: ssalb.linear(&positions),
                efficiency: efficiency.linear(&positions),
                raw_index: index.nearest(&positions),
            })
        })
        .collect();
    let samples: Vec<CellSample> = samples.into_iter().collect::<Result<_>>()?;

    let extinction: Vec<f64> = samples
        .iter()
        .zip(density_values)
        .map(|(s, rho)| {
            if config.inverse_mode {
                s.efficiency
            } else {
                s.efficiency * rho
            }
        })
        .collect();

    let compression =
        TableIndexCompression::from_raw(samples.iter().map(|s| s.raw_index).collect())?;
    debug!(
        cells = ncells,
        distinct = compression.distinct(),
        "compressed table indices"
    );
    let legcoef = subset_legcoef(table.get_variable("legcoef")?, &axes, &compression.unique)?;

    let mut optical = StructuredField::new();
    optical.insert_variable(
        "extinction",
        Variable::float(&grid_dims, &grid_shape, extinction)?,
    )?;
    optical.insert_variable(
        "ssalb",
        Variable::float(&grid_dims, &grid_shape, samples.iter().map(|s| s.ssalb).collect())?,
    )?;
    optical.insert_variable("density", microphysics.get_variable("density")?.clone())?;
    optical.insert_variable("legcoef", legcoef)?;

    for name in GRID_COORDS {
        if let Ok(coord) = microphysics.get_variable(name) {
            optical.insert_coord(name, coord.clone())?;
        }
    }
    for name in GRID_SPACINGS {
        if let Ok(spacing) = microphysics.get_variable(name) {
            optical.insert_variable(name, spacing.clone())?;
        }
    }
    if let Some(stokes) = table.index_coord(STOKES_INDEX) {
        optical.insert_coord(STOKES_INDEX, stokes.clone())?;
    }
    let compacted = compression.compacted.iter().map(|&id| id as i64).collect();
    optical.insert_coord(
        TABLE_INDEX,
        Variable::int(&grid_dims, &grid_shape, compacted)?,
    )?;

    merge_attrs(&mut optical, table, microphysics, config.attribute_precedence);
    Ok(optical)
}

/// Flatten `legcoef` over the table axes and keep only the `unique` entries
///
/// Entries are flattened in row-major order over the axes in table coordinate
/// order; a table index is a position in that flattening.
fn subset_legcoef(legcoef: &Variable, axes: &TableAxes, unique: &[i64]) -> Result<Variable> {
    let nstokes = legcoef
        .size_of(STOKES_INDEX)
        .ok_or_else(|| OpticsError::MissingDimension {
            name: "legcoef".to_string(),
            dim: STOKES_INDEX.to_string(),
        })?;
    let nleg = legcoef
        .size_of(LEGENDRE_INDEX)
        .ok_or_else(|| OpticsError::MissingDimension {
            name: "legcoef".to_string(),
            dim: LEGENDRE_INDEX.to_string(),
        })?;
    // Validates that every other legcoef dim is a table axis of matching size
    let table_dims: Vec<String> = legcoef
        .dims()
        .iter()
        .filter(|d| d.as_str() != STOKES_INDEX && d.as_str() != LEGENDRE_INDEX)
        .cloned()
        .collect();
    let table_shape: Vec<usize> = table_dims
        .iter()
        .filter_map(|d| legcoef.size_of(d))
        .collect();
    axes.bind("legcoef", &Variable::full(&table_dims, &table_shape, 0.0))?;

    let sizes = axes.sizes();
    let entries: usize = sizes.iter().product();
    // flat legcoef entry -> position along the output table_index
    let mut slots: FxHashMap<usize, usize> = FxHashMap::default();
    for (t, &id) in unique.iter().enumerate() {
        let flat = usize::try_from(id)
            .ok()
            .filter(|&f| f < entries)
            .ok_or_else(|| {
                OpticsError::domain(
                    TABLE_INDEX,
                    format!("table index {id} does not address one of {entries} legcoef entries"),
                )
            })?;
        slots.insert(flat, t);
    }

    let coefficient_dims = [STOKES_INDEX.to_string(), LEGENDRE_INDEX.to_string()];
    let mut values = ArrayD::<f64>::zeros(IxDyn(&[nstokes, nleg, unique.len()]));
    for (flat, position) in indices(IxDyn(&sizes)).into_iter().enumerate() {
        let Some(&t) = slots.get(&flat) else {
            continue;
        };
        let selection: Vec<(&str, usize)> = axes
            .names()
            .iter()
            .zip(position.slice())
            .filter(|(name, _)| legcoef.has_dim(name))
            .map(|(name, &i)| (name.as_str(), i))
            .collect();
        let coefficients = legcoef.select(&selection)?.broadcast_to(
            "legcoef",
            &coefficient_dims,
            &[nstokes, nleg],
        )?;
        let mut slot = values.index_axis_mut(Axis(2), t);
        for (target, value) in slot.iter_mut().zip(coefficients) {
            *target = value;
        }
    }

    Variable::new(
        &[STOKES_INDEX, LEGENDRE_INDEX, TABLE_INDEX],
        VarData::Float(values),
    )
}

fn merge_attrs(
    optical: &mut StructuredField,
    table: &StructuredField,
    microphysics: &StructuredField,
    precedence: AttributePrecedence,
) {
    let (first, last) = match precedence {
        AttributePrecedence::Table => (microphysics, table),
        AttributePrecedence::Microphysics => (table, microphysics),
    };
    let mut merged: IndexMap<String, AttrValue> = first.attrs().clone();
    for (key, value) in last.attrs() {
        merged.insert(key.clone(), value.clone());
    }
    for (key, value) in merged {
        optical.set_attr(&key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use approx::assert_relative_eq;

    /// One-axis table over `reff` with entry `i` having ssalb 0.9 + 0.01 i,
    /// extinction efficiency 2 + i and asymmetry coefficient 0.1 i.
    fn reff_table(reff: &[f64]) -> StructuredField {
        let n = reff.len();
        let nleg = 2;
        let mut legcoef = vec![0.0; 6 * nleg * n];
        for i in 0..n {
            legcoef[i] = 1.0;
            legcoef[n + i] = 0.1 * i as f64;
        }
        StructuredField::new()
            .with_coord("reff", Variable::coord("reff", reff.to_vec()))
            .unwrap()
            .with_coord(TABLE_INDEX, Variable::ints("reff", (0..n as i64).collect()))
            .unwrap()
            .with_variable(
                "ssalb",
                Variable::coord("reff", (0..n).map(|i| 0.9 + 0.01 * i as f64).collect()),
            )
            .unwrap()
            .with_variable(
                "extinction",
                Variable::coord("reff", (0..n).map(|i| 2.0 + i as f64).collect()),
            )
            .unwrap()
            .with_variable(
                "legcoef",
                Variable::float(&[STOKES_INDEX, LEGENDRE_INDEX, "reff"], &[6, nleg, n], legcoef)
                    .unwrap(),
            )
            .unwrap()
            .with_attr("units", "km^-1")
    }

    fn column(density: Vec<f64>, reff: Vec<f64>) -> StructuredField {
        let nz = density.len();
        StructuredField::new()
            .with_coord("z", Variable::coord("z", (0..nz).map(|k| k as f64).collect()))
            .unwrap()
            .with_variable("density", Variable::float(&["z"], &[nz], density).unwrap())
            .unwrap()
            .with_variable("reff", Variable::float(&["z"], &[nz], reff).unwrap())
            .unwrap()
            .with_attr("units", "g/m^3")
            .with_attr("source", "les")
    }

    #[test]
    fn test_interpolated_values_and_compression() {
        let table = reff_table(&[5.0, 10.0, 15.0, 20.0]);
        let mut micro = column(vec![0.5, 1.0, 0.0], vec![7.5, 15.0, 19.0]);
        let optical = table_to_grid(&mut micro, &table, &MappingConfig::default()).unwrap();

        let ssalb = optical.get_variable("ssalb").unwrap().as_floats().unwrap();
        assert_relative_eq!(ssalb[0], 0.905, epsilon = 1e-12);
        assert_relative_eq!(ssalb[1], 0.92, epsilon = 1e-12);

        let ext = optical.get_variable("extinction").unwrap().as_floats().unwrap();
        assert_relative_eq!(ext[0], 2.5 * 0.5, epsilon = 1e-12);
        assert_relative_eq!(ext[1], 4.0, epsilon = 1e-12);
        assert_eq!(ext[2], 0.0);

        // nearest entries: 7.5 -> 0 (tie goes low), 15 -> 2, 19 -> 3
        let ids = optical.get_variable(TABLE_INDEX).unwrap();
        assert_eq!(ids.as_ints().unwrap(), &[1, 2, 3]);

        let legcoef = optical.get_variable("legcoef").unwrap();
        assert_eq!(legcoef.shape(), &[6, 2, 3]);
        let asym = legcoef.select(&[(STOKES_INDEX, 0), (LEGENDRE_INDEX, 1)]).unwrap();
        let asym = asym.as_floats().unwrap();
        assert_relative_eq!(asym[1], 0.2, epsilon = 1e-12);
        assert_relative_eq!(asym[2], 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_mode_ignores_density() {
        let table = reff_table(&[5.0, 10.0]);
        let mut micro = column(vec![3.0, 0.0], vec![5.0, 10.0]);
        let optical = table_to_grid(&mut micro, &table, &MappingConfig::inverse()).unwrap();
        let ext = optical.get_variable("extinction").unwrap().as_floats().unwrap();
        assert_eq!(ext, &[2.0, 3.0]);
    }

    #[test]
    fn test_attribute_precedence() {
        let table = reff_table(&[5.0, 10.0]);
        let mut micro = column(vec![1.0], vec![6.0]);

        let optical = table_to_grid(&mut micro, &table, &MappingConfig::default()).unwrap();
        assert_eq!(optical.attr("units"), Some(&AttrValue::from("km^-1")));
        assert_eq!(optical.attr("source"), Some(&AttrValue::from("les")));

        let config = MappingConfig {
            attribute_precedence: AttributePrecedence::Microphysics,
            ..Default::default()
        };
        let optical = table_to_grid(&mut micro, &table, &config).unwrap();
        assert_eq!(optical.attr("units"), Some(&AttrValue::from("g/m^3")));
    }

    #[test]
    fn test_missing_axes_are_all_listed() {
        let table = reff_table(&[5.0, 10.0])
            .with_coord("veff", Variable::coord("veff", vec![0.1]))
            .unwrap()
            .with_coord("alpha", Variable::coord("alpha", vec![7.0]))
            .unwrap();
        let mut micro = column(vec![1.0], vec![6.0]);
        let err = table_to_grid(&mut micro, &table, &MappingConfig::default()).unwrap_err();
        assert_eq!(
            err,
            OpticsError::MissingInterpolationVariable {
                names: vec!["veff".to_string(), "alpha".to_string()]
            }
        );
    }

    #[test]
    fn test_extrapolation_is_a_domain_error() {
        let table = reff_table(&[5.0, 10.0]);
        let mut micro = column(vec![1.0, 1.0], vec![6.0, 12.0]);
        let err = table_to_grid(&mut micro, &table, &MappingConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InterpolationDomainError);
    }

    #[test]
    fn test_density_rounded_in_place() {
        let table = reff_table(&[5.0, 10.0]);
        let mut micro = column(vec![-1e-18, 1.0], vec![6.0, 7.0]);
        let optical = table_to_grid(&mut micro, &table, &MappingConfig::default()).unwrap();
        let density = micro.get_variable("density").unwrap().as_floats().unwrap();
        assert_eq!(density[0], 0.0);
        assert_eq!(
            optical.get_variable("density").unwrap().as_floats().unwrap()[0],
            0.0
        );

        let mut micro = column(vec![-0.5, 1.0], vec![6.0, 7.0]);
        let err = table_to_grid(&mut micro, &table, &MappingConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NegativeValue);
    }

    #[test]
    fn test_out_of_bounds_table_index() {
        let table = reff_table(&[5.0, 10.0])
            .with_coord(TABLE_INDEX, Variable::ints("reff", vec![0, 9]))
            .unwrap();
        let mut micro = column(vec![1.0], vec![10.0]);
        let err = table_to_grid(&mut micro, &table, &MappingConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InterpolationDomainError);
    }
}
