//! Sensor geometry contract
//!
//! A sensor field carries ray-level geometry on `nrays`, pixel-level geometry
//! on `npixels`, a `wavelength`, boolean `stokes` flags over a `stokes_index`
//! coordinate labelled from {I, Q, U, V}, and a scalar boolean
//! `use_subpixel_rays`. It is checked once before any solve.
//!
//! Note that the height and wavelength checks go through
//! [`check_positivity`](super::check_positivity) and may round those variables
//! in place.

use super::{check_exists, check_hasdim, check_positivity, DimRule, DEFAULT_PRECISION};
use crate::core_types::StructuredField;
use crate::error::{OpticsError, Result};
use tracing::debug;

const RAY_VARIABLES: [&str; 7] = [
    "ray_mu",
    "ray_phi",
    "ray_x",
    "ray_y",
    "ray_z",
    "ray_weight",
    "pixel_index",
];
const PIXEL_VARIABLES: [&str; 5] = ["cam_mu", "cam_phi", "cam_x", "cam_y", "cam_z"];
const STOKES_COMPONENTS: [&str; 4] = ["I", "Q", "U", "V"];

/// Check that `field` can act as sensor geometry
///
/// # Errors
///
/// In order of checking: `MissingVariable` / `MissingDimension`,
/// `NegativeValue` for heights or wavelength, `DirectionCosineOutOfRange`,
/// `HorizontalRayForbidden`, `InvalidStokesComponent`,
/// `InvalidBooleanVariable`, and `InvalidShape` when `use_subpixel_rays` is
/// not a single value.
pub fn check_sensor(field: &mut StructuredField) -> Result<()> {
    let mut rules: Vec<DimRule> = RAY_VARIABLES
        .iter()
        .map(|name| DimRule::single(name, "nrays"))
        .collect();
    rules.extend(
        PIXEL_VARIABLES
            .iter()
            .map(|name| DimRule::single(name, "npixels")),
    );
    check_hasdim(field, &rules)?;

    check_positivity(field, &["cam_z", "ray_z"], DEFAULT_PRECISION)?;
    check_positivity(field, &["wavelength"], DEFAULT_PRECISION)?;

    for name in ["cam_mu", "ray_mu"] {
        let mu = field.get_variable(name)?.to_f64_vec(name)?;
        if mu.iter().any(|m| m.is_nan() || !(-1.0..=1.0).contains(m)) {
            return Err(OpticsError::DirectionCosineOutOfRange {
                name: name.to_string(),
            });
        }
    }
    for name in ["cam_mu", "ray_mu"] {
        let mu = field.get_variable(name)?.to_f64_vec(name)?;
        if mu.contains(&0.0) {
            return Err(OpticsError::HorizontalRayForbidden {
                name: name.to_string(),
            });
        }
    }

    check_exists(field, &["stokes_index"])?;
    let components = field.get_variable("stokes_index")?.data().labels();
    if let Some(bad) = components
        .iter()
        .find(|c| !STOKES_COMPONENTS.contains(&c.as_str()))
    {
        return Err(OpticsError::InvalidStokesComponent {
            component: bad.clone(),
        });
    }

    check_hasdim(field, &[DimRule::single("stokes", "stokes_index")])?;
    check_exists(field, &["use_subpixel_rays"])?;
    for name in ["stokes", "use_subpixel_rays"] {
        if field.get_variable(name)?.as_flags().is_none() {
            return Err(OpticsError::InvalidBooleanVariable {
                name: name.to_string(),
            });
        }
    }
    let subpixel = field.get_variable("use_subpixel_rays")?;
    if subpixel.len() != 1 {
        return Err(OpticsError::shape(
            "use_subpixel_rays",
            format!("should hold a single value, found {}", subpixel.len()),
        ));
    }

    debug!(
        nrays = field.dim_size("nrays").unwrap_or(0),
        npixels = field.dim_size("npixels").unwrap_or(0),
        "sensor geometry validated"
    );
    Ok(())
}
