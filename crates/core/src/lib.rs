//! Optics Core Library
//!
//! Dataset contracts and the microphysics-to-optics mapping that prepares
//! inputs for a 3D polarized radiative transfer solver.
//!
//! ## Pipeline
//!
//! - Validate grids, scattering tables and sensor geometry against their
//!   contracts ([`checks`])
//! - Interpolate a scattering table onto per-cell microphysics and compress
//!   the realized phase functions ([`optics::table_to_grid`])
//! - Reconstruct angular phase functions from Legendre coefficients
//!   ([`phase::get_phase_function`])
//!
//! Every dataset is a [`StructuredField`]: named n-dimensional variables with
//! labelled dimensions, coordinates and attributes.

// Core types and errors
pub mod core_types;
pub mod error;

// Contracts and transforms
pub mod checks;
pub mod medium;
pub mod optics;
pub mod phase;

// Re-export core types
pub use core_types::{AttrValue, StructuredField, VarData, Variable, Vec3};
pub use error::{ErrorKind, OpticsError, Result};

// Re-export contracts and transforms
pub use checks::{
    assert_non_negative, check_exists, check_grid, check_hasdim, check_legendre, check_positivity,
    check_range, check_sensor, normalize, CheckTolerances, DimRule, RangeRule,
};
pub use medium::{bounding_box, combine_to_medium, BoundingBox};
pub use optics::{table_to_grid, AttributePrecedence, MappingConfig, TableIndexCompression};
pub use phase::{get_phase_function, transform_leg_to_phase, PhaseElement, PhaseSelection};
