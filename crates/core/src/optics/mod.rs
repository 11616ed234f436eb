//! Optical property mapping
//!
//! Turns a microphysics field and a scattering lookup table into per-cell
//! optical properties for the radiative transfer solver:
//! - [`interpolate`]: multilinear / nearest lookups on the table axes
//! - [`compression`]: dedup of realized table indices
//! - [`mapping`]: the `table_to_grid` pipeline

pub mod compression;
pub mod interpolate;
pub mod mapping;

pub use compression::TableIndexCompression;
pub use interpolate::{locate, AxisPosition, BoundVariable, TableAxes};
pub use mapping::{
    interpolation_axes, table_to_grid, AttributePrecedence, MappingConfig, BOOKKEEPING_COORDS,
};
