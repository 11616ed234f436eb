//! Core types: the generic structured-field data model

pub mod field;
pub mod variable;
pub mod vec3;

pub use field::{AttrValue, StructuredField};
pub use variable::{VarData, Variable};
pub use vec3::Vec3;

/// Dimension label of the six phase matrix expansion series
pub const STOKES_INDEX: &str = "stokes_index";
/// Dimension label of the Legendre/Wigner expansion order
pub const LEGENDRE_INDEX: &str = "legendre_index";
/// Dimension / coordinate label of scattering table entries
pub const TABLE_INDEX: &str = "table_index";
