//! Phase function reconstruction
//!
//! - [`elements`]: element vocabulary and selections
//! - [`series`]: Legendre / Wigner series evaluation
//! - [`reconstruct`]: `get_phase_function` over a whole table

pub mod elements;
pub mod reconstruct;
pub mod series;

pub use elements::{PhaseElement, PhaseSelection};
pub use reconstruct::{get_phase_function, PHASE_ELEMENTS, SCATTERING_ANGLE};
pub use series::transform_leg_to_phase;
