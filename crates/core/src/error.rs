//! Error types shared by the validation contracts, the optical property mapper
//! and the phase function reconstructor.
//!
//! Every check fails on the first violated invariant. Callers branch on
//! [`OpticsError::kind`] to decide whether to abort configuration or to fix the
//! input and re-invoke; nothing here is retried internally.

use std::fmt;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, OpticsError>;

/// Fieldless discriminant of [`OpticsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingVariable,
    NegativeValue,
    OutOfRange,
    MissingDimension,
    GridInvariant,
    LegendreTableInvalid,
    MissingInterpolationVariable,
    InterpolationDomainError,
    InvalidPhaseElement,
    InvalidPhaseElementType,
    InvalidStokesComponent,
    InvalidBooleanVariable,
    InvalidShape,
    HorizontalRayForbidden,
    DirectionCosineOutOfRange,
}

/// Errors raised while validating or transforming structured fields.
#[derive(Debug, Clone, PartialEq)]
pub enum OpticsError {
    /// A name could not be resolved as a variable or coordinate of the field.
    MissingVariable {
        /// The unresolved name.
        name: String,
    },
    /// Negative values survived rounding.
    NegativeValue {
        /// Offending variable.
        name: String,
    },
    /// Values fall outside an inclusive range.
    OutOfRange {
        /// Offending variable.
        name: String,
        /// Inclusive lower bound.
        low: f64,
        /// Inclusive upper bound.
        high: f64,
    },
    /// A variable does not carry an expected dimension.
    MissingDimension {
        /// Offending variable.
        name: String,
        /// The absent dimension label.
        dim: String,
    },
    /// The field does not qualify as a computational grid.
    GridInvariant {
        /// Axis that violated the grid contract (`x`, `y` or `z`).
        axis: String,
        /// What went wrong.
        reason: String,
    },
    /// The Legendre/Wigner coefficient table is not physically valid.
    LegendreTableInvalid {
        /// What went wrong.
        reason: String,
    },
    /// The microphysics field lacks variables for some table axes.
    MissingInterpolationVariable {
        /// Every missing axis name, in table coordinate order.
        names: Vec<String>,
    },
    /// Interpolation could not be evaluated (extrapolation, NaN, bad axis).
    InterpolationDomainError {
        /// Variable or axis involved.
        variable: String,
        /// What went wrong.
        reason: String,
    },
    /// A phase matrix element label is not in the fixed vocabulary.
    InvalidPhaseElement {
        /// The rejected label.
        element: String,
    },
    /// The phase element selection is neither a label nor a list of labels.
    InvalidPhaseElementType {
        /// What was supplied instead.
        reason: String,
    },
    /// A sensor `stokes_index` label is not one of I, Q, U, V.
    InvalidStokesComponent {
        /// The rejected label.
        component: String,
    },
    /// A variable expected to hold booleans holds something else.
    InvalidBooleanVariable {
        /// Offending variable.
        name: String,
    },
    /// A variable has the wrong shape or element type for its role.
    InvalidShape {
        /// Offending variable.
        name: String,
        /// What went wrong.
        reason: String,
    },
    /// A ray or pixel direction is exactly horizontal (`mu == 0`).
    HorizontalRayForbidden {
        /// Offending variable.
        name: String,
    },
    /// A direction cosine lies outside [-1, 1].
    DirectionCosineOutOfRange {
        /// Offending variable.
        name: String,
    },
}

impl OpticsError {
    /// Discriminant used by callers that only need to branch on the failure class.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingVariable { .. } => ErrorKind::MissingVariable,
            Self::NegativeValue { .. } => ErrorKind::NegativeValue,
            Self::OutOfRange { .. } => ErrorKind::OutOfRange,
            Self::MissingDimension { .. } => ErrorKind::MissingDimension,
            Self::GridInvariant { .. } => ErrorKind::GridInvariant,
            Self::LegendreTableInvalid { .. } => ErrorKind::LegendreTableInvalid,
            Self::MissingInterpolationVariable { .. } => ErrorKind::MissingInterpolationVariable,
            Self::InterpolationDomainError { .. } => ErrorKind::InterpolationDomainError,
            Self::InvalidPhaseElement { .. } => ErrorKind::InvalidPhaseElement,
            Self::InvalidPhaseElementType { .. } => ErrorKind::InvalidPhaseElementType,
            Self::InvalidStokesComponent { .. } => ErrorKind::InvalidStokesComponent,
            Self::InvalidBooleanVariable { .. } => ErrorKind::InvalidBooleanVariable,
            Self::InvalidShape { .. } => ErrorKind::InvalidShape,
            Self::HorizontalRayForbidden { .. } => ErrorKind::HorizontalRayForbidden,
            Self::DirectionCosineOutOfRange { .. } => ErrorKind::DirectionCosineOutOfRange,
        }
    }

    pub(crate) fn missing(name: &str) -> Self {
        Self::MissingVariable {
            name: name.to_string(),
        }
    }

    pub(crate) fn grid(axis: &str, reason: impl Into<String>) -> Self {
        Self::GridInvariant {
            axis: axis.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn legendre(reason: impl Into<String>) -> Self {
        Self::LegendreTableInvalid {
            reason: reason.into(),
        }
    }

    pub(crate) fn shape(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidShape {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn domain(variable: &str, reason: impl Into<String>) -> Self {
        Self::InterpolationDomainError {
            variable: variable.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for OpticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingVariable { name } => {
                write!(f, "expected variable with name '{name}' in dataset")
            }
            Self::NegativeValue { name } => write!(f, "negative values found in '{name}'"),
            Self::OutOfRange { name, low, high } => write!(
                f,
                "values outside of range [{low}, {high}] found in variable '{name}'"
            ),
            Self::MissingDimension { name, dim } => {
                write!(f, "expected '{name}' to have dimension '{dim}'")
            }
            Self::GridInvariant { axis, reason } => {
                write!(f, "grid dimension '{axis}': {reason}")
            }
            Self::LegendreTableInvalid { reason } => {
                write!(f, "invalid Legendre table: {reason}")
            }
            Self::MissingInterpolationVariable { names } => write!(
                f,
                "microphysics dataset is missing variables for interpolation of table onto grid: {}",
                names.join(", ")
            ),
            Self::InterpolationDomainError { variable, reason } => {
                write!(f, "cannot interpolate '{variable}': {reason}")
            }
            Self::InvalidPhaseElement { element } => write!(
                f,
                "invalid phase element '{element}', valid values are P11, P22, P33, P44, P12, P34"
            ),
            Self::InvalidPhaseElementType { reason } => write!(
                f,
                "phase elements should be 'All' or a list of element labels: {reason}"
            ),
            Self::InvalidStokesComponent { component } => write!(
                f,
                "invalid Stokes component '{component}', valid values are I, Q, U, V"
            ),
            Self::InvalidBooleanVariable { name } => {
                write!(f, "'{name}' variable should be of boolean type")
            }
            Self::InvalidShape { name, reason } => write!(f, "'{name}' has invalid shape: {reason}"),
            Self::HorizontalRayForbidden { name } => {
                write!(f, "values of mu in '{name}' cannot be 0.0")
            }
            Self::DirectionCosineOutOfRange { name } => {
                write!(f, "direction cosines in '{name}' must lie in [-1.0, 1.0]")
            }
        }
    }
}

impl std::error::Error for OpticsError {}
