//! Phase matrix element vocabulary and selections

use crate::core_types::Variable;
use crate::error::{OpticsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One element of the scattering phase matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseElement {
    P11,
    P22,
    P33,
    P44,
    P12,
    P34,
}

impl PhaseElement {
    /// Every element in canonical order
    pub const ALL: [PhaseElement; 6] = [
        PhaseElement::P11,
        PhaseElement::P22,
        PhaseElement::P33,
        PhaseElement::P44,
        PhaseElement::P12,
        PhaseElement::P34,
    ];

    /// Label used in coordinates and selections
    pub const fn label(self) -> &'static str {
        match self {
            Self::P11 => "P11",
            Self::P22 => "P22",
            Self::P33 => "P33",
            Self::P44 => "P44",
            Self::P12 => "P12",
            Self::P34 => "P34",
        }
    }
}

impl fmt::Display for PhaseElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PhaseElement {
    type Err = OpticsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|e| e.label() == s)
            .ok_or_else(|| OpticsError::InvalidPhaseElement {
                element: s.to_string(),
            })
    }
}

/// Which phase matrix elements to reconstruct
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseSelection {
    /// Every element, in canonical order
    All,
    /// An explicit list, in the given order
    Elements(Vec<PhaseElement>),
}

impl PhaseSelection {
    /// Parse a single label: `"All"` or one element name
    ///
    /// # Errors
    ///
    /// `InvalidPhaseElement` for an unknown label.
    pub fn from_label(label: &str) -> Result<Self> {
        if label == "All" {
            return Ok(Self::All);
        }
        Ok(Self::Elements(vec![label.parse()?]))
    }

    /// Parse a list of element labels
    ///
    /// # Errors
    ///
    /// `InvalidPhaseElement` for the first unknown label,
    /// `InvalidPhaseElementType` for an empty list.
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Result<Self> {
        if labels.is_empty() {
            return Err(OpticsError::InvalidPhaseElementType {
                reason: "empty selection".to_string(),
            });
        }
        let elements = labels
            .iter()
            .map(|l| l.as_ref().parse())
            .collect::<Result<Vec<PhaseElement>>>()?;
        Ok(Self::Elements(elements))
    }

    /// Parse a selection held in a variable
    ///
    /// A zero-dimensional text variable is a single label, a one-dimensional
    /// text variable is a list.
    ///
    /// # Errors
    ///
    /// `InvalidPhaseElementType` for non-text data or higher rank,
    /// otherwise as [`PhaseSelection::from_label`] / [`PhaseSelection::from_labels`].
    pub fn from_variable(variable: &Variable) -> Result<Self> {
        let labels = variable
            .as_labels()
            .ok_or_else(|| OpticsError::InvalidPhaseElementType {
                reason: format!("found {} values", variable.data().type_name()),
            })?;
        match variable.dims().len() {
            0 => Self::from_label(&labels[0]),
            1 => Self::from_labels(labels),
            rank => Err(OpticsError::InvalidPhaseElementType {
                reason: format!("found rank {rank} text array"),
            }),
        }
    }

    /// Selected elements in output order
    pub fn elements(&self) -> Vec<PhaseElement> {
        match self {
            Self::All => PhaseElement::ALL.to_vec(),
            Self::Elements(elements) => elements.clone(),
        }
    }
}

impl FromStr for PhaseSelection {
    type Err = OpticsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_label(s)
    }
}
