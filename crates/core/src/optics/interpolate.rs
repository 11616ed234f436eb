//! Multilinear and nearest-neighbour lookup on a rectilinear parameter table
//!
//! Table axes must be strictly increasing. Lookups never extrapolate: a value
//! outside an axis range (or NaN) is an `InterpolationDomainError`.

use crate::core_types::{StructuredField, Variable};
use crate::error::{OpticsError, Result};
use ndarray::{ArrayD, IxDyn};

/// Bracketing position of one value on one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisPosition {
    /// Index of the lower bracketing node
    pub lower: usize,
    /// Index of the upper bracketing node
    pub upper: usize,
    /// Linear weight of the upper node in [0, 1]
    pub weight: f64,
}

impl AxisPosition {
    /// Nearest node; an exact midpoint goes to the lower node
    pub fn nearest(&self) -> usize {
        if self.weight <= 0.5 {
            self.lower
        } else {
            self.upper
        }
    }
}

/// Locate `value` on the strictly increasing `nodes` of axis `name`
///
/// # Errors
///
/// `InterpolationDomainError` for NaN, an empty axis or a value outside the
/// node range.
pub fn locate(name: &str, nodes: &[f64], value: f64) -> Result<AxisPosition> {
    if value.is_nan() {
        return Err(OpticsError::domain(name, "value is NaN"));
    }
    let (first, last) = match (nodes.first(), nodes.last()) {
        (Some(f), Some(l)) => (*f, *l),
        _ => return Err(OpticsError::domain(name, "axis has no nodes")),
    };
    if value < first || value > last {
        return Err(OpticsError::domain(
            name,
            format!("value {value} outside table range [{first}, {last}]"),
        ));
    }
    if nodes.len() == 1 {
        return Ok(AxisPosition {
            lower: 0,
            upper: 0,
            weight: 0.0,
        });
    }

    let above = nodes.partition_point(|n| *n <= value);
    let upper = above.min(nodes.len() - 1);
    let lower = upper - 1;
    let weight = (value - nodes[lower]) / (nodes[upper] - nodes[lower]);
    Ok(AxisPosition {
        lower,
        upper,
        weight,
    })
}

/// The interpolation axes of a scattering table
#[derive(Debug, Clone)]
pub struct TableAxes {
    names: Vec<String>,
    nodes: Vec<Vec<f64>>,
}

impl TableAxes {
    /// Read the named coordinates of `table` as interpolation axes
    ///
    /// # Errors
    ///
    /// `MissingVariable` for an absent coordinate, `InterpolationDomainError`
    /// if an axis is not one-dimensional or not strictly increasing.
    pub fn from_table(table: &StructuredField, names: &[String]) -> Result<Self> {
        let mut nodes = Vec::with_capacity(names.len());
        for name in names {
            let coord = table.get_variable(name)?;
            if coord.dims().len() != 1 {
                return Err(OpticsError::domain(
                    name,
                    format!("table axis must be one-dimensional, has dims {:?}", coord.dims()),
                ));
            }
            let values = coord.to_f64_vec(name)?;
            if values.windows(2).any(|w| w[1].is_nan() || w[1] <= w[0]) {
                return Err(OpticsError::domain(name, "table axis is not strictly increasing"));
            }
            nodes.push(values);
        }
        Ok(Self {
            names: names.to_vec(),
            nodes,
        })
    }

    /// Axis names in table coordinate order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Node count per axis
    pub fn sizes(&self) -> Vec<usize> {
        self.nodes.iter().map(Vec::len).collect()
    }

    /// Locate one sample (one value per axis) on every axis
    ///
    /// # Errors
    ///
    /// See [`locate`].
    pub fn locate_all(&self, sample: impl Iterator<Item = f64>) -> Result<Vec<AxisPosition>> {
        self.names
            .iter()
            .zip(&self.nodes)
            .zip(sample)
            .map(|((name, nodes), value)| locate(name, nodes, value))
            .collect()
    }

    /// Bind a table variable for repeated lookups
    ///
    /// The variable's dims must be a subset of the axes, in any order; it is
    /// constant along axes it lacks.
    ///
    /// # Errors
    ///
    /// `InvalidShape` for a dim that is not an axis or a size that disagrees
    /// with the axis, or for non-numeric data.
    pub fn bind(&self, name: &str, variable: &Variable) -> Result<BoundVariable> {
        let mut axes = Vec::with_capacity(variable.dims().len());
        for (dim, &size) in variable.dims().iter().zip(variable.shape()) {
            let axis = self.names.iter().position(|n| n == dim).ok_or_else(|| {
                OpticsError::shape(name, format!("dimension '{dim}' is not a table axis"))
            })?;
            if self.nodes[axis].len() != size {
                return Err(OpticsError::shape(
                    name,
                    format!(
                        "size {size} along '{dim}' does not match axis of {} nodes",
                        self.nodes[axis].len()
                    ),
                ));
            }
            axes.push(axis);
        }
        Ok(BoundVariable {
            values: variable.to_f64_array(name)?,
            axes,
        })
    }
}

/// Table variable prepared for per-sample lookups
#[derive(Debug, Clone)]
pub struct BoundVariable {
    values: ArrayD<f64>,
    /// Table axis behind each of the variable's own dims
    axes: Vec<usize>,
}

impl BoundVariable {
    /// Multilinear interpolation at the given axis positions
    pub fn linear(&self, positions: &[AxisPosition]) -> f64 {
        let rank = self.axes.len();
        let mut index = vec![0; rank];
        let mut total = 0.0;
        for corner in 0..(1usize << rank) {
            let mut weight = 1.0;
            for (d, &axis) in self.axes.iter().enumerate() {
                let p = positions[axis];
                let (node, w) = if (corner >> d) & 1 == 1 {
                    (p.upper, p.weight)
                } else {
                    (p.lower, 1.0 - p.weight)
                };
                weight *= w;
                index[d] = node;
            }
            // zero-weight corners are skipped so exact node hits return node values
            if weight != 0.0 {
                total += weight * self.values[IxDyn(&index)];
            }
        }
        total
    }

    /// Value at the nearest node along every axis
    pub fn nearest(&self, positions: &[AxisPosition]) -> f64 {
        let index: Vec<usize> = self
            .axes
            .iter()
            .map(|&axis| positions[axis].nearest())
            .collect();
        self.values[IxDyn(&index)]
    }
}
