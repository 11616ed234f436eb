//! Array-valued variables with named dimensions
//!
//! A [`Variable`] pairs an `ndarray` n-dimensional array with one label per
//! axis. Scalars have no dimensions and exactly one element. Arrays are kept
//! in standard (row-major) layout so the flat accessors always succeed.

use crate::error::{OpticsError, Result};
use ndarray::{arr0, Array1, ArrayD, Axis, IxDyn};
use serde::{Deserialize, Serialize};

/// Typed storage behind a [`Variable`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VarData {
    /// Floating point values (densities, coordinates, coefficients)
    Float(ArrayD<f64>),
    /// Integer values (pixel indices, table ids)
    Int(ArrayD<i64>),
    /// Boolean flags
    Bool(ArrayD<bool>),
    /// Text labels (Stokes components, phase element names)
    Text(ArrayD<String>),
}

impl VarData {
    /// Number of stored elements
    pub fn len(&self) -> usize {
        match self {
            Self::Float(a) => a.len(),
            Self::Int(a) => a.len(),
            Self::Bool(a) => a.len(),
            Self::Text(a) => a.len(),
        }
    }

    /// Whether no elements are stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size along each axis
    pub fn shape(&self) -> &[usize] {
        match self {
            Self::Float(a) => a.shape(),
            Self::Int(a) => a.shape(),
            Self::Bool(a) => a.shape(),
            Self::Text(a) => a.shape(),
        }
    }

    /// Element type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Float(_) => "float",
            Self::Int(_) => "int",
            Self::Bool(_) => "bool",
            Self::Text(_) => "text",
        }
    }

    /// Render every element as a label
    pub fn labels(&self) -> Vec<String> {
        match self {
            Self::Float(a) => a.iter().map(ToString::to_string).collect(),
            Self::Int(a) => a.iter().map(ToString::to_string).collect(),
            Self::Bool(a) => a.iter().map(ToString::to_string).collect(),
            Self::Text(a) => a.iter().cloned().collect(),
        }
    }

    fn standard_layout(self) -> Self {
        match self {
            Self::Float(a) => Self::Float(standard(a)),
            Self::Int(a) => Self::Int(standard(a)),
            Self::Bool(a) => Self::Bool(standard(a)),
            Self::Text(a) => Self::Text(standard(a)),
        }
    }
}

fn standard<T: Clone>(array: ArrayD<T>) -> ArrayD<T> {
    if array.is_standard_layout() {
        array
    } else {
        array.as_standard_layout().into_owned()
    }
}

fn shaped<T>(shape: &[usize], values: Vec<T>) -> Result<ArrayD<T>> {
    let count = values.len();
    ArrayD::from_shape_vec(IxDyn(shape), values).map_err(|_| {
        OpticsError::shape(
            "variable",
            format!(
                "shape {shape:?} needs {} elements, got {count}",
                shape.iter().product::<usize>()
            ),
        )
    })
}

/// Fix the addressed axes, highest first so lower axis numbers stay valid
fn pick<T: Clone>(array: &ArrayD<T>, fixed: &[Option<usize>]) -> ArrayD<T> {
    let mut view = array.view();
    for (axis, &index) in fixed.iter().enumerate().rev() {
        if let Some(index) = index {
            view = view.index_axis_move(Axis(axis), index);
        }
    }
    view.as_standard_layout().into_owned()
}

/// N-dimensional array with labelled axes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    dims: Vec<String>,
    data: VarData,
}

impl Variable {
    /// Create a variable, checking that `dims` labels every axis of `data`
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` if the number of labels differs from the rank or
    /// a label repeats.
    pub fn new<S: AsRef<str>>(dims: &[S], data: VarData) -> Result<Self> {
        let dims: Vec<String> = dims.iter().map(|d| d.as_ref().to_string()).collect();
        let rank = data.shape().len();
        if dims.len() != rank {
            return Err(OpticsError::shape(
                "variable",
                format!("{} dimension labels for rank {rank}", dims.len()),
            ));
        }
        for (i, dim) in dims.iter().enumerate() {
            if dims[..i].contains(dim) {
                return Err(OpticsError::shape(
                    "variable",
                    format!("dimension '{dim}' appears more than once"),
                ));
            }
        }
        Ok(Self {
            dims,
            data: data.standard_layout(),
        })
    }

    /// Float variable over the given dimensions, values in row-major order
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` if the element count differs from the shape
    /// product, and the errors of [`Variable::new`].
    pub fn float<S: AsRef<str>>(dims: &[S], shape: &[usize], values: Vec<f64>) -> Result<Self> {
        Self::new(dims, VarData::Float(shaped(shape, values)?))
    }

    /// Integer variable over the given dimensions, values in row-major order
    ///
    /// # Errors
    ///
    /// See [`Variable::float`].
    pub fn int<S: AsRef<str>>(dims: &[S], shape: &[usize], values: Vec<i64>) -> Result<Self> {
        Self::new(dims, VarData::Int(shaped(shape, values)?))
    }

    /// Float variable with every element set to `value`
    pub fn full<S: AsRef<str>>(dims: &[S], shape: &[usize], value: f64) -> Self {
        Self {
            dims: dims.iter().map(|d| d.as_ref().to_string()).collect(),
            data: VarData::Float(ArrayD::from_elem(IxDyn(shape), value)),
        }
    }

    /// One-dimensional float coordinate along `dim`
    pub fn coord(dim: &str, values: Vec<f64>) -> Self {
        Self {
            dims: vec![dim.to_string()],
            data: VarData::Float(Array1::from(values).into_dyn()),
        }
    }

    /// One-dimensional integer variable along `dim`
    pub fn ints(dim: &str, values: Vec<i64>) -> Self {
        Self {
            dims: vec![dim.to_string()],
            data: VarData::Int(Array1::from(values).into_dyn()),
        }
    }

    /// One-dimensional boolean variable along `dim`
    pub fn flags(dim: &str, values: Vec<bool>) -> Self {
        Self {
            dims: vec![dim.to_string()],
            data: VarData::Bool(Array1::from(values).into_dyn()),
        }
    }

    /// One-dimensional text coordinate along `dim`
    pub fn labels<S: Into<String>>(dim: &str, values: impl IntoIterator<Item = S>) -> Self {
        let values: Array1<String> = values.into_iter().map(Into::into).collect();
        Self {
            dims: vec![dim.to_string()],
            data: VarData::Text(values.into_dyn()),
        }
    }

    /// Zero-dimensional float
    pub fn scalar(value: f64) -> Self {
        Self {
            dims: Vec::new(),
            data: VarData::Float(arr0(value).into_dyn()),
        }
    }

    /// Zero-dimensional boolean
    pub fn flag(value: bool) -> Self {
        Self {
            dims: Vec::new(),
            data: VarData::Bool(arr0(value).into_dyn()),
        }
    }

    /// Zero-dimensional text label
    pub fn label(value: &str) -> Self {
        Self {
            dims: Vec::new(),
            data: VarData::Text(arr0(value.to_string()).into_dyn()),
        }
    }

    /// Ordered dimension labels
    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    /// Size along each dimension
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Underlying storage
    pub fn data(&self) -> &VarData {
        &self.data
    }

    /// Total element count
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the variable holds no elements
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether `dim` labels one of the axes
    pub fn has_dim(&self, dim: &str) -> bool {
        self.dims.iter().any(|d| d == dim)
    }

    /// Size along `dim`, if present
    pub fn size_of(&self, dim: &str) -> Option<usize> {
        self.axis_of(dim).map(|axis| self.shape()[axis])
    }

    /// Position of `dim` among the axes
    pub fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    /// Float array, if this is a float variable
    pub fn float_array(&self) -> Option<&ArrayD<f64>> {
        match &self.data {
            VarData::Float(a) => Some(a),
            _ => None,
        }
    }

    /// Float values in row-major order, if this is a float variable
    pub fn as_floats(&self) -> Option<&[f64]> {
        self.float_array().and_then(ArrayD::as_slice)
    }

    /// Mutable float values; the length is fixed by the shape
    pub fn floats_mut(&mut self) -> Option<&mut [f64]> {
        match &mut self.data {
            VarData::Float(a) => a.as_slice_mut(),
            _ => None,
        }
    }

    /// Integer values in row-major order, if this is an integer variable
    pub fn as_ints(&self) -> Option<&[i64]> {
        match &self.data {
            VarData::Int(a) => a.as_slice(),
            _ => None,
        }
    }

    /// Boolean values, if this is a boolean variable
    pub fn as_flags(&self) -> Option<&[bool]> {
        match &self.data {
            VarData::Bool(a) => a.as_slice(),
            _ => None,
        }
    }

    /// Text values, if this is a text variable
    pub fn as_labels(&self) -> Option<&[String]> {
        match &self.data {
            VarData::Text(a) => a.as_slice(),
            _ => None,
        }
    }

    /// Float values or an `InvalidShape` error naming `name`
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` for non-float storage.
    pub fn try_floats(&self, name: &str) -> Result<&[f64]> {
        self.as_floats().ok_or_else(|| {
            OpticsError::shape(
                name,
                format!("expected float values, found {}", self.data.type_name()),
            )
        })
    }

    /// Numeric array widened to `f64` (float or integer storage)
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` for boolean or text storage.
    pub fn to_f64_array(&self, name: &str) -> Result<ArrayD<f64>> {
        match &self.data {
            VarData::Float(a) => Ok(a.clone()),
            VarData::Int(a) => Ok(a.mapv(|i| i as f64)),
            other => Err(OpticsError::shape(
                name,
                format!("expected numeric values, found {}", other.type_name()),
            )),
        }
    }

    /// Numeric values widened to `f64`, flattened in row-major order
    ///
    /// # Errors
    ///
    /// See [`Variable::to_f64_array`].
    pub fn to_f64_vec(&self, name: &str) -> Result<Vec<f64>> {
        Ok(self.to_f64_array(name)?.iter().copied().collect())
    }

    /// Index along the named dimensions, dropping them from the result
    ///
    /// # Errors
    ///
    /// Returns `MissingDimension` for an unknown label and `InvalidShape` for
    /// an index past the end of its axis.
    pub fn select(&self, selection: &[(&str, usize)]) -> Result<Variable> {
        let mut fixed: Vec<Option<usize>> = vec![None; self.dims.len()];
        for &(dim, index) in selection {
            let axis = self.axis_of(dim).ok_or_else(|| OpticsError::MissingDimension {
                name: "variable".to_string(),
                dim: dim.to_string(),
            })?;
            let size = self.shape()[axis];
            if index >= size {
                return Err(OpticsError::shape(
                    dim,
                    format!("index {index} out of bounds for size {size}"),
                ));
            }
            fixed[axis] = Some(index);
        }

        let data = match &self.data {
            VarData::Float(a) => VarData::Float(pick(a, &fixed)),
            VarData::Int(a) => VarData::Int(pick(a, &fixed)),
            VarData::Bool(a) => VarData::Bool(pick(a, &fixed)),
            VarData::Text(a) => VarData::Text(pick(a, &fixed)),
        };
        let dims = self
            .dims
            .iter()
            .zip(&fixed)
            .filter(|(_, f)| f.is_none())
            .map(|(d, _)| d.clone())
            .collect();
        Ok(Variable { dims, data })
    }

    /// Expand numeric values onto a larger dimension set
    ///
    /// Every axis of `self` must appear in `dims` with the same size; values
    /// are repeated along the axes `self` lacks. The result is row-major over
    /// `shape`.
    ///
    /// # Errors
    ///
    /// Returns `MissingDimension` if `self` has an axis not in `dims`,
    /// `InvalidShape` on a size conflict or non-numeric storage.
    pub fn broadcast_to(&self, name: &str, dims: &[String], shape: &[usize]) -> Result<Vec<f64>> {
        if dims.len() != shape.len() {
            return Err(OpticsError::shape(
                name,
                format!("{} target labels for rank {}", dims.len(), shape.len()),
            ));
        }
        let values = self.to_f64_array(name)?;
        let mut targets = Vec::with_capacity(self.dims.len());
        for (dim, &size) in self.dims.iter().zip(self.shape()) {
            let target = dims.iter().position(|d| d == dim).ok_or_else(|| {
                OpticsError::MissingDimension {
                    name: name.to_string(),
                    dim: dim.clone(),
                }
            })?;
            if shape[target] != size {
                return Err(OpticsError::shape(
                    name,
                    format!("size {size} along '{dim}' does not match {}", shape[target]),
                ));
            }
            targets.push(target);
        }

        // own axes in target order, then unit axes where the target has extra dims
        let mut order: Vec<usize> = (0..self.dims.len()).collect();
        order.sort_by_key(|&axis| targets[axis]);
        let mut view = values.view().permuted_axes(IxDyn(&order));
        for (axis, dim) in dims.iter().enumerate() {
            if !self.has_dim(dim) {
                view = view.insert_axis(Axis(axis));
            }
        }
        let expanded = view.broadcast(IxDyn(shape)).ok_or_else(|| {
            OpticsError::shape(
                name,
                format!("cannot broadcast {:?} to {shape:?}", self.shape()),
            )
        })?;
        Ok(expanded.iter().copied().collect())
    }
}
