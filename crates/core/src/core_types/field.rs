//! Structured fields: named variables sharing one coordinate system
//!
//! Grids, microphysics, scattering tables, optical properties and sensor
//! geometry all use this one container. Role-specific requirements live in the
//! `checks` contracts rather than in separate types.

use super::variable::Variable;
use crate::error::{OpticsError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Attribute value attached to a field (units, provenance, labels)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Text(String),
    Number(f64),
    Flag(bool),
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

/// Named collection of variables and coordinates with consistent dimension sizes
///
/// Lookup by name resolves data variables first and coordinates second.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredField {
    variables: IndexMap<String, Variable>,
    coords: IndexMap<String, Variable>,
    attrs: IndexMap<String, AttrValue>,
}

impl StructuredField {
    /// Empty field
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`StructuredField::insert_variable`]
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` if a dimension size conflicts with the field.
    pub fn with_variable(mut self, name: &str, variable: Variable) -> Result<Self> {
        self.insert_variable(name, variable)?;
        Ok(self)
    }

    /// Builder form of [`StructuredField::insert_coord`]
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` if a dimension size conflicts with the field.
    pub fn with_coord(mut self, name: &str, coord: Variable) -> Result<Self> {
        self.insert_coord(name, coord)?;
        Ok(self)
    }

    /// Builder form of [`StructuredField::set_attr`]
    pub fn with_attr(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Add or replace a data variable
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` if a dimension size conflicts with the field.
    pub fn insert_variable(&mut self, name: &str, variable: Variable) -> Result<()> {
        self.check_sizes(name, &variable, false)?;
        self.variables.insert(name.to_string(), variable);
        Ok(())
    }

    /// Add or replace a coordinate variable
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` if a dimension size conflicts with the field.
    pub fn insert_coord(&mut self, name: &str, coord: Variable) -> Result<()> {
        self.check_sizes(name, &coord, true)?;
        self.coords.insert(name.to_string(), coord);
        Ok(())
    }

    fn check_sizes(&self, name: &str, candidate: &Variable, as_coord: bool) -> Result<()> {
        let others = self
            .variables
            .iter()
            .filter(|(n, _)| as_coord || n.as_str() != name)
            .chain(
                self.coords
                    .iter()
                    .filter(|(n, _)| !as_coord || n.as_str() != name),
            );
        for (_, existing) in others {
            for (dim, &size) in candidate.dims().iter().zip(candidate.shape()) {
                if let Some(current) = existing.size_of(dim) {
                    if current != size {
                        return Err(OpticsError::shape(
                            name,
                            format!("dimension '{dim}' has size {size}, field has {current}"),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Resolve `name` as a data variable or coordinate
    ///
    /// # Errors
    ///
    /// Returns `MissingVariable` if neither exists.
    pub fn get_variable(&self, name: &str) -> Result<&Variable> {
        self.variables
            .get(name)
            .or_else(|| self.coords.get(name))
            .ok_or_else(|| OpticsError::missing(name))
    }

    /// Mutable access for in-place normalization
    ///
    /// # Errors
    ///
    /// Returns `MissingVariable` if neither a data variable nor a coordinate exists.
    pub fn get_variable_mut(&mut self, name: &str) -> Result<&mut Variable> {
        if self.variables.contains_key(name) {
            return self
                .variables
                .get_mut(name)
                .ok_or_else(|| OpticsError::missing(name));
        }
        self.coords
            .get_mut(name)
            .ok_or_else(|| OpticsError::missing(name))
    }

    /// Ordered dimension labels of `name`
    ///
    /// # Errors
    ///
    /// Returns `MissingVariable` if `name` cannot be resolved.
    pub fn dims(&self, name: &str) -> Result<&[String]> {
        Ok(self.get_variable(name)?.dims())
    }

    /// Whether `name` resolves to a variable or coordinate
    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name) || self.coords.contains_key(name)
    }

    /// Coordinate lookup only
    pub fn coord(&self, name: &str) -> Option<&Variable> {
        self.coords.get(name)
    }

    /// Coordinate that indexes `dim` directly (one-dimensional along `dim`)
    pub fn index_coord(&self, dim: &str) -> Option<&Variable> {
        self.coords
            .get(dim)
            .filter(|c| c.dims().len() == 1 && c.dims()[0] == dim)
    }

    /// Every dimension in the field with its size, in first-seen order
    pub fn dim_sizes(&self) -> IndexMap<String, usize> {
        let mut sizes = IndexMap::new();
        for var in self.variables.values().chain(self.coords.values()) {
            for (dim, &size) in var.dims().iter().zip(var.shape()) {
                sizes.entry(dim.clone()).or_insert(size);
            }
        }
        sizes
    }

    /// Size of one dimension
    pub fn dim_size(&self, dim: &str) -> Option<usize> {
        self.dim_sizes().get(dim).copied()
    }

    /// Data variables in insertion order
    pub fn variables(&self) -> impl Iterator<Item = (&str, &Variable)> {
        self.variables.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Coordinates in insertion order
    pub fn coords(&self) -> impl Iterator<Item = (&str, &Variable)> {
        self.coords.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Coordinate names in insertion order
    pub fn coord_names(&self) -> impl Iterator<Item = &str> {
        self.coords.keys().map(String::as_str)
    }

    /// Attributes in insertion order
    pub fn attrs(&self) -> &IndexMap<String, AttrValue> {
        &self.attrs
    }

    /// Single attribute
    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.get(key)
    }

    /// Set an attribute, replacing any previous value
    pub fn set_attr(&mut self, key: &str, value: impl Into<AttrValue>) {
        self.attrs.insert(key.to_string(), value.into());
    }
}
