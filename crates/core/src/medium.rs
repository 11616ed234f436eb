//! Medium helpers: bounding boxes and per-key scatterer grouping

use crate::core_types::{StructuredField, Variable, Vec3};
use crate::error::{OpticsError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::hash::Hash;

/// Coordinate labelling the six bounding box components
pub const BB_INDEX: &str = "bb_index";
const BB_LABELS: [&str; 6] = ["xmin", "ymin", "zmin", "xmax", "ymax", "zmax"];

/// Axis-aligned extent of a gridded domain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    /// `max - min` along each axis
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Render as a `bounding_box` variable over a `bb_index` label coordinate
    ///
    /// # Errors
    ///
    /// Propagates field construction errors; none occur for a six-entry box.
    pub fn to_field(&self) -> Result<StructuredField> {
        let values = vec![
            self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z,
        ];
        Ok(StructuredField::new()
            .with_coord(BB_INDEX, Variable::labels(BB_INDEX, BB_LABELS))?
            .with_variable("bounding_box", Variable::coord(BB_INDEX, values))?
            .with_attr("type", "3D bounding box"))
    }
}

fn endpoints(field: &StructuredField, axis: &str) -> Result<(f64, f64)> {
    let values = field.get_variable(axis)?.to_f64_vec(axis)?;
    match (values.first(), values.last()) {
        (Some(&first), Some(&last)) => Ok((first, last)),
        _ => Err(OpticsError::shape(axis, "empty coordinate")),
    }
}

/// Bounding box spanned by the first and last `x`, `y`, `z` values
///
/// # Errors
///
/// `MissingVariable` if an axis is absent, `InvalidShape` if one is empty or
/// not numeric.
pub fn bounding_box(field: &StructuredField) -> Result<BoundingBox> {
    let (x0, x1) = endpoints(field, "x")?;
    let (y0, y1) = endpoints(field, "y")?;
    let (z0, z1) = endpoints(field, "z")?;
    Ok(BoundingBox {
        min: Vec3::new(x0, y0, z0),
        max: Vec3::new(x1, y1, z1),
    })
}

/// Regroup per-scatterer keyed fields into key -> one field per scatterer
///
/// Keys (e.g. wavelengths) and their order come from the first scatterer.
/// An empty input gives an empty map.
///
/// # Errors
///
/// `MissingVariable` naming the key if a later scatterer lacks it.
pub fn combine_to_medium<K>(
    scatterers: &[IndexMap<K, StructuredField>],
) -> Result<IndexMap<K, Vec<StructuredField>>>
where
    K: Clone + Eq + Hash + Display,
{
    let Some(first) = scatterers.first() else {
        return Ok(IndexMap::new());
    };
    first
        .keys()
        .map(|key| {
            let fields = scatterers
                .iter()
                .map(|scatterer| {
                    scatterer
                        .get(key)
                        .cloned()
                        .ok_or_else(|| OpticsError::missing(&key.to_string()))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok((key.clone(), fields))
        })
        .collect()
}
