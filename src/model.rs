//! Data models for the container loading plan.
//!
//! This module defines the fundamental data structures:
//! - `CargoItem`: one cargo unit (a part of a furniture set) with dimensions,
//!   weight, load-bearing capacity and set membership
//! - `PlacedItem`: a cargo unit bound to a position and an orientation
//! - `Container`: the transport container with its clearance and weight limit
//!
//! All structures implement the traits from the `types` module.

use thiserror::Error;

use crate::types::{BoundingBox, Dimensional, Vec3, Weighted};

/// Cubic centimetres per cubic metre; authored dimensions are in cm.
pub const CM3_PER_M3: f64 = 1_000_000.0;

/// Invalid container or catalog data. Aborts a planning run before any packing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),
    #[error("Invalid load-bearing capacity: {0}")]
    InvalidLoadBearing(String),
    #[error("Invalid clearance: {0}")]
    InvalidClearance(String),
    #[error("Invalid set definition: {0}")]
    InvalidSet(String),
}

fn validate_dimension(value: f64, name: &str) -> Result<(), ConfigurationError> {
    if value <= 0.0 || !value.is_finite() {
        return Err(ConfigurationError::InvalidDimension(format!(
            "{} must be positive, got: {}",
            name, value
        )));
    }
    Ok(())
}

fn validate_weight_value(value: f64, name: &str) -> Result<(), ConfigurationError> {
    if value <= 0.0 || !value.is_finite() {
        return Err(ConfigurationError::InvalidWeight(format!(
            "{} must be positive, got: {}",
            name, value
        )));
    }
    Ok(())
}

fn validate_dims(dims: (f64, f64, f64), prefix: &str) -> Result<(), ConfigurationError> {
    validate_dimension(dims.0, &format!("{prefix}width"))?;
    validate_dimension(dims.1, &format!("{prefix}depth"))?;
    validate_dimension(dims.2, &format!("{prefix}height"))?;
    Ok(())
}

/// One cargo unit to be loaded.
///
/// # Fields
/// * `id` - Stable identifier, unique within a catalog
/// * `group_id` - Set instance this unit belongs to
/// * `set_name` - Display name of the set definition (e.g. "Gold Set")
/// * `sub_type` - Role within the set (e.g. base, headboard, mattress)
/// * `dims` - Authored dimensions (width, depth, height)
/// * `weight` - Weight in kg
/// * `load_bearing` - Maximum weight in kg that may rest on top of this unit
/// * `color` - Optional display color for renderers
#[derive(Clone, Debug, PartialEq)]
pub struct CargoItem {
    pub id: String,
    pub group_id: String,
    pub set_name: String,
    pub sub_type: String,
    pub dims: (f64, f64, f64),
    pub weight: f64,
    pub load_bearing: f64,
    pub color: Option<String>,
}

impl CargoItem {
    /// Creates a new cargo item with validation.
    ///
    /// # Examples
    /// ```
    /// use load_planner::model::CargoItem;
    ///
    /// let ok = CargoItem::new("a_0|base|0", "a_0", "Gold Set", "base", (90.0, 190.0, 28.0), 40.0, 100.0);
    /// assert!(ok.is_ok());
    ///
    /// let invalid = CargoItem::new("a_0|base|0", "a_0", "Gold Set", "base", (0.0, 190.0, 28.0), 40.0, 100.0);
    /// assert!(invalid.is_err());
    /// ```
    pub fn new(
        id: impl Into<String>,
        group_id: impl Into<String>,
        set_name: impl Into<String>,
        sub_type: impl Into<String>,
        dims: (f64, f64, f64),
        weight: f64,
        load_bearing: f64,
    ) -> Result<Self, ConfigurationError> {
        let item = Self {
            id: id.into(),
            group_id: group_id.into(),
            set_name: set_name.into(),
            sub_type: sub_type.into(),
            dims,
            weight,
            load_bearing,
            color: None,
        };
        item.validate()?;
        Ok(item)
    }

    /// Attaches a display color.
    pub fn with_color(mut self, color: Option<String>) -> Self {
        self.color = color;
        self
    }

    /// Re-checks the invariants of an item.
    ///
    /// Items built through struct literals bypass `new`, so the planner calls
    /// this again before packing.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        validate_dims(self.dims, &format!("Item '{}' ", self.id))?;
        validate_weight_value(self.weight, &format!("Item '{}' weight", self.id))?;
        if self.load_bearing < 0.0 || !self.load_bearing.is_finite() {
            return Err(ConfigurationError::InvalidLoadBearing(format!(
                "Item '{}' load-bearing capacity must be zero or positive, got: {}",
                self.id, self.load_bearing
            )));
        }
        Ok(())
    }

    /// Authored dimensions as a vector.
    #[inline]
    pub fn dims_as_vec3(&self) -> Vec3 {
        Vec3::from_tuple(self.dims)
    }
}

impl Dimensional for CargoItem {
    fn dimensions(&self) -> Vec3 {
        self.dims_as_vec3()
    }
}

impl Weighted for CargoItem {
    fn weight(&self) -> f64 {
        self.weight
    }
}

/// A cargo item bound to a position inside the container.
///
/// `dims` are the oriented dimensions, a permutation of `item.dims`.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedItem {
    pub item: CargoItem,
    pub position: Vec3,
    pub dims: Vec3,
}

impl PlacedItem {
    pub fn new(item: CargoItem, position: Vec3, dims: Vec3) -> Self {
        Self {
            item,
            position,
            dims,
        }
    }

    /// Z coordinate of the top face.
    pub fn top_z(&self) -> f64 {
        self.position.z + self.dims.z
    }

    /// Bounding box of the placed item.
    #[inline]
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_position_and_dims(self.position, self.dims)
    }
}

impl Dimensional for PlacedItem {
    fn dimensions(&self) -> Vec3 {
        self.dims
    }
}

impl Weighted for PlacedItem {
    fn weight(&self) -> f64 {
        self.item.weight
    }
}

/// The transport container.
///
/// The clearance (door-swing allowance) is taken off the depth axis; only the
/// remaining box is available for cargo.
///
/// # Fields
/// * `dims` - Outer dimensions (width, depth, height)
/// * `clearance` - Reserved length along the depth axis
/// * `max_weight` - Maximum total payload in kg
#[derive(Clone, Debug, PartialEq)]
pub struct Container {
    pub dims: (f64, f64, f64),
    pub clearance: f64,
    pub max_weight: f64,
}

impl Container {
    /// Creates a new container with validation.
    ///
    /// # Examples
    /// ```
    /// use load_planner::model::Container;
    ///
    /// let truck = Container::new((245.0, 1360.0, 270.0), 30.0, 26_000.0).unwrap();
    /// assert_eq!(truck.usable_dims().y, 1330.0);
    /// assert!(Container::new((245.0, 1360.0, 270.0), 1360.0, 26_000.0).is_err());
    /// ```
    pub fn new(
        dims: (f64, f64, f64),
        clearance: f64,
        max_weight: f64,
    ) -> Result<Self, ConfigurationError> {
        let container = Self {
            dims,
            clearance,
            max_weight,
        };
        container.validate()?;
        Ok(container)
    }

    /// Checks dimensions, clearance and weight limit.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        validate_dims(self.dims, "Container ")?;
        validate_weight_value(self.max_weight, "Container max weight")?;
        if self.clearance < 0.0 || !self.clearance.is_finite() {
            return Err(ConfigurationError::InvalidClearance(format!(
                "Clearance must be zero or positive, got: {}",
                self.clearance
            )));
        }
        if self.clearance >= self.dims.1 {
            return Err(ConfigurationError::InvalidClearance(format!(
                "Clearance {} leaves no usable depth (container depth {})",
                self.clearance, self.dims.1
            )));
        }
        Ok(())
    }

    /// Packable dimensions after subtracting the clearance.
    pub fn usable_dims(&self) -> Vec3 {
        Vec3::new(self.dims.0, self.dims.1 - self.clearance, self.dims.2)
    }

    /// Packable volume.
    pub fn usable_volume(&self) -> f64 {
        self.usable_dims().volume()
    }

    /// Packable volume in m³.
    pub fn net_capacity_m3(&self) -> f64 {
        self.usable_volume() / CM3_PER_M3
    }
}
