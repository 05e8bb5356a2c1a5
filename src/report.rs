//! Per-item records for renderers and tabular export.

use serde::Serialize;
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::model::{CM3_PER_M3, PlacedItem};
use crate::types::Dimensional;

/// Whether a placed item still stands on its authored base.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrientationLabel {
    Unrotated,
    Rotated,
}

impl OrientationLabel {
    /// Compares the final height with the authored height.
    pub fn of(placed: &PlacedItem, tolerance: f64) -> Self {
        if (placed.dims.z - placed.item.dims.2).abs() < tolerance {
            OrientationLabel::Unrotated
        } else {
            OrientationLabel::Rotated
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrientationLabel::Unrotated => "unrotated",
            OrientationLabel::Rotated => "rotated",
        }
    }
}

impl std::fmt::Display for OrientationLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a renderer needs to draw one placed item.
///
/// # Fields
/// * `pos` - Position (x, y, z) of the minimum corner
/// * `dims` - Oriented dimensions (width, depth, height)
/// * `volume` - Volume in cm³
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PlacementRecord {
    pub id: String,
    pub group_id: String,
    pub set_name: String,
    pub sub_type: String,
    #[schema(nullable = true, example = "#8B4513")]
    pub color: Option<String>,
    #[schema(value_type = [f64; 3], example = json!([0.0, 0.0, 0.0]))]
    pub pos: (f64, f64, f64),
    #[schema(value_type = [f64; 3], example = json!([90.0, 190.0, 28.0]))]
    pub dims: (f64, f64, f64),
    pub weight: f64,
    pub volume: f64,
    pub orientation: OrientationLabel,
}

impl PlacementRecord {
    pub fn from_placed(placed: &PlacedItem, orientation_tolerance: f64) -> Self {
        Self {
            id: placed.item.id.clone(),
            group_id: placed.item.group_id.clone(),
            set_name: placed.item.set_name.clone(),
            sub_type: placed.item.sub_type.clone(),
            color: placed.item.color.clone(),
            pos: placed.position.as_tuple(),
            dims: placed.dims.as_tuple(),
            weight: placed.item.weight,
            volume: placed.volume(),
            orientation: OrientationLabel::of(placed, orientation_tolerance),
        }
    }
}

/// One flat export row per placed item.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct ExportRow {
    pub group_id: String,
    pub set_name: String,
    pub sub_type: String,
    pub orientation: OrientationLabel,
    pub volume_m3: f64,
    #[schema(value_type = [f64; 3], example = json!([0.0, 0.0, 0.0]))]
    pub position: (f64, f64, f64),
    #[schema(value_type = [f64; 3], example = json!([90.0, 190.0, 28.0]))]
    pub dims: (f64, f64, f64),
}

impl ExportRow {
    pub fn from_placed(placed: &PlacedItem, orientation_tolerance: f64) -> Self {
        Self {
            group_id: placed.item.group_id.clone(),
            set_name: placed.item.set_name.clone(),
            sub_type: placed.item.sub_type.clone(),
            orientation: OrientationLabel::of(placed, orientation_tolerance),
            volume_m3: placed.volume() / CM3_PER_M3,
            position: placed.position.as_tuple(),
            dims: placed.dims.as_tuple(),
        }
    }
}

/// Render records for all placed items, in placement order.
pub fn placement_records(placed: &[PlacedItem], orientation_tolerance: f64) -> Vec<PlacementRecord> {
    placed
        .iter()
        .map(|p| PlacementRecord::from_placed(p, orientation_tolerance))
        .collect()
}

/// Export rows for all placed items, in placement order.
pub fn export_rows(placed: &[PlacedItem], orientation_tolerance: f64) -> Vec<ExportRow> {
    placed
        .iter()
        .map(|p| ExportRow::from_placed(p, orientation_tolerance))
        .collect()
}
