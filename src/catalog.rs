//! Catalog construction from set definitions.
//!
//! A set definition (e.g. a bed set made of base, headboard and mattress) is
//! multiplied by a requested quantity. Every copy becomes one group; every part
//! of a copy becomes one `CargoItem`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::model::{CM3_PER_M3, CargoItem, ConfigurationError};
use crate::types::Dimensional;

/// One part of a set definition.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PartDefinition {
    pub sub_type: String,
    #[schema(value_type = [f64; 3], example = json!([90.0, 190.0, 28.0]))]
    pub dims: (f64, f64, f64),
    pub weight: f64,
    /// Maximum weight in kg that may rest on this part.
    #[serde(default)]
    pub load_bearing: f64,
    #[serde(default)]
    #[schema(nullable = true, example = "#8B4513")]
    pub color: Option<String>,
}

impl PartDefinition {
    pub fn volume(&self) -> f64 {
        let (w, d, h) = self.dims;
        w * d * h
    }
}

/// A set definition multiplied by a quantity.
///
/// `key` prefixes the generated group ids; it defaults to `set{n}` with `n`
/// being the 1-based position of the definition in the request.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SetDefinition {
    #[serde(default)]
    #[schema(nullable = true)]
    pub key: Option<String>,
    pub name: String,
    pub quantity: usize,
    pub parts: Vec<PartDefinition>,
}

impl SetDefinition {
    /// Largest number of copies a single definition may request.
    pub const MAX_QUANTITY: usize = 1000;

    /// The bed set used as the default input of the loading form:
    /// base 90×190×28 (40 kg), headboard 90×100×10 (15 kg) and mattress
    /// 90×190×25 (20 kg). Nothing may be stacked on the mattress.
    pub fn standard_bed_set(name: impl Into<String>, quantity: usize) -> Self {
        Self {
            key: None,
            name: name.into(),
            quantity,
            parts: vec![
                PartDefinition {
                    sub_type: "base".to_string(),
                    dims: (90.0, 190.0, 28.0),
                    weight: 40.0,
                    load_bearing: 100.0,
                    color: Some("#8B4513".to_string()),
                },
                PartDefinition {
                    sub_type: "headboard".to_string(),
                    dims: (90.0, 100.0, 10.0),
                    weight: 15.0,
                    load_bearing: 100.0,
                    color: Some("#FFD700".to_string()),
                },
                PartDefinition {
                    sub_type: "mattress".to_string(),
                    dims: (90.0, 190.0, 25.0),
                    weight: 20.0,
                    load_bearing: 0.0,
                    color: Some("#ADD8E6".to_string()),
                },
            ],
        }
    }

    /// Volume of one copy of the set.
    pub fn set_volume(&self) -> f64 {
        self.parts.iter().map(PartDefinition::volume).sum()
    }

    /// Volume of one copy in m³.
    pub fn set_volume_m3(&self) -> f64 {
        self.set_volume() / CM3_PER_M3
    }

    /// Volume of all requested copies in m³.
    pub fn total_volume_m3(&self) -> f64 {
        self.set_volume_m3() * self.quantity as f64
    }

    fn group_key(&self, index: usize) -> String {
        match self.key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => format!("set{}", index + 1),
        }
    }

    /// Expands this definition into cargo items.
    ///
    /// Group ids are `{key}_{copy}`, item ids `{group_id}|{sub_type}|{part}`.
    pub fn expand(&self, index: usize) -> Result<Vec<CargoItem>, ConfigurationError> {
        if self.parts.is_empty() {
            return Err(ConfigurationError::InvalidSet(format!(
                "Set '{}' has no parts",
                self.name
            )));
        }
        if self.quantity == 0 {
            return Err(ConfigurationError::InvalidSet(format!(
                "Set '{}' must be requested at least once",
                self.name
            )));
        }
        if self.quantity > Self::MAX_QUANTITY {
            return Err(ConfigurationError::InvalidSet(format!(
                "Set '{}' requests {} copies, at most {} are allowed",
                self.name,
                self.quantity,
                Self::MAX_QUANTITY
            )));
        }
        let capacity = self.quantity.checked_mul(self.parts.len()).ok_or_else(|| {
            ConfigurationError::InvalidSet(format!("Set '{}' is too large", self.name))
        })?;

        let key = self.group_key(index);
        let mut items = Vec::with_capacity(capacity);
        for copy in 0..self.quantity {
            let group_id = format!("{key}_{copy}");
            for (part_index, part) in self.parts.iter().enumerate() {
                let item = CargoItem::new(
                    format!("{group_id}|{}|{part_index}", part.sub_type),
                    group_id.clone(),
                    self.name.clone(),
                    part.sub_type.clone(),
                    part.dims,
                    part.weight,
                    part.load_bearing,
                )?
                .with_color(part.color.clone());
                items.push(item);
            }
        }
        Ok(items)
    }
}

/// Builds the full catalog from several set definitions, preserving order.
pub fn build_catalog(sets: &[SetDefinition]) -> Result<Vec<CargoItem>, ConfigurationError> {
    let mut seen_keys: BTreeMap<String, &str> = BTreeMap::new();
    let mut items = Vec::new();
    for (index, set) in sets.iter().enumerate() {
        let key = set.group_key(index);
        if let Some(previous) = seen_keys.insert(key.clone(), &set.name) {
            return Err(ConfigurationError::InvalidSet(format!(
                "Set key '{}' is used by both '{}' and '{}'",
                key, previous, set.name
            )));
        }
        items.extend(set.expand(index)?);
    }
    Ok(items)
}

/// Number of requested units per set name and part type.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct DemandLine {
    pub set_name: String,
    pub sub_type: String,
    pub requested: usize,
    pub volume_m3: f64,
}

/// Summarizes a catalog per (set name, sub-type), sorted by both.
pub fn demand_summary(items: &[CargoItem]) -> Vec<DemandLine> {
    let mut lines: BTreeMap<(&str, &str), (usize, f64)> = BTreeMap::new();
    for item in items {
        let entry = lines
            .entry((item.set_name.as_str(), item.sub_type.as_str()))
            .or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += item.volume();
    }

    lines
        .into_iter()
        .map(|((set_name, sub_type), (requested, volume))| DemandLine {
            set_name: set_name.to_string(),
            sub_type: sub_type.to_string(),
            requested,
            volume_m3: volume / CM3_PER_M3,
        })
        .collect()
}
