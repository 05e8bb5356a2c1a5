//! Set completeness after a packing run.
//!
//! A group is fully satisfied when every catalog item carrying its id was
//! placed. Everything here is derived on demand from a catalog and a result.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::CargoItem;
use crate::optimizer::PackingResult;

/// Which groups of a catalog a packing run delivered completely.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupResolution {
    /// Ids of the fully placed groups.
    pub satisfied: BTreeSet<String>,
    /// Groups with at least one member left unplaced.
    pub excluded_count: usize,
    /// Distinct groups in the catalog.
    pub total_groups: usize,
}

impl GroupResolution {
    pub fn satisfied_count(&self) -> usize {
        self.satisfied.len()
    }

    pub fn is_satisfied(&self, group_id: &str) -> bool {
        self.satisfied.contains(group_id)
    }

    /// Catalog items whose group is fully satisfied, in catalog order.
    pub fn filter_catalog(&self, catalog: &[CargoItem]) -> Vec<CargoItem> {
        catalog
            .iter()
            .filter(|item| self.is_satisfied(&item.group_id))
            .cloned()
            .collect()
    }
}

/// Resolves the fully satisfied groups of `catalog` within `result`.
///
/// Placed items are matched by id. Items of `result` that do not belong to
/// `catalog` are ignored.
pub fn resolve_groups(catalog: &[CargoItem], result: &PackingResult) -> GroupResolution {
    let placed_ids: BTreeSet<&str> = result.placed.iter().map(|p| p.item.id.as_str()).collect();

    let mut complete: BTreeMap<&str, bool> = BTreeMap::new();
    for item in catalog {
        let entry = complete.entry(item.group_id.as_str()).or_insert(true);
        *entry &= placed_ids.contains(item.id.as_str());
    }

    let satisfied: BTreeSet<String> = complete
        .iter()
        .filter(|(_, done)| **done)
        .map(|(group, _)| group.to_string())
        .collect();

    GroupResolution {
        excluded_count: complete.len() - satisfied.len(),
        total_groups: complete.len(),
        satisfied,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlacedItem;
    use crate::optimizer::tests::item;
    use crate::optimizer::{UnplacedItem, UnplacedReason};
    use crate::types::Vec3;

    fn catalog() -> Vec<CargoItem> {
        vec![
            item("a_0|base|0", "a_0", (10.0, 10.0, 10.0), 1.0, 10.0),
            item("a_0|mattress|1", "a_0", (10.0, 10.0, 5.0), 1.0, 0.0),
            item("a_1|base|0", "a_1", (10.0, 10.0, 10.0), 1.0, 10.0),
            item("a_1|mattress|1", "a_1", (10.0, 10.0, 5.0), 1.0, 0.0),
            item("b_0|base|0", "b_0", (10.0, 10.0, 10.0), 1.0, 10.0),
        ]
    }

    fn result_with(catalog: &[CargoItem], placed_ids: &[&str]) -> PackingResult {
        let mut result = PackingResult::default();
        for it in catalog {
            if placed_ids.contains(&it.id.as_str()) {
                result
                    .placed
                    .push(PlacedItem::new(it.clone(), Vec3::zero(), it.dims_as_vec3()));
            } else {
                result.unplaced.push(UnplacedItem {
                    item: it.clone(),
                    reason: UnplacedReason::NoStablePosition,
                });
            }
        }
        result
    }

    #[test]
    fn group_is_satisfied_only_when_every_member_is_placed() {
        let catalog = catalog();
        let result = result_with(
            &catalog,
            &["a_0|base|0", "a_0|mattress|1", "a_1|base|0", "b_0|base|0"],
        );
        let resolution = resolve_groups(&catalog, &result);

        assert!(resolution.is_satisfied("a_0"));
        assert!(!resolution.is_satisfied("a_1"));
        assert!(resolution.is_satisfied("b_0"));
        assert_eq!(resolution.satisfied_count(), 2);
        assert_eq!(resolution.excluded_count, 1);
        assert_eq!(resolution.total_groups, 3);
    }

    #[test]
    fn empty_result_excludes_every_group() {
        let catalog = catalog();
        let resolution = resolve_groups(&catalog, &result_with(&catalog, &[]));
        assert!(resolution.satisfied.is_empty());
        assert_eq!(resolution.excluded_count, 3);
    }

    #[test]
    fn empty_catalog_has_no_groups() {
        let resolution = resolve_groups(&[], &PackingResult::default());
        assert_eq!(resolution, GroupResolution::default());
    }

    #[test]
    fn filtering_keeps_catalog_order() {
        let catalog = catalog();
        let result = result_with(&catalog, &["b_0|base|0", "a_0|base|0", "a_0|mattress|1"]);
        let filtered = resolve_groups(&catalog, &result).filter_catalog(&catalog);

        let ids: Vec<&str> = filtered.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a_0|base|0", "a_0|mattress|1", "b_0|base|0"]);
    }

    #[test]
    fn placed_items_outside_the_catalog_are_ignored() {
        let catalog = catalog();
        let mut result = result_with(&catalog, &["b_0|base|0"]);
        let stranger = item("z_0|base|0", "z_0", (1.0, 1.0, 1.0), 1.0, 0.0);
        result
            .placed
            .push(PlacedItem::new(stranger, Vec3::zero(), Vec3::new(1.0, 1.0, 1.0)));

        let resolution = resolve_groups(&catalog, &result);
        assert!(!resolution.is_satisfied("z_0"));
        assert_eq!(resolution.total_groups, 3);
    }
}
