//! Placement engine for loading cargo into a single container.
//!
//! Implements a deterministic first-fit-decreasing heuristic over candidate
//! insertion points. Positions are tried front to back so the load grows in
//! walls from the front of the container, taking into account:
//! - container bounds and pairwise overlap
//! - the remaining weight budget of the container
//! - support from below and the load-bearing capacity of everything underneath
//! - optional rotation of items
//!
//! No item failure is fatal: items without a valid position are reported as
//! unplaced and packing continues with the next item.

use std::cmp::Ordering;
use std::time::{Duration, Instant};

use log::debug;

use crate::geometry::{fits_in_container, footprint_overlap, intersects, orientations};
use crate::model::{CargoItem, ConfigurationError, Container, PlacedItem};
use crate::types::{BoundingBox, Dimensional, EPSILON_GENERAL, Vec3, Weighted};

/// Configuration for the placement engine.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PackingConfig {
    /// Whether items may be rotated into any of their axis-aligned orientations
    pub allow_rotation: bool,
    /// Minimum share of the footprint that must rest on items below (0.0 to 1.0)
    pub support_ratio: f64,
    /// General numerical tolerance for contact and bounds checks
    pub general_epsilon: f64,
    /// Height difference up to which a placed item still counts as unrotated
    pub orientation_tolerance: f64,
    /// Optional wall-clock budget for one planning run
    pub time_limit: Option<Duration>,
}

impl PackingConfig {
    pub const DEFAULT_ALLOW_ROTATION: bool = true;
    pub const DEFAULT_SUPPORT_RATIO: f64 = 0.75;
    pub const DEFAULT_GENERAL_EPSILON: f64 = EPSILON_GENERAL;
    pub const DEFAULT_ORIENTATION_TOLERANCE: f64 = 1.0;

    /// Creates a builder for a custom configuration.
    pub fn builder() -> PackingConfigBuilder {
        PackingConfigBuilder::default()
    }

    /// Deadline for a run starting now.
    pub fn deadline_from_now(&self) -> Option<Instant> {
        self.time_limit.map(|limit| Instant::now() + limit)
    }
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            allow_rotation: Self::DEFAULT_ALLOW_ROTATION,
            support_ratio: Self::DEFAULT_SUPPORT_RATIO,
            general_epsilon: Self::DEFAULT_GENERAL_EPSILON,
            orientation_tolerance: Self::DEFAULT_ORIENTATION_TOLERANCE,
            time_limit: None,
        }
    }
}

/// Builder for `PackingConfig`.
#[derive(Clone, Debug, Default)]
pub struct PackingConfigBuilder {
    config: PackingConfig,
}

impl PackingConfigBuilder {
    /// Enables or disables rotation.
    pub fn allow_rotation(mut self, allow: bool) -> Self {
        self.config.allow_rotation = allow;
        self
    }

    /// Sets the minimum support ratio.
    pub fn support_ratio(mut self, ratio: f64) -> Self {
        self.config.support_ratio = ratio;
        self
    }

    /// Sets the general tolerance.
    pub fn general_epsilon(mut self, epsilon: f64) -> Self {
        self.config.general_epsilon = epsilon;
        self
    }

    /// Sets the tolerance for the orientation label.
    pub fn orientation_tolerance(mut self, tolerance: f64) -> Self {
        self.config.orientation_tolerance = tolerance;
        self
    }

    /// Sets the time limit for a planning run.
    pub fn time_limit(mut self, limit: Option<Duration>) -> Self {
        self.config.time_limit = limit;
        self
    }

    /// Builds the final configuration.
    pub fn build(self) -> PackingConfig {
        self.config
    }
}

/// Result of one engine run. Never modified after it is returned.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PackingResult {
    pub placed: Vec<PlacedItem>,
    pub unplaced: Vec<UnplacedItem>,
    /// Set when the deadline passed before every item was tried.
    pub timed_out: bool,
}

impl PackingResult {
    /// Whether every item was placed.
    pub fn is_complete(&self) -> bool {
        self.unplaced.is_empty()
    }

    pub fn placed_count(&self) -> usize {
        self.placed.len()
    }

    pub fn unplaced_count(&self) -> usize {
        self.unplaced.len()
    }

    /// Sum of the volumes of all placed items.
    pub fn placed_volume(&self) -> f64 {
        self.placed.iter().map(|p| p.volume()).fold(0.0, |acc, v| acc + v)
    }

    /// Sum of the weights of all placed items.
    pub fn placed_weight(&self) -> f64 {
        self.placed
            .iter()
            .map(Weighted::weight)
            .fold(0.0, |acc, w| acc + w)
    }
}

/// Item that could not be placed.
#[derive(Clone, Debug, PartialEq)]
pub struct UnplacedItem {
    pub item: CargoItem,
    pub reason: UnplacedReason,
}

/// Why an item could not be placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnplacedReason {
    TooHeavyForContainer,
    WeightLimitReached,
    DimensionsExceedContainer,
    NoStablePosition,
    DeadlineExceeded,
}

impl UnplacedReason {
    pub fn code(&self) -> &'static str {
        match self {
            UnplacedReason::TooHeavyForContainer => "too_heavy_for_container",
            UnplacedReason::WeightLimitReached => "weight_limit_reached",
            UnplacedReason::DimensionsExceedContainer => "dimensions_exceed_container",
            UnplacedReason::NoStablePosition => "no_stable_position",
            UnplacedReason::DeadlineExceeded => "deadline_exceeded",
        }
    }
}

impl std::fmt::Display for UnplacedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnplacedReason::TooHeavyForContainer => {
                write!(f, "Item exceeds the container's maximum payload")
            }
            UnplacedReason::WeightLimitReached => {
                write!(f, "Remaining payload is too small for this item")
            }
            UnplacedReason::DimensionsExceedContainer => {
                write!(f, "Item does not fit the container in any permitted orientation")
            }
            UnplacedReason::NoStablePosition => {
                write!(f, "No free, supported position found in the container")
            }
            UnplacedReason::DeadlineExceeded => {
                write!(f, "Time limit reached before the item was tried")
            }
        }
    }
}

/// Events emitted while packing, for live progress reporting.
#[derive(Clone, Debug, serde::Serialize)]
#[serde(tag = "type")]
pub enum PackEvent {
    /// An item was placed.
    ItemPlaced {
        id: String,
        group_id: String,
        pos: (f64, f64, f64),
        dims: (f64, f64, f64),
        weight: f64,
        total_weight: f64,
    },
    /// An item could not be placed.
    ItemRejected {
        id: String,
        group_id: String,
        reason_code: String,
        reason_text: String,
    },
    /// The run is complete.
    Finished {
        placed: usize,
        unplaced: usize,
        timed_out: bool,
    },
}

/// Packs items into the container with the given configuration.
///
/// # Parameters
/// * `items` - Items to pack, in catalog order
/// * `container` - The target container
/// * `config` - Engine configuration; `time_limit` starts counting now
///
/// # Returns
/// `PackingResult` with placed and unplaced items, or a `ConfigurationError`
/// if the container or an item is invalid
pub fn pack_items(
    items: Vec<CargoItem>,
    container: &Container,
    config: &PackingConfig,
) -> Result<PackingResult, ConfigurationError> {
    pack_items_with_progress(items, container, config, config.deadline_from_now(), |_| {})
}

/// Like `pack_items`, with an explicit deadline and a progress callback.
pub fn pack_items_with_progress(
    items: Vec<CargoItem>,
    container: &Container,
    config: &PackingConfig,
    deadline: Option<Instant>,
    mut on_event: impl FnMut(&PackEvent),
) -> Result<PackingResult, ConfigurationError> {
    container.validate()?;
    for item in &items {
        item.validate()?;
    }

    // Larger first, then heavier; stable sort keeps input order for ties
    let mut items = items;
    items.sort_by(|a, b| {
        b.volume()
            .partial_cmp(&a.volume())
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.weight.partial_cmp(&a.weight).unwrap_or(Ordering::Equal))
    });

    let mut space = LoadSpace::new(container, config);
    let mut unplaced: Vec<UnplacedItem> = Vec::new();
    let mut timed_out = false;

    for item in items {
        if !timed_out && deadline.is_some_and(|limit| Instant::now() >= limit) {
            timed_out = true;
        }

        let outcome = if timed_out {
            Err(UnplacedReason::DeadlineExceeded)
        } else {
            space.find_placement(&item)
        };

        match outcome {
            Ok(candidate) => {
                space.commit(item, candidate);
                if let Some(placed) = space.placed.last() {
                    on_event(&PackEvent::ItemPlaced {
                        id: placed.item.id.clone(),
                        group_id: placed.item.group_id.clone(),
                        pos: placed.position.as_tuple(),
                        dims: placed.dims.as_tuple(),
                        weight: placed.item.weight,
                        total_weight: space.total_weight,
                    });
                }
            }
            Err(reason) => {
                on_event(&PackEvent::ItemRejected {
                    id: item.id.clone(),
                    group_id: item.group_id.clone(),
                    reason_code: reason.code().to_string(),
                    reason_text: reason.to_string(),
                });
                unplaced.push(UnplacedItem { item, reason });
            }
        }
    }

    let placed = space.into_placed();
    debug!(
        "Packing run finished: {} placed, {} unplaced, timed out: {}",
        placed.len(),
        unplaced.len(),
        timed_out
    );
    on_event(&PackEvent::Finished {
        placed: placed.len(),
        unplaced: unplaced.len(),
        timed_out,
    });

    Ok(PackingResult {
        placed,
        unplaced,
        timed_out,
    })
}

/// A validated (point, orientation) choice for an item.
#[derive(Clone, Debug)]
struct Candidate {
    point_index: usize,
    position: Vec3,
    dims: Vec3,
    supporters: Vec<usize>,
}

/// Mutable state of the container during one engine run.
struct LoadSpace<'a> {
    bounds: Vec3,
    max_weight: f64,
    config: &'a PackingConfig,
    placed: Vec<PlacedItem>,
    /// Weight resting directly or indirectly on each placed item.
    carried: Vec<f64>,
    /// Direct supporters of each placed item (indices into `placed`).
    supporters: Vec<Vec<usize>>,
    /// Candidate insertion points, kept in scan order.
    points: Vec<Vec3>,
    total_weight: f64,
}

impl<'a> LoadSpace<'a> {
    fn new(container: &Container, config: &'a PackingConfig) -> Self {
        Self {
            bounds: container.usable_dims(),
            max_weight: container.max_weight,
            config,
            placed: Vec::new(),
            carried: Vec::new(),
            supporters: Vec::new(),
            points: vec![Vec3::zero()],
            total_weight: 0.0,
        }
    }

    fn into_placed(self) -> Vec<PlacedItem> {
        self.placed
    }

    /// Finds the first valid (point, orientation) pair in loading order.
    ///
    /// Pairs are ranked by their back face, then their top face, then their
    /// left side (see `loading_cmp`). Ties keep point scan order and then
    /// orientation order, so the choice stays deterministic.
    fn find_placement(&self, item: &CargoItem) -> Result<Candidate, UnplacedReason> {
        let eps = self.config.general_epsilon;

        if item.weight > self.max_weight + eps {
            return Err(UnplacedReason::TooHeavyForContainer);
        }

        let fitting: Vec<Vec3> = orientations(item.dims_as_vec3(), self.config.allow_rotation)
            .into_iter()
            .filter(|dims| dims.fits_within(&self.bounds, eps))
            .collect();
        if fitting.is_empty() {
            return Err(UnplacedReason::DimensionsExceedContainer);
        }

        if self.total_weight + item.weight > self.max_weight + eps {
            return Err(UnplacedReason::WeightLimitReached);
        }

        let mut pairs: Vec<(usize, Vec3, Vec3)> =
            Vec::with_capacity(self.points.len() * fitting.len());
        for (point_index, &point) in self.points.iter().enumerate() {
            for &dims in &fitting {
                pairs.push((point_index, point, dims));
            }
        }
        // Stable, so equal ranks keep scan order
        pairs.sort_by(|a, b| loading_cmp(a.1, a.2, b.1, b.2));

        pairs
            .into_iter()
            .find_map(|(point_index, position, dims)| {
                self.check_position(item, position, dims)
                    .map(|supporters| Candidate {
                        point_index,
                        position,
                        dims,
                        supporters,
                    })
            })
            .ok_or(UnplacedReason::NoStablePosition)
    }

    /// Validates one position and orientation.
    ///
    /// Returns the direct supporters when the position is valid.
    fn check_position(&self, item: &CargoItem, position: Vec3, dims: Vec3) -> Option<Vec<usize>> {
        let eps = self.config.general_epsilon;

        if !fits_in_container(position, dims, self.bounds, eps) {
            return None;
        }

        let candidate = BoundingBox::from_position_and_dims(position, dims);
        if self
            .placed
            .iter()
            .any(|p| p.bounding_box().intersects(&candidate, eps))
        {
            return None;
        }

        // Items may not be slid flush beneath an already placed item
        let top = candidate.top_z();
        if self.placed.iter().any(|p| {
            (p.position.z - top).abs() <= eps
                && footprint_overlap(&p.bounding_box(), &candidate) > eps
        }) {
            return None;
        }

        if position.z <= eps {
            return Some(Vec::new());
        }

        let mut supporters = Vec::new();
        let mut supported_area = 0.0;
        for (idx, p) in self.placed.iter().enumerate() {
            if (p.top_z() - position.z).abs() > eps {
                continue;
            }
            let area = footprint_overlap(&p.bounding_box(), &candidate);
            if area > eps {
                supported_area += area;
                supporters.push(idx);
            }
        }

        let base_area = dims.base_area();
        if supporters.is_empty() || supported_area + eps < base_area * self.config.support_ratio {
            return None;
        }

        let carries_load = self.support_closure(&supporters).into_iter().all(|idx| {
            self.carried[idx] + item.weight <= self.placed[idx].item.load_bearing + eps
        });
        if !carries_load {
            return None;
        }

        Some(supporters)
    }

    /// All items directly or indirectly below the given supporters.
    fn support_closure(&self, direct: &[usize]) -> Vec<usize> {
        let mut visited = vec![false; self.placed.len()];
        let mut stack: Vec<usize> = direct.to_vec();
        let mut closure = Vec::new();

        while let Some(idx) = stack.pop() {
            if std::mem::replace(&mut visited[idx], true) {
                continue;
            }
            closure.push(idx);
            stack.extend(self.supporters[idx].iter().copied());
        }
        closure
    }

    /// Places the item and updates weight, load and candidate points.
    fn commit(&mut self, item: CargoItem, candidate: Candidate) {
        let Candidate {
            point_index,
            position,
            dims,
            supporters,
        } = candidate;

        for idx in self.support_closure(&supporters) {
            self.carried[idx] += item.weight;
        }
        self.total_weight += item.weight;
        self.points.remove(point_index);

        let placed = PlacedItem::new(item, position, dims);
        let occupied = placed.bounding_box();
        self.placed.push(placed);
        self.carried.push(0.0);
        self.supporters.push(supporters);

        let eps = self.config.general_epsilon;
        self.points.retain(|p| !occupied.contains_point(p, eps));

        let corners = [
            Vec3::new(position.x + dims.x, position.y, position.z),
            Vec3::new(position.x, position.y + dims.y, position.z),
            Vec3::new(position.x, position.y, position.z + dims.z),
        ];
        for corner in corners {
            self.add_point(corner);
        }
    }

    /// Adds a candidate point unless it is outside the container, occupied
    /// or already known.
    fn add_point(&mut self, point: Vec3) {
        let eps = self.config.general_epsilon;

        if point.x >= self.bounds.x - eps
            || point.y >= self.bounds.y - eps
            || point.z >= self.bounds.z - eps
        {
            return;
        }
        if self
            .placed
            .iter()
            .any(|p| p.bounding_box().contains_point(&point, eps))
        {
            return;
        }

        match self
            .points
            .binary_search_by(|existing| existing.scan_cmp(&point))
        {
            Ok(_) => {}
            Err(pos) => {
                let duplicate = self.points[pos.saturating_sub(1)..]
                    .iter()
                    .take(2)
                    .any(|existing| existing.approx_eq(&point, eps));
                if !duplicate {
                    self.points.insert(pos, point);
                }
            }
        }
    }
}

/// Loading order of two candidate boxes.
///
/// The load is built as walls from the front of the container: a box whose
/// back face is nearer the front wins, then the one with the lower top face,
/// then the one further left.
fn loading_cmp(a_pos: Vec3, a_dims: Vec3, b_pos: Vec3, b_dims: Vec3) -> Ordering {
    let a_far = a_pos + a_dims;
    let b_far = b_pos + b_dims;
    a_far
        .y
        .total_cmp(&b_far.y)
        .then_with(|| a_far.z.total_cmp(&b_far.z))
        .then_with(|| a_pos.x.total_cmp(&b_pos.x))
}

/// Checks whether two placed items collide (used by result validation).
pub fn find_overlap(placed: &[PlacedItem], epsilon: f64) -> Option<(usize, usize)> {
    for (i, a) in placed.iter().enumerate() {
        for (j, b) in placed.iter().enumerate().skip(i + 1) {
            if intersects(a, b, epsilon) {
                return Some((i, j));
            }
        }
    }
    None
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::SetDefinition;
    use crate::model::Container;

    pub(crate) fn item(
        id: &str,
        group: &str,
        dims: (f64, f64, f64),
        weight: f64,
        load_bearing: f64,
    ) -> CargoItem {
        CargoItem::new(id, group, "Test Set", "part", dims, weight, load_bearing).unwrap()
    }

    /// Total weight resting directly or indirectly on each placed item,
    /// derived from geometry alone.
    fn loads_from_geometry(placed: &[PlacedItem], eps: f64) -> Vec<f64> {
        let n = placed.len();
        let above: Vec<Vec<usize>> = (0..n)
            .map(|i| {
                (0..n)
                    .filter(|&j| {
                        j != i
                            && (placed[j].position.z - placed[i].top_z()).abs() <= eps
                            && footprint_overlap(
                                &placed[i].bounding_box(),
                                &placed[j].bounding_box(),
                            ) > eps
                    })
                    .collect()
            })
            .collect();

        (0..n)
            .map(|i| {
                let mut visited = vec![false; n];
                let mut stack = above[i].clone();
                let mut load = 0.0;
                while let Some(j) = stack.pop() {
                    if std::mem::replace(&mut visited[j], true) {
                        continue;
                    }
                    load += placed[j].item.weight;
                    stack.extend(above[j].iter().copied());
                }
                load
            })
            .collect()
    }

    /// Checks every invariant a packing result must satisfy.
    pub(crate) fn assert_valid_result(result: &PackingResult, container: &Container) {
        let eps = PackingConfig::DEFAULT_GENERAL_EPSILON;
        let bounds = container.usable_dims();

        for p in &result.placed {
            assert!(
                fits_in_container(p.position, p.dims, bounds, eps),
                "Item {} at {:?} with {:?} leaves the container",
                p.item.id,
                p.position,
                p.dims
            );
            let volume_diff = (p.dims.volume() - p.item.volume()).abs();
            assert!(volume_diff < 1e-6, "Item {} changed volume", p.item.id);
        }

        if let Some((i, j)) = find_overlap(&result.placed, eps) {
            panic!(
                "Items {} and {} overlap",
                result.placed[i].item.id, result.placed[j].item.id
            );
        }

        assert!(result.placed_weight() <= container.max_weight + eps);

        for (p, load) in result
            .placed
            .iter()
            .zip(loads_from_geometry(&result.placed, eps))
        {
            assert!(
                load <= p.item.load_bearing + eps,
                "Item {} carries {}kg but bears only {}kg",
                p.item.id,
                load,
                p.item.load_bearing
            );
        }

        let total = result.placed_count() + result.unplaced_count();
        let mut ids: Vec<&str> = result
            .placed
            .iter()
            .map(|p| p.item.id.as_str())
            .chain(result.unplaced.iter().map(|u| u.item.id.as_str()))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total, "an item was reported twice");
    }

    fn container(dims: (f64, f64, f64), max_weight: f64) -> Container {
        Container::new(dims, 0.0, max_weight).unwrap()
    }

    #[test]
    fn single_item_snaps_to_origin() {
        let cont = container((20.0, 20.0, 20.0), 100.0);
        let result = pack_items(
            vec![item("a", "g", (10.0, 10.0, 10.0), 5.0, 10.0)],
            &cont,
            &PackingConfig::default(),
        )
        .unwrap();

        assert!(result.is_complete());
        assert_eq!(result.placed[0].position, Vec3::zero());
    }

    #[test]
    fn larger_items_are_placed_first() {
        let cont = container((100.0, 100.0, 100.0), 1000.0);
        let items = vec![
            item("small", "g", (10.0, 10.0, 10.0), 5.0, 100.0),
            item("large", "g", (50.0, 50.0, 50.0), 5.0, 100.0),
            item("heavy_small", "g", (10.0, 10.0, 10.0), 8.0, 100.0),
        ];
        let result = pack_items(items, &cont, &PackingConfig::default()).unwrap();

        let order: Vec<&str> = result.placed.iter().map(|p| p.item.id.as_str()).collect();
        assert_eq!(order, vec!["large", "heavy_small", "small"]);
        assert_eq!(result.placed[0].position, Vec3::zero());
        assert_valid_result(&result, &cont);
    }

    #[test]
    fn fills_front_wall_before_moving_back() {
        let cont = container((20.0, 20.0, 20.0), 1000.0);
        let items = (0..4)
            .map(|i| item(&format!("i{i}"), "g", (10.0, 10.0, 10.0), 1.0, 100.0))
            .collect();
        let result = pack_items(items, &cont, &PackingConfig::default()).unwrap();

        let positions: Vec<Vec3> = result.placed.iter().map(|p| p.position).collect();
        assert_eq!(
            positions,
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(10.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 10.0),
                Vec3::new(10.0, 0.0, 10.0),
            ]
        );
    }

    #[test]
    fn bed_base_stands_against_the_front_wall() {
        let cont = Container::new((245.0, 1360.0, 270.0), 30.0, 26_000.0).unwrap();
        let base = item("set1_0|base|0", "set1_0", (90.0, 190.0, 28.0), 40.0, 100.0);
        let result = pack_items(vec![base], &cont, &PackingConfig::default()).unwrap();

        // thinnest side along the depth, then the lowest top of those
        assert_eq!(result.placed[0].position, Vec3::zero());
        assert_eq!(result.placed[0].dims, Vec3::new(190.0, 28.0, 90.0));
    }

    #[test]
    fn lower_top_wins_at_the_same_depth() {
        let cont = container((100.0, 10.0, 100.0), 1000.0);
        let items = vec![
            item("low", "g", (40.0, 10.0, 30.0), 5.0, 100.0),
            item("next", "g", (40.0, 10.0, 30.0), 5.0, 100.0),
        ];
        let result = pack_items(items, &cont, &PackingConfig::default()).unwrap();

        // lying on its long side beside the first beats standing or stacking
        assert_eq!(result.placed[0].dims, Vec3::new(40.0, 10.0, 30.0));
        assert_eq!(result.placed[1].position, Vec3::new(40.0, 0.0, 0.0));
        assert_eq!(result.placed[1].dims, Vec3::new(40.0, 10.0, 30.0));
        assert_valid_result(&result, &cont);
    }

    #[test]
    fn empty_result_totals_are_positive_zero() {
        let result = PackingResult::default();
        assert!(result.placed_volume().is_sign_positive());
        assert!(result.placed_weight().is_sign_positive());
        assert_eq!(result.placed_volume(), 0.0);
    }

    #[test]
    fn oversized_item_is_never_placed() {
        let cont = container((245.0, 1330.0, 270.0), 26_000.0);
        for allow_rotation in [false, true] {
            let config = PackingConfig::builder()
                .allow_rotation(allow_rotation)
                .build();
            let result = pack_items(
                vec![item("wide", "g", (1400.0, 300.0, 300.0), 10.0, 0.0)],
                &cont,
                &config,
            )
            .unwrap();

            assert!(result.placed.is_empty());
            assert_eq!(
                result.unplaced[0].reason,
                UnplacedReason::DimensionsExceedContainer
            );
        }
    }

    #[test]
    fn rotation_lets_tall_item_lie_down() {
        let cont = container((100.0, 100.0, 20.0), 100.0);
        let tall = item("tall", "g", (20.0, 20.0, 50.0), 5.0, 0.0);

        let fixed = pack_items(
            vec![tall.clone()],
            &cont,
            &PackingConfig::builder().allow_rotation(false).build(),
        )
        .unwrap();
        assert_eq!(fixed.unplaced_count(), 1);

        let rotated = pack_items(vec![tall], &cont, &PackingConfig::default()).unwrap();
        assert_eq!(rotated.placed_count(), 1);
        assert!(rotated.placed[0].dims.z <= 20.0);
    }

    #[test]
    fn stays_within_weight_limit() {
        let cont = container((100.0, 100.0, 100.0), 50.0);
        let items: Vec<CargoItem> = (0..10)
            .map(|i| item(&format!("i{i}"), "g", (10.0, 10.0, 10.0), 12.0, 100.0))
            .collect();
        let catalog_weight: f64 = items.iter().map(|i| i.weight).sum();
        assert!(catalog_weight > cont.max_weight);

        let result = pack_items(items, &cont, &PackingConfig::default()).unwrap();
        assert!(result.placed_count() < 10);
        assert_eq!(result.placed_count(), 4);
        assert!(
            result
                .unplaced
                .iter()
                .all(|u| u.reason == UnplacedReason::WeightLimitReached)
        );
        assert_valid_result(&result, &cont);
    }

    #[test]
    fn rejects_item_heavier_than_container() {
        let cont = container((10.0, 10.0, 10.0), 10.0);
        let result = pack_items(
            vec![item("a", "g", (5.0, 5.0, 5.0), 25.0, 0.0)],
            &cont,
            &PackingConfig::default(),
        )
        .unwrap();
        assert_eq!(
            result.unplaced[0].reason,
            UnplacedReason::TooHeavyForContainer
        );
    }

    #[test]
    fn nothing_is_stacked_on_zero_capacity_items() {
        let cont = container((10.0, 10.0, 30.0), 100.0);
        let items = vec![
            item("mattress", "g", (10.0, 10.0, 10.0), 5.0, 0.0),
            item("box", "g", (10.0, 10.0, 5.0), 1.0, 0.0),
        ];
        let result = pack_items(items, &cont, &PackingConfig::default()).unwrap();

        assert_eq!(result.placed_count(), 1);
        assert_eq!(
            result.unplaced[0].reason,
            UnplacedReason::NoStablePosition
        );
    }

    #[test]
    fn load_bearing_counts_indirect_weight() {
        let cont = container((10.0, 10.0, 100.0), 1000.0);
        let config = PackingConfig::builder().allow_rotation(false).build();
        let items = vec![
            item("bottom", "g", (10.0, 10.0, 20.0), 40.0, 50.0),
            item("middle", "g", (10.0, 10.0, 15.0), 30.0, 100.0),
            item("top", "g", (10.0, 10.0, 10.0), 30.0, 100.0),
        ];
        let result = pack_items(items, &cont, &config).unwrap();

        // bottom carries middle (30kg); adding top would make it 60kg > 50kg
        assert_eq!(result.placed_count(), 2);
        assert_eq!(result.unplaced[0].item.id, "top");
        assert_valid_result(&result, &cont);
    }

    #[test]
    fn unsupported_overhang_is_rejected() {
        let cont = container((30.0, 10.0, 30.0), 1000.0);
        let config = PackingConfig::builder().allow_rotation(false).build();
        let items = vec![
            item("pillar", "g", (10.0, 10.0, 10.0), 50.0, 100.0),
            item("plank", "g", (30.0, 10.0, 2.0), 1.0, 100.0),
        ];
        let result = pack_items(items, &cont, &config).unwrap();

        // a third of the plank's footprint rests on the pillar, the floor is taken
        assert_eq!(result.placed_count(), 1);
        assert_eq!(result.unplaced[0].item.id, "plank");
        assert_eq!(
            result.unplaced[0].reason,
            UnplacedReason::NoStablePosition
        );
        assert_valid_result(&result, &cont);
    }

    #[test]
    fn empty_catalog_yields_empty_result() {
        let cont = container((10.0, 10.0, 10.0), 10.0);
        let result = pack_items(Vec::new(), &cont, &PackingConfig::default()).unwrap();
        assert!(result.placed.is_empty());
        assert!(result.unplaced.is_empty());
        assert!(!result.timed_out);
    }

    #[test]
    fn invalid_container_is_a_configuration_error() {
        let cont = Container {
            dims: (0.0, 10.0, 10.0),
            clearance: 0.0,
            max_weight: 10.0,
        };
        let err = pack_items(Vec::new(), &cont, &PackingConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidDimension(_)));
    }

    #[test]
    fn invalid_item_is_a_configuration_error() {
        let cont = container((10.0, 10.0, 10.0), 10.0);
        let mut bad = item("a", "g", (1.0, 1.0, 1.0), 1.0, 0.0);
        bad.weight = -1.0;
        let err = pack_items(vec![bad], &cont, &PackingConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidWeight(_)));
    }

    #[test]
    fn expired_deadline_marks_items_unplaced() {
        let cont = container((100.0, 100.0, 100.0), 1000.0);
        let items = vec![
            item("a", "g", (10.0, 10.0, 10.0), 1.0, 10.0),
            item("b", "g", (10.0, 10.0, 10.0), 1.0, 10.0),
        ];
        let result = pack_items_with_progress(
            items,
            &cont,
            &PackingConfig::default(),
            Some(Instant::now()),
            |_| {},
        )
        .unwrap();

        assert!(result.timed_out);
        assert!(result.placed.is_empty());
        assert!(
            result
                .unplaced
                .iter()
                .all(|u| u.reason == UnplacedReason::DeadlineExceeded)
        );
    }

    #[test]
    fn progress_events_cover_every_item() {
        let cont = container((20.0, 20.0, 20.0), 100.0);
        let items = vec![
            item("a", "g", (10.0, 10.0, 10.0), 1.0, 10.0),
            item("b", "g", (30.0, 10.0, 10.0), 1.0, 10.0),
        ];
        let mut events = Vec::new();
        let config = PackingConfig::builder().allow_rotation(false).build();
        pack_items_with_progress(items, &cont, &config, None, |evt| events.push(evt.clone()))
            .unwrap();

        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], PackEvent::ItemRejected { .. }));
        assert!(matches!(events[1], PackEvent::ItemPlaced { .. }));
        assert!(matches!(
            events[2],
            PackEvent::Finished {
                placed: 1,
                unplaced: 1,
                timed_out: false
            }
        ));
    }

    #[test]
    fn repacking_is_deterministic() {
        let cont = Container::new((245.0, 1360.0, 270.0), 30.0, 26_000.0).unwrap();
        let items = SetDefinition::standard_bed_set("Gold Set", 10)
            .expand(0)
            .unwrap();
        let config = PackingConfig::default();

        let first = pack_items(items.clone(), &cont, &config).unwrap();
        let second = pack_items(items, &cont, &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn bed_sets_respect_all_invariants() {
        let cont = Container::new((245.0, 1360.0, 270.0), 30.0, 26_000.0).unwrap();
        let items = SetDefinition::standard_bed_set("Gold Set", 20)
            .expand(0)
            .unwrap();

        for allow_rotation in [true, false] {
            let config = PackingConfig::builder()
                .allow_rotation(allow_rotation)
                .build();
            let result = pack_items(items.clone(), &cont, &config).unwrap();
            assert!(result.placed_count() > 0);
            assert_valid_result(&result, &cont);

            if !allow_rotation {
                for p in &result.placed {
                    assert_eq!(p.dims, p.item.dims_as_vec3());
                }
            }
        }
    }
}
