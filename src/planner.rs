//! Two-phase load planning.
//!
//! Phase 1 packs the whole catalog to find out which sets fit completely.
//! Phase 2 repacks only the members of those sets, so that space taken by
//! partially loaded sets in phase 1 does not fragment the final layout.

use std::time::Instant;

use log::{debug, info};
use serde::Serialize;
use utoipa::ToSchema;

use crate::groups::resolve_groups;
use crate::model::{CM3_PER_M3, CargoItem, ConfigurationError, Container};
use crate::optimizer::{PackEvent, PackingConfig, PackingResult, pack_items_with_progress};
use crate::report::{ExportRow, PlacementRecord, export_rows, placement_records};

/// The two engine runs of a plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlanPhase {
    /// Packs the whole catalog.
    Exploratory,
    /// Repacks the fully satisfied groups.
    Compaction,
}

/// Volume and weight figures of the final layout.
///
/// Volumes are in cm³ unless the field name says m³.
#[derive(Clone, Debug, Default, PartialEq, Serialize, ToSchema)]
pub struct PlanMetrics {
    pub placed_volume: f64,
    pub placed_weight: f64,
    pub usable_volume: f64,
    /// placed volume / usable volume
    pub utilization_ratio: f64,
    pub utilization_percent: f64,
    pub placed_volume_m3: f64,
    pub usable_volume_m3: f64,
}

impl PlanMetrics {
    fn from_result(result: &PackingResult, container: &Container) -> Self {
        let placed_volume = result.placed_volume();
        let usable_volume = container.usable_volume();
        let utilization_ratio = if usable_volume > 0.0 {
            placed_volume / usable_volume
        } else {
            0.0
        };

        Self {
            placed_volume,
            placed_weight: result.placed_weight(),
            usable_volume,
            utilization_ratio,
            utilization_percent: utilization_ratio * 100.0,
            placed_volume_m3: placed_volume / CM3_PER_M3,
            usable_volume_m3: usable_volume / CM3_PER_M3,
        }
    }
}

/// Outcome of a complete planning run.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadPlan {
    /// Final layout (phase 2).
    pub result: PackingResult,
    /// Groups fully placed by phase 1.
    pub phase_one_satisfied: usize,
    /// Groups fully placed by phase 2; these are the deliverable sets.
    pub satisfied_groups: usize,
    /// Catalog groups that are not part of the final layout.
    pub excluded_groups: usize,
    pub total_groups: usize,
    pub metrics: PlanMetrics,
    /// Set when the time limit cut either phase short.
    pub timed_out: bool,
    orientation_tolerance: f64,
}

impl LoadPlan {
    /// Render records of the final layout.
    pub fn placement_records(&self) -> Vec<PlacementRecord> {
        placement_records(&self.result.placed, self.orientation_tolerance)
    }

    /// Export rows of the final layout.
    pub fn export_rows(&self) -> Vec<ExportRow> {
        export_rows(&self.result.placed, self.orientation_tolerance)
    }
}

/// Progress of a planning run, for live streaming.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum PlanEvent {
    PhaseStarted {
        phase: PlanPhase,
        item_count: usize,
    },
    ItemPlaced {
        phase: PlanPhase,
        id: String,
        group_id: String,
        pos: (f64, f64, f64),
        dims: (f64, f64, f64),
        weight: f64,
        total_weight: f64,
    },
    ItemRejected {
        phase: PlanPhase,
        id: String,
        group_id: String,
        reason_code: String,
        reason_text: String,
    },
    PhaseFinished {
        phase: PlanPhase,
        placed: usize,
        unplaced: usize,
        satisfied_groups: usize,
        timed_out: bool,
    },
    PlanFinished {
        satisfied_groups: usize,
        excluded_groups: usize,
        utilization_percent: f64,
        timed_out: bool,
    },
}

impl PlanEvent {
    /// Tags an engine event with its phase.
    ///
    /// Returns `None` for the engine's own completion event; the planner
    /// reports phase completion once the groups are resolved.
    fn from_pack_event(phase: PlanPhase, event: &PackEvent) -> Option<Self> {
        match event {
            PackEvent::ItemPlaced {
                id,
                group_id,
                pos,
                dims,
                weight,
                total_weight,
            } => Some(PlanEvent::ItemPlaced {
                phase,
                id: id.clone(),
                group_id: group_id.clone(),
                pos: *pos,
                dims: *dims,
                weight: *weight,
                total_weight: *total_weight,
            }),
            PackEvent::ItemRejected {
                id,
                group_id,
                reason_code,
                reason_text,
            } => Some(PlanEvent::ItemRejected {
                phase,
                id: id.clone(),
                group_id: group_id.clone(),
                reason_code: reason_code.clone(),
                reason_text: reason_text.clone(),
            }),
            PackEvent::Finished { .. } => None,
        }
    }
}

/// Plans the load of `catalog` into `container`.
///
/// # Parameters
/// * `container` - The target container
/// * `catalog` - All requested items, in catalog order
/// * `config` - Engine configuration shared by both phases
///
/// # Returns
/// The final `LoadPlan`, or a `ConfigurationError` before any packing if the
/// container or an item is invalid
pub fn plan_load(
    container: &Container,
    catalog: &[CargoItem],
    config: &PackingConfig,
) -> Result<LoadPlan, ConfigurationError> {
    plan_load_with_progress(container, catalog, config, |_| {})
}

/// Like `plan_load`, reporting progress through `on_event`.
pub fn plan_load_with_progress(
    container: &Container,
    catalog: &[CargoItem],
    config: &PackingConfig,
    mut on_event: impl FnMut(&PlanEvent),
) -> Result<LoadPlan, ConfigurationError> {
    container.validate()?;
    for item in catalog {
        item.validate()?;
    }

    let deadline = config.deadline_from_now();

    let phase_one = run_phase(
        PlanPhase::Exploratory,
        catalog.to_vec(),
        container,
        config,
        deadline,
        &mut on_event,
    )?;
    let explored = resolve_groups(catalog, &phase_one);
    on_event(&PlanEvent::PhaseFinished {
        phase: PlanPhase::Exploratory,
        placed: phase_one.placed_count(),
        unplaced: phase_one.unplaced_count(),
        satisfied_groups: explored.satisfied_count(),
        timed_out: phase_one.timed_out,
    });
    info!(
        "Phase 1: {} of {} items placed, {} of {} groups complete",
        phase_one.placed_count(),
        catalog.len(),
        explored.satisfied_count(),
        explored.total_groups
    );

    let filtered = explored.filter_catalog(catalog);
    let phase_two = run_phase(
        PlanPhase::Compaction,
        filtered.clone(),
        container,
        config,
        deadline,
        &mut on_event,
    )?;
    let compacted = resolve_groups(&filtered, &phase_two);
    on_event(&PlanEvent::PhaseFinished {
        phase: PlanPhase::Compaction,
        placed: phase_two.placed_count(),
        unplaced: phase_two.unplaced_count(),
        satisfied_groups: compacted.satisfied_count(),
        timed_out: phase_two.timed_out,
    });

    let satisfied_groups = compacted.satisfied_count();
    let excluded_groups = explored.total_groups - satisfied_groups;
    let metrics = PlanMetrics::from_result(&phase_two, container);
    let timed_out = phase_one.timed_out || phase_two.timed_out;

    info!(
        "Phase 2: {} items placed, {} groups deliverable, {} excluded, utilization {:.1}%",
        phase_two.placed_count(),
        satisfied_groups,
        excluded_groups,
        metrics.utilization_percent
    );
    on_event(&PlanEvent::PlanFinished {
        satisfied_groups,
        excluded_groups,
        utilization_percent: metrics.utilization_percent,
        timed_out,
    });

    Ok(LoadPlan {
        result: phase_two,
        phase_one_satisfied: explored.satisfied_count(),
        satisfied_groups,
        excluded_groups,
        total_groups: explored.total_groups,
        metrics,
        timed_out,
        orientation_tolerance: config.orientation_tolerance,
    })
}

fn run_phase(
    phase: PlanPhase,
    items: Vec<CargoItem>,
    container: &Container,
    config: &PackingConfig,
    deadline: Option<Instant>,
    on_event: &mut impl FnMut(&PlanEvent),
) -> Result<PackingResult, ConfigurationError> {
    debug!("Starting {:?} phase with {} items", phase, items.len());
    on_event(&PlanEvent::PhaseStarted {
        phase,
        item_count: items.len(),
    });
    pack_items_with_progress(items, container, config, deadline, |evt| {
        if let Some(event) = PlanEvent::from_pack_event(phase, evt) {
            on_event(&event);
        }
    })
}
