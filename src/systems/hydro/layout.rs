// layout calculators
// one pure function per component kind, turns a typed record into every derived
// dimension and coordinate the builders need

use bevy::prelude::*;

use crate::config::*;
use crate::error::GenerationError;
use super::params::{ComponentKind, GeneratorParams, IntakeParams, IntakeTimeline, ParameterRecord, TurbineParams};

// negative or non-finite sizes collapse to zero
fn non_negative(name: &str, value: f32) -> f32 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        warn!("`{}` = {} is not a usable size, using 0", name, value);
        0.0
    }
}

// elevations may be negative but must be finite
fn finite(name: &str, value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        warn!("`{}` = {} is not finite, using 0", name, value);
        0.0
    }
}

fn count(value: i64) -> usize {
    value.max(0) as usize
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeneratorLayout {
    pub stator_radius: f32,
    pub stator_height: f32,
    pub rotor_radius: f32,
    pub rotor_height: f32,
    pub shaft_radius: f32,
    pub shaft_height: f32,
    pub base_radius: f32,
    pub base_height: f32,
}

pub fn compute_generator_layout(p: &GeneratorParams) -> GeneratorLayout {
    GeneratorLayout {
        stator_radius: non_negative("stator_radius", p.stator_radius),
        stator_height: non_negative("stator_height", p.stator_height),
        rotor_radius: non_negative("rotor_radius", p.rotor_radius),
        rotor_height: non_negative("rotor_height", p.rotor_height),
        shaft_radius: non_negative("shaft_radius", p.shaft_radius),
        shaft_height: non_negative("shaft_height", p.shaft_height),
        base_radius: non_negative("base_radius", p.base_radius),
        base_height: non_negative("base_height", p.base_height),
    }
}

/// Elements repeated at equal angular steps on a circle.
#[derive(Clone, Debug, PartialEq)]
pub struct Ring {
    pub radius: f32,
    /// The count as supplied, before clamping.
    pub requested: i64,
    /// Placement angles in radians, `i * 360°/count`.
    pub angles: Vec<f32>,
}

impl Ring {
    pub fn new(radius: f32, requested: i64) -> Self {
        let n = count(requested);
        let step = if n == 0 { 0.0 } else { 360.0 / n as f32 };
        let angles = (0..n).map(|i| (i as f32 * step).to_radians()).collect();
        Self { radius, requested, angles }
    }

    /// Position of element `i` at height `y`. Angles grow counter-clockwise
    /// seen from above, so a rotation of `angle` about Y turns local +X outward.
    pub fn position(&self, angle: f32, y: f32) -> Vec3 {
        Vec3::new(self.radius * angle.cos(), y, -self.radius * angle.sin())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TurbineLayout {
    pub spiral_major_radius: f32,
    pub spiral_minor_radius: f32,
    pub stay_vanes: Ring,
    pub guide_vanes: Ring,
    pub blades: Ring,
    pub runner_radius: f32,
    pub runner_depth: f32,
    pub blade_radius: f32,
    pub blade_depth: f32,
    pub shaft_radius: f32,
    pub shaft_height: f32,
    /// Base of the cone, from `draft_radius1`.
    pub draft_radius_bottom: f32,
    /// Tip of the cone under the runner, from `draft_radius2`.
    pub draft_radius_top: f32,
    pub draft_depth: f32,
}

pub fn compute_turbine_layout(p: &TurbineParams) -> TurbineLayout {
    TurbineLayout {
        spiral_major_radius: non_negative("spiral_major_radius", p.spiral_major_radius),
        spiral_minor_radius: non_negative("spiral_minor_radius", p.spiral_minor_radius),
        stay_vanes: Ring::new(STAY_VANE_CIRCLE, p.stay_vane_count),
        guide_vanes: Ring::new(GUIDE_VANE_CIRCLE, p.guide_vane_count),
        blades: Ring::new(BLADE_CIRCLE, p.blade_count),
        runner_radius: non_negative("runner_radius", p.runner_radius),
        runner_depth: non_negative("runner_depth", p.runner_depth),
        blade_radius: non_negative("blade_radius", p.blade_radius),
        blade_depth: non_negative("blade_depth", p.blade_depth),
        shaft_radius: non_negative("shaft_radius", p.shaft_radius),
        shaft_height: non_negative("shaft_height", p.shaft_height),
        draft_radius_bottom: non_negative("draft_radius1", p.draft_radius1),
        draft_radius_top: non_negative("draft_radius2", p.draft_radius2),
        draft_depth: non_negative("draft_depth", p.draft_depth),
    }
}

/// Everything bay-indexed hangs off `centers`; builders never recompute a bay position.
#[derive(Clone, Debug, PartialEq)]
pub struct IntakeLayout {
    // plan, across the bays (x)
    pub requested_bays: i64,
    pub bay_count: usize,
    pub bay_width: f32,
    pub pier_thick: f32,
    pub bay_span: f32,
    pub total_width: f32,
    pub origin_x: f32,
    pub centers: Vec<f32>,
    pub pier_centers: Vec<f32>,
    pub side_wall_thick: f32,
    /// Total width plus both side walls.
    pub outer_width: f32,

    // section, along the flow (z)
    pub struct_depth: f32,
    pub upstream_z: f32,
    pub downstream_z: f32,
    pub face_thick: f32,
    pub rack_z: f32,
    pub gate_z: f32,

    // elevations (y)
    pub floor_elev: f32,
    pub sill_elev: f32,
    pub opening_height: f32,
    pub opening_top: f32,
    pub deck_top: f32,
    pub deck_bottom: f32,

    // trash rack
    pub bar_thick: f32,
    pub bar_columns: usize,
    /// Bar x offsets from the bay center.
    pub bar_offsets: Vec<f32>,
    pub requested_rows: i64,
    pub row_elevations: Vec<f32>,

    // gate
    pub gate_width: f32,
    pub gate_thick: f32,
    pub gate_lift: f32,
    pub rail_width: f32,
    /// Guide rail x offsets from the bay center, left then right.
    pub rail_offsets: [f32; 2],

    // tunnels
    pub tunnel_radius: f32,
    pub tunnel_len: f32,
    pub tunnel_slope: f32,
    pub tunnel_drop: f32,
    /// Tunnel center relative to the bay center line (y, z).
    pub tunnel_center_y: f32,
    pub tunnel_center_z: f32,

    // surroundings
    pub apron_len: f32,
    pub water_elev_up: f32,
    pub downstream_ground_top: f32,
    pub tailwater_elev: f32,

    // crane
    pub crane_gauge: f32,
    pub crane_span: f32,
    pub trolley_travel: f32,

    pub timeline: IntakeTimeline,
}

/// Number of trash bars across one bay, never less than one.
pub fn trash_bar_columns(bay_width: f32, bar_thick: f32, bar_gap: f32) -> usize {
    let pitch = bar_thick + bar_gap;
    if !(pitch > 0.0) || !pitch.is_finite() {
        return 1;
    }
    let columns = (bay_width / pitch).floor();
    if columns.is_finite() && columns >= 1.0 { columns as usize } else { 1 }
}

pub fn compute_intake_layout(p: &IntakeParams) -> IntakeLayout {
    let bay_count = count(p.bay_count);
    let bay_width = non_negative("bay_width", p.bay_width);
    let pier_thick = non_negative("pier_thick", p.pier_thick);
    let side_wall_thick = non_negative("side_wall_extra", p.side_wall_extra);

    let bay_span = bay_width + pier_thick;
    let total_width = if bay_count == 0 {
        0.0
    } else {
        bay_count as f32 * bay_width + (bay_count as f32 + 1.0) * pier_thick
    };
    let origin_x = -total_width / 2.0;
    let centers: Vec<f32> = (0..bay_count)
        .map(|b| origin_x + pier_thick + bay_width / 2.0 + b as f32 * bay_span)
        .collect();
    let pier_centers: Vec<f32> = if bay_count == 0 {
        Vec::new()
    } else {
        (0..=bay_count).map(|i| origin_x + pier_thick / 2.0 + i as f32 * bay_span).collect()
    };

    // section
    let struct_depth = non_negative("struct_depth", p.struct_depth);
    let face_thick = non_negative("face_thick", p.face_thick);
    let upstream_z = -struct_depth / 2.0;
    let downstream_z = struct_depth / 2.0;
    let rack_z = upstream_z + face_thick / 2.0;
    let gate_z = upstream_z + struct_depth * GATE_SLOT_FRACTION;

    // elevations, the deck always clears the opening by a face slab plus a minimal curtain wall
    let floor_elev = finite("floor_elev", p.floor_elev);
    let sill_elev = finite("sill_elev", p.sill_elev);
    let opening_height = non_negative("intake_height", p.intake_height);
    let opening_top = sill_elev + opening_height;
    let deck_top = finite("deck_elev", p.deck_elev).max(opening_top + face_thick + MIN_MEMBER_THICK);
    let deck_bottom = deck_top - face_thick;

    // trash rack
    let bar_gap = non_negative("trash_bar_gap", p.trash_bar_gap);
    let bar_columns = trash_bar_columns(bay_width, non_negative("trash_bar_thick", p.trash_bar_thick), bar_gap);
    let column_pitch = bay_width / bar_columns as f32;
    let bar_thick = non_negative("trash_bar_thick", p.trash_bar_thick).min(column_pitch);
    let bar_offsets = (0..bar_columns)
        .map(|j| -bay_width / 2.0 + (j as f32 + 0.5) * column_pitch)
        .collect();
    let rows = count(p.trash_bar_rows);
    let row_elevations = (0..rows)
        .map(|r| sill_elev + (r as f32 + 0.5) * opening_height / rows as f32)
        .collect();

    // gate between two guide rails
    let rail = GUIDE_RAIL_WIDTH.min(bay_width / 2.0);
    let gate_width = (bay_width - 2.0 * rail).max(0.0);
    let rail_offset = bay_width / 2.0 - rail / 2.0;

    // tunnels leave the downstream face with the axis on the floor line
    let tunnel_radius = non_negative("tunnel_diam", p.tunnel_diam) / 2.0;
    let tunnel_len = non_negative("tunnel_len", p.tunnel_len);
    let tunnel_slope = TUNNEL_SLOPE_DEG.to_radians();
    let tunnel_drop = tunnel_len * tunnel_slope.sin();
    let tunnel_center_y = floor_elev + tunnel_radius - tunnel_drop / 2.0;
    let tunnel_center_z = downstream_z + tunnel_len * tunnel_slope.cos() / 2.0;

    let downstream_ground_top = floor_elev - tunnel_drop - tunnel_radius;

    let crane_span = total_width + 2.0 * non_negative("crane_span_xpad", p.crane_span_xpad);
    let trolley_travel = (crane_span - 2.0 * CRANE_TRUCK_LENGTH - CRANE_TROLLEY_LENGTH).max(0.0);

    IntakeLayout {
        requested_bays: p.bay_count,
        bay_count,
        bay_width,
        pier_thick,
        bay_span,
        total_width,
        origin_x,
        centers,
        pier_centers,
        side_wall_thick,
        outer_width: total_width + 2.0 * side_wall_thick,
        struct_depth,
        upstream_z,
        downstream_z,
        face_thick,
        rack_z,
        gate_z,
        floor_elev,
        sill_elev,
        opening_height,
        opening_top,
        deck_top,
        deck_bottom,
        bar_thick,
        bar_columns,
        bar_offsets,
        requested_rows: p.trash_bar_rows,
        row_elevations,
        gate_width,
        gate_thick: non_negative("gate_thick", p.gate_thick),
        gate_lift: non_negative("gate_clear_top", p.gate_clear_top),
        rail_width: rail,
        rail_offsets: [-rail_offset, rail_offset],
        tunnel_radius,
        tunnel_len,
        tunnel_slope,
        tunnel_drop,
        tunnel_center_y,
        tunnel_center_z,
        apron_len: tunnel_len,
        water_elev_up: finite("water_elev_up", p.water_elev_up),
        downstream_ground_top,
        tailwater_elev: downstream_ground_top + TAILWATER_DEPTH,
        crane_gauge: non_negative("crane_gauge", p.crane_gauge),
        crane_span,
        trolley_travel,
        timeline: p.timeline,
    }
}

/// A computed layout for any component kind.
#[derive(Clone, Debug, PartialEq)]
pub enum LayoutPlan {
    Generator(GeneratorLayout),
    Turbine(TurbineLayout),
    Intake(IntakeLayout),
}

impl LayoutPlan {
    pub fn kind(&self) -> ComponentKind {
        match self {
            LayoutPlan::Generator(_) => ComponentKind::Generator,
            LayoutPlan::Turbine(_) => ComponentKind::Turbine,
            LayoutPlan::Intake(_) => ComponentKind::Intake,
        }
    }
}

/// Typed record, then layout. Only fails when the record lacks a key the kind needs.
pub fn compute_layout(kind: ComponentKind, record: &ParameterRecord) -> Result<LayoutPlan, GenerationError> {
    Ok(match kind {
        ComponentKind::Generator => LayoutPlan::Generator(compute_generator_layout(&GeneratorParams::from_record(record)?)),
        ComponentKind::Turbine => LayoutPlan::Turbine(compute_turbine_layout(&TurbineParams::from_record(record)?)),
        ComponentKind::Intake => LayoutPlan::Intake(compute_intake_layout(&IntakeParams::from_record(record)?)),
    })
}
