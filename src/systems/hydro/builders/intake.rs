// intake structure
// per-bay members are placed from layout.centers only, structure-wide members
// from the layout totals

use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;

use crate::config::*;
use crate::systems::hydro::animation::{FrameSpan, MotionKind};
use crate::systems::hydro::layout::IntakeLayout;
use crate::systems::hydro::primitive::{MaterialPalette, MaterialRole, Placement, Shape};

use super::Assembly;

fn block(x: f32, y: f32, z: f32) -> Shape {
    Shape::Box { size: Vec3::new(x, y, z) }
}

pub fn build(layout: &IntakeLayout, palette: &MaterialPalette) -> Assembly {
    let mut assembly = Assembly::new(palette);

    bays(&mut assembly, layout);
    shell(&mut assembly, layout);
    surroundings(&mut assembly, layout);
    crane(&mut assembly, layout);

    assembly
}

fn bays(assembly: &mut Assembly, l: &IntakeLayout) {
    let t = &l.timeline;
    let sill_height = (l.sill_elev - l.floor_elev).max(MIN_MEMBER_THICK);
    let rail_height = l.deck_bottom - l.sill_elev;
    let opening_mid = l.sill_elev + l.opening_height / 2.0;

    for (b, &cx) in l.centers.iter().enumerate() {
        assembly.push(
            format!("BayFrame_{}", b),
            "bay_frames",
            block(l.bay_width, sill_height, l.struct_depth),
            Placement::at(Vec3::new(cx, l.floor_elev + sill_height / 2.0, 0.0)),
            MaterialRole::Concrete,
        );

        // trash rack, vertical bars with horizontal rows just behind them
        for (j, &offset) in l.bar_offsets.iter().enumerate() {
            assembly.push(
                format!("TrashBar_{}_{}", b, j),
                "trash_bars",
                block(l.bar_thick, l.opening_height, l.bar_thick),
                Placement::at(Vec3::new(cx + offset, opening_mid, l.rack_z)),
                MaterialRole::Rack,
            );
        }
        for (r, &y) in l.row_elevations.iter().enumerate() {
            assembly.push(
                format!("TrashRow_{}_{}", b, r),
                "trash_rows",
                block(l.bay_width, l.bar_thick, l.bar_thick),
                Placement::at(Vec3::new(cx, y, l.rack_z + l.bar_thick)),
                MaterialRole::Rack,
            );
        }

        let gate = assembly.push(
            format!("Gate_{}", b),
            "gates",
            block(l.gate_width, l.opening_height, l.gate_thick),
            Placement::at(Vec3::new(cx, opening_mid, l.gate_z)),
            MaterialRole::Steel,
        );
        assembly.animate(
            gate,
            MotionKind::Translation { delta: Vec3::Y * l.gate_lift },
            FrameSpan::new(t.start, t.gate_up),
        );

        for (side, &offset) in l.rail_offsets.iter().enumerate() {
            assembly.push(
                format!("GuideRail_{}_{}", b, side),
                "guide_rails",
                block(l.rail_width, rail_height, l.gate_thick + 2.0 * GUIDE_RAIL_DEPTH_PAD),
                Placement::at(Vec3::new(cx + offset, l.sill_elev + rail_height / 2.0, l.gate_z)),
                MaterialRole::Steel,
            );
        }

        assembly.push(
            format!("Tunnel_{}", b),
            "tunnels",
            Shape::Cylinder {
                radius: l.tunnel_radius,
                depth: l.tunnel_len,
                segments: TUNNEL_SEGMENTS,
            },
            Placement::at(Vec3::new(cx, l.tunnel_center_y, l.tunnel_center_z))
                .with_rotation(Vec3::X * (FRAC_PI_2 + l.tunnel_slope)),
            MaterialRole::Concrete,
        );

        let flow = assembly.push(
            format!("Flow_{}", b),
            "flow_planes",
            block(l.bay_width * FLOW_PLANE_WIDTH_RATIO, FLOW_PLANE_THICK, FLOW_PLANE_LENGTH),
            Placement::at(Vec3::new(
                cx,
                l.sill_elev + FLOW_PLANE_LIFT,
                l.upstream_z + FLOW_PLANE_LENGTH / 2.0,
            )),
            MaterialRole::Water,
        );
        assembly.animate(
            flow,
            MotionKind::Translation { delta: Vec3::Z * l.struct_depth * 0.5 },
            FrameSpan::new(t.start, t.end),
        );
    }

    assembly.record_group("bays", l.requested_bays, l.centers.len());
    assembly.record_group("trash_rows", l.requested_rows, l.row_elevations.len());
}

// piers, walls, slabs
fn shell(assembly: &mut Assembly, l: &IntakeLayout) {
    let wall_height = l.deck_bottom - l.floor_elev;
    let wall_mid = l.floor_elev + wall_height / 2.0;

    for (i, &x) in l.pier_centers.iter().enumerate() {
        assembly.push(
            format!("Pier_{}", i),
            "piers",
            block(l.pier_thick, wall_height, l.struct_depth),
            Placement::at(Vec3::new(x, wall_mid, 0.0)),
            MaterialRole::Concrete,
        );
    }
    let requested_piers = if l.requested_bays > 0 { l.requested_bays + 1 } else { 0 };
    assembly.record_group("piers", requested_piers, l.pier_centers.len());

    for (i, sign) in [-1.0, 1.0].into_iter().enumerate() {
        assembly.push(
            format!("SideWall_{}", i),
            "side_walls",
            block(l.side_wall_thick, wall_height, l.struct_depth),
            Placement::at(Vec3::new(sign * (l.total_width + l.side_wall_thick) / 2.0, wall_mid, 0.0)),
            MaterialRole::Concrete,
        );
    }

    let curtain = l.deck_bottom - l.opening_top;
    assembly.push(
        "FaceWall",
        "face_wall",
        block(l.total_width, curtain, l.face_thick),
        Placement::at(Vec3::new(0.0, l.opening_top + curtain / 2.0, l.upstream_z + l.face_thick / 2.0)),
        MaterialRole::Concrete,
    );

    let slab_width = l.outer_width + 2.0 * OUTER_SHELL_THICK;
    assembly.push(
        "FloorSlab",
        "floor_slab",
        block(slab_width, FLOOR_SLAB_THICK, l.struct_depth),
        Placement::at(Vec3::new(0.0, l.floor_elev - FLOOR_SLAB_THICK / 2.0, 0.0)),
        MaterialRole::Concrete,
    );

    assembly.push(
        "Deck",
        "deck",
        block(l.outer_width, l.face_thick, l.struct_depth),
        Placement::at(Vec3::new(0.0, l.deck_bottom + l.face_thick / 2.0, 0.0)),
        MaterialRole::Deck,
    );

    // thin skins outside the side walls, slab bottom to deck top
    let shell_bottom = l.floor_elev - FLOOR_SLAB_THICK;
    let shell_height = l.deck_top - shell_bottom;
    for (i, sign) in [-1.0, 1.0].into_iter().enumerate() {
        assembly.push(
            format!("OuterShell_{}", i),
            "outer_shells",
            block(OUTER_SHELL_THICK, shell_height, l.struct_depth),
            Placement::at(Vec3::new(
                sign * (l.outer_width + OUTER_SHELL_THICK) / 2.0,
                shell_bottom + shell_height / 2.0,
                0.0,
            )),
            MaterialRole::Concrete,
        );
    }

    assembly.push(
        "Parapet",
        "parapet",
        block(slab_width, PARAPET_HEIGHT, PARAPET_THICK),
        Placement::at(Vec3::new(
            0.0,
            l.deck_top + PARAPET_HEIGHT / 2.0,
            l.upstream_z + PARAPET_THICK / 2.0,
        )),
        MaterialRole::Concrete,
    );
}

// ground and water on both sides of the structure
fn surroundings(assembly: &mut Assembly, l: &IntakeLayout) {
    let t = &l.timeline;
    let width = l.outer_width + 2.0 * OUTER_SHELL_THICK;
    let upstream_mid = l.upstream_z - l.apron_len / 2.0;
    let downstream_mid = l.downstream_z + l.apron_len / 2.0;

    assembly.push(
        "GroundUpstream",
        "ground",
        block(width, GROUND_THICK, l.apron_len),
        Placement::at(Vec3::new(0.0, l.floor_elev - GROUND_THICK / 2.0, upstream_mid)),
        MaterialRole::Soil,
    );
    let headwater = assembly.push(
        "WaterUpstream",
        "water",
        block(width, WATER_PLANE_THICK, l.apron_len),
        Placement::at(Vec3::new(0.0, l.water_elev_up - WATER_PLANE_THICK / 2.0, upstream_mid)),
        MaterialRole::Water,
    );
    assembly.animate(
        headwater,
        MotionKind::Translation { delta: Vec3::Y * RIPPLE_AMPLITUDE },
        FrameSpan::new(t.start, t.end),
    );

    assembly.push(
        "GroundDownstream",
        "ground",
        block(width, GROUND_THICK, l.apron_len),
        Placement::at(Vec3::new(0.0, l.downstream_ground_top - GROUND_THICK / 2.0, downstream_mid)),
        MaterialRole::Soil,
    );
    assembly.push(
        "WaterDownstream",
        "water",
        block(width, WATER_PLANE_THICK, l.apron_len),
        Placement::at(Vec3::new(0.0, l.tailwater_elev - WATER_PLANE_THICK / 2.0, downstream_mid)),
        MaterialRole::Water,
    );
}

// gantry crane over the gate slots, the trolley carries the hoist
fn crane(assembly: &mut Assembly, l: &IntakeLayout) {
    let t = &l.timeline;
    let span = l.crane_span;
    let gauge = l.crane_gauge;
    let rail_top = l.deck_top + CRANE_RAIL_SIZE;
    let bridge_bottom = rail_top + CRANE_CLEARANCE;
    let bridge_top = bridge_bottom + CRANE_BRIDGE_DEPTH;

    for (i, sign) in [-1.0, 1.0].into_iter().enumerate() {
        assembly.push(
            format!("CraneRail_{}", i),
            "crane_rails",
            block(span, CRANE_RAIL_SIZE, CRANE_RAIL_SIZE),
            Placement::at(Vec3::new(0.0, l.deck_top + CRANE_RAIL_SIZE / 2.0, l.gate_z + sign * gauge / 2.0)),
            MaterialRole::Crane,
        );
    }
    for (i, sign) in [-1.0, 1.0].into_iter().enumerate() {
        assembly.push(
            format!("CraneTruck_{}", i),
            "crane_trucks",
            block(CRANE_TRUCK_LENGTH, CRANE_CLEARANCE, gauge + CRANE_RAIL_SIZE),
            Placement::at(Vec3::new(
                sign * (span - CRANE_TRUCK_LENGTH) / 2.0,
                rail_top + CRANE_CLEARANCE / 2.0,
                l.gate_z,
            )),
            MaterialRole::Crane,
        );
    }

    assembly.push(
        "CraneBridge",
        "crane_bridge",
        block(span, CRANE_BRIDGE_DEPTH, gauge * 0.5),
        Placement::at(Vec3::new(0.0, bridge_bottom + CRANE_BRIDGE_DEPTH / 2.0, l.gate_z)),
        MaterialRole::Crane,
    );

    let trolley_x = -span / 2.0 + CRANE_TRUCK_LENGTH + CRANE_TROLLEY_LENGTH / 2.0;
    let trolley = assembly.push(
        "CraneTrolley",
        "crane_trolley",
        block(CRANE_TROLLEY_LENGTH, CRANE_TROLLEY_HEIGHT, gauge * 0.5),
        Placement::at(Vec3::new(trolley_x, bridge_top + CRANE_TROLLEY_HEIGHT / 2.0, l.gate_z)),
        MaterialRole::Crane,
    );

    let rope = assembly.push(
        "HookRope",
        "crane_hoist",
        Shape::Cylinder {
            radius: CRANE_ROPE_RADIUS,
            depth: CRANE_HOOK_DROP,
            segments: DEFAULT_SEGMENTS,
        },
        Placement::at(Vec3::new(trolley_x, bridge_bottom - CRANE_HOOK_DROP / 2.0, l.gate_z)),
        MaterialRole::Steel,
    );
    let spreader = assembly.push(
        "Spreader",
        "crane_hoist",
        block(l.gate_width, CRANE_SPREADER_HEIGHT, l.gate_thick * 2.0),
        Placement::at(Vec3::new(
            trolley_x,
            bridge_bottom - CRANE_HOOK_DROP - CRANE_SPREADER_HEIGHT / 2.0,
            l.gate_z,
        )),
        MaterialRole::Crane,
    );
    assembly.attach(rope, trolley);
    assembly.attach(spreader, trolley);

    assembly.animate(
        trolley,
        MotionKind::Translation { delta: Vec3::X * l.trolley_travel },
        FrameSpan::new(t.trolley_1, t.trolley_2),
    );
}
