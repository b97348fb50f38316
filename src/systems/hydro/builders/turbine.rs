// turbine: spiral casing, two vane rings, runner with blades on a spinning shaft,
// draft tube below

use bevy::prelude::*;

use crate::config::*;
use crate::systems::hydro::animation::{FrameSpan, MotionKind};
use crate::systems::hydro::layout::{Ring, TurbineLayout};
use crate::systems::hydro::primitive::{MaterialPalette, MaterialRole, Placement, PrimitiveId, Shape};

use super::Assembly;

// vanes stand on a ring, local +X turned to point away from the axis
fn vane_ring(
    assembly: &mut Assembly,
    ring: &Ring,
    group: &'static str,
    label: &str,
    size: f32,
    scale: [f32; 3],
) {
    for (i, &angle) in ring.angles.iter().enumerate() {
        assembly.push(
            format!("{}_{}", label, i),
            group,
            Shape::Box { size: Vec3::splat(size) },
            Placement::at(ring.position(angle, VANE_ELEV))
                .with_rotation(Vec3::Y * angle)
                .with_scale(Vec3::from_array(scale)),
            MaterialRole::Vanes,
        );
    }
    assembly.record_group(group, ring.requested, ring.angles.len());
}

pub fn build(layout: &TurbineLayout, palette: &MaterialPalette) -> Assembly {
    let mut assembly = Assembly::new(palette);

    assembly.push(
        "SpiralCasing",
        "spiral_casing",
        Shape::Torus {
            major_radius: layout.spiral_major_radius,
            minor_radius: layout.spiral_minor_radius,
        },
        Placement::at(Vec3::Y * SPIRAL_ELEV),
        MaterialRole::SpiralCasing,
    );

    vane_ring(&mut assembly, &layout.stay_vanes, "stay_vanes", "StayVane", STAY_VANE_SIZE, STAY_VANE_SCALE);
    vane_ring(&mut assembly, &layout.guide_vanes, "guide_vanes", "GuideVane", GUIDE_VANE_SIZE, GUIDE_VANE_SCALE);

    let runner = assembly.push(
        "Runner",
        "runner",
        Shape::Cylinder {
            radius: layout.runner_radius,
            depth: layout.runner_depth,
            segments: RUNNER_SEGMENTS,
        },
        Placement::at(Vec3::Y * RUNNER_ELEV),
        MaterialRole::Runner,
    );

    let blades: Vec<PrimitiveId> = layout.blades.angles.iter().enumerate()
        .map(|(i, &angle)| {
            assembly.push(
                format!("Blade_{}", i),
                "blades",
                Shape::Cylinder {
                    radius: layout.blade_radius,
                    depth: layout.blade_depth,
                    segments: DEFAULT_SEGMENTS,
                },
                Placement::at(layout.blades.position(angle, RUNNER_ELEV)).with_rotation(Vec3::Y * angle),
                MaterialRole::Runner,
            )
        })
        .collect();
    for &blade in &blades {
        assembly.attach(blade, runner);
    }
    assembly.record_group("blades", layout.blades.requested, blades.len());

    // the shaft comes after the runner, links are by index so order does not matter
    let shaft = assembly.push(
        "Shaft",
        "shaft",
        Shape::Cylinder {
            radius: layout.shaft_radius,
            depth: layout.shaft_height,
            segments: DEFAULT_SEGMENTS,
        },
        Placement::at(Vec3::Y * TURBINE_SHAFT_ELEV),
        MaterialRole::Shaft,
    );
    assembly.attach(runner, shaft);

    assembly.push(
        "DraftTube",
        "draft_tube",
        Shape::Cone {
            radius_bottom: layout.draft_radius_bottom,
            radius_top: layout.draft_radius_top,
            depth: layout.draft_depth,
            segments: DEFAULT_SEGMENTS,
        },
        Placement::at(Vec3::Y * DRAFT_TUBE_ELEV),
        MaterialRole::DraftTube,
    );

    assembly.animate(
        shaft,
        MotionKind::Rotation,
        FrameSpan::new(ROTATION_FRAME_START, ROTATION_FRAME_END),
    );

    assembly
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::hydro::builders::parents_form_forest;
    use crate::systems::hydro::layout::compute_turbine_layout;
    use crate::systems::hydro::params::TurbineParams;

    fn params() -> TurbineParams {
        TurbineParams {
            spiral_major_radius: 4.0,
            spiral_minor_radius: 0.8,
            stay_vane_count: 12,
            guide_vane_count: 16,
            runner_radius: 1.5,
            runner_depth: 1.0,
            blade_count: 6,
            blade_radius: 0.3,
            blade_depth: 0.4,
            shaft_radius: 0.4,
            shaft_height: 6.0,
            draft_radius1: 1.2,
            draft_radius2: 2.0,
            draft_depth: 3.0,
        }
    }

    #[test]
    fn default_turbine_group_sizes() {
        let assembly = build(&compute_turbine_layout(&params()), &MaterialPalette::default());
        assert_eq!(assembly.group("stay_vanes").count(), 12);
        assert_eq!(assembly.group("guide_vanes").count(), 16);
        assert_eq!(assembly.group("blades").count(), 6);
        // casing, runner, shaft, draft tube
        assert_eq!(assembly.primitives.len(), 12 + 16 + 6 + 4);
        assert_eq!(assembly.clips.len(), 1);
    }

    #[test]
    fn blades_hang_off_the_runner_which_hangs_off_the_shaft() {
        let assembly = build(&compute_turbine_layout(&params()), &MaterialPalette::default());
        let runner = assembly.primitives.iter().position(|p| p.name == "Runner").unwrap();
        let shaft = assembly.primitives.iter().position(|p| p.name == "Shaft").unwrap();

        assert!(shaft > runner);
        assert_eq!(assembly.primitives[runner].parent, Some(PrimitiveId(shaft)));
        assert!(assembly.group("blades").all(|b| b.parent == Some(PrimitiveId(runner))));
        assert!(parents_form_forest(&assembly.primitives));
        assert_eq!(assembly.clips[0].target, PrimitiveId(shaft));
    }

    #[test]
    fn zero_blades_leave_the_rest_alone() {
        let layout = compute_turbine_layout(&TurbineParams { blade_count: 0, ..params() });
        let assembly = build(&layout, &MaterialPalette::default());

        assert_eq!(assembly.group("blades").count(), 0);
        assert_eq!(assembly.group("stay_vanes").count(), 12);
        assert_eq!(assembly.group("guide_vanes").count(), 16);
        assert!(assembly.summary("blades").unwrap().is_skipped());
    }

    #[test]
    fn draft_tube_radius1_is_the_base() {
        let assembly = build(&compute_turbine_layout(&params()), &MaterialPalette::default());
        let tube = assembly.group("draft_tube").next().unwrap();
        assert_eq!(
            tube.shape,
            Shape::Cone { radius_bottom: 1.2, radius_top: 2.0, depth: 3.0, segments: DEFAULT_SEGMENTS }
        );
    }

    #[test]
    fn vanes_point_away_from_the_axis() {
        let assembly = build(&compute_turbine_layout(&params()), &MaterialPalette::default());
        for vane in assembly.group("stay_vanes") {
            let outward = vane.placement.quat() * Vec3::X;
            let radial = (vane.placement.translation * Vec3::new(1.0, 0.0, 1.0)).normalize();
            assert!(outward.dot(radial) > 0.999);
            assert!((Vec2::new(vane.placement.translation.x, vane.placement.translation.z).length() - STAY_VANE_CIRCLE).abs() < 1e-4);
        }
    }
}
