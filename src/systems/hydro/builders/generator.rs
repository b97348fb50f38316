// generator: five coaxial cylinders, rotor and shaft spin

use bevy::prelude::*;

use crate::config::*;
use crate::systems::hydro::animation::{FrameSpan, MotionKind};
use crate::systems::hydro::layout::GeneratorLayout;
use crate::systems::hydro::primitive::{MaterialPalette, MaterialRole, Placement, Shape};

use super::Assembly;

fn cylinder(radius: f32, depth: f32) -> Shape {
    Shape::Cylinder { radius, depth, segments: DEFAULT_SEGMENTS }
}

pub fn build(layout: &GeneratorLayout, palette: &MaterialPalette) -> Assembly {
    let mut assembly = Assembly::new(palette);
    let spin = FrameSpan::new(ROTATION_FRAME_START, ROTATION_FRAME_END);

    assembly.push(
        "Base",
        "base",
        cylinder(layout.base_radius, layout.base_height),
        Placement::at(Vec3::Y * GEN_BASE_ELEV),
        MaterialRole::Base,
    );
    assembly.push(
        "Stator",
        "stator",
        cylinder(layout.stator_radius, layout.stator_height),
        Placement::at(Vec3::Y * GEN_STATOR_ELEV),
        MaterialRole::Stator,
    );
    let rotor = assembly.push(
        "Rotor",
        "rotor",
        cylinder(layout.rotor_radius, layout.rotor_height),
        Placement::at(Vec3::Y * GEN_ROTOR_ELEV),
        MaterialRole::Rotor,
    );
    let shaft = assembly.push(
        "Shaft",
        "shaft",
        cylinder(layout.shaft_radius, layout.shaft_height),
        Placement::at(Vec3::Y * GEN_SHAFT_ELEV),
        MaterialRole::Shaft,
    );
    assembly.push(
        "Exciter",
        "exciter",
        cylinder(GEN_EXCITER_RADIUS, GEN_EXCITER_DEPTH),
        Placement::at(Vec3::Y * GEN_EXCITER_ELEV),
        MaterialRole::Exciter,
    );

    assembly.animate(rotor, MotionKind::Rotation, spin);
    assembly.animate(shaft, MotionKind::Rotation, spin);

    assembly
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::hydro::params::GeneratorParams;
    use crate::systems::hydro::layout::compute_generator_layout;

    fn layout() -> GeneratorLayout {
        compute_generator_layout(&GeneratorParams {
            stator_radius: 5.0,
            stator_height: 3.0,
            rotor_radius: 3.0,
            rotor_height: 2.0,
            shaft_radius: 0.5,
            shaft_height: 8.0,
            base_radius: 7.0,
            base_height: 1.0,
        })
    }

    #[test]
    fn stack_has_five_parts_and_two_spinners() {
        let assembly = build(&layout(), &MaterialPalette::default());
        let names: Vec<_> = assembly.primitives.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Base", "Stator", "Rotor", "Shaft", "Exciter"]);

        let targets: Vec<_> = assembly.clips.iter().map(|c| assembly.primitives[c.target.0].name.as_str()).collect();
        assert_eq!(targets, vec!["Rotor", "Shaft"]);
        assert!(assembly.clips.iter().all(|c| c.kind == MotionKind::Rotation && c.cyclic));
    }

    #[test]
    fn stator_takes_its_size_from_the_layout() {
        let assembly = build(&layout(), &MaterialPalette::default());
        let stator = &assembly.primitives[1];
        assert_eq!(stator.shape, Shape::Cylinder { radius: 5.0, depth: 3.0, segments: DEFAULT_SEGMENTS });
        assert_eq!(stator.placement.translation, Vec3::new(0.0, 2.0, 0.0));
    }
}
