// primitive descriptors, the unit of output handed to a scene host

use std::collections::BTreeMap;

use bevy::math::bounding::Aabb3d;
use bevy::prelude::*;
use serde::Serialize;

/// Stable index of a primitive within one generation pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PrimitiveId(pub usize);

/// Location, XYZ Euler rotation (radians) and scale.
///
/// Rotation is kept as Euler angles instead of a quaternion so that keyframes
/// can express a full turn (0 and 2π are the same quaternion).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub translation: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Placement {
    fn default() -> Self {
        Self { translation: Vec3::ZERO, rotation: Vec3::ZERO, scale: Vec3::ONE }
    }
}

impl Placement {
    pub fn at(translation: Vec3) -> Self {
        Self { translation, ..default() }
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Rotation applied about X, then Y, then Z (fixed axes).
    pub fn quat(&self) -> Quat {
        Quat::from_rotation_z(self.rotation.z)
            * Quat::from_rotation_y(self.rotation.y)
            * Quat::from_rotation_x(self.rotation.x)
    }

    pub fn to_transform(&self) -> Transform {
        Transform {
            translation: self.translation,
            rotation: self.quat(),
            scale: self.scale,
        }
    }

    /// Linear blend of every channel, rotation included (no shortest-path wrapping).
    pub fn lerp(&self, other: &Placement, t: f32) -> Placement {
        Placement {
            translation: self.translation.lerp(other.translation, t),
            rotation: self.rotation.lerp(other.rotation, t),
            scale: self.scale.lerp(other.scale, t),
        }
    }
}

/// Primitive kinds a host must be able to create. Cylinders, cones and tori
/// are built around the vertical (Y) axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    Box { size: Vec3 },
    Cylinder { radius: f32, depth: f32, segments: u32 },
    Cone { radius_bottom: f32, radius_top: f32, depth: f32, segments: u32 },
    Torus { major_radius: f32, minor_radius: f32 },
}

impl Shape {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Shape::Box { .. } => "box",
            Shape::Cylinder { .. } => "cylinder",
            Shape::Cone { .. } => "cone",
            Shape::Torus { .. } => "torus",
        }
    }

    /// Half extents of the unscaled, unrotated shape.
    pub fn half_extents(&self) -> Vec3 {
        match *self {
            Shape::Box { size } => size * 0.5,
            Shape::Cylinder { radius, depth, .. } => Vec3::new(radius, depth * 0.5, radius),
            Shape::Cone { radius_bottom, radius_top, depth, .. } => {
                let r = radius_bottom.max(radius_top);
                Vec3::new(r, depth * 0.5, r)
            }
            Shape::Torus { major_radius, minor_radius } => {
                let r = major_radius + minor_radius;
                Vec3::new(r, minor_radius, r)
            }
        }
    }
}

/// Material roles. Descriptors carry a role, never a color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialRole {
    Concrete,
    Steel,
    Rack,
    Water,
    Deck,
    Crane,
    Soil,
    Rotor,
    Stator,
    Exciter,
    Shaft,
    Base,
    SpiralCasing,
    Vanes,
    Runner,
    DraftTube,
}

impl MaterialRole {
    /// Role to use when a palette has no entry for this one.
    pub fn fallback(self) -> Option<MaterialRole> {
        match self {
            MaterialRole::Rack | MaterialRole::Crane | MaterialRole::Shaft => Some(MaterialRole::Steel),
            MaterialRole::Deck | MaterialRole::Base => Some(MaterialRole::Concrete),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MaterialSpec {
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
}

impl MaterialSpec {
    pub const fn new(base_color: [f32; 4]) -> Self {
        Self { base_color, metallic: 0.4, roughness: 0.3 }
    }

    pub fn is_translucent(&self) -> bool {
        self.base_color[3] < 1.0
    }
}

/// Role to material table, resolved once per request and handed to every builder.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialPalette {
    entries: BTreeMap<MaterialRole, MaterialSpec>,
}

impl Default for MaterialPalette {
    fn default() -> Self {
        let entries = [
            (MaterialRole::Concrete, MaterialSpec::new([0.7, 0.7, 0.7, 1.0])),
            (MaterialRole::Steel, MaterialSpec { base_color: [0.45, 0.47, 0.5, 1.0], metallic: 0.9, roughness: 0.35 }),
            (MaterialRole::Rack, MaterialSpec { base_color: [0.25, 0.27, 0.3, 1.0], metallic: 0.8, roughness: 0.5 }),
            (MaterialRole::Water, MaterialSpec { base_color: [0.1, 0.35, 0.95, 0.6], metallic: 0.0, roughness: 0.07 }),
            (MaterialRole::Deck, MaterialSpec::new([0.6, 0.6, 0.58, 1.0])),
            (MaterialRole::Crane, MaterialSpec { base_color: [0.95, 0.75, 0.1, 1.0], metallic: 0.6, roughness: 0.4 }),
            (MaterialRole::Soil, MaterialSpec { base_color: [0.36, 0.3, 0.2, 1.0], metallic: 0.0, roughness: 0.9 }),
            (MaterialRole::Rotor, MaterialSpec::new([1.0, 0.0, 0.0, 1.0])),
            (MaterialRole::Stator, MaterialSpec::new([0.0, 0.2, 1.0, 1.0])),
            (MaterialRole::Exciter, MaterialSpec::new([1.0, 0.8, 0.0, 1.0])),
            (MaterialRole::Shaft, MaterialSpec::new([0.4, 0.4, 0.4, 1.0])),
            (MaterialRole::Base, MaterialSpec::new([0.2, 0.6, 0.2, 1.0])),
            (MaterialRole::SpiralCasing, MaterialSpec::new([0.6, 0.2, 0.2, 1.0])),
            (MaterialRole::Vanes, MaterialSpec::new([0.2, 0.4, 1.0, 1.0])),
            (MaterialRole::Runner, MaterialSpec::new([0.9, 0.7, 0.2, 1.0])),
            (MaterialRole::DraftTube, MaterialSpec::new([0.3, 0.8, 0.3, 1.0])),
        ];
        Self { entries: entries.into_iter().collect() }
    }
}

impl MaterialPalette {
    pub fn empty() -> Self {
        Self { entries: BTreeMap::new() }
    }

    pub fn with(mut self, role: MaterialRole, spec: MaterialSpec) -> Self {
        self.entries.insert(role, spec);
        self
    }

    /// The role a primitive should be tagged with: the requested one if the
    /// palette defines it, otherwise its fallback chain, otherwise itself.
    pub fn tag(&self, role: MaterialRole) -> MaterialRole {
        let mut current = role;
        loop {
            if self.entries.contains_key(&current) {
                return current;
            }
            match current.fallback() {
                Some(next) => current = next,
                None => return role,
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (MaterialRole, &MaterialSpec)> {
        self.entries.iter().map(|(role, spec)| (*role, spec))
    }
}

/// One emitted shape instruction. Never mutated after emission.
#[derive(Clone, Debug, PartialEq)]
pub struct PrimitiveDescriptor {
    pub name: String,
    pub group: &'static str,
    pub shape: Shape,
    /// World-space placement, independent of `parent`.
    pub placement: Placement,
    pub material: MaterialRole,
    pub parent: Option<PrimitiveId>,
}

impl PrimitiveDescriptor {
    /// Axis-aligned world bounds of the placed shape.
    pub fn world_bounds(&self) -> Aabb3d {
        let half = self.shape.half_extents() * self.placement.scale.abs();
        let rotation = self.placement.quat();
        let center = self.placement.translation;

        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for sx in [-1.0, 1.0] {
            for sy in [-1.0, 1.0] {
                for sz in [-1.0, 1.0] {
                    let corner = center + rotation * (half * Vec3::new(sx, sy, sz));
                    min = min.min(corner);
                    max = max.max(corner);
                }
            }
        }

        Aabb3d { min: min.into(), max: max.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn quarter_turn_about_x_lays_a_cylinder_along_z() {
        let descriptor = PrimitiveDescriptor {
            name: "tunnel".into(),
            group: "tunnels",
            shape: Shape::Cylinder { radius: 1.0, depth: 10.0, segments: 32 },
            placement: Placement::at(Vec3::ZERO).with_rotation(Vec3::new(FRAC_PI_2, 0.0, 0.0)),
            material: MaterialRole::Concrete,
            parent: None,
        };
        let bounds = descriptor.world_bounds();
        assert!((bounds.max.z - 5.0).abs() < 1e-4);
        assert!((bounds.max.y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn scale_stretches_bounds() {
        let descriptor = PrimitiveDescriptor {
            name: "vane".into(),
            group: "stay_vanes",
            shape: Shape::Box { size: Vec3::splat(0.3) },
            placement: Placement::at(Vec3::new(1.0, 2.0, 3.0)).with_scale(Vec3::new(0.2, 1.5, 1.0)),
            material: MaterialRole::Vanes,
            parent: None,
        };
        let bounds = descriptor.world_bounds();
        assert!((bounds.max.y - (2.0 + 0.225)).abs() < 1e-5);
        assert!((bounds.min.x - (1.0 - 0.03)).abs() < 1e-5);
    }

    #[test]
    fn palette_falls_back_along_role_chain() {
        let palette = MaterialPalette::empty()
            .with(MaterialRole::Steel, MaterialSpec::new([0.5, 0.5, 0.5, 1.0]));
        assert_eq!(palette.tag(MaterialRole::Rack), MaterialRole::Steel);
        assert_eq!(palette.tag(MaterialRole::Water), MaterialRole::Water);
        assert_eq!(MaterialPalette::default().tag(MaterialRole::Rack), MaterialRole::Rack);
    }
}
