// host capability interface
// the only way the core reaches an engine, every call reports its own failure

use std::collections::HashSet;

use bevy::prelude::*;
use serde::Serialize;

use crate::error::HostError;
use super::animation::Keyframe;
use super::primitive::{MaterialRole, MaterialSpec, Placement, PrimitiveDescriptor, PrimitiveId, Shape};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPlacement {
    pub position: Vec3,
    pub target: Vec3,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LightKind {
    /// Parallel key light, lux.
    Directional { illuminance: f32 },
    /// Soft fill light, watts.
    Area { power: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightPlacement {
    pub kind: LightKind,
    pub position: Vec3,
    pub target: Vec3,
}

/// Closed set of operations a host engine must provide.
pub trait SceneHost {
    fn define_material(&mut self, role: MaterialRole, spec: &MaterialSpec) -> Result<(), HostError>;

    fn create_box(
        &mut self,
        id: PrimitiveId,
        name: &str,
        size: Vec3,
        placement: &Placement,
        material: MaterialRole,
    ) -> Result<(), HostError>;

    fn create_cylinder(
        &mut self,
        id: PrimitiveId,
        name: &str,
        radius: f32,
        depth: f32,
        segments: u32,
        placement: &Placement,
        material: MaterialRole,
    ) -> Result<(), HostError>;

    fn create_cone(
        &mut self,
        id: PrimitiveId,
        name: &str,
        radius_bottom: f32,
        radius_top: f32,
        depth: f32,
        segments: u32,
        placement: &Placement,
        material: MaterialRole,
    ) -> Result<(), HostError>;

    fn create_torus(
        &mut self,
        id: PrimitiveId,
        name: &str,
        major_radius: f32,
        minor_radius: f32,
        placement: &Placement,
        material: MaterialRole,
    ) -> Result<(), HostError>;

    fn set_parent(&mut self, child: PrimitiveId, parent: PrimitiveId) -> Result<(), HostError>;

    fn insert_keyframe(&mut self, target: PrimitiveId, keyframe: &Keyframe, cyclic: bool) -> Result<(), HostError>;

    fn place_camera(&mut self, camera: &CameraPlacement) -> Result<(), HostError>;

    fn place_light(&mut self, light: &LightPlacement) -> Result<(), HostError>;

    /// Dispatches a descriptor to the matching create call.
    fn create(&mut self, id: PrimitiveId, descriptor: &PrimitiveDescriptor) -> Result<(), HostError> {
        let name = descriptor.name.as_str();
        let placement = &descriptor.placement;
        let material = descriptor.material;
        match descriptor.shape {
            Shape::Box { size } => self.create_box(id, name, size, placement, material),
            Shape::Cylinder { radius, depth, segments } => {
                self.create_cylinder(id, name, radius, depth, segments, placement, material)
            }
            Shape::Cone { radius_bottom, radius_top, depth, segments } => {
                self.create_cone(id, name, radius_bottom, radius_top, depth, segments, placement, material)
            }
            Shape::Torus { major_radius, minor_radius } => {
                self.create_torus(id, name, major_radius, minor_radius, placement, material)
            }
        }
    }
}

// serializable command log

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PoseRecord {
    pub translation: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
}

impl From<&Placement> for PoseRecord {
    fn from(p: &Placement) -> Self {
        Self {
            translation: p.translation.to_array(),
            rotation: p.rotation.to_array(),
            scale: p.scale.to_array(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum HostCommand {
    DefineMaterial { role: MaterialRole, spec: MaterialSpec },
    CreateBox { id: PrimitiveId, name: String, size: [f32; 3], pose: PoseRecord, material: MaterialRole },
    CreateCylinder { id: PrimitiveId, name: String, radius: f32, depth: f32, segments: u32, pose: PoseRecord, material: MaterialRole },
    CreateCone { id: PrimitiveId, name: String, radius_bottom: f32, radius_top: f32, depth: f32, segments: u32, pose: PoseRecord, material: MaterialRole },
    CreateTorus { id: PrimitiveId, name: String, major_radius: f32, minor_radius: f32, pose: PoseRecord, material: MaterialRole },
    SetParent { child: PrimitiveId, parent: PrimitiveId },
    InsertKeyframe { target: PrimitiveId, frame: u32, pose: PoseRecord, cyclic: bool },
    PlaceCamera { position: [f32; 3], target: [f32; 3] },
    PlaceLight { kind: LightKind, position: [f32; 3], target: [f32; 3] },
}

/// Host that only writes down what it was asked to do.
/// Links and keyframes against primitives it never created are rejected.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub commands: Vec<HostCommand>,
    created: HashSet<PrimitiveId>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn known(&self, id: PrimitiveId) -> Result<(), HostError> {
        if self.created.contains(&id) {
            Ok(())
        } else {
            Err(HostError::UnknownPrimitive(id))
        }
    }

    fn created(&mut self, id: PrimitiveId, command: HostCommand) -> Result<(), HostError> {
        if !self.created.insert(id) {
            return Err(HostError::Rejected(format!("primitive {:?} created twice", id)));
        }
        self.commands.push(command);
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.commands)
    }
}

impl SceneHost for RecordingHost {
    fn define_material(&mut self, role: MaterialRole, spec: &MaterialSpec) -> Result<(), HostError> {
        self.commands.push(HostCommand::DefineMaterial { role, spec: *spec });
        Ok(())
    }

    fn create_box(&mut self, id: PrimitiveId, name: &str, size: Vec3, placement: &Placement, material: MaterialRole) -> Result<(), HostError> {
        self.created(id, HostCommand::CreateBox {
            id,
            name: name.to_string(),
            size: size.to_array(),
            pose: placement.into(),
            material,
        })
    }

    fn create_cylinder(&mut self, id: PrimitiveId, name: &str, radius: f32, depth: f32, segments: u32, placement: &Placement, material: MaterialRole) -> Result<(), HostError> {
        self.created(id, HostCommand::CreateCylinder {
            id,
            name: name.to_string(),
            radius,
            depth,
            segments,
            pose: placement.into(),
            material,
        })
    }

    fn create_cone(&mut self, id: PrimitiveId, name: &str, radius_bottom: f32, radius_top: f32, depth: f32, segments: u32, placement: &Placement, material: MaterialRole) -> Result<(), HostError> {
        self.created(id, HostCommand::CreateCone {
            id,
            name: name.to_string(),
            radius_bottom,
            radius_top,
            depth,
            segments,
            pose: placement.into(),
            material,
        })
    }

    fn create_torus(&mut self, id: PrimitiveId, name: &str, major_radius: f32, minor_radius: f32, placement: &Placement, material: MaterialRole) -> Result<(), HostError> {
        self.created(id, HostCommand::CreateTorus {
            id,
            name: name.to_string(),
            major_radius,
            minor_radius,
            pose: placement.into(),
            material,
        })
    }

    fn set_parent(&mut self, child: PrimitiveId, parent: PrimitiveId) -> Result<(), HostError> {
        self.known(child)?;
        self.known(parent)?;
        self.commands.push(HostCommand::SetParent { child, parent });
        Ok(())
    }

    fn insert_keyframe(&mut self, target: PrimitiveId, keyframe: &Keyframe, cyclic: bool) -> Result<(), HostError> {
        self.known(target)?;
        self.commands.push(HostCommand::InsertKeyframe {
            target,
            frame: keyframe.frame,
            pose: (&keyframe.pose).into(),
            cyclic,
        });
        Ok(())
    }

    fn place_camera(&mut self, camera: &CameraPlacement) -> Result<(), HostError> {
        self.commands.push(HostCommand::PlaceCamera {
            position: camera.position.to_array(),
            target: camera.target.to_array(),
        });
        Ok(())
    }

    fn place_light(&mut self, light: &LightPlacement) -> Result<(), HostError> {
        self.commands.push(HostCommand::PlaceLight {
            kind: light.kind,
            position: light.position.to_array(),
            target: light.target.to_array(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parenting_an_unknown_primitive_is_rejected() {
        let mut host = RecordingHost::new();
        host.create_box(PrimitiveId(0), "a", Vec3::ONE, &Placement::default(), MaterialRole::Concrete).unwrap();

        assert_eq!(
            host.set_parent(PrimitiveId(0), PrimitiveId(7)),
            Err(HostError::UnknownPrimitive(PrimitiveId(7)))
        );
        assert_eq!(host.commands.len(), 1);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut host = RecordingHost::new();
        host.create_torus(PrimitiveId(3), "t", 4.0, 0.8, &Placement::default(), MaterialRole::SpiralCasing).unwrap();
        let again = host.create_torus(PrimitiveId(3), "t", 4.0, 0.8, &Placement::default(), MaterialRole::SpiralCasing);
        assert!(matches!(again, Err(HostError::Rejected(_))));
    }

    #[test]
    fn commands_serialize_with_an_op_tag() {
        let mut host = RecordingHost::new();
        host.place_camera(&CameraPlacement { position: Vec3::new(1.0, 2.0, 3.0), target: Vec3::ZERO }).unwrap();

        let json: serde_json::Value = serde_json::from_str(&host.to_json().unwrap()).unwrap();
        assert_eq!(json[0]["op"], "place_camera");
        assert_eq!(json[0]["position"][2], 3.0);
    }
}
