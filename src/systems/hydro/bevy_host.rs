// bevy side of the host interface
// spawns one mesh entity per primitive and plays motion tracks back on Update

use std::collections::HashMap;

use bevy::prelude::*;

use crate::config::*;
use crate::error::HostError;
use super::animation::{sample_track, Keyframe};
use super::host::{CameraPlacement, LightKind, LightPlacement, SceneHost};
use super::primitive::{MaterialRole, MaterialSpec, Placement, PrimitiveId};

/// Marks an entity spawned from a primitive descriptor.
#[derive(Component, Clone, Copy, Debug)]
pub struct HydroPrimitive(pub PrimitiveId);

/// Keyframes for one entity, in the frame of its parent's rest pose
/// (world space for roots).
#[derive(Component, Clone, Debug)]
pub struct MotionPlayback {
    pub keyframes: Vec<Keyframe>,
    pub cyclic: bool,
    pub reference: Option<GlobalTransform>,
}

impl MotionPlayback {
    pub fn local_transform(&self, frame: f32) -> Option<Transform> {
        let world = sample_track(&self.keyframes, self.cyclic, frame)?.to_transform();
        Some(match self.reference {
            Some(parent) => GlobalTransform::from(world).reparented_to(&parent),
            None => world,
        })
    }
}

/// Timeline position shared by every playing track.
#[derive(Resource)]
pub struct Playback {
    pub playing: bool,
    pub frame: f32,
}

impl Default for Playback {
    fn default() -> Self {
        Self { playing: true, frame: TIMELINE_FIRST_FRAME }
    }
}

pub fn advance_playback(time: Res<Time>, mut playback: ResMut<Playback>) {
    if playback.playing {
        playback.frame += time.delta_secs() * FRAMES_PER_SECOND;
    }
}

pub fn play_motion(playback: Res<Playback>, mut tracks: Query<(&MotionPlayback, &mut Transform)>) {
    for (track, mut transform) in &mut tracks {
        if let Some(local) = track.local_transform(playback.frame) {
            *transform = local;
        }
    }
}

fn material_of(spec: &MaterialSpec) -> StandardMaterial {
    let [r, g, b, a] = spec.base_color;
    StandardMaterial {
        base_color: Color::srgba(r, g, b, a),
        metallic: spec.metallic,
        perceptual_roughness: spec.roughness,
        alpha_mode: if spec.is_translucent() { AlphaMode::Blend } else { AlphaMode::Opaque },
        ..default()
    }
}

/// `SceneHost` over a bevy `Commands` queue. Borrowed for one submission.
pub struct BevyHost<'a, 'w, 's> {
    commands: &'a mut Commands<'w, 's>,
    meshes: &'a mut Assets<Mesh>,
    materials: &'a mut Assets<StandardMaterial>,
    material_handles: HashMap<MaterialRole, Handle<StandardMaterial>>,
    // entity and rest pose in world space
    spawned: HashMap<PrimitiveId, (Entity, Transform)>,
    parents: HashMap<PrimitiveId, PrimitiveId>,
    tracks: HashMap<PrimitiveId, MotionPlayback>,
}

impl<'a, 'w, 's> BevyHost<'a, 'w, 's> {
    pub fn new(
        commands: &'a mut Commands<'w, 's>,
        meshes: &'a mut Assets<Mesh>,
        materials: &'a mut Assets<StandardMaterial>,
    ) -> Self {
        Self {
            commands,
            meshes,
            materials,
            material_handles: HashMap::new(),
            spawned: HashMap::new(),
            parents: HashMap::new(),
            tracks: HashMap::new(),
        }
    }

    fn lookup(&self, id: PrimitiveId) -> Result<(Entity, Transform), HostError> {
        self.spawned.get(&id).copied().ok_or(HostError::UnknownPrimitive(id))
    }

    fn spawn_mesh(
        &mut self,
        id: PrimitiveId,
        name: &str,
        mesh: Mesh,
        placement: &Placement,
        role: MaterialRole,
    ) -> Result<(), HostError> {
        if self.spawned.contains_key(&id) {
            return Err(HostError::Rejected(format!("primitive {:?} created twice", id)));
        }
        let material = match self.material_handles.get(&role) {
            Some(handle) => handle.clone(),
            None => {
                warn!("no material defined for {:?}, using the default", role);
                let handle = self.materials.add(StandardMaterial::default());
                self.material_handles.insert(role, handle.clone());
                handle
            }
        };

        let transform = placement.to_transform();
        let entity = self.commands.spawn((
            Mesh3d(self.meshes.add(mesh)),
            MeshMaterial3d(material),
            transform,
            Name::new(name.to_string()),
            HydroPrimitive(id),
        )).id();
        self.spawned.insert(id, (entity, transform));
        Ok(())
    }
}

impl SceneHost for BevyHost<'_, '_, '_> {
    fn define_material(&mut self, role: MaterialRole, spec: &MaterialSpec) -> Result<(), HostError> {
        let handle = self.materials.add(material_of(spec));
        self.material_handles.insert(role, handle);
        Ok(())
    }

    fn create_box(&mut self, id: PrimitiveId, name: &str, size: Vec3, placement: &Placement, material: MaterialRole) -> Result<(), HostError> {
        self.spawn_mesh(id, name, Cuboid::new(size.x, size.y, size.z).into(), placement, material)
    }

    fn create_cylinder(&mut self, id: PrimitiveId, name: &str, radius: f32, depth: f32, segments: u32, placement: &Placement, material: MaterialRole) -> Result<(), HostError> {
        let mesh = Cylinder::new(radius, depth).mesh().resolution(segments).into();
        self.spawn_mesh(id, name, mesh, placement, material)
    }

    fn create_cone(&mut self, id: PrimitiveId, name: &str, radius_bottom: f32, radius_top: f32, depth: f32, segments: u32, placement: &Placement, material: MaterialRole) -> Result<(), HostError> {
        let frustum = ConicalFrustum { radius_top, radius_bottom, height: depth };
        self.spawn_mesh(id, name, frustum.mesh().resolution(segments).into(), placement, material)
    }

    fn create_torus(&mut self, id: PrimitiveId, name: &str, major_radius: f32, minor_radius: f32, placement: &Placement, material: MaterialRole) -> Result<(), HostError> {
        let torus = Torus { minor_radius, major_radius };
        self.spawn_mesh(id, name, torus.into(), placement, material)
    }

    // keeps the child where it is in world space
    fn set_parent(&mut self, child: PrimitiveId, parent: PrimitiveId) -> Result<(), HostError> {
        let (child_entity, child_world) = self.lookup(child)?;
        let (parent_entity, parent_world) = self.lookup(parent)?;

        let local = GlobalTransform::from(child_world).reparented_to(&GlobalTransform::from(parent_world));
        self.commands.entity(child_entity).insert(local);
        self.commands.entity(parent_entity).add_child(child_entity);
        self.parents.insert(child, parent);
        Ok(())
    }

    fn insert_keyframe(&mut self, target: PrimitiveId, keyframe: &Keyframe, cyclic: bool) -> Result<(), HostError> {
        let (entity, _) = self.lookup(target)?;
        let reference = match self.parents.get(&target) {
            Some(parent) => Some(GlobalTransform::from(self.lookup(*parent)?.1)),
            None => None,
        };

        let track = self.tracks.entry(target).or_insert_with(|| MotionPlayback {
            keyframes: Vec::new(),
            cyclic,
            reference,
        });
        track.keyframes.push(*keyframe);
        track.keyframes.sort_by_key(|k| k.frame);
        track.cyclic = cyclic;

        self.commands.entity(entity).insert(track.clone());
        Ok(())
    }

    fn place_camera(&mut self, camera: &CameraPlacement) -> Result<(), HostError> {
        self.commands.spawn((
            Camera3d::default(),
            Transform::from_translation(camera.position).looking_at(camera.target, Vec3::Y),
        ));
        Ok(())
    }

    fn place_light(&mut self, light: &LightPlacement) -> Result<(), HostError> {
        let transform = Transform::from_translation(light.position).looking_at(light.target, Vec3::Y);
        match light.kind {
            LightKind::Directional { illuminance } => {
                self.commands.spawn((
                    DirectionalLight {
                        illuminance,
                        shadows_enabled: true,
                        ..default()
                    },
                    transform,
                ));
            }
            // bevy has no area light, a wide soft point light stands in for it
            LightKind::Area { power } => {
                self.commands.spawn((
                    PointLight {
                        intensity: power * LUMENS_PER_WATT,
                        range: (light.position - light.target).length() * FILL_LIGHT_RANGE_FACTOR,
                        shadows_enabled: false,
                        ..default()
                    },
                    transform,
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn child_tracks_are_played_relative_to_the_parent_rest_pose() {
        let parent_rest = Transform::from_xyz(0.0, 5.0, 0.0);
        let track = MotionPlayback {
            keyframes: vec![
                Keyframe { frame: 1, pose: Placement::at(Vec3::new(1.0, 5.0, 0.0)) },
                Keyframe { frame: 11, pose: Placement::at(Vec3::new(3.0, 5.0, 0.0)) },
            ],
            cyclic: true,
            reference: Some(GlobalTransform::from(parent_rest)),
        };

        let local = track.local_transform(6.0).unwrap();
        assert!((local.translation - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn full_turn_passes_through_half_a_turn() {
        let track = MotionPlayback {
            keyframes: vec![
                Keyframe { frame: 1, pose: Placement::default() },
                Keyframe { frame: 101, pose: Placement::default().with_rotation(Vec3::Y * 2.0 * PI) },
            ],
            cyclic: true,
            reference: None,
        };

        let quarter = track.local_transform(26.0).unwrap();
        let expected = Quat::from_rotation_y(FRAC_PI_2);
        assert!(quarter.rotation.angle_between(expected) < 1e-4);
    }

    #[test]
    fn translucent_roles_blend() {
        let water = MaterialSpec { base_color: [0.1, 0.35, 0.95, 0.6], metallic: 0.0, roughness: 0.07 };
        assert!(matches!(material_of(&water).alpha_mode, AlphaMode::Blend));
        assert!(matches!(material_of(&MaterialSpec::new([1.0; 4])).alpha_mode, AlphaMode::Opaque));
    }
}
