// scene composition
// resolve -> layout -> build -> frame, then an ordered walk over a host

use std::collections::BTreeSet;
use std::path::PathBuf;

use bevy::math::bounding::{Aabb3d, BoundingVolume};
use bevy::prelude::*;
use serde::Deserialize;

use crate::config::*;
use crate::error::{GenerationError, HostError, SubmitError};
use super::animation::MotionClip;
use super::builders::{build, GroupSummary};
use super::host::{CameraPlacement, LightKind, LightPlacement, SceneHost};
use super::layout::compute_layout;
use super::params::{resolve, ComponentKind, RawParams, ResolutionReport, ResolvePolicy};
use super::primitive::{MaterialPalette, PrimitiveDescriptor, PrimitiveId};

fn default_export_folder() -> PathBuf {
    PathBuf::from(".")
}

/// One generation request, as written by the parameter-entry front end.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GenerationRequest {
    pub component: String,
    #[serde(default)]
    pub values: RawParams,
    #[serde(default = "default_export_folder")]
    pub export_folder: PathBuf,
}

impl GenerationRequest {
    pub fn new(component: impl Into<String>, values: RawParams) -> Self {
        Self {
            component: component.into(),
            values,
            export_folder: default_export_folder(),
        }
    }
}

/// Everything one request produced, ready to be handed to a host.
#[derive(Clone, Debug)]
pub struct Scene {
    /// Component name as requested, recognized or not.
    pub component: String,
    pub kind: Option<ComponentKind>,
    pub primitives: Vec<PrimitiveDescriptor>,
    pub clips: Vec<MotionClip>,
    pub groups: Vec<GroupSummary>,
    pub report: ResolutionReport,
    /// Recovered problems: fallbacks, skipped groups, unknown kind.
    pub notes: Vec<String>,
    pub camera: CameraPlacement,
    pub lights: Vec<LightPlacement>,
    pub palette: MaterialPalette,
}

impl Scene {
    fn empty(component: &str, palette: &MaterialPalette) -> Self {
        let (camera, lights) = default_framing();
        Self {
            component: component.to_string(),
            kind: None,
            primitives: Vec::new(),
            clips: Vec::new(),
            groups: Vec::new(),
            report: ResolutionReport::default(),
            notes: Vec::new(),
            camera,
            lights,
            palette: palette.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Materializes the scene on `host`: materials, creations in index order,
    /// parent links, keyframes, camera, lights. Stops at the first failure.
    /// Returns the number of commands issued.
    pub fn submit<H: SceneHost + ?Sized>(&self, host: &mut H) -> Result<usize, SubmitError> {
        let mut issued = 0;

        let used: BTreeSet<_> = self.primitives.iter().map(|p| p.material).collect();
        for (role, spec) in self.palette.iter().filter(|(role, _)| used.contains(role)) {
            issue(&mut issued, "define_material", host.define_material(role, spec))?;
        }

        for (i, descriptor) in self.primitives.iter().enumerate() {
            issue(&mut issued, descriptor.shape.kind_name(), host.create(PrimitiveId(i), descriptor))?;
        }

        for (i, descriptor) in self.primitives.iter().enumerate() {
            if let Some(parent) = descriptor.parent {
                issue(&mut issued, "set_parent", host.set_parent(PrimitiveId(i), parent))?;
            }
        }

        for clip in &self.clips {
            for keyframe in clip.keyframes() {
                issue(&mut issued, "insert_keyframe", host.insert_keyframe(clip.target, &keyframe, clip.cyclic))?;
            }
        }

        issue(&mut issued, "place_camera", host.place_camera(&self.camera))?;
        for light in &self.lights {
            issue(&mut issued, "place_light", host.place_light(light))?;
        }

        debug!("submitted {} host commands for {}", issued, self.component);
        Ok(issued)
    }
}

fn issue(issued: &mut usize, command: &'static str, result: Result<(), HostError>) -> Result<(), SubmitError> {
    let index = *issued;
    *issued += 1;
    result.map_err(|source| {
        error!("host command #{} ({}) failed: {}", index, command, source);
        SubmitError { index, command, source }
    })
}

pub fn compose(request: &GenerationRequest, policy: ResolvePolicy) -> Result<Scene, GenerationError> {
    compose_with_palette(request, policy, &MaterialPalette::default())
}

pub fn compose_with_palette(
    request: &GenerationRequest,
    policy: ResolvePolicy,
    palette: &MaterialPalette,
) -> Result<Scene, GenerationError> {
    let Some(kind) = ComponentKind::parse(&request.component) else {
        warn!("unknown component kind {:?}, nothing to build", request.component);
        let mut scene = Scene::empty(&request.component, palette);
        scene.notes.push(format!("unknown component kind {:?}", request.component));
        return Ok(scene);
    };

    let (record, report) = resolve(&request.values, kind.schema(), policy)?;
    let plan = compute_layout(kind, &record)?;
    let assembly = build(&plan, palette);

    let mut notes: Vec<String> = report.fallbacks()
        .map(|(key, raw)| format!("`{}` = {:?} is not numeric, used 1", key, raw))
        .collect();
    notes.extend(
        assembly.groups.iter()
            .filter(|g| g.is_skipped())
            .map(|g| format!("group `{}` is empty (requested {})", g.name, g.requested)),
    );

    let (camera, lights) = frame(&assembly.primitives);

    info!(
        "composed {}: {} primitives, {} clips, {} defaults applied",
        kind,
        assembly.primitives.len(),
        assembly.clips.len(),
        report.defaulted().count()
    );

    Ok(Scene {
        component: request.component.clone(),
        kind: Some(kind),
        primitives: assembly.primitives,
        clips: assembly.clips,
        groups: assembly.groups,
        report,
        notes,
        camera,
        lights,
        palette: palette.clone(),
    })
}

// framing

/// Union of every primitive's world bounds, `None` for an empty slice.
pub fn scene_bounds(primitives: &[PrimitiveDescriptor]) -> Option<Aabb3d> {
    primitives.iter()
        .map(PrimitiveDescriptor::world_bounds)
        .reduce(|a, b| a.merge(&b))
}

/// Camera distance for a scene whose largest extent is `max_dim`.
pub fn framing_distance(max_dim: f32) -> f32 {
    if max_dim < FRAMING_SMALL_LIMIT {
        max_dim * FRAMING_SMALL_FACTOR
    } else {
        max_dim * FRAMING_LARGE_FACTOR
    }
}

fn default_framing() -> (CameraPlacement, Vec<LightPlacement>) {
    let camera = CameraPlacement {
        position: Vec3::from_array(DEFAULT_CAMERA_POSITION),
        target: Vec3::ZERO,
    };
    let key = LightPlacement {
        kind: LightKind::Directional { illuminance: KEY_LIGHT_ILLUMINANCE },
        position: Vec3::from_array(KEY_LIGHT_DIRECTION).normalize() * camera.position.length(),
        target: Vec3::ZERO,
    };
    (camera, vec![key])
}

/// Camera on a fixed diagonal looking at the bounds center, a key and a fill light.
pub fn frame(primitives: &[PrimitiveDescriptor]) -> (CameraPlacement, Vec<LightPlacement>) {
    let Some(bounds) = scene_bounds(primitives) else {
        return default_framing();
    };
    let center = Vec3::from(bounds.center());
    let max_dim = Vec3::from(bounds.max - bounds.min).max_element();
    if !(max_dim > 0.0) || !max_dim.is_finite() {
        return default_framing();
    }
    let distance = framing_distance(max_dim);

    let camera = CameraPlacement {
        position: center + Vec3::from_array(CAMERA_DIRECTION).normalize() * distance,
        target: center,
    };
    let lights = vec![
        LightPlacement {
            kind: LightKind::Directional { illuminance: KEY_LIGHT_ILLUMINANCE },
            position: center + Vec3::from_array(KEY_LIGHT_DIRECTION).normalize() * distance,
            target: center,
        },
        LightPlacement {
            kind: LightKind::Area { power: FILL_LIGHT_POWER },
            position: center + Vec3::from_array(FILL_LIGHT_DIRECTION).normalize() * distance,
            target: center,
        },
    ];
    (camera, lights)
}
