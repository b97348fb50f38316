// this is the entry point for the hydro component generation plugin
use std::fs;
use std::path::{Path, PathBuf};

use bevy::prelude::*;

use crate::error::ExportError;

pub mod animation;
pub mod bevy_host;
pub mod builders;
pub mod host;
pub mod layout;
pub mod params;
pub mod primitive;
pub mod scene;

use bevy_host::{advance_playback, play_motion, BevyHost, Playback};
use host::RecordingHost;
use params::ResolvePolicy;
use scene::{compose, GenerationRequest, Scene};

// resources
#[derive(Resource, Clone, Debug)]
pub struct GenerationSettings {
    pub request: GenerationRequest,
    pub policy: ResolvePolicy,
}

#[derive(Resource)]
pub struct GeneratedScene(pub Scene);

// outcome of the startup pass, read by the ui and by main in headless mode
#[derive(Resource, Default, Debug)]
pub struct GenerationStatus {
    pub error: Option<String>,
    pub written: Option<PathBuf>,
}

// windowed mode: compose once, materialize through bevy, play clips back
pub struct HydroPlugin;

impl Plugin for HydroPlugin {
    fn build(&self, app: &mut App) {
        app
            .init_resource::<Playback>()
            .init_resource::<GenerationStatus>()
            .add_systems(Startup, generate_scene)
            .add_systems(Update, (advance_playback, play_motion).chain());
    }
}

// headless mode: compose once and write the host command log
pub struct HeadlessPlugin;

impl Plugin for HeadlessPlugin {
    fn build(&self, app: &mut App) {
        app
            .init_resource::<GenerationStatus>()
            .add_systems(Startup, record_scene);
    }
}

/// File name stem for anything written for this scene.
pub fn output_stem(scene: &Scene) -> &'static str {
    scene.kind.map(|kind| kind.name()).unwrap_or("unknown")
}

/// Submits `scene` to a recording host and writes the commands as
/// `<folder>/<component>.json`.
pub fn write_command_log(scene: &Scene, folder: &Path) -> Result<PathBuf, ExportError> {
    let mut host = RecordingHost::new();
    scene.submit(&mut host)?;
    let json = host.to_json()?;

    let path = folder.join(format!("{}.json", output_stem(scene)));
    fs::create_dir_all(folder).map_err(|source| ExportError::Io { path: folder.to_path_buf(), source })?;
    fs::write(&path, json).map_err(|source| ExportError::Io { path: path.clone(), source })?;
    Ok(path)
}

fn generate_scene(
    mut commands: Commands,
    settings: Res<GenerationSettings>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut status: ResMut<GenerationStatus>,
) {
    let scene = match compose(&settings.request, settings.policy) {
        Ok(scene) => scene,
        Err(e) => {
            error!("generation failed: {}", e);
            status.error = Some(e.to_string());
            return;
        }
    };

    {
        let mut host = BevyHost::new(&mut commands, &mut meshes, &mut materials);
        if let Err(e) = scene.submit(&mut host) {
            status.error = Some(e.to_string());
        }
    }

    for note in &scene.notes {
        info!("note: {}", note);
    }
    commands.insert_resource(GeneratedScene(scene));
}

fn record_scene(settings: Res<GenerationSettings>, mut status: ResMut<GenerationStatus>) {
    let result = compose(&settings.request, settings.policy)
        .map_err(|e| e.to_string())
        .and_then(|scene| {
            write_command_log(&scene, &settings.request.export_folder).map_err(|e| e.to_string())
        });

    match result {
        Ok(path) => {
            info!("wrote {:?}", path);
            status.written = Some(path);
        }
        Err(e) => {
            error!("headless generation failed: {}", e);
            status.error = Some(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::hydro::params::RawParams;

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("hydro_gen_{}_{}", name, std::process::id()))
    }

    #[test]
    fn command_log_is_named_after_the_component() {
        let folder = scratch_dir("log");
        let request = GenerationRequest::new("intake_structure", RawParams::new());
        let scene = compose(&request, ResolvePolicy::Permissive).unwrap();

        let path = write_command_log(&scene, &folder).unwrap();
        assert_eq!(path.file_name().unwrap(), "intake.json");

        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let ops = json.as_array().unwrap();
        assert_eq!(ops.last().unwrap()["op"], "place_light");

        fs::remove_dir_all(&folder).ok();
    }

    #[test]
    fn headless_app_records_one_pass() {
        let folder = scratch_dir("headless");
        let mut request = GenerationRequest::new("generator", RawParams::new());
        request.export_folder = folder.clone();

        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(GenerationSettings { request, policy: ResolvePolicy::Permissive })
            .add_plugins(HeadlessPlugin);
        app.update();

        let status = app.world().resource::<GenerationStatus>();
        assert!(status.error.is_none());
        assert_eq!(status.written.as_deref(), Some(folder.join("generator.json").as_path()));

        fs::remove_dir_all(&folder).ok();
    }
}
