use std::path::{Path, PathBuf};

use bevy::prelude::*;
use bevy::log::LogPlugin;
use bevy::window::{WindowPlugin, PrimaryWindow};
use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy_egui::EguiPlugin;
use clap::Parser;

pub mod config;
pub mod error;
pub mod systems;

#[cfg(test)]
pub mod test;

use crate::config::*;
use crate::error::ConfigError;

// import modules here
use systems::export::{handle_export, ExportEvent, ExportFinished};
use systems::hydro::params::{check_ranges, resolve, ComponentKind, ResolvePolicy};
use systems::hydro::scene::GenerationRequest;
use systems::hydro::{GenerationSettings, GenerationStatus, HeadlessPlugin, HydroPlugin};
use systems::ui::UIPlugin;

/// Parametric layout of hydropower plant components.
#[derive(Parser, Debug)]
#[command(name = "hydro_gen", version)]
struct Args {
    /// Request file: {"component": ..., "values": {...}, "export_folder": ...}
    config: PathBuf,

    /// Write the host command log to <export_folder>/<component>.json instead of opening a window
    #[arg(long)]
    headless: bool,

    /// Reject non-numeric parameter values instead of substituting 1
    #[arg(long)]
    strict: bool,
}

pub fn load_request(path: &Path) -> Result<GenerationRequest, ConfigError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    serde_json::from_str(&text)
        .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
}

fn main() -> bevy::app::AppExit {
    let args = Args::parse();

    // no logger yet, report straight to stderr
    let request = match load_request(&args.config) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("{}", e);
            return AppExit::error();
        }
    };
    let policy = if args.strict { ResolvePolicy::Strict } else { ResolvePolicy::Permissive };
    let settings = GenerationSettings { request, policy };

    if args.headless {
        run_headless(settings)
    } else {
        run_viewer(settings)
    }
}

// one pass without a window, the outcome decides the exit code
fn run_headless(settings: GenerationSettings) -> AppExit {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, LogPlugin::default()))
        .insert_resource(settings)
        .add_plugins(HeadlessPlugin)
        .add_systems(Startup, check_parameter_ranges);
    app.update();

    match app.world().resource::<GenerationStatus>().error {
        Some(_) => AppExit::error(),
        None => AppExit::Success,
    }
}

fn run_viewer(settings: GenerationSettings) -> AppExit {
    let title = format!("hydro_gen - {}", settings.request.component);
    let [r, g, b] = CLEAR_COLOR;

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title,
                mode: bevy::window::WindowMode::Windowed,
                resolution: bevy::window::WindowResolution::new(1920.0, 1080.0),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(EguiPlugin::default())
        .add_plugins(FrameTimeDiagnosticsPlugin::default())
        .insert_resource(settings)
        .add_event::<ExportEvent>()
        .add_event::<ExportFinished>()

        // my custom plugins
        .add_plugins(HydroPlugin)
        .add_plugins(UIPlugin)

        .insert_resource(ClearColor(Color::srgb(r, g, b))) // world color
        .insert_resource(AmbientLight {
            brightness: AMBIENT_BRIGHTNESS,
            ..default()
        })
        .add_systems(Startup, (check_parameter_ranges, maximize_window))
        .add_systems(Update, (handle_exit, handle_export))
        .run()
}

/// Keys outside their advised ranges, resolved under the same policy as the run.
/// `None` when the kind is unknown or the request does not resolve.
pub fn out_of_range_keys(request: &GenerationRequest, policy: ResolvePolicy) -> Option<Vec<&'static str>> {
    let kind = ComponentKind::parse(&request.component)?;
    let (record, _) = resolve(&request.values, kind.schema(), policy).ok()?;
    Some(check_ranges(&record, kind.schema()))
}

// advisory only, values outside the advised ranges are still used
fn check_parameter_ranges(settings: Res<GenerationSettings>) {
    let Some(flagged) = out_of_range_keys(&settings.request, settings.policy) else {
        return;
    };
    if !flagged.is_empty() {
        warn!("{} parameter(s) outside the advised ranges: {}", flagged.len(), flagged.join(", "));
    }
}

fn maximize_window(mut windows: Query<&mut Window, With<PrimaryWindow>>) {
    for mut window in windows.iter_mut() {
        window.set_maximized(true);
    }
}

// application exit
fn handle_exit(
    keys: Res<ButtonInput<KeyCode>>,
    mut exit: EventWriter<AppExit>,
) {
    if keys.just_pressed(KeyCode::Escape) {
        exit.write(AppExit::Success);
    }
}
