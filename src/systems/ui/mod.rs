use bevy::prelude::*;
use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin}; // fps
use bevy_egui::{egui, EguiContexts, EguiPlugin, EguiPrimaryContextPass};

use crate::systems::export::{obj_path, ExportEvent};
use crate::systems::hydro::bevy_host::Playback;
use crate::systems::hydro::params::ParamOutcome;
use crate::systems::hydro::{output_stem, GeneratedScene, GenerationSettings, GenerationStatus};

pub mod indicator;

pub use indicator::{render_export_toast, update_export_toast, ExportToast};

pub struct UIPlugin;

impl Plugin for UIPlugin {
    fn build(&self, app: &mut App) {
        assert!(app.is_plugin_added::<EguiPlugin>());
        app
            .insert_resource(ExportToast::default())
            .add_systems(Update, (key_input, update_export_toast))
            .add_systems(EguiPrimaryContextPass, (ui_main, fps, render_export_toast)); // UI rendering here
    }
}

fn key_input(
    keyboard_input: Res<ButtonInput<KeyCode>>,
    mut playback: ResMut<Playback>,
) {
    if keyboard_input.just_pressed(KeyCode::Space) {
        playback.playing = !playback.playing;
    }
}

// read-only report, parameters are edited in the config file
fn ui_main(
    mut contexts: EguiContexts,
    settings: Res<GenerationSettings>,
    status: Res<GenerationStatus>,
    scene: Option<Res<GeneratedScene>>,
    mut playback: ResMut<Playback>,
    mut export_events: EventWriter<ExportEvent>,
) {
    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };

    egui::SidePanel::left("report_panel")
        .default_width(260.0)
        .min_width(220.0)
        .max_width(420.0)
        .resizable(true)
        .show(ctx, |ui| {
            ui.heading(format!("Component: {}", settings.request.component));

            if let Some(error) = &status.error {
                ui.label(egui::RichText::new(error).color(egui::Color32::from_rgb(178, 34, 34)));
            }

            let Some(scene) = scene else {
                return;
            };
            let scene = &scene.0;

            if scene.is_empty() {
                ui.label(egui::RichText::new("Nothing generated").color(egui::Color32::GRAY));
            } else {
                ui.label(format!("{} primitives, {} clips", scene.primitives.len(), scene.clips.len()));
            }
            ui.separator();

            // playback
            ui.horizontal(|ui| {
                let label = if playback.playing { "Pause" } else { "Play" };
                if ui.button(label).on_hover_text("SPACE").clicked() {
                    playback.playing = !playback.playing;
                }
                ui.label(format!("frame {:.0}", playback.frame));
            });

            ui.separator();

            egui::CollapsingHeader::new("Parameters")
                .default_open(true)
                .show(ui, |ui| {
                    egui::Grid::new("parameter_grid").striped(true).show(ui, |ui| {
                        for (key, outcome) in &scene.report.entries {
                            ui.label(*key);
                            let (text, color) = match outcome {
                                ParamOutcome::Supplied => ("supplied".to_string(), egui::Color32::from_rgb(34, 139, 34)),
                                ParamOutcome::Defaulted => ("default".to_string(), egui::Color32::GRAY),
                                ParamOutcome::Fallback { raw } => (format!("{:?} -> 1", raw), egui::Color32::from_rgb(178, 34, 34)),
                            };
                            ui.label(egui::RichText::new(text).color(color));
                            ui.end_row();
                        }
                    });
                });

            if !scene.groups.is_empty() {
                egui::CollapsingHeader::new("Groups")
                    .default_open(true)
                    .show(ui, |ui| {
                        for group in &scene.groups {
                            ui.label(format!("{}: {} of {}", group.name, group.emitted, group.requested));
                        }
                    });
            }

            if !scene.notes.is_empty() {
                egui::CollapsingHeader::new("Notes")
                    .default_open(true)
                    .show(ui, |ui| {
                        for note in &scene.notes {
                            ui.label(note);
                        }
                    });
            }

            ui.separator();

            let path = obj_path(&settings.request.export_folder, output_stem(scene));
            if ui.button("Export OBJ")
                .on_hover_text(format!("Writes {}", path.display()))
                .clicked() {
                export_events.write(ExportEvent { path });
            }

            ui.separator();
            ui.label("ESC - Exit");
        });
}

fn fps(
    mut contexts: EguiContexts,
    diagnostics: Res<DiagnosticsStore>,
) {
    if let Ok(ctx) = contexts.ctx_mut() {
        egui::Area::new(egui::Id::new("fps_counter"))
            .anchor(egui::Align2::RIGHT_TOP, egui::Vec2::new(-10.0, 10.0))
            .show(ctx, |ui| {
                ui.with_layout(egui::Layout::top_down(egui::Align::RIGHT), |ui| {
                    if let Some(fps_diagnostic) = diagnostics.get(&FrameTimeDiagnosticsPlugin::FPS) {
                        if let Some(fps) = fps_diagnostic.smoothed() {
                            ui.label(egui::RichText::new(format!("{:.0}", fps))
                                .size(26.0)
                                .color(egui::Color32::WHITE));
                        }
                    }
                });
            });
    }
}
