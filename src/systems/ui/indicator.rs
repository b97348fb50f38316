use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::config::EXPORT_TOAST_SECONDS;
use crate::systems::export::ExportFinished;

// fading banner after an export
#[derive(Resource)]
pub struct ExportToast {
    pub message: String,
    pub success: bool,
    pub timer: f32,
    pub duration: f32,
}

impl Default for ExportToast {
    fn default() -> Self {
        Self {
            message: String::new(),
            success: true,
            timer: 0.0,
            duration: EXPORT_TOAST_SECONDS,
        }
    }
}

impl ExportToast {
    pub fn show(&mut self, finished: &ExportFinished) {
        (self.message, self.success) = match &finished.result {
            Ok((path, count)) => (format!("EXPORTED {} MESHES TO {}", count, path.display()), true),
            Err(e) => (format!("EXPORT FAILED: {}", e), false),
        };
        self.timer = self.duration;
    }

    pub fn tick(&mut self, dt: f32) {
        self.timer = (self.timer - dt).max(0.0);
    }

    pub fn alpha(&self) -> f32 {
        (self.timer / self.duration).clamp(0.0, 1.0)
    }
}

pub fn update_export_toast(
    mut toast: ResMut<ExportToast>,
    mut events: EventReader<ExportFinished>,
    time: Res<Time>,
) {
    for event in events.read() {
        toast.show(event);
    }
    toast.tick(time.delta_secs());
}

pub fn render_export_toast(
    toast: Res<ExportToast>,
    mut contexts: EguiContexts,
) {
    if toast.timer <= 0.0 {
        return;
    }

    if let Ok(ctx) = contexts.ctx_mut() {
        let alpha = toast.alpha();
        let bg_color = if toast.success {
            egui::Color32::from_rgb(50, 91, 34)
        } else {
            egui::Color32::from_rgb(130, 22, 22)
        };

        egui::Area::new(egui::Id::new("export_toast"))
            .anchor(egui::Align2::CENTER_TOP, egui::vec2(0.0, 60.0))
            .show(ctx, |ui| {
                let frame = egui::Frame::new()
                    .fill(egui::Color32::from_rgba_unmultiplied(
                        bg_color.r(), bg_color.g(), bg_color.b(),
                        (200.0 * alpha) as u8
                    ))
                    .stroke(egui::Stroke::new(
                        1.5,
                        egui::Color32::from_rgba_unmultiplied(255, 255, 255, (180.0 * alpha) as u8)
                    ))
                    .inner_margin(egui::Margin::symmetric(12, 6))
                    .corner_radius(egui::CornerRadius::same(6));

                frame.show(ui, |ui| {
                    ui.label(egui::RichText::new(&toast.message)
                        .size(14.0)
                        .color(egui::Color32::from_rgba_unmultiplied(255, 255, 255, (255.0 * alpha) as u8))
                        .strong());
                });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn toast_fades_out() {
        let mut toast = ExportToast::default();
        toast.show(&ExportFinished { result: Ok((PathBuf::from("out/intake.obj"), 42)) });
        assert!(toast.success);
        assert_eq!(toast.alpha(), 1.0);

        toast.tick(toast.duration / 2.0);
        assert!((toast.alpha() - 0.5).abs() < 1e-5);

        toast.tick(100.0);
        assert_eq!(toast.timer, 0.0);
    }

    #[test]
    fn failures_are_flagged() {
        let mut toast = ExportToast::default();
        toast.show(&ExportFinished { result: Err("disk full".into()) });
        assert!(!toast.success);
        assert!(toast.message.contains("disk full"));
    }
}
