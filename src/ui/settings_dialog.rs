use bevy::prelude::*;
use bevy_egui::{EguiContexts, egui};

use crate::config::{AppConfig, SetServerUrlRequest};
use crate::pipeline::Backend;

/// State for the settings dialog
#[derive(Resource, Default)]
pub struct SettingsDialogState {
    /// Set by the toolbar; the dialog loads the config on the next frame
    pub open: bool,
    is_showing: bool,
    server_url: String,
}

impl SettingsDialogState {
    fn load_from_config(&mut self, config: &AppConfig) {
        self.server_url = config.data.server_url.clone();
    }

    fn has_changes(&self, config: &AppConfig) -> bool {
        self.server_url.trim() != config.data.server_url
    }
}

/// Renders the settings dialog
pub fn settings_dialog_ui(
    mut contexts: EguiContexts,
    mut dialog_state: ResMut<SettingsDialogState>,
    config: Res<AppConfig>,
    backend: Res<Backend>,
    mut server_events: MessageWriter<SetServerUrlRequest>,
) -> Result {
    if !dialog_state.open {
        dialog_state.is_showing = false;
        return Ok(());
    }
    if !dialog_state.is_showing {
        dialog_state.is_showing = true;
        dialog_state.load_from_config(&config);
    }

    let mut should_close = false;
    let mut should_save = false;

    egui::Window::new("Settings")
        .collapsible(false)
        .resizable(false)
        .min_width(380.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.group(|ui| {
                ui.label(egui::RichText::new("Pipeline server").strong());
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    ui.label("URL:");
                    ui.add(
                        egui::TextEdit::singleline(&mut dialog_state.server_url)
                            .desired_width(280.0)
                            .hint_text(crate::config::DEFAULT_SERVER_URL),
                    );
                });
                ui.label(
                    egui::RichText::new(format!("Connected to {}", backend.base_url()))
                        .weak()
                        .small(),
                );
            });

            ui.add_space(8.0);

            ui.group(|ui| {
                ui.label(egui::RichText::new("Session").strong());
                ui.add_space(4.0);
                ui.label(format!("Undo depth: {}", config.data.history_capacity));
                ui.label(
                    egui::RichText::new("Read from the config file at startup")
                        .weak()
                        .small(),
                );
                let last = config.data.last_paper.as_deref().unwrap_or("none");
                ui.label(format!("Last paper: {}", last));
                ui.label(
                    egui::RichText::new(config.config_path.to_string_lossy())
                        .weak()
                        .small(),
                );
            });

            ui.add_space(12.0);
            ui.horizontal(|ui| {
                let can_save = !dialog_state.server_url.trim().is_empty()
                    && dialog_state.has_changes(&config);
                if ui.add_enabled(can_save, egui::Button::new("Save")).clicked() {
                    should_save = true;
                    should_close = true;
                }
                if ui.button("Cancel").clicked() {
                    should_close = true;
                }
            });
        });

    if should_save {
        server_events.write(SetServerUrlRequest {
            url: dialog_state.server_url.trim().to_string(),
        });
    }
    if should_close {
        dialog_state.open = false;
    }
    Ok(())
}
