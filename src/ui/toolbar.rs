use bevy::prelude::*;
use bevy_egui::{EguiContexts, egui};

use crate::document::{CurrentDocument, DocumentIo, LoadPageRequest, SaveLayoutRequest, UndoRequest};
use crate::editor::rendering::to_color32;
use crate::editor::{Annotator, PageNavigation};
use crate::model::RegionType;
use crate::pipeline::PipelineState;

use super::identity_field::IdentityField;
use super::settings_dialog::SettingsDialogState;

#[derive(Resource, Default)]
pub struct ToolbarState {
    pub pending_id: IdentityField,
}

enum ToolbarAction {
    SetMode(Option<RegionType>),
    SetPendingId(u32),
    ToggleRole,
    Navigate(PageNavigation),
    Undo,
    Save,
    OpenSettings,
}

fn tool_button(ui: &mut egui::Ui, label: String, color: egui::Color32, selected: bool) -> bool {
    let button = egui::Button::new(egui::RichText::new(label).size(14.0).strong().color(color))
        .min_size(egui::vec2(0.0, 28.0))
        .selected(selected);
    ui.add(button).clicked()
}

/// Main toolbar: region tools, pending identity, page navigation, undo/save
#[allow(clippy::too_many_arguments)]
pub fn toolbar_ui(
    mut contexts: EguiContexts,
    mut annotator: ResMut<Annotator>,
    document: Res<CurrentDocument>,
    io: Res<DocumentIo>,
    pipeline: Res<PipelineState>,
    mut state: ResMut<ToolbarState>,
    mut settings: ResMut<SettingsDialogState>,
    mut page_events: MessageWriter<LoadPageRequest>,
    mut undo_events: MessageWriter<UndoRequest>,
    mut save_events: MessageWriter<SaveLayoutRequest>,
) -> Result {
    let active = annotator.tools().active();
    let pending_role = annotator.tools().pending_role();
    state.pending_id.sync(annotator.tools().pending_id());

    let mut actions = Vec::new();
    egui::TopBottomPanel::top("main_toolbar")
        .frame(
            egui::Frame::side_top_panel(&contexts.ctx_mut()?.style())
                .inner_margin(egui::Margin::symmetric(12, 8)),
        )
        .show(contexts.ctx_mut()?, |ui| {
            ui.horizontal(|ui| {
                ui.spacing_mut().item_spacing.x = 4.0;

                let text_color = ui.visuals().text_color();
                if tool_button(ui, "Select".to_string(), text_color, active.is_none()) {
                    actions.push(ToolbarAction::SetMode(None));
                }
                for (index, region) in RegionType::all().iter().enumerate() {
                    let label = format!("{} {}", index + 1, region.display_name());
                    if tool_button(ui, label, to_color32(region.color(), 1.0), active == Some(*region))
                    {
                        actions.push(ToolbarAction::SetMode(Some(*region)));
                    }
                }

                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);

                ui.add_enabled_ui(active.is_some(), |ui| {
                    ui.label("Next id:");
                    if let Some(id) = state.pending_id.show(ui, 36.0) {
                        actions.push(ToolbarAction::SetPendingId(id));
                    }
                    let caption_capable = active.is_some_and(|region| region.supports_caption());
                    if ui
                        .add_enabled(
                            caption_capable,
                            egui::Button::new(pending_role.display_name()),
                        )
                        .on_hover_text("Toggle body/caption (C)")
                        .clicked()
                    {
                        actions.push(ToolbarAction::ToggleRole);
                    }
                });

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Settings").clicked() {
                        actions.push(ToolbarAction::OpenSettings);
                    }

                    let save_label = if document.is_dirty() { "Save*" } else { "Save" };
                    if ui
                        .add_enabled(
                            document.paper().is_some() && !io.saving,
                            egui::Button::new(save_label),
                        )
                        .on_hover_text("Ctrl+S")
                        .clicked()
                    {
                        actions.push(ToolbarAction::Save);
                    }
                    if ui
                        .add_enabled(document.can_undo(), egui::Button::new("Undo"))
                        .on_hover_text("Ctrl+Z")
                        .clicked()
                    {
                        actions.push(ToolbarAction::Undo);
                    }

                    ui.separator();
                    page_controls(ui, &document, &mut actions);

                    if let Some(busy) = io.description().or(pipeline.busy.map(str::to_string)) {
                        ui.separator();
                        ui.label(egui::RichText::new(busy).weak());
                        ui.spinner();
                    }
                });
            });
        });

    for action in actions {
        match action {
            ToolbarAction::SetMode(region) => annotator.set_mode(region),
            ToolbarAction::SetPendingId(id) => annotator.set_pending_identity(id, pending_role),
            ToolbarAction::ToggleRole => {
                annotator.toggle_role();
            }
            ToolbarAction::Navigate(direction) => {
                if let Some(page) = document.navigation_target(direction) {
                    page_events.write(LoadPageRequest { page });
                }
            }
            ToolbarAction::Undo => {
                undo_events.write(UndoRequest);
            }
            ToolbarAction::Save => {
                save_events.write(SaveLayoutRequest);
            }
            ToolbarAction::OpenSettings => settings.open = true,
        }
    }
    Ok(())
}

/// Page buttons, laid out right to left.
fn page_controls(ui: &mut egui::Ui, document: &CurrentDocument, actions: &mut Vec<ToolbarAction>) {
    let count = document.page_count();
    let mut nav = |ui: &mut egui::Ui, text: &str, hint: &str, direction: PageNavigation| {
        let enabled = document.navigation_target(direction).is_some();
        if ui
            .add_enabled(enabled, egui::Button::new(text))
            .on_hover_text(hint)
            .clicked()
        {
            actions.push(ToolbarAction::Navigate(direction));
        }
    };

    nav(ui, ">>", "Last page (End)", PageNavigation::Last);
    nav(ui, ">", "Next page (Right, Space)", PageNavigation::Next);
    let page_label = if count == 0 {
        "No page".to_string()
    } else {
        format!("Page {} / {}", document.page() + 1, count)
    };
    ui.label(page_label);
    nav(ui, "<", "Previous page (Left)", PageNavigation::Previous);
    nav(ui, "<<", "First page (Home)", PageNavigation::First);
}
