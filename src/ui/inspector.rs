use bevy::prelude::*;
use bevy_egui::{EguiContexts, egui};
use std::collections::HashSet;
use uuid::Uuid;

use crate::document::CurrentDocument;
use crate::editor::Annotator;
use crate::editor::rendering::to_color32;
use crate::model::{AnnotationItem, Role};

use super::identity_field::IdentityField;

const WARNING_COLOR: egui::Color32 = egui::Color32::from_rgb(230, 170, 60);

/// Buffer for editing the selected region's id.
#[derive(Resource, Default)]
pub struct InspectorState {
    editing: Option<Uuid>,
    id_field: IdentityField,
}

enum InspectorAction {
    Relabel { uuid: Uuid, id: u32, role: Role },
    Delete,
    Select(Uuid),
}

/// Right panel: the selected region's identity and the regions on this page
pub fn inspector_ui(
    mut contexts: EguiContexts,
    mut annotator: ResMut<Annotator>,
    document: Res<CurrentDocument>,
    mut state: ResMut<InspectorState>,
) -> Result {
    let selected = annotator.selected().cloned();
    match &selected {
        Some(item) => {
            if state.editing != Some(item.uuid) {
                state.editing = Some(item.uuid);
                state.id_field = IdentityField::default();
            }
            state.id_field.sync(item.id);
        }
        None => state.editing = None,
    }
    let colliding: HashSet<Uuid> = document
        .collisions()
        .into_iter()
        .flat_map(|collision| collision.uuids)
        .collect();

    let mut actions = Vec::new();
    egui::SidePanel::right("inspector_panel")
        .default_width(220.0)
        .show(contexts.ctx_mut()?, |ui| {
            ui.add_space(4.0);
            ui.label(egui::RichText::new("Selection").heading().size(18.0));
            ui.add_space(4.0);
            ui.separator();
            ui.add_space(4.0);

            match &selected {
                Some(item) => selection_section(ui, item, &mut state.id_field, &mut actions),
                None => {
                    ui.label(egui::RichText::new("Nothing selected").weak().italics());
                }
            }

            ui.add_space(12.0);
            ui.label(egui::RichText::new("Regions on this page").heading().size(18.0));
            ui.add_space(4.0);
            ui.separator();

            let mut items: Vec<&AnnotationItem> = document.current_items().iter().collect();
            items.sort_by_key(|item| (item.region, item.id, item.role));
            if items.is_empty() {
                ui.label(egui::RichText::new("No regions").weak().italics());
            }
            egui::ScrollArea::vertical().show(ui, |ui| {
                for item in items {
                    ui.horizontal(|ui| {
                        let is_selected = selected.as_ref().is_some_and(|s| s.uuid == item.uuid);
                        let text = egui::RichText::new(item.label_text())
                            .color(to_color32(item.region.color(), 1.0));
                        if ui.selectable_label(is_selected, text).clicked() {
                            actions.push(InspectorAction::Select(item.uuid));
                        }
                        if colliding.contains(&item.uuid) {
                            ui.colored_label(WARNING_COLOR, "dup")
                                .on_hover_text("Another region on this page has the same id");
                        }
                    });
                }
            });
        });

    for action in actions {
        match action {
            InspectorAction::Relabel { uuid, id, role } => {
                annotator.update_identity(uuid, id, role);
            }
            InspectorAction::Delete => annotator.delete_selection(),
            InspectorAction::Select(uuid) => {
                annotator.select_by_uuid(uuid);
            }
        }
    }
    Ok(())
}

fn selection_section(
    ui: &mut egui::Ui,
    item: &AnnotationItem,
    id_field: &mut IdentityField,
    actions: &mut Vec<InspectorAction>,
) {
    ui.label(
        egui::RichText::new(item.region.display_name())
            .strong()
            .color(to_color32(item.region.color(), 1.0)),
    );

    ui.horizontal(|ui| {
        ui.label("Id:");
        if let Some(id) = id_field.show(ui, 48.0) {
            actions.push(InspectorAction::Relabel {
                uuid: item.uuid,
                id,
                role: item.role,
            });
        }
    });
    if let Some(error) = id_field.error() {
        ui.colored_label(WARNING_COLOR, error.to_string());
    }

    if item.region.supports_caption() {
        ui.horizontal(|ui| {
            ui.label("Role:");
            for role in [Role::Body, Role::Caption] {
                if ui
                    .selectable_label(item.role == role, role.display_name())
                    .clicked()
                    && item.role != role
                {
                    actions.push(InspectorAction::Relabel {
                        uuid: item.uuid,
                        id: item.id,
                        role,
                    });
                }
            }
        });
    }

    let [x0, y0, x1, y1] = item.rect;
    ui.label(
        egui::RichText::new(format!("({:.0}, {:.0}) to ({:.0}, {:.0})", x0, y0, x1, y1)).weak(),
    );
    ui.label(egui::RichText::new(item.uuid.to_string()).weak().small());

    ui.add_space(4.0);
    if ui.button("Delete").on_hover_text("Delete / Backspace").clicked() {
        actions.push(InspectorAction::Delete);
    }
}
