use bevy::prelude::*;
use bevy_egui::{EguiContexts, egui};

use crate::document::{CurrentDocument, DocumentIo, OpenPaperRequest};
use crate::pipeline::{PipelineRequest, PipelineState};

/// Left panel listing the papers known to the server
pub fn papers_panel_ui(
    mut contexts: EguiContexts,
    pipeline: Res<PipelineState>,
    document: Res<CurrentDocument>,
    io: Res<DocumentIo>,
    mut open_events: MessageWriter<OpenPaperRequest>,
    mut requests: MessageWriter<PipelineRequest>,
) -> Result {
    egui::SidePanel::left("papers_panel")
        .default_width(220.0)
        .show(contexts.ctx_mut()?, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Papers").heading().size(18.0));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .add_enabled(!pipeline.is_busy(), egui::Button::new("Refresh"))
                        .clicked()
                    {
                        requests.write(PipelineRequest::RefreshPapers);
                    }
                });
            });
            ui.add_space(4.0);
            ui.separator();

            if pipeline.papers.is_empty() {
                ui.label(egui::RichText::new("No papers on the server").weak().italics());
                return;
            }

            egui::ScrollArea::vertical().show(ui, |ui| {
                for paper in &pipeline.papers {
                    let is_current = document.paper() == Some(paper.filename.as_str());
                    ui.add_enabled_ui(io.opening.is_none(), |ui| {
                        let response = ui
                            .selectable_label(is_current, paper.display_name())
                            .on_hover_text(&paper.filename);
                        if response.clicked() && !is_current {
                            open_events.write(OpenPaperRequest {
                                filename: paper.filename.clone(),
                            });
                        }
                    });
                    if !paper.status.is_empty() {
                        ui.label(egui::RichText::new(&paper.status).weak().small());
                    }
                    ui.add_space(2.0);
                }
            });
        });
    Ok(())
}
