use bevy::prelude::*;
use bevy_egui::{EguiContexts, egui};

use crate::document::CurrentDocument;
use crate::pipeline::{PipelineRequest, PipelineState, TaskEntry, TaskProgress, TaskStatus};

fn status_color(status: TaskStatus) -> egui::Color32 {
    match status {
        TaskStatus::Done => egui::Color32::from_rgb(100, 200, 100),
        TaskStatus::Error => egui::Color32::from_rgb(230, 90, 80),
        TaskStatus::Running => egui::Color32::from_rgb(230, 170, 60),
        TaskStatus::Pending | TaskStatus::Other => egui::Color32::GRAY,
    }
}

fn progress_row(ui: &mut egui::Ui, title: &str, progress: &TaskProgress) {
    ui.horizontal(|ui| {
        ui.label(title);
        let mut text = format!("{}/{}", progress.finished, progress.total);
        if progress.failed > 0 {
            text.push_str(&format!(", {} failed", progress.failed));
        }
        ui.add(
            egui::ProgressBar::new(progress.fraction())
                .desired_width(240.0)
                .text(text),
        );
    });
}

fn task_list(ui: &mut egui::Ui, id: &str, tasks: &[TaskEntry]) {
    egui::CollapsingHeader::new(format!("Tasks ({})", tasks.len()))
        .id_salt(id)
        .show(ui, |ui| {
            egui::ScrollArea::vertical()
                .id_salt(id)
                .max_height(120.0)
                .show(ui, |ui| {
                    for task in tasks {
                        ui.horizontal(|ui| {
                            ui.colored_label(status_color(task.status), "●");
                            ui.label(task.label());
                        });
                    }
                });
        });
}

fn prompt_preview(
    ui: &mut egui::Ui,
    state: &PipelineState,
    requests: &mut MessageWriter<PipelineRequest>,
) {
    egui::CollapsingHeader::new("Prompts")
        .id_salt("prompt_preview")
        .show(ui, |ui| {
            let Some(prompts) = &state.prompts else {
                if ui.button("Load from server").clicked() {
                    requests.write(PipelineRequest::FetchPrompts);
                }
                return;
            };
            if ui.small_button("Reload").clicked() {
                requests.write(PipelineRequest::FetchPrompts);
            }
            let sections = prompts.sections();
            if sections.is_empty() {
                ui.label(egui::RichText::new("The server returned no prompts").weak());
            }
            egui::ScrollArea::vertical()
                .id_salt("prompt_preview")
                .max_height(200.0)
                .show(ui, |ui| {
                    for (title, text) in sections {
                        ui.label(egui::RichText::new(title).strong());
                        let mut text = text;
                        ui.add(
                            egui::TextEdit::multiline(&mut text)
                                .desired_width(f32::INFINITY)
                                .font(egui::TextStyle::Monospace),
                        );
                        ui.add_space(4.0);
                    }
                });
        });
}

/// Bottom panel driving extraction, translation and the report
pub fn pipeline_panel_ui(
    mut contexts: EguiContexts,
    state: Res<PipelineState>,
    document: Res<CurrentDocument>,
    mut requests: MessageWriter<PipelineRequest>,
) -> Result {
    let paper = document.paper().map(str::to_string);
    let idle = paper.is_some() && !state.is_busy();

    egui::TopBottomPanel::bottom("pipeline_panel")
        .frame(
            egui::Frame::side_top_panel(&contexts.ctx_mut()?.style())
                .inner_margin(egui::Margin::symmetric(12, 6)),
        )
        .show(contexts.ctx_mut()?, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Pipeline").strong());
                ui.add_space(8.0);

                let button = |ui: &mut egui::Ui, enabled: bool, text: &str| {
                    ui.add_enabled(enabled, egui::Button::new(text)).clicked()
                };
                let Some(file) = paper.as_ref() else {
                    ui.label(egui::RichText::new("Open a paper first").weak());
                    return;
                };
                if button(ui, idle, "Extract") {
                    requests.write(PipelineRequest::Extract(file.clone()));
                }
                if button(ui, idle, "Load results") {
                    requests.write(PipelineRequest::FetchExtract(file.clone()));
                }
                if button(ui, idle && !state.is_translating(), "Translate") {
                    requests.write(PipelineRequest::Translate(file.clone()));
                }
                if button(ui, state.is_translating(), "Stop")
                    && let Some(watch) = &state.watch
                {
                    requests.write(PipelineRequest::StopTranslate(watch.filename().to_string()));
                }
                if button(ui, idle, "Report") {
                    requests.write(PipelineRequest::GenerateReport(file.clone()));
                }
                if let Some(url) = &state.report_url {
                    ui.hyperlink_to("Last report", url);
                }
            });

            if let (Some(progress), Some(result)) = (state.extract_progress(), &state.extract) {
                progress_row(ui, "Extraction", &progress);
                if !result.references.is_empty() {
                    ui.label(
                        egui::RichText::new(format!("{} references", result.references.len()))
                            .weak(),
                    );
                }
                task_list(ui, "extract_tasks", &result.tasks);
            }
            if state.is_translating() || !state.translation.is_empty() {
                progress_row(ui, "Translation", &state.translation_progress());
                task_list(ui, "translation_tasks", &state.translation);
            }
            prompt_preview(ui, &state, &mut requests);
        });
    Ok(())
}
