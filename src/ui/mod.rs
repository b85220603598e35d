mod identity_field;
mod inspector;
mod notifications;
mod papers_panel;
mod pipeline_panel;
mod settings_dialog;
mod toolbar;

use bevy::prelude::*;
use bevy_egui::EguiPrimaryContextPass;

use crate::common::Notice;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<Notice>()
            .init_resource::<toolbar::ToolbarState>()
            .init_resource::<inspector::InspectorState>()
            .init_resource::<settings_dialog::SettingsDialogState>()
            .init_resource::<notifications::Notifications>()
            .add_systems(Update, notifications::collect_notices)
            // Side panels must render first so top panels fit between them
            .add_systems(
                EguiPrimaryContextPass,
                (
                    papers_panel::papers_panel_ui,
                    inspector::inspector_ui,
                    pipeline_panel::pipeline_panel_ui,
                )
                    .chain(),
            )
            .add_systems(
                EguiPrimaryContextPass,
                toolbar::toolbar_ui.after(pipeline_panel::pipeline_panel_ui),
            )
            .add_systems(
                EguiPrimaryContextPass,
                (
                    settings_dialog::settings_dialog_ui,
                    notifications::notifications_ui,
                )
                    .after(toolbar::toolbar_ui),
            );
    }
}
