pub mod annotator;
mod camera;
pub mod canvas;
pub mod events;
pub mod history;
mod input;
pub mod interaction;
pub mod params;
pub mod registry;
pub(crate) mod rendering;
pub mod tools;
pub mod viewport;

pub use annotator::AnnotationEditor;
pub use camera::EditorCamera;
pub use events::{CanvasEvent, PageNavigation};
pub use history::{HistorySnapshot, SnapshotHistory};

use bevy::prelude::*;
use bevy_egui::EguiPrimaryContextPass;

/// The annotation editor driving the main canvas.
#[derive(Resource, Default, Deref, DerefMut)]
pub struct Annotator(pub AnnotationEditor);

/// Systems turning window input into canvas events.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct EditorInputSet;

/// Page change requested from the keyboard; the document decides what it means.
#[derive(Message)]
pub struct NavigateRequest(pub PageNavigation);

pub struct EditorPlugin;

impl Plugin for EditorPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Annotator>()
            .add_message::<CanvasEvent>()
            .add_message::<NavigateRequest>()
            .init_gizmo_group::<rendering::RegionGizmoGroup>()
            .add_systems(
                Startup,
                (
                    camera::spawn_camera,
                    rendering::spawn_page_sprite,
                    rendering::configure_region_gizmos,
                ),
            )
            .add_systems(
                Update,
                (
                    input::sync_screen_size,
                    input::track_pan_modifier,
                    input::handle_pointer,
                    input::handle_wheel,
                    input::handle_keys,
                    input::flush_canvas_events,
                    input::update_cursor_icon,
                )
                    .chain()
                    .in_set(EditorInputSet),
            )
            .add_systems(
                Update,
                (rendering::sync_page_sprite, rendering::draw_regions)
                    .after(input::update_cursor_icon),
            )
            .add_systems(EguiPrimaryContextPass, rendering::draw_region_labels);
    }
}
