//! The owning application: which paper and page are open, and the
//! authoritative per-page region lists behind the canvas.
//!
//! - [`state`] - [`Document`], event application and undo sequencing
//! - [`systems`] - Bevy systems for paper/page/layout I/O and shortcuts
//!
//! Canvas events flow in from the editor; page images and layouts flow in
//! from the backend on the IO task pool. The canvas is always rebuilt from
//! the document's list, never patched.

mod state;
mod systems;

pub use state::{ApplyOutcome, Document, PageLoaded, UndoStep};

use bevy::prelude::*;
use bevy::tasks::Task;

use crate::config::ConfigLoaded;
use crate::model::PageLayouts;

/// The document being edited.
#[derive(Resource, Default, Deref, DerefMut)]
pub struct CurrentDocument(pub Document);

/// Backend operations of the document in flight.
#[derive(Resource, Default)]
pub struct DocumentIo {
    pub opening: Option<String>,
    pub loading_page: Option<usize>,
    pub saving: bool,
}

impl DocumentIo {
    pub fn is_busy(&self) -> bool {
        self.opening.is_some() || self.loading_page.is_some() || self.saving
    }

    pub fn description(&self) -> Option<String> {
        if let Some(paper) = &self.opening {
            Some(format!("Opening {}...", paper))
        } else if let Some(page) = self.loading_page {
            Some(format!("Loading page {}...", page + 1))
        } else if self.saving {
            Some("Saving layout...".to_string())
        } else {
            None
        }
    }
}

/// Message to open a paper by its server filename
#[derive(Message, Debug, Clone)]
pub struct OpenPaperRequest {
    pub filename: String,
}

/// Message to show a page of the open paper
#[derive(Message, Debug, Clone, Copy)]
pub struct LoadPageRequest {
    pub page: usize,
}

/// Message to upload the layout of the open paper
#[derive(Message, Debug, Clone, Copy)]
pub struct SaveLayoutRequest;

#[derive(Message, Debug, Clone, Copy)]
pub struct UndoRequest;

/// A page image decoded off the main thread.
pub struct LoadedPage {
    pub pixels: image::RgbaImage,
    pub logical_size: Vec2,
    pub total_pages: usize,
}

pub struct OpenPaperResult {
    pub filename: String,
    pub layouts: Result<PageLayouts, String>,
}

pub struct PageLoadResult {
    pub filename: String,
    pub page: usize,
    pub result: Result<LoadedPage, String>,
}

pub struct SaveLayoutResult {
    pub filename: String,
    pub revision: u64,
    pub result: Result<(), String>,
}

#[derive(Component)]
pub struct OpenPaperTask(pub Task<OpenPaperResult>);

#[derive(Component)]
pub struct PageLoadTask(pub Task<PageLoadResult>);

#[derive(Component)]
pub struct SaveLayoutTask(pub Task<SaveLayoutResult>);

pub struct DocumentPlugin;

impl Plugin for DocumentPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CurrentDocument>()
            .init_resource::<DocumentIo>()
            .add_message::<OpenPaperRequest>()
            .add_message::<LoadPageRequest>()
            .add_message::<SaveLayoutRequest>()
            .add_message::<UndoRequest>()
            .add_systems(Startup, systems::restore_last_session.after(ConfigLoaded))
            .add_systems(
                Update,
                (
                    systems::handle_shortcuts,
                    systems::apply_canvas_events,
                    systems::handle_undo.run_if(on_message::<UndoRequest>),
                    systems::handle_navigation,
                    systems::start_save.run_if(on_message::<SaveLayoutRequest>),
                    systems::start_open_paper.run_if(on_message::<OpenPaperRequest>),
                    systems::start_page_load.run_if(on_message::<LoadPageRequest>),
                    systems::poll_save_tasks,
                    systems::poll_open_paper_tasks,
                    systems::poll_page_load_tasks,
                )
                    .chain()
                    .after(crate::editor::EditorInputSet),
            );
    }
}
