//! Bevy systems connecting the document to the canvas and the backend.

use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use bevy::tasks::IoTaskPool;
use bevy_egui::EguiContexts;
use futures_lite::future;

use crate::common::Notice;
use crate::config::{AppConfig, UpdateLastPaperRequest};
use crate::editor::params::ui_wants_keyboard;
use crate::editor::{Annotator, CanvasEvent, NavigateRequest};
use crate::model::PageLayouts;
use crate::pipeline::{Backend, PipelineClient};

use super::state::{ApplyOutcome, Document, PageLoaded, UndoStep};
use super::{
    CurrentDocument, DocumentIo, LoadPageRequest, LoadedPage, OpenPaperRequest, OpenPaperResult,
    OpenPaperTask, PageLoadResult, PageLoadTask, SaveLayoutRequest, SaveLayoutResult,
    SaveLayoutTask, UndoRequest,
};

/// Wrap decoded page pixels in a Bevy image.
fn page_image(pixels: image::RgbaImage) -> Image {
    let (width, height) = pixels.dimensions();
    Image::new(
        Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        pixels.into_raw(),
        TextureFormat::Rgba8UnormSrgb,
        default(),
    )
}

fn fetch_page(client: &PipelineClient, filename: &str, page: usize) -> Result<LoadedPage, String> {
    let response = client.fetch_page(filename, page).map_err(|e| e.to_string())?;
    let pixels = response.decode().map_err(|e| e.to_string())?;
    Ok(LoadedPage {
        pixels,
        logical_size: Vec2::new(response.width, response.height),
        total_pages: response.total_pages,
    })
}

fn spawn_save(commands: &mut Commands, client: PipelineClient, filename: String, document: &Document) {
    let layouts = document.layouts().clone();
    let revision = document.revision();
    let task = IoTaskPool::get().spawn(async move {
        let result = client
            .save_layout(&filename, &layouts)
            .map_err(|e| e.to_string());
        SaveLayoutResult {
            filename,
            revision,
            result,
        }
    });
    commands.spawn(SaveLayoutTask(task));
}

/// Rebuild the canvas from the document's current page.
fn rerender(annotator: &mut Annotator, document: &Document) {
    annotator.render_all(document.current_items());
    annotator.refresh_pending_identity();
}

/// Warn about id collisions that involve `uuid`.
fn report_collisions(document: &Document, uuid: uuid::Uuid, notices: &mut MessageWriter<Notice>) {
    for collision in document
        .collisions()
        .into_iter()
        .filter(|collision| collision.uuids.contains(&uuid))
    {
        warn!("Id collision on page {}: {}", document.page(), collision.describe());
        notices.write(Notice::warning(collision.describe()));
    }
}

/// Size the history from the config and reopen the last paper.
pub fn restore_last_session(
    config: Res<AppConfig>,
    mut document: ResMut<CurrentDocument>,
    mut open_events: MessageWriter<OpenPaperRequest>,
) {
    document.0 = Document::with_history_capacity(config.data.history_capacity);
    if let Some(filename) = &config.data.last_paper {
        info!("Reopening {}", filename);
        open_events.write(OpenPaperRequest {
            filename: filename.clone(),
        });
    }
}

/// Ctrl+Z undoes, Ctrl+S saves.
pub fn handle_shortcuts(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut contexts: EguiContexts,
    mut undo_events: MessageWriter<UndoRequest>,
    mut save_events: MessageWriter<SaveLayoutRequest>,
) {
    let ctrl = keyboard.pressed(KeyCode::ControlLeft) || keyboard.pressed(KeyCode::ControlRight);
    if !ctrl || ui_wants_keyboard(&mut contexts) {
        return;
    }
    if keyboard.just_pressed(KeyCode::KeyZ) {
        undo_events.write(UndoRequest);
    }
    if keyboard.just_pressed(KeyCode::KeyS) {
        save_events.write(SaveLayoutRequest);
    }
}

pub fn apply_canvas_events(
    mut events: MessageReader<CanvasEvent>,
    mut document: ResMut<CurrentDocument>,
    mut annotator: ResMut<Annotator>,
    mut notices: MessageWriter<Notice>,
) {
    for event in events.read() {
        let outcome = document.apply_event(event);
        if outcome == ApplyOutcome::Rerender {
            rerender(&mut annotator, &document);
        }
        match event {
            CanvasEvent::Created(item) | CanvasEvent::Modified(item)
                if outcome != ApplyOutcome::Unchanged =>
            {
                report_collisions(&document, item.uuid, &mut notices);
            }
            _ => {}
        }
    }
}

pub fn handle_undo(
    mut events: MessageReader<UndoRequest>,
    mut document: ResMut<CurrentDocument>,
    mut annotator: ResMut<Annotator>,
    mut page_events: MessageWriter<LoadPageRequest>,
) {
    for _ in events.read() {
        match document.begin_undo() {
            UndoStep::Nothing => debug!("Nothing to undo"),
            UndoStep::Restored => rerender(&mut annotator, &document),
            UndoStep::Navigate(page) => {
                page_events.write(LoadPageRequest { page });
            }
        }
    }
}

pub fn handle_navigation(
    mut events: MessageReader<NavigateRequest>,
    document: Res<CurrentDocument>,
    mut page_events: MessageWriter<LoadPageRequest>,
) {
    for NavigateRequest(direction) in events.read() {
        if let Some(page) = document.navigation_target(*direction) {
            page_events.write(LoadPageRequest { page });
        }
    }
}

pub fn start_save(
    mut commands: Commands,
    mut events: MessageReader<SaveLayoutRequest>,
    document: Res<CurrentDocument>,
    mut io: ResMut<DocumentIo>,
    backend: Res<Backend>,
) {
    if events.read().count() == 0 || io.saving {
        return;
    }
    let Some(filename) = document.paper() else {
        return;
    };
    io.saving = true;
    spawn_save(&mut commands, backend.0.clone(), filename.to_string(), &document);
}

pub fn start_open_paper(
    mut commands: Commands,
    mut events: MessageReader<OpenPaperRequest>,
    document: Res<CurrentDocument>,
    mut io: ResMut<DocumentIo>,
    backend: Res<Backend>,
) {
    let Some(request) = events.read().last() else {
        return;
    };
    if io.opening.is_some() {
        warn!("Already opening a paper, ignoring {}", request.filename);
        return;
    }

    // Unsaved edits of the paper being left are uploaded first
    if document.is_dirty()
        && let Some(current) = document.paper()
        && !io.saving
    {
        io.saving = true;
        spawn_save(&mut commands, backend.0.clone(), current.to_string(), &document);
    }

    let filename = request.filename.clone();
    io.opening = Some(filename.clone());
    let client = backend.0.clone();
    let task = IoTaskPool::get().spawn(async move {
        let layouts = client.load_layout(&filename).map_err(|e| e.to_string());
        OpenPaperResult { filename, layouts }
    });
    commands.spawn(OpenPaperTask(task));
}

pub fn start_page_load(
    mut commands: Commands,
    mut events: MessageReader<LoadPageRequest>,
    document: Res<CurrentDocument>,
    mut io: ResMut<DocumentIo>,
    backend: Res<Backend>,
) {
    let Some(request) = events.read().last().copied() else {
        return;
    };
    let Some(filename) = document.paper().map(str::to_string) else {
        return;
    };
    if let Some(loading) = io.loading_page {
        debug!("Page {} requested while page {} loads", request.page, loading);
        return;
    }

    io.loading_page = Some(request.page);
    let client = backend.0.clone();
    let page = request.page;
    let task = IoTaskPool::get().spawn(async move {
        let result = fetch_page(&client, &filename, page);
        PageLoadResult {
            filename,
            page,
            result,
        }
    });
    commands.spawn(PageLoadTask(task));
}

pub fn poll_save_tasks(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut SaveLayoutTask)>,
    mut document: ResMut<CurrentDocument>,
    mut io: ResMut<DocumentIo>,
    mut notices: MessageWriter<Notice>,
) {
    for (entity, mut task) in tasks.iter_mut() {
        let Some(result) = future::block_on(future::poll_once(&mut task.0)) else {
            continue;
        };
        io.saving = false;

        match result.result {
            Ok(()) => {
                info!("Layout of {} saved", result.filename);
                if document.paper() == Some(result.filename.as_str()) {
                    document.mark_saved(result.revision);
                }
                notices.write(Notice::info(format!("Saved {}", result.filename)));
            }
            Err(e) => {
                error!("Failed to save layout of {}: {}", result.filename, e);
                notices.write(Notice::error(format!("Save failed: {}", e)));
            }
        }

        commands.entity(entity).despawn();
    }
}

#[allow(clippy::too_many_arguments)]
pub fn poll_open_paper_tasks(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut OpenPaperTask)>,
    mut document: ResMut<CurrentDocument>,
    mut annotator: ResMut<Annotator>,
    mut io: ResMut<DocumentIo>,
    mut page_events: MessageWriter<LoadPageRequest>,
    mut config_events: MessageWriter<UpdateLastPaperRequest>,
    mut notices: MessageWriter<Notice>,
) {
    for (entity, mut task) in tasks.iter_mut() {
        let Some(result) = future::block_on(future::poll_once(&mut task.0)) else {
            continue;
        };
        io.opening = None;

        match result.layouts {
            Ok(layouts) => {
                info!(
                    "Opened {} with {} regions on {} pages",
                    result.filename,
                    layouts.total_items(),
                    layouts.pages().count()
                );
                warn_about_stored_collisions(&layouts, &mut notices);
                document.open(result.filename.clone(), layouts);
                annotator.clear_background();
                rerender(&mut annotator, &document);
                io.loading_page = None;
                page_events.write(LoadPageRequest { page: 0 });
                config_events.write(UpdateLastPaperRequest {
                    filename: result.filename,
                });
            }
            Err(e) => {
                error!("Failed to open {}: {}", result.filename, e);
                notices.write(Notice::error(format!("Could not open {}: {}", result.filename, e)));
            }
        }

        commands.entity(entity).despawn();
    }
}

fn warn_about_stored_collisions(layouts: &PageLayouts, notices: &mut MessageWriter<Notice>) {
    let count: usize = layouts
        .pages()
        .map(|(_, items)| crate::model::find_id_collisions(items).len())
        .sum();
    if count > 0 {
        warn!("Loaded layout has {} id collision(s)", count);
        notices.write(Notice::warning(format!(
            "Layout has {} duplicate region id(s)",
            count
        )));
    }
}

#[allow(clippy::too_many_arguments)]
pub fn poll_page_load_tasks(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut PageLoadTask)>,
    mut document: ResMut<CurrentDocument>,
    mut annotator: ResMut<Annotator>,
    mut images: ResMut<Assets<Image>>,
    mut io: ResMut<DocumentIo>,
    mut page_events: MessageWriter<LoadPageRequest>,
    mut notices: MessageWriter<Notice>,
) {
    for (entity, mut task) in tasks.iter_mut() {
        let Some(result) = future::block_on(future::poll_once(&mut task.0)) else {
            continue;
        };
        commands.entity(entity).despawn();
        if io.loading_page == Some(result.page) {
            io.loading_page = None;
        }

        if document.paper() != Some(result.filename.as_str()) {
            debug!("Dropping page {} of {}: paper closed", result.page, result.filename);
            continue;
        }

        match result.result {
            Ok(loaded) => {
                let handle = images.add(page_image(loaded.pixels));
                document.set_page_count(loaded.total_pages);
                let shown = document.page_loaded(result.page);
                annotator.set_background(Some(handle), loaded.logical_size);
                rerender(&mut annotator, &document);
                debug!(
                    "Page {}/{} shown at {}x{}",
                    result.page + 1,
                    loaded.total_pages,
                    loaded.logical_size.x,
                    loaded.logical_size.y
                );
                match shown {
                    PageLoaded::Shown => {}
                    PageLoaded::UndoApplied => {
                        notices.write(Notice::info(format!(
                            "Undo applied on page {}",
                            result.page + 1
                        )));
                    }
                    // Another load won the race with the undo's page request
                    PageLoaded::UndoWaiting(page) => {
                        page_events.write(LoadPageRequest { page });
                    }
                }
            }
            Err(e) => {
                error!("Failed to load page {}: {}", result.page, e);
                match document.pending_undo_page() {
                    Some(page) if page == result.page => {
                        document.abandon_pending_undo();
                        notices.write(Notice::warning("Undo cancelled: its page could not be loaded"));
                    }
                    Some(page) => {
                        page_events.write(LoadPageRequest { page });
                    }
                    None => {}
                }
                notices.write(Notice::error(format!("Page {} failed: {}", result.page + 1, e)));
            }
        }
    }
}
