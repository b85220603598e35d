//! External extraction/translation backend.
//!
//! - [`client`] - Blocking REST client ([`PipelineClient`])
//! - [`types`] - Wire payloads
//! - [`stream`] - Translation progress stream and its cancellation
//!
//! Requests arrive as [`PipelineRequest`] messages, run on the IO task pool,
//! and are polled back into [`PipelineState`]. One request runs at a time;
//! the busy flag gates the UI buttons while editing stays available.

mod client;
mod error;
mod stream;
mod types;

pub use client::PipelineClient;
pub use error::PipelineError;
pub use stream::{StreamUpdate, TranslationWatch};
pub use types::{ExtractResult, Paper, PromptSet, TaskEntry, TaskProgress, TaskStatus};

use bevy::prelude::*;
use bevy::tasks::{IoTaskPool, Task};
use futures_lite::future;

use crate::common::Notice;
use crate::config::{AppConfig, ConfigLoaded};

/// Client pointed at the configured server.
#[derive(Resource, Deref)]
pub struct Backend(pub PipelineClient);

impl Default for Backend {
    fn default() -> Self {
        Self(PipelineClient::new(crate::config::DEFAULT_SERVER_URL))
    }
}

#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub enum PipelineRequest {
    RefreshPapers,
    Extract(String),
    FetchExtract(String),
    Translate(String),
    /// Drops the local stream at once, then asks the server to stop
    StopTranslate(String),
    GenerateReport(String),
    FetchPrompts,
}

impl PipelineRequest {
    pub fn label(&self) -> &'static str {
        match self {
            PipelineRequest::RefreshPapers => "Listing papers",
            PipelineRequest::Extract(_) => "Starting extraction",
            PipelineRequest::FetchExtract(_) => "Loading extraction results",
            PipelineRequest::Translate(_) => "Starting translation",
            PipelineRequest::StopTranslate(_) => "Stopping translation",
            PipelineRequest::GenerateReport(_) => "Generating report",
            PipelineRequest::FetchPrompts => "Loading prompts",
        }
    }

    /// Whether this request holds the busy flag while in flight.
    fn is_exclusive(&self) -> bool {
        !matches!(
            self,
            PipelineRequest::StopTranslate(_) | PipelineRequest::FetchPrompts
        )
    }
}

/// Everything the UI shows about the backend.
#[derive(Resource, Default)]
pub struct PipelineState {
    /// Description of the request in flight
    pub busy: Option<&'static str>,
    pub papers: Vec<Paper>,
    pub extract: Option<ExtractResult>,
    /// Newest task list pushed by the translation stream
    pub translation: Vec<TaskEntry>,
    pub watch: Option<TranslationWatch>,
    pub report_url: Option<String>,
    /// Read-only copy of the backend's system prompts
    pub prompts: Option<PromptSet>,
}

impl PipelineState {
    pub fn is_busy(&self) -> bool {
        self.busy.is_some()
    }

    pub fn is_translating(&self) -> bool {
        self.watch.is_some()
    }

    pub fn translation_progress(&self) -> TaskProgress {
        TaskProgress::of(&self.translation)
    }

    pub fn extract_progress(&self) -> Option<TaskProgress> {
        self.extract
            .as_ref()
            .map(|result| TaskProgress::of(&result.tasks))
    }
}

enum PipelineReply {
    Papers(Vec<Paper>),
    ExtractStarted(String),
    Extract(ExtractResult),
    TranslateStarted { filename: String, message: String },
    Stopped,
    Report(String),
    Prompts(PromptSet),
}

pub struct PipelineResult {
    label: &'static str,
    exclusive: bool,
    reply: Result<PipelineReply, PipelineError>,
}

/// Background backend request
#[derive(Component)]
pub struct PipelineTask(pub Task<PipelineResult>);

fn run_request(client: &PipelineClient, request: PipelineRequest) -> PipelineResult {
    let label = request.label();
    let exclusive = request.is_exclusive();
    let reply = match request {
        PipelineRequest::RefreshPapers => client.list_papers().map(PipelineReply::Papers),
        PipelineRequest::Extract(file) => {
            client.trigger_extract(&file).map(PipelineReply::ExtractStarted)
        }
        PipelineRequest::FetchExtract(file) => {
            client.fetch_extract(&file).map(PipelineReply::Extract)
        }
        PipelineRequest::Translate(file) => client
            .trigger_translate(&file)
            .map(|message| PipelineReply::TranslateStarted {
                filename: file,
                message,
            }),
        PipelineRequest::StopTranslate(file) => {
            client.stop_translate(&file).map(|_| PipelineReply::Stopped)
        }
        PipelineRequest::GenerateReport(file) => {
            client.generate_report(&file).map(PipelineReply::Report)
        }
        PipelineRequest::FetchPrompts => client.fetch_prompts().map(PipelineReply::Prompts),
    };
    PipelineResult {
        label,
        exclusive,
        reply,
    }
}

/// Point the client at the configured server whenever the config changes.
fn sync_backend_url(config: Res<AppConfig>, mut backend: ResMut<Backend>) {
    let wanted = PipelineClient::new(config.data.server_url.as_str());
    if backend.0 != wanted {
        info!("Backend server is {}", wanted.base_url());
        backend.0 = wanted;
    }
}

fn request_initial_papers(mut requests: MessageWriter<PipelineRequest>) {
    requests.write(PipelineRequest::RefreshPapers);
}

fn start_requests(
    mut commands: Commands,
    mut requests: MessageReader<PipelineRequest>,
    mut state: ResMut<PipelineState>,
    backend: Res<Backend>,
    mut notices: MessageWriter<Notice>,
) {
    for request in requests.read() {
        if let PipelineRequest::StopTranslate(file) = request {
            if let Some(watch) = state.watch.take() {
                watch.stop();
                info!("Stopped watching translation of {}", file);
            }
        } else if let Some(busy) = state.busy {
            warn!("{} ignored: {} is still running", request.label(), busy);
            notices.write(Notice::warning(format!("Busy: {}", busy)));
            continue;
        }

        if request.is_exclusive() {
            state.busy = Some(request.label());
        }
        debug!("{}", request.label());

        let client = backend.0.clone();
        let request = request.clone();
        let task_pool = IoTaskPool::get();
        let task = task_pool.spawn(async move { run_request(&client, request) });
        commands.spawn(PipelineTask(task));
    }
}

fn poll_pipeline_tasks(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut PipelineTask)>,
    mut state: ResMut<PipelineState>,
    backend: Res<Backend>,
    mut notices: MessageWriter<Notice>,
) {
    for (entity, mut task) in tasks.iter_mut() {
        let Some(result) = future::block_on(future::poll_once(&mut task.0)) else {
            continue;
        };
        if result.exclusive {
            state.busy = None;
        }

        match result.reply {
            Ok(PipelineReply::Papers(papers)) => {
                info!("Server lists {} papers", papers.len());
                state.papers = papers;
            }
            Ok(PipelineReply::ExtractStarted(message)) => {
                notices.write(Notice::info(message));
            }
            Ok(PipelineReply::Extract(result)) => {
                let progress = TaskProgress::of(&result.tasks);
                info!(
                    "Extraction: {}/{} tasks finished, {} references",
                    progress.finished,
                    progress.total,
                    result.references.len()
                );
                state.extract = Some(result);
            }
            Ok(PipelineReply::TranslateStarted { filename, message }) => {
                notices.write(Notice::info(message));
                state.translation.clear();
                state.watch = Some(TranslationWatch::connect(backend.0.clone(), filename));
            }
            Ok(PipelineReply::Stopped) => {
                notices.write(Notice::info("Translation stop requested"));
            }
            Ok(PipelineReply::Report(url)) => {
                info!("Report ready at {}", url);
                if let Err(e) = open::that(&url) {
                    warn!("Failed to open report {}: {}", url, e);
                    notices.write(Notice::warning(format!("Report ready at {}", url)));
                }
                state.report_url = Some(url);
            }
            Ok(PipelineReply::Prompts(prompts)) => {
                debug!("Loaded {} prompts", prompts.sections().len());
                state.prompts = Some(prompts);
            }
            Err(e) => {
                error!("{} failed: {}", result.label, e);
                notices.write(Notice::error(format!("{} failed: {}", result.label, e)));
            }
        }

        commands.entity(entity).despawn();
    }
}

fn poll_translation_watch(mut state: ResMut<PipelineState>, mut notices: MessageWriter<Notice>) {
    let Some(update) = state.watch.as_ref().and_then(TranslationWatch::latest) else {
        return;
    };
    match update {
        StreamUpdate::Snapshot(tasks) => state.translation = tasks,
        StreamUpdate::Closed => {
            let progress = state.translation_progress();
            info!(
                "Translation finished: {}/{} tasks, {} failed",
                progress.finished, progress.total, progress.failed
            );
            notices.write(Notice::info("Translation finished"));
            state.watch = None;
        }
        StreamUpdate::Failed(e) => {
            warn!("Translation stream ended: {}", e);
            notices.write(Notice::warning(format!("Translation stream ended: {}", e)));
            state.watch = None;
        }
    }
}

pub struct PipelinePlugin;

impl Plugin for PipelinePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Backend>()
            .init_resource::<PipelineState>()
            .add_message::<PipelineRequest>()
            .add_message::<Notice>()
            .add_systems(
                Startup,
                (sync_backend_url, request_initial_papers)
                    .chain()
                    .after(ConfigLoaded),
            )
            .add_systems(
                Update,
                (
                    sync_backend_url.run_if(resource_changed::<AppConfig>),
                    start_requests.run_if(on_message::<PipelineRequest>),
                    poll_pipeline_tasks,
                    poll_translation_watch,
                )
                    .chain(),
            );
    }
}
