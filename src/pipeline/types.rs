//! Wire types of the extraction backend.

use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::error::PipelineError;
use crate::model::PageLayouts;

/// A PDF known to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Paper {
    pub filename: String,
    #[serde(default)]
    pub raw_name: String,
    /// Free-form progress label chosen by the server
    #[serde(default)]
    pub status: String,
}

impl Paper {
    /// The server's display name, or one derived from the filename.
    pub fn display_name(&self) -> String {
        if self.raw_name.is_empty() {
            sanitize_filename(&self.filename)
        } else {
            self.raw_name.clone()
        }
    }
}

/// System prompts the backend sends to the language model, for preview.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PromptSet {
    #[serde(default)]
    pub meta: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub asset: String,
    #[serde(default)]
    pub correction: String,
}

impl PromptSet {
    /// Titled prompts in display order, skipping ones the server left empty.
    pub fn sections(&self) -> Vec<(&'static str, &str)> {
        [
            ("Metadata", self.meta.as_str()),
            ("Body text", self.body.as_str()),
            ("Figures and tables", self.asset.as_str()),
            ("Correction", self.correction.as_str()),
        ]
        .into_iter()
        .filter(|(_, text)| !text.trim().is_empty())
        .collect()
    }
}

/// One rendered page and its size in PDF points.
#[derive(Debug, Clone, Deserialize)]
pub struct PageImage {
    /// `data:image/png;base64,...`
    pub image: String,
    pub width: f32,
    pub height: f32,
    pub total_pages: usize,
}

impl PageImage {
    /// Decode the embedded PNG into RGBA pixels.
    pub fn decode(&self) -> Result<image::RgbaImage, PipelineError> {
        let encoded = match self.image.split_once(',') {
            Some((header, data)) if header.starts_with("data:") => data,
            _ => self.image.as_str(),
        };
        let bytes = general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| PipelineError::Decode(format!("page image is not base64: {}", e)))?;
        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| PipelineError::Decode(format!("page image: {}", e)))?;
        Ok(decoded.to_rgba8())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Done,
    Error,
    #[serde(other)]
    Other,
}

impl TaskStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Error)
    }
}

/// One unit of extraction/translation work.
///
/// Only `type` and `status` are interpreted; everything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TaskEntry {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskEntry {
    /// Short human label: `id`, then `title`, then the kind.
    pub fn label(&self) -> String {
        for key in ["id", "title"] {
            match self.extra.get(key) {
                Some(Value::String(s)) => return format!("{} {}", self.kind, s),
                Some(Value::Number(n)) => return format!("{} {}", self.kind, n),
                _ => {}
            }
        }
        self.kind.clone()
    }
}

/// Counts of a task list by status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskProgress {
    pub total: usize,
    pub finished: usize,
    pub failed: usize,
}

impl TaskProgress {
    pub fn of(tasks: &[TaskEntry]) -> Self {
        Self {
            total: tasks.len(),
            finished: tasks.iter().filter(|t| t.status.is_finished()).count(),
            failed: tasks
                .iter()
                .filter(|t| t.status == TaskStatus::Error)
                .count(),
        }
    }

    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.finished as f32 / self.total as f32
        }
    }
}

/// Result of an extraction run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractResult {
    pub tasks: Vec<TaskEntry>,
    pub references: BTreeMap<String, Value>,
}

/// The extract endpoint answers either a bare task list or an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ExtractPayload {
    Tasks(Vec<TaskEntry>),
    Full {
        #[serde(default)]
        tasks: Vec<TaskEntry>,
        #[serde(default)]
        references: BTreeMap<String, Value>,
    },
}

impl From<ExtractPayload> for ExtractResult {
    fn from(payload: ExtractPayload) -> Self {
        match payload {
            ExtractPayload::Tasks(tasks) => ExtractResult {
                tasks,
                references: BTreeMap::new(),
            },
            ExtractPayload::Full { tasks, references } => ExtractResult { tasks, references },
        }
    }
}

/// `{status, msg?, url?}` acknowledgement used by the workflow endpoints.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StatusResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl StatusResponse {
    pub fn into_result(self) -> Result<Self, PipelineError> {
        if self.status == "error" {
            Err(PipelineError::Backend(
                self.msg.unwrap_or_else(|| "the server reported an error".to_string()),
            ))
        } else {
            Ok(self)
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SaveLayoutRequest<'a> {
    pub filename: &'a str,
    pub layout_data: &'a PageLayouts,
}

/// Display stem the backend derives from a PDF filename.
pub fn sanitize_filename(filename: &str) -> String {
    if filename.is_empty() {
        return "untitled".to_string();
    }
    let base = filename.rsplit('/').next().unwrap_or(filename);
    // A leading dot does not start an extension
    let stem = match base.rfind('.') {
        Some(dot) if base[..dot].chars().any(|c| c != '.') => &base[..dot],
        _ => base,
    };

    let mut out = String::with_capacity(stem.len());
    let mut in_space = false;
    for c in stem.chars() {
        if matches!(c, '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|') {
            continue;
        }
        if c.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out.trim_matches('_').to_string()
}
