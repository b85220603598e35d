//! Blocking HTTP client for the extraction backend.
//!
//! Every call blocks; callers run them on a Bevy task pool or a dedicated
//! thread. Nothing here retries.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::io::Read;

use super::error::PipelineError;
use super::types::{
    ExtractPayload, ExtractResult, PageImage, Paper, PromptSet, SaveLayoutRequest,
    StatusResponse,
};
use crate::model::PageLayouts;

const USER_AGENT: &str = "pagemark";

/// Everything but RFC 3986 unreserved characters is escaped in a path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// `prefix/{filename}` with the filename escaped as one path segment.
fn paper_path(prefix: &str, filename: &str) -> String {
    format!("{}/{}", prefix, utf8_percent_encode(filename, PATH_SEGMENT))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineClient {
    base_url: String,
}

impl PipelineClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a server path (which must start with `/`).
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> Result<ureq::Response, PipelineError> {
        Ok(ureq::get(&self.url(path))
            .set("User-Agent", USER_AGENT)
            .call()?)
    }

    fn post_empty(&self, path: &str) -> Result<StatusResponse, PipelineError> {
        let response = ureq::post(&self.url(path))
            .set("User-Agent", USER_AGENT)
            .call()?;
        response.into_json::<StatusResponse>()?.into_result()
    }

    pub fn list_papers(&self) -> Result<Vec<Paper>, PipelineError> {
        Ok(self.get("/api/papers")?.into_json()?)
    }

    /// The system prompts the backend currently uses.
    pub fn fetch_prompts(&self) -> Result<PromptSet, PipelineError> {
        Ok(self.get("/api/config/prompts")?.into_json()?)
    }

    pub fn fetch_page(&self, filename: &str, page: usize) -> Result<PageImage, PipelineError> {
        Ok(self
            .get(&format!("{}/page/{}", paper_path("/api/pdf", filename), page))?
            .into_json()?)
    }

    /// Saved layout, or an empty one when the paper has none yet.
    pub fn load_layout(&self, filename: &str) -> Result<PageLayouts, PipelineError> {
        Ok(self.get(&paper_path("/api/layout", filename))?.into_json()?)
    }

    pub fn save_layout(&self, filename: &str, layout: &PageLayouts) -> Result<(), PipelineError> {
        let response = ureq::post(&self.url("/api/layout/save"))
            .set("User-Agent", USER_AGENT)
            .send_json(SaveLayoutRequest {
                filename,
                layout_data: layout,
            })?;
        response.into_json::<StatusResponse>()?.into_result()?;
        Ok(())
    }

    /// Start extraction in the background. Returns the server's message.
    pub fn trigger_extract(&self, filename: &str) -> Result<String, PipelineError> {
        let response = self.post_empty(&paper_path("/api/workflow/extract", filename))?;
        Ok(response.msg.unwrap_or_else(|| "Extraction started".to_string()))
    }

    pub fn fetch_extract(&self, filename: &str) -> Result<ExtractResult, PipelineError> {
        let payload: ExtractPayload = self
            .get(&paper_path("/api/extract", filename))?
            .into_json()?;
        Ok(payload.into())
    }

    pub fn trigger_translate(&self, filename: &str) -> Result<String, PipelineError> {
        let response = self.post_empty(&paper_path("/api/workflow/translate", filename))?;
        Ok(response.msg.unwrap_or_else(|| "Translation started".to_string()))
    }

    pub fn stop_translate(&self, filename: &str) -> Result<(), PipelineError> {
        self.post_empty(&paper_path("/api/workflow/stop", filename))?;
        Ok(())
    }

    /// Build the HTML report and return its absolute URL.
    pub fn generate_report(&self, filename: &str) -> Result<String, PipelineError> {
        let response =
            self.post_empty(&paper_path("/api/workflow/generate_report", filename))?;
        let url = response
            .url
            .ok_or_else(|| PipelineError::Decode("report response has no url".to_string()))?;
        if url.starts_with("http://") || url.starts_with("https://") {
            Ok(url)
        } else {
            Ok(self.url(&url))
        }
    }

    /// Open the translation progress stream (server-sent events).
    pub fn open_stream(&self, filename: &str) -> Result<Box<dyn Read + Send + Sync>, PipelineError> {
        let response = ureq::get(&self.url(&paper_path("/api/workflow/stream", filename)))
            .set("User-Agent", USER_AGENT)
            .set("Accept", "text/event-stream")
            .call()?;
        Ok(response.into_reader())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let client = PipelineClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/api/papers"), "http://localhost:8000/api/papers");
    }

    #[test]
    fn test_filenames_are_escaped_as_one_segment() {
        let client = PipelineClient::new("http://localhost:8000");
        assert_eq!(
            client.url(&paper_path("/api/layout", "Results #2 (50%).pdf")),
            "http://localhost:8000/api/layout/Results%20%232%20%2850%25%29.pdf"
        );
        assert_eq!(paper_path("/api/extract", "a/b?.pdf"), "/api/extract/a%2Fb%3F.pdf");
        assert_eq!(paper_path("/api/extract", "plain-name_v1.pdf"), "/api/extract/plain-name_v1.pdf");
        assert_eq!(paper_path("/api/extract", "Über.pdf"), "/api/extract/%C3%9Cber.pdf");
    }

    #[test]
    fn test_unreachable_server_is_a_transport_error() {
        // Port 9 (discard) is not expected to run an HTTP server
        let client = PipelineClient::new("http://127.0.0.1:9");
        assert!(matches!(
            client.list_papers(),
            Err(PipelineError::Transport(_))
        ));
    }
}
