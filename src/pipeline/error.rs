use thiserror::Error;

/// Failure talking to the extraction backend.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not reach the server: {0}")]
    Transport(String),
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("{0}")]
    Backend(String),
}

impl From<ureq::Error> for PipelineError {
    fn from(error: ureq::Error) -> Self {
        match error {
            ureq::Error::Status(status, response) => PipelineError::Status {
                status,
                body: response.into_string().unwrap_or_default(),
            },
            ureq::Error::Transport(transport) => PipelineError::Transport(transport.to_string()),
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(error: std::io::Error) -> Self {
        PipelineError::Decode(error.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(error: serde_json::Error) -> Self {
        PipelineError::Decode(error.to_string())
    }
}
