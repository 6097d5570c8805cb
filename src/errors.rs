// Error taxonomy for the bridge
//
// Every failure a handler can hit maps onto one of these variants. The tool
// registry converts them into the uniform result envelope; callers decide
// whether to retry based on the category string.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// Bad or missing input, detected before any side effect.
    #[error("invalid parameters: {0}")]
    Schema(String),

    /// External process did not exit within its time budget and was killed.
    #[error("process timed out after {}s", .0.as_secs())]
    ProcessTimeout(Duration),

    /// External process exited with a non-zero code.
    #[error("process exited with code {code}: {stderr}")]
    ProcessFailure { code: i32, stderr: String },

    /// Process reported success but the expected output file is absent.
    #[error("tool did not produce expected output: {}", .0.display())]
    ArtifactMissing(PathBuf),

    /// The Nova editor endpoint could not be reached at all.
    #[error("cannot reach Nova editor at {host}:{port} - is the editor running? ({detail})")]
    Connection {
        host: String,
        port: u16,
        detail: String,
    },

    /// The Nova editor accepted the connection but did not answer in time.
    #[error("Nova request timed out after {}s", .0.as_secs())]
    RemoteTimeout(Duration),

    /// Non-2xx reply from the Nova editor.
    #[error("Nova returned HTTP {status}: {body}")]
    RemoteProtocol { status: u16, body: String },

    /// Generation provider reported failure or exhausted the poll budget.
    #[error("generation provider failed: {0}")]
    Provider(String),

    /// Download failed: non-2xx status or too many redirects.
    #[error("download failed: {0}")]
    Download(String),
}

impl BridgeError {
    /// Stable category name surfaced in error envelopes so agents can pick
    /// a retry policy without parsing the message.
    pub fn category(&self) -> &'static str {
        match self {
            BridgeError::Schema(_) => "schema",
            BridgeError::ProcessTimeout(_) => "process_timeout",
            BridgeError::ProcessFailure { .. } => "process_failure",
            BridgeError::ArtifactMissing(_) => "artifact_missing",
            BridgeError::Connection { .. } => "connection",
            BridgeError::RemoteTimeout(_) => "remote_timeout",
            BridgeError::RemoteProtocol { .. } => "remote_protocol",
            BridgeError::Provider(_) => "provider",
            BridgeError::Download(_) => "download",
        }
    }
}
