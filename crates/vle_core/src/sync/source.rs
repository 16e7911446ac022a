//! Snapshot sources.
//!
//! # Responsibility
//! - Define the upstream seam the engine pulls one snapshot from.
//! - Provide the HTTP source used in production and a file source for
//!   operator replays.
//!
//! Retry and backoff are out of scope; one failed fetch fails the run.

use crate::config::{BasicAuthCredentials, VleConfig};
use crate::sync::snapshot::Snapshot;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

const SNAPSHOT_PATH: &str = "/local/messaging/";
const FETCH_TIMEOUT: Duration = Duration::from_secs(120);

/// Errors obtaining a snapshot.
#[derive(Debug)]
pub enum FetchError {
    /// Upstream answered with a non-success status; holds its error message.
    Upstream(String),
    /// Request could not be sent or the response could not be read.
    Transport(String),
    /// Payload is not a valid snapshot.
    Decode(String),
    Io(std::io::Error),
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upstream(message) => write!(f, "{message}"),
            Self::Transport(message) => write!(f, "snapshot request failed: {message}"),
            Self::Decode(message) => write!(f, "invalid snapshot payload: {message}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FetchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for FetchError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.to_string())
    }
}

/// Provider of one authoritative snapshot per call.
pub trait SnapshotSource {
    fn fetch(&self) -> Result<Snapshot, FetchError>;
}

/// Pulls the snapshot from `<moodle_wwwroot>/local/messaging/` with basic auth.
pub struct HttpSnapshotSource {
    client: Client,
    endpoint: String,
    credentials: BasicAuthCredentials,
}

impl HttpSnapshotSource {
    pub fn new(
        moodle_wwwroot: &str,
        credentials: BasicAuthCredentials,
    ) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: snapshot_endpoint(moodle_wwwroot),
            credentials,
        })
    }

    pub fn from_config(config: &VleConfig) -> Result<Self, FetchError> {
        Self::new(&config.moodle_wwwroot, config.sync_basic_auth.clone())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl SnapshotSource for HttpSnapshotSource {
    fn fetch(&self) -> Result<Snapshot, FetchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .basic_auth(
                &self.credentials.username,
                Some(&self.credentials.password),
            )
            .send()?;
        let status = response.status();
        let body = response.text()?;

        if status != StatusCode::OK {
            return Err(FetchError::Upstream(upstream_error_message(
                status.as_u16(),
                &body,
            )));
        }
        decode_snapshot(&body)
    }
}

/// Reads a snapshot payload saved to disk.
pub struct FileSnapshotSource {
    path: PathBuf,
}

impl FileSnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotSource for FileSnapshotSource {
    fn fetch(&self) -> Result<Snapshot, FetchError> {
        let body = std::fs::read_to_string(&self.path)?;
        decode_snapshot(&body)
    }
}

fn decode_snapshot(body: &str) -> Result<Snapshot, FetchError> {
    serde_json::from_str(body).map_err(|err| FetchError::Decode(err.to_string()))
}

#[derive(Deserialize)]
struct UpstreamErrorBody {
    #[serde(rename = "errorMessage")]
    error_message: String,
}

/// Extracts `errorMessage` from a non-success payload.
fn upstream_error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<UpstreamErrorBody>(body)
        .map(|payload| payload.error_message)
        .unwrap_or_else(|_| format!("VLE snapshot request failed with status {status}"))
}

fn snapshot_endpoint(moodle_wwwroot: &str) -> String {
    format!("{}{SNAPSHOT_PATH}", moodle_wwwroot.trim_end_matches('/'))
}
