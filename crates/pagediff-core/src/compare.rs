//! Compare service backends
//!
//! The service takes two documents and answers with the ordered difference
//! list plus per-document metadata. [`HttpCompareBackend`] talks to a running
//! service through `curl`; [`ReportCompareBackend`] replays a saved response.

use crate::model::{CompareResponse, ModelError};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/compare";

#[derive(Error, Debug)]
pub enum CompareError {
    #[error("Could not reach compare service: {0}")]
    Network(String),
    #[error("Compare service failed ({status}): {detail}")]
    Service { status: u16, detail: String },
    #[error("Malformed compare response: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Invalid compare response: {0}")]
    Invalid(#[from] ModelError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub trait CompareBackend: Send + Sync {
    fn compare(&self, a: &Path, b: &Path) -> Result<CompareResponse, CompareError>;

    /// Short description for the status bar
    fn describe(&self) -> String;
}

/// Parse and validate a response body. Invalid records reject the whole
/// response.
pub fn parse_response(body: &str) -> Result<CompareResponse, CompareError> {
    let response: CompareResponse = serde_json::from_str(body)?;
    response.validate()?;
    Ok(response)
}

/// Write a response so it can be replayed with [`ReportCompareBackend`]
pub fn save_report(path: &Path, response: &CompareResponse) -> Result<(), CompareError> {
    let json = serde_json::to_string_pretty(response)?;
    fs::write(path, json)?;
    Ok(())
}

/// Compare service reached over HTTP with a `curl` subprocess
#[derive(Debug, Clone)]
pub struct HttpCompareBackend {
    endpoint: String,
    curl: PathBuf,
    timeout: Option<Duration>,
}

impl HttpCompareBackend {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            curl: PathBuf::from("curl"),
            timeout: None,
        }
    }

    pub fn with_curl(mut self, curl: impl Into<PathBuf>) -> Self {
        self.curl = curl.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Default for HttpCompareBackend {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl CompareBackend for HttpCompareBackend {
    fn compare(&self, a: &Path, b: &Path) -> Result<CompareResponse, CompareError> {
        for path in [a, b] {
            if !path.is_file() {
                return Err(CompareError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{} does not exist", path.display()),
                )));
            }
        }

        let mut cmd = Command::new(&self.curl);
        cmd.arg("-sS")
            .arg("-X")
            .arg("POST")
            .arg("-F")
            .arg(format!("file1=@{}", a.display()))
            .arg("-F")
            .arg(format!("file2=@{}", b.display()))
            .arg("-w")
            .arg("\n%{http_code}");
        if let Some(timeout) = self.timeout {
            cmd.arg("--max-time").arg(timeout.as_secs().max(1).to_string());
        }
        let output = cmd.arg(&self.endpoint).output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(CompareError::Network(if stderr.is_empty() {
                format!("curl exited with {}", output.status)
            } else {
                stderr
            }));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let (body, status) = split_status(&stdout)?;
        if !(200..300).contains(&status) {
            return Err(CompareError::Service {
                status,
                detail: error_detail(body),
            });
        }
        parse_response(body)
    }

    fn describe(&self) -> String {
        self.endpoint.clone()
    }
}

/// Split curl output written with `-w "\n%{http_code}"` into body and status
fn split_status(output: &str) -> Result<(&str, u16), CompareError> {
    let trimmed = output.trim_end();
    let (body, code) = trimmed.rsplit_once('\n').unwrap_or(("", trimmed));
    let status = code
        .trim()
        .parse::<u16>()
        .map_err(|_| CompareError::Network(format!("unexpected curl output: {code}")))?;
    if status == 0 {
        return Err(CompareError::Network("no response from server".to_string()));
    }
    Ok((body, status))
}

/// `detail` field of an error body, or the body itself
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Replays a saved compare response regardless of the inputs
#[derive(Debug, Clone)]
pub struct ReportCompareBackend {
    path: PathBuf,
}

impl ReportCompareBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CompareBackend for ReportCompareBackend {
    fn compare(&self, _a: &Path, _b: &Path) -> Result<CompareResponse, CompareError> {
        let body = fs::read_to_string(&self.path)?;
        parse_response(&body)
    }

    fn describe(&self) -> String {
        format!("report {}", self.path.display())
    }
}
