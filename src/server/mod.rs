//! REST/HTTP API Server
//!
//! Collaborator-facing surface for the training core: dataset submission,
//! job status polling, queue overview, and model registry access. The
//! annotation front end only ever talks to the core through these
//! request/response contracts.
//!
//! # Example
//!
//! ```ignore
//! use adiestrar::server::{serve, AppState, ServerConfig};
//!
//! let state = AppState::simulated(ServerConfig::default());
//! serve(state).await?;
//! ```

#[cfg(feature = "server")]
mod api;
#[cfg(feature = "server")]
mod handlers;
#[cfg(feature = "server")]
mod state;

#[cfg(feature = "server")]
pub use api::*;
#[cfg(feature = "server")]
pub use handlers::*;
#[cfg(feature = "server")]
pub use state::*;

use std::collections::HashMap;
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dataset::DatasetInfo;
use crate::scheduler::{SubmitReceipt, TrainingJob};
use crate::validate::QualityFlags;

/// Server errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Bind error: {0}")]
    Bind(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Feature disabled: {0}")]
    FeatureDisabled(String),
}

/// Result type for server operations
pub type Result<T> = std::result::Result<T, ServerError>;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server address
    pub address: SocketAddr,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:5000".parse().unwrap(),
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl ServerConfig {
    /// Create config with custom address
    pub fn with_address(mut self, addr: SocketAddr) -> Self {
        self.address = addr;
        self
    }

    /// Set the maximum request body size
    pub fn with_max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }
}

/// API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (if any)
    pub data: Option<T>,
    /// Error message (if failed)
    pub error: Option<String>,
    /// Request ID for tracing
    pub request_id: String,
}

impl<T> ApiResponse<T> {
    /// Create success response
    pub fn success(data: T, request_id: &str) -> Self {
        Self { success: true, data: Some(data), error: None, request_id: request_id.to_string() }
    }

    /// Create error response
    pub fn error(message: &str, request_id: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.to_string()),
            request_id: request_id.to_string(),
        }
    }

    /// Create failure response that still carries structured data
    /// (rejections return their full error/warning lists)
    pub fn rejected(data: T, message: &str, request_id: &str) -> Self {
        Self {
            success: false,
            data: Some(data),
            error: Some(message.to_string()),
            request_id: request_id.to_string(),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Server status
    pub status: String,
    /// Server version
    pub version: String,
    /// Uptime in seconds
    pub uptime_secs: u64,
    /// Jobs currently running
    pub active_jobs: usize,
    /// All jobs known to the scheduler
    pub total_jobs: usize,
}

// =============================================================================
// Request/Response DTOs
// =============================================================================

/// Submission outcome
///
/// On success the job fields are populated; on rejection they are absent
/// and `errors` holds the blocking problems. Warnings and info travel in
/// both cases so the caller always sees the full validation picture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitTrainingResponse {
    /// Created job id (absent on rejection)
    pub job_id: Option<String>,
    /// Job status at submission time
    pub status: Option<String>,
    /// 1-indexed queue position if the job had to wait
    pub queue_position: Option<usize>,
    /// Advisory start hint (RFC 3339)
    pub estimated_start: Option<String>,
    /// Blocking validation errors
    pub errors: Vec<String>,
    /// Advisory validation warnings
    pub warnings: Vec<String>,
    /// Informational validation notes
    pub info: Vec<String>,
    /// Derived quality flags
    pub quality: Option<QualityFlags>,
    /// Dataset summary
    pub dataset_info: Option<DatasetInfo>,
}

impl From<&SubmitReceipt> for SubmitTrainingResponse {
    fn from(receipt: &SubmitReceipt) -> Self {
        Self {
            job_id: Some(receipt.job.id.clone()),
            status: Some(receipt.job.status.to_string()),
            queue_position: receipt.job.queue_position,
            estimated_start: receipt.job.estimated_start.map(|t| t.to_rfc3339()),
            errors: Vec::new(),
            warnings: receipt.warnings.clone(),
            info: receipt.info.clone(),
            quality: Some(receipt.quality.clone()),
            dataset_info: Some(receipt.dataset_info.clone()),
        }
    }
}

/// A job log line with an RFC 3339 timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLine {
    pub timestamp: String,
    pub message: String,
}

/// Job status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResponse {
    /// Job ID
    pub id: String,
    /// Lifecycle status
    pub status: String,
    /// Percent complete
    pub progress: u8,
    /// Epoch last reported by the executor
    pub current_epoch: u32,
    /// Total epochs configured
    pub total_epochs: u32,
    /// Most recent log lines (bounded by the scheduler's log tail)
    pub logs: Vec<LogLine>,
    /// Advisory seconds remaining, if derivable
    pub estimated_time_remaining_secs: Option<i64>,
    /// Final metrics (completed jobs only)
    pub metrics: Option<HashMap<String, f64>>,
    /// Registered model id (completed jobs only)
    pub model_id: Option<String>,
    /// Failure reason (failed jobs only)
    pub error: Option<String>,
    /// Queue position (queued jobs only)
    pub queue_position: Option<usize>,
    /// Start time (RFC 3339)
    pub started_at: Option<String>,
    /// Completion time (RFC 3339)
    pub completed_at: Option<String>,
}

impl JobResponse {
    /// Build from a job snapshot, keeping only the last `log_tail` lines
    pub fn from_job(job: &TrainingJob, log_tail: usize) -> Self {
        Self {
            id: job.id.clone(),
            status: job.status.to_string(),
            progress: job.progress,
            current_epoch: job.current_epoch,
            total_epochs: job.total_epochs,
            logs: job
                .recent_logs(log_tail)
                .iter()
                .map(|l| LogLine {
                    timestamp: l.timestamp.to_rfc3339(),
                    message: l.message.clone(),
                })
                .collect(),
            estimated_time_remaining_secs: job.estimated_time_remaining(),
            metrics: job.metrics.clone(),
            model_id: job.model_id.clone(),
            error: job.error.clone(),
            queue_position: job.queue_position,
            started_at: job.started_at.map(|t| t.to_rfc3339()),
            completed_at: job.completed_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Queue occupancy block of the queue response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStatus {
    pub active_jobs: usize,
    pub max_concurrent_jobs: usize,
    pub queued_jobs: usize,
    pub total_jobs: usize,
}

/// Queue overview response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueResponse {
    /// Occupancy counters
    pub queue_status: QueueStatus,
    /// Per-job summaries in submission order
    pub jobs: Vec<crate::scheduler::JobSummary>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::JobStatus;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.address.port(), 5000);
        assert_eq!(config.max_body_size, 10 * 1024 * 1024);
    }

    #[test]
    fn test_server_config_with_address() {
        let addr: SocketAddr = "0.0.0.0:8080".parse().unwrap();
        let config = ServerConfig::default().with_address(addr);
        assert_eq!(config.address.port(), 8080);
    }

    #[test]
    fn test_api_response_success() {
        let response = ApiResponse::success("hello", "req-123");
        assert!(response.success);
        assert_eq!(response.data, Some("hello"));
        assert!(response.error.is_none());
    }

    #[test]
    fn test_api_response_error() {
        let response: ApiResponse<String> = ApiResponse::error("not found", "req-456");
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.error, Some("not found".to_string()));
    }

    #[test]
    fn test_api_response_rejected_keeps_data() {
        let response = ApiResponse::rejected(vec!["no classes"], "rejected", "req-789");
        assert!(!response.success);
        assert_eq!(response.data, Some(vec!["no classes"]));
        assert!(response.error.is_some());
    }

    #[test]
    fn test_submit_response_deserialize() {
        let json = r#"{
            "job_id": "job-1", "status": "queued", "queue_position": 1,
            "estimated_start": null, "errors": [], "warnings": ["Small dataset"],
            "info": [], "quality": null, "dataset_info": null
        }"#;
        let response: SubmitTrainingResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.job_id.as_deref(), Some("job-1"));
        assert_eq!(response.warnings.len(), 1);
    }

    #[test]
    fn test_queue_response_serialize() {
        let response = QueueResponse {
            queue_status: QueueStatus {
                active_jobs: 2,
                max_concurrent_jobs: 2,
                queued_jobs: 3,
                total_jobs: 5,
            },
            jobs: Vec::new(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"queued_jobs\":3"));
    }

    #[test]
    fn test_job_status_string_in_dto() {
        assert_eq!(JobStatus::Queued.to_string(), "queued");
        assert_eq!(JobStatus::Completed.to_string(), "completed");
    }
}
