//! HTTP request handlers
//!
//! Axum handlers for the training API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::{
    state::AppState, ApiResponse, HealthResponse, JobResponse, QueueResponse, QueueStatus,
    SubmitTrainingResponse,
};
use crate::registry::{ModelRecord, ModelSummary, RegistryError};
use crate::scheduler::{SubmitError, SubmitRequest};

/// Generate a request ID
fn request_id() -> String {
    format!("req-{:016x}", rand::random::<u64>())
}

/// Health check handler
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let overview = state.scheduler.queue_overview();
    let health = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.uptime_secs(),
        active_jobs: overview.active_jobs,
        total_jobs: overview.total_jobs,
    };

    (StatusCode::OK, Json(health))
}

/// Submit a dataset for training
pub async fn submit_training(
    State(state): State<AppState>,
    Json(payload): Json<SubmitRequest>,
) -> (StatusCode, Json<ApiResponse<SubmitTrainingResponse>>) {
    let req_id = request_id();

    match state.scheduler.submit(payload) {
        Ok(receipt) => {
            let response = SubmitTrainingResponse::from(&receipt);
            (StatusCode::CREATED, Json(ApiResponse::success(response, &req_id)))
        }
        Err(SubmitError::Rejected(report)) => {
            let response = SubmitTrainingResponse {
                job_id: None,
                status: None,
                queue_position: None,
                estimated_start: None,
                errors: report.errors,
                warnings: report.warnings,
                info: report.info,
                quality: Some(report.stats.quality),
                dataset_info: None,
            };
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ApiResponse::rejected(response, "Dataset validation failed", &req_id)),
            )
        }
        Err(SubmitError::BadSplit(rejection)) => {
            let response = SubmitTrainingResponse {
                job_id: None,
                status: None,
                queue_position: None,
                estimated_start: None,
                errors: vec![rejection.to_string()],
                warnings: Vec::new(),
                info: Vec::new(),
                quality: None,
                dataset_info: None,
            };
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ApiResponse::rejected(response, "Unusable train/val split", &req_id)),
            )
        }
    }
}

/// Get a job by ID
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<ApiResponse<JobResponse>>) {
    let req_id = request_id();

    match state.scheduler.status(&id) {
        Some(job) => {
            let response = JobResponse::from_job(&job, state.scheduler.config().log_tail);
            (StatusCode::OK, Json(ApiResponse::success(response, &req_id)))
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(&format!("Job not found: {id}"), &req_id)),
        ),
    }
}

/// Queue overview
pub async fn queue_status(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<QueueResponse>>) {
    let req_id = request_id();

    let overview = state.scheduler.queue_overview();
    let response = QueueResponse {
        queue_status: QueueStatus {
            active_jobs: overview.active_jobs,
            max_concurrent_jobs: overview.max_concurrent,
            queued_jobs: overview.queued_jobs,
            total_jobs: overview.total_jobs,
        },
        jobs: overview.jobs,
    };
    (StatusCode::OK, Json(ApiResponse::success(response, &req_id)))
}

/// List all ready models
pub async fn list_models(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<Vec<ModelSummary>>>) {
    let req_id = request_id();

    match state.registry.list() {
        Ok(models) => (StatusCode::OK, Json(ApiResponse::success(models, &req_id))),
        Err(e) => {
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiResponse::error(&e.to_string(), &req_id)))
        }
    }
}

/// Get a model by ID
pub async fn get_model(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<ApiResponse<ModelRecord>>) {
    let req_id = request_id();

    match state.registry.get(&id) {
        Ok(record) => (StatusCode::OK, Json(ApiResponse::success(record, &req_id))),
        Err(e @ RegistryError::NotFound(_)) => {
            (StatusCode::NOT_FOUND, Json(ApiResponse::error(&e.to_string(), &req_id)))
        }
        Err(e) => {
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiResponse::error(&e.to_string(), &req_id)))
        }
    }
}

/// Persist an externally built model record
pub async fn store_model(
    State(state): State<AppState>,
    Json(payload): Json<ModelRecord>,
) -> (StatusCode, Json<ApiResponse<String>>) {
    let req_id = request_id();

    let id = payload.id.clone();
    match state.registry.insert(payload) {
        Ok(()) => (StatusCode::CREATED, Json(ApiResponse::success(id, &req_id))),
        Err(e) => {
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiResponse::error(&e.to_string(), &req_id)))
        }
    }
}

/// Soft-delete a model
pub async fn delete_model(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<ApiResponse<bool>>) {
    let req_id = request_id();

    match state.registry.delete(&id) {
        Ok(true) => (StatusCode::OK, Json(ApiResponse::success(true, &req_id))),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(&format!("Model not found: {id}"), &req_id)),
        ),
        Err(e) => {
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiResponse::error(&e.to_string(), &req_id)))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{AnnotationMap, BoundingBox, ImageMeta, SplitCategory, TrainConfig};
    use crate::executor::SimulatedExecutor;
    use crate::scheduler::SchedulerConfig;
    use crate::server::ServerConfig;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn test_state() -> AppState {
        AppState::new(
            ServerConfig::default(),
            SchedulerConfig::default(),
            Arc::new(SimulatedExecutor::new().with_epoch_pause_ms(0)),
        )
    }

    fn submit_payload(image_count: usize) -> SubmitRequest {
        let images: Vec<ImageMeta> = (0..image_count)
            .map(|i| ImageMeta::new(&format!("img-{i}"), &format!("img-{i}.jpg"), 640, 480))
            .collect();
        let annotations: AnnotationMap = images
            .iter()
            .map(|img| (img.id.clone(), vec![BoundingBox::new("cat", 0.3, 0.3, 0.2, 0.2)]))
            .collect();
        let categories: HashMap<String, SplitCategory> = images
            .iter()
            .enumerate()
            .map(|(i, img)| {
                let c = if i + 2 < image_count { SplitCategory::Train } else { SplitCategory::Val };
                (img.id.clone(), c)
            })
            .collect();
        SubmitRequest {
            classes: vec!["cat".to_string()],
            images,
            annotations,
            config: TrainConfig::default().with_epochs(1),
            categories,
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        let state = test_state();
        let (status, Json(body)) = health_check(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "healthy");
    }

    #[tokio::test]
    async fn test_submit_training_created() {
        let state = test_state();
        let (status, Json(body)) = submit_training(State(state), Json(submit_payload(10))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body.success);
        let data = body.data.expect("submit response data");
        assert!(data.job_id.is_some());
        assert!(data.errors.is_empty());
    }

    #[tokio::test]
    async fn test_submit_training_rejected_with_errors() {
        let state = test_state();
        let (status, Json(body)) = submit_training(State(state), Json(submit_payload(3))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(!body.success);
        let data = body.data.expect("rejection carries structured errors");
        assert!(!data.errors.is_empty());
        assert!(data.job_id.is_none());
    }

    #[tokio::test]
    async fn test_submit_training_bad_split() {
        let state = test_state();
        let mut payload = submit_payload(10);
        for category in payload.categories.values_mut() {
            *category = SplitCategory::Train;
        }
        let (status, Json(body)) = submit_training(State(state), Json(payload)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let data = body.data.expect("rejection data");
        assert!(data.errors[0].contains("val=0"));
    }

    #[tokio::test]
    async fn test_get_job() {
        let state = test_state();
        let (_, Json(submitted)) =
            submit_training(State(state.clone()), Json(submit_payload(10))).await;
        let job_id = submitted.data.unwrap().job_id.unwrap();

        let (status, Json(body)) = get_job(State(state), Path(job_id.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.data.unwrap().id, job_id);
    }

    #[tokio::test]
    async fn test_get_job_not_found() {
        let state = test_state();
        let (status, _) = get_job(State(state), Path("job-999".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_queue_status() {
        let state = test_state();
        submit_training(State(state.clone()), Json(submit_payload(10))).await;

        let (status, Json(body)) = queue_status(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        let data = body.data.unwrap();
        assert_eq!(data.queue_status.max_concurrent_jobs, 2);
        assert_eq!(data.queue_status.total_jobs, 1);
    }

    #[tokio::test]
    async fn test_list_models_empty() {
        let state = test_state();
        let (status, Json(body)) = list_models(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.data.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_model_not_found() {
        let state = test_state();
        let (status, _) = get_model(State(state), Path("model-0".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_store_and_delete_model() {
        use crate::executor::{ArtifactMetadata, TrainingOutcome};
        use crate::registry::ModelRecord;

        let state = test_state();
        let record = ModelRecord::from_outcome(
            "job-1",
            TrainConfig::default(),
            vec!["cat".to_string()],
            TrainingOutcome {
                metrics: HashMap::new(),
                artifact: ArtifactMetadata {
                    name: "m.safetensors".to_string(),
                    format: "safetensors".to_string(),
                    size_bytes: 1,
                    checksum: "sha256-0".to_string(),
                },
            },
        );
        let id = record.id.clone();

        let (status, _) = store_model(State(state.clone()), Json(record)).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, Json(body)) = delete_model(State(state.clone()), Path(id.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.data, Some(true));

        // Second delete: already gone from the active listing
        let (status, _) = delete_model(State(state), Path(id)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
