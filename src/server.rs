use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tracing::instrument;

use crate::application::pipeline::{self, PipelineError, UploadOutcome};
use crate::config::app_config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/fill-pdf", post(fill_pdf))
        .with_state(state)
}

#[derive(Serialize)]
struct MessageResp {
    message: String,
}

#[derive(Serialize)]
struct ErrorResp {
    error: String,
}

#[derive(Serialize)]
struct UploadResp {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct FillResp {
    message: String,
    output: String,
    upload: UploadResp,
}

async fn home() -> impl IntoResponse {
    Json(MessageResp {
        message: "PDF filler API is running".to_string(),
    })
}

#[instrument(skip(state))]
async fn fill_pdf(State(state): State<AppState>) -> Response {
    match pipeline::run(&state.config).await {
        Ok(outcome) => {
            let output = outcome.output_path.display().to_string();
            let upload = upload_resp(outcome.upload);
            (
                StatusCode::OK,
                Json(FillResp {
                    message: format!("PDF has been filled and saved as: {output}"),
                    output,
                    upload,
                }),
            )
                .into_response()
        }
        Err(report) => {
            tracing::error!("fill-pdf failed: {report:?}");
            (
                status_for(report.current_context()),
                Json(ErrorResp {
                    error: report.current_context().to_string(),
                }),
            )
                .into_response()
        }
    }
}

fn upload_resp(outcome: UploadOutcome) -> UploadResp {
    match outcome {
        UploadOutcome::Skipped => UploadResp {
            status: "skipped",
            file_id: None,
            link: None,
            error: None,
        },
        UploadOutcome::Uploaded { file_id } => UploadResp {
            status: "uploaded",
            link: Some(viewer_link(&file_id)),
            file_id: Some(file_id),
            error: None,
        },
        UploadOutcome::Failed { message } => UploadResp {
            status: "failed",
            file_id: None,
            link: None,
            error: Some(message),
        },
    }
}

fn status_for(error: &PipelineError) -> StatusCode {
    match error {
        PipelineError::NoData => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn viewer_link(file_id: &str) -> String {
    format!("https://drive.google.com/file/d/{file_id}/view")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::drive_config::DriveConfig;
    use crate::config::pdf_config::PdfConfig;
    use crate::config::server_config::ServerConfig;
    use crate::config::sheets_config::SheetsConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState {
            config: Arc::new(AppConfig {
                server: ServerConfig {
                    host: "127.0.0.1".into(),
                    port: 0,
                },
                sheets: SheetsConfig {
                    spreadsheet_name: "autofill".into(),
                },
                pdf: PdfConfig {
                    template_path: "template.pdf".into(),
                    output_path: "filled.pdf".into(),
                },
                drive: DriveConfig {
                    folder_id: "folder".into(),
                    upload_enabled: false,
                    upload_failure_fatal: false,
                },
            }),
        }
    }

    #[tokio::test]
    async fn home_route_reports_liveness() {
        let app = build_router(test_state());

        let resp = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(resp.status(), StatusCode::OK);

        let body = to_bytes(resp.into_body(), 1024 * 1024).await.expect("body");
        let v: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(v["message"], "PDF filler API is running");
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let app = build_router(test_state());

        let resp = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/nope")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn empty_sheet_maps_to_bad_request() {
        assert_eq!(status_for(&PipelineError::NoData), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn other_failures_map_to_internal_error() {
        for error in [
            PipelineError::Auth,
            PipelineError::SheetRead,
            PipelineError::TemplateRead,
            PipelineError::FormWrite,
            PipelineError::Upload,
        ] {
            assert_eq!(status_for(&error), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn viewer_link_points_at_the_drive_file() {
        assert_eq!(
            viewer_link("abc123"),
            "https://drive.google.com/file/d/abc123/view"
        );
    }

    #[test]
    fn failed_upload_response_carries_the_error() {
        let resp = upload_resp(UploadOutcome::Failed {
            message: "quota exceeded".to_string(),
        });
        assert_eq!(resp.status, "failed");
        assert_eq!(resp.error.as_deref(), Some("quota exceeded"));
        assert!(resp.file_id.is_none());
    }

    #[test]
    fn uploaded_response_carries_id_and_link() {
        let resp = upload_resp(UploadOutcome::Uploaded {
            file_id: "abc123".to_string(),
        });
        assert_eq!(resp.status, "uploaded");
        assert_eq!(resp.file_id.as_deref(), Some("abc123"));
        assert_eq!(
            resp.link.as_deref(),
            Some("https://drive.google.com/file/d/abc123/view")
        );
    }
}
