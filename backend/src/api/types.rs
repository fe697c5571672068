//! REST API types for the dashboard frontend.
//!
//! Every panel endpoint answers with the same envelope; the panel itself is
//! serialized as-is (tables become arrays of records).

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::PipelineError;
use crate::transform::panels::Panel;

/// Envelope status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelStatus {
    /// Panel has data to draw
    Ready,
    /// Valid request, nothing to draw
    Empty,
    Error,
}

/// Response sent to the frontend for one panel.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelResponse<P> {
    /// Unique request identifier
    pub request_id: String,

    pub status: PanelStatus,

    pub panel: P,
}

impl<P: Panel> From<P> for PanelResponse<P> {
    fn from(panel: P) -> Self {
        let status = if panel.is_empty() {
            PanelStatus::Empty
        } else {
            PanelStatus::Ready
        };
        PanelResponse {
            request_id: Uuid::new_v4().to_string(),
            status,
            panel,
        }
    }
}

/// HTTP status for a pipeline failure.
///
/// Missing columns mean the dataset does not fit the panel (422); bad query
/// values are the caller's fault (400); anything else is ours (500).
pub fn status_for(error: &PipelineError) -> StatusCode {
    match error {
        PipelineError::Shape(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        PipelineError::Csv(_) | PipelineError::Validation(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "requestId": Uuid::new_v4().to_string(),
        "status": PanelStatus::Error,
        "error": error,
        "panel": null
    })
}
