use crate::database::StoreError;
use crate::plans::{ImportError, PlanError};
use crate::suggest::SuggestError;
use crate::webdav::DavError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Errors returned by the JSON API, rendered as `{ "error": "..." }`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Missing NEXTCLOUD_* env vars (base URL, username, app password).")]
    MissingRemoteConfig,
    #[error("OPENAI_API_KEY is not set on server")]
    MissingApiKey,
    #[error("{message}")]
    Upstream { status: u16, message: String },
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::MissingRemoteConfig => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MissingApiKey | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("{} {}", status, self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<SuggestError> for ApiError {
    fn from(error: SuggestError) -> Self {
        match error {
            SuggestError::Validation(message) => ApiError::BadRequest(message),
            SuggestError::Upstream { status, .. } => ApiError::Upstream {
                status,
                message: error.to_string(),
            },
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<DavError> for ApiError {
    fn from(error: DavError) -> Self {
        ApiError::Internal(error.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        ApiError::Internal(error.to_string())
    }
}

impl From<PlanError> for ApiError {
    fn from(error: PlanError) -> Self {
        match error {
            PlanError::MissingImage => ApiError::BadRequest(error.to_string()),
            PlanError::Store(store) => store.into(),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(error: ImportError) -> Self {
        match error {
            ImportError::Store(store) => store.into(),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_status_passes_through() {
        let error: ApiError = SuggestError::Upstream {
            status: 429,
            body: "slow down".into(),
        }
        .into();
        assert_eq!(error.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(error.to_string(), "OpenAI error: slow down");

        let bogus = ApiError::Upstream {
            status: 42,
            message: "?".into(),
        };
        assert_eq!(bogus.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn taxonomy_maps_to_expected_statuses() {
        assert_eq!(
            ApiError::from(SuggestError::Validation("Invalid mode".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(SuggestError::Timeout("timed out".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::MissingRemoteConfig.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::MissingApiKey.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ApiError::from(ImportError::MissingPlans).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(DavError::Upstream {
                status: 401,
                body: "nope".into()
            })
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
