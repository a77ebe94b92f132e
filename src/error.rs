#[cfg(feature = "web")]
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading the solution list or writing a dashboard workbook
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read spreadsheet: {0}")]
    Read(#[from] calamine::Error),

    #[error("failed to write workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("input is missing required column '{column}'")]
    MissingColumn { column: String },

    #[error("row {row}: column '{column}' holds non-numeric value '{value}'")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("unsupported input file type '{0}' (expected .xlsx, .xls, .ods or .csv)")]
    UnsupportedExtension(String),

    #[error("input spreadsheet has no header row")]
    EmptyInput,
}

/// Errors raised while loading server configuration or the credential store
#[cfg(feature = "web")]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid port '{0}'")]
    InvalidPort(String),

    #[error("invalid credentials: {0}")]
    Credentials(String),

    #[error("invalid template: {0}")]
    Template(#[from] handlebars::TemplateError),
}

#[cfg(feature = "web")]
pub use api::ApiError;

#[cfg(feature = "web")]
mod api {
    use axum::{
        Json,
        http::StatusCode,
        response::{IntoResponse, Response},
    };
    use serde::Serialize;
    use thiserror::Error;

    /// Errors returned by the JSON routes of the gateway
    #[derive(Debug, Error)]
    pub enum ApiError {
        #[error("{0}")]
        BadRequest(String),

        #[error("{0}")]
        NotFound(String),

        #[error("{0}")]
        Unprocessable(String),

        #[error("Upload exceeds the size limit")]
        PayloadTooLarge,

        #[error("{0}")]
        Internal(String),
    }

    #[derive(Serialize)]
    struct ErrorBody {
        error: String,
    }

    impl ApiError {
        pub fn status(&self) -> StatusCode {
            match self {
                ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
                ApiError::NotFound(_) => StatusCode::NOT_FOUND,
                ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
                ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        }
    }

    impl From<std::io::Error> for ApiError {
        fn from(err: std::io::Error) -> Self {
            log::error!("I/O failure while handling request: {}", err);
            ApiError::Internal("Internal server error".to_string())
        }
    }

    impl IntoResponse for ApiError {
        fn into_response(self) -> Response {
            let body = ErrorBody {
                error: self.to_string(),
            };
            (self.status(), Json(body)).into_response()
        }
    }
}
