//! NextBus service errors

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use quick_xml::DeError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across the crate.
pub type Result<T> = anyhow::Result<T, Error>;

/// Domain level error type returned by the service.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Error {
    /// The upstream transit API has rejected the request because the daily
    /// request quota is used up.
    #[error("code: 429, description: quota_exceeded {0}")]
    QuotaExceeded(String),

    /// An upstream dependency failed or timed out while fulfilling the request.
    #[error("code: 502, description: {0}")]
    UpstreamUnavailable(String),

    /// The request referenced malformed input, such as an invalid coordinate
    /// pair or an unknown stop.
    #[error("code: 404, description: {0}")]
    InvalidInput(String),

    /// The requested resource could not be found.
    #[error("code: 404, description: {0}")]
    NotFound(String),

    /// The caller did not present a valid access key.
    #[error("code: 401, description: {0}")]
    Unauthorized(String),

    /// A payload could not be decoded.
    #[error("code: 500, description: invalid_format {0}")]
    InvalidFormat(String),

    /// A non recoverable internal error occurred.
    #[error("code: 500, description: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the stable error code associated with the variant.
    #[must_use]
    pub const fn code(&self) -> StatusCode {
        match self {
            Self::QuotaExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::InvalidInput(_) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::InvalidFormat(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error description without the status prefix.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::QuotaExceeded(d)
            | Self::UpstreamUnavailable(d)
            | Self::InvalidInput(d)
            | Self::NotFound(d)
            | Self::Unauthorized(d)
            | Self::InvalidFormat(d)
            | Self::Internal(d) => d.clone(),
        }
    }

    /// Whether the error signals that the upstream quota is exhausted.
    #[must_use]
    pub const fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded(_))
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        let chain = err.chain().map(ToString::to_string).collect::<Vec<_>>().join(" -> ");

        // if type is Error, return it with the newly added context
        if let Some(inner) = err.downcast_ref::<Self>() {
            tracing::debug!("Error: {err}, caused by: {inner}");

            return match inner {
                Self::QuotaExceeded(_) => Self::QuotaExceeded(chain),
                Self::UpstreamUnavailable(_) => Self::UpstreamUnavailable(chain),
                Self::InvalidInput(_) => Self::InvalidInput(chain),
                Self::NotFound(_) => Self::NotFound(chain),
                Self::Unauthorized(_) => Self::Unauthorized(chain),
                Self::InvalidFormat(e) => Self::InvalidFormat(format!("{err}: {e}")),
                Self::Internal(_) => Self::Internal(chain),
            };
        }

        // otherwise, return an Internal error
        Self::Internal(chain)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidFormat(err.to_string())
    }
}

impl From<DeError> for Error {
    fn from(err: DeError) -> Self {
        Self::InvalidFormat(format!("failed to deserialize message: {err}"))
    }
}

/// Body returned to HTTP callers for any failed request.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub struct HttpError {
    status: StatusCode,
    error: String,
}

impl From<Error> for HttpError {
    fn from(e: Error) -> Self {
        Self { status: e.code(), error: e.description() }
    }
}

impl From<anyhow::Error> for HttpError {
    fn from(e: anyhow::Error) -> Self {
        let status = e.downcast_ref().map_or(StatusCode::INTERNAL_SERVER_ERROR, Error::code);
        let error = e
            .downcast_ref::<Error>()
            .map_or_else(|| format!("{e}, caused by: {}", e.root_cause()), Error::description);
        Self { status, error }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.error })).into_response()
    }
}

#[macro_export]
macro_rules! invalid_input {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::InvalidInput(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::InvalidInput(format!($err))
    };
}

#[macro_export]
macro_rules! not_found {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::NotFound(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::NotFound(format!($err))
    };
}

#[macro_export]
macro_rules! unavailable {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::UpstreamUnavailable(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::UpstreamUnavailable(format!($err))
    };
}
