//! Error types for the Tranco API client.
//!
//! # Design
//! Every public operation fails with an [`Error`] that records which call
//! failed ([`Operation`]) and what went wrong ([`ErrorKind`]). Callers that
//! only care about the class of failure match on `err.kind()`; the `Display`
//! output carries both parts for logs.
//!
//! Non-2xx responses become [`ApiError`]. When the body is not a valid
//! `{code, message}` payload the status alone is kept and the parse failure
//! is discarded, so the service's original detail is unrecoverable in that
//! case.

use std::fmt;

/// Boxed cause carried by [`TransportError::Http`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The client call an [`Error`] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GetRanks,
    GetListMetadataById,
    GetListMetadataByDate,
    AuthTest,
    CreateList,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::GetRanks => "get ranks",
            Operation::GetListMetadataById => "get list metadata by id",
            Operation::GetListMetadataByDate => "get list metadata by date",
            Operation::AuthTest => "auth test",
            Operation::CreateList => "create list",
        };
        f.write_str(name)
    }
}

/// Error returned by every `TrancoClient` operation.
#[derive(Debug, thiserror::Error)]
#[error("{operation} failed: {kind}")]
pub struct Error {
    operation: Operation,
    #[source]
    kind: ErrorKind,
}

impl Error {
    pub fn new(operation: Operation, kind: impl Into<ErrorKind>) -> Self {
        Self {
            operation,
            kind: kind.into(),
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }

    /// The service error, if the call failed with a non-2xx status.
    pub fn api_error(&self) -> Option<&ApiError> {
        match &self.kind {
            ErrorKind::Api(err) => Some(err),
            _ => None,
        }
    }
}

/// Classification of a failed call.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// A caller-supplied argument was rejected before any request was sent.
    #[error("invalid argument: {0}")]
    Validation(String),

    /// An authenticated call was attempted without usable credentials.
    #[error("client misconfigured: {0}")]
    Configuration(String),

    /// The request never produced a response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A 2xx response body did not match the expected shape.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The request payload could not be serialized to JSON.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// The service answered with a non-2xx status.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Non-2xx response from the Tranco API.
///
/// `code` is 0 and `message` is empty when the response body could not be
/// parsed as an error payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub http_status: u16,
    pub code: i64,
    pub message: String,
}

impl ApiError {
    pub fn status_only(http_status: u16) -> Self {
        Self {
            http_status,
            code: 0,
            message: String::new(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            return write!(f, "request failed with status code {}", self.http_status);
        }
        write!(
            f,
            "StatusCode: {}, Code: {}, Message: {}",
            self.http_status, self.code, self.message
        )
    }
}

impl std::error::Error for ApiError {}

/// Failure to complete the HTTP round trip.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request cancelled")]
    Cancelled,

    #[error("request timed out")]
    TimedOut,

    #[error("HTTP transport failed: {0}")]
    Http(#[source] BoxError),
}

/// Failure to map a successful response body into a domain value.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("cannot parse response body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed field `{field}`: {value:?} is not {expected}")]
    Field {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
}
