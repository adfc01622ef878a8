//! Error Handling tools

use std::{
    convert::Infallible,
    fmt,
    io::{ErrorKind, Error as IoError},
    error::Error as StdError
};

use crate::{http::StatusCode, origin::OriginError};

pub(crate) type BoxError = Box<
    dyn StdError
    + Send
    + Sync
>;

/// Generic error that travels through the middleware pipeline
#[derive(Debug)]
pub struct Error {
    /// HTTP status code
    pub status: StatusCode,

    /// Inner error object
    pub(crate) inner: BoxError,
}

/// Describes an invalid CORS configuration.
///
/// Returned by [`CorsConfig::build`](crate::CorsConfig::build) and [`CorsConfig::from_json`](crate::CorsConfig::from_json).
/// The middleware must not start with such a configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// An allow-list entry is neither `*` nor a valid `http`/`https` origin
    InvalidOrigin {
        /// The allow-list entry as it was configured
        origin: String,
        /// Why the entry could not be parsed
        source: OriginError,
    },

    /// Unknown domain matching strategy
    InvalidStrategy(String),

    /// A configured list could not be turned into an HTTP header value
    InvalidHeaderValue {
        /// Name of the header the value was computed for
        header: &'static str,
        /// The offending value
        value: String,
    },

    /// The configuration document is malformed
    Deserialize(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.inner.as_ref())
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidOrigin { origin, source } => write!(
                f,
                "CORS error: invalid origin `{origin}` in the allow list: {source}"
            ),
            ConfigError::InvalidStrategy(strategy) => write!(
                f,
                "CORS error: invalid domain strategy `{strategy}`, expected `strict` or `intermediate`"
            ),
            ConfigError::InvalidHeaderValue { header, value } => write!(
                f,
                "CORS error: `{value}` is not a valid value for the `{header}` header"
            ),
            ConfigError::Deserialize(err) => write!(f, "CORS error: invalid configuration: {err}"),
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::InvalidOrigin { source, .. } => Some(source),
            ConfigError::Deserialize(err) => Some(err),
            _ => None,
        }
    }
}

impl From<Infallible> for Error {
    fn from(infallible: Infallible) -> Error {
        match infallible {}
    }
}

impl From<IoError> for Error {
    #[inline]
    fn from(err: IoError) -> Self {
        let status = match err.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::InvalidData => StatusCode::BAD_REQUEST,
            ErrorKind::TimedOut => StatusCode::REQUEST_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR
        };

        Self { inner: err.into(), status }
    }
}

impl From<hyper::http::Error> for Error {
    #[inline]
    fn from(err: hyper::http::Error) -> Self {
        Self::server_error(err)
    }
}

impl From<ConfigError> for Error {
    #[inline]
    fn from(err: ConfigError) -> Self {
        Self::server_error(err)
    }
}

impl From<Error> for IoError {
    #[inline]
    fn from(err: Error) -> Self {
        Self::other(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    #[inline]
    fn from(err: serde_json::Error) -> Self {
        Self::Deserialize(err)
    }
}

impl Error {
    /// Creates an internal server error
    #[inline]
    pub fn server_error(err: impl Into<BoxError>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            inner: err.into(),
        }
    }

    /// Creates a client error
    #[inline]
    pub fn client_error(err: impl Into<BoxError>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            inner: err.into(),
        }
    }

    /// Creates [`Error`] from status code and underlying error
    #[inline]
    pub fn from_parts(status: StatusCode, err: impl Into<BoxError>) -> Self {
        Self { status, inner: err.into() }
    }

    /// Unwraps the error into a tuple of status code and underlying error
    pub fn into_parts(self) -> (StatusCode, BoxError) {
        (self.status, self.inner)
    }

    /// Check if the status is within 500-599.
    #[inline]
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// Check if the status is within 400-499.
    #[inline]
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }
}
