//! Tools for HTTP headers

// Re-exporting HeaderMap, HeaderValue and the CORS related headers from hyper
pub use hyper::{
    header::{
        InvalidHeaderValue,
        ToStrError,
        ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
        ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_EXPOSE_HEADERS, ACCESS_CONTROL_MAX_AGE,
        ACCESS_CONTROL_REQUEST_HEADERS, ACCESS_CONTROL_REQUEST_METHOD,
        ORIGIN,
        VARY,
    },
    http::{HeaderName, HeaderValue},
    HeaderMap
};
