//! Base HTTP tools

// Re-exporting HTTP status codes, method, request and response types from hyper/http
pub use hyper::{
    http::Method,
    Request,
    Response,
    StatusCode,
};

pub use body::HttpBody;

pub mod body;

/// HTTP request that travels through the middleware pipeline
pub type HttpRequest = Request<HttpBody>;

/// HTTP response produced by an endpoint or a middleware
pub type HttpResponse = Response<HttpBody>;

/// Result of a middleware or an endpoint
pub type HttpResult = Result<HttpResponse, crate::error::Error>;
