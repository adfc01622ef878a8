//! # Volga CORS
//!
//! > CORS (Cross-Origin Resource Sharing) middleware for [hyper](https://hyper.rs/) based services
//! > and the [Volga](https://github.com/RomanEmreis/volga) Web Framework.
//!
//! ## Features
//! * Strict and wildcard-subdomain (`https://*.example.com`) origin matching
//! * Preflight requests answered without reaching the endpoint
//! * Credentials-safe wildcard: the request origin is echoed instead of `*`
//! * Configuration validated once, headers pre-computed
//! * Builder and JSON configuration
//! * Runs on stable Rust 1.80+
//!
//! ## Example
//! ```toml
//! [dependencies]
//! volga-cors = "0.1.0"
//! tokio = { version = "1", features = ["full"] }
//! ```
//! ```no_run
//! use volga_cors::{CorsConfig, DomainStrategy, middleware::Middlewares, http::{body, Response}};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), volga_cors::error::ConfigError> {
//! let cors = CorsConfig::default()
//!     .with_strategy(DomainStrategy::Intermediate)
//!     .with_origins(["https://*.example.com"])
//!     .with_methods(["GET", "POST"])
//!     .with_credentials(true)
//!     .build()?;
//!
//! let mut middlewares = Middlewares::new();
//! middlewares.use_cors(cors);
//!
//! let pipeline = middlewares.compose(|_req| async {
//!     Ok(Response::new(body::full("Hello, World!")))
//! });
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(unreachable_pub)]

pub mod cors;
pub mod error;
pub mod headers;
pub mod http;
pub mod middleware;
pub mod origin;

pub use crate::cors::{Cors, CorsConfig, DomainStrategy};
pub use crate::error::{ConfigError, Error};
pub use crate::http::{
    HttpBody,
    HttpRequest,
    HttpResponse,
    HttpResult,
};
pub use crate::origin::{Origin, OriginError, Scheme};
