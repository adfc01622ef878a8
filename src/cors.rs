//! CORS (Cross-Origin Resource Sharing) policy
//!
//! Resolves the `Access-Control-Allow-Origin` value for a request
//! and writes the CORS response headers.

use std::{fmt, sync::Arc};
use hyper::{http::HeaderValue, HeaderMap};
use smallvec::SmallVec;

use crate::{
    headers::{
        ACCESS_CONTROL_ALLOW_CREDENTIALS,
        ACCESS_CONTROL_ALLOW_HEADERS,
        ACCESS_CONTROL_ALLOW_METHODS,
        ACCESS_CONTROL_ALLOW_ORIGIN,
        ACCESS_CONTROL_EXPOSE_HEADERS,
        ACCESS_CONTROL_MAX_AGE,
        ACCESS_CONTROL_REQUEST_HEADERS,
        VARY,
    },
    http::{body, StatusCode},
    origin::Origin,
    HttpRequest,
    HttpResponse,
};

use matcher::{AllowedOrigin, OriginMatcher};

pub mod config;
pub(crate) mod matcher;

pub use config::CorsConfig;
pub use matcher::DomainStrategy;

pub(crate) const WILDCARD_STR: &str = "*";
pub(crate) const SEPARATOR: &str = ", ";

const WILDCARD_VALUE: HeaderValue = HeaderValue::from_static(WILDCARD_STR);
const TRUE_VALUE: HeaderValue = HeaderValue::from_static("true");
const EMPTY_VALUE: HeaderValue = HeaderValue::from_static("");
const ORIGIN_VALUE: HeaderValue = HeaderValue::from_static("Origin");
const REQUEST_METHOD_VALUE: HeaderValue = HeaderValue::from_static("Access-Control-Request-Method");
const REQUEST_HEADERS_VALUE: HeaderValue = HeaderValue::from_static("Access-Control-Request-Headers");

/// Predicate that bypasses CORS processing for a request when it returns `true`
pub type Skipper = Arc<
    dyn Fn(&HttpRequest) -> bool
    + Send
    + Sync
>;

/// Immutable CORS policy built by [`CorsConfig::build`]
///
/// Every header value is computed once, so evaluating a request
/// only compares origins and clones header values.
/// Share it between requests with an [`Arc`].
#[derive(Clone)]
pub struct Cors {
    skip: Option<Skipper>,
    matcher: &'static dyn OriginMatcher,
    allow_credentials: bool,
    allow_any_origin: bool,
    allow_origins: SmallVec<[AllowedOrigin; 4]>,
    allow_methods: HeaderValue,
    allow_headers: Option<HeaderValue>,
    expose_headers: Option<HeaderValue>,
    max_age: Option<HeaderValue>,
}

impl fmt::Debug for Cors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cors")
            .field("skip", &self.skip.as_ref().map(|_| ".."))
            .field("matcher", &self.matcher)
            .field("allow_credentials", &self.allow_credentials)
            .field("allow_any_origin", &self.allow_any_origin)
            .field("allow_origins", &self.allow_origins)
            .field("allow_methods", &self.allow_methods)
            .field("allow_headers", &self.allow_headers)
            .field("expose_headers", &self.expose_headers)
            .field("max_age", &self.max_age)
            .finish()
    }
}

impl Cors {
    /// Returns `true` if the request must bypass CORS processing
    #[inline]
    pub fn skips(&self, req: &HttpRequest) -> bool {
        self.skip.as_ref().is_some_and(|skip| skip(req))
    }

    /// Resolves the value for the [`Access-Control-Allow-Origin`](https://developer.mozilla.org/en-US/docs/Web/HTTP/Reference/Headers/Access-Control-Allow-Origin)
    /// HTTP header from the request's `Origin` header value.
    ///
    /// Returns `None` if the origin is not allowed. An empty `Origin` is treated as a missing one.
    pub fn allow_origin(&self, origin: Option<&HeaderValue>) -> Option<HeaderValue> {
        let origin = origin.filter(|o| !o.is_empty());

        if self.allow_any_origin {
            // the wildcard can't be sent along with credentials, so the origin is echoed
            return if self.allow_credentials {
                origin.cloned()
            } else {
                Some(WILDCARD_VALUE)
            };
        }

        let origin = origin?;
        let Ok(raw) = origin.to_str() else {
            #[cfg(feature = "tracing")]
            tracing::debug!("CORS: rejected non UTF-8 origin");
            return None;
        };

        let parsed = match Origin::parse(raw) {
            Ok(parsed) if parsed.has_wildcard() => {
                #[cfg(feature = "tracing")]
                tracing::debug!("CORS: rejected wildcard request origin `{raw}`");
                return None;
            }
            Ok(parsed) => parsed,
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("CORS: rejected origin `{raw}`: {_err}");
                return None;
            }
        };

        let allowed = self.allow_origins
            .iter()
            .find(|allowed| self.matcher.matches(raw, &parsed, allowed))
            .map(|allowed| allowed.echo(origin));

        #[cfg(feature = "tracing")]
        if allowed.is_none() {
            tracing::debug!("CORS: origin `{raw}` is not allowed");
        }

        allowed
    }

    /// Writes the CORS headers of an actual (non-preflight) request response
    pub fn apply_normal_response(&self, headers: &mut HeaderMap, origin: Option<HeaderValue>) {
        headers.append(VARY, ORIGIN_VALUE);

        let Some(origin) = origin.filter(|o| !o.is_empty()) else {
            return;
        };

        self.apply_credentials(headers, &origin);
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);

        if let Some(expose_headers) = &self.expose_headers {
            headers.insert(ACCESS_CONTROL_EXPOSE_HEADERS, expose_headers.clone());
        }
    }

    /// Creates the `204 No Content` response to a preflight request
    ///
    /// `request_headers` are the headers of the preflight request,
    /// `origin` is the value resolved by [`Cors::allow_origin`].
    pub fn preflight_response(&self, request_headers: &HeaderMap, origin: Option<HeaderValue>) -> HttpResponse {
        let mut response = HttpResponse::new(body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;

        self.apply_preflight_response(response.headers_mut(), request_headers, origin);
        response
    }

    #[inline]
    fn apply_preflight_response(
        &self,
        headers: &mut HeaderMap,
        request_headers: &HeaderMap,
        origin: Option<HeaderValue>
    ) {
        headers.append(VARY, ORIGIN_VALUE);
        headers.append(VARY, REQUEST_METHOD_VALUE);
        headers.append(VARY, REQUEST_HEADERS_VALUE);

        let origin = origin.unwrap_or(EMPTY_VALUE);
        self.apply_credentials(headers, &origin);
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.clone());

        let allow_headers = self.allow_headers
            .as_ref()
            .or_else(|| request_headers
                .get(ACCESS_CONTROL_REQUEST_HEADERS)
                .filter(|h| !h.is_empty()));
        if let Some(allow_headers) = allow_headers {
            headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, allow_headers.clone());
        }

        if let Some(max_age) = &self.max_age {
            headers.insert(ACCESS_CONTROL_MAX_AGE, max_age.clone());
        }
    }

    #[inline]
    fn apply_credentials(&self, headers: &mut HeaderMap, origin: &HeaderValue) {
        if self.allow_credentials && !origin.is_empty() && origin != WILDCARD_STR {
            headers.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, TRUE_VALUE);
        }
    }
}
