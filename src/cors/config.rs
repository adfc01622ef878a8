//! CORS (Cross-Origin Resource Sharing) configuration

use std::{fmt, sync::Arc, time::Duration};
use hyper::http::HeaderValue;
use serde::{Deserialize, Deserializer};
use smallvec::SmallVec;

use crate::{error::ConfigError, HttpRequest};
use super::{
    matcher::{AllowedOrigin, DomainStrategy},
    Cors,
    Skipper,
    SEPARATOR,
    WILDCARD_STR,
};

/// Represents the CORS (Cross-Origin Resource Sharing) Middleware configuration options
///
/// The configuration is validated once by [`CorsConfig::build`],
/// which turns it into an immutable [`Cors`] policy.
///
/// # Example
/// ```no_run
/// use volga_cors::{CorsConfig, DomainStrategy};
///
/// let cors = CorsConfig::default()
///     .with_strategy(DomainStrategy::Intermediate)
///     .with_origins(["https://*.example.com"])
///     .with_methods(["GET", "POST"])
///     .with_credentials(true)
///     .with_max_age(3600)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone, Default, Deserialize)]
#[serde(try_from = "ConfigDocument")]
pub struct CorsConfig {
    skip: Option<Skipper>,
    domain_strategy: DomainStrategy,
    allow_origins: Vec<String>,
    allow_methods: Vec<String>,
    allow_headers: Vec<String>,
    allow_credentials: bool,
    expose_headers: Vec<String>,
    max_age: Option<Duration>,
}

/// Raw configuration document, validated by [`CorsConfig::try_from`]
#[derive(Default, Deserialize)]
#[serde(default)]
struct ConfigDocument {
    domain_strategy: Option<String>,
    allow_origins: Vec<String>,
    allow_methods: Vec<String>,
    allow_headers: Vec<String>,
    allow_credentials: bool,
    expose_headers: Vec<String>,
    #[serde(deserialize_with = "deserialize_max_age")]
    max_age: Option<Duration>,
}

impl fmt::Debug for CorsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorsConfig")
            .field("skip", &self.skip.as_ref().map(|_| ".."))
            .field("domain_strategy", &self.domain_strategy)
            .field("allow_origins", &self.allow_origins)
            .field("allow_methods", &self.allow_methods)
            .field("allow_headers", &self.allow_headers)
            .field("allow_credentials", &self.allow_credentials)
            .field("expose_headers", &self.expose_headers)
            .field("max_age", &self.max_age)
            .finish()
    }
}

impl CorsConfig {
    /// Reads a configuration from a JSON document.
    ///
    /// Keys: `domain_strategy` (`"strict"` or `"intermediate"`), `allow_origins`,
    /// `allow_methods`, `allow_headers`, `allow_credentials`, `expose_headers`, `max_age`.
    /// Every key is optional.
    ///
    /// # Example
    /// ```no_run
    /// use volga_cors::CorsConfig;
    ///
    /// let config = CorsConfig::from_json(r#"{
    ///     "domain_strategy": "intermediate",
    ///     "allow_origins": ["https://*.example.com"],
    ///     "max_age": 600
    /// }"#).unwrap();
    /// ```
    ///
    /// # Errors
    /// - [`ConfigError::Deserialize`] if the document is not valid JSON or has mistyped keys
    /// - [`ConfigError::InvalidStrategy`] if `domain_strategy` is neither `strict` nor `intermediate`
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str::<ConfigDocument>(json)?.try_into()
    }

    /// Configures a predicate that bypasses CORS processing for a request when it returns `true`
    ///
    /// Default value: `None` (every request is processed)
    pub fn with_skipper<F>(mut self, skip: F) -> Self
    where
        F: Fn(&HttpRequest) -> bool + Send + Sync + 'static
    {
        self.skip = Some(Arc::new(skip));
        self
    }

    /// Configures how request origins are compared to the allowed ones
    ///
    /// Default value: [`DomainStrategy::Strict`]
    pub fn with_strategy(mut self, strategy: DomainStrategy) -> Self {
        self.domain_strategy = strategy;
        self
    }

    /// Configures CORS with allowed origins,
    /// which will be used with the [`Access-Control-Allow-Origin`](https://developer.mozilla.org/en-US/docs/Web/HTTP/Reference/Headers/Access-Control-Allow-Origin) HTTP header.
    /// The entries are checked in the given order, `*` allows any origin.
    ///
    /// Default value: empty (no origin is allowed)
    pub fn with_origins<T, S>(mut self, origins: T) -> Self
    where
        T: IntoIterator<Item = S>,
        S: AsRef<str>
    {
        self.allow_origins = collect_strings(origins);
        self
    }

    /// Configures CORS to allow any origin
    pub fn with_any_origin(mut self) -> Self {
        self.allow_origins = vec![WILDCARD_STR.into()];
        self
    }

    /// Configures CORS with allowed HTTP methods
    /// which will be used with the [`Access-Control-Allow-Methods`](https://developer.mozilla.org/en-US/docs/Web/HTTP/Reference/Headers/Access-Control-Allow-Methods) HTTP header
    ///
    /// Default value: empty
    pub fn with_methods<T, S>(mut self, methods: T) -> Self
    where
        T: IntoIterator<Item = S>,
        S: AsRef<str>
    {
        self.allow_methods = collect_strings(methods);
        self
    }

    /// Configures CORS with allowed HTTP headers list
    /// which will be used with the [`Access-Control-Allow-Headers`](https://developer.mozilla.org/en-US/docs/Web/HTTP/Reference/Headers/Access-Control-Allow-Headers) HTTP header
    ///
    /// Default value: empty (the headers a preflight request asks for are echoed back)
    pub fn with_headers<T, S>(mut self, headers: T) -> Self
    where
        T: IntoIterator<Item = S>,
        S: AsRef<str>
    {
        self.allow_headers = collect_strings(headers);
        self
    }

    /// Configures CORS whether allow credentials.
    ///
    /// Default value: `false`
    pub fn with_credentials(mut self, allow: bool) -> Self {
        self.allow_credentials = allow;
        self
    }

    /// Configures CORS with HTTP headers to expose
    /// which will be used with the [`Access-Control-Expose-Headers`](https://developer.mozilla.org/en-US/docs/Web/HTTP/Reference/Headers/Access-Control-Expose-Headers) HTTP header
    ///
    /// Default value: empty
    pub fn with_expose_headers<T, S>(mut self, headers: T) -> Self
    where
        T: IntoIterator<Item = S>,
        S: AsRef<str>
    {
        self.expose_headers = collect_strings(headers);
        self
    }

    /// Configures CORS with `max-age` value in seconds.
    /// Which will be used with the [`Access-Control-Max-Age`](https://developer.mozilla.org/en-US/docs/Web/HTTP/Reference/Headers/Access-Control-Max-Age) HTTP header.
    /// `0` disables the header.
    ///
    /// Default value: `None`
    pub fn with_max_age(mut self, secs: u64) -> Self {
        self.max_age = (secs > 0).then(|| Duration::from_secs(secs));
        self
    }

    /// Configures CORS to disable [`Access-Control-Max-Age`](https://developer.mozilla.org/en-US/docs/Web/HTTP/Reference/Headers/Access-Control-Max-Age) header
    pub fn without_max_age(mut self) -> Self {
        self.max_age = None;
        self
    }

    /// Returns the configured domain matching strategy
    #[inline]
    pub fn strategy(&self) -> DomainStrategy {
        self.domain_strategy
    }

    /// Validates the configuration and pre-computes the CORS headers
    ///
    /// # Errors
    /// - [`ConfigError::InvalidOrigin`] if an allow-list entry other than `*` is not a valid origin
    /// - [`ConfigError::InvalidHeaderValue`] if a configured list can't be sent as a header value
    pub fn build(self) -> Result<Cors, ConfigError> {
        let allow_origins = collect_strings(&self.allow_origins);
        let allow_methods = collect_strings(&self.allow_methods);
        let allow_headers = collect_strings(&self.allow_headers);
        let expose_headers = collect_strings(&self.expose_headers);

        let allow_any_origin = allow_origins
            .iter()
            .any(|o| o == WILDCARD_STR);

        let allow_origins = allow_origins
            .iter()
            .filter(|o| *o != WILDCARD_STR)
            .map(|o| AllowedOrigin::parse(o))
            .collect::<Result<SmallVec<_>, _>>()?;

        let allow_methods = csv_header("access-control-allow-methods", &allow_methods)?
            .unwrap_or_else(|| HeaderValue::from_static(""));
        let allow_headers = csv_header("access-control-allow-headers", &allow_headers)?;
        let expose_headers = csv_header("access-control-expose-headers", &expose_headers)?;
        let max_age = self.max_age.map(|max_age| {
            let mut buf = itoa::Buffer::new();
            HeaderValue::from_str(buf.format(max_age.as_secs()))
                .map_err(|_| ConfigError::InvalidHeaderValue {
                    header: "access-control-max-age",
                    value: max_age.as_secs().to_string(),
                })
        }).transpose()?;

        Ok(Cors {
            skip: self.skip,
            matcher: self.domain_strategy.matcher(),
            allow_credentials: self.allow_credentials,
            allow_any_origin,
            allow_origins,
            allow_methods,
            allow_headers,
            expose_headers,
            max_age,
        })
    }
}

impl TryFrom<ConfigDocument> for CorsConfig {
    type Error = ConfigError;

    fn try_from(doc: ConfigDocument) -> Result<Self, Self::Error> {
        let domain_strategy = doc.domain_strategy
            .as_deref()
            .map(str::parse::<DomainStrategy>)
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            skip: None,
            domain_strategy,
            allow_origins: collect_strings(doc.allow_origins),
            allow_methods: collect_strings(doc.allow_methods),
            allow_headers: collect_strings(doc.allow_headers),
            allow_credentials: doc.allow_credentials,
            expose_headers: collect_strings(doc.expose_headers),
            max_age: doc.max_age,
        })
    }
}

/// Trims the items and drops the empty ones
#[inline]
fn collect_strings<T, S>(items: T) -> Vec<String>
where
    T: IntoIterator<Item = S>,
    S: AsRef<str>
{
    items
        .into_iter()
        .map(|s| s.as_ref().trim().to_owned())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Joins the items with `", "`, returns `None` for an empty list
fn csv_header(header: &'static str, items: &[String]) -> Result<Option<HeaderValue>, ConfigError> {
    if items.is_empty() {
        return Ok(None);
    }

    let value = items.join(SEPARATOR);
    HeaderValue::from_str(&value)
        .map(Some)
        .map_err(|_| ConfigError::InvalidHeaderValue { header, value })
}

/// Accepts any integer, non-positive values disable the header
fn deserialize_max_age<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>
{
    let secs = Option::<i64>::deserialize(deserializer)?;
    Ok(secs
        .filter(|secs| *secs > 0)
        .map(|secs| Duration::from_secs(secs.unsigned_abs())))
}
