//! Allow-list entries and the domain matching strategies

use std::{fmt, str::FromStr};
use hyper::http::HeaderValue;
use serde::Deserialize;

use crate::{
    error::ConfigError,
    origin::{Origin, WILDCARD_LABEL}
};

const STRICT: &str = "strict";
const INTERMEDIATE: &str = "intermediate";

/// Describes how a request origin is compared to the allow-list entries
///
/// Default value: [`DomainStrategy::Strict`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum DomainStrategy {
    /// The origin must be exactly the same as the allow-list entry
    #[default]
    Strict,
    /// Allow-list entries may start with `*.` labels, each of them matches exactly one host label.
    /// E.g. `https://*.example.com` matches `https://api.example.com`,
    /// but neither `https://example.com` nor `https://v1.api.example.com`
    Intermediate,
}

/// A single comparison algorithm between a request origin and an allow-list entry
pub(crate) trait OriginMatcher: fmt::Debug + Send + Sync {
    /// Returns `true` if the request origin is permitted by the `allowed` entry.
    ///
    /// `raw` is the `Origin` header value the `origin` was parsed from.
    fn matches(&self, raw: &str, origin: &Origin, allowed: &AllowedOrigin) -> bool;
}

/// Literal or component-wise equality
#[derive(Debug)]
pub(crate) struct StrictMatcher;

/// Scheme and port equality plus `*.` label wildcards in the host
#[derive(Debug)]
pub(crate) struct IntermediateMatcher;

/// Parsed allow-list entry, built once per policy
#[derive(Debug, Clone)]
pub(crate) struct AllowedOrigin {
    raw: Box<str>,
    origin: Origin,
    value: HeaderValue,
}

impl DomainStrategy {
    /// Returns the comparison algorithm of this strategy
    #[inline]
    pub(crate) fn matcher(self) -> &'static dyn OriginMatcher {
        match self {
            DomainStrategy::Strict => &StrictMatcher,
            DomainStrategy::Intermediate => &IntermediateMatcher,
        }
    }

    /// Returns the strategy name as it appears in configuration documents
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            DomainStrategy::Strict => STRICT,
            DomainStrategy::Intermediate => INTERMEDIATE,
        }
    }
}

impl FromStr for DomainStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            STRICT => Ok(DomainStrategy::Strict),
            INTERMEDIATE => Ok(DomainStrategy::Intermediate),
            _ => Err(ConfigError::InvalidStrategy(s.into())),
        }
    }
}

impl TryFrom<String> for DomainStrategy {
    type Error = ConfigError;

    #[inline]
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for DomainStrategy {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AllowedOrigin {
    /// Parses an allow-list entry and pre-computes its normalized header value
    pub(crate) fn parse(raw: &str) -> Result<Self, ConfigError> {
        let origin = Origin::parse(raw)
            .map_err(|source| ConfigError::InvalidOrigin { origin: raw.into(), source })?;

        let normalized = origin.to_string();
        let value = HeaderValue::from_str(&normalized)
            .map_err(|_| ConfigError::InvalidHeaderValue {
                header: "access-control-allow-origin",
                value: normalized,
            })?;

        Ok(Self { raw: raw.into(), origin, value })
    }

    /// Returns the value to send back in `Access-Control-Allow-Origin` once this entry matched.
    ///
    /// A host with wildcard labels is not a valid origin, so the request origin is echoed instead.
    #[inline]
    pub(crate) fn echo(&self, request_origin: &HeaderValue) -> HeaderValue {
        if self.origin.has_wildcard_host() {
            request_origin.clone()
        } else {
            self.value.clone()
        }
    }
}

impl OriginMatcher for StrictMatcher {
    #[inline]
    fn matches(&self, raw: &str, origin: &Origin, allowed: &AllowedOrigin) -> bool {
        *allowed.raw == *raw || allowed.origin == *origin
    }
}

impl OriginMatcher for IntermediateMatcher {
    #[inline]
    fn matches(&self, _raw: &str, origin: &Origin, allowed: &AllowedOrigin) -> bool {
        let allowed = &allowed.origin;
        origin.scheme() == allowed.scheme()
            && origin.port() == allowed.port()
            && hosts_match(origin.host(), allowed.host())
    }
}

/// Strips a leading label from `host` for every leading `*.` label of `allowed`,
/// then requires the rest to be equal
#[inline]
fn hosts_match(host: &str, allowed: &str) -> bool {
    let mut host = host;
    let mut allowed = allowed;

    while let Some(rest) = allowed.strip_prefix(WILDCARD_LABEL) {
        let Some((label, tail)) = host.split_once('.') else {
            return false;
        };
        if label.is_empty() {
            return false;
        }
        allowed = rest;
        host = tail;
    }

    host == allowed
}
