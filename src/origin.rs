//! Parsing and normalization of the `Origin` HTTP header

use std::{fmt, str::FromStr, error::Error as StdError};
use url::{ParseError, Url};

const HTTP: &str = "http";
const HTTPS: &str = "https";

/// Scheme of a web origin. Only `http` and `https` are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// `http`, default port `80`
    Http,
    /// `https`, default port `443`
    Https,
}

/// The parsed identity of a requesting web page: scheme, lowercased host and port.
///
/// # Example
/// ```no_run
/// use volga_cors::origin::{Origin, Scheme};
///
/// let origin = Origin::parse("HTTPS://Example.com").unwrap();
///
/// assert_eq!(origin.scheme(), Scheme::Https);
/// assert_eq!(origin.host(), "example.com");
/// assert_eq!(origin.port(), 443);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    scheme: Scheme,
    host: Box<str>,
    port: u16,
}

/// Describes why a string is not a valid origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginError {
    /// The string has no `scheme://` part
    MissingScheme,
    /// The scheme is neither `http` nor `https`
    UnsupportedScheme(String),
    /// The port is not a valid 16-bit integer
    InvalidPort,
    /// The origin has no host
    MissingHost,
    /// The string is a URL, but not a serialized origin: it has the named extra component
    /// (userinfo, path, query or fragment) or no `//` after the scheme
    NotAnOrigin(&'static str),
    /// Any other syntax error
    Malformed(ParseError),
}

impl Scheme {
    /// Returns the port implied by this scheme when none is specified
    #[inline]
    pub const fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }

    /// Returns the scheme as a lowercase `&str`
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => HTTP,
            Scheme::Https => HTTPS,
        }
    }
}

impl FromStr for Scheme {
    type Err = OriginError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case(HTTP) {
            Ok(Scheme::Http)
        } else if s.eq_ignore_ascii_case(HTTPS) {
            Ok(Scheme::Https)
        } else {
            Err(OriginError::UnsupportedScheme(s.into()))
        }
    }
}

impl fmt::Display for Scheme {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Origin {
    /// Creates a new [`Origin`], the `host` is lowercased
    pub fn new(scheme: Scheme, host: &str, port: u16) -> Self {
        Self {
            host: host.to_ascii_lowercase().into_boxed_str(),
            scheme,
            port,
        }
    }

    /// Parses a raw `Origin` header value or allow-list entry.
    ///
    /// Fails if there is no scheme, the scheme is not `http`/`https`,
    /// the port is not a valid integer or the string carries anything
    /// besides `scheme://host[:port]` (a trailing `/` is tolerated).
    /// A missing port resolves to the scheme's default one.
    pub fn parse(raw: &str) -> Result<Self, OriginError> {
        let url = Url::parse(raw).map_err(OriginError::from)?;
        let scheme = url.scheme().parse::<Scheme>()?;

        let has_authority = raw
            .split_once(':')
            .is_some_and(|(_, rest)| rest.starts_with("//"));
        if !has_authority {
            return Err(OriginError::NotAnOrigin("`scheme:` without `//`"));
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(OriginError::NotAnOrigin("userinfo"));
        }
        if url.path() != "/" {
            return Err(OriginError::NotAnOrigin("path"));
        }
        if url.query().is_some() {
            return Err(OriginError::NotAnOrigin("query"));
        }
        if url.fragment().is_some() {
            return Err(OriginError::NotAnOrigin("fragment"));
        }
        let host = url.host_str()
            .filter(|host| !host.is_empty())
            .ok_or(OriginError::MissingHost)?;
        let port = url.port().unwrap_or(scheme.default_port());

        Ok(Self::new(scheme, host, port))
    }

    /// Returns the scheme
    #[inline]
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Returns the lowercased host
    #[inline]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the explicit or default port
    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns `true` if the host starts with at least one `*.` label
    #[inline]
    pub fn has_wildcard_host(&self) -> bool {
        self.host.starts_with(WILDCARD_LABEL)
    }

    /// Returns `true` if the host contains a `*` anywhere.
    /// Such a host can be an allow-list pattern, but never a real requesting origin.
    #[inline]
    pub fn has_wildcard(&self) -> bool {
        self.host.contains('*')
    }
}

/// Leading host label that matches exactly one label of another host
pub(crate) const WILDCARD_LABEL: &str = "*.";

impl FromStr for Origin {
    type Err = OriginError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Serializes as `scheme://host[:port]`, the port is omitted when it is the default one
impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)?;
        if self.port != self.scheme.default_port() {
            write!(f, ":{}", self.port)?;
        }
        Ok(())
    }
}

impl From<ParseError> for OriginError {
    #[inline]
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::RelativeUrlWithoutBase => OriginError::MissingScheme,
            ParseError::InvalidPort => OriginError::InvalidPort,
            ParseError::EmptyHost => OriginError::MissingHost,
            other => OriginError::Malformed(other),
        }
    }
}

impl fmt::Display for OriginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OriginError::MissingScheme => f.write_str("origin has no scheme"),
            OriginError::UnsupportedScheme(scheme) => write!(f, "unsupported origin scheme `{scheme}`"),
            OriginError::InvalidPort => f.write_str("origin port is not a valid integer"),
            OriginError::MissingHost => f.write_str("origin has no host"),
            OriginError::NotAnOrigin(component) => write!(f, "not an origin: unexpected {component}"),
            OriginError::Malformed(err) => write!(f, "malformed origin: {err}"),
        }
    }
}

impl StdError for OriginError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            OriginError::Malformed(err) => Some(err),
            _ => None,
        }
    }
}
