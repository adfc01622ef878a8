//! HTTP Body utilities

use bytes::Bytes;
use http_body_util::{BodyExt, Empty, Full};
use crate::error::Error;

#[cfg(feature = "test")]
use hyper::body::Incoming;

/// Represents a response/request body
pub type HttpBody = http_body_util::combinators::UnsyncBoxBody<Bytes, Error>;

/// Creates an empty [`HttpBody`]
#[inline]
pub fn empty() -> HttpBody {
    Empty::<Bytes>::new()
        .map_err(Error::from)
        .boxed_unsync()
}

/// Creates a new [`HttpBody`] from a chunk of bytes
#[inline]
pub fn full<T: Into<Bytes>>(chunk: T) -> HttpBody {
    Full::new(chunk.into())
        .map_err(Error::from)
        .boxed_unsync()
}

/// Wraps the body of an incoming HTTP request
#[inline]
#[cfg(feature = "test")]
pub fn incoming(inner: Incoming) -> HttpBody {
    inner
        .map_err(Error::client_error)
        .boxed_unsync()
}

/// Reads the whole body into [`Bytes`]
pub async fn collect(body: HttpBody) -> Result<Bytes, Error> {
    body.collect()
        .await
        .map(|collected| collected.to_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn it_creates_empty_body() {
        let bytes = collect(empty()).await.unwrap();

        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn it_creates_full_body() {
        let bytes = collect(full("Hello, World!")).await.unwrap();

        assert_eq!(bytes, "Hello, World!");
    }
}
