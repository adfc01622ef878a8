//! Middleware tools
//!
//! A minimal request pipeline and the CORS request filter that plugs into it.

use futures_util::{future::BoxFuture, FutureExt};
use std::{future::Future, sync::Arc};
use crate::{
    cors::Cors,
    headers::ORIGIN,
    http::Method,
    HttpRequest,
    HttpResult,
};

const DEFAULT_MW_CAPACITY: usize = 8;

/// Points to the next middleware or request handler
pub type NextFn = Arc<
    dyn Fn(HttpRequest) -> BoxFuture<'static, HttpResult>
    + Send
    + Sync
>;

/// Point to a middleware function
pub type MiddlewareFn = Arc<
    dyn Fn(HttpRequest, NextFn) -> BoxFuture<'static, HttpResult>
    + Send
    + Sync
>;

/// Middleware pipeline
#[derive(Clone, Default)]
pub struct Middlewares {
    pipeline: Vec<MiddlewareFn>
}

impl std::fmt::Debug for Middlewares {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Middlewares")
            .field("len", &self.pipeline.len())
            .finish()
    }
}

impl Middlewares {
    /// Initializes a new middleware pipeline
    pub fn new() -> Self {
        Self { pipeline: Vec::with_capacity(DEFAULT_MW_CAPACITY) }
    }

    /// Returns `true` if there are no middlewares,
    /// otherwise `false`
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pipeline.is_empty()
    }

    /// Adds a middleware handler to the pipeline
    ///
    /// # Example
    /// ```no_run
    /// use volga_cors::middleware::Middlewares;
    ///
    /// let mut middlewares = Middlewares::new();
    ///
    /// middlewares.wrap(|req, next| async move {
    ///     next(req).await
    /// });
    /// ```
    pub fn wrap<F, Fut>(&mut self, middleware: F) -> &mut Self
    where
        F: Fn(HttpRequest, NextFn) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HttpResult> + Send + 'static,
    {
        self.pipeline.push(make_fn(middleware));
        self
    }

    /// Adds CORS middleware to the pipeline to allow cross-domain requests.
    ///
    /// # Example
    /// ```no_run
    /// use volga_cors::{CorsConfig, middleware::Middlewares};
    ///
    /// let cors = CorsConfig::default()
    ///     .with_origins(["https://example.com"])
    ///     .with_methods(["GET", "POST"])
    ///     .build()
    ///     .unwrap();
    ///
    /// let mut middlewares = Middlewares::new();
    /// middlewares.use_cors(cors);
    /// ```
    pub fn use_cors(&mut self, cors: Cors) -> &mut Self {
        self.pipeline.push(cors.into_middleware());
        self
    }

    /// Composes middlewares into a "Linked List" that ends with the `endpoint` and returns head
    pub fn compose<F, Fut>(&self, endpoint: F) -> NextFn
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HttpResult> + Send + 'static,
    {
        let mut next: NextFn = Arc::new(move |req| endpoint(req).boxed());

        for mw in self.pipeline.iter().rev() {
            let current_mw = mw.clone();
            let prev_next = next.clone();
            next = Arc::new(move |req| current_mw(req, prev_next.clone()));
        }

        next
    }
}

impl Cors {
    /// Runs the CORS request filter for a single request.
    ///
    /// - If the skip predicate returns `true` the request goes straight to `next`.
    /// - An `OPTIONS` request is answered with `204 No Content` and `next` is never called.
    /// - Any other request goes to `next` and the CORS headers are written onto its response.
    ///
    /// Errors returned by `next` are propagated untouched.
    pub async fn handle(&self, req: HttpRequest, next: NextFn) -> HttpResult {
        if self.skips(&req) {
            #[cfg(feature = "tracing")]
            tracing::trace!("CORS: skipped {} {}", req.method(), req.uri());
            return next(req).await;
        }

        let origin = self.allow_origin(req.headers().get(ORIGIN));

        if req.method() == Method::OPTIONS {
            #[cfg(feature = "tracing")]
            tracing::trace!("CORS: answered preflight request to {}", req.uri());
            return Ok(self.preflight_response(req.headers(), origin));
        }

        let mut response = next(req).await?;
        self.apply_normal_response(response.headers_mut(), origin);

        Ok(response)
    }

    /// Wraps this policy into [`MiddlewareFn`]
    pub fn into_middleware(self) -> MiddlewareFn {
        let cors = Arc::new(self);
        Arc::new(move |req, next| {
            let cors = cors.clone();
            Box::pin(async move { cors.handle(req, next).await })
        })
    }
}

/// Wraps a closure into [`MiddlewareFn`]
#[inline]
fn make_fn<F, Fut>(middleware: F) -> MiddlewareFn
where
    F: Fn(HttpRequest, NextFn) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HttpResult> + Send + 'static,
{
    Arc::new(move |req, next| middleware(req, next).boxed())
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc
    };
    use crate::{
        error::Error,
        headers::*,
        http::{body, Method, Request, Response, StatusCode},
        CorsConfig,
        HttpRequest,
    };
    use super::Middlewares;

    fn request(method: Method, origin: &str) -> HttpRequest {
        Request::builder()
            .method(method)
            .uri("/")
            .header(ORIGIN, origin)
            .body(body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn it_runs_middlewares_in_order() {
        let mut middlewares = Middlewares::new();
        middlewares
            .wrap(|req, next| async move {
                let mut resp = next(req).await?;
                resp.headers_mut().append("x-trace", HeaderValue::from_static("outer"));
                Ok::<_, Error>(resp)
            })
            .wrap(|req, next| async move {
                let mut resp = next(req).await?;
                resp.headers_mut().append("x-trace", HeaderValue::from_static("inner"));
                Ok::<_, Error>(resp)
            });

        let pipeline = middlewares.compose(|_| async { Ok(Response::new(body::empty())) });
        let resp = pipeline(request(Method::GET, "http://example.com")).await.unwrap();

        let trace = resp.headers().get_all("x-trace").iter().collect::<Vec<_>>();
        assert_eq!(trace, ["inner", "outer"]);
    }

    #[tokio::test]
    async fn it_does_not_call_next_on_preflight() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cors = CorsConfig::default()
            .with_origins(["http://example.com"])
            .build()
            .unwrap();

        let mut middlewares = Middlewares::new();
        middlewares.use_cors(cors);

        let counter = calls.clone();
        let pipeline = middlewares.compose(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(Response::new(body::empty())) }
        });

        let resp = pipeline(request(Method::OPTIONS, "http://example.com")).await.unwrap();

        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn it_skips_cors_when_predicate_returns_true() {
        let cors = CorsConfig::default()
            .with_any_origin()
            .with_skipper(|req| req.uri().path().starts_with("/health"))
            .build()
            .unwrap();

        let mut middlewares = Middlewares::new();
        middlewares.use_cors(cors);

        let pipeline = middlewares.compose(|_| async { Ok(Response::new(body::full("ok"))) });

        let mut req = request(Method::OPTIONS, "http://example.com");
        *req.uri_mut() = "/health".parse().unwrap();
        let resp = pipeline(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().is_empty());
    }

    #[tokio::test]
    async fn it_propagates_next_error() {
        let cors = CorsConfig::default()
            .with_any_origin()
            .build()
            .unwrap();

        let mut middlewares = Middlewares::new();
        middlewares.use_cors(cors);

        let pipeline = middlewares.compose(|_| async {
            Err(Error::from_parts(StatusCode::IM_A_TEAPOT, "teapot"))
        });

        let err = pipeline(request(Method::GET, "http://example.com")).await.unwrap_err();

        assert_eq!(err.status, StatusCode::IM_A_TEAPOT);
        assert_eq!(err.to_string(), "teapot");
    }
}
