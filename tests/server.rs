#![allow(missing_docs)]
#![cfg(feature = "test")]

use tracing_subscriber::EnvFilter;
use volga_cors::{
    headers::{
        ACCESS_CONTROL_ALLOW_CREDENTIALS,
        ACCESS_CONTROL_ALLOW_HEADERS,
        ACCESS_CONTROL_ALLOW_METHODS,
        ACCESS_CONTROL_ALLOW_ORIGIN,
        ACCESS_CONTROL_EXPOSE_HEADERS,
        ACCESS_CONTROL_MAX_AGE,
        ACCESS_CONTROL_REQUEST_HEADERS,
        ACCESS_CONTROL_REQUEST_METHOD,
        ORIGIN,
        VARY,
    },
    http::{Method, StatusCode},
    test::TestServer,
    CorsConfig,
    DomainStrategy,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[tokio::test]
async fn it_adds_access_control_allow_origin_header() {
    init_tracing();

    let cors = CorsConfig::default()
        .with_origins(["http://127.0.0.1"])
        .build()
        .unwrap();

    let server = TestServer::spawn(move |mw| { mw.use_cors(cors); }).await;

    let response = server.client()
        .put(server.url("/test"))
        .header(ORIGIN, "http://127.0.0.1")
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert_eq!(response.headers().get(&ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "http://127.0.0.1");
    assert_eq!(response.headers().get(&VARY).unwrap(), "Origin");

    server.shutdown().await;
}

#[tokio::test]
async fn it_answers_preflight_request() {
    init_tracing();

    let cors = CorsConfig::default()
        .with_origins(["http://127.0.0.1"])
        .with_methods([Method::PUT, Method::DELETE])
        .with_credentials(true)
        .with_max_age(600)
        .build()
        .unwrap();

    let server = TestServer::spawn(move |mw| { mw.use_cors(cors); }).await;

    let response = server.client()
        .request(Method::OPTIONS, server.url("/test"))
        .header(ORIGIN, "http://127.0.0.1")
        .header(ACCESS_CONTROL_REQUEST_METHOD, "PUT")
        .header(ACCESS_CONTROL_REQUEST_HEADERS, "X-Custom")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(response.headers().get(&ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "http://127.0.0.1");
    assert_eq!(response.headers().get(&ACCESS_CONTROL_ALLOW_METHODS).unwrap(), "PUT, DELETE");
    assert_eq!(response.headers().get(&ACCESS_CONTROL_ALLOW_HEADERS).unwrap(), "X-Custom");
    assert_eq!(response.headers().get(&ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(), "true");
    assert_eq!(response.headers().get(&ACCESS_CONTROL_MAX_AGE).unwrap(), "600");

    let vary = response.headers().get_all(&VARY).iter().collect::<Vec<_>>();
    assert_eq!(vary, ["Origin", "Access-Control-Request-Method", "Access-Control-Request-Headers"]);

    assert!(response.text().await.unwrap().is_empty());

    server.shutdown().await;
}

#[tokio::test]
async fn it_does_not_allow_other_origins() {
    init_tracing();

    let cors = CorsConfig::default()
        .with_origins(["http://127.0.0.1"])
        .with_expose_headers(["ETag"])
        .build()
        .unwrap();

    let server = TestServer::spawn(move |mw| { mw.use_cors(cors); }).await;

    let response = server.client()
        .get(server.url("/test"))
        .header(ORIGIN, "http://localhost:3000")
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert!(response.headers().get(&ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    assert!(response.headers().get(&ACCESS_CONTROL_EXPOSE_HEADERS).is_none());
    assert_eq!(response.text().await.unwrap(), "ok");

    server.shutdown().await;
}

#[tokio::test]
async fn it_allows_subdomains_with_intermediate_strategy() {
    init_tracing();

    let cors = CorsConfig::from_json(r#"{
        "domain_strategy": "intermediate",
        "allow_origins": ["https://*.example.com"],
        "expose_headers": ["ETag"]
    }"#)
        .unwrap()
        .build()
        .unwrap();

    let server = TestServer::spawn(move |mw| { mw.use_cors(cors); }).await;

    let response = server.client()
        .get(server.url("/test"))
        .header(ORIGIN, "https://app.example.com")
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert_eq!(response.headers().get(&ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "https://app.example.com");
    assert_eq!(response.headers().get(&ACCESS_CONTROL_EXPOSE_HEADERS).unwrap(), "ETag");

    server.shutdown().await;
}

#[tokio::test]
async fn it_passes_through_skipped_requests() {
    init_tracing();

    let cors = CorsConfig::default()
        .with_strategy(DomainStrategy::Strict)
        .with_any_origin()
        .with_skipper(|req| req.uri().path() == "/health")
        .build()
        .unwrap();

    let server = TestServer::spawn(move |mw| { mw.use_cors(cors); }).await;

    let skipped = server.client()
        .request(Method::OPTIONS, server.url("/health"))
        .header(ORIGIN, "http://127.0.0.1")
        .send()
        .await
        .unwrap();
    let processed = server.client()
        .get(server.url("/test"))
        .header(ORIGIN, "http://127.0.0.1")
        .send()
        .await
        .unwrap();

    assert_eq!(skipped.status(), StatusCode::OK);
    assert!(skipped.headers().get(&ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    assert_eq!(processed.headers().get(&ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");

    server.shutdown().await;
}
