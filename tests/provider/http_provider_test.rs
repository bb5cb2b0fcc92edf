use axum::{
    extract::Path,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::time::Duration;

use deposit_poller::services::status_provider::{
    HttpStatusProvider, StatusFetchError, StatusProvider,
};

// =============================================================================
// INTEGRATION TESTS - HTTP STATUS PROVIDER
// Runs the provider against a local stub of the status endpoint
// =============================================================================

const API_KEY: &str = "test-api-key";

async fn deposit_status(Path(transaction_id): Path<String>, headers: HeaderMap) -> Response {
    if headers.get("API-Key").and_then(|v| v.to_str().ok()) != Some(API_KEY) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "bad key" }))).into_response();
    }

    match transaction_id.as_str() {
        "tx-confirmed" => Json(json!({ "status": 2 })).into_response(),
        "tx-pending" => Json(json!({ "status": 0 })).into_response(),
        "tx-broken" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        "tx-garbage" => "not json".into_response(),
        "tx?a#b" | "../../admin" | "tx/with/slashes" => {
            Json(json!({ "status": 2 })).into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn spawn_status_api() -> String {
    let app = Router::new().route("/deposits/{id}/status", get(deposit_status));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

fn provider(base_url: String, api_key: Option<&str>) -> HttpStatusProvider {
    HttpStatusProvider::new(&base_url, api_key.map(str::to_string), Duration::from_secs(5))
        .expect("Failed to build provider")
}

#[tokio::test]
async fn fetches_status_code() {
    let base = spawn_status_api().await;
    let provider = provider(format!("{}/", base), Some(API_KEY));

    assert_eq!(provider.fetch_status("tx-confirmed").await.unwrap(), 2);
    assert_eq!(provider.fetch_status("tx-pending").await.unwrap(), 0);
}

#[tokio::test]
async fn reserved_characters_stay_inside_the_id_segment() {
    let base = spawn_status_api().await;
    let provider = provider(base, Some(API_KEY));

    for id in ["tx?a#b", "../../admin", "tx/with/slashes"] {
        let result = provider.fetch_status(id).await;
        assert!(matches!(result, Ok(2)), "{} -> {:?}", id, result);
    }
}

#[tokio::test]
async fn missing_api_key_is_an_api_error() {
    let base = spawn_status_api().await;
    let provider = provider(base, None);

    let err = provider.fetch_status("tx-confirmed").await.unwrap_err();
    assert!(matches!(err, StatusFetchError::Api(_)), "{:?}", err);
}

#[tokio::test]
async fn server_error_is_an_api_error() {
    let base = spawn_status_api().await;
    let provider = provider(base, Some(API_KEY));

    let err = provider.fetch_status("tx-broken").await.unwrap_err();
    assert!(matches!(err, StatusFetchError::Api(_)), "{:?}", err);
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn malformed_body_is_a_parse_error() {
    let base = spawn_status_api().await;
    let provider = provider(base, Some(API_KEY));

    let err = provider.fetch_status("tx-garbage").await.unwrap_err();
    assert!(matches!(err, StatusFetchError::Parse(_)), "{:?}", err);
}

#[tokio::test]
async fn unreachable_endpoint_is_an_http_error() {
    // Grab a free port, then close it
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let provider = provider(format!("http://{}", addr), Some(API_KEY));

    let err = provider.fetch_status("tx-confirmed").await.unwrap_err();
    assert!(matches!(err, StatusFetchError::Http(_)), "{:?}", err);
}
