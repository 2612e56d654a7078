//! Integration tests for the Gemini client against a local mock server.

use std::collections::VecDeque;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
};
use parking_lot::Mutex;
use serde_json::{Value, json};

use taskplan::config::GeminiConfig;
use taskplan::core::retry::RetryPolicy;
use taskplan::core::{Error, GeminiClient, PlanGenerator, PlanService};

/// Canned responses served in order, plus every request seen.
#[derive(Default)]
struct Mock {
    responses: Mutex<VecDeque<(StatusCode, Value)>>,
    requests: Mutex<Vec<(String, Option<String>, Value)>>,
}

async fn handle(
    State(mock): State<Arc<Mock>>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let key = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    mock.requests.lock().push((uri.path().to_string(), key, body));

    let (status, body) = mock.responses.lock().pop_front().unwrap_or_else(|| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": {"message": "no more responses"}}),
        )
    });
    (status, Json(body))
}

async fn start_mock(responses: Vec<(StatusCode, Value)>) -> (Arc<Mock>, GeminiConfig) {
    let mock = Arc::new(Mock {
        responses: Mutex::new(responses.into()),
        ..Mock::default()
    });

    let app = Router::new().fallback(handle).with_state(mock.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = GeminiConfig {
        base_url: format!("http://{addr}/v1beta"),
        timeout_secs: 5,
        ..GeminiConfig::default()
    };
    (mock, config)
}

fn candidate(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

fn plan_json() -> String {
    json!([
        {
            "taskName": "Farmers market",
            "startTime": "09:00",
            "endTime": "10:30",
            "icon": "🥕",
            "details": "Buy vegetables for the week."
        },
        {
            "taskName": "Laundry",
            "startTime": "11:00",
            "endTime": "12:00",
            "icon": "🧺",
            "details": "Two loads."
        }
    ])
    .to_string()
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 2,
        base_delay_ms: 1,
        max_delay_ms: 5,
        multiplier: 2.0,
    }
}

#[tokio::test]
async fn generates_plan_from_structured_response() {
    let (mock, config) = start_mock(vec![(StatusCode::OK, candidate(&plan_json()))]).await;
    let client = GeminiClient::new("test-key", &config).unwrap();

    let tasks = client.generate("Saturday errands").await.unwrap();

    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].task_name, "Farmers market");
    assert_eq!(tasks[1].time_range(), "11:00 - 12:00");

    let requests = mock.requests.lock();
    assert_eq!(requests.len(), 1);
    let (path, key, body) = &requests[0];
    assert_eq!(path, "/v1beta/models/gemini-2.5-flash:generateContent");
    assert_eq!(key.as_deref(), Some("test-key"));
    assert_eq!(body["contents"][0]["parts"][0]["text"], "Saturday errands");
    assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    assert_eq!(body["generationConfig"]["responseSchema"]["type"], "ARRAY");
}

#[tokio::test]
async fn surfaces_api_error_message() {
    let (mock, config) = start_mock(vec![(
        StatusCode::BAD_REQUEST,
        json!({
            "error": {
                "code": 400,
                "message": "API key not valid.",
                "status": "INVALID_ARGUMENT"
            }
        }),
    )])
    .await;
    let client = GeminiClient::new("bad-key", &config).unwrap();
    let service = PlanService::new(Arc::new(client)).with_retry(fast_retry());

    let err = service.generate("anything").await.unwrap_err();

    assert!(matches!(
        err,
        Error::Api { status: 400, ref message } if message == "API key not valid."
    ));
    // Client errors are not retried
    assert_eq!(mock.requests.lock().len(), 1);
}

#[tokio::test]
async fn retries_after_unavailable() {
    let (mock, config) = start_mock(vec![
        (
            StatusCode::SERVICE_UNAVAILABLE,
            json!({"error": {"code": 503, "message": "The model is overloaded."}}),
        ),
        (StatusCode::OK, candidate(&plan_json())),
    ])
    .await;
    let client = GeminiClient::new("test-key", &config).unwrap();
    let service = PlanService::new(Arc::new(client)).with_retry(fast_retry());

    let outcome = service.generate("Saturday errands").await.unwrap();

    assert_eq!(outcome.tasks.len(), 2);
    assert!(!outcome.cached);
    assert_eq!(outcome.model, "gemini-2.5-flash");
    assert_eq!(mock.requests.lock().len(), 2);
}

#[tokio::test]
async fn blocked_prompt_is_not_retried() {
    let (mock, config) = start_mock(vec![(
        StatusCode::OK,
        json!({"promptFeedback": {"blockReason": "SAFETY"}}),
    )])
    .await;
    let client = GeminiClient::new("test-key", &config).unwrap();
    let service = PlanService::new(Arc::new(client)).with_retry(fast_retry());

    let err = service.generate("something unsafe").await.unwrap_err();

    assert!(matches!(err, Error::Blocked(ref reason) if reason == "SAFETY"));
    assert_eq!(mock.requests.lock().len(), 1);
}

#[tokio::test]
async fn malformed_output_is_retried_then_reported() {
    let (mock, config) = start_mock(vec![
        (StatusCode::OK, candidate("not json")),
        (StatusCode::OK, candidate("{\"unexpected\": true}")),
        (StatusCode::OK, candidate("still not json")),
    ])
    .await;
    let client = GeminiClient::new("test-key", &config).unwrap();
    let service = PlanService::new(Arc::new(client)).with_retry(fast_retry());

    let err = service.generate("plan").await.unwrap_err();

    assert!(matches!(err, Error::Parse(_)));
    assert_eq!(mock.requests.lock().len(), 3);
}
