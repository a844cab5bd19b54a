//! Shared fixtures for the router tests.
#![allow(dead_code)]

use std::sync::mpsc;
use std::thread;

use casewise_config::CasewiseConfig;
use casewise_db::service::CasewiseService;
use casewise_server::{ApiRequest, ApiResponse, AppState, Method, router};
use serde_json::{Value, json};

pub const PASSWORD: &str = "correct horse";

pub fn config() -> CasewiseConfig {
    let mut config = CasewiseConfig::default();
    config.auth.password = PASSWORD.into();
    config.database.path = ":memory:".into();
    config
}

pub async fn state_with(config: CasewiseConfig) -> AppState {
    let service = CasewiseService::new_local(":memory:").await.unwrap();
    AppState::with_service(config, service).unwrap()
}

/// State with auth disabled, for tests that are not about sessions.
pub async fn open_state() -> AppState {
    let mut config = config();
    config.auth.enabled = false;
    state_with(config).await
}

pub async fn send(state: &AppState, req: ApiRequest) -> ApiResponse {
    router::handle(state, req).await
}

pub async fn get(state: &AppState, target: &str) -> ApiResponse {
    send(state, ApiRequest::new(Method::Get, target)).await
}

pub async fn post(state: &AppState, target: &str, body: &Value) -> ApiResponse {
    send(state, ApiRequest::new(Method::Post, target).with_json(body)).await
}

pub async fn post_empty(state: &AppState, target: &str) -> ApiResponse {
    send(state, ApiRequest::new(Method::Post, target)).await
}

pub async fn patch(state: &AppState, target: &str, body: &Value) -> ApiResponse {
    send(state, ApiRequest::new(Method::Patch, target).with_json(body)).await
}

pub async fn put(state: &AppState, target: &str, body: &Value) -> ApiResponse {
    send(state, ApiRequest::new(Method::Put, target).with_json(body)).await
}

pub async fn delete(state: &AppState, target: &str) -> ApiResponse {
    send(state, ApiRequest::new(Method::Delete, target)).await
}

/// Body as JSON, asserting the expected status first.
pub fn expect(resp: &ApiResponse, status: u16) -> Value {
    let body = resp.body_json().unwrap_or(Value::Null);
    assert_eq!(resp.status, status, "unexpected status, body: {body}");
    body
}

pub async fn create_case(state: &AppState, claim: &str) -> String {
    let resp = post(
        state,
        "/api/cases",
        &json!({
            "worker_name": "Dana Whitfield",
            "claim_number": claim,
            "insurer": "Allianz",
            "injury_date": "2024-03-02",
            "injury_description": "Right shoulder strain"
        }),
    )
    .await;
    expect(&resp, 201)["id"].as_str().unwrap().to_string()
}

pub async fn create_participant(state: &AppState, case_id: &str, role: &str, name: &str) -> String {
    let resp = post(
        state,
        &format!("/api/cases/{case_id}/participants"),
        &json!({"role": role, "name": name}),
    )
    .await;
    expect(&resp, 201)["id"].as_str().unwrap().to_string()
}

pub async fn create_interaction(state: &AppState, case_id: &str, notes: Option<&str>) -> String {
    let mut body = json!({
        "case_id": case_id,
        "interaction_type": "phone_call",
        "subject": "Check-in call",
    });
    if let Some(notes) = notes {
        body["notes"] = json!(notes);
    }
    let resp = post(state, "/api/interactions", &body).await;
    expect(&resp, 201)["id"].as_str().unwrap().to_string()
}

/// What the mock provider saw for one request.
pub struct Captured {
    pub url: String,
    pub body: Vec<u8>,
}

/// Start a mock OpenAI-compatible provider answering `responses` in order,
/// one per request. Returns the base URL and the captured requests.
pub fn mock_provider(
    responses: Vec<(u16, String, Vec<(&'static str, &'static str)>)>,
) -> (String, mpsc::Receiver<Captured>) {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for (status, body, headers) in responses {
            let mut request = server.recv().unwrap();
            let mut bytes = Vec::new();
            request.as_reader().read_to_end(&mut bytes).unwrap();
            let _ = tx.send(Captured {
                url: request.url().to_string(),
                body: bytes,
            });
            let mut response = tiny_http::Response::from_string(body)
                .with_status_code(status)
                .with_header(
                    tiny_http::Header::from_bytes("Content-Type", "application/json").unwrap(),
                );
            for (name, value) in headers {
                response.add_header(tiny_http::Header::from_bytes(name, value).unwrap());
            }
            request.respond(response).unwrap();
        }
    });

    (format!("http://127.0.0.1:{port}/v1"), rx)
}

pub fn chat_reply(content: &str) -> (u16, String, Vec<(&'static str, &'static str)>) {
    let body = json!({
        "model": "gpt-4o-mini",
        "choices": [{"message": {"role": "assistant", "content": content}}]
    });
    (200, body.to_string(), Vec::new())
}

/// Open state whose AI client points at `base_url`.
pub async fn ai_state(base_url: String) -> AppState {
    let mut config = config();
    config.auth.enabled = false;
    config.ai.api_key = "sk-test".into();
    config.ai.base_url = base_url;
    config.ai.timeout_secs = 5;
    state_with(config).await
}
