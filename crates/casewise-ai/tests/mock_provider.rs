//! `AiClient` against a local `tiny_http` stand-in for the provider.

use std::sync::mpsc;
use std::thread;

use casewise_ai::{AiClient, AiError, Prompt};
use casewise_config::AiConfig;
use pretty_assertions::assert_eq;

/// What the mock saw for one request.
struct Captured {
    method: String,
    url: String,
    authorization: Option<String>,
    content_type: Option<String>,
    body: Vec<u8>,
}

/// Serve exactly one request with `status`, `body`, and extra headers.
fn serve_once(
    status: u16,
    body: &'static str,
    headers: &'static [(&'static str, &'static str)],
) -> (String, mpsc::Receiver<Captured>) {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let mut request = server.recv().unwrap();
        let header = |name: &'static str| {
            request
                .headers()
                .iter()
                .find(|h| h.field.equiv(name))
                .map(|h| h.value.to_string())
        };
        let authorization = header("Authorization");
        let content_type = header("Content-Type");
        let mut bytes = Vec::new();
        request.as_reader().read_to_end(&mut bytes).unwrap();
        tx.send(Captured {
            method: request.method().to_string(),
            url: request.url().to_string(),
            authorization,
            content_type,
            body: bytes,
        })
        .unwrap();

        let mut response = tiny_http::Response::from_string(body)
            .with_status_code(status)
            .with_header(
                tiny_http::Header::from_bytes("Content-Type", "application/json").unwrap(),
            );
        for (name, value) in headers {
            response.add_header(tiny_http::Header::from_bytes(*name, *value).unwrap());
        }
        request.respond(response).unwrap();
    });

    (format!("http://127.0.0.1:{port}/v1/"), rx)
}

fn client(base_url: String) -> AiClient {
    AiClient::new(&AiConfig {
        api_key: "sk-test".into(),
        base_url,
        timeout_secs: 5,
        ..Default::default()
    })
    .unwrap()
}

fn prompt() -> Prompt {
    Prompt {
        system: "Summarize.".into(),
        user: "Worker called about light duties.".into(),
    }
}

#[tokio::test]
async fn chat_completion_success() {
    let (base, rx) = serve_once(
        200,
        r#"{"model":"gpt-4o-mini-2024","choices":[{"message":{"role":"assistant","content":"  ## Key Points\n- Light duties  "}}]}"#,
        &[],
    );
    let completion = client(base).complete(&prompt()).await.unwrap();

    assert_eq!(completion.text, "## Key Points\n- Light duties");
    assert_eq!(completion.model, "gpt-4o-mini-2024");
    assert_eq!(completion.detail().chars, 28);

    let seen = rx.recv().unwrap();
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.url, "/v1/chat/completions");
    assert_eq!(seen.authorization.as_deref(), Some("Bearer sk-test"));
    let body: serde_json::Value = serde_json::from_slice(&seen.body).unwrap();
    assert_eq!(body["model"], "gpt-4o-mini");
    assert_eq!(body["messages"][0]["content"], "Summarize.");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["max_tokens"], 2_000);
}

#[tokio::test]
async fn chat_completion_without_model_uses_configured_one() {
    let (base, _rx) = serve_once(
        200,
        r#"{"choices":[{"message":{"content":"Fine."}}]}"#,
        &[],
    );
    let completion = client(base).complete(&prompt()).await.unwrap();
    assert_eq!(completion.model, "gpt-4o-mini");
}

#[tokio::test]
async fn empty_completion_is_a_decode_error() {
    let (base, _rx) = serve_once(200, r#"{"choices":[{"message":{"content":"   "}}]}"#, &[]);
    let err = client(base).complete(&prompt()).await.unwrap_err();
    assert!(matches!(err, AiError::Decode(_)), "{err:?}");
}

#[tokio::test]
async fn rate_limit_carries_retry_after() {
    let (base, _rx) = serve_once(
        429,
        r#"{"error":{"message":"slow down"}}"#,
        &[("Retry-After", "17")],
    );
    let err = client(base).complete(&prompt()).await.unwrap_err();
    assert!(
        matches!(err, AiError::RateLimited { retry_after_secs: 17 }),
        "{err:?}"
    );
}

#[tokio::test]
async fn provider_error_message_is_surfaced() {
    let (base, _rx) = serve_once(
        401,
        r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#,
        &[],
    );
    let err = client(base).complete(&prompt()).await.unwrap_err();
    match err {
        AiError::Api { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Incorrect API key provided");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn transcription_uploads_multipart() {
    let (base, rx) = serve_once(200, r#"{"text":"Hello, this is Dana."}"#, &[]);
    let transcript = client(base)
        .transcribe(b"RIFF....WAVE".to_vec(), "call.wav", "audio/wav")
        .await
        .unwrap();

    assert_eq!(transcript.text, "Hello, this is Dana.");
    assert_eq!(transcript.model, "whisper-1");

    let seen = rx.recv().unwrap();
    assert_eq!(seen.url, "/v1/audio/transcriptions");
    assert!(
        seen.content_type
            .as_deref()
            .is_some_and(|c| c.starts_with("multipart/form-data")),
        "{:?}",
        seen.content_type
    );
    let body = String::from_utf8_lossy(&seen.body);
    assert!(body.contains("name=\"file\"; filename=\"call.wav\""));
    assert!(body.contains("whisper-1"));
    assert!(body.contains("RIFF....WAVE"));
}

#[tokio::test]
async fn invalid_content_type_is_rejected_before_sending() {
    let config = AiConfig {
        api_key: "sk-test".into(),
        base_url: "http://127.0.0.1:9/v1".into(),
        ..Default::default()
    };
    let err = AiClient::new(&config)
        .unwrap()
        .transcribe(vec![1, 2, 3], "a.bin", "not a mime")
        .await
        .unwrap_err();
    assert!(matches!(err, AiError::Http(_)), "{err:?}");
}
