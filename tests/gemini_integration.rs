//! Integration tests against a fake Gemini REST endpoint.
//!
//! Each test spins up an Axum server on a random port that impersonates
//! `models/{model}:generateContent`, then drives the real client and
//! controller through it.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use suan_oracle::app::{AppController, CHAT_FALLBACK, ControllerOptions, GREETING, ViewState};
use suan_oracle::error::{ControllerError, GenerationError, LlmError};
use suan_oracle::llm::{Content, ContentRequest, GeminiClient, GenerativeService};
use suan_oracle::profile::{InlineImage, ProfileEdit};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

struct Reply {
    status: StatusCode,
    body: Value,
    delay: Duration,
}

struct Recorded {
    target: String,
    api_key: Option<String>,
    body: Value,
}

#[derive(Default)]
struct FakeGemini {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<Recorded>>,
}

impl FakeGemini {
    fn push(&self, status: StatusCode, body: Value) {
        self.replies.lock().unwrap().push_back(Reply {
            status,
            body,
            delay: Duration::ZERO,
        });
    }

    fn push_text(&self, text: &str) {
        self.push(
            StatusCode::OK,
            json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": text }] },
                    "finishReason": "STOP"
                }],
                "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 34 }
            }),
        );
    }

    fn push_slow(&self, delay: Duration) {
        self.replies.lock().unwrap().push_back(Reply {
            status: StatusCode::OK,
            body: json!({ "candidates": [] }),
            delay,
        });
    }

    fn request(&self, index: usize) -> (String, Option<String>, Value) {
        let requests = self.requests.lock().unwrap();
        let r = &requests[index];
        (r.target.clone(), r.api_key.clone(), r.body.clone())
    }
}

async fn generate(
    State(fake): State<Arc<FakeGemini>>,
    Path(target): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    fake.requests.lock().unwrap().push(Recorded {
        target,
        api_key: headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });
    let reply = fake.replies.lock().unwrap().pop_front();
    match reply {
        Some(reply) => {
            tokio::time::sleep(reply.delay).await;
            (reply.status, Json(reply.body))
        }
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": { "status": "INTERNAL", "message": "no reply queued" } })),
        ),
    }
}

/// Start the fake server on a random port, return its base URL.
async fn start_server(fake: Arc<FakeGemini>) -> String {
    let app = Router::new()
        .route("/v1beta/models/{*target}", post(generate))
        .with_state(fake);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://127.0.0.1:{port}/v1beta")
}

fn client(base_url: &str, request_timeout: Duration) -> Arc<GeminiClient> {
    let key = SecretString::from("test-key".to_string());
    Arc::new(GeminiClient::new(key, base_url, request_timeout).unwrap())
}

fn controller(base_url: &str) -> AppController {
    AppController::new(client(base_url, TEST_TIMEOUT), ControllerOptions::default())
}

fn extended_analysis() -> Value {
    json!({
        "yearlyFortune": "乙巳年稳中求进",
        "milestones": [
            { "timeframe": "2025春", "prediction": "贵人相助", "advice": "主动开口" },
            { "timeframe": "2025秋", "prediction": "财运回升", "advice": "量入为出" }
        ],
        "physiognomy": { "faceAnalysis": "天庭饱满", "earAnalysis": "耳垂厚实", "moleAnalysis": "无明显痣相" },
        "personalityColor": { "hex": "#C0392B", "name": "朱砂红", "meaning": "热忱果断" },
        "similarPerson": { "name": "李白", "description": "豪放不羁" },
        "natalChart": { "personality": "外向", "career": "稳步", "love": "顺遂", "marriage": "晚成", "wealth": "中上" },
        "fiveElements": { "element": "火", "nature": "阳", "strength": "偏旺", "supplement": "宜水", "taboos": "忌燥" },
        "interpersonal": { "style": "直率", "connection": "广结善缘", "caution": "少言多听" }
    })
}

async fn ready_controller(fake: &Arc<FakeGemini>, base_url: &str) -> AppController {
    let controller = controller(base_url);
    controller.update_profile(ProfileEdit::Name("张三".into())).unwrap();
    controller
        .update_profile(ProfileEdit::BirthDate("1990-08-15".into()))
        .unwrap();
    controller
        .update_profile(ProfileEdit::FaceImage(Some(
            InlineImage::new("image/png", vec![0x89, 0x50]).unwrap(),
        )))
        .unwrap();
    fake.push_text(&extended_analysis().to_string());
    controller.start_analysis().await.unwrap();
    controller
}

// ── Client ───────────────────────────────────────────────────────────

#[tokio::test]
async fn client_sends_key_and_parses_reply() {
    timeout(TEST_TIMEOUT, async {
        let fake = Arc::new(FakeGemini::default());
        let base_url = start_server(Arc::clone(&fake)).await;
        fake.push_text("你好");

        let request = ContentRequest::new("gemini-test", vec![Content::user_text("hi")])
            .with_system_instruction("be brief");
        let response = client(&base_url, TEST_TIMEOUT)
            .generate_content(request)
            .await
            .unwrap();

        assert_eq!(response.text.as_deref(), Some("你好"));
        assert_eq!(response.finish_reason.as_deref(), Some("STOP"));
        assert_eq!(response.usage.total(), 46);

        let (target, api_key, body) = fake.request(0);
        assert_eq!(target, "gemini-test:generateContent");
        assert_eq!(api_key.as_deref(), Some("test-key"));
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(body["contents"][0]["role"], "user");
        assert!(body.get("generationConfig").is_none());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn client_maps_http_errors() {
    timeout(TEST_TIMEOUT, async {
        let fake = Arc::new(FakeGemini::default());
        let base_url = start_server(Arc::clone(&fake)).await;
        fake.push(
            StatusCode::TOO_MANY_REQUESTS,
            json!({ "error": { "status": "RESOURCE_EXHAUSTED", "message": "quota" } }),
        );

        let request = ContentRequest::new("m", vec![Content::user_text("hi")]);
        let err = client(&base_url, TEST_TIMEOUT).generate_content(request).await.unwrap_err();
        match err {
            LlmError::Http { status, message, .. } => {
                assert_eq!(status, 429);
                assert!(message.contains("quota"));
            }
            other => panic!("expected Http error, got {other:?}"),
        }
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn client_times_out_slow_server() {
    timeout(TEST_TIMEOUT, async {
        let fake = Arc::new(FakeGemini::default());
        let base_url = start_server(Arc::clone(&fake)).await;
        fake.push_slow(Duration::from_secs(2));

        let request = ContentRequest::new("m", vec![Content::user_text("hi")]);
        let err = client(&base_url, Duration::from_millis(200))
            .generate_content(request)
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Timeout { .. }), "got {err:?}");
    })
    .await
    .expect("test timed out");
}

// ── Controller end to end ───────────────────────────────────────────

#[tokio::test]
async fn analysis_request_carries_images_and_schema() {
    timeout(TEST_TIMEOUT, async {
        let fake = Arc::new(FakeGemini::default());
        let base_url = start_server(Arc::clone(&fake)).await;
        let controller = ready_controller(&fake, &base_url).await;

        assert_eq!(controller.view(), ViewState::Result);
        let analysis = controller.analysis().unwrap();
        assert_eq!(analysis.milestones.len(), 2);
        assert_eq!(analysis.five_elements.unwrap().element, "火");
        assert_eq!(controller.messages()[0].text, GREETING);

        let (target, _, body) = fake.request(0);
        assert_eq!(target, "gemini-2.5-flash:generateContent");
        let parts = body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[0]["inlineData"]["data"], "iVA=");
        let instruction = parts[1]["text"].as_str().unwrap();
        assert!(instruction.contains("张三"));
        assert!(instruction.contains("狮子座"));

        let config = &body["generationConfig"];
        assert_eq!(config["responseMimeType"], "application/json");
        assert_eq!(config["responseSchema"]["type"], "OBJECT");
        assert!(
            config["responseSchema"]["required"]
                .as_array()
                .unwrap()
                .contains(&json!("fiveElements"))
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn chat_turns_replay_history() {
    timeout(TEST_TIMEOUT, async {
        let fake = Arc::new(FakeGemini::default());
        let base_url = start_server(Arc::clone(&fake)).await;
        let controller = ready_controller(&fake, &base_url).await;

        fake.push_text("今年宜守");
        controller.send_chat("今年事业如何？").await.unwrap();
        fake.push_text("秋季为佳");
        let reply = controller.send_chat("何时换工作？").await.unwrap();
        assert_eq!(reply.message.text, "秋季为佳");
        assert_eq!(controller.messages().len(), 5);

        let (target, _, body) = fake.request(2);
        assert_eq!(target, "gemini-3-pro-preview:generateContent");
        let system = body["systemInstruction"]["parts"][0]["text"].as_str().unwrap();
        assert!(system.contains("张三"));
        assert!(system.contains("乙巳年稳中求进"));

        let contents = body["contents"].as_array().unwrap();
        let roles: Vec<&str> = contents.iter().map(|c| c["role"].as_str().unwrap()).collect();
        assert_eq!(roles, ["user", "model", "user"]);
        assert_eq!(contents[1]["parts"][0]["text"], "今年宜守");
        assert!(body.get("generationConfig").is_none());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn server_error_during_chat_shows_fallback() {
    timeout(TEST_TIMEOUT, async {
        let fake = Arc::new(FakeGemini::default());
        let base_url = start_server(Arc::clone(&fake)).await;
        let controller = ready_controller(&fake, &base_url).await;

        fake.push(StatusCode::SERVICE_UNAVAILABLE, json!({ "error": { "message": "overloaded" } }));
        let reply = controller.send_chat("还在吗？").await.unwrap();
        assert!(reply.degraded);
        assert_eq!(reply.message.text, CHAT_FALLBACK);
        assert!(controller.has_active_session());
        assert!(!controller.is_chat_busy());

        // The failed turn is not replayed to the model
        fake.push_text("在的");
        controller.send_chat("再问一次").await.unwrap();
        let (_, _, body) = fake.request(2);
        assert_eq!(body["contents"].as_array().unwrap().len(), 1);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn server_error_during_analysis_returns_to_input() {
    timeout(TEST_TIMEOUT, async {
        let fake = Arc::new(FakeGemini::default());
        let base_url = start_server(Arc::clone(&fake)).await;
        fake.push(StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": { "message": "boom" } }));

        let controller = controller(&base_url);
        controller.update_profile(ProfileEdit::Name("李四".into())).unwrap();
        controller
            .update_profile(ProfileEdit::BirthDate("2001-01-01".into()))
            .unwrap();

        let err = controller.start_analysis().await.unwrap_err();
        assert!(matches!(
            err,
            ControllerError::Generation(GenerationError::Service(LlmError::Http {
                status: 500,
                ..
            }))
        ));
        assert_eq!(controller.view(), ViewState::Input);
        assert_eq!(controller.profile().name(), "李四");
        assert!(!controller.has_active_session());
    })
    .await
    .expect("test timed out");
}
