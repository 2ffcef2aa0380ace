//! Whisper client against a local transcription stub

use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;

use karen_assistant::Error;
use karen_assistant::voice::{SAMPLE_RATE, SpeechToText, samples_to_wav};

async fn transcriptions(headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        == Some("Bearer sk-test");
    if !authorized {
        return (StatusCode::UNAUTHORIZED, "invalid api key").into_response();
    }

    let form = String::from_utf8_lossy(&body);
    if !form.contains("whisper-1") || !form.contains("audio.wav") {
        return (StatusCode::BAD_REQUEST, "missing form fields").into_response();
    }

    Json(json!({ "text": "what is the time" })).into_response()
}

async fn spawn_stub() -> String {
    let app = Router::new().route("/v1/audio/transcriptions", post(transcriptions));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}/v1/audio/transcriptions")
}

fn wav() -> Vec<u8> {
    samples_to_wav(&[0.0; 160], SAMPLE_RATE).unwrap()
}

#[tokio::test]
async fn test_transcribe_returns_text() {
    let url = spawn_stub().await;
    let stt = SpeechToText::new_whisper("sk-test".into(), "whisper-1".into(), "en".into())
        .unwrap()
        .with_url(url);

    assert_eq!(stt.transcribe(wav()).await.unwrap(), "what is the time");
}

#[tokio::test]
async fn test_api_error_is_reported() {
    let url = spawn_stub().await;
    let stt = SpeechToText::new_whisper("sk-wrong".into(), "whisper-1".into(), "en".into())
        .unwrap()
        .with_url(url);

    let err = stt.transcribe(wav()).await.unwrap_err();
    assert!(matches!(err, Error::Stt(ref msg) if msg.contains("401")));
}
