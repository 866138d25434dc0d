//! HTTP API for the voice guide.
//!
//! Runs on port 2004 by default. CORS-permissive so the web UI can call it
//! from its dev server. Navigation intents stream out on `/events` as SSE.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::Stream;
use tokio::sync::broadcast::error::RecvError;
use tower_http::cors::CorsLayer;
use tracing::{debug, warn};

use nixvoice_core::pages::Page;
use nixvoice_core::types::{NarrationStatus, VoiceOption};

use crate::guide::VoiceGuide;
use crate::recognition::ChannelRecognizer;

#[derive(Clone)]
struct ApiState {
    guide: VoiceGuide,
    phrases: Option<Arc<ChannelRecognizer>>,
}

/// Build the axum router over a shared [`VoiceGuide`]. `phrases` is the
/// recognizer the guide was built with, if `/recognize` should feed it.
pub fn router(guide: VoiceGuide, phrases: Option<Arc<ChannelRecognizer>>) -> Router {
    Router::new()
        .route("/speak", post(speak))
        .route("/announce", post(announce))
        .route("/toggle", post(toggle))
        .route("/enable", post(enable))
        .route("/disable", post(disable))
        .route("/stop", post(stop))
        .route("/listen/start", post(listen_start))
        .route("/listen/stop", post(listen_stop))
        .route("/recognize", post(recognize))
        .route("/status", get(status))
        .route("/voices", get(voices))
        .route("/events", get(events))
        .layer(CorsLayer::permissive())
        .with_state(ApiState { guide, phrases })
}

#[derive(serde::Deserialize)]
struct TextRequest {
    text: String,
}

#[derive(serde::Deserialize)]
struct AnnounceRequest {
    page: Page,
}

#[derive(serde::Serialize)]
struct SpeakResponse {
    ok: bool,
    speaking: bool,
}

#[derive(serde::Serialize)]
struct OkResponse {
    ok: bool,
}

#[derive(serde::Serialize)]
struct EnabledResponse {
    enabled: bool,
}

#[derive(serde::Serialize)]
struct ListeningResponse {
    listening: bool,
}

#[derive(serde::Serialize)]
struct VoicesResponse {
    voices: Vec<VoiceOption>,
    selected: Option<VoiceOption>,
}

async fn speak(State(state): State<ApiState>, Json(req): Json<TextRequest>) -> Json<SpeakResponse> {
    state.guide.speak(&req.text);
    Json(SpeakResponse {
        ok: true,
        speaking: state.guide.status().speaking,
    })
}

async fn announce(
    State(state): State<ApiState>,
    Json(req): Json<AnnounceRequest>,
) -> Json<SpeakResponse> {
    state.guide.announce(req.page);
    Json(SpeakResponse {
        ok: true,
        speaking: state.guide.status().speaking,
    })
}

async fn toggle(State(state): State<ApiState>) -> Json<EnabledResponse> {
    Json(EnabledResponse {
        enabled: state.guide.toggle_voice(),
    })
}

async fn enable(State(state): State<ApiState>) -> Json<EnabledResponse> {
    state.guide.set_enabled(true);
    Json(EnabledResponse { enabled: true })
}

async fn disable(State(state): State<ApiState>) -> Json<EnabledResponse> {
    state.guide.set_enabled(false);
    Json(EnabledResponse { enabled: false })
}

async fn stop(State(state): State<ApiState>) -> Json<OkResponse> {
    state.guide.stop();
    Json(OkResponse { ok: true })
}

async fn listen_start(State(state): State<ApiState>) -> Json<ListeningResponse> {
    state.guide.start_listening();
    Json(ListeningResponse {
        listening: state.guide.is_listening(),
    })
}

async fn listen_stop(State(state): State<ApiState>) -> Json<ListeningResponse> {
    state.guide.stop_listening();
    Json(ListeningResponse {
        listening: state.guide.is_listening(),
    })
}

/// Feed a phrase as if the recognizer heard it. Rejected unless listening.
async fn recognize(
    State(state): State<ApiState>,
    Json(req): Json<TextRequest>,
) -> Json<OkResponse> {
    let ok = match &state.phrases {
        Some(phrases) => match phrases.feed(req.text) {
            Ok(()) => true,
            Err(e) => {
                debug!("phrase rejected: {e}");
                false
            }
        },
        None => false,
    };
    Json(OkResponse { ok })
}

async fn status(State(state): State<ApiState>) -> Json<NarrationStatus> {
    Json(state.guide.status())
}

async fn voices(State(state): State<ApiState>) -> Json<VoicesResponse> {
    Json(VoicesResponse {
        voices: state.guide.voices(),
        selected: state.guide.selected_voice(),
    })
}

async fn events(
    State(state): State<ApiState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let intents = state.guide.subscribe_intents();
    let stream = futures_util::stream::unfold(intents, |mut intents| async move {
        loop {
            match intents.recv().await {
                Ok(intent) => match Event::default().event("navigate").json_data(intent) {
                    Ok(event) => return Some((Ok(event), intents)),
                    Err(e) => warn!("failed to encode intent: {e}"),
                },
                Err(RecvError::Lagged(missed)) => debug!(missed, "event subscriber lagged"),
                Err(RecvError::Closed) => return None,
            }
        }
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Detection;
    use crate::fake::FakeSynthesizer;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use nixvoice_core::types::NarrationConfig;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app(fake: &Arc<FakeSynthesizer>) -> (Router, VoiceGuide, Arc<ChannelRecognizer>) {
        let phrases = ChannelRecognizer::new();
        let guide = VoiceGuide::new(
            Detection::with(fake.clone()),
            NarrationConfig::default(),
            Some(phrases.clone()),
        );
        (router(guide.clone(), Some(phrases.clone())), guide, phrases)
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Value {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn status_reports_initial_state() {
        let fake = FakeSynthesizer::with_default_voice();
        let (app, _, _) = app(&fake);

        let status = call(&app, "GET", "/status", None).await;
        assert_eq!(status["available"], true);
        assert_eq!(status["enabled"], false);
        assert_eq!(status["speaking"], false);
        assert_eq!(status["listening"], false);
        assert_eq!(status["voice"], "Default");
    }

    #[tokio::test]
    async fn speak_is_gated_by_toggle() {
        let fake = FakeSynthesizer::with_default_voice();
        let (app, _, _) = app(&fake);

        let resp = call(&app, "POST", "/speak", Some(json!({ "text": "Welcome" }))).await;
        assert_eq!(resp["speaking"], false);

        let resp = call(&app, "POST", "/toggle", None).await;
        assert_eq!(resp["enabled"], true);

        let resp = call(&app, "POST", "/speak", Some(json!({ "text": "Welcome" }))).await;
        assert_eq!(resp["speaking"], true);
        assert_eq!(fake.spoken(), vec!["Welcome"]);
    }

    #[tokio::test]
    async fn announce_uses_page_prompt() {
        let fake = FakeSynthesizer::with_default_voice();
        let (app, _, _) = app(&fake);

        call(&app, "POST", "/enable", None).await;
        call(&app, "POST", "/announce", Some(json!({ "page": "admin" }))).await;

        assert_eq!(fake.spoken(), vec![Page::Admin.prompt().unwrap()]);
    }

    #[tokio::test]
    async fn disable_and_stop_silence_narration() {
        let fake = FakeSynthesizer::with_default_voice();
        let (app, guide, _) = app(&fake);

        call(&app, "POST", "/enable", None).await;
        call(&app, "POST", "/speak", Some(json!({ "text": "one" }))).await;
        call(&app, "POST", "/stop", None).await;
        assert!(!guide.status().speaking);
        assert!(guide.is_enabled());

        call(&app, "POST", "/speak", Some(json!({ "text": "two" }))).await;
        let resp = call(&app, "POST", "/disable", None).await;
        assert_eq!(resp["enabled"], false);
        assert!(!guide.status().speaking);
    }

    #[tokio::test]
    async fn recognize_requires_listening() {
        let fake = FakeSynthesizer::with_default_voice();
        let (app, guide, _) = app(&fake);
        let mut intents = guide.subscribe_intents();

        let resp = call(&app, "POST", "/recognize", Some(json!({ "text": "dashboard" }))).await;
        assert_eq!(resp["ok"], false);

        let resp = call(&app, "POST", "/listen/start", None).await;
        assert_eq!(resp["listening"], true);

        let resp = call(&app, "POST", "/recognize", Some(json!({ "text": "repositories" }))).await;
        assert_eq!(resp["ok"], true);

        let intent = tokio::time::timeout(std::time::Duration::from_secs(2), intents.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(intent.page, Page::Repositories);

        let resp = call(&app, "POST", "/listen/stop", None).await;
        assert_eq!(resp["listening"], false);
    }

    #[tokio::test]
    async fn voices_lists_options_and_selection() {
        let fake = FakeSynthesizer::new(vec![
            VoiceOption::new("bob", "Bob", "fr-FR"),
            VoiceOption::new("us", "Default", "en-US"),
        ]);
        let (app, _, _) = app(&fake);

        let resp = call(&app, "GET", "/voices", None).await;
        assert_eq!(resp["voices"].as_array().unwrap().len(), 2);
        assert_eq!(resp["selected"]["id"], "us");
    }
}
