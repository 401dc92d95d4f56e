use axum::{
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    routing::post,
    Router,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const GOOD_FIT: &str = r#"{"predicted_size":"M","confidence":87.5,"message":"Good fit","all_probabilities":{"S":5,"M":87.5,"L":7.5},"input_data":{"height":175,"weight":70,"chest_size":"M","waist_size":null}}"#;

#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub content_type: Option<String>,
    pub raw: String,
    pub body: serde_json::Value,
}

#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<SeenRequest>>>);

impl Recorder {
    pub fn requests(&self) -> Vec<SeenRequest> {
        self.0.lock().unwrap().clone()
    }
}

/// Serves `POST /predict` answering every call with `status` and `body`
/// after `delay`. Returns the predict URL and the request recorder.
pub async fn spawn_predictor(
    status: StatusCode,
    body: &'static str,
    delay: Duration,
) -> (String, Recorder) {
    let recorder = Recorder::default();
    let seen = recorder.clone();
    let app = Router::new().route(
        "/predict",
        post(move |headers: HeaderMap, raw: String| {
            let seen = seen.clone();
            async move {
                seen.0.lock().unwrap().push(SeenRequest {
                    content_type: headers
                        .get(CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string),
                    body: serde_json::from_str(&raw).unwrap_or(serde_json::Value::Null),
                    raw,
                });
                tokio::time::sleep(delay).await;
                (status, [(CONTENT_TYPE, "application/json")], body)
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/predict", addr), recorder)
}
