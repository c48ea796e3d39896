//! Exercises `HttpPredictionService` against a real HTTP server on an
//! ephemeral port. The server runs axum on a current-thread runtime in a
//! background thread; the blocking client stays on the test thread.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use axum::Router;
use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use predict_core::{
    HttpPredictionService, PredictError, PredictionService, PredictorConfig, RequestState,
    UploadController,
};
use serde_json::json;
use tempfile::TempDir;

fn spawn_service(app: Router) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    listener
        .set_nonblocking(true)
        .expect("nonblocking listener");
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("test runtime");
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).expect("tokio listener");
            axum::serve(listener, app).await.expect("serve");
        });
    });
    format!("http://{addr}/predict")
}

fn client_for(endpoint_url: String) -> (HttpPredictionService, PredictorConfig) {
    let config = PredictorConfig {
        endpoint_url,
        ..PredictorConfig::default()
    };
    (HttpPredictionService::new(&config), config)
}

fn image_fixture(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("cell.png");
    let mut file = File::create(&path).expect("create fixture");
    file.write_all(b"\x89PNG not really, but bytes are bytes")
        .expect("write fixture");
    path
}

async fn classify_as_infected(mut multipart: Multipart) -> impl IntoResponse {
    let Ok(Some(field)) = multipart.next_field().await else {
        return (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({"error": "no multipart field"})),
        );
    };
    if field.name() != Some("file") {
        return (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({"error": "expected a part named file"})),
        );
    }
    let bytes = field.bytes().await.expect("read part");
    if bytes.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({"error": "empty upload"})),
        );
    }
    (
        StatusCode::OK,
        axum::Json(json!({"result": "Infected", "confidence": 0.87})),
    )
}

async fn fail_with_error_body() -> impl IntoResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        axum::Json(json!({"error": "model not loaded"})),
    )
}

async fn fail_with_plain_text() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "stack trace goes here")
}

async fn succeed_with_empty_body() -> impl IntoResponse {
    (StatusCode::OK, axum::Json(json!({})))
}

#[test]
fn success_response_round_trips_through_the_controller() {
    let endpoint = spawn_service(Router::new().route("/predict", post(classify_as_infected)));
    let (service, config) = client_for(endpoint);

    let dir = TempDir::new().unwrap();
    let mut ctrl = UploadController::new(config);
    ctrl.select_file(Some(image_fixture(&dir)));
    ctrl.submit(&service);

    assert_eq!(ctrl.state(), RequestState::Succeeded);
    assert!(ctrl.result_visible());
    let result = ctrl.result().expect("result present");
    assert_eq!(result.label, "Infected");
    assert_eq!(result.confidence, 0.87);
}

#[test]
fn http_500_surfaces_the_service_error_text() {
    let endpoint = spawn_service(Router::new().route("/predict", post(fail_with_error_body)));
    let (service, _) = client_for(endpoint);

    let dir = TempDir::new().unwrap();
    let err = service.predict(&image_fixture(&dir)).unwrap_err();
    assert_eq!(
        err,
        PredictError::Service {
            status: 500,
            message: "model not loaded".to_string(),
        }
    );
}

#[test]
fn http_500_without_structured_body_gets_a_generic_message() {
    let endpoint = spawn_service(Router::new().route("/predict", post(fail_with_plain_text)));
    let (service, _) = client_for(endpoint);

    let dir = TempDir::new().unwrap();
    let err = service.predict(&image_fixture(&dir)).unwrap_err();
    match err {
        PredictError::Service { status, message } => {
            assert_eq!(status, 500);
            assert!(!message.is_empty());
        }
        other => panic!("expected Service error, got {other:?}"),
    }
}

#[test]
fn empty_success_body_is_an_invalid_response() {
    let endpoint = spawn_service(Router::new().route("/predict", post(succeed_with_empty_body)));
    let (service, config) = client_for(endpoint);

    let dir = TempDir::new().unwrap();
    let mut ctrl = UploadController::new(config);
    ctrl.select_file(Some(image_fixture(&dir)));
    ctrl.submit(&service);

    assert_eq!(ctrl.state(), RequestState::Failed);
    assert!(matches!(
        ctrl.error(),
        Some(PredictError::InvalidResponse(_))
    ));
    assert!(ctrl.result().is_none());
}

#[test]
fn unreachable_endpoint_is_a_transport_failure() {
    // Bind and immediately drop to get a port with nothing listening.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (service, _) = client_for(format!("http://{addr}/predict"));
    let dir = TempDir::new().unwrap();
    let err = service.predict(&image_fixture(&dir)).unwrap_err();
    assert!(matches!(err, PredictError::Transport(_)));
}

#[test]
fn missing_file_on_disk_is_a_transport_failure() {
    let endpoint = spawn_service(Router::new().route("/predict", post(classify_as_infected)));
    let (service, _) = client_for(endpoint);
    let err = service
        .predict(&PathBuf::from("/nonexistent/cell.png"))
        .unwrap_err();
    assert!(matches!(err, PredictError::Transport(_)));
}
