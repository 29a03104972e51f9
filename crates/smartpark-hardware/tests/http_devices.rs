//! HTTP-attached camera and plate reader against a mock server.

use serde_json::json;
use smartpark_hardware::{
    Camera, Frame, HardwareError, HttpOcrConfig, PlateReader, SnapshotCameraConfig,
    TextCandidate, ocr_http::HttpPlateReader, snapshot::SnapshotCamera,
};
use std::time::Duration;
use wiremock::matchers::{body_bytes, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FAKE_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0xFF, 0xD9];

#[tokio::test]
async fn test_snapshot_camera_returns_body_as_frame() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/snapshot.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(FAKE_JPEG)
                .insert_header("content-type", "image/jpeg"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = SnapshotCameraConfig::new(format!("{}/snapshot.jpg", server.uri()));
    let mut camera = SnapshotCamera::new(config).unwrap();

    let frame = camera.capture().await.unwrap();
    assert_eq!(&frame.jpeg()[..], FAKE_JPEG);
}

#[tokio::test]
async fn test_snapshot_camera_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut camera = SnapshotCamera::new(SnapshotCameraConfig::new(server.uri())).unwrap();
    let err = camera.capture().await.unwrap_err();
    assert!(matches!(err, HardwareError::CommunicationError { .. }));
}

#[tokio::test]
async fn test_snapshot_camera_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(FAKE_JPEG)
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let config = SnapshotCameraConfig::new(server.uri()).with_timeout(Duration::from_millis(50));
    let mut camera = SnapshotCamera::new(config).unwrap();

    let err = camera.capture().await.unwrap_err();
    assert!(matches!(err, HardwareError::Timeout { duration_ms: 50 }));
}

#[tokio::test]
async fn test_plate_reader_posts_jpeg() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ocr"))
        .and(header("content-type", "image/jpeg"))
        .and(body_bytes(FAKE_JPEG.to_vec()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"text": "xy-999zz", "confidence": 0.7},
            ["AB123CD", 0.4]
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let reader = HttpPlateReader::new(HttpOcrConfig::new(format!("{}/ocr", server.uri()))).unwrap();
    let candidates = reader
        .read_text(&Frame::from_jpeg(FAKE_JPEG.to_vec()))
        .await
        .unwrap();

    assert_eq!(
        candidates,
        vec![
            TextCandidate::new("xy-999zz", 0.7),
            TextCandidate::new("AB123CD", 0.4),
        ]
    );
}

#[tokio::test]
async fn test_plate_reader_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let reader = HttpPlateReader::new(HttpOcrConfig::new(server.uri())).unwrap();
    let err = reader.read_text(&Frame::placeholder()).await.unwrap_err();
    assert!(matches!(err, HardwareError::RecognitionUnavailable { .. }));
}

#[tokio::test]
async fn test_plate_reader_garbage_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let reader = HttpPlateReader::new(HttpOcrConfig::new(server.uri())).unwrap();
    let err = reader.read_text(&Frame::placeholder()).await.unwrap_err();
    assert!(matches!(err, HardwareError::InvalidData { .. }));
}
