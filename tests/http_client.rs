//! Wire-level client tests against a loopback one-shot HTTP stub

use bgremove_client::{
    input, submit_candidate, ArtifactExporter, BackgroundSpec, CandidateImage, ClientConfig,
    ClientError, HttpProcessingClient, ProcessingService, Session, SessionStatus,
    GENERIC_FAILURE_MESSAGE,
};
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// One canned HTTP response the stub serves
struct StubResponse {
    status: &'static str,
    content_type: &'static str,
    body: Vec<u8>,
}

impl StubResponse {
    fn json(body: &str) -> Self {
        Self {
            status: "200 OK",
            content_type: "application/json",
            body: body.as_bytes().to_vec(),
        }
    }

    fn error(status: &'static str, body: &str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.as_bytes().to_vec(),
        }
    }

    fn png(bytes: Vec<u8>) -> Self {
        Self {
            status: "200 OK",
            content_type: "image/png",
            body: bytes,
        }
    }
}

/// Serve the given responses to sequential connections, capturing each
/// request (head and body, lossy) for assertions
async fn spawn_stub(responses: Vec<StubResponse>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let mut captured = Vec::new();
        for response in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            captured.push(request);

            let head = format!(
                "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                response.status,
                response.content_type,
                response.body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&response.body).await.unwrap();
            socket.flush().await.unwrap();
        }
        captured
    });

    (base, handle)
}

/// Read one full HTTP request: headers, then a content-length body if present
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before headers were complete");
        buffer.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find_header_end(&buffer) {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buffer[..header_end]).into_owned();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())?
        })
        .unwrap_or(0);

    let mut body = buffer.split_off(header_end + 4);
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed mid-body");
        body.extend_from_slice(&chunk[..n]);
    }

    format!("{head}\r\n\r\n{}", String::from_utf8_lossy(&body))
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|w| w == b"\r\n\r\n")
}

fn png_file_candidate() -> CandidateImage {
    let img = RgbaImage::from_pixel(2, 2, Rgba([9, 9, 9, 255]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    CandidateImage::File {
        bytes,
        mime: "image/png".to_string(),
        file_name: "photo.png".to_string(),
    }
}

fn client_for(base: &str) -> HttpProcessingClient {
    let config = ClientConfig::builder().service_base_url(base).build().unwrap();
    HttpProcessingClient::new(config).unwrap()
}

const SUCCESS_BODY: &str =
    r#"{"success": true, "filename": "out123.png", "image_url": "/static/out123.png"}"#;

#[tokio::test]
async fn upload_submission_resolves_relative_image_url() {
    let (base, handle) = spawn_stub(vec![StubResponse::json(SUCCESS_BODY)]).await;
    let client = client_for(&base);

    let result = client.submit(&png_file_candidate()).await.unwrap();
    assert_eq!(
        result.processed_url.as_str(),
        format!("{base}/static/out123.png")
    );
    assert_eq!(result.suggested_file_name.as_deref(), Some("out123.png"));

    let requests = handle.await.unwrap();
    let request = &requests[0];
    assert!(request.starts_with("POST /remove-background/upload HTTP/1.1"));
    assert!(request.contains("multipart/form-data"));
    assert!(request.contains("name=\"file\""));
    assert!(request.contains("filename=\"photo.png\""));
    assert!(request.contains("image/png"));
}

#[tokio::test]
async fn url_submission_sends_image_url_form_field() {
    let (base, handle) = spawn_stub(vec![StubResponse::json(SUCCESS_BODY)]).await;
    let client = client_for(&base);

    let candidate = CandidateImage::Url("https://example.com/cat.jpg".parse().unwrap());
    client.submit(&candidate).await.unwrap();

    let requests = handle.await.unwrap();
    let request = &requests[0];
    assert!(request.starts_with("POST /remove-background/url HTTP/1.1"));
    assert!(request.contains("name=\"image_url\""));
    assert!(request.contains("https://example.com/cat.jpg"));
}

#[tokio::test]
async fn base64_submission_strips_data_url_prefix() {
    let (base, handle) = spawn_stub(vec![StubResponse::json(SUCCESS_BODY)]).await;
    let client = client_for(&base);

    client
        .submit_base64("data:image/png;base64,QUJDRA==")
        .await
        .unwrap();

    let requests = handle.await.unwrap();
    let request = &requests[0];
    assert!(request.starts_with("POST /remove-background/base64 HTTP/1.1"));
    assert!(request.contains("name=\"image_data\""));
    assert!(request.contains("QUJDRA=="));
    assert!(!request.contains("data:image/png"));
}

#[tokio::test]
async fn http_500_fails_session_with_generic_message() {
    let (base, handle) =
        spawn_stub(vec![StubResponse::error("500 Internal Server Error", r#"{"detail": "model exploded"}"#)]).await;
    let client = client_for(&base);

    let mut session = Session::new();
    session.select(input::select_url("https://example.com/cat.jpg").unwrap());
    let status = submit_candidate(&mut session, &client).await.unwrap();

    assert_eq!(status, SessionStatus::Failed);
    // The user sees the generic message, not the service detail
    assert_eq!(session.error_message(), Some(GENERIC_FAILURE_MESSAGE));
    handle.await.unwrap();
}

#[tokio::test]
async fn http_500_detail_is_retained_in_the_error() {
    let (base, handle) =
        spawn_stub(vec![StubResponse::error("500 Internal Server Error", r#"{"detail": "model exploded"}"#)]).await;
    let client = client_for(&base);

    let err = client.submit(&png_file_candidate()).await.unwrap_err();
    match err {
        ClientError::Processing(cause) => {
            assert!(cause.contains("500"));
            assert!(cause.contains("model exploded"));
        },
        other => panic!("expected Processing error, got {other:?}"),
    }
    handle.await.unwrap();
}

#[tokio::test]
async fn malformed_response_body_is_a_processing_error() {
    let (base, handle) = spawn_stub(vec![StubResponse::json("this is not json")]).await;
    let client = client_for(&base);

    let err = client.submit(&png_file_candidate()).await.unwrap_err();
    assert!(matches!(err, ClientError::Processing(_)));
    handle.await.unwrap();
}

#[tokio::test]
async fn health_check_parses_service_status() {
    let (base, handle) = spawn_stub(vec![StubResponse::json(
        r#"{"status": "online", "message": "Background Removal API is running"}"#,
    )])
    .await;
    let client = client_for(&base);

    let status = client.health_check().await.unwrap();
    assert_eq!(status.status, "online");
    assert_eq!(status.message, "Background Removal API is running");

    let requests = handle.await.unwrap();
    assert!(requests[0].starts_with("GET / HTTP/1.1"));
}

#[tokio::test]
async fn full_download_flow_composites_over_blue() {
    // Processed image: one transparent and one opaque pixel
    let mut processed = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 0]));
    processed.put_pixel(1, 0, Rgba([200, 150, 100, 255]));
    let mut png = Vec::new();
    image::DynamicImage::ImageRgba8(processed)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();

    let (base, handle) = spawn_stub(vec![
        StubResponse::json(r#"{"success": true, "filename": "out.png", "image_url": "/images/out.png"}"#),
        StubResponse::png(png),
    ])
    .await;

    let config = ClientConfig::builder().service_base_url(&base).build().unwrap();
    let client = HttpProcessingClient::new(config.clone()).unwrap();

    let mut session = Session::new();
    session.select(input::select_url("https://example.com/cat.jpg").unwrap());
    let status = submit_candidate(&mut session, &client).await.unwrap();
    assert_eq!(status, SessionStatus::Completed);

    session.set_background(BackgroundSpec::Custom("#0000ff".to_string()));

    let dir = tempfile::tempdir().unwrap();
    let exporter = ArtifactExporter::new(&config).unwrap();
    let artifact = exporter
        .download(&session, dir.path())
        .await
        .unwrap()
        .expect("artifact should be current");
    assert_eq!(artifact, dir.path().join("out.png"));

    let saved = image::open(&artifact).unwrap().to_rgba8();
    assert_eq!(*saved.get_pixel(0, 0), Rgba([0, 0, 255, 255]));
    assert_eq!(*saved.get_pixel(1, 0), Rgba([200, 150, 100, 255]));

    let requests = handle.await.unwrap();
    assert!(requests[1].starts_with("GET /images/out.png HTTP/1.1"));
}

#[tokio::test]
async fn fetch_failure_during_export_is_an_image_load_error() {
    let (base, handle) = spawn_stub(vec![
        StubResponse::json(r#"{"success": true, "filename": "out.png", "image_url": "/images/out.png"}"#),
        StubResponse::error("404 Not Found", "gone"),
    ])
    .await;

    let config = ClientConfig::builder().service_base_url(&base).build().unwrap();
    let client = HttpProcessingClient::new(config.clone()).unwrap();

    let mut session = Session::new();
    session.select(input::select_url("https://example.com/cat.jpg").unwrap());
    submit_candidate(&mut session, &client).await.unwrap();
    session.set_background(BackgroundSpec::Custom("#0000ff".to_string()));

    let dir = tempfile::tempdir().unwrap();
    let exporter = ArtifactExporter::new(&config).unwrap();
    let err = exporter.download(&session, dir.path()).await.unwrap_err();

    // Distinct from a submission failure: the session stays Completed
    assert!(matches!(err, ClientError::ImageLoad(_)));
    assert_eq!(session.status(), SessionStatus::Completed);
    assert!(session.result().is_some());
    handle.await.unwrap();
}
