//! HTTP shell tests.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`, so no
//! socket is bound. Every case here is rejected before pdfium is touched and
//! runs without a pdfium library. Full scans over HTTP live in `e2e.rs`.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use pdf_edgescan::{router, ServerConfig};
use tower::ServiceExt;

const BOUNDARY: &str = "edgescan-test-boundary";

/// One multipart part: `(field name, optional filename, content)`.
type Part<'a> = (&'a str, Option<&'a str>, &'a [u8]);

fn file_part<'a>(filename: &'a str, content: &'a [u8]) -> Part<'a> {
    ("file", Some(filename), content)
}

fn text_part<'a>(name: &'a str, value: &'a str) -> Part<'a> {
    (name, None, value.as_bytes())
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, content) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match filename {
            Some(f) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

async fn send(config: &ServerConfig, req: Request<Body>) -> (StatusCode, String) {
    let resp = router(config).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

#[tokio::test]
async fn missing_file_part_is_400() {
    let req = upload_request(&[text_part("edgemode", "sobel")]);
    let (status, body) = send(&ServerConfig::default(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "No file part");
}

#[tokio::test]
async fn non_pdf_filename_is_400() {
    let req = upload_request(&[file_part("notes.txt", b"%PDF-1.4 but named .txt")]);
    let (status, body) = send(&ServerConfig::default(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Please upload a PDF file");
}

#[tokio::test]
async fn uppercase_extension_is_400() {
    let req = upload_request(&[file_part("SCAN.PDF", b"%PDF-1.4")]);
    let (status, body) = send(&ServerConfig::default(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Please upload a PDF file");
}

#[tokio::test]
async fn empty_filename_is_400() {
    let req = upload_request(&[file_part("", b"%PDF-1.4")]);
    let (status, body) = send(&ServerConfig::default(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Please upload a PDF file");
}

#[tokio::test]
async fn undecodable_pdf_is_500_processing_error() {
    let req = upload_request(&[
        file_part("broken.pdf", b"this is not a pdf at all"),
        text_part("edgemode", "laplacian"),
    ]);
    let (status, body) = send(&ServerConfig::default(), req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.starts_with("Processing error: "), "got: {body}");
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let config = ServerConfig {
        max_upload_bytes: 1024,
        ..ServerConfig::default()
    };
    let big = vec![b'x'; 8 * 1024];
    let req = upload_request(&[file_part("big.pdf", &big)]);
    let (status, _) = send(&config, req).await;
    assert!(status.is_client_error(), "got: {status}");
}

#[tokio::test]
async fn health_reports_ok() {
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&ServerConfig::default(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn upload_only_accepts_post() {
    let req = Request::builder()
        .method(Method::GET)
        .uri("/upload")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&ServerConfig::default(), req).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn non_multipart_body_is_rejected() {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header(header::CONTENT_TYPE, "application/pdf")
        .body(Body::from(b"%PDF-1.4".to_vec()))
        .unwrap();
    let (status, _) = send(&ServerConfig::default(), req).await;
    assert!(status.is_client_error(), "got: {status}");
}
