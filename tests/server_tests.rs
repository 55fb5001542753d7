//! HTTP API tests, driven through the router without a socket.

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use lopdf::{Document, Object, Stream, dictionary};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use validoc::ValidocError;
use validoc::config::{DEFAULT_FONT_PATH, DEFAULT_LISTEN_ADDR};
use validoc::pdf::FontSet;
use validoc::render::DocumentRenderer;
use validoc::server::{AppState, ServerConfig, router};

const BOUNDARY: &str = "validoc-test-boundary";

fn app() -> axum::Router {
    let config = ServerConfig {
        listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
        font_path: DEFAULT_FONT_PATH.into(),
        standard_font: true,
        settings_path: None,
    };
    let renderer = DocumentRenderer::new(FontSet::standard());
    router(Arc::new(AppState::new(config, renderer)))
}

fn one_page_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content_id = doc.add_object(Stream::new(dictionary! {}, b"0 0 m\n".to_vec()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => 1,
            "Kids" => vec![Object::Reference(page_id)],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

fn multipart(parts: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\r\n",
                name, name
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn render_request(parts: &[(&str, &[u8])]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/documents/render")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart(parts)))
        .unwrap()
}

fn template_json() -> Value {
    json!({
        "containerWidth": 612,
        "fields": [
            { "id": "f1", "type": "data", "name": "numero_traza", "x": 20, "y": 20, "width": 200, "height": 20 },
            { "id": "f2", "type": "data", "name": "cliente", "x": 20, "y": 60, "width": 200, "height": 20, "fontSize": 200 },
            { "id": "f3", "type": "qr", "name": "folio", "x": 400, "y": 20, "width": 100, "height": 100, "qrData": "" }
        ]
    })
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn config_with_font(font_path: &str, standard_font: bool) -> ServerConfig {
    ServerConfig {
        listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
        font_path: font_path.into(),
        standard_font,
        settings_path: None,
    }
}

#[test]
fn test_missing_font_fails_startup() {
    let err = AppState::from_config(config_with_font("/nonexistent/font.ttf", false)).err();
    assert!(matches!(err, Some(ValidocError::Font(_))));
}

#[test]
fn test_standard_font_ignores_font_path() {
    let state = AppState::from_config(config_with_font("/nonexistent/font.ttf", true)).unwrap();
    let fonts = state.renderer.fonts();
    assert!(!fonts.font(fonts.default_font()).is_embedded());
}

#[test]
fn test_font_path_is_embedded() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fonts/DejaVuSans.ttf");
    let state = AppState::from_config(config_with_font(path, false)).unwrap();
    let fonts = state.renderer.fonts();
    assert!(fonts.font(fonts.default_font()).is_embedded());
}

#[tokio::test]
async fn test_health() {
    let response = app()
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn test_validate_reports_field_issues() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/templates/validate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(template_json().to_string()))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["renderable"], true);
    assert_eq!(body["valid"], json!(["f1", "f3"]));
    assert_eq!(body["issues"][0]["id"], "f2");
}

#[tokio::test]
async fn test_validate_flags_missing_container_width() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/templates/validate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "fields": [] }).to_string()))
        .unwrap();
    let body = json_body(app().oneshot(request).await.unwrap()).await;
    assert_eq!(body["renderable"], false);
    assert!(body["error"].as_str().unwrap().contains("containerWidth"));
}

#[tokio::test]
async fn test_render_returns_pdf_with_report_headers() {
    let pdf = one_page_pdf();
    let template = template_json().to_string();
    let record = json!({ "numero_traza": "T-1042" }).to_string();

    let response = app()
        .oneshot(render_request(&[
            ("pdf", pdf.as_slice()),
            ("template", template.as_bytes()),
            ("record", record.as_bytes()),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(headers["x-validoc-drawn"], "2");
    assert_eq!(headers["x-validoc-skipped"], "1");
    assert_eq!(headers["x-validoc-placeholders"], "0");

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let doc = Document::load_mem(&bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 1);
}

#[tokio::test]
async fn test_render_without_pdf_is_bad_request() {
    let template = template_json().to_string();
    let response = app()
        .oneshot(render_request(&[("template", template.as_bytes())]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_render_corrupt_pdf_is_unprocessable() {
    let template = template_json().to_string();
    let response = app()
        .oneshot(render_request(&[
            ("pdf", &b"definitely not a pdf"[..]),
            ("template", template.as_bytes()),
        ]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
