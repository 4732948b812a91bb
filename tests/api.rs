use std::fs;
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{DynamicImage, RgbImage};
use imembed::model::ModelHandler;
use imembed::server::{AppState, create_app};
use imembed::{EmbeddingCache, phash};
use serde_json::{Value, json};
use tower::ServiceExt;

struct MockModel {
    calls: AtomicUsize,
    blob: Vec<u8>,
}

impl MockModel {
    fn new(blob: &[u8]) -> Arc<Self> {
        Arc::new(Self { calls: AtomicUsize::new(0), blob: blob.to_vec() })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ModelHandler for MockModel {
    fn handle(&self, _image: &DynamicImage) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.blob.clone())
    }
}

fn test_image() -> (DynamicImage, String) {
    let img = RgbImage::from_fn(64, 48, |x, y| image::Rgb([(x * 3) as u8, (y * 5) as u8, 77]));
    let img = DynamicImage::ImageRgb8(img);
    let mut buf = Cursor::new(vec![]);
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    (img, BASE64.encode(buf.into_inner()))
}

async fn post_embed(app: Router, image_b64: &str) -> (StatusCode, Option<Vec<u8>>) {
    let request = Request::builder()
        .method("POST")
        .uri("/embed")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "image": image_b64 }).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    if !status.is_success() {
        return (status, None);
    }
    let value: Value = serde_json::from_slice(&body).unwrap();
    let blob = BASE64.decode(value["blob"].as_str().unwrap()).unwrap();
    (status, Some(blob))
}

#[tokio::test(flavor = "multi_thread")]
async fn cache_hit_skips_model() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (img, b64) = test_image();

    let hex = phash::to_hex(phash::p_hash(&img));
    fs::write(dir.path().join(format!("{hex}_cafe0000")), b"cached-features")?;

    let model = MockModel::new(b"model-features");
    let app = create_app(AppState::new(model.clone(), EmbeddingCache::new(dir.path()), false));

    let (status, blob) = post_embed(app, &b64).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(blob.unwrap(), b"cached-features");
    assert_eq!(model.calls(), 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn cache_miss_invokes_model() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (_, b64) = test_image();

    let model = MockModel::new(b"model-features");
    let app = create_app(AppState::new(model.clone(), EmbeddingCache::new(dir.path()), false));

    let (status, blob) = post_embed(app, &b64).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(blob.unwrap(), b"model-features");
    assert_eq!(model.calls(), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn hash_collision_invokes_model() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (img, b64) = test_image();

    let hex = phash::to_hex(phash::p_hash(&img));
    fs::write(dir.path().join(format!("{hex}_aaaaaaaa")), b"one")?;
    fs::write(dir.path().join(format!("{hex}_bbbbbbbb")), b"two")?;

    let model = MockModel::new(b"model-features");
    let app = create_app(AppState::new(model.clone(), EmbeddingCache::new(dir.path()), false));

    let (status, blob) = post_embed(app, &b64).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(blob.unwrap(), b"model-features");
    assert_eq!(model.calls(), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn write_back_makes_next_request_a_hit() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (_, b64) = test_image();

    let model = MockModel::new(b"model-features");
    let state = AppState::new(model.clone(), EmbeddingCache::new(dir.path()), true);

    let (_, first) = post_embed(create_app(state.clone()), &b64).await;
    assert_eq!(first.unwrap(), b"model-features");
    assert_eq!(model.calls(), 1);

    let (_, second) = post_embed(create_app(state), &b64).await;
    assert_eq!(second.unwrap(), b"model-features");
    assert_eq!(model.calls(), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_base64_is_bad_request() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let model = MockModel::new(b"model-features");
    let app = create_app(AppState::new(model.clone(), EmbeddingCache::new(dir.path()), false));

    let (status, _) = post_embed(app, "this is not base64 !!!").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(model.calls(), 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn undecodable_image_is_bad_request() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let model = MockModel::new(b"model-features");
    let app = create_app(AppState::new(model.clone(), EmbeddingCache::new(dir.path()), false));

    let (status, _) = post_embed(app, &BASE64.encode(b"definitely not an image")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(model.calls(), 0);
    Ok(())
}
