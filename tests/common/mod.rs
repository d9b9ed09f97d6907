#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, header};
use base64::{Engine, engine::general_purpose::STANDARD};
use bytes::Bytes;
use chrono::Utc;
use media_gallery::config::GalleryConfig;
use media_gallery::models::{ObjectPage, ObjectRecord};
use media_gallery::services::storage::StorageService;
use media_gallery::services::transcoder::{TranscodeError, Transcoder};
use media_gallery::{AppState, create_app};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

pub const PASSWORD: &str = "hunter2";

pub const JPEG: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01, 0x01, 0x00, 0x00, 0x01,
    0x00, 0x01, 0x00, 0x00,
];

pub const QUICKTIME: &[u8] = &[
    0x00, 0x00, 0x00, 0x08, 0x6D, 0x6F, 0x6F, 0x76, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00,
];

/// In-memory bucket returning everything in a single page.
#[derive(Default)]
pub struct MemoryStorage {
    pub objects: Mutex<Vec<ObjectRecord>>,
    pub contents: Mutex<HashMap<String, Bytes>>,
    pub puts: Mutex<Vec<(String, Option<String>)>>,
}

impl MemoryStorage {
    pub fn with_objects(objects: Vec<ObjectRecord>) -> Self {
        Self {
            objects: Mutex::new(objects),
            ..Self::default()
        }
    }
}

#[async_trait]
impl StorageService for MemoryStorage {
    async fn list_objects_page(&self, _token: Option<String>) -> anyhow::Result<ObjectPage> {
        Ok(ObjectPage {
            objects: self.objects.lock().unwrap().clone(),
            next_continuation_token: None,
        })
    }

    async fn upload_file(&self, key: &str, path: &Path, content_type: Option<&str>) -> anyhow::Result<()> {
        let data = Bytes::from(tokio::fs::read(path).await?);
        self.puts
            .lock()
            .unwrap()
            .push((key.to_string(), content_type.map(str::to_string)));
        self.objects.lock().unwrap().push(ObjectRecord {
            key: key.to_string(),
            size: data.len() as i64,
            last_modified: Utc::now(),
        });
        self.contents.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn get_file(&self, key: &str) -> anyhow::Result<Bytes> {
        self.contents
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Key not found"))
    }

    async fn delete_file(&self, key: &str) -> anyhow::Result<()> {
        self.contents.lock().unwrap().remove(key);
        self.objects.lock().unwrap().retain(|o| o.key != key);
        Ok(())
    }

    async fn generate_presigned_url(&self, key: &str, expires_in: Duration) -> anyhow::Result<String> {
        Ok(format!(
            "/obj/mock-bucket/{}?X-Amz-Expires={}",
            key,
            expires_in.as_secs()
        ))
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[derive(Default)]
pub struct CountingTranscoder {
    pub calls: AtomicUsize,
}

impl CountingTranscoder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcoder for CountingTranscoder {
    async fn transcode(&self, _input: &Path, output: &Path) -> Result<(), TranscodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::fs::write(output, b"normalized-h264").await?;
        Ok(())
    }
}

pub struct TestApp {
    pub router: axum::Router,
    pub storage: Arc<MemoryStorage>,
    pub transcoder: Arc<CountingTranscoder>,
    pub staging: TempDir,
}

pub fn test_config(staging: &Path) -> GalleryConfig {
    GalleryConfig {
        auth_password: Some(PASSWORD.to_string()),
        staging_dir: staging.to_path_buf(),
        ..GalleryConfig::default()
    }
}

pub fn spawn_app(storage: MemoryStorage, tweak: impl FnOnce(&mut GalleryConfig)) -> TestApp {
    let staging = tempfile::tempdir().unwrap();
    let mut config = test_config(staging.path());
    tweak(&mut config);

    let storage = Arc::new(storage);
    let transcoder = Arc::new(CountingTranscoder::default());
    let state = AppState::new(config, storage.clone(), transcoder.clone());

    TestApp {
        router: create_app(state),
        storage,
        transcoder,
        staging,
    }
}

pub fn auth_header() -> String {
    format!("Basic {}", STANDARD.encode(format!("user:{}", PASSWORD)))
}

pub const BOUNDARY: &str = "----gallery-test-boundary";

/// Builds a multipart body with one part per `(field, file_name, content_type, data)`.
pub fn multipart_body(parts: &[(&str, &str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (field, file_name, content_type, data) in parts {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Multipart body whose single `field` part is a plain form value, not a file.
pub fn text_field_request(field: &str, value: &str) -> Request<Body> {
    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"\r\n\r\n{value}\r\n--{BOUNDARY}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::AUTHORIZATION, auth_header())
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn upload_request(parts: &[(&str, &str, &str, &[u8])]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::AUTHORIZATION, auth_header())
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

pub fn gallery_request(query: &str) -> Request<Body> {
    Request::builder()
        .uri(format!("/gallery{}", query))
        .header(header::AUTHORIZATION, auth_header())
        .body(Body::empty())
        .unwrap()
}
