use crate::models::{ObjectPage, ObjectRecord};
use crate::services::storage::StorageService;
use crate::services::transcoder::{TranscodeError, Transcoder};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Record whose `last_modified` is `minutes` after a fixed epoch.
pub fn record(key: &str, size: i64, minutes: i64) -> ObjectRecord {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    ObjectRecord {
        key: key.to_string(),
        size,
        last_modified: base + ChronoDuration::minutes(minutes),
    }
}

#[derive(Debug, Clone)]
pub struct PutCall {
    pub key: String,
    pub path: PathBuf,
    pub size: usize,
    pub content_type: Option<String>,
}

#[derive(Default)]
pub struct MockStorage {
    objects: Mutex<Vec<ObjectRecord>>,
    contents: Mutex<HashMap<String, Bytes>>,
    puts: Mutex<Vec<PutCall>>,
    deletes: Mutex<Vec<String>>,
    page_size: Option<usize>,
    list_delay: Option<Duration>,
    fail_listing_on_page: Mutex<Option<usize>>,
    fail_uploads_with_suffix: Mutex<Option<String>>,
    fail_signing: Mutex<bool>,
    page_requests: AtomicUsize,
    enumerations: AtomicUsize,
}

impl MockStorage {
    pub fn with_objects(objects: Vec<ObjectRecord>) -> Self {
        Self {
            objects: Mutex::new(objects),
            ..Self::default()
        }
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = Some(delay);
        self
    }

    /// Fails the `page`-th (1-based) page request of every enumeration.
    pub fn fail_listing_on_page(&self, page: usize) {
        *self.fail_listing_on_page.lock().unwrap() = Some(page);
    }

    pub fn fail_uploads_with_suffix(&self, suffix: &str) {
        *self.fail_uploads_with_suffix.lock().unwrap() = Some(suffix.to_string());
    }

    pub fn fail_signing(&self) {
        *self.fail_signing.lock().unwrap() = true;
    }

    pub fn puts(&self) -> Vec<PutCall> {
        self.puts.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .map(|o| o.key.clone())
            .collect()
    }

    pub fn page_requests(&self) -> usize {
        self.page_requests.load(Ordering::SeqCst)
    }

    pub fn enumerations(&self) -> usize {
        self.enumerations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageService for MockStorage {
    async fn list_objects_page(&self, continuation_token: Option<String>) -> anyhow::Result<ObjectPage> {
        let start: usize = match &continuation_token {
            Some(token) => token.parse()?,
            None => {
                self.enumerations.fetch_add(1, Ordering::SeqCst);
                0
            }
        };
        self.page_requests.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }

        let page_number = start / self.page_size.unwrap_or(usize::MAX).max(1) + 1;
        if *self.fail_listing_on_page.lock().unwrap() == Some(page_number) {
            anyhow::bail!("listing page {} unavailable", page_number);
        }

        let objects = self.objects.lock().unwrap();
        let end = match self.page_size {
            Some(size) => (start + size).min(objects.len()),
            None => objects.len(),
        };
        let next_continuation_token = (end < objects.len()).then(|| end.to_string());

        Ok(ObjectPage {
            objects: objects[start.min(end)..end].to_vec(),
            next_continuation_token,
        })
    }

    async fn upload_file(&self, key: &str, path: &Path, content_type: Option<&str>) -> anyhow::Result<()> {
        if let Some(suffix) = self.fail_uploads_with_suffix.lock().unwrap().as_deref() {
            if key.ends_with(suffix) {
                anyhow::bail!("simulated put failure for {}", key);
            }
        }

        let data = Bytes::from(tokio::fs::read(path).await?);
        self.puts.lock().unwrap().push(PutCall {
            key: key.to_string(),
            path: path.to_path_buf(),
            size: data.len(),
            content_type: content_type.map(str::to_string),
        });
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
        self.deletes.lock().unwrap().push(key.to_string());
        self.contents.lock().unwrap().remove(key);
        self.objects.lock().unwrap().retain(|o| o.key != key);
        Ok(())
    }

    async fn generate_presigned_url(&self, key: &str, expires_in: Duration) -> anyhow::Result<String> {
        if *self.fail_signing.lock().unwrap() {
            anyhow::bail!("signing unavailable");
        }
        Ok(format!(
            "https://mock-bucket.local/{}?X-Amz-Expires={}",
            key,
            expires_in.as_secs()
        ))
    }

    async fn health_check(&self) -> bool {
        true
    }
}

/// Writes a fixed payload to the output path instead of running ffmpeg.
#[derive(Default)]
pub struct MockTranscoder {
    calls: Mutex<Vec<(PathBuf, PathBuf)>>,
    fail: bool,
}

impl MockTranscoder {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(PathBuf, PathBuf)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
        self.calls
            .lock()
            .unwrap()
            .push((input.to_path_buf(), output.to_path_buf()));

        if self.fail {
            return Err(TranscodeError::Spawn(std::io::Error::other(
                "simulated transcoder crash",
            )));
        }

        tokio::fs::write(output, b"normalized-h264").await?;
        Ok(())
    }
}
