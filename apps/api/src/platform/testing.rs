//! In-memory stand-ins for every platform capability, with call recording
//! and failure injection for flow and router tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use super::ai::AiResponse;
use super::auth::{check_password, normalize_username, Session};
use super::fs::{blob_path, StoredFile, UploadFile};
use super::kv::KvItem;
use super::{AiService, BlobStore, KvStore, Platform, PlatformError, SessionStore};
use crate::pdf::{preview_file_name, PdfRasterizer};

/// A real one-page PDF (300x100 pt, Helvetica) with the text
/// "Jane Doe ResumeIQ Engineer".
pub const ONE_PAGE_PDF: &[u8] =
    include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/one_page.pdf"));

/// Shared, ordered log of capability calls.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, call: impl Into<String>) {
        self.0.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

fn injected(what: &str) -> PlatformError {
    PlatformError::Storage(format!("injected {what} failure"))
}

#[derive(Default)]
pub struct InMemoryKv {
    entries: Mutex<BTreeMap<String, String>>,
    log: CallLog,
    fail_set: AtomicBool,
    fail_ping: AtomicBool,
}

impl InMemoryKv {
    pub fn with_log(log: CallLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    pub fn fail_set(&self) {
        self.fail_set.store(true, Ordering::SeqCst);
    }

    pub fn fail_ping(&self) {
        self.fail_ping.store(true, Ordering::SeqCst);
    }

    pub fn restore_ping(&self) {
        self.fail_ping.store(false, Ordering::SeqCst);
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }
}

/// Minimal glob: supports a single trailing `*`, which is all the service uses.
fn matches_pattern(pattern: &str, key: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => key == pattern,
    }
}

#[async_trait]
impl KvStore for InMemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, PlatformError> {
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PlatformError> {
        self.log.push(format!("kv.set {key}"));
        if self.fail_set.load(Ordering::SeqCst) {
            return Err(injected("kv.set"));
        }
        self.insert_raw(key, value);
        Ok(())
    }

    async fn list(&self, pattern: &str, with_values: bool) -> Result<Vec<KvItem>, PlatformError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(key, _)| matches_pattern(pattern, key))
            .map(|(key, value)| KvItem {
                key: key.clone(),
                value: with_values.then(|| value.clone()),
            })
            .collect())
    }

    async fn ping(&self) -> Result<(), PlatformError> {
        if self.fail_ping.load(Ordering::SeqCst) {
            return Err(injected("kv.ping"));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryBlobs {
    blobs: Mutex<HashMap<String, Bytes>>,
    log: CallLog,
    fail_upload_of: Mutex<Option<String>>,
}

impl InMemoryBlobs {
    pub fn with_log(log: CallLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    /// Makes uploads fail when the file name ends with `suffix`.
    pub fn fail_upload_of(&self, suffix: &str) {
        *self.fail_upload_of.lock().unwrap() = Some(suffix.to_string());
    }

    pub fn remove(&self, path: &str) {
        self.blobs.lock().unwrap().remove(path);
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobs {
    async fn upload(&self, dir: &str, file: UploadFile) -> Result<StoredFile, PlatformError> {
        self.log.push(format!("fs.upload {}", file.name));
        if let Some(suffix) = self.fail_upload_of.lock().unwrap().as_deref() {
            if file.name.ends_with(suffix) {
                return Err(injected("fs.upload"));
            }
        }
        let path = blob_path(dir, &file.name);
        let size = file.size();
        self.blobs
            .lock()
            .unwrap()
            .insert(path.clone(), file.bytes);
        Ok(StoredFile {
            path,
            name: file.name,
            size,
        })
    }

    async fn read(&self, path: &str) -> Result<Option<Bytes>, PlatformError> {
        Ok(self.blobs.lock().unwrap().get(path).cloned())
    }

    async fn ping(&self) -> Result<(), PlatformError> {
        Ok(())
    }
}

pub struct FakeAi {
    reply: Mutex<Result<AiResponse, String>>,
    log: CallLog,
    last_request: Mutex<Option<(String, String)>>,
}

impl FakeAi {
    pub fn with_log(log: CallLog) -> Self {
        Self {
            reply: Mutex::new(Ok(AiResponse::from_text(""))),
            log,
            last_request: Mutex::new(None),
        }
    }

    pub fn reply_with(&self, response: AiResponse) {
        *self.reply.lock().unwrap() = Ok(response);
    }

    pub fn fail(&self) {
        *self.reply.lock().unwrap() = Err("injected ai failure".to_string());
    }

    /// `(file_path, instructions)` of the most recent call.
    pub fn last_request(&self) -> Option<(String, String)> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl AiService for FakeAi {
    async fn feedback(
        &self,
        file_path: &str,
        instructions: &str,
    ) -> Result<AiResponse, PlatformError> {
        self.log.push("ai.feedback");
        *self.last_request.lock().unwrap() =
            Some((file_path.to_string(), instructions.to_string()));
        self.reply
            .lock()
            .unwrap()
            .clone()
            .map_err(PlatformError::Storage)
    }
}

pub struct FakeRasterizer {
    log: CallLog,
    fail: AtomicBool,
}

impl FakeRasterizer {
    pub fn with_log(log: CallLog) -> Self {
        Self {
            log,
            fail: AtomicBool::new(false),
        }
    }

    pub fn fail(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl PdfRasterizer for FakeRasterizer {
    async fn first_page_png(
        &self,
        file_name: &str,
        _pdf: Bytes,
    ) -> Result<UploadFile, PlatformError> {
        self.log.push("pdf.convert");
        if self.fail.load(Ordering::SeqCst) {
            return Err(PlatformError::Pdf("injected conversion failure".to_string()));
        }
        Ok(UploadFile {
            name: preview_file_name(file_name),
            content_type: "image/png".to_string(),
            bytes: Bytes::from_static(b"\x89PNG\r\n\x1a\nfake"),
        })
    }
}

#[derive(Default)]
pub struct InMemorySessions {
    /// user_id -> (display name, password). The fake keeps passwords in the clear.
    accounts: Mutex<HashMap<String, (String, String)>>,
    sessions: Mutex<HashMap<String, Session>>,
}

impl InMemorySessions {
    fn open(&self, username: &str) -> Result<Session, PlatformError> {
        let session = Session::new(username)?;
        self.sessions
            .lock()
            .unwrap()
            .insert(session.token.clone(), session.clone());
        Ok(session)
    }
}

#[async_trait]
impl SessionStore for InMemorySessions {
    async fn sign_up(&self, username: &str, password: &str) -> Result<Session, PlatformError> {
        let user_id = normalize_username(username)?;
        check_password(password)?;
        {
            let mut accounts = self.accounts.lock().unwrap();
            if accounts.contains_key(&user_id) {
                return Err(PlatformError::UsernameTaken(user_id));
            }
            accounts.insert(
                user_id,
                (username.trim().to_string(), password.to_string()),
            );
        }
        self.open(username)
    }

    async fn sign_in(&self, username: &str, password: &str) -> Result<Session, PlatformError> {
        let user_id = normalize_username(username)?;
        let display = match self.accounts.lock().unwrap().get(&user_id) {
            Some((display, stored)) if stored == password => display.clone(),
            _ => return Err(PlatformError::InvalidCredentials),
        };
        self.open(&display)
    }

    async fn session(&self, token: &str) -> Result<Option<Session>, PlatformError> {
        Ok(self.sessions.lock().unwrap().get(token).cloned())
    }

    async fn sign_out(&self, token: &str) -> Result<(), PlatformError> {
        self.sessions.lock().unwrap().remove(token);
        Ok(())
    }

    async fn ping(&self) -> Result<(), PlatformError> {
        Ok(())
    }
}

/// Every fake wired to one call log.
pub struct FakePlatform {
    pub log: CallLog,
    pub kv: Arc<InMemoryKv>,
    pub fs: Arc<InMemoryBlobs>,
    pub ai: Arc<FakeAi>,
    pub pdf: Arc<FakeRasterizer>,
    pub sessions: Arc<InMemorySessions>,
}

impl FakePlatform {
    pub fn new() -> Self {
        let log = CallLog::default();
        Self {
            kv: Arc::new(InMemoryKv::with_log(log.clone())),
            fs: Arc::new(InMemoryBlobs::with_log(log.clone())),
            ai: Arc::new(FakeAi::with_log(log.clone())),
            pdf: Arc::new(FakeRasterizer::with_log(log.clone())),
            sessions: Arc::new(InMemorySessions::default()),
            log,
        }
    }

    pub fn platform(&self) -> Platform {
        Platform::new(
            self.sessions.clone(),
            self.fs.clone(),
            self.kv.clone(),
            self.ai.clone(),
        )
    }
}
