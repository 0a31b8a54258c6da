//! 测试用的脚本化端口实现

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::application::ports::{
    BlobStorageError, BlobStoragePort, BookRecord, BookRepositoryPort, CompletionRequest,
    GenerationError, ImageGeneratorPort, ImageRequest, NewBook, ProgressSink, RepositoryError,
    TextGeneratorPort,
};
use crate::domain::storybook::{BookId, ImageData, ImageUrlSet, ProgressStatus, Slot, UserId};

pub const DEFAULT_STORY: &str = "The Brave Turtle\n\nOnce upon a time, a turtle lived by the sea.";

// ============================================================================
// Text generator
// ============================================================================

pub struct FakeTextGenerator {
    responses: Mutex<VecDeque<Result<String, GenerationError>>>,
    calls: Mutex<Vec<CompletionRequest>>,
    delay: Option<Duration>,
}

impl FakeTextGenerator {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_ok(&self, text: &str) {
        self.responses.lock().unwrap().push_back(Ok(text.to_string()));
    }

    pub fn push_err(&self, err: GenerationError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGeneratorPort for FakeTextGenerator {
    async fn complete(&self, request: CompletionRequest) -> Result<String, GenerationError> {
        self.calls.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self.responses.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(DEFAULT_STORY.to_string()))
    }
}

// ============================================================================
// Image generator
// ============================================================================

#[derive(Debug, Clone)]
pub enum ImageCall {
    Generate { request: ImageRequest },
    Edit { references: Vec<ImageData>, request: ImageRequest },
}

impl ImageCall {
    pub fn references(&self) -> &[ImageData] {
        match self {
            ImageCall::Generate { .. } => &[],
            ImageCall::Edit { references, .. } => references,
        }
    }

    pub fn request(&self) -> &ImageRequest {
        match self {
            ImageCall::Generate { request } | ImageCall::Edit { request, .. } => request,
        }
    }
}

/// 默认每次调用返回内容不同的图片（`image-{n}`，n 从 1 开始）
pub struct FakeImageGenerator {
    responses: Mutex<VecDeque<Result<ImageData, GenerationError>>>,
    failing_calls: Mutex<HashSet<usize>>,
    calls: Mutex<Vec<ImageCall>>,
    outputs: Mutex<Vec<ImageData>>,
}

impl FakeImageGenerator {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            failing_calls: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            outputs: Mutex::new(Vec::new()),
        }
    }

    pub fn push_ok(&self, image: ImageData) {
        self.responses.lock().unwrap().push_back(Ok(image));
    }

    /// 第 n 次调用（从 1 开始）失败
    pub fn fail_call(&self, n: usize) {
        self.failing_calls.lock().unwrap().insert(n);
    }

    pub fn calls(&self) -> Vec<ImageCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn outputs(&self) -> Vec<ImageData> {
        self.outputs.lock().unwrap().clone()
    }

    fn respond(&self, call: ImageCall) -> Result<ImageData, GenerationError> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(call);
            calls.len()
        };
        if self.failing_calls.lock().unwrap().contains(&n) {
            return Err(GenerationError::ServiceError(format!("call {} failed", n)));
        }
        let scripted = self.responses.lock().unwrap().pop_front();
        let image = scripted.unwrap_or_else(|| Ok(ImageData::new(format!("image-{}", n))))?;
        self.outputs.lock().unwrap().push(image.clone());
        Ok(image)
    }
}

#[async_trait]
impl ImageGeneratorPort for FakeImageGenerator {
    async fn generate(&self, request: ImageRequest) -> Result<ImageData, GenerationError> {
        self.respond(ImageCall::Generate { request })
    }

    async fn edit(
        &self,
        references: Vec<ImageData>,
        request: ImageRequest,
    ) -> Result<ImageData, GenerationError> {
        self.respond(ImageCall::Edit { references, request })
    }
}

// ============================================================================
// Book repository
// ============================================================================

pub struct FakeBookRepository {
    books: Mutex<BTreeMap<i64, BookRecord>>,
    next_id: AtomicI64,
    inserts: AtomicUsize,
    updates: AtomicUsize,
    fail_inserts: AtomicBool,
    fail_updates: AtomicBool,
}

impl FakeBookRepository {
    pub fn new() -> Self {
        Self {
            books: Mutex::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            inserts: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
            fail_inserts: AtomicBool::new(false),
            fail_updates: AtomicBool::new(false),
        }
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// 插入调用次数（包括失败的）
    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    /// 成功的写回次数
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn get(&self, id: BookId) -> Option<BookRecord> {
        self.books.lock().unwrap().get(&id.value()).cloned()
    }

    fn newest_first(mut books: Vec<BookRecord>) -> Vec<BookRecord> {
        books.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        books
    }
}

#[async_trait]
impl BookRepositoryPort for FakeBookRepository {
    async fn insert(&self, book: &NewBook) -> Result<BookId, RepositoryError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(RepositoryError::DatabaseError("insert rejected".to_string()));
        }
        let id = BookId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let record = BookRecord {
            id,
            title: book.title.as_str().to_string(),
            theme: book.theme.clone(),
            user_id: book.user_id.as_str().to_string(),
            images: ImageUrlSet::new(),
            created_at: Utc::now(),
        };
        self.books.lock().unwrap().insert(id.value(), record);
        Ok(id)
    }

    async fn update_slot(&self, id: BookId, slot: Slot, url: &str) -> Result<(), RepositoryError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(RepositoryError::DatabaseError("update rejected".to_string()));
        }
        let mut books = self.books.lock().unwrap();
        let book = books
            .get_mut(&id.value())
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        book.images.set(slot, Some(url.to_string()));
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn find_by_id(&self, id: BookId) -> Result<Option<BookRecord>, RepositoryError> {
        Ok(self.get(id))
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<BookRecord>, RepositoryError> {
        let books = self
            .books
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.user_id == user_id.as_str())
            .cloned()
            .collect();
        Ok(Self::newest_first(books))
    }

    async fn find_all(&self) -> Result<Vec<BookRecord>, RepositoryError> {
        let books = self.books.lock().unwrap().values().cloned().collect();
        Ok(Self::newest_first(books))
    }
}

// ============================================================================
// Blob storage
// ============================================================================

#[derive(Debug, Clone)]
pub struct UploadRecord {
    pub bucket: String,
    pub path: String,
    pub content_type: String,
    pub data: ImageData,
}

pub struct FakeBlobStorage {
    uploads: Mutex<Vec<UploadRecord>>,
    failing_paths: Mutex<HashSet<String>>,
}

impl FakeBlobStorage {
    pub fn new() -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            failing_paths: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail_path(&self, path: &str) {
        self.failing_paths.lock().unwrap().insert(path.to_string());
    }

    /// 成功的上传
    pub fn uploads(&self) -> Vec<UploadRecord> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlobStoragePort for FakeBlobStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: &ImageData,
        content_type: &str,
    ) -> Result<(), BlobStorageError> {
        if self.failing_paths.lock().unwrap().contains(path) {
            return Err(BlobStorageError::Rejected(path.to_string()));
        }
        self.uploads.lock().unwrap().push(UploadRecord {
            bucket: bucket.to_string(),
            path: path.to_string(),
            content_type: content_type.to_string(),
            data: data.clone(),
        });
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("fake://{}/{}", bucket, path)
    }
}

// ============================================================================
// Progress
// ============================================================================

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProgressStatus>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressStatus> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingSink {
    fn report(&self, status: ProgressStatus) {
        self.events.lock().unwrap().push(status);
    }
}
