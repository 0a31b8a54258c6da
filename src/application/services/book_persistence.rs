//! Book Persistence - 书籍记录与图片持久化
//!
//! 记录创建失败是硬失败；上传和写回失败只记录日志，槽位保持为空

use std::sync::Arc;

use crate::application::ports::{
    BlobStoragePort, BookRepositoryPort, NewBook, RepositoryError,
};
use crate::domain::storybook::{BookId, ImageData, Slot, SlotOutcome, Title, UserId};

const IMAGE_CONTENT_TYPE: &str = "image/png";

/// 对象存储中的图片路径
pub fn image_path(slot: Slot, book_id: BookId) -> String {
    format!("books/{}-{}.png", slot.storage_name(), book_id)
}

/// Book Persistence
pub struct BookPersistence {
    book_repo: Arc<dyn BookRepositoryPort>,
    blob_storage: Arc<dyn BlobStoragePort>,
    bucket: String,
}

impl BookPersistence {
    pub fn new(
        book_repo: Arc<dyn BookRepositoryPort>,
        blob_storage: Arc<dyn BlobStoragePort>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            book_repo,
            blob_storage,
            bucket: bucket.into(),
        }
    }

    /// 创建书籍记录（图片槽位为空）
    pub async fn create_book_record(
        &self,
        title: &Title,
        theme: &str,
        user_id: &UserId,
    ) -> Result<BookId, RepositoryError> {
        let book = NewBook {
            title: title.clone(),
            theme: theme.to_string(),
            user_id: user_id.clone(),
        };
        let id = self.book_repo.insert(&book).await?;
        tracing::info!(book_id = %id, title = %title, "Book record created");
        Ok(id)
    }

    /// 上传图片，返回公开 URL；失败时返回 None
    pub async fn upload_image(
        &self,
        image: &ImageData,
        user_id: &UserId,
        book_id: BookId,
        slot: Slot,
    ) -> Option<String> {
        let path = image_path(slot, book_id);
        match self
            .blob_storage
            .upload(&self.bucket, &path, image, IMAGE_CONTENT_TYPE)
            .await
        {
            Ok(()) => {
                let url = self.blob_storage.public_url(&self.bucket, &path);
                tracing::debug!(
                    book_id = %book_id,
                    user_id = %user_id,
                    slot = %slot,
                    bytes = image.len(),
                    url = %url,
                    "Image uploaded"
                );
                Some(url)
            }
            Err(e) => {
                tracing::warn!(
                    book_id = %book_id,
                    slot = %slot,
                    path = %path,
                    error = %e,
                    "Image upload failed"
                );
                None
            }
        }
    }

    /// 写回槽位 URL，返回是否成功
    pub async fn update_book_field(&self, book_id: BookId, slot: Slot, url: &str) -> bool {
        match self.book_repo.update_slot(book_id, slot, url).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    book_id = %book_id,
                    slot = %slot,
                    error = %e,
                    "Book field update failed"
                );
                false
            }
        }
    }

    /// 上传并写回，任一步失败时槽位跳过
    pub async fn store_slot(
        &self,
        image: &ImageData,
        user_id: &UserId,
        book_id: BookId,
        slot: Slot,
    ) -> SlotOutcome {
        let Some(url) = self.upload_image(image, user_id, book_id, slot).await else {
            return SlotOutcome::Skipped("image upload failed".to_string());
        };
        if self.update_book_field(book_id, slot, &url).await {
            SlotOutcome::Stored(url)
        } else {
            SlotOutcome::Skipped("book record update failed".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{FakeBlobStorage, FakeBookRepository};

    fn persistence(
        repo: Arc<FakeBookRepository>,
        storage: Arc<FakeBlobStorage>,
    ) -> BookPersistence {
        BookPersistence::new(repo, storage, "storybooks")
    }

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    #[test]
    fn test_image_path() {
        assert_eq!(image_path(Slot::Page(3), BookId::new(42)), "books/page3-42.png");
        assert_eq!(image_path(Slot::Cover, BookId::new(7)), "books/cover-7.png");
    }

    #[tokio::test]
    async fn test_store_slot_uploads_then_updates() {
        let repo = Arc::new(FakeBookRepository::new());
        let storage = Arc::new(FakeBlobStorage::new());
        let persistence = persistence(repo.clone(), storage.clone());

        let id = persistence
            .create_book_record(&Title::new("T").unwrap(), "kindness", &user())
            .await
            .unwrap();
        let outcome = persistence
            .store_slot(&ImageData::new(vec![1u8, 2]), &user(), id, Slot::Page(2))
            .await;

        let expected = format!("fake://storybooks/books/page2-{}.png", id);
        assert_eq!(outcome, SlotOutcome::Stored(expected.clone()));
        assert_eq!(storage.uploads().len(), 1);
        assert_eq!(storage.uploads()[0].content_type, "image/png");

        let book = repo.get(id).unwrap();
        assert_eq!(book.images.page(2), Some(expected.as_str()));
    }

    #[tokio::test]
    async fn test_upload_failure_skips_update() {
        let repo = Arc::new(FakeBookRepository::new());
        let storage = Arc::new(FakeBlobStorage::new());
        storage.fail_path("books/cover-1.png");
        let persistence = persistence(repo.clone(), storage);

        let id = persistence
            .create_book_record(&Title::new("T").unwrap(), "kindness", &user())
            .await
            .unwrap();
        let outcome = persistence
            .store_slot(&ImageData::new(vec![1u8]), &user(), id, Slot::Cover)
            .await;

        assert!(!outcome.is_stored());
        assert_eq!(repo.update_count(), 0);
    }

    #[tokio::test]
    async fn test_update_failure_leaves_slot_empty() {
        let repo = Arc::new(FakeBookRepository::new());
        repo.fail_updates(true);
        let storage = Arc::new(FakeBlobStorage::new());
        let persistence = persistence(repo.clone(), storage.clone());

        let id = persistence
            .create_book_record(&Title::new("T").unwrap(), "kindness", &user())
            .await
            .unwrap();
        let outcome = persistence
            .store_slot(&ImageData::new(vec![1u8]), &user(), id, Slot::Page(1))
            .await;

        assert_eq!(
            outcome,
            SlotOutcome::Skipped("book record update failed".to_string())
        );
        assert_eq!(storage.uploads().len(), 1);
    }

    #[tokio::test]
    async fn test_create_failure_propagates() {
        let repo = Arc::new(FakeBookRepository::new());
        repo.fail_inserts(true);
        let persistence = persistence(repo, Arc::new(FakeBlobStorage::new()));

        let result = persistence
            .create_book_record(&Title::new("T").unwrap(), "kindness", &user())
            .await;
        assert!(result.is_err());
    }
}
