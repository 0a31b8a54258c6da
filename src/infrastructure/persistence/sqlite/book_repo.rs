//! SQLite Book Repository

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::FromRow;

use super::DbPool;
use crate::application::ports::{BookRecord, BookRepositoryPort, NewBook, RepositoryError};
use crate::domain::storybook::{BookId, ImageUrlSet, Slot, UserId, PAGE_COUNT};

const BOOK_COLUMNS: &str = "id, title, theme, user_id, cover, image1, image2, image3, image4, \
image5, image6, image7, image8, image9, image10, created_at";

/// SQLite Book Repository
pub struct SqliteBookRepository {
    pool: DbPool,
}

impl SqliteBookRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct BookRow {
    id: i64,
    title: String,
    theme: String,
    user_id: String,
    cover: Option<String>,
    image1: Option<String>,
    image2: Option<String>,
    image3: Option<String>,
    image4: Option<String>,
    image5: Option<String>,
    image6: Option<String>,
    image7: Option<String>,
    image8: Option<String>,
    image9: Option<String>,
    image10: Option<String>,
    created_at: String,
}

impl TryFrom<BookRow> for BookRecord {
    type Error = RepositoryError;

    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        let mut images = ImageUrlSet::new();
        images.set(Slot::Cover, row.cover);
        let pages = [
            row.image1, row.image2, row.image3, row.image4, row.image5, row.image6, row.image7,
            row.image8, row.image9, row.image10,
        ];
        for (page, url) in (1..=PAGE_COUNT).zip(pages) {
            images.set(Slot::Page(page), url);
        }

        Ok(BookRecord {
            id: BookId::new(row.id),
            title: row.title,
            theme: row.theme,
            user_id: row.user_id,
            images,
            created_at: DateTime::parse_from_rfc3339(&row.created_at)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?
                .with_timezone(&Utc),
        })
    }
}

/// 槽位对应的列名，只允许固定的 11 列
fn slot_column(slot: Slot) -> Result<String, RepositoryError> {
    match slot {
        Slot::Page(page) if !(1..=PAGE_COUNT).contains(&page) => Err(
            RepositoryError::SerializationError(format!("Invalid page slot: {}", page)),
        ),
        _ => Ok(slot.column()),
    }
}

#[async_trait]
impl BookRepositoryPort for SqliteBookRepository {
    async fn insert(&self, book: &NewBook) -> Result<BookId, RepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO books (title, theme, user_id, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(book.title.as_str())
        .bind(&book.theme)
        .bind(book.user_id.as_str())
        // 固定精度，保证按文本排序即按时间排序
        .bind(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(BookId::new(result.last_insert_rowid()))
    }

    async fn update_slot(&self, id: BookId, slot: Slot, url: &str) -> Result<(), RepositoryError> {
        let column = slot_column(slot)?;
        let sql = format!("UPDATE books SET {} = ? WHERE id = ?", column);

        let result = sqlx::query(&sql)
            .bind(url)
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("Book {}", id)));
        }

        Ok(())
    }

    async fn find_by_id(&self, id: BookId) -> Result<Option<BookRecord>, RepositoryError> {
        let sql = format!("SELECT {} FROM books WHERE id = ?", BOOK_COLUMNS);
        let row: Option<BookRow> = sqlx::query_as(&sql)
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        row.map(BookRecord::try_from).transpose()
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<BookRecord>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM books WHERE user_id = ? ORDER BY created_at DESC, id DESC",
            BOOK_COLUMNS
        );
        let rows: Vec<BookRow> = sqlx::query_as(&sql)
            .bind(user_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(BookRecord::try_from).collect()
    }

    async fn find_all(&self) -> Result<Vec<BookRecord>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM books ORDER BY created_at DESC, id DESC",
            BOOK_COLUMNS
        );
        let rows: Vec<BookRow> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(BookRecord::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::storybook::Title;
    use crate::infrastructure::persistence::sqlite::{create_pool, run_migrations, DatabaseConfig};

    async fn setup() -> SqliteBookRepository {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteBookRepository::new(pool)
    }

    fn new_book(title: &str, user: &str) -> NewBook {
        NewBook {
            title: Title::new(title).unwrap(),
            theme: "friendship".to_string(),
            user_id: UserId::new(user).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let repo = setup().await;

        let id = repo.insert(&new_book("The Brave Turtle", "u1")).await.unwrap();
        let book = repo.find_by_id(id).await.unwrap().unwrap();

        assert_eq!(book.id, id);
        assert_eq!(book.title, "The Brave Turtle");
        assert_eq!(book.user_id, "u1");
        assert_eq!(book.images.stored_count(), 0);

        assert!(repo.find_by_id(BookId::new(9999)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ids_are_distinct() {
        let repo = setup().await;
        let a = repo.insert(&new_book("Same", "u1")).await.unwrap();
        let b = repo.insert(&new_book("Same", "u1")).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_update_slot() {
        let repo = setup().await;
        let id = repo.insert(&new_book("Moon", "u1")).await.unwrap();

        repo.update_slot(id, Slot::Page(7), "http://x/page7.png")
            .await
            .unwrap();
        repo.update_slot(id, Slot::Cover, "http://x/cover.png")
            .await
            .unwrap();

        let book = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(book.images.page(7), Some("http://x/page7.png"));
        assert_eq!(book.images.cover(), Some("http://x/cover.png"));
        assert_eq!(book.images.page(6), None);
    }

    #[tokio::test]
    async fn test_update_slot_errors() {
        let repo = setup().await;
        let id = repo.insert(&new_book("Moon", "u1")).await.unwrap();

        let missing = repo
            .update_slot(BookId::new(id.value() + 100), Slot::Cover, "u")
            .await;
        assert!(matches!(missing, Err(RepositoryError::NotFound(_))));

        let invalid = repo.update_slot(id, Slot::Page(11), "u").await;
        assert!(invalid.is_err());
    }

    #[tokio::test]
    async fn test_find_by_user_newest_first() {
        let repo = setup().await;
        repo.insert(&new_book("First", "u1")).await.unwrap();
        repo.insert(&new_book("Theirs", "u2")).await.unwrap();
        repo.insert(&new_book("Second", "u1")).await.unwrap();

        let mine = repo.find_by_user(&UserId::new("u1").unwrap()).await.unwrap();
        let titles: Vec<_> = mine.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Second", "First"]);

        let all = repo.find_all().await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].title, "Second");
    }
}
