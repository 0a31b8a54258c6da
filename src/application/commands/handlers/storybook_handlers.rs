//! Storybook Command Handlers
//!
//! CreateStorybookHandler 是流水线编排器:
//! 故事 -> 书名 -> 书籍记录 -> 第 1..=10 页 -> 封面，严格顺序执行

use std::sync::Arc;

use crate::application::commands::storybook_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::{JobRegistryPort, ProgressSink, StorybookJob};
use crate::application::services::{
    BookPersistence, StageExecutor, StageFailure, StagePayload, TitleExtractor,
};
use crate::domain::storybook::{
    BookId, ImageData, ImageUrlSet, ProgressData, ProgressStatus, SkippedSlot, SlotOutcome, Stage,
    StoryRequest, StoryText, UserId,
};

/// 图片阶段的累积状态，只属于单次运行
struct IllustrationRun {
    images: ImageUrlSet,
    skipped: Vec<SkippedSlot>,
    /// 第 1 页插图，后续所有页面和封面都以它为风格参考
    page_one: Option<ImageData>,
}

impl IllustrationRun {
    fn new() -> Self {
        Self {
            images: ImageUrlSet::new(),
            skipped: Vec::new(),
            page_one: None,
        }
    }

    fn reference_for(&self, stage: Stage) -> Option<&ImageData> {
        match stage {
            Stage::Page(1) | Stage::Story => None,
            _ => self.page_one.as_ref(),
        }
    }

    fn record(mut self, stage: Stage, outcome: SlotOutcome) -> Self {
        if let Some(slot) = stage.slot() {
            self.images = self.images.with_outcome(slot, &outcome);
            if let SlotOutcome::Skipped(reason) = outcome {
                self.skipped.push(SkippedSlot {
                    slot: slot.column(),
                    reason,
                });
            }
        }
        self
    }
}

fn start_message(stage: Stage) -> String {
    match stage {
        Stage::Story => "Generating story text...".to_string(),
        Stage::Page(page) => format!("Generating page {} illustration...", page),
        Stage::Cover => "Generating cover illustration...".to_string(),
    }
}

fn finish_message(stage: Stage, generated: bool) -> String {
    match (stage, generated) {
        (Stage::Page(page), true) => format!("Page {} illustration generated", page),
        (Stage::Page(page), false) => format!("Failed to generate page {} illustration", page),
        (_, true) => "Cover illustration generated".to_string(),
        (_, false) => "Failed to generate cover illustration".to_string(),
    }
}

fn expect_payload<T>(stage: Stage, payload: Option<T>) -> Result<T, StageFailure> {
    payload.ok_or_else(|| StageFailure::new(stage, "unexpected stage payload"))
}

/// CreateStorybook Handler - 流水线编排器
pub struct CreateStorybookHandler {
    executor: Arc<StageExecutor>,
    title_extractor: Arc<TitleExtractor>,
    persistence: Arc<BookPersistence>,
}

impl CreateStorybookHandler {
    pub fn new(
        executor: Arc<StageExecutor>,
        title_extractor: Arc<TitleExtractor>,
        persistence: Arc<BookPersistence>,
    ) -> Self {
        Self {
            executor,
            title_extractor,
            persistence,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateStorybook,
        progress: &dyn ProgressSink,
    ) -> Result<StorybookResult, ApplicationError> {
        let CreateStorybook { request, user_id } = cmd;

        tracing::info!(
            theme = %request.theme(),
            character = %request.character(),
            user_id = ?user_id,
            "Starting storybook creation"
        );

        // 第 1 阶段：故事正文
        progress.report(ProgressStatus::started(Stage::Story, start_message(Stage::Story)));
        let story = match self
            .executor
            .execute(Stage::Story, &request, None, None)
            .await
            .and_then(|payload| expect_payload(Stage::Story, payload.into_story()))
        {
            Ok(story) => story,
            Err(failure) => {
                tracing::error!(error = %failure.reason, "Failed to generate story text");
                progress.report(ProgressStatus::finished(
                    Stage::Story,
                    format!("Error generating story: {}", failure.reason),
                ));
                return Err(ApplicationError::external(failure.reason));
            }
        };
        progress.report(
            ProgressStatus::finished(Stage::Story, "Story text generated successfully")
                .with_data(ProgressData::text(story.as_str())),
        );

        // 没有用户就无法落库，故事正文直接丢弃
        let Some(user_id) = UserId::parse(user_id.as_deref()) else {
            tracing::error!("Missing user id required for storing the book");
            progress.report(ProgressStatus::finished(
                Stage::Story,
                "Missing user id required for storing the book",
            ));
            return Err(ApplicationError::validation(
                "Missing user id required for storing the book",
            ));
        };

        progress.report(ProgressStatus::started(Stage::Story, "Extracting story title..."));
        let title = self.title_extractor.extract(&story).await;
        progress.report(ProgressStatus::finished(
            Stage::Story,
            format!("Title extracted: \"{}\"", title),
        ));

        let book_id = match self
            .persistence
            .create_book_record(&title, request.theme(), &user_id)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create book record");
                let message = format!("Failed to create book record: {}", e);
                progress.report(ProgressStatus::finished(Stage::Story, message.clone()));
                return Err(ApplicationError::RepositoryError(message));
            }
        };

        let run = self
            .illustrate(&request, &story, &user_id, book_id, progress)
            .await;

        tracing::info!(
            book_id = %book_id,
            stored = run.images.stored_count(),
            skipped = run.skipped.len(),
            "Storybook creation completed"
        );

        Ok(StorybookResult {
            book_id,
            title,
            story,
            images: run.images,
            skipped: run.skipped,
        })
    }

    /// 第 2..=12 阶段，单页失败不中断循环
    async fn illustrate(
        &self,
        request: &StoryRequest,
        story: &StoryText,
        user_id: &UserId,
        book_id: BookId,
        progress: &dyn ProgressSink,
    ) -> IllustrationRun {
        let mut run = IllustrationRun::new();

        for stage in Stage::all().filter(|s| s.is_image_stage()) {
            let Some(slot) = stage.slot() else {
                continue;
            };

            progress.report(ProgressStatus::started(stage, start_message(stage)));
            tracing::info!(book_id = %book_id, stage = %stage, "Generating illustration");

            let generated = self
                .executor
                .execute(stage, request, Some(story), run.reference_for(stage))
                .await
                .and_then(|payload| expect_payload(stage, payload.into_image()));

            let (outcome, succeeded) = match generated {
                Ok(image) => {
                    let outcome = self
                        .persistence
                        .store_slot(&image, user_id, book_id, slot)
                        .await;
                    if stage == Stage::Page(1) {
                        run.page_one = Some(image);
                    }
                    (outcome, true)
                }
                Err(failure) => {
                    tracing::warn!(
                        book_id = %book_id,
                        stage = %stage,
                        error = %failure.reason,
                        "Illustration skipped"
                    );
                    (SlotOutcome::Skipped(failure.reason), false)
                }
            };

            let mut finished = ProgressStatus::finished(stage, finish_message(stage, succeeded));
            if succeeded {
                finished = finished.with_data(ProgressData::page(slot));
            }
            progress.report(finished);

            run = run.record(stage, outcome);
        }

        run
    }
}

/// SubmitStorybook Handler - 登记后台任务
pub struct SubmitStorybookHandler {
    job_registry: Arc<dyn JobRegistryPort>,
}

impl SubmitStorybookHandler {
    pub fn new(job_registry: Arc<dyn JobRegistryPort>) -> Self {
        Self { job_registry }
    }

    pub async fn handle(
        &self,
        cmd: SubmitStorybook,
    ) -> Result<SubmitStorybookResponse, ApplicationError> {
        // 用户 ID 在提交时即校验，避免排队后才失败
        if UserId::parse(cmd.user_id.as_deref()).is_none() {
            return Err(ApplicationError::validation("Missing user id"));
        }

        let request = match cmd.theme.as_deref().map(str::trim) {
            Some(theme) if !theme.is_empty() => StoryRequest::new(theme, cmd.character)?,
            _ => StoryRequest::from_tags(&cmd.tags, cmd.character)?,
        };

        let job = StorybookJob::new(request, cmd.user_id);
        let state = job.state;
        let job_id = self.job_registry.submit(job)?;

        tracing::info!(job_id = %job_id, "Storybook job submitted");

        Ok(SubmitStorybookResponse { job_id, state })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{GenerationError, NoopProgressSink};
    use crate::application::services::StageExecutorConfig;
    use crate::application::testing::{
        FakeBlobStorage, FakeBookRepository, FakeImageGenerator, FakeTextGenerator,
        RecordingSink, DEFAULT_STORY,
    };
    use crate::domain::storybook::{ImageData, Slot, TOTAL_STEPS};

    struct Harness {
        text: Arc<FakeTextGenerator>,
        images: Arc<FakeImageGenerator>,
        repo: Arc<FakeBookRepository>,
        storage: Arc<FakeBlobStorage>,
        handler: CreateStorybookHandler,
    }

    fn harness_with_layout(layout: Option<ImageData>) -> Harness {
        let text = Arc::new(FakeTextGenerator::new());
        let images = Arc::new(FakeImageGenerator::new());
        let repo = Arc::new(FakeBookRepository::new());
        let storage = Arc::new(FakeBlobStorage::new());

        let executor = StageExecutor::new(
            text.clone(),
            images.clone(),
            StageExecutorConfig::default(),
        )
        .with_layout_reference(layout);
        let handler = CreateStorybookHandler::new(
            Arc::new(executor),
            Arc::new(TitleExtractor::new(text.clone())),
            Arc::new(BookPersistence::new(repo.clone(), storage.clone(), "storybooks")),
        );

        Harness {
            text,
            images,
            repo,
            storage,
            handler,
        }
    }

    fn harness() -> Harness {
        harness_with_layout(None)
    }

    fn command(user: Option<&str>) -> CreateStorybook {
        CreateStorybook {
            request: StoryRequest::new("sharing", "a shy turtle").unwrap(),
            user_id: user.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_full_run_fills_every_slot() {
        let h = harness();
        h.text.push_ok(DEFAULT_STORY);
        h.text.push_ok("The Brave Turtle");

        let result = h
            .handler
            .handle(command(Some("user-1")), &NoopProgressSink)
            .await
            .unwrap();

        assert!(result.images.is_complete());
        assert!(result.images.cover().is_some());
        for page in 1..=10 {
            assert!(result.images.page(page).is_some(), "page {}", page);
        }
        assert!(result.skipped.is_empty());
        assert_eq!(result.title.as_str(), "The Brave Turtle");
        assert_eq!(result.story.as_str(), DEFAULT_STORY);

        assert_eq!(h.images.calls().len(), 11);
        assert_eq!(h.storage.uploads().len(), 11);

        let book = h.repo.get(result.book_id).unwrap();
        assert_eq!(book.images, result.images);
        assert_eq!(book.theme, "sharing");
        assert_eq!(book.user_id, "user-1");
    }

    #[tokio::test]
    async fn test_story_failure_creates_no_record() {
        let h = harness();
        h.text
            .push_err(GenerationError::ServiceError("model overloaded".to_string()));
        let sink = RecordingSink::new();

        let err = h
            .handler
            .handle(command(Some("user-1")), &sink)
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::ExternalServiceError(_)));
        assert_eq!(h.repo.insert_count(), 0);
        assert!(h.images.calls().is_empty());

        let last = sink.events().pop().unwrap();
        assert_eq!(last.step, 1);
        assert!(last.completed);
        assert!(last.message.starts_with("Error generating story:"));
        assert!(last.message.contains("model overloaded"));
    }

    #[tokio::test]
    async fn test_record_failure_skips_all_images() {
        let h = harness();
        h.repo.fail_inserts(true);

        let err = h
            .handler
            .handle(command(Some("user-1")), &NoopProgressSink)
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::RepositoryError(_)));
        assert_eq!(h.repo.insert_count(), 1);
        assert!(h.images.calls().is_empty());
        assert!(h.storage.uploads().is_empty());
    }

    #[tokio::test]
    async fn test_missing_user_aborts_after_story() {
        let h = harness();

        for user in [None, Some("   ")] {
            let err = h
                .handler
                .handle(command(user), &NoopProgressSink)
                .await
                .unwrap_err();
            assert!(matches!(err, ApplicationError::ValidationError(_)));
        }

        // 只有故事调用，没有书名调用
        assert_eq!(h.text.calls().len(), 2);
        assert_eq!(h.repo.insert_count(), 0);
        assert!(h.images.calls().is_empty());
    }

    #[tokio::test]
    async fn test_single_page_failure_is_soft_skip() {
        let h = harness();
        // 第 5 页是第 5 次图片调用
        h.images.fail_call(5);

        let result = h
            .handler
            .handle(command(Some("user-1")), &NoopProgressSink)
            .await
            .unwrap();

        assert!(result.images.page(5).is_none());
        for page in (1..=10).filter(|p| *p != 5) {
            assert!(result.images.page(page).is_some(), "page {}", page);
        }
        assert!(result.images.cover().is_some());
        assert_eq!(result.images.missing_slots(), vec![Slot::Page(5)]);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].slot, "image5");

        let page_uploads = h
            .storage
            .uploads()
            .iter()
            .filter(|u| u.path.starts_with("books/page"))
            .count();
        assert_eq!(page_uploads, 9);
    }

    #[tokio::test]
    async fn test_upload_failure_leaves_slot_empty() {
        let h = harness();
        h.storage.fail_path("books/page3-1.png");

        let result = h
            .handler
            .handle(command(Some("user-1")), &NoopProgressSink)
            .await
            .unwrap();

        assert!(result.images.page(3).is_none());
        assert_eq!(result.images.stored_count(), 10);
        assert_eq!(h.repo.get(result.book_id).unwrap().images.page(3), None);
    }

    #[tokio::test]
    async fn test_title_fallback_when_extraction_fails() {
        let h = harness();
        h.text.push_ok("\n  The Lonely Cloud\nIt rained.");
        h.text.push_err(GenerationError::NetworkError("reset".to_string()));

        let result = h
            .handler
            .handle(command(Some("user-1")), &NoopProgressSink)
            .await
            .unwrap();

        assert_eq!(result.title.as_str(), "The Lonely Cloud");
        assert_eq!(h.repo.get(result.book_id).unwrap().title, "The Lonely Cloud");
    }

    #[tokio::test]
    async fn test_progress_covers_every_step_in_order() {
        let h = harness();
        let sink = RecordingSink::new();

        h.handler
            .handle(command(Some("user-1")), &sink)
            .await
            .unwrap();

        let events = sink.events();
        assert!(events.windows(2).all(|w| w[0].step <= w[1].step));
        assert!(events.iter().all(|e| e.total_steps == TOTAL_STEPS));

        for step in 1..=TOTAL_STEPS {
            let started = events
                .iter()
                .position(|e| e.step == step && !e.completed)
                .unwrap_or_else(|| panic!("step {} never started", step));
            let finished = events
                .iter()
                .rposition(|e| e.step == step && e.completed)
                .unwrap_or_else(|| panic!("step {} never finished", step));
            assert!(started < finished, "step {}", step);
        }

        let cover = events.last().unwrap();
        assert_eq!(cover.message, "Cover illustration generated");
        assert_eq!(
            serde_json::to_value(cover).unwrap()["data"]["page"],
            "cover"
        );
    }

    #[tokio::test]
    async fn test_failed_page_progress_has_no_data() {
        let h = harness();
        h.images.fail_call(2);
        let sink = RecordingSink::new();

        h.handler
            .handle(command(Some("user-1")), &sink)
            .await
            .unwrap();

        let finished = sink
            .events()
            .into_iter()
            .find(|e| e.step == 3 && e.completed)
            .unwrap();
        assert_eq!(finished.message, "Failed to generate page 2 illustration");
        assert!(finished.data.is_none());
    }

    #[tokio::test]
    async fn test_every_run_creates_a_new_book() {
        let h = harness();

        let first = h
            .handler
            .handle(command(Some("user-1")), &NoopProgressSink)
            .await
            .unwrap();
        let second = h
            .handler
            .handle(command(Some("user-1")), &NoopProgressSink)
            .await
            .unwrap();

        assert_ne!(first.book_id, second.book_id);
        assert_eq!(h.repo.insert_count(), 2);
    }

    #[tokio::test]
    async fn test_later_stages_reference_page_one() {
        let h = harness();

        h.handler
            .handle(command(Some("user-1")), &NoopProgressSink)
            .await
            .unwrap();

        let calls = h.images.calls();
        let page_one = h.images.outputs()[0].clone();
        assert_eq!(calls.len(), 11);
        assert!(calls[0].references().is_empty());

        // 第 2..=10 页和封面都以第 1 页为参考，而不是上一页
        for (i, call) in calls.iter().enumerate().skip(1) {
            assert_eq!(call.references(), &[page_one.clone()][..], "call {}", i + 1);
        }
    }

    #[tokio::test]
    async fn test_layout_reference_precedes_page_one() {
        let layout = ImageData::new(&b"layout"[..]);
        let h = harness_with_layout(Some(layout.clone()));

        h.handler
            .handle(command(Some("user-1")), &NoopProgressSink)
            .await
            .unwrap();

        let calls = h.images.calls();
        let page_one = h.images.outputs()[0].clone();

        assert_eq!(calls[0].references(), &[layout.clone()][..]);
        for call in &calls[1..10] {
            assert_eq!(call.references(), &[layout.clone(), page_one.clone()][..]);
        }
        assert_eq!(calls[10].references(), &[page_one][..]);
    }

    #[tokio::test]
    async fn test_failed_page_one_falls_back_for_later_pages() {
        let h = harness();
        h.images.fail_call(1);

        let result = h
            .handler
            .handle(command(Some("user-1")), &NoopProgressSink)
            .await
            .unwrap();

        assert!(result.images.page(1).is_none());
        assert!(h.images.calls()[1..].iter().all(|c| c.references().is_empty()));
    }
}
