use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::FeatureConfig;
use crate::dataset::Dataset;
use crate::errors::StudyError;
use crate::models::{BookmarkSet, QuestionItem, StatisticsRecord, StudyMode};
use crate::persistence::PersistenceStore;
use crate::queue_builder;
use crate::statistics::{self, FailedQuestion, StatsSummary};
use crate::transfer::{self, ExportDocument, ImportPayload};
use crate::{log_performance, log_session_start, log_session_success, log_session_warn};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Signals for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    QueueRebuilt { queue_len: usize, cursor: usize },
    /// Emitted after every navigation, the view scrolls back to the top on it
    Navigated {
        direction: Direction,
        cursor: usize,
        queue_len: usize,
        removed: Option<String>,
    },
    AnswerRecorded { question_id: String, correct: bool },
    BookmarkToggled { question_id: String, bookmarked: bool },
    DataImported,
}

/// Lifecycle of the one-time dataset fetch
#[derive(Debug, Clone)]
pub enum DatasetState {
    Loading,
    Ready(Arc<Dataset>),
    /// Terminal until the application restarts
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub question_id: String,
    pub correct: bool,
    pub correct_choice_index: usize,
    /// Set when the question leaves the failed queue on the next navigation
    pub pending_removal: bool,
}

/// Owns the live queue, cursor and the records it mutates.
///
/// All operations are serialized through `&mut self`. A rebuild computes the
/// complete queue and cursor before either is published.
pub struct StudySession {
    session_id: Uuid,
    features: FeatureConfig,
    persistence: PersistenceStore,
    dataset: DatasetState,
    mode: StudyMode,
    stats: StatisticsRecord,
    bookmarks: BookmarkSet,
    queue: Vec<QuestionItem>,
    cursor: usize,
    pending_removal: HashSet<String>,
    events: broadcast::Sender<SessionEvent>,
}

impl StudySession {
    /// Restore persisted records and start waiting for the dataset
    pub async fn open(persistence: PersistenceStore, features: FeatureConfig) -> Self {
        let session_id = Uuid::new_v4();
        log_session_start!("open", session_id = session_id);

        let stats = persistence.load_statistics().await;
        let bookmarks = persistence.load_bookmarks().await;
        let mut mode = persistence.load_mode().await.unwrap_or_default();
        if mode.requires_premium() && !features.premium_enabled {
            log_session_warn!(
                "open",
                session_id = session_id,
                format!("stored mode {} needs premium, using all questions", mode)
            );
            mode = StudyMode::AllQuestions {
                order: mode.order(),
            };
        }

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        log_session_success!("open", session_id = session_id, format!("restored mode {}", mode));

        Self {
            session_id,
            features,
            persistence,
            dataset: DatasetState::Loading,
            mode,
            stats,
            bookmarks,
            queue: Vec::new(),
            cursor: 0,
            pending_removal: HashSet::new(),
            events,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn features(&self) -> FeatureConfig {
        self.features
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn dataset_state(&self) -> &DatasetState {
        &self.dataset
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        match &self.dataset {
            DatasetState::Ready(dataset) => Some(dataset.as_ref()),
            _ => None,
        }
    }

    pub fn mode(&self) -> StudyMode {
        self.mode
    }

    pub fn statistics(&self) -> &StatisticsRecord {
        &self.stats
    }

    pub fn bookmarks(&self) -> &BookmarkSet {
        &self.bookmarks
    }

    pub fn is_bookmarked(&self, id: &str) -> bool {
        self.bookmarks.contains(id)
    }

    pub fn is_pending_removal(&self, id: &str) -> bool {
        self.pending_removal.contains(id)
    }

    pub fn queue(&self) -> &[QuestionItem] {
        &self.queue
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&QuestionItem> {
        self.queue.get(self.cursor)
    }

    /// 1-based position and queue length, for "3 / 25" style display
    pub fn position(&self) -> Option<(usize, usize)> {
        self.current().map(|_| (self.cursor + 1, self.queue.len()))
    }

    /// Hand over the result of the dataset fetch. Only the first result counts.
    pub async fn attach_dataset(&mut self, result: Result<Dataset, StudyError>) {
        if !matches!(self.dataset, DatasetState::Loading) {
            log_session_warn!(
                "attach_dataset",
                session_id = self.session_id,
                "dataset already settled, ignoring"
            );
            return;
        }

        match result {
            Ok(dataset) => {
                self.dataset = DatasetState::Ready(Arc::new(dataset));
                self.rebuild(None).await;
            }
            Err(e) => {
                self.dataset = DatasetState::Failed(e.to_user_message());
            }
        }
    }

    /// Switch study mode. Setting the current mode again changes nothing.
    pub async fn set_mode(&mut self, mode: StudyMode) -> Result<(), StudyError> {
        if mode.requires_premium() && !self.features.premium_enabled {
            return Err(StudyError::FeatureDisabled("failed and bookmarked review"));
        }
        if mode == self.mode {
            return Ok(());
        }

        self.mode = mode;
        self.persistence.save_mode(&self.mode).await;
        self.rebuild(None).await;

        log_session_success!("set_mode", session_id = self.session_id, format!("mode changed to {}", mode));
        Ok(())
    }

    /// Rebuild the current mode starting from a 1-based position
    pub async fn restart_at(&mut self, position: usize) {
        self.rebuild(Some(position)).await;
    }

    /// Move straight to a 1-based position in a sequential queue.
    ///
    /// Returns the new cursor, or `None` when the queue is empty or random.
    pub async fn jump_to(&mut self, position: usize) -> Option<usize> {
        if !self.mode.is_sequential() || self.queue.is_empty() {
            return None;
        }

        self.cursor = position.saturating_sub(1).min(self.queue.len() - 1);
        self.persist_resume_cursor().await;
        Some(self.cursor)
    }

    pub async fn navigate_forward(&mut self) -> Option<usize> {
        self.navigate(Direction::Forward).await
    }

    pub async fn navigate_backward(&mut self) -> Option<usize> {
        self.navigate(Direction::Backward).await
    }

    /// Move the cursor one step, wrapping at both ends.
    ///
    /// A current question waiting for removal is dropped from the queue and
    /// from the failure counts first. Returns `None` on an empty queue.
    pub async fn navigate(&mut self, direction: Direction) -> Option<usize> {
        let current_id = self.current()?.id.clone();
        log_session_start!("navigate", session_id = self.session_id, question_id = current_id);

        let mut removed = None;
        if self.mode.is_failed_only() && self.pending_removal.remove(&current_id) {
            self.stats.clear_failures(&current_id);
            self.persistence.save_statistics(&mut self.stats).await;

            let cursor_before = self.cursor;
            self.queue.retain(|item| item.id != current_id);
            let len = self.queue.len();

            self.cursor = if len == 0 {
                0
            } else {
                match direction {
                    Direction::Forward => cursor_before.min(len - 1),
                    Direction::Backward => (cursor_before + len - 1) % len,
                }
            };
            removed = Some(current_id);
        } else {
            let len = self.queue.len().max(1);
            self.cursor = match direction {
                Direction::Forward => (self.cursor + 1) % len,
                Direction::Backward => (self.cursor + len - 1) % len,
            };
        }

        self.persist_resume_cursor().await;
        self.emit(SessionEvent::Navigated {
            direction,
            cursor: self.cursor,
            queue_len: self.queue.len(),
            removed,
        });

        Some(self.cursor)
    }

    /// Record an answer for the current question.
    ///
    /// A correct answer in failed mode only marks the question; it leaves
    /// the queue on the next navigation.
    pub async fn record_answer(&mut self, was_correct: bool) -> Option<AnswerOutcome> {
        let item = self.current()?.clone();
        log_session_start!("record_answer", session_id = self.session_id, question_id = item.id);

        self.stats.record_answer(&item, was_correct);
        self.persistence.save_statistics(&mut self.stats).await;

        let pending_removal = was_correct && self.mode.is_failed_only();
        if pending_removal {
            self.pending_removal.insert(item.id.clone());
        }

        self.emit(SessionEvent::AnswerRecorded {
            question_id: item.id.clone(),
            correct: was_correct,
        });
        log_session_success!(
            "record_answer",
            session_id = self.session_id,
            question_id = item.id,
            if was_correct { "correct" } else { "wrong" }
        );

        Some(AnswerOutcome {
            question_id: item.id,
            correct: was_correct,
            correct_choice_index: item.correct_choice_index,
            pending_removal,
        })
    }

    /// Grade `choice_index` against the current question and record it
    pub async fn answer(&mut self, choice_index: usize) -> Result<Option<AnswerOutcome>, StudyError> {
        let Some(item) = self.current() else {
            return Ok(None);
        };
        if choice_index >= item.answer_choices.len() {
            return Err(StudyError::InvalidChoice {
                question_id: item.id.clone(),
                choice: choice_index,
            });
        }

        let correct = item.is_correct_choice(choice_index);
        Ok(self.record_answer(correct).await)
    }

    /// Flip the bookmark on `id`. The live queue is left alone even in
    /// bookmarked mode; membership changes show up on the next rebuild.
    pub async fn toggle_bookmark(&mut self, id: &str) -> Result<bool, StudyError> {
        if !self.features.premium_enabled {
            return Err(StudyError::FeatureDisabled("bookmarks"));
        }

        let bookmarked = self.bookmarks.toggle(id);
        self.persistence.save_bookmarks(&self.bookmarks).await;
        self.emit(SessionEvent::BookmarkToggled {
            question_id: id.to_string(),
            bookmarked,
        });
        Ok(bookmarked)
    }

    pub async fn toggle_current_bookmark(&mut self) -> Result<Option<bool>, StudyError> {
        let Some(id) = self.current().map(|item| item.id.clone()) else {
            return Ok(None);
        };
        self.toggle_bookmark(&id).await.map(Some)
    }

    pub fn most_failed(&self, top_n: usize) -> Vec<FailedQuestion<'_>> {
        match self.dataset() {
            Some(dataset) => statistics::rank_most_failed(&self.stats, dataset.items(), top_n),
            None => Vec::new(),
        }
    }

    pub fn summary(&self) -> StatsSummary<'_> {
        let items = self.dataset().map(Dataset::items).unwrap_or_default();
        statistics::summarize(&self.stats, items)
    }

    pub fn export_document(&self) -> Result<ExportDocument, StudyError> {
        if !self.features.premium_enabled {
            return Err(StudyError::FeatureDisabled("export"));
        }
        Ok(ExportDocument::new(&self.stats, &self.bookmarks, self.mode))
    }

    pub async fn export_to(&self, directory: &Path) -> Result<PathBuf, StudyError> {
        let document = self.export_document()?;
        transfer::write_export(&document, directory).await
    }

    /// Validate then apply an exported document; a rejection changes nothing
    pub async fn import_json(&mut self, text: &str) -> Result<(), StudyError> {
        if !self.features.premium_enabled {
            return Err(StudyError::FeatureDisabled("import"));
        }
        let payload = transfer::parse_import(text)?;
        self.apply_import(payload).await;
        Ok(())
    }

    pub async fn import_file(&mut self, path: &Path) -> Result<(), StudyError> {
        if !self.features.premium_enabled {
            return Err(StudyError::FeatureDisabled("import"));
        }
        let payload = transfer::read_import(path).await?;
        self.apply_import(payload).await;
        Ok(())
    }

    async fn apply_import(&mut self, payload: ImportPayload) {
        if let Some(mut stats) = payload.stats {
            self.persistence.save_statistics(&mut stats).await;
            self.stats = stats;
        }
        if let Some(bookmarks) = payload.bookmarks {
            self.persistence.save_bookmarks(&bookmarks).await;
            self.bookmarks = bookmarks;
        }
        if let Some(mode) = payload.mode {
            self.mode = mode;
            self.persistence.save_mode(&self.mode).await;
        }

        // Statistics and bookmarks feed queue selection, so always start over
        self.rebuild(None).await;
        self.emit(SessionEvent::DataImported);
        log_session_success!("import", session_id = self.session_id, "study data imported");
    }

    /// Replace queue and cursor wholesale and drop any pending removals
    async fn rebuild(&mut self, requested_start: Option<usize>) {
        self.pending_removal.clear();

        let DatasetState::Ready(dataset) = &self.dataset else {
            self.queue.clear();
            self.cursor = 0;
            return;
        };

        let started = Instant::now();
        let built = if self.features.premium_enabled {
            queue_builder::build(dataset.items(), &self.mode, &self.stats, &self.bookmarks, requested_start)
        } else {
            let stats = self.stats.without_resume_hints();
            queue_builder::build(dataset.items(), &self.mode, &stats, &self.bookmarks, requested_start)
        };
        self.queue = built.items;
        self.cursor = built.cursor;

        log_performance!(
            "rebuild_queue",
            duration_ms = started.elapsed().as_millis() as u64,
            item_count = self.queue.len()
        );
        log_session_success!(
            "rebuild_queue",
            session_id = self.session_id,
            count = self.queue.len(),
            format!("queue rebuilt for {}", self.mode)
        );

        self.persist_resume_cursor().await;
        self.emit(SessionEvent::QueueRebuilt {
            queue_len: self.queue.len(),
            cursor: self.cursor,
        });
    }

    /// Store the cursor as the resume hint for sequential all/category modes
    async fn persist_resume_cursor(&mut self) {
        if !self.features.premium_enabled || self.queue.is_empty() {
            return;
        }
        if self.stats.set_resume_cursor(&self.mode, self.cursor) {
            self.persistence.save_statistics(&mut self.stats).await;
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, StudyOrder};
    use crate::store::MemoryStore;

    fn item(id: &str) -> QuestionItem {
        QuestionItem {
            id: id.to_string(),
            question_text: format!("Question {}", id),
            answer_choices: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            correct_choice_index: 2,
            category: Category::Tarea1,
        }
    }

    async fn session_with(ids: &[&str]) -> StudySession {
        let persistence = PersistenceStore::new(Arc::new(MemoryStore::new()));
        let mut session = StudySession::open(persistence, FeatureConfig::default()).await;
        let dataset = Dataset::from_items(ids.iter().map(|id| item(id)).collect()).unwrap();
        session.attach_dataset(Ok(dataset)).await;
        session
    }

    #[tokio::test]
    async fn test_wrap_around_forward_and_backward() {
        let mut session = session_with(&["1", "2", "3"]).await;
        assert_eq!(session.cursor(), 0);

        assert_eq!(session.navigate_backward().await, Some(2));
        assert_eq!(session.navigate_forward().await, Some(0));
        assert_eq!(session.navigate_forward().await, Some(1));
        assert_eq!(session.position(), Some((2, 3)));
    }

    #[tokio::test]
    async fn test_empty_queue_navigation_is_noop() {
        let persistence = PersistenceStore::new(Arc::new(MemoryStore::new()));
        let mut session = StudySession::open(persistence, FeatureConfig::default()).await;

        assert_eq!(session.navigate_forward().await, None);
        assert_eq!(session.record_answer(true).await, None);
        assert_eq!(session.answer(0).await.unwrap(), None);
        assert_eq!(session.position(), None);
    }

    #[tokio::test]
    async fn test_answer_grades_choice() {
        let mut session = session_with(&["1", "2"]).await;

        let outcome = session.answer(2).await.unwrap().unwrap();
        assert!(outcome.correct);
        assert!(!outcome.pending_removal);

        let outcome = session.answer(0).await.unwrap().unwrap();
        assert!(!outcome.correct);
        assert_eq!(outcome.correct_choice_index, 2);
        assert_eq!(session.statistics().wrong_count("1"), 1);

        let error = session.answer(3).await.unwrap_err();
        assert!(matches!(error, StudyError::InvalidChoice { choice: 3, .. }));
        assert_eq!(session.statistics().attempts_total, 2);
    }

    #[tokio::test]
    async fn test_events_are_published() {
        let mut session = session_with(&["1", "2"]).await;
        let mut events = session.subscribe();

        session.navigate_forward().await;
        session.record_answer(false).await;

        assert_eq!(
            events.recv().await.unwrap(),
            SessionEvent::Navigated {
                direction: Direction::Forward,
                cursor: 1,
                queue_len: 2,
                removed: None,
            }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            SessionEvent::AnswerRecorded {
                question_id: "2".to_string(),
                correct: false,
            }
        );
    }

    #[tokio::test]
    async fn test_dataset_failure_is_terminal() {
        let persistence = PersistenceStore::new(Arc::new(MemoryStore::new()));
        let mut session = StudySession::open(persistence, FeatureConfig::default()).await;

        session
            .attach_dataset(Err(StudyError::DatasetLoad("connection refused".to_string())))
            .await;
        assert!(matches!(session.dataset_state(), DatasetState::Failed(_)));

        let dataset = Dataset::from_items(vec![item("1")]).unwrap();
        session.attach_dataset(Ok(dataset)).await;
        assert!(matches!(session.dataset_state(), DatasetState::Failed(_)));
        assert!(session.queue().is_empty());
    }

    #[tokio::test]
    async fn test_jump_to_only_in_sequential() {
        let mut session = session_with(&["1", "2", "3", "4"]).await;

        assert_eq!(session.jump_to(3).await, Some(2));
        assert_eq!(session.statistics().last_sequential_cursor_global, Some(2));
        assert_eq!(session.jump_to(40).await, Some(3));
        assert_eq!(session.jump_to(0).await, Some(0));

        session
            .set_mode(StudyMode::AllQuestions {
                order: StudyOrder::Random,
            })
            .await
            .unwrap();
        assert_eq!(session.jump_to(2).await, None);
    }
}
