use rand::seq::SliceRandom;
use std::cmp::Ordering;

use crate::models::{BookmarkSet, QuestionItem, StatisticsRecord, StudyMode, StudyOrder};

/// A freshly derived working queue with its starting cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltQueue {
    pub items: Vec<QuestionItem>,
    pub cursor: usize,
}

/// Derive the working queue for `mode`.
///
/// `requested_start` is a 1-based position. It only applies to sequential
/// order and only overrides the stored resume hint when greater than 1.
/// The returned cursor is always a valid index, or 0 for an empty queue.
pub fn build(
    dataset: &[QuestionItem],
    mode: &StudyMode,
    stats: &StatisticsRecord,
    bookmarks: &BookmarkSet,
    requested_start: Option<usize>,
) -> BuiltQueue {
    let mut items = select(dataset, mode, stats, bookmarks);

    match mode.order() {
        StudyOrder::Random => {
            items.shuffle(&mut rand::thread_rng());
            BuiltQueue { items, cursor: 0 }
        }
        StudyOrder::Sequential => {
            // sort_by is stable, equal numeric ids keep dataset order
            items.sort_by(|a, b| compare_sequential(&a.id, &b.id));

            let mut cursor = stats.resume_hint(mode).unwrap_or(0);
            if let Some(position) = requested_start.filter(|position| *position > 1) {
                cursor = position - 1;
            }
            let cursor = cursor.min(items.len().saturating_sub(1));

            BuiltQueue { items, cursor }
        }
    }
}

fn select(
    dataset: &[QuestionItem],
    mode: &StudyMode,
    stats: &StatisticsRecord,
    bookmarks: &BookmarkSet,
) -> Vec<QuestionItem> {
    dataset
        .iter()
        .filter(|item| match mode {
            StudyMode::AllQuestions { .. } => true,
            StudyMode::ByCategory { category, .. } => item.category == *category,
            StudyMode::FailedOnly { .. } => stats.wrong_count(&item.id) > 0,
            StudyMode::BookmarkedOnly { .. } => bookmarks.contains(&item.id),
        })
        .cloned()
        .collect()
}

/// Numeric ids compare by value and sort before non-numeric ones,
/// which fall back to plain string order
pub fn compare_sequential(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<u64>(), b.trim().parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
