use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{QuestionItem, StatisticsRecord, StudyMode, StudyOrder};

/// Number of entries shown in the "most failed" ranking
pub const DEFAULT_TOP_FAILED: usize = 10;

/// A question joined with how often it was answered wrong
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedQuestion<'a> {
    pub item: &'a QuestionItem,
    pub wrong_count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsSummary<'a> {
    pub attempts: u64,
    pub correct: u64,
    pub wrong: u64,
    pub accuracy_percent: Option<f64>,
    pub last_updated: DateTime<Utc>,
    pub most_failed: Vec<FailedQuestion<'a>>,
}

impl StatisticsRecord {
    /// Count one answer to `item`
    pub fn record_answer(&mut self, item: &QuestionItem, was_correct: bool) {
        self.attempts_total = self.attempts_total.saturating_add(1);
        if was_correct {
            self.correct_total = self.correct_total.saturating_add(1);
        } else {
            self.wrong_total = self.wrong_total.saturating_add(1);
            let count = self.wrong_count_by_id.entry(item.id.clone()).or_insert(0);
            *count = count.saturating_add(1);
        }
    }

    pub fn wrong_count(&self, id: &str) -> u32 {
        self.wrong_count_by_id.get(id).copied().unwrap_or(0)
    }

    /// Forget the failures of `id`, returning whether there were any
    pub fn clear_failures(&mut self, id: &str) -> bool {
        self.wrong_count_by_id.remove(id).is_some()
    }

    /// Stored resume position for a sequential mode, if the mode keeps one
    pub fn resume_hint(&self, mode: &StudyMode) -> Option<usize> {
        match mode {
            StudyMode::AllQuestions {
                order: StudyOrder::Sequential,
            } => self.last_sequential_cursor_global,
            StudyMode::ByCategory {
                category,
                order: StudyOrder::Sequential,
            } => self.last_sequential_cursor_by_category.get(category).copied(),
            _ => None,
        }
    }

    /// Store `cursor` as the resume position for `mode`.
    ///
    /// Returns false, leaving the record untouched, for modes that never resume.
    pub fn set_resume_cursor(&mut self, mode: &StudyMode, cursor: usize) -> bool {
        match mode {
            StudyMode::AllQuestions {
                order: StudyOrder::Sequential,
            } => {
                self.last_sequential_cursor_global = Some(cursor);
                true
            }
            StudyMode::ByCategory {
                category,
                order: StudyOrder::Sequential,
            } => {
                self.last_sequential_cursor_by_category.insert(*category, cursor);
                true
            }
            _ => false,
        }
    }

    /// Copy of the record with every resume hint dropped
    pub fn without_resume_hints(&self) -> StatisticsRecord {
        StatisticsRecord {
            last_sequential_cursor_global: None,
            last_sequential_cursor_by_category: Default::default(),
            ..self.clone()
        }
    }

    pub fn accuracy_percent(&self) -> Option<f64> {
        if self.attempts_total == 0 {
            return None;
        }
        Some(self.correct_total as f64 * 100.0 / self.attempts_total as f64)
    }
}

/// Rank dataset questions by wrong-answer count, highest first.
///
/// Ties keep dataset order and questions never answered wrong are left out.
pub fn rank_most_failed<'a>(
    stats: &StatisticsRecord,
    dataset: &'a [QuestionItem],
    top_n: usize,
) -> Vec<FailedQuestion<'a>> {
    let mut ranked: Vec<FailedQuestion<'a>> = dataset
        .iter()
        .map(|item| FailedQuestion {
            item,
            wrong_count: stats.wrong_count(&item.id),
        })
        .collect();

    // sort_by is stable
    ranked.sort_by(|a, b| b.wrong_count.cmp(&a.wrong_count));
    ranked.retain(|entry| entry.wrong_count > 0);
    ranked.truncate(top_n);
    ranked
}

pub fn summarize<'a>(stats: &StatisticsRecord, dataset: &'a [QuestionItem]) -> StatsSummary<'a> {
    StatsSummary {
        attempts: stats.attempts_total,
        correct: stats.correct_total,
        wrong: stats.wrong_total,
        accuracy_percent: stats.accuracy_percent(),
        last_updated: stats.last_updated,
        most_failed: rank_most_failed(stats, dataset, DEFAULT_TOP_FAILED),
    }
}
