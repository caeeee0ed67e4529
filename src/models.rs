use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Exam task category a question belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "tarea_1")]
    Tarea1,
    #[serde(rename = "tarea_2")]
    Tarea2,
    #[serde(rename = "tarea_3")]
    Tarea3,
    #[serde(rename = "tarea_4")]
    Tarea4,
    #[serde(rename = "tarea_5")]
    Tarea5,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Tarea1,
        Category::Tarea2,
        Category::Tarea3,
        Category::Tarea4,
        Category::Tarea5,
    ];

    /// Wire tag used in the dataset and in exported documents
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Tarea1 => "tarea_1",
            Category::Tarea2 => "tarea_2",
            Category::Tarea3 => "tarea_3",
            Category::Tarea4 => "tarea_4",
            Category::Tarea5 => "tarea_5",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.as_str() == tag)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Tarea1 => "Tarea 1 · Gobierno y participación",
            Category::Tarea2 => "Tarea 2 · Derechos y deberes",
            Category::Tarea3 => "Tarea 3 · Organización territorial y geografía",
            Category::Tarea4 => "Tarea 4 · Cultura e historia",
            Category::Tarea5 => "Tarea 5 · Sociedad española",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Category::Tarea1 => "#0ea5e9",
            Category::Tarea2 => "#22c55e",
            Category::Tarea3 => "#a855f7",
            Category::Tarea4 => "#f59e0b",
            Category::Tarea5 => "#ef4444",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single multiple-choice question from the static question bank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionItem {
    #[serde(rename = "task_id")]
    pub id: String, // Join key for statistics and bookmarks, numeric-valued
    #[serde(rename = "question")]
    pub question_text: String,
    #[serde(rename = "answers")]
    pub answer_choices: Vec<String>,
    #[serde(rename = "correct_answer")]
    pub correct_choice_index: usize,
    #[serde(rename = "task")]
    pub category: Category,
}

impl QuestionItem {
    pub fn is_correct_choice(&self, choice_index: usize) -> bool {
        choice_index == self.correct_choice_index
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyOrder {
    Random,
    Sequential,
}

impl StudyOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudyOrder::Random => "random",
            StudyOrder::Sequential => "sequential",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "random" => Some(StudyOrder::Random),
            "sequential" => Some(StudyOrder::Sequential),
            _ => None,
        }
    }
}

/// Study mode driving queue construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum StudyMode {
    #[serde(rename = "all")]
    AllQuestions { order: StudyOrder },
    #[serde(rename = "task")]
    ByCategory {
        #[serde(rename = "task")]
        category: Category,
        order: StudyOrder,
    },
    #[serde(rename = "failed")]
    FailedOnly { order: StudyOrder },
    #[serde(rename = "bookmarked")]
    BookmarkedOnly { order: StudyOrder },
}

impl Default for StudyMode {
    fn default() -> Self {
        StudyMode::AllQuestions {
            order: StudyOrder::Sequential,
        }
    }
}

impl StudyMode {
    pub fn order(&self) -> StudyOrder {
        match self {
            StudyMode::AllQuestions { order }
            | StudyMode::ByCategory { order, .. }
            | StudyMode::FailedOnly { order }
            | StudyMode::BookmarkedOnly { order } => *order,
        }
    }

    pub fn with_order(self, order: StudyOrder) -> Self {
        match self {
            StudyMode::AllQuestions { .. } => StudyMode::AllQuestions { order },
            StudyMode::ByCategory { category, .. } => StudyMode::ByCategory { category, order },
            StudyMode::FailedOnly { .. } => StudyMode::FailedOnly { order },
            StudyMode::BookmarkedOnly { .. } => StudyMode::BookmarkedOnly { order },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StudyMode::AllQuestions { .. } => "all",
            StudyMode::ByCategory { .. } => "task",
            StudyMode::FailedOnly { .. } => "failed",
            StudyMode::BookmarkedOnly { .. } => "bookmarked",
        }
    }

    pub fn is_sequential(&self) -> bool {
        self.order() == StudyOrder::Sequential
    }

    pub fn is_failed_only(&self) -> bool {
        matches!(self, StudyMode::FailedOnly { .. })
    }

    /// Failed and bookmarked review are only offered with premium features
    pub fn requires_premium(&self) -> bool {
        matches!(
            self,
            StudyMode::FailedOnly { .. } | StudyMode::BookmarkedOnly { .. }
        )
    }
}

impl fmt::Display for StudyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudyMode::ByCategory { category, order } => {
                write!(f, "task:{}/{}", category, order.as_str())
            }
            other => write!(f, "{}/{}", other.kind(), other.order().as_str()),
        }
    }
}

/// Running answer statistics, one record per installation.
///
/// Field names on the wire match the exported document format so that
/// existing exports import cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsRecord {
    #[serde(rename = "attempts")]
    pub attempts_total: u64,
    #[serde(rename = "correct")]
    pub correct_total: u64,
    #[serde(rename = "wrong")]
    pub wrong_total: u64,
    #[serde(default)]
    pub wrong_count_by_id: BTreeMap<String, u32>,
    pub last_updated: DateTime<Utc>,
    #[serde(rename = "lastSeqAll", default, skip_serializing_if = "Option::is_none")]
    pub last_sequential_cursor_global: Option<usize>,
    #[serde(rename = "lastSeqByTask", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub last_sequential_cursor_by_category: BTreeMap<Category, usize>,
}

impl Default for StatisticsRecord {
    fn default() -> Self {
        Self {
            attempts_total: 0,
            correct_total: 0,
            wrong_total: 0,
            wrong_count_by_id: BTreeMap::new(),
            last_updated: Utc::now(),
            last_sequential_cursor_global: None,
            last_sequential_cursor_by_category: BTreeMap::new(),
        }
    }
}

/// Bookmarked question ids, deduplicated and semantically unordered
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookmarkSet {
    ids: BTreeSet<String>,
}

impl BookmarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Flip membership of `id`, returning whether it is bookmarked afterwards
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }
}
