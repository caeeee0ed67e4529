use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Instant;
use tracing::{info, warn};

use crate::errors::StudyError;
use crate::{log_performance, log_validation};
use crate::models::{BookmarkSet, Category, StatisticsRecord, StudyMode, StudyOrder};

pub const EXPORT_FORMAT_VERSION: u64 = 1;

static FILE_NAME_UNSAFE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[:.]").expect("static pattern is valid"));

/// Backup document holding everything a user has accumulated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: u64,
    pub exported_at: DateTime<Utc>,
    pub stats: StatisticsRecord,
    pub bookmarks: Vec<String>,
    pub mode: StudyMode,
}

impl ExportDocument {
    pub fn new(stats: &StatisticsRecord, bookmarks: &BookmarkSet, mode: StudyMode) -> Self {
        Self {
            version: EXPORT_FORMAT_VERSION,
            exported_at: Utc::now(),
            stats: stats.clone(),
            bookmarks: bookmarks.to_vec(),
            mode,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, StudyError> {
        serde_json::to_string_pretty(self).map_err(|e| StudyError::Storage(e.into()))
    }

    /// `ccse-datos-<timestamp>.json`, with separators unsafe in file names replaced
    pub fn file_name(&self) -> String {
        let stamp = self
            .exported_at
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        format!("ccse-datos-{}.json", FILE_NAME_UNSAFE.replace_all(&stamp, "-"))
    }
}

/// Validated content of an import, each section present only if the file had it
#[derive(Debug, Clone, PartialEq)]
pub struct ImportPayload {
    pub stats: Option<StatisticsRecord>,
    pub bookmarks: Option<BookmarkSet>,
    pub mode: Option<StudyMode>,
}

/// Validate an exported document.
///
/// Nothing is applied here, so a rejection leaves all prior state untouched.
pub fn parse_import(text: &str) -> Result<ImportPayload, StudyError> {
    let result = parse_import_value(text);
    match &result {
        Ok(_) => {
            log_validation!(success, "import", "import document accepted");
        }
        Err(e) => {
            log_validation!(failure, "import", error = e);
        }
    }
    result
}

fn parse_import_value(text: &str) -> Result<ImportPayload, StudyError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| StudyError::ImportRejected(format!("not valid JSON: {}", e)))?;

    let Value::Object(document) = value else {
        return Err(StudyError::ImportRejected(
            "top level must be a JSON object".to_string(),
        ));
    };

    if let Some(version) = document.get("version") {
        if version.as_u64() != Some(EXPORT_FORMAT_VERSION) {
            return Err(StudyError::ImportRejected(format!(
                "unsupported export version {}",
                version
            )));
        }
    }

    let stats = match document.get("stats") {
        Some(Value::Object(raw)) => Some(coerce_statistics(raw)),
        Some(_) => {
            warn!("Ignoring import 'stats' section that is not an object");
            None
        }
        None => None,
    };

    let bookmarks = match document.get("bookmarks") {
        Some(Value::Array(entries)) => Some(BookmarkSet::from_ids(
            entries.iter().filter_map(|entry| entry.as_str()),
        )),
        Some(_) => {
            warn!("Ignoring import 'bookmarks' section that is not a list");
            None
        }
        None => None,
    };

    let mode = match document.get("mode") {
        Some(Value::Object(raw)) => coerce_mode(raw),
        _ => None,
    };

    if !document.contains_key("stats")
        && !document.contains_key("bookmarks")
        && !document.contains_key("mode")
    {
        return Err(StudyError::ImportRejected(
            "document has no stats, bookmarks or mode".to_string(),
        ));
    }

    Ok(ImportPayload {
        stats,
        bookmarks,
        mode,
    })
}

fn coerce_statistics(raw: &Map<String, Value>) -> StatisticsRecord {
    let correct_total = coerce_count(raw.get("correct"));
    let wrong_total = coerce_count(raw.get("wrong"));
    let mut attempts_total = coerce_count(raw.get("attempts"));
    let answered = correct_total.saturating_add(wrong_total);
    if attempts_total != answered {
        warn!(
            attempts = attempts_total,
            correct = correct_total,
            wrong = wrong_total,
            "Imported attempt total disagrees with correct + wrong, recomputing"
        );
        attempts_total = answered;
    }

    let wrong_count_by_id = match raw.get("wrongCountById") {
        Some(Value::Object(counts)) => counts
            .iter()
            .filter_map(|(id, count)| {
                let count = u32::try_from(coerce_count(Some(count))).unwrap_or(u32::MAX);
                (count > 0).then(|| (id.clone(), count))
            })
            .collect(),
        _ => BTreeMap::new(),
    };

    let last_sequential_cursor_global = raw
        .get("lastSeqAll")
        .and_then(Value::as_u64)
        .map(|cursor| cursor as usize);

    let last_sequential_cursor_by_category = match raw.get("lastSeqByTask") {
        Some(Value::Object(cursors)) => cursors
            .iter()
            .filter_map(|(tag, cursor)| {
                Some((Category::from_tag(tag)?, cursor.as_u64()? as usize))
            })
            .collect(),
        _ => BTreeMap::new(),
    };

    StatisticsRecord {
        attempts_total,
        correct_total,
        wrong_total,
        wrong_count_by_id,
        last_updated: Utc::now(),
        last_sequential_cursor_global,
        last_sequential_cursor_by_category,
    }
}

/// Numbers and numeric strings count, anything else (including negatives) is 0
fn coerce_count(value: Option<&Value>) -> u64 {
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Bool(true)) => Some(1.0),
        _ => None,
    };

    match number {
        Some(n) if n.is_finite() && n > 0.0 => n.trunc() as u64,
        _ => 0,
    }
}

/// Unknown kinds or orders drop the mode; a category mode without a known
/// category degrades to all questions in the same order
fn coerce_mode(raw: &Map<String, Value>) -> Option<StudyMode> {
    let order = StudyOrder::from_tag(raw.get("order")?.as_str()?)?;

    match raw.get("kind")?.as_str()? {
        "all" => Some(StudyMode::AllQuestions { order }),
        "task" => Some(
            match raw
                .get("task")
                .and_then(Value::as_str)
                .and_then(Category::from_tag)
            {
                Some(category) => StudyMode::ByCategory { category, order },
                None => StudyMode::AllQuestions { order },
            },
        ),
        "failed" => Some(StudyMode::FailedOnly { order }),
        "bookmarked" => Some(StudyMode::BookmarkedOnly { order }),
        _ => None,
    }
}

/// Write `document` into `directory` under its generated file name
pub async fn write_export(document: &ExportDocument, directory: &Path) -> Result<PathBuf, StudyError> {
    let started = Instant::now();
    let path = directory.join(document.file_name());
    tokio::fs::create_dir_all(directory).await?;
    tokio::fs::write(&path, document.to_json_pretty()?).await?;

    log_performance!("write_export", duration_ms = started.elapsed().as_millis() as u64);

    info!(path = %path.display(), "Study data exported");
    Ok(path)
}

pub async fn read_import(path: &Path) -> Result<ImportPayload, StudyError> {
    let text = tokio::fs::read_to_string(path).await?;
    parse_import(&text)
}
