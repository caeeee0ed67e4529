use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

use crate::errors::StudyError;
use crate::models::{Category, QuestionItem};
use crate::{log_performance, log_validation};

/// Location of the static question bank
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    File(PathBuf),
    Url(String),
}

impl DatasetSource {
    /// `http://` and `https://` sources are fetched, anything else is a path
    pub fn parse(source: &str) -> Self {
        let trimmed = source.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            DatasetSource::Url(trimmed.to_string())
        } else {
            DatasetSource::File(PathBuf::from(trimmed))
        }
    }
}

impl std::fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetSource::File(path) => write!(f, "{}", path.display()),
            DatasetSource::Url(url) => f.write_str(url),
        }
    }
}

/// Immutable, validated question collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    items: Vec<QuestionItem>,
}

impl Dataset {
    /// Validate and wrap `items`; a single bad item rejects the whole collection
    pub fn from_items(items: Vec<QuestionItem>) -> Result<Self, StudyError> {
        let mut seen = HashSet::with_capacity(items.len());

        for item in &items {
            if item.id.trim().is_empty() {
                return Err(StudyError::InvalidDataset(format!(
                    "question '{}' has an empty id",
                    item.question_text
                )));
            }
            if !seen.insert(item.id.as_str()) {
                return Err(StudyError::InvalidDataset(format!(
                    "duplicate question id '{}'",
                    item.id
                )));
            }
            if item.answer_choices.len() < 2 {
                return Err(StudyError::InvalidDataset(format!(
                    "question '{}' needs at least two answers",
                    item.id
                )));
            }
            if item.correct_choice_index >= item.answer_choices.len() {
                return Err(StudyError::InvalidDataset(format!(
                    "question '{}' marks answer {} correct but has only {}",
                    item.id,
                    item.correct_choice_index,
                    item.answer_choices.len()
                )));
            }
        }

        if items.is_empty() {
            warn!("Dataset contains no questions");
        }

        Ok(Self { items })
    }

    pub fn from_json(text: &str) -> Result<Self, StudyError> {
        let items: Vec<QuestionItem> = serde_json::from_str(text)
            .map_err(|e| StudyError::InvalidDataset(format!("unparsable question file: {}", e)))?;
        Self::from_items(items)
    }

    pub fn items(&self) -> &[QuestionItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&QuestionItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Categories present in the dataset, in first-seen order
    pub fn categories(&self) -> Vec<Category> {
        let mut categories = Vec::new();
        for item in &self.items {
            if !categories.contains(&item.category) {
                categories.push(item.category);
            }
        }
        categories
    }
}

/// Fetch and validate the question bank. There is no retry, a failure is final.
pub async fn load_dataset(source: &DatasetSource) -> Result<Dataset, StudyError> {
    let started = Instant::now();

    let text = match source {
        DatasetSource::File(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
            StudyError::DatasetLoad(format!("cannot read {}: {}", path.display(), e))
        })?,
        DatasetSource::Url(url) => {
            reqwest::get(url)
                .await?
                .error_for_status()?
                .text()
                .await?
        }
    };

    let dataset = match Dataset::from_json(&text) {
        Ok(dataset) => dataset,
        Err(e) => {
            log_validation!(failure, "dataset", error = e);
            return Err(e);
        }
    };

    log_validation!(success, "dataset", "question bank validated");
    log_performance!(
        "load_dataset",
        duration_ms = started.elapsed().as_millis() as u64,
        item_count = dataset.len()
    );
    info!(source = %source, questions = dataset.len(), "Dataset loaded");

    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_item(id: &str, task: &str, answers: usize, correct: usize) -> serde_json::Value {
        json!({
            "question": format!("Question {}", id),
            "answers": (0..answers).map(|i| format!("Answer {}", i)).collect::<Vec<_>>(),
            "correct_answer": correct,
            "task": task,
            "task_id": id
        })
    }

    #[test]
    fn test_source_parsing() {
        assert_eq!(
            DatasetSource::parse("https://example.org/data/data-25.json"),
            DatasetSource::Url("https://example.org/data/data-25.json".to_string())
        );
        assert_eq!(
            DatasetSource::parse("public/data/data-25.json"),
            DatasetSource::File(PathBuf::from("public/data/data-25.json"))
        );
    }

    #[test]
    fn test_valid_dataset() {
        let text = json!([
            raw_item("1001", "tarea_2", 3, 0),
            raw_item("1002", "tarea_1", 3, 2),
            raw_item("1003", "tarea_2", 2, 1),
        ])
        .to_string();

        let dataset = Dataset::from_json(&text).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.categories(), vec![Category::Tarea2, Category::Tarea1]);
        assert_eq!(dataset.get("1002").unwrap().correct_choice_index, 2);
        assert!(dataset.get("9999").is_none());
    }

    #[test]
    fn test_invalid_datasets_rejected() {
        let cases = vec![
            json!([raw_item("1", "tarea_1", 3, 3)]),
            json!([raw_item("1", "tarea_1", 1, 0)]),
            json!([raw_item("1", "tarea_1", 3, 0), raw_item("1", "tarea_2", 3, 0)]),
            json!([raw_item(" ", "tarea_1", 3, 0)]),
            json!([raw_item("1", "tarea_9", 3, 0)]),
            json!({ "questions": [] }),
        ];

        for case in cases {
            let result = Dataset::from_json(&case.to_string());
            assert!(
                matches!(result, Err(StudyError::InvalidDataset(_))),
                "{} should be rejected",
                case
            );
        }
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data-25.json");
        let text = json!([raw_item("1", "tarea_1", 3, 0), raw_item("2", "tarea_5", 3, 1)]).to_string();
        tokio::fs::write(&path, text).await.unwrap();

        let dataset = load_dataset(&DatasetSource::File(path)).await.unwrap();
        assert_eq!(dataset.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_dataset(&DatasetSource::File(dir.path().join("absent.json"))).await;

        let error = result.unwrap_err();
        assert!(matches!(error, StudyError::DatasetLoad(_)));
        assert!(error.is_fatal());
    }

    /// Answer a single HTTP request on a local port with `status` and `body`
    async fn serve_once(status: &'static str, body: String) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = vec![0u8; 4096];
            let _ = socket.read(&mut request).await;

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{}/data/data-25.json", address)
    }

    #[tokio::test]
    async fn test_load_from_url() {
        let body = json!([raw_item("7", "tarea_4", 2, 1), raw_item("3", "tarea_4", 2, 0)]).to_string();
        let url = serve_once("200 OK", body).await;

        let dataset = load_dataset(&DatasetSource::parse(&url)).await.unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.categories(), vec![Category::Tarea4]);
    }

    #[tokio::test]
    async fn test_non_success_status_is_fatal() {
        let url = serve_once("404 Not Found", "not here".to_string()).await;

        let error = load_dataset(&DatasetSource::parse(&url)).await.unwrap_err();
        assert!(matches!(error, StudyError::DatasetLoad(_)));
        assert!(error.is_fatal());
    }
}
