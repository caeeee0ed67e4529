pub mod config;
pub mod dataset;
pub mod errors;
pub mod logging;
pub mod models;
pub mod persistence;
pub mod queue_builder;
pub mod session;
pub mod statistics;
pub mod store;
pub mod transfer;

#[cfg(test)]
mod tests {
    mod failed_mode_removal_test;
    mod resume_cursor_test;
}

pub use config::{Config, FeatureConfig};
pub use dataset::{load_dataset, Dataset, DatasetSource};
pub use errors::*;
pub use models::*;
pub use persistence::PersistenceStore;
pub use queue_builder::BuiltQueue;
pub use session::{AnswerOutcome, DatasetState, Direction, SessionEvent, StudySession};
pub use statistics::{rank_most_failed, FailedQuestion, StatsSummary};
pub use store::{KeyValueStore, MemoryStore, SqliteStore};
pub use transfer::{ExportDocument, ImportPayload};
