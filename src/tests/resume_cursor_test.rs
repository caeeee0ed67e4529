#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::config::FeatureConfig;
    use crate::dataset::Dataset;
    use crate::models::{Category, QuestionItem, StudyMode, StudyOrder};
    use crate::persistence::PersistenceStore;
    use crate::session::StudySession;
    use crate::store::MemoryStore;

    fn dataset() -> Dataset {
        let items = [
            ("10", Category::Tarea1),
            ("2", Category::Tarea2),
            ("9", Category::Tarea1),
            ("31", Category::Tarea2),
            ("4", Category::Tarea2),
            ("1", Category::Tarea1),
        ]
        .into_iter()
        .map(|(id, category)| QuestionItem {
            id: id.to_string(),
            question_text: format!("Question {}", id),
            answer_choices: vec!["sí".to_string(), "no".to_string()],
            correct_choice_index: 1,
            category,
        })
        .collect();
        Dataset::from_items(items).unwrap()
    }

    async fn open(store: &Arc<MemoryStore>, features: FeatureConfig) -> StudySession {
        let persistence = PersistenceStore::new(store.clone());
        let mut session = StudySession::open(persistence, features).await;
        session.attach_dataset(Ok(dataset())).await;
        session
    }

    #[tokio::test]
    async fn test_sequential_position_survives_restart() {
        let store = Arc::new(MemoryStore::new());

        {
            let mut session = open(&store, FeatureConfig::default()).await;
            session.navigate_forward().await;
            session.navigate_forward().await;
            assert_eq!(session.current().unwrap().id, "4");
        }

        let session = open(&store, FeatureConfig::default()).await;
        assert_eq!(session.cursor(), 2);
        assert_eq!(session.current().unwrap().id, "4");
    }

    #[tokio::test]
    async fn test_category_positions_are_independent() {
        let store = Arc::new(MemoryStore::new());
        let task_one = StudyMode::ByCategory {
            category: Category::Tarea1,
            order: StudyOrder::Sequential,
        };
        let task_two = StudyMode::ByCategory {
            category: Category::Tarea2,
            order: StudyOrder::Sequential,
        };

        let mut session = open(&store, FeatureConfig::default()).await;
        session.set_mode(task_two).await.unwrap();
        let ids: Vec<&str> = session.queue().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "4", "31"]);
        session.navigate_backward().await;
        assert_eq!(session.cursor(), 2);

        session.set_mode(task_one).await.unwrap();
        assert_eq!(session.cursor(), 0);
        session.navigate_forward().await;

        session.set_mode(task_two).await.unwrap();
        assert_eq!(session.cursor(), 2);
        session.set_mode(task_one).await.unwrap();
        assert_eq!(session.cursor(), 1);
    }

    #[tokio::test]
    async fn test_random_order_never_writes_resume_cursor() {
        let store = Arc::new(MemoryStore::new());
        let mut session = open(&store, FeatureConfig::default()).await;
        let hint_before = session.statistics().last_sequential_cursor_global;

        session
            .set_mode(StudyMode::AllQuestions {
                order: StudyOrder::Random,
            })
            .await
            .unwrap();
        session.navigate_forward().await;
        session.navigate_forward().await;

        assert_eq!(session.statistics().last_sequential_cursor_global, hint_before);
        assert_eq!(session.cursor(), 2);
    }

    #[tokio::test]
    async fn test_explicit_start_wins_over_resume_hint() {
        let store = Arc::new(MemoryStore::new());
        let mut session = open(&store, FeatureConfig::default()).await;
        session.jump_to(5).await;

        session.restart_at(2).await;
        assert_eq!(session.cursor(), 1);
        assert_eq!(session.statistics().last_sequential_cursor_global, Some(1));

        // Position 1 defers to the stored hint
        session.jump_to(4).await;
        session.restart_at(1).await;
        assert_eq!(session.cursor(), 3);
    }

    #[tokio::test]
    async fn test_premium_disabled_ignores_resume_hints() {
        let store = Arc::new(MemoryStore::new());
        {
            let mut session = open(&store, FeatureConfig::default()).await;
            session.jump_to(4).await;
        }

        let features = FeatureConfig {
            premium_enabled: false,
        };
        let mut session = open(&store, features).await;
        assert_eq!(session.cursor(), 0);

        session.navigate_forward().await;
        assert_eq!(session.statistics().last_sequential_cursor_global, Some(3));

        assert!(session
            .set_mode(StudyMode::BookmarkedOnly {
                order: StudyOrder::Sequential,
            })
            .await
            .is_err());
        assert!(session.toggle_bookmark("1").await.is_err());
        assert!(session.export_document().is_err());
    }
}
