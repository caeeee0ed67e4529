use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use ccse_study::config::{Config, FeatureConfig, LoggingConfig};
use ccse_study::errors::ErrorContext;
use ccse_study::{
    load_dataset, log_system_event, Category, DatasetSource, DatasetState, PersistenceStore,
    SqliteStore, StudyMode, StudyOrder, StudySession,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    let _guard = setup_logging(&config.logging)?;
    config.validate()?;

    log_system_event!(startup, component = "terminal", "Starting CCSE study session");

    let store = SqliteStore::new(&config.storage.url).await?;
    let persistence = PersistenceStore::new(Arc::new(store));
    let mut session = StudySession::open(persistence, config.features).await;
    info!(session_id = %session.session_id(), "Study session opened");

    let source = DatasetSource::parse(&config.dataset.source);
    session.attach_dataset(load_dataset(&source).await).await;

    if let DatasetState::Failed(message) = session.dataset_state() {
        println!("{}", message);
        println!("Expected location: {}", source);
        return Ok(());
    }

    print_help(session.features());
    render(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            continue;
        };
        let argument = parts.collect::<Vec<_>>();

        match command {
            "q" | "quit" => break,
            "h" | "help" => print_help(session.features()),
            "n" | "next" => {
                session.navigate_forward().await;
                render(&session);
            }
            "p" | "prev" => {
                session.navigate_backward().await;
                render(&session);
            }
            "b" | "bookmark" => match session.toggle_current_bookmark().await {
                Ok(Some(true)) => println!("Bookmarked."),
                Ok(Some(false)) => println!("Bookmark removed."),
                Ok(None) => println!("Nothing to bookmark."),
                Err(e) => println!("{}", e.to_user_message_with_context(ErrorContext::new("bookmark", "bookmarks"))),
            },
            "s" | "stats" => print_stats(&session),
            "g" | "goto" => match argument.first().and_then(|n| n.parse::<usize>().ok()) {
                Some(position) => {
                    if session.jump_to(position).await.is_none() {
                        println!("Jumping is only available in sequential order.");
                    }
                    render(&session);
                }
                None => println!("Usage: g <position>"),
            },
            "m" | "mode" => match parse_mode(&argument, session.mode()) {
                Some(mode) => match session.set_mode(mode).await {
                    Ok(()) => render(&session),
                    Err(e) => println!("{}", e.to_user_message_with_context(ErrorContext::new("set_mode", "study mode"))),
                },
                None => println!("Usage: m <all|failed|bookmarked|tarea_1..tarea_5|random|sequential> [random|sequential]"),
            },
            "e" | "export" => match session.export_to(&config.export.directory).await {
                Ok(path) => println!("Exported to {}", path.display()),
                Err(e) => println!("{}", e.to_user_message_with_context(ErrorContext::new("export", "export file"))),
            },
            "i" | "import" => match argument.first() {
                Some(path) => match session.import_file(Path::new(path)).await {
                    Ok(()) => {
                        println!("Data imported.");
                        render(&session);
                    }
                    Err(e) => println!(
                        "{}",
                        e.to_user_message_with_context(ErrorContext::new("import", "export file").with_id(path))
                    ),
                },
                None => println!("Usage: i <path>"),
            },
            other => match other.parse::<usize>() {
                Ok(choice) if choice >= 1 => match session.answer(choice - 1).await {
                    Ok(Some(outcome)) if outcome.correct => println!("✅ Correct!"),
                    Ok(Some(outcome)) => println!("❌ Wrong, the answer was {}.", outcome.correct_choice_index + 1),
                    Ok(None) => println!("No question to answer."),
                    Err(e) => println!("{}", e.to_user_message_with_context(ErrorContext::new("answer", "question"))),
                },
                _ => println!("Unknown command '{}', type h for help.", other),
            },
        }
    }

    log_system_event!(shutdown, component = "terminal", "Study session finished");
    Ok(())
}

/// Parse `<kind> [order]`, keeping the current order when none is given.
/// A bare order keeps the current kind.
fn parse_mode(argument: &[&str], current: StudyMode) -> Option<StudyMode> {
    if let Some(order) = argument.first().and_then(|tag| StudyOrder::from_tag(tag)) {
        return Some(current.with_order(order));
    }

    let order = match argument.get(1) {
        Some(tag) => StudyOrder::from_tag(tag)?,
        None => current.order(),
    };

    match *argument.first()? {
        "all" => Some(StudyMode::AllQuestions { order }),
        "failed" => Some(StudyMode::FailedOnly { order }),
        "bookmarked" => Some(StudyMode::BookmarkedOnly { order }),
        tag => Category::from_tag(tag).map(|category| StudyMode::ByCategory { category, order }),
    }
}

fn render(session: &StudySession) {
    let (Some(item), Some((position, total))) = (session.current(), session.position()) else {
        println!("\nNo questions in mode {}.", session.mode());
        return;
    };

    let marker = if session.is_bookmarked(&item.id) { " ★" } else { "" };
    println!("\n[{}] #{}{}", item.category.label(), item.id, marker);
    println!("{}", item.question_text);
    for (index, choice) in item.answer_choices.iter().enumerate() {
        println!("  {}) {}", index + 1, choice);
    }
    println!("{} / {}  ({})", position, total, session.mode());
}

fn print_stats(session: &StudySession) {
    let summary = session.summary();
    println!("\nAttempts: {}  Correct: {}  Wrong: {}", summary.attempts, summary.correct, summary.wrong);
    if let Some(accuracy) = summary.accuracy_percent {
        println!("Accuracy: {:.1}%", accuracy);
    }
    if summary.most_failed.is_empty() {
        println!("No failed questions yet.");
    }
    for entry in &summary.most_failed {
        println!("  {} · {} ({} wrong)", entry.item.id, entry.item.question_text, entry.wrong_count);
    }
    println!("Updated: {}", summary.last_updated.to_rfc2822());
}

fn print_help(features: FeatureConfig) {
    println!("Commands: <number> answer, n next, p previous, s stats, g <n> go to, q quit");
    println!("          m <all|tarea_N> [order] or m <random|sequential> change mode");
    if features.premium_enabled {
        println!("          m <failed|bookmarked> [order], b bookmark, e export, i <path> import");
    }
}

fn setup_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    use std::fs;
    use tracing_subscriber::fmt;

    let env_filter = EnvFilter::try_new(&config.level)
        .unwrap_or_else(|_| EnvFilter::new("info,ccse_study=debug"));

    // Console output goes to stderr so it does not interleave with the study prompt
    let console_layer = config.console_enabled.then(|| {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(true)
            .with_writer(std::io::stderr)
            .boxed()
    });

    let mut guard = None;
    let file_layer = if config.file_enabled {
        fs::create_dir_all(&config.log_directory).unwrap_or_else(|e| {
            eprintln!("Warning: Could not create logs directory: {}", e);
        });

        let file_appender = tracing_appender::rolling::daily(&config.log_directory, "ccse-study.log");
        let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(file_guard);

        Some(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false)
                .with_writer(non_blocking_file)
                .boxed(),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!(
        log_directory = %config.log_directory,
        file_enabled = config.file_enabled,
        "Logging initialized"
    );

    Ok(guard)
}
