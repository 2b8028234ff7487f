//! Integration tests for the breakdown orchestrator.
//!
//! The text generator is replaced with a scripted fake so no network
//! traffic is involved.

use async_trait::async_trait;

use taskdeck::breakdown::parser::MAX_SUBTASKS;
use taskdeck::breakdown::{self, MIN_SUBTASKS};
use taskdeck::db::Database;
use taskdeck::error::ErrorCode;
use taskdeck::generator::{GeneratorError, TextGenerator};
use taskdeck::types::{BreakdownRequest, NewTask, Priority, Status};
use taskdeck::validate::TITLE_MAX;

/// Generator that replies with a canned string (or a canned failure).
struct FakeGenerator {
    reply: Result<String, String>,
}

impl FakeGenerator {
    fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
        }
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GeneratorError> {
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(GeneratorError::Status(502, message.clone())),
        }
    }
}

fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

fn seed_task(db: &Database, title: &str) -> taskdeck::types::Task {
    db.create_task(NewTask {
        title: title.to_string(),
        description: None,
        status: Status::Pending,
        priority: Priority::Medium,
        parent_id: None,
    })
    .expect("Failed to create task")
}

fn by_title(title: &str) -> BreakdownRequest {
    BreakdownRequest {
        task_id: None,
        task_title: Some(title.to_string()),
    }
}

#[tokio::test]
async fn json_reply_creates_subtasks_under_the_task() {
    let db = setup_db();
    let task = seed_task(&db, "Plan the launch");
    let generator =
        FakeGenerator::replying(r#"["Draft announcement", "Set a date", "Notify the team"]"#);

    let request = BreakdownRequest {
        task_id: Some(task.id),
        task_title: None,
    };
    let created = breakdown::run_breakdown(&db, &generator, request)
        .await
        .expect("breakdown failed");

    assert_eq!(created.len(), 3);
    assert!(created.len() >= MIN_SUBTASKS && created.len() <= MAX_SUBTASKS);
    for subtask in &created {
        assert_eq!(subtask.parent_id, Some(task.id));
        assert_eq!(subtask.status, Status::Pending);
        assert_eq!(subtask.priority, Priority::Medium);
    }
    assert_eq!(created[0].title, "Draft announcement");

    let fetched = db
        .get_task_with_subtasks(task.id)
        .expect("query failed")
        .expect("task missing");
    assert_eq!(fetched.subtasks.expect("subtasks not populated").len(), 3);
}

#[tokio::test]
async fn raw_title_creates_top_level_subtasks() {
    let db = setup_db();
    let generator =
        FakeGenerator::replying(r#"["Pick a route", "Pack supplies", "Check the weather"]"#);

    let created = breakdown::run_breakdown(&db, &generator, by_title("Hike the ridge"))
        .await
        .expect("breakdown failed");

    assert_eq!(created.len(), 3);
    assert!(created.iter().all(|t| t.parent_id.is_none()));
    assert!(
        created[0]
            .description
            .as_deref()
            .expect("missing description")
            .contains("Hike the ridge")
    );
}

#[tokio::test]
async fn numbered_line_reply_is_parsed_by_the_fallback() {
    let db = setup_db();
    let generator = FakeGenerator::replying(
        "Here are the steps:\n1. Empty the shelves\n2. Wipe them down\n3. Restock by category",
    );

    let created = breakdown::run_breakdown(&db, &generator, by_title("Reorganize the pantry"))
        .await
        .expect("breakdown failed");

    let titles: Vec<&str> = created.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["Empty the shelves", "Wipe them down", "Restock by category"]
    );
}

#[tokio::test]
async fn oversized_reply_is_truncated() {
    let db = setup_db();
    let generator = FakeGenerator::replying(
        r#"["Step one", "Step two", "Step three", "Step four", "Step five", "Step six", "Step seven"]"#,
    );

    let created = breakdown::run_breakdown(&db, &generator, by_title("Big project"))
        .await
        .expect("breakdown failed");

    assert_eq!(created.len(), MAX_SUBTASKS);
    assert_eq!(created[MAX_SUBTASKS - 1].title, "Step five");
}

#[tokio::test]
async fn overlong_generated_titles_are_clamped() {
    let db = setup_db();
    let long_title = "x".repeat(TITLE_MAX + 50);
    let generator = FakeGenerator::replying(&format!(
        r#"["{long_title}", "Second step", "Third step"]"#
    ));

    let created = breakdown::run_breakdown(&db, &generator, by_title("Verbose project"))
        .await
        .expect("breakdown failed");

    assert_eq!(created.len(), 3);
    assert_eq!(created[0].title.chars().count(), TITLE_MAX);
    assert_eq!(created[1].title, "Second step");
}

#[tokio::test]
async fn undersized_reply_is_rejected() {
    let db = setup_db();
    let generator = FakeGenerator::replying(r#"["Only one", "And two"]"#);

    let err = breakdown::run_breakdown(&db, &generator, by_title("Small project"))
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ValidationFailed);
    // Nothing is persisted on failure.
    assert_eq!(
        db.list_tasks(&Default::default()).expect("list failed").len(),
        0
    );
}

#[tokio::test]
async fn unusable_reply_is_rejected() {
    let db = setup_db();
    let generator = FakeGenerator::replying("I'm sorry, I cannot help with that.");

    let err = breakdown::run_breakdown(&db, &generator, by_title("Anything"))
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ValidationFailed);
}

#[tokio::test]
async fn generator_failure_surfaces_as_upstream_error() {
    let db = setup_db();
    let generator = FakeGenerator::failing("bad gateway");

    let err = breakdown::run_breakdown(&db, &generator, by_title("Anything"))
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::GeneratorFailed);
    assert!(err.message.contains("bad gateway"));
}

#[tokio::test]
async fn unknown_task_id_is_not_found() {
    let db = setup_db();
    let generator = FakeGenerator::replying(r#"["A", "B", "C"]"#);

    let request = BreakdownRequest {
        task_id: Some(404),
        task_title: None,
    };
    let err = breakdown::run_breakdown(&db, &generator, request)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::TaskNotFound);
}

#[tokio::test]
async fn missing_subject_is_rejected() {
    let db = setup_db();
    let generator = FakeGenerator::replying(r#"["A", "B", "C"]"#);

    let err = breakdown::run_breakdown(&db, &generator, BreakdownRequest::default())
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ValidationFailed);
}

#[tokio::test]
async fn supplying_both_subjects_is_rejected() {
    let db = setup_db();
    let task = seed_task(&db, "Ambiguous");
    let generator = FakeGenerator::replying(r#"["A", "B", "C"]"#);

    let request = BreakdownRequest {
        task_id: Some(task.id),
        task_title: Some("Ambiguous".to_string()),
    };
    let err = breakdown::run_breakdown(&db, &generator, request)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ValidationFailed);
}

#[tokio::test]
async fn blank_title_is_rejected() {
    let db = setup_db();
    let generator = FakeGenerator::replying(r#"["A", "B", "C"]"#);

    let err = breakdown::run_breakdown(&db, &generator, by_title("   "))
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ValidationFailed);
}
