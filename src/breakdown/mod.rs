//! Breakdown orchestrator: split one task into generated subtasks.
//!
//! Linear flow with no retries and no compensation: resolve the subject,
//! call the generator once, decode the reply, persist the subtasks in one
//! bulk insert. A failed insert discards the generated text.

pub mod parser;

use tracing::{debug, info};

use crate::db::Database;
use crate::error::{ApiError, ApiResult};
use crate::generator::TextGenerator;
use crate::types::{BreakdownRequest, Task};
use crate::validate;

use parser::{MAX_SUBTASKS, parse_subtasks};

/// Minimum number of subtasks a breakdown must produce.
pub const MIN_SUBTASKS: usize = 3;

/// The subject of a breakdown: an existing task or a free-standing title.
#[derive(Debug)]
struct Subject {
    title: String,
    task_id: Option<i64>,
}

/// Run a breakdown end to end, returning the created subtasks.
pub async fn run_breakdown(
    db: &Database,
    generator: &dyn TextGenerator,
    request: BreakdownRequest,
) -> ApiResult<Vec<Task>> {
    let subject = resolve_subject(db, &request)?;

    let prompt = build_prompt(&subject.title);
    let reply = generator
        .generate(&prompt)
        .await
        .map_err(ApiError::generator)?;

    let (mut titles, strategy) = parse_subtasks(&reply).ok_or_else(|| {
        ApiError::invalid_value("generator reply did not contain any usable subtasks")
    })?;

    debug!(?strategy, count = titles.len(), "parsed generator reply");

    if titles.len() < MIN_SUBTASKS {
        return Err(ApiError::invalid_value(format!(
            "generator produced {} subtasks, need at least {}",
            titles.len(),
            MIN_SUBTASKS
        )));
    }
    titles.truncate(MAX_SUBTASKS);

    // Generated titles bypass request validation, so clamp them to the
    // store's title bound instead of letting the schema reject the insert.
    for title in &mut titles {
        if title.chars().count() > validate::TITLE_MAX {
            let clamped: String = title.chars().take(validate::TITLE_MAX).collect();
            *title = clamped.trim_end().to_string();
        }
    }

    let created = db
        .insert_subtasks(subject.task_id, &titles, &subject.title)
        .map_err(ApiError::database)?;

    info!(
        subject = %subject.title,
        parent_id = ?subject.task_id,
        count = created.len(),
        "breakdown complete"
    );

    Ok(created)
}

/// Resolve the breakdown subject from exactly one of `taskId` / `taskTitle`.
fn resolve_subject(db: &Database, request: &BreakdownRequest) -> ApiResult<Subject> {
    match (request.task_id, request.task_title.as_deref()) {
        (Some(_), Some(_)) => Err(ApiError::invalid_value(
            "provide either taskId or taskTitle, not both",
        )),
        (None, None) => Err(ApiError::invalid_value(
            "either taskId or taskTitle is required",
        )),
        (Some(task_id), None) => {
            let task = db
                .get_task(task_id)
                .map_err(ApiError::database)?
                .ok_or_else(|| ApiError::task_not_found(task_id))?;
            Ok(Subject {
                title: task.title,
                task_id: Some(task.id),
            })
        }
        (None, Some(title)) => {
            let trimmed = title.trim();
            if trimmed.is_empty() {
                return Err(ApiError::invalid_value("taskTitle must not be empty"));
            }
            Ok(Subject {
                title: trimmed.to_string(),
                task_id: None,
            })
        }
    }
}

/// Fixed instruction sent to the generator.
fn build_prompt(title: &str) -> String {
    format!(
        "Break down the following task into 3 to 5 ordered, actionable steps. \
         Respond with ONLY a JSON array of strings, one step per element, \
         with no additional commentary.\n\nTask: \"{}\"",
        title
    )
}
