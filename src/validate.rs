//! Pure payload validation for task create/update requests.
//!
//! Rules are evaluated exhaustively so a single response carries every
//! violation, and no rule touches the store.

use crate::types::{CreateTaskRequest, Priority, Status, UpdateTaskRequest};

/// Maximum title length in characters.
pub const TITLE_MAX: usize = 200;

/// Maximum description length in characters.
pub const DESCRIPTION_MAX: usize = 1000;

/// Validate a create payload. Empty result means valid.
pub fn validate_create(req: &CreateTaskRequest) -> Vec<String> {
    let mut errors = Vec::new();

    match &req.title {
        None => errors.push("title is required".to_string()),
        Some(title) => check_title(title, &mut errors),
    }

    if let Some(description) = &req.description {
        check_description(description, &mut errors);
    }

    if let Some(status) = &req.status {
        check_status(status, &mut errors);
    }

    if let Some(priority) = &req.priority {
        check_priority(priority, &mut errors);
    }

    if let Some(parent_id) = req.parent_id {
        check_parent_id(parent_id, &mut errors);
    }

    errors
}

/// Validate the fields of an update payload. Every field is optional;
/// rejecting a payload with no recognized field at all is the handler's
/// job, as an empty update rather than a field violation.
pub fn validate_update(req: &UpdateTaskRequest) -> Vec<String> {
    let mut errors = Vec::new();

    if let Some(title) = &req.title {
        check_title(title, &mut errors);
    }

    if let Some(Some(description)) = &req.description {
        check_description(description, &mut errors);
    }

    if let Some(status) = &req.status {
        check_status(status, &mut errors);
    }

    if let Some(priority) = &req.priority {
        check_priority(priority, &mut errors);
    }

    if let Some(Some(parent_id)) = req.parent_id {
        check_parent_id(parent_id, &mut errors);
    }

    errors
}

/// Trim a description for storage; whitespace-only collapses to `None`.
pub fn normalize_description(description: Option<String>) -> Option<String> {
    description.and_then(|d| {
        let trimmed = d.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn check_title(title: &str, errors: &mut Vec<String>) {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        errors.push("title must not be empty".to_string());
    } else if trimmed.chars().count() > TITLE_MAX {
        errors.push(format!("title must be at most {} characters", TITLE_MAX));
    }
}

fn check_description(description: &str, errors: &mut Vec<String>) {
    if description.chars().count() > DESCRIPTION_MAX {
        errors.push(format!(
            "description must be at most {} characters",
            DESCRIPTION_MAX
        ));
    }
}

fn check_status(status: &str, errors: &mut Vec<String>) {
    if Status::parse(status).is_none() {
        errors.push(format!(
            "status must be one of: {}",
            Status::VALUES.join(", ")
        ));
    }
}

fn check_priority(priority: &str, errors: &mut Vec<String>) {
    if Priority::parse(priority).is_none() {
        errors.push(format!(
            "priority must be one of: {}",
            Priority::VALUES.join(", ")
        ));
    }
}

fn check_parent_id(parent_id: i64, errors: &mut Vec<String>) {
    if parent_id <= 0 {
        errors.push("parent_id must be a positive integer".to_string());
    }
}
