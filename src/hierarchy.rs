//! Hierarchy guard: parent/child integrity rules for reparenting.
//!
//! The task forest must stay acyclic. A reparent is checked by walking the
//! candidate parent's ancestor chain toward the root; encountering the task
//! being updated means the assignment would close a loop. The walk is
//! bounded so corrupted data cannot spin it forever.

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::ApiError;

/// Upper bound on the ancestor walk. Anything deeper than this is treated
/// as corrupted hierarchy data.
pub const MAX_ANCESTOR_DEPTH: usize = 64;

/// Check that a candidate parent exists. Used on create, where the new row
/// has no id yet and cannot introduce a cycle.
pub fn check_create_parent(conn: &Connection, parent_id: i64) -> Result<(), ApiError> {
    if !task_exists(conn, parent_id)? {
        return Err(ApiError::invalid_parent(parent_id));
    }
    Ok(())
}

/// Decide whether assigning `parent_id` to `task_id` is legal.
pub fn check_reparent(conn: &Connection, task_id: i64, parent_id: i64) -> Result<(), ApiError> {
    if parent_id == task_id {
        return Err(ApiError::self_parent(task_id));
    }

    if !task_exists(conn, parent_id)? {
        return Err(ApiError::invalid_parent(parent_id));
    }

    // Walk from the candidate parent to the root. Seeing task_id anywhere
    // on the chain means the new edge would close a cycle.
    let mut current = parent_id;
    for _ in 0..MAX_ANCESTOR_DEPTH {
        match get_parent_id(conn, current)? {
            None => return Ok(()),
            Some(ancestor) if ancestor == task_id => {
                return Err(ApiError::cycle(task_id, parent_id));
            }
            Some(ancestor) => current = ancestor,
        }
    }

    Err(ApiError::internal(format!(
        "ancestor chain of task {} exceeds {} levels",
        parent_id, MAX_ANCESTOR_DEPTH
    )))
}

fn task_exists(conn: &Connection, task_id: i64) -> Result<bool, ApiError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?1)",
        params![task_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn get_parent_id(conn: &Connection, task_id: i64) -> Result<Option<i64>, ApiError> {
    let parent: Option<Option<i64>> = conn
        .query_row(
            "SELECT parent_id FROM tasks WHERE id = ?1",
            params![task_id],
            |row| row.get(0),
        )
        .optional()?;

    // A missing row mid-walk reads as a chain end rather than an error;
    // the foreign key keeps this from happening outside of races.
    Ok(parent.flatten())
}
