//! Core types for the taskdeck service.

use serde::{Deserialize, Serialize};

/// Task completion status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Completed,
}

impl Status {
    pub const VALUES: &'static [&'static str] = &["pending", "completed"];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Completed => "completed",
        }
    }

    /// Parse a status string. Returns `None` for unrecognized values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Status::Pending),
            "completed" => Some(Status::Completed),
            _ => None,
        }
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const VALUES: &'static [&'static str] = &["low", "medium", "high"];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Parse a priority string. Returns `None` for unrecognized values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

/// A to-do item, optionally nested under a parent task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    pub parent_id: Option<i64>,
    /// Creation time in epoch milliseconds, assigned by the store.
    pub created_at: i64,
    /// Direct children ordered by creation time. Populated only when a
    /// single task is fetched by id; `None` elsewhere.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtasks: Option<Vec<Task>>,
}

/// Validated, defaulted fields for a task insert.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    pub parent_id: Option<i64>,
}

/// Partial update for an existing task. `None` means "leave unchanged";
/// the inner `Option` on nullable columns distinguishes "set" from "clear".
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub parent_id: Option<Option<i64>>,
}

/// Parent filter for task listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentFilter {
    /// Only tasks with a null parent (the `parent_id=null` sentinel).
    TopLevel,
    /// Only direct children of the given task.
    Child(i64),
}

/// Filters for listing tasks. Absent fields apply no filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskFilters {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub parent: Option<ParentFilter>,
}

/// Create-task request body. Status and priority arrive as plain strings so
/// membership violations become aggregated validation messages instead of
/// deserialization failures.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub parent_id: Option<i64>,
}

/// Update-task request body. Double options keep absent and explicit-null
/// distinguishable for the nullable columns.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<i64>>,
}

impl UpdateTaskRequest {
    /// True when no recognized field is present in the payload.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.parent_id.is_none()
    }
}

/// Breakdown request body: exactly one of `taskId` / `taskTitle`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownRequest {
    pub task_id: Option<i64>,
    pub task_title: Option<String>,
}

/// Response payload for DELETE /tasks/{id}.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub deleted: Task,
}

/// JSON envelope wrapped around every API response.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Deserialize a field so that an absent key stays `None` while an explicit
/// JSON null becomes `Some(None)`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trip() {
        for s in Status::VALUES {
            assert_eq!(Status::parse(s).unwrap().as_str(), *s);
        }
        assert!(Status::parse("archived").is_none());
    }

    #[test]
    fn priority_round_trip() {
        for p in Priority::VALUES {
            assert_eq!(Priority::parse(p).unwrap().as_str(), *p);
        }
        assert!(Priority::parse("urgent").is_none());
    }

    #[test]
    fn update_request_distinguishes_null_from_absent() {
        let req: UpdateTaskRequest = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(req.description, Some(None));
        assert!(!req.is_empty());

        let req: UpdateTaskRequest = serde_json::from_str(r#"{}"#).unwrap();
        assert!(req.description.is_none());
        assert!(req.is_empty());
    }

    #[test]
    fn breakdown_request_uses_camel_case() {
        let req: BreakdownRequest = serde_json::from_str(r#"{"taskId": 7}"#).unwrap();
        assert_eq!(req.task_id, Some(7));
        assert!(req.task_title.is_none());
    }
}
