//! Task CRUD and hierarchy queries.

use super::{Database, now_ms};
use crate::types::{
    NewTask, ParentFilter, Priority, Status, Task, TaskChanges, TaskFilters,
};
use anyhow::Result;
use rusqlite::{Connection, Row, params};

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let id: i64 = row.get("id")?;
    let title: String = row.get("title")?;
    let description: Option<String> = row.get("description")?;
    let status: String = row.get("status")?;
    let priority: String = row.get("priority")?;
    let parent_id: Option<i64> = row.get("parent_id")?;
    let created_at: i64 = row.get("created_at")?;

    Ok(Task {
        id,
        title,
        description,
        // CHECK constraints keep these columns in range; tolerate drift anyway.
        status: Status::parse(&status).unwrap_or_default(),
        priority: Priority::parse(&priority).unwrap_or_default(),
        parent_id,
        created_at,
        subtasks: None,
    })
}

/// Internal helper to get a task using an existing connection (avoids deadlock).
pub(crate) fn get_task_internal(conn: &Connection, task_id: i64) -> Result<Option<Task>> {
    let mut stmt = conn.prepare("SELECT * FROM tasks WHERE id = ?1")?;

    let result = stmt.query_row(params![task_id], parse_task_row);

    match result {
        Ok(task) => Ok(Some(task)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Insert one row and return it with the store-assigned id.
fn insert_task_internal(conn: &Connection, fields: &NewTask) -> Result<Task> {
    let now = now_ms();

    conn.execute(
        "INSERT INTO tasks (title, description, status, priority, parent_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            &fields.title,
            &fields.description,
            fields.status.as_str(),
            fields.priority.as_str(),
            fields.parent_id,
            now,
        ],
    )?;

    Ok(Task {
        id: conn.last_insert_rowid(),
        title: fields.title.clone(),
        description: fields.description.clone(),
        status: fields.status,
        priority: fields.priority,
        parent_id: fields.parent_id,
        created_at: now,
        subtasks: None,
    })
}

impl Database {
    /// Create a new task from validated fields.
    pub fn create_task(&self, fields: NewTask) -> Result<Task> {
        self.with_conn(|conn| insert_task_internal(conn, &fields))
    }

    /// Get a task by ID.
    pub fn get_task(&self, task_id: i64) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    /// Get a task with its direct children attached, ordered by creation time.
    pub fn get_task_with_subtasks(&self, task_id: i64) -> Result<Option<Task>> {
        self.with_conn(|conn| {
            let Some(mut task) = get_task_internal(conn, task_id)? else {
                return Ok(None);
            };

            let mut stmt = conn.prepare(
                "SELECT * FROM tasks WHERE parent_id = ?1 ORDER BY created_at ASC, id ASC",
            )?;
            let subtasks = stmt
                .query_map(params![task_id], parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            task.subtasks = Some(subtasks);
            Ok(Some(task))
        })
    }

    /// List tasks with optional filters, newest first.
    pub fn list_tasks(&self, filters: &TaskFilters) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut sql = String::from("SELECT * FROM tasks WHERE 1=1");
            let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

            if let Some(status) = filters.status {
                sql.push_str(" AND status = ?");
                params_vec.push(Box::new(status.as_str()));
            }

            if let Some(priority) = filters.priority {
                sql.push_str(" AND priority = ?");
                params_vec.push(Box::new(priority.as_str()));
            }

            match filters.parent {
                Some(ParentFilter::TopLevel) => {
                    sql.push_str(" AND parent_id IS NULL");
                }
                Some(ParentFilter::Child(parent_id)) => {
                    sql.push_str(" AND parent_id = ?");
                    params_vec.push(Box::new(parent_id));
                }
                None => {}
            }

            // Id as tie-break keeps same-millisecond inserts deterministic.
            sql.push_str(" ORDER BY created_at DESC, id DESC");

            let params_refs: Vec<&dyn rusqlite::ToSql> =
                params_vec.iter().map(|b| b.as_ref()).collect();

            let mut stmt = conn.prepare(&sql)?;
            let tasks = stmt
                .query_map(params_refs.as_slice(), parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(tasks)
        })
    }

    /// Apply a partial update. Returns `None` when the task does not exist.
    pub fn update_task(&self, task_id: i64, changes: TaskChanges) -> Result<Option<Task>> {
        self.with_conn(|conn| {
            let Some(task) = get_task_internal(conn, task_id)? else {
                return Ok(None);
            };

            let new_title = changes.title.unwrap_or(task.title);
            let new_description = changes.description.unwrap_or(task.description);
            let new_status = changes.status.unwrap_or(task.status);
            let new_priority = changes.priority.unwrap_or(task.priority);
            let new_parent_id = changes.parent_id.unwrap_or(task.parent_id);

            conn.execute(
                "UPDATE tasks SET
                    title = ?1, description = ?2, status = ?3, priority = ?4, parent_id = ?5
                 WHERE id = ?6",
                params![
                    new_title,
                    new_description,
                    new_status.as_str(),
                    new_priority.as_str(),
                    new_parent_id,
                    task_id,
                ],
            )?;

            Ok(Some(Task {
                id: task_id,
                title: new_title,
                description: new_description,
                status: new_status,
                priority: new_priority,
                parent_id: new_parent_id,
                created_at: task.created_at,
                subtasks: None,
            }))
        })
    }

    /// Delete a task, returning the pre-deletion snapshot. Children are
    /// removed by the store's cascade. Returns `None` when absent.
    pub fn delete_task(&self, task_id: i64) -> Result<Option<Task>> {
        self.with_conn(|conn| {
            let Some(task) = get_task_internal(conn, task_id)? else {
                return Ok(None);
            };

            conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;

            Ok(Some(task))
        })
    }

    /// Bulk-insert generated subtasks in a single transaction. Each row is
    /// created pending/medium under `parent_id`, with a description noting
    /// the origin title.
    pub fn insert_subtasks(
        &self,
        parent_id: Option<i64>,
        titles: &[String],
        origin: &str,
    ) -> Result<Vec<Task>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut created = Vec::with_capacity(titles.len());
            for title in titles {
                let fields = NewTask {
                    title: title.clone(),
                    description: Some(format!("Generated from breakdown of \"{}\"", origin)),
                    status: Status::Pending,
                    priority: Priority::Medium,
                    parent_id,
                };
                created.push(insert_task_internal(&tx, &fields)?);
            }

            tx.commit()?;
            Ok(created)
        })
    }
}
