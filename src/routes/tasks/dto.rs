use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::progress::{ChecklistItem, TaskPriority, TaskStatus};

// Status and progress are never accepted from clients: status is always
// derived from progress, and progress only moves through the progress
// and checklist endpoints.

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub due_date: DateTime<Utc>,
    pub assigned_to: Option<Vec<Uuid>>,
    pub attachments: Option<Vec<String>>,
    pub todo_checklist: Option<Vec<ChecklistItem>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to: Option<Vec<Uuid>>,
    pub attachments: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct UpdateProgress {
    pub progress: i32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChecklist {
    pub todo_checklist: Vec<ChecklistItem>,
}

// Recognized list filters, one field per filter
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListParams {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
