use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::progress::{TaskPriority, TaskStatus};

// The fields the statistics need, mapped from task rows by the route layer
#[derive(Debug, Clone)]
pub struct TaskSnapshot {
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub progress: i32,
    pub due_date: DateTime<Utc>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct StatusBreakdown {
    #[serde(rename = "Pending")]
    pub pending: usize,
    #[serde(rename = "In Progress")]
    pub in_progress: usize,
    #[serde(rename = "Completed")]
    pub completed: usize,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct PriorityBreakdown {
    #[serde(rename = "Low")]
    pub low: usize,
    #[serde(rename = "Medium")]
    pub medium: usize,
    #[serde(rename = "High")]
    pub high: usize,
}

// Dashboard payload; field names are part of the public API
#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatistics {
    pub total_tasks: usize,
    pub status_stats: StatusBreakdown,
    pub priority_stats: PriorityBreakdown,
    pub average_progress: i32,
    pub overdue_tasks: usize,
    pub completion_rate: i32,
}

/// Descriptive statistics over an already-filtered task set. Pure and order
/// independent; rates degrade to 0 on empty input instead of failing.
pub fn compute_statistics(tasks: &[TaskSnapshot], now: DateTime<Utc>) -> TaskStatistics {
    let total_tasks = tasks.len();

    let mut status_stats = StatusBreakdown {
        pending: 0,
        in_progress: 0,
        completed: 0,
    };
    let mut priority_stats = PriorityBreakdown {
        low: 0,
        medium: 0,
        high: 0,
    };
    let mut progress_sum: i64 = 0;
    let mut overdue_tasks = 0;

    for task in tasks {
        match task.status {
            TaskStatus::Pending => status_stats.pending += 1,
            TaskStatus::InProgress => status_stats.in_progress += 1,
            TaskStatus::Completed => status_stats.completed += 1,
        }
        match task.priority {
            TaskPriority::Low => priority_stats.low += 1,
            TaskPriority::Medium => priority_stats.medium += 1,
            TaskPriority::High => priority_stats.high += 1,
        }
        progress_sum += task.progress as i64;

        if task.due_date < now && task.status != TaskStatus::Completed {
            overdue_tasks += 1;
        }
    }

    let average_progress = if total_tasks > 0 {
        round_ratio(progress_sum as f64 / total_tasks as f64)
    } else {
        0
    };
    let completion_rate = if total_tasks > 0 {
        round_ratio(status_stats.completed as f64 * 100.0 / total_tasks as f64)
    } else {
        0
    };

    TaskStatistics {
        total_tasks,
        status_stats,
        priority_stats,
        average_progress,
        overdue_tasks,
        completion_rate,
    }
}

// f64::round rounds half away from zero, matching the dashboard numbers
fn round_ratio(value: f64) -> i32 {
    value.round() as i32
}

// EXPORT

pub const EXPORT_COLUMNS: [&str; 9] = [
    "Title",
    "Description",
    "Status",
    "Priority",
    "Progress",
    "Due Date",
    "Created By",
    "Assigned To",
    "Created At",
];

/// A task with user references already resolved to display names
#[derive(Debug, Clone)]
pub struct ExportTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub progress: i32,
    pub due_date: DateTime<Utc>,
    pub created_by: String,
    pub assigned_to: Vec<String>,
    pub created_at: DateTime<Utc>,
}

// Row tag a renderer can use to style completed/in-progress/pending rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowCategory {
    Completed,
    InProgress,
    Pending,
}

impl RowCategory {
    pub fn for_status(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Completed => RowCategory::Completed,
            TaskStatus::InProgress => RowCategory::InProgress,
            TaskStatus::Pending => RowCategory::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub progress: String,
    pub due_date: String,
    pub created_by: String,
    pub assigned_to: String,
    pub created_at: String,
    pub category: RowCategory,
}

impl ExportRow {
    pub fn cells(&self) -> [&str; 9] {
        [
            &self.title,
            &self.description,
            &self.status,
            &self.priority,
            &self.progress,
            &self.due_date,
            &self.created_by,
            &self.assigned_to,
            &self.created_at,
        ]
    }
}

/// One row per task, caller order preserved. Formatting only, no sorting
/// and no arithmetic beyond the percentage suffix.
pub fn export_rows(tasks: &[ExportTask]) -> Vec<ExportRow> {
    tasks
        .iter()
        .map(|task| ExportRow {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            status: task.status.label().to_string(),
            priority: task.priority.label().to_string(),
            progress: format!("{}%", task.progress),
            due_date: task.due_date.format("%Y-%m-%d").to_string(),
            created_by: task.created_by.clone(),
            assigned_to: task.assigned_to.join(", "),
            created_at: task.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            category: RowCategory::for_status(task.status),
        })
        .collect()
}

/// Serialize rows to CSV with a header line. Cells containing commas,
/// quotes or newlines are quoted with doubled inner quotes.
pub fn render_csv(rows: &[ExportRow]) -> String {
    let escape_csv = |cell: &str| {
        if cell.contains(',') || cell.contains('"') || cell.contains('\n') {
            format!("\"{}\"", cell.replace('"', "\"\""))
        } else {
            cell.to_string()
        }
    };

    let mut out = String::new();
    out.push_str(&EXPORT_COLUMNS.join(","));
    out.push('\n');

    for row in rows {
        let line: Vec<String> = row.cells().iter().map(|c| escape_csv(c)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn snapshot(
        status: TaskStatus,
        priority: TaskPriority,
        progress: i32,
        due_date: DateTime<Utc>,
    ) -> TaskSnapshot {
        TaskSnapshot {
            status,
            priority,
            progress,
            due_date,
        }
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_statistics_empty_input() {
        let stats = compute_statistics(&[], day(15));

        assert_eq!(stats.total_tasks, 0);
        assert_eq!(stats.average_progress, 0);
        assert_eq!(stats.completion_rate, 0);
        assert_eq!(stats.overdue_tasks, 0);
        assert_eq!(stats.status_stats.pending, 0);
        assert_eq!(stats.status_stats.in_progress, 0);
        assert_eq!(stats.status_stats.completed, 0);
        assert_eq!(stats.priority_stats.low, 0);
        assert_eq!(stats.priority_stats.medium, 0);
        assert_eq!(stats.priority_stats.high, 0);
    }

    #[test]
    fn test_statistics_two_task_example() {
        // Completed/High/100 due yesterday, Pending/Low/0 due tomorrow
        let tasks = vec![
            snapshot(TaskStatus::Completed, TaskPriority::High, 100, day(14)),
            snapshot(TaskStatus::Pending, TaskPriority::Low, 0, day(16)),
        ];
        let stats = compute_statistics(&tasks, day(15));

        assert_eq!(stats.total_tasks, 2);
        assert_eq!(stats.status_stats.pending, 1);
        assert_eq!(stats.status_stats.in_progress, 0);
        assert_eq!(stats.status_stats.completed, 1);
        assert_eq!(stats.priority_stats.high, 1);
        assert_eq!(stats.priority_stats.low, 1);
        assert_eq!(stats.average_progress, 50);
        // the completed task is past due but completed tasks are never overdue
        assert_eq!(stats.overdue_tasks, 0);
        assert_eq!(stats.completion_rate, 50);
    }

    #[test]
    fn test_overdue_counting() {
        let tasks = vec![
            snapshot(TaskStatus::Pending, TaskPriority::Medium, 0, day(10)),
            snapshot(TaskStatus::InProgress, TaskPriority::Medium, 40, day(10)),
            snapshot(TaskStatus::Completed, TaskPriority::Medium, 100, day(10)),
            snapshot(TaskStatus::Pending, TaskPriority::Medium, 0, day(20)),
        ];
        let stats = compute_statistics(&tasks, day(15));

        assert_eq!(stats.overdue_tasks, 2);
    }

    #[test]
    fn test_statistics_rounding() {
        // progress 33 + 33 + 34 -> average 33.33 -> 33; 1 of 3 completed -> 33
        let tasks = vec![
            snapshot(TaskStatus::InProgress, TaskPriority::Low, 33, day(20)),
            snapshot(TaskStatus::InProgress, TaskPriority::Low, 33, day(20)),
            snapshot(TaskStatus::Completed, TaskPriority::Low, 34, day(20)),
        ];
        let stats = compute_statistics(&tasks, day(15));

        assert_eq!(stats.average_progress, 33);
        assert_eq!(stats.completion_rate, 33);
    }

    #[test]
    fn test_statistics_order_independent() {
        let mut tasks = vec![
            snapshot(TaskStatus::Completed, TaskPriority::High, 100, day(10)),
            snapshot(TaskStatus::Pending, TaskPriority::Low, 0, day(20)),
            snapshot(TaskStatus::InProgress, TaskPriority::Medium, 60, day(12)),
        ];
        let forward = compute_statistics(&tasks, day(15));
        tasks.reverse();
        let backward = compute_statistics(&tasks, day(15));

        assert_eq!(forward, backward);
    }

    fn export_task(title: &str, status: TaskStatus) -> ExportTask {
        ExportTask {
            title: title.to_string(),
            description: Some("desc".to_string()),
            status,
            priority: TaskPriority::Medium,
            progress: 57,
            due_date: day(20),
            created_by: "Alice".to_string(),
            assigned_to: vec!["Bob".to_string(), "Carol".to_string()],
            created_at: day(10),
        }
    }

    #[test]
    fn test_export_rows_shape_and_order() {
        let tasks = vec![
            export_task("first", TaskStatus::Pending),
            export_task("second", TaskStatus::Completed),
            export_task("third", TaskStatus::InProgress),
        ];
        let rows = export_rows(&tasks);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].title, "first");
        assert_eq!(rows[1].title, "second");
        assert_eq!(rows[2].title, "third");

        assert_eq!(rows[0].category, RowCategory::Pending);
        assert_eq!(rows[1].category, RowCategory::Completed);
        assert_eq!(rows[2].category, RowCategory::InProgress);

        assert_eq!(rows[0].cells().len(), EXPORT_COLUMNS.len());
        assert_eq!(rows[0].progress, "57%");
        assert_eq!(rows[0].status, "Pending");
        assert_eq!(rows[0].assigned_to, "Bob, Carol");
        assert_eq!(rows[0].due_date, "2025-06-20");
        assert_eq!(rows[0].created_at, "2025-06-10 12:00:00");
    }

    #[test]
    fn test_export_row_missing_description() {
        let mut task = export_task("bare", TaskStatus::Pending);
        task.description = None;
        let rows = export_rows(&[task]);

        assert_eq!(rows[0].description, "");
    }

    #[test]
    fn test_render_csv_escaping() {
        let mut task = export_task("hello, world", TaskStatus::Pending);
        task.description = Some("say \"hi\"".to_string());
        let csv = render_csv(&export_rows(&[task]));

        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), EXPORT_COLUMNS.join(","));

        let row = lines.next().unwrap();
        assert!(row.starts_with("\"hello, world\",\"say \"\"hi\"\"\","));
        // assignee list is comma-joined, so it must be quoted
        assert!(row.contains("\"Bob, Carol\""));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_render_csv_header_only_when_empty() {
        let csv = render_csv(&[]);
        assert_eq!(csv, format!("{}\n", EXPORT_COLUMNS.join(",")));
    }
}
