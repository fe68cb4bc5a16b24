//! Workflow status rollup from per-task event histories.
//!
//! Per task (over the set of classified kinds seen):
//!   completed > failed > started (running) > pending
//! so a retried task that eventually completes reads as completed.
//!
//! Per workflow (over task statuses):
//!   any running → running; else any failed → failed;
//!   else all completed → completed; else pending.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::event::{classify, Event, KindTag};

/// Derived status of a workflow (also used per task)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

pub type TaskStatus = WorkflowStatus;

impl WorkflowStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStatus::Pending => "pending",
            WorkflowStatus::Running => "running",
            WorkflowStatus::Completed => "completed",
            WorkflowStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-task rollup for the workflow detail view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSummary {
    pub task_id: String,
    pub status: TaskStatus,
    /// Highest attempt number seen on a completion/failure (0 if none)
    pub attempts: u32,
    pub events: usize,
    /// Classified kind of the task's latest event
    pub last: KindTag,
}

/// Status of one task from the kinds seen for it
pub fn task_status(seen: &HashSet<KindTag>) -> TaskStatus {
    if seen.contains(&KindTag::Completed) {
        WorkflowStatus::Completed
    } else if seen.contains(&KindTag::Failed) {
        WorkflowStatus::Failed
    } else if seen.contains(&KindTag::Started) {
        WorkflowStatus::Running
    } else {
        WorkflowStatus::Pending
    }
}

/// Events grouped by task id, tasks in first-seen order.
/// Events without a task id are left out.
fn group_by_task(events: &[Event]) -> Vec<(&str, Vec<&Event>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&Event>)> = Vec::new();
    for event in events {
        let Some(task_id) = event.task_id.as_deref() else {
            continue;
        };
        let slot = *index.entry(task_id).or_insert_with(|| {
            groups.push((task_id, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(event);
    }
    groups
}

/// Status of every task, in first-seen order
pub fn task_statuses(events: &[Event]) -> Vec<(String, TaskStatus)> {
    group_by_task(events)
        .into_iter()
        .map(|(task_id, events)| {
            let seen: HashSet<KindTag> = events.iter().map(|e| classify(e)).collect();
            (task_id.to_string(), task_status(&seen))
        })
        .collect()
}

/// Roll a workflow's events up into one status
pub fn workflow_status(events: &[Event]) -> WorkflowStatus {
    let statuses: Vec<TaskStatus> = task_statuses(events).into_iter().map(|(_, s)| s).collect();

    if statuses.contains(&WorkflowStatus::Running) {
        WorkflowStatus::Running
    } else if statuses.contains(&WorkflowStatus::Failed) {
        WorkflowStatus::Failed
    } else if !statuses.is_empty() && statuses.iter().all(|s| *s == WorkflowStatus::Completed) {
        WorkflowStatus::Completed
    } else {
        WorkflowStatus::Pending
    }
}

/// Per-task detail rows, in first-seen order
pub fn task_summaries(events: &[Event]) -> Vec<TaskSummary> {
    group_by_task(events)
        .into_iter()
        .filter_map(|(task_id, events)| {
            let last = events.last().map(|e| classify(e))?;
            let seen: HashSet<KindTag> = events.iter().map(|e| classify(e)).collect();
            let attempts = events
                .iter()
                .filter_map(|e| e.kind.attempt())
                .max()
                .unwrap_or(0);
            Some(TaskSummary {
                task_id: task_id.to_string(),
                status: task_status(&seen),
                attempts,
                events: events.len(),
                last,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use serde_json::json;

    fn ready() -> EventKind {
        EventKind::Ready {
            module: "m".into(),
            payload: json!({}),
        }
    }

    fn started() -> EventKind {
        EventKind::Started {
            agent_ids: vec!["agent-1".into()],
        }
    }

    fn completed(attempt: u32) -> EventKind {
        EventKind::Completed {
            attempt,
            result: json!("ok"),
        }
    }

    fn failed(attempt: u32) -> EventKind {
        EventKind::Failed {
            attempt,
            reason: json!("boom"),
            retriable: true,
        }
    }

    fn history(task: &str, kinds: Vec<EventKind>) -> Vec<Event> {
        kinds
            .into_iter()
            .map(|k| Event::task("wf", task, k))
            .collect()
    }

    // ═══════════════════════════════════════════════════════════════
    // Per-task precedence
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn retried_task_that_completes_is_completed() {
        let events = history(
            "t",
            vec![ready(), started(), failed(1), ready(), started(), completed(2)],
        );
        assert_eq!(workflow_status(&events), WorkflowStatus::Completed);
    }

    #[test]
    fn task_precedence_order() {
        let set = |tags: &[KindTag]| tags.iter().cloned().collect::<HashSet<_>>();
        assert_eq!(task_status(&set(&[])), WorkflowStatus::Pending);
        assert_eq!(
            task_status(&set(&[KindTag::Ready, KindTag::Preempted])),
            WorkflowStatus::Pending
        );
        assert_eq!(
            task_status(&set(&[KindTag::Ready, KindTag::Started])),
            WorkflowStatus::Running
        );
        assert_eq!(
            task_status(&set(&[KindTag::Started, KindTag::Failed])),
            WorkflowStatus::Failed
        );
        assert_eq!(
            task_status(&set(&[KindTag::Failed, KindTag::Completed])),
            WorkflowStatus::Completed
        );
    }

    // ═══════════════════════════════════════════════════════════════
    // Workflow rollup
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn no_events_is_pending() {
        assert_eq!(workflow_status(&[]), WorkflowStatus::Pending);
    }

    #[test]
    fn running_task_beats_completed_task() {
        let mut events = history("a", vec![ready(), started(), completed(1)]);
        events.extend(history("b", vec![ready(), started()]));
        assert_eq!(workflow_status(&events), WorkflowStatus::Running);
    }

    #[test]
    fn failed_task_beats_completed_task() {
        let mut events = history("a", vec![completed(1)]);
        events.extend(history("b", vec![started(), failed(1)]));
        assert_eq!(workflow_status(&events), WorkflowStatus::Failed);
    }

    #[test]
    fn all_completed_is_completed() {
        let mut events = history("a", vec![completed(1)]);
        events.extend(history("b", vec![completed(3)]));
        assert_eq!(workflow_status(&events), WorkflowStatus::Completed);
    }

    #[test]
    fn completed_and_pending_is_pending() {
        let mut events = history("a", vec![completed(1)]);
        events.extend(history("b", vec![ready()]));
        assert_eq!(workflow_status(&events), WorkflowStatus::Pending);
    }

    #[test]
    fn events_without_task_id_are_ignored() {
        let events = vec![
            Event::new("wf", None, started()),
            Event::new("wf", None, failed(1)),
        ];
        assert_eq!(workflow_status(&events), WorkflowStatus::Pending);

        let mut events = events;
        events.extend(history("a", vec![completed(1)]));
        assert_eq!(workflow_status(&events), WorkflowStatus::Completed);
    }

    #[test]
    fn unrecognized_kinds_count_through_classifier() {
        let events = history("a", vec![EventKind::other("TaskStarted")]);
        assert_eq!(workflow_status(&events), WorkflowStatus::Running);
    }

    #[test]
    fn rollup_is_idempotent() {
        let mut events = history("a", vec![started(), failed(1)]);
        events.extend(history("b", vec![completed(1)]));
        assert_eq!(workflow_status(&events), workflow_status(&events));
    }

    // ═══════════════════════════════════════════════════════════════
    // Summaries
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn summaries_track_attempts_and_order() {
        let mut events = history("load", vec![ready(), started(), failed(1), started()]);
        events.extend(history("extract", vec![ready(), started(), completed(1)]));
        events.push(Event::task("wf", "load", failed(2)));

        let summaries = task_summaries(&events);
        assert_eq!(summaries.len(), 2);

        assert_eq!(summaries[0].task_id, "load");
        assert_eq!(summaries[0].status, WorkflowStatus::Failed);
        assert_eq!(summaries[0].attempts, 2);
        assert_eq!(summaries[0].events, 5);
        assert_eq!(summaries[0].last, KindTag::Failed);

        assert_eq!(summaries[1].task_id, "extract");
        assert_eq!(summaries[1].status, WorkflowStatus::Completed);
        assert_eq!(summaries[1].attempts, 1);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&WorkflowStatus::Running).unwrap(),
            "\"running\""
        );
        assert_eq!(WorkflowStatus::Failed.to_string(), "failed");
    }
}
