//! Event classifier: heterogeneous records → canonical kind tags.
//!
//! Total function. Records the tool has no variant for are classified from
//! their declared kind name, so `TaskCompleted`, `COMPLETED` and
//! `completed_event` from different producers all read as `completed`.

use std::fmt;

use serde::{Serialize, Serializer};

use super::record::{Event, EventKind};

/// Canonical display tag for an event
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KindTag {
    Ready,
    Started,
    Completed,
    Failed,
    Pending,
    Preempted,
    Progress,
    /// Derived from an unknown kind's declared name (normalized)
    Other(String),
}

impl KindTag {
    pub const CANONICAL: [KindTag; 7] = [
        KindTag::Ready,
        KindTag::Started,
        KindTag::Completed,
        KindTag::Failed,
        KindTag::Pending,
        KindTag::Preempted,
        KindTag::Progress,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            KindTag::Ready => "ready",
            KindTag::Started => "started",
            KindTag::Completed => "completed",
            KindTag::Failed => "failed",
            KindTag::Pending => "pending",
            KindTag::Preempted => "preempted",
            KindTag::Progress => "progress",
            KindTag::Other(name) => name.as_str(),
        }
    }

    fn from_canonical(name: &str) -> Option<Self> {
        Self::CANONICAL.into_iter().find(|tag| tag.as_str() == name)
    }
}

impl fmt::Display for KindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for KindTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Classify an event. Never fails.
pub fn classify(event: &Event) -> KindTag {
    classify_kind(&event.kind)
}

/// Classify a bare kind (no envelope needed)
pub fn classify_kind(kind: &EventKind) -> KindTag {
    match kind {
        EventKind::Ready { .. } => KindTag::Ready,
        EventKind::Started { .. } => KindTag::Started,
        EventKind::Completed { .. } => KindTag::Completed,
        EventKind::Failed { .. } => KindTag::Failed,
        EventKind::Pending => KindTag::Pending,
        EventKind::Preempted => KindTag::Preempted,
        EventKind::Progress { .. } => KindTag::Progress,
        EventKind::Other(raw) => tag_from_declared(&raw.declared),
    }
}

fn tag_from_declared(declared: &str) -> KindTag {
    let name = normalize(declared);
    if name.is_empty() {
        return KindTag::Other("unknown".to_string());
    }
    KindTag::from_canonical(&name).unwrap_or(KindTag::Other(name))
}

/// `TaskCompleted` / `task-completed` / `COMPLETED_EVENT` → `completed`
fn normalize(declared: &str) -> String {
    let mut snake = String::with_capacity(declared.len() + 4);
    let mut prev_lower = false;
    for ch in declared.trim().chars() {
        if ch.is_ascii_uppercase() {
            if prev_lower {
                snake.push('_');
            }
            snake.push(ch.to_ascii_lowercase());
            prev_lower = false;
        } else if ch.is_alphanumeric() {
            snake.push(ch);
            prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        } else {
            // '-', ' ', '.', ':' and friends
            snake.push('_');
            prev_lower = false;
        }
    }

    let mut name = snake.trim_matches('_');
    name = name.strip_prefix("task_").unwrap_or(name);
    name = name.strip_suffix("_event").unwrap_or(name);
    name.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(kind: EventKind) -> Event {
        Event::task("wf", "t1", kind)
    }

    #[test]
    fn known_kinds_map_to_their_tags() {
        let cases = [
            (
                EventKind::Ready {
                    module: "etl.load".into(),
                    payload: json!({}),
                },
                "ready",
            ),
            (EventKind::Started { agent_ids: vec![] }, "started"),
            (
                EventKind::Completed {
                    attempt: 1,
                    result: json!(null),
                },
                "completed",
            ),
            (
                EventKind::Failed {
                    attempt: 1,
                    reason: json!("boom"),
                    retriable: false,
                },
                "failed",
            ),
            (EventKind::Pending, "pending"),
            (EventKind::Preempted, "preempted"),
            (EventKind::Progress { progress: json!(0.5) }, "progress"),
        ];

        for (kind, expected) in cases {
            assert_eq!(classify(&event(kind)).as_str(), expected);
        }
    }

    #[test]
    fn heterogeneous_names_collapse_to_canonical() {
        for declared in ["TaskCompleted", "COMPLETED", "completed_event", "task-completed"] {
            assert_eq!(
                classify(&event(EventKind::other(declared))),
                KindTag::Completed,
                "{declared}"
            );
        }
        assert_eq!(
            classify(&event(EventKind::other("TaskStartedEvent"))),
            KindTag::Started
        );
    }

    #[test]
    fn unknown_names_fall_back_to_derived_tag() {
        let tag = classify(&event(EventKind::other("RetryScheduled")));
        assert_eq!(tag, KindTag::Other("retry_scheduled".into()));
        assert_eq!(tag.to_string(), "retry_scheduled");
    }

    #[test]
    fn empty_declared_name_is_unknown() {
        assert_eq!(
            classify(&event(EventKind::other("  "))),
            KindTag::Other("unknown".into())
        );
    }

    #[test]
    fn classification_is_idempotent() {
        let e = event(EventKind::other("Task.Heartbeat"));
        assert_eq!(classify(&e), classify(&e));
        assert_eq!(classify(&e).as_str(), "heartbeat");
    }
}
