//! Event log reader: forward paging, full replay, and the aggregates built on it.
//!
//! Every call is total. A failing backend is logged and read as an empty log,
//! so views built on top keep rendering while the engine is partly down.
//!
//! All aggregates replay the whole log (O(log length) per call). There is no
//! incremental index: each refresh recomputes from the source of truth.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;

use tracing::{debug, warn};

use super::backend::EventLogBackend;
use super::cursor::Cursor;
use crate::event::{classify, Event, KindTag};

/// Page size used by [`EventReader::replay_all`]
pub const REPLAY_PAGE_SIZE: usize = 500;

/// Read-only view over an event log backend
#[derive(Clone)]
pub struct EventReader {
    backend: Arc<dyn EventLogBackend>,
}

impl EventReader {
    pub fn new(backend: Arc<dyn EventLogBackend>) -> Self {
        Self { backend }
    }

    /// Cursor preceding all events, or [`Cursor::INERT`] if the backend is down
    pub fn origin(&self) -> Cursor {
        match self.backend.origin() {
            Ok(cursor) => cursor,
            Err(e) => {
                warn!(error = %e, "event log origin unavailable");
                Cursor::INERT
            }
        }
    }

    /// At most `limit` events strictly after `cursor`, plus the cursor that
    /// follows the last one returned. Errors read as an empty page with
    /// `cursor` echoed back.
    pub fn fetch(&self, cursor: Cursor, limit: usize) -> (Vec<Event>, Cursor) {
        if cursor.is_inert() || limit == 0 {
            return (Vec::new(), cursor);
        }
        match self.backend.fetch(cursor, limit) {
            Ok((events, _)) if events.is_empty() => (events, cursor),
            Ok(page) => page,
            Err(e) => {
                warn!(cursor = %cursor, error = %e, "event log fetch failed");
                (Vec::new(), cursor)
            }
        }
    }

    /// Every event after `cursor`, fetched in pages of [`REPLAY_PAGE_SIZE`]
    /// until an empty page.
    pub fn replay_all(&self, cursor: Cursor) -> Vec<Event> {
        let mut all = Vec::new();
        let mut cursor = cursor;
        loop {
            let (page, next) = self.fetch(cursor, REPLAY_PAGE_SIZE);
            if page.is_empty() {
                break;
            }
            all.extend(page);
            cursor = next;
        }
        debug!(events = all.len(), "replayed event log");
        all
    }

    /// The last `n` events, oldest first.
    ///
    /// The backend only pages forward, so this replays the whole log keeping
    /// a trailing window: cost tracks log length, not `n`.
    pub fn recent(&self, n: usize) -> Vec<Event> {
        if n == 0 {
            return Vec::new();
        }
        let mut window: VecDeque<Event> = VecDeque::with_capacity(n.min(REPLAY_PAGE_SIZE));
        let mut cursor = self.origin();
        loop {
            let (page, next) = self.fetch(cursor, REPLAY_PAGE_SIZE);
            if page.is_empty() {
                break;
            }
            for event in page {
                if window.len() == n {
                    window.pop_front();
                }
                window.push_back(event);
            }
            cursor = next;
        }
        window.into()
    }

    /// All events of one workflow, in log order
    pub fn workflow_events(&self, workflow_id: &str) -> Vec<Event> {
        self.replay_all(self.origin())
            .into_iter()
            .filter(|e| e.workflow_id == workflow_id)
            .collect()
    }

    /// Workflow ids in order of first appearance
    pub fn workflow_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.replay_all(self.origin())
            .into_iter()
            .filter_map(|e| seen.insert(e.workflow_id.clone()).then_some(e.workflow_id))
            .collect()
    }

    /// Event count per classified kind across the whole log
    pub fn kind_counts(&self) -> BTreeMap<KindTag, usize> {
        let mut counts = BTreeMap::new();
        for event in self.replay_all(self.origin()) {
            *counts.entry(classify(&event)).or_insert(0) += 1;
        }
        counts
    }
}

impl std::fmt::Debug for EventReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventReader").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, ScopeError};
    use crate::event::EventKind;
    use crate::log::MemoryEventLog;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ev(workflow: &str, task: &str, kind: EventKind) -> Event {
        Event::task(workflow, task, kind)
    }

    fn reader_over(events: Vec<Event>) -> EventReader {
        EventReader::new(Arc::new(MemoryEventLog::from_events(events)))
    }

    /// Backend that is always down
    struct DownLog;

    impl EventLogBackend for DownLog {
        fn origin(&self) -> Result<Cursor> {
            Err(ScopeError::EventLogUnavailable {
                path: "down".into(),
                reason: "connection refused".into(),
            })
        }

        fn fetch(&self, _after: Cursor, _limit: usize) -> Result<(Vec<Event>, Cursor)> {
            Err(ScopeError::EventLogUnavailable {
                path: "down".into(),
                reason: "connection refused".into(),
            })
        }
    }

    /// Counts fetch calls to check replay paging
    struct CountingLog {
        inner: MemoryEventLog,
        fetches: AtomicUsize,
    }

    impl EventLogBackend for CountingLog {
        fn origin(&self) -> Result<Cursor> {
            self.inner.origin()
        }

        fn fetch(&self, after: Cursor, limit: usize) -> Result<(Vec<Event>, Cursor)> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            assert_eq!(limit, REPLAY_PAGE_SIZE);
            self.inner.fetch(after, limit)
        }
    }

    // ═══════════════════════════════════════════════════════════════
    // Degradation
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn down_backend_degrades_to_empty() {
        let reader = EventReader::new(Arc::new(DownLog));
        assert!(reader.origin().is_inert());

        let (events, next) = reader.fetch(Cursor::at(3), 10);
        assert!(events.is_empty());
        assert_eq!(next, Cursor::at(3));

        assert!(reader.replay_all(Cursor::ORIGIN).is_empty());
        assert!(reader.recent(5).is_empty());
        assert!(reader.workflow_ids().is_empty());
        assert!(reader.kind_counts().is_empty());
    }

    // ═══════════════════════════════════════════════════════════════
    // fetch / replay
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn fetch_zero_limit_returns_nothing() {
        let reader = reader_over(vec![ev("w", "a", EventKind::Pending)]);
        let (events, next) = reader.fetch(Cursor::ORIGIN, 0);
        assert!(events.is_empty());
        assert_eq!(next, Cursor::ORIGIN);
    }

    #[test]
    fn replay_pages_until_empty() {
        let events: Vec<Event> = (0..1_203)
            .map(|i| ev("w", &format!("t{i}"), EventKind::Pending))
            .collect();
        let backend = Arc::new(CountingLog {
            inner: MemoryEventLog::from_events(events.clone()),
            fetches: AtomicUsize::new(0),
        });
        let reader = EventReader::new(backend.clone());

        let replayed = reader.replay_all(reader.origin());
        assert_eq!(replayed, events);
        // 500 + 500 + 203 + final empty page
        assert_eq!(backend.fetches.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn replay_from_mid_cursor_skips_prefix() {
        let events: Vec<Event> = (0..10)
            .map(|i| ev("w", &format!("t{i}"), EventKind::Pending))
            .collect();
        let reader = reader_over(events.clone());
        let (_, after_four) = reader.fetch(Cursor::ORIGIN, 4);
        assert_eq!(reader.replay_all(after_four), events[4..].to_vec());
    }

    // ═══════════════════════════════════════════════════════════════
    // recent / aggregates
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn recent_keeps_trailing_window() {
        let events: Vec<Event> = (0..20)
            .map(|i| ev("w", &format!("t{i}"), EventKind::Pending))
            .collect();
        let reader = reader_over(events.clone());

        assert_eq!(reader.recent(3), events[17..].to_vec());
        assert_eq!(reader.recent(100), events);
        assert!(reader.recent(0).is_empty());
    }

    #[test]
    fn workflow_ids_in_first_seen_order() {
        let reader = reader_over(vec![
            ev("beta", "a", EventKind::Pending),
            ev("alpha", "a", EventKind::Pending),
            ev("beta", "b", EventKind::Pending),
        ]);
        assert_eq!(reader.workflow_ids(), vec!["beta", "alpha"]);
    }

    #[test]
    fn workflow_events_preserve_order() {
        let reader = reader_over(vec![
            ev("w1", "a", EventKind::Started { agent_ids: vec![] }),
            ev("w2", "a", EventKind::Pending),
            ev(
                "w1",
                "a",
                EventKind::Completed {
                    attempt: 1,
                    result: json!(1),
                },
            ),
        ]);
        let w1 = reader.workflow_events("w1");
        assert_eq!(w1.len(), 2);
        assert!(matches!(w1[0].kind, EventKind::Started { .. }));
        assert!(matches!(w1[1].kind, EventKind::Completed { .. }));
        assert!(reader.workflow_events("nope").is_empty());
    }

    #[test]
    fn kind_counts_use_classifier() {
        let reader = reader_over(vec![
            ev("w", "a", EventKind::Pending),
            ev("w", "b", EventKind::Pending),
            ev("w", "a", EventKind::other("TaskCompleted")),
            ev("w", "a", EventKind::other("Heartbeat")),
        ]);
        let counts = reader.kind_counts();
        assert_eq!(counts[&KindTag::Pending], 2);
        assert_eq!(counts[&KindTag::Completed], 1);
        assert_eq!(counts[&KindTag::Other("heartbeat".into())], 1);
    }
}
