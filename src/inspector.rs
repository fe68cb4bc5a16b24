//! Inspector context
//!
//! Bundles the three backends with the view settings and exposes the
//! dashboard reads. Constructed explicitly and passed to whoever renders;
//! there is no process-wide registry.
//!
//! Every view is total: backend errors are logged and read as the empty or
//! absent value, so a partly-down engine still renders.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{ScopeConfig, ViewConfig};
use crate::error::{Result, ScopeError};
use crate::event::{Event, KindTag};
use crate::log::{EventReader, JsonlEventLog, Pager};
use crate::program::{walk, DirProgramStore, MemoryProgramStore, Program, ProgramNode, ProgramStore};
use crate::scheduler::{JsonSchedulerSnapshot, SchedulerSnapshot};
use crate::status::{task_summaries, workflow_status, TaskSummary, WorkflowStatus};

/// One row of the workflow overview
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowSummary {
    pub id: String,
    pub status: WorkflowStatus,
    pub events: usize,
}

/// Everything the detail view shows for one workflow
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowDetail {
    pub id: String,
    pub status: WorkflowStatus,
    pub events: usize,
    pub tasks: Vec<TaskSummary>,
    /// Structure of the stored program, if any
    pub graph: Option<ProgramNode>,
}

impl WorkflowDetail {
    /// Graph rendered with each task's status next to it
    pub fn render_graph(&self) -> Option<String> {
        let statuses: HashMap<&str, WorkflowStatus> = self
            .tasks
            .iter()
            .map(|t| (t.task_id.as_str(), t.status))
            .collect();
        self.graph.as_ref().map(|graph| {
            graph.render_with(|id| statuses.get(id).map(|s| s.to_string()))
        })
    }
}

#[derive(Clone)]
pub struct Inspector {
    reader: EventReader,
    programs: Arc<dyn ProgramStore>,
    scheduler: Option<Arc<dyn SchedulerSnapshot>>,
    view: ViewConfig,
}

impl Inspector {
    pub fn new(reader: EventReader, programs: Arc<dyn ProgramStore>) -> Self {
        Self {
            reader,
            programs,
            scheduler: None,
            view: ViewConfig::default(),
        }
    }

    pub fn with_scheduler(mut self, scheduler: Arc<dyn SchedulerSnapshot>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn with_view(mut self, view: ViewConfig) -> Self {
        self.view = view;
        self
    }

    /// Build file-backed sources from a resolved config.
    ///
    /// The event log is required. Without a program directory every graph
    /// reads as absent; without a scheduler snapshot that view is empty.
    pub fn from_config(config: &ScopeConfig) -> Result<Self> {
        let log_path = config
            .sources
            .event_log
            .as_ref()
            .ok_or(ScopeError::SourceNotConfigured {
                source_name: "event log",
            })?;
        let reader = EventReader::new(Arc::new(JsonlEventLog::new(log_path)));

        let programs: Arc<dyn ProgramStore> = match &config.sources.programs {
            Some(dir) => Arc::new(DirProgramStore::new(dir)),
            None => {
                debug!("no program directory configured; graphs will be empty");
                Arc::new(MemoryProgramStore::new())
            }
        };

        let mut inspector = Self::new(reader, programs).with_view(config.view.clone());
        if let Some(path) = &config.sources.scheduler {
            inspector = inspector.with_scheduler(Arc::new(JsonSchedulerSnapshot::new(path)));
        }
        Ok(inspector)
    }

    pub fn reader(&self) -> &EventReader {
        &self.reader
    }

    pub fn view(&self) -> &ViewConfig {
        &self.view
    }

    /// Pager on the first page, sized from the view config
    pub fn pager(&self) -> Pager {
        Pager::from_origin(&self.reader, self.view.page_size)
    }

    /// The configured trailing window of events
    pub fn recent(&self) -> Vec<Event> {
        self.reader.recent(self.view.recent)
    }

    pub fn kind_counts(&self) -> BTreeMap<KindTag, usize> {
        self.reader.kind_counts()
    }

    /// Stored program for `workflow_id`; absent on any store error
    pub fn program(&self, workflow_id: &str) -> Option<Program> {
        match self.programs.get(workflow_id) {
            Ok(program) => program,
            Err(e) => {
                warn!(workflow_id, error = %e, "program unavailable");
                None
            }
        }
    }

    /// Program structure at the configured depth
    pub fn graph(&self, workflow_id: &str) -> Option<ProgramNode> {
        self.graph_with_depth(workflow_id, self.view.max_depth)
    }

    pub fn graph_with_depth(&self, workflow_id: &str, max_depth: usize) -> Option<ProgramNode> {
        walk(self.program(workflow_id).as_ref(), max_depth)
    }

    pub fn workflow_status(&self, workflow_id: &str) -> WorkflowStatus {
        workflow_status(&self.reader.workflow_events(workflow_id))
    }

    pub fn workflow_detail(&self, workflow_id: &str) -> WorkflowDetail {
        self.workflow_detail_with_depth(workflow_id, self.view.max_depth)
    }

    /// Detail view from one replay and one walk at `max_depth`
    pub fn workflow_detail_with_depth(&self, workflow_id: &str, max_depth: usize) -> WorkflowDetail {
        let events = self.reader.workflow_events(workflow_id);
        WorkflowDetail {
            id: workflow_id.to_string(),
            status: workflow_status(&events),
            events: events.len(),
            tasks: task_summaries(&events),
            graph: self.graph_with_depth(workflow_id, max_depth),
        }
    }

    /// Every workflow seen in the log with its status, from a single replay
    pub fn overview(&self) -> Vec<WorkflowSummary> {
        let mut order: Vec<String> = Vec::new();
        let mut grouped: HashMap<String, Vec<Event>> = HashMap::new();
        for event in self.reader.replay_all(self.reader.origin()) {
            let bucket = grouped.entry(event.workflow_id.clone()).or_insert_with(|| {
                order.push(event.workflow_id.clone());
                Vec::new()
            });
            bucket.push(event);
        }
        debug!(workflows = order.len(), "built workflow overview");

        order
            .into_iter()
            .map(|id| {
                let events = grouped.remove(&id).unwrap_or_default();
                WorkflowSummary {
                    status: workflow_status(&events),
                    events: events.len(),
                    id,
                }
            })
            .collect()
    }

    /// Scheduler entries as (id, handle); empty without a snapshot
    pub fn scheduler_entries(&self) -> Vec<(String, Value)> {
        let Some(scheduler) = &self.scheduler else {
            return Vec::new();
        };
        match scheduler.list() {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "scheduler snapshot unavailable");
                Vec::new()
            }
        }
    }

    pub fn scheduler_state(&self, id: &str) -> Option<Value> {
        let scheduler = self.scheduler.as_ref()?;
        match scheduler.get_state(id) {
            Ok(state) => state,
            Err(e) => {
                warn!(id, error = %e, "scheduler snapshot unavailable");
                None
            }
        }
    }
}

impl std::fmt::Debug for Inspector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inspector")
            .field("view", &self.view)
            .field("scheduler", &self.scheduler.is_some())
            .finish_non_exhaustive()
    }
}
