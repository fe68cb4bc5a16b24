//! Renderable program tree produced by the walker

use std::fmt;

use serde::Serialize;

/// Structural view of a program (transient, recomputed per request)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum ProgramNode {
    Task { id: String, module: String },
    Sequence { members: Vec<ProgramNode> },
    /// Members in declaration order; no execution order implied
    Parallel { members: Vec<ProgramNode> },
    /// One iteration of a repeated body (absent if the body is empty)
    Unfold { inner: Option<Box<ProgramNode>> },
    /// Too deep, or a shape the walker does not understand
    Unknown,
}

impl ProgramNode {
    pub fn task(id: impl Into<String>, module: impl Into<String>) -> Self {
        ProgramNode::Task {
            id: id.into(),
            module: module.into(),
        }
    }

    /// Task ids in depth-first, left-to-right order
    pub fn task_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        self.collect_task_ids(&mut ids);
        ids
    }

    fn collect_task_ids<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            ProgramNode::Task { id, .. } => out.push(id),
            ProgramNode::Sequence { members } | ProgramNode::Parallel { members } => {
                for member in members {
                    member.collect_task_ids(out);
                }
            }
            ProgramNode::Unfold { inner } => {
                if let Some(inner) = inner {
                    inner.collect_task_ids(out);
                }
            }
            ProgramNode::Unknown => {}
        }
    }

    /// Whether any part of the tree was cut off or not understood
    pub fn has_unknown(&self) -> bool {
        match self {
            ProgramNode::Unknown => true,
            ProgramNode::Task { .. } => false,
            ProgramNode::Sequence { members } | ProgramNode::Parallel { members } => {
                members.iter().any(ProgramNode::has_unknown)
            }
            ProgramNode::Unfold { inner } => inner.as_deref().is_some_and(ProgramNode::has_unknown),
        }
    }

    /// Box-drawing tree; `annotate` may add a suffix to task lines
    pub fn render_with<F>(&self, annotate: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut out = String::new();
        self.render_into(&mut out, "", "", &annotate);
        out
    }

    fn label<F>(&self, annotate: &F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        match self {
            ProgramNode::Task { id, module } => match annotate(id) {
                Some(note) => format!("task {id} ({module}) [{note}]"),
                None => format!("task {id} ({module})"),
            },
            ProgramNode::Sequence { .. } => "sequence".to_string(),
            ProgramNode::Parallel { .. } => "parallel".to_string(),
            ProgramNode::Unfold { .. } => "unfold (one iteration)".to_string(),
            ProgramNode::Unknown => "…".to_string(),
        }
    }

    fn children(&self) -> Vec<&ProgramNode> {
        match self {
            ProgramNode::Sequence { members } | ProgramNode::Parallel { members } => {
                members.iter().collect()
            }
            ProgramNode::Unfold { inner } => inner.iter().map(|b| &**b).collect(),
            ProgramNode::Task { .. } | ProgramNode::Unknown => Vec::new(),
        }
    }

    fn render_into<F>(&self, out: &mut String, lead: &str, indent: &str, annotate: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        out.push_str(lead);
        out.push_str(&self.label(annotate));
        out.push('\n');

        let children = self.children();
        let last = children.len().saturating_sub(1);
        for (i, child) in children.into_iter().enumerate() {
            let (branch, carry) = if i == last {
                ("└── ", "    ")
            } else {
                ("├── ", "│   ")
            };
            child.render_into(
                out,
                &format!("{indent}{branch}"),
                &format!("{indent}{carry}"),
                annotate,
            );
        }
    }
}

impl fmt::Display for ProgramNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_with(|_| None))
    }
}
