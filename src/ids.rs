//! Workflow id validation
//!
//! Ids arrive from the command line and from event records, and the
//! directory program store turns them into file names.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, ScopeError};

pub const MAX_WORKFLOW_ID_LEN: usize = 128;

/// Letters, digits, `_`, `-`, `.`; must start alphanumeric (no `..`, no `/`)
static WORKFLOW_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.\-]*$").unwrap());

/// Check that `id` is safe to use as a store key
pub fn validate_workflow_id(id: &str) -> Result<&str> {
    if id.len() <= MAX_WORKFLOW_ID_LEN && WORKFLOW_ID_PATTERN.is_match(id) && !id.contains("..") {
        Ok(id)
    } else {
        Err(ScopeError::InvalidWorkflowId { id: id.to_string() })
    }
}
