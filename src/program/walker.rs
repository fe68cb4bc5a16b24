//! Program DAG walker
//!
//! Turns a lazily-unfolding [`Program`] into a [`ProgramNode`] tree without
//! running anything. Continuations are resumed with an inert placeholder
//! instead of a real task result; a continuation that actually needs the
//! result fails, and that branch simply ends.
//!
//! Rules:
//! - every descent (members, unfold body, resumed continuation) costs one
//!   unit of depth; at 0 the walker emits `Unknown` for anything but `Done`
//! - `Done` is absent; `Opaque` is `Unknown`
//! - a step's continuation is spliced after it: two sequences concatenate,
//!   anything else becomes a two-element sequence
//! - `Unfold` shows its body once and never walks past it

use std::panic::{self, AssertUnwindSafe};

use serde_json::Value;
use tracing::debug;

use super::node::ProgramNode;
use super::value::{Continuation, Program};

pub const DEFAULT_MAX_DEPTH: usize = 32;

/// What the walker feeds continuations in place of a task result
pub const PLACEHOLDER: Value = Value::Null;

/// Walk a program into a renderable tree. Never fails; a missing program or
/// one that is immediately `Done` yields `None`.
pub fn walk(program: Option<&Program>, max_depth: usize) -> Option<ProgramNode> {
    program.and_then(|p| walk_step(p, max_depth))
}

fn walk_step(program: &Program, depth: usize) -> Option<ProgramNode> {
    // An exhausted program has nothing to cut off
    if matches!(program, Program::Done) {
        return None;
    }
    if depth == 0 {
        return Some(ProgramNode::Unknown);
    }
    let below = depth - 1;

    match program {
        Program::Done => None,
        Program::Run {
            task_id,
            module,
            next,
        } => {
            let node = ProgramNode::Task {
                id: task_id.clone(),
                module: module.clone(),
            };
            Some(splice(node, walk_resumed(next, below)))
        }
        Program::Sequence { items, next } => {
            let node = ProgramNode::Sequence {
                members: walk_members(items, below),
            };
            Some(splice(node, walk_resumed(next, below)))
        }
        Program::Parallel { items, next } => {
            let node = ProgramNode::Parallel {
                members: walk_members(items, below),
            };
            Some(splice(node, walk_resumed(next, below)))
        }
        Program::Unfold { current, .. } => Some(ProgramNode::Unfold {
            inner: walk_step(current, below).map(Box::new),
        }),
        Program::Opaque(_) => Some(ProgramNode::Unknown),
    }
}

fn walk_members(items: &[Program], depth: usize) -> Vec<ProgramNode> {
    items.iter().filter_map(|item| walk_step(item, depth)).collect()
}

fn walk_resumed(next: &Continuation, depth: usize) -> Option<ProgramNode> {
    // Continuations are engine code; a panic in one must not take the view down
    let resumed = panic::catch_unwind(AssertUnwindSafe(|| next.resume(&PLACEHOLDER)));
    match resumed {
        Ok(Ok(program)) => walk_step(&program, depth),
        Ok(Err(e)) => {
            debug!(error = %e, "continuation did not resume; branch ends");
            None
        }
        Err(_) => {
            debug!("continuation panicked; branch ends");
            None
        }
    }
}

fn splice(node: ProgramNode, rest: Option<ProgramNode>) -> ProgramNode {
    match (node, rest) {
        (node, None) => node,
        (
            ProgramNode::Sequence { mut members },
            Some(ProgramNode::Sequence { members: tail }),
        ) => {
            members.extend(tail);
            ProgramNode::Sequence { members }
        }
        (node, Some(rest)) => ProgramNode::Sequence {
            members: vec![node, rest],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::value::ResumeError;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn task(id: &str) -> ProgramNode {
        ProgramNode::task(id, "m")
    }

    fn seq(members: Vec<ProgramNode>) -> ProgramNode {
        ProgramNode::Sequence { members }
    }

    fn run(id: &str) -> Program {
        Program::run(id, "m")
    }

    /// Infinite straight-line program: run(n) then run(n+1) then ...
    fn forever(n: u32) -> Program {
        run(&format!("t{n}")).with_next(Continuation::new(move |_| Ok(forever(n + 1))))
    }

    fn nesting(node: &ProgramNode) -> usize {
        match node {
            ProgramNode::Sequence { members } | ProgramNode::Parallel { members } => {
                1 + members.iter().map(nesting).max().unwrap_or(0)
            }
            ProgramNode::Unfold { inner } => 1 + inner.as_deref().map(nesting).unwrap_or(0),
            _ => 1,
        }
    }

    // ═══════════════════════════════════════════════════════════════
    // Basic shapes
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn missing_or_done_program_is_absent() {
        assert_eq!(walk(None, 10), None);
        assert_eq!(walk(Some(&Program::Done), 10), None);
    }

    #[test]
    fn single_run_is_a_task() {
        assert_eq!(walk(Some(&run("a")), 10), Some(task("a")));
    }

    #[test]
    fn opaque_is_unknown() {
        let program = Program::Opaque(json!({"op": "teleport"}));
        assert_eq!(walk(Some(&program), 10), Some(ProgramNode::Unknown));
    }

    #[test]
    fn run_then_run_wraps_in_two_element_sequence() {
        let program = run("a").then(run("b"));
        assert_eq!(walk(Some(&program), 10), Some(seq(vec![task("a"), task("b")])));
    }

    #[test]
    fn sequence_drops_absent_members() {
        let program = Program::sequence(vec![run("a"), Program::Done, run("b")]);
        assert_eq!(walk(Some(&program), 10), Some(seq(vec![task("a"), task("b")])));
    }

    #[test]
    fn parallel_preserves_input_order() {
        let program = Program::parallel(vec![run("z"), run("a"), run("m")]);
        assert_eq!(
            walk(Some(&program), 10),
            Some(ProgramNode::Parallel {
                members: vec![task("z"), task("a"), task("m")]
            })
        );
    }

    // ═══════════════════════════════════════════════════════════════
    // Splicing
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn sequence_followed_by_sequence_is_flat() {
        let program = Program::sequence(vec![run("a")]).then(Program::sequence(vec![run("b")]));
        assert_eq!(walk(Some(&program), 10), Some(seq(vec![task("a"), task("b")])));
    }

    #[test]
    fn parallel_followed_by_run_nests_once() {
        let program = Program::parallel(vec![run("a"), run("b")]).then(run("c"));
        assert_eq!(
            walk(Some(&program), 10),
            Some(seq(vec![
                ProgramNode::Parallel {
                    members: vec![task("a"), task("b")]
                },
                task("c"),
            ]))
        );
    }

    // ═══════════════════════════════════════════════════════════════
    // Unfold
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn unfold_shows_one_iteration_and_stops() {
        let body = run("poll");
        let program = Program::unfold(body).then(run("after"));
        // The unfold's own continuation is never walked
        assert_eq!(
            walk(Some(&program), 10),
            Some(ProgramNode::Unfold {
                inner: Some(Box::new(task("poll")))
            })
        );
    }

    #[test]
    fn unfold_with_done_body_has_no_inner() {
        let program = Program::unfold(Program::Done);
        assert_eq!(
            walk(Some(&program), 10),
            Some(ProgramNode::Unfold { inner: None })
        );
    }

    // ═══════════════════════════════════════════════════════════════
    // Continuation failures
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn continuation_needing_result_ends_branch() {
        let program = run("decide").with_next(Continuation::new(|result| {
            match result.get("approved").and_then(Value::as_bool) {
                Some(true) => Ok(Program::run("ship", "m")),
                Some(false) => Ok(Program::Done),
                None => Err(ResumeError::NeedsResult {
                    path: "approved".into(),
                }),
            }
        }));
        assert_eq!(walk(Some(&program), 10), Some(task("decide")));
    }

    #[test]
    fn panicking_continuation_ends_branch() {
        let program = run("a").with_next(Continuation::new(|_| panic!("engine bug")));
        assert_eq!(walk(Some(&program), 10), Some(task("a")));
    }

    #[test]
    fn failing_member_continuation_keeps_siblings() {
        let broken = run("b").with_next(Continuation::new(|_| {
            Err(ResumeError::Failed("store offline".into()))
        }));
        let program = Program::sequence(vec![run("a"), broken, run("c")]);
        assert_eq!(
            walk(Some(&program), 10),
            Some(seq(vec![task("a"), task("b"), task("c")]))
        );
    }

    // ═══════════════════════════════════════════════════════════════
    // Depth bound
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn zero_depth_is_unknown() {
        assert_eq!(walk(Some(&run("a")), 0), Some(ProgramNode::Unknown));
        assert_eq!(walk(Some(&Program::Done), 0), None);
    }

    #[test]
    fn infinite_program_terminates_with_unknown() {
        let tree = walk(Some(&forever(0)), 5).unwrap();
        assert!(tree.has_unknown());
        assert_eq!(tree.task_ids(), vec!["t0", "t1", "t2", "t3", "t4"]);
    }

    #[test]
    fn unknown_exactly_when_nesting_exceeds_depth() {
        // Parallel nested k levels deep around one run
        fn nested(k: usize) -> Program {
            (0..k).fold(run("leaf"), |inner, _| Program::parallel(vec![inner]))
        }
        for k in 0..6 {
            let program = nested(k);
            let levels = k + 1;
            for depth in 1..8 {
                let tree = walk(Some(&program), depth).unwrap();
                assert_eq!(
                    tree.has_unknown(),
                    levels > depth,
                    "levels={levels} depth={depth}"
                );
                // the cut-off marker itself sits one level below the budget
                assert!(nesting(&tree) <= depth + 1);
            }
        }
    }

    #[test]
    fn walking_is_idempotent() {
        let program = Program::sequence(vec![run("a"), Program::parallel(vec![run("b"), run("c")])])
            .then(Program::unfold(run("d")));
        assert_eq!(walk(Some(&program), 8), walk(Some(&program), 8));
    }
}
