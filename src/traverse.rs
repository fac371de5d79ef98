//! Traversal primitives
//!
//! The canonical walk order from any root is: the node itself, then the
//! structural children (branch success then failure, loop body, router
//! children in index order), then the `next` successor. Every consumer
//! of step order (name allocation, path lookup, import linearization)
//! observes this order.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::error::{FlowError, Result};
use crate::flow::FlowVersion;
use crate::step::{Step, StepKind};

/// Structural slot heads of a step, in canonical order. Empty for
/// leaves and triggers.
pub(crate) fn structural_heads(step: &Step) -> SmallVec<[&Step; 4]> {
    let mut heads = SmallVec::new();
    match &step.kind {
        StepKind::ActionBranch {
            on_success,
            on_failure,
            ..
        } => {
            if let Some(head) = on_success.as_deref() {
                heads.push(head);
            }
            if let Some(head) = on_failure.as_deref() {
                heads.push(head);
            }
        }
        StepKind::ActionLoop {
            first_loop_action, ..
        } => {
            if let Some(head) = first_loop_action.as_deref() {
                heads.push(head);
            }
        }
        StepKind::ActionRouter { children, .. } => {
            for child in children.iter().flatten() {
                heads.push(child.as_ref());
            }
        }
        StepKind::TriggerEmpty { .. }
        | StepKind::TriggerPiece { .. }
        | StepKind::ActionPiece { .. }
        | StepKind::ActionCode { .. } => {}
    }
    heads
}

/// Every step reachable from `root`, in canonical DFS order.
pub fn get_all_steps(root: &Step) -> Vec<&Step> {
    let mut steps = Vec::new();
    collect(root, &mut steps);
    steps
}

fn collect<'a>(step: &'a Step, out: &mut Vec<&'a Step>) {
    out.push(step);
    for head in structural_heads(step) {
        collect(head, out);
    }
    if let Some(next) = step.next.as_deref() {
        collect(next, out);
    }
}

/// Look up a step by name anywhere in the flow.
pub fn get_step<'a>(flow: &'a FlowVersion, name: &str) -> Option<&'a Step> {
    get_all_steps(&flow.trigger)
        .into_iter()
        .find(|step| step.name == name)
}

/// Piece names referenced by the flow, de-duplicated in first-seen
/// (DFS) order.
pub fn get_used_pieces(trigger: &Step) -> Vec<&str> {
    let mut seen = FxHashSet::default();
    let mut pieces = Vec::new();
    for step in get_all_steps(trigger) {
        if let Some(settings) = step.piece_settings() {
            if seen.insert(settings.piece_name.as_str()) {
                pieces.push(settings.piece_name.as_str());
            }
        }
    }
    pieces
}

/// A step paired with its position in the canonical DFS order.
#[derive(Debug, Clone, Copy)]
pub struct StepWithIndex<'a> {
    pub step: &'a Step,
    pub dfs_index: usize,
}

/// Ancestors of `target`: every step (other than the target itself)
/// whose subtree (structural children or `next` chain) reaches it,
/// each paired with its DFS index.
pub fn find_path_to_step<'a>(trigger: &'a Step, target: &str) -> Result<Vec<StepWithIndex<'a>>> {
    let steps = get_all_steps(trigger);
    if !steps.iter().any(|step| step.name == target) {
        return Err(FlowError::StepNotFound {
            name: target.to_string(),
        });
    }
    Ok(steps
        .iter()
        .enumerate()
        .filter(|(_, step)| step.name != target)
        .filter(|(_, step)| {
            get_all_steps(step)
                .iter()
                .any(|descendant| descendant.name == target)
        })
        .map(|(dfs_index, step)| StepWithIndex {
            step: *step,
            dfs_index,
        })
        .collect())
}

/// Every step under the structural slots of a composite, deep. Does not
/// include the composite itself or its own `next` chain.
pub fn get_all_child_steps(step: &Step) -> Vec<&Step> {
    structural_heads(step)
        .into_iter()
        .flat_map(get_all_steps)
        .collect()
}

/// Whether `child_name` occurs anywhere under a composite's structural
/// slots.
pub fn is_child_of(step: &Step, child_name: &str) -> bool {
    get_all_child_steps(step)
        .iter()
        .any(|child| child.name == child_name)
}

/// Whether `child_name` is the last step along the immediate chain of
/// one of the composite's structural slots.
pub fn is_last_child_of(step: &Step, child_name: &str) -> bool {
    for head in structural_heads(step) {
        let mut cursor = head;
        while let Some(next) = cursor.next.as_deref() {
            cursor = next;
        }
        if cursor.name == child_name {
            return true;
        }
    }
    false
}

fn points_at(step: &Step, target: &str) -> bool {
    if step.next.as_deref().is_some_and(|next| next.name == target) {
        return true;
    }
    structural_heads(step).iter().any(|head| head.name == target)
}

/// The unique step whose `next` or structural slot points at `target`.
///
/// Recursive with short-circuit: a composite's slot subtree is searched
/// only when `is_child_of` says the target lives there.
pub fn get_direct_parent_step<'a>(root: &'a Step, target: &str) -> Option<&'a Step> {
    if points_at(root, target) {
        return Some(root);
    }
    for head in structural_heads(root) {
        if head.name == target || is_child_of_chain(head, target) {
            return get_direct_parent_step(head, target);
        }
    }
    root.next
        .as_deref()
        .and_then(|next| get_direct_parent_step(next, target))
}

fn is_child_of_chain(head: &Step, target: &str) -> bool {
    get_all_steps(head).iter().any(|step| step.name == target)
}
