//! DELETE_ACTION
//!
//! Removes the named step and splices its `next` into whichever slot
//! referenced it. Descendants under the deleted step's structural
//! slots are dropped with it; callers that want them must move first.

use crate::flow::FlowVersion;
use crate::step::{Step, StepKind};
use crate::transfer::transfer_flow;

fn splice_slot(slot: &mut Option<Box<Step>>, name: &str) {
    if slot.as_deref().is_some_and(|step| step.name == name) {
        let removed = slot.take();
        *slot = removed.and_then(|step| step.next);
    }
}

pub(crate) fn delete_action(flow: FlowVersion, name: &str) -> FlowVersion {
    transfer_flow(flow, |mut parent| {
        splice_slot(&mut parent.next, name);
        match &mut parent.kind {
            StepKind::ActionBranch {
                on_success,
                on_failure,
                ..
            } => {
                splice_slot(on_success, name);
                splice_slot(on_failure, name);
            }
            StepKind::ActionLoop {
                first_loop_action, ..
            } => splice_slot(first_loop_action, name),
            StepKind::ActionRouter { children, .. } => {
                for slot in children.iter_mut() {
                    splice_slot(slot, name);
                }
            }
            StepKind::TriggerEmpty { .. }
            | StepKind::TriggerPiece { .. }
            | StepKind::ActionPiece { .. }
            | StepKind::ActionCode { .. } => {}
        }
        parent
    })
}
