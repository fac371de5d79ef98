//! ADD_ACTION
//!
//! Head-insertion: the new step takes over the targeted slot and the
//! slot's previous occupant becomes the new step's `next`.

use crate::error::{FlowError, Result};
use crate::flow::FlowVersion;
use crate::step::StepKind;
use crate::transfer::try_transfer_flow;

use super::{create_action, AddActionRequest, StepLocation};

/// Which slot of the parent receives the new step.
enum Slot {
    Next,
    LoopBody,
    Success,
    Failure,
    RouterChild(usize),
}

pub(crate) fn add_action(flow: FlowVersion, request: AddActionRequest) -> Result<FlowVersion> {
    let AddActionRequest {
        parent_step,
        step_location_relative_to_parent: location,
        branch_index,
        action,
        ..
    } = request;
    let mut payload = Some(action);

    try_transfer_flow(flow, |mut parent| {
        if parent.name != parent_step {
            return Ok(parent);
        }
        let Some(action) = payload.take() else {
            return Ok(parent);
        };

        let slot = match (&parent.kind, location) {
            (StepKind::ActionLoop { .. }, StepLocation::InsideLoop) => Slot::LoopBody,
            (StepKind::ActionBranch { .. }, StepLocation::InsideTrueBranch) => Slot::Success,
            (StepKind::ActionBranch { .. }, StepLocation::InsideFalseBranch) => Slot::Failure,
            (StepKind::ActionRouter { children, .. }, StepLocation::InsideBranch) => {
                let index = branch_index.ok_or_else(|| FlowError::MissingBranchIndex {
                    parent: parent_step.clone(),
                })?;
                if index >= children.len() {
                    return Err(FlowError::BranchIndexOutOfRange {
                        name: parent_step.clone(),
                        index,
                        len: children.len(),
                    });
                }
                Slot::RouterChild(index)
            }
            (_, StepLocation::After) => Slot::Next,
            // A plain parent has no structural slots: every location
            // degrades to AFTER.
            (
                StepKind::TriggerEmpty { .. }
                | StepKind::TriggerPiece { .. }
                | StepKind::ActionPiece { .. }
                | StepKind::ActionCode { .. },
                _,
            ) => Slot::Next,
            (_, location) => {
                return Err(FlowError::InvalidLocation {
                    parent: parent_step.clone(),
                    location,
                })
            }
        };

        match slot {
            Slot::Next => {
                let next = parent.next.take();
                parent.next = Some(Box::new(create_action(action, next)));
            }
            Slot::LoopBody => {
                if let StepKind::ActionLoop {
                    first_loop_action, ..
                } = &mut parent.kind
                {
                    let next = first_loop_action.take();
                    *first_loop_action = Some(Box::new(create_action(action, next)));
                }
            }
            Slot::Success => {
                if let StepKind::ActionBranch { on_success, .. } = &mut parent.kind {
                    let next = on_success.take();
                    *on_success = Some(Box::new(create_action(action, next)));
                }
            }
            Slot::Failure => {
                if let StepKind::ActionBranch { on_failure, .. } = &mut parent.kind {
                    let next = on_failure.take();
                    *on_failure = Some(Box::new(create_action(action, next)));
                }
            }
            Slot::RouterChild(index) => {
                if let StepKind::ActionRouter { children, .. } = &mut parent.kind {
                    let next = children[index].take();
                    children[index] = Some(Box::new(create_action(action, next)));
                }
            }
        }
        Ok(parent)
    })
}
