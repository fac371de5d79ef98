//! MOVE_ACTION
//!
//! Decomposes into delete + add + import-operation replay: the source is
//! cloned, removed from its old slot (its `next` splicing in), the bare
//! clone is inserted under the new parent, and the clone's structural
//! subtree is rebuilt one step at a time.
//!
//! The clone's `next` is cleared for loop and branch sources only;
//! router sources keep theirs. Callers move chain-terminal steps (see
//! `is_last_child_of`), so the tail a non-cleared clone drags along is
//! empty in practice.

use crate::error::{FlowError, Result};
use crate::flow::FlowVersion;
use crate::import::{get_import_operations, strip_descendants};
use crate::step::StepKind;
use crate::traverse::get_step;

use super::{add_action, apply, delete_action, AddActionRequest, MoveActionRequest};

pub(crate) fn move_action(flow: FlowVersion, request: MoveActionRequest) -> Result<FlowVersion> {
    let source = get_step(&flow, &request.name).ok_or_else(|| FlowError::StepNotFound {
        name: request.name.clone(),
    })?;
    if source.is_trigger() {
        return Err(FlowError::NotAnAction {
            name: request.name.clone(),
        });
    }
    if get_step(&flow, &request.new_parent_step).is_none() {
        return Err(FlowError::StepNotFound {
            name: request.new_parent_step.clone(),
        });
    }

    let mut clone = source.clone();
    if matches!(
        clone.kind,
        StepKind::ActionLoop { .. } | StepKind::ActionBranch { .. }
    ) {
        clone.next = None;
    }

    let action = strip_descendants(&clone).ok_or_else(|| FlowError::NotAnAction {
        name: request.name.clone(),
    })?;
    let replay = get_import_operations(&clone);

    let flow = delete_action(flow, &request.name);
    let mut flow = add_action(
        flow,
        AddActionRequest {
            parent_step: request.new_parent_step,
            step_location_relative_to_parent: request.step_location_relative_to_new_parent,
            branch_index: request.branch_index,
            branch_name: None,
            action,
        },
    )?;
    for operation in replay {
        flow = apply(&flow, operation)?;
    }
    Ok(flow)
}
