//! Import-operation generation
//!
//! Linearizes a subtree into an ordered sequence of `ADD_ACTION`
//! operations. Replayed against a flow that contains the root bare (no
//! descendants), the sequence reconstructs the whole subtree.
//!
//! Order matters: insertion is always head-insertion, so each chain is
//! emitted head first: the successor of a step is added before the
//! successor's own successor. Changing this order breaks replay.

use crate::ops::{ActionKind, ActionRequest, AddActionRequest, FlowOperation, StepLocation};
use crate::step::{Step, StepKind};

/// Bare copy of a step as an addable request: no `next`, no structural
/// children. (A router's children vector is rebuilt by the add handler
/// as one empty slot per branch, which keeps branch alignment.)
pub(crate) fn strip_descendants(step: &Step) -> Option<ActionRequest> {
    let kind = match &step.kind {
        StepKind::ActionPiece { settings } => ActionKind::ActionPiece {
            settings: settings.clone(),
        },
        StepKind::ActionCode { settings } => ActionKind::ActionCode {
            settings: settings.clone(),
        },
        StepKind::ActionBranch { settings, .. } => ActionKind::ActionBranch {
            settings: settings.clone(),
        },
        StepKind::ActionLoop { settings, .. } => ActionKind::ActionLoop {
            settings: settings.clone(),
        },
        StepKind::ActionRouter { settings, .. } => ActionKind::ActionRouter {
            settings: settings.clone(),
        },
        StepKind::TriggerEmpty { .. } | StepKind::TriggerPiece { .. } => return None,
    };
    Some(ActionRequest {
        name: step.name.clone(),
        display_name: step.display_name.clone(),
        valid: Some(step.valid),
        kind,
    })
}

fn add_operation(
    parent: &Step,
    location: StepLocation,
    branch_index: Option<usize>,
    branch_name: Option<String>,
    child: &Step,
) -> Option<FlowOperation> {
    strip_descendants(child).map(|action| {
        FlowOperation::AddAction(AddActionRequest {
            parent_step: parent.name.clone(),
            step_location_relative_to_parent: location,
            branch_index,
            branch_name,
            action,
        })
    })
}

/// The ordered `ADD_ACTION` sequence whose replay rebuilds `root`'s
/// descendant structure.
pub fn get_import_operations(root: &Step) -> Vec<FlowOperation> {
    let mut operations = Vec::new();
    collect(root, &mut operations);
    operations
}

fn collect(root: &Step, operations: &mut Vec<FlowOperation>) {
    let mut cursor = Some(root);
    while let Some(step) = cursor {
        if let Some(next) = step.next.as_deref() {
            operations.extend(add_operation(step, StepLocation::After, None, None, next));
        }
        match &step.kind {
            StepKind::ActionBranch {
                on_success,
                on_failure,
                ..
            } => {
                if let Some(head) = on_success.as_deref() {
                    operations.extend(add_operation(
                        step,
                        StepLocation::InsideTrueBranch,
                        None,
                        None,
                        head,
                    ));
                    collect(head, operations);
                }
                if let Some(head) = on_failure.as_deref() {
                    operations.extend(add_operation(
                        step,
                        StepLocation::InsideFalseBranch,
                        None,
                        None,
                        head,
                    ));
                    collect(head, operations);
                }
            }
            StepKind::ActionLoop {
                first_loop_action, ..
            } => {
                if let Some(head) = first_loop_action.as_deref() {
                    operations.extend(add_operation(
                        step,
                        StepLocation::InsideLoop,
                        None,
                        None,
                        head,
                    ));
                    collect(head, operations);
                }
            }
            StepKind::ActionRouter { children, .. } => {
                for (index, child) in children.iter().enumerate() {
                    if let Some(head) = child.as_deref() {
                        operations.extend(add_operation(
                            step,
                            StepLocation::InsideBranch,
                            Some(index),
                            Some(format!("Branch {}", index + 1)),
                            head,
                        ));
                        collect(head, operations);
                    }
                }
            }
            StepKind::TriggerEmpty { .. }
            | StepKind::TriggerPiece { .. }
            | StepKind::ActionPiece { .. }
            | StepKind::ActionCode { .. } => {}
        }
        cursor = step.next.as_deref();
    }
}
