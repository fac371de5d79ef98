//! UPDATE_ACTION and UPDATE_TRIGGER
//!
//! Update replaces the named step with a freshly built one, carrying the
//! old step's `next` always, and its structural slots only when the old
//! and new kinds agree. A kind change starts the slots empty.

use crate::flow::FlowVersion;
use crate::step::{Step, StepKind};
use crate::transfer::transfer_flow;

use super::{create_action, create_trigger, ActionRequest, UpdateTriggerRequest};

pub(crate) fn update_action(flow: FlowVersion, request: ActionRequest) -> FlowVersion {
    transfer_flow(flow, |step| {
        if step.name != request.name || step.is_trigger() {
            return step;
        }
        let Step {
            next,
            kind: old_kind,
            ..
        } = step;
        let mut updated = create_action(request.clone(), next);
        match (&mut updated.kind, old_kind) {
            (
                StepKind::ActionBranch {
                    on_success,
                    on_failure,
                    ..
                },
                StepKind::ActionBranch {
                    on_success: old_success,
                    on_failure: old_failure,
                    ..
                },
            ) => {
                *on_success = old_success;
                *on_failure = old_failure;
            }
            (
                StepKind::ActionLoop {
                    first_loop_action, ..
                },
                StepKind::ActionLoop {
                    first_loop_action: old_body,
                    ..
                },
            ) => {
                *first_loop_action = old_body;
            }
            (
                StepKind::ActionRouter { children, .. },
                StepKind::ActionRouter {
                    children: old_children,
                    ..
                },
            ) => {
                *children = old_children;
            }
            _ => {}
        }
        updated
    })
}

/// Rebuild the trigger in place, preserving its `name` and `next`, then
/// leave the rest of the flow untouched.
pub(crate) fn update_trigger(flow: FlowVersion, request: UpdateTriggerRequest) -> FlowVersion {
    let trigger_name = flow.trigger.name.clone();
    transfer_flow(flow, |step| {
        if step.name != trigger_name || step.is_action() {
            return step;
        }
        let Step { name, next, .. } = step;
        create_trigger(request.clone(), name, next)
    })
}
