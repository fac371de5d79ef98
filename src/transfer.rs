//! Structural rewrite
//!
//! `transfer_flow` rebuilds a flow by applying a rewriter to every step:
//! the node first, then (on the updated node) its structural children,
//! then its `next` successor. Handlers express "rewrite the step named X"
//! without re-implementing tree recursion.
//!
//! The async form awaits the rewriter sequentially in the same order, so
//! traversal remains deterministic.

use std::convert::Infallible;

use futures::future::BoxFuture;

use crate::flow::FlowVersion;
use crate::step::{Step, StepKind};

/// Rewrite every step of a flow, preserving shape.
pub fn transfer_flow<F>(flow: FlowVersion, mut rewrite: F) -> FlowVersion
where
    F: FnMut(Step) -> Step,
{
    let result: Result<FlowVersion, Infallible> =
        try_transfer_flow(flow, |step| Ok(rewrite(step)));
    match result {
        Ok(flow) => flow,
        Err(never) => match never {},
    }
}

/// Fallible form: the first `Err` aborts the walk and surfaces to the
/// caller.
pub fn try_transfer_flow<F, E>(flow: FlowVersion, mut rewrite: F) -> Result<FlowVersion, E>
where
    F: FnMut(Step) -> Result<Step, E>,
{
    let trigger = try_transfer_step(flow.trigger, &mut rewrite)?;
    Ok(FlowVersion { trigger, ..flow })
}

/// Rewrite a subtree rooted at `step` (same order as the flow form).
pub(crate) fn transfer_step<F>(step: Step, rewrite: &mut F) -> Step
where
    F: FnMut(Step) -> Step,
{
    let result: Result<Step, Infallible> =
        try_transfer_step(step, &mut |step| Ok(rewrite(step)));
    match result {
        Ok(step) => step,
        Err(never) => match never {},
    }
}

fn try_transfer_step<F, E>(step: Step, rewrite: &mut F) -> Result<Step, E>
where
    F: FnMut(Step) -> Result<Step, E>,
{
    let mut step = rewrite(step)?;
    match &mut step.kind {
        StepKind::ActionBranch {
            on_success,
            on_failure,
            ..
        } => {
            if let Some(head) = on_success.take() {
                *on_success = Some(Box::new(try_transfer_step(*head, rewrite)?));
            }
            if let Some(head) = on_failure.take() {
                *on_failure = Some(Box::new(try_transfer_step(*head, rewrite)?));
            }
        }
        StepKind::ActionLoop {
            first_loop_action, ..
        } => {
            if let Some(head) = first_loop_action.take() {
                *first_loop_action = Some(Box::new(try_transfer_step(*head, rewrite)?));
            }
        }
        StepKind::ActionRouter { children, .. } => {
            for slot in children.iter_mut() {
                if let Some(head) = slot.take() {
                    *slot = Some(Box::new(try_transfer_step(*head, rewrite)?));
                }
            }
        }
        StepKind::TriggerEmpty { .. }
        | StepKind::TriggerPiece { .. }
        | StepKind::ActionPiece { .. }
        | StepKind::ActionCode { .. } => {}
    }
    if let Some(next) = step.next.take() {
        step.next = Some(Box::new(try_transfer_step(*next, rewrite)?));
    }
    Ok(step)
}

/// Async rewrite: each step's future is awaited before descending, so
/// the observable order matches the sync form exactly.
pub async fn transfer_flow_async<F>(flow: FlowVersion, rewrite: &mut F) -> FlowVersion
where
    F: FnMut(Step) -> BoxFuture<'static, Step> + Send,
{
    let trigger = transfer_step_async(flow.trigger, rewrite).await;
    FlowVersion { trigger, ..flow }
}

fn transfer_step_async<'a, F>(step: Step, rewrite: &'a mut F) -> BoxFuture<'a, Step>
where
    F: FnMut(Step) -> BoxFuture<'static, Step> + Send,
{
    Box::pin(async move {
        let mut step = rewrite(step).await;
        match &mut step.kind {
            StepKind::ActionBranch {
                on_success,
                on_failure,
                ..
            } => {
                if let Some(head) = on_success.take() {
                    *on_success = Some(Box::new(transfer_step_async(*head, rewrite).await));
                }
                if let Some(head) = on_failure.take() {
                    *on_failure = Some(Box::new(transfer_step_async(*head, rewrite).await));
                }
            }
            StepKind::ActionLoop {
                first_loop_action, ..
            } => {
                if let Some(head) = first_loop_action.take() {
                    *first_loop_action =
                        Some(Box::new(transfer_step_async(*head, rewrite).await));
                }
            }
            StepKind::ActionRouter { children, .. } => {
                for index in 0..children.len() {
                    if let Some(head) = children[index].take() {
                        children[index] =
                            Some(Box::new(transfer_step_async(*head, rewrite).await));
                    }
                }
            }
            StepKind::TriggerEmpty { .. }
            | StepKind::TriggerPiece { .. }
            | StepKind::ActionPiece { .. }
            | StepKind::ActionCode { .. } => {}
        }
        if let Some(next) = step.next.take() {
            step.next = Some(Box::new(transfer_step_async(*next, rewrite).await));
        }
        step
    })
}
