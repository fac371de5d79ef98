//! Router branch operations
//!
//! `children` and `settings.branches` are index-aligned sequences; every
//! branch operation edits both at the same position.

use rustc_hash::FxHashSet;

use crate::error::{FlowError, Result};
use crate::flow::FlowVersion;
use crate::step::{RouterBranch, StepKind};
use crate::transfer::transfer_flow;
use crate::traverse::{get_all_steps, get_step};

use super::{rename_subtree, BranchOperationRequest};

/// Bounds-check the request against the named router. Insertion may
/// target one past the last branch; the other operations may not.
fn check_router(
    flow: &FlowVersion,
    request: &BranchOperationRequest,
    allow_end_insert: bool,
) -> Result<()> {
    let router = get_step(flow, &request.step_name).ok_or_else(|| FlowError::StepNotFound {
        name: request.step_name.clone(),
    })?;
    let StepKind::ActionRouter { children, .. } = &router.kind else {
        return Err(FlowError::NotARouter {
            name: request.step_name.clone(),
        });
    };
    let limit = if allow_end_insert {
        children.len() + 1
    } else {
        children.len()
    };
    if request.branch_index >= limit {
        return Err(FlowError::BranchIndexOutOfRange {
            name: request.step_name.clone(),
            index: request.branch_index,
            len: children.len(),
        });
    }
    Ok(())
}

/// Insert an empty branch (a `None` child plus fresh condition
/// metadata named `Branch <len+1>`) at the requested index.
pub(crate) fn add_branch(flow: FlowVersion, request: BranchOperationRequest) -> Result<FlowVersion> {
    check_router(&flow, &request, true)?;
    Ok(transfer_flow(flow, move |mut step| {
        if step.name != request.step_name {
            return step;
        }
        if let StepKind::ActionRouter { settings, children } = &mut step.kind {
            let branch_name = format!("Branch {}", settings.branches.len() + 1);
            children.insert(request.branch_index, None);
            settings
                .branches
                .insert(request.branch_index, RouterBranch::empty(branch_name));
        }
        step
    }))
}

/// Remove the branch at the requested index, dropping its child subtree.
pub(crate) fn delete_branch(
    flow: FlowVersion,
    request: BranchOperationRequest,
) -> Result<FlowVersion> {
    check_router(&flow, &request, false)?;
    Ok(transfer_flow(flow, move |mut step| {
        if step.name != request.step_name {
            return step;
        }
        if let StepKind::ActionRouter { settings, children } = &mut step.kind {
            children.remove(request.branch_index);
            settings.branches.remove(request.branch_index);
        }
        step
    }))
}

/// Clone the branch at the requested index (child subtree freshly
/// named and reference-rewritten, metadata name suffixed ` Copy`) and
/// insert the pair at position `len - 1`, just before the last branch.
pub(crate) fn duplicate_branch(
    flow: FlowVersion,
    request: BranchOperationRequest,
) -> Result<FlowVersion> {
    check_router(&flow, &request, false)?;

    let mut existing_names: FxHashSet<String> = get_all_steps(&flow.trigger)
        .iter()
        .map(|step| step.name.clone())
        .collect();

    // Pre-checked above; re-fetch to clone the branch being duplicated.
    let router = get_step(&flow, &request.step_name).ok_or_else(|| FlowError::StepNotFound {
        name: request.step_name.clone(),
    })?;
    let StepKind::ActionRouter { settings, children } = &router.kind else {
        return Err(FlowError::NotARouter {
            name: request.step_name.clone(),
        });
    };
    let cloned_child = children[request.branch_index]
        .clone()
        .map(|child| Box::new(rename_subtree(*child, &mut existing_names)));
    let source_branch = settings.branches[request.branch_index].clone();
    let cloned_branch = RouterBranch {
        branch_name: format!("{} Copy", source_branch.branch_name),
        ..source_branch
    };

    let mut payload = Some((cloned_child, cloned_branch));
    Ok(transfer_flow(flow, move |mut step| {
        if step.name != request.step_name {
            return step;
        }
        if let StepKind::ActionRouter { settings, children } = &mut step.kind {
            if let Some((child, branch)) = payload.take() {
                let position = children.len().saturating_sub(1);
                children.insert(position, child);
                settings.branches.insert(position, branch);
            }
        }
        step
    }))
}
