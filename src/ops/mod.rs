//! Flow operations
//!
//! The closed operation set a flow version can be edited with, and the
//! `apply` dispatcher. Request payloads deliberately carry no structural
//! child slots: an added action always arrives without descendants, and
//! subtree reconstruction happens through import-operation replay.

mod add;
mod delete;
mod duplicate;
mod move_step;
mod router;
mod update;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::flow::{is_valid, FlowState, FlowVersion};
use crate::normalize::upgrade_piece;
use crate::schema;
use crate::step::{
    BranchSettings, CodeSettings, EmptyTriggerSettings, LoopSettings, PieceSettings,
    RouterSettings, Step, StepKind,
};
use crate::transfer::transfer_flow;

pub(crate) use add::add_action;
pub(crate) use delete::delete_action;
pub(crate) use duplicate::rename_subtree;

/// Where a new child lands relative to its parent step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepLocation {
    #[default]
    After,
    InsideLoop,
    InsideTrueBranch,
    InsideFalseBranch,
    InsideBranch,
}

/// Action payload of add/update requests. Carries only the fields a
/// caller may set; structural children never travel in requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequest {
    pub name: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
    #[serde(flatten)]
    pub kind: ActionKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    ActionPiece { settings: PieceSettings },
    ActionCode { settings: CodeSettings },
    ActionBranch { settings: BranchSettings },
    ActionLoop { settings: LoopSettings },
    ActionRouter { settings: RouterSettings },
}

/// Trigger payload of `UPDATE_TRIGGER`. The root's `name` and `next`
/// are preserved by the handler, so neither appears here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTriggerRequest {
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
    #[serde(flatten)]
    pub kind: TriggerKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerKind {
    TriggerEmpty { settings: EmptyTriggerSettings },
    TriggerPiece { settings: PieceSettings },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddActionRequest {
    pub parent_step: String,
    #[serde(default)]
    pub step_location_relative_to_parent: StepLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_index: Option<usize>,
    /// Advisory label emitted by the import linearizer; the router's
    /// own settings stay authoritative for branch metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
    pub action: ActionRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveActionRequest {
    pub name: String,
    pub new_parent_step: String,
    #[serde(default)]
    pub step_location_relative_to_new_parent: StepLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteActionRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateActionRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeNameRequest {
    pub display_name: String,
}

/// Shared payload of the router branch operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchOperationRequest {
    pub step_name: String,
    pub branch_index: usize,
}

/// The closed set of edits a flow version accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "request", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowOperation {
    MoveAction(MoveActionRequest),
    LockFlow,
    ChangeName(ChangeNameRequest),
    DeleteAction(DeleteActionRequest),
    AddAction(AddActionRequest),
    UpdateAction(ActionRequest),
    UpdateTrigger(UpdateTriggerRequest),
    DuplicateAction(DuplicateActionRequest),
    DeleteBranch(BranchOperationRequest),
    AddBranch(BranchOperationRequest),
    DuplicateBranch(BranchOperationRequest),
}

impl FlowOperation {
    fn kind_name(&self) -> &'static str {
        match self {
            FlowOperation::MoveAction(_) => "MOVE_ACTION",
            FlowOperation::LockFlow => "LOCK_FLOW",
            FlowOperation::ChangeName(_) => "CHANGE_NAME",
            FlowOperation::DeleteAction(_) => "DELETE_ACTION",
            FlowOperation::AddAction(_) => "ADD_ACTION",
            FlowOperation::UpdateAction(_) => "UPDATE_ACTION",
            FlowOperation::UpdateTrigger(_) => "UPDATE_TRIGGER",
            FlowOperation::DuplicateAction(_) => "DUPLICATE_ACTION",
            FlowOperation::DeleteBranch(_) => "DELETE_BRANCH",
            FlowOperation::AddBranch(_) => "ADD_BRANCH",
            FlowOperation::DuplicateBranch(_) => "DUPLICATE_BRANCH",
        }
    }
}

/// Build an action step from a request. Structural slots start empty;
/// a router gets one `None` child per declared branch so `children`
/// stays aligned with `settings.branches`.
pub(crate) fn create_action(request: ActionRequest, next: Option<Box<Step>>) -> Step {
    let kind = match request.kind {
        ActionKind::ActionPiece { settings } => StepKind::ActionPiece { settings },
        ActionKind::ActionCode { settings } => StepKind::ActionCode { settings },
        ActionKind::ActionBranch { settings } => StepKind::ActionBranch {
            settings,
            on_success: None,
            on_failure: None,
        },
        ActionKind::ActionLoop { settings } => StepKind::ActionLoop {
            settings,
            first_loop_action: None,
        },
        ActionKind::ActionRouter { settings } => {
            let children = vec![None; settings.branches.len()];
            StepKind::ActionRouter { settings, children }
        }
    };
    let schema_valid = schema::validate_step_settings(&kind);
    Step {
        name: request.name,
        display_name: request.display_name,
        valid: request.valid.unwrap_or(true) && schema_valid,
        next,
        kind,
    }
}

/// Build a trigger step, keeping the previous root's `name` and `next`.
pub(crate) fn create_trigger(
    request: UpdateTriggerRequest,
    name: String,
    next: Option<Box<Step>>,
) -> Step {
    let kind = match request.kind {
        TriggerKind::TriggerEmpty { settings } => StepKind::TriggerEmpty { settings },
        TriggerKind::TriggerPiece { settings } => StepKind::TriggerPiece { settings },
    };
    let schema_valid = schema::validate_step_settings(&kind);
    Step {
        name,
        display_name: request.display_name,
        valid: request.valid.unwrap_or(true) && schema_valid,
        next,
        kind,
    }
}

/// Apply one operation to a flow version and return the new version.
///
/// The input is cloned up front, so it is never mutated, not even when
/// the operation is rejected. Operations that introduce or reconfigure
/// a piece step run the piece-version upgrade targeted at that step,
/// and the flow's aggregate `valid` flag is recomputed last.
pub fn apply(flow: &FlowVersion, operation: FlowOperation) -> Result<FlowVersion> {
    debug!(op = operation.kind_name(), "applying flow operation");
    let cloned = flow.clone();
    let mut result = match operation {
        FlowOperation::MoveAction(request) => move_step::move_action(cloned, request)?,
        FlowOperation::LockFlow => {
            let mut flow = cloned;
            flow.state = FlowState::Locked;
            flow
        }
        FlowOperation::ChangeName(request) => {
            let mut flow = cloned;
            flow.display_name = request.display_name;
            flow
        }
        FlowOperation::DeleteAction(request) => delete::delete_action(cloned, &request.name),
        FlowOperation::AddAction(request) => {
            let target = request.action.name.clone();
            let flow = add::add_action(cloned, request)?;
            transfer_flow(flow, |step| upgrade_piece(step, &target))
        }
        FlowOperation::UpdateAction(request) => {
            let target = request.name.clone();
            let flow = update::update_action(cloned, request);
            transfer_flow(flow, |step| upgrade_piece(step, &target))
        }
        FlowOperation::UpdateTrigger(request) => {
            let target = cloned.trigger.name.clone();
            let flow = update::update_trigger(cloned, request);
            transfer_flow(flow, |step| upgrade_piece(step, &target))
        }
        FlowOperation::DuplicateAction(request) => {
            duplicate::duplicate_action(cloned, &request.name)?
        }
        FlowOperation::DeleteBranch(request) => router::delete_branch(cloned, request)?,
        FlowOperation::AddBranch(request) => router::add_branch(cloned, request)?,
        FlowOperation::DuplicateBranch(request) => router::duplicate_branch(cloned, request)?,
    };
    result.valid = is_valid(&result);
    Ok(result)
}
