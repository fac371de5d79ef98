//! Operation handler tests
//!
//! Each operation kind is exercised against engine-built flows, plus the
//! cross-cutting guarantees: the input flow is never mutated, names stay
//! unique, and router children stay aligned with branch metadata.

mod common;

use common::fixtures::*;
use flowops::{
    apply, AddActionRequest, BranchOperationRequest, ChangeNameRequest, DeleteActionRequest,
    DuplicateActionRequest, FlowError, FlowOperation, FlowState, FlowVersion, MoveActionRequest,
    StepKind, StepLocation, UpdateTriggerRequest,
};
use serde_json::{json, Value};

fn applied(flow: &FlowVersion, operation: FlowOperation) -> FlowVersion {
    apply(flow, operation).expect("operation applies")
}

fn add_after(parent: &str, action: flowops::ActionRequest) -> FlowOperation {
    FlowOperation::AddAction(AddActionRequest {
        parent_step: parent.to_string(),
        step_location_relative_to_parent: StepLocation::After,
        branch_index: None,
        branch_name: None,
        action,
    })
}

fn add_at(
    parent: &str,
    location: StepLocation,
    branch_index: Option<usize>,
    action: flowops::ActionRequest,
) -> FlowOperation {
    FlowOperation::AddAction(AddActionRequest {
        parent_step: parent.to_string(),
        step_location_relative_to_parent: location,
        branch_index,
        branch_name: None,
        action,
    })
}

// ════════════════════════════════════════════════════════════════════
// ADD_ACTION
// ════════════════════════════════════════════════════════════════════

#[test]
fn add_after_pushes_onto_the_head_of_the_chain() {
    let flow = piece_trigger_flow();
    let flow = applied(&flow, add_after("trigger", piece_action_request("step_1", "First", json!({}))));
    let flow = applied(&flow, add_after("trigger", piece_action_request("step_2", "Second", json!({}))));
    // The later add lands directly after the trigger.
    assert_eq!(step_names(&flow), ["trigger", "step_2", "step_1"]);
}

#[test]
fn add_inside_loop_fills_the_body_slot() {
    let flow = piece_trigger_flow();
    let flow = applied(&flow, add_after("trigger", loop_action_request("step_1", "{{trigger.rows}}")));
    let flow = applied(
        &flow,
        add_at("step_1", StepLocation::InsideLoop, None, piece_action_request("step_2", "Body", json!({}))),
    );
    let loop_step = flowops::get_step(&flow, "step_1").unwrap();
    match &loop_step.kind {
        StepKind::ActionLoop {
            first_loop_action, ..
        } => assert_eq!(first_loop_action.as_ref().unwrap().name, "step_2"),
        other => panic!("expected loop, got {other:?}"),
    }
    assert!(loop_step.next.is_none());
}

#[test]
fn add_inside_branch_slots_and_router_children() {
    let flow = piece_trigger_flow();
    let flow = applied(&flow, add_after("trigger", branch_action_request("step_1")));
    let flow = applied(
        &flow,
        add_at("step_1", StepLocation::InsideTrueBranch, None, piece_action_request("step_2", "Yes", json!({}))),
    );
    let flow = applied(
        &flow,
        add_at("step_1", StepLocation::InsideFalseBranch, None, piece_action_request("step_3", "No", json!({}))),
    );
    assert_eq!(step_names(&flow), ["trigger", "step_1", "step_2", "step_3"]);

    let flow = applied(&flow, add_after("step_1", router_action_request("step_4")));
    let flow = applied(
        &flow,
        add_at("step_4", StepLocation::InsideBranch, Some(1), piece_action_request("step_5", "Routed", json!({}))),
    );
    let router = flowops::get_step(&flow, "step_4").unwrap();
    match &router.kind {
        StepKind::ActionRouter { settings, children } => {
            assert_eq!(children.len(), settings.branches.len());
            assert!(children[0].is_none());
            assert_eq!(children[1].as_ref().unwrap().name, "step_5");
        }
        other => panic!("expected router, got {other:?}"),
    }
}

#[test]
fn add_with_structural_location_on_plain_parent_degrades_to_after() {
    let flow = piece_trigger_flow();
    let flow = applied(&flow, add_after("trigger", piece_action_request("step_1", "P", json!({}))));
    let flow = applied(
        &flow,
        add_at("step_1", StepLocation::InsideLoop, None, piece_action_request("step_2", "Tail", json!({}))),
    );
    assert_eq!(step_names(&flow), ["trigger", "step_1", "step_2"]);
}

#[test]
fn add_with_mismatched_location_on_composite_parent_is_rejected() {
    let flow = piece_trigger_flow();
    let flow = applied(&flow, add_after("trigger", loop_action_request("step_1", "{{trigger.rows}}")));
    let err = apply(
        &flow,
        add_at("step_1", StepLocation::InsideTrueBranch, None, piece_action_request("step_2", "X", json!({}))),
    )
    .unwrap_err();
    assert_eq!(
        err,
        FlowError::InvalidLocation {
            parent: "step_1".to_string(),
            location: StepLocation::InsideTrueBranch,
        }
    );
}

#[test]
fn add_inside_router_requires_a_branch_index() {
    let flow = piece_trigger_flow();
    let flow = applied(&flow, add_after("trigger", router_action_request("step_1")));
    let err = apply(
        &flow,
        add_at("step_1", StepLocation::InsideBranch, None, piece_action_request("step_2", "X", json!({}))),
    )
    .unwrap_err();
    assert_eq!(
        err,
        FlowError::MissingBranchIndex {
            parent: "step_1".to_string(),
        }
    );
}

#[test]
fn add_upgrades_the_new_piece_version() {
    let flow = piece_trigger_flow();
    let flow = applied(&flow, add_after("trigger", piece_action_request("step_1", "P", json!({}))));
    let step = flowops::get_step(&flow, "step_1").unwrap();
    assert_eq!(step.piece_settings().unwrap().piece_version, "~0.4.0");
}

// ════════════════════════════════════════════════════════════════════
// DELETE_ACTION
// ════════════════════════════════════════════════════════════════════

#[test]
fn delete_splices_next_and_drops_structural_descendants() {
    // trigger -> branch { success: a1 -> a2, failure: a3 } -> a4
    let flow = flow_with_chain(json!({
        "type": "ACTION_BRANCH",
        "name": "step_1",
        "displayName": "Check",
        "valid": true,
        "settings": { "conditions": [[{}]] },
        "onSuccess": piece_step_value("step_2", "A1", json!({}),
            piece_step_value("step_3", "A2", json!({}), Value::Null)),
        "onFailure": piece_step_value("step_4", "A3", json!({}), Value::Null),
        "next": piece_step_value("step_5", "A4", json!({}), Value::Null)
    }));
    let flow = applied(
        &flow,
        FlowOperation::DeleteAction(DeleteActionRequest {
            name: "step_1".to_string(),
        }),
    );
    assert_eq!(step_names(&flow), ["trigger", "step_5"]);
}

#[test]
fn delete_is_a_left_inverse_of_add_after() {
    let flow = piece_trigger_flow();
    let flow = applied(&flow, add_after("trigger", piece_action_request("step_1", "P", json!({}))));
    let grown = applied(&flow, add_after("step_1", piece_action_request("step_2", "Q", json!({}))));
    let shrunk = applied(
        &grown,
        FlowOperation::DeleteAction(DeleteActionRequest {
            name: "step_2".to_string(),
        }),
    );
    assert_eq!(shrunk, flow);
}

// ════════════════════════════════════════════════════════════════════
// UPDATE_ACTION / UPDATE_TRIGGER
// ════════════════════════════════════════════════════════════════════

#[test]
fn update_keeps_slots_when_the_kind_is_unchanged() {
    let flow = piece_trigger_flow();
    let flow = applied(&flow, add_after("trigger", branch_action_request("step_1")));
    let flow = applied(
        &flow,
        add_at("step_1", StepLocation::InsideTrueBranch, None, piece_action_request("step_2", "Yes", json!({}))),
    );
    let flow = applied(
        &flow,
        FlowOperation::UpdateAction(branch_action_request("step_1")),
    );
    let branch = flowops::get_step(&flow, "step_1").unwrap();
    match &branch.kind {
        StepKind::ActionBranch { on_success, .. } => {
            assert_eq!(on_success.as_ref().unwrap().name, "step_2");
        }
        other => panic!("expected branch, got {other:?}"),
    }
}

#[test]
fn update_to_a_different_kind_keeps_only_next() {
    let flow = piece_trigger_flow();
    let flow = applied(&flow, add_after("trigger", branch_action_request("step_1")));
    let flow = applied(
        &flow,
        add_at("step_1", StepLocation::InsideTrueBranch, None, piece_action_request("step_2", "Yes", json!({}))),
    );
    let flow = applied(&flow, add_after("step_1", piece_action_request("step_3", "Tail", json!({}))));
    let flow = applied(
        &flow,
        FlowOperation::UpdateAction(loop_action_request("step_1", "{{trigger.rows}}")),
    );
    let updated = flowops::get_step(&flow, "step_1").unwrap();
    match &updated.kind {
        StepKind::ActionLoop {
            first_loop_action, ..
        } => assert!(first_loop_action.is_none()),
        other => panic!("expected loop, got {other:?}"),
    }
    assert_eq!(updated.next.as_ref().unwrap().name, "step_3");
    // the branch's structural child went away with the kind change
    assert_eq!(step_names(&flow), ["trigger", "step_1", "step_3"]);
}

#[test]
fn update_trigger_preserves_name_and_next() {
    let flow = piece_trigger_flow();
    let flow = applied(&flow, add_after("trigger", piece_action_request("step_1", "P", json!({}))));
    let flow = applied(
        &flow,
        FlowOperation::UpdateTrigger(
            serde_json::from_value::<UpdateTriggerRequest>(json!({
                "type": "TRIGGER_PIECE",
                "displayName": "Webhook Received",
                "settings": {
                    "pieceName": "webhook",
                    "pieceVersion": "0.6.1",
                    "input": {}
                }
            }))
            .unwrap(),
        ),
    );
    assert_eq!(flow.trigger.name, "trigger");
    assert_eq!(flow.trigger.display_name, "Webhook Received");
    assert_eq!(flow.trigger.next.as_ref().unwrap().name, "step_1");
    // the rebuilt trigger's piece version is pinned on the way in
    assert_eq!(
        flow.trigger.piece_settings().unwrap().piece_version,
        "~0.6.1"
    );
}

// ════════════════════════════════════════════════════════════════════
// MOVE_ACTION
// ════════════════════════════════════════════════════════════════════

#[test]
fn move_into_an_empty_loop_body() {
    let flow = piece_trigger_flow();
    let flow = applied(&flow, add_after("trigger", loop_action_request("step_1", "{{trigger.rows}}")));
    let flow = applied(&flow, add_after("step_1", piece_action_request("step_2", "A", json!({}))));
    let flow = applied(
        &flow,
        FlowOperation::MoveAction(MoveActionRequest {
            name: "step_2".to_string(),
            new_parent_step: "step_1".to_string(),
            step_location_relative_to_new_parent: StepLocation::InsideLoop,
            branch_index: None,
        }),
    );
    let loop_step = flowops::get_step(&flow, "step_1").unwrap();
    assert!(loop_step.next.is_none());
    match &loop_step.kind {
        StepKind::ActionLoop {
            first_loop_action, ..
        } => {
            let body = first_loop_action.as_ref().unwrap();
            assert_eq!(body.name, "step_2");
            assert!(body.next.is_none());
        }
        other => panic!("expected loop, got {other:?}"),
    }
}

#[test]
fn move_carries_a_composite_subtree_along() {
    // trigger -> loop { body: a -> b } -> target
    let flow = piece_trigger_flow();
    let flow = applied(&flow, add_after("trigger", loop_action_request("step_1", "{{trigger.rows}}")));
    let flow = applied(
        &flow,
        add_at("step_1", StepLocation::InsideLoop, None, piece_action_request("step_2", "A", json!({}))),
    );
    let flow = applied(&flow, add_after("step_2", piece_action_request("step_3", "B", json!({}))));
    let flow = applied(&flow, add_after("step_1", piece_action_request("step_4", "Target", json!({}))));
    assert_eq!(step_names(&flow), ["trigger", "step_1", "step_2", "step_3", "step_4"]);

    // move the loop (with its body) after step_4
    let flow = applied(
        &flow,
        FlowOperation::MoveAction(MoveActionRequest {
            name: "step_1".to_string(),
            new_parent_step: "step_4".to_string(),
            step_location_relative_to_new_parent: StepLocation::After,
            branch_index: None,
        }),
    );
    assert_eq!(step_names(&flow), ["trigger", "step_4", "step_1", "step_2", "step_3"]);
    let loop_step = flowops::get_step(&flow, "step_1").unwrap();
    match &loop_step.kind {
        StepKind::ActionLoop {
            first_loop_action, ..
        } => {
            let body = first_loop_action.as_ref().unwrap();
            assert_eq!(body.name, "step_2");
            assert_eq!(body.next.as_ref().unwrap().name, "step_3");
        }
        other => panic!("expected loop, got {other:?}"),
    }
}

#[test]
fn move_with_a_missing_endpoint_is_rejected() {
    let flow = piece_trigger_flow();
    let flow = applied(&flow, add_after("trigger", piece_action_request("step_1", "P", json!({}))));

    let missing_source = apply(
        &flow,
        FlowOperation::MoveAction(MoveActionRequest {
            name: "ghost".to_string(),
            new_parent_step: "step_1".to_string(),
            step_location_relative_to_new_parent: StepLocation::After,
            branch_index: None,
        }),
    )
    .unwrap_err();
    assert_eq!(
        missing_source,
        FlowError::StepNotFound {
            name: "ghost".to_string()
        }
    );

    let missing_destination = apply(
        &flow,
        FlowOperation::MoveAction(MoveActionRequest {
            name: "step_1".to_string(),
            new_parent_step: "ghost".to_string(),
            step_location_relative_to_new_parent: StepLocation::After,
            branch_index: None,
        }),
    )
    .unwrap_err();
    assert_eq!(
        missing_destination,
        FlowError::StepNotFound {
            name: "ghost".to_string()
        }
    );

    let trigger_source = apply(
        &flow,
        FlowOperation::MoveAction(MoveActionRequest {
            name: "trigger".to_string(),
            new_parent_step: "step_1".to_string(),
            step_location_relative_to_new_parent: StepLocation::After,
            branch_index: None,
        }),
    )
    .unwrap_err();
    assert_eq!(
        trigger_source,
        FlowError::NotAnAction {
            name: "trigger".to_string()
        }
    );
}

// ════════════════════════════════════════════════════════════════════
// DUPLICATE_ACTION
// ════════════════════════════════════════════════════════════════════

#[test]
fn duplicate_renames_and_rewrites_references() {
    let flow = piece_trigger_flow();
    let flow = applied(
        &flow,
        add_after(
            "trigger",
            piece_action_request("step_1", "P", json!({ "message": "hello {{step_1.name}}" })),
        ),
    );
    let flow = applied(
        &flow,
        FlowOperation::DuplicateAction(DuplicateActionRequest {
            name: "step_1".to_string(),
        }),
    );
    assert_eq!(step_names(&flow), ["trigger", "step_1", "step_2"]);

    let copy = flowops::get_step(&flow, "step_2").unwrap();
    assert_eq!(copy.display_name, "P Copy");
    assert_eq!(
        copy.piece_settings().unwrap().input,
        json!({ "message": "hello {{step_2.name}}" })
    );

    // the source is untouched
    let source = flowops::get_step(&flow, "step_1").unwrap();
    assert_eq!(source.display_name, "P");
    assert_eq!(
        source.piece_settings().unwrap().input,
        json!({ "message": "hello {{step_1.name}}" })
    );
}

#[test]
fn duplicate_preserves_subtree_structure_with_fresh_names() {
    let flow = piece_trigger_flow();
    let flow = applied(&flow, add_after("trigger", loop_action_request("step_1", "{{trigger.rows}}")));
    let flow = applied(
        &flow,
        add_at(
            "step_1",
            StepLocation::InsideLoop,
            None,
            piece_action_request("step_2", "A", json!({ "m": "{{step_2.out}} via {{step_1.item}}" })),
        ),
    );
    let flow = applied(&flow, add_after("step_2", piece_action_request("step_3", "B", json!({}))));

    let flow = applied(
        &flow,
        FlowOperation::DuplicateAction(DuplicateActionRequest {
            name: "step_1".to_string(),
        }),
    );
    assert_eq!(
        step_names(&flow),
        ["trigger", "step_1", "step_2", "step_3", "step_4", "step_5", "step_6"]
    );

    let copy = flowops::get_step(&flow, "step_4").unwrap();
    assert_eq!(copy.display_name, "For Each Copy");
    match &copy.kind {
        StepKind::ActionLoop {
            first_loop_action, ..
        } => {
            let body = first_loop_action.as_ref().unwrap();
            assert_eq!(body.name, "step_5");
            assert_eq!(
                body.piece_settings().unwrap().input,
                json!({ "m": "{{step_5.out}} via {{step_4.item}}" })
            );
            assert_eq!(body.next.as_ref().unwrap().name, "step_6");
        }
        other => panic!("expected loop, got {other:?}"),
    }
}

#[test]
fn duplicate_of_a_missing_step_is_rejected() {
    let flow = piece_trigger_flow();
    let err = apply(
        &flow,
        FlowOperation::DuplicateAction(DuplicateActionRequest {
            name: "ghost".to_string(),
        }),
    )
    .unwrap_err();
    assert_eq!(
        err,
        FlowError::StepNotFound {
            name: "ghost".to_string()
        }
    );
}

// ════════════════════════════════════════════════════════════════════
// Router branch operations
// ════════════════════════════════════════════════════════════════════

#[test]
fn add_branch_inserts_an_empty_aligned_branch() {
    let flow = piece_trigger_flow();
    let flow = applied(&flow, add_after("trigger", router_action_request("step_1")));
    let flow = applied(
        &flow,
        FlowOperation::AddBranch(BranchOperationRequest {
            step_name: "step_1".to_string(),
            branch_index: 1,
        }),
    );
    let router = flowops::get_step(&flow, "step_1").unwrap();
    match &router.kind {
        StepKind::ActionRouter { settings, children } => {
            assert_eq!(children.len(), 3);
            assert_eq!(settings.branches.len(), 3);
            assert!(children[1].is_none());
            assert_eq!(settings.branches[1].branch_name, "Branch 3");
        }
        other => panic!("expected router, got {other:?}"),
    }
}

#[test]
fn delete_branch_removes_child_and_metadata_together() {
    let flow = piece_trigger_flow();
    let flow = applied(&flow, add_after("trigger", router_action_request("step_1")));
    let flow = applied(
        &flow,
        add_at("step_1", StepLocation::InsideBranch, Some(0), piece_action_request("step_2", "A", json!({}))),
    );
    let flow = applied(
        &flow,
        FlowOperation::DeleteBranch(BranchOperationRequest {
            step_name: "step_1".to_string(),
            branch_index: 0,
        }),
    );
    let router = flowops::get_step(&flow, "step_1").unwrap();
    match &router.kind {
        StepKind::ActionRouter { settings, children } => {
            assert_eq!(children.len(), 1);
            assert_eq!(settings.branches.len(), 1);
            assert_eq!(settings.branches[0].branch_name, "Otherwise");
        }
        other => panic!("expected router, got {other:?}"),
    }
    assert!(flowops::get_step(&flow, "step_2").is_none());
}

#[test]
fn duplicate_branch_lands_just_before_the_last_branch() {
    let flow = piece_trigger_flow();
    let flow = applied(&flow, add_after("trigger", router_action_request("step_1")));
    let flow = applied(
        &flow,
        add_at(
            "step_1",
            StepLocation::InsideBranch,
            Some(0),
            piece_action_request("step_2", "A", json!({ "m": "{{step_2.out}}" })),
        ),
    );
    let flow = applied(
        &flow,
        FlowOperation::DuplicateBranch(BranchOperationRequest {
            step_name: "step_1".to_string(),
            branch_index: 0,
        }),
    );
    let router = flowops::get_step(&flow, "step_1").unwrap();
    match &router.kind {
        StepKind::ActionRouter { settings, children } => {
            assert_eq!(children.len(), 3);
            assert_eq!(settings.branches.len(), 3);
            assert_eq!(settings.branches[0].branch_name, "Branch 1");
            assert_eq!(settings.branches[1].branch_name, "Branch 1 Copy");
            assert_eq!(settings.branches[2].branch_name, "Otherwise");

            let copy = children[1].as_ref().unwrap();
            assert_eq!(copy.name, "step_3");
            assert_eq!(copy.display_name, "A Copy");
            assert_eq!(
                copy.piece_settings().unwrap().input,
                json!({ "m": "{{step_3.out}}" })
            );
        }
        other => panic!("expected router, got {other:?}"),
    }
}

#[test]
fn branch_operations_reject_non_routers_and_bad_indices() {
    let flow = piece_trigger_flow();
    let flow = applied(&flow, add_after("trigger", piece_action_request("step_1", "P", json!({}))));
    let err = apply(
        &flow,
        FlowOperation::AddBranch(BranchOperationRequest {
            step_name: "step_1".to_string(),
            branch_index: 0,
        }),
    )
    .unwrap_err();
    assert_eq!(
        err,
        FlowError::NotARouter {
            name: "step_1".to_string()
        }
    );

    let flow = applied(&flow, add_after("step_1", router_action_request("step_2")));
    let err = apply(
        &flow,
        FlowOperation::DeleteBranch(BranchOperationRequest {
            step_name: "step_2".to_string(),
            branch_index: 5,
        }),
    )
    .unwrap_err();
    assert_eq!(
        err,
        FlowError::BranchIndexOutOfRange {
            name: "step_2".to_string(),
            index: 5,
            len: 2,
        }
    );
}

// ════════════════════════════════════════════════════════════════════
// LOCK_FLOW / CHANGE_NAME / cross-cutting guarantees
// ════════════════════════════════════════════════════════════════════

#[test]
fn lock_and_rename_touch_only_the_envelope() {
    let flow = piece_trigger_flow();
    let locked = applied(&flow, FlowOperation::LockFlow);
    assert_eq!(locked.state, FlowState::Locked);
    assert_eq!(locked.trigger, flow.trigger);

    let renamed = applied(
        &flow,
        FlowOperation::ChangeName(ChangeNameRequest {
            display_name: "Renamed Flow".to_string(),
        }),
    );
    assert_eq!(renamed.display_name, "Renamed Flow");
    assert_eq!(renamed.trigger, flow.trigger);
}

#[test]
fn apply_never_mutates_its_input() {
    let flow = piece_trigger_flow();
    let flow = applied(&flow, add_after("trigger", loop_action_request("step_1", "{{trigger.rows}}")));
    let flow = applied(
        &flow,
        add_at("step_1", StepLocation::InsideLoop, None, piece_action_request("step_2", "A", json!({}))),
    );
    let snapshot = flow.clone();

    let _ = applied(
        &flow,
        FlowOperation::DuplicateAction(DuplicateActionRequest {
            name: "step_1".to_string(),
        }),
    );
    let _ = apply(
        &flow,
        FlowOperation::MoveAction(MoveActionRequest {
            name: "step_1".to_string(),
            new_parent_step: "ghost".to_string(),
            step_location_relative_to_new_parent: StepLocation::After,
            branch_index: None,
        }),
    );
    assert_eq!(flow, snapshot);
}

#[test]
fn flow_validity_tracks_step_validity() {
    let flow = piece_trigger_flow();
    let flow = applied(&flow, add_after("trigger", piece_action_request("step_1", "P", json!({}))));
    assert!(flow.valid);

    // an action whose settings fail schema validation poisons the flow
    let invalid_request: flowops::ActionRequest = serde_json::from_value(json!({
        "type": "ACTION_PIECE",
        "name": "step_2",
        "displayName": "Broken",
        "settings": { "pieceName": "", "pieceVersion": "0.1.0", "input": {} }
    }))
    .unwrap();
    let flow = applied(&flow, add_after("step_1", invalid_request));
    assert!(!flow.valid);
    assert!(!flowops::get_step(&flow, "step_2").unwrap().valid);
    assert!(!flowops::is_valid(&flow));
}
