//! Test fixtures and helpers
//!
//! Flows are built through the wire format (`serde_json::json!`) so the
//! fixtures double as a check of the serde mapping.

use flowops::{
    ActionKind, ActionRequest, FlowVersion, PieceSettings, SampleDataSettings, Step,
};
use serde_json::{json, Value};

/// A draft flow with a configured piece trigger and no actions.
pub fn piece_trigger_flow() -> FlowVersion {
    serde_json::from_value(json!({
        "displayName": "Test Flow",
        "state": "DRAFT",
        "valid": true,
        "trigger": {
            "type": "TRIGGER_PIECE",
            "name": "trigger",
            "displayName": "New Row",
            "valid": true,
            "settings": {
                "pieceName": "google-forms",
                "pieceVersion": "~0.5.0",
                "input": {},
                "inputUiInfo": {}
            }
        }
    }))
    .expect("fixture flow deserializes")
}

/// A full piece step as a wire value, for splicing into fixture flows.
pub fn piece_step_value(name: &str, display_name: &str, input: Value, next: Value) -> Value {
    let mut step = json!({
        "type": "ACTION_PIECE",
        "name": name,
        "displayName": display_name,
        "valid": true,
        "settings": {
            "pieceName": "http",
            "pieceVersion": "~0.3.0",
            "input": input,
            "inputUiInfo": {}
        }
    });
    if !next.is_null() {
        step["next"] = next;
    }
    step
}

pub fn step_from_value(value: Value) -> Step {
    serde_json::from_value(value).expect("fixture step deserializes")
}

/// Attach a pre-built chain under the fixture trigger.
pub fn flow_with_chain(head: Value) -> FlowVersion {
    let mut flow = piece_trigger_flow();
    flow.trigger.next = Some(Box::new(step_from_value(head)));
    flow.valid = flowops::is_valid(&flow);
    flow
}

/// Add-request payload for a plain piece action.
pub fn piece_action_request(name: &str, display_name: &str, input: Value) -> ActionRequest {
    ActionRequest {
        name: name.to_string(),
        display_name: display_name.to_string(),
        valid: None,
        kind: ActionKind::ActionPiece {
            settings: PieceSettings {
                piece_name: "slack".to_string(),
                piece_version: "0.4.0".to_string(),
                input,
                input_ui_info: SampleDataSettings::default(),
            },
        },
    }
}

/// Add-request payload for a loop action.
pub fn loop_action_request(name: &str, items: &str) -> ActionRequest {
    serde_json::from_value(json!({
        "type": "ACTION_LOOP",
        "name": name,
        "displayName": "For Each",
        "settings": { "items": items }
    }))
    .expect("loop request deserializes")
}

/// Add-request payload for a branch action.
pub fn branch_action_request(name: &str) -> ActionRequest {
    serde_json::from_value(json!({
        "type": "ACTION_BRANCH",
        "name": name,
        "displayName": "Check",
        "settings": { "conditions": [[{ "operator": "TEXT_CONTAINS" }]] }
    }))
    .expect("branch request deserializes")
}

/// Add-request payload for a two-branch router action.
pub fn router_action_request(name: &str) -> ActionRequest {
    serde_json::from_value(json!({
        "type": "ACTION_ROUTER",
        "name": name,
        "displayName": "Route",
        "settings": {
            "branches": [
                { "conditions": [[{}]], "branchType": "CONDITION", "branchName": "Branch 1" },
                { "conditions": [[]], "branchType": "FALLBACK", "branchName": "Otherwise" }
            ],
            "executionType": "EXECUTE_FIRST_MATCH"
        }
    }))
    .expect("router request deserializes")
}

/// Names of every reachable step, in canonical DFS order.
pub fn step_names(flow: &FlowVersion) -> Vec<String> {
    flowops::get_all_steps(&flow.trigger)
        .iter()
        .map(|step| step.name.clone())
        .collect()
}
