//! Credential carry-forward
//!
//! When a flow version is replaced wholesale (template import, version
//! rollback), the incoming version arrives with its credentials wiped.
//! This pass copies the old version's `settings.input.auth` onto the
//! new version, matched by step name.

use serde_json::Value;

use crate::flow::FlowVersion;
use crate::transfer::transfer_flow;
use crate::traverse::get_step;

fn auth_of(flow: &FlowVersion, step_name: &str) -> Option<Value> {
    let auth = get_step(flow, step_name)?
        .settings_input()?
        .get("auth")?
        .clone();
    match &auth {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        _ => Some(auth),
    }
}

/// New flow version with each step's `auth` restored from the step of
/// the same name in the old version, where one exists.
pub fn update_flow_secrets(old_flow: &FlowVersion, new_flow: &FlowVersion) -> FlowVersion {
    transfer_flow(new_flow.clone(), |mut step| {
        let Some(auth) = auth_of(old_flow, &step.name) else {
            return step;
        };
        if let Some(Value::Object(input)) = step.settings_input_mut() {
            input.insert("auth".to_string(), auth);
        }
        step
    })
}
