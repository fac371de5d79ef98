//! Flow version document
//!
//! The root container operations act on: a display name, a draft/locked
//! state, the trigger tree, and an aggregate validity flag.

use serde::{Deserialize, Serialize};

use crate::step::{EmptyTriggerSettings, Step, StepKind};
use crate::traverse::get_all_steps;

/// Reserved name of the root step.
pub const TRIGGER_NAME: &str = "trigger";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowState {
    #[default]
    Draft,
    Locked,
}

/// One immutable version of a flow.
///
/// Engine calls never mutate a version in place: every operation clones
/// the input and returns a fresh value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowVersion {
    pub display_name: String,
    #[serde(default)]
    pub state: FlowState,
    pub trigger: Step,
    #[serde(default)]
    pub valid: bool,
}

impl FlowVersion {
    /// A fresh draft version with a placeholder trigger. Invalid until
    /// the trigger is configured via `UPDATE_TRIGGER`.
    pub fn new(display_name: impl Into<String>) -> Self {
        FlowVersion {
            trigger: create_empty_trigger("Select Trigger"),
            display_name: display_name.into(),
            state: FlowState::Draft,
            valid: false,
        }
    }
}

/// The placeholder root every flow is born with.
pub fn create_empty_trigger(display_name: impl Into<String>) -> Step {
    Step {
        name: TRIGGER_NAME.to_string(),
        display_name: display_name.into(),
        valid: false,
        next: None,
        kind: StepKind::TriggerEmpty {
            settings: EmptyTriggerSettings::default(),
        },
    }
}

/// A flow version is valid iff every reachable step is valid.
pub fn is_valid(flow: &FlowVersion) -> bool {
    get_all_steps(&flow.trigger).iter().all(|step| step.valid)
}
