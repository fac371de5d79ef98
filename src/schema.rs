//! Step schema validation
//!
//! The validation boundary between the engine and the settings payloads
//! it carries: each step kind has a JSON Schema definition (embedded at
//! build time, compiled once on first use) and a step's schema validity
//! feeds its `valid` flag.
//!
//! Validation never raises. An invalid step stays in the flow with
//! `valid == false`, which propagates to the flow's aggregate flag.

use std::sync::LazyLock;

use jsonschema::Validator;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::step::StepKind;

/// Embedded schema JSON (compiled at build time).
const SCHEMA_JSON: &str = include_str!("../schemas/step-settings.schema.json");

/// Kind tags with a settings definition in the schema file.
const KIND_KEYS: &[&str] = &[
    "TRIGGER_PIECE",
    "ACTION_PIECE",
    "ACTION_CODE",
    "ACTION_BRANCH",
    "ACTION_LOOP",
    "ACTION_ROUTER",
];

/// Compiled per-kind validators (lazy, shared).
static VALIDATORS: LazyLock<FxHashMap<&'static str, Validator>> = LazyLock::new(|| {
    let root: Value =
        serde_json::from_str(SCHEMA_JSON).expect("step settings schema is valid JSON");
    let defs = root
        .get("$defs")
        .and_then(Value::as_object)
        .expect("step settings schema has $defs");

    let mut validators = FxHashMap::default();
    for key in KIND_KEYS {
        let schema = defs
            .get(*key)
            .unwrap_or_else(|| panic!("missing schema definition for {key}"));
        let validator =
            Validator::new(schema).unwrap_or_else(|e| panic!("schema for {key} failed to compile: {e}"));
        validators.insert(*key, validator);
    }
    validators
});

/// Validate a step's settings against the schema for its kind.
///
/// The empty trigger is a placeholder and never valid; a flow stays
/// invalid until its trigger is configured.
pub fn validate_step_settings(kind: &StepKind) -> bool {
    let (key, settings) = match kind {
        StepKind::TriggerEmpty { .. } => return false,
        StepKind::TriggerPiece { settings } => ("TRIGGER_PIECE", serde_json::to_value(settings)),
        StepKind::ActionPiece { settings } => ("ACTION_PIECE", serde_json::to_value(settings)),
        StepKind::ActionCode { settings } => ("ACTION_CODE", serde_json::to_value(settings)),
        StepKind::ActionBranch { settings, .. } => {
            ("ACTION_BRANCH", serde_json::to_value(settings))
        }
        StepKind::ActionLoop { settings, .. } => ("ACTION_LOOP", serde_json::to_value(settings)),
        StepKind::ActionRouter { settings, .. } => {
            ("ACTION_ROUTER", serde_json::to_value(settings))
        }
    };
    let Ok(settings) = settings else {
        return false;
    };
    VALIDATORS
        .get(key)
        .map(|validator| validator.is_valid(&settings))
        .unwrap_or(false)
}
