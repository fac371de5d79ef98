//! Step model
//!
//! A flow is a tree of steps rooted at a single trigger. Every step has
//! a stable `name`, a human `display_name`, a `valid` flag, and an
//! optional linear successor (`next`). Composite kinds (branch, loop,
//! router) additionally own structural child slots.
//!
//! The kind set is a closed tagged union: every composite site matches
//! exhaustively, so adding a kind is a compile-time break rather than a
//! silently ignored case.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Sample-data metadata attached to every settings kind.
///
/// Reset by normalization and duplication; never affects validity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleDataSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_selected_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_data_file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_test_date: Option<String>,
}

fn empty_input() -> Value {
    Value::Object(Map::new())
}

/// Settings of a piece step (piece action or piece trigger).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceSettings {
    pub piece_name: String,
    pub piece_version: String,
    /// Arbitrary user-configured input, may contain `{{step.field}}`
    /// references and an `auth` credential reference.
    #[serde(default = "empty_input")]
    pub input: Value,
    #[serde(default)]
    pub input_ui_info: SampleDataSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceCode {
    pub code: String,
    #[serde(default)]
    pub package_json: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSettings {
    pub source_code: SourceCode,
    #[serde(default = "empty_input")]
    pub input: Value,
    #[serde(default)]
    pub input_ui_info: SampleDataSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchSettings {
    /// Disjunction of conjunctions: outer = OR groups, inner = ANDed
    /// conditions. Condition payloads are opaque to the engine.
    pub conditions: Vec<Vec<Value>>,
    #[serde(default)]
    pub input_ui_info: SampleDataSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopSettings {
    /// Templated expression resolving to the collection to iterate.
    pub items: String,
    #[serde(default)]
    pub input_ui_info: SampleDataSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BranchType {
    Condition,
    Fallback,
}

/// Per-branch metadata of a router. Kept index-aligned with the router
/// variant's `children` vector at all times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterBranch {
    pub conditions: Vec<Vec<Value>>,
    pub branch_type: BranchType,
    pub branch_name: String,
}

impl RouterBranch {
    /// A single empty condition group, the shape a freshly added branch
    /// starts with.
    pub fn empty(branch_name: impl Into<String>) -> Self {
        RouterBranch {
            conditions: vec![vec![Value::Object(Map::new())]],
            branch_type: BranchType::Condition,
            branch_name: branch_name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouterExecutionType {
    #[default]
    ExecuteFirstMatch,
    ExecuteAllMatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterSettings {
    pub branches: Vec<RouterBranch>,
    #[serde(default)]
    pub execution_type: RouterExecutionType,
    #[serde(default)]
    pub input_ui_info: SampleDataSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmptyTriggerSettings {
    #[serde(default)]
    pub input_ui_info: SampleDataSettings,
}

/// A node of the flow tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Unique within the flow; the stable identifier data references use.
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Box<Step>>,
    #[serde(flatten)]
    pub kind: StepKind,
}

/// Kind-specific payload of a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum StepKind {
    /// Placeholder root of a freshly created flow. Never valid.
    TriggerEmpty { settings: EmptyTriggerSettings },
    TriggerPiece { settings: PieceSettings },
    ActionPiece { settings: PieceSettings },
    ActionCode { settings: CodeSettings },
    ActionBranch {
        settings: BranchSettings,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        on_success: Option<Box<Step>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        on_failure: Option<Box<Step>>,
    },
    ActionLoop {
        settings: LoopSettings,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        first_loop_action: Option<Box<Step>>,
    },
    ActionRouter {
        settings: RouterSettings,
        /// One slot per branch, index-aligned with `settings.branches`.
        children: Vec<Option<Box<Step>>>,
    },
}

impl Step {
    pub fn is_trigger(&self) -> bool {
        matches!(
            self.kind,
            StepKind::TriggerEmpty { .. } | StepKind::TriggerPiece { .. }
        )
    }

    pub fn is_action(&self) -> bool {
        !self.is_trigger()
    }

    /// True for piece actions and piece triggers.
    pub fn is_piece(&self) -> bool {
        matches!(
            self.kind,
            StepKind::TriggerPiece { .. } | StepKind::ActionPiece { .. }
        )
    }

    pub fn piece_settings(&self) -> Option<&PieceSettings> {
        match &self.kind {
            StepKind::TriggerPiece { settings } | StepKind::ActionPiece { settings } => {
                Some(settings)
            }
            _ => None,
        }
    }

    pub fn piece_settings_mut(&mut self) -> Option<&mut PieceSettings> {
        match &mut self.kind {
            StepKind::TriggerPiece { settings } | StepKind::ActionPiece { settings } => {
                Some(settings)
            }
            _ => None,
        }
    }

    /// User-configured input payload, present on piece and code steps.
    pub fn settings_input(&self) -> Option<&Value> {
        match &self.kind {
            StepKind::TriggerPiece { settings } | StepKind::ActionPiece { settings } => {
                Some(&settings.input)
            }
            StepKind::ActionCode { settings } => Some(&settings.input),
            _ => None,
        }
    }

    pub fn settings_input_mut(&mut self) -> Option<&mut Value> {
        match &mut self.kind {
            StepKind::TriggerPiece { settings } | StepKind::ActionPiece { settings } => {
                Some(&mut settings.input)
            }
            StepKind::ActionCode { settings } => Some(&mut settings.input),
            _ => None,
        }
    }

    pub fn sample_data(&self) -> &SampleDataSettings {
        match &self.kind {
            StepKind::TriggerEmpty { settings } => &settings.input_ui_info,
            StepKind::TriggerPiece { settings } | StepKind::ActionPiece { settings } => {
                &settings.input_ui_info
            }
            StepKind::ActionCode { settings } => &settings.input_ui_info,
            StepKind::ActionBranch { settings, .. } => &settings.input_ui_info,
            StepKind::ActionLoop { settings, .. } => &settings.input_ui_info,
            StepKind::ActionRouter { settings, .. } => &settings.input_ui_info,
        }
    }

    /// Clears sample-data metadata back to the default.
    pub fn reset_sample_data(&mut self) {
        let ui_info = match &mut self.kind {
            StepKind::TriggerEmpty { settings } => &mut settings.input_ui_info,
            StepKind::TriggerPiece { settings } | StepKind::ActionPiece { settings } => {
                &mut settings.input_ui_info
            }
            StepKind::ActionCode { settings } => &mut settings.input_ui_info,
            StepKind::ActionBranch { settings, .. } => &mut settings.input_ui_info,
            StepKind::ActionLoop { settings, .. } => &mut settings.input_ui_info,
            StepKind::ActionRouter { settings, .. } => &mut settings.input_ui_info,
        };
        *ui_info = SampleDataSettings::default();
    }
}
