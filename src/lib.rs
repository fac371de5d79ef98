//! flowops - flow-graph transformation engine for visual automation flows
//!
//! A flow version is a tree of steps rooted at a single trigger. Each
//! step carries structural children (branch arms, a loop body, router
//! branches) plus a linear `next` successor. The engine applies editing
//! operations to a version and returns a new version; the input is
//! never mutated.
//!
//! ## Module Responsibilities
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`step`] | Step model: tagged kinds, settings payloads |
//! | [`flow`] | Flow version document, trigger lifecycle, validity |
//! | [`traverse`] | Canonical DFS, lookups, parent/child queries |
//! | [`transfer`] | Deep rewrite preserving shape (sync + async) |
//! | [`ops`] | Operation requests, handlers, `apply` dispatcher |
//! | [`import`] | Subtree linearization into replayable add operations |
//! | [`naming`] | Fresh-name allocation, `{{...}}` reference rewriting |
//! | [`normalize`] | Sample-data/credential strip, piece-version pinning |
//! | [`secrets`] | Credential carry-forward between versions |
//! | [`schema`] | Per-kind settings validation (JSON Schema) |
//! | [`error`] | Operation rejections with stable codes |

pub mod error;
pub mod flow;
pub mod import;
pub mod naming;
pub mod normalize;
pub mod ops;
pub mod schema;
pub mod secrets;
pub mod step;
pub mod transfer;
pub mod traverse;

// Error types
pub use error::{FlowError, Result};

// Flow document
pub use flow::{create_empty_trigger, is_valid, FlowState, FlowVersion, TRIGGER_NAME};

// Step model
pub use step::{
    BranchSettings, BranchType, CodeSettings, EmptyTriggerSettings, LoopSettings, PieceSettings,
    RouterBranch, RouterExecutionType, RouterSettings, SampleDataSettings, SourceCode, Step,
    StepKind,
};

// Operations
pub use ops::{
    apply, ActionKind, ActionRequest, AddActionRequest, BranchOperationRequest, ChangeNameRequest,
    DeleteActionRequest, DuplicateActionRequest, FlowOperation, MoveActionRequest, StepLocation,
    TriggerKind, UpdateTriggerRequest,
};

// Queries
pub use traverse::{
    find_path_to_step, get_all_child_steps, get_all_steps, get_direct_parent_step, get_step,
    get_used_pieces, is_child_of, is_last_child_of, StepWithIndex,
};

// Rewrites
pub use import::get_import_operations;
pub use naming::{find_available_step_name, find_unused_name, rewrite_step_references};
pub use normalize::normalize;
pub use secrets::update_flow_secrets;
pub use transfer::{transfer_flow, transfer_flow_async, try_transfer_flow};
