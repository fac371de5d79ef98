//! Error types for flow operations
//!
//! Error code ranges:
//! - FLOW-001-009: lookup failures (missing steps, wrong step kind)
//! - FLOW-010-019: structural rejections (bad insert location, branch bounds)
//!
//! Schema-validity failures are deliberately NOT errors: they clear the
//! affected step's `valid` flag instead, so callers can hold invalid
//! intermediate states while editing.

use thiserror::Error;

use crate::ops::StepLocation;

pub type Result<T> = std::result::Result<T, FlowError>;

/// Rejections raised by operation handlers.
///
/// Every variant means the requested operation is invalid against the
/// current flow shape. Handlers work on a clone, so an `Err` leaves the
/// caller's flow untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("[FLOW-001] step '{name}' not found")]
    StepNotFound { name: String },

    #[error("[FLOW-002] step '{name}' is not an action")]
    NotAnAction { name: String },

    #[error("[FLOW-003] step '{name}' is not a router")]
    NotARouter { name: String },

    #[error("[FLOW-010] step '{parent}' cannot take a child at {location:?}")]
    InvalidLocation {
        parent: String,
        location: StepLocation,
    },

    #[error("[FLOW-011] inserting inside a branch of '{parent}' requires a branch index")]
    MissingBranchIndex { parent: String },

    #[error("[FLOW-012] branch index {index} out of range for router '{name}' ({len} branches)")]
    BranchIndexOutOfRange {
        name: String,
        index: usize,
        len: usize,
    },
}
