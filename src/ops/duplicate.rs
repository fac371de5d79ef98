//! DUPLICATE_ACTION
//!
//! Clones the subtree rooted at the named step, gives every clone step a
//! fresh name, rewrites data references inside the clones' inputs to the
//! new names, and inserts the result right after the source. Structural
//! descendants are rebuilt through import-operation replay.

use rustc_hash::FxHashSet;

use crate::error::{FlowError, Result};
use crate::flow::FlowVersion;
use crate::import::{get_import_operations, strip_descendants};
use crate::naming::{find_unused_name, rewrite_step_references};
use crate::step::Step;
use crate::transfer::transfer_step;
use crate::traverse::{get_all_steps, get_step};

use super::{add_action, apply, AddActionRequest, StepLocation};

/// Prefix of generated step names.
const STEP_NAME_PREFIX: &str = "step";

pub(crate) fn duplicate_action(flow: FlowVersion, name: &str) -> Result<FlowVersion> {
    let source = get_step(&flow, name).ok_or_else(|| FlowError::StepNotFound {
        name: name.to_string(),
    })?;
    if source.is_trigger() {
        return Err(FlowError::NotAnAction {
            name: name.to_string(),
        });
    }

    let mut clone = source.clone();
    clone.next = None;

    let mut existing_names: FxHashSet<String> = get_all_steps(&flow.trigger)
        .iter()
        .map(|step| step.name.clone())
        .collect();
    let renamed = rename_subtree(clone, &mut existing_names);

    let action = strip_descendants(&renamed).ok_or_else(|| FlowError::NotAnAction {
        name: name.to_string(),
    })?;
    let replay = get_import_operations(&renamed);

    let mut flow = add_action(
        flow,
        AddActionRequest {
            parent_step: name.to_string(),
            step_location_relative_to_parent: StepLocation::After,
            branch_index: None,
            branch_name: None,
            action,
        },
    )?;
    for operation in replay {
        flow = apply(&flow, operation)?;
    }
    Ok(flow)
}

/// Freshly name every step of a subtree and rewrite the data references
/// embedded in its inputs accordingly.
///
/// Each step gets the smallest free `step_K` name (the chosen names are
/// added to `existing_names` as allocation proceeds), a ` Copy` display
/// suffix, and cleared sample data. Fresh names are never equal to any
/// name pending replacement, so the rewrite order cannot chain.
pub(crate) fn rename_subtree(subtree: Step, existing_names: &mut FxHashSet<String>) -> Step {
    let old_names: Vec<String> = get_all_steps(&subtree)
        .iter()
        .map(|step| step.name.clone())
        .collect();
    let mut renames: Vec<(String, String)> = Vec::with_capacity(old_names.len());
    for old_name in old_names {
        let fresh = find_unused_name(existing_names, STEP_NAME_PREFIX);
        existing_names.insert(fresh.clone());
        renames.push((old_name, fresh));
    }

    transfer_step(subtree, &mut |mut step| {
        if let Some((_, fresh)) = renames.iter().find(|(old, _)| *old == step.name) {
            step.name = fresh.clone();
        }
        step.display_name.push_str(" Copy");
        step.reset_sample_data();
        if let Some(input) = step.settings_input_mut() {
            let mut value = std::mem::take(input);
            for (old_name, new_name) in &renames {
                value = rewrite_step_references(value, old_name, new_name);
            }
            *input = value;
        }
        step
    })
}
