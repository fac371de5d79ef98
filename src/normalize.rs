//! Normalization and piece-version upgrade
//!
//! Run before publishing: strips sample data, wipes credentials, and
//! pins piece versions to a range constraint. Idempotent.

use semver::Version;
use serde_json::Value;
use tracing::warn;

use crate::flow::FlowVersion;
use crate::step::Step;
use crate::transfer::transfer_flow;

/// Pieces that predate the range-constraint convention. Versions below
/// the cutoff are left exactly as stored.
const LEGACY_PIECES: &[(&str, (u64, u64, u64))] = &[
    ("google-sheets", (0, 3, 0)),
    ("gmail", (0, 3, 0)),
    ("typeform", (0, 2, 0)),
];

fn is_legacy_piece(piece_name: &str, piece_version: &str) -> bool {
    let Some((_, (major, minor, patch))) = LEGACY_PIECES
        .iter()
        .find(|(name, _)| *name == piece_name)
    else {
        return false;
    };
    let Ok(version) = Version::parse(piece_version) else {
        return false;
    };
    version < Version::new(*major, *minor, *patch)
}

/// Pin the piece version of the step named `target_name`.
///
/// Rules: legacy pieces and versions already carrying a `^`/`~` prefix
/// are untouched; pre-1.0 versions get a tilde (patch-range pin), the
/// rest a caret (minor-range pin).
pub(crate) fn upgrade_piece(mut step: Step, target_name: &str) -> Step {
    if step.name != target_name {
        return step;
    }
    if let Some(settings) = step.piece_settings_mut() {
        if is_legacy_piece(&settings.piece_name, &settings.piece_version)
            || settings.piece_version.starts_with('^')
            || settings.piece_version.starts_with('~')
        {
            return step;
        }
        match Version::parse(&settings.piece_version) {
            Ok(version) => {
                let prefix = if version < Version::new(1, 0, 0) { '~' } else { '^' };
                settings.piece_version = format!("{prefix}{version}");
            }
            Err(_) => warn!(
                piece = %settings.piece_name,
                version = %settings.piece_version,
                "piece version is not semver, leaving it untouched"
            ),
        }
    }
    step
}

/// Publish-ready copy of a flow version: sample data reset, piece
/// credentials wiped, piece versions pinned.
pub fn normalize(flow: &FlowVersion) -> FlowVersion {
    transfer_flow(flow.clone(), |mut step| {
        step.reset_sample_data();
        if step.is_piece() {
            if let Some(Value::Object(input)) = step.settings_input_mut() {
                if input.contains_key("auth") {
                    input.insert("auth".to_string(), Value::String(String::new()));
                }
            }
        }
        let name = step.name.clone();
        upgrade_piece(step, &name)
    })
}
