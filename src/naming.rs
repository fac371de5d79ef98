//! Step name allocation and data-reference rewriting
//!
//! Fresh names are `<prefix>_<K>` with the smallest free K >= 1.
//!
//! Data references live in templated strings as `{{step_name.field}}`
//! spans. The rewriter edits only the inside of `{{...}}` spans, and
//! only whole identifiers (word-boundary match), so `step_1` never
//! bleeds into `step_10` and prose outside spans is untouched.

use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::FxHashSet;
use serde_json::Value;

use crate::flow::FlowVersion;
use crate::traverse::get_all_steps;

/// Template spans: `{{` ... `}}`, shortest match.
static TEMPLATE_SPAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(.*?)\}\}").expect("template span regex"));

/// Smallest `<prefix>_<K>` (K >= 1) not present in `used`.
pub fn find_unused_name(used: &FxHashSet<String>, prefix: &str) -> String {
    let mut k = 1usize;
    loop {
        let candidate = format!("{prefix}_{k}");
        if !used.contains(&candidate) {
            return candidate;
        }
        k += 1;
    }
}

/// Fresh step name against every name reachable in the flow.
pub fn find_available_step_name(flow: &FlowVersion, prefix: &str) -> String {
    let used: FxHashSet<String> = get_all_steps(&flow.trigger)
        .iter()
        .map(|step| step.name.clone())
        .collect();
    find_unused_name(&used, prefix)
}

/// Replace `old_name` with `new_name` inside every `{{...}}` span of
/// every string in `value`, recursing through arrays and objects.
/// Strings outside template spans are untouched.
pub fn rewrite_step_references(value: Value, old_name: &str, new_name: &str) -> Value {
    let identifier = Regex::new(&format!(r"\b{}\b", regex::escape(old_name)))
        .expect("escaped identifier regex");
    rewrite_value(value, &identifier, new_name)
}

fn rewrite_value(value: Value, identifier: &Regex, new_name: &str) -> Value {
    match value {
        Value::String(text) => Value::String(rewrite_text(&text, identifier, new_name)),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| rewrite_value(item, identifier, new_name))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, item)| (key, rewrite_value(item, identifier, new_name)))
                .collect(),
        ),
        other => other,
    }
}

fn rewrite_text(text: &str, identifier: &Regex, new_name: &str) -> String {
    TEMPLATE_SPAN_RE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let inner = identifier.replace_all(&caps[1], new_name);
            format!("{{{{{inner}}}}}")
        })
        .into_owned()
}
