//! Line-item parsing: LLM JSON answer → [`LineItem`] records.
//!
//! Models asked for JSON do not always answer with bare JSON: the object may
//! come wrapped in a ```` ```json ```` fence, amounts may be numbers or
//! strings, and the subtotal key follows whichever spelling the prompt used.
//! Everything is normalised to strings here so downstream consumers see one
//! shape.

use crate::error::LineItemError;
use crate::output::LineItem;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|JSON)?[ \t]*\n(.*)\n```\s*$").unwrap());

fn strip_json_fences(input: &str) -> &str {
    let trimmed = input.trim();
    match RE_OUTER_FENCES.captures(trimmed).and_then(|c| c.get(1)) {
        Some(m) => m.as_str(),
        None => trimmed,
    }
}

/// Render a JSON field as text: strings verbatim, null/absent as "".
fn field_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Parse the model's answer into line items tagged with `file_name`.
///
/// The answer is expected to be `{"items": [...]}`; a missing `items` key
/// yields no items, a bare array is accepted as the item list. Entries that
/// are not objects are skipped.
pub fn parse_line_items(response: &str, file_name: &str) -> Result<Vec<LineItem>, LineItemError> {
    let value: Value = serde_json::from_str(strip_json_fences(response)).map_err(|e| {
        LineItemError::InvalidResponse {
            detail: e.to_string(),
        }
    })?;

    let entries = match &value {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("items") {
            Some(Value::Array(items)) => items.as_slice(),
            Some(Value::Null) | None => &[],
            Some(other) => {
                return Err(LineItemError::InvalidResponse {
                    detail: format!("\"items\" is not a list: {other}"),
                })
            }
        },
        other => {
            return Err(LineItemError::InvalidResponse {
                detail: format!("expected a JSON object, got {other}"),
            })
        }
    };

    let mut items = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let Some(obj) = entry.as_object() else {
            warn!("{}: skipping line item {} (not an object)", file_name, i);
            continue;
        };
        items.push(LineItem {
            file_name: file_name.to_string(),
            item_name: field_text(obj.get("item_description")),
            item_amount: field_text(obj.get("item_amount")),
            item_subcategory: field_text(obj.get("item_subcategory")),
            item_subcategory_total: field_text(
                obj.get("item_subcategory_total")
                    .or_else(|| obj.get("item-subcategory-total")),
            ),
        });
    }
    Ok(items)
}
