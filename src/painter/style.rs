use serde_json::Value;

use crate::geometry::Transform;
use crate::properties::get_style;

use super::command::{ContextValue, PainterCommand};

/// Opens a style scope for a feature: `Save` followed by one `Set` per style key.
///
/// Numeric values are lengths in map units and get multiplied by the
/// transform's scale; `dashLine` pairs are scaled element-wise. Anything else
/// is passed through. Callers close the scope with `Restore`.
pub fn process_style(commands: &mut Vec<PainterCommand>, props: &Value, transform: &Transform) {
    let scale = transform.scale_factor();
    commands.push(PainterCommand::Save);

    let Some(style) = props.get("style").and_then(Value::as_object) else {
        return;
    };
    for key in style.keys() {
        let Some(val) = get_style(props, key) else {
            continue;
        };
        if let Some(value) = context_value(key, val, scale) {
            commands.push(PainterCommand::set(key.as_str(), value));
        }
    }
}

fn context_value(key: &str, val: &Value, scale: f64) -> Option<ContextValue> {
    match val {
        Value::Number(n) => n.as_f64().map(|v| ContextValue::Number(v * scale)),
        Value::Array(items) if key == "dashLine" => Some(ContextValue::Numbers(
            items.iter().filter_map(Value::as_f64).map(|v| v * scale).collect(),
        )),
        Value::Array(items) => Some(ContextValue::Numbers(
            items.iter().filter_map(Value::as_f64).collect(),
        )),
        Value::String(s) if !s.is_empty() => Some(ContextValue::Text(s.clone())),
        Value::Bool(true) => Some(ContextValue::Flag(true)),
        _ => None,
    }
}
