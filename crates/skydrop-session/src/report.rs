//! Human-readable rendering of end-of-scenario stats.

use skydrop_protocol::Value;

/// Renders the `Stats` payload of `EndScenarioRun`.
///
/// Stats shaped `{KeySpecs: [{FullName, ..}, ..], Values: {..}}` print one
/// `FullName: value` line per key spec, in key-spec order. Anything else
/// prints as pretty JSON (just `Values` when present).
pub fn format_stats(stats: &Value) -> String {
    let Some(record) = stats.as_record() else {
        return pretty(stats);
    };
    let values = record.get("Values");

    let Ok(specs) = record.sequence("KeySpecs") else {
        return if values.is_null() {
            pretty(stats)
        } else {
            pretty(values)
        };
    };

    let mut out = String::new();
    for spec in specs {
        let Some(name) = spec.as_record().and_then(|s| s.get("FullName").as_str())
        else {
            continue;
        };
        out.push_str(&format!("{name}: {}\n", lookup(values, name)));
    }
    out
}

fn lookup<'a>(values: &'a Value, name: &str) -> &'a Value {
    static MISSING: Value = Value::Null;
    match values {
        Value::Record(record) => record.get(name),
        Value::Collection(collection) => collection.get(name).unwrap_or(&MISSING),
        _ => &MISSING,
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use skydrop_protocol::deserialize;

    use super::*;

    #[test]
    fn test_key_specs_drive_order() {
        let stats = deserialize(json!({
            "KeySpecs": [
                {"FullName": "orders.delivered", "ShouldDisplay": true},
                {"FullName": "orders.late"},
                {"Priority": "Emergency"},
            ],
            "Values": {"orders.late": 2, "orders.delivered": 40},
        }));
        assert_eq!(format_stats(&stats), "orders.delivered: 40\norders.late: 2\n");
    }

    #[test]
    fn test_missing_value_prints_null() {
        let stats = deserialize(json!({
            "KeySpecs": [{"FullName": "x"}],
            "Values": {},
        }));
        assert_eq!(format_stats(&stats), "x: null\n");
    }

    #[test]
    fn test_values_without_specs_print_as_json() {
        let stats = deserialize(json!({"Values": {"score": 1.5}}));
        assert_eq!(format_stats(&stats), "{\n  \"score\": 1.5\n}");
    }

    #[test]
    fn test_collection_stats_print_as_json() {
        let stats = deserialize(json!({"drone-1": 3}));
        assert_eq!(format_stats(&stats), "{\n  \"drone-1\": 3\n}");
    }

    #[test]
    fn test_null_stats() {
        assert_eq!(format_stats(&Value::Null), "null");
    }
}
