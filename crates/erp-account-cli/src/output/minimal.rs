use serde_json::Value;

use super::format_scalar;

/// Key figure of each command, in lookup order.
const PRIORITY_KEYS: [&str; 5] = [
    "net_book_value",
    "total_paid",
    "amount",
    "final_accounting_value",
    "total_depreciation",
];

/// Print just the key answer of the output.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_answer(value));
}

fn minimal_answer(value: &Value) -> String {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result {
        for key in PRIORITY_KEYS {
            if let Some(val) = map.get(key).filter(|v| !v.is_null()) {
                return format_scalar(val);
            }
        }
        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, format_scalar(val));
        }
    }
    format_scalar(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_disposal_prefers_net_book_value() {
        let value = json!({"result": {"plan": "economic", "net_book_value": "3750.00"}});
        assert_eq!(minimal_answer(&value), "3750.00");
    }

    #[test]
    fn test_falls_back_to_first_field() {
        let value = json!({"result": {"mode": "preview"}});
        assert_eq!(minimal_answer(&value), "mode: preview");
    }
}
