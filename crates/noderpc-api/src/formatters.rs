//! Reusable input/output formatters.

use serde_json::Value;

use crate::error::ApiError;

/// Hex quantity (`"0x64"`), decimal string or JSON number → JSON number.
pub fn to_number(value: Value) -> Result<Value, ApiError> {
    match &value {
        Value::Number(_) => Ok(value),
        Value::String(s) => {
            let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                Some(hex) => u64::from_str_radix(hex, 16),
                None => s.parse::<u64>(),
            };
            parsed
                .map(Value::from)
                .map_err(|e| ApiError::Format(format!("'{s}' is not a number: {e}")))
        }
        other => Err(ApiError::Format(format!("expected a number, got {other}"))),
    }
}

/// Non-negative JSON number → hex quantity string; hex strings pass through.
pub fn to_hex_quantity(value: Value) -> Result<Value, ApiError> {
    match &value {
        Value::Number(n) => n
            .as_u64()
            .map(|n| Value::String(format!("0x{n:x}")))
            .ok_or_else(|| ApiError::Format(format!("{n} is not a non-negative integer"))),
        Value::String(s) if s.starts_with("0x") => Ok(value),
        other => Err(ApiError::Format(format!("expected a quantity, got {other}"))),
    }
}

/// Apply a value formatter to every argument.
pub fn each_param(
    f: fn(Value) -> Result<Value, ApiError>,
) -> impl Fn(Vec<Value>) -> Result<Vec<Value>, ApiError> + Send + Sync + 'static {
    move |args: Vec<Value>| args.into_iter().map(f).collect::<Result<Vec<_>, _>>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_from_hex_and_decimal() {
        assert_eq!(to_number(json!("0x65")).unwrap(), json!(101));
        assert_eq!(to_number(json!("101")).unwrap(), json!(101));
        assert_eq!(to_number(json!(101)).unwrap(), json!(101));
        assert!(to_number(json!("0xzz")).is_err());
        assert!(to_number(json!(null)).is_err());
    }

    #[test]
    fn hex_quantities() {
        assert_eq!(to_hex_quantity(json!(255)).unwrap(), json!("0xff"));
        assert_eq!(to_hex_quantity(json!("0x1")).unwrap(), json!("0x1"));
        assert!(to_hex_quantity(json!(-1)).is_err());
        assert!(to_hex_quantity(json!("12")).is_err());
    }

    #[test]
    fn each_param_stops_at_first_error() {
        let f = each_param(to_hex_quantity);
        assert_eq!(f(vec![json!(1), json!(16)]).unwrap(), vec![json!("0x1"), json!("0x10")]);
        assert!(f(vec![json!(1), json!(true)]).is_err());
    }
}
