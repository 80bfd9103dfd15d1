use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Outcome of reading one loosely typed numeric field.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    /// Blank, absent or `null`.
    Missing,
    /// Present but not a number; carries the raw text for notes.
    Invalid(String),
    Number(Decimal),
}

impl Coerced {
    pub fn number(&self) -> Option<Decimal> {
        match self {
            Coerced::Number(d) => Some(*d),
            _ => None,
        }
    }
}

/// Parse a number as a person would type it: `$12,500`, `6.8 %`, ` 24 `.
pub fn coerce_str(raw: &str) -> Coerced {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '$' | ',' | '%' | '_'))
        .collect();

    if cleaned.is_empty() {
        return Coerced::Missing;
    }

    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map(Coerced::Number)
        .unwrap_or_else(|_| Coerced::Invalid(raw.trim().to_string()))
}

/// Read a JSON field that should be numeric but may arrive as a string.
pub fn coerce_json(value: Option<&Value>) -> Coerced {
    match value {
        None | Some(Value::Null) => Coerced::Missing,
        Some(Value::Number(n)) => match coerce_str(&n.to_string()) {
            Coerced::Number(d) => Coerced::Number(d),
            _ => Coerced::Invalid(n.to_string()),
        },
        Some(Value::String(s)) => coerce_str(s),
        Some(other) => Coerced::Invalid(other.to_string()),
    }
}

/// Loose boolean: `true`, `"yes"`, `"1"`, `1`.
pub fn coerce_flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "y" | "1"
        ),
        _ => false,
    }
}
