// 💵 Salary Normalization - One parser for every entry point
// Every RosterEntry salary goes through normalize_salary(), so spent totals
// are always computed from the same numbers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw salary as it arrives from a caller or the player service:
/// a number, a currency string like "$1,234,567", or nothing usable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum SalaryInput {
    Amount(f64),
    Text(String),
    #[default]
    Missing,
}

impl From<Value> for SalaryInput {
    fn from(value: Value) -> Self {
        match value {
            Value::Number(n) => n.as_f64().map(SalaryInput::Amount).unwrap_or_default(),
            Value::String(s) => SalaryInput::Text(s),
            _ => SalaryInput::Missing,
        }
    }
}

impl From<SalaryInput> for Value {
    fn from(input: SalaryInput) -> Self {
        match input {
            SalaryInput::Amount(v) => serde_json::Number::from_f64(v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            SalaryInput::Text(s) => Value::String(s),
            SalaryInput::Missing => Value::Null,
        }
    }
}

impl From<f64> for SalaryInput {
    fn from(v: f64) -> Self {
        SalaryInput::Amount(v)
    }
}

impl From<u64> for SalaryInput {
    fn from(v: u64) -> Self {
        SalaryInput::Amount(v as f64)
    }
}

impl From<&str> for SalaryInput {
    fn from(s: &str) -> Self {
        SalaryInput::Text(s.to_string())
    }
}

impl From<String> for SalaryInput {
    fn from(s: String) -> Self {
        SalaryInput::Text(s)
    }
}

/// Normalize any salary input to a non-negative, finite amount.
/// Unparsable, missing, negative or non-finite values become 0.
pub fn normalize_salary(input: &SalaryInput) -> f64 {
    let value = match input {
        SalaryInput::Amount(v) => Some(*v),
        SalaryInput::Text(s) => parse_salary_text(s),
        SalaryInput::Missing => None,
    };

    match value {
        Some(v) if v.is_finite() && v >= 0.0 => v,
        _ => 0.0,
    }
}

/// Parse a currency-formatted string ("$47,600,000", " 1 234.5 ", "47.6M").
/// A trailing M is dropped without scaling, matching the player service.
/// Returns None when nothing numeric remains after stripping symbols.
pub fn parse_salary_text(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();
    let cleaned = cleaned.strip_suffix(&['M', 'm'][..]).unwrap_or(&cleaned);

    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Format an amount with a dollar sign and thousands grouping.
/// Whole amounts print without decimals, others are rounded to cents.
/// NaN prints as "$0"; an overflowed total prints as "$∞".
pub fn format_salary(amount: f64) -> String {
    if amount.is_nan() {
        return "$0".to_string();
    }
    if amount.is_infinite() {
        return if amount < 0.0 { "-$∞" } else { "$∞" }.to_string();
    }

    // Digits come from the float's own decimal text, so no integer width limits apply
    let text = format!("{:.2}", amount.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    let sign = if amount < 0.0 && text != "0.00" { "-" } else { "" };

    if fraction == "00" {
        format!("{}${}", sign, group_thousands(whole))
    } else {
        format!("{}${}.{}", sign, group_thousands(whole), fraction)
    }
}

/// Pick the display string for a new entry: the caller's own text when it
/// has one, otherwise the formatted salary.
pub fn display_salary(supplied: Option<&str>, salary: f64) -> String {
    match supplied.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => format_salary(salary),
    }
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    grouped
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_string_normalizes() {
        assert_eq!(normalize_salary(&"$1,234,567".into()), 1_234_567.0);
        assert_eq!(normalize_salary(&"$47,600,000".into()), 47_600_000.0);
        assert_eq!(normalize_salary(&" 12,500.50 ".into()), 12_500.5);
    }

    #[test]
    fn test_bad_input_is_zero() {
        assert_eq!(normalize_salary(&"TBD".into()), 0.0);
        assert_eq!(normalize_salary(&"$".into()), 0.0);
        assert_eq!(normalize_salary(&"NaN".into()), 0.0);
        assert_eq!(normalize_salary(&"inf".into()), 0.0);
        assert_eq!(normalize_salary(&SalaryInput::Missing), 0.0);
        assert_eq!(normalize_salary(&SalaryInput::Amount(f64::NAN)), 0.0);
        assert_eq!(normalize_salary(&SalaryInput::Amount(-10.0)), 0.0);
    }

    #[test]
    fn test_salary_input_from_json() {
        let from_number: SalaryInput = serde_json::from_str("47600000").unwrap();
        let from_text: SalaryInput = serde_json::from_str("\"$1,000\"").unwrap();
        let from_null: SalaryInput = serde_json::from_str("null").unwrap();
        let from_bool: SalaryInput = serde_json::from_str("true").unwrap();

        assert_eq!(from_number, SalaryInput::Amount(47_600_000.0));
        assert_eq!(from_text, SalaryInput::Text("$1,000".to_string()));
        assert_eq!(from_null, SalaryInput::Missing);
        assert_eq!(from_bool, SalaryInput::Missing);
    }

    #[test]
    fn test_format_salary_grouping() {
        assert_eq!(format_salary(0.0), "$0");
        assert_eq!(format_salary(999.0), "$999");
        assert_eq!(format_salary(1_000.0), "$1,000");
        assert_eq!(format_salary(47_600_000.0), "$47,600,000");
        assert_eq!(format_salary(-27_600_000.0), "-$27,600,000");
        assert_eq!(format_salary(1_234.5), "$1,234.50");
        assert_eq!(format_salary(-0.001), "$0");
    }

    #[test]
    fn test_format_salary_huge_amounts() {
        assert_eq!(format_salary(1e20), "$100,000,000,000,000,000,000");
        assert_eq!(format_salary(-1e20), "-$100,000,000,000,000,000,000");
        assert_eq!(format_salary(f64::INFINITY), "$∞");
        assert_eq!(format_salary(f64::NAN), "$0");

        let amount = normalize_salary(&SalaryInput::Amount(1e20));
        assert_eq!(display_salary(None, amount), "$100,000,000,000,000,000,000");
    }

    #[test]
    fn test_million_suffix_is_stripped() {
        assert_eq!(parse_salary_text("47.6M"), Some(47.6));
        assert_eq!(normalize_salary(&"$24.96M".into()), 24.96);
        assert_eq!(parse_salary_text("M"), None);
    }

    #[test]
    fn test_display_salary_prefers_supplied() {
        assert_eq!(display_salary(Some("$47.6M"), 47_600_000.0), "$47.6M");
        assert_eq!(display_salary(Some("  "), 1_000.0), "$1,000");
        assert_eq!(display_salary(None, 1_000.0), "$1,000");
    }
}
