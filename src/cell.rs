//! Typed cell values and the policies that coerce raw text fields into them.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt::{Display, Formatter};

/// A row of cells as it is sent to the spreadsheet.
pub type Row = Vec<Cell>;

/// A single scalar value. Serializes to a JSON number or string, which is what the Sheets API
/// expects in a `ValueRange`.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Applies the convert policy to `field`: integer, then float, then trimmed text.
    pub fn convert(field: &str) -> Self {
        let trimmed = field.trim();
        if is_integer_literal(trimmed) {
            if let Ok(i) = trimmed.parse::<i64>() {
                return Cell::Int(i);
            }
        }
        match trimmed.parse::<f64>() {
            // `f64::from_str` also accepts "inf" and "NaN", which are not numeric literals here.
            Ok(f) if f.is_finite() => Cell::Float(f),
            _ => Cell::Text(trimmed.to_string()),
        }
    }

    /// Applies the raw policy to `field`: trimmed text, never a number.
    pub fn raw(field: &str) -> Self {
        Cell::Text(field.trim().to_string())
    }
}

fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Int(i) => write!(f, "{i}"),
            // Debug keeps the fractional part, e.g. 4.0 rather than 4.
            Cell::Float(x) => write!(f, "{x:?}"),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Cell::Int(i) => serializer.serialize_i64(*i),
            Cell::Float(x) => serializer.serialize_f64(*x),
            Cell::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// How raw text fields become cells.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoercionPolicy {
    /// Try integer, then float, then fall back to trimmed text.
    #[default]
    Convert,
    /// Keep every field as trimmed text.
    Raw,
}

serde_plain::derive_display_from_serialize!(CoercionPolicy);

impl CoercionPolicy {
    /// `-k` selects the raw policy.
    pub fn from_keep_raw(keep_raw: bool) -> Self {
        if keep_raw {
            CoercionPolicy::Raw
        } else {
            CoercionPolicy::Convert
        }
    }

    pub fn coerce(self, field: &str) -> Cell {
        match self {
            CoercionPolicy::Convert => Cell::convert(field),
            CoercionPolicy::Raw => Cell::raw(field),
        }
    }

    pub fn coerce_row<S>(self, fields: &[S]) -> Row
    where
        S: AsRef<str>,
    {
        fields.iter().map(|f| self.coerce(f.as_ref())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_integer() {
        assert_eq!(Cell::convert("42"), Cell::Int(42));
        assert_eq!(Cell::convert("-7"), Cell::Int(-7));
        assert_eq!(Cell::convert("+3"), Cell::Int(3));
        assert_eq!(Cell::convert(" 12 "), Cell::Int(12));
        assert_eq!(Cell::convert("007"), Cell::Int(7));
    }

    #[test]
    fn test_convert_float() {
        assert_eq!(Cell::convert("3.14"), Cell::Float(3.14));
        assert_eq!(Cell::convert("-0.5"), Cell::Float(-0.5));
        assert_eq!(Cell::convert("1e3"), Cell::Float(1000.0));
        assert_eq!(Cell::convert(".25"), Cell::Float(0.25));
        assert_eq!(Cell::convert("2.5E-1"), Cell::Float(0.25));
    }

    #[test]
    fn test_integer_overflow_becomes_float() {
        assert_eq!(
            Cell::convert("99999999999999999999"),
            Cell::Float(99999999999999999999.0)
        );
    }

    #[test]
    fn test_convert_text() {
        assert_eq!(Cell::convert("  hello  "), Cell::Text("hello".into()));
        assert_eq!(Cell::convert("12abc"), Cell::Text("12abc".into()));
        assert_eq!(Cell::convert("1,000"), Cell::Text("1,000".into()));
        assert_eq!(Cell::convert(""), Cell::Text("".into()));
        assert_eq!(Cell::convert("-"), Cell::Text("-".into()));
    }

    #[test]
    fn test_non_finite_stays_text() {
        for s in ["inf", "-inf", "NaN", "infinity"] {
            assert_eq!(Cell::convert(s), Cell::Text(s.into()));
        }
    }

    #[test]
    fn test_raw_policy_only_trims() {
        let policy = CoercionPolicy::Raw;
        assert_eq!(policy.coerce(" 42 "), Cell::Text("42".into()));
        assert_eq!(policy.coerce("3.14"), Cell::Text("3.14".into()));
        assert_eq!(policy.coerce("\thello\n"), Cell::Text("hello".into()));
    }

    #[test]
    fn test_numeric_display_reproduces_literal() {
        for s in ["42", "-7", "3.14", "2.5", "4.0", "0.1", "123456789"] {
            assert_eq!(Cell::convert(s).to_string(), s);
        }
    }

    #[test]
    fn test_coerce_row() {
        let row = CoercionPolicy::Convert.coerce_row(&["a", "1", "2.5"]);
        assert_eq!(
            row,
            vec![Cell::Text("a".into()), Cell::Int(1), Cell::Float(2.5)]
        );
        let row = CoercionPolicy::from_keep_raw(true).coerce_row(&["a", "1"]);
        assert_eq!(row, vec![Cell::Text("a".into()), Cell::Text("1".into())]);
    }

    #[test]
    fn test_serialize_as_json_scalars() {
        let row = vec![Cell::Text("a".into()), Cell::Int(1), Cell::Float(2.5)];
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"["a",1,2.5]"#);
    }
}
