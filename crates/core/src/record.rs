use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::money::Amount;

/// Decoded line: field name to trimmed text.
pub type FieldMap = BTreeMap<String, String>;

/// Business row fed to the encoder.
pub type Row = BTreeMap<String, FieldValue>;

/// A typed business value. `Null` behaves exactly like a missing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Amount(Amount),
    Date(NaiveDate),
    Time(NaiveTime),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

/// SIMT rendering: dates as `YYYYMMDD`, times as `HHMMSS`.
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::Integer(n) => write!(f, "{n}"),
            FieldValue::Amount(a) => write!(f, "{a}"),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y%m%d")),
            FieldValue::Time(t) => write!(f, "{}", t.format("%H%M%S")),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Integer(n)
    }
}

impl From<Amount> for FieldValue {
    fn from(a: Amount) -> Self {
        FieldValue::Amount(a)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(d: NaiveDate) -> Self {
        FieldValue::Date(d)
    }
}

impl From<NaiveTime> for FieldValue {
    fn from(t: NaiveTime) -> Self {
        FieldValue::Time(t)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Null, Into::into)
    }
}

/// Builds a [`Row`] from `(name, value)` pairs.
pub fn row<K, V, I>(pairs: I) -> Row
where
    K: Into<String>,
    V: Into<FieldValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_simt_formats() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        let t = NaiveTime::from_hms_opt(9, 5, 0).unwrap();
        assert_eq!(FieldValue::Date(d).to_string(), "20240307");
        assert_eq!(FieldValue::Time(t).to_string(), "090500");
        assert_eq!(FieldValue::Integer(42).to_string(), "42");
        assert_eq!(FieldValue::Null.to_string(), "");
        assert_eq!(
            FieldValue::Amount(Amount::parse("12.50").unwrap()).to_string(),
            "12.50"
        );
    }

    #[test]
    fn option_none_is_null() {
        let v: FieldValue = Option::<i64>::None.into();
        assert!(v.is_null());
        let v: FieldValue = Some("x").into();
        assert_eq!(v, FieldValue::Text("x".into()));
    }

    #[test]
    fn row_builder() {
        let r = row([("num", FieldValue::Integer(1)), ("ref", "REM123".into())]);
        assert_eq!(r.len(), 2);
        assert_eq!(r["ref"], FieldValue::Text("REM123".into()));
    }
}
