use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use simt_core::{Amount, FieldMap, FieldValue, Row};
use thiserror::Error;

use crate::transcode::ParsedRecord;
use crate::util::{parse_date, parse_time, zfill};

/// One named value normalisation. The set is closed on purpose: rules files
/// select an operator, they never carry code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransformRule {
    /// Decimal text scaled by `10^scale` and zero-padded, e.g. `12.5` with
    /// scale 2 and length 8 gives `00001250`.
    ScaledNumber {
        length: usize,
        #[serde(default = "default_scale")]
        scale: u32,
    },
    /// Zero-padded decimal text rendered with exactly `places` decimals.
    Decimal {
        #[serde(default = "default_scale")]
        places: u32,
    },
    Date {
        #[serde(default)]
        input_format: Option<String>,
        output_format: String,
    },
    Time {
        #[serde(default)]
        input_format: Option<String>,
        output_format: String,
    },
}

fn default_scale() -> u32 {
    2
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("Field '{field}': '{value}' is not a number")]
    InvalidNumber { field: String, value: String },
    #[error("Field '{field}': '{value}' does not fit in {length} digits")]
    Overflow {
        field: String,
        value: String,
        length: usize,
    },
    #[error("Field '{field}': '{value}' is not a date")]
    InvalidDate { field: String, value: String },
    #[error("Field '{field}': '{value}' is not a time")]
    InvalidTime { field: String, value: String },
    #[error("Field '{field}': invalid output format '{format}'")]
    InvalidFormat { field: String, format: String },
}

impl TransformRule {
    pub fn apply(&self, field: &str, value: &str) -> Result<String, TransformError> {
        let invalid_number = || TransformError::InvalidNumber {
            field: field.to_string(),
            value: value.to_string(),
        };

        match self {
            TransformRule::ScaledNumber { length, scale } => {
                let amount = Amount::parse(value).map_err(|_| invalid_number())?;
                let scaled = amount.scaled(*scale).ok_or_else(invalid_number)?;
                let padded = zfill(&scaled.to_string(), *length);
                if padded.chars().count() > *length {
                    return Err(TransformError::Overflow {
                        field: field.to_string(),
                        value: value.to_string(),
                        length: *length,
                    });
                }
                Ok(padded)
            }
            TransformRule::Decimal { places } => {
                let amount = Amount::parse(value).map_err(|_| invalid_number())?;
                Ok(amount.to_fixed(*places))
            }
            TransformRule::Date {
                input_format,
                output_format,
            } => {
                let date = parse_date(value, input_format.as_deref()).ok_or_else(|| {
                    TransformError::InvalidDate {
                        field: field.to_string(),
                        value: value.to_string(),
                    }
                })?;
                render(field, output_format, date.format(output_format))
            }
            TransformRule::Time {
                input_format,
                output_format,
            } => {
                let time = parse_time(value, input_format.as_deref()).ok_or_else(|| {
                    TransformError::InvalidTime {
                        field: field.to_string(),
                        value: value.to_string(),
                    }
                })?;
                render(field, output_format, time.format(output_format))
            }
        }
    }

    fn output_format(&self) -> Option<&str> {
        match self {
            TransformRule::Date { output_format, .. }
            | TransformRule::Time { output_format, .. } => Some(output_format),
            _ => None,
        }
    }
}

// chrono's `to_string` panics on a bad format; writing reports it instead.
fn render(
    field: &str,
    format: &str,
    formatted: impl std::fmt::Display,
) -> Result<String, TransformError> {
    let mut out = String::new();
    write!(out, "{formatted}").map_err(|_| TransformError::InvalidFormat {
        field: field.to_string(),
        format: format.to_string(),
    })?;
    Ok(out)
}

fn format_is_valid(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// Applies per-field rules to decoded records or to rows about to be encoded.
/// A failing field is logged and left as it was; the others still run.
#[derive(Debug, Clone, Default)]
pub struct TransformEngine {
    rules: BTreeMap<String, TransformRule>,
}

impl TransformEngine {
    pub fn new(rules: BTreeMap<String, TransformRule>) -> Self {
        Self { rules }
    }

    pub fn from_toml(toml_content: &str) -> Result<Self, String> {
        let rules: BTreeMap<String, TransformRule> =
            toml::from_str(toml_content).map_err(|e| format!("Failed to parse TOML: {e}"))?;
        for (field, rule) in &rules {
            if let Some(format) = rule.output_format() {
                if !format_is_valid(format) {
                    return Err(format!("Invalid output format for '{field}': '{format}'"));
                }
            }
        }
        Ok(Self::new(rules))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rule(&self, field: &str) -> Option<&TransformRule> {
        self.rules.get(field)
    }

    /// Blank values are left alone: they mean "absent", not "malformed".
    pub fn apply(&self, fields: &mut FieldMap) -> Vec<TransformError> {
        let mut errors = Vec::new();
        for (name, rule) in &self.rules {
            let Some(value) = fields.get_mut(name) else { continue };
            if value.trim().is_empty() {
                continue;
            }
            match rule.apply(name, value) {
                Ok(out) => *value = out,
                Err(e) => {
                    tracing::warn!(field = %name, error = %e, "Transform failed, value kept");
                    errors.push(e);
                }
            }
        }
        errors
    }

    /// Same as [`apply`](Self::apply) for typed rows; successful results are
    /// stored as text.
    pub fn apply_row(&self, row: &mut Row) -> Vec<TransformError> {
        let mut errors = Vec::new();
        for (name, rule) in &self.rules {
            let Some(value) = row.get_mut(name) else { continue };
            let raw = value.to_string();
            if value.is_null() || raw.trim().is_empty() {
                continue;
            }
            match rule.apply(name, &raw) {
                Ok(out) => *value = FieldValue::Text(out),
                Err(e) => {
                    tracing::warn!(field = %name, error = %e, "Transform failed, value kept");
                    errors.push(e);
                }
            }
        }
        errors
    }

    /// Header, every detail and footer of a decoded file. Rejected records
    /// carry no sections and are returned untouched.
    pub fn apply_parsed(&self, record: &mut ParsedRecord) -> Vec<TransformError> {
        let mut errors = Vec::new();
        if let Some(header) = record.header.as_mut() {
            errors.extend(self.apply(header));
        }
        for detail in &mut record.details {
            errors.extend(self.apply(detail));
        }
        if let Some(footer) = record.footer.as_mut() {
            errors.extend(self.apply(footer));
        }
        errors
    }
}
