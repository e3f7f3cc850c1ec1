use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use simt_core::fields::{
    DATE_EMISSION, MONTANT, MONTANT_TOTAL_VIREMENTS, NOMBRE_TOTAL_VIREMENTS, NUMERO_DONNEUR_ORDRE,
    REFERENCE_REMISE,
};
use simt_core::{Amount, BillingMonth, FieldMap, FieldValue, RecordKind, RecordSchema, Row};

use crate::decode::decode_line;
use crate::encode::{missing_required, LineEncoder};
use crate::extract::FallbackExtractor;
use crate::profile::{Profile, ProfileError};
use crate::transform::TransformEngine;
use crate::util::parse_date;
use crate::validate::{ChecksumError, RecordValidator};

/// Remittance reference used when the first row carries none.
pub const NO_REFERENCE: &str = "NOREF";

/// Splits a file on `\n` or `\r\n` and drops trailing blank lines. Blank
/// lines inside the file are kept so line numbers match the source.
pub fn file_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.lines().collect();
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    lines
}

/// A non-fatal structural failure that sent one line to pattern extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineWarning {
    /// 1-based.
    pub line: usize,
    pub kind: RecordKind,
    pub errors: Vec<String>,
}

/// Outcome of decoding one file. Either the sections are filled, or `error`
/// is set and nothing else is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedRecord {
    pub header: Option<FieldMap>,
    pub details: Vec<FieldMap>,
    pub footer: Option<FieldMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<LineWarning>,
}

impl ParsedRecord {
    pub fn rejected(error: impl Into<String>) -> Self {
        ParsedRecord {
            error: Some(error.into()),
            ..ParsedRecord::default()
        }
    }

    pub fn is_rejected(&self) -> bool {
        self.error.is_some()
    }

    /// Originator number from the header, for callers routing the records.
    pub fn originator(&self) -> Option<&str> {
        self.header
            .as_ref()?
            .get(NUMERO_DONNEUR_ORDRE)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeriodFilter {
    #[default]
    All,
    Month(BillingMonth),
    /// Month of the most recent parseable date in the rows.
    Latest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    pub period: PeriodFilter,
    /// Row field the period filter reads.
    pub date_field: String,
    /// Row field summed into the footer total.
    pub amount_field: String,
    /// Footer field receiving the detail count.
    pub count_field: String,
    /// Footer field receiving the amount total.
    pub total_field: String,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            period: PeriodFilter::All,
            date_field: DATE_EMISSION.to_string(),
            amount_field: MONTANT.to_string(),
            count_field: NOMBRE_TOTAL_VIREMENTS.to_string(),
            total_field: MONTANT_TOTAL_VIREMENTS.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFile {
    pub lines: Vec<String>,
    pub count: usize,
    pub total: Amount,
    pub remittance_reference: String,
    /// Month the rows were filtered to, if any.
    pub month: Option<BillingMonth>,
}

impl EncodedFile {
    /// Newline-terminated lines.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// Runs the line codec over whole files: one header, N details, one footer.
/// Holds no per-file state, so one instance can process many files.
pub struct FileTranscoder<'a> {
    schema: &'a RecordSchema,
    validator: RecordValidator,
    extractor: FallbackExtractor,
    encoder: LineEncoder,
    rules: TransformEngine,
}

impl<'a> FileTranscoder<'a> {
    pub fn new(schema: &'a RecordSchema, profile: &Profile) -> Result<Self, ProfileError> {
        Ok(Self {
            schema,
            validator: RecordValidator::new(profile)?,
            extractor: FallbackExtractor::new(profile)?,
            encoder: LineEncoder::new(),
            rules: TransformEngine::default(),
        })
    }

    /// Fixes the clock used for `today`/`now` defaults.
    pub fn with_encoder(mut self, encoder: LineEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    /// Rules applied to decoded sections, and to rows right before encoding.
    pub fn with_rules(mut self, rules: TransformEngine) -> Self {
        self.rules = rules;
        self
    }

    pub fn schema(&self) -> &RecordSchema {
        self.schema
    }

    // ── Decode ────────────────────────────────────────────────────────────────

    /// First line is the header, last the footer, the rest details. A RIB
    /// checksum failure on any detail rejects the whole file.
    pub fn decode_file<S: AsRef<str>>(&self, lines: &[S]) -> ParsedRecord {
        if lines.len() < 2 {
            tracing::warn!("File has {} line(s), expected a header and a footer", lines.len());
            return ParsedRecord::rejected(format!(
                "File needs a header and a footer line, found {} line(s)",
                lines.len()
            ));
        }

        match self.decode_lines(lines) {
            Ok(mut record) => {
                self.rules.apply_parsed(&mut record);
                tracing::info!(
                    "Decoded {} detail line(s), {} fell back to extraction",
                    record.details.len(),
                    record.warnings.len()
                );
                record
            }
            Err(e) => {
                tracing::error!("File rejected: {e}");
                ParsedRecord::rejected(e.to_string())
            }
        }
    }

    /// Splits on `\n` or `\r\n` and ignores trailing blank lines.
    pub fn decode_text(&self, text: &str) -> ParsedRecord {
        self.decode_file(&file_lines(text))
    }

    fn decode_lines<S: AsRef<str>>(&self, lines: &[S]) -> Result<ParsedRecord, ChecksumError> {
        let mut warnings = Vec::new();
        let last = lines.len() - 1;

        let header = self.decode_one(0, lines[0].as_ref(), RecordKind::Header, &mut warnings)?;
        let details = lines[1..last]
            .iter()
            .enumerate()
            .map(|(i, line)| {
                self.decode_one(i + 1, line.as_ref(), RecordKind::Detail, &mut warnings)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let footer =
            self.decode_one(last, lines[last].as_ref(), RecordKind::Footer, &mut warnings)?;

        Ok(ParsedRecord {
            header: Some(header),
            details,
            footer: Some(footer),
            error: None,
            warnings,
        })
    }

    fn decode_one(
        &self,
        index: usize,
        line: &str,
        kind: RecordKind,
        warnings: &mut Vec<LineWarning>,
    ) -> Result<FieldMap, ChecksumError> {
        let outcome = self.validator.validate(line, kind)?;
        if outcome.valid {
            return Ok(decode_line(line, self.schema.section(kind)));
        }

        tracing::warn!(
            "Line {} ({kind}) failed validation, extracting by pattern: {}",
            index + 1,
            outcome.errors.join("; ")
        );
        warnings.push(LineWarning {
            line: index + 1,
            kind,
            errors: outcome.errors,
        });
        Ok(self.extractor.extract(line, kind))
    }

    // ── Encode ────────────────────────────────────────────────────────────────

    /// Header from the first selected row (or from defaults when none is
    /// left), one detail per row, then a footer carrying count and total.
    pub fn encode_file(&self, rows: &[Row], options: &EncodeOptions) -> EncodedFile {
        let (selected, month) = select_period(rows, options);

        let remittance_reference = selected
            .first()
            .and_then(|r| r.get(REFERENCE_REMISE))
            .filter(|v| !v.is_null())
            .map(|v| v.to_string().trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| NO_REFERENCE.to_string());

        let mut lines = Vec::with_capacity(selected.len() + 2);
        lines.push(self.encode_section(RecordKind::Header, selected.first().copied()));

        let mut total = Amount::zero();
        for (i, row) in selected.iter().enumerate() {
            match row.get(&options.amount_field).filter(|v| !v.is_null()) {
                Some(value) => match amount_of(value) {
                    Some(amount) => total = total + amount,
                    None => tracing::warn!(
                        "Detail {}: amount '{value}' is not a number, left out of the total",
                        i + 1
                    ),
                },
                None => tracing::warn!(
                    "Detail {}: no '{}' value, left out of the total",
                    i + 1,
                    options.amount_field
                ),
            }
            lines.push(self.encode_section(RecordKind::Detail, Some(row)));
        }

        let count = selected.len();
        let mut footer = Row::new();
        footer.insert(options.count_field.clone(), FieldValue::Integer(count as i64));
        footer.insert(options.total_field.clone(), FieldValue::Amount(total));
        lines.push(self.encode_section(RecordKind::Footer, Some(&footer)));

        tracing::info!("Encoded {count} detail line(s), total {total}");
        EncodedFile {
            lines,
            count,
            total,
            remittance_reference,
            month,
        }
    }

    fn encode_section(&self, kind: RecordKind, row: Option<&Row>) -> String {
        let layout = self.schema.section(kind);
        let transformed = row.map(|r| {
            let mut r = r.clone();
            self.rules.apply_row(&mut r);
            r
        });
        let row = transformed.as_ref();

        let missing = missing_required(layout, row);
        if !missing.is_empty() {
            tracing::warn!("{kind} line is missing required field(s): {}", missing.join(", "));
        }
        self.encoder.encode(layout, row)
    }
}

fn select_period<'r>(
    rows: &'r [Row],
    options: &EncodeOptions,
) -> (Vec<&'r Row>, Option<BillingMonth>) {
    let month = match options.period {
        PeriodFilter::All => return (rows.iter().collect(), None),
        PeriodFilter::Month(month) => month,
        PeriodFilter::Latest => {
            let latest = rows.iter().filter_map(|r| date_of(r, &options.date_field)).max();
            match latest {
                Some(date) => BillingMonth::of(date),
                None => {
                    tracing::warn!(
                        "No row has a readable '{}', nothing selected",
                        options.date_field
                    );
                    return (Vec::new(), None);
                }
            }
        }
    };

    let selected = rows
        .iter()
        .filter(|r| date_of(r, &options.date_field).is_some_and(|d| month.contains(d)))
        .collect();
    (selected, Some(month))
}

fn date_of(row: &Row, field: &str) -> Option<NaiveDate> {
    match row.get(field)? {
        FieldValue::Date(d) => Some(*d),
        FieldValue::Null => None,
        other => parse_date(&other.to_string(), None),
    }
}

fn amount_of(value: &FieldValue) -> Option<Amount> {
    match value {
        FieldValue::Amount(a) => Some(*a),
        FieldValue::Integer(n) => Some(Amount::from_decimal(Decimal::from(*n))),
        other => Amount::parse(&other.to_string()).ok(),
    }
}
