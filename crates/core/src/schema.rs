use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Line width of every section in the observed SIMT layouts.
pub const DEFAULT_LINE_WIDTH: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Header,
    Detail,
    Footer,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Header => write!(f, "header"),
            RecordKind::Detail => write!(f, "detail"),
            RecordKind::Footer => write!(f, "footer"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Integer,
    Date,
    Time,
}

/// Value written when a row carries nothing for a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldDefault {
    /// Spaces for text; zeros once padded for integers.
    Blank,
    Literal(String),
    /// Current date as `YYYYMMDD`.
    Today,
    /// Current time as `HHMMSS`.
    Now,
}

impl FieldDefault {
    /// Interprets a raw default token. `today` and `now` are only special on
    /// date and time fields.
    pub fn parse(raw: &str, kind: FieldKind) -> Self {
        match (kind, raw) {
            (_, "") => FieldDefault::Blank,
            (FieldKind::Date | FieldKind::Time, "today") => FieldDefault::Today,
            (FieldKind::Date | FieldKind::Time, "now") => FieldDefault::Now,
            (_, other) => FieldDefault::Literal(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub offset: usize,
    pub length: usize,
    pub kind: FieldKind,
    pub default: FieldDefault,
    pub required: bool,
}

impl FieldSpec {
    pub fn new(name: &str, offset: usize, length: usize, kind: FieldKind) -> Self {
        FieldSpec {
            name: name.to_string(),
            offset,
            length,
            kind,
            default: FieldDefault::Blank,
            required: false,
        }
    }

    pub fn with_default(mut self, raw: &str) -> Self {
        self.default = FieldDefault::parse(raw, self.kind);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Exclusive end position; saturates so oversized layouts still fail the
    /// bounds check instead of wrapping.
    pub fn end(&self) -> usize {
        self.offset.saturating_add(self.length)
    }
}

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to parse layout: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{section} section has a zero line width")]
    ZeroWidth { section: RecordKind },
    #[error("{section}.{field} has zero length")]
    EmptyField { section: RecordKind, field: String },
    #[error("{section}.{field} ends at {end}, past the line width of {width}")]
    OutOfBounds {
        section: RecordKind,
        field: String,
        end: usize,
        width: usize,
    },
    #[error("{section}.{first} overlaps {section}.{second}")]
    Overlap {
        section: RecordKind,
        first: String,
        second: String,
    },
    #[error("{section}.{field} is declared twice")]
    DuplicateField { section: RecordKind, field: String },
}

/// One section (header, detail or footer) of a layout: a fixed line width
/// and its non-overlapping fields in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionLayout {
    kind: RecordKind,
    width: usize,
    fields: Vec<FieldSpec>,
}

impl SectionLayout {
    pub fn new(kind: RecordKind, width: usize, fields: Vec<FieldSpec>) -> Result<Self, SchemaError> {
        check_fields(kind, width, &fields)?;
        Ok(SectionLayout { kind, width, fields })
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

fn check_fields(kind: RecordKind, width: usize, fields: &[FieldSpec]) -> Result<(), SchemaError> {
    if width == 0 {
        return Err(SchemaError::ZeroWidth { section: kind });
    }

    let mut seen = HashSet::new();
    for field in fields {
        if field.length == 0 {
            return Err(SchemaError::EmptyField {
                section: kind,
                field: field.name.clone(),
            });
        }
        if field.end() > width {
            return Err(SchemaError::OutOfBounds {
                section: kind,
                field: field.name.clone(),
                end: field.end(),
                width,
            });
        }
        if !seen.insert(field.name.as_str()) {
            return Err(SchemaError::DuplicateField {
                section: kind,
                field: field.name.clone(),
            });
        }
    }

    // Sorted by offset, any overlap shows up between neighbours.
    let mut by_offset: Vec<&FieldSpec> = fields.iter().collect();
    by_offset.sort_by_key(|f| (f.offset, f.end()));
    for pair in by_offset.windows(2) {
        if pair[1].offset < pair[0].end() {
            return Err(SchemaError::Overlap {
                section: kind,
                first: pair[0].name.clone(),
                second: pair[1].name.clone(),
            });
        }
    }

    Ok(())
}

/// Complete layout of one file kind. Immutable once built; share it by
/// reference across as many transcoding runs as needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    header: SectionLayout,
    detail: SectionLayout,
    footer: SectionLayout,
}

impl RecordSchema {
    pub fn new(header: SectionLayout, detail: SectionLayout, footer: SectionLayout) -> Self {
        RecordSchema { header, detail, footer }
    }

    pub fn from_toml(toml_content: &str) -> Result<Self, SchemaError> {
        let raw: RawSchema = toml::from_str(toml_content)?;
        Ok(RecordSchema {
            header: raw.header.into_layout(RecordKind::Header)?,
            detail: raw.detail.into_layout(RecordKind::Detail)?,
            footer: raw.footer.into_layout(RecordKind::Footer)?,
        })
    }

    pub fn section(&self, kind: RecordKind) -> &SectionLayout {
        match kind {
            RecordKind::Header => &self.header,
            RecordKind::Detail => &self.detail,
            RecordKind::Footer => &self.footer,
        }
    }

    pub fn header(&self) -> &SectionLayout {
        &self.header
    }

    pub fn detail(&self) -> &SectionLayout {
        &self.detail
    }

    pub fn footer(&self) -> &SectionLayout {
        &self.footer
    }
}

// ── TOML layout description ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawSchema {
    header: RawSection,
    detail: RawSection,
    footer: RawSection,
}

#[derive(Deserialize)]
struct RawSection {
    #[serde(default = "default_width")]
    width: usize,
    #[serde(default)]
    fields: Vec<RawField>,
}

#[derive(Deserialize)]
struct RawField {
    name: String,
    starting_position: usize,
    length: usize,
    #[serde(rename = "type")]
    kind: FieldKind,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    default: Option<RawDefault>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDefault {
    Integer(i64),
    Text(String),
}

fn default_width() -> usize {
    DEFAULT_LINE_WIDTH
}

impl RawSection {
    fn into_layout(self, kind: RecordKind) -> Result<SectionLayout, SchemaError> {
        let fields = self
            .fields
            .into_iter()
            .map(|raw| {
                let default = match raw.default {
                    None => FieldDefault::Blank,
                    Some(RawDefault::Integer(n)) => FieldDefault::Literal(n.to_string()),
                    Some(RawDefault::Text(s)) => FieldDefault::parse(&s, raw.kind),
                };
                FieldSpec {
                    name: raw.name,
                    offset: raw.starting_position,
                    length: raw.length,
                    kind: raw.kind,
                    default,
                    required: raw.required,
                }
            })
            .collect();
        SectionLayout::new(kind, self.width, fields)
    }
}
