use chrono::{Local, NaiveDateTime};
use simt_core::{FieldDefault, FieldKind, FieldSpec, Row, SectionLayout};

use crate::util::{fit_left, zfill};

/// Renders rows into fixed-width lines. Holds the instant used for `today`
/// and `now` defaults so every line of one file carries the same stamp.
#[derive(Debug, Clone, Copy)]
pub struct LineEncoder {
    now: NaiveDateTime,
}

impl Default for LineEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineEncoder {
    pub fn new() -> Self {
        Self::at(Local::now().naive_local())
    }

    pub fn at(now: NaiveDateTime) -> Self {
        LineEncoder { now }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    /// Always returns exactly `layout.width()` characters. Values that do not
    /// fit are cut; there is no error path.
    pub fn encode(&self, layout: &SectionLayout, row: Option<&Row>) -> String {
        let mut line = vec![' '; layout.width()];

        for field in layout.fields() {
            let value = match row.and_then(|r| r.get(&field.name)).filter(|v| !v.is_null()) {
                Some(v) => v.to_string(),
                None => self.default_value(field),
            };
            let fitted = fit(&value, field);
            // Layout validation guarantees end <= width.
            for (slot, c) in line[field.offset..field.end()].iter_mut().zip(fitted.chars()) {
                *slot = c;
            }
        }

        line.into_iter().collect()
    }

    fn default_value(&self, field: &FieldSpec) -> String {
        match &field.default {
            FieldDefault::Blank => String::new(),
            FieldDefault::Literal(s) => s.clone(),
            FieldDefault::Today => self.now.format("%Y%m%d").to_string(),
            FieldDefault::Now => self.now.format("%H%M%S").to_string(),
        }
    }
}

/// Names of required fields the row leaves empty and that have no default.
pub fn missing_required<'a>(layout: &'a SectionLayout, row: Option<&Row>) -> Vec<&'a str> {
    layout
        .fields()
        .iter()
        .filter(|f| f.required && f.default == FieldDefault::Blank)
        .filter(|f| {
            row.and_then(|r| r.get(&f.name))
                .map_or(true, |v| v.is_null() || v.to_string().trim().is_empty())
        })
        .map(|f| f.name.as_str())
        .collect()
}

/// Integers are zero-filled on the left, everything else is left-justified.
/// Both are cut to the field length, keeping the leftmost characters.
fn fit(value: &str, field: &FieldSpec) -> String {
    match field.kind {
        FieldKind::Integer => zfill(value, field.length).chars().take(field.length).collect(),
        FieldKind::Text | FieldKind::Date | FieldKind::Time => fit_left(value, field.length),
    }
}

/// One-shot helper using the current local time.
pub fn encode_line(layout: &SectionLayout, row: Option<&Row>) -> String {
    LineEncoder::new().encode(layout, row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use simt_core::{row, Amount, FieldValue, RecordKind};

    fn fixed_clock() -> LineEncoder {
        let now = NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 30)
            .unwrap();
        LineEncoder::at(now)
    }

    fn scenario_layout() -> SectionLayout {
        SectionLayout::new(
            RecordKind::Header,
            500,
            vec![
                FieldSpec::new("num", 0, 7, FieldKind::Integer).with_default("0"),
                FieldSpec::new("ref", 7, 7, FieldKind::Text).with_default(""),
            ],
        )
        .unwrap()
    }

    #[test]
    fn scenario_number_and_reference() {
        let r = row([("num", FieldValue::Integer(1)), ("ref", "REM123".into())]);
        let line = fixed_clock().encode(&scenario_layout(), Some(&r));
        assert_eq!(line.len(), 500);
        assert_eq!(&line[..14], "0000001REM123 ");
        assert!(line[14..].chars().all(|c| c == ' '));
    }

    #[test]
    fn defaults_apply_without_row() {
        let line = fixed_clock().encode(&scenario_layout(), None);
        assert_eq!(&line[..14], "0000000       ");
    }

    #[test]
    fn null_values_fall_back_to_default() {
        let r = row([("num", FieldValue::Null), ("ref", FieldValue::Null)]);
        let line = fixed_clock().encode(&scenario_layout(), Some(&r));
        assert_eq!(&line[..14], "0000000       ");
    }

    #[test]
    fn date_and_time_defaults_use_clock() {
        let layout = SectionLayout::new(
            RecordKind::Header,
            20,
            vec![
                FieldSpec::new("date_creation", 0, 8, FieldKind::Date).with_default("today"),
                FieldSpec::new("heure_creation", 8, 6, FieldKind::Time).with_default("now"),
            ],
        )
        .unwrap();
        let line = fixed_clock().encode(&layout, None);
        assert_eq!(line, "20240307090530      ");
    }

    #[test]
    fn width_is_fixed_for_oversized_values() {
        let layout = SectionLayout::new(
            RecordKind::Detail,
            30,
            vec![
                FieldSpec::new("code", 0, 2, FieldKind::Integer),
                FieldSpec::new("nom", 2, 5, FieldKind::Text),
                FieldSpec::new("montant", 20, 4, FieldKind::Integer),
            ],
        )
        .unwrap();
        let r = row([
            ("code", FieldValue::Integer(12345)),
            ("nom", "BERRADA NAJIB".into()),
            ("montant", FieldValue::Amount(Amount::parse("12.5").unwrap())),
        ]);
        let line = fixed_clock().encode(&layout, Some(&r));
        assert_eq!(line.chars().count(), 30);
        assert_eq!(&line[..7], "12BERRA");
        assert_eq!(&line[20..24], "12.5");
    }

    #[test]
    fn width_counts_characters_not_bytes() {
        let layout = SectionLayout::new(
            RecordKind::Detail,
            12,
            vec![FieldSpec::new("motif_virement", 0, 10, FieldKind::Text)],
        )
        .unwrap();
        let r = row([("motif_virement", "Rente invalidité")]);
        let line = fixed_clock().encode(&layout, Some(&r));
        assert_eq!(line.chars().count(), 12);
        assert_eq!(line, "Rente inva  ");
    }

    #[test]
    fn fields_outside_layout_are_ignored() {
        let r = row([("unknown", "X"), ("num", "42".into())]);
        let line = fixed_clock().encode(&scenario_layout(), Some(&r));
        assert_eq!(&line[..7], "0000042");
    }

    #[test]
    fn dates_render_compact() {
        let layout = SectionLayout::new(
            RecordKind::Detail,
            8,
            vec![FieldSpec::new("date_emission", 0, 8, FieldKind::Date)],
        )
        .unwrap();
        let r = row([("date_emission", NaiveDate::from_ymd_opt(2024, 3, 7).unwrap())]);
        assert_eq!(fixed_clock().encode(&layout, Some(&r)), "20240307");
    }

    #[test]
    fn missing_required_fields() {
        let layout = SectionLayout::new(
            RecordKind::Detail,
            40,
            vec![
                FieldSpec::new("rib_beneficiaire", 0, 24, FieldKind::Text).required(),
                FieldSpec::new("code", 24, 2, FieldKind::Integer).with_default("04").required(),
                FieldSpec::new("motif", 26, 10, FieldKind::Text),
            ],
        )
        .unwrap();
        assert_eq!(missing_required(&layout, None), vec!["rib_beneficiaire"]);
        let r = row([("rib_beneficiaire", "  ")]);
        assert_eq!(missing_required(&layout, Some(&r)), vec!["rib_beneficiaire"]);
        let r = row([("rib_beneficiaire", "011640000001248001501808")]);
        assert!(missing_required(&layout, Some(&r)).is_empty());
    }
}
