use regex::Regex;
use simt_core::fields::*;
use simt_core::{FieldMap, RecordKind};

use crate::patterns::{re_motif, re_paid_count, re_processing_dates, re_reference, re_rib_block};
use crate::profile::{Profile, ProfileError};

/// Field names the extractor always fills (possibly with "") per kind.
pub fn extracted_fields(kind: RecordKind) -> &'static [&'static str] {
    match kind {
        RecordKind::Header => &[DATE_PRODUCTION, NUMERO_DONNEUR_ORDRE],
        RecordKind::Detail => &[
            DONNEUR_ORDRE,
            DATE_EMISSION,
            DATE_TRAITEMENT,
            DATE_EXECUTION,
            MONTANT,
            RIB_DONNEUR_ORDRE,
            RIB_BENEFICIAIRE,
            MOTIF_VIREMENT,
            NOM_BENEFICIAIRE,
            REFERENCE_VIREMENT,
        ],
        RecordKind::Footer => &[NB_VALEURS, MONTANT_TOTAL, NB_VALEURS_PAYEES],
    }
}

/// Recovers fields by searching for their shape rather than their position.
/// Used when a line fails structural validation, typically because columns
/// shifted. Each field is searched independently; a miss leaves "" for that
/// field only.
pub struct FallbackExtractor {
    production: Regex,
    originator_number: Regex,
    emission: Regex,
    amount: Regex,
    beneficiary_name: Regex,
    record_count: Regex,
    total_amount: Regex,
}

impl FallbackExtractor {
    pub fn new(profile: &Profile) -> Result<Self, ProfileError> {
        profile.check()?;
        let currency = regex::escape(&profile.currency);
        let footer = regex::escape(&profile.footer_code);
        let clients = profile.client_alternation();
        Ok(Self {
            production: profile.compile(&format!(r"(20.*?){currency}"))?,
            originator_number: profile.compile(&format!(r"{currency}([0-9]+)"))?,
            emission: profile.compile(&format!(
                r"([0-9]{{8}}){}",
                regex::escape(&profile.bank_code)
            ))?,
            amount: profile.compile(&format!(
                r"{}([0-9]+\.[0-9]{{2}})",
                regex::escape(&profile.amount_marker)
            ))?,
            beneficiary_name: profile.compile(&format!(
                r"(?i)\b({clients})\s+([A-ZÀ-ÖØ-Þ'\- ]+?)\s+[0-9]{{20,}}"
            ))?,
            record_count: profile.compile(&format!(r"{footer}([0-9]{{5}})"))?,
            total_amount: profile.compile(&format!(r"{footer}[0-9]{{5}}([0-9]+\.[0-9]{{2}})"))?,
        })
    }

    pub fn extract(&self, line: &str, kind: RecordKind) -> FieldMap {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut out: FieldMap = extracted_fields(kind)
            .iter()
            .map(|name| (name.to_string(), String::new()))
            .collect();

        let mut set = |name: &str, value: Option<&str>| {
            if let Some(v) = value {
                out.insert(name.to_string(), v.trim().to_string());
            }
        };

        match kind {
            RecordKind::Header => {
                set(DATE_PRODUCTION, capture(&self.production, line, 1));
                set(NUMERO_DONNEUR_ORDRE, capture(&self.originator_number, line, 1));
            }
            RecordKind::Detail => {
                set(DATE_EMISSION, capture(&self.emission, line, 1));
                set(DATE_TRAITEMENT, capture(re_processing_dates(), line, 1));
                set(DATE_EXECUTION, capture(re_processing_dates(), line, 2));
                set(MONTANT, capture(&self.amount, line, 1));
                if let Some(block) = capture(re_rib_block(), line, 1) {
                    let (originator, beneficiary) = block.split_at(24);
                    set(RIB_DONNEUR_ORDRE, Some(originator));
                    set(RIB_BENEFICIAIRE, Some(beneficiary));
                }
                set(MOTIF_VIREMENT, capture(re_motif(), line, 1));
                if let Some(c) = self.beneficiary_name.captures(line) {
                    let client = c.get(1).map(|m| m.as_str().to_lowercase());
                    set(DONNEUR_ORDRE, client.as_deref());
                    set(NOM_BENEFICIAIRE, c.get(2).map(|m| m.as_str()));
                }
                set(REFERENCE_VIREMENT, re_reference().find(line).map(|m| m.as_str()));
            }
            RecordKind::Footer => {
                set(NB_VALEURS, capture(&self.record_count, line, 1));
                set(MONTANT_TOTAL, capture(&self.total_amount, line, 1));
                set(NB_VALEURS_PAYEES, capture(re_paid_count(), line, 1));
            }
        }

        out
    }
}

fn capture<'t>(re: &Regex, text: &'t str, group: usize) -> Option<&'t str> {
    re.captures(text)?.get(group).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::fixtures::*;

    fn extractor() -> FallbackExtractor {
        FallbackExtractor::new(&Profile::default()).unwrap()
    }

    #[test]
    fn extract_header() {
        let fields = extractor().extract(HEADER, RecordKind::Header);
        assert_eq!(fields[DATE_PRODUCTION], "20240722114905");
        assert_eq!(fields[NUMERO_DONNEUR_ORDRE], "20679812");
    }

    #[test]
    fn extract_header_with_short_timestamp() {
        let line = "10000000000000000000202407221149MAD20679812";
        let fields = extractor().extract(line, RecordKind::Header);
        assert_eq!(fields[DATE_PRODUCTION], "202407221149");
    }

    #[test]
    fn extract_detail() {
        let fields = extractor().extract(&detail(), RecordKind::Detail);
        assert_eq!(fields[DONNEUR_ORDRE], "mcma");
        assert_eq!(fields[DATE_EMISSION], "20240307");
        assert_eq!(fields[DATE_TRAITEMENT], "20240308");
        assert_eq!(fields[DATE_EXECUTION], "20240428");
        assert_eq!(fields[MONTANT], "0000000250000.00");
        assert_eq!(fields[RIB_DONNEUR_ORDRE], ORIGINATOR_RIB);
        assert_eq!(fields[RIB_BENEFICIAIRE], BENEFICIARY_RIB);
        assert_eq!(fields[MOTIF_VIREMENT], "Rente invalidité");
        assert_eq!(fields[NOM_BENEFICIAIRE], "ME BERRADA NAJIB");
        assert_eq!(fields[REFERENCE_VIREMENT], "301-541242");
    }

    #[test]
    fn missing_reference_only_blanks_reference() {
        let fields = extractor().extract(
            &detail_with(ORIGINATOR_RIB, BENEFICIARY_RIB, ""),
            RecordKind::Detail,
        );
        let expected = extracted_fields(RecordKind::Detail);
        assert_eq!(fields.len(), expected.len());
        for name in expected {
            if *name == REFERENCE_VIREMENT {
                assert_eq!(fields[*name], "", "{name}");
            } else {
                assert!(!fields[*name].is_empty(), "{name} should be populated");
            }
        }
    }

    #[test]
    fn shifted_columns_are_still_found() {
        let shifted = format!("   {}", detail());
        let fields = extractor().extract(&shifted, RecordKind::Detail);
        assert_eq!(fields[MONTANT], "0000000250000.00");
        assert_eq!(fields[REFERENCE_VIREMENT], "301-541242");
        assert_eq!(fields[NOM_BENEFICIAIRE], "ME BERRADA NAJIB");
    }

    #[test]
    fn extract_footer() {
        let fields = extractor().extract(FOOTER, RecordKind::Footer);
        assert_eq!(fields[NB_VALEURS], "00004");
        assert_eq!(fields[MONTANT_TOTAL], "000000000943750.75");
        assert_eq!(fields[NB_VALEURS_PAYEES], "00004");
    }

    #[test]
    fn garbage_yields_all_keys_empty() {
        for kind in [RecordKind::Header, RecordKind::Detail, RecordKind::Footer] {
            let fields = extractor().extract("!@#$%^&*()\0\x01", kind);
            assert_eq!(fields.len(), extracted_fields(kind).len());
            assert!(fields.values().all(String::is_empty), "{kind}");
        }
    }
}
